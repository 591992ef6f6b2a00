use glam::Vec3;
use serde::{Deserialize, Serialize};
use weave_kernel::{Agent, AgentId, Behavior, ConfigError, SplitMix64};
use weave_scene::{MaterialHandle, MeshHandle};

use crate::crowd::{Crowd, CrowdError};

/// Demo population: agents scattered on the ground plane, each walking to a
/// random goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub count: usize,
    /// Half-width of the square `[-extent, extent]²` on the XZ plane.
    pub extent: f32,
    /// Desired walking speed, m/s.
    pub speed: f32,
    pub arrival_radius: f32,
    /// The first `initial_infected` agents start with infectivity 1.
    pub initial_infected: usize,
    pub seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            count: 20,
            extent: 10.0,
            speed: 1.0,
            arrival_radius: 0.5,
            initial_infected: 1,
            seed: 42,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ConfigError::Invalid {
                name: "population.extent",
                reason: format!("must be finite and > 0, got {}", self.extent),
            });
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(ConfigError::Invalid {
                name: "population.speed",
                reason: format!("must be finite and >= 0, got {}", self.speed),
            });
        }
        if !(self.arrival_radius.is_finite() && self.arrival_radius >= 0.0) {
            return Err(ConfigError::Invalid {
                name: "population.arrival_radius",
                reason: format!("must be finite and >= 0, got {}", self.arrival_radius),
            });
        }
        if self.initial_infected > self.count {
            return Err(ConfigError::Invalid {
                name: "population.initial_infected",
                reason: format!(
                    "{} exceeds population count {}",
                    self.initial_infected, self.count
                ),
            });
        }
        Ok(())
    }
}

/// Add `config.count` pedestrians to `crowd`, deterministically from
/// `config.seed`. Each pedestrian gets one node per entry of `meshes`.
pub fn populate(
    crowd: &mut Crowd,
    config: &PopulationConfig,
    meshes: &[(MeshHandle, MaterialHandle)],
) -> Result<Vec<AgentId>, CrowdError> {
    config.validate()?;
    let mut rng = SplitMix64::new(config.seed);
    let e = config.extent;
    let mut ids = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let position = Vec3::new(rng.range(-e, e), 0.0, rng.range(-e, e));
        let goal = Vec3::new(rng.range(-e, e), 0.0, rng.range(-e, e));
        let infectivity = if i < config.initial_infected { 1.0 } else { 0.0 };
        let agent = Agent::at(position)
            .with_steering(Vec3::ZERO, config.speed)
            .with_infection(infectivity, 0.0)
            .with_behavior(Behavior::SeekGoal {
                goal,
                speed: config.speed,
                arrival_radius: config.arrival_radius,
            });
        ids.push(crowd.add_pedestrian(agent, meshes)?);
    }
    tracing::info!(
        count = config.count,
        infected = config.initial_infected,
        seed = config.seed,
        "population spawned"
    );
    Ok(ids)
}
