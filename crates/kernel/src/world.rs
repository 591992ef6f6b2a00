use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::force::{clamp_unit, driving_force, exposure, infection_rates, interaction_force};
use crate::params::SimParams;
use crate::rng::SplitMix64;

/// An event record produced by world mutations and threshold crossings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned { id: AgentId, position: Vec3 },
    /// Simulation advanced one tick of `dt` seconds.
    Stepped { tick: u64, dt: f32 },
    /// Agent state diverged; it is frozen from now on.
    Stopped { id: AgentId, tick: u64 },
    /// Infectivity rose above the display threshold.
    Infected { id: AgentId, tick: u64 },
    /// Infectivity fell back to or below the display threshold.
    Recovered { id: AgentId, tick: u64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("timestep must be finite and > 0, got {0}")]
    InvalidTimestep(f32),
    #[error("agent not found: {0:?}")]
    AgentNotFound(AgentId),
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
}

/// Outcome of a single [`World::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepReport {
    pub tick: u64,
    /// Agents integrated this tick.
    pub live: usize,
    /// Agents that diverged during this tick.
    pub newly_stopped: usize,
    /// Agents above the infected threshold after the tick.
    pub infected: usize,
}

/// Aggregate view of the population.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub tick: u64,
    pub population: usize,
    pub infected: usize,
    pub stopped: usize,
    pub mean_infectivity: f32,
    pub mean_immunity: f32,
}

impl fmt::Display for PopulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {}: {} agents, {} infected, {} stopped, mean infectivity {:.3}, mean immunity {:.3}",
            self.tick,
            self.population,
            self.infected,
            self.stopped,
            self.mean_infectivity,
            self.mean_immunity
        )
    }
}

/// New per-agent state computed from the pre-tick snapshot.
#[derive(Debug, Clone, Copy)]
struct Update {
    position: Vec3,
    velocity: Vec3,
    infectivity: f32,
    immunity: f32,
}

/// The authoritative simulation state.
///
/// Agents live in a contiguous arena and are never removed, so an
/// [`AgentId`] stays valid for the lifetime of the world. Every tick reads
/// one immutable snapshot of the arena and commits all updates afterwards,
/// making the result independent of agent order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    params: SimParams,
    agents: Vec<Agent>,
    tick: u64,
    seed: u64,
    /// Append-only log of spawns, ticks and threshold crossings.
    #[serde(skip)]
    event_log: Vec<SimEvent>,
}

impl World {
    pub fn new(params: SimParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Create a world whose [`rng`](Self::rng) starts from `seed`.
    pub fn with_seed(params: SimParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A fresh generator seeded from the world seed.
    pub fn rng(&self) -> SplitMix64 {
        SplitMix64::new(self.seed)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.0)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SimEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Add an agent. Infection state is clamped to `[0, 1]`; an agent with a
    /// non-finite position or velocity starts out stopped.
    pub fn spawn(&mut self, mut agent: Agent) -> AgentId {
        let id = AgentId(self.agents.len());
        agent.infectivity = clamp_unit(agent.infectivity);
        agent.immunity = clamp_unit(agent.immunity);
        if !(agent.position.is_finite() && agent.velocity.is_finite()) {
            tracing::warn!(?id, "spawned agent with non-finite state; marking stopped");
            if !agent.position.is_finite() {
                agent.position = Vec3::ZERO;
            }
            agent.velocity = Vec3::ZERO;
            agent.stopped = true;
        }
        self.event_log.push(SimEvent::Spawned {
            id,
            position: agent.position,
        });
        self.agents.push(agent);
        id
    }

    /// Set an agent's desired direction and speed.
    pub fn set_steering(
        &mut self,
        id: AgentId,
        direction: Vec3,
        speed: f32,
    ) -> Result<(), SimError> {
        let agent = self.get_mut(id).ok_or(SimError::AgentNotFound(id))?;
        agent.desired_direction = direction;
        agent.desired_speed = speed;
        Ok(())
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<StepReport, SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimestep(dt));
        }
        self.params
            .validate()
            .map_err(|e| SimError::InvalidParams(e.to_string()))?;
        let tick = self.tick + 1;
        let _span = tracing::debug_span!("sim_step", tick, agents = self.agents.len()).entered();

        self.run_behaviors();

        let updates: Vec<Option<Update>> = (0..self.agents.len())
            .map(|i| self.compute_update(i, dt))
            .collect();

        let threshold = self.params.infected_threshold;
        let mut report = StepReport {
            tick,
            ..StepReport::default()
        };
        for (i, update) in updates.into_iter().enumerate() {
            let Some(update) = update else {
                continue;
            };
            let id = AgentId(i);
            let agent = &mut self.agents[i];
            if !(update.position.is_finite() && update.velocity.is_finite()) {
                tracing::warn!(?id, tick, "agent state diverged; stopping");
                agent.velocity = Vec3::ZERO;
                agent.stopped = true;
                report.newly_stopped += 1;
                self.event_log.push(SimEvent::Stopped { id, tick });
                continue;
            }

            let was_infected = agent.is_infected(threshold);
            agent.position = update.position;
            agent.velocity = update.velocity;
            agent.infectivity = update.infectivity;
            agent.immunity = update.immunity;
            report.live += 1;

            match (was_infected, agent.is_infected(threshold)) {
                (false, true) => {
                    tracing::debug!(?id, tick, "agent infected");
                    self.event_log.push(SimEvent::Infected { id, tick });
                }
                (true, false) => {
                    tracing::debug!(?id, tick, "agent recovered");
                    self.event_log.push(SimEvent::Recovered { id, tick });
                }
                _ => {}
            }
        }

        report.infected = self
            .agents
            .iter()
            .filter(|a| a.is_infected(threshold))
            .count();
        self.tick = tick;
        self.event_log.push(SimEvent::Stepped { tick, dt });
        tracing::trace!(?report, "step complete");
        Ok(report)
    }

    fn run_behaviors(&mut self) {
        for agent in self.agents.iter_mut().filter(|a| !a.stopped) {
            let position = agent.position;
            if let Some(steering) = agent.behavior.steer(position) {
                agent.desired_direction = steering.direction;
                agent.desired_speed = steering.speed;
            }
        }
    }

    /// Force and infection update for agent `i`, reading only the current
    /// (pre-tick) arena. `None` for stopped agents.
    fn compute_update(&self, i: usize, dt: f32) -> Option<Update> {
        let agent = &self.agents[i];
        if agent.stopped {
            return None;
        }
        let params = &self.params;
        let infection = &params.infection;

        let mut force = driving_force(agent, params.relaxation_time);
        let mut beta = 0.0;
        for (j, other) in self.agents.iter().enumerate() {
            if j == i || other.stopped {
                continue;
            }
            force += interaction_force(
                agent.position,
                agent.velocity,
                other.position,
                other.velocity,
                dt,
                params,
            );
            if infection.enabled {
                beta += exposure(
                    agent.position.distance(other.position),
                    agent.infectivity,
                    other.infectivity,
                    infection,
                    params.separation_epsilon,
                );
            }
        }

        let velocity = agent.velocity + force * dt;
        let position = agent.position + velocity * dt;

        let (infectivity, immunity) = if infection.enabled {
            let (d_inf, d_imm) =
                infection_rates(agent.infectivity, agent.immunity, beta, infection);
            (
                clamp_unit(agent.infectivity + d_inf * dt),
                clamp_unit(agent.immunity + d_imm * dt),
            )
        } else {
            (agent.infectivity, agent.immunity)
        };

        Some(Update {
            position,
            velocity,
            infectivity,
            immunity,
        })
    }

    pub fn summary(&self) -> PopulationSummary {
        let threshold = self.params.infected_threshold;
        let population = self.agents.len();
        let mut summary = PopulationSummary {
            tick: self.tick,
            population,
            ..PopulationSummary::default()
        };
        for agent in &self.agents {
            if agent.is_infected(threshold) {
                summary.infected += 1;
            }
            if agent.stopped {
                summary.stopped += 1;
            }
            summary.mean_infectivity += agent.infectivity;
            summary.mean_immunity += agent.immunity;
        }
        if population > 0 {
            summary.mean_infectivity /= population as f32;
            summary.mean_immunity /= population as f32;
        }
        summary
    }

    /// FNV-1a hash over the tick, seed and every agent's state, for
    /// determinism checks.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_vec = |h: &mut u64, v: Vec3| {
            for c in v.to_array() {
                mix(h, &c.to_le_bytes());
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for agent in &self.agents {
            mix_vec(&mut h, agent.position);
            mix_vec(&mut h, agent.velocity);
            mix_vec(&mut h, agent.desired_direction);
            mix(&mut h, &agent.desired_speed.to_le_bytes());
            mix(&mut h, &agent.infectivity.to_le_bytes());
            mix(&mut h, &agent.immunity.to_le_bytes());
            mix(&mut h, &[agent.stopped as u8]);
        }
        h
    }
}
