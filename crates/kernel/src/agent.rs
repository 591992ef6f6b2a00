use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;

/// Index of an agent in the world arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

/// One simulated pedestrian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Vec3,
    pub velocity: Vec3,
    pub desired_direction: Vec3,
    pub desired_speed: f32,
    /// 0 = healthy, 1 = highly infectious.
    pub infectivity: f32,
    pub immunity: f32,
    pub behavior: Behavior,
    pub(crate) stopped: bool,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            desired_direction: Vec3::ZERO,
            desired_speed: 1.0,
            infectivity: 0.0,
            immunity: 0.0,
            behavior: Behavior::Manual,
            stopped: false,
        }
    }
}

impl Agent {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_steering(mut self, direction: Vec3, speed: f32) -> Self {
        self.desired_direction = direction;
        self.desired_speed = speed;
        self
    }

    pub fn with_infection(mut self, infectivity: f32, immunity: f32) -> Self {
        self.infectivity = infectivity;
        self.immunity = immunity;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_direction * self.desired_speed
    }

    /// Set once the agent's state diverged; stopped agents are frozen.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_infected(&self, threshold: f32) -> bool {
        self.infectivity > threshold
    }
}
