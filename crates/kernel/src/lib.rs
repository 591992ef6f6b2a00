//! Simulation kernel: pedestrian agents driven by a social-force model with
//! a coupled infectivity/immunity overlay.
//!
//! # Invariants
//! - Every tick reads one pre-tick snapshot of all agents and commits after,
//!   so the outcome does not depend on agent order.
//! - Infectivity and immunity stay in `[0, 1]`.
//! - Stopped agents are frozen and neither exert nor feel forces.

pub mod agent;
pub mod behavior;
pub mod force;
pub mod params;
pub mod rng;
pub mod world;

pub use agent::{Agent, AgentId};
pub use behavior::{Behavior, Steering};
pub use params::{ConfigError, InfectionParams, SimParams, load_file};
pub use rng::SplitMix64;
pub use world::{PopulationSummary, SimError, SimEvent, StepReport, World};

pub fn crate_info() -> &'static str {
    "weave-kernel v0.1.0"
}
