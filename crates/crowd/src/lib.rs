//! Crowd aggregation: the simulation world is the source of truth, and every
//! tick its agents are mirrored into scene nodes.
//!
//! # Invariants
//! - Each pedestrian owns one parent node and one child node per mesh.
//! - Scene state is written only from agent state, never the reverse.

pub mod clock;
pub mod config;
pub mod crowd;
pub mod population;

pub use clock::FixedStep;
pub use config::ScenarioConfig;
pub use crowd::{Crowd, CrowdError, Pedestrian};
pub use population::{PopulationConfig, populate};

pub fn crate_info() -> &'static str {
    "weave-crowd v0.1.0"
}
