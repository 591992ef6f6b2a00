//! Retained-mode scene graph.
//!
//! Nodes live in an arena and form a single-rooted tree. World matrices are
//! pushed top-down from dirty nodes once per tick by the driver.
//!
//! # Invariants
//! - A node has at most one parent and appears in exactly one child list.
//! - `world = parent.world · local` after every recompute.
//! - Cameras derive their view from their node's world matrix.

pub mod camera;
pub mod components;
pub mod graph;
pub mod orbit;

pub use camera::{Camera, Projection, ProjectionKind};
pub use components::{MaterialHandle, MeshHandle, Renderable};
pub use graph::{Node, NodeId, SceneError, SceneGraph};
pub use orbit::OrbitController;

pub fn crate_info() -> &'static str {
    "weave-scene v0.1.0"
}
