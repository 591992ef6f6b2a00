//! Rendering contract: everything a backend needs to draw one frame.
//!
//! # Invariants
//! - A renderer never mutates the scene; frames are derived from it.
//! - Materials are addressed by handle; the library owns the values.
//!
//! The debug text renderer stands in for a GPU backend. The trait is
//! stable, so a real backend slots in without changing consumers.

pub mod assets;
pub mod frame;
pub mod light;
pub mod material;
mod renderer;

pub use assets::{AssetError, AssetLoader, InMemoryAssets, MeshInfo};
pub use frame::{DrawItem, Frame, InstanceData};
pub use light::{Light, MAX_LIGHTS, default_lights, shade};
pub use material::{Material, MaterialLibrary};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "weave-render v0.1.0"
}
