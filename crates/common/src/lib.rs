//! Shared math primitives and transform types.
//!
//! # Invariants
//! - One Euler convention (`R = Ry · Rx · Rz`, forward = -Z) for every consumer.
//! - Matrix inversion never yields NaN: singular input falls back to identity.

pub mod math;
pub mod types;

pub use math::MathError;
pub use types::Transform;

pub fn crate_info() -> &'static str {
    "weave-common v0.1.0"
}
