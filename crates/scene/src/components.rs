use serde::{Deserialize, Serialize};

/// A handle referencing a mesh supplied by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u64);

/// A handle referencing a material supplied by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

/// Renderable component: references mesh and material assets.
///
/// `material_override` temporarily replaces the base material without losing
/// it, e.g. to highlight an infected pedestrian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub material_override: Option<MaterialHandle>,
}

impl Renderable {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            material_override: None,
        }
    }

    /// The material the renderer should bind.
    pub fn effective_material(&self) -> MaterialHandle {
        self.material_override.unwrap_or(self.material)
    }
}
