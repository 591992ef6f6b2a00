//! Asset loading seam.
//!
//! File parsing lives behind [`AssetLoader`]; the rest of the workspace only
//! ever sees mesh and material handles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weave_scene::{MaterialHandle, MeshHandle};

use crate::material::{Material, MaterialLibrary};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("mesh not found: {0}")]
    MeshNotFound(String),
    #[error("material not found: {0}")]
    MaterialNotFound(String),
}

/// Supplies mesh and material handles by name.
pub trait AssetLoader {
    fn load_mesh(&mut self, name: &str) -> Result<MeshHandle, AssetError>;

    /// Load a material into `library` and return its handle there.
    fn load_material(
        &mut self,
        name: &str,
        library: &mut MaterialLibrary,
    ) -> Result<MaterialHandle, AssetError>;
}

/// Geometry metadata for a loaded mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshInfo {
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Loader backed by assets registered in memory.
///
/// Loading the same material name twice returns the same handle as long as
/// the same library is used.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    meshes: Vec<MeshInfo>,
    mesh_names: BTreeMap<String, MeshHandle>,
    materials: BTreeMap<String, Material>,
    loaded_materials: BTreeMap<String, MaterialHandle>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// A unit cube mesh named `cube` and a grey `default` material.
    pub fn with_primitives() -> Self {
        let mut assets = Self::new();
        assets.add_mesh(MeshInfo {
            name: "cube".into(),
            vertex_count: 24,
            index_count: 36,
        });
        assets.add_material(
            "default",
            Material::new(glam::Vec3::splat(0.8), glam::Vec3::splat(0.5), 16.0),
        );
        assets
    }

    /// Register a mesh; re-registering a name replaces its metadata.
    pub fn add_mesh(&mut self, info: MeshInfo) -> MeshHandle {
        if let Some(&handle) = self.mesh_names.get(&info.name) {
            self.meshes[handle.0 as usize] = info;
            return handle;
        }
        let handle = MeshHandle(self.meshes.len() as u64);
        self.mesh_names.insert(info.name.clone(), handle);
        self.meshes.push(info);
        handle
    }

    pub fn add_material(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshInfo> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl AssetLoader for InMemoryAssets {
    fn load_mesh(&mut self, name: &str) -> Result<MeshHandle, AssetError> {
        self.mesh_names
            .get(name)
            .copied()
            .ok_or_else(|| AssetError::MeshNotFound(name.to_string()))
    }

    fn load_material(
        &mut self,
        name: &str,
        library: &mut MaterialLibrary,
    ) -> Result<MaterialHandle, AssetError> {
        if let Some(&handle) = self.loaded_materials.get(name) {
            if library.get(handle).is_some() {
                return Ok(handle);
            }
        }
        let material = *self
            .materials
            .get(name)
            .ok_or_else(|| AssetError::MaterialNotFound(name.to_string()))?;
        let handle = library.insert(material);
        self.loaded_materials.insert(name.to_string(), handle);
        tracing::debug!(name, ?handle, "material loaded");
        Ok(handle)
    }
}
