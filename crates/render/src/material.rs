use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weave_scene::MaterialHandle;

/// Blinn-Phong surface parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for Material {
    /// Magenta, so a missing material is obvious on screen.
    fn default() -> Self {
        Self {
            diffuse: Vec3::new(1.0, 0.0, 1.0),
            specular: Vec3::ONE,
            shininess: 0.0,
        }
    }
}

impl Material {
    pub fn new(diffuse: Vec3, specular: Vec3, shininess: f32) -> Self {
        Self {
            diffuse,
            specular,
            shininess,
        }
    }

    /// Highlight applied to pedestrians above the infected threshold.
    pub fn infected() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 0.0), Vec3::ONE, 10.0)
    }
}

/// Handle-addressed material storage.
///
/// Handles are allocated sequentially and never reused. Lookups of an
/// unknown handle fall back to [`Material::default`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialLibrary {
    materials: BTreeMap<MaterialHandle, Material>,
    next_id: u64,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id);
        self.next_id += 1;
        self.materials.insert(handle, material);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(&handle)
    }

    /// The material for `handle`, or the default when unknown.
    pub fn resolve(&self, handle: MaterialHandle) -> Material {
        match self.materials.get(&handle) {
            Some(m) => *m,
            None => {
                tracing::debug!(?handle, "unknown material handle; using default");
                Material::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
