use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::material::Material;

/// Light slots available to a frame.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    /// `direction` is the direction the light travels.
    Directional {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
}

impl Light {
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self::Ambient { color, intensity }
    }

    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::Directional {
            direction,
            color,
            intensity,
        }
    }
}

/// White ambient light at 0.3.
pub fn default_lights() -> Vec<Light> {
    vec![Light::ambient(Vec3::ONE, 0.3)]
}

/// Blinn-Phong colour of a surface point with unit `normal`, seen along unit
/// `to_eye`.
pub fn shade(material: &Material, normal: Vec3, to_eye: Vec3, lights: &[Light]) -> Vec3 {
    let n = normal.normalize_or_zero();
    let v = to_eye.normalize_or_zero();
    let mut result = Vec3::ZERO;
    for light in lights.iter().take(MAX_LIGHTS) {
        match *light {
            Light::Ambient { color, intensity } => {
                result += material.diffuse * color * intensity;
            }
            Light::Directional {
                direction,
                color,
                intensity,
            } => {
                let l = (-direction).normalize_or_zero();
                let diffuse = n.dot(l).max(0.0) * color * material.diffuse;
                let h = (l + v).normalize_or_zero();
                let spec = n.dot(h).max(0.0).powf(material.shininess);
                let specular = spec * color * material.specular;
                result += (diffuse + specular) * intensity;
            }
        }
    }
    result
}
