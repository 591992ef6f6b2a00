use crate::frame::Frame;
use crate::light::{Light, shade};
use crate::material::MaterialLibrary;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer consumes a collected frame plus the material library and
/// produces output. It never sees, let alone mutates, the scene graph.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, frame: &Frame, materials: &MaterialLibrary) -> Self::Output;
}

/// Human-readable frame dump, for the CLI, logs and tests.
///
/// Each item reports its world position, material and the colour it would
/// receive if its surface faced the camera.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &Frame, materials: &MaterialLibrary) -> String {
        self.frames += 1;
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame {} (items={}, lights={}) ===\n",
            self.frames,
            frame.items.len(),
            frame.lights.len()
        ));
        let e = frame.eye;
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2})\n",
            e.x, e.y, e.z
        ));
        for light in &frame.lights {
            match light {
                Light::Ambient { color, intensity } => {
                    out.push_str(&format!(
                        "Light: ambient color=({:.2}, {:.2}, {:.2}) intensity={:.2}\n",
                        color.x, color.y, color.z, intensity
                    ));
                }
                Light::Directional {
                    direction,
                    color,
                    intensity,
                } => {
                    out.push_str(&format!(
                        "Light: directional dir=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2}) intensity={:.2}\n",
                        direction.x, direction.y, direction.z, color.x, color.y, color.z, intensity
                    ));
                }
            }
        }

        for item in &frame.items {
            let p = item.model.transform_point3(glam::Vec3::ZERO);
            let material = materials.resolve(item.material);
            let to_eye = (frame.eye - p).normalize_or_zero();
            let c = shade(&material, to_eye, to_eye, &frame.lights);
            out.push_str(&format!(
                "  [node {}] mesh={} material={} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})\n",
                item.node.0,
                item.mesh.0,
                item.material.0,
                p.x,
                p.y,
                p.z,
                c.x,
                c.y,
                c.z
            ));
        }
        out
    }
}
