use glam::Vec3;

use crate::camera::Camera;
use crate::graph::{NodeId, SceneError, SceneGraph};

/// Keeps `phi` off the poles where the look-at yaw is undefined.
const POLE_EPS: f32 = 0.001;
const MIN_RADIUS: f32 = 0.1;

/// Orbit camera control in spherical coordinates around a target.
///
/// Pointer/keyboard wiring is left to the host; this type only turns deltas
/// into a camera position and orientation.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    radius: f32,
    theta: f32,
    phi: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitController {
    /// Derive spherical coordinates from the camera's current position.
    ///
    /// The camera must hang directly off the root, since the orbit position
    /// is written as its local position.
    pub fn from_camera(
        camera: &Camera,
        graph: &SceneGraph,
        target: Vec3,
    ) -> Result<Self, SceneError> {
        let node = graph
            .node(camera.node())
            .ok_or(SceneError::NodeNotFound(camera.node()))?;
        if node.parent() != Some(NodeId::ROOT) {
            return Err(SceneError::NotRootChild(camera.node()));
        }

        let offset = node.transform().position - target;
        let radius = offset.length().max(MIN_RADIUS);
        Ok(Self {
            target,
            radius,
            theta: offset.z.atan2(offset.x),
            phi: clamp_phi((offset.y / radius).clamp(-1.0, 1.0).acos()),
            rotate_speed: 0.006,
            pan_speed: 0.17,
            zoom_speed: 0.001,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// Camera position implied by the spherical coordinates.
    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.cos(),
                self.radius * cos_phi,
                self.radius * sin_phi * self.theta.sin(),
            )
    }

    /// Orbit by a pointer delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.theta += dx * self.rotate_speed;
        self.phi = clamp_phi(self.phi - dy * self.rotate_speed);
    }

    /// Slide the target (and with it the camera) in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let scale = self.pan_speed * self.radius / 200.0;
        self.target += right * (-dx * scale) + up * (dy * scale);
    }

    /// Zoom by a wheel delta; positive moves away.
    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius * (1.0 + delta * self.zoom_speed)).max(MIN_RADIUS);
    }

    /// Move the camera to the orbit position and face the target.
    pub fn apply(&self, camera: &Camera, graph: &mut SceneGraph) -> Result<(), SceneError> {
        graph.set_position(camera.node(), self.position())?;
        camera.look_at(graph, self.target)
    }
}

fn clamp_phi(phi: f32) -> f32 {
    phi.clamp(POLE_EPS, std::f32::consts::PI - POLE_EPS)
}
