use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use weave_common::{Transform, math};

use crate::graph::{NodeId, SceneError, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKind {
    Perspective,
    Orthographic,
}

/// Projection parameters. Clip space follows the GL convention (depth -1..1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub kind: ProjectionKind,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match self.kind {
            ProjectionKind::Perspective => {
                Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionKind::Orthographic => {
                let top = (self.fov * 0.5).tan() * self.near;
                let right = top * self.aspect;
                Mat4::orthographic_rh_gl(-right, right, -top, top, self.near, self.far)
            }
        }
    }
}

/// A camera bound to a scene node.
///
/// The view matrix is the inverse of the node's world matrix, so cameras obey
/// the same rotation convention as every other node and may be parented.
#[derive(Debug, Clone)]
pub struct Camera {
    node: NodeId,
    pub projection: Projection,
}

impl Camera {
    /// Spawn a camera node under the root at `position`, facing `target`.
    pub fn spawn(
        graph: &mut SceneGraph,
        position: Vec3,
        target: Vec3,
        projection: Projection,
    ) -> Result<Self, SceneError> {
        let node = graph.spawn("camera", Transform::from_position(position));
        let camera = Self { node, projection };
        camera.look_at(graph, target)?;
        Ok(camera)
    }

    /// Use an existing node as the camera.
    pub fn on_node(node: NodeId, projection: Projection) -> Self {
        Self { node, projection }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.projection.aspect = width as f32 / height.max(1) as f32;
    }

    /// Camera position in world space.
    pub fn eye(&self, graph: &SceneGraph) -> Result<Vec3, SceneError> {
        graph
            .global_position(self.node)
            .ok_or(SceneError::NodeNotFound(self.node))
    }

    pub fn view_matrix(&self, graph: &SceneGraph) -> Result<Mat4, SceneError> {
        let node = graph
            .node(self.node)
            .ok_or(SceneError::NodeNotFound(self.node))?;
        Ok(math::inverse_or_identity(&node.world_matrix()))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection(&self, graph: &SceneGraph) -> Result<Mat4, SceneError> {
        Ok(self.projection_matrix() * self.view_matrix(graph)?)
    }

    /// Rotate the camera node so it faces `target` in world space.
    ///
    /// The parent's world rotation is compensated exactly. A target at the
    /// eye position leaves the rotation unchanged.
    pub fn look_at(&self, graph: &mut SceneGraph, target: Vec3) -> Result<(), SceneError> {
        graph.recompute_world(self.node, true)?;
        let eye = self.eye(graph)?;
        let Some(world_rotation) = math::look_rotation(target - eye) else {
            return Ok(());
        };

        let parent_rotation = graph
            .node(self.node)
            .and_then(|n| n.parent())
            .and_then(|p| graph.node(p))
            .map(|p| p.world_matrix().to_scale_rotation_translation().1)
            .unwrap_or(Quat::IDENTITY);
        let local = parent_rotation.inverse() * math::euler_quat(world_rotation);

        graph.set_rotation(self.node, math::euler_from_quat(local))?;
        graph.recompute_world(self.node, true)
    }
}
