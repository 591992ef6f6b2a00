use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use weave_common::math::to_row_major;
use weave_scene::{Camera, MaterialHandle, MeshHandle, NodeId, SceneError, SceneGraph};

use crate::light::{Light, MAX_LIGHTS};
use crate::material::MaterialLibrary;

/// One draw call: a visible node carrying a renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub model: Mat4,
    pub normal: Mat4,
}

/// Everything a backend needs to draw the scene from one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub eye: Vec3,
    pub lights: Vec<Light>,
    pub items: Vec<DrawItem>,
}

/// Per-instance GPU payload: model and normal matrices as rows, plus the
/// diffuse colour.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Frame {
    /// Collect draw items in pre-order. Visibility is per node: a hidden
    /// node is skipped but its children are still considered.
    pub fn collect(
        graph: &SceneGraph,
        camera: &Camera,
        lights: &[Light],
    ) -> Result<Self, SceneError> {
        let view = camera.view_matrix(graph)?;
        let projection = camera.projection_matrix();
        let eye = camera.eye(graph)?;

        if lights.len() > MAX_LIGHTS {
            tracing::warn!(
                count = lights.len(),
                max = MAX_LIGHTS,
                "too many lights; extra lights dropped"
            );
        }

        let mut items = Vec::new();
        graph.traverse(graph.root(), |id, node| {
            if !node.visible {
                return;
            }
            let Some(renderable) = node.renderable() else {
                return;
            };
            items.push(DrawItem {
                node: id,
                mesh: renderable.mesh,
                material: renderable.effective_material(),
                model: node.world_matrix(),
                normal: node.normal_matrix(),
            });
        });
        tracing::trace!(items = items.len(), "frame collected");

        Ok(Self {
            view,
            projection,
            view_projection: projection * view,
            eye,
            lights: lights.iter().take(MAX_LIGHTS).copied().collect(),
            items,
        })
    }

    /// Pack the draw items for instanced upload, in draw order.
    pub fn instances(&self, materials: &MaterialLibrary) -> Vec<InstanceData> {
        self.items
            .iter()
            .map(|item| {
                let diffuse = materials.resolve(item.material).diffuse;
                InstanceData {
                    model: to_row_major(&item.model),
                    normal: to_row_major(&item.normal),
                    color: diffuse.extend(1.0).to_array(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use weave_common::Transform;
    use weave_scene::{Projection, Renderable};

    fn scene() -> (SceneGraph, Camera, NodeId, NodeId) {
        let mut g = SceneGraph::new();
        let camera =
            Camera::spawn(&mut g, Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Projection::default())
                .unwrap();
        let parent = g.spawn("parent", Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let child = g
            .spawn_child(parent, "child", Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        g.set_renderable(child, Some(Renderable::new(MeshHandle(1), MaterialHandle(0))))
            .unwrap();
        g.flush_dirty();
        (g, camera, parent, child)
    }

    #[test]
    fn collects_visible_renderables_with_world_matrices() {
        let (g, camera, _, child) = scene();
        let frame = Frame::collect(&g, &camera, &[]).unwrap();
        assert_eq!(frame.items.len(), 1);
        let item = frame.items[0];
        assert_eq!(item.node, child);
        assert_eq!(item.mesh, MeshHandle(1));
        assert_eq!(
            item.model.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 0.0)
        );
        assert!((frame.eye - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
        assert!(frame.view_projection.abs_diff_eq(frame.projection * frame.view, 1e-6));
    }

    #[test]
    fn hidden_node_is_skipped_but_children_are_not() {
        let (mut g, camera, parent, child) = scene();
        g.set_renderable(parent, Some(Renderable::new(MeshHandle(2), MaterialHandle(0))))
            .unwrap();
        g.set_visible(parent, false).unwrap();
        let frame = Frame::collect(&g, &camera, &[]).unwrap();
        let nodes: Vec<NodeId> = frame.items.iter().map(|i| i.node).collect();
        assert_eq!(nodes, vec![child]);

        g.set_visible(child, false).unwrap();
        assert!(Frame::collect(&g, &camera, &[]).unwrap().items.is_empty());
    }

    #[test]
    fn override_material_is_drawn() {
        let (mut g, camera, _, child) = scene();
        g.renderable_mut(child).unwrap().material_override = Some(MaterialHandle(5));
        let frame = Frame::collect(&g, &camera, &[]).unwrap();
        assert_eq!(frame.items[0].material, MaterialHandle(5));
    }

    #[test]
    fn excess_lights_are_dropped() {
        let (g, camera, _, _) = scene();
        let lights = vec![Light::ambient(Vec3::ONE, 0.1); MAX_LIGHTS + 3];
        let frame = Frame::collect(&g, &camera, &lights).unwrap();
        assert_eq!(frame.lights.len(), MAX_LIGHTS);
    }

    #[test]
    fn instances_carry_rows_and_diffuse() {
        let (g, camera, _, _) = scene();
        let mut materials = MaterialLibrary::new();
        materials.insert(Material::infected());
        let frame = Frame::collect(&g, &camera, &[]).unwrap();
        let instances = frame.instances(&materials);
        assert_eq!(instances.len(), 1);
        // Translation sits in the last column, i.e. the fourth entry of each row.
        assert_eq!(instances[0].model[0][3], 1.0);
        assert_eq!(instances[0].model[1][3], 2.0);
        assert_eq!(instances[0].color, [0.0, 1.0, 0.0, 1.0]);
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), std::mem::size_of::<InstanceData>());
    }

    #[test]
    fn missing_camera_node_is_an_error() {
        let g = SceneGraph::new();
        let camera = Camera::on_node(NodeId(42), Projection::default());
        assert!(matches!(
            Frame::collect(&g, &camera, &[]),
            Err(SceneError::NodeNotFound(NodeId(42)))
        ));
    }
}
