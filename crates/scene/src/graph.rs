use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use weave_common::{Transform, math};

use crate::components::Renderable;

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Errors from scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("the root node cannot be reparented")]
    RootReparent,
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {0:?} must be a direct child of the root")]
    NotRootChild(NodeId),
}

/// A node in the transform hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub visible: bool,
    transform: Transform,
    local: Mat4,
    world: Mat4,
    normal: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: u32,
    dirty: bool,
    renderable: Option<Renderable>,
}

impl Node {
    fn new(name: String, transform: Transform, parent: Option<NodeId>, depth: u32) -> Self {
        let local = transform.matrix();
        Self {
            name,
            visible: true,
            transform,
            local,
            world: local,
            normal: math::normal_matrix(&local),
            parent,
            children: Vec::new(),
            depth,
            dirty: false,
            renderable: None,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Local-to-parent matrix as of the last recompute.
    pub fn local_matrix(&self) -> Mat4 {
        self.local
    }

    /// Local-to-world matrix as of the last recompute.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    pub fn normal_matrix(&self) -> Mat4 {
        self.normal
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// True when the transform changed since the last recompute.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }
}

/// Arena-backed transform hierarchy.
///
/// Node 0 is the root. Every other node has exactly one parent. World
/// matrices are pushed top-down: a recompute at a node refreshes its whole
/// subtree.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph containing only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root".into(), Transform::default(), None, 0)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    /// Spawn a node under the root.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        self.insert(NodeId::ROOT, name.into(), transform)
    }

    /// Spawn a node under `parent`.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.get(parent)?;
        Ok(self.insert(parent, name.into(), transform))
    }

    fn insert(&mut self, parent: NodeId, name: String, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (parent_world, depth) = {
            let p = &self.nodes[parent.0];
            (p.world, p.depth + 1)
        };
        let mut node = Node::new(name, transform, Some(parent), depth);
        node.world = parent_world * node.local;
        node.normal = math::normal_matrix(&node.world);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Reparent `child` under `parent`.
    ///
    /// The child is removed from its previous parent first, so it never
    /// appears in two child lists. The parent's subtree is recomputed.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.get(parent)?;
        self.get(child)?;
        if child == NodeId::ROOT {
            return Err(SceneError::RootReparent);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        if let Some(old) = self.nodes[child.0].parent {
            if old != parent {
                self.nodes[old.0].children.retain(|c| *c != child);
            }
        }
        self.nodes[child.0].parent = Some(parent);
        if !self.nodes[parent.0].children.contains(&child) {
            self.nodes[parent.0].children.push(child);
        }

        let depth = self.nodes[parent.0].depth + 1;
        self.set_subtree_depth(child, depth);
        self.recompute_subtree(parent, true);
        tracing::trace!(?parent, ?child, "attached node");
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    fn set_subtree_depth(&mut self, id: NodeId, depth: u32) {
        let mut stack = vec![(id, depth)];
        while let Some((id, depth)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.depth = depth;
            stack.extend(node.children.iter().map(|c| (*c, depth + 1)));
        }
    }

    /// Recompute the world matrix of `id` and everything below it.
    ///
    /// With `force_local` the node's local matrix is rebuilt from its
    /// transform first. Descendants rebuild their local matrix only when
    /// their own transform is dirty.
    pub fn recompute_world(&mut self, id: NodeId, force_local: bool) -> Result<(), SceneError> {
        self.get(id)?;
        self.recompute_subtree(id, force_local);
        Ok(())
    }

    fn recompute_subtree(&mut self, id: NodeId, force_local: bool) {
        let parent_world = self.nodes[id.0].parent.map(|p| self.nodes[p.0].world);
        let node = &mut self.nodes[id.0];
        if force_local || node.dirty {
            node.local = node.transform.matrix();
        }
        node.world = match parent_world {
            Some(pw) => pw * node.local,
            None => node.local,
        };
        node.normal = math::normal_matrix(&node.world);
        node.dirty = false;

        for i in 0..self.nodes[id.0].children.len() {
            let child = self.nodes[id.0].children[i];
            self.recompute_subtree(child, false);
        }
    }

    /// Recompute every dirty node, parents before children.
    ///
    /// Returns the number of dirty subtrees that were recomputed.
    pub fn flush_dirty(&mut self) -> usize {
        let mut recomputed = 0;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if self.nodes[id.0].dirty {
                self.recompute_subtree(id, true);
                recomputed += 1;
                continue;
            }
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        recomputed
    }

    fn modify(&mut self, id: NodeId, f: impl FnOnce(&mut Transform)) -> Result<(), SceneError> {
        let node = self.get_mut(id)?;
        f(&mut node.transform);
        node.dirty = true;
        Ok(())
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.modify(id, |t| *t = transform)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.modify(id, |t| t.position = position)
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Vec3) -> Result<(), SceneError> {
        self.modify(id, |t| t.rotation = rotation)
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) -> Result<(), SceneError> {
        self.modify(id, |t| t.scale = scale)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_renderable(
        &mut self,
        id: NodeId,
        renderable: Option<Renderable>,
    ) -> Result<(), SceneError> {
        self.get_mut(id)?.renderable = renderable;
        Ok(())
    }

    pub fn renderable_mut(&mut self, id: NodeId) -> Option<&mut Renderable> {
        self.nodes.get_mut(id.0)?.renderable.as_mut()
    }

    /// World-space position of the node's origin.
    pub fn global_position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.world.transform_point3(Vec3::ZERO))
    }

    /// Sum of Euler rotations along the parent chain.
    ///
    /// Additive, so only exact while at most one ancestor is rotated about
    /// more than one axis.
    pub fn global_rotation(&self, id: NodeId) -> Option<Vec3> {
        self.accumulate(id, |t| t.rotation)
    }

    /// Sum of scales along the parent chain (additive, like
    /// [`global_rotation`](Self::global_rotation)).
    pub fn global_scale(&self, id: NodeId) -> Option<Vec3> {
        self.accumulate(id, |t| t.scale)
    }

    fn accumulate(&self, id: NodeId, field: impl Fn(&Transform) -> Vec3) -> Option<Vec3> {
        let mut node = self.node(id)?;
        let mut sum = field(&node.transform);
        while let Some(p) = node.parent {
            node = &self.nodes[p.0];
            sum += field(&node.transform);
        }
        Some(sum)
    }

    /// Visit `start` and its descendants in pre-order.
    pub fn traverse(&self, start: NodeId, mut f: impl FnMut(NodeId, &Node)) {
        if self.node(start).is_none() {
            return;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            f(id, node);
            stack.extend(node.children.iter().rev());
        }
    }

    /// Indented, one-line-per-node dump of the hierarchy.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.traverse(NodeId::ROOT, |_, node| {
            for _ in 0..node.depth {
                out.push_str("  ");
            }
            out.push_str(&node.name);
            if !node.visible {
                out.push_str(" [hidden]");
            }
            out.push('\n');
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn at(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_position(Vec3::new(x, y, z))
    }

    #[test]
    fn graph_starts_with_root() {
        let g = SceneGraph::new();
        assert_eq!(g.len(), 1);
        let root = g.node(g.root()).unwrap();
        assert_eq!(root.name, "root");
        assert!(root.parent().is_none());
        assert_eq!(root.world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn spawn_computes_world_immediately() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", at(1.0, 2.0, 3.0));
        let b = g.spawn_child(a, "b", at(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(g.global_position(b), Some(Vec3::new(2.0, 2.0, 3.0)));
        assert_eq!(g.node(b).unwrap().depth(), 2);
    }

    #[test]
    fn world_is_parent_world_times_local() {
        let mut g = SceneGraph::new();
        let parent = g.spawn(
            "parent",
            Transform {
                position: Vec3::new(5.0, 0.0, 0.0),
                rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
                scale: Vec3::splat(2.0),
            },
        );
        let child = g.spawn_child(parent, "child", at(1.0, 0.0, 0.0)).unwrap();
        let p = g.node(parent).unwrap();
        let c = g.node(child).unwrap();
        assert!(c.world_matrix().abs_diff_eq(p.world_matrix() * c.local_matrix(), 1e-6));

        // (1,0,0) scaled to 2, yawed onto -Z, offset by the parent.
        let pos = g.global_position(child).unwrap();
        assert!((pos - Vec3::new(5.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn attach_moves_child_between_parents() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", at(10.0, 0.0, 0.0));
        let b = g.spawn("b", at(0.0, 10.0, 0.0));
        let c = g.spawn_child(a, "c", at(1.0, 0.0, 0.0)).unwrap();

        g.attach(b, c).unwrap();
        assert!(!g.node(a).unwrap().children().contains(&c));
        assert_eq!(g.node(b).unwrap().children(), &[c]);
        assert_eq!(g.node(c).unwrap().parent(), Some(b));
        assert_eq!(g.global_position(c), Some(Vec3::new(1.0, 10.0, 0.0)));
    }

    #[test]
    fn attach_twice_keeps_single_entry() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let c = g.spawn("c", Transform::default());
        g.attach(a, c).unwrap();
        g.attach(a, c).unwrap();
        assert_eq!(g.node(a).unwrap().children(), &[c]);
        let root_children = g.node(g.root()).unwrap().children();
        assert_eq!(root_children, &[a]);
    }

    #[test]
    fn attach_updates_subtree_depth() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let b = g.spawn_child(a, "b", Transform::default()).unwrap();
        let c = g.spawn_child(b, "c", Transform::default()).unwrap();
        let d = g.spawn("d", Transform::default());
        g.attach(c, d).unwrap();
        assert_eq!(g.node(d).unwrap().depth(), 4);

        g.attach(g.root(), b).unwrap();
        assert_eq!(g.node(b).unwrap().depth(), 1);
        assert_eq!(g.node(c).unwrap().depth(), 2);
        assert_eq!(g.node(d).unwrap().depth(), 3);
    }

    #[test]
    fn attach_rejects_cycles_and_root() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let b = g.spawn_child(a, "b", Transform::default()).unwrap();
        assert_eq!(g.attach(b, a), Err(SceneError::Cycle { parent: b, child: a }));
        assert_eq!(g.attach(a, a), Err(SceneError::Cycle { parent: a, child: a }));
        assert_eq!(g.attach(a, NodeId::ROOT), Err(SceneError::RootReparent));
        assert_eq!(
            g.attach(a, NodeId(99)),
            Err(SceneError::NodeNotFound(NodeId(99)))
        );
    }

    #[test]
    fn mutation_marks_dirty_until_flush() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let b = g.spawn_child(a, "b", at(0.0, 1.0, 0.0)).unwrap();

        g.set_position(a, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert!(g.node(a).unwrap().is_dirty());
        // Stale until the driver flushes.
        assert_eq!(g.global_position(b), Some(Vec3::new(0.0, 1.0, 0.0)));

        assert_eq!(g.flush_dirty(), 1);
        assert!(!g.node(a).unwrap().is_dirty());
        assert_eq!(g.global_position(b), Some(Vec3::new(3.0, 1.0, 0.0)));
        assert_eq!(g.flush_dirty(), 0);
    }

    #[test]
    fn cascade_picks_up_dirty_child_transform() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let b = g.spawn_child(a, "b", Transform::default()).unwrap();
        g.set_position(a, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        g.set_position(b, Vec3::new(0.0, 0.0, 2.0)).unwrap();

        // Parent's cascade reaches b first and applies its pending change.
        assert_eq!(g.flush_dirty(), 1);
        assert!(!g.node(b).unwrap().is_dirty());
        assert_eq!(g.global_position(b), Some(Vec3::new(1.0, 0.0, 2.0)));
    }

    #[test]
    fn recompute_without_force_keeps_clean_local() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", at(1.0, 0.0, 0.0));
        let before = g.node(a).unwrap().local_matrix();
        g.recompute_world(a, false).unwrap();
        assert_eq!(g.node(a).unwrap().local_matrix(), before);
        assert!(g.recompute_world(NodeId(42), true).is_err());
    }

    #[test]
    fn global_rotation_and_scale_are_additive() {
        let mut g = SceneGraph::new();
        let a = g.spawn(
            "a",
            Transform {
                rotation: Vec3::new(0.0, 0.5, 0.0),
                ..Transform::default()
            },
        );
        let b = g
            .spawn_child(
                a,
                "b",
                Transform {
                    rotation: Vec3::new(0.1, 0.25, 0.0),
                    scale: Vec3::splat(2.0),
                    ..Transform::default()
                },
            )
            .unwrap();
        assert_eq!(g.global_rotation(b), Some(Vec3::new(0.1, 0.75, 0.0)));
        // root (1) + a (1) + b (2)
        assert_eq!(g.global_scale(b), Some(Vec3::splat(4.0)));
    }

    #[test]
    fn degenerate_scale_gives_identity_normal_matrix() {
        let mut g = SceneGraph::new();
        let flat = g.spawn(
            "flat",
            Transform {
                scale: Vec3::new(1.0, 0.0, 1.0),
                ..Transform::default()
            },
        );
        assert_eq!(g.node(flat).unwrap().normal_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn traverse_is_pre_order() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a", Transform::default());
        let b = g.spawn_child(a, "b", Transform::default()).unwrap();
        let c = g.spawn("c", Transform::default());
        let mut order = Vec::new();
        g.traverse(g.root(), |id, _| order.push(id));
        assert_eq!(order, vec![NodeId::ROOT, a, b, c]);
    }

    #[test]
    fn describe_indents_by_depth() {
        let mut g = SceneGraph::new();
        let a = g.spawn("pedestrian_0", Transform::default());
        let b = g.spawn_child(a, "submesh_0", Transform::default()).unwrap();
        g.set_visible(b, false).unwrap();
        let text = g.describe();
        assert_eq!(text, "root\n  pedestrian_0\n    submesh_0 [hidden]\n");
    }
}
