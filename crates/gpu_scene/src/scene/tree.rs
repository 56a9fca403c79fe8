//! Scene node arena
//!
//! Nodes live in a slot map and refer to each other by [`NodeKey`]. The tree
//! owns every node; parent links are back-references kept consistent by
//! [`SceneTree::add_child`] and [`SceneTree::remove_child`]. A detached node
//! stays in the arena, addressable by key and name, until
//! [`SceneTree::destroy`] removes it.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Mat4;
use super::bounds::Bounds;
use super::node::{DrawContext, NodeKey, SceneNode};

/// Arena of scene nodes with a name index
#[derive(Debug, Default)]
pub struct SceneTree {
    nodes: SlotMap<NodeKey, SceneNode>,
    names: HashMap<String, NodeKey>,
}

impl SceneTree {
    /// Empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node. Returns `None` if the name is taken.
    pub fn create_node(&mut self, name: &str, id: u32) -> Option<NodeKey> {
        if self.names.contains_key(name) {
            return None;
        }
        let key = self.nodes.insert(SceneNode::new(name.to_string(), id));
        self.names.insert(name.to_string(), key);
        Some(key)
    }

    /// Look up a node by name
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.names.get(name).copied()
    }

    /// Borrow a node
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutably borrow a node
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// True if the key refers to a live node
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of a node
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    /// Children of a node; empty for unknown keys
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[] as &[NodeKey], |n| n.children.as_slice())
    }

    /// True if `ancestor` is `key` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Attach `child` under `parent`, detaching it from any previous parent,
    /// and refresh the child's subtree against the parent's world matrix.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> SceneResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(SceneError::InvalidHierarchy("attach of a dead node".to_string()));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::InvalidHierarchy(format!(
                "attaching '{}' under '{}' would create a cycle",
                self.nodes[child].name, self.nodes[parent].name
            )));
        }

        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        let level = self.nodes[parent].level + 1;
        self.set_subtree_level(child, level);

        let parent_world = self.nodes[parent].world_matrix;
        self.refresh_transform(child, &parent_world);
        Ok(())
    }

    /// Detach `child` if its parent is `parent`. Returns whether it was.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Detach a node from whatever parent it has. Returns whether it had one.
    pub fn remove_from_parent(&mut self, child: NodeKey) -> bool {
        self.parent(child).is_some_and(|parent| self.remove_child(parent, child))
    }

    /// Remove a node and its subtree from the arena. Returns the removed nodes.
    pub fn destroy(&mut self, key: NodeKey) -> Vec<SceneNode> {
        if !self.contains(key) {
            return Vec::new();
        }
        self.detach(key);

        let mut removed = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                self.names.remove(&node.name);
                stack.extend(node.children.iter().copied());
                removed.push(node);
            }
        }
        removed
    }

    /// Recompute world matrices and bounds of `key`'s subtree.
    ///
    /// World matrices flow down; world bounds are the node's transformed
    /// local bounds merged with its children's refreshed world bounds.
    pub fn refresh_transform(&mut self, key: NodeKey, parent_matrix: &Mat4) -> Option<Bounds> {
        let node = self.nodes.get_mut(key)?;
        let world = parent_matrix * node.transform.to_matrix();
        node.world_matrix = world;
        let mut bounds = if node.local_bounds.is_empty() {
            Bounds::default()
        } else {
            node.local_bounds.transform(&world)
        };

        let child_count = node.children.len();
        for index in 0..child_count {
            let child = self.nodes[key].children[index];
            if let Some(child_bounds) = self.refresh_transform(child, &world) {
                bounds.merge(&child_bounds);
            }
        }

        self.nodes[key].world_bounds = bounds;
        Some(bounds)
    }

    /// Collect render objects from visible nodes under `key`.
    ///
    /// Hidden nodes skip their whole subtree. No GPU work happens here.
    pub fn draw(&self, key: NodeKey, ctx: &mut DrawContext) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        node.kind.collect(node.id, node.is_static, &mut ctx.objects);
        for &child in &node.children {
            self.draw(child, ctx);
        }
    }

    /// Keys of `key`'s subtree, parents before children
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                order.push(k);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Iterate every live node
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    fn detach(&mut self, child: NodeKey) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        self.set_subtree_level(child, 0);
    }

    fn set_subtree_level(&mut self, key: NodeKey, level: u32) {
        let mut stack = vec![(key, level)];
        while let Some((k, lvl)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(k) {
                node.level = lvl;
                stack.extend(node.children.iter().map(|&c| (c, lvl + 1)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MeshKey;
    use crate::foundation::math::{Transform, Vec3};
    use crate::scene::node::NodeKind;
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    const EPSILON: f32 = 1e-5;

    fn tree_with(names: &[&str]) -> (SceneTree, Vec<NodeKey>) {
        let mut tree = SceneTree::new();
        let keys = names
            .iter()
            .enumerate()
            .map(|(id, name)| tree.create_node(name, id as u32).unwrap())
            .collect();
        (tree, keys)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (mut tree, _) = tree_with(&["a"]);
        assert!(tree.create_node("a", 9).is_none());
        assert!(tree.find("a").is_some());
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn test_reparent_refreshes_child_immediately() {
        let (mut tree, keys) = tree_with(&["root", "a", "b"]);
        let (root, a, b) = (keys[0], keys[1], keys[2]);
        tree.get_mut(a).unwrap().transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        tree.add_child(root, a).unwrap();

        tree.add_child(a, b).unwrap();

        assert_relative_eq!(
            *tree.get(b).unwrap().world_matrix(),
            *tree.get(a).unwrap().world_matrix(),
            epsilon = EPSILON
        );
        assert_relative_eq!(tree.get(b).unwrap().world_matrix()[(0, 3)], 10.0, epsilon = EPSILON);
    }

    #[test]
    fn test_add_child_moves_between_parents() {
        let (mut tree, keys) = tree_with(&["p1", "p2", "c", "gc"]);
        let (p1, p2, c, gc) = (keys[0], keys[1], keys[2], keys[3]);
        tree.add_child(p1, c).unwrap();
        tree.add_child(c, gc).unwrap();
        tree.add_child(p2, p1).unwrap();

        tree.add_child(p2, c).unwrap();

        assert!(tree.children(p1).is_empty());
        assert_eq!(tree.children(p2), &[p1, c]);
        assert_eq!(tree.parent(c), Some(p2));
        assert_eq!(tree.get(c).unwrap().level(), 1);
        assert_eq!(tree.get(gc).unwrap().level(), 2);
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut tree, keys) = tree_with(&["a", "b"]);
        tree.add_child(keys[0], keys[1]).unwrap();

        assert!(tree.add_child(keys[1], keys[0]).is_err());
        assert!(tree.add_child(keys[0], keys[0]).is_err());
    }

    #[test]
    fn test_remove_child_detaches_without_destroying() {
        let (mut tree, keys) = tree_with(&["p", "c", "other"]);
        tree.add_child(keys[0], keys[1]).unwrap();

        assert!(!tree.remove_child(keys[2], keys[1]));
        assert!(tree.remove_child(keys[0], keys[1]));

        assert!(tree.contains(keys[1]));
        assert_eq!(tree.parent(keys[1]), None);
        assert!(tree.children(keys[0]).is_empty());
        assert!(!tree.remove_from_parent(keys[1]));
    }

    #[test]
    fn test_destroy_removes_subtree_and_names() {
        let (mut tree, keys) = tree_with(&["root", "a", "b", "c"]);
        tree.add_child(keys[0], keys[1]).unwrap();
        tree.add_child(keys[1], keys[2]).unwrap();
        tree.add_child(keys[0], keys[3]).unwrap();

        let removed = tree.destroy(keys[1]);

        assert_eq!(removed.len(), 2);
        assert_eq!(tree.len(), 2);
        assert!(tree.find("b").is_none());
        assert_eq!(tree.children(keys[0]), &[keys[3]]);
        // Names become reusable
        assert!(tree.create_node("a", 7).is_some());
    }

    #[test]
    fn test_world_bounds_merge_children() {
        let (mut tree, keys) = tree_with(&["root", "left", "right"]);
        let unit = Bounds::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        for (key, x) in [(keys[1], -5.0), (keys[2], 5.0)] {
            let node = tree.get_mut(key).unwrap();
            node.local_bounds = unit;
            node.transform = Transform::from_position(Vec3::new(x, 0.0, 0.0));
        }
        tree.add_child(keys[0], keys[1]).unwrap();
        tree.add_child(keys[0], keys[2]).unwrap();

        let bounds = tree.refresh_transform(keys[0], &Mat4::identity()).unwrap();

        assert_relative_eq!(bounds.min, Vec3::new(-6.0, -1.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(bounds.max, Vec3::new(6.0, 1.0, 1.0), epsilon = EPSILON);
        assert_eq!(*tree.get(keys[0]).unwrap().world_bounds(), bounds);
    }

    #[test]
    fn test_draw_collects_visible_meshes() {
        let (mut tree, keys) = tree_with(&["root", "mesh", "hidden", "under_hidden"]);
        let mesh = MeshKey::from(KeyData::from_ffi(1));
        for key in &keys[1..] {
            tree.get_mut(*key).unwrap().kind = NodeKind::StaticMesh { mesh };
        }
        tree.add_child(keys[0], keys[1]).unwrap();
        tree.add_child(keys[0], keys[2]).unwrap();
        tree.add_child(keys[2], keys[3]).unwrap();
        tree.get_mut(keys[2]).unwrap().visible = false;

        let mut ctx = DrawContext::new();
        tree.draw(keys[0], &mut ctx);

        assert_eq!(ctx.objects.len(), 1);
        assert_eq!(ctx.objects[0].node_id, 1);
        assert!(ctx.objects[0].is_static);
    }

    #[test]
    fn test_descendants_are_parent_first() {
        let (mut tree, keys) = tree_with(&["r", "a", "b", "c"]);
        tree.add_child(keys[0], keys[1]).unwrap();
        tree.add_child(keys[1], keys[2]).unwrap();
        tree.add_child(keys[0], keys[3]).unwrap();

        assert_eq!(tree.descendants(keys[0]), vec![keys[0], keys[1], keys[2], keys[3]]);
    }
}
