//! Flat, level-ordered transform hierarchy
//!
//! Nodes are plain indices. Each node stores its parent index and its depth
//! ("level"); world matrices are propagated one level at a time so a parent is
//! always resolved before any of its children without recursion. Nodes within
//! one level never depend on each other.

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Mat4;

/// Index-based hierarchy with local and world matrices per node
#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    parents: Vec<Option<usize>>,
    levels: Vec<u32>,
    local: Vec<Mat4>,
    world: Vec<Mat4>,
    updated: Vec<bool>,
}

impl TransformStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parent links, computing levels.
    ///
    /// Fails on out-of-range parents and on cycles.
    pub fn from_parents(parents: &[Option<usize>], locals: &[Mat4]) -> SceneResult<Self> {
        if parents.len() != locals.len() {
            return Err(SceneError::InvalidHierarchy(format!(
                "{} parent links for {} local matrices",
                parents.len(),
                locals.len()
            )));
        }

        let levels = compute_levels(parents)?;
        let mut store = Self::default();
        for ((parent, level), local) in parents.iter().zip(&levels).zip(locals) {
            let node = store.add_node(*local);
            store.parents[node] = *parent;
            store.levels[node] = *level;
        }
        Ok(store)
    }

    /// Append a root node and return its index
    pub fn add_node(&mut self, local: Mat4) -> usize {
        self.parents.push(None);
        self.levels.push(0);
        self.local.push(local);
        self.world.push(local);
        self.updated.push(true);
        self.parents.len() - 1
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True when the store holds no nodes
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Set a node's parent and level. The caller keeps
    /// `level == level(parent) + 1`; [`TransformStore::validate_levels`] checks it.
    pub fn set_hierarchy(&mut self, node: usize, parent: Option<usize>, level: u32) -> SceneResult<()> {
        self.check_index(node)?;
        if let Some(p) = parent {
            self.check_index(p)?;
        }
        self.parents[node] = parent;
        self.levels[node] = level;
        self.updated[node] = true;
        Ok(())
    }

    /// Replace a node's local matrix
    pub fn set_local_matrix(&mut self, node: usize, matrix: Mat4) -> SceneResult<()> {
        self.check_index(node)?;
        self.local[node] = matrix;
        self.updated[node] = true;
        Ok(())
    }

    /// Recompute every world matrix, level by level.
    ///
    /// Every node is recomputed on each call; the per-node flag only records
    /// that a mutator touched the node since the previous pass.
    pub fn update_matrices(&mut self) {
        for batch in self.level_batches() {
            for node in batch {
                self.world[node] = match self.parents[node] {
                    Some(parent) => self.world[parent] * self.local[node],
                    None => self.local[node],
                };
                self.updated[node] = false;
            }
        }
    }

    /// Node indices grouped by level, root level first
    pub fn level_batches(&self) -> Vec<Vec<usize>> {
        let max_level = self.levels.iter().copied().max().unwrap_or(0) as usize;
        let mut batches = vec![Vec::new(); if self.is_empty() { 0 } else { max_level + 1 }];
        for (node, level) in self.levels.iter().enumerate() {
            batches[*level as usize].push(node);
        }
        batches
    }

    /// Check that every child sits exactly one level below its parent
    pub fn validate_levels(&self) -> SceneResult<()> {
        for (node, parent) in self.parents.iter().enumerate() {
            let expected = parent.map_or(0, |p| self.levels[p] + 1);
            if self.levels[node] != expected {
                return Err(SceneError::InvalidHierarchy(format!(
                    "node {node} has level {} but its parent implies {expected}",
                    self.levels[node]
                )));
            }
        }
        Ok(())
    }

    /// World matrix from the last update
    pub fn world_matrix(&self, node: usize) -> Option<&Mat4> {
        self.world.get(node)
    }

    /// Local matrix
    pub fn local_matrix(&self, node: usize) -> Option<&Mat4> {
        self.local.get(node)
    }

    /// Parent index, `None` for roots and unknown nodes
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }

    /// Depth of a node
    pub fn level(&self, node: usize) -> Option<u32> {
        self.levels.get(node).copied()
    }

    /// True if a mutator touched the node since the last update
    pub fn is_updated(&self, node: usize) -> bool {
        self.updated.get(node).copied().unwrap_or(false)
    }

    /// Indices of the direct children of `node`
    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(move |(_, parent)| **parent == Some(node))
            .map(|(index, _)| index)
    }

    fn check_index(&self, node: usize) -> SceneResult<()> {
        if node < self.len() {
            Ok(())
        } else {
            Err(SceneError::InvalidHierarchy(format!(
                "node index {node} out of range ({} nodes)",
                self.len()
            )))
        }
    }
}

/// Depth of every node given parent links
pub fn compute_levels(parents: &[Option<usize>]) -> SceneResult<Vec<u32>> {
    let mut levels: Vec<Option<u32>> = vec![None; parents.len()];

    for start in 0..parents.len() {
        let mut chain = Vec::new();
        let mut current = start;
        let base = loop {
            if let Some(level) = levels[current] {
                break level + 1;
            }
            if chain.contains(&current) {
                return Err(SceneError::InvalidHierarchy(format!(
                    "cycle through node {current}"
                )));
            }
            chain.push(current);
            match parents[current] {
                Some(parent) if parent >= parents.len() => {
                    return Err(SceneError::InvalidHierarchy(format!(
                        "node {current} references missing parent {parent}"
                    )));
                }
                Some(parent) => current = parent,
                None => break 0,
            }
        };
        // chain holds start..=topmost unresolved ancestor; assign from the top down
        for (offset, node) in chain.iter().rev().enumerate() {
            levels[*node] = Some(base + offset as u32);
        }
    }

    Ok(levels.into_iter().map(|level| level.unwrap_or(0)).collect())
}
