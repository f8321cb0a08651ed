//! The incremental layout tree (§4.7, §6): a `Node` subtree materialized
//! once into an arena, then mutated in place across `compute_incremental`
//! calls instead of being rebuilt from scratch. Stored as arena indices
//! rather than nested owned values so a child can be replaced or removed
//! without walking every ancestor's owned `Vec<Node>` (§9).

use std::collections::{HashMap, HashSet};

use crate::dispatcher::{self, DependencyKind};
use crate::error::LayoutError;
use crate::geometry::Size;
use crate::incremental::cache::{CacheAdapter, CacheStats, ConstraintCache, WriteThroughCache};
use crate::layout::{Layout, LayoutConfig, LayoutContext};
use crate::node::{MeasureFn, Node};
use crate::style::Style;

type ArenaIndex = usize;

struct LayoutNodeData {
    uid: u64,
    id: String,
    style: Style,
    parent: Option<ArenaIndex>,
    children: Vec<ArenaIndex>,
    measure: Option<MeasureFn>,
    text: Option<String>,
}

/// A `Node` subtree that persists across layout calls. Mutations
/// (`set_style`, `add_child`, `remove_child`, `resize_viewport`) mark the
/// affected nodes and their ancestors dirty instead of discarding state;
/// `compute_incremental` reuses every cached `Layout` whose subtree is
/// untouched, per the testable properties in §8.
pub struct LayoutTree {
    arena: Vec<Option<LayoutNodeData>>,
    free: Vec<ArenaIndex>,
    uid_to_index: HashMap<u64, ArenaIndex>,
    root: ArenaIndex,
    viewport_width: f64,
    viewport_height: f64,
    config: LayoutConfig,
    cache: ConstraintCache,
    /// Nodes whose own constraints or style changed since the last
    /// `compute_incremental`; `dirty => cache entry ignored`, per §9's
    /// invariant.
    dirty: HashSet<u64>,
    /// Nodes with no change of their own, but with a dirty descendant —
    /// still need to recompute (their size may depend on that child) even
    /// though their own cache entry would otherwise hit.
    children_dirty: HashSet<u64>,
}

impl LayoutTree {
    pub fn new(root: Node, viewport_width: f64, viewport_height: f64, config: LayoutConfig) -> Self {
        let mut tree = LayoutTree {
            arena: Vec::new(),
            free: Vec::new(),
            uid_to_index: HashMap::new(),
            root: 0,
            viewport_width,
            viewport_height,
            config,
            cache: ConstraintCache::new(),
            dirty: HashSet::new(),
            children_dirty: HashSet::new(),
        };
        let root_idx = tree.insert_subtree(root, None);
        tree.root = root_idx;
        tree
    }

    pub fn viewport_size(&self) -> Size<f64> {
        Size { width: self.viewport_width, height: self.viewport_height }
    }

    fn alloc_slot(&mut self) -> ArenaIndex {
        match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.arena.push(None);
                self.arena.len() - 1
            }
        }
    }

    fn insert_subtree(&mut self, node: Node, parent: Option<ArenaIndex>) -> ArenaIndex {
        let Node { uid, id, style, children, measure, text } = node;
        let idx = self.alloc_slot();
        self.arena[idx] = Some(LayoutNodeData {
            uid,
            id,
            style,
            parent,
            children: Vec::new(),
            measure,
            text,
        });
        self.uid_to_index.insert(uid, idx);
        let child_indices: Vec<ArenaIndex> =
            children.into_iter().map(|c| self.insert_subtree(c, Some(idx))).collect();
        self.arena[idx].as_mut().expect("just inserted").children = child_indices;
        idx
    }

    fn remove_subtree(&mut self, idx: ArenaIndex) {
        let data = self.arena[idx].take().expect("arena slot alive");
        self.uid_to_index.remove(&data.uid);
        self.cache.remove(data.uid);
        self.dirty.remove(&data.uid);
        self.children_dirty.remove(&data.uid);
        for child in data.children {
            self.remove_subtree(child);
        }
        self.free.push(idx);
    }

    fn index_of(&self, uid: u64) -> Result<ArenaIndex, LayoutError> {
        self.uid_to_index.get(&uid).copied().ok_or(LayoutError::UnknownUid(uid))
    }

    /// Marks `idx` dirty and walks every ancestor marking `children_dirty`,
    /// per the `node.dirty => ancestor.children_dirty` invariant. Stops
    /// early once an ancestor is already marked, since everything above it
    /// is already marked transitively.
    fn mark_dirty_idx(&mut self, idx: ArenaIndex) {
        let uid = self.arena[idx].as_ref().expect("arena slot alive").uid;
        self.dirty.insert(uid);
        let mut cursor = self.arena[idx].as_ref().and_then(|d| d.parent);
        while let Some(parent_idx) = cursor {
            let parent_uid = self.arena[parent_idx].as_ref().expect("arena slot alive").uid;
            if !self.children_dirty.insert(parent_uid) {
                break;
            }
            cursor = self.arena[parent_idx].as_ref().and_then(|d| d.parent);
        }
    }

    /// Explicit manual invalidation hook, independent of the structured
    /// mutation API below — useful when a caller knows a node's externally
    /// observed content changed (e.g. a measure callback's backing text)
    /// without going through `set_style`.
    pub fn mark_dirty(&mut self, uid: u64) -> Result<(), LayoutError> {
        let idx = self.index_of(uid)?;
        self.mark_dirty_idx(idx);
        Ok(())
    }

    /// Replaces a node's style in place. A no-op style change (e.g. a
    /// color-only edit that never reaches any layout-affecting field)
    /// leaves the tree untouched so the following `compute_incremental`
    /// sees a 100% cache hit rate, per scenario 6.
    pub fn set_style(&mut self, uid: u64, new_style: Style) -> Result<(), LayoutError> {
        let idx = self.index_of(uid)?;
        let data = self.arena[idx].as_mut().expect("arena slot alive");
        if data.style == new_style {
            return Ok(());
        }
        data.style = new_style;
        self.mark_dirty_idx(idx);
        Ok(())
    }

    pub fn style(&self, uid: u64) -> Result<&Style, LayoutError> {
        let idx = self.index_of(uid)?;
        Ok(&self.arena[idx].as_ref().expect("arena slot alive").style)
    }

    /// Inserts `child`'s whole subtree as the last child of `parent_uid`,
    /// trusting the uids already carried by `child` and its descendants
    /// (this tree never allocates uids of its own, matching `Node`'s
    /// caller-stable-identity contract). Returns the new child's uid.
    pub fn add_child(&mut self, parent_uid: u64, child: Node) -> Result<u64, LayoutError> {
        let parent_idx = self.index_of(parent_uid)?;
        let child_uid = child.uid;
        let child_idx = self.insert_subtree(child, Some(parent_idx));
        self.arena[parent_idx].as_mut().expect("arena slot alive").children.push(child_idx);
        self.mark_dirty_idx(parent_idx);
        Ok(child_uid)
    }

    /// Removes the `index`-th child of `parent_uid`, dropping its whole
    /// subtree from the arena and the cache.
    pub fn remove_child(&mut self, parent_uid: u64, index: usize) -> Result<(), LayoutError> {
        let parent_idx = self.index_of(parent_uid)?;
        let len = self.arena[parent_idx].as_ref().expect("arena slot alive").children.len();
        if index >= len {
            return Err(LayoutError::ChildIndexOutOfBounds { uid: parent_uid, index, len });
        }
        let child_idx = self.arena[parent_idx].as_mut().expect("arena slot alive").children.remove(index);
        self.remove_subtree(child_idx);
        self.mark_dirty_idx(parent_idx);
        Ok(())
    }

    /// Removes `child_uid` from `parent_uid`'s children by identity rather
    /// than position, surfacing `NotAChild` when `child_uid` isn't actually
    /// a child of `parent_uid` (including when it doesn't exist at all).
    pub fn remove_child_by_uid(&mut self, parent_uid: u64, child_uid: u64) -> Result<(), LayoutError> {
        let parent_idx = self.index_of(parent_uid)?;
        let children = &self.arena[parent_idx].as_ref().expect("arena slot alive").children;
        let position = children
            .iter()
            .position(|&c| self.arena[c].as_ref().map(|d| d.uid) == Some(child_uid))
            .ok_or(LayoutError::NotAChild { parent: parent_uid, child: child_uid })?;
        self.remove_child(parent_uid, position)
    }

    /// Resizes the viewport and selectively invalidates only the nodes
    /// whose `DependencyKind` is actually affected by the changed axes:
    /// `Viewport`-dependent nodes always, `ParentWidth`/`ParentHeight`
    /// along a changed axis, `Intrinsic` nodes when width changed (their
    /// measure callback may reflow against available width). `Static`
    /// nodes are left untouched, per §6.
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        let width_changed = (self.viewport_width - width).abs() > dispatcher::EPSILON;
        let height_changed = (self.viewport_height - height).abs() > dispatcher::EPSILON;
        self.viewport_width = width;
        self.viewport_height = height;
        if !width_changed && !height_changed {
            return;
        }
        let affected = self.cache.dependent_uids(width_changed, height_changed);
        for uid in affected {
            if let Ok(idx) = self.index_of(uid) {
                self.mark_dirty_idx(idx);
            }
        }
    }

    fn to_node(&self, idx: ArenaIndex) -> Node {
        let data = self.arena[idx].as_ref().expect("arena slot alive");
        Node {
            uid: data.uid,
            id: data.id.clone(),
            style: data.style.clone(),
            children: data.children.iter().map(|&c| self.to_node(c)).collect(),
            measure: data.measure.clone(),
            text: data.text.clone(),
        }
    }

    /// Runs layout, reusing every cached `Layout` whose subtree is neither
    /// dirty nor has a dirty descendant. Clears the dirty/children-dirty
    /// sets afterward: the pass just brought the whole cache back in sync
    /// with the current tree, so nothing is pending anymore.
    pub fn compute_incremental(&mut self) -> Layout {
        let root_node = self.to_node(self.root);
        let ctx = LayoutContext::new(self.viewport_width, self.viewport_height);
        let config = self.config;
        let mut adapter = CacheAdapter { cache: &mut self.cache, dirty: &self.dirty, children_dirty: &self.children_dirty };
        let layout = dispatcher::compute(&root_node, ctx, &config, &mut adapter);
        self.dirty.clear();
        self.children_dirty.clear();
        layout
    }

    /// Recomputes the whole tree unconditionally, ignoring every cache
    /// entry on read but still populating the cache on the way out. Used
    /// to audit `compute_incremental`'s result against a known-correct
    /// baseline; does not clear `dirty`/`children_dirty`, so a subsequent
    /// `compute_incremental` still knows what was pending.
    pub fn compute_full(&mut self) -> Layout {
        let root_node = self.to_node(self.root);
        let ctx = LayoutContext::new(self.viewport_width, self.viewport_height);
        let config = self.config;
        let mut adapter = WriteThroughCache { inner: &mut self.cache };
        dispatcher::compute(&root_node, ctx, &config, &mut adapter)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Derives the `DependencyKind` a node would be dispatched with,
    /// exposed for tests that assert on selective invalidation without
    /// reaching into the cache directly.
    pub fn dependency_kind(&self, uid: u64) -> Result<DependencyKind, LayoutError> {
        let idx = self.index_of(uid)?;
        let node = self.to_node(idx);
        Ok(DependencyKind::derive(&node, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Dimension;

    fn leaf(uid: u64) -> Node {
        Node::new(uid, Style::default())
    }

    #[test]
    fn second_call_is_fully_cached() {
        let root = Node::new(1, Style::default()).with_children(vec![leaf(2), leaf(3)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        tree.compute_incremental();
        let before = tree.cache_stats();
        tree.compute_incremental();
        let after = tree.cache_stats();
        assert_eq!(after.hits - before.hits, 3);
        assert_eq!(after.misses, before.misses);
    }

    #[test]
    fn set_style_on_leaf_does_not_dirty_siblings() {
        let root = Node::new(1, Style::default()).with_children(vec![leaf(2), leaf(3)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        tree.compute_incremental();

        let mut new_style = Style::default();
        new_style.width = Dimension::Length(42.0);
        tree.set_style(2, new_style).unwrap();

        assert!(tree.dirty.contains(&2));
        assert!(!tree.dirty.contains(&3));
        assert!(tree.children_dirty.contains(&1));
        assert!(!tree.children_dirty.contains(&2));
    }

    #[test]
    fn identical_style_is_a_no_op() {
        let root = Node::new(1, Style::default()).with_children(vec![leaf(2)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        tree.compute_incremental();
        tree.set_style(2, Style::default()).unwrap();
        assert!(tree.dirty.is_empty());
        assert!(tree.children_dirty.is_empty());
    }

    #[test]
    fn remove_child_by_uid_rejects_non_child() {
        let root = Node::new(1, Style::default()).with_children(vec![leaf(2)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        let err = tree.remove_child_by_uid(1, 99).unwrap_err();
        assert_eq!(err, LayoutError::NotAChild { parent: 1, child: 99 });
    }

    #[test]
    fn unknown_uid_is_reported() {
        let root = leaf(1);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        assert_eq!(tree.mark_dirty(404).unwrap_err(), LayoutError::UnknownUid(404));
    }

    #[test]
    fn resize_viewport_skips_static_nodes() {
        let root = Node::new(1, Style::default()).with_children(vec![leaf(2)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        tree.compute_incremental();
        tree.resize_viewport(1000.0, 600.0);
        assert!(tree.dirty.is_empty());
        assert!(tree.children_dirty.is_empty());
    }

    #[test]
    fn resize_viewport_dirties_percent_width_child() {
        let mut child_style = Style::default();
        child_style.width = Dimension::Percent(0.5);
        let root = Node::new(1, Style::default()).with_children(vec![Node::new(2, child_style)]);
        let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
        tree.compute_incremental();
        tree.resize_viewport(1000.0, 600.0);
        assert!(tree.dirty.contains(&2));
        assert!(tree.children_dirty.contains(&1));
    }
}
