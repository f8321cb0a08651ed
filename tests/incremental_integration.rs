//! Integration tests for `LayoutTree`'s public mutation/cache API.
//!
//! These exercise the testable properties from `SPEC_FULL.md` §8 (idempotent
//! incremental recomputation, dirty propagation, viewport-resize
//! selectivity) end to end, through the crate's public surface only — no
//! reaching into `LayoutTree`'s private dirty-set bookkeeping the way the
//! in-module unit tests in `src/incremental/tree.rs` do.

use layoutcore::style::Dimension;
use layoutcore::{LayoutConfig, LayoutTree, Node, Style};

fn leaf(uid: u64) -> Node {
    Node::new(uid, Style::default())
}

fn wide_tree(n: usize) -> Node {
    let children = (0..n).map(|i| leaf(i as u64 + 2)).collect();
    Node::new(1, Style::default()).with_children(children)
}

#[test]
fn compute_incremental_is_idempotent() {
    let mut tree = LayoutTree::new(wide_tree(20), 800.0, 600.0, LayoutConfig::default());
    let first = tree.compute_incremental();
    let second = tree.compute_incremental();
    assert_eq!(first, second);
    let stats = tree.cache_stats();
    assert!(stats.hit_rate() > 0.0);
}

#[test]
fn second_pass_over_unchanged_tree_is_all_hits() {
    let mut tree = LayoutTree::new(wide_tree(50), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();
    let before = tree.cache_stats();
    tree.compute_incremental();
    let after = tree.cache_stats();
    // Root + 50 leaves = 51 nodes, every one a hit on the unchanged second pass.
    assert_eq!(after.hits - before.hits, 51);
    assert_eq!(after.misses, before.misses);
}

#[test]
fn set_style_with_new_width_causes_exactly_one_miss_on_that_leaf() {
    let mut tree = LayoutTree::new(wide_tree(10), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();
    tree.compute_incremental();
    let before = tree.cache_stats();

    let mut new_style = Style::default();
    new_style.width = Dimension::Length(42.0);
    tree.set_style(5, new_style).unwrap();

    tree.compute_incremental();
    let after = tree.cache_stats();

    // The dirtied leaf and its dirtied-children ancestor (the root) both
    // recompute; every untouched sibling still hits.
    assert_eq!(after.misses - before.misses, 2);
}

#[test]
fn set_style_with_identical_style_produces_zero_misses() {
    let mut tree = LayoutTree::new(wide_tree(10), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();
    tree.compute_incremental();
    let before = tree.cache_stats();

    // A style-record clone with no layout-affecting field changed (the
    // real-world analogue of a cascade touching only `color`).
    tree.set_style(5, Style::default()).unwrap();
    tree.compute_incremental();

    let after = tree.cache_stats();
    assert_eq!(after.misses, before.misses);
}

#[test]
fn resize_viewport_skips_nodes_with_no_viewport_or_percent_dependency() {
    let mut tree = LayoutTree::new(wide_tree(10), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();
    tree.compute_incremental();
    let before = tree.cache_stats();

    tree.resize_viewport(1024.0, 600.0);
    tree.compute_incremental();

    let after = tree.cache_stats();
    assert_eq!(after.misses, before.misses);
}

#[test]
fn resize_viewport_dirties_percent_dependent_nodes() {
    let mut style = Style::default();
    style.width = Dimension::Percent(0.5);
    let root = Node::new(1, Style::default()).with_children(vec![Node::new(2, style)]);
    let mut tree = LayoutTree::new(root, 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();
    tree.compute_incremental();
    let before = tree.cache_stats();

    tree.resize_viewport(1024.0, 600.0);
    let after_resize = tree.compute_incremental();
    let after = tree.cache_stats();

    assert!(after.misses > before.misses);
    assert!((after_resize.children[0].width - 512.0).abs() < 0.01);
}

#[test]
fn add_and_remove_child_round_trips() {
    let mut tree = LayoutTree::new(wide_tree(3), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();

    tree.add_child(1, leaf(99)).unwrap();
    let result = tree.compute_incremental();
    assert_eq!(result.children.len(), 4);

    tree.remove_child(1, 3).unwrap();
    let result = tree.compute_incremental();
    assert_eq!(result.children.len(), 3);
}

#[test]
fn compute_full_matches_compute_incremental_after_mutation() {
    let mut tree = LayoutTree::new(wide_tree(5), 800.0, 600.0, LayoutConfig::default());
    tree.compute_incremental();

    let mut new_style = Style::default();
    new_style.height = Dimension::Length(77.0);
    tree.set_style(3, new_style).unwrap();

    let incremental = tree.compute_incremental();
    tree.clear_cache();
    let full = tree.compute_full();
    assert_eq!(incremental, full);
}
