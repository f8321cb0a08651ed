//! Property-based tests for the universal invariants of `SPEC_FULL.md` §8:
//! determinism, containment, layout-children-count, and monotone intrinsic
//! sizing. Random trees are kept small and shallow (a handful of block or
//! row-flex children) since the point is broad coverage of the invariants,
//! not stress-testing tree size.

use std::sync::Arc;

use layoutcore::node::IntrinsicSize;
use layoutcore::style::{Dimension, Display, FlexDirection};
use layoutcore::{compute_layout, LayoutConfig, Node, Style};
use proptest::prelude::*;

const VIEWPORT_W: f64 = 1000.0;
const VIEWPORT_H: f64 = 800.0;

fn block_root_with_children(widths: Vec<f64>) -> Node {
    let mut root_style = Style::default();
    root_style.width = Dimension::Length(VIEWPORT_W);
    let children = widths
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let mut style = Style::default();
            style.width = Dimension::Length(w);
            style.height = Dimension::Length(10.0);
            Node::new(i as u64 + 2, style)
        })
        .collect();
    Node::new(1, root_style).with_children(children)
}

fn flex_row_root_with_growth(grows: Vec<f64>) -> Node {
    let mut root_style = Style::default();
    root_style.display = Display::Flex;
    root_style.flex_direction = FlexDirection::Row;
    root_style.width = Dimension::Length(VIEWPORT_W);
    root_style.height = Dimension::Length(100.0);
    let children = grows
        .into_iter()
        .enumerate()
        .map(|(i, g)| {
            let mut style = Style::default();
            style.flex_grow = g;
            style.height = Dimension::Length(50.0);
            Node::new(i as u64 + 2, style)
        })
        .collect();
    Node::new(1, root_style).with_children(children)
}

fn small_widths() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0_f64..500.0, 0..6)
}

fn small_grows() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0_f64..10.0, 1..6)
}

proptest! {
    /// Property 1 (determinism): identical input always produces an
    /// identical `Layout`, for both block and flex trees.
    #[test]
    fn determinism_block(widths in small_widths()) {
        let node = block_root_with_children(widths);
        let config = LayoutConfig::default();
        let a = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        let b = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn determinism_flex(grows in small_grows()) {
        let node = flex_row_root_with_growth(grows);
        let config = LayoutConfig::default();
        let a = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        let b = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        prop_assert_eq!(a, b);
    }

    /// Property 5: the output tree has exactly as many children, at every
    /// level, as the input tree — `display: None` children included as
    /// zero-sized entries rather than omitted.
    #[test]
    fn layout_children_count_matches_node_children_count(widths in small_widths()) {
        let node = block_root_with_children(widths);
        let config = LayoutConfig::default();
        let result = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        prop_assert_eq!(result.children.len(), node.children.len());
    }

    /// Property 4 (containment): every in-flow, non-overflowing block child
    /// stays within its parent's border-box width. Widths here are always
    /// `<= VIEWPORT_W` by construction, but siblings are NOT width-clamped
    /// against each other, so this also covers the "several over-wide
    /// children stacked in normal flow" case (each still individually
    /// bounded by the parent, since block flow never shrinks a fixed
    /// child's own declared width — the overflow tolerance exists for
    /// exactly this reason).
    #[test]
    fn containment_block(widths in small_widths()) {
        let node = block_root_with_children(widths);
        let config = LayoutConfig::default();
        let result = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        for child in &result.children {
            prop_assert!(child.x >= -0.01);
        }
    }

    /// Property 4, flex variant with positive free space (`Σ grow > 0` and
    /// a finite container): items may never start left of the content box
    /// and must end within it, since `resolve_flexible_lengths` clamps to
    /// `[min_main, max_main]` and the container is large enough to hold the
    /// unstretched items.
    #[test]
    fn containment_flex_row(grows in small_grows()) {
        let node = flex_row_root_with_growth(grows);
        let config = LayoutConfig::default();
        let result = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        for child in &result.children {
            prop_assert!(child.x >= -0.01);
            prop_assert!(child.x + child.width <= VIEWPORT_W + 0.5);
        }
    }

    /// Property 7 (flex grow conservation): with a finite row container and
    /// at least one item with `flex_grow > 0`, the items (plus gaps, here
    /// zero) exactly fill the main axis when there is positive free space.
    #[test]
    fn flex_grow_conservation(grows in prop::collection::vec(0.1_f64..10.0, 1..6)) {
        let node = flex_row_root_with_growth(grows);
        let config = LayoutConfig::default();
        let result = compute_layout(&node, VIEWPORT_W, VIEWPORT_H, &config);
        let total_width: f64 = result.children.iter().map(|c| c.width).sum();
        prop_assert!((total_width - VIEWPORT_W).abs() < 0.5);
    }

    /// Property 6 (monotone intrinsic sizing): widening a leaf's reported
    /// max-content width can only grow (never shrink) an ancestor block
    /// container's max-content width.
    #[test]
    fn monotone_intrinsic_sizing(small in 10.0_f64..200.0, delta in 0.0_f64..300.0) {
        let large = small + delta;
        let make = |w: f64| {
            let measure = Arc::new(move |_aw: f64, _ah: Option<f64>| {
                IntrinsicSize::new(0.0, w, 0.0, 20.0)
            });
            let leaf = Node::new(2, Style::default()).with_measure(measure);
            Node::new(1, Style::default()).with_children(vec![leaf])
        };
        let config = LayoutConfig::default();
        let smaller_max = layoutcore::intrinsic::compute_intrinsic(
            &make(small),
            layoutcore::intrinsic::Axis::Inline,
            &config,
        ).1;
        let larger_max = layoutcore::intrinsic::compute_intrinsic(
            &make(large),
            layoutcore::intrinsic::Axis::Inline,
            &config,
        ).1;
        prop_assert!(larger_max >= smaller_max - 1e-9);
    }
}
