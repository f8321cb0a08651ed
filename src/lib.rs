//! A standalone CSS layout engine core: block, flexbox and grid formatting
//! contexts, intrinsic sizing and incremental recomputation, with no
//! dependency on a parser, cascade or renderer.
//!
//! [`compute_layout`] runs a single one-shot pass over a [`Node`] tree.
//! Callers that mutate the same tree repeatedly (a live UI, a reflow loop)
//! should use [`LayoutTree`] instead, which reuses cached work across
//! calls.

/// Rects, points, sizes and the grid-track `Axis`.
pub mod geometry;
/// The style record every node carries.
pub mod style;
/// The input tree and its leaf-measurement callback type.
pub mod node;
/// The output record and per-invocation context/configuration types.
pub mod layout;
/// `LayoutError`, the engine's only fallibility surface.
pub mod error;
/// Min-content/max-content sizing, independent of any available space.
pub mod intrinsic;
/// Adjacent block-margin collapsing.
pub mod margin;
/// The block formatting context: normal flow, margin collapsing, absolute
/// positioning.
pub mod block;
/// The flexbox formatting context.
pub mod flex;
/// The CSS Grid formatting context.
pub mod grid;
/// The per-node dispatch entry point and its caching traits.
pub mod dispatcher;
/// The incremental recomputation API.
pub mod incremental;

pub use dispatcher::{ConstraintKey, DependencyKind, DispatchCache, NoopCache};
pub use error::LayoutError;
pub use geometry::{Axis, Point, Rect, Size};
pub use incremental::{CacheStats, LayoutTree};
pub use layout::{Layout, LayoutConfig, LayoutContext, OverflowOrDefault, RootSizingMode, SizingMode, TableSupport};
pub use node::{IntrinsicSize, MeasureFn, Node};
pub use style::Style;

/// Runs a single layout pass over `node` with no cache: every node is
/// computed exactly once, top to bottom. Use [`LayoutTree`] instead when
/// the same tree will be laid out again after a small change.
pub fn compute_layout(node: &Node, viewport_width: f64, viewport_height: f64, config: &LayoutConfig) -> Layout {
    let ctx = LayoutContext::new(viewport_width, viewport_height);
    let mut cache = NoopCache;
    dispatcher::compute(node, ctx, config, &mut cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Dimension;

    #[test]
    fn one_shot_entry_point_lays_out_a_single_block() {
        let mut style = Style::default();
        style.width = Dimension::Length(120.0);
        style.height = Dimension::Length(60.0);
        let node = Node::new(1, style);
        let config = LayoutConfig::default();
        let result = compute_layout(&node, 800.0, 600.0, &config);
        assert_eq!(result.width, 120.0);
        assert_eq!(result.height, 60.0);
    }
}
