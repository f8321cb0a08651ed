//! The entry point that selects a formatting algorithm per node and
//! recurses. Stateless and deterministic: the caching wrapper used by the
//! incremental tree is passed in as an explicit trait object rather than
//! installed as global mutable state (§9 — no ambient dispatcher hook).

use crate::layout::{Layout, LayoutConfig, LayoutContext};
use crate::node::Node;
use crate::style::Display;

/// Two constraint keys are equivalent for a node when `sizing_mode` matches
/// and, per axis, either the node's own style fixes that axis (so
/// available space is irrelevant) or the available sizes agree within
/// `EPSILON` (§3). Equality/`Hash` here use a quantized fast path;
/// `is_equivalent_for` re-checks the exact floats within epsilon so two
/// keys that hash equal but differ by more than epsilon still miss.
#[derive(Copy, Clone, Debug)]
pub struct ConstraintKey {
    pub available_width: Option<f64>,
    pub available_height: Option<f64>,
    pub sizing_mode: crate::layout::SizingMode,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

pub const EPSILON: f64 = 0.5;

impl ConstraintKey {
    pub fn from_context(ctx: &LayoutContext) -> Self {
        ConstraintKey {
            available_width: ctx.available_width,
            available_height: ctx.available_height,
            sizing_mode: ctx.sizing_mode,
            viewport_width: ctx.viewport_width,
            viewport_height: ctx.viewport_height,
        }
    }

    /// Quantized (half-pixel) hash key, per the Design Notes' canonical
    /// quantization note: doubles hash fragilely, so round to the nearest
    /// 0.5px before hashing and verify exactly afterward.
    pub fn quantized(&self) -> (Option<i64>, Option<i64>, u8, i64, i64) {
        let q = |v: f64| (v * 2.0).round() as i64;
        (
            self.available_width.map(q),
            self.available_height.map(q),
            self.sizing_mode as u8,
            q(self.viewport_width),
            q(self.viewport_height),
        )
    }

    fn axis_equivalent(a: Option<f64>, b: Option<f64>, style_fixes_axis: bool) -> bool {
        if style_fixes_axis {
            return true;
        }
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => (x - y).abs() <= EPSILON,
            _ => false,
        }
    }

    /// Equivalence for caching purposes, given whether the node's own style
    /// fixes each axis (in which case available space doesn't matter).
    pub fn is_equivalent_for(&self, other: &ConstraintKey, width_fixed: bool, height_fixed: bool) -> bool {
        self.sizing_mode == other.sizing_mode
            && Self::axis_equivalent(self.available_width, other.available_width, width_fixed)
            && Self::axis_equivalent(self.available_height, other.available_height, height_fixed)
    }
}

/// How a node's resolved layout depends on inputs beyond its own style and
/// children, used to selectively invalidate the incremental cache on
/// viewport resize (§3, §6).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DependencyKind {
    /// Depends only on its own style and descendants.
    Static,
    ParentWidth,
    ParentHeight,
    ParentBoth,
    Viewport,
    /// Depends on a descendant's measure callback (text reflow).
    Intrinsic,
}

impl DependencyKind {
    /// Derives the dependency kind from style: percentage sizes make a node
    /// depend on its parent along that axis; `auto` does not — an
    /// auto-sized block fills available width during layout, but that fill
    /// happens every pass regardless of viewport, so it isn't an extra
    /// cache dependency worth invalidating on resize (§8.8). Viewport units
    /// (not modeled as a distinct `Dimension` variant in this crate, but a
    /// host cascade may map `vw`/`vh` to `Length` at resolve time and flag
    /// the node `Viewport` explicitly) take precedence when present.
    pub fn derive(node: &Node, has_viewport_unit: bool) -> DependencyKind {
        if has_viewport_unit {
            return DependencyKind::Viewport;
        }
        let width_dependent = matches!(node.style.width, crate::style::Dimension::Percent(_))
            || matches!(node.style.min_width, crate::style::Dimension::Percent(_))
            || matches!(node.style.max_width, crate::style::Dimension::Percent(_));
        let height_dependent = matches!(node.style.height, crate::style::Dimension::Percent(_))
            || matches!(node.style.min_height, crate::style::Dimension::Percent(_))
            || matches!(node.style.max_height, crate::style::Dimension::Percent(_));
        match (width_dependent, height_dependent) {
            (true, true) => DependencyKind::ParentBoth,
            (true, false) => DependencyKind::ParentWidth,
            (false, true) => DependencyKind::ParentHeight,
            (false, false) => DependencyKind::Static,
        }
    }
}

/// The cache the incremental tree installs around one `compute_incremental`
/// call. Passed as an explicit argument rather than a global, per §9.
pub trait DispatchCache {
    fn get(&mut self, uid: u64, key: &ConstraintKey) -> Option<Layout>;
    fn put(&mut self, uid: u64, key: ConstraintKey, layout: Layout, dep: DependencyKind);
}

/// The cache used by one-shot, non-incremental `compute` calls: always
/// misses.
pub struct NoopCache;

impl DispatchCache for NoopCache {
    fn get(&mut self, _uid: u64, _key: &ConstraintKey) -> Option<Layout> {
        None
    }

    fn put(&mut self, _uid: u64, _key: ConstraintKey, _layout: Layout, _dep: DependencyKind) {}
}

/// Entry point: `compute(node, ctx) -> Layout`. Observes `style.display`
/// and delegates to the matching formatting algorithm (§4.1).
pub fn compute(node: &Node, ctx: LayoutContext, config: &LayoutConfig, cache: &mut dyn DispatchCache) -> Layout {
    let key = ConstraintKey::from_context(&ctx);
    if let Some(cached) = cache.get(node.uid, &key) {
        log::trace!("dispatcher: cache hit for uid={}", node.uid);
        return cached;
    }

    log::trace!("dispatcher: computing uid={} display={:?}", node.uid, node.style.display);

    let layout = match node.style.display {
        Display::None => zero_layout(node),
        Display::Contents => crate::block::layout(node, ctx, config, cache),
        Display::Flex | Display::InlineFlex => crate::flex::layout(node, ctx, config, cache),
        Display::Grid | Display::InlineGrid => crate::grid::layout(node, ctx, config, cache),
        Display::Block | Display::InlineBlock => crate::block::layout(node, ctx, config, cache),
        Display::Table => {
            log::debug!(
                "dispatcher: table_support={:?} stub for uid={}",
                config.table_support,
                node.uid
            );
            crate::block::layout(node, ctx, config, cache)
        }
    };

    let dep = DependencyKind::derive(node, false);
    cache.put(node.uid, key, layout.clone(), dep);
    layout
}

fn zero_layout(node: &Node) -> Layout {
    let mut layout = Layout::zero(node.id.clone());
    layout.children = node.children.iter().map(zero_layout).collect();
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, LayoutContext, TableSupport};
    use crate::node::Node;
    use crate::style::{Dimension, Style};

    #[test]
    fn table_stub_to_block_sizes_like_a_block_box() {
        let mut style = Style::default();
        style.display = Display::Table;
        style.width = Dimension::Length(200.0);
        style.height = Dimension::Length(80.0);
        let node = Node::new(1, style);
        let config = LayoutConfig { table_support: TableSupport::StubToBlock, ..LayoutConfig::default() };
        let mut cache = NoopCache;
        let result = compute(&node, LayoutContext::new(800.0, 600.0), &config, &mut cache);
        assert_eq!(result.width, 200.0);
        assert_eq!(result.height, 80.0);
    }

    #[test]
    fn table_omit_flattens_own_box_like_contents() {
        let mut style = Style::default();
        style.display = Display::Table;
        style.width = Dimension::Length(200.0);
        style.height = Dimension::Length(80.0);
        let node = Node::new(1, style);
        let config = LayoutConfig { table_support: TableSupport::Omit, ..LayoutConfig::default() };
        let mut cache = NoopCache;
        let result = compute(&node, LayoutContext::new(800.0, 600.0), &config, &mut cache);
        assert_eq!(result.width, 0.0);
        assert_eq!(result.height, 0.0);
    }
}
