//! The output record and the per-invocation context/configuration types.

use crate::geometry::Rect;
use crate::style::Overflow;

/// How a formatting algorithm should treat "no available space given" on
/// an axis: definite layout, or one of the two intrinsic-sizing passes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SizingMode {
    Definite,
    MinContent,
    MaxContent,
}

/// Immutable per-invocation context. `available_width`/`available_height`
/// are `None` when the axis is indefinite (e.g. a block container whose
/// own height is auto).
#[derive(Copy, Clone, Debug)]
pub struct LayoutContext {
    pub available_width: Option<f64>,
    pub available_height: Option<f64>,
    pub sizing_mode: SizingMode,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl LayoutContext {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        LayoutContext {
            available_width: Some(viewport_width),
            available_height: Some(viewport_height),
            sizing_mode: SizingMode::Definite,
            viewport_width,
            viewport_height,
        }
    }

    pub fn with_available(mut self, width: Option<f64>, height: Option<f64>) -> Self {
        self.available_width = width;
        self.available_height = height;
        self
    }

    pub fn with_sizing_mode(mut self, mode: SizingMode) -> Self {
        self.sizing_mode = mode;
        self
    }
}

/// How a caller wants the two open questions of §9 resolved for a given
/// tree. `Default` matches the CSS-conformant choice in both cases.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RootSizingMode {
    /// A block-level flex/grid root with `width: auto` fills its
    /// containing block, per CSS.
    Fill,
    /// Legacy behavior: shrink-to-fit, matching the pre-conformance source.
    ShrinkToFit,
}

impl Default for RootSizingMode {
    fn default() -> Self {
        RootSizingMode::Fill
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TableSupport {
    /// `display: table` and its row/cell family are treated as `Block`,
    /// logging a one-time diagnostic per node.
    StubToBlock,
    /// `display: table` and its row/cell family are flattened like
    /// `Contents`.
    Omit,
}

impl Default for TableSupport {
    fn default() -> Self {
        TableSupport::StubToBlock
    }
}

/// Per-tree configuration resolving the Design Notes' open questions into
/// runtime knobs. Does not vary per invocation the way `LayoutContext`
/// does; set once when a tree (or a one-shot `compute` call) is built.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct LayoutConfig {
    pub root_sizing_mode: RootSizingMode,
    pub table_support: TableSupport,
}

/// The computed result for one node. Children mirror the input node's
/// children 1:1 by index; a `display: None` child occupies its index with
/// a zero-sized `Layout` so callers can address children positionally.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub margin: Rect<f64>,
    pub padding: Rect<f64>,
    pub border: Rect<f64>,
    pub overflow_x: OverflowOrDefault,
    pub overflow_y: OverflowOrDefault,
    pub children: Vec<Layout>,
    pub text: Option<String>,
}

/// Newtype so `Layout` can derive `Default`/`PartialEq` without requiring
/// those on `Overflow` beyond what it already has; kept as a thin wrapper
/// rather than changing `Overflow`'s own derives.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OverflowOrDefault(pub Overflow);

impl Default for OverflowOrDefault {
    fn default() -> Self {
        OverflowOrDefault(Overflow::Visible)
    }
}

impl Layout {
    pub fn zero(id: impl Into<String>) -> Self {
        Layout { id: id.into(), ..Default::default() }
    }

    /// Border-box origin + size as a flat rect, used by the containment
    /// invariant (§8.4) and by absolute-positioning code in `block`/`flex`/
    /// `grid`.
    pub fn outer_rect(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.width, self.height)
    }
}
