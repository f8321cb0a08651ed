//! The immutable input tree. A `Node` is constructed once per layout call
//! (or once per mutation, for the incremental tree) and never mutated in
//! place; `Style` is the only field the incremental API ever replaces, and
//! it does so by installing a whole new `Node`/`LayoutNode`, not by mutating
//! fields of this type.

use std::fmt;
use std::sync::Arc;

/// The preferred sizes a leaf (or subtree) reports for intrinsic sizing.
/// `min <= max` is an invariant; callers that violate it (e.g. a measure
/// callback) have the violation corrected by swapping, per §4.6.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct IntrinsicSize {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl IntrinsicSize {
    pub fn new(min_width: f64, max_width: f64, min_height: f64, max_height: f64) -> Self {
        let (min_width, max_width) = if min_width > max_width {
            log::warn!("IntrinsicSize: min_width {} > max_width {}, swapping", min_width, max_width);
            (max_width, min_width)
        } else {
            (min_width, max_width)
        };
        let (min_height, max_height) = if min_height > max_height {
            log::warn!("IntrinsicSize: min_height {} > max_height {}, swapping", min_height, max_height);
            (max_height, min_height)
        } else {
            (min_height, max_height)
        };
        IntrinsicSize { min_width, max_width, min_height, max_height }
    }

    pub fn zero() -> Self {
        IntrinsicSize::default()
    }
}

/// `(available_width, available_height) -> IntrinsicSize`. Contract: pure,
/// monotone in `available_width`, called 0-3 times per pass, never retained
/// across a layout call (§6). Held behind `Arc` so `Node` stays `Clone`
/// without cloning the closure's captured content.
pub type MeasureFn = Arc<dyn Fn(f64, Option<f64>) -> IntrinsicSize + Send + Sync>;

use crate::style::Style;

/// The immutable input tree. `uid` is the caller-stable identity used by
/// the incremental API (`set_style`, `add_child`, ...); `id` is an opaque
/// label for host-side debugging/painting and carries no layout meaning.
#[derive(Clone)]
pub struct Node {
    pub uid: u64,
    pub id: String,
    pub style: Style,
    pub children: Vec<Node>,
    pub measure: Option<MeasureFn>,
    pub text: Option<String>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("uid", &self.uid)
            .field("id", &self.id)
            .field("style", &self.style)
            .field("children", &self.children)
            .field("has_measure", &self.measure.is_some())
            .field("text", &self.text)
            .finish()
    }
}

impl Node {
    pub fn new(uid: u64, style: Style) -> Self {
        Node { uid, id: String::new(), style, children: Vec::new(), measure: None, text: None }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_measure(mut self, measure: MeasureFn) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
