//! Intrinsic (min-content/max-content) sizing, computed independently of
//! any particular available space so that parents can ask "how small/large
//! would this subtree like to be" before committing to final layout
//! (§4.2). Every formatting algorithm consults this module whenever a
//! style value resolves to an intrinsic keyword (`width: auto` needing a
//! flex basis, `width: min-content`, a grid track's content contribution).

use crate::geometry::Axis as GridAxis;
use crate::layout::LayoutConfig;
use crate::margin;
use crate::node::{IntrinsicSize, Node};
use crate::style::{Dimension, Display, FlexDirection, TrackBreadth, TrackSize};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Axis {
    Inline,
    Block,
}

/// Returns `(min, max)` along `axis` for `node`, ignoring any available
/// space the caller might otherwise supply. Monotone by construction: every
/// branch below folds children via `max`/`+`, never `min`, on the max side.
pub fn compute_intrinsic(node: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    if node.style.display == Display::None {
        return (0.0, 0.0);
    }

    let (content_min, content_max) = if let Some(measure) = &node.measure {
        leaf_measure_intrinsic(measure.as_ref(), axis)
    } else if node.children.is_empty() {
        (0.0, 0.0)
    } else {
        match node.style.display {
            Display::Flex | Display::InlineFlex => flex_intrinsic(node, axis, config),
            Display::Grid | Display::InlineGrid => grid_intrinsic(node, axis, config),
            Display::Contents => contents_intrinsic(node, axis, config),
            _ => block_intrinsic(node, axis, config),
        }
    };

    let (min_style, max_style) = match axis {
        Axis::Inline => (node.style.min_width, node.style.max_width),
        Axis::Block => (node.style.min_height, node.style.max_height),
    };

    let padding_border = match axis {
        Axis::Inline => {
            fixed_or_zero(node.style.padding.left) + fixed_or_zero(node.style.padding.right)
                + fixed_or_zero(node.style.border.left) + fixed_or_zero(node.style.border.right)
        }
        Axis::Block => {
            fixed_or_zero(node.style.padding.top) + fixed_or_zero(node.style.padding.bottom)
                + fixed_or_zero(node.style.border.top) + fixed_or_zero(node.style.border.bottom)
        }
    };

    let own_size = match axis {
        Axis::Inline => node.style.width,
        Axis::Block => node.style.height,
    };

    let (mut min, mut max) = if let Dimension::Length(v) = own_size {
        (v.max(0.0), v.max(0.0))
    } else {
        (content_min + padding_border, content_max + padding_border)
    };

    if let Dimension::Length(v) = min_style {
        min = min.max(v);
        max = max.max(v);
    }
    if let Dimension::Length(v) = max_style {
        min = min.min(v);
        max = max.min(v);
    }
    if min > max {
        log::warn!("intrinsic: min {} > max {} after style clamps, max-trumps-min", min, max);
        min = max;
    }

    (min.max(0.0), max.max(0.0))
}

fn fixed_or_zero(d: Dimension) -> f64 {
    match d {
        Dimension::Length(v) => v.max(0.0),
        _ => 0.0,
    }
}

fn leaf_measure_intrinsic(
    measure: &(dyn Fn(f64, Option<f64>) -> IntrinsicSize + Send + Sync),
    axis: Axis,
) -> (f64, f64) {
    match axis {
        Axis::Inline => {
            let at_zero = measure(0.0, None);
            let at_inf = measure(f64::INFINITY, None);
            (at_zero.min_width, at_inf.max_width)
        }
        Axis::Block => {
            let at_zero = measure(f64::INFINITY, Some(0.0));
            let at_inf = measure(f64::INFINITY, None);
            (at_zero.min_height, at_inf.max_height)
        }
    }
}

/// A child's contribution on `axis`: its own fixed length style (plus
/// fixed margins) if definite, else its recursive intrinsic size.
fn child_contribution(child: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    let (min, max) = compute_intrinsic(child, axis, config);
    let margin = match axis {
        Axis::Inline => fixed_or_zero(child.style.margin.left) + fixed_or_zero(child.style.margin.right),
        Axis::Block => fixed_or_zero(child.style.margin.top) + fixed_or_zero(child.style.margin.bottom),
    };
    (min + margin, max + margin)
}

fn block_intrinsic(node: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    match axis {
        Axis::Inline => {
            let mut min = 0.0_f64;
            let mut max = 0.0_f64;
            for child in &node.children {
                if child.style.position.is_absolutely_positioned() {
                    continue;
                }
                let (c_min, c_max) = child_contribution(child, axis, config);
                min = min.max(c_min);
                max = max.max(c_max);
            }
            (min, max)
        }
        Axis::Block => {
            let mut total_max = 0.0_f64;
            let mut total_min = 0.0_f64;
            let mut prev_margin_bottom: Option<f64> = None;
            for child in &node.children {
                if child.style.position.is_absolutely_positioned() {
                    continue;
                }
                let (c_min, c_max) = compute_intrinsic(child, axis, config);
                let margin_top = fixed_or_zero(child.style.margin.top);
                let margin_bottom = fixed_or_zero(child.style.margin.bottom);
                let collapsed_top = match prev_margin_bottom {
                    Some(prev) => margin::collapse_pair(prev, margin_top),
                    None => margin_top,
                };
                total_max += collapsed_top + c_max;
                total_min += collapsed_top + c_min;
                prev_margin_bottom = Some(margin_bottom);
            }
            total_max += prev_margin_bottom.unwrap_or(0.0);
            total_min += prev_margin_bottom.unwrap_or(0.0);
            (total_min, total_max)
        }
    }
}

fn contents_intrinsic(node: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    block_intrinsic(node, axis, config)
}

fn flex_intrinsic(node: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    let direction = node.style.flex_direction;
    let is_main = (axis == Axis::Inline) == direction.is_row();
    let wrapping = node.style.flex_wrap.is_wrapping();
    let gap = if direction.is_row() { node.style.column_gap } else { node.style.row_gap };

    let in_flow: Vec<&Node> =
        node.children.iter().filter(|c| !c.style.position.is_absolutely_positioned()).collect();
    if in_flow.is_empty() {
        return (0.0, 0.0);
    }

    let contributions: Vec<(f64, f64)> =
        in_flow.iter().map(|c| child_contribution(c, axis, config)).collect();

    if is_main {
        let n = contributions.len();
        let gaps = if n > 0 { gap * (n as f64 - 1.0) } else { 0.0 };
        let sum_min: f64 = contributions.iter().map(|(min, _)| min).sum();
        let sum_max: f64 = contributions.iter().map(|(_, max)| max).sum();
        let max_of_min = contributions.iter().map(|(min, _)| *min).fold(0.0_f64, f64::max);
        let max_of_max = contributions.iter().map(|(_, max)| *max).fold(0.0_f64, f64::max);
        if wrapping {
            (max_of_min, max_of_max)
        } else {
            (sum_min + gaps, sum_max + gaps)
        }
    } else {
        let sum_max: f64 = contributions.iter().map(|(_, max)| max).sum();
        let max_of_min = contributions.iter().map(|(min, _)| *min).fold(0.0_f64, f64::max);
        (max_of_min, sum_max)
    }
}

fn grid_intrinsic(node: &Node, axis: Axis, config: &LayoutConfig) -> (f64, f64) {
    let grid_axis = match (axis, node.style.flex_direction) {
        (Axis::Inline, _) => GridAxis::Column,
        (Axis::Block, _) => GridAxis::Row,
    };
    let max = crate::grid::sum_track_sizes(node, grid_axis, None, config);
    let min = crate::grid::sum_track_sizes(node, grid_axis, Some(0.0), config);
    (min, max)
}

/// Resolves an item's `flex-basis: auto` main-axis fallback, per §4.4.1:
/// use the main-axis size style if definite, else the item's max-content
/// main size.
pub fn flex_basis_fallback(node: &Node, direction: FlexDirection, config: &LayoutConfig) -> f64 {
    let main_style = node.style.main_size(direction);
    if let Some(v) = main_style.resolve(None) {
        return v;
    }
    let axis = if direction.is_row() { Axis::Inline } else { Axis::Block };
    compute_intrinsic(node, axis, config).1
}

/// Track-breadth contribution helper used by `grid::run_track_sizing_algorithm`
/// when a track's min/max sizing is `MinContent`/`MaxContent`/`Auto`.
pub fn track_breadth_contribution(node: &Node, axis: Axis, breadth: TrackBreadth, config: &LayoutConfig) -> f64 {
    let (min, max) = compute_intrinsic(node, axis, config);
    match breadth {
        TrackBreadth::MinContent => min,
        TrackBreadth::MaxContent | TrackBreadth::Auto => max,
        TrackBreadth::Length(v) => v,
        TrackBreadth::Percent(_) => 0.0,
        TrackBreadth::Fr(_) => 0.0,
    }
}

pub fn track_size_contribution(node: &Node, axis: Axis, size: TrackSize, config: &LayoutConfig) -> f64 {
    track_breadth_contribution(node, axis, size.max_sizing(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    #[test]
    fn leaf_without_measure_is_zero() {
        let node = Node::new(1, Style::default());
        let config = LayoutConfig::default();
        assert_eq!(compute_intrinsic(&node, Axis::Inline, &config), (0.0, 0.0));
    }

    #[test]
    fn block_container_inline_is_max_of_children() {
        let mut child_a_style = Style::default();
        child_a_style.width = Dimension::Length(50.0);
        let mut child_b_style = Style::default();
        child_b_style.width = Dimension::Length(120.0);
        let node = Node::new(1, Style::default()).with_children(vec![
            Node::new(2, child_a_style),
            Node::new(3, child_b_style),
        ]);
        let config = LayoutConfig::default();
        assert_eq!(compute_intrinsic(&node, Axis::Inline, &config), (120.0, 120.0));
    }

    #[test]
    fn monotone_increasing_leaf_measure_does_not_shrink_container() {
        let config = LayoutConfig::default();
        let make = |w: f64| {
            let measure = std::sync::Arc::new(move |_aw: f64, _ah: Option<f64>| IntrinsicSize::new(0.0, w, 0.0, 10.0));
            let leaf = Node::new(2, Style::default()).with_measure(measure);
            Node::new(1, Style::default()).with_children(vec![leaf])
        };
        let small = compute_intrinsic(&make(50.0), Axis::Inline, &config);
        let large = compute_intrinsic(&make(100.0), Axis::Inline, &config);
        assert!(large.1 >= small.1);
    }
}
