//! The block formatting context: normal flow, margin collapsing and
//! absolute positioning (§4.3). Also handles `display: Contents`, which
//! behaves like a block container whose own box never appears in the
//! output, and `display: table` per `LayoutConfig::table_support`.

use crate::dispatcher::{self, DispatchCache};
use crate::geometry::Rect;
use crate::intrinsic::{self, Axis};
use crate::layout::{Layout, LayoutConfig, LayoutContext, SizingMode};
use crate::margin;
use crate::node::Node;
use crate::style::{BoxSizing, Dimension};

/// Resolves a `Rect<Dimension>` (margin/padding/border/inset) against the
/// containing block's inline size — percentages on every axis resolve
/// against the inline size, per §4.3.1.
fn resolve_rect(rect: Rect<Dimension>, against: Option<f64>) -> Rect<f64> {
    rect.map(|d| d.resolve(against).unwrap_or(0.0))
}

fn resolve_rect_auto_as(rect: Rect<Dimension>, against: Option<f64>, auto_default: f64) -> Rect<f64> {
    rect.map(|d| match d {
        Dimension::Auto => auto_default,
        other => other.resolve(against).unwrap_or(auto_default),
    })
}

/// The content-box width for a block container: CSS resolves `width: auto`
/// by filling the containing block in normal flow (unlike `height: auto`,
/// which is content-determined).
fn resolve_width_for_node(node: &Node, available: Option<f64>, config: &LayoutConfig) -> f64 {
    let style = &node.style;
    let padding_border = fixed(style.padding.left) + fixed(style.padding.right) + fixed(style.border.left) + fixed(style.border.right);
    let to_content = |declared: f64| -> f64 {
        if style.box_sizing == BoxSizing::BorderBox { (declared - padding_border).max(0.0) } else { declared }
    };
    let intrinsic = || intrinsic::compute_intrinsic(node, Axis::Inline, config);
    let mut width = match style.width {
        Dimension::Length(v) => to_content(v.max(0.0)),
        Dimension::Percent(p) => to_content(available.map(|a| a * p).unwrap_or(0.0).max(0.0)),
        Dimension::Auto => {
            let margins = resolve_rect_auto_as(style.margin, available, 0.0);
            available
                .map(|a| (a - margins.left - margins.right).max(0.0))
                .unwrap_or_else(|| intrinsic().1)
        }
        Dimension::MinContent => intrinsic().0,
        Dimension::MaxContent => intrinsic().1,
        Dimension::FitContent(max) => intrinsic().1.min(max),
    };
    if let Dimension::Length(v) = style.min_width {
        width = width.max(to_content(v));
    }
    if let Dimension::Length(v) = style.max_width {
        width = width.min(to_content(v));
    }
    width.max(0.0)
}

fn fixed(d: Dimension) -> f64 {
    match d {
        Dimension::Length(v) => v.max(0.0),
        _ => 0.0,
    }
}

pub fn layout(node: &Node, ctx: LayoutContext, config: &LayoutConfig, cache: &mut dyn DispatchCache) -> Layout {
    let style = &node.style;
    let is_contents = style.display == crate::style::Display::Contents
        || (style.display == crate::style::Display::Table && config.table_support == crate::layout::TableSupport::Omit);

    let content_width = resolve_width_for_node(node, ctx.available_width, config);
    let padding = resolve_rect(style.padding, ctx.available_width);
    let border = resolve_rect(style.border, ctx.available_width);

    let clamp_height = |h: f64| -> f64 {
        let mut h = h;
        if let Dimension::Length(v) = style.min_height {
            h = h.max(v);
        }
        if let Dimension::Length(v) = style.max_height {
            h = h.min(v);
        }
        h.max(0.0)
    };

    let fixed_height = match style.height {
        Dimension::Length(v) => Some(clamp_height(v.max(0.0))),
        Dimension::Percent(p) => ctx.available_height.map(|a| clamp_height((a * p).max(0.0))),
        Dimension::MinContent => Some(clamp_height(intrinsic::compute_intrinsic(node, Axis::Block, config).0)),
        Dimension::MaxContent => Some(clamp_height(intrinsic::compute_intrinsic(node, Axis::Block, config).1)),
        Dimension::FitContent(max) => Some(clamp_height(intrinsic::compute_intrinsic(node, Axis::Block, config).1.min(max))),
        // An explicit height always wins; absent one, a declared aspect
        // ratio (width / height) derives the block size from the already
        // resolved content width instead of leaving it content-determined.
        Dimension::Auto => style.aspect_ratio.map(|ratio| clamp_height(if ratio > 0.0 { content_width / ratio } else { 0.0 })),
    };

    let (in_flow, absolute): (Vec<&Node>, Vec<&Node>) =
        node.children.iter().partition(|c| !c.style.position.is_absolutely_positioned());

    // A box's own top/bottom margin collapses with its first/last in-flow
    // child's margin when no border or padding separates them (§8.3.1); the
    // bottom case additionally requires the box's own height to be
    // content-determined rather than fixed.
    let parent_top_open = padding.top == 0.0 && border.top == 0.0;
    let parent_bottom_open = padding.bottom == 0.0 && border.bottom == 0.0;
    let height_is_content_determined = fixed_height.is_none();

    let mut cursor_y = 0.0_f64;
    let mut prev_margin_bottom: Option<f64> = None;
    let mut leading_chain_open = parent_top_open;
    let mut escaped_top_margin: Option<f64> = None;
    let mut trailing_margins: Vec<(f64, bool)> = Vec::with_capacity(in_flow.len());
    let mut children_layouts: Vec<(usize, Layout)> = Vec::with_capacity(node.children.len());

    for child in &in_flow {
        let child_margin = resolve_rect_auto_as(child.style.margin, Some(content_width), 0.0);
        let raw_margin = child.style.margin;

        let remaining_height = match fixed_height {
            Some(h) => Some((h - cursor_y).max(0.0)),
            None => None,
        };
        let child_ctx = LayoutContext {
            available_width: Some(content_width),
            available_height: remaining_height,
            sizing_mode: SizingMode::Definite,
            viewport_width: ctx.viewport_width,
            viewport_height: ctx.viewport_height,
        };
        let mut child_layout = dispatcher::compute(child, child_ctx, config, cache);

        // A box with zero height, zero top/bottom border and padding, and
        // visible overflow collapses through: its own top and bottom
        // margins merge into one value that bridges its neighbors' margins
        // as though the box weren't there.
        let child_collapses_through = child_layout.height == 0.0
            && child_layout.padding.top == 0.0
            && child_layout.padding.bottom == 0.0
            && child_layout.border.top == 0.0
            && child_layout.border.bottom == 0.0
            && child.style.overflow_y.is_visible();

        let raw_top = margin_value(raw_margin.top);
        let raw_bottom = margin_value(raw_margin.bottom);
        let (effective_top, effective_bottom) = if child_collapses_through {
            let merged = margin::collapse_pair(raw_top, raw_bottom);
            (merged, merged)
        } else {
            (raw_top, raw_bottom)
        };

        if leading_chain_open {
            // Still within the leading run of children whose top margins
            // collapse with the parent's own top margin instead of opening
            // space inside the content box.
            escaped_top_margin = Some(match escaped_top_margin {
                Some(acc) => margin::collapse_pair(acc, effective_top),
                None => margin::collapse_pair(margin_value(style.margin.top), effective_top),
            });
            if !child_collapses_through {
                leading_chain_open = false;
            }
        } else {
            let collapsed_top = match prev_margin_bottom {
                Some(prev) => margin::collapse_pair(prev, effective_top),
                None => effective_top,
            };
            cursor_y += collapsed_top;
        }

        let left_auto = matches!(raw_margin.left, Dimension::Auto);
        let right_auto = matches!(raw_margin.right, Dimension::Auto);
        let free = (content_width - child_layout.width).max(0.0);
        let x = if left_auto && right_auto {
            free / 2.0
        } else if left_auto {
            free
        } else {
            child_margin.left
        };

        child_layout.x = x;
        child_layout.y = cursor_y;

        let index = node_child_index(node, child);
        cursor_y += child_layout.height;
        prev_margin_bottom = Some(effective_bottom);
        trailing_margins.push((effective_bottom, child_collapses_through));
        children_layouts.push((index, child_layout));
    }

    let content_height = fixed_height.unwrap_or_else(|| clamp_height(cursor_y));

    let style_margin_top = margin_value(style.margin.top);
    let style_margin_bottom = margin_value(style.margin.bottom);
    let (exposed_margin_top, exposed_margin_bottom) = if in_flow.is_empty() {
        if parent_top_open && parent_bottom_open && height_is_content_determined {
            let merged = margin::collapse_pair(style_margin_top, style_margin_bottom);
            (merged, merged)
        } else {
            (style_margin_top, style_margin_bottom)
        }
    } else {
        let top = if parent_top_open { escaped_top_margin.unwrap_or(style_margin_top) } else { style_margin_top };
        let bottom = if parent_bottom_open && height_is_content_determined {
            // Last in-flow child's bottom margin, extended back through any
            // run of collapse-through children immediately preceding it.
            let mut merged: Option<f64> = None;
            for (effective_bottom, collapses) in trailing_margins.iter().rev() {
                merged = Some(match merged {
                    Some(acc) => margin::collapse_pair(acc, *effective_bottom),
                    None => *effective_bottom,
                });
                if !collapses {
                    break;
                }
            }
            merged.unwrap_or(style_margin_bottom)
        } else {
            style_margin_bottom
        };
        (top, bottom)
    };

    let own_width = if is_contents { 0.0 } else { content_width + padding.horizontal() + border.horizontal() };
    let own_height = if is_contents { 0.0 } else { content_height + padding.vertical() + border.vertical() };

    let cb_width = content_width + padding.horizontal();
    let cb_height = content_height + padding.vertical();
    for child in &absolute {
        let layout = layout_absolute_child(child, cb_width, cb_height, ctx, config, cache);
        let index = node_child_index(node, child);
        children_layouts.push((index, layout));
    }

    children_layouts.sort_by_key(|(index, _)| *index);
    let ordered_children: Vec<Layout> = children_layouts.into_iter().map(|(_, l)| l).collect();

    let resolved_margin = resolve_rect(style.margin, ctx.available_width);
    let own_margin = Rect {
        top: exposed_margin_top,
        bottom: exposed_margin_bottom,
        left: resolved_margin.left,
        right: resolved_margin.right,
    };

    Layout {
        id: node.id.clone(),
        x: 0.0,
        y: 0.0,
        width: own_width,
        height: own_height,
        margin: own_margin,
        padding,
        border,
        overflow_x: crate::layout::OverflowOrDefault(style.overflow_x),
        overflow_y: crate::layout::OverflowOrDefault(style.overflow_y),
        children: ordered_children,
        text: node.text.clone(),
    }
}

fn margin_value(d: Dimension) -> f64 {
    match d {
        Dimension::Auto => 0.0,
        other => other.resolve(None).unwrap_or(0.0),
    }
}

fn node_child_index(parent: &Node, child: &Node) -> usize {
    parent.children.iter().position(|c| c.uid == child.uid).unwrap_or(0)
}

fn layout_absolute_child(
    child: &Node,
    cb_width: f64,
    cb_height: f64,
    ctx: LayoutContext,
    config: &LayoutConfig,
    cache: &mut dyn DispatchCache,
) -> Layout {
    let inset = child.style.inset;
    let left = inset.left.resolve(Some(cb_width));
    let right = inset.right.resolve(Some(cb_width));
    let top = inset.top.resolve(Some(cb_height));
    let bottom = inset.bottom.resolve(Some(cb_height));

    let margin_left_auto = matches!(child.style.margin.left, Dimension::Auto);
    let margin_right_auto = matches!(child.style.margin.right, Dimension::Auto);
    let margin_top_auto = matches!(child.style.margin.top, Dimension::Auto);
    let margin_bottom_auto = matches!(child.style.margin.bottom, Dimension::Auto);

    let width_auto = matches!(child.style.width, Dimension::Auto);
    let resolved_width = if width_auto && left.is_some() && right.is_some() {
        let margin_h = if margin_left_auto { 0.0 } else { margin_value(child.style.margin.left) }
            + if margin_right_auto { 0.0 } else { margin_value(child.style.margin.right) };
        Some((cb_width - left.unwrap() - right.unwrap() - margin_h).max(0.0))
    } else {
        None
    };

    let available_width = resolved_width.or(Some(cb_width));
    let child_ctx = LayoutContext {
        available_width,
        available_height: Some(cb_height),
        sizing_mode: SizingMode::Definite,
        viewport_width: ctx.viewport_width,
        viewport_height: ctx.viewport_height,
    };
    let mut layout = dispatcher::compute(child, child_ctx, config, cache);
    if let Some(w) = resolved_width {
        layout.width = w;
    } else if width_auto {
        layout.width = resolve_width_for_node(child, available_width, config);
    }

    let height_auto = matches!(child.style.height, Dimension::Auto);
    if height_auto && top.is_some() && bottom.is_some() {
        let margin_v = if margin_top_auto { 0.0 } else { margin_value(child.style.margin.top) }
            + if margin_bottom_auto { 0.0 } else { margin_value(child.style.margin.bottom) };
        layout.height = (cb_height - top.unwrap() - bottom.unwrap() - margin_v).max(0.0);
    }

    let x = match (left, right) {
        (Some(l), Some(r)) => {
            let leftover = (cb_width - l - r - layout.width).max(0.0);
            if margin_left_auto && margin_right_auto {
                l + leftover / 2.0
            } else {
                l
            }
        }
        (Some(l), None) => l,
        (None, Some(r)) => (cb_width - r - layout.width).max(0.0),
        (None, None) => 0.0,
    };
    let y = match (top, bottom) {
        (Some(t), Some(b)) => {
            let leftover = (cb_height - t - b - layout.height).max(0.0);
            if margin_top_auto && margin_bottom_auto {
                t + leftover / 2.0
            } else {
                t
            }
        }
        (Some(t), None) => t,
        (None, Some(b)) => (cb_height - b - layout.height).max(0.0),
        (None, None) => 0.0,
    };

    layout.x = x;
    layout.y = y;
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NoopCache;
    use crate::node::Node;
    use crate::style::Style;

    fn ctx(w: f64, h: f64) -> LayoutContext {
        LayoutContext::new(w, h)
    }

    #[test]
    fn block_margin_collapse_scenario_4() {
        let mut root_style = Style::default();
        root_style.width = Dimension::Length(100.0);

        let mut a_style = Style::default();
        a_style.height = Dimension::Length(30.0);
        a_style.margin.bottom = Dimension::Length(20.0);

        let mut b_style = Style::default();
        b_style.height = Dimension::Length(30.0);
        b_style.margin.top = Dimension::Length(15.0);

        let root = Node::new(1, root_style)
            .with_children(vec![Node::new(2, a_style), Node::new(3, b_style)]);

        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);

        assert_eq!(result.children[0].y, 0.0);
        assert_eq!(result.children[1].y, 50.0);
    }

    #[test]
    fn auto_width_fills_container() {
        let root_style = Style::default();
        let child_style = Style::default();
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(300.0, 200.0), &config, &mut cache);
        assert_eq!(result.children[0].width, 300.0);
    }

    #[test]
    fn aspect_ratio_derives_height_from_resolved_width() {
        let mut root_style = Style::default();
        root_style.width = Dimension::Length(200.0);
        root_style.aspect_ratio = Some(2.0);
        let root = Node::new(1, root_style);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);
        assert_eq!(result.height, 100.0);
    }

    #[test]
    fn max_height_clamps_content_determined_height() {
        let mut root_style = Style::default();
        root_style.max_height = Dimension::Length(10.0);
        let mut child_style = Style::default();
        child_style.height = Dimension::Length(30.0);
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(300.0, 200.0), &config, &mut cache);
        assert_eq!(result.height, 10.0);
    }

    #[test]
    fn block_margin_collapse_parent_and_first_child() {
        let root_style = Style::default();

        let mut child_style = Style::default();
        child_style.height = Dimension::Length(30.0);
        child_style.margin.top = Dimension::Length(20.0);

        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);

        assert_eq!(result.children[0].y, 0.0);
        assert_eq!(result.height, 30.0);
        assert_eq!(result.margin.top, 20.0);
    }

    #[test]
    fn block_margin_collapse_parent_and_last_child() {
        let root_style = Style::default();

        let mut child_style = Style::default();
        child_style.height = Dimension::Length(30.0);
        child_style.margin.bottom = Dimension::Length(25.0);

        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);

        assert_eq!(result.height, 30.0);
        assert_eq!(result.margin.bottom, 25.0);
    }

    #[test]
    fn block_margin_collapse_through_zero_height_spacer() {
        let root_style = Style::default();

        let mut a_style = Style::default();
        a_style.height = Dimension::Length(20.0);
        a_style.margin.bottom = Dimension::Length(10.0);

        let mut spacer_style = Style::default();
        spacer_style.margin.top = Dimension::Length(-5.0);
        spacer_style.margin.bottom = Dimension::Length(-3.0);

        let mut b_style = Style::default();
        b_style.height = Dimension::Length(20.0);
        b_style.margin.top = Dimension::Length(7.0);

        let root = Node::new(1, root_style).with_children(vec![
            Node::new(2, a_style),
            Node::new(3, spacer_style),
            Node::new(4, b_style),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);

        // The spacer's own top/bottom margins collapse into one (-5, the
        // larger-magnitude negative) before bridging A's bottom margin with
        // B's top margin, rather than being applied as two separate gaps.
        assert_eq!(result.children[1].y, 20.0 + 5.0);
        assert_eq!(result.children[2].y, 20.0 + 5.0 + 2.0);
    }

    #[test]
    fn auto_width_child_subtracts_own_margins() {
        let mut root_style = Style::default();
        root_style.width = Dimension::Length(200.0);

        let mut child_style = Style::default();
        child_style.margin.left = Dimension::Length(20.0);
        child_style.margin.right = Dimension::Length(10.0);

        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(800.0, 600.0), &config, &mut cache);

        assert_eq!(result.children[0].width, 170.0);
        assert!(result.children[0].x + result.children[0].width <= result.width);
    }

    #[test]
    fn layout_children_count_matches_node_children() {
        let root = Node::new(1, Style::default()).with_children(vec![
            Node::new(2, Style::default()),
            Node::new(3, Style::default()),
            Node::new(4, Style::default()),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let result = layout(&root, ctx(300.0, 200.0), &config, &mut cache);
        assert_eq!(result.children.len(), root.children.len());
    }
}
