//! The flexbox formatting context (CSS Flexbox Level 1 §9), implemented as
//! the nine numbered steps of §4.4. Grounded in spirit on the teacher's
//! vendored flexbox solver (`algo.rs`), generalized from `Rc<RefCell<>>`
//! child links to the arena-indexed `Node`/dispatcher model this crate
//! uses throughout.

use crate::dispatcher::{self, DispatchCache};
use crate::geometry::Rect;
use crate::intrinsic::{self, Axis};
use crate::layout::{Layout, LayoutConfig, LayoutContext, RootSizingMode, SizingMode};
use crate::node::Node;
use crate::style::{AlignContent, AlignItems, AlignSelf, Dimension, FlexDirection, JustifyContent};

fn resolve_rect(rect: Rect<Dimension>, against: Option<f64>) -> Rect<f64> {
    rect.map(|d| d.resolve(against).unwrap_or(0.0))
}

fn fixed_or_default(d: Dimension, default: f64) -> f64 {
    match d {
        Dimension::Auto => default,
        other => other.resolve(None).unwrap_or(default),
    }
}

/// Resolves the container's own content-box width, honoring
/// `root_sizing_mode` for `width: auto` per §9's first open question.
fn resolve_own_width(node: &Node, available: Option<f64>, config: &LayoutConfig) -> f64 {
    let style = &node.style;
    let intrinsic = || intrinsic::compute_intrinsic(node, Axis::Inline, config);
    match style.width {
        Dimension::Length(v) => v.max(0.0),
        Dimension::Percent(p) => available.map(|a| (a * p).max(0.0)).unwrap_or(0.0),
        Dimension::MinContent => intrinsic().0,
        Dimension::MaxContent => intrinsic().1,
        Dimension::FitContent(max) => intrinsic().1.min(max),
        Dimension::Auto => match config.root_sizing_mode {
            RootSizingMode::Fill => available.unwrap_or_else(|| intrinsic().1),
            RootSizingMode::ShrinkToFit => intrinsic().1.min(available.unwrap_or(f64::INFINITY)),
        },
    }
}

fn resolve_own_height(node: &Node, available: Option<f64>, config: &LayoutConfig) -> Option<f64> {
    let style = &node.style;
    let intrinsic = || intrinsic::compute_intrinsic(node, Axis::Block, config);
    match style.height {
        Dimension::Length(v) => Some(v.max(0.0)),
        Dimension::Percent(p) => available.map(|a| (a * p).max(0.0)),
        Dimension::MinContent => Some(intrinsic().0),
        Dimension::MaxContent => Some(intrinsic().1),
        Dimension::FitContent(max) => Some(intrinsic().1.min(max)),
        Dimension::Auto => None,
    }
}

struct Item<'a> {
    node: &'a Node,
    index: usize,
    main_margin_start: f64,
    main_margin_end: f64,
    main_margin_start_auto: bool,
    main_margin_end_auto: bool,
    cross_margin_start: f64,
    cross_margin_end: f64,
    cross_margin_start_auto: bool,
    cross_margin_end_auto: bool,
    flex_basis: f64,
    hypothetical_main: f64,
    min_main: f64,
    max_main: f64,
    target_main: f64,
    frozen: bool,
    cross_size: Option<f64>,
    min_cross: f64,
    max_cross: f64,
    hypothetical_cross: f64,
    final_cross: f64,
    align_self: AlignSelf,
}

struct Line<'a> {
    items: Vec<Item<'a>>,
    cross_size: f64,
}

pub fn layout(node: &Node, ctx: LayoutContext, config: &LayoutConfig, cache: &mut dyn DispatchCache) -> Layout {
    let style = &node.style;
    let direction = style.flex_direction;
    let padding = resolve_rect(style.padding, ctx.available_width);
    let border = resolve_rect(style.border, ctx.available_width);

    let content_width = resolve_own_width(node, ctx.available_width, config);
    let content_height = resolve_own_height(node, ctx.available_height, config);

    let main_avail: f64 = if direction.is_row() {
        content_width
    } else {
        content_height.unwrap_or(f64::INFINITY)
    };
    let cross_avail: Option<f64> = if direction.is_row() { content_height } else { Some(content_width) };

    let main_gap = if direction.is_row() { style.column_gap } else { style.row_gap };
    let cross_gap = if direction.is_row() { style.row_gap } else { style.column_gap };

    let (in_flow, absolute): (Vec<(usize, &Node)>, Vec<(usize, &Node)>) = node
        .children
        .iter()
        .enumerate()
        .partition(|(_, c)| !c.style.position.is_absolutely_positioned());

    // Step 1: item preparation. `order` reshuffles layout/paint order without
    // touching each item's original DOM index, which `item.index` still
    // carries for the final `children_layouts` reordering below.
    let mut items: Vec<Item> = in_flow
        .iter()
        .map(|(index, child)| prepare_item(*index, child, direction, main_avail, cross_avail, config))
        .collect();
    items.sort_by_key(|item| (item.node.style.order, item.index));

    // Step 2: line breaking.
    let mut lines: Vec<Line> = Vec::new();
    if !style.flex_wrap.is_wrapping() {
        lines.push(Line { items: std::mem::take(&mut items), cross_size: 0.0 });
    } else {
        let mut current: Vec<Item> = Vec::new();
        let mut current_main = 0.0_f64;
        for item in items.drain(..) {
            let item_main = item.hypothetical_main + item.main_margin_start + item.main_margin_end;
            let next_main = if current.is_empty() { item_main } else { current_main + main_gap + item_main };
            if !current.is_empty() && next_main > main_avail + 0.01 {
                lines.push(Line { items: std::mem::take(&mut current), cross_size: 0.0 });
                current_main = item_main;
                current.push(item);
            } else {
                current_main = next_main;
                current.push(item);
            }
        }
        if !current.is_empty() {
            lines.push(Line { items: current, cross_size: 0.0 });
        }
    }

    // `RowReverse`/`ColumnReverse` reverse each line's item order on the main
    // axis; `wrap-reverse` reverses which end lines stack from on the cross
    // axis. Both happen after line assignment, per the flexbox algorithm, so
    // line-breaking above still packs in source order.
    if direction.is_reverse() {
        for line in &mut lines {
            line.items.reverse();
        }
    }
    if style.flex_wrap.is_reversed() {
        lines.reverse();
    }

    // Step 3: resolve flexible lengths, per line.
    for line in &mut lines {
        resolve_flexible_lengths(&mut line.items, main_avail, main_gap);
    }

    // Step 4: cross sizing (hypothetical pass + per-line cross size).
    for line in &mut lines {
        for item in &mut line.items {
            let cross_ctx_available = item.cross_size.or(cross_avail);
            let main_size_for_dispatch = item.target_main;
            let item_ctx = build_item_ctx(direction, ctx, main_size_for_dispatch, cross_ctx_available, item.cross_size.is_some());
            let probe = dispatcher::compute(item.node, item_ctx, config, cache);
            item.hypothetical_cross = if direction.is_row() { probe.height } else { probe.width };
        }
        line.cross_size = line
            .items
            .iter()
            .map(|it| it.hypothetical_cross + it.cross_margin_start + it.cross_margin_end)
            .fold(0.0_f64, f64::max);
    }

    // Step 5: container cross size.
    let n_lines = lines.len().max(1);
    let container_cross = cross_avail.unwrap_or_else(|| {
        lines.iter().map(|l| l.cross_size).sum::<f64>() + cross_gap * (n_lines as f64 - 1.0).max(0.0)
    });

    // Distribute align-content across lines when wrapping and container cross exceeds total.
    let total_lines_cross: f64 = lines.iter().map(|l| l.cross_size).sum::<f64>() + cross_gap * (n_lines as f64 - 1.0).max(0.0);
    let extra_cross = (container_cross - total_lines_cross).max(0.0);
    let (line_offsets, line_gap_extra) = if style.flex_wrap.is_wrapping() && lines.len() > 1 && extra_cross > 0.0 {
        distribute_align_content(style.align_content, lines.len(), extra_cross)
    } else {
        (vec![0.0; lines.len()], cross_gap)
    };

    // Step 7 (per-item within line) + final per-item layout dispatch + main-axis alignment (step 6).
    let mut children_layouts: Vec<(usize, Layout)> = Vec::with_capacity(node.children.len());
    let mut cross_cursor = 0.0_f64;
    for (line_index, line) in lines.iter_mut().enumerate() {
        cross_cursor += line_offsets.get(line_index).copied().unwrap_or(0.0);
        let line_cross_size = line.cross_size;

        // Final per-item cross size (stretch) and dispatch at final size.
        for item in &mut line.items {
            let resolved_self = item.align_self.resolve(style.align_items);
            let unclamped = match item.cross_size {
                Some(v) => v,
                None if resolved_self == AlignSelf::Stretch => {
                    (line_cross_size - item.cross_margin_start - item.cross_margin_end).max(0.0)
                }
                None => item.hypothetical_cross,
            };
            item.final_cross = unclamped.max(item.min_cross).min(item.max_cross);
        }

        // Main-axis alignment: distribute free space per justify-content / auto margins (steps 6, 8).
        let items_main_total: f64 = line
            .items
            .iter()
            .map(|it| it.target_main + it.main_margin_start + it.main_margin_end)
            .sum();
        let gaps = main_gap * (line.items.len() as f64 - 1.0).max(0.0);
        let free_main = (main_avail - items_main_total - gaps).max(0.0);

        let any_auto_margin = line.items.iter().any(|it| it.main_margin_start_auto || it.main_margin_end_auto);
        let auto_margin_count: usize = line
            .items
            .iter()
            .map(|it| (it.main_margin_start_auto as usize) + (it.main_margin_end_auto as usize))
            .sum();

        let (mut main_cursor, extra_gap) = if any_auto_margin && free_main > 0.0 {
            (0.0, 0.0)
        } else {
            main_alignment_start_and_gap(style.justify_content, free_main, line.items.len())
        };

        let auto_share = if any_auto_margin && auto_margin_count > 0 { free_main / auto_margin_count as f64 } else { 0.0 };

        let item_count = line.items.len();
        for (i, item) in line.items.iter_mut().enumerate() {
            let start_margin = if item.main_margin_start_auto { auto_share } else { item.main_margin_start };
            let end_margin = if item.main_margin_end_auto { auto_share } else { item.main_margin_end };

            main_cursor += start_margin;

            let cross_offset = cross_alignment_offset(
                item.align_self.resolve(style.align_items),
                line_cross_size,
                item.final_cross,
                item.cross_margin_start,
                item.cross_margin_end,
            );

            let item_ctx = build_item_ctx(direction, ctx, item.target_main, Some(item.final_cross), true);
            let mut child_layout = dispatcher::compute(item.node, item_ctx, config, cache);

            if direction.is_row() {
                child_layout.width = item.target_main;
                child_layout.height = item.final_cross;
                child_layout.x = main_cursor;
                child_layout.y = cross_cursor + cross_offset;
            } else {
                child_layout.height = item.target_main;
                child_layout.width = item.final_cross;
                child_layout.y = main_cursor;
                child_layout.x = cross_cursor + cross_offset;
            }

            main_cursor += item.target_main + end_margin;
            if i + 1 < item_count {
                main_cursor += main_gap + extra_gap;
            }

            children_layouts.push((item.index, child_layout));
        }

        cross_cursor += line_cross_size;
        if line_index + 1 < lines.len() {
            cross_cursor += line_gap_extra;
        }
    }

    // Step 9: absolute children, laid out against the content box.
    for (index, child) in &absolute {
        let layout = layout_absolute_child(child, content_width, container_cross, ctx, config, cache);
        children_layouts.push((*index, layout));
    }

    children_layouts.sort_by_key(|(i, _)| *i);
    let ordered_children: Vec<Layout> = children_layouts.into_iter().map(|(_, l)| l).collect();

    let (own_width, own_height) = if direction.is_row() {
        (content_width, container_cross)
    } else {
        (container_cross, content_width)
    };

    Layout {
        id: node.id.clone(),
        x: 0.0,
        y: 0.0,
        width: own_width + padding.horizontal() + border.horizontal(),
        height: own_height + padding.vertical() + border.vertical(),
        margin: resolve_rect(style.margin, ctx.available_width),
        padding,
        border,
        overflow_x: crate::layout::OverflowOrDefault(style.overflow_x),
        overflow_y: crate::layout::OverflowOrDefault(style.overflow_y),
        children: ordered_children,
        text: node.text.clone(),
    }
}

fn prepare_item<'a>(
    index: usize,
    node: &'a Node,
    direction: FlexDirection,
    main_avail: f64,
    cross_avail: Option<f64>,
    config: &LayoutConfig,
) -> Item<'a> {
    let style = &node.style;
    let main_margin_start_auto = matches!(style.main_margin_start(direction), Dimension::Auto);
    let main_margin_end_auto = matches!(style.main_margin_end(direction), Dimension::Auto);
    let cross_margin_start_auto = matches!(style.cross_margin_start(direction), Dimension::Auto);
    let cross_margin_end_auto = matches!(style.cross_margin_end(direction), Dimension::Auto);

    let main_margin_start = fixed_or_default(style.main_margin_start(direction), 0.0);
    let main_margin_end = fixed_or_default(style.main_margin_end(direction), 0.0);
    let cross_margin_start = fixed_or_default(style.cross_margin_start(direction), 0.0);
    let cross_margin_end = fixed_or_default(style.cross_margin_end(direction), 0.0);

    let flex_basis = match style.flex_basis {
        Dimension::Auto => intrinsic::flex_basis_fallback(node, direction, config),
        Dimension::Length(v) => v.max(0.0),
        Dimension::Percent(p) => (main_avail * p).max(0.0),
        Dimension::MinContent => {
            let axis = if direction.is_row() { Axis::Inline } else { Axis::Block };
            intrinsic::compute_intrinsic(node, axis, config).0
        }
        Dimension::MaxContent => {
            let axis = if direction.is_row() { Axis::Inline } else { Axis::Block };
            intrinsic::compute_intrinsic(node, axis, config).1
        }
        Dimension::FitContent(max) => {
            let axis = if direction.is_row() { Axis::Inline } else { Axis::Block };
            intrinsic::compute_intrinsic(node, axis, config).1.min(max)
        }
    };

    let min_main = match style.min_main_size(direction) {
        Dimension::Length(v) => v,
        _ => 0.0,
    };
    let max_main = match style.max_main_size(direction) {
        Dimension::Length(v) => v,
        _ => f64::INFINITY,
    };

    let hypothetical_main = flex_basis.max(min_main).min(max_main);

    let cross_size = style.cross_size(direction).resolve(cross_avail);
    let min_cross = match style.min_cross_size(direction) {
        Dimension::Length(v) => v,
        Dimension::Percent(p) => cross_avail.map(|a| a * p).unwrap_or(0.0),
        _ => 0.0,
    };
    let max_cross = match style.max_cross_size(direction) {
        Dimension::Length(v) => v,
        Dimension::Percent(p) => cross_avail.map(|a| a * p).unwrap_or(f64::INFINITY),
        _ => f64::INFINITY,
    };

    Item {
        node,
        index,
        main_margin_start,
        main_margin_end,
        main_margin_start_auto,
        main_margin_end_auto,
        cross_margin_start,
        cross_margin_end,
        cross_margin_start_auto,
        cross_margin_end_auto,
        flex_basis,
        hypothetical_main,
        min_main,
        max_main,
        target_main: hypothetical_main,
        frozen: false,
        cross_size,
        min_cross,
        max_cross,
        hypothetical_cross: 0.0,
        final_cross: 0.0,
        align_self: style.align_self,
    }
}

/// Step 3: resolving flexible lengths. Iteratively freezes items that
/// would violate their min/max, redistributing remaining free space among
/// the rest, per §4.4.3.
fn resolve_flexible_lengths(items: &mut [Item], main_avail: f64, main_gap: f64) {
    if items.is_empty() {
        return;
    }
    let n = items.len() as f64;
    let sum_hypothetical: f64 = items.iter().map(|it| it.hypothetical_main + it.main_margin_start + it.main_margin_end).sum();
    let gaps = main_gap * (n - 1.0).max(0.0);
    let free = main_avail - sum_hypothetical - gaps;

    for item in items.iter_mut() {
        item.target_main = item.hypothetical_main;
        item.frozen = item.node.style.flex_grow == 0.0 && item.node.style.flex_shrink == 0.0;
    }

    if free.abs() < 1e-9 {
        return;
    }

    let growing = free > 0.0;

    loop {
        let unfrozen: Vec<usize> = (0..items.len())
            .filter(|&i| {
                !items[i].frozen
                    && if growing { items[i].node.style.flex_grow > 0.0 } else { items[i].node.style.flex_shrink > 0.0 }
            })
            .collect();
        if unfrozen.is_empty() {
            break;
        }

        let used: f64 = items.iter().map(|it| it.target_main + it.main_margin_start + it.main_margin_end).sum();
        let remaining_free = main_avail - used - gaps;
        if remaining_free.abs() < 1e-9 {
            break;
        }

        let weight_sum: f64 = if growing {
            unfrozen.iter().map(|&i| items[i].node.style.flex_grow).sum()
        } else {
            unfrozen.iter().map(|&i| items[i].node.style.flex_shrink * items[i].flex_basis).sum()
        };

        if weight_sum <= 0.0 {
            break;
        }

        let mut any_frozen_this_pass = false;
        for &i in &unfrozen {
            let weight = if growing {
                items[i].node.style.flex_grow
            } else {
                items[i].node.style.flex_shrink * items[i].flex_basis
            };
            let share = remaining_free * (weight / weight_sum);
            let mut new_target = items[i].hypothetical_main + share;

            if new_target < items[i].min_main {
                new_target = items[i].min_main;
                items[i].frozen = true;
                any_frozen_this_pass = true;
            } else if new_target > items[i].max_main {
                new_target = items[i].max_main;
                items[i].frozen = true;
                any_frozen_this_pass = true;
            }
            items[i].target_main = new_target.max(0.0);
        }

        if !any_frozen_this_pass {
            break;
        }
    }
}

fn build_item_ctx(
    direction: FlexDirection,
    parent_ctx: LayoutContext,
    main_size: f64,
    cross_available: Option<f64>,
    cross_definite: bool,
) -> LayoutContext {
    let (available_width, available_height) = if direction.is_row() {
        (Some(main_size), if cross_definite { cross_available } else { None })
    } else {
        (if cross_definite { cross_available } else { None }, Some(main_size))
    };
    LayoutContext {
        available_width,
        available_height,
        sizing_mode: SizingMode::Definite,
        viewport_width: parent_ctx.viewport_width,
        viewport_height: parent_ctx.viewport_height,
    }
}

fn main_alignment_start_and_gap(justify: JustifyContent, free: f64, count: usize) -> (f64, f64) {
    if count == 0 {
        return (0.0, 0.0);
    }
    match justify {
        JustifyContent::Start => (0.0, 0.0),
        JustifyContent::End => (free, 0.0),
        JustifyContent::Center => (free / 2.0, 0.0),
        JustifyContent::SpaceBetween => {
            if count > 1 { (0.0, free / (count as f64 - 1.0)) } else { (0.0, 0.0) }
        }
        JustifyContent::SpaceAround => {
            let gap = free / count as f64;
            (gap / 2.0, gap)
        }
        JustifyContent::SpaceEvenly => {
            let gap = free / (count as f64 + 1.0);
            (gap, gap)
        }
    }
}

fn distribute_align_content(align: AlignContent, line_count: usize, extra: f64) -> (Vec<f64>, f64) {
    let n = line_count.max(1);
    match align {
        AlignContent::Start => (vec![0.0; n], 0.0),
        AlignContent::End => {
            let mut v = vec![0.0; n];
            v[0] = extra;
            (v, 0.0)
        }
        AlignContent::Center => {
            let mut v = vec![0.0; n];
            v[0] = extra / 2.0;
            (v, 0.0)
        }
        AlignContent::Stretch => (vec![0.0; n], if n > 1 { extra / (n as f64 - 1.0) } else { 0.0 }),
        AlignContent::SpaceBetween => (vec![0.0; n], if n > 1 { extra / (n as f64 - 1.0) } else { 0.0 }),
        AlignContent::SpaceAround => {
            let gap = extra / n as f64;
            let mut v = vec![gap; n];
            v[0] = gap / 2.0;
            (v, gap)
        }
        AlignContent::SpaceEvenly => {
            let gap = extra / (n as f64 + 1.0);
            let mut v = vec![gap; n];
            v[0] = gap;
            (v, gap)
        }
    }
}

fn cross_alignment_offset(align_self: AlignSelf, line_cross: f64, item_cross: f64, margin_start: f64, margin_end: f64) -> f64 {
    let free = (line_cross - item_cross - margin_start - margin_end).max(0.0);
    match align_self {
        AlignSelf::Start | AlignSelf::Auto => margin_start,
        AlignSelf::End => margin_start + free,
        AlignSelf::Center => margin_start + free / 2.0,
        AlignSelf::Stretch => margin_start,
        AlignSelf::Baseline => margin_start,
    }
}

fn layout_absolute_child(
    child: &Node,
    content_width: f64,
    content_height: f64,
    ctx: LayoutContext,
    config: &LayoutConfig,
    cache: &mut dyn DispatchCache,
) -> Layout {
    let inset = child.style.inset;
    let left = inset.left.resolve(Some(content_width));
    let right = inset.right.resolve(Some(content_width));
    let top = inset.top.resolve(Some(content_height));
    let bottom = inset.bottom.resolve(Some(content_height));

    let width_auto = matches!(child.style.width, Dimension::Auto);
    let resolved_width = if width_auto && left.is_some() && right.is_some() {
        Some((content_width - left.unwrap() - right.unwrap()).max(0.0))
    } else {
        None
    };

    let item_ctx = LayoutContext {
        available_width: resolved_width.or(Some(content_width)),
        available_height: Some(content_height),
        sizing_mode: SizingMode::Definite,
        viewport_width: ctx.viewport_width,
        viewport_height: ctx.viewport_height,
    };
    let mut layout = dispatcher::compute(child, item_ctx, config, cache);
    if let Some(w) = resolved_width {
        layout.width = w;
    }

    layout.x = left.unwrap_or(0.0);
    layout.y = top.unwrap_or(0.0);
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NoopCache;
    use crate::node::Node;
    use crate::style::Style;

    fn flex_root(width: f64, height: f64) -> Style {
        let mut s = Style::default();
        s.display = crate::style::Display::Flex;
        s.flex_direction = FlexDirection::Row;
        s.width = Dimension::Length(width);
        s.height = Dimension::Length(height);
        s
    }

    fn grow_child(grow: f64, height: f64) -> Style {
        let mut s = Style::default();
        s.flex_grow = grow;
        s.height = Dimension::Length(height);
        s
    }

    #[test]
    fn scenario_1_row_flex_with_equal_grow() {
        let root = Node::new(1, flex_root(300.0, 50.0)).with_children(vec![
            Node::new(2, grow_child(1.0, 50.0)),
            Node::new(3, grow_child(1.0, 50.0)),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert_eq!(result.children[0].x, 0.0);
        assert_eq!(result.children[0].width, 150.0);
        assert_eq!(result.children[1].x, 150.0);
        assert_eq!(result.children[1].width, 150.0);
    }

    #[test]
    fn scenario_2_grow_ratio() {
        let root = Node::new(1, flex_root(300.0, 50.0)).with_children(vec![
            Node::new(2, grow_child(1.0, 50.0)),
            Node::new(3, grow_child(2.0, 50.0)),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert_eq!(result.children[0].width, 100.0);
        assert_eq!(result.children[1].width, 200.0);
        assert_eq!(result.children[0].x, 0.0);
        assert_eq!(result.children[1].x, 100.0);
    }

    #[test]
    fn scenario_3_wrap() {
        let mut root_style = flex_root(200.0, 40.0);
        root_style.flex_wrap = crate::style::FlexWrap::Wrap;
        let mut child_style = Style::default();
        child_style.width = Dimension::Length(80.0);
        child_style.height = Dimension::Length(20.0);
        let root = Node::new(1, root_style).with_children(vec![
            Node::new(2, child_style.clone()),
            Node::new(3, child_style.clone()),
            Node::new(4, child_style),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert_eq!((result.children[0].x, result.children[0].y), (0.0, 0.0));
        assert_eq!((result.children[1].x, result.children[1].y), (80.0, 0.0));
        assert_eq!((result.children[2].x, result.children[2].y), (0.0, 20.0));
    }

    #[test]
    fn order_reshuffles_main_axis_position_not_output_index() {
        let root_style = flex_root(200.0, 20.0);
        let mut first_style = Style::default();
        first_style.width = Dimension::Length(50.0);
        first_style.order = 1;
        let mut second_style = Style::default();
        second_style.width = Dimension::Length(50.0);
        second_style.order = 0;
        let root = Node::new(1, root_style)
            .with_children(vec![Node::new(2, first_style), Node::new(3, second_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        // DOM order is preserved in the output slice (uid 2 is still first)...
        assert_eq!(result.children[0].width, 50.0);
        // ...but `order` puts the second child (order 0) before the first
        // (order 1) on the main axis.
        assert_eq!(result.children[1].x, 0.0);
        assert_eq!(result.children[0].x, 50.0);
    }

    #[test]
    fn row_reverse_flips_main_axis_placement() {
        let mut root_style = flex_root(200.0, 20.0);
        root_style.flex_direction = FlexDirection::RowReverse;
        let mut a = Style::default();
        a.width = Dimension::Length(50.0);
        let mut b = Style::default();
        b.width = Dimension::Length(80.0);
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, a), Node::new(3, b)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        // Second child (uid 3) is visually first under row-reverse.
        assert_eq!(result.children[1].x, 0.0);
        assert_eq!(result.children[0].x, 80.0);
    }

    #[test]
    fn wrap_reverse_flips_line_order_on_cross_axis() {
        let mut root_style = flex_root(100.0, 40.0);
        root_style.flex_wrap = crate::style::FlexWrap::WrapReverse;
        let mut child_style = Style::default();
        child_style.width = Dimension::Length(80.0);
        child_style.height = Dimension::Length(20.0);
        let root = Node::new(1, root_style).with_children(vec![
            Node::new(2, child_style.clone()),
            Node::new(3, child_style),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        // Each child is alone on its own line (80-wide items in a 100-wide
        // row container wrap one per line); wrap-reverse stacks the first
        // line at the cross-axis end instead of the start.
        assert_eq!(result.children[0].y, 20.0);
        assert_eq!(result.children[1].y, 0.0);
    }

    #[test]
    fn max_height_clamps_stretched_cross_size() {
        let root_style = flex_root(100.0, 80.0);
        let mut child_style = Style::default();
        child_style.max_height = Dimension::Length(30.0);
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, child_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert_eq!(result.children[0].height, 30.0);
    }
}
