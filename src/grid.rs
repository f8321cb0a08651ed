//! The CSS Grid formatting context (§4.5): explicit/implicit track
//! construction, the three-pass placement algorithm, the track-sizing
//! algorithm of CSS Grid §12, and per-item alignment. The teacher carries
//! no grid implementation at all (`fschutt-azul`'s `layout_solver.rs`
//! predates grid support); this module is grounded on the Servo grid
//! formatting context (`other_examples/..._servo...grid-layout.rs.rs`) for
//! vocabulary (`GridTrack`, `run_track_sizing_algorithm`,
//! `auto_placement_cursor`) and written against this crate's own
//! `Node`/`Layout`/dispatcher model rather than Servo's fragment tree.

use std::collections::HashSet;

use crate::dispatcher::{self, DispatchCache};
use crate::geometry::{Axis as GridAxis, Rect};
use crate::intrinsic::{self, Axis as IntrinsicAxis};
use crate::layout::{Layout, LayoutConfig, LayoutContext, SizingMode};
use crate::node::Node;
use crate::style::{
    AlignSelf, Dimension, GridLine, GridPlacement, JustifyContent, RepeatCount, Style, TrackBreadth,
    TrackSize, TrackSizingFunction,
};

fn resolve_rect(rect: Rect<Dimension>, against: Option<f64>) -> Rect<f64> {
    rect.map(|d| d.resolve(against).unwrap_or(0.0))
}

fn intrinsic_axis_for(grid_axis: GridAxis) -> IntrinsicAxis {
    match grid_axis {
        GridAxis::Column => IntrinsicAxis::Inline,
        GridAxis::Row => IntrinsicAxis::Block,
    }
}

/// One explicit or implicit track, identified only by its sizing function
/// until `size_tracks` resolves `base`/`growth_limit` into a final size.
#[derive(Clone, Copy)]
struct TrackMeta {
    sizing: TrackSize,
    /// `Repeat(AutoFill | AutoFit, ..)` tracks that end up empty collapse
    /// to zero width per §4.5.A; `auto_fit` marks them as eligible.
    auto_fit: bool,
}

impl TrackMeta {
    fn fixed(sizing: TrackSize) -> Self {
        TrackMeta { sizing, auto_fit: false }
    }

    fn from_cycle(auto_list: &[TrackSize], i: usize) -> Self {
        let sizing = if auto_list.is_empty() {
            TrackSize::Breadth(TrackBreadth::Auto)
        } else {
            auto_list[i % auto_list.len()]
        };
        TrackMeta::fixed(sizing)
    }
}

/// A track after the sizing algorithm: `base`/`growth_limit` converge to
/// the same value except transiently mid-algorithm; `resolved()` is what
/// ships in the final `Layout`.
#[derive(Clone, Copy)]
struct Track {
    sizing: TrackSize,
    auto_fit: bool,
    base: f64,
    growth_limit: f64,
    occupied: bool,
}

impl Track {
    fn resolved(&self) -> f64 {
        if self.auto_fit && !self.occupied {
            0.0
        } else {
            self.growth_limit.max(self.base).max(0.0)
        }
    }
}

/// A grid item once placed: `child_index` is its position in
/// `node.children` (used to restore DOM order in the output `Layout`);
/// the four bounds are 0-based, end-exclusive internal track indices.
struct PlacedItem {
    child_index: usize,
    row_start: usize,
    row_end: usize,
    col_start: usize,
    col_end: usize,
}

/// One axis's explicit tracks plus the origin offset mapping CSS line
/// numbers (1-based, relative to the explicit grid) onto this vector.
/// `origin` is the internal index of explicit track 0; negative-line
/// placements prepend implicit tracks and shift `origin` up, matching the
/// arena-of-indices pattern from the Design Notes rather than the
/// teacher's external parent-map style of indirection.
struct AxisTracks {
    tracks: Vec<TrackMeta>,
    origin: usize,
    explicit_count: usize,
}

impl AxisTracks {
    fn new(explicit: Vec<TrackMeta>) -> Self {
        let explicit_count = explicit.len();
        AxisTracks { tracks: explicit, origin: 0, explicit_count }
    }

    /// Resolves a CSS line number (already made absolute: negative indices
    /// folded against `explicit_count`) to a 0-based track index the way
    /// `start_line` or `end_line` address it: track `t` spans line `t+1`
    /// to line `t+2`, so CSS line `L` as a *track* reference is `L - 1`.
    fn relative_index(&self, css_line: i32) -> i32 {
        css_line - 1
    }

    /// Ensures tracks exist to cover `[start_rel, end_rel)` (both relative
    /// to `origin`, may be negative or beyond the current length), growing
    /// with `auto_list`-sized implicit tracks as needed. Returns the final
    /// 0-based internal `(start, end)` pair.
    fn ensure_range(&mut self, start_rel: i32, end_rel: i32, auto_list: &[TrackSize]) -> (usize, usize) {
        let lo_rel = start_rel.min(end_rel);
        let hi_rel = start_rel.max(end_rel);

        let internal_lo = self.origin as i32 + lo_rel;
        if internal_lo < 0 {
            let deficit = (-internal_lo) as usize;
            let mut prefix: Vec<TrackMeta> = (0..deficit)
                .map(|k| TrackMeta::from_cycle(auto_list, deficit - 1 - k))
                .collect();
            prefix.append(&mut self.tracks);
            self.tracks = prefix;
            self.origin += deficit;
        }

        let internal_hi = self.origin as i32 + hi_rel;
        if internal_hi > self.tracks.len() as i32 {
            let deficit = internal_hi as usize - self.tracks.len();
            for k in 0..deficit {
                self.tracks.push(TrackMeta::from_cycle(auto_list, k));
            }
        }

        let start = (self.origin as i32 + lo_rel).max(0) as usize;
        let end = (self.origin as i32 + hi_rel).max(start as i32 + 1) as usize;
        (start, end)
    }

    /// Appends tracks (never prepends) until index `index` is valid; used
    /// by pure auto-placement, which per CSS never creates negative
    /// implicit lines.
    fn ensure_append(&mut self, index: usize, auto_list: &[TrackSize]) {
        while self.tracks.len() <= index {
            let k = self.tracks.len();
            self.tracks.push(TrackMeta::from_cycle(auto_list, k));
        }
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}

/// Expands `grid-template-rows`/`-columns` into a flat track list,
/// expanding `Repeat(N, ..)` literally and `Repeat(AutoFill|AutoFit, ..)`
/// by fitting as many copies as `container_size` permits (§4.5.A).
fn expand_template(list: &[TrackSizingFunction], container_size: Option<f64>, gap: f64) -> Vec<TrackMeta> {
    let mut out = Vec::new();
    for entry in list {
        match entry {
            TrackSizingFunction::Single(ts) => out.push(TrackMeta::fixed(*ts)),
            TrackSizingFunction::Repeat(RepeatCount::Count(n), items) => {
                for _ in 0..*n {
                    out.extend(items.iter().map(|ts| TrackMeta::fixed(*ts)));
                }
            }
            TrackSizingFunction::Repeat(count, items) => {
                let auto_fit = matches!(count, RepeatCount::AutoFit);
                let copies = autofit_copy_count(items, container_size, gap);
                for _ in 0..copies {
                    out.extend(items.iter().map(|ts| {
                        let mut meta = TrackMeta::fixed(*ts);
                        meta.auto_fit = auto_fit;
                        meta
                    }));
                }
            }
        }
    }
    out
}

fn autofit_copy_count(items: &[TrackSize], container_size: Option<f64>, gap: f64) -> usize {
    let Some(avail) = container_size else { return 1 };
    if avail <= 0.0 || items.is_empty() {
        return 1;
    }
    let per_repetition: f64 = items.iter().map(|t| fixed_floor(*t)).sum();
    if per_repetition <= 0.0 {
        return 1;
    }
    let n = items.len() as f64;
    let mut copies = 1usize;
    loop {
        let next = copies + 1;
        let total = per_repetition * next as f64 + gap * (n * next as f64 - 1.0).max(0.0);
        if total > avail || next > 4096 {
            break;
        }
        copies = next;
    }
    copies.max(1)
}

fn fixed_floor(ts: TrackSize) -> f64 {
    match ts {
        TrackSize::Breadth(TrackBreadth::Length(v)) => v.max(0.0),
        TrackSize::MinMax(TrackBreadth::Length(v), _) => v.max(0.0),
        TrackSize::FitContent(v) => v.max(0.0),
        _ => 0.0,
    }
}

/// Resolves a single `GridPlacement::Line` index to an absolute (positive)
/// CSS line number, folding negative indices against the explicit track
/// count per §4.5.B.1.
fn resolve_css_line(p: GridPlacement, explicit_count: usize) -> Option<i32> {
    match p {
        GridPlacement::Auto => None,
        GridPlacement::Span(_) => None,
        GridPlacement::Line(i) if i < 0 => Some(explicit_count as i32 + 2 + i),
        GridPlacement::Line(0) => Some(1),
        GridPlacement::Line(i) => Some(i),
    }
}

fn span_of(p: GridPlacement) -> Option<u16> {
    match p {
        GridPlacement::Span(n) => Some(n.max(1)),
        _ => None,
    }
}

/// `(start_line, end_line, span)`: both lines `Some` means the item is
/// fully positioned on this axis; only one (or neither) `Some` means
/// auto-placement must find the remaining coordinate (§4.5.B.2/3).
fn axis_request(line: GridLine, explicit_count: usize) -> (Option<i32>, Option<i32>, u16) {
    let start_line = resolve_css_line(line.start, explicit_count);
    let end_line = resolve_css_line(line.end, explicit_count);
    let span_start = span_of(line.start);
    let span_end = span_of(line.end);

    match (start_line, end_line, span_start, span_end) {
        (Some(s), Some(e), _, _) => {
            if s < e {
                (Some(s), Some(e), (e - s).max(1) as u16)
            } else if s > e {
                (Some(e), Some(s), (s - e).max(1) as u16)
            } else {
                (Some(s), Some(s + 1), 1)
            }
        }
        (Some(s), None, _, Some(n)) => (Some(s), Some(s + n as i32), n),
        (Some(s), None, _, None) => (Some(s), Some(s + 1), 1),
        (None, Some(e), Some(n), _) => (Some(e - n as i32), Some(e), n),
        (None, Some(e), None, _) => (Some(e - 1), Some(e), 1),
        (None, None, Some(n), _) => (None, None, n),
        (None, None, None, Some(n)) => (None, None, n),
        (None, None, None, None) => (None, None, 1),
    }
}

/// Overrides `grid_row`/`grid_column` with the named area's bounds when
/// `grid-area` names a region in `grid-template-areas` and the item has
/// not also set explicit line placements.
fn effective_placement(child_style: &Style, container_style: &Style) -> (GridLine, GridLine) {
    if let (Some(name), Some(areas)) = (&child_style.grid_area, &container_style.grid_template_areas) {
        if child_style.grid_row == GridLine::default() && child_style.grid_column == GridLine::default() {
            if let Some((row_start, row_end, col_start, col_end)) = areas.area_bounds(name) {
                return (
                    GridLine { start: GridPlacement::Line(row_start), end: GridPlacement::Line(row_end) },
                    GridLine { start: GridPlacement::Line(col_start), end: GridPlacement::Line(col_end) },
                );
            }
        }
    }
    (child_style.grid_row, child_style.grid_column)
}

struct GridPlan {
    row_tracks: Vec<Track>,
    col_tracks: Vec<Track>,
    items: Vec<PlacedItem>,
    row_gap: f64,
    col_gap: f64,
}

/// Runs placement (§4.5.B) and the track-sizing algorithm (§4.5.C/D) for
/// both axes. Shared by final layout and by `sum_track_sizes` (used by
/// `intrinsic::compute_intrinsic` for the grid branch).
fn build_plan(
    node: &Node,
    row_available: Option<f64>,
    col_available: Option<f64>,
    config: &LayoutConfig,
) -> GridPlan {
    let style = &node.style;
    let row_gap = style.row_gap.max(0.0);
    let col_gap = style.column_gap.max(0.0);

    let explicit_rows = expand_template(&style.grid_template_rows, row_available, row_gap);
    let explicit_cols = expand_template(&style.grid_template_columns, col_available, col_gap);

    let mut rows = AxisTracks::new(explicit_rows);
    let mut cols = AxisTracks::new(explicit_cols);

    let auto_rows: Vec<TrackSize> = if style.grid_auto_rows.is_empty() {
        vec![TrackSize::Breadth(TrackBreadth::Auto)]
    } else {
        style.grid_auto_rows.clone()
    };
    let auto_cols: Vec<TrackSize> = if style.grid_auto_columns.is_empty() {
        vec![TrackSize::Breadth(TrackBreadth::Auto)]
    } else {
        style.grid_auto_columns.clone()
    };

    let in_flow: Vec<(usize, &Node)> = node
        .children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.style.display != crate::style::Display::None && !c.style.position.is_absolutely_positioned())
        .collect();

    // Phase 1 (per §4.5.B.1/2): settle every definite anchor first, in DOM
    // order, so implicit-track growth (including negative-line prepends)
    // is finished before any occupancy-based search begins.
    struct Pending {
        child_index: usize,
        row_range: Option<(usize, usize)>,
        col_range: Option<(usize, usize)>,
        row_span: u16,
        col_span: u16,
    }

    let mut pending: Vec<Pending> = Vec::with_capacity(in_flow.len());
    for (child_index, child) in &in_flow {
        let (row_line, col_line) = effective_placement(&child.style, style);
        let (row_start, row_end, row_span) = axis_request(row_line, rows.explicit_count);
        let (col_start, col_end, col_span) = axis_request(col_line, cols.explicit_count);

        let row_range = match (row_start, row_end) {
            (Some(s), Some(e)) => Some(rows.ensure_range(rows.relative_index(s), rows.relative_index(e), &auto_rows)),
            _ => None,
        };
        let col_range = match (col_start, col_end) {
            (Some(s), Some(e)) => Some(cols.ensure_range(cols.relative_index(s), cols.relative_index(e), &auto_cols)),
            _ => None,
        };

        pending.push(Pending { child_index: *child_index, row_range, col_range, row_span, col_span });
    }

    // Occupancy of (row, col) cells already claimed by fully-positioned
    // items, so the auto-placement cursor (phase 3) skips them.
    let mut occupied: HashSet<(usize, usize)> = HashSet::new();
    for p in &pending {
        if let (Some((rs, re)), Some((cs, ce))) = (p.row_range, p.col_range) {
            for r in rs..re {
                for c in cs..ce {
                    occupied.insert((r, c));
                }
            }
        }
    }

    let auto_flow = style.grid_auto_flow;
    let dense = auto_flow.is_dense();
    let flow_is_column = auto_flow.is_column();
    let mut cursor = (0usize, 0usize); // (primary, secondary) in flow order

    let mut items: Vec<PlacedItem> = Vec::with_capacity(pending.len());
    for p in pending {
        let (row_range, col_range) = match (p.row_range, p.col_range) {
            (Some(r), Some(c)) => (r, c),
            (Some(r), None) => {
                let c = place_along_free_axis(&mut cols, &mut occupied, &auto_cols, p.col_span, r, true, dense);
                (r, c)
            }
            (None, Some(c)) => {
                let r = place_along_free_axis(&mut rows, &mut occupied, &auto_rows, p.row_span, c, false, dense);
                (r, c)
            }
            (None, None) => place_fully_auto(
                &mut rows,
                &mut cols,
                &mut occupied,
                &auto_rows,
                &auto_cols,
                p.row_span,
                p.col_span,
                &mut cursor,
                flow_is_column,
                dense,
            ),
        };

        for r in row_range.0..row_range.1 {
            for c in col_range.0..col_range.1 {
                occupied.insert((r, c));
            }
        }

        items.push(PlacedItem {
            child_index: p.child_index,
            row_start: row_range.0,
            row_end: row_range.1,
            col_start: col_range.0,
            col_end: col_range.1,
        });
    }

    // Track metas -> sizing state.
    let mut row_tracks: Vec<Track> = rows
        .tracks
        .iter()
        .map(|m| Track { sizing: m.sizing, auto_fit: m.auto_fit, base: 0.0, growth_limit: 0.0, occupied: false })
        .collect();
    let mut col_tracks: Vec<Track> = cols
        .tracks
        .iter()
        .map(|m| Track { sizing: m.sizing, auto_fit: m.auto_fit, base: 0.0, growth_limit: 0.0, occupied: false })
        .collect();
    for it in &items {
        for r in it.row_start..it.row_end {
            if let Some(t) = row_tracks.get_mut(r) {
                t.occupied = true;
            }
        }
        for c in it.col_start..it.col_end {
            if let Some(t) = col_tracks.get_mut(c) {
                t.occupied = true;
            }
        }
    }

    // Only `align-content` (the block axis) has a `Stretch` value in this
    // style model; `justify-content` on a grid container never stretches
    // column tracks here, so the column pass always gets `false`.
    let row_stretch = style.align_content == crate::style::AlignContent::Stretch
        && !row_tracks.iter().any(|t| t.sizing.is_flexible());

    size_tracks(&mut row_tracks, &items, GridAxis::Row, row_available, row_gap, row_stretch, node, config);
    size_tracks(&mut col_tracks, &items, GridAxis::Column, col_available, col_gap, false, node, config);

    GridPlan { row_tracks, col_tracks, items, row_gap, col_gap }
}

/// Places an item pinned on one axis (`fixed_index`/`on_row_axis` tells us
/// which) by scanning the other axis forward for the first free span,
/// growing that axis by appending (never prepending) as needed.
fn place_along_free_axis(
    free_axis: &mut AxisTracks,
    occupied: &mut HashSet<(usize, usize)>,
    auto_list: &[TrackSize],
    span: u16,
    fixed_range: (usize, usize),
    fixed_is_row: bool,
    _dense: bool,
) -> (usize, usize) {
    let span = span.max(1) as usize;
    let mut start = 0usize;
    loop {
        free_axis.ensure_append(start + span - 1, auto_list);
        let free = (start..start + span).all(|i| {
            (fixed_range.0..fixed_range.1).all(|f| {
                let key = if fixed_is_row { (f, i) } else { (i, f) };
                !occupied.contains(&key)
            })
        });
        if free {
            return (start, start + span);
        }
        start += 1;
        if start > 100_000 {
            return (start, start + span);
        }
    }
}

/// Fully automatic placement (§4.5.B.3): walks the flow cursor, searching
/// the bounded secondary axis for each primary-axis position and growing
/// the primary axis by appending as it goes. `Dense` restarts the cursor
/// at the origin every item; sparse only moves forward.
#[allow(clippy::too_many_arguments)]
fn place_fully_auto(
    rows: &mut AxisTracks,
    cols: &mut AxisTracks,
    occupied: &mut HashSet<(usize, usize)>,
    auto_rows: &[TrackSize],
    auto_cols: &[TrackSize],
    row_span: u16,
    col_span: u16,
    cursor: &mut (usize, usize),
    flow_is_column: bool,
    dense: bool,
) -> ((usize, usize), (usize, usize)) {
    let row_span = row_span.max(1) as usize;
    let col_span = col_span.max(1) as usize;

    if dense {
        *cursor = (0, 0);
    }

    if flow_is_column {
        // Primary axis = columns (grows), secondary = rows (bounded).
        let secondary_len = rows.len().max(1);
        let mut p = cursor.0;
        loop {
            cols.ensure_append(p + col_span - 1, auto_cols);
            let mut s = if p == cursor.0 && !dense { cursor.1 } else { 0 };
            while s + row_span <= secondary_len {
                let free = (p..p + col_span).all(|c| (s..s + row_span).all(|r| !occupied.contains(&(r, c))));
                if free {
                    *cursor = (p, s + row_span);
                    return ((s, s + row_span), (p, p + col_span));
                }
                s += 1;
            }
            p += 1;
            if p > 100_000 {
                return ((0, row_span), (p, p + col_span));
            }
        }
    } else {
        // Primary axis = rows (grows), secondary = columns (bounded).
        let secondary_len = cols.len().max(1);
        let mut p = cursor.0;
        loop {
            rows.ensure_append(p + row_span - 1, auto_rows);
            let mut s = if p == cursor.0 && !dense { cursor.1 } else { 0 };
            while s + col_span <= secondary_len {
                let free = (p..p + row_span).all(|r| (s..s + col_span).all(|c| !occupied.contains(&(r, c))));
                if free {
                    *cursor = (p, s + col_span);
                    return ((p, p + row_span), (s, s + col_span));
                }
                s += 1;
            }
            p += 1;
            if p > 100_000 {
                return ((p, p + row_span), (0, col_span));
            }
        }
    }
}

/// The track-sizing algorithm (§4.5.C), run independently per axis.
#[allow(clippy::too_many_arguments)]
fn size_tracks(
    tracks: &mut [Track],
    items: &[PlacedItem],
    axis: GridAxis,
    container_size: Option<f64>,
    gap: f64,
    align_content_stretch_no_fr: bool,
    node: &Node,
    config: &LayoutConfig,
) {
    if tracks.is_empty() {
        return;
    }

    let fr_as_max_content = container_size.is_none();

    // Step 1: initialize base/growth_limit floors.
    for t in tracks.iter_mut() {
        t.base = floor_value(t.sizing.min_sizing(), container_size);
        t.growth_limit = floor_value(t.sizing.max_sizing(), container_size);
        if t.growth_limit < t.base {
            t.growth_limit = t.base;
        }
    }

    struct Contribution {
        start: usize,
        end: usize,
        min: f64,
        max: f64,
    }

    let contributions: Vec<Contribution> = items
        .iter()
        .filter_map(|it| {
            let (start, end) = match axis {
                GridAxis::Row => (it.row_start, it.row_end),
                GridAxis::Column => (it.col_start, it.col_end),
            };
            let child = node.children.get(it.child_index)?;
            let intrinsic_axis = intrinsic_axis_for(axis);
            let (min, max) = intrinsic::compute_intrinsic(child, intrinsic_axis, config);
            let margin = match axis {
                GridAxis::Row => child.style.margin.top.resolve(None).unwrap_or(0.0) + child.style.margin.bottom.resolve(None).unwrap_or(0.0),
                GridAxis::Column => child.style.margin.left.resolve(None).unwrap_or(0.0) + child.style.margin.right.resolve(None).unwrap_or(0.0),
            };
            let overflow_visible = match axis {
                GridAxis::Row => child.style.overflow_y.is_visible(),
                GridAxis::Column => child.style.overflow_x.is_visible(),
            };
            Some(Contribution { start, end, min: (min + margin).max(0.0) * overflow_visible as u8 as f64, max: max + margin })
        })
        .collect();

    // Step 2: single-span items.
    for c in contributions.iter().filter(|c| c.end - c.start == 1) {
        let idx = c.start;
        let Some(track) = tracks.get_mut(idx) else { continue };
        let min_is_content = matches!(track.sizing.min_sizing(), TrackBreadth::Auto | TrackBreadth::MinContent);
        if min_is_content {
            track.base = track.base.max(c.min);
        }
        let max_is_content = matches!(track.sizing.max_sizing(), TrackBreadth::Auto | TrackBreadth::MinContent | TrackBreadth::MaxContent)
            || (fr_as_max_content && matches!(track.sizing.max_sizing(), TrackBreadth::Fr(_)));
        if max_is_content {
            track.growth_limit = track.growth_limit.max(c.max);
        }
        if track.growth_limit < track.base {
            track.growth_limit = track.base;
        }
    }

    // Step 3: multi-span items, ascending span order, distributing across
    // non-flexible spanned tracks first.
    let mut multi: Vec<&Contribution> = contributions.iter().filter(|c| c.end - c.start > 1).collect();
    multi.sort_by_key(|c| c.end - c.start);
    for c in multi {
        let span: Vec<usize> = (c.start..c.end).filter(|&i| i < tracks.len()).collect();
        if span.is_empty() {
            continue;
        }
        let non_flex: Vec<usize> = span.iter().copied().filter(|&i| !tracks[i].sizing.is_flexible()).collect();
        let target = if non_flex.is_empty() { span.clone() } else { non_flex };

        let current_base: f64 = target.iter().map(|&i| tracks[i].base).sum::<f64>() + gap * (target.len().saturating_sub(1)) as f64;
        let need_base = (c.min - current_base).max(0.0);
        if need_base > 0.0 && !target.is_empty() {
            let share = need_base / target.len() as f64;
            for &i in &target {
                tracks[i].base += share;
                if tracks[i].growth_limit < tracks[i].base {
                    tracks[i].growth_limit = tracks[i].base;
                }
            }
        }

        let current_limit: f64 = target.iter().map(|&i| tracks[i].growth_limit).sum::<f64>() + gap * (target.len().saturating_sub(1)) as f64;
        let need_limit = (c.max - current_limit).max(0.0);
        if need_limit > 0.0 && !target.is_empty() {
            let share = need_limit / target.len() as f64;
            for &i in &target {
                tracks[i].growth_limit += share;
            }
        }
    }

    // Step 4: resolve flexible (fr) tracks.
    if let Some(container) = container_size {
        let non_flex_total: f64 = tracks.iter().filter(|t| !t.sizing.is_flexible()).map(|t| t.growth_limit.max(t.base)).sum();
        let gaps_total = gap * (tracks.len().saturating_sub(1)) as f64;
        let leftover = (container - non_flex_total - gaps_total).max(0.0);
        let fr_sum: f64 = tracks.iter().filter_map(|t| t.sizing.fr_factor()).sum();
        if leftover > 0.0 && fr_sum > 0.0 {
            for t in tracks.iter_mut() {
                if let Some(k) = t.sizing.fr_factor() {
                    if k > 0.0 {
                        let share = leftover * (k / fr_sum);
                        t.growth_limit = t.base.max(share);
                    }
                }
            }
        }
    }

    // Step 5: expand under-filled tracks for `align-content: stretch`
    // when no flexible track already absorbs the leftover space.
    if align_content_stretch_no_fr {
        if let Some(container) = container_size {
            let total: f64 = tracks.iter().map(|t| t.resolved()).sum::<f64>() + gap * (tracks.len().saturating_sub(1)) as f64;
            let leftover = (container - total).max(0.0);
            if leftover > 0.0 {
                let share = leftover / tracks.len() as f64;
                for t in tracks.iter_mut() {
                    t.growth_limit += share;
                }
            }
        }
    }

    for t in tracks.iter_mut() {
        if t.base < 0.0 {
            log::warn!("grid: track base {} resolved negative, clamping to 0", t.base);
        }
        t.base = t.base.max(0.0);
        t.growth_limit = t.growth_limit.max(t.base).max(0.0);
    }
}

fn floor_value(breadth: TrackBreadth, container_size: Option<f64>) -> f64 {
    match breadth {
        TrackBreadth::Length(v) => v.max(0.0),
        TrackBreadth::Percent(p) => container_size.map(|c| (c * p).max(0.0)).unwrap_or(0.0),
        TrackBreadth::Auto | TrackBreadth::MinContent | TrackBreadth::MaxContent | TrackBreadth::Fr(_) => 0.0,
    }
}

fn track_offsets(sizes: &[f64], gap: f64) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(sizes.len() + 1);
    let mut cursor = 0.0_f64;
    offsets.push(cursor);
    for (i, s) in sizes.iter().enumerate() {
        cursor += s;
        if i + 1 < sizes.len() {
            cursor += gap;
        }
        offsets.push(cursor);
    }
    offsets
}

/// Sum of resolved track sizes plus interior gaps on `axis`, used by
/// `intrinsic::compute_intrinsic`'s grid branch to estimate min/max
/// content size at zero/unbounded available space (§4.2).
pub fn sum_track_sizes(node: &Node, axis: GridAxis, available: Option<f64>, config: &LayoutConfig) -> f64 {
    let (row_available, col_available) = match axis {
        GridAxis::Row => (available, None),
        GridAxis::Column => (None, available),
    };
    let plan = build_plan(node, row_available, col_available, config);
    let (tracks, gap) = match axis {
        GridAxis::Row => (&plan.row_tracks, plan.row_gap),
        GridAxis::Column => (&plan.col_tracks, plan.col_gap),
    };
    if tracks.is_empty() {
        0.0
    } else {
        tracks.iter().map(|t| t.resolved()).sum::<f64>() + gap * (tracks.len() as f64 - 1.0).max(0.0)
    }
}

fn resolve_own_width(node: &Node, available: Option<f64>, config: &LayoutConfig) -> f64 {
    let style = &node.style;
    let intrinsic = || intrinsic::compute_intrinsic(node, IntrinsicAxis::Inline, config);
    match style.width {
        Dimension::Length(v) => v.max(0.0),
        Dimension::Percent(p) => available.map(|a| (a * p).max(0.0)).unwrap_or(0.0),
        Dimension::MinContent => intrinsic().0,
        Dimension::MaxContent => intrinsic().1,
        Dimension::FitContent(max) => intrinsic().1.min(max),
        Dimension::Auto => match config.root_sizing_mode {
            crate::layout::RootSizingMode::Fill => available.unwrap_or_else(|| intrinsic().1),
            crate::layout::RootSizingMode::ShrinkToFit => intrinsic().1.min(available.unwrap_or(f64::INFINITY)),
        },
    }
}

fn resolve_own_height(node: &Node, available: Option<f64>, config: &LayoutConfig) -> Option<f64> {
    let style = &node.style;
    let intrinsic = || intrinsic::compute_intrinsic(node, IntrinsicAxis::Block, config);
    match style.height {
        Dimension::Length(v) => Some(v.max(0.0)),
        Dimension::Percent(p) => available.map(|a| (a * p).max(0.0)),
        Dimension::MinContent => Some(intrinsic().0),
        Dimension::MaxContent => Some(intrinsic().1),
        Dimension::FitContent(max) => Some(intrinsic().1.min(max)),
        Dimension::Auto => match config.root_sizing_mode {
            crate::layout::RootSizingMode::Fill if available.is_some() => available,
            _ => None,
        },
    }
}

pub fn layout(node: &Node, ctx: LayoutContext, config: &LayoutConfig, cache: &mut dyn DispatchCache) -> Layout {
    let style = &node.style;
    let padding = resolve_rect(style.padding, ctx.available_width);
    let border = resolve_rect(style.border, ctx.available_width);

    let content_width = resolve_own_width(node, ctx.available_width, config);
    let content_height = resolve_own_height(node, ctx.available_height, config);

    let plan = build_plan(node, Some(content_width), content_height, config);

    let row_sizes: Vec<f64> = plan.row_tracks.iter().map(|t| t.resolved()).collect();
    let col_sizes: Vec<f64> = plan.col_tracks.iter().map(|t| t.resolved()).collect();
    let row_offsets = track_offsets(&row_sizes, plan.row_gap);
    let col_offsets = track_offsets(&col_sizes, plan.col_gap);

    let grid_total_width = col_offsets.last().copied().unwrap_or(0.0);
    let grid_total_height = row_offsets.last().copied().unwrap_or(0.0);

    let extra_w = (content_width - grid_total_width).max(0.0);
    let extra_h = content_height.map(|h| (h - grid_total_height).max(0.0)).unwrap_or(0.0);
    let (content_offset_x, _) = main_alignment_offset(style.justify_content_grid, extra_w);
    let (content_offset_y, _) = main_alignment_offset(JustifyContent::Start, extra_h);

    let mut children_layouts: Vec<(usize, Layout)> = Vec::with_capacity(node.children.len());

    for item in &plan.items {
        let Some(child) = node.children.get(item.child_index) else { continue };

        let area_x = col_offsets.get(item.col_start).copied().unwrap_or(0.0) + content_offset_x;
        let area_right = col_offsets.get(item.col_end).copied().unwrap_or(grid_total_width) + content_offset_x;
        let area_y = row_offsets.get(item.row_start).copied().unwrap_or(0.0) + content_offset_y;
        let area_bottom = row_offsets.get(item.row_end).copied().unwrap_or(grid_total_height) + content_offset_y;
        let area_w = (area_right - area_x).max(0.0);
        let area_h = (area_bottom - area_y).max(0.0);

        let justify_self = child.style.justify_self.resolve(style.justify_items);
        let align_self = child.style.align_self.resolve(style.align_items);

        let mut child_layout = place_item_in_area(child, area_w, area_h, justify_self, align_self, ctx, config, cache);
        child_layout.x += area_x;
        child_layout.y += area_y;
        children_layouts.push((item.child_index, child_layout));
    }

    for (index, child) in node.children.iter().enumerate() {
        if child.style.display == crate::style::Display::None {
            let mut zero = Layout::zero(child.id.clone());
            zero.children = child.children.iter().map(|c| Layout::zero(c.id.clone())).collect();
            children_layouts.push((index, zero));
        } else if child.style.position.is_absolutely_positioned() {
            let cb_width = content_width + padding.horizontal();
            let cb_height = content_height.unwrap_or(grid_total_height) + padding.vertical();
            let layout = layout_absolute_child(child, cb_width, cb_height, &row_offsets, &col_offsets, ctx, config, cache);
            children_layouts.push((index, layout));
        }
    }

    children_layouts.sort_by_key(|(i, _)| *i);
    let ordered_children: Vec<Layout> = children_layouts.into_iter().map(|(_, l)| l).collect();

    let own_height = content_height.unwrap_or(grid_total_height);

    Layout {
        id: node.id.clone(),
        x: 0.0,
        y: 0.0,
        width: content_width + padding.horizontal() + border.horizontal(),
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

fn main_alignment_offset(justify: JustifyContent, extra: f64) -> (f64, f64) {
    match justify {
        JustifyContent::Start => (0.0, 0.0),
        JustifyContent::End => (extra, 0.0),
        JustifyContent::Center => (extra / 2.0, 0.0),
        JustifyContent::SpaceBetween | JustifyContent::SpaceAround | JustifyContent::SpaceEvenly => (0.0, 0.0),
    }
}

/// Lays a child out into its resolved grid area (§4.5.E), dispatching at
/// the area's size and then, for non-stretch alignment, overriding the
/// outer box to the item's shrink-to-fit size and offsetting within the
/// area. The child's internal content is not re-flowed at the smaller
/// size in the shrink-to-fit case — a documented simplification, see
/// `DESIGN.md`.
fn place_item_in_area(
    child: &Node,
    area_w: f64,
    area_h: f64,
    justify_self: AlignSelf,
    align_self: AlignSelf,
    ctx: LayoutContext,
    config: &LayoutConfig,
    cache: &mut dyn DispatchCache,
) -> Layout {
    let width_auto = matches!(child.style.width, Dimension::Auto);
    let height_auto = matches!(child.style.height, Dimension::Auto);

    let child_ctx = LayoutContext {
        available_width: Some(area_w),
        available_height: Some(area_h),
        sizing_mode: SizingMode::Definite,
        viewport_width: ctx.viewport_width,
        viewport_height: ctx.viewport_height,
    };
    let mut layout = dispatcher::compute(child, child_ctx, config, cache);

    if width_auto && justify_self != AlignSelf::Stretch && justify_self != AlignSelf::Auto {
        let (_, max_w) = intrinsic::compute_intrinsic(child, IntrinsicAxis::Inline, config);
        layout.width = max_w.min(area_w);
    }
    if height_auto && align_self != AlignSelf::Stretch && align_self != AlignSelf::Auto {
        let (_, max_h) = intrinsic::compute_intrinsic(child, IntrinsicAxis::Block, config);
        layout.height = max_h.min(area_h);
    }

    let free_w = (area_w - layout.width).max(0.0);
    let free_h = (area_h - layout.height).max(0.0);
    layout.x = match justify_self {
        AlignSelf::End => free_w,
        AlignSelf::Center => free_w / 2.0,
        _ => 0.0,
    };
    layout.y = match align_self {
        AlignSelf::End => free_h,
        AlignSelf::Center => free_h / 2.0,
        _ => 0.0,
    };
    layout
}

/// Absolutely-positioned grid children (§4.5.F): placed against the
/// grid's padding box, using `grid_row`/`grid_column` when set (treating
/// line `0`/unset as the grid's outer edge) or falling back to `inset`.
fn layout_absolute_child(
    child: &Node,
    cb_width: f64,
    cb_height: f64,
    row_offsets: &[f64],
    col_offsets: &[f64],
    ctx: LayoutContext,
    config: &LayoutConfig,
    cache: &mut dyn DispatchCache,
) -> Layout {
    let uses_grid_placement =
        child.style.grid_row != GridLine::default() || child.style.grid_column != GridLine::default();

    let (area_x, area_w, area_y, area_h) = if uses_grid_placement {
        let col_line = |p: GridPlacement| resolve_css_line(p, col_offsets.len().saturating_sub(1)).unwrap_or(1);
        let row_line = |p: GridPlacement| resolve_css_line(p, row_offsets.len().saturating_sub(1)).unwrap_or(1);
        let cs = (col_line(child.style.grid_column.start) - 1).clamp(0, col_offsets.len() as i32 - 1) as usize;
        let ce = (col_line(child.style.grid_column.end) - 1).clamp(0, col_offsets.len() as i32 - 1) as usize;
        let rs = (row_line(child.style.grid_row.start) - 1).clamp(0, row_offsets.len() as i32 - 1) as usize;
        let re = (row_line(child.style.grid_row.end) - 1).clamp(0, row_offsets.len() as i32 - 1) as usize;
        let x0 = col_offsets[cs.min(ce)];
        let x1 = col_offsets[cs.max(ce).max(cs.min(ce) + 1).min(col_offsets.len() - 1)];
        let y0 = row_offsets[rs.min(re)];
        let y1 = row_offsets[rs.max(re).max(rs.min(re) + 1).min(row_offsets.len() - 1)];
        (x0, (x1 - x0).max(0.0), y0, (y1 - y0).max(0.0))
    } else {
        (0.0, cb_width, 0.0, cb_height)
    };

    let inset = child.style.inset;
    let left = inset.left.resolve(Some(cb_width));
    let right = inset.right.resolve(Some(cb_width));
    let top = inset.top.resolve(Some(cb_height));
    let bottom = inset.bottom.resolve(Some(cb_height));

    let (x, width_avail) = if uses_grid_placement {
        (area_x, area_w)
    } else {
        match (left, right) {
            (Some(l), Some(r)) => (l, (cb_width - l - r).max(0.0)),
            (Some(l), None) => (l, cb_width - l),
            (None, Some(r)) => (0.0, cb_width - r),
            (None, None) => (0.0, cb_width),
        }
    };
    let (y, height_avail) = if uses_grid_placement {
        (area_y, area_h)
    } else {
        match (top, bottom) {
            (Some(t), Some(b)) => (t, (cb_height - t - b).max(0.0)),
            (Some(t), None) => (t, cb_height - t),
            (None, Some(b)) => (0.0, cb_height - b),
            (None, None) => (0.0, cb_height),
        }
    };

    let width_auto = matches!(child.style.width, Dimension::Auto);
    let child_ctx = LayoutContext {
        available_width: Some(width_avail.max(0.0)),
        available_height: Some(height_avail.max(0.0)),
        sizing_mode: SizingMode::Definite,
        viewport_width: ctx.viewport_width,
        viewport_height: ctx.viewport_height,
    };
    let mut layout = dispatcher::compute(child, child_ctx, config, cache);
    if width_auto && uses_grid_placement {
        layout.width = width_avail.max(0.0);
    }
    layout.x = x;
    layout.y = y;
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NoopCache;
    use crate::node::Node;
    use crate::style::{Display, Style};

    fn grid_root(width: f64, height: f64, cols: Vec<TrackSizingFunction>) -> Style {
        let mut s = Style::default();
        s.display = Display::Grid;
        s.width = Dimension::Length(width);
        s.height = Dimension::Length(height);
        s.grid_template_columns = cols;
        s
    }

    #[test]
    fn scenario_5_fr_distribution() {
        let root_style = grid_root(
            300.0,
            100.0,
            vec![TrackSizingFunction::fr(1.0), TrackSizingFunction::fr(2.0), TrackSizingFunction::fr(1.0)],
        );
        let root = Node::new(1, root_style).with_children(vec![
            Node::new(2, Style::default()),
            Node::new(3, Style::default()),
            Node::new(4, Style::default()),
        ]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert_eq!(result.children.len(), 3);
        assert!((result.children[0].width - 75.0).abs() < 0.01);
        assert!((result.children[1].width - 150.0).abs() < 0.01);
        assert!((result.children[2].width - 75.0).abs() < 0.01);
        assert!((result.children[0].x - 0.0).abs() < 0.01);
        assert!((result.children[1].x - 75.0).abs() < 0.01);
        assert!((result.children[2].x - 225.0).abs() < 0.01);
    }

    #[test]
    fn explicit_line_placement_spans_tracks() {
        let root_style = grid_root(
            300.0,
            100.0,
            vec![TrackSizingFunction::length(100.0), TrackSizingFunction::length(100.0), TrackSizingFunction::length(100.0)],
        );
        let mut item_style = Style::default();
        item_style.grid_column = GridLine { start: GridPlacement::Line(1), end: GridPlacement::Span(2) };
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, item_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert!((result.children[0].width - 200.0).abs() < 0.01);
    }

    #[test]
    fn negative_line_anchors_to_explicit_end() {
        let root_style = grid_root(
            300.0,
            100.0,
            vec![TrackSizingFunction::length(100.0), TrackSizingFunction::length(100.0), TrackSizingFunction::length(100.0)],
        );
        let mut item_style = Style::default();
        item_style.grid_column = GridLine { start: GridPlacement::Auto, end: GridPlacement::Line(-1) };
        let root = Node::new(1, root_style).with_children(vec![Node::new(2, item_style)]);
        let config = LayoutConfig::default();
        let mut cache = NoopCache;
        let ctx = LayoutContext::new(800.0, 600.0);
        let result = layout(&root, ctx, &config, &mut cache);

        assert!((result.children[0].x - 200.0).abs() < 0.01);
        assert!((result.children[0].width - 100.0).abs() < 0.01);
    }
}
