//! The immutable style record every node carries, plus the value types it
//! is built from. Every enum here defaults to the CSS initial value so that
//! "the cascade left this unspecified" and "`Style::default()`" mean the
//! same thing, per the external-interfaces contract.

use crate::geometry::Rect;

/// A single sizing value along one axis. `MinContent`/`MaxContent` here are
/// resolved by the intrinsic-sizing pass, not by simple percentage
/// arithmetic; `resolve` only ever handles the length/percent/auto cases a
/// caller can compute without consulting content.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Dimension {
    Length(f64),
    Percent(f64),
    Auto,
    MinContent,
    MaxContent,
    FitContent(f64),
}

impl Default for Dimension {
    fn default() -> Dimension {
        Dimension::Auto
    }
}

impl Dimension {
    /// Resolves `Length`/`Percent` against a definite parent size. Returns
    /// `None` for `Auto` and for the intrinsic keywords, which callers must
    /// resolve via `compute_intrinsic` instead.
    pub fn resolve(self, parent: Option<f64>) -> Option<f64> {
        match self {
            Dimension::Length(v) => Some(v),
            Dimension::Percent(p) => parent.map(|base| base * p),
            _ => None,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn is_intrinsic_keyword(self) -> bool {
        matches!(self, Dimension::MinContent | Dimension::MaxContent | Dimension::FitContent(_))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Display {
    Block,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    None,
    Contents,
    /// `table` and the row/cell family, collapsed to this one variant —
    /// row/column/cell distinctions are a cascade concern, not a layout one.
    /// Resolved per [`crate::layout::TableSupport`].
    Table,
}

impl Default for Display {
    fn default() -> Display {
        Display::Block
    }
}

impl Display {
    pub fn is_flex(self) -> bool {
        matches!(self, Display::Flex | Display::InlineFlex)
    }

    pub fn is_grid(self) -> bool {
        matches!(self, Display::Grid | Display::InlineGrid)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

impl Default for Position {
    fn default() -> Position {
        Position::Static
    }
}

impl Position {
    pub fn is_absolutely_positioned(self) -> bool {
        matches!(self, Position::Absolute | Position::Fixed)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BoxSizing {
    ContentBox,
    BorderBox,
}

impl Default for BoxSizing {
    fn default() -> BoxSizing {
        BoxSizing::ContentBox
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Overflow {
    Visible,
    Hidden,
    Scroll,
    Auto,
    Clip,
}

impl Default for Overflow {
    fn default() -> Overflow {
        Overflow::Visible
    }
}

impl Overflow {
    /// Overflow values other than `Visible` suppress the automatic-minimum-size
    /// contribution of §4.5.D.
    pub fn is_visible(self) -> bool {
        matches!(self, Overflow::Visible)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FlexDirection {
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

impl Default for FlexDirection {
    fn default() -> FlexDirection {
        FlexDirection::Row
    }
}

impl FlexDirection {
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_column(self) -> bool {
        matches!(self, FlexDirection::Column | FlexDirection::ColumnReverse)
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
    WrapReverse,
}

impl Default for FlexWrap {
    fn default() -> FlexWrap {
        FlexWrap::NoWrap
    }
}

impl FlexWrap {
    pub fn is_wrapping(self) -> bool {
        !matches!(self, FlexWrap::NoWrap)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, FlexWrap::WrapReverse)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl Default for JustifyContent {
    fn default() -> JustifyContent {
        JustifyContent::Start
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Baseline,
    Stretch,
}

impl Default for AlignItems {
    fn default() -> AlignItems {
        AlignItems::Stretch
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AlignSelf {
    Auto,
    Start,
    End,
    Center,
    Baseline,
    Stretch,
}

impl Default for AlignSelf {
    fn default() -> AlignSelf {
        AlignSelf::Auto
    }
}

impl AlignSelf {
    /// `Auto` inherits the parent's `align-items`.
    pub fn resolve(self, parent_align_items: AlignItems) -> AlignSelf {
        match self {
            AlignSelf::Auto => match parent_align_items {
                AlignItems::Start => AlignSelf::Start,
                AlignItems::End => AlignSelf::End,
                AlignItems::Center => AlignSelf::Center,
                AlignItems::Baseline => AlignSelf::Baseline,
                AlignItems::Stretch => AlignSelf::Stretch,
            },
            other => other,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AlignContent {
    Start,
    End,
    Center,
    Stretch,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl Default for AlignContent {
    fn default() -> AlignContent {
        AlignContent::Stretch
    }
}

/// A placement on one grid axis (`grid-row-start`/`-end` and the column
/// equivalents). `Line` indices are 1-based and may be negative to count
/// from the end, per §4.5.B.1.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum GridPlacement {
    #[default]
    Auto,
    Line(i32),
    Span(u16),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct GridLine {
    pub start: GridPlacement,
    pub end: GridPlacement,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GridAutoFlow {
    Row,
    Column,
    RowDense,
    ColumnDense,
}

impl Default for GridAutoFlow {
    fn default() -> GridAutoFlow {
        GridAutoFlow::Row
    }
}

impl GridAutoFlow {
    pub fn is_column(self) -> bool {
        matches!(self, GridAutoFlow::Column | GridAutoFlow::ColumnDense)
    }

    pub fn is_dense(self) -> bool {
        matches!(self, GridAutoFlow::RowDense | GridAutoFlow::ColumnDense)
    }
}

/// One of the non-repeated track-sizing primitives: `<length>`, `<percent>`,
/// `fr`, the content keywords, `fit-content()` and `minmax()`. `minmax()`'s
/// operands are themselves drawn from this same set minus `minmax`/`repeat`
/// per the CSS grammar, so no further boxing is needed.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum TrackBreadth {
    Length(f64),
    Percent(f64),
    Fr(f64),
    Auto,
    MinContent,
    MaxContent,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum TrackSize {
    Breadth(TrackBreadth),
    FitContent(f64),
    MinMax(TrackBreadth, TrackBreadth),
}

impl TrackSize {
    pub fn is_flexible(self) -> bool {
        matches!(
            self,
            TrackSize::Breadth(TrackBreadth::Fr(_)) | TrackSize::MinMax(_, TrackBreadth::Fr(_))
        )
    }

    pub fn fr_factor(self) -> Option<f64> {
        match self {
            TrackSize::Breadth(TrackBreadth::Fr(k)) => Some(k),
            TrackSize::MinMax(_, TrackBreadth::Fr(k)) => Some(k),
            _ => None,
        }
    }

    /// The `min` side used to seed a track's base size (§4.5.C.1).
    pub fn min_sizing(self) -> TrackBreadth {
        match self {
            TrackSize::Breadth(b) => b,
            TrackSize::FitContent(_) => TrackBreadth::Auto,
            TrackSize::MinMax(min, _) => min,
        }
    }

    /// The `max` side used to seed a track's growth limit (§4.5.C.1).
    pub fn max_sizing(self) -> TrackBreadth {
        match self {
            TrackSize::Breadth(b) => b,
            TrackSize::FitContent(d) => TrackBreadth::Length(d),
            TrackSize::MinMax(_, max) => max,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RepeatCount {
    Count(u32),
    AutoFill,
    AutoFit,
}

/// A track-sizing entry in `grid-template-columns`/`-rows`. `Repeat`'s
/// inner list is bounded to non-repeating `TrackSize`s, mirroring the CSS
/// grammar (`repeat()` cannot nest) and avoiding a boxed recursive enum,
/// per the Design Notes.
#[derive(Clone, PartialEq, Debug)]
pub enum TrackSizingFunction {
    Single(TrackSize),
    Repeat(RepeatCount, Vec<TrackSize>),
}

impl TrackSizingFunction {
    pub fn length(v: f64) -> Self {
        TrackSizingFunction::Single(TrackSize::Breadth(TrackBreadth::Length(v)))
    }

    pub fn fr(k: f64) -> Self {
        TrackSizingFunction::Single(TrackSize::Breadth(TrackBreadth::Fr(k)))
    }

    pub fn auto() -> Self {
        TrackSizingFunction::Single(TrackSize::Breadth(TrackBreadth::Auto))
    }
}

/// `grid-template-areas`: a rectangular grid of area names ("." for none).
#[derive(Clone, PartialEq, Debug, Default)]
pub struct GridTemplateAreas {
    pub rows: Vec<Vec<String>>,
}

impl GridTemplateAreas {
    /// The bounding box (1-based, end-exclusive) of a named area, if any
    /// cell names it.
    pub fn area_bounds(&self, name: &str) -> Option<(i32, i32, i32, i32)> {
        let mut row_start = i32::MAX;
        let mut row_end = i32::MIN;
        let mut col_start = i32::MAX;
        let mut col_end = i32::MIN;
        let mut found = false;
        for (r, row) in self.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell == name {
                    found = true;
                    let r = r as i32 + 1;
                    let c = c as i32 + 1;
                    row_start = row_start.min(r);
                    row_end = row_end.max(r + 1);
                    col_start = col_start.min(c);
                    col_end = col_end.max(c + 1);
                }
            }
        }
        if found { Some((row_start, row_end, col_start, col_end)) } else { None }
    }
}

/// The full style record. Every field defaults to its CSS initial value.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub display: Display,
    pub position: Position,
    pub inset: Rect<Dimension>,

    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    pub aspect_ratio: Option<f64>,
    pub box_sizing: BoxSizing,

    pub margin: Rect<Dimension>,
    pub padding: Rect<Dimension>,
    pub border: Rect<Dimension>,

    pub overflow_x: Overflow,
    pub overflow_y: Overflow,

    // Flex container
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,
    pub row_gap: f64,
    pub column_gap: f64,

    // Flex item
    pub flex_grow: f64,
    pub flex_shrink: f64,
    pub flex_basis: Dimension,
    pub align_self: AlignSelf,
    pub order: i32,

    // Grid container
    pub grid_template_rows: Vec<TrackSizingFunction>,
    pub grid_template_columns: Vec<TrackSizingFunction>,
    pub grid_auto_rows: Vec<TrackSize>,
    pub grid_auto_columns: Vec<TrackSize>,
    pub grid_auto_flow: GridAutoFlow,
    pub grid_template_areas: Option<GridTemplateAreas>,
    pub justify_items: AlignItems,
    pub justify_content_grid: JustifyContent,

    // Grid item
    pub grid_row: GridLine,
    pub grid_column: GridLine,
    pub grid_area: Option<String>,
    pub justify_self: AlignSelf,
}

impl Default for Style {
    fn default() -> Style {
        Style {
            display: Default::default(),
            position: Default::default(),
            inset: Default::default(),

            width: Default::default(),
            height: Default::default(),
            min_width: Default::default(),
            min_height: Default::default(),
            max_width: Default::default(),
            max_height: Default::default(),
            aspect_ratio: None,
            box_sizing: Default::default(),

            margin: Default::default(),
            padding: Default::default(),
            border: Default::default(),

            overflow_x: Default::default(),
            overflow_y: Default::default(),

            flex_direction: Default::default(),
            flex_wrap: Default::default(),
            justify_content: Default::default(),
            align_items: Default::default(),
            align_content: Default::default(),
            row_gap: 0.0,
            column_gap: 0.0,

            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            align_self: Default::default(),
            order: 0,

            grid_template_rows: Vec::new(),
            grid_template_columns: Vec::new(),
            grid_auto_rows: vec![TrackSize::Breadth(TrackBreadth::Auto)],
            grid_auto_columns: vec![TrackSize::Breadth(TrackBreadth::Auto)],
            grid_auto_flow: Default::default(),
            grid_template_areas: None,
            justify_items: Default::default(),
            justify_content_grid: Default::default(),

            grid_row: Default::default(),
            grid_column: Default::default(),
            grid_area: None,
            justify_self: Default::default(),
        }
    }
}

impl Style {
    pub fn min_main_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.min_width } else { self.min_height }
    }

    pub fn max_main_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.max_width } else { self.max_height }
    }

    pub fn main_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.width } else { self.height }
    }

    pub fn cross_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.height } else { self.width }
    }

    pub fn min_cross_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.min_height } else { self.min_width }
    }

    pub fn max_cross_size(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.max_height } else { self.max_width }
    }

    pub fn main_margin_start(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.margin.left } else { self.margin.top }
    }

    pub fn main_margin_end(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.margin.right } else { self.margin.bottom }
    }

    pub fn cross_margin_start(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.margin.top } else { self.margin.left }
    }

    pub fn cross_margin_end(&self, direction: FlexDirection) -> Dimension {
        if direction.is_row() { self.margin.bottom } else { self.margin.right }
    }

    pub fn align_self_resolved(&self, parent: &Style) -> AlignSelf {
        self.align_self.resolve(parent.align_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_defaults_match_css_initial_values() {
        let s = Style::default();
        assert_eq!(s.display, Display::Block);
        assert_eq!(s.position, Position::Static);
        assert_eq!(s.flex_direction, FlexDirection::Row);
        assert_eq!(s.flex_shrink, 1.0);
        assert_eq!(s.flex_grow, 0.0);
        assert_eq!(s.align_items, AlignItems::Stretch);
        assert_eq!(s.justify_content, JustifyContent::Start);
    }

    #[test]
    fn align_self_auto_inherits_parent() {
        let mut parent = Style::default();
        parent.align_items = AlignItems::Center;
        let child = Style::default();
        assert_eq!(child.align_self_resolved(&parent), AlignSelf::Center);
    }

    #[test]
    fn grid_template_areas_bounds() {
        let areas = GridTemplateAreas {
            rows: vec![
                vec!["header".into(), "header".into()],
                vec!["sidebar".into(), "main".into()],
            ],
        };
        assert_eq!(areas.area_bounds("header"), Some((1, 2, 1, 3)));
        assert_eq!(areas.area_bounds("main"), Some((2, 3, 2, 3)));
        assert_eq!(areas.area_bounds("missing"), None);
    }
}
