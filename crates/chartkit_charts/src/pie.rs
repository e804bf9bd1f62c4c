//! Pie and donut chart geometry.
//!
//! Each value source is one ring. A ring's items become fractions of the
//! configured angular span, which are laid out as contiguous arc segments.
//! Adjacent segments overlap slightly so anti-aliased edges blend instead of
//! leaving a seam.

use std::cell::{Cell, Ref, RefCell};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::{Rc, Weak};

use chartkit_core::{Color, DirtyFlag, Notifier, Subscription};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::chart::{default_color, ChartSources, IndexingMode};
use crate::range::RangeGroup;
use crate::source::SourceHandle;

/// Overlap into the following segment when `smooth_ends` is set, in radians.
pub const SMOOTH_OVERLAP: f32 = 0.2;
/// Largest overlap into the following segment otherwise, in radians.
pub const SEAM_OVERLAP: f32 = 0.05;
/// Largest angle covered by one wedge.
pub const MAX_WEDGE_ANGLE: f32 = FRAC_PI_2;

/// Fractions of the ring span taken by each item of `source`.
///
/// The ring's range runs from 0 to the larger of the sum of positive items and
/// the source maximum, unless `range` is fixed. Items consume the range in
/// order: a fixed range starting above zero is consumed first, and items past
/// the end of the range are truncated. A ring whose items are all zero yields
/// `[0.0]` so callers still see one section per ring.
pub fn section_fractions(source: &SourceHandle, range: &RangeGroup) -> Vec<f64> {
    let resolved = range.calculate_range(
        std::slice::from_ref(source),
        |_| Some(0.0),
        |s| {
            let positive: f64 = s
                .values()
                .iter()
                .filter_map(|v| v.as_f64())
                .filter(|v| *v > 0.0)
                .sum();
            Some(positive.max(s.maximum().as_f64().unwrap_or(0.0)))
        },
    );
    if resolved.is_degenerate() {
        return vec![0.0];
    }

    let mut threshold = resolved.start.max(0.0);
    let mut remaining = resolved.distance;
    let mut sections = Vec::with_capacity(source.item_count());
    for value in source.values() {
        let mut v = value.as_f64().unwrap_or(0.0).max(0.0);
        let consumed = v.min(threshold);
        threshold -= consumed;
        v -= consumed;

        let contribution = v.min(remaining);
        remaining -= contribution;
        sections.push(contribution / resolved.distance);
    }

    if sections.iter().all(|s| *s == 0.0) {
        return vec![0.0];
    }
    sections
}

/// A contiguous arc of one color.
///
/// Angles are in radians, measured clockwise from 12 o'clock. `end_angle`
/// includes the overlap into the next segment; `wedges` splits the arc into
/// pieces of at most a quarter turn.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcSegment {
    /// Index of the section, or `None` for the background filler.
    pub section: Option<usize>,
    pub fraction: f64,
    pub start_angle: f32,
    pub end_angle: f32,
    pub color: Color,
    pub wedges: SmallVec<[(f32, f32); 4]>,
}

impl ArcSegment {
    fn new(section: Option<usize>, fraction: f64, start: f32, end: f32, color: Color) -> Self {
        Self {
            section,
            fraction,
            start_angle: start,
            end_angle: end,
            color,
            wedges: split_wedges(start, end),
        }
    }

    pub fn is_background(&self) -> bool {
        self.section.is_none()
    }
}

fn split_wedges(start: f32, end: f32) -> SmallVec<[(f32, f32); 4]> {
    let span = end - start;
    let pieces = ((span.abs() / MAX_WEDGE_ANGLE).ceil() as usize).max(1);
    let step = span / pieces as f32;
    (0..pieces)
        .map(|i| {
            let from = start + step * i as f32;
            let to = if i + 1 == pieces { end } else { from + step };
            (from, to)
        })
        .collect()
}

/// Laid-out ring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RingLayout {
    pub segments: Vec<ArcSegment>,
    /// Filler covering the undrawn remainder of a partial span.
    pub background: Option<ArcSegment>,
    /// Fraction of the span not covered by sections.
    pub background_fraction: f64,
    /// The span is a full circle with an undrawn remainder; the renderer
    /// should put a background disc under the ring.
    pub background_disc: bool,
}

impl RingLayout {
    /// Total fraction covered by the ring's sections.
    pub fn total(&self) -> f64 {
        self.segments.iter().map(|s| s.fraction).sum()
    }
}

/// Lay out `sections` (fractions of the span) between `from_angle` and
/// `to_angle`, both in degrees.
pub fn layout_ring(
    sections: &[f64],
    colors: &[Color],
    from_angle: f32,
    to_angle: f32,
    smooth_ends: bool,
    background_color: Color,
) -> RingLayout {
    let from = from_angle.to_radians();
    let to = to_angle.to_radians();
    let span = to - from;
    let direction = if span < 0.0 { -1.0 } else { 1.0 };
    let full_circle = span.abs() >= TAU - 1e-4;

    let total: f64 = sections.iter().sum();
    let background_fraction = (1.0 - total).max(0.0);
    let needs_background = background_fraction > 1e-9 && !full_circle;

    let mut segments = Vec::with_capacity(sections.len());
    let mut cursor = from;
    for (i, &fraction) in sections.iter().enumerate() {
        let start = cursor;
        let end = start + span * fraction as f32;
        cursor = end;

        let has_next = i + 1 < sections.len() || needs_background;
        let overlap = if has_next && fraction > 0.0 {
            if smooth_ends {
                SMOOTH_OVERLAP
            } else {
                (to - end).abs().min(SEAM_OVERLAP)
            }
        } else {
            0.0
        };

        let color = colors
            .get(i)
            .or_else(|| colors.last())
            .copied()
            .unwrap_or_else(|| default_color(i));
        segments.push(ArcSegment::new(
            Some(i),
            fraction,
            start,
            end + overlap * direction,
            color,
        ));
    }

    let background = needs_background
        .then(|| ArcSegment::new(None, background_fraction, cursor, to, background_color));

    RingLayout {
        segments,
        background,
        background_fraction,
        background_disc: full_circle && background_fraction > 1e-9,
    }
}

fn default_thickness() -> f32 {
    10.0
}

fn default_to_angle() -> f32 {
    360.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieChartStyle {
    /// Start of the span in degrees, clockwise from 12 o'clock.
    #[serde(default)]
    pub from_angle: f32,
    #[serde(default = "default_to_angle")]
    pub to_angle: f32,
    #[serde(default)]
    pub smooth_ends: bool,
    /// Fill the innermost ring to the center.
    #[serde(default)]
    pub filled: bool,
    /// Ring thickness in pixels.
    #[serde(default = "default_thickness")]
    pub thickness: f32,
    /// Gap between rings in pixels.
    #[serde(default)]
    pub spacing: f32,
}

impl Default for PieChartStyle {
    fn default() -> Self {
        Self {
            from_angle: 0.0,
            to_angle: default_to_angle(),
            smooth_ends: false,
            filled: false,
            thickness: default_thickness(),
            spacing: 0.0,
        }
    }
}

/// A computed ring: one per value source.
#[derive(Clone, Debug, PartialEq)]
pub struct PieRing {
    pub source_index: usize,
    pub sections: Vec<f64>,
    pub colors: Vec<Color>,
    pub layout: RingLayout,
}

/// Pie chart geometry producer.
pub struct PieChart {
    sources: Rc<ChartSources>,
    _sources_subscription: Subscription,
    range: RefCell<RangeGroup>,
    style: RefCell<PieChartStyle>,
    background_color: Cell<Color>,
    dirty: DirtyFlag,
    rings: RefCell<Vec<PieRing>>,
    rings_changed: Notifier,
}

impl PieChart {
    pub fn new() -> Rc<Self> {
        Self::with_sources(ChartSources::new())
    }

    pub fn with_sources(sources: Rc<ChartSources>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let weak = weak_self.clone();
            let subscription = sources.changed().subscribe(move |_| {
                if let Some(pie) = weak.upgrade() {
                    pie.dirty.mark();
                }
            });
            Self {
                sources,
                _sources_subscription: subscription,
                range: RefCell::new(RangeGroup::automatic()),
                style: RefCell::new(PieChartStyle::default()),
                background_color: Cell::new(Color::TRANSPARENT),
                dirty: DirtyFlag::dirty(),
                rings: RefCell::new(Vec::new()),
                rings_changed: Notifier::new(),
            }
        })
    }

    pub fn sources(&self) -> &Rc<ChartSources> {
        &self.sources
    }

    pub fn range(&self) -> RangeGroup {
        self.range.borrow().clone()
    }

    pub fn set_range(&self, range: RangeGroup) {
        *self.range.borrow_mut() = range;
        self.dirty.mark();
    }

    pub fn style(&self) -> PieChartStyle {
        self.style.borrow().clone()
    }

    pub fn set_style(&self, style: PieChartStyle) {
        *self.style.borrow_mut() = style;
        self.dirty.mark();
    }

    pub fn set_angles(&self, from_angle: f32, to_angle: f32) {
        {
            let mut style = self.style.borrow_mut();
            style.from_angle = from_angle;
            style.to_angle = to_angle;
        }
        self.dirty.mark();
    }

    pub fn set_smooth_ends(&self, smooth: bool) {
        self.style.borrow_mut().smooth_ends = smooth;
        self.dirty.mark();
    }

    pub fn set_filled(&self, filled: bool) {
        self.style.borrow_mut().filled = filled;
    }

    pub fn set_thickness(&self, thickness: f32) {
        self.style.borrow_mut().thickness = thickness.max(0.0);
    }

    pub fn set_spacing(&self, spacing: f32) {
        self.style.borrow_mut().spacing = spacing.max(0.0);
    }

    pub fn background_color(&self) -> Color {
        self.background_color.get()
    }

    pub fn set_background_color(&self, color: Color) {
        if self.background_color.replace(color) != color {
            self.dirty.mark();
        }
    }

    pub fn rings_changed(&self) -> &Notifier {
        &self.rings_changed
    }

    pub fn rings(&self) -> Ref<'_, Vec<PieRing>> {
        if self.dirty.take() {
            let rings = self.build_rings();
            tracing::trace!(rings = rings.len(), "pie chart relayout");
            *self.rings.borrow_mut() = rings;
            self.rings_changed.emit();
        }
        self.rings.borrow()
    }

    /// Inner and outer radius of ring `index`, counted from the outside.
    pub fn ring_radii(&self, index: usize, outer_radius: f32) -> (f32, f32) {
        let style = self.style.borrow();
        let ring_count = self.sources.value_source_count();
        let outer = (outer_radius - index as f32 * (style.thickness + style.spacing)).max(0.0);
        let innermost = ring_count == 0 || index + 1 >= ring_count;
        let inner = if style.filled && innermost {
            0.0
        } else {
            (outer - style.thickness).max(0.0)
        };
        (inner, outer)
    }

    fn build_rings(&self) -> Vec<PieRing> {
        let style = self.style.borrow().clone();
        let range = self.range.borrow().clone();
        let mode = self.sources.indexing_mode();
        let background = self.background_color.get();

        let mut running = 0;
        let mut rings = Vec::new();
        for (source_index, source) in self.sources.value_sources().iter().enumerate() {
            let sections = section_fractions(source, &range);
            let colors: Vec<Color> = (0..sections.len())
                .map(|item| {
                    self.sources.color_at(
                        source_index,
                        item,
                        running + item,
                        default_color(mode.select(source_index, item, running + item)),
                    )
                })
                .collect();
            if mode == IndexingMode::IndexAllValues {
                running += sections.len();
            }
            let layout = layout_ring(
                &sections,
                &colors,
                style.from_angle,
                style.to_angle,
                style.smooth_ends,
                background,
            );
            rings.push(PieRing {
                source_index,
                sections,
                colors,
                layout,
            });
        }
        rings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ArraySource;

    fn numbers(values: &[f64]) -> SourceHandle {
        ArraySource::from_numbers(values.iter().copied())
    }

    #[test]
    fn automatic_range_normalizes_by_sum() {
        let f = section_fractions(&numbers(&[1.0, 3.0, 4.0]), &RangeGroup::automatic());
        assert_eq!(f, vec![0.125, 0.375, 0.5]);
    }

    #[test]
    fn fixed_range_leaves_remainder_and_truncates() {
        let f = section_fractions(&numbers(&[2.0, 3.0]), &RangeGroup::fixed(0.0, 10.0));
        assert_eq!(f, vec![0.2, 0.3]);

        let f = section_fractions(&numbers(&[6.0, 6.0]), &RangeGroup::fixed(0.0, 10.0));
        assert_eq!(f, vec![0.6, 0.4]);
    }

    #[test]
    fn range_start_is_consumed_first() {
        let f = section_fractions(&numbers(&[3.0, 4.0]), &RangeGroup::fixed(5.0, 10.0));
        assert_eq!(f, vec![0.0, 0.4]);
    }

    #[test]
    fn negative_and_invalid_items_contribute_nothing() {
        let source: SourceHandle = ArraySource::new(
            vec![(-2.0).into(), chartkit_core::Value::Invalid, 2.0.into()],
            false,
        );
        assert_eq!(section_fractions(&source, &RangeGroup::automatic()), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn all_zero_ring_has_one_section() {
        assert_eq!(section_fractions(&numbers(&[0.0, 0.0]), &RangeGroup::automatic()), vec![0.0]);
        assert_eq!(section_fractions(&numbers(&[]), &RangeGroup::automatic()), vec![0.0]);
    }

    #[test]
    fn wedges_never_exceed_a_quarter_turn() {
        let layout = layout_ring(&[0.7, 0.3], &[], 0.0, 360.0, false, Color::BLACK);
        for segment in &layout.segments {
            assert!(segment
                .wedges
                .iter()
                .all(|(a, b)| (b - a).abs() <= MAX_WEDGE_ANGLE + 1e-5));
            assert_eq!(segment.wedges.first().map(|w| w.0), Some(segment.start_angle));
            assert_eq!(segment.wedges.last().map(|w| w.1), Some(segment.end_angle));
        }
        assert_eq!(layout.segments[0].wedges.len(), 3);
    }

    #[test]
    fn segments_overlap_into_their_successor() {
        let layout = layout_ring(&[0.5, 0.5], &[], 0.0, 360.0, false, Color::BLACK);
        let first = &layout.segments[0];
        assert!((first.end_angle - (std::f32::consts::PI + SEAM_OVERLAP)).abs() < 1e-5);
        // The last segment has nothing to blend into.
        let last = &layout.segments[1];
        assert!((last.end_angle - TAU).abs() < 1e-5);

        let smooth = layout_ring(&[0.5, 0.5], &[], 0.0, 360.0, true, Color::BLACK);
        assert!((smooth.segments[0].end_angle - (std::f32::consts::PI + SMOOTH_OVERLAP)).abs() < 1e-5);
    }

    #[test]
    fn zero_sections_do_not_overlap() {
        let layout = layout_ring(&[0.0, 1.0], &[], 0.0, 360.0, true, Color::BLACK);
        assert_eq!(layout.segments[0].start_angle, layout.segments[0].end_angle);
    }

    #[test]
    fn partial_span_gets_background_filler() {
        let layout = layout_ring(&[0.25, 0.25], &[], 0.0, 180.0, false, Color::WHITE);
        let background = layout.background.as_ref().unwrap();
        assert!(background.is_background());
        assert_eq!(background.color, Color::WHITE);
        assert!((background.start_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((background.end_angle - std::f32::consts::PI).abs() < 1e-5);
        assert!((layout.total() + layout.background_fraction - 1.0).abs() < 1e-9);
        // The last real section blends into the filler.
        assert!(layout.segments[1].end_angle > background.start_angle);
        assert!(!layout.background_disc);
    }

    #[test]
    fn full_circle_reports_background_disc() {
        let layout = layout_ring(&[0.5], &[], 0.0, 360.0, false, Color::WHITE);
        assert!(layout.background.is_none());
        assert!(layout.background_disc);
        assert_eq!(layout.background_fraction, 0.5);
    }

    #[test]
    fn reversed_span_walks_counter_clockwise() {
        let layout = layout_ring(&[0.5, 0.5], &[], 90.0, -90.0, false, Color::BLACK);
        let first = &layout.segments[0];
        assert!(first.end_angle < first.start_angle);
        assert!(first.wedges.iter().all(|(a, b)| b < a));
    }

    #[test]
    fn rings_follow_indexing_mode() {
        let pie = PieChart::new();
        let outer = numbers(&[1.0, 1.0]);
        let inner = numbers(&[2.0, 2.0]);
        let palette: SourceHandle = ArraySource::new(
            (0..4).map(|i| Color::rgb(0.0, i as f32 / 4.0, 0.0).into()).collect(),
            false,
        );
        pie.sources().set_value_sources(&[outer.clone(), inner.clone()]);
        pie.sources().set_color_source(Some(&palette));

        let greens = |pie: &PieChart| -> Vec<Vec<f32>> {
            pie.rings()
                .iter()
                .map(|r| r.colors.iter().map(|c| c.g).collect())
                .collect()
        };
        assert_eq!(greens(&pie), vec![vec![0.0, 0.25], vec![0.0, 0.25]]);
        pie.sources().set_indexing_mode(IndexingMode::IndexEachSource);
        assert_eq!(greens(&pie), vec![vec![0.0, 0.0], vec![0.25, 0.25]]);
        pie.sources().set_indexing_mode(IndexingMode::IndexAllValues);
        assert_eq!(greens(&pie), vec![vec![0.0, 0.25], vec![0.5, 0.75]]);
    }

    #[test]
    fn ring_radii_stack_inwards() {
        let pie = PieChart::new();
        let a = numbers(&[1.0]);
        let b = numbers(&[1.0]);
        pie.sources().set_value_sources(&[a.clone(), b.clone()]);
        pie.set_thickness(10.0);
        pie.set_spacing(5.0);

        assert_eq!(pie.ring_radii(0, 100.0), (90.0, 100.0));
        assert_eq!(pie.ring_radii(1, 100.0), (75.0, 85.0));
        pie.set_filled(true);
        assert_eq!(pie.ring_radii(1, 100.0), (0.0, 85.0));
        assert_eq!(pie.ring_radii(0, 100.0), (90.0, 100.0));
    }
}
