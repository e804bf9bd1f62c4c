use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{Color, DirtyFlag, Notifier, Rect, Size, Subscription};
use serde::{Deserialize, Serialize};

use crate::chart::default_color;
use crate::xy::{ComputedRange, Direction, XYChart};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Categories along X, values grow upwards.
    #[default]
    Vertical,
    /// Categories along Y, values grow to the right.
    Horizontal,
}

fn default_spacing() -> f32 {
    2.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarChartStyle {
    /// Fixed bar width in pixels; `None` divides the category evenly.
    #[serde(default)]
    pub bar_width: Option<f32>,
    /// Gap between bars, and between a group and its category edges.
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default)]
    pub orientation: Orientation,
    /// Corner radius handed to the renderer.
    #[serde(default)]
    pub radius: f32,
}

impl Default for BarChartStyle {
    fn default() -> Self {
        Self {
            bar_width: None,
            spacing: default_spacing(),
            orientation: Orientation::Vertical,
            radius: 0.0,
        }
    }
}

/// One bar, or one segment of a stacked column.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    /// X index of the category.
    pub index: isize,
    pub source_index: usize,
    /// Pixel offset along the category axis.
    pub offset: f32,
    /// Pixel extent along the category axis.
    pub extent: f32,
    /// Value extents in [0, 1] chart space.
    pub start: f32,
    pub end: f32,
    pub value: f64,
    pub color: Color,
}

impl Bar {
    /// Pixel rectangle with a top-left origin.
    pub fn rect(&self, size: Size, orientation: Orientation) -> Rect {
        let (lo, hi) = (self.start.min(self.end), self.start.max(self.end));
        match orientation {
            Orientation::Vertical => Rect::new(
                self.offset,
                (1.0 - hi) * size.height,
                self.extent,
                (hi - lo) * size.height,
            ),
            Orientation::Horizontal => Rect::new(
                lo * size.width,
                self.offset,
                (hi - lo) * size.width,
                self.extent,
            ),
        }
    }
}

/// Bar chart geometry producer.
pub struct BarChart {
    chart: Rc<XYChart>,
    _chart_subscription: Subscription,
    style: RefCell<BarChartStyle>,
    size: Cell<Size>,
    dirty: DirtyFlag,
    bars: RefCell<Vec<Bar>>,
    bars_changed: Notifier,
}

impl BarChart {
    pub fn new(chart: Rc<XYChart>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let weak = weak_self.clone();
            let subscription = chart.changed().subscribe(move |_| {
                if let Some(bars) = weak.upgrade() {
                    bars.dirty.mark();
                }
            });
            Self {
                chart,
                _chart_subscription: subscription,
                style: RefCell::new(BarChartStyle::default()),
                size: Cell::new(Size::ZERO),
                dirty: DirtyFlag::dirty(),
                bars: RefCell::new(Vec::new()),
                bars_changed: Notifier::new(),
            }
        })
    }

    pub fn chart(&self) -> &Rc<XYChart> {
        &self.chart
    }

    pub fn style(&self) -> BarChartStyle {
        self.style.borrow().clone()
    }

    pub fn set_style(&self, style: BarChartStyle) {
        *self.style.borrow_mut() = style;
        self.dirty.mark();
    }

    pub fn set_bar_width(&self, width: Option<f32>) {
        self.style.borrow_mut().bar_width = width;
        self.dirty.mark();
    }

    pub fn set_spacing(&self, spacing: f32) {
        self.style.borrow_mut().spacing = spacing.max(0.0);
        self.dirty.mark();
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.style.borrow_mut().orientation = orientation;
        self.dirty.mark();
    }

    pub fn set_radius(&self, radius: f32) {
        self.style.borrow_mut().radius = radius;
        self.dirty.mark();
    }

    pub fn size(&self) -> Size {
        self.size.get()
    }

    pub fn set_size(&self, size: Size) {
        if self.size.replace(size) != size {
            self.dirty.mark();
        }
    }

    pub fn bars_changed(&self) -> &Notifier {
        &self.bars_changed
    }

    pub fn bars(&self) -> Ref<'_, Vec<Bar>> {
        if self.dirty.take() {
            let bars = self.build_bars();
            tracing::trace!(bars = bars.len(), "bar chart relayout");
            *self.bars.borrow_mut() = bars;
            self.bars_changed.emit();
        }
        self.bars.borrow()
    }

    fn build_bars(&self) -> Vec<Bar> {
        let range = self.chart.computed_range();
        let sources = self.chart.sources().value_sources();
        if range.is_degenerate() || sources.is_empty() {
            return Vec::new();
        }

        let style = self.style.borrow().clone();
        let size = self.size.get();
        let category_axis = match style.orientation {
            Orientation::Vertical => size.width,
            Orientation::Horizontal => size.height,
        };
        let categories = range.distance_x as usize;
        let group = category_axis / categories as f32;
        let stacked = self.chart.stacked();
        let columns = if stacked { 1 } else { sources.len() };
        let width = style.bar_width.unwrap_or_else(|| {
            ((group - style.spacing * (columns + 1) as f32) / columns as f32).max(0.0)
        });
        let used = width * columns as f32 + style.spacing * (columns - 1) as f32;

        let baseline = normalized(&range, 0.0);
        let chart_sources = self.chart.sources();
        let direction = self.chart.direction();

        let mut out = Vec::with_capacity(categories * sources.len());
        for k in 0..categories {
            let slot = match direction {
                Direction::ZeroAtStart => k,
                Direction::ZeroAtEnd => categories - 1 - k,
            };
            let group_start = slot as f32 * group + (group - used) * 0.5;
            let index = range.start_x + k as isize;
            let mut accumulated = 0.0_f64;

            for (source_index, source) in sources.iter().enumerate() {
                let Some(value) = source.item(index).as_f64() else {
                    continue;
                };
                let column = if stacked { 0 } else { source_index };
                let (start, end) = if stacked {
                    let from = accumulated;
                    accumulated += value;
                    (normalized(&range, from), normalized(&range, accumulated))
                } else {
                    (baseline, normalized(&range, value))
                };
                let running = source_index * categories + k;
                out.push(Bar {
                    index,
                    source_index,
                    offset: group_start + column as f32 * (width + style.spacing),
                    extent: width,
                    start,
                    end,
                    value,
                    color: chart_sources.color_at(
                        source_index,
                        k,
                        running,
                        default_color(source_index),
                    ),
                });
            }
        }
        out
    }
}

fn normalized(range: &ComputedRange, value: f64) -> f32 {
    range.normalize_y(value).clamp(0.0, 1.0) as f32
}
