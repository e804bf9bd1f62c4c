//! Charts with an index X axis and a value Y axis.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{Notifier, Subscription};
use serde::{Deserialize, Serialize};

use crate::chart::ChartSources;
use crate::range::RangeGroup;
use crate::source::{ChartDataSource, SourceHandle};

/// Where index 0 sits along the X axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    ZeroAtStart,
    ZeroAtEnd,
}

/// Resolved bounds of an [`XYChart`]: integral sample indices on X, values
/// on Y.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComputedRange {
    pub start_x: isize,
    pub end_x: isize,
    pub distance_x: isize,
    pub start_y: f64,
    pub end_y: f64,
    pub distance_y: f64,
}

impl ComputedRange {
    const EPSILON: f64 = 1e-9;

    /// Ranges that cannot be mapped to pixels.
    pub fn is_degenerate(&self) -> bool {
        self.distance_x <= 0 || !(self.distance_y > 0.0)
    }

    /// Map a Y value into [0, 1] chart space.
    pub fn normalize_y(&self, value: f64) -> f64 {
        if self.distance_y > 0.0 {
            (value - self.start_y) / self.distance_y
        } else {
            0.0
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= ComputedRange::EPSILON * scale
}

impl PartialEq for ComputedRange {
    fn eq(&self, other: &Self) -> bool {
        self.start_x == other.start_x
            && self.end_x == other.end_x
            && self.distance_x == other.distance_x
            && approx_eq(self.start_y, other.start_y)
            && approx_eq(self.end_y, other.end_y)
            && approx_eq(self.distance_y, other.distance_y)
    }
}

/// Largest per-index sum over all sources in `[start_x, end_x)`. Invalid items
/// count as zero.
pub fn stacked_maximum(sources: &[SourceHandle], start_x: isize, end_x: isize) -> Option<f64> {
    (start_x..end_x)
        .map(|i| sources.iter().map(|s| s.item(i).to_f64_or_zero()).sum::<f64>())
        .reduce(f64::max)
}

/// Shared state of line and bar charts.
///
/// The computed range is recomputed synchronously whenever a value source,
/// the source list or a range setting changes. `computed_range_changed` only
/// fires when the result actually differs; `changed` fires after every
/// update so geometry producers can schedule a relayout.
pub struct XYChart {
    sources: Rc<ChartSources>,
    _sources_subscription: Subscription,
    x_range: RefCell<RangeGroup>,
    y_range: RefCell<RangeGroup>,
    direction: Cell<Direction>,
    stacked: Cell<bool>,
    computed_range: Cell<ComputedRange>,
    computed_range_changed: Notifier<ComputedRange>,
    changed: Notifier,
}

impl XYChart {
    pub fn new() -> Rc<Self> {
        Self::with_sources(ChartSources::new())
    }

    pub fn with_sources(sources: Rc<ChartSources>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let weak = weak_self.clone();
            let subscription = sources.changed().subscribe(move |_| {
                if let Some(chart) = weak.upgrade() {
                    chart.refresh();
                }
            });
            Self {
                sources,
                _sources_subscription: subscription,
                x_range: RefCell::new(RangeGroup::automatic()),
                y_range: RefCell::new(RangeGroup::automatic()),
                direction: Cell::new(Direction::ZeroAtStart),
                stacked: Cell::new(false),
                computed_range: Cell::new(ComputedRange::default()),
                computed_range_changed: Notifier::new(),
                changed: Notifier::new(),
            }
        })
    }

    pub fn sources(&self) -> &Rc<ChartSources> {
        &self.sources
    }

    pub fn x_range(&self) -> RangeGroup {
        self.x_range.borrow().clone()
    }

    pub fn set_x_range(&self, range: RangeGroup) {
        *self.x_range.borrow_mut() = range;
        self.refresh();
    }

    pub fn y_range(&self) -> RangeGroup {
        self.y_range.borrow().clone()
    }

    pub fn set_y_range(&self, range: RangeGroup) {
        *self.y_range.borrow_mut() = range;
        self.refresh();
    }

    pub fn direction(&self) -> Direction {
        self.direction.get()
    }

    pub fn set_direction(&self, direction: Direction) {
        if self.direction.replace(direction) != direction {
            self.changed.emit();
        }
    }

    pub fn stacked(&self) -> bool {
        self.stacked.get()
    }

    pub fn set_stacked(&self, stacked: bool) {
        if self.stacked.replace(stacked) != stacked {
            self.refresh();
        }
    }

    pub fn computed_range(&self) -> ComputedRange {
        self.computed_range.get()
    }

    pub fn computed_range_changed(&self) -> &Notifier<ComputedRange> {
        &self.computed_range_changed
    }

    /// Fired after any change that affects geometry.
    pub fn changed(&self) -> &Notifier {
        &self.changed
    }

    fn refresh(&self) {
        self.update_computed_range();
        self.changed.emit();
    }

    /// Recompute the range from the current sources. A chart without value
    /// sources keeps its previous range.
    pub fn update_computed_range(&self) {
        let sources = self.sources.value_sources();
        if sources.is_empty() {
            return;
        }

        let x = self.x_range.borrow().calculate_range(
            &sources,
            |_| Some(0.0),
            |s| Some(s.item_count() as f64),
        );
        let start_x = x.start.round() as isize;
        let end_x = x.end.round() as isize;

        let stacked_max = if self.stacked.get() {
            stacked_maximum(&sources, start_x, end_x)
        } else {
            None
        };
        let stacked = self.stacked.get();
        let y = self.y_range.borrow().calculate_range(
            &sources,
            |s: &dyn ChartDataSource| Some(s.minimum().as_f64().unwrap_or(0.0).min(0.0)),
            |s: &dyn ChartDataSource| {
                if stacked {
                    stacked_max
                } else {
                    s.maximum().as_f64()
                }
            },
        );

        let range = ComputedRange {
            start_x,
            end_x,
            distance_x: end_x - start_x,
            start_y: y.start,
            end_y: y.end,
            distance_y: y.distance,
        };
        if range != self.computed_range.get() {
            tracing::debug!(
                start_x,
                end_x,
                start_y = range.start_y,
                end_y = range.end_y,
                stacked,
                "computed range changed"
            );
            self.computed_range.set(range);
            self.computed_range_changed.notify(&range);
        }
    }
}
