use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{Notifier, Subscription, Value};
use serde::{Deserialize, Serialize};

use super::{checked_index, ChartDataSource, SourceKind};
use crate::xy::{ComputedRange, XYChart};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    #[default]
    X,
    Y,
}

struct ChartRef {
    chart: Weak<XYChart>,
    _subscription: Subscription,
}

/// Evenly spaced tick values across a chart's computed range.
pub struct ChartAxisSource {
    weak_self: Weak<ChartAxisSource>,
    chart: RefCell<Option<ChartRef>>,
    axis: Cell<AxisKind>,
    item_count: Cell<usize>,
    changed: Notifier,
}

impl ChartAxisSource {
    pub fn new(chart: Option<&Rc<XYChart>>, axis: AxisKind, item_count: usize) -> Rc<Self> {
        let source = Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            chart: RefCell::new(None),
            axis: Cell::new(axis),
            item_count: Cell::new(item_count),
            changed: Notifier::new(),
        });
        source.set_chart(chart);
        source
    }

    pub fn chart(&self) -> Option<Rc<XYChart>> {
        self.chart.borrow().as_ref().and_then(|c| c.chart.upgrade())
    }

    pub fn set_chart(&self, chart: Option<&Rc<XYChart>>) {
        let weak = self.weak_self.clone();
        *self.chart.borrow_mut() = chart.map(|c| ChartRef {
            chart: Rc::downgrade(c),
            _subscription: c.computed_range_changed().subscribe(move |_| {
                if let Some(source) = weak.upgrade() {
                    source.changed.emit();
                }
            }),
        });
        self.changed.emit();
    }

    pub fn axis(&self) -> AxisKind {
        self.axis.get()
    }

    pub fn set_axis(&self, axis: AxisKind) {
        if self.axis.replace(axis) != axis {
            self.changed.emit();
        }
    }

    pub fn set_item_count(&self, count: usize) {
        if self.item_count.replace(count) != count {
            self.changed.emit();
        }
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        let range: ComputedRange = self.chart()?.computed_range();
        Some(match self.axis.get() {
            AxisKind::X => (range.start_x as f64, range.end_x as f64),
            AxisKind::Y => (range.start_y, range.end_y),
        })
    }
}

impl ChartDataSource for ChartAxisSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ChartAxis
    }

    fn item_count(&self) -> usize {
        self.item_count.get()
    }

    fn item(&self, index: isize) -> Value {
        let count = self.item_count.get();
        let (Some(i), Some((start, end))) = (checked_index(index, count), self.bounds()) else {
            return Value::Invalid;
        };
        if count == 1 {
            return Value::Number(start);
        }
        let step = (end - start) / (count - 1) as f64;
        Value::Number(start + step * i as f64)
    }

    fn minimum(&self) -> Value {
        self.bounds()
            .map(|(start, _)| Value::Number(start))
            .unwrap_or_default()
    }

    fn maximum(&self) -> Value {
        self.bounds()
            .map(|(_, end)| Value::Number(end))
            .unwrap_or_default()
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}
