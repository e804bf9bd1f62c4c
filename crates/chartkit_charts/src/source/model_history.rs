use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use chartkit_core::{max_of, min_of, Notifier, Subscription, Value};

use super::history::SampleTimer;
use super::model::{ModelChange, ModelSource};
use super::{checked_index, ChartDataSource, SourceKind};

/// Newest-first history of one row of a [`ModelSource`].
///
/// A sample is recorded whenever the model reports a data change covering
/// `row`, or on every interval when one is set.
pub struct ModelHistorySource {
    model: Rc<ModelSource>,
    row: Cell<usize>,
    maximum_history: Cell<usize>,
    timer: Cell<SampleTimer>,
    history: RefCell<VecDeque<Value>>,
    _subscription: Subscription,
    changed: Notifier,
}

impl ModelHistorySource {
    pub fn new(model: Rc<ModelSource>, row: usize, maximum_history: usize) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let weak = weak_self.clone();
            let subscription = model.model_changed().subscribe(move |change| {
                if let Some(source) = weak.upgrade() {
                    source.on_model_changed(*change);
                }
            });
            Self {
                model,
                row: Cell::new(row),
                maximum_history: Cell::new(maximum_history),
                timer: Cell::new(SampleTimer::default()),
                history: RefCell::new(VecDeque::new()),
                _subscription: subscription,
                changed: Notifier::new(),
            }
        })
    }

    pub fn model_source(&self) -> &Rc<ModelSource> {
        &self.model
    }

    pub fn row(&self) -> usize {
        self.row.get()
    }

    /// Change the sampled row. Clears the history.
    pub fn set_row(&self, row: usize) {
        if self.row.replace(row) != row {
            self.clear();
        }
    }

    pub fn maximum_history(&self) -> usize {
        self.maximum_history.get()
    }

    pub fn set_maximum_history(&self, maximum: usize) {
        if self.maximum_history.replace(maximum) == maximum {
            return;
        }
        self.history.borrow_mut().truncate(maximum);
        self.changed.emit();
    }

    pub fn interval(&self) -> Option<Duration> {
        self.timer.get().interval()
    }

    pub fn set_interval(&self, interval: Option<Duration>) {
        let mut timer = self.timer.get();
        timer.set_interval(interval);
        self.timer.set(timer);
    }

    pub fn tick(&self, now: Instant) -> bool {
        let mut timer = self.timer.get();
        let due = timer.poll(now);
        self.timer.set(timer);
        if due {
            self.record();
        }
        due
    }

    pub fn clear(&self) {
        self.history.borrow_mut().clear();
        self.changed.emit();
    }

    fn record(&self) {
        let value = self.model.item(self.row.get() as isize);
        {
            let mut history = self.history.borrow_mut();
            history.push_front(value);
            history.truncate(self.maximum_history.get());
        }
        self.changed.emit();
    }

    fn on_model_changed(&self, change: ModelChange) {
        match change {
            ModelChange::ModelReset => self.clear(),
            ModelChange::DataChanged { .. } if !self.timer.get().is_running() => {
                if change.touches_row(self.row.get()) {
                    self.record();
                }
            }
            _ => {}
        }
    }
}

impl ChartDataSource for ModelHistorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::ModelHistory
    }

    fn item_count(&self) -> usize {
        self.history.borrow().len()
    }

    fn item(&self, index: isize) -> Value {
        let history = self.history.borrow();
        checked_index(index, history.len())
            .map(|i| history[i].clone())
            .unwrap_or_default()
    }

    fn minimum(&self) -> Value {
        min_of(self.history.borrow().iter())
    }

    fn maximum(&self) -> Value {
        max_of(self.history.borrow().iter())
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}
