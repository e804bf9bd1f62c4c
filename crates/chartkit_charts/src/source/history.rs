use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use chartkit_core::{max_of, min_of, Notifier, Value};
use serde::{Deserialize, Serialize};

use super::{checked_index, ChartDataSource, SourceHandle, SourceKind, SourceRef};

/// How a history buffer reports items before it has filled up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Report only recorded entries.
    #[default]
    DoNotFill,
    /// Report `maximum_history` items; unrecorded slots after the history are empty.
    FillFromStart,
    /// Report `maximum_history` items; recorded history is right-aligned and the
    /// leading slots are empty.
    FillFromEnd,
}

/// Host-driven sampling timer.
///
/// Deadlines advance from the previous deadline rather than from the time the
/// host got around to ticking, so jitter does not accumulate. A host that falls
/// more than one interval behind gets one sample and a fresh schedule.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SampleTimer {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl SampleTimer {
    pub(crate) fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub(crate) fn set_interval(&mut self, interval: Option<Duration>) {
        self.interval = interval.filter(|d| !d.is_zero());
        self.next = None;
    }

    pub(crate) fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Returns whether a sample is due at `now`. The first poll arms the timer.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        match self.next {
            None => {
                self.next = Some(now + interval);
                false
            }
            Some(deadline) if now >= deadline => {
                let mut next = deadline + interval;
                if next <= now {
                    next = now + interval;
                }
                self.next = Some(next);
                true
            }
            Some(_) => false,
        }
    }
}

/// Newest-first history of a single item of another source.
///
/// Without an interval every change of the upstream source records one sample.
/// With an interval, upstream changes are ignored and [`tick`](Self::tick)
/// records samples instead.
pub struct HistoryProxySource {
    weak_self: Weak<HistoryProxySource>,
    source: RefCell<Option<SourceRef>>,
    item: Cell<isize>,
    maximum_history: Cell<usize>,
    fill_mode: Cell<FillMode>,
    timer: Cell<SampleTimer>,
    history: RefCell<VecDeque<Value>>,
    changed: Notifier,
}

impl HistoryProxySource {
    pub const DEFAULT_MAXIMUM_HISTORY: usize = 10;

    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            source: RefCell::new(None),
            item: Cell::new(0),
            maximum_history: Cell::new(Self::DEFAULT_MAXIMUM_HISTORY),
            fill_mode: Cell::new(FillMode::DoNotFill),
            timer: Cell::new(SampleTimer::default()),
            history: RefCell::new(VecDeque::new()),
            changed: Notifier::new(),
        })
    }

    pub fn with_source(source: &SourceHandle, maximum_history: usize) -> Rc<Self> {
        let proxy = Self::new();
        proxy.set_maximum_history(maximum_history);
        proxy.set_source(Some(source));
        proxy
    }

    pub fn source(&self) -> Option<SourceHandle> {
        self.source.borrow().as_ref().map(SourceRef::get)
    }

    /// Change the sampled source. Clears the history.
    pub fn set_source(&self, source: Option<&SourceHandle>) {
        let weak = self.weak_self.clone();
        let source_ref = source.map(|s| {
            SourceRef::new(s, move || {
                if let Some(proxy) = weak.upgrade() {
                    proxy.on_source_changed();
                }
            })
        });
        *self.source.borrow_mut() = source_ref;
        self.clear();
    }

    pub fn item_index(&self) -> isize {
        self.item.get()
    }

    /// Change which item of the source is sampled. Clears the history.
    pub fn set_item_index(&self, item: isize) {
        if self.item.replace(item) != item {
            self.clear();
        }
    }

    pub fn maximum_history(&self) -> usize {
        self.maximum_history.get()
    }

    /// Growing keeps every entry; shrinking drops the oldest ones.
    pub fn set_maximum_history(&self, maximum: usize) {
        if self.maximum_history.replace(maximum) == maximum {
            return;
        }
        self.history.borrow_mut().truncate(maximum);
        self.changed.emit();
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode.get()
    }

    /// Change the fill mode. Clears the history.
    pub fn set_fill_mode(&self, mode: FillMode) {
        if self.fill_mode.replace(mode) != mode {
            self.clear();
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.timer.get().interval()
    }

    /// Sample on a fixed interval instead of on upstream changes; `None` or a
    /// zero duration switches back to change-driven sampling.
    pub fn set_interval(&self, interval: Option<Duration>) {
        let mut timer = self.timer.get();
        timer.set_interval(interval);
        self.timer.set(timer);
    }

    /// Drive the interval timer. Returns whether a sample was recorded.
    pub fn tick(&self, now: Instant) -> bool {
        let mut timer = self.timer.get();
        let due = timer.poll(now);
        self.timer.set(timer);
        if due {
            self.update();
        }
        due
    }

    /// Record the current value of the sampled item.
    pub fn update(&self) {
        let Some(source) = self.source() else {
            tracing::debug!("history proxy has no source; skipping sample");
            return;
        };
        let value = source.item(self.item.get());
        {
            let mut history = self.history.borrow_mut();
            history.push_front(value);
            history.truncate(self.maximum_history.get());
        }
        self.changed.emit();
    }

    pub fn clear(&self) {
        let was_empty = {
            let mut history = self.history.borrow_mut();
            let was_empty = history.is_empty();
            history.clear();
            was_empty
        };
        tracing::debug!("history proxy cleared");
        if !was_empty {
            self.changed.emit();
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    fn on_source_changed(&self) {
        if !self.timer.get().is_running() {
            self.update();
        }
    }

    /// Padding for unfilled slots: an empty value of the recorded kind, or of
    /// the sampled item's kind before anything was recorded.
    fn empty_value(&self, history: &VecDeque<Value>) -> Value {
        match history.front() {
            Some(newest) => newest.default_like(),
            None => self
                .source()
                .map(|s| s.item(self.item.get()).default_like())
                .unwrap_or_default(),
        }
    }
}

impl ChartDataSource for HistoryProxySource {
    fn kind(&self) -> SourceKind {
        SourceKind::History
    }

    fn item_count(&self) -> usize {
        match self.fill_mode.get() {
            FillMode::DoNotFill => self.history.borrow().len(),
            FillMode::FillFromStart | FillMode::FillFromEnd => self.maximum_history.get(),
        }
    }

    fn item(&self, index: isize) -> Value {
        let history = self.history.borrow();
        let maximum = self.maximum_history.get();
        match self.fill_mode.get() {
            FillMode::DoNotFill => checked_index(index, history.len())
                .map(|i| history[i].clone())
                .unwrap_or_default(),
            FillMode::FillFromStart => match checked_index(index, maximum) {
                Some(i) if i < history.len() => history[i].clone(),
                Some(_) => self.empty_value(&history),
                None => Value::Invalid,
            },
            FillMode::FillFromEnd => match checked_index(index, maximum) {
                Some(i) => {
                    let offset = maximum.saturating_sub(history.len());
                    if i < offset {
                        self.empty_value(&history)
                    } else {
                        history[i - offset].clone()
                    }
                }
                None => Value::Invalid,
            },
        }
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
