//! Data sources
//!
//! Every chart reads its data through [`ChartDataSource`]: a read-only indexed
//! sequence of [`Value`]s with minimum/maximum queries and a change
//! notification. Out of range indices and underivable aggregates come back as
//! [`Value::Invalid`]; no query can fail.
//!
//! Sources are created as `Rc<Self>` and shared as [`SourceHandle`]. Consumers
//! keep a [`SourceRef`], an owning handle plus the change subscription, so a
//! source stays alive for as long as any chart, proxy or decoration reads it.
//! Detaching a source (or replacing it) is the only way it leaves a consumer.

use std::fmt;
use std::rc::Rc;

use chartkit_core::{Notifier, Subscription, Value};

mod array;
mod chart_axis;
mod color_gradient;
mod history;
mod map_proxy;
mod model;
mod model_history;
mod single;

pub use array::ArraySource;
pub use chart_axis::{AxisKind, ChartAxisSource};
pub use color_gradient::ColorGradientSource;
pub use history::{FillMode, HistoryProxySource};
pub use map_proxy::MapProxySource;
pub use model::{ModelChange, ModelHandle, ModelSource, RoleId, TableModel, VecTableModel};
pub use model_history::ModelHistorySource;
pub use single::SingleValueSource;

/// The closed set of source variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Array,
    SingleValue,
    Model,
    ModelHistory,
    History,
    MapProxy,
    ColorGradient,
    ChartAxis,
}

/// Read-only indexed data consumed by charts.
pub trait ChartDataSource {
    fn kind(&self) -> SourceKind;

    fn item_count(&self) -> usize;

    /// Item at `index`, or [`Value::Invalid`] when there is none.
    fn item(&self, index: isize) -> Value;

    fn minimum(&self) -> Value;

    fn maximum(&self) -> Value;

    fn first(&self) -> Value {
        self.item(0)
    }

    /// Fired synchronously after every change to the source's data.
    fn data_changed(&self) -> &Notifier;

    fn values(&self) -> Vec<Value> {
        (0..self.item_count())
            .map(|i| self.item(i as isize))
            .collect()
    }
}

/// Shared, owning handle to a source.
pub type SourceHandle = Rc<dyn ChartDataSource>;

/// Owning reference to a source, subscribed to its changes.
pub struct SourceRef {
    source: SourceHandle,
    _subscription: Subscription,
}

impl SourceRef {
    /// Reference `source`, calling `on_change` on every change it reports.
    pub fn new<F>(source: &SourceHandle, on_change: F) -> Self
    where
        F: Fn() + 'static,
    {
        let subscription = source.data_changed().subscribe(move |_| on_change());
        Self {
            source: source.clone(),
            _subscription: subscription,
        }
    }

    pub fn get(&self) -> SourceHandle {
        self.source.clone()
    }

    pub fn source(&self) -> &dyn ChartDataSource {
        &*self.source
    }

    pub fn refers_to(&self, other: &SourceHandle) -> bool {
        // Compare data pointers only; vtable pointers may differ between codegen units.
        std::ptr::addr_eq(Rc::as_ptr(&self.source), Rc::as_ptr(other))
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRef")
            .field("kind", &self.source.kind())
            .field("items", &self.source.item_count())
            .finish()
    }
}

/// Clamp a signed index into a slice of length `len`.
pub(crate) fn checked_index(index: isize, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < len)
}
