//! Per-delegate metadata for host-created decorations.
//!
//! Legends and axis labels are drawn by delegates the host creates. The host
//! identifies each delegate with a [`DelegateId`] and looks up what it should
//! show here. The delegates themselves are never owned by this crate.

use chartkit_core::{Color, Notifier, Value};
use rustc_hash::FxHashMap;

use crate::axis_labels::AxisLabel;
use crate::legend::LegendEntry;

/// Host-assigned delegate identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegateId(pub u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemMetadata {
    pub index: usize,
    pub label: String,
    pub color: Color,
    pub value: Value,
}

#[derive(Debug, Default)]
pub struct AttachedMetadata {
    items: FxHashMap<DelegateId, ItemMetadata>,
    changed: Notifier<DelegateId>,
}

impl AttachedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired with the delegate whose metadata was attached or replaced.
    pub fn changed(&self) -> &Notifier<DelegateId> {
        &self.changed
    }

    pub fn attach(&mut self, delegate: DelegateId, metadata: ItemMetadata) {
        if self.items.get(&delegate) == Some(&metadata) {
            return;
        }
        self.items.insert(delegate, metadata);
        self.changed.notify(&delegate);
    }

    pub fn detach(&mut self, delegate: DelegateId) -> Option<ItemMetadata> {
        self.items.remove(&delegate)
    }

    pub fn get(&self, delegate: DelegateId) -> Option<&ItemMetadata> {
        self.items.get(&delegate)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Attach legend entries to delegates, pairwise. Extra delegates or
    /// entries are left alone.
    pub fn attach_legend(&mut self, delegates: &[DelegateId], entries: &[LegendEntry]) {
        for (index, (delegate, entry)) in delegates.iter().zip(entries).enumerate() {
            self.attach(
                *delegate,
                ItemMetadata {
                    index,
                    label: entry.name.clone(),
                    color: entry.color,
                    value: entry.value.clone(),
                },
            );
        }
    }

    pub fn attach_axis_labels(&mut self, delegates: &[DelegateId], labels: &[AxisLabel]) {
        for (delegate, label) in delegates.iter().zip(labels) {
            self.attach(
                *delegate,
                ItemMetadata {
                    index: label.index,
                    label: label.text.clone(),
                    color: Color::default(),
                    value: label.value.clone(),
                },
            );
        }
    }
}
