//! Source bundle shared by every chart type.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{Color, Notifier, Value};
use serde::{Deserialize, Serialize};

use crate::source::{SourceHandle, SourceRef};

/// Fallback series color when a chart has no color source, cycling through a
/// fixed palette.
pub fn default_color(index: usize) -> Color {
    const PALETTE: [(f32, f32, f32); 6] = [
        (0.35, 0.65, 1.0),
        (0.95, 0.55, 0.35),
        (0.40, 0.85, 0.55),
        (0.90, 0.75, 0.25),
        (0.75, 0.55, 0.95),
        (0.25, 0.80, 0.85),
    ];
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    Color::rgb(r, g, b)
}

/// How name and color sources are indexed when a chart has several value
/// sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    /// Index by item; every value source restarts at 0.
    #[default]
    IndexSourceValues,
    /// Index by value source; all items of a source share one entry.
    IndexEachSource,
    /// Index by item, continuing across value sources.
    IndexAllValues,
}

impl IndexingMode {
    /// Index into a name or color source for item `item` of value source
    /// `source`. `running` counts items over all preceding sources.
    pub fn select(self, source: usize, item: usize, running: usize) -> usize {
        match self {
            IndexingMode::IndexSourceValues => item,
            IndexingMode::IndexEachSource => source,
            IndexingMode::IndexAllValues => running,
        }
    }
}

/// The value sources of a chart plus the sources naming and coloring them.
///
/// `changed` fires whenever any member source changes or the membership
/// itself changes. Member sources are owned: a source stays in the chart until
/// it is removed or replaced, whoever else drops their handle.
pub struct ChartSources {
    weak_self: Weak<ChartSources>,
    value_sources: RefCell<Vec<SourceRef>>,
    name_source: RefCell<Option<SourceRef>>,
    short_name_source: RefCell<Option<SourceRef>>,
    color_source: RefCell<Option<SourceRef>>,
    indexing_mode: Cell<IndexingMode>,
    changed: Notifier,
}

impl ChartSources {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            value_sources: RefCell::new(Vec::new()),
            name_source: RefCell::new(None),
            short_name_source: RefCell::new(None),
            color_source: RefCell::new(None),
            indexing_mode: Cell::new(IndexingMode::default()),
            changed: Notifier::new(),
        })
    }

    pub fn changed(&self) -> &Notifier {
        &self.changed
    }

    fn observe(&self, source: &SourceHandle) -> SourceRef {
        let weak = self.weak_self.clone();
        SourceRef::new(source, move || {
            if let Some(sources) = weak.upgrade() {
                sources.changed.emit();
            }
        })
    }

    /// Value sources, in insertion order.
    pub fn value_sources(&self) -> Vec<SourceHandle> {
        self.value_sources.borrow().iter().map(SourceRef::get).collect()
    }

    pub fn value_source_count(&self) -> usize {
        self.value_sources.borrow().len()
    }

    pub fn append_value_source(&self, source: &SourceHandle) {
        let r = self.observe(source);
        self.value_sources.borrow_mut().push(r);
        self.changed.emit();
    }

    pub fn remove_value_source(&self, source: &SourceHandle) -> bool {
        let removed = {
            let mut sources = self.value_sources.borrow_mut();
            let before = sources.len();
            sources.retain(|s| !s.refers_to(source));
            sources.len() != before
        };
        if removed {
            self.changed.emit();
        }
        removed
    }

    pub fn set_value_sources(&self, sources: &[SourceHandle]) {
        let refs = sources.iter().map(|s| self.observe(s)).collect();
        *self.value_sources.borrow_mut() = refs;
        self.changed.emit();
    }

    pub fn clear_value_sources(&self) {
        self.value_sources.borrow_mut().clear();
        self.changed.emit();
    }

    pub fn name_source(&self) -> Option<SourceHandle> {
        self.name_source.borrow().as_ref().map(SourceRef::get)
    }

    pub fn set_name_source(&self, source: Option<&SourceHandle>) {
        *self.name_source.borrow_mut() = source.map(|s| self.observe(s));
        self.changed.emit();
    }

    pub fn short_name_source(&self) -> Option<SourceHandle> {
        self.short_name_source.borrow().as_ref().map(SourceRef::get)
    }

    pub fn set_short_name_source(&self, source: Option<&SourceHandle>) {
        *self.short_name_source.borrow_mut() = source.map(|s| self.observe(s));
        self.changed.emit();
    }

    pub fn color_source(&self) -> Option<SourceHandle> {
        self.color_source.borrow().as_ref().map(SourceRef::get)
    }

    pub fn set_color_source(&self, source: Option<&SourceHandle>) {
        *self.color_source.borrow_mut() = source.map(|s| self.observe(s));
        self.changed.emit();
    }

    pub fn indexing_mode(&self) -> IndexingMode {
        self.indexing_mode.get()
    }

    pub fn set_indexing_mode(&self, mode: IndexingMode) {
        if self.indexing_mode.replace(mode) != mode {
            self.changed.emit();
        }
    }

    /// Color for an item, or `fallback` when the color source has none.
    pub fn color_at(&self, source: usize, item: usize, running: usize, fallback: Color) -> Color {
        let index = self.indexing_mode.get().select(source, item, running);
        self.color_source()
            .and_then(|c| c.item(index as isize).as_color())
            .unwrap_or(fallback)
    }

    pub fn name_at(&self, source: usize, item: usize, running: usize) -> Value {
        let index = self.indexing_mode.get().select(source, item, running);
        self.name_source()
            .map(|n| n.item(index as isize))
            .unwrap_or_default()
    }

    pub fn short_name_at(&self, source: usize, item: usize, running: usize) -> Value {
        let index = self.indexing_mode.get().select(source, item, running);
        self.short_name_source()
            .map(|n| n.item(index as isize))
            .unwrap_or_default()
    }
}
