use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chartkit_core::{max_of, min_of, Notifier, Value};
use rustc_hash::FxHashMap;

use super::{ChartDataSource, SourceHandle, SourceKind, SourceRef};

/// Re-indexes another source's values through a lookup table.
///
/// Keys are the display form of the upstream value, so both `"high"` and `2`
/// can be mapped.
pub struct MapProxySource {
    weak_self: Weak<MapProxySource>,
    source: RefCell<Option<SourceRef>>,
    map: RefCell<FxHashMap<String, Value>>,
    changed: Notifier,
}

impl MapProxySource {
    pub fn new(source: Option<&SourceHandle>, map: FxHashMap<String, Value>) -> Rc<Self> {
        let proxy = Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            source: RefCell::new(None),
            map: RefCell::new(map),
            changed: Notifier::new(),
        });
        proxy.set_source(source);
        proxy
    }

    pub fn source(&self) -> Option<SourceHandle> {
        self.source.borrow().as_ref().map(SourceRef::get)
    }

    pub fn set_source(&self, source: Option<&SourceHandle>) {
        let weak = self.weak_self.clone();
        *self.source.borrow_mut() = source.map(|s| {
            SourceRef::new(s, move || {
                if let Some(proxy) = weak.upgrade() {
                    proxy.changed.emit();
                }
            })
        });
        self.changed.emit();
    }

    pub fn set_map(&self, map: FxHashMap<String, Value>) {
        *self.map.borrow_mut() = map;
        self.changed.emit();
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.map.borrow_mut().insert(key.into(), value.into());
        self.changed.emit();
    }

    fn lookup(&self, upstream: &Value) -> Value {
        if !upstream.is_valid() {
            return Value::Invalid;
        }
        self.map
            .borrow()
            .get(&upstream.to_string())
            .cloned()
            .unwrap_or_default()
    }
}

impl ChartDataSource for MapProxySource {
    fn kind(&self) -> SourceKind {
        SourceKind::MapProxy
    }

    fn item_count(&self) -> usize {
        self.source().map(|s| s.item_count()).unwrap_or(0)
    }

    fn item(&self, index: isize) -> Value {
        match self.source() {
            Some(source) => self.lookup(&source.item(index)),
            None => Value::Invalid,
        }
    }

    fn minimum(&self) -> Value {
        min_of(self.values().iter())
    }

    fn maximum(&self) -> Value {
        max_of(self.values().iter())
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}
