use std::cell::RefCell;
use std::rc::Rc;

use chartkit_core::{Notifier, Value};

use super::{ChartDataSource, SourceKind};

/// A source holding exactly one value.
pub struct SingleValueSource {
    value: RefCell<Value>,
    changed: Notifier,
}

impl SingleValueSource {
    pub fn new(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value.into()),
            changed: Notifier::new(),
        })
    }

    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn set_value(&self, value: impl Into<Value>) {
        let value = value.into();
        if *self.value.borrow() == value {
            return;
        }
        *self.value.borrow_mut() = value;
        self.changed.emit();
    }
}

impl ChartDataSource for SingleValueSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SingleValue
    }

    fn item_count(&self) -> usize {
        1
    }

    fn item(&self, index: isize) -> Value {
        if index == 0 {
            self.value()
        } else {
            Value::Invalid
        }
    }

    fn minimum(&self) -> Value {
        self.value()
    }

    fn maximum(&self) -> Value {
        self.value()
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}
