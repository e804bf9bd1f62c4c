use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chartkit_core::{max_of, min_of, Color, Notifier, Value};

use super::{checked_index, ChartDataSource, SourceKind};
use crate::error::ChartError;

/// A fixed list of values, optionally indexed with wrap-around.
pub struct ArraySource {
    array: RefCell<Vec<Value>>,
    wrap: Cell<bool>,
    changed: Notifier,
}

impl ArraySource {
    pub fn new(array: Vec<Value>, wrap: bool) -> Rc<Self> {
        Rc::new(Self {
            array: RefCell::new(array),
            wrap: Cell::new(wrap),
            changed: Notifier::new(),
        })
    }

    pub fn from_numbers<I>(values: I) -> Rc<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(values.into_iter().map(Value::Number).collect(), false)
    }

    /// Build from a JSON array of numbers, strings (`#rrggbb` becomes a color)
    /// or nulls.
    pub fn from_json(json: &str) -> Result<Rc<Self>, ChartError> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        let items = parsed
            .as_array()
            .ok_or_else(|| ChartError::UnsupportedJson(format!("expected an array, got {parsed}")))?;
        let values = items
            .iter()
            .map(value_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(values, false))
    }

    pub fn array(&self) -> Vec<Value> {
        self.array.borrow().clone()
    }

    pub fn set_array(&self, array: Vec<Value>) {
        *self.array.borrow_mut() = array;
        self.changed.emit();
    }

    pub fn wrap(&self) -> bool {
        self.wrap.get()
    }

    pub fn set_wrap(&self, wrap: bool) {
        if self.wrap.replace(wrap) != wrap {
            self.changed.emit();
        }
    }
}

fn value_from_json(v: &serde_json::Value) -> Result<Value, ChartError> {
    match v {
        serde_json::Value::Null => Ok(Value::Invalid),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| ChartError::UnsupportedJson(n.to_string())),
        serde_json::Value::String(s) if s.starts_with('#') => Ok(Value::Color(Color::parse_hex(s)?)),
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        other => Err(ChartError::UnsupportedJson(other.to_string())),
    }
}

impl ChartDataSource for ArraySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Array
    }

    fn item_count(&self) -> usize {
        self.array.borrow().len()
    }

    fn item(&self, index: isize) -> Value {
        let array = self.array.borrow();
        if self.wrap.get() && !array.is_empty() {
            let i = index.rem_euclid(array.len() as isize) as usize;
            return array[i].clone();
        }
        checked_index(index, array.len())
            .map(|i| array[i].clone())
            .unwrap_or_default()
    }

    fn minimum(&self) -> Value {
        min_of(self.array.borrow().iter())
    }

    fn maximum(&self) -> Value {
        max_of(self.array.borrow().iter())
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}
