//! Sources backed by an external table model.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{max_of, min_of, Notifier, Subscription, Value};
use rustc_hash::FxHashMap;

use super::{checked_index, ChartDataSource, SourceKind};

/// Identifier of a data role within a model.
pub type RoleId = i32;

/// Change reported by a [`TableModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelChange {
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    DataChanged { first_row: usize, last_row: usize },
    LayoutChanged,
    ModelReset,
}

impl ModelChange {
    pub fn touches_row(&self, row: usize) -> bool {
        match *self {
            ModelChange::DataChanged { first_row, last_row } => (first_row..=last_row).contains(&row),
            ModelChange::RowsInserted { .. }
            | ModelChange::RowsRemoved { .. }
            | ModelChange::LayoutChanged
            | ModelChange::ModelReset => true,
        }
    }
}

/// Tabular data provider owned by the host application.
pub trait TableModel {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn data(&self, row: usize, column: usize, role: RoleId) -> Value;

    /// Role names by id. Some models only populate this lazily.
    fn role_names(&self) -> FxHashMap<RoleId, String>;

    fn changes(&self) -> &Notifier<ModelChange>;
}

pub type ModelHandle = Rc<dyn TableModel>;

type CellRoles = FxHashMap<RoleId, Value>;

/// In-memory [`TableModel`]: rows of columns of per-role values.
pub struct VecTableModel {
    column_count: usize,
    role_names: RefCell<FxHashMap<RoleId, String>>,
    rows: RefCell<Vec<Vec<CellRoles>>>,
    changes: Notifier<ModelChange>,
}

impl VecTableModel {
    pub const DISPLAY_ROLE: RoleId = 0;

    pub fn new(column_count: usize) -> Rc<Self> {
        let mut names = FxHashMap::default();
        names.insert(Self::DISPLAY_ROLE, "display".to_string());
        Rc::new(Self {
            column_count,
            role_names: RefCell::new(names),
            rows: RefCell::new(Vec::new()),
            changes: Notifier::new(),
        })
    }

    pub fn set_role_name(&self, role: RoleId, name: &str) {
        self.role_names.borrow_mut().insert(role, name.to_string());
    }

    /// Append a row whose columns hold `values` under `role`.
    pub fn append_row(&self, role: RoleId, values: Vec<Value>) {
        let row = {
            let mut rows = self.rows.borrow_mut();
            let cells = (0..self.column_count)
                .map(|c| {
                    let mut cell = CellRoles::default();
                    if let Some(v) = values.get(c) {
                        cell.insert(role, v.clone());
                    }
                    cell
                })
                .collect();
            rows.push(cells);
            rows.len() - 1
        };
        self.changes.notify(&ModelChange::RowsInserted { first: row, last: row });
    }

    pub fn set_data(&self, row: usize, column: usize, role: RoleId, value: Value) -> bool {
        {
            let mut rows = self.rows.borrow_mut();
            let Some(cell) = rows.get_mut(row).and_then(|r| r.get_mut(column)) else {
                return false;
            };
            cell.insert(role, value);
        }
        self.changes.notify(&ModelChange::DataChanged {
            first_row: row,
            last_row: row,
        });
        true
    }

    pub fn remove_rows(&self, first: usize, count: usize) {
        let removed = {
            let mut rows = self.rows.borrow_mut();
            let end = (first + count).min(rows.len());
            if first >= end {
                return;
            }
            rows.drain(first..end);
            end - 1
        };
        self.changes.notify(&ModelChange::RowsRemoved {
            first,
            last: removed,
        });
    }

    pub fn reset(&self) {
        self.rows.borrow_mut().clear();
        self.changes.notify(&ModelChange::ModelReset);
    }
}

impl TableModel for VecTableModel {
    fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn data(&self, row: usize, column: usize, role: RoleId) -> Value {
        self.rows
            .borrow()
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|cell| cell.get(&role))
            .cloned()
            .unwrap_or_default()
    }

    fn role_names(&self) -> FxHashMap<RoleId, String> {
        self.role_names.borrow().clone()
    }

    fn changes(&self) -> &Notifier<ModelChange> {
        &self.changes
    }
}

struct ModelRef {
    model: ModelHandle,
    _subscription: Subscription,
}

/// A column (or, with `index_columns`, the first row) of a table model.
///
/// The role is either set by id or looked up by name. Name lookups are cached
/// once they succeed and dropped when the model resets.
pub struct ModelSource {
    weak_self: Weak<ModelSource>,
    model: RefCell<Option<ModelRef>>,
    role: Cell<Option<RoleId>>,
    role_name: RefCell<String>,
    resolved_role: Cell<Option<RoleId>>,
    column: Cell<usize>,
    index_columns: Cell<bool>,
    minimum: RefCell<Option<Value>>,
    maximum: RefCell<Option<Value>>,
    warned: Cell<bool>,
    model_changed: Notifier<ModelChange>,
    changed: Notifier,
}

impl ModelSource {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            model: RefCell::new(None),
            role: Cell::new(None),
            role_name: RefCell::new(String::new()),
            resolved_role: Cell::new(None),
            column: Cell::new(0),
            index_columns: Cell::new(false),
            minimum: RefCell::new(None),
            maximum: RefCell::new(None),
            warned: Cell::new(false),
            model_changed: Notifier::new(),
            changed: Notifier::new(),
        })
    }

    pub fn with_model(model: &ModelHandle, column: usize, role_name: &str) -> Rc<Self> {
        let source = Self::new();
        source.set_column(column);
        source.set_role_name(role_name);
        source.set_model(Some(model));
        source
    }

    pub fn model(&self) -> Option<ModelHandle> {
        self.model.borrow().as_ref().map(|m| m.model.clone())
    }

    pub fn set_model(&self, model: Option<&ModelHandle>) {
        let weak = self.weak_self.clone();
        let model_ref = model.map(|m| ModelRef {
            model: m.clone(),
            _subscription: m.changes().subscribe(move |change| {
                if let Some(source) = weak.upgrade() {
                    source.on_model_changed(*change);
                }
            }),
        });
        *self.model.borrow_mut() = model_ref;
        self.resolved_role.set(None);
        self.reconfigured();
    }

    /// Explicit role id; takes precedence over the role name.
    pub fn set_role(&self, role: Option<RoleId>) {
        self.role.set(role);
        self.reconfigured();
    }

    pub fn role_name(&self) -> String {
        self.role_name.borrow().clone()
    }

    pub fn set_role_name(&self, name: &str) {
        *self.role_name.borrow_mut() = name.to_string();
        self.resolved_role.set(None);
        self.reconfigured();
    }

    pub fn column(&self) -> usize {
        self.column.get()
    }

    pub fn set_column(&self, column: usize) {
        self.column.set(column);
        self.reconfigured();
    }

    pub fn index_columns(&self) -> bool {
        self.index_columns.get()
    }

    pub fn set_index_columns(&self, index_columns: bool) {
        self.index_columns.set(index_columns);
        self.reconfigured();
    }

    /// Override the computed minimum.
    pub fn set_minimum(&self, minimum: Option<Value>) {
        *self.minimum.borrow_mut() = minimum;
        self.changed.emit();
    }

    /// Override the computed maximum.
    pub fn set_maximum(&self, maximum: Option<Value>) {
        *self.maximum.borrow_mut() = maximum;
        self.changed.emit();
    }

    /// Raw model changes, re-broadcast after this source has processed them.
    pub fn model_changed(&self) -> &Notifier<ModelChange> {
        &self.model_changed
    }

    /// Role currently in effect, resolving the role name if needed.
    pub fn role(&self) -> Option<RoleId> {
        if let Some(role) = self.role.get() {
            return Some(role);
        }
        let name = self.role_name.borrow();
        if name.is_empty() {
            return Some(VecTableModel::DISPLAY_ROLE);
        }
        if let Some(role) = self.resolved_role.get() {
            return Some(role);
        }
        let model = self.model()?;
        let role = model
            .role_names()
            .into_iter()
            .find(|(_, n)| *n == *name)
            .map(|(id, _)| id);
        self.resolved_role.set(role);
        role
    }

    fn reconfigured(&self) {
        self.warned.set(false);
        self.changed.emit();
    }

    fn warn_once(&self, message: &str) {
        if !self.warned.replace(true) {
            tracing::warn!(
                role_name = %self.role_name.borrow(),
                column = self.column.get(),
                "model source produces no data: {message}"
            );
        }
    }

    fn on_model_changed(&self, change: ModelChange) {
        if change == ModelChange::ModelReset {
            self.resolved_role.set(None);
        }
        self.model_changed.notify(&change);
        self.changed.emit();
    }
}

impl ChartDataSource for ModelSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Model
    }

    fn item_count(&self) -> usize {
        match self.model() {
            Some(model) if self.index_columns.get() => model.column_count(),
            Some(model) => model.row_count(),
            None => 0,
        }
    }

    fn item(&self, index: isize) -> Value {
        let Some(model) = self.model() else {
            self.warn_once("no model set");
            return Value::Invalid;
        };
        let Some(role) = self.role() else {
            self.warn_once("role name not found in model");
            return Value::Invalid;
        };

        if self.index_columns.get() {
            if model.row_count() == 0 {
                return Value::Invalid;
            }
            return checked_index(index, model.column_count())
                .map(|column| model.data(0, column, role))
                .unwrap_or_default();
        }

        let column = self.column.get();
        if column >= model.column_count() {
            self.warn_once("column outside of model");
            return Value::Invalid;
        }
        checked_index(index, model.row_count())
            .map(|row| model.data(row, column, role))
            .unwrap_or_default()
    }

    fn minimum(&self) -> Value {
        if self.item_count() == 0 {
            return Value::Invalid;
        }
        if let Some(v) = self.minimum.borrow().as_ref().filter(|v| v.is_valid()) {
            return v.clone();
        }
        min_of(self.values().iter())
    }

    fn maximum(&self) -> Value {
        if self.item_count() == 0 {
            return Value::Invalid;
        }
        if let Some(v) = self.maximum.borrow().as_ref().filter(|v| v.is_valid()) {
            return v.clone();
        }
        max_of(self.values().iter())
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE_ROLE: RoleId = 257;

    fn sample_model() -> Rc<VecTableModel> {
        let model = VecTableModel::new(2);
        model.set_role_name(VALUE_ROLE, "value");
        model.append_row(VALUE_ROLE, vec![Value::from(1.0), Value::from(10.0)]);
        model.append_row(VALUE_ROLE, vec![Value::from(3.0), Value::from(30.0)]);
        model.append_row(VALUE_ROLE, vec![Value::from(2.0), Value::from(20.0)]);
        model
    }

    #[test]
    fn reads_a_column_by_role_name() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 1, "value");

        assert_eq!(source.item_count(), 3);
        assert_eq!(source.item(0), Value::Number(10.0));
        assert_eq!(source.item(2), Value::Number(20.0));
        assert_eq!(source.item(3), Value::Invalid);
        assert_eq!(source.minimum(), Value::Number(10.0));
        assert_eq!(source.maximum(), Value::Number(30.0));
    }

    #[test]
    fn index_columns_reads_the_first_row() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 0, "value");
        source.set_index_columns(true);

        assert_eq!(source.item_count(), 2);
        assert_eq!(source.item(1), Value::Number(10.0));
    }

    #[test]
    fn misconfiguration_yields_no_data() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();

        let unknown_role = ModelSource::with_model(&handle, 0, "missing");
        assert_eq!(unknown_role.item(0), Value::Invalid);

        let bad_column = ModelSource::with_model(&handle, 5, "value");
        assert_eq!(bad_column.item(0), Value::Invalid);

        let no_model = ModelSource::new();
        assert_eq!(no_model.item_count(), 0);
        assert_eq!(no_model.item(0), Value::Invalid);
        assert_eq!(no_model.minimum(), Value::Invalid);
    }

    #[test]
    fn lazily_populated_role_names_resolve_later() {
        let model = VecTableModel::new(1);
        model.append_row(VALUE_ROLE, vec![Value::from(4.0)]);
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 0, "value");

        assert_eq!(source.item(0), Value::Invalid);
        model.set_role_name(VALUE_ROLE, "value");
        assert_eq!(source.item(0), Value::Number(4.0));
    }

    #[test]
    fn model_changes_are_forwarded() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 0, "value");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let _sub = source.data_changed().subscribe(move |_| h.set(h.get() + 1));

        model.set_data(0, 0, VALUE_ROLE, Value::from(9.0));
        model.remove_rows(0, 1);
        assert_eq!(hits.get(), 2);
        assert_eq!(source.item_count(), 2);
        assert_eq!(source.item(0), Value::Number(3.0));
    }

    #[test]
    fn explicit_extremes_override_computed_ones() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 0, "value");
        source.set_maximum(Some(Value::from(100.0)));
        assert_eq!(source.maximum(), Value::Number(100.0));
        assert_eq!(source.minimum(), Value::Number(1.0));
    }

    #[test]
    fn source_keeps_its_model_until_detached() {
        let model = sample_model();
        let handle: ModelHandle = model.clone();
        let source = ModelSource::with_model(&handle, 0, "value");
        let count = source.item_count();
        drop(handle);
        drop(model);
        assert_eq!(source.item_count(), count);
        assert!(source.model().is_some());

        source.set_model(None);
        assert_eq!(source.item_count(), 0);
        assert!(source.model().is_none());
    }
}
