//! Row storage for a single table.
//!
//! Rows are kept in row-id order, which is also the natural (unsorted) order
//! of query results. Stored rows are shared as `Arc<Row>` so result views and
//! notifiers can hold on to them without copying.

use std::collections::BTreeMap;
use std::sync::Arc;
use vista_core::schema::{Column, Table};
use vista_core::{Result, Row, RowId, StoreError, Value};

type RowMap = BTreeMap<RowId, Arc<Row>>;

/// Identifier of a table within a store.
pub type TableId = u64;

/// Row storage for a single table.
pub struct RowStore {
    id: TableId,
    schema: Table,
    /// Bumped whenever the column layout changes; queries bound to an older
    /// schema version are rejected.
    schema_version: u64,
    rows: RowMap,
    next_row_id: RowId,
}

impl RowStore {
    /// Creates a new row store for the given table schema.
    pub fn new(id: TableId, schema: Table) -> Self {
        Self {
            id,
            schema,
            schema_version: 1,
            rows: RowMap::new(),
            next_row_id: 1,
        }
    }

    /// Returns the table id.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    /// Returns the schema version.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks that `values` fits the schema.
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        let columns = self.schema.columns();
        if values.len() != columns.len() {
            return Err(StoreError::ColumnCount {
                expected: columns.len(),
                got: values.len(),
            }
            .into());
        }
        for (column, value) in columns.iter().zip(values) {
            check_value(column, value)?;
        }
        Ok(())
    }

    /// Inserts a new row and returns its assigned id.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<RowId> {
        self.validate(&values)?;
        let row_id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(row_id, Arc::new(Row::new(row_id, values)));
        Ok(row_id)
    }

    /// Puts back a row with its original id, used by rollback.
    pub fn restore(&mut self, row: Row) {
        self.next_row_id = self.next_row_id.max(row.id() + 1);
        self.rows.insert(row.id(), Arc::new(row));
    }

    /// Replaces the values of a row, bumping its version. Returns the old row.
    pub fn update(&mut self, row_id: RowId, values: Vec<Value>) -> Result<Arc<Row>> {
        self.validate(&values)?;
        let old = self
            .rows
            .get(&row_id)
            .cloned()
            .ok_or_else(|| StoreError::row_not_found(self.schema.name(), row_id))?;

        let new_row = Row::new_with_version(row_id, old.version().wrapping_add(1), values);
        self.rows.insert(row_id, Arc::new(new_row));
        Ok(old)
    }

    /// Sets a single cell, bumping the row version. Returns the old row.
    pub fn set_value(&mut self, row_id: RowId, column: usize, value: Value) -> Result<Arc<Row>> {
        let old = self
            .rows
            .get(&row_id)
            .cloned()
            .ok_or_else(|| StoreError::row_not_found(self.schema.name(), row_id))?;
        let col = self.schema.column_at(column).ok_or_else(|| {
            vista_core::Error::invalid_argument(format!(
                "Column index {} out of range for table {}",
                column,
                self.schema.name()
            ))
        })?;
        check_value(col, &value)?;

        let mut new_row = (*old).clone();
        new_row.set(column, value);
        new_row.increment_version();
        self.rows.insert(row_id, Arc::new(new_row));
        Ok(old)
    }

    /// Deletes a row from the store.
    pub fn delete(&mut self, row_id: RowId) -> Result<Arc<Row>> {
        self.rows
            .remove(&row_id)
            .ok_or_else(|| StoreError::row_not_found(self.schema.name(), row_id).into())
    }

    /// Gets a row by ID.
    pub fn get(&self, row_id: RowId) -> Option<Arc<Row>> {
        self.rows.get(&row_id).cloned()
    }

    /// Returns true if the row exists.
    pub fn contains(&self, row_id: RowId) -> bool {
        self.rows.contains_key(&row_id)
    }

    /// Returns an iterator over all rows in row-id order.
    pub fn scan(&self) -> impl Iterator<Item = &Arc<Row>> + '_ {
        self.rows.values()
    }

    /// Appends a column, filling existing rows with the column default.
    pub fn add_column(&mut self, column: Column) -> Result<usize> {
        let index = self.schema.push_column(column)?;
        let default = self
            .schema
            .column_at(index)
            .map(Column::get_default_value)
            .unwrap_or(Value::Null);

        for row in self.rows.values_mut() {
            Arc::make_mut(row).push(default.clone());
        }
        self.schema_version += 1;
        Ok(index)
    }
}

fn check_value(column: &Column, value: &Value) -> Result<()> {
    match value.data_type() {
        None if column.is_nullable() => Ok(()),
        None => Err(StoreError::NullConstraint {
            column: column.name().into(),
        }
        .into()),
        Some(dt) if dt == column.data_type() => Ok(()),
        Some(dt) => Err(StoreError::TypeMismatch {
            column: column.name().into(),
            expected: column.data_type(),
            got: dt,
        }
        .into()),
    }
}
