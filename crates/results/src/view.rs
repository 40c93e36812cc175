//! Row sequences backing a result collection.

use std::sync::Arc;
use vista_core::{Row, RowId};
use vista_storage::{TableId, Version};

/// An ordered sequence of row ids captured from a query result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableView {
    table: String,
    table_id: TableId,
    rows: Vec<RowId>,
    version: Version,
}

impl TableView {
    pub(crate) fn capture(table: &str, table_id: TableId, rows: &[Arc<Row>], version: Version) -> Self {
        Self {
            table: table.into(),
            table_id,
            rows: rows.iter().map(|row| row.id()).collect(),
            version,
        }
    }

    /// Returns the table the rows belong to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the id of the table instance the rows were read from.
    ///
    /// A table dropped and recreated under the same name gets a new id.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the row ids in result order.
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    /// Returns the store version the view was captured at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row id at `index`.
    pub fn get(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).copied()
    }

    /// Returns the position of `row_id`.
    pub fn index_of(&self, row_id: RowId) -> Option<usize> {
        self.rows.iter().position(|id| *id == row_id)
    }

    /// Returns true if the view contains `row_id`.
    pub fn contains(&self, row_id: RowId) -> bool {
        self.index_of(row_id).is_some()
    }
}

/// Which view a collection reads from.
///
/// A snapshot carries its frozen view, so a collection can never hold both
/// views or neither.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Re-evaluate against the store on every read.
    #[default]
    Live,
    /// Read from a frozen view.
    Snapshot(TableView),
}

impl ViewMode {
    /// Returns true in snapshot mode.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, ViewMode::Snapshot(_))
    }

    /// Returns the frozen view, if any.
    pub fn snapshot(&self) -> Option<&TableView> {
        match self {
            ViewMode::Snapshot(view) => Some(view),
            ViewMode::Live => None,
        }
    }
}
