//! Journal for tracking changes inside a write transaction.
//!
//! Mutations are applied to the `TableCache` immediately; the journal keeps
//! enough of the previous state to undo them in reverse order.

use crate::cache::TableCache;
use std::sync::Arc;
use vista_core::{Row, RowId};

/// A single journal entry representing a change.
#[derive(Clone, Debug)]
pub enum JournalEntry {
    /// A row was inserted.
    Insert { table: String, row_id: RowId },
    /// A row was updated.
    Update {
        table: String,
        row_id: RowId,
        old: Arc<Row>,
    },
    /// A row was deleted.
    Delete {
        table: String,
        row_id: RowId,
        row: Arc<Row>,
    },
}

impl JournalEntry {
    /// Returns the table name for this entry.
    pub fn table(&self) -> &str {
        match self {
            JournalEntry::Insert { table, .. } => table,
            JournalEntry::Update { table, .. } => table,
            JournalEntry::Delete { table, .. } => table,
        }
    }

    /// Returns the row ID for this entry.
    pub fn row_id(&self) -> RowId {
        match self {
            JournalEntry::Insert { row_id, .. } => *row_id,
            JournalEntry::Update { row_id, .. } => *row_id,
            JournalEntry::Delete { row_id, .. } => *row_id,
        }
    }
}

/// Journal for tracking changes within a transaction.
#[derive(Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insert operation.
    pub fn record_insert(&mut self, table: &str, row_id: RowId) {
        self.entries.push(JournalEntry::Insert {
            table: table.into(),
            row_id,
        });
    }

    /// Records an update operation.
    pub fn record_update(&mut self, table: &str, old: Arc<Row>) {
        self.entries.push(JournalEntry::Update {
            table: table.into(),
            row_id: old.id(),
            old,
        });
    }

    /// Records a delete operation.
    pub fn record_delete(&mut self, table: &str, row: Arc<Row>) {
        self.entries.push(JournalEntry::Delete {
            table: table.into(),
            row_id: row.id(),
            row,
        });
    }

    /// Returns all journal entries.
    pub fn get_entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Returns true if the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Finalizes the journal; changes are already in the cache.
    pub fn commit(&mut self) -> Vec<JournalEntry> {
        core::mem::take(&mut self.entries)
    }

    /// Rolls back the journal changes.
    ///
    /// Updated rows are restored with a version above the one being
    /// discarded, so observers comparing versions still see a change.
    pub fn rollback(&mut self, cache: &mut TableCache) {
        for entry in self.entries.drain(..).rev() {
            let Some(store) = cache.get_table_mut(entry.table()) else {
                // Table dropped inside the transaction; nothing to restore.
                continue;
            };
            match entry {
                JournalEntry::Insert { row_id, .. } => {
                    let _ = store.delete(row_id);
                }
                JournalEntry::Update { row_id, old, .. } => {
                    let current_version = store.get(row_id).map(|r| r.version()).unwrap_or(0);
                    let mut restored = (*old).clone();
                    restored.set_version(current_version.max(old.version()).wrapping_add(1));
                    store.restore(restored);
                }
                JournalEntry::Delete { row, .. } => {
                    store.restore((*row).clone());
                }
            }
        }
    }
}
