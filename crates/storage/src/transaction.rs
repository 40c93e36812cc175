//! Write transactions for the Vista store.
//!
//! A transaction applies mutations to the cache directly and records them in
//! a `Journal` so they can be rolled back.

use crate::cache::TableCache;
use crate::journal::{Journal, JournalEntry};
use core::sync::atomic::{AtomicU64, Ordering};
use vista_core::{Error, Result, RowId, StoreError, Value};

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A write transaction.
pub struct Transaction {
    /// Unique transaction ID.
    id: TransactionId,
    /// Journal for tracking changes.
    journal: Journal,
    /// Current state.
    state: TransactionState,
}

impl Transaction {
    /// Creates a new transaction.
    pub fn begin() -> Self {
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::SeqCst),
            journal: Journal::new(),
            state: TransactionState::Active,
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(StoreError::NotInTransaction.into());
        }
        Ok(())
    }

    /// Inserts a row within this transaction.
    pub fn insert(&mut self, cache: &mut TableCache, table: &str, values: Vec<Value>) -> Result<RowId> {
        self.check_active()?;
        let row_id = cache.table_mut(table)?.insert(values)?;
        self.journal.record_insert(table, row_id);
        Ok(row_id)
    }

    /// Replaces a row's values within this transaction.
    pub fn update(
        &mut self,
        cache: &mut TableCache,
        table: &str,
        row_id: RowId,
        values: Vec<Value>,
    ) -> Result<()> {
        self.check_active()?;
        let old = cache.table_mut(table)?.update(row_id, values)?;
        self.journal.record_update(table, old);
        Ok(())
    }

    /// Sets a single cell within this transaction.
    pub fn set_value(
        &mut self,
        cache: &mut TableCache,
        table: &str,
        row_id: RowId,
        column: usize,
        value: Value,
    ) -> Result<()> {
        self.check_active()?;
        let old = cache.table_mut(table)?.set_value(row_id, column, value)?;
        self.journal.record_update(table, old);
        Ok(())
    }

    /// Deletes a row within this transaction.
    pub fn delete(&mut self, cache: &mut TableCache, table: &str, row_id: RowId) -> Result<()> {
        self.check_active()?;
        let row = cache.table_mut(table)?.delete(row_id)?;
        self.journal.record_delete(table, row);
        Ok(())
    }

    /// Deletes every listed row that still exists. Returns how many were removed.
    pub fn delete_many(&mut self, cache: &mut TableCache, table: &str, row_ids: &[RowId]) -> Result<usize> {
        self.check_active()?;
        let store = cache.table_mut(table)?;
        let mut removed = 0;
        for &row_id in row_ids {
            match store.delete(row_id) {
                Ok(row) => {
                    self.journal.record_delete(table, row);
                    removed += 1;
                }
                Err(Error::Store(StoreError::RowNotFound { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    /// Commits the transaction.
    pub fn commit(mut self) -> Result<Vec<JournalEntry>> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        Ok(self.journal.commit())
    }

    /// Rolls back the transaction.
    pub fn rollback(mut self, cache: &mut TableCache) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        self.journal.rollback(cache);
        Ok(())
    }

    /// Returns the journal entries.
    pub fn get_changes(&self) -> &[JournalEntry] {
        self.journal.get_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::schema::TableBuilder;
    use vista_core::DataType;

    fn cache() -> TableCache {
        let mut cache = TableCache::new();
        cache
            .create_table(
                TableBuilder::new("test")
                    .unwrap()
                    .add_column("id", DataType::Int64)
                    .unwrap()
                    .add_column("name", DataType::String)
                    .unwrap()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        cache
    }

    fn row(id: i64, name: &str) -> Vec<Value> {
        vec![Value::Int64(id), Value::String(name.into())]
    }

    #[test]
    fn test_transaction_begin() {
        let tx = Transaction::begin();
        assert!(tx.is_active());
        assert!(tx.id() > 0);
        assert_ne!(Transaction::begin().id(), tx.id());
    }

    #[test]
    fn test_transaction_insert_commit() {
        let mut cache = cache();
        let mut tx = Transaction::begin();
        tx.insert(&mut cache, "test", row(1, "a")).unwrap();

        let entries = tx.commit().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(cache.table("test").unwrap().len(), 1);
    }

    #[test]
    fn test_transaction_rollback() {
        let mut cache = cache();
        let mut tx = Transaction::begin();
        tx.insert(&mut cache, "test", row(1, "a")).unwrap();
        assert_eq!(cache.table("test").unwrap().len(), 1);

        tx.rollback(&mut cache).unwrap();
        assert_eq!(cache.table("test").unwrap().len(), 0);
    }

    #[test]
    fn test_transaction_update_and_set_value() {
        let mut cache = cache();
        let mut tx = Transaction::begin();
        let id = tx.insert(&mut cache, "test", row(1, "a")).unwrap();
        tx.update(&mut cache, "test", id, row(1, "b")).unwrap();
        tx.set_value(&mut cache, "test", id, 1, Value::String("c".into())).unwrap();
        tx.commit().unwrap();

        let stored = cache.get_row("test", id).unwrap();
        assert_eq!(stored.get(1), Some(&Value::String("c".into())));
        assert_eq!(stored.version(), 3);
    }

    #[test]
    fn test_transaction_delete_many_skips_missing() {
        let mut cache = cache();
        let mut tx = Transaction::begin();
        let a = tx.insert(&mut cache, "test", row(1, "a")).unwrap();
        let b = tx.insert(&mut cache, "test", row(2, "b")).unwrap();
        tx.delete(&mut cache, "test", a).unwrap();

        let removed = tx.delete_many(&mut cache, "test", &[a, b]).unwrap();
        assert_eq!(removed, 1);
        assert!(cache.table("test").unwrap().is_empty());
        assert_eq!(tx.get_changes().len(), 4);
    }

    #[test]
    fn test_transaction_unknown_table() {
        let mut cache = cache();
        let mut tx = Transaction::begin();
        let err = tx.insert(&mut cache, "missing", row(1, "a")).unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::TableNotFound { .. })));
    }
}
