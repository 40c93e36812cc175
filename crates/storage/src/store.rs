//! The versioned, single-session store.
//!
//! `Store` wraps a `TableCache` behind a lock, runs at most one write
//! transaction at a time and drives change notifications through
//! `advance_to_latest`.

use crate::cache::TableCache;
use crate::change_set::{ChangeSet, ObservedRow};
use crate::descriptor::DescriptorSet;
use crate::notify::{NotificationCallback, NotificationToken, NotifierRegistry};
use crate::query::Query;
use crate::row_store::{RowStore, TableId};
use crate::transaction::Transaction;
use core::sync::atomic::Ordering;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, trace};
use vista_core::schema::{Column, Table};
use vista_core::{DataType, Result, Row, RowId, StoreError, Value};

/// Monotonic store version, bumped by every commit and schema change.
pub type Version = u64;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    deliver_initial_notification: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            deliver_initial_notification: true,
        }
    }
}

impl StoreConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a new notifier receives an empty change set on the
    /// first pump after registration.
    pub fn with_initial_notification(mut self, deliver: bool) -> Self {
        self.deliver_initial_notification = deliver;
        self
    }

    /// Returns whether initial notifications are delivered.
    pub fn deliver_initial_notification(&self) -> bool {
        self.deliver_initial_notification
    }
}

struct StoreState {
    cache: TableCache,
    transaction: Option<Transaction>,
    version: Version,
}

/// An embedded in-memory store with one session.
///
/// Reads observe the session's own uncommitted writes.
pub struct Store {
    config: StoreConfig,
    state: RwLock<StoreState>,
    notifiers: Arc<Mutex<NotifierRegistry>>,
}

impl Store {
    /// Opens an empty store.
    pub fn open(config: StoreConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: RwLock::new(StoreState {
                cache: TableCache::new(),
                transaction: None,
                version: 1,
            }),
            notifiers: Arc::new(Mutex::new(NotifierRegistry::new())),
        })
    }

    /// Opens an empty store with the default configuration.
    pub fn new() -> Arc<Self> {
        Self::open(StoreConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---- schema ----

    /// Creates a table.
    pub fn create_table(&self, schema: Table) -> Result<TableId> {
        self.alter_schema(|cache| cache.create_table(schema))
    }

    /// Drops a table. Queries bound to it become invalid.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.alter_schema(|cache| cache.drop_table(name).map(|_| ()))
    }

    /// Adds a nullable column to a table and returns its index.
    ///
    /// Existing rows receive the column default and queries bound to the
    /// previous schema become invalid.
    pub fn add_column(&self, table: &str, name: &str, data_type: DataType) -> Result<usize> {
        let column = Column::new(name, data_type).nullable(true);
        self.alter_schema(|cache| cache.table_mut(table)?.add_column(column))
    }

    /// Returns a copy of a table's schema.
    pub fn schema(&self, name: &str) -> Result<Table> {
        Ok(self.state.read().cache.table(name)?.schema().clone())
    }

    /// Returns the table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        self.state
            .read()
            .cache
            .table_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn alter_schema<T>(&self, f: impl FnOnce(&mut TableCache) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        if state.transaction.is_some() {
            return Err(StoreError::TransactionInProgress.into());
        }
        let out = f(&mut state.cache)?;
        state.version += 1;
        debug!(version = state.version, "Schema changed");
        Ok(out)
    }

    // ---- transactions ----

    /// Starts a write transaction.
    pub fn begin_write(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.transaction.is_some() {
            return Err(StoreError::TransactionInProgress.into());
        }
        let tx = Transaction::begin();
        trace!(tx = tx.id(), "Began write transaction");
        state.transaction = Some(tx);
        Ok(())
    }

    /// Commits the open write transaction and returns the new version.
    pub fn commit_write(&self) -> Result<Version> {
        let mut state = self.state.write();
        let tx = state
            .transaction
            .take()
            .ok_or(StoreError::NotInTransaction)?;
        let tx_id = tx.id();
        let entries = tx.commit()?;
        state.version += 1;
        debug!(
            tx = tx_id,
            changes = entries.len(),
            version = state.version,
            "Committed write transaction"
        );
        Ok(state.version)
    }

    /// Rolls back the open write transaction.
    pub fn cancel_write(&self) -> Result<()> {
        let mut state = self.state.write();
        let tx = state
            .transaction
            .take()
            .ok_or(StoreError::NotInTransaction)?;
        let tx_id = tx.id();
        tx.rollback(&mut state.cache)?;
        debug!(tx = tx_id, "Rolled back write transaction");
        Ok(())
    }

    /// Returns true while a write transaction is open.
    pub fn is_mid_transaction(&self) -> bool {
        self.state.read().transaction.is_some()
    }

    /// Returns the current version.
    pub fn current_version(&self) -> Version {
        self.state.read().version
    }

    fn write_with<T>(&self, f: impl FnOnce(&mut Transaction, &mut TableCache) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let tx = state
            .transaction
            .as_mut()
            .ok_or(StoreError::NotInTransaction)?;
        f(tx, &mut state.cache)
    }

    // ---- mutations ----

    /// Inserts a row and returns its id.
    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<RowId> {
        self.write_with(|tx, cache| tx.insert(cache, table, values))
    }

    /// Replaces every value of a row.
    pub fn update(&self, table: &str, row_id: RowId, values: Vec<Value>) -> Result<()> {
        self.write_with(|tx, cache| tx.update(cache, table, row_id, values))
    }

    /// Sets a single cell.
    pub fn set_value(&self, table: &str, row_id: RowId, column: usize, value: Value) -> Result<()> {
        self.write_with(|tx, cache| tx.set_value(cache, table, row_id, column, value))
    }

    /// Deletes a row.
    pub fn delete(&self, table: &str, row_id: RowId) -> Result<()> {
        self.write_with(|tx, cache| tx.delete(cache, table, row_id))
    }

    /// Deletes the listed rows, skipping rows already removed.
    pub fn delete_rows(&self, table: &str, row_ids: &[RowId]) -> Result<usize> {
        self.write_with(|tx, cache| tx.delete_many(cache, table, row_ids))
    }

    // ---- reads ----

    /// Returns the current state of a row.
    pub fn row(&self, table: &str, row_id: RowId) -> Option<Arc<Row>> {
        self.state.read().cache.get_row(table, row_id)
    }

    /// Returns the listed rows that still exist, in the given order.
    pub fn resolve_rows(&self, table: &str, row_ids: &[RowId]) -> Vec<Arc<Row>> {
        let state = self.state.read();
        match state.cache.get_table(table) {
            Some(store) => row_ids.iter().filter_map(|id| store.get(*id)).collect(),
            None => Vec::new(),
        }
    }

    /// Returns true if the row still exists.
    pub fn is_row_valid(&self, table: &str, row_id: RowId) -> bool {
        self.state
            .read()
            .cache
            .get_table(table)
            .map_or(false, |t| t.contains(row_id))
    }

    // ---- query engine ----

    /// Builds a query matching every row of `table`.
    pub fn query(&self, table: &str) -> Result<Query> {
        Ok(Query::new(self.state.read().cache.table(table)?))
    }

    /// Checks that `query` is still bound to a live table.
    pub fn validate_query(&self, query: &Query) -> Result<()> {
        let state = self.state.read();
        query.check_bound(state.cache.get_table(query.table()))?;
        Ok(())
    }

    /// Evaluates a query, then applies descriptors.
    pub fn evaluate(&self, query: &Query, descriptors: &DescriptorSet) -> Result<Vec<Arc<Row>>> {
        let state = self.state.read();
        evaluate_in(&state.cache, query, descriptors)
    }

    /// Counts the rows matching a query.
    pub fn row_count(&self, query: &Query) -> Result<usize> {
        let state = self.state.read();
        let table = query.check_bound(state.cache.get_table(query.table()))?;
        Ok(table.scan().filter(|row| query.matches(row)).count())
    }

    /// Returns the first matching row in row-id order.
    pub fn find_first(&self, query: &Query) -> Result<Option<Arc<Row>>> {
        let state = self.state.read();
        let table = query.check_bound(state.cache.get_table(query.table()))?;
        let found = table.scan().find(|row| query.matches(row)).cloned();
        Ok(found)
    }

    /// Returns every matching row in row-id order.
    pub fn find_all(&self, query: &Query) -> Result<Vec<Arc<Row>>> {
        self.evaluate(query, &DescriptorSet::default())
    }

    // ---- notifications ----

    /// Registers a callback for changes to the result of `query`.
    ///
    /// Nothing is registered if the query or descriptors are invalid.
    pub fn register_notification(
        &self,
        query: &Query,
        descriptors: &DescriptorSet,
        callback: NotificationCallback,
    ) -> Result<NotificationToken> {
        let state = self.state.read();
        let table = query.check_bound(state.cache.get_table(query.table()))?;
        descriptors.validate(table.schema().column_count())?;

        let id = self
            .notifiers
            .lock()
            .register(query.clone(), descriptors.clone(), callback);
        trace!(notifier = id, table = query.table(), "Registered notifier");
        Ok(NotificationToken::new(id, &self.notifiers))
    }

    /// Cancels a token. Returns true if a notifier was removed.
    pub fn cancel_notification(&self, token: &mut NotificationToken) -> bool {
        token.cancel()
    }

    /// Returns the number of registered notifiers.
    pub fn notifier_count(&self) -> usize {
        self.notifiers.lock().len()
    }

    /// Runs one notification pass and returns the number of deliveries.
    ///
    /// Change sets are computed for every notifier under the store lock and
    /// delivered, in registration order, after the lock is released. A
    /// notifier cancelled before its turn receives nothing.
    pub fn advance_to_latest(&self) -> Result<usize> {
        let pending = {
            let state = self.state.read();
            if state.transaction.is_some() {
                return Err(StoreError::TransactionInProgress.into());
            }
            let version = state.version;
            let mut registry = self.notifiers.lock();
            let mut pending = Vec::new();

            for (id, notifier) in registry.iter_mut() {
                let rows = match evaluate_in(&state.cache, &notifier.query, &notifier.descriptors) {
                    Ok(rows) => rows,
                    Err(err) => {
                        trace!(notifier = *id, error = %err, "Skipping notifier");
                        continue;
                    }
                };
                let observed: Vec<ObservedRow> =
                    rows.iter().map(|row| (row.id(), row.version())).collect();

                let changes = match notifier.observed.take() {
                    None => {
                        notifier.observed = Some(observed);
                        notifier.observed_version = version;
                        if !self.config.deliver_initial_notification {
                            continue;
                        }
                        ChangeSet::new()
                    }
                    Some(previous) if version <= notifier.observed_version => {
                        notifier.observed = Some(previous);
                        continue;
                    }
                    Some(previous) => {
                        let changes = ChangeSet::compute(&previous, &observed);
                        notifier.observed = Some(observed);
                        notifier.observed_version = version;
                        if changes.is_empty() {
                            continue;
                        }
                        changes
                    }
                };
                pending.push((
                    *id,
                    notifier.active.clone(),
                    notifier.callback.clone(),
                    changes,
                ));
            }
            trace!(version, pending = pending.len(), "Computed notification pass");
            pending
        };

        let mut delivered = 0;
        for (id, active, callback, changes) in pending {
            if !active.load(Ordering::SeqCst) {
                trace!(notifier = id, "Notifier cancelled during pass");
                continue;
            }
            callback(&changes);
            delivered += 1;
        }
        Ok(delivered)
    }
}

fn evaluate_in(cache: &TableCache, query: &Query, descriptors: &DescriptorSet) -> Result<Vec<Arc<Row>>> {
    let table: &RowStore = query.check_bound(cache.get_table(query.table()))?;
    query.evaluate(table, descriptors)
}
