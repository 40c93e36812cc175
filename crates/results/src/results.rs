//! Live result collections.
//!
//! A `Results` represents the rows matching a query in a given order. In
//! live mode every read re-evaluates against the store; in snapshot mode
//! reads come from a frozen `TableView` until the snapshot is disabled or
//! refreshed.

use crate::aggregate::{self, AggregateFunction};
use crate::bridge::ListenerBridge;
use crate::config::ResultsConfig;
use crate::runtime::{ChangeListener, HostRuntime};
use crate::view::{TableView, ViewMode};
use core::sync::atomic::{AtomicBool, Ordering};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::trace;
use vista_core::{Error, Result, Row, RowId, Value};
use vista_storage::{DescriptorSet, DistinctDescriptor, Query, SortDescriptor, Store};

/// The rows currently matching a query, in order.
pub struct Results {
    store: Arc<Store>,
    query: Query,
    descriptors: DescriptorSet,
    mode: ViewMode,
    /// Mirrors `mode` for the notification callback.
    detached: Arc<AtomicBool>,
    bridge: ListenerBridge,
    config: ResultsConfig,
}

impl Results {
    /// Creates a collection over `query`.
    ///
    /// Fails with `InvalidHandle` if the query's table is gone or altered.
    /// A collection created during a write transaction starts in snapshot
    /// mode.
    pub fn new(store: Arc<Store>, query: Query, descriptors: DescriptorSet) -> Result<Self> {
        Self::with_config(store, query, descriptors, ResultsConfig::default())
    }

    /// Creates a collection with explicit configuration.
    pub fn with_config(
        store: Arc<Store>,
        query: Query,
        descriptors: DescriptorSet,
        config: ResultsConfig,
    ) -> Result<Self> {
        store.validate_query(&query)?;
        descriptors.validate(query.column_count())?;

        let mut results = Self {
            store,
            query,
            descriptors,
            mode: ViewMode::Live,
            detached: Arc::new(AtomicBool::new(false)),
            bridge: ListenerBridge::new(),
            config,
        };
        if results.store.is_mid_transaction() {
            let view = results.live_view()?;
            results.set_mode(ViewMode::Snapshot(view));
        }
        Ok(results)
    }

    /// Returns an independent collection frozen at the current live result.
    ///
    /// The source's own snapshot, if any, is ignored.
    pub fn create_snapshot(&self) -> Result<Results> {
        let view = self.live_view()?;
        Ok(Results {
            store: self.store.clone(),
            query: self.query.clone(),
            descriptors: self.descriptors.clone(),
            mode: ViewMode::Snapshot(view),
            detached: Arc::new(AtomicBool::new(true)),
            bridge: ListenerBridge::new(),
            config: self.config,
        })
    }

    /// Returns a new collection with `sort` replacing the current ordering.
    pub fn sort(&self, sort: SortDescriptor) -> Result<Results> {
        let descriptors = self.descriptors.clone().with_sort(sort);
        Self::with_config(self.store.clone(), self.query.clone(), descriptors, self.config)
    }

    /// Returns a new collection deduplicated by `distinct`.
    pub fn distinct(&self, distinct: DistinctDescriptor) -> Result<Results> {
        let descriptors = self.descriptors.clone().with_distinct(distinct);
        Self::with_config(self.store.clone(), self.query.clone(), descriptors, self.config)
    }

    /// Returns the query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the descriptors.
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> ResultsConfig {
        self.config
    }

    /// Returns the current mode.
    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    // ---- views ----

    fn live_view(&self) -> Result<TableView> {
        let rows = self.store.evaluate(&self.query, &self.descriptors)?;
        Ok(TableView::capture(
            self.query.table(),
            self.query.table_id(),
            &rows,
            self.store.current_version(),
        ))
    }

    /// Returns the view every read goes through: the snapshot in snapshot
    /// mode, a fresh evaluation otherwise.
    pub fn active_view(&self) -> Result<Cow<'_, TableView>> {
        match &self.mode {
            ViewMode::Snapshot(view) => Ok(Cow::Borrowed(view)),
            ViewMode::Live => self.live_view().map(Cow::Owned),
        }
    }

    /// Returns the active view after checking that the query's table is
    /// still the table instance the view was read from.
    ///
    /// Every read that resolves rows and every deletion goes through here,
    /// so a snapshot of a dropped or recreated table fails with
    /// `InvalidHandle` before touching the store.
    fn bound_view(&self) -> Result<Cow<'_, TableView>> {
        self.store.validate_query(&self.query)?;
        let view = self.active_view()?;
        if view.table_id() != self.query.table_id() {
            return Err(Error::invalid_handle(format!(
                "Table {} was recreated",
                view.table()
            )));
        }
        Ok(view)
    }

    fn set_mode(&mut self, mode: ViewMode) {
        self.detached.store(mode.is_snapshot(), Ordering::SeqCst);
        self.mode = mode;
    }

    /// Freezes the current live result. Does nothing if already detached.
    pub fn enable_snapshot(&mut self) -> Result<()> {
        if self.mode.is_snapshot() {
            return Ok(());
        }
        let view = self.live_view()?;
        self.set_mode(ViewMode::Snapshot(view));
        Ok(())
    }

    /// Discards the snapshot and returns to live mode.
    pub fn disable_snapshot(&mut self) {
        self.set_mode(ViewMode::Live);
    }

    /// Recaptures the snapshot from the live result and enters snapshot
    /// mode, whatever the current mode.
    pub fn refresh_snapshot(&mut self) -> Result<()> {
        let view = self.live_view()?;
        self.set_mode(ViewMode::Snapshot(view));
        Ok(())
    }

    /// Returns true in snapshot mode.
    pub fn is_detached(&self) -> bool {
        self.mode.is_snapshot()
    }

    // ---- reads ----

    /// Returns the number of rows.
    pub fn size(&self) -> Result<usize> {
        Ok(self.active_view()?.len())
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.active_view()?.is_empty())
    }

    fn resolve(&self, view: &TableView, row_id: RowId) -> Result<Arc<Row>> {
        self.store.row(view.table(), row_id).ok_or_else(|| {
            Error::invalid_handle(format!(
                "Row {} of table {} was removed",
                row_id,
                view.table()
            ))
        })
    }

    /// Returns the row at `index`.
    ///
    /// Fails with `InvalidHandle` if a snapshot still lists a removed row.
    pub fn get(&self, index: usize) -> Result<Arc<Row>> {
        let view = self.bound_view()?;
        let row_id = view
            .get(index)
            .ok_or_else(|| Error::index_out_of_bounds(index, view.len()))?;
        self.resolve(&view, row_id)
    }

    /// Returns the first row, or `None` if empty.
    pub fn first(&self) -> Result<Option<Arc<Row>>> {
        let view = self.bound_view()?;
        view.get(0).map(|id| self.resolve(&view, id)).transpose()
    }

    /// Returns the last row, or `None` if empty.
    pub fn last(&self) -> Result<Option<Arc<Row>>> {
        let view = self.bound_view()?;
        let last = view.len().checked_sub(1).and_then(|i| view.get(i));
        last.map(|id| self.resolve(&view, id)).transpose()
    }

    /// Returns the position of `row_id`.
    pub fn index_of(&self, row_id: RowId) -> Result<Option<usize>> {
        Ok(self.active_view()?.index_of(row_id))
    }

    /// Returns true if `row_id` is part of the result.
    pub fn contains(&self, row_id: RowId) -> Result<bool> {
        Ok(self.active_view()?.contains(row_id))
    }

    /// Aggregates `column` over the rows of the active view.
    ///
    /// `Average` of an empty result is `0.0`; `Min`, `Max` and `Sum` return
    /// `None`.
    pub fn aggregate(&self, column: usize, function: AggregateFunction) -> Result<Option<Value>> {
        let view = self.bound_view()?;
        let schema = self.store.schema(self.query.table())?;
        let col = schema.column_at(column).ok_or_else(|| {
            Error::invalid_argument(format!(
                "Column {} out of range (table has {} columns)",
                column,
                schema.column_count()
            ))
        })?;

        let rows = self.store.resolve_rows(view.table(), view.rows());
        aggregate::compute(function, col, rows.iter().filter_map(|row| row.get(column)))
    }

    // ---- mutations ----

    /// Deletes every row of the active view, then refreshes the snapshot.
    pub fn clear(&mut self) -> Result<()> {
        let rows = self.bound_view()?.rows().to_vec();
        let removed = self.store.delete_rows(self.query.table(), &rows)?;
        trace!(removed, table = self.query.table(), "Cleared results");
        self.refresh_snapshot()
    }

    /// Deletes the row at `index`, then refreshes the snapshot.
    pub fn delete_at(&mut self, index: usize) -> Result<()> {
        let row_id = {
            let view = self.bound_view()?;
            view.get(index)
                .ok_or_else(|| Error::index_out_of_bounds(index, view.len()))?
        };
        self.store.delete(self.query.table(), row_id)?;
        self.refresh_snapshot()
    }

    /// Deletes the first row. Returns false if the collection is empty.
    pub fn delete_first(&mut self) -> Result<bool> {
        let first = self.bound_view()?.get(0);
        self.delete_edge(first)
    }

    /// Deletes the last row. Returns false if the collection is empty.
    pub fn delete_last(&mut self) -> Result<bool> {
        let last = {
            let view = self.bound_view()?;
            view.len().checked_sub(1).and_then(|i| view.get(i))
        };
        self.delete_edge(last)
    }

    fn delete_edge(&mut self, row_id: Option<RowId>) -> Result<bool> {
        let Some(row_id) = row_id else {
            return Ok(false);
        };
        let removed = self.store.delete_rows(self.query.table(), &[row_id])?;
        self.refresh_snapshot()?;
        Ok(removed > 0)
    }

    // ---- notifications ----

    /// Starts forwarding change notifications to `listener`.
    ///
    /// An active subscription is replaced. The weak reference to the first
    /// listener is kept for the lifetime of the collection.
    pub fn start_listening(
        &mut self,
        runtime: &Arc<dyn HostRuntime>,
        listener: &Arc<dyn ChangeListener>,
    ) -> Result<()> {
        self.bridge.listen(
            &self.store,
            &self.query,
            &self.descriptors,
            runtime,
            listener,
            &self.detached,
            self.config,
        )
    }

    /// Stops forwarding notifications. Returns true if a subscription was
    /// cancelled.
    pub fn stop_listening(&mut self) -> bool {
        self.bridge.stop()
    }

    /// Returns true while a subscription is active.
    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::schema::TableBuilder;
    use vista_core::{DataType, StoreError};

    fn dogs() -> Arc<Store> {
        let store = Store::new();
        store
            .create_table(
                TableBuilder::new("dogs")
                    .unwrap()
                    .add_column("name", DataType::String)
                    .unwrap()
                    .add_column("age", DataType::Int64)
                    .unwrap()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        store.begin_write().unwrap();
        for (name, age) in [("Rex", 3), ("Fido", 7), ("Spot", 5)] {
            store
                .insert("dogs", vec![Value::from(name), Value::Int64(age)])
                .unwrap();
        }
        store.commit_write().unwrap();
        store
    }

    fn results(store: &Arc<Store>) -> Results {
        Results::new(store.clone(), store.query("dogs").unwrap(), DescriptorSet::new()).unwrap()
    }

    #[test]
    fn test_live_reads() {
        let store = dogs();
        let results = results(&store);
        assert!(!results.is_detached());
        assert_eq!(results.size().unwrap(), 3);
        assert_eq!(results.get(1).unwrap().id(), 2);
        assert_eq!(results.first().unwrap().unwrap().id(), 1);
        assert_eq!(results.last().unwrap().unwrap().id(), 3);
        assert_eq!(results.index_of(3).unwrap(), Some(2));
        assert!(!results.contains(9).unwrap());
        assert_eq!(
            results.get(3).unwrap_err(),
            Error::IndexOutOfBounds { index: 3, size: 3 }
        );
    }

    #[test]
    fn test_snapshot_enable_is_idempotent() {
        let store = dogs();
        let mut results = results(&store);
        results.enable_snapshot().unwrap();
        let frozen = results.mode().clone();

        store.begin_write().unwrap();
        store.insert("dogs", vec![Value::from("Ace"), Value::Int64(1)]).unwrap();
        store.commit_write().unwrap();

        results.enable_snapshot().unwrap();
        assert_eq!(results.mode(), &frozen);
        assert_eq!(results.size().unwrap(), 3);

        results.refresh_snapshot().unwrap();
        assert_eq!(results.size().unwrap(), 4);

        results.disable_snapshot();
        assert!(!results.is_detached());
        assert_eq!(results.size().unwrap(), 4);
    }

    #[test]
    fn test_constructed_mid_transaction_is_detached() {
        let store = dogs();
        store.begin_write().unwrap();
        let results = results(&store);
        assert!(results.is_detached());
        store.cancel_write().unwrap();
    }

    #[test]
    fn test_sort_and_distinct_are_pure() {
        let store = dogs();
        let results = results(&store);
        let sorted = results.sort(SortDescriptor::descending(1)).unwrap();
        let ids: Vec<RowId> = sorted.active_view().unwrap().rows().to_vec();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(results.active_view().unwrap().rows(), &[1, 2, 3]);

        let distinct = results.distinct(DistinctDescriptor::new(vec![0])).unwrap();
        assert_eq!(distinct.size().unwrap(), 3);
        assert!(results.sort(SortDescriptor::ascending(5)).is_err());
    }

    #[test]
    fn test_create_snapshot_ignores_source_mode() {
        let store = dogs();
        let mut results = results(&store);
        results.enable_snapshot().unwrap();

        store.begin_write().unwrap();
        store.delete("dogs", 1).unwrap();
        store.commit_write().unwrap();

        let copy = results.create_snapshot().unwrap();
        assert!(copy.is_detached());
        assert_eq!(copy.size().unwrap(), 2);
        assert_eq!(results.size().unwrap(), 3);
        assert!(matches!(results.get(0), Err(Error::InvalidHandle { .. })));
    }

    #[test]
    fn test_delete_at_refreshes_snapshot() {
        let store = dogs();
        let mut results = results(&store);
        store.begin_write().unwrap();
        results.delete_at(1).unwrap();
        store.commit_write().unwrap();

        assert!(results.is_detached());
        assert_eq!(results.active_view().unwrap().rows(), &[1, 3]);
    }

    #[test]
    fn test_delete_requires_transaction() {
        let store = dogs();
        let mut results = results(&store);
        let err = results.delete_at(0).unwrap_err();
        assert_eq!(err, Error::Store(StoreError::NotInTransaction));
        assert!(!results.is_detached());
        assert_eq!(results.size().unwrap(), 3);
    }

    #[test]
    fn test_delete_first_last_and_clear() {
        let store = dogs();
        let mut results = results(&store);
        store.begin_write().unwrap();
        assert!(results.delete_first().unwrap());
        assert!(results.delete_last().unwrap());
        assert_eq!(results.active_view().unwrap().rows(), &[2]);

        results.clear().unwrap();
        assert_eq!(results.size().unwrap(), 0);
        store.commit_write().unwrap();

        results.disable_snapshot();
        assert!(!results.delete_first().unwrap());
        assert!(!results.delete_last().unwrap());
        assert!(!results.is_detached());
    }

    #[test]
    fn test_aggregates() {
        let store = dogs();
        let results = results(&store);
        assert_eq!(
            results.aggregate(1, AggregateFunction::Sum).unwrap(),
            Some(Value::Int64(15))
        );
        assert_eq!(
            results.aggregate(1, AggregateFunction::Average).unwrap(),
            Some(Value::Float64(5.0))
        );
        assert!(matches!(
            results.aggregate(0, AggregateFunction::Max),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            results.aggregate(4, AggregateFunction::Min),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_invalid_query_rejected() {
        let store = dogs();
        let query = store.query("dogs").unwrap();
        store.drop_table("dogs").unwrap();
        let err = Results::new(store.clone(), query, DescriptorSet::new()).err();
        assert!(matches!(err, Some(Error::InvalidHandle { .. })));
    }
}
