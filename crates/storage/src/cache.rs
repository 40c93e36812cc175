//! Table cache for the Vista store.
//!
//! This module provides the `TableCache` struct which owns every table's
//! `RowStore` and hands out stable table ids.

use crate::row_store::{RowStore, TableId};
use std::collections::BTreeMap;
use std::sync::Arc;
use vista_core::schema::Table;
use vista_core::{Result, Row, RowId, StoreError};

/// Cache for managing multiple table stores.
pub struct TableCache {
    /// Table name → RowStore mapping.
    tables: BTreeMap<String, RowStore>,
    next_table_id: TableId,
}

impl TableCache {
    /// Creates a new empty table cache.
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            next_table_id: 1,
        }
    }

    /// Creates a table in the cache and returns its id.
    pub fn create_table(&mut self, schema: Table) -> Result<TableId> {
        let name = schema.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(StoreError::TableExists { name }.into());
        }
        let id = self.next_table_id;
        self.next_table_id += 1;
        self.tables.insert(name, RowStore::new(id, schema));
        Ok(id)
    }

    /// Drops a table from the cache.
    pub fn drop_table(&mut self, name: &str) -> Result<RowStore> {
        self.tables
            .remove(name)
            .ok_or_else(|| StoreError::table_not_found(name).into())
    }

    /// Gets a reference to a table store.
    pub fn get_table(&self, name: &str) -> Option<&RowStore> {
        self.tables.get(name)
    }

    /// Gets a mutable reference to a table store.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut RowStore> {
        self.tables.get_mut(name)
    }

    /// Gets a table store or fails with `TableNotFound`.
    pub fn table(&self, name: &str) -> Result<&RowStore> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::table_not_found(name).into())
    }

    /// Gets a mutable table store or fails with `TableNotFound`.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut RowStore> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::table_not_found(name).into())
    }

    /// Returns the number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns all table names.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }

    /// Gets a row by table name and row ID.
    pub fn get_row(&self, table: &str, row_id: RowId) -> Option<Arc<Row>> {
        self.tables.get(table).and_then(|t| t.get(row_id))
    }

    /// Checks if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::schema::TableBuilder;
    use vista_core::{DataType, Error, Value};

    fn test_schema(name: &str) -> Table {
        TableBuilder::new(name)
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_cache_create_table() {
        let mut cache = TableCache::new();
        let id = cache.create_table(test_schema("users")).unwrap();
        assert!(cache.has_table("users"));
        assert_eq!(cache.get_table("users").unwrap().id(), id);
    }

    #[test]
    fn test_cache_create_duplicate_table() {
        let mut cache = TableCache::new();
        cache.create_table(test_schema("users")).unwrap();
        let result = cache.create_table(test_schema("users"));
        assert!(matches!(
            result,
            Err(Error::Store(StoreError::TableExists { .. }))
        ));
    }

    #[test]
    fn test_recreated_table_gets_new_id() {
        let mut cache = TableCache::new();
        let first = cache.create_table(test_schema("users")).unwrap();
        cache.drop_table("users").unwrap();
        let second = cache.create_table(test_schema("users")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_cache_drop_nonexistent_table() {
        let mut cache = TableCache::new();
        assert!(cache.drop_table("nonexistent").is_err());
        assert!(cache.table("nonexistent").is_err());
    }

    #[test]
    fn test_cache_insert_and_get() {
        let mut cache = TableCache::new();
        cache.create_table(test_schema("users")).unwrap();

        let row_id = cache
            .table_mut("users")
            .unwrap()
            .insert(vec![Value::Int64(1), Value::String("Alice".into())])
            .unwrap();

        assert!(cache.get_row("users", row_id).is_some());
        assert!(cache.get_row("users", row_id + 1).is_none());
        assert_eq!(cache.table_names(), vec!["users"]);
    }
}
