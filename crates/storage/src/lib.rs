//! Vista Storage - Embedded transactional store for Vista.
//!
//! This crate provides the store that live result collections observe:
//!
//! - `RowStore`: Row storage for a single table
//! - `TableCache`: Multi-table cache management
//! - `Journal`: Change tracking for transactions
//! - `Transaction`: Write transactions with rollback support
//! - `Query` / `Predicate`: Query handles bound to a table and schema version
//! - `DescriptorSet`: Sort and distinct rules applied to a query result
//! - `ChangeSet`: Positional changes between two states of a result
//! - `Store`: The versioned session with its notification pump
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vista_core::schema::TableBuilder;
//! use vista_core::{DataType, Value};
//! use vista_storage::{ChangeSet, DescriptorSet, Store};
//!
//! let store = Store::new();
//! let schema = TableBuilder::new("users")
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! store.create_table(schema).unwrap();
//!
//! let query = store.query("users").unwrap();
//! let token = store
//!     .register_notification(&query, &DescriptorSet::new(), Arc::new(|_: &ChangeSet| {}))
//!     .unwrap();
//!
//! store.begin_write().unwrap();
//! store.insert("users", vec![Value::from("Alice")]).unwrap();
//! store.commit_write().unwrap();
//!
//! assert_eq!(store.advance_to_latest().unwrap(), 1);
//! assert_eq!(store.row_count(&query).unwrap(), 1);
//! drop(token);
//! ```

pub mod cache;
pub mod change_set;
pub mod descriptor;
pub mod journal;
pub mod notify;
pub mod query;
pub mod row_store;
pub mod store;
pub mod transaction;

pub use cache::TableCache;
pub use change_set::{ChangeSet, ObservedRow};
pub use descriptor::{DescriptorSet, DistinctDescriptor, SortDescriptor, SortOrder};
pub use journal::{Journal, JournalEntry};
pub use notify::{NotificationCallback, NotificationToken, NotifierId};
pub use query::{Predicate, Query};
pub use row_store::{RowStore, TableId};
pub use store::{Store, StoreConfig, Version};
pub use transaction::{Transaction, TransactionId, TransactionState};
