//! Vista Results - Live result collections for the Vista store.
//!
//! This crate provides the collection a host application holds on to:
//!
//! - `Results`: the rows matching a query, in live or snapshot mode
//! - `TableView` / `ViewMode`: the frozen and live row sequences
//! - `AggregateFunction`: min, max, sum and average over a column
//! - `ListenerBridge`: forwards store notifications to a weakly held listener
//! - `HostRuntime` / `NativeRuntime`: the weak-reference and callback seam
//! - `ResultsConfig`: per-collection options
//!
//! # Example
//!
//! ```rust
//! use vista_core::schema::TableBuilder;
//! use vista_core::{DataType, Value};
//! use vista_results::Results;
//! use vista_storage::{DescriptorSet, Store};
//!
//! let store = Store::new();
//! let schema = TableBuilder::new("dogs")
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! store.create_table(schema).unwrap();
//!
//! store.begin_write().unwrap();
//! store.insert("dogs", vec![Value::from("Rex")]).unwrap();
//! store.insert("dogs", vec![Value::from("Fido")]).unwrap();
//! store.commit_write().unwrap();
//!
//! let query = store.query("dogs").unwrap();
//! let mut results = Results::new(store.clone(), query, DescriptorSet::new()).unwrap();
//! results.enable_snapshot().unwrap();
//!
//! store.begin_write().unwrap();
//! store.delete("dogs", 1).unwrap();
//! store.commit_write().unwrap();
//!
//! assert_eq!(results.size().unwrap(), 2);
//! results.disable_snapshot();
//! assert_eq!(results.size().unwrap(), 1);
//! ```

pub mod aggregate;
pub mod bridge;
pub mod config;
pub mod results;
pub mod runtime;
pub mod view;

pub use aggregate::AggregateFunction;
pub use bridge::ListenerBridge;
pub use config::ResultsConfig;
pub use results::Results;
pub use runtime::{ChangeListener, HostRuntime, ListenerError, NativeRuntime, WeakHandle};
pub use view::{TableView, ViewMode};
