//! Vista Core - Core types and schema definitions for the Vista store.
//!
//! This crate provides the foundational types shared by the storage layer and
//! the live result collections built on top of it:
//!
//! - `DataType`: Supported column types (Boolean, Int32, Int64, Float64, String, DateTime, Bytes)
//! - `Value`: Runtime values that can be stored in a cell
//! - `Row`: A row of values with a stable identifier and a change version
//! - `schema`: Table schema definitions (Column, Table, TableBuilder)
//! - `Error`: The error taxonomy surfaced to callers
//!
//! # Example
//!
//! ```rust
//! use vista_core::{DataType, Value, Row};
//! use vista_core::schema::TableBuilder;
//!
//! let table = TableBuilder::new("dogs")
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .add_column("age", DataType::Int64)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.get_column_index("age"), Some(1));
//!
//! let row = Row::new(1, vec![Value::String("Rex".into()), Value::Int64(3)]);
//! assert_eq!(row.id(), 1);
//! assert_eq!(row.get(1), Some(&Value::Int64(3)));
//! ```

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result, StoreError};
pub use row::{Row, RowId};
pub use types::DataType;
pub use value::Value;
