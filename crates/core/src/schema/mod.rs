//! Schema module for Vista.
//!
//! This module contains the table and column definitions a store is created
//! from. Queries and result collections refer to columns by position.

mod column;
mod table;

pub use column::Column;
pub use table::{Table, TableBuilder};
