//! Query handles bound to a table and schema version.
//!
//! A `Query` remembers the identity and schema version of the table it was
//! built against. The store refuses to evaluate it once the table has been
//! dropped, recreated or altered.

use crate::descriptor::DescriptorSet;
use crate::row_store::{RowStore, TableId};
use std::sync::Arc;
use vista_core::{Error, Result, Row, Value};

/// A filter predicate over column positions.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    All,
    /// column == value
    Eq(usize, Value),
    /// column != value
    Ne(usize, Value),
    /// column < value
    Lt(usize, Value),
    /// column <= value
    Le(usize, Value),
    /// column > value
    Gt(usize, Value),
    /// column >= value
    Ge(usize, Value),
    /// low <= column <= high
    Between(usize, Value, Value),
    /// column IS NULL
    IsNull(usize),
    /// Both predicates hold.
    And(Box<Predicate>, Box<Predicate>),
    /// Either predicate holds.
    Or(Box<Predicate>, Box<Predicate>),
    /// The predicate does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates an AND predicate.
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR predicate.
    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    /// Creates a NOT predicate.
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    /// Evaluates the predicate against a row.
    ///
    /// A null cell never satisfies a comparison; only `IsNull` matches it.
    pub fn eval(&self, row: &Row) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq(col, v) => compare(row, *col, |c| c == v),
            Predicate::Ne(col, v) => compare(row, *col, |c| c != v),
            Predicate::Lt(col, v) => compare(row, *col, |c| c < v),
            Predicate::Le(col, v) => compare(row, *col, |c| c <= v),
            Predicate::Gt(col, v) => compare(row, *col, |c| c > v),
            Predicate::Ge(col, v) => compare(row, *col, |c| c >= v),
            Predicate::Between(col, low, high) => compare(row, *col, |c| c >= low && c <= high),
            Predicate::IsNull(col) => row.get(*col).map_or(false, Value::is_null),
            Predicate::And(l, r) => l.eval(row) && r.eval(row),
            Predicate::Or(l, r) => l.eval(row) || r.eval(row),
            Predicate::Not(inner) => !inner.eval(row),
        }
    }

    /// Checks that every referenced column exists.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        let check = |col: usize| {
            if col < column_count {
                Ok(())
            } else {
                Err(Error::invalid_argument(format!(
                    "Predicate column {} out of range (table has {} columns)",
                    col, column_count
                )))
            }
        };
        match self {
            Predicate::All => Ok(()),
            Predicate::Eq(col, _)
            | Predicate::Ne(col, _)
            | Predicate::Lt(col, _)
            | Predicate::Le(col, _)
            | Predicate::Gt(col, _)
            | Predicate::Ge(col, _)
            | Predicate::Between(col, _, _)
            | Predicate::IsNull(col) => check(*col),
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.validate(column_count)?;
                r.validate(column_count)
            }
            Predicate::Not(inner) => inner.validate(column_count),
        }
    }
}

fn compare(row: &Row, col: usize, op: impl Fn(&Value) -> bool) -> bool {
    match row.get(col) {
        Some(v) if !v.is_null() => op(v),
        _ => false,
    }
}

/// A predicate bound to a table at a specific schema version.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    table: String,
    table_id: TableId,
    schema_version: u64,
    column_count: usize,
    predicate: Predicate,
}

impl Query {
    /// Creates a query matching every row of `table`.
    pub(crate) fn new(table: &RowStore) -> Self {
        Self {
            table: table.schema().name().into(),
            table_id: table.id(),
            schema_version: table.schema_version(),
            column_count: table.schema().column_count(),
            predicate: Predicate::All,
        }
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the id of the table this query was built against.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the schema version this query was built against.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Returns the number of columns the table had when the query was built.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Returns the predicate.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Returns a new query that also requires `predicate`.
    pub fn filter(&self, predicate: Predicate) -> Result<Query> {
        predicate.validate(self.column_count)?;
        let predicate = match &self.predicate {
            Predicate::All => predicate,
            existing => Predicate::and(existing.clone(), predicate),
        };
        Ok(Query {
            predicate,
            ..self.clone()
        })
    }

    /// Returns true if `row` matches the predicate.
    #[inline]
    pub fn matches(&self, row: &Row) -> bool {
        self.predicate.eval(row)
    }

    /// Checks that `table` is the same table, at the same schema version,
    /// that this query was built against.
    pub fn check_bound<'a>(&self, table: Option<&'a RowStore>) -> Result<&'a RowStore> {
        let table = table.ok_or_else(|| {
            Error::invalid_handle(format!("Table {} no longer exists", self.table))
        })?;
        if table.id() != self.table_id {
            return Err(Error::invalid_handle(format!(
                "Table {} was recreated",
                self.table
            )));
        }
        if table.schema_version() != self.schema_version {
            return Err(Error::invalid_handle(format!(
                "Schema of table {} changed",
                self.table
            )));
        }
        Ok(table)
    }

    /// Evaluates the query over `table`, then applies `descriptors`.
    pub fn evaluate(&self, table: &RowStore, descriptors: &DescriptorSet) -> Result<Vec<Arc<Row>>> {
        self.check_bound(Some(table))?;
        descriptors.validate(self.column_count)?;
        let rows: Vec<Arc<Row>> = table
            .scan()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();
        Ok(descriptors.apply(rows))
    }
}
