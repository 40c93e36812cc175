//! Sort and distinct descriptors applied on top of a query result.

use core::cmp::Ordering;
use hashbrown::HashSet;
use std::sync::Arc;
use vista_core::{Error, Result, Row, Value};

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Ordered list of (column, direction) keys.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SortDescriptor {
    keys: Vec<(usize, SortOrder)>,
}

impl SortDescriptor {
    /// Creates a sort descriptor from explicit keys.
    pub fn new(keys: Vec<(usize, SortOrder)>) -> Self {
        Self { keys }
    }

    /// Sorts ascending by a single column.
    pub fn ascending(column: usize) -> Self {
        Self::new(vec![(column, SortOrder::Asc)])
    }

    /// Sorts descending by a single column.
    pub fn descending(column: usize) -> Self {
        Self::new(vec![(column, SortOrder::Desc)])
    }

    /// Adds a tie-breaking key.
    pub fn then(mut self, column: usize, order: SortOrder) -> Self {
        self.keys.push((column, order));
        self
    }

    /// Returns the sort keys.
    pub fn keys(&self) -> &[(usize, SortOrder)] {
        &self.keys
    }

    /// Checks that every key refers to an existing column.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        check_columns(self.keys.iter().map(|(col, _)| *col), column_count, "Sort")
    }

    /// Compares two rows by the sort keys. Null sorts before any value.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        for (col, order) in &self.keys {
            let cmp = match (a.get(*col), b.get(*col)) {
                (Some(av), Some(bv)) => av.cmp(bv),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if cmp != Ordering::Equal {
                return match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                };
            }
        }
        Ordering::Equal
    }

    /// Stable-sorts `rows` in place.
    pub fn apply(&self, rows: &mut [Arc<Row>]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

/// Columns whose combined values must be unique in the result.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DistinctDescriptor {
    columns: Vec<usize>,
}

impl DistinctDescriptor {
    /// Creates a distinct descriptor over the given columns.
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Checks that every column exists.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        check_columns(self.columns.iter().copied(), column_count, "Distinct")
    }

    /// Keeps the first row of each distinct value tuple, preserving order.
    pub fn apply(&self, rows: Vec<Arc<Row>>) -> Vec<Arc<Row>> {
        let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(rows.len());
        rows.into_iter()
            .filter(|row| {
                let key = self
                    .columns
                    .iter()
                    .map(|col| row.get(*col).cloned().unwrap_or(Value::Null))
                    .collect();
                seen.insert(key)
            })
            .collect()
    }
}

/// Sort and distinct rules attached to a result collection.
///
/// Sorting runs first, so distinct keeps the first row in sorted order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DescriptorSet {
    sort: Option<SortDescriptor>,
    distinct: Option<DistinctDescriptor>,
}

impl DescriptorSet {
    /// Creates an empty descriptor set (row-id order, no deduplication).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the sort descriptor.
    pub fn with_sort(mut self, sort: SortDescriptor) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Replaces the distinct descriptor.
    pub fn with_distinct(mut self, distinct: DistinctDescriptor) -> Self {
        self.distinct = Some(distinct);
        self
    }

    /// Returns the sort descriptor, if any.
    pub fn sort(&self) -> Option<&SortDescriptor> {
        self.sort.as_ref()
    }

    /// Returns the distinct descriptor, if any.
    pub fn distinct(&self) -> Option<&DistinctDescriptor> {
        self.distinct.as_ref()
    }

    /// Returns true if neither sort nor distinct is set.
    pub fn is_empty(&self) -> bool {
        self.sort.is_none() && self.distinct.is_none()
    }

    /// Checks every descriptor against the column count.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        if let Some(sort) = &self.sort {
            sort.validate(column_count)?;
        }
        if let Some(distinct) = &self.distinct {
            distinct.validate(column_count)?;
        }
        Ok(())
    }

    /// Applies sort then distinct.
    pub fn apply(&self, mut rows: Vec<Arc<Row>>) -> Vec<Arc<Row>> {
        if let Some(sort) = &self.sort {
            sort.apply(&mut rows);
        }
        match &self.distinct {
            Some(distinct) => distinct.apply(rows),
            None => rows,
        }
    }
}

fn check_columns(
    columns: impl Iterator<Item = usize>,
    column_count: usize,
    what: &str,
) -> Result<()> {
    for col in columns {
        if col >= column_count {
            return Err(Error::invalid_argument(format!(
                "{} column {} out of range (table has {} columns)",
                what, col, column_count
            )));
        }
    }
    Ok(())
}
