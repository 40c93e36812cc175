//! Table definition for Vista schemas.

use super::column::Column;
use crate::error::{Result, StoreError};
use crate::types::DataType;

/// A table definition in the store schema.
#[derive(Clone, Debug)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column definitions.
    columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        Self {
            name: name.into(),
            columns,
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column by position.
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Appends a column, returning its index.
    pub fn push_column(&mut self, column: Column) -> Result<usize> {
        check_naming_rules(column.name())?;
        if self.get_column(column.name()).is_some() {
            return Err(StoreError::invalid_schema(format!(
                "Column already exists: {}",
                column.name()
            ))
            .into());
        }
        let index = self.columns.len();
        self.columns.push(column.with_index(index));
        Ok(index)
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
        })
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(StoreError::invalid_schema(format!("Column already exists: {}", name)).into());
        }
        self.columns.push(Column::new(name, data_type));
        Ok(self)
    }

    /// Marks columns as nullable.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        if self.columns.is_empty() {
            return Err(StoreError::invalid_schema(format!(
                "Table {} has no columns",
                self.name
            ))
            .into());
        }
        Ok(Table::new(self.name, self.columns))
    }
}

/// Validates a name follows naming rules.
fn check_naming_rules(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err(StoreError::invalid_schema("Name cannot be empty").into()),
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(StoreError::invalid_schema(format!(
            "Name must start with letter or underscore: {}",
            name
        ))
        .into());
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::invalid_schema(format!(
            "Name contains invalid characters: {}",
            name
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new("users")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_column("email", DataType::String)
            .unwrap()
            .add_nullable(&["email"])
            .build()
            .unwrap();

        assert_eq!(table.name(), "users");
        assert_eq!(table.column_count(), 3);
        assert!(table.get_column("email").unwrap().is_nullable());
        assert!(!table.get_column("name").unwrap().is_nullable());
        assert_eq!(table.column_at(2).unwrap().index(), 2);
    }

    #[test]
    fn test_table_get_column() {
        let table = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .build()
            .unwrap();

        assert!(table.get_column("id").is_some());
        assert_eq!(table.get_column_index("name"), Some(1));
        assert!(table.get_column("unknown").is_none());
    }

    #[test]
    fn test_invalid_column_name() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("123invalid", DataType::Int32);

        assert!(matches!(
            result,
            Err(Error::Store(StoreError::InvalidSchema { .. }))
        ));
    }

    #[test]
    fn test_duplicate_column() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("id", DataType::Int64);

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(TableBuilder::new("empty").unwrap().build().is_err());
    }

    #[test]
    fn test_push_column() {
        let mut table = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .build()
            .unwrap();

        let index = table.push_column(Column::new("age", DataType::Int32)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(table.column_at(1).unwrap().index(), 1);
        assert!(table.push_column(Column::new("age", DataType::Int32)).is_err());
    }
}
