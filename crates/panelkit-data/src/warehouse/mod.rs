//! Warehouse access.
//!
//! The pipeline talks to its relational source through the [`Warehouse`]
//! trait: run a query and get a [`DataFrame`] back, or list the columns of a
//! table. [`SqliteWarehouse`] is the bundled backend, and
//! [`fallback::first_usable`] implements the ordered candidate lookup used by
//! every pull whose table name varies across subscriptions.

pub mod fallback;
pub mod sqlite;

pub use fallback::{first_usable, resolve_column};
pub use sqlite::SqliteWarehouse;

use crate::error::{DataError, Result};
use polars::prelude::DataFrame;
use std::fmt;

/// A `schema.table` reference with validated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Schema (library) name, e.g. `crsp`
    pub schema: String,
    /// Table name, e.g. `msf`
    pub table: String,
}

impl TableRef {
    /// Build a reference from its parts.
    pub fn new(schema: &str, table: &str) -> Result<Self> {
        Ok(Self {
            schema: validate_identifier(schema)?.to_string(),
            table: validate_identifier(table)?.to_string(),
        })
    }

    /// Parse a dotted `schema.table` name.
    pub fn parse(qualified: &str) -> Result<Self> {
        let (schema, table) = qualified
            .split_once('.')
            .ok_or_else(|| DataError::InvalidIdentifier(qualified.to_string()))?;
        Self::new(schema, table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Ensure a name is safe to splice into SQL.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(DataError::InvalidIdentifier(name.to_string()))
    }
}

/// A relational source of tabular data.
pub trait Warehouse {
    /// Run `sql` and collect the result. Columns listed in `date_cols` are
    /// parsed into polars `Date` columns.
    fn raw_sql(&self, sql: &str, date_cols: &[&str]) -> Result<DataFrame>;

    /// Lower-cased column names of `table`, in ordinal order.
    ///
    /// Returns [`DataError::TableNotFound`] when the table does not exist.
    fn table_columns(&self, table: &TableRef) -> Result<Vec<String>>;

    /// Names of the tables in `schema`.
    fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// Fetch a whole table.
    fn get_table(&self, table: &TableRef, date_cols: &[&str]) -> Result<DataFrame> {
        self.raw_sql(&format!("SELECT * FROM {}", table), date_cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_parse() {
        let t = TableRef::parse("ibes.statsumu_epsus").unwrap();
        assert_eq!(t.schema, "ibes");
        assert_eq!(t.table, "statsumu_epsus");
        assert_eq!(t.to_string(), "ibes.statsumu_epsus");
    }

    #[test]
    fn test_table_ref_rejects_injection() {
        assert!(TableRef::parse("crsp").is_err());
        assert!(TableRef::parse("crsp.msf; drop table x").is_err());
        assert!(TableRef::new("1crsp", "msf").is_err());
    }
}
