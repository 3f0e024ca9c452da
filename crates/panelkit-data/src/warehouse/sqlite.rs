//! SQLite-backed warehouse.
//!
//! Each WRDS library (`crsp`, `comp`, `ibes`, `wrdsapps`, `ff`, ...) lives in
//! its own database file `<schema>.db` and is attached under the schema name,
//! so queries written against `schema.table` run unchanged.

use super::{TableRef, Warehouse, validate_identifier};
use crate::dates::{date_column, parse_date};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::path::Path;
use tracing::{debug, info};

/// Warehouse over a set of attached SQLite databases.
#[derive(Debug)]
pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    /// Open a warehouse directory, attaching every `*.db` file as a schema
    /// named after the file stem.
    ///
    /// # Arguments
    /// * `dir` - Directory containing one database file per schema
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let warehouse = Self::in_memory()?;

        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "db"))
            .collect();
        entries.sort();

        for path in entries {
            if let Some(schema) = path.file_stem().and_then(|s| s.to_str()) {
                warehouse.attach_schema(schema, &path)?;
            }
        }

        Ok(warehouse)
    }

    /// Create an empty in-memory warehouse (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Attach a database file under `schema`.
    pub fn attach_schema(&self, schema: &str, path: &Path) -> Result<()> {
        let schema = validate_identifier(schema)?;
        let path = path
            .to_str()
            .ok_or_else(|| DataError::Config(format!("Non UTF-8 path: {}", path.display())))?;
        self.conn
            .execute(&format!("ATTACH DATABASE ?1 AS {}", schema), [path])?;
        info!(schema, path, "attached warehouse schema");
        Ok(())
    }

    /// Attach an empty in-memory database under `schema`.
    pub fn attach_memory_schema(&self, schema: &str) -> Result<()> {
        let schema = validate_identifier(schema)?;
        self.conn
            .execute(&format!("ATTACH DATABASE ':memory:' AS {}", schema), [])?;
        Ok(())
    }

    /// Run a batch of statements, e.g. DDL and fixture inserts.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Warehouse for SqliteWarehouse {
    fn raw_sql(&self, sql: &str, date_cols: &[&str]) -> Result<DataFrame> {
        debug!(sql, "running warehouse query");

        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        let mut values: Vec<ColumnValues> = names.iter().map(|_| ColumnValues::default()).collect();

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in values.iter_mut().enumerate() {
                column.push(row.get_ref(idx)?)?;
            }
        }

        let columns = names
            .iter()
            .zip(values)
            .map(|(name, column)| column.into_column(name, date_cols.contains(&name.as_str())))
            .collect::<Result<Vec<_>>>()?;

        Ok(DataFrame::new(columns)?)
    }

    fn table_columns(&self, table: &TableRef) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "PRAGMA {}.table_info({})",
            table.schema, table.table
        ))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(DataError::TableNotFound(table.to_string()));
        }
        Ok(columns.into_iter().map(|c| c.to_lowercase()).collect())
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let schema = validate_identifier(schema)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name FROM {}.sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
            schema
        ))?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tables)
    }
}

/// Values of one result column, typed by the first non-null value and
/// widened (integer to real, anything to text) as later values require.
#[derive(Debug)]
enum ColumnValues {
    Null(usize),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Default for ColumnValues {
    fn default() -> Self {
        Self::Null(0)
    }
}

impl ColumnValues {
    fn push(&mut self, value: ValueRef<'_>) -> Result<()> {
        match value {
            ValueRef::Null => match self {
                Self::Null(n) => *n += 1,
                Self::Int(v) => v.push(None),
                Self::Float(v) => v.push(None),
                Self::Text(v) => v.push(None),
            },
            ValueRef::Integer(i) => match self {
                Self::Null(n) => {
                    let mut v = vec![None; *n];
                    v.push(Some(i));
                    *self = Self::Int(v);
                }
                Self::Int(v) => v.push(Some(i)),
                Self::Float(v) => v.push(Some(i as f64)),
                Self::Text(v) => v.push(Some(i.to_string())),
            },
            ValueRef::Real(f) => match self {
                Self::Null(n) => {
                    let mut v = vec![None; *n];
                    v.push(Some(f));
                    *self = Self::Float(v);
                }
                Self::Int(v) => {
                    let mut widened: Vec<Option<f64>> =
                        v.iter().map(|x| x.map(|x| x as f64)).collect();
                    widened.push(Some(f));
                    *self = Self::Float(widened);
                }
                Self::Float(v) => v.push(Some(f)),
                Self::Text(v) => v.push(Some(f.to_string())),
            },
            ValueRef::Text(bytes) => {
                let s = String::from_utf8_lossy(bytes).into_owned();
                match self {
                    Self::Text(v) => v.push(Some(s)),
                    other => {
                        let mut v = other.to_text();
                        v.push(Some(s));
                        *other = Self::Text(v);
                    }
                }
            }
            ValueRef::Blob(_) => {
                return Err(DataError::Parse(
                    "Blob values are not supported in query results".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn to_text(&self) -> Vec<Option<String>> {
        match self {
            Self::Null(n) => vec![None; *n],
            Self::Int(v) => v.iter().map(|x| x.map(|x| x.to_string())).collect(),
            Self::Float(v) => v.iter().map(|x| x.map(|x| x.to_string())).collect(),
            Self::Text(v) => v.clone(),
        }
    }

    fn into_column(self, name: &str, is_date: bool) -> Result<Column> {
        if is_date {
            let dates: Vec<Option<NaiveDate>> = match &self {
                Self::Null(n) => vec![None; *n],
                Self::Text(v) => v
                    .iter()
                    .map(|s| s.as_deref().and_then(parse_date))
                    .collect(),
                Self::Int(v) => v
                    .iter()
                    .map(|x| x.and_then(|x| parse_date(&x.to_string())))
                    .collect(),
                Self::Float(_) => {
                    return Err(DataError::Parse(format!(
                        "Column {} holds real values and cannot be read as dates",
                        name
                    )));
                }
            };
            return Ok(date_column(name, &dates)?);
        }

        let column = match self {
            Self::Null(n) => Series::full_null(name.into(), n, &DataType::Float64).into(),
            Self::Int(v) => Column::new(name.into(), v),
            Self::Float(v) => Column::new(name.into(), v),
            Self::Text(v) => Column::new(name.into(), v),
        };
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse() -> SqliteWarehouse {
        let wh = SqliteWarehouse::in_memory().unwrap();
        wh.attach_memory_schema("crsp").unwrap();
        wh.execute_batch(
            "CREATE TABLE crsp.msf (permno INTEGER, date TEXT, ret REAL, prc);
             INSERT INTO crsp.msf VALUES (10001, '2021-01-29', 0.05, 12);
             INSERT INTO crsp.msf VALUES (10001, '2021-02-26', NULL, 12.5);
             INSERT INTO crsp.msf VALUES (10002, '2021-01-29', -0.02, NULL);",
        )
        .unwrap();
        wh
    }

    #[test]
    fn test_raw_sql_types() {
        let wh = warehouse();
        let df = wh
            .raw_sql("SELECT * FROM crsp.msf ORDER BY permno, date", &["date"])
            .unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.column("permno").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("ret").unwrap().dtype(), &DataType::Float64);
        // Integer then real widens to float
        assert_eq!(df.column("prc").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("ret").unwrap().null_count(), 1);
    }

    #[test]
    fn test_table_columns_and_missing_table() {
        let wh = warehouse();
        let cols = wh.table_columns(&TableRef::parse("crsp.msf").unwrap()).unwrap();
        assert_eq!(cols, vec!["permno", "date", "ret", "prc"]);

        let missing = wh.table_columns(&TableRef::parse("crsp.msenames").unwrap());
        assert!(matches!(missing, Err(DataError::TableNotFound(_))));
    }

    #[test]
    fn test_list_tables() {
        let wh = warehouse();
        assert_eq!(wh.list_tables("crsp").unwrap(), vec!["msf"]);
    }

    #[test]
    fn test_query_error_surfaces() {
        let wh = warehouse();
        assert!(wh.raw_sql("SELECT * FROM crsp.nope", &[]).is_err());
    }

    #[test]
    fn test_empty_result_has_columns() {
        let wh = warehouse();
        let df = wh
            .raw_sql("SELECT permno, date FROM crsp.msf WHERE permno = 0", &["date"])
            .unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.get_column_names().len(), 2);
    }
}
