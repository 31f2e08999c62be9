//! Read-only access to the records being indexed

use anyhow::{bail, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use serde_json::{Number, Value};
use std::path::Path;

use crate::types::Record;

/// Database handle for source records
///
/// Table and column names passed in must already be validated SQL identifiers.
pub struct SourceDatabase {
    conn: Connection,
}

impl SourceDatabase {
    /// Open an existing database read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an already opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Column names of a table, failing if the table does not exist
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }

        if columns.is_empty() {
            bail!("source table '{}' does not exist", table);
        }
        Ok(columns)
    }

    /// Fetch all rows of `table` satisfying every condition
    ///
    /// Conditions are raw SQL fragments; `params` bind their placeholders.
    pub fn fetch_records(
        &self,
        table: &str,
        conditions: &[String],
        params: &[SqlValue],
    ) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT * FROM {}", table);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            row_to_record(row, &columns)
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn row_to_record(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (i, column) in columns.iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::Number(n.into()),
            ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
        };
        record.insert(column.clone(), value);
    }
    Ok(record)
}

/// Convert a JSON value into a bindable SQL value
pub fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceDatabase {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE pages (uid INTEGER PRIMARY KEY, title TEXT, rating REAL, hidden INTEGER, icon BLOB);
            INSERT INTO pages VALUES (1, 'Home', 4.5, 0, x'CAFE');
            INSERT INTO pages VALUES (2, 'Hidden', NULL, 1, NULL);
            "#,
        )
        .unwrap();
        SourceDatabase::from_connection(conn)
    }

    #[test]
    fn test_table_columns() {
        let db = source();
        assert_eq!(
            db.table_columns("pages").unwrap(),
            vec!["uid", "title", "rating", "hidden", "icon"]
        );
    }

    #[test]
    fn test_table_columns_missing_table() {
        let db = source();
        let err = db.table_columns("tx_news").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_fetch_records_converts_values() {
        let db = source();
        let records = db.fetch_records("pages", &[], &[]).unwrap();
        assert_eq!(records.len(), 2);

        let home = &records[0];
        assert_eq!(home["uid"], 1);
        assert_eq!(home["title"], "Home");
        assert_eq!(home["rating"], 4.5);
        assert_eq!(home["icon"], "cafe");
        assert_eq!(records[1]["rating"], Value::Null);
    }

    #[test]
    fn test_fetch_records_with_conditions() {
        let db = source();
        let records = db
            .fetch_records(
                "pages",
                &["COALESCE(hidden, 0) = 0".to_string(), "uid >= ?1".to_string()],
                &[SqlValue::Integer(1)],
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], "Home");
    }

    #[test]
    fn test_json_to_sql() {
        assert_eq!(json_to_sql(&serde_json::json!(7)), SqlValue::Integer(7));
        assert_eq!(
            json_to_sql(&serde_json::json!("7")),
            SqlValue::Text("7".to_string())
        );
        assert_eq!(json_to_sql(&Value::Null), SqlValue::Null);
    }
}
