use crate::{DatabaseResult, DbError, ForeignKeyMap, SchemaMap};

use super::Database;
use serde_json::{Value, json};
use sqlx::{Column, Connection, Row, SqliteConnection, TypeInfo};
use std::collections::HashMap;
use std::path::Path;

pub struct SqliteDatabase {
    connection: SqliteConnection,
}

impl SqliteDatabase {
    /// Open the database file read-only through a `mode=ro` URI. Writes made
    /// through this handle are rejected by SQLite itself, and a missing file
    /// is a connection error rather than a silently created empty database.
    pub async fn open_read_only(path: &Path) -> Result<Self, DbError> {
        let url = format!("sqlite://{}?mode=ro", path.display());
        let connection = SqliteConnection::connect(&url).await?;
        Ok(Self { connection })
    }
}

#[async_trait::async_trait]
impl Database for SqliteDatabase {
    async fn get_results(&mut self, query: &str) -> Result<DatabaseResult, DbError> {
        tracing::debug!(query, "executing sql");

        let rows = sqlx::query(query).fetch_all(&mut self.connection).await?;

        let mut results = DatabaseResult {
            headers: vec![],
            rows: vec![],
        };

        if let Some(first) = rows.first() {
            for col in first.columns() {
                let col_name = col.name();
                let type_name = col.type_info().name();

                results
                    .headers
                    .push((col_name.to_string(), type_name.to_string()));
            }
        } else {
            return Ok(results);
        }

        for row in rows {
            let mut row_data: Vec<Value> = Vec::new();

            for (i, col) in row.columns().iter().enumerate() {
                let type_name = col.type_info().name();
                let value: Value = match type_name {
                    "TEXT" => row
                        .try_get::<String, _>(i)
                        .map(|v| json!(v))
                        .unwrap_or(Value::Null),

                    "INTEGER" | "NUMERIC" => row
                        .try_get::<i64, _>(i)
                        .map(|v| json!(v))
                        .unwrap_or(Value::Null),

                    "REAL" => row
                        .try_get::<f64, _>(i)
                        .map(|v| json!(v))
                        .unwrap_or(Value::Null),

                    "BOOLEAN" => row
                        .try_get::<bool, _>(i)
                        .map(|v| json!(v))
                        .unwrap_or(Value::Null),

                    "DATE" => row
                        .try_get::<chrono::NaiveDate, _>(i)
                        .map(|v| json!(v.format("%Y-%m-%d").to_string()))
                        .unwrap_or(Value::Null),

                    "DATETIME" => row
                        .try_get::<chrono::NaiveDateTime, _>(i)
                        .map(|dt| json!(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
                        .unwrap_or(Value::Null),

                    "BLOB" => row
                        .try_get::<Vec<u8>, _>(i)
                        .map(|bytes| match String::from_utf8(bytes) {
                            Ok(s) => json!(s),
                            Err(_) => Value::Null,
                        })
                        .unwrap_or(Value::Null),

                    "NULL" => Value::Null,

                    _ => row
                        .try_get::<String, _>(i)
                        .map(|v| json!(v))
                        .unwrap_or(Value::Null),
                };

                row_data.push(value);
            }

            results.rows.push(row_data);
        }

        Ok(results)
    }

    async fn get_schema(&mut self) -> Result<(SchemaMap, ForeignKeyMap), DbError> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .fetch_all(&mut self.connection)
        .await?;

        let mut schema_map: SchemaMap = HashMap::new();
        let mut fk_map: ForeignKeyMap = HashMap::new();

        for table in &tables {
            let columns = sqlx::query(r#"SELECT name, "type" FROM pragma_table_info(?1)"#)
                .bind(table)
                .fetch_all(&mut self.connection)
                .await?;

            let column_list = columns
                .into_iter()
                .map(|row| (row.get::<String, _>(0), row.get::<String, _>(1)))
                .collect::<Vec<(String, String)>>();

            schema_map.insert(table.clone(), column_list);

            let fk_rows =
                sqlx::query(r#"SELECT "table", "from", "to" FROM pragma_foreign_key_list(?1)"#)
                    .bind(table)
                    .fetch_all(&mut self.connection)
                    .await?;

            for row in fk_rows {
                let referenced_table: String = row.get(0);
                let referencing_column: String = row.get(1);
                // "to" is NULL when the reference targets the parent's primary key.
                let referenced_column: Option<String> = row.try_get(2).unwrap_or(None);

                let referenced_key = match referenced_column {
                    Some(col) => format!("{referenced_table}.{col}"),
                    None => referenced_table,
                };
                let referencing_key = format!("{table}.{referencing_column}");

                fk_map
                    .entry(referenced_key)
                    .or_default()
                    .push(referencing_key);
            }
        }

        Ok((schema_map, fk_map))
    }

    fn dialect(&self) -> &'static str {
        "sqlite"
    }
}
