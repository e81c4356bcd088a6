pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Table name to its list of `(column, type)` pairs.
pub type SchemaMap = HashMap<String, Vec<(String, String)>>;

/// Referenced `table.column` to the columns that reference it.
pub type ForeignKeyMap = HashMap<String, Vec<String>>;

/// Trait defining the interface for database operations
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a query and return results as JSON, one row per entry with
    /// headers in the format `[column_name, column_type]`.
    async fn get_results(&mut self, query: &str) -> Result<DatabaseResult, DbError>;

    /// Get the database schema information.
    /// Returns a list of all tables and their columns as well as a list of all
    /// references from each column to each table.column as a map, where the
    /// key is the referenced column.
    async fn get_schema(&mut self) -> Result<(SchemaMap, ForeignKeyMap), DbError>;

    /// The SQL dialect spoken by this database, for prompting.
    fn dialect(&self) -> &'static str;
}

#[derive(Debug)]
pub struct DatabaseResult {
    pub headers: Vec<(String, String)>,
    pub rows: Vec<Vec<Value>>,
}
