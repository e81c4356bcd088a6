//! The SQL toolkit exposed to the agent: list tables, describe their schema,
//! run a query. Results and failures are rendered as plain text for the model.

use agent::{HashMap, Tool, ToolExecutor, Value, create_tool, json};
use comfy_table::Table;
use comfy_table::presets::ASCII_MARKDOWN;
use db::Database;

pub fn toolkit_tools() -> Vec<Tool> {
    vec![list_tables_tool(), describe_tables_tool(), run_query_tool()]
}

fn list_tables_tool() -> Tool {
    let parameters: HashMap<String, Value> = serde_json::from_value(json!({
        "type": "object",
        "properties": {},
    }))
    .expect("Invalid tool parameters");

    create_tool(
        "list_tables",
        "List the names of all tables in the database. Always call this first to see what you can query.",
        parameters,
    )
}

fn describe_tables_tool() -> Tool {
    let parameters: HashMap<String, Value> = serde_json::from_value(json!({
        "type": "object",
        "properties": {
            "tables": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Table names to describe. Omit to describe every table.",
            },
        },
    }))
    .expect("Invalid tool parameters");

    create_tool(
        "describe_tables",
        "Return the columns and types of the given tables, plus any foreign key references between them.",
        parameters,
    )
}

fn run_query_tool() -> Tool {
    let parameters: HashMap<String, Value> = serde_json::from_value(json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The SQL query to execute against the database.",
            },
        },
        "required": ["query"],
    }))
    .expect("Invalid tool parameters");

    create_tool(
        "run_query",
        "Execute a SQL query against the current database connection and return the resulting rows.",
        parameters,
    )
}

/// Dispatches the agent's tool calls against the read-only database handle.
pub struct SqlToolkit {
    database: Box<dyn Database>,
}

impl SqlToolkit {
    pub fn new(database: Box<dyn Database>) -> Self {
        Self { database }
    }

    async fn list_tables(&mut self) -> Result<String, String> {
        let (schema, _) = self
            .database
            .get_schema()
            .await
            .map_err(|e| e.to_string())?;

        let mut names: Vec<String> = schema.into_keys().collect();
        names.sort();

        if names.is_empty() {
            Ok("The database has no tables.".to_string())
        } else {
            Ok(names.join(", "))
        }
    }

    async fn describe_tables(&mut self, arguments: &Value) -> Result<String, String> {
        let requested: Option<Vec<&str>> = arguments
            .get("tables")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect());

        let (schema, foreign_keys) = self
            .database
            .get_schema()
            .await
            .map_err(|e| e.to_string())?;

        let mut tables: Vec<(&String, &Vec<(String, String)>)> = schema
            .iter()
            .filter(|(name, _)| {
                requested
                    .as_ref()
                    .is_none_or(|wanted| wanted.contains(&name.as_str()))
            })
            .collect();
        tables.sort_by(|a, b| a.0.cmp(b.0));

        if tables.is_empty() {
            return Err("no matching tables".to_string());
        }

        let mut description = String::new();
        for (name, columns) in tables {
            let column_list = columns
                .iter()
                .map(|(column, kind)| format!("{column} {kind}"))
                .collect::<Vec<_>>()
                .join(", ");
            description.push_str(&format!("{name}({column_list})\n"));
        }

        let mut references: Vec<(&String, &Vec<String>)> = foreign_keys.iter().collect();
        references.sort_by(|a, b| a.0.cmp(b.0));
        for (referenced, referencing) in references {
            description.push_str(&format!(
                "{referenced} is referenced by {}\n",
                referencing.join(", ")
            ));
        }

        Ok(description)
    }

    async fn run_query(&mut self, query: &str) -> Result<String, String> {
        let result = self
            .database
            .get_results(query)
            .await
            .map_err(|e| e.to_string())?;

        if result.headers.is_empty() {
            return Ok("The query returned no rows.".to_string());
        }

        let mut table = Table::new();
        table.load_preset(ASCII_MARKDOWN);
        table.set_header(result.headers.iter().map(|(name, _)| name.clone()));
        for row in &result.rows {
            table.add_row(row.iter().map(render_value));
        }

        Ok(table.to_string())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl ToolExecutor for SqlToolkit {
    async fn execute(&mut self, name: &str, arguments: &Value) -> Result<String, String> {
        match name {
            "list_tables" => self.list_tables().await,
            "describe_tables" => self.describe_tables(arguments).await,
            "run_query" => {
                let query = arguments
                    .get("query")
                    .and_then(Value::as_str)
                    .ok_or("run_query needs a 'query' string argument")?;
                self.run_query(query).await
            }
            other => Err(format!("unknown tool: {other}")),
        }
    }
}
