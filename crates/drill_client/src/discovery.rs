//! Schema, table and column discovery.
//!
//! Drill exposes metadata through its information schema, but how a table
//! has to be named and described depends on the storage plugin backing it.
//! Filesystem tables are files whose names contain dots, document stores
//! and splunk can't be described and have to be probed with a `SELECT`, and
//! everything else supports `DESCRIBE`.
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::catalog::{Column, Plugin, Schema, Table};
use crate::datatype::PluginType;
use crate::errors::{DrillError, Result};
use crate::ident::{format_table, quote_literal, strip_backticks};
use crate::result::{ResultSet, Row};
use crate::{Connection, DrillTransport};

/// Schemas that always exist and never hold user data.
pub const HIDDEN_SCHEMAS: &[&str] = &[
    "cp.default",
    "INFORMATION_SCHEMA",
    "information_schema",
    "dfs.default",
    "sys",
];

/// Suffix drill gives to files backing views on filesystem plugins.
const VIEW_FILE_SUFFIX: &str = "view.drill";

/// How the columns of a table get discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnStatement {
    /// Select a single row and read the column types from the result
    /// metadata.
    Probe(String),
    /// `DESCRIBE` the table, one row per column.
    Describe(String),
}

impl ColumnStatement {
    pub fn sql(&self) -> &str {
        match self {
            Self::Probe(sql) | Self::Describe(sql) => sql,
        }
    }
}

fn plugin_type_sql(plugin: &str) -> String {
    format!(
        "SELECT SCHEMA_NAME, TYPE FROM INFORMATION_SCHEMA.`SCHEMATA` WHERE SCHEMA_NAME LIKE {} LIMIT 1",
        quote_literal(&format!("%{plugin}%"))
    )
}

fn table_names_sql(plugin_type: Option<&PluginType>, schema_path: &str) -> String {
    match plugin_type {
        Some(PluginType::File) => format!(
            "SELECT FILE_NAME FROM information_schema.`files` WHERE SCHEMA_NAME = {} AND IS_FILE = true",
            quote_literal(schema_path)
        ),
        _ => format!(
            "SELECT `TABLE_NAME` FROM INFORMATION_SCHEMA.`TABLES` WHERE `TABLE_SCHEMA` = {}",
            quote_literal(schema_path)
        ),
    }
}

fn view_names_sql(schema_path: &str) -> String {
    format!(
        "SELECT `TABLE_NAME` FROM INFORMATION_SCHEMA.views WHERE table_schema = {}",
        quote_literal(schema_path)
    )
}

fn string_field<'a>(row: &'a Row, field: &str) -> Option<&'a str> {
    row.get(field).and_then(Value::as_str)
}

/// Pull table names out of the rows returned by [`table_names_sql`].
///
/// View files are left out for filesystem plugins, other plugins list views
/// as tables so only the suffix is removed.
fn collect_table_names(plugin_type: Option<&PluginType>, rows: &[Row]) -> Vec<String> {
    match plugin_type {
        Some(PluginType::File) => rows
            .iter()
            .filter_map(|row| string_field(row, "FILE_NAME"))
            .filter(|name| !name.contains(VIEW_FILE_SUFFIX))
            .map(str::to_string)
            .collect(),
        _ => rows
            .iter()
            .filter_map(|row| string_field(row, "TABLE_NAME"))
            .map(|name| name.strip_suffix(VIEW_FILE_SUFFIX).unwrap_or(name))
            .map(str::to_string)
            .collect(),
    }
}

/// Pick the statement used to find the columns of `plugin.schema.table`.
///
/// `views` only matters for filesystem and splunk plugins, where a view has
/// to be selected from by its view name rather than a file path.
pub fn column_statement(
    plugin_type: Option<&PluginType>,
    plugin: &str,
    schema: &str,
    table: &str,
    views: &[String],
) -> ColumnStatement {
    let path = format!("{plugin}.{schema}.{table}");

    match plugin_type {
        Some(PluginType::Mongo) => {
            // `**` makes drill expand nested documents into columns.
            ColumnStatement::Probe(format!("SELECT ** FROM {} LIMIT 1", format_table(&path, false)))
        }
        Some(PluginType::File | PluginType::Splunk) if views.iter().any(|v| v == table) => {
            ColumnStatement::Probe(format!(
                "SELECT * FROM `{}.{}`.`{}` LIMIT 1",
                strip_backticks(plugin),
                strip_backticks(schema),
                strip_backticks(table),
            ))
        }
        Some(PluginType::Splunk) => {
            ColumnStatement::Probe(format!("SELECT * FROM {} LIMIT 1", format_table(&path, false)))
        }
        Some(PluginType::File) => {
            ColumnStatement::Probe(format!("SELECT * FROM {} LIMIT 1", format_table(&path, true)))
        }
        // Callers may hand over a subquery in place of a table name.
        _ if table.contains("SELECT") => {
            ColumnStatement::Probe(format!("SELECT * FROM {table} LIMIT 1"))
        }
        _ => ColumnStatement::Describe(format!("DESCRIBE {}", format_table(&path, false))),
    }
}

/// Whether a `DESCRIBE` nullability value means nullable.
fn is_nullable(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "YES",
        _ => false,
    }
}

/// Group dotted schema names under their plugin.
///
/// Names without a dot are plugins without workspaces and are skipped.
fn build_schema_tree(names: &[String]) -> Vec<Plugin> {
    let mut plugins: BTreeMap<&str, Plugin> = BTreeMap::new();

    for name in names {
        let Some((plugin, schema)) = name.split_once('.') else {
            continue;
        };
        plugins
            .entry(plugin)
            .or_insert_with(|| Plugin {
                name: plugin.to_string(),
                schemas: Vec::new(),
            })
            .schemas
            .push(Schema {
                plugin: plugin.to_string(),
                name: schema.to_string(),
                tables: Vec::new(),
            });
    }

    plugins.into_values().collect()
}

impl<T: DrillTransport> Connection<T> {
    /// Look up the type of a storage plugin.
    ///
    /// Returns `None` when drill isn't reachable, the name is empty, or no
    /// schema matches the name.
    pub async fn plugin_type(&self, plugin: &str) -> Result<Option<PluginType>> {
        let plugin = strip_backticks(plugin);
        if plugin.is_empty() || !self.is_active().await {
            return Ok(None);
        }

        let mut res = self.query(&plugin_type_sql(&plugin)).await?;
        let plugin_type = res
            .fetch_next_row()
            .and_then(|row| string_field(row, "TYPE"))
            .map(PluginType::from);

        debug!(%plugin, plugin_type = ?plugin_type, "resolved plugin type");
        Ok(plugin_type)
    }

    /// Names of all schemas except drill's built in ones.
    ///
    /// Returns `None` when drill isn't reachable or lists no schemas at all.
    pub async fn schema_names(&self) -> Result<Option<Vec<String>>> {
        if !self.is_active().await {
            return Ok(None);
        }

        let res = self.query("SHOW DATABASES").await?;
        if res.row_count() == 0 {
            self.set_error_message("Error retrieving schema names");
            return Ok(None);
        }

        let names = res
            .fetch_all_rows()
            .iter()
            .filter_map(|row| string_field(row, "SCHEMA_NAME"))
            .filter(|name| !HIDDEN_SCHEMAS.contains(name))
            .map(str::to_string)
            .collect();
        Ok(Some(names))
    }

    /// Schemas grouped by the plugin they belong to, ordered by plugin name.
    pub async fn schema_tree(&self) -> Result<Option<Vec<Plugin>>> {
        let names = self.schema_names().await?;
        Ok(names.map(|names| build_schema_tree(&names)))
    }

    /// Names of the tables in a schema.
    ///
    /// For filesystem plugins these are the files in the workspace, views
    /// are left out (see [`Connection::view_names`]). An unreachable server
    /// is an error here, not an empty list.
    pub async fn table_names(&self, plugin: &str, schema: &str) -> Result<Vec<String>> {
        let plugin = strip_backticks(plugin);
        let schema = strip_backticks(schema);
        let plugin_type = self.plugin_type(&plugin).await?;

        let sql = table_names_sql(plugin_type.as_ref(), &format!("{plugin}.{schema}"));
        let res = self.query(&sql).await?;

        Ok(collect_table_names(
            plugin_type.as_ref(),
            res.fetch_all_rows(),
        ))
    }

    pub async fn tables(&self, plugin: &str, schema: &str) -> Result<Vec<Table>> {
        let tables = self
            .table_names(plugin, schema)
            .await?
            .into_iter()
            .map(|name| Table {
                schema: schema.to_string(),
                name,
                columns: Vec::new(),
            })
            .collect();
        Ok(tables)
    }

    /// Names of the views in a schema, `None` if drill isn't reachable.
    pub async fn view_names(&self, plugin: &str, schema: &str) -> Result<Option<Vec<String>>> {
        if !self.is_active().await {
            return Ok(None);
        }

        let path = format!("{}.{}", strip_backticks(plugin), strip_backticks(schema));
        let res = self.query(&view_names_sql(&path)).await?;

        let names = res
            .fetch_all_rows()
            .iter()
            .filter_map(|row| string_field(row, "TABLE_NAME"))
            .map(str::to_string)
            .collect();
        Ok(Some(names))
    }

    /// Discover the columns of a table.
    pub async fn columns(&self, plugin: &str, schema: &str, table: &str) -> Result<Vec<Column>> {
        let plugin_type = self.plugin_type(plugin).await?;

        let views = match plugin_type {
            Some(PluginType::File | PluginType::Splunk) => {
                self.view_names(plugin, schema).await?.unwrap_or_default()
            }
            _ => Vec::new(),
        };

        let statement = column_statement(plugin_type.as_ref(), plugin, schema, table, &views);
        debug!(%plugin, %schema, %table, sql = %statement.sql(), "discovering columns");

        let res = self.query(statement.sql()).await?;
        let column = |name: String, data_type: String, is_nullable: bool| Column {
            plugin: plugin.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            name,
            data_type,
            is_nullable,
        };

        match statement {
            // Result metadata carries no nullability, assume anything goes.
            ColumnStatement::Probe(_) => Ok(res
                .schema()
                .iter()
                .map(|f| column(f.column.clone(), f.data_type.clone(), true))
                .collect()),
            ColumnStatement::Describe(_) => Ok(describe_columns(&res)?
                .into_iter()
                .map(|(name, data_type, nullable)| column(name, data_type, nullable))
                .collect()),
        }
    }
}

/// Read `(name, type, nullable)` triples from a `DESCRIBE` result.
fn describe_columns(res: &ResultSet) -> Result<Vec<(String, String, bool)>> {
    res.fetch_all_rows()
        .iter()
        .map(|row| {
            let name = string_field(row, "COLUMN_NAME").ok_or_else(|| {
                DrillError::UnexpectedResponse(format!(
                    "missing COLUMN_NAME in result of '{}'",
                    res.query()
                ))
            })?;
            let data_type = string_field(row, "DATA_TYPE").unwrap_or_default();
            Ok((
                name.to_string(),
                data_type.to_string(),
                is_nullable(row.get("IS_NULLABLE")),
            ))
        })
        .collect()
}
