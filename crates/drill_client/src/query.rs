use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::errors::{DrillError, Result};
use crate::result::{ResultSet, Row};

/// Session option asking drill to include stack traces in error responses.
pub const VERBOSE_ERRORS_OPTION: &str = "drill.exec.http.rest.errors.verbose";

#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
enum QueryType {
    Sql,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryBody<'a> {
    query_type: QueryType,
    query: &'a str,
    auto_limit: u64,
    options: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    metadata: Vec<String>,

    #[allow(unused)]
    query_id: Option<String>,
    #[allow(unused)]
    query_state: Option<String>,

    error_message: Option<String>,
    stack_trace: Option<Value>,
}

/// Flatten a stack trace that drill may send as a string or a list of frames.
fn stack_trace_to_string(trace: Value) -> String {
    match trace {
        Value::String(s) => s,
        Value::Array(frames) => frames
            .into_iter()
            .map(|f| match f {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) struct Query<'a> {
    pub sql: &'a str,
    pub auto_limit: u64,
    pub options: &'a BTreeMap<String, Value>,
}

impl Query<'_> {
    pub fn body(&self) -> QueryBody<'_> {
        let mut options = self.options.clone();
        options.insert(VERBOSE_ERRORS_OPTION.to_string(), Value::Bool(true));

        QueryBody {
            query_type: QueryType::Sql,
            query: self.sql,
            auto_limit: self.auto_limit,
            options,
        }
    }

    /// Turn a decoded query response into a result, or the error drill
    /// reported for it.
    pub fn into_result(self, response: Value) -> Result<ResultSet> {
        if !response.is_object() {
            return Err(DrillError::UnexpectedResponse(format!(
                "expected a json object from the query endpoint, got: {response}"
            )));
        }

        let res: QueryResponse = serde_json::from_value(response)?;

        if let Some(message) = res.error_message {
            let stack_trace = res.stack_trace.map(stack_trace_to_string).unwrap_or_default();
            debug!(sql = %self.sql, %message, "query failed");
            trace!(%stack_trace, "query stack trace");
            return Err(DrillError::QueryError {
                message,
                stack_trace,
            });
        }

        debug!(sql = %self.sql, rows = res.rows.len(), "query succeeded");
        Ok(ResultSet::new(
            self.sql.to_string(),
            res.columns,
            res.metadata,
            res.rows,
        ))
    }
}
