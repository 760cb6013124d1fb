use std::collections::VecDeque;

use async_trait::async_trait;
use drill_client::errors::{DrillError, Result};
use drill_client::{ConnectionBuilder, DrillTransport, PluginType, format_table};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, SERVER};
use serde_json::{Value, json};
use url::Url;

/// Replies to queries in the order they're queued.
#[derive(Debug, Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Value>>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(replies: impl IntoIterator<Item = Value>) -> Self {
        ScriptedTransport {
            replies: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent_sql(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(_, body)| body["query"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl DrillTransport for ScriptedTransport {
    async fn head(&self, _url: Url) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("Jetty(9.4)"));
        Ok(headers)
    }

    async fn get(&self, url: Url) -> Result<Value> {
        Err(DrillError::TransportError(format!("unexpected GET {url}")))
    }

    async fn post(&self, url: Url, body: Value) -> Result<Value> {
        self.sent.lock().push((url.to_string(), body));
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| DrillError::TransportError("no reply queued".to_string()))
    }
}

fn mongo_schemata() -> Value {
    json!({
        "columns": ["SCHEMA_NAME", "TYPE"],
        "rows": [{"SCHEMA_NAME": "mongo.shop", "TYPE": "mongo"}],
    })
}

#[tokio::test]
async fn mongo_columns_use_double_star() {
    let transport = ScriptedTransport::new([
        mongo_schemata(),
        mongo_schemata(),
        json!({
            "columns": ["_id", "customer"],
            "metadata": ["VARCHAR", "MAP"],
            "rows": [{"_id": "5f1", "customer": {"name": "Ana"}}],
        }),
    ]);

    let conn = ConnectionBuilder::new("localhost")
        .use_tls(false)
        .build_with_transport(transport)
        .unwrap();

    assert_eq!(Some(PluginType::Mongo), conn.plugin_type("mongo").await.unwrap());

    let columns = conn.columns("mongo", "shop", "orders").await.unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(vec!["_id", "customer"], names);
    assert_eq!("MAP", columns[1].data_type);

    let sql = conn.transport().sent_sql();
    assert_eq!(3, sql.len());
    assert_eq!("SELECT ** FROM `mongo`.`shop`.`orders` LIMIT 1", sql[2]);
}

#[tokio::test]
async fn query_failure_is_reported() {
    let transport = ScriptedTransport::new([json!({
        "errorMessage": "PARSE ERROR: Encountered \"FORM\"",
        "stackTrace": [],
    })]);
    let conn = ConnectionBuilder::new("localhost")
        .build_with_transport(transport)
        .unwrap();

    let err = conn.query("SELECT * FORM t").await.unwrap_err();
    assert_eq!("Drill Query Error: PARSE ERROR: Encountered \"FORM\"", err.to_string());
    assert_eq!("PARSE ERROR: Encountered \"FORM\"", conn.error_message());

    let sent = conn.transport().sent.lock();
    assert_eq!("https://localhost:8047/query.json", sent[0].0);
    assert_eq!(10_000, sent[0].1["autoLimit"]);
}

#[test]
fn quoting_is_public() {
    assert_eq!("dfs.`tmp`.`out.parquet`", format_table("dfs.tmp.out.parquet", true));
}
