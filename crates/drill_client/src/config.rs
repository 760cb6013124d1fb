use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DrillError, Result};

pub const DEFAULT_PORT: u16 = 8047;
pub const DEFAULT_ROW_LIMIT: u64 = 10_000;

/// Everything needed to reach a drill server.
///
/// Deserializable so applications can embed it in their own config files;
/// missing fields take the defaults below.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Stored for callers, drill's REST API is used without authentication.
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    /// Passed as `autoLimit` on every query.
    pub row_limit: u64,
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    /// Extra session options sent with every query.
    pub query_options: BTreeMap<String, Value>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            use_tls: true,
            row_limit: DEFAULT_ROW_LIMIT,
            timeout_ms: None,
            connect_timeout_ms: None,
            query_options: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("row_limit", &self.row_limit)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("query_options", &self.query_options)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn scheme(&self) -> &'static str {
        if self.use_tls { "https" } else { "http" }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DrillError::InvalidConnectionParameters(
                "host cannot be empty".to_string(),
            ));
        }
        if self.row_limit == 0 {
            return Err(DrillError::InvalidConnectionParameters(
                "row_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
