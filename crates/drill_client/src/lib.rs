//! Client for the Apache Drill REST API.
//!
//! Queries are submitted to `/query.json` and returned as a [`ResultSet`].
//! On top of that the [`Connection`] manages storage plugins and discovers
//! schemas, tables and columns through drill's information schema, choosing
//! the right quoting for each plugin type.
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub use crate::catalog::{Column, Plugin, Schema, Table};
pub use crate::config::{ConnectionConfig, DEFAULT_PORT, DEFAULT_ROW_LIMIT};
pub use crate::datatype::PluginType;
pub use crate::discovery::{ColumnStatement, HIDDEN_SCHEMAS, column_statement};
use crate::errors::{DrillError, Result};
pub use crate::ident::{format_table, quote_literal};
use crate::query::Query;
pub use crate::req::{DrillTransport, HttpTransport, HttpTransportBuilder};
pub use crate::result::{ResultSet, Row, SchemaField, clean_type_name};
pub use crate::storage::StoragePlugin;

mod catalog;
mod config;
mod discovery;
mod ident;
mod plugins;
mod query;
mod req;
mod result;
mod storage;

pub mod datatype;
pub mod errors;

pub(crate) const ENDPOINTS: Endpoints = Endpoints {
    query: "query.json",
    storage: "storage.json",
    storage_dir: "storage",
};

#[derive(Debug)]
pub(crate) struct Endpoints {
    pub query: &'static str,
    pub storage: &'static str,
    pub storage_dir: &'static str,
}

#[derive(Debug)]
pub struct ConnectionBuilder {
    config: ConnectionConfig,
}

macro_rules! builder_fn {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, $name: $ty) -> Self {
            self.config.$name = $name;
            self
        }
    };
}

impl ConnectionBuilder {
    builder_fn! {port, u16}

    builder_fn! {username, String}

    builder_fn! {password, String}

    builder_fn! {use_tls, bool}

    builder_fn! {row_limit, u64}

    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: ConnectionConfig {
                host: host.into(),
                ..Default::default()
            },
        }
    }

    pub fn from_config(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(duration_millis(timeout));
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout_ms = Some(duration_millis(connect_timeout));
        self
    }

    /// Set a session option sent along with every query.
    pub fn query_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.query_options.insert(key.into(), value.into());
        self
    }

    /// Build a connection using the default reqwest transport.
    pub fn build(self) -> Result<Connection<HttpTransport>> {
        let mut transport = HttpTransport::builder();
        if let Some(timeout) = self.config.timeout() {
            transport = transport.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout() {
            transport = transport.connect_timeout(connect_timeout);
        }
        let transport = transport.build()?;
        self.build_with_transport(transport)
    }

    /// Build a connection that sends requests through `transport`.
    pub fn build_with_transport<T: DrillTransport>(self, transport: T) -> Result<Connection<T>> {
        self.config.validate()?;
        let base_url = Url::parse(&self.config.base_url())?;

        Ok(Connection {
            config: self.config,
            base_url,
            transport,
            state: Mutex::new(SessionState::default()),
        })
    }
}

/// Milliseconds in `d`, saturating at `u64::MAX`.
fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Mutable bits of a connection: plugin caches and the last error.
#[derive(Debug, Default)]
struct SessionState {
    cached_plugins: Option<Vec<String>>,
    cached_enabled_plugins: Option<Vec<String>>,
    error_message: Option<String>,
    stack_trace: Option<String>,
}

/// A handle to a single drill server.
///
/// No network traffic happens until a method is called, every method is one
/// or a few sequential requests.
#[derive(Debug)]
pub struct Connection<T: DrillTransport = HttpTransport> {
    config: ConnectionConfig,
    base_url: Url,
    transport: T,
    state: Mutex<SessionState>,
}

impl Connection<HttpTransport> {
    pub fn builder(host: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(host)
    }
}

impl<T: DrillTransport> Connection<T> {
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build a url below the base url from unescaped path segments.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DrillError::InvalidConnectionParameters(format!(
                    "{} cannot be used as a base url",
                    self.base_url
                ))
            })?
            .clear()
            .extend(segments);
        Ok(url)
    }

    /// Check whether the server answers at all.
    ///
    /// Any response carrying headers counts, regardless of status. Errors
    /// are never returned, an unreachable server is just inactive.
    pub async fn is_active(&self) -> bool {
        match self.transport.head(self.base_url.clone()).await {
            Ok(headers) => !headers.is_empty(),
            Err(e) => {
                debug!(url = %self.base_url, %e, "drill not reachable");
                false
            }
        }
    }

    /// Like [`Connection::is_active`] but returns an error when the server
    /// can't be reached.
    pub async fn check_active(&self) -> Result<()> {
        if self.is_active().await {
            Ok(())
        } else {
            Err(DrillError::NotActive(self.base_url.to_string()))
        }
    }

    /// Execute a sql query.
    ///
    /// Errors reported by drill are returned as [`DrillError::QueryError`]
    /// and also kept as this connection's last error.
    pub async fn query(&self, sql: &str) -> Result<ResultSet> {
        let q = Query {
            sql,
            auto_limit: self.config.row_limit,
            options: &self.config.query_options,
        };

        let body = serde_json::to_value(q.body())?;
        let res = self
            .transport
            .post(self.endpoint(&[ENDPOINTS.query])?, body)
            .await
            .and_then(|res| q.into_result(res));

        let mut state = self.state.lock();
        match &res {
            Ok(_) => {
                state.error_message = None;
                state.stack_trace = None;
            }
            Err(DrillError::QueryError {
                message,
                stack_trace,
            }) => {
                state.error_message = Some(message.clone());
                state.stack_trace = Some(stack_trace.clone());
            }
            Err(e) => {
                state.error_message = Some(e.to_string());
                state.stack_trace = None;
            }
        }

        res
    }

    /// Message of the most recent error, empty if the last query succeeded.
    pub fn error_message(&self) -> String {
        self.state.lock().error_message.clone().unwrap_or_default()
    }

    /// Stack trace drill sent along with the most recent error, if any.
    pub fn stack_trace(&self) -> String {
        self.state.lock().stack_trace.clone().unwrap_or_default()
    }

    pub(crate) fn set_error_message(&self, message: impl Into<String>) {
        self.state.lock().error_message = Some(message.into());
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    pub use crate::req::testutil::StaticTransport;
    use crate::{Connection, ConnectionBuilder};

    pub fn connect(transport: StaticTransport) -> Connection<StaticTransport> {
        logutil::init_test();
        ConnectionBuilder::new("drill.test")
            .use_tls(false)
            .row_limit(500)
            .build_with_transport(transport)
            .unwrap()
    }
}
