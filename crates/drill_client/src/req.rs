use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, trace};

use crate::errors::{DrillError, Result};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const BODY_CONTENT_TYPE: &str = "application/json";
const REQ_ACCEPT: &str = "application/json";

/// Moves JSON between the client and a drill server.
///
/// Every call is a single independent request. Implementations must not
/// retry.
#[async_trait]
pub trait DrillTransport: Sync + Send + Debug {
    /// Send a HEAD request, returning the response headers.
    async fn head(&self, url: Url) -> Result<HeaderMap>;

    /// Send a GET request and decode the body as json.
    async fn get(&self, url: Url) -> Result<Value>;

    /// Send a POST request with a json body and decode the response as json.
    async fn post(&self, url: Url, body: Value) -> Result<Value>;
}

#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(REQ_ACCEPT));

        let mut builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(default_headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let client = builder.build()?;
        Ok(HttpTransport { inner: client })
    }
}

/// Default transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    async fn read_json(res: reqwest::Response) -> Result<Value> {
        let status = res.status();
        let text = res.text().await?;
        trace!(%status, %text, "response");

        match serde_json::from_str(&text) {
            Ok(v) => Ok(v),
            // Drill reports query failures as json with a 500 status, so only
            // fall back to the status when the body isn't json.
            Err(_) if !status.is_success() => Err(DrillError::HttpError(status)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DrillTransport for HttpTransport {
    async fn head(&self, url: Url) -> Result<HeaderMap> {
        debug!(%url, "head");
        let res = self.inner.head(url).send().await?;
        Ok(res.headers().clone())
    }

    async fn get(&self, url: Url) -> Result<Value> {
        debug!(%url, "get");
        let res = self.inner.get(url).send().await?;
        Self::read_json(res).await
    }

    async fn post(&self, url: Url, body: Value) -> Result<Value> {
        debug!(%url, "post");
        let res = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, BODY_CONTENT_TYPE)
            .json(&body)
            .send()
            .await?;
        Self::read_json(res).await
    }
}
