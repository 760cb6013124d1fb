#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("Request errored with status code: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Drill Query Error: {message}")]
    QueryError {
        message: String,
        stack_trace: String,
    },

    #[error("Drill is not reachable at {0}")]
    NotActive(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid connection parameters: {0}")]
    InvalidConnectionParameters(String),

    #[error("Unexpected response from drill: {0}")]
    UnexpectedResponse(String),
}

impl DrillError {
    /// Returns true if the error happened before or while talking to the
    /// server, as opposed to an error reported by drill itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ReqwestError(_)
                | Self::SerdeJsonError(_)
                | Self::UrlParseError(_)
                | Self::HttpError(_)
                | Self::TransportError(_)
        )
    }
}

pub type Result<T, E = DrillError> = std::result::Result<T, E>;
