use shared::error::ApiException;
use thiserror::Error;

/// Failure of a single round trip to the simulation endpoints.
#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error(transparent)]
    Server(#[from] ApiException),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} without an error message")]
    Status { status: u16 },
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiFailure {
    /// Message the server itself reported, when there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiFailure::Server(exception) => Some(&exception.message),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("server reported: {0}")]
    ServerReported(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no case is loaded")]
    NoActiveCase,
    #[error("{action} is not available while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
}

impl From<ApiFailure> for FlowError {
    fn from(value: ApiFailure) -> Self {
        match value {
            ApiFailure::Server(exception) => FlowError::ServerReported(exception.message),
            other => FlowError::Transport(other.to_string()),
        }
    }
}

impl FlowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}
