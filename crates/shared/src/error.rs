use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNSPECIFIED_ERROR: &str = "The server reported an error.";

/// Body shape the simulation endpoints use to report a failure.
///
/// The server may send this with a 200 or an error status; the presence of
/// the `error` field is what marks the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Extracts a server-reported error from an arbitrary JSON body. Any
    /// truthy `error` counts; non-string values get a generic message.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match body.get("error")? {
            Value::Null | Value::Bool(false) => None,
            Value::String(message) if message.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(message) => Some(Self::new(message.as_str())),
            _ => Some(Self::new(UNSPECIFIED_ERROR)),
        }
    }
}

#[derive(Debug, Error)]
#[error("server reported: {message}")]
pub struct ApiException {
    pub message: String,
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            message: value.error,
        }
    }
}
