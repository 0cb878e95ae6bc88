use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, ApiException},
    protocol::{SimulationCase, SimulationResult, SubmitRequest},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod answers;
pub mod controller;
pub mod error;
pub mod format;
pub mod hooks;
pub mod model;
pub mod render;
pub mod view;

pub use answers::{AnswerKey, AnswerSet};
pub use controller::{CaseFlowController, FlowOptions, StepOutcome};
pub use error::{ApiFailure, FlowError};
pub use hooks::{Collaborators, NoopCollaborators, Notification};
pub use model::{Phase, Presentation, ViewModel};

pub const DEFAULT_NEW_CASE_PATH: &str = "/api/simulation/new";
pub const DEFAULT_SUBMIT_PATH: &str = "/api/simulation/submit";

/// Where the two simulation endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub base_url: String,
    pub new_case_path: String,
    pub submit_path: String,
}

impl ApiEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            new_case_path: DEFAULT_NEW_CASE_PATH.to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
        }
    }

    pub fn new_case_url(&self) -> Result<Url, url::ParseError> {
        self.resolve(&self.new_case_path)
    }

    pub fn submit_url(&self) -> Result<Url, url::ParseError> {
        self.resolve(&self.submit_path)
    }

    fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(path)
    }
}

/// The server side of a simulation session.
#[async_trait]
pub trait SimulationApi: Send + Sync {
    async fn new_case(&self) -> Result<SimulationCase, ApiFailure>;
    async fn submit(&self, request: &SubmitRequest) -> Result<SimulationResult, ApiFailure>;
}

pub struct HttpSimulationApi {
    http: Client,
    endpoints: ApiEndpoints,
}

impl HttpSimulationApi {
    pub fn new(endpoints: ApiEndpoints) -> Self {
        Self::with_client(Client::new(), endpoints)
    }

    pub fn with_client(http: Client, endpoints: ApiEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }
}

/// Decodes a simulation response. A string `error` field wins over the HTTP
/// status; otherwise a non-success status or an off-shape body is a failure.
async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(ApiFailure::Status {
                status: status.as_u16(),
            })
        }
        Err(err) => return Err(ApiFailure::Malformed(err)),
    };

    if let Some(reported) = ApiError::from_body(&body) {
        warn!(status = status.as_u16(), error = %reported.error, "simulation: server reported error");
        return Err(ApiException::from(reported).into());
    }
    if !status.is_success() {
        return Err(ApiFailure::Status {
            status: status.as_u16(),
        });
    }

    Ok(serde_json::from_value(body)?)
}

#[async_trait]
impl SimulationApi for HttpSimulationApi {
    async fn new_case(&self) -> Result<SimulationCase, ApiFailure> {
        let url = self.endpoints.new_case_url()?;
        debug!(%url, "simulation: requesting new case");
        let response = self.http.get(url).send().await?;
        let case: SimulationCase = decode_response(response).await?;
        info!(
            case_id = %case.id,
            questions = case.questions.len(),
            mc_questions = case.multiple_choice_questions.len(),
            ft_questions = case.free_text_questions.len(),
            "simulation: case received"
        );
        Ok(case)
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SimulationResult, ApiFailure> {
        let url = self.endpoints.submit_url()?;
        info!(
            %url,
            case_id = %request.case_id(),
            answers = request.answer_count(),
            "simulation: submitting answers"
        );
        let response = self.http.post(url).json(request).send().await?;
        let result: SimulationResult = decode_response(response).await?;
        info!(score = result.score, "simulation: result received");
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
