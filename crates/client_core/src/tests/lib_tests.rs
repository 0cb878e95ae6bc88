use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::CaseId,
    protocol::{BatchedSubmission, SequentialSubmission},
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct MockSimulationServer {
    case_status: StatusCode,
    case_body: String,
    submit_status: StatusCode,
    submit_body: String,
    submitted: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
}

impl MockSimulationServer {
    fn new(case_body: Value, submit_body: Value) -> Self {
        Self {
            case_status: StatusCode::OK,
            case_body: case_body.to_string(),
            submit_status: StatusCode::OK,
            submit_body: submit_body.to_string(),
            submitted: Arc::new(Mutex::new(None)),
        }
    }

    fn with_case_response(mut self, status: StatusCode, body: impl Into<String>) -> Self {
        self.case_status = status;
        self.case_body = body.into();
        self
    }

    fn with_submit_response(mut self, status: StatusCode, body: impl Into<String>) -> Self {
        self.submit_status = status;
        self.submit_body = body.into();
        self
    }
}

async fn handle_new_case(State(state): State<MockSimulationServer>) -> impl IntoResponse {
    (
        state.case_status,
        [(header::CONTENT_TYPE, "application/json")],
        state.case_body,
    )
}

async fn handle_submit(
    State(state): State<MockSimulationServer>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    if let Some(tx) = state.submitted.lock().await.take() {
        let _ = tx.send(payload);
    }
    (
        state.submit_status,
        [(header::CONTENT_TYPE, "application/json")],
        state.submit_body,
    )
}

async fn spawn_simulation_server(
    server: MockSimulationServer,
) -> anyhow::Result<(String, oneshot::Receiver<Value>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    *server.submitted.lock().await = Some(tx);
    let app = Router::new()
        .route(DEFAULT_NEW_CASE_PATH, get(handle_new_case))
        .route(DEFAULT_SUBMIT_PATH, post(handle_submit))
        .with_state(server);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

fn diagnosis_case() -> Value {
    json!({
        "patient_info": {"age": 41, "gender": "male"},
        "presenting_complaint": "A 41-year-old male presents with fever and myalgia.",
        "questions": [{"id": 1, "field": "dx", "question": "Diagnosis?"}]
    })
}

fn scored(score: u32) -> Value {
    json!({
        "score": score,
        "feedback": "Good job! You've demonstrated solid clinical reasoning.",
        "questions": [{"id": 1, "question": "Diagnosis?", "field": "dx", "correct": true,
                       "feedback": "Perfect! Your diagnosis is correct."}]
    })
}

fn http_api(server_url: &str) -> HttpSimulationApi {
    HttpSimulationApi::new(ApiEndpoints::new(server_url))
}

#[tokio::test]
async fn new_case_decodes_case_payload() {
    let (server_url, _rx) =
        spawn_simulation_server(MockSimulationServer::new(diagnosis_case(), scored(85)))
            .await
            .expect("spawn server");

    let case = http_api(&server_url).new_case().await.expect("case");
    assert_eq!(case.id, CaseId::default());
    assert_eq!(case.questions.len(), 1);
    assert_eq!(case.questions[0].field, "dx");
    assert_eq!(case.patient_info.get("age"), Some(&json!(41)));
}

#[tokio::test]
async fn error_field_is_server_reported_regardless_of_status() {
    let message = "An error occurred generating the simulation.";
    for status in [StatusCode::OK, StatusCode::INTERNAL_SERVER_ERROR] {
        let server = MockSimulationServer::new(diagnosis_case(), scored(85))
            .with_case_response(status, json!({ "error": message }).to_string());
        let (server_url, _rx) = spawn_simulation_server(server).await.expect("spawn server");

        let err = http_api(&server_url)
            .new_case()
            .await
            .expect_err("must report error");
        assert_eq!(err.server_message(), Some(message), "status {status}");
    }
}

#[tokio::test]
async fn non_json_error_status_is_transport_failure() {
    let server = MockSimulationServer::new(diagnosis_case(), scored(85))
        .with_case_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
    let (server_url, _rx) = spawn_simulation_server(server).await.expect("spawn server");

    let err = http_api(&server_url)
        .new_case()
        .await
        .expect_err("must fail");
    assert!(matches!(err, ApiFailure::Status { status: 502 }), "{err:?}");
    assert!(matches!(FlowError::from(err), FlowError::Transport(_)));
}

#[tokio::test]
async fn off_shape_success_body_is_malformed() {
    let server = MockSimulationServer::new(diagnosis_case(), scored(85))
        .with_case_response(StatusCode::OK, json!({"questions": "not a list"}).to_string());
    let (server_url, _rx) = spawn_simulation_server(server).await.expect("spawn server");

    let err = http_api(&server_url)
        .new_case()
        .await
        .expect_err("must fail");
    assert!(matches!(err, ApiFailure::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_is_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = http_api(&format!("http://{addr}"))
        .new_case()
        .await
        .expect_err("must fail");
    assert!(matches!(err, ApiFailure::Http(_)), "{err:?}");
}

#[tokio::test]
async fn submit_posts_sequential_and_batched_shapes() {
    let (server_url, rx) =
        spawn_simulation_server(MockSimulationServer::new(diagnosis_case(), scored(85)))
            .await
            .expect("spawn server");
    let api = http_api(&server_url);

    let request = SubmitRequest::Sequential(SequentialSubmission {
        answers: [("dx".to_string(), "flu".to_string())].into(),
        case_id: CaseId::default(),
    });
    let result = api.submit(&request).await.expect("result");
    assert_eq!(result.score, 85.0);
    assert_eq!(
        rx.await.expect("payload"),
        json!({"answers": {"dx": "flu"}, "case_id": "current"})
    );

    let (server_url, rx) =
        spawn_simulation_server(MockSimulationServer::new(diagnosis_case(), scored(40)))
            .await
            .expect("spawn server");
    let request = SubmitRequest::Batched(BatchedSubmission {
        mc_answers: [("0".to_string(), "Malaria".to_string())].into(),
        ft_answers: [("0".to_string(), "Blood film".to_string())].into(),
        case_id: CaseId::from("case-9"),
    });
    http_api(&server_url).submit(&request).await.expect("result");
    assert_eq!(
        rx.await.expect("payload"),
        json!({"mc_answers": {"0": "Malaria"}, "ft_answers": {"0": "Blood film"}, "case_id": "case-9"})
    );
}

#[tokio::test]
async fn custom_endpoint_paths_are_honoured() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        "/v2/cases/next",
        get(|| async { Json(json!({"id": 12, "questions": []})) }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let mut endpoints = ApiEndpoints::new(format!("http://{addr}"));
    endpoints.new_case_path = "/v2/cases/next".to_string();
    let case = HttpSimulationApi::new(endpoints)
        .new_case()
        .await
        .expect("case");
    assert_eq!(case.id, CaseId::from("12"));
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let (server_url, rx) =
        spawn_simulation_server(MockSimulationServer::new(diagnosis_case(), scored(85)))
            .await
            .expect("spawn server");
    let mut controller = CaseFlowController::new(
        Arc::new(http_api(&server_url)),
        Arc::new(NoopCollaborators),
        FlowOptions::default(),
    );

    controller.load_new_case().await.expect("load");
    let outcome = controller.answer_current("flu").await.expect("answer");
    assert_eq!(outcome, StepOutcome::Submitted { score: 85.0 });
    assert_eq!(
        rx.await.expect("payload"),
        json!({"answers": {"dx": "flu"}, "case_id": "current"})
    );
    assert_eq!(controller.phase(), Phase::ShowingResults);
    assert!(controller.view().text_content().contains("Good job!"));
}

#[tokio::test]
async fn server_rejection_on_submit_keeps_answers_for_retry() {
    let server = MockSimulationServer::new(diagnosis_case(), scored(85)).with_submit_response(
        StatusCode::BAD_REQUEST,
        json!({"error": "No active case found. Please start a new case."}).to_string(),
    );
    let (server_url, _rx) = spawn_simulation_server(server).await.expect("spawn server");
    let mut controller = CaseFlowController::new(
        Arc::new(http_api(&server_url)),
        Arc::new(NoopCollaborators),
        FlowOptions::default(),
    );

    controller.load_new_case().await.expect("load");
    let err = controller
        .answer_current("flu")
        .await
        .expect_err("must fail");
    assert!(
        matches!(&err, FlowError::ServerReported(m) if m.starts_with("No active case")),
        "{err:?}"
    );
    assert_eq!(controller.phase(), Phase::Presenting);
    assert_eq!(controller.model().answers.field("dx"), Some("flu"));
}

#[tokio::test]
async fn non_string_error_field_is_still_server_reported() {
    let server = MockSimulationServer::new(diagnosis_case(), scored(85))
        .with_case_response(StatusCode::OK, json!({"error": true}).to_string());
    let (server_url, _rx) = spawn_simulation_server(server).await.expect("spawn server");

    let err = http_api(&server_url)
        .new_case()
        .await
        .expect_err("must report error");
    assert!(err.server_message().is_some(), "{err:?}");
    assert!(matches!(FlowError::from(err), FlowError::ServerReported(_)));
}
