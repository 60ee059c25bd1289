use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coursekit_llm::LlmProvider;

use super::reply::{MethodNotAllowed, TutorReply, parse_request};
use super::server::AppState;

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    knowledge_loaded: bool,
    formulas_count: usize,
    llm_configured: bool,
    uptime_secs: u64,
}

pub(crate) async fn tutor_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    body: Bytes,
) -> Response {
    let request = parse_request(&body);
    let response = state.tutor.respond(&request).await;
    Json(TutorReply::from(&response)).into_response()
}

pub(crate) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MethodNotAllowed::default()),
    )
        .into_response()
}

pub(crate) async fn health_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
) -> impl IntoResponse {
    let formulas_count = state.tutor.knowledge().formula_count();
    Json(HealthResponse {
        status: "healthy",
        knowledge_loaded: formulas_count > 0,
        formulas_count,
        llm_configured: state.tutor.has_provider(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "healthy",
            knowledge_loaded: true,
            formulas_count: 3,
            llm_configured: false,
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"formulas_count\":3"));
    }
}
