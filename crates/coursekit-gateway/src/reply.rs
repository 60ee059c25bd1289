//! Wire shapes shared by the axum handlers and the serverless adapter.

use std::collections::BTreeMap;

use coursekit_llm::LlmProvider;
use coursekit_tutor::{ErrorKind, Subject, TutorRequest, TutorResponse, TutorService};
use serde::{Deserialize, Serialize};

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed. Use POST to /api/tutor";

/// JSON body of a tutor answer. `answer` and `response` carry the same HTML;
/// page widgets read the first, serverless clients the second.
#[derive(Debug, Serialize)]
pub struct TutorReply<'a> {
    pub answer: &'a str,
    pub response: &'a str,
    pub success: bool,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub chapter: Option<&'a str>,
    pub topic: Subject,
    pub timestamp: &'a str,
}

impl<'a> From<&'a TutorResponse> for TutorReply<'a> {
    fn from(r: &'a TutorResponse) -> Self {
        Self {
            answer: &r.answer_html,
            response: &r.answer_html,
            success: r.success,
            fallback: r.fallback,
            error_kind: r.error_kind,
            chapter: r.chapter.as_deref(),
            topic: r.topic,
            timestamp: &r.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MethodNotAllowed {
    pub error: bool,
    pub message: &'static str,
}

impl Default for MethodNotAllowed {
    fn default() -> Self {
        Self {
            error: true,
            message: METHOD_NOT_ALLOWED_MESSAGE,
        }
    }
}

/// Parse a request body. Anything unparseable is treated as an empty question
/// so the caller still gets a friendly answer.
#[must_use]
pub fn parse_request(body: &[u8]) -> TutorRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return TutorRequest::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::warn!("unparseable tutor request: {e}");
        TutorRequest::default()
    })
}

/// `{statusCode, headers, body}` response for serverless hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl ServerlessEnvelope {
    fn cors_headers() -> BTreeMap<String, String> {
        BTreeMap::from([("Access-Control-Allow-Origin".to_owned(), "*".to_owned())])
    }

    fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            tracing::error!("failed to encode response: {e}");
            r#"{"success":false}"#.to_owned()
        });
        let mut headers = Self::cors_headers();
        headers.insert("Content-Type".into(), "application/json".into());
        Self {
            status_code,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn preflight() -> Self {
        let mut headers = Self::cors_headers();
        headers.insert("Access-Control-Allow-Methods".into(), "POST, OPTIONS".into());
        headers.insert("Access-Control-Allow-Headers".into(), "Content-Type".into());
        Self {
            status_code: 200,
            headers,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::json(405, &MethodNotAllowed::default())
    }

    #[must_use]
    pub fn from_response(response: &TutorResponse) -> Self {
        Self::json(200, &TutorReply::from(response))
    }
}

/// Serve one serverless invocation: preflight, 405 for anything but POST, else
/// the tutor answer.
pub async fn handle_serverless<P: LlmProvider>(
    tutor: &TutorService<P>,
    method: &str,
    body: &[u8],
) -> ServerlessEnvelope {
    match method.to_ascii_uppercase().as_str() {
        "OPTIONS" => ServerlessEnvelope::preflight(),
        "POST" => {
            let request = parse_request(body);
            ServerlessEnvelope::from_response(&tutor.respond(&request).await)
        }
        _ => ServerlessEnvelope::method_not_allowed(),
    }
}
