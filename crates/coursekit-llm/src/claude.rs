//! Anthropic Messages API backend.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Upper bound on a server-requested wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// How 429 responses are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `retry-after` seconds when the server sent them, else `base_delay * 2^attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32, headers: &HeaderMap) -> Duration {
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or_else(
                || self.base_delay.saturating_mul(1 << attempt.min(16)),
                |secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER),
            )
    }
}

#[derive(Clone)]
pub struct ClaudeProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl ClaudeProvider {
    #[must_use]
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: MESSAGES_URL.to_owned(),
            api_key,
            model,
            max_tokens,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point the provider at a different messages endpoint (proxies, tests).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = MessagesRequest::new(&self.model, self.max_tokens, messages);
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retry.max_retries {
                    return Err(LlmError::RateLimited {
                        attempts: attempt + 1,
                    });
                }
                let wait = self.retry.delay(attempt, response.headers());
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max = self.retry.max_retries,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "Claude rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let raw = response.text().await?;
            if !status.is_success() {
                let message = api_error_message(&raw);
                tracing::warn!(status = status.as_u16(), %message, "Claude request rejected");
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: MessagesResponse = serde_json::from_str(&raw)?;
            if let Some(usage) = &parsed.usage {
                tracing::debug!(
                    model = %self.model,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    stop_reason = parsed.stop_reason.as_deref().unwrap_or("unknown"),
                    "Claude usage"
                );
            }
            return parsed.into_text();
        }
    }
}

impl LlmProvider for ClaudeProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        self.complete(messages).await
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

/// Pull `error.message` out of an Anthropic error body, else a trimmed prefix of the raw text.
fn api_error_message(raw: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    serde_json::from_str::<Envelope>(raw).map_or_else(
        |_| raw.trim().chars().take(200).collect(),
        |e| e.error.message,
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Turn<'a>>,
}

impl<'a> MessagesRequest<'a> {
    /// System messages are hoisted into the top-level `system` field.
    fn new(model: &'a str, max_tokens: u32, messages: &'a [Message]) -> Self {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let turns = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::System => return None,
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                Some(Turn {
                    role,
                    content: &m.content,
                })
            })
            .collect();
        Self {
            model,
            max_tokens,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: turns,
        }
    }
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl MessagesResponse {
    /// Concatenated text blocks; other block types are ignored.
    fn into_text(self) -> Result<String> {
        let text = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if text.is_empty() {
            Err(LlmError::NoText)
        } else {
            Ok(text)
        }
    }
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use reqwest::header::HeaderValue;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> ClaudeProvider {
        ClaudeProvider::new("test-key".into(), "claude-sonnet-4-5".into(), 512)
            .with_api_url(format!("{}/v1/messages", server.uri()))
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                base_delay: Duration::ZERO,
            })
    }

    // --- request shape ---

    #[test]
    fn system_prompts_are_hoisted_and_joined() {
        let messages = [
            Message::system("You are a math tutor."),
            Message::system("Be brief."),
            Message::user("What is a ratio?"),
        ];
        let request = MessagesRequest::new("m", 100, &messages);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "You are a math tutor.\n\nBe brief.");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn request_without_system_omits_field() {
        let messages = [Message::user("hi")];
        let json = serde_json::to_value(MessagesRequest::new("m", 100, &messages)).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn debug_hides_api_key() {
        let provider = ClaudeProvider::new("sk-secret".into(), "claude-sonnet-4-5".into(), 10);
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("claude-sonnet-4-5"));
    }

    // --- retry policy ---

    #[test]
    fn retry_after_header_wins_and_is_capped() {
        let policy = RetryPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(policy.delay(0, &headers), Duration::from_secs(7));
        headers.insert("retry-after", HeaderValue::from_static("3600"));
        assert_eq!(policy.delay(0, &headers), MAX_RETRY_AFTER);
    }

    proptest! {
        #[test]
        fn backoff_doubles_without_header(attempt in 0u32..10) {
            let policy = RetryPolicy::default();
            let none = HeaderMap::new();
            prop_assert_eq!(policy.delay(attempt + 1, &none), policy.delay(attempt, &none) * 2);
        }
    }

    // --- HTTP ---

    #[tokio::test]
    async fn chat_sends_headers_and_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(serde_json::json!({"model": "claude-sonnet-4-5"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "Cross multiply."},
                    {"type": "text", "text": "Then divide."}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 12, "output_tokens": 4}
            })))
            .mount(&server)
            .await;

        let answer = provider_for(&server)
            .chat(&[Message::user("How do I solve a proportion?")])
            .await
            .unwrap();
        assert_eq!(answer, "Cross multiply.\n\nThen divide.");
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .mount(&server)
            .await;

        let answer = provider_for(&server).chat(&[Message::user("hi")]).await.unwrap();
        assert_eq!(answer, "ok");
    }

    #[tokio::test]
    async fn persistent_rate_limit_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = provider_for(&server).chat(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { attempts: 3 }));
    }

    #[tokio::test]
    async fn api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).chat(&[Message::user("hi")]).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_text_only_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "tool_use", "id": "t1", "name": "calc", "input": {}}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).chat(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::NoText));
    }
}
