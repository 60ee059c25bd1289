use std::sync::Arc;

use coursekit_knowledge::KnowledgeBase;
use coursekit_llm::ClaudeProvider;
use coursekit_tutor::{ErrorKind, TutorConfig, TutorRequest, TutorService};
use serial_test::serial;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> TutorService<ClaudeProvider> {
    let config = TutorConfig::default();
    let provider = ClaudeProvider::new("test-key".into(), config.model.clone(), config.max_tokens)
        .with_api_url(format!("{}/v1/messages", server.uri()));
    TutorService::new(&config, Arc::new(KnowledgeBase::default()), Some(provider))
}

#[tokio::test]
async fn claude_answer_reaches_the_student() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("Chapter 4: Proportions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "Cross multiply: 3 × 12 = 4 × x."}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = TutorRequest::new("How do I solve 3/4 = x/12?").with_chapter("4");
    let response = service_for(&server).respond(&request).await;
    assert!(!response.fallback);
    assert_eq!(response.answer_html, "<p>Cross multiply: 3 × 12 = 4 × x.</p>");
}

#[tokio::test]
async fn upstream_error_still_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = service_for(&server)
        .respond(&TutorRequest::new("What is the median?"))
        .await;
    assert!(response.success);
    assert_eq!(response.error_kind, Some(ErrorKind::UpstreamUnavailable));
    assert!(response.answer_html.contains(r#"Question: "What is the median?""#));
}

#[test]
#[serial]
fn from_config_without_key_serves_canned() {
    let config = TutorConfig {
        api_key_env: "COURSEKIT_TEST_ABSENT_KEY".into(),
        ..TutorConfig::default()
    };
    unsafe { std::env::remove_var("COURSEKIT_TEST_ABSENT_KEY") };
    let service = TutorService::from_config(&config, Arc::new(KnowledgeBase::default())).unwrap();
    assert!(!service.has_provider());
}

#[test]
#[serial]
fn from_config_with_key_uses_claude() {
    let config = TutorConfig {
        api_key_env: "COURSEKIT_TEST_PRESENT_KEY".into(),
        ..TutorConfig::default()
    };
    unsafe { std::env::set_var("COURSEKIT_TEST_PRESENT_KEY", "sk-test") };
    let service = TutorService::from_config(&config, Arc::new(KnowledgeBase::default())).unwrap();
    unsafe { std::env::remove_var("COURSEKIT_TEST_PRESENT_KEY") };
    assert!(service.has_provider());
}
