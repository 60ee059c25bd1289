//! Request routing, LLM calls and the canned fallbacks. Every request produces
//! a successful [`TutorResponse`]; failures only change which content it carries.

use std::path::Path;
use std::sync::Arc;

use coursekit_knowledge::KnowledgeBase;
use coursekit_llm::{ClaudeProvider, LlmProvider};

use crate::canned;
use crate::config::TutorConfig;
use crate::error::Result;
use crate::prompt;
use crate::request::{ErrorKind, Subject, TutorRequest, TutorResponse};
use crate::topics::{chapter_key, math_topics, route};

pub struct TutorService<P> {
    provider: Option<P>,
    knowledge: Arc<KnowledgeBase>,
    api_key_env: String,
    max_formulas: usize,
}

impl<P: LlmProvider> TutorService<P> {
    /// Without a provider every answer is the canned one behind a setup notice.
    #[must_use]
    pub fn new(config: &TutorConfig, knowledge: Arc<KnowledgeBase>, provider: Option<P>) -> Self {
        Self {
            provider,
            knowledge,
            api_key_env: config.api_key_env.clone(),
            max_formulas: config.max_formulas,
        }
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Answer one question. Surrounding whitespace is dropped before routing,
    /// and any echo of the question in `answer_html` is HTML-escaped.
    pub async fn respond(&self, request: &TutorRequest) -> TutorResponse {
        let question = request.question.trim();
        let chapter = request.chapter.as_deref();
        let subject = route(question, request.context.as_deref());

        if question.is_empty() {
            return response(canned::empty_question(), None, request, subject);
        }

        let canned = self.canned_answer(subject, question, chapter);
        let Some(provider) = &self.provider else {
            tracing::debug!(subject = subject.as_str(), "no LLM configured, serving canned answer");
            let html = canned::setup_needed(question, chapter, &self.api_key_env, &canned);
            return response(html, Some(ErrorKind::MissingCredentials), request, subject);
        };

        let formulas = if subject == Subject::Writing {
            Vec::new()
        } else {
            let topics = math_topics(question);
            canned::relevant_formulas(
                &self.knowledge,
                &chapter_key(chapter, &topics),
                &topics,
                self.max_formulas,
            )
        };
        let messages = prompt::build(subject, request, &formulas);
        match provider.chat(&messages).await {
            Ok(text) => {
                tracing::info!(provider = provider.name(), subject = subject.as_str(), "tutor answered");
                response(canned::text_to_html(&text), None, request, subject)
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), "tutor LLM call failed: {e}");
                let html = canned::temporary_issue(question, chapter, &canned);
                response(html, Some(ErrorKind::UpstreamUnavailable), request, subject)
            }
        }
    }

    fn canned_answer(&self, subject: Subject, question: &str, chapter: Option<&str>) -> String {
        match subject {
            Subject::Math => canned::math_answer(question, chapter, &self.knowledge, self.max_formulas),
            Subject::Writing => canned::writing_answer(question),
            Subject::General => canned::general_answer(question),
        }
    }
}

impl TutorService<ClaudeProvider> {
    /// Build a Claude-backed service when the configured API key variable is
    /// set, a canned-only one otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &TutorConfig, knowledge: Arc<KnowledgeBase>) -> Result<Self> {
        let provider = match config.api_key() {
            Some(key) => {
                let client = coursekit_llm::http::provider_client(config.timeout_secs)?;
                Some(
                    ClaudeProvider::new(key, config.model.clone(), config.max_tokens)
                        .with_client(client),
                )
            }
            None => {
                tracing::warn!(
                    var = %config.api_key_env,
                    "API key not set, tutor will serve canned answers"
                );
                None
            }
        };
        Ok(Self::new(config, knowledge, provider))
    }
}

fn response(
    answer_html: String,
    error_kind: Option<ErrorKind>,
    request: &TutorRequest,
    subject: Subject,
) -> TutorResponse {
    TutorResponse {
        answer_html,
        success: true,
        fallback: error_kind.is_some(),
        error_kind,
        chapter: request.chapter.clone(),
        topic: subject,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Load the knowledge base, or an empty one if the file is missing or invalid.
pub async fn load_knowledge(path: &Path) -> KnowledgeBase {
    match KnowledgeBase::load(path).await {
        Ok(kb) => {
            tracing::info!(
                path = %path.display(),
                formulas = kb.formula_count(),
                chapters = kb.math.formulas.len(),
                "knowledge base loaded"
            );
            kb
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not load knowledge base: {e}");
            KnowledgeBase::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use coursekit_knowledge::{Category, ExtractedItem};
    use coursekit_llm::mock::MockProvider;
    use coursekit_llm::Role;

    use super::*;

    fn knowledge() -> Arc<KnowledgeBase> {
        let mut kb = KnowledgeBase::default();
        kb.append(
            Category::Math,
            "chapter_6",
            ExtractedItem::Formula("A = P(1 + r/n)^(nt)".into()),
        );
        Arc::new(kb)
    }

    fn service(provider: Option<MockProvider>) -> TutorService<MockProvider> {
        TutorService::new(&TutorConfig::default(), knowledge(), provider)
    }

    // --- without credentials ---

    #[tokio::test]
    async fn echoed_question_is_trimmed_and_escaped() {
        let request = TutorRequest::new("   Is 5 < 7 & is \"x\" > 2?\n");
        let html = service(None).respond(&request).await.answer_html;
        assert!(html.contains(r#"Question: "Is 5 &lt; 7 &amp; is &quot;x&quot; &gt; 2?""#), "{html}");
        assert!(!html.contains("Is 5 < 7"));
        assert!(!html.contains("Question: \"   "));
    }

    #[tokio::test]
    async fn missing_key_echoes_question() {
        let request = TutorRequest::new("How do I find compound interest?").with_chapter("6");
        let response = service(None).respond(&request).await;
        assert!(response.success);
        assert!(response.fallback);
        assert_eq!(response.error_kind, Some(ErrorKind::MissingCredentials));
        assert!(
            response
                .answer_html
                .contains(r#"Question: "How do I find compound interest?""#)
        );
        assert!(response.answer_html.contains("AI Tutor Setup Needed"));
        assert!(response.answer_html.contains("A = P(1 + r/n)^(nt)"));
        assert_eq!(response.chapter.as_deref(), Some("6"));
        assert_eq!(response.topic, Subject::Math);
    }

    #[tokio::test]
    async fn empty_question_prompts_for_one() {
        let provider = MockProvider::default();
        let response = service(Some(provider.clone()))
            .respond(&TutorRequest::new("   "))
            .await;
        assert!(response.success);
        assert!(!response.fallback);
        assert!(response.answer_html.contains("Please ask me a specific question"));
        assert!(provider.recorded().is_empty());
    }

    // --- with a provider ---

    #[tokio::test]
    async fn provider_answer_is_rendered() {
        let provider = MockProvider::with_responses(vec!["Use I = Prt.\n\nP is the principal.".into()]);
        let svc = service(Some(provider.clone()));
        let request = TutorRequest::new("What is simple interest?").with_context("math-tutorial");
        let response = svc.respond(&request).await;
        assert!(!response.fallback);
        assert_eq!(response.error_kind, None);
        assert_eq!(
            response.answer_html,
            "<p>Use I = Prt.</p>\n<p>P is the principal.</p>"
        );

        let recorded = provider.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0][0].role, Role::System);
        assert!(recorded[0][1].content.contains("- A = P(1 + r/n)^(nt)"));
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let response = service(Some(MockProvider::failing()))
            .respond(&TutorRequest::new("How do I write a thesis?"))
            .await;
        assert!(response.success);
        assert!(response.fallback);
        assert_eq!(response.error_kind, Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(response.topic, Subject::Writing);
        assert!(response.answer_html.contains("Temporary Service Issue"));
        assert!(response.answer_html.contains("Strong Thesis Statements"));
    }

    #[tokio::test]
    async fn missing_knowledge_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let kb = load_knowledge(&dir.path().join("absent.json")).await;
        assert!(kb.is_empty());

        let path = dir.path().join("kb.json");
        knowledge().save(&path).await.unwrap();
        assert_eq!(load_knowledge(&path).await.formula_count(), 1);
    }
}
