#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("LLM error: {0}")]
    Llm(#[from] coursekit_llm::LlmError),
}

pub type Result<T> = std::result::Result<T, TutorError>;
