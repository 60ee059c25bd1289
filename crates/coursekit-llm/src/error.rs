#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Non-success status; `message` is the API's error message when it sent one.
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no text")]
    NoText,

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
