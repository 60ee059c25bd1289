//! LLM provider abstraction and the Claude backend used by the tutor.

pub mod claude;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;

pub use claude::{ClaudeProvider, RetryPolicy};
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
