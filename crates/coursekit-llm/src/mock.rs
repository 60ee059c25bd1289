//! Scripted provider for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, Message};

const FALLBACK_REPLY: &str = "mock response";

/// Replies from a queue, then with [`FALLBACK_REPLY`]. Clones share the queue
/// and the request log, so a test can keep a handle after moving one into a service.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<String>>>,
    log: Arc<Mutex<Vec<Vec<Message>>>>,
    unavailable: bool,
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// Every call fails with [`LlmError::Unavailable`].
    #[must_use]
    pub fn failing() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Message lists received by `chat`, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<Vec<Message>> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String> {
        if let Ok(mut log) = self.log.lock() {
            log.push(messages.to_vec());
        }
        if self.unavailable {
            return Err(LlmError::Unavailable("mock provider set to fail".into()));
        }
        let next = self
            .script
            .lock()
            .map_err(|_| LlmError::Unavailable("mock script poisoned".into()))?
            .pop_front();
        Ok(next.unwrap_or_else(|| FALLBACK_REPLY.to_owned()))
    }
}
