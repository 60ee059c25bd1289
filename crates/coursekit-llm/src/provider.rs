use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who a [`Message`] is from. Providers without a system role fold
/// `System` turns into their own instruction field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// A chat model that turns one conversation into one reply.
pub trait LlmProvider: Send + Sync {
    /// Returns the model's text reply to `messages`.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success API statuses and replies without text.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String>> + Send;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}
