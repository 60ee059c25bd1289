use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}

fn default_knowledge_file() -> PathBuf {
    PathBuf::from("ai_knowledge_base.json")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_formulas() -> usize {
    5
}

/// Tutor settings. The API key itself is read from the environment variable
/// named by `api_key_env` and never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Formulas quoted in a canned math answer.
    #[serde(default = "default_max_formulas")]
    pub max_formulas: usize,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
            knowledge_file: default_knowledge_file(),
            timeout_secs: default_timeout_secs(),
            max_formulas: default_max_formulas(),
        }
    }
}

impl TutorConfig {
    /// The API key, if its variable is set and non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
