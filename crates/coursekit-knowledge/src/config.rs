use serde::{Deserialize, Serialize};

fn default_source_dirs() -> Vec<String> {
    vec!["course_materials".into()]
}

fn default_extensions() -> Vec<String> {
    vec!["md".into(), "txt".into(), "html".into()]
}

fn default_output_file() -> String {
    "ai_knowledge_base.json".into()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

/// Where course material lives and where the knowledge base is written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    /// Directories under the project root to scan, in order.
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// File name inside the output directory.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_dirs: default_source_dirs(),
            extensions: default_extensions(),
            output_file: default_output_file(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: KnowledgeConfig =
            serde_json::from_str(r#"{"source_dirs": ["english", "math"]}"#).unwrap();
        assert_eq!(config.source_dirs, vec!["english", "math"]);
        assert_eq!(config.output_file, "ai_knowledge_base.json");
        assert!(config.extensions.contains(&"html".to_owned()));
    }
}
