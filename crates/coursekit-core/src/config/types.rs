use std::path::PathBuf;

use coursekit_audit::corpus::DEFAULT_EXCLUDES;
use serde::{Deserialize, Serialize};

pub use coursekit_audit::{AuditConfig, FixConfig, LinkConfig, LinkRule};
pub use coursekit_gateway::GatewayConfig;
pub use coursekit_knowledge::KnowledgeConfig;
pub use coursekit_pages::PagesConfig;
pub use coursekit_tutor::TutorConfig;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub fix: FixConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|&s| s.to_owned()).collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Site root: course material and HTML pages live below it.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Where generated pages, the knowledge base and reports are written.
    /// Relative paths are taken from `root`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory names skipped when discovering HTML pages.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output_dir: default_output_dir(),
            exclude: default_exclude(),
        }
    }
}

fn default_max_fix_passes() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Upper bound on audit → fix rounds in `pipeline`.
    #[serde(default = "default_max_fix_passes")]
    pub max_fix_passes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_fix_passes: default_max_fix_passes(),
        }
    }
}
