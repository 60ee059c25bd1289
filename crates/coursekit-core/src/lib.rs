//! Configuration and command orchestration for coursekit.

pub mod config;
pub mod pipeline;

pub use config::{Config, DEFAULT_CONFIG_PATH, resolve_config_path};
pub use pipeline::{AuditRun, Pipeline, PipelineSummary};
