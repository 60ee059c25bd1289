mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::Context;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

impl Config {
    /// Reads `path`, or starts from defaults when it is missing, then applies
    /// `COURSEKIT_*` environment overrides.
    ///
    /// # Errors
    ///
    /// The file exists but is unreadable or not valid TOML for [`Config`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: Self = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("invalid config in {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", path.display()));
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Output directory, taken from the project root when relative.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.project.root.join(&self.project.output_dir)
    }

    #[must_use]
    pub fn knowledge_path(&self) -> PathBuf {
        self.output_dir().join(&self.knowledge.output_file)
    }

    /// Knowledge base the tutor reads; relative paths sit in the output directory.
    #[must_use]
    pub fn tutor_knowledge_path(&self) -> PathBuf {
        self.output_dir().join(&self.tutor.knowledge_file)
    }
}

/// `--config` flag, then `COURSEKIT_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("COURSEKIT_CONFIG")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
