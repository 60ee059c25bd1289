use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("COURSEKIT_ROOT") {
            if v.trim().is_empty() {
                tracing::warn!("ignoring invalid COURSEKIT_ROOT value: {v}");
            } else {
                self.project.root = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("COURSEKIT_OUTPUT_DIR") {
            if v.trim().is_empty() {
                tracing::warn!("ignoring invalid COURSEKIT_OUTPUT_DIR value: {v}");
            } else {
                self.project.output_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("COURSEKIT_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("COURSEKIT_GATEWAY_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.gateway.port = port;
            } else {
                tracing::warn!("ignoring invalid COURSEKIT_GATEWAY_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("COURSEKIT_LINKS_CONCURRENCY") {
            if let Ok(n) = v.parse::<usize>()
                && n > 0
            {
                self.audit.links.concurrency = n;
            } else {
                tracing::warn!("ignoring invalid COURSEKIT_LINKS_CONCURRENCY value: {v}");
            }
        }
        if let Ok(v) = std::env::var("COURSEKIT_LINKS_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.audit.links.timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid COURSEKIT_LINKS_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("COURSEKIT_TUTOR_MODEL")
            && !v.trim().is_empty()
        {
            self.tutor.model = v;
        }
    }
}
