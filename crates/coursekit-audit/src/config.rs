use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_background() -> String {
    "#ffffff".into()
}

fn default_foreground() -> String {
    "#111827".into()
}

fn default_min_contrast() -> f64 {
    4.5
}

fn default_severe_contrast() -> f64 {
    3.0
}

fn default_paragraph_limit() -> usize {
    150
}

fn default_block_limit() -> usize {
    500
}

fn default_min_breaks() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; LinkChecker/1.0)".into()
}

fn default_dark_text() -> String {
    "text-gray-900".into()
}

fn default_light_text() -> String {
    "text-white".into()
}

const VEND_SANS_URL: &str =
    "https://fonts.googleapis.com/css2?family=Vend+Sans:wght@400;500;600;700;800;900&display=swap";

fn default_link_rules() -> Vec<LinkRule> {
    vec![
        LinkRule {
            pattern: r"(^|/)english_tutor\.html".into(),
            replacement: "${1}tutor.html".into(),
        },
        LinkRule {
            pattern: r"^https://fonts\.(googleapis|gstatic)\.com/?$".into(),
            replacement: VEND_SANS_URL.into(),
        },
    ]
}

/// Thresholds and colour resolution for the page auditors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Page background when no ancestor declares one.
    #[serde(default = "default_background")]
    pub default_background: String,
    /// Text colour when no ancestor declares one.
    #[serde(default = "default_foreground")]
    pub default_foreground: String,
    #[serde(default = "default_min_contrast")]
    pub min_contrast: f64,
    /// Ratios below this are reported as `high`.
    #[serde(default = "default_severe_contrast")]
    pub severe_contrast: f64,
    /// Also report the known-problematic palette pairs.
    #[serde(default)]
    pub check_palette: bool,
    /// Extra class → hex entries merged over the built-in colour table.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default = "default_paragraph_limit")]
    pub paragraph_limit: usize,
    #[serde(default = "default_block_limit")]
    pub block_limit: usize,
    #[serde(default = "default_min_breaks")]
    pub min_breaks: usize,
    #[serde(default)]
    pub links: LinkConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_background: default_background(),
            default_foreground: default_foreground(),
            min_contrast: default_min_contrast(),
            severe_contrast: default_severe_contrast(),
            check_palette: false,
            colors: BTreeMap::new(),
            paragraph_limit: default_paragraph_limit(),
            block_limit: default_block_limit(),
            min_breaks: default_min_breaks(),
            links: LinkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Send HEAD requests for external links.
    #[serde(default = "default_true")]
    pub check_external: bool,
    /// Maximum in-flight external requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            check_external: true,
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Regex replacement applied to `href` and `src` values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkRule {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixConfig {
    /// Token used when dark text wins on the resolved background.
    #[serde(default = "default_dark_text")]
    pub dark_text: String,
    #[serde(default = "default_light_text")]
    pub light_text: String,
    #[serde(default = "default_true")]
    pub split_paragraphs: bool,
    /// Strip `href` from anchors whose local target is missing.
    #[serde(default = "default_true")]
    pub disable_missing_links: bool,
    #[serde(default = "default_link_rules")]
    pub link_rules: Vec<LinkRule>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            dark_text: default_dark_text(),
            light_text: default_light_text(),
            split_paragraphs: true,
            disable_missing_links: true,
            link_rules: default_link_rules(),
        }
    }
}
