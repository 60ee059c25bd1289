use serde::{Deserialize, Serialize};

use crate::chapter::{ChapterDescriptor, default_chapters};

fn default_max_formulas() -> usize {
    12
}

/// Chapters to render and how much of the knowledge base to pull into each page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PagesConfig {
    #[serde(default = "default_chapters")]
    pub chapters: Vec<ChapterDescriptor>,
    /// Upper bound on formulas listed in a chapter's formula sheet.
    #[serde(default = "default_max_formulas")]
    pub max_formulas: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            chapters: default_chapters(),
            max_formulas: default_max_formulas(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_three_chapters() {
        let config = PagesConfig::default();
        assert_eq!(config.chapters.len(), 3);
        assert_eq!(config.max_formulas, 12);
    }

    #[test]
    fn chapters_override_replaces_list() {
        let config: PagesConfig =
            serde_json::from_str(r#"{"chapters": [{"num": 10, "title": "Probability"}]}"#).unwrap();
        assert_eq!(config.chapters.len(), 1);
        assert_eq!(config.chapters[0].num, 10);
        assert_eq!(config.chapters[0].color, "blue");
        assert_eq!(config.max_formulas, 12);
    }
}
