//! Reading-load checks: paragraphs too long to take in at a glance.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::config::AuditConfig;
use crate::issue::{Issue, IssueKind, Severity, collapsed_text, describe, snippet};

static TEXT_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li, blockquote, td, dd, figcaption").unwrap());
static BR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("br").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct ReadabilityChecker {
    paragraph_limit: usize,
    block_limit: usize,
    min_breaks: usize,
}

impl ReadabilityChecker {
    #[must_use]
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            paragraph_limit: config.paragraph_limit,
            block_limit: config.block_limit,
            min_breaks: config.min_breaks,
        }
    }

    #[must_use]
    pub fn paragraph_limit(&self) -> usize {
        self.paragraph_limit
    }

    /// One issue per offending block; an unbroken wall of text outranks a long paragraph.
    #[must_use]
    pub fn check(&self, file: &str, doc: &Html) -> Vec<Issue> {
        doc.select(&TEXT_BLOCKS)
            .filter_map(|el| self.check_block(file, el))
            .collect()
    }

    fn check_block(&self, file: &str, el: ElementRef<'_>) -> Option<Issue> {
        let length = collapsed_text(el).chars().count();
        if length <= self.paragraph_limit {
            return None;
        }
        let breaks = line_breaks(el);
        let (kind, severity, what) = if length > self.block_limit && breaks < self.min_breaks {
            (IssueKind::TextBlock, Severity::High, "large text block without breaks")
        } else {
            (IssueKind::LongParagraph, Severity::Medium, "long paragraph")
        };
        Some(Issue::new(
            file,
            kind,
            severity,
            format!(
                "{what}: {} has {length} characters and {breaks} breaks: \"{}\"",
                describe(el),
                snippet(el, 60)
            ),
        ))
    }
}

/// Newlines in the text plus `<br>` elements.
fn line_breaks(el: ElementRef<'_>) -> usize {
    let newlines: usize = el
        .text()
        .map(|t| t.trim().matches('\n').count())
        .sum();
    newlines + el.select(&BR).count()
}
