use scraper::Html;

use crate::a11y;
use crate::config::AuditConfig;
use crate::contrast::ContrastChecker;
use crate::corpus::Corpus;
use crate::issue::Issue;
use crate::readability::ReadabilityChecker;
use crate::report::AuditReport;

/// Runs every page check over a corpus.
#[derive(Debug, Clone)]
pub struct Auditor {
    contrast: ContrastChecker,
    readability: ReadabilityChecker,
}

impl Auditor {
    #[must_use]
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            contrast: ContrastChecker::new(config),
            readability: ReadabilityChecker::new(config),
        }
    }

    /// Issues for one page, in check order: contrast, readability, structure.
    #[must_use]
    pub fn audit_html(&self, file: &str, html: &str) -> Vec<Issue> {
        let doc = Html::parse_document(html);
        let mut issues = self.contrast.check(file, &doc);
        issues.extend(self.readability.check(file, &doc));
        issues.extend(a11y::check(file, &doc));
        issues
    }

    pub async fn audit(&self, corpus: &Corpus) -> AuditReport {
        let pages = corpus.pages().await;
        let mut issues = self.contrast.palette_issues();
        for page in &pages {
            let found = self.audit_html(&page.relative, &page.html);
            if !found.is_empty() {
                tracing::debug!(file = %page.relative, issues = found.len(), "page audited");
            }
            issues.extend(found);
        }
        let report = AuditReport::new(pages.len(), issues);
        tracing::info!(
            files = report.summary.files_checked,
            issues = report.summary.total_issues,
            "audit complete"
        );
        report
    }
}
