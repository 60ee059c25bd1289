//! In-place page fixes. Each file is parsed once to plan, rewritten once, and
//! written only when the bytes change. Running the fixer on its own output is a
//! no-op.

mod plan;
mod rewrite;

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::config::{AuditConfig, FixConfig};
use crate::contrast::ContrastChecker;
use crate::corpus::Corpus;
use crate::error::{AuditError, Result};

use self::plan::Planner;
use self::rewrite::{RewriteContext, rewrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    Contrast,
    DuplicateClass,
    AltText,
    InputLabel,
    ParagraphSplit,
    IconHidden,
    LinkRewrite,
    DisabledLink,
    /// A missing local `src`, or `href` outside an anchor, was removed.
    DroppedReference,
}

/// Result of fixing one page in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub html: String,
    pub applied: BTreeMap<FixKind, usize>,
    changed: bool,
}

impl FixOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFixes {
    pub file: String,
    pub applied: BTreeMap<FixKind, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixReport {
    pub files_checked: usize,
    pub files_changed: usize,
    pub dry_run: bool,
    pub totals: BTreeMap<FixKind, usize>,
    pub files: Vec<FileFixes>,
    pub errors: Vec<String>,
}

impl FixReport {
    #[must_use]
    pub fn total_fixes(&self) -> usize {
        self.totals.values().sum()
    }
}

pub struct Fixer {
    contrast: ContrastChecker,
    dark_text: String,
    light_text: String,
    paragraph_limit: usize,
    split_paragraphs: bool,
    disable_missing_links: bool,
    rules: Vec<(Regex, String)>,
}

impl Fixer {
    /// # Errors
    ///
    /// Returns `AuditError::InvalidRule` if a link rule pattern does not compile.
    pub fn new(fix: &FixConfig, audit: &AuditConfig) -> Result<Self> {
        let rules = fix
            .link_rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replacement.clone()))
                    .map_err(|source| AuditError::InvalidRule {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            contrast: ContrastChecker::new(audit),
            dark_text: fix.dark_text.clone(),
            light_text: fix.light_text.clone(),
            paragraph_limit: audit.paragraph_limit,
            split_paragraphs: fix.split_paragraphs,
            disable_missing_links: fix.disable_missing_links,
            rules,
        })
    }

    /// Fix one page held in memory. `source` is the page's path, used to resolve
    /// relative links against `root`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Rewrite` if the rewriter rejects the markup.
    pub fn fix_html(&self, root: &Path, source: &Path, html: &str) -> Result<FixOutcome> {
        let plan = {
            let doc = Html::parse_document(html);
            Planner {
                contrast: &self.contrast,
                dark_text: &self.dark_text,
                light_text: &self.light_text,
                paragraph_limit: self.paragraph_limit,
                split_paragraphs: self.split_paragraphs,
            }
            .plan(&doc)
        };
        let ctx = RewriteContext {
            plan: &plan,
            rules: &self.rules,
            disable_missing_links: self.disable_missing_links,
            root,
            source,
        };
        let (fixed, applied) = rewrite(html, &ctx)?;
        let changed = fixed != html;
        Ok(FixOutcome {
            html: fixed,
            applied,
            changed,
        })
    }

    /// Fix every page in the corpus. With `dry_run` nothing is written.
    ///
    /// Per-file failures are logged and collected in the report; the file is left untouched.
    pub async fn fix_corpus(&self, corpus: &Corpus, dry_run: bool) -> FixReport {
        let mut report = FixReport {
            dry_run,
            ..FixReport::default()
        };
        for page in corpus.pages().await {
            report.files_checked += 1;
            let outcome = match self.fix_html(corpus.root(), &page.path, &page.html) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(file = %page.relative, "fix failed: {e}");
                    report.errors.push(format!("{}: {e}", page.relative));
                    continue;
                }
            };
            if !outcome.changed() {
                continue;
            }
            if !dry_run && let Err(e) = write_atomic(&page.path, &outcome.html).await {
                tracing::warn!(file = %page.relative, "write failed: {e}");
                report.errors.push(format!("{}: {e}", page.relative));
                continue;
            }
            tracing::info!(file = %page.relative, fixes = ?outcome.applied, dry_run, "page fixed");
            report.files_changed += 1;
            for (kind, count) in &outcome.applied {
                *report.totals.entry(*kind).or_insert(0) += count;
            }
            report.files.push(FileFixes {
                file: page.relative,
                applied: outcome.applied,
            });
        }
        report
    }
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("html.tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| AuditError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| AuditError::io(path, e))
}
