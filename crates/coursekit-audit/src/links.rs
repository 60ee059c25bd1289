//! Link extraction, classification and validation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use crate::config::LinkConfig;
use crate::corpus::{Corpus, Page};
use crate::error::Result;

static LINKED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[href], [src]").unwrap());

const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];
const INTERNAL_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    File,
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    Ok,
    Broken,
    /// Recorded but not requested.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source_file: String,
    pub url: String,
    pub kind: LinkKind,
    pub status: LinkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub total_links: usize,
    pub file_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub broken_file_links: usize,
    pub broken_external_links: usize,
    pub total_broken: usize,
    pub check_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    pub summary: LinkSummary,
    pub file_links: Vec<LinkRecord>,
    pub internal_links: Vec<LinkRecord>,
    pub external_links: Vec<LinkRecord>,
}

impl LinkReport {
    #[must_use]
    pub fn from_records(records: Vec<LinkRecord>) -> Self {
        let mut report = Self::default();
        for record in records {
            match record.kind {
                LinkKind::File => report.file_links.push(record),
                LinkKind::Internal => report.internal_links.push(record),
                LinkKind::External => report.external_links.push(record),
            }
        }
        let broken = |records: &[LinkRecord]| {
            records
                .iter()
                .filter(|r| r.status == LinkStatus::Broken)
                .count()
        };
        let broken_file_links = broken(&report.file_links);
        let broken_external_links = broken(&report.external_links);
        report.summary = LinkSummary {
            total_links: report.file_links.len()
                + report.internal_links.len()
                + report.external_links.len(),
            file_links: report.file_links.len(),
            internal_links: report.internal_links.len(),
            external_links: report.external_links.len(),
            broken_file_links,
            broken_external_links,
            total_broken: broken_file_links + broken_external_links,
            check_time: chrono::Utc::now().to_rfc3339(),
        };
        report
    }

    #[must_use]
    pub fn has_broken(&self) -> bool {
        self.summary.total_broken > 0
    }

    pub fn broken(&self) -> impl Iterator<Item = &LinkRecord> {
        self.file_links
            .iter()
            .chain(&self.external_links)
            .filter(|r| r.status == LinkStatus::Broken)
    }
}

/// Classify a link target; `None` for targets that are never checked.
#[must_use]
pub fn classify(url: &str) -> Option<LinkKind> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if url.is_empty()
        || url.starts_with('#')
        || SKIPPED_SCHEMES.iter().any(|s| lower.starts_with(s))
    {
        return None;
    }
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_owned()
    } else if url.starts_with("//") {
        format!("https:{url}")
    } else {
        return Some(LinkKind::File);
    };
    let host = url::Url::parse(&absolute)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_default();
    if host.is_empty() || INTERNAL_HOSTS.contains(&host.as_str()) {
        Some(LinkKind::Internal)
    } else {
        Some(LinkKind::External)
    }
}

/// Drop the query and fragment from a file link.
#[must_use]
pub fn strip_suffixes(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Resolve a file link: `/`-prefixed paths from `root`, others relative to
/// the directory of `source`. The result is normalized lexically.
#[must_use]
pub fn resolve_file(root: &Path, source: &Path, url: &str) -> PathBuf {
    let target = strip_suffixes(url.trim());
    if target.is_empty() {
        return source.to_path_buf();
    }
    let joined = if let Some(rooted) = target.strip_prefix('/') {
        root.join(rooted)
    } else {
        source.parent().unwrap_or(root).join(target)
    };
    normalize(&joined)
}

/// A file link target counts as present when it is a file, or a directory
/// holding `index.html`.
#[must_use]
pub fn target_exists(path: &Path) -> bool {
    path.is_file() || (path.is_dir() && path.join("index.html").is_file())
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Every `href` and `src` value in document order.
#[must_use]
pub fn collect_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&LINKED)
        .flat_map(|el| {
            let value = el.value();
            [value.attr("href"), value.attr("src")]
        })
        .flatten()
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadOutcome {
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

pub struct LinkChecker {
    client: reqwest::Client,
    concurrency: usize,
    check_external: bool,
}

impl LinkChecker {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LinkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
            check_external: config.check_external,
        })
    }

    /// Record external links without requesting them.
    #[must_use]
    pub fn skip_external(mut self, skip: bool) -> Self {
        if skip {
            self.check_external = false;
        }
        self
    }

    /// Check every link in the corpus.
    pub async fn check(&self, corpus: &Corpus) -> LinkReport {
        let pages = corpus.pages().await;
        self.check_pages(corpus.root(), &pages).await
    }

    pub async fn check_pages(&self, root: &Path, pages: &[Page]) -> LinkReport {
        let mut records = Vec::new();
        for page in pages {
            for url in collect_links(&page.html) {
                let Some(kind) = classify(&url) else {
                    continue;
                };
                records.push(record_for(root, page, url, kind));
            }
        }

        if self.check_external {
            let urls: BTreeSet<String> = records
                .iter()
                .filter(|r| r.kind == LinkKind::External)
                .map(|r| r.url.clone())
                .collect();
            let outcomes = self.check_urls(urls).await;
            for record in records.iter_mut().filter(|r| r.kind == LinkKind::External) {
                if let Some(outcome) = outcomes.get(&record.url) {
                    record.status = outcome.status;
                    record.status_code = outcome.status_code;
                    record.error.clone_from(&outcome.error);
                }
            }
        }

        let report = LinkReport::from_records(records);
        tracing::info!(
            total = report.summary.total_links,
            broken = report.summary.total_broken,
            "link check complete"
        );
        report
    }

    /// HEAD each URL once, at most `concurrency` at a time.
    pub async fn check_urls(&self, urls: BTreeSet<String>) -> HashMap<String, HeadOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();

        for url in urls {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let target = url.clone();
            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return failed("request limiter closed".into());
                };
                head(&client, &target).await
            });
            pending.insert(handle.id(), url);
        }

        collect_outcomes(tasks, pending).await
    }
}

/// Join every HEAD task. A task that panics or is cancelled leaves its URL broken.
async fn collect_outcomes(
    mut tasks: JoinSet<HeadOutcome>,
    mut pending: HashMap<Id, String>,
) -> HashMap<String, HeadOutcome> {
    let mut outcomes = HashMap::with_capacity(pending.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!("link check task failed: {e}");
                (e.id(), failed(format!("check task failed: {e}")))
            }
        };
        if let Some(url) = pending.remove(&id) {
            outcomes.insert(url, outcome);
        }
    }
    outcomes
}

fn record_for(root: &Path, page: &Page, url: String, kind: LinkKind) -> LinkRecord {
    let mut record = LinkRecord {
        source_file: page.relative.clone(),
        url,
        kind,
        status: LinkStatus::Skipped,
        resolved_path: None,
        status_code: None,
        error: None,
    };
    if kind == LinkKind::File {
        let resolved = resolve_file(root, &page.path, &record.url);
        record.status = if target_exists(&resolved) {
            LinkStatus::Ok
        } else {
            tracing::debug!(source = %page.relative, url = %record.url, "broken file link");
            LinkStatus::Broken
        };
        record.resolved_path = Some(
            resolved
                .strip_prefix(root)
                .unwrap_or(&resolved)
                .display()
                .to_string(),
        );
    }
    record
}

async fn head(client: &reqwest::Client, url: &str) -> HeadOutcome {
    match client.head(url).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            HeadOutcome {
                status: if code < 400 {
                    LinkStatus::Ok
                } else {
                    LinkStatus::Broken
                },
                status_code: Some(code),
                error: None,
            }
        }
        Err(e) => {
            tracing::debug!(url, "external link failed: {e}");
            failed(e.to_string())
        }
    }
}

fn failed(error: String) -> HeadOutcome {
    HeadOutcome {
        status: LinkStatus::Broken,
        status_code: None,
        error: Some(error),
    }
}

/// Broken links grouped by source page.
#[must_use]
pub fn broken_by_page(report: &LinkReport) -> BTreeMap<&str, Vec<&LinkRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&LinkRecord>> = BTreeMap::new();
    for record in report.broken() {
        grouped
            .entry(record.source_file.as_str())
            .or_default()
            .push(record);
    }
    grouped
}
