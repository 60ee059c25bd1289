//! JSON and HTML renderings of audit and link results.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use coursekit_pages::html::escape;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::issue::Issue;
use crate::links::{LinkRecord, LinkReport, LinkStatus};

pub const AUDIT_REPORT_STEM: &str = "accessibility_report";
pub const LINK_REPORT_STEM: &str = "link_check_report";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub files_checked: usize,
    pub total_issues: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub generated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub issues: Vec<Issue>,
}

impl AuditReport {
    #[must_use]
    pub fn new(files_checked: usize, issues: Vec<Issue>) -> Self {
        let mut by_kind = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for issue in &issues {
            *by_kind.entry(issue.kind.as_str().to_owned()).or_insert(0) += 1;
            *by_severity
                .entry(issue.severity.as_str().to_owned())
                .or_insert(0) += 1;
        }
        Self {
            summary: AuditSummary {
                files_checked,
                total_issues: issues.len(),
                by_kind,
                by_severity,
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
            issues,
        }
    }

    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = page_open("Accessibility Report");
        let s = &self.summary;
        let _ = writeln!(
            out,
            "<section>\n<h2>Summary</h2>\n<p>{} files checked, {} issues found. Generated {}.</p>",
            s.files_checked,
            s.total_issues,
            escape(&s.generated_at)
        );
        write_counts(&mut out, "By severity", &s.by_severity);
        write_counts(&mut out, "By kind", &s.by_kind);
        out.push_str("</section>\n<section>\n<h2>Issues</h2>\n");
        if self.issues.is_empty() {
            out.push_str("<p>No issues found.</p>\n");
        } else {
            out.push_str(
                "<table>\n<thead><tr><th>File</th><th>Kind</th><th>Severity</th><th>Detail</th></tr></thead>\n<tbody>\n",
            );
            for issue in &self.issues {
                let _ = writeln!(
                    out,
                    "<tr class=\"{sev}\"><td>{}</td><td>{}</td><td>{sev}</td><td>{}</td></tr>",
                    escape(&issue.file),
                    issue.kind,
                    escape(&issue.detail),
                    sev = issue.severity.as_str(),
                );
            }
            out.push_str("</tbody>\n</table>\n");
        }
        out.push_str("</section>\n");
        page_close(out)
    }
}

fn write_counts(out: &mut String, heading: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    let _ = writeln!(out, "<h3>{heading}</h3>\n<ul>");
    for (name, count) in counts {
        let _ = writeln!(out, "<li>{}: {count}</li>", escape(name));
    }
    out.push_str("</ul>\n");
}

impl LinkReport {
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = page_open("Link Check Report");
        let s = &self.summary;
        let _ = writeln!(
            out,
            "<section>\n<h2>Summary</h2>\n<ul>\n<li>Total links: {}</li>\n<li>File links: {} ({} broken)</li>\n<li>External links: {} ({} broken)</li>\n<li>Internal links: {}</li>\n</ul>\n<p>Checked {}.</p>\n</section>",
            s.total_links,
            s.file_links,
            s.broken_file_links,
            s.external_links,
            s.broken_external_links,
            s.internal_links,
            escape(&s.check_time)
        );
        write_link_table(&mut out, "Broken file links", self.file_links.iter());
        write_link_table(&mut out, "Broken external links", self.external_links.iter());
        page_close(out)
    }
}

fn write_link_table<'a>(
    out: &mut String,
    heading: &str,
    records: impl Iterator<Item = &'a LinkRecord>,
) {
    let broken: Vec<_> = records.filter(|r| r.status == LinkStatus::Broken).collect();
    let _ = writeln!(out, "<section>\n<h2>{heading}</h2>");
    if broken.is_empty() {
        out.push_str("<p>None.</p>\n</section>\n");
        return;
    }
    out.push_str(
        "<table>\n<thead><tr><th>Page</th><th>Link</th><th>Result</th></tr></thead>\n<tbody>\n",
    );
    for record in broken {
        let result = match (&record.status_code, &record.error, &record.resolved_path) {
            (Some(code), _, _) => format!("HTTP {code}"),
            (None, Some(error), _) => escape(error),
            (None, None, Some(path)) => format!("missing {}", escape(path)),
            (None, None, None) => "broken".to_owned(),
        };
        let _ = writeln!(
            out,
            "<tr class=\"high\"><td>{}</td><td>{}</td><td>{result}</td></tr>",
            escape(&record.source_file),
            escape(&record.url)
        );
    }
    out.push_str("</tbody>\n</table>\n</section>\n");
}

fn page_open(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; color: #111827; background: #ffffff; max-width: 72rem; margin: 2rem auto; padding: 0 1rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #d1d5db; padding: 0.4rem; text-align: left; vertical-align: top; }}
tr.high td {{ background: #fef2f2; }}
tr.medium td {{ background: #fffbeb; }}
</style>
</head>
<body>
<h1>{title}</h1>
"#
    )
}

fn page_close(mut out: String) -> String {
    out.push_str("</body>\n</html>\n");
    out
}

/// Write `{stem}.json` and `{stem}.html` into `dir`, returning both paths.
///
/// # Errors
///
/// Returns an error if serialization or a write fails.
pub async fn write_report<T: Serialize>(
    dir: &Path,
    stem: &str,
    value: &T,
    html: &str,
) -> Result<(PathBuf, PathBuf)> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AuditError::io(dir, e))?;
    let json_path = dir.join(format!("{stem}.json"));
    let html_path = dir.join(format!("{stem}.html"));
    tokio::fs::write(&json_path, serde_json::to_string_pretty(value)?)
        .await
        .map_err(|e| AuditError::io(&json_path, e))?;
    tokio::fs::write(&html_path, html)
        .await
        .map_err(|e| AuditError::io(&html_path, e))?;
    tracing::info!(json = %json_path.display(), html = %html_path.display(), "report written");
    Ok((json_path, html_path))
}

/// # Errors
///
/// Returns an error if either file cannot be written.
pub async fn write_audit_report(dir: &Path, report: &AuditReport) -> Result<(PathBuf, PathBuf)> {
    write_report(dir, AUDIT_REPORT_STEM, report, &report.to_html()).await
}

/// # Errors
///
/// Returns an error if either file cannot be written.
pub async fn write_link_report(dir: &Path, report: &LinkReport) -> Result<(PathBuf, PathBuf)> {
    write_report(dir, LINK_REPORT_STEM, report, &report.to_html()).await
}
