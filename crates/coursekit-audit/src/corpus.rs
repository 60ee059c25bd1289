//! The set of HTML pages an audit or fix run operates on.

use std::path::{Path, PathBuf};

use coursekit_knowledge::loader::decode_text;

use crate::error::{AuditError, Result};

/// Directory names skipped when no exclusion list is configured.
pub const DEFAULT_EXCLUDES: &[&str] = &["dist", "node_modules", "_archived", "target"];

const REPORT_SUFFIX: &str = "_report.html";

/// Sorted list of HTML files under a project root.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    files: Vec<PathBuf>,
}

/// A page read into memory.
#[derive(Debug, Clone)]
pub struct Page {
    pub path: PathBuf,
    pub relative: String,
    pub html: String,
}

impl Corpus {
    /// Walk `root` for `*.html`, skipping hidden entries, any directory named in
    /// `exclude`, and generated report pages.
    #[must_use]
    pub fn discover(root: &Path, exclude: &[String]) -> Self {
        let exclude: Vec<String> = exclude.to_vec();
        let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(true)
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !entry.file_type().is_some_and(|t| t.is_dir())
                    || !exclude
                        .iter()
                        .any(|name| entry.file_name().to_str() == Some(name.as_str()))
            })
            .build()
            .flatten()
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|path| is_auditable(path))
            .collect();
        files.sort();
        tracing::debug!(root = %root.display(), files = files.len(), "corpus discovered");
        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    #[must_use]
    pub fn from_files(root: &Path, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path relative to the root with `/` separators.
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Reads a page as UTF-8, falling back to Latin-1.
    ///
    /// # Errors
    ///
    /// `AuditError::Io` if the file cannot be read, `AuditError::NotText` if it
    /// holds NUL bytes.
    pub async fn read(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AuditError::io(path, e))?;
        decode_text(&bytes).ok_or_else(|| AuditError::NotText {
            path: path.display().to_string(),
        })
    }

    /// Every readable page. Unreadable files are logged and skipped.
    pub async fn pages(&self) -> Vec<Page> {
        let mut pages = Vec::with_capacity(self.files.len());
        for path in &self.files {
            match self.read(path).await {
                Ok(html) => pages.push(Page {
                    path: path.clone(),
                    relative: self.relative(path),
                    html,
                }),
                Err(e) => tracing::warn!("skipping page: {e}"),
            }
        }
        pages
    }
}

fn is_auditable(path: &Path) -> bool {
    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"));
    let is_report = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(REPORT_SUFFIX));
    is_html && !is_report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excludes() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(|s| (*s).to_owned()).collect()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<p>x</p>").unwrap();
    }

    #[test]
    fn discovers_sorted_html_only() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "zeta.html",
            "alpha.html",
            "notes.md",
            "chapters/chapter-1.html",
            "dist/chapter-1.html",
            "node_modules/pkg/index.html",
            "_archived/old.html",
            "accessibility_report.html",
            ".cache/hidden.html",
        ] {
            touch(dir.path(), rel);
        }

        let corpus = Corpus::discover(dir.path(), &excludes());
        let rel: Vec<_> = corpus.files().iter().map(|p| corpus.relative(p)).collect();
        assert_eq!(rel, vec!["alpha.html", "chapters/chapter-1.html", "zeta.html"]);
    }

    #[test]
    fn exclusion_list_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/page.html");
        touch(dir.path(), "drafts/page.html");

        let corpus = Corpus::discover(dir.path(), &["drafts".to_owned()]);
        let rel: Vec<_> = corpus.files().iter().map(|p| corpus.relative(p)).collect();
        assert_eq!(rel, vec!["dist/page.html"]);
    }

    #[tokio::test]
    async fn latin1_pages_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cafe.html"), b"<p>caf\xE9</p>").unwrap();

        let corpus = Corpus::discover(dir.path(), &excludes());
        let pages = corpus.pages().await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].html, "<p>caf\u{e9}</p>");
    }

    #[tokio::test]
    async fn unreadable_pages_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ok.html");
        std::fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0x00]).unwrap();

        let corpus = Corpus::discover(dir.path(), &excludes());
        assert_eq!(corpus.len(), 2);
        let pages = corpus.pages().await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].relative, "ok.html");
    }
}
