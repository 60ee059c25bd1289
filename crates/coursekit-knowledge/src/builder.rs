//! Extraction orchestrator: walk → load → extract → fold.

use std::path::{Path, PathBuf};

use crate::base::KnowledgeBase;
use crate::config::KnowledgeConfig;
use crate::extract::{ExtractedDocument, extract_document};
use crate::loader::{SourceFormat, SourceLoader};

/// Summary of an extraction run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub files_scanned: usize,
    pub files_extracted: usize,
    pub files_skipped: usize,
    pub items_extracted: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

pub struct KnowledgeBuilder {
    loader: SourceLoader,
    source_dirs: Vec<String>,
    extensions: Vec<String>,
}

impl KnowledgeBuilder {
    #[must_use]
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self {
            loader: SourceLoader {
                max_file_size: config.max_file_size,
            },
            source_dirs: config.source_dirs.clone(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Candidate files under each configured source directory, sorted lexicographically.
    ///
    /// Missing source directories are logged and skipped.
    #[must_use]
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.source_dirs {
            let base = root.join(dir);
            if !base.is_dir() {
                tracing::warn!(dir = %base.display(), "source directory not found, skipping");
                continue;
            }
            files.extend(
                ignore::WalkBuilder::new(&base)
                    .hidden(true)
                    .git_ignore(true)
                    .build()
                    .flatten()
                    .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
                    .map(ignore::DirEntry::into_path)
                    .filter(|p| self.is_candidate(p)),
            );
        }
        files.sort();
        files.dedup();
        files
    }

    fn is_candidate(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| {
                self.extensions.contains(&ext) && SourceFormat::from_extension(&ext).is_some()
            })
    }

    /// Extract every candidate document. Per-file failures are recorded and skipped.
    pub async fn extract_tree(&self, root: &Path) -> (Vec<ExtractedDocument>, BuildReport) {
        let start = std::time::Instant::now();
        let mut report = BuildReport::default();
        let mut documents = Vec::new();

        let files = self.discover(root);
        let total = files.len();
        tracing::info!(total, "extraction started");

        for (i, path) in files.iter().enumerate() {
            report.files_scanned += 1;
            match self.loader.load(path, root).await {
                Ok(doc) => {
                    let extracted = extract_document(&doc);
                    report.files_extracted += 1;
                    report.items_extracted += extracted.items.len();
                    tracing::info!(
                        file = %doc.relative,
                        chapter = %extracted.chapter,
                        items = extracted.items.len(),
                        progress = format_args!("{}/{total}", i + 1),
                        "extracted"
                    );
                    documents.push(extracted);
                }
                Err(e) => {
                    report.files_skipped += 1;
                    tracing::warn!(file = %path.display(), "skipping: {e:#}");
                    report.errors.push(format!("{}: {e:#}", path.display()));
                }
            }
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        (documents, report)
    }

    /// Full rebuild: extract, then fold in sorted file order.
    pub async fn build(&self, root: &Path) -> (KnowledgeBase, BuildReport) {
        let (documents, report) = self.extract_tree(root).await;
        let kb = KnowledgeBase::from_documents(&documents);
        tracing::info!(
            files = report.files_extracted,
            skipped = report.files_skipped,
            formulas = kb.formula_count(),
            duration_ms = report.duration_ms,
            "knowledge base built"
        );
        (kb, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dirs: &[&str]) -> KnowledgeConfig {
        KnowledgeConfig {
            source_dirs: dirs.iter().map(|d| (*d).to_owned()).collect(),
            ..KnowledgeConfig::default()
        }
    }

    #[test]
    fn discover_sorts_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let materials = dir.path().join("course_materials");
        std::fs::create_dir_all(materials.join("chapter_6")).unwrap();
        std::fs::write(materials.join("b.md"), "x").unwrap();
        std::fs::write(materials.join("a.txt"), "x").unwrap();
        std::fs::write(materials.join("chapter_6").join("notes.html"), "x").unwrap();
        std::fs::write(materials.join("image.png"), "x").unwrap();

        let builder = KnowledgeBuilder::new(&config(&["course_materials"]));
        let files: Vec<_> = builder
            .discover(dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(&materials).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            files,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.md"),
                PathBuf::from("chapter_6/notes.html"),
            ]
        );
    }

    #[test]
    fn missing_source_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let builder = KnowledgeBuilder::new(&config(&["nope"]));
        assert!(builder.discover(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn unreadable_file_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let materials = dir.path().join("course_materials");
        std::fs::create_dir_all(&materials).unwrap();
        std::fs::write(materials.join("chapter_6.md"), "I = Prt\n").unwrap();
        std::fs::write(materials.join("binary.txt"), [0u8, 1, 2, 3]).unwrap();

        let builder = KnowledgeBuilder::new(&config(&["course_materials"]));
        let (kb, report) = builder.build(dir.path()).await;

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(kb.formulas_for("chapter_6").collect::<Vec<_>>(), vec!["I = Prt"]);
        assert_eq!(
            kb.metadata.sources,
            vec!["course_materials/chapter_6.md".to_owned()]
        );
    }
}
