//! Command orchestration: every CLI command is one method on [`Pipeline`],
//! threading the same [`Config`] through the component crates.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use coursekit_audit::{
    AuditReport, Auditor, Corpus, FixReport, Fixer, LinkChecker, LinkReport, write_audit_report,
    write_link_report,
};
use coursekit_gateway::GatewayServer;
use coursekit_knowledge::{BuildReport, KnowledgeBase, KnowledgeBuilder};
use coursekit_pages::PageWriter;
use coursekit_tutor::{TutorService, load_knowledge};
use tokio::sync::watch;

use crate::config::Config;

/// Findings of one audit: page issues plus link results.
#[derive(Debug)]
pub struct AuditRun {
    pub report: AuditReport,
    pub links: LinkReport,
}

impl AuditRun {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.report.has_issues() && !self.links.has_broken()
    }
}

#[derive(Debug)]
pub struct PipelineSummary {
    pub knowledge: BuildReport,
    pub pages: Vec<PathBuf>,
    /// One report per fix pass that ran.
    pub fix_passes: Vec<FixReport>,
    pub audit: AuditRun,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HTML pages under the project root.
    #[must_use]
    pub fn corpus(&self) -> Corpus {
        Corpus::discover(&self.config.project.root, &self.config.project.exclude)
    }

    /// Build the knowledge base from the configured source directories and
    /// write it to the output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the knowledge base file cannot be written.
    pub async fn extract(&self) -> anyhow::Result<(KnowledgeBase, BuildReport)> {
        let builder = KnowledgeBuilder::new(&self.config.knowledge);
        let (knowledge, report) = builder.build(&self.config.project.root).await;
        let path = self.config.knowledge_path();
        knowledge
            .save(&path)
            .await
            .with_context(|| format!("failed to write knowledge base {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            files = report.files_extracted,
            items = report.items_extracted,
            "knowledge base built"
        );
        Ok((knowledge, report))
    }

    /// Render chapter pages, filling formula sheets from the saved knowledge
    /// base when one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be written.
    pub async fn generate(&self) -> anyhow::Result<Vec<PathBuf>> {
        let path = self.config.knowledge_path();
        let knowledge = match KnowledgeBase::load(&path).await {
            Ok(kb) => Some(kb),
            Err(e) => {
                tracing::warn!(path = %path.display(), "rendering without knowledge base: {e}");
                None
            }
        };
        self.generate_with(knowledge.as_ref()).await
    }

    /// # Errors
    ///
    /// Returns an error if a page cannot be written.
    pub async fn generate_with(&self, knowledge: Option<&KnowledgeBase>) -> anyhow::Result<Vec<PathBuf>> {
        let writer = PageWriter::new(self.config.output_dir(), self.config.pages.max_formulas);
        writer
            .write_all(&self.config.pages.chapters, knowledge)
            .await
            .context("failed to write chapter pages")
    }

    /// Run every auditor and write both reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a report cannot
    /// be written.
    pub async fn audit(&self, skip_external: bool) -> anyhow::Result<AuditRun> {
        let run = self.inspect(&self.corpus(), skip_external).await?;
        let dir = self.config.output_dir();
        write_audit_report(&dir, &run.report)
            .await
            .context("failed to write accessibility report")?;
        write_link_report(&dir, &run.links)
            .await
            .context("failed to write link report")?;
        Ok(run)
    }

    /// Check links only and write the link report.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the report
    /// cannot be written.
    pub async fn links(&self, skip_external: bool) -> anyhow::Result<LinkReport> {
        let report = self.link_checker(skip_external)?.check(&self.corpus()).await;
        write_link_report(&self.config.output_dir(), &report)
            .await
            .context("failed to write link report")?;
        Ok(report)
    }

    /// Apply every fixer to the corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured link rule is invalid.
    pub async fn fix(&self, dry_run: bool) -> anyhow::Result<FixReport> {
        let fixer = self.fixer()?;
        Ok(fixer.fix_corpus(&self.corpus(), dry_run).await)
    }

    /// extract → generate → (audit → fix)* → audit. Fix rounds stop when the
    /// corpus is clean, a round changes nothing, or `max_fix_passes` is hit.
    /// Intermediate audits skip external requests; the final one does not.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub async fn run(&self) -> anyhow::Result<PipelineSummary> {
        let (knowledge, build) = self.extract().await?;
        let pages = self.generate_with(Some(&knowledge)).await?;
        let fixer = self.fixer()?;

        let mut fix_passes = Vec::new();
        for pass in 1..=self.config.pipeline.max_fix_passes {
            let corpus = self.corpus();
            if self.inspect(&corpus, true).await?.is_clean() {
                tracing::info!(pass, "corpus clean");
                break;
            }
            let report = fixer.fix_corpus(&corpus, false).await;
            let changed = report.files_changed;
            tracing::info!(pass, files_changed = changed, fixes = report.total_fixes(), "fix pass done");
            fix_passes.push(report);
            if changed == 0 {
                break;
            }
        }

        let audit = self.audit(false).await?;
        Ok(PipelineSummary {
            knowledge: build,
            pages,
            fix_passes,
            audit,
        })
    }

    /// Serve the tutor endpoint until `shutdown_rx` flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM client cannot be created or the server fails.
    pub async fn serve(&self, shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
        let knowledge = load_knowledge(&self.config.tutor_knowledge_path()).await;
        let tutor = TutorService::from_config(&self.config.tutor, Arc::new(knowledge))
            .context("failed to create tutor service")?;
        let server = GatewayServer::new(&self.config.gateway, Arc::new(tutor), shutdown_rx);
        server.serve().await.context("tutor gateway failed")
    }

    async fn inspect(&self, corpus: &Corpus, skip_external: bool) -> anyhow::Result<AuditRun> {
        let report = Auditor::new(&self.config.audit).audit(corpus).await;
        let links = self.link_checker(skip_external)?.check(corpus).await;
        Ok(AuditRun { report, links })
    }

    fn link_checker(&self, skip_external: bool) -> anyhow::Result<LinkChecker> {
        Ok(LinkChecker::new(&self.config.audit.links)
            .context("failed to build link checker")?
            .skip_external(skip_external))
    }

    fn fixer(&self) -> anyhow::Result<Fixer> {
        Fixer::new(&self.config.fix, &self.config.audit).context("invalid fix configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const NOTES: &str = "# Chapter 6: Personal Finance\n\nI = Prt\nA = P(1 + r/n)^(nt)\n";

    const MESSY_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>Dashboard</title></head>
<body>
<h1>Dashboard</h1>
<p class="text-gray-400 bg-white">Low contrast note</p>
<img src="logo.png">
<a href="chapter-1.html">Chapter 1</a>
<a href="gone.html">Old page</a>
</body></html>"#;

    fn config_for(root: &Path) -> Config {
        let mut config = Config::default();
        config.project.root = root.to_path_buf();
        config.knowledge.source_dirs = vec!["math".into()];
        config.audit.links.check_external = false;
        config
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("math/chapter_6")).unwrap();
        std::fs::write(dir.path().join("math/chapter_6/notes.md"), NOTES).unwrap();
        std::fs::write(dir.path().join("index.html"), MESSY_INDEX).unwrap();
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();
        std::fs::write(dir.path().join("design-system.css"), "body {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn extract_then_generate_fills_formula_sheet() {
        let dir = site();
        let pipeline = Pipeline::new(config_for(dir.path()));
        let (knowledge, report) = pipeline.extract().await.unwrap();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(knowledge.formulas_for("chapter_6").count(), 2);
        assert!(dir.path().join("ai_knowledge_base.json").exists());

        let pages = pipeline.generate().await.unwrap();
        assert_eq!(pages.len(), 3);
        let chapter6 = std::fs::read_to_string(dir.path().join("chapter-6.html")).unwrap();
        assert!(chapter6.contains("I = Prt"));
    }

    #[tokio::test]
    async fn generate_without_knowledge_base_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config_for(dir.path()));
        let pages = pipeline.generate().await.unwrap();
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test]
    async fn audit_writes_both_reports() {
        let dir = site();
        let pipeline = Pipeline::new(config_for(dir.path()));
        let run = pipeline.audit(true).await.unwrap();
        assert!(!run.is_clean());
        assert!(run.links.has_broken());
        for name in [
            "accessibility_report.json",
            "accessibility_report.html",
            "link_check_report.json",
            "link_check_report.html",
        ] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[tokio::test]
    async fn fix_dry_run_leaves_files() {
        let dir = site();
        let pipeline = Pipeline::new(config_for(dir.path()));
        let report = pipeline.fix(true).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.files_changed, 1);
        let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(html, MESSY_INDEX);
    }

    #[tokio::test]
    async fn full_run_fixes_links() {
        let dir = site();
        let pipeline = Pipeline::new(config_for(dir.path()));
        let summary = pipeline.run().await.unwrap();
        assert_eq!(summary.pages.len(), 3);
        assert!(!summary.fix_passes.is_empty());
        assert!(summary.fix_passes.len() <= 3);
        assert!(!summary.audit.links.has_broken());

        let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(!html.contains(r#"href="gone.html""#));
        assert!(html.contains(r#"href="chapter-1.html""#));
    }
}
