use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use coursekit_core::{AuditRun, Config, Pipeline, resolve_config_path};
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(
    name = "coursekit",
    version,
    about = "Build, audit and fix the course dashboard, and serve its AI tutor"
)]
struct Cli {
    /// Configuration file (falls back to COURSEKIT_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the knowledge base from course material
    Extract,
    /// Render chapter pages
    Generate,
    /// Run every auditor and write the reports
    Audit {
        /// Record external links without requesting them
        #[arg(long)]
        skip_external: bool,
    },
    /// Check links only
    Links {
        #[arg(long)]
        skip_external: bool,
    },
    /// Apply the accessibility and link fixers
    Fix {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// extract, generate, then audit and fix until clean
    Pipeline,
    /// Serve the tutor HTTP endpoint
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    tracing::debug!(config = %config_path.display(), root = %config.project.root.display(), "configuration loaded");
    let pipeline = Pipeline::new(config);

    match cli.command {
        Command::Extract => {
            let (knowledge, report) = pipeline.extract().await?;
            println!(
                "Extracted {} items from {} files ({} skipped), {} formulas",
                report.items_extracted,
                report.files_extracted,
                report.files_skipped,
                knowledge.formula_count()
            );
            println!("Knowledge base: {}", pipeline.config().knowledge_path().display());
        }
        Command::Generate => {
            for path in pipeline.generate().await? {
                println!("Generated {}", path.display());
            }
        }
        Command::Audit { skip_external } => {
            let run = pipeline.audit(skip_external).await?;
            print_audit(&run);
            if !run.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Links { skip_external } => {
            let report = pipeline.links(skip_external).await?;
            let s = &report.summary;
            println!(
                "Links: {} total, {} broken ({} file, {} external)",
                s.total_links, s.total_broken, s.broken_file_links, s.broken_external_links
            );
            if report.has_broken() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Fix { dry_run } => {
            let report = pipeline.fix(dry_run).await?;
            let verb = if dry_run { "Would fix" } else { "Fixed" };
            println!(
                "{verb} {} of {} files ({} fixes)",
                report.files_changed,
                report.files_checked,
                report.total_fixes()
            );
            for file in &report.files {
                println!("  {}: {:?}", file.file, file.applied);
            }
            for error in &report.errors {
                eprintln!("  error: {error}");
            }
        }
        Command::Pipeline => {
            let summary = pipeline.run().await?;
            println!(
                "Extracted {} files, generated {} pages, ran {} fix passes",
                summary.knowledge.files_extracted,
                summary.pages.len(),
                summary.fix_passes.len()
            );
            print_audit(&summary.audit);
            if !summary.audit.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Serve => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to listen for ctrl-c: {e:#}");
                    return;
                }
                tracing::info!("received shutdown signal");
                let _ = shutdown_tx.send(true);
            });
            pipeline.serve(shutdown_rx).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_audit(run: &AuditRun) {
    let summary = &run.report.summary;
    println!(
        "Audited {} files: {} issues",
        summary.files_checked, summary.total_issues
    );
    for (kind, count) in &summary.by_kind {
        println!("  {kind}: {count}");
    }
    let links = &run.links.summary;
    println!(
        "Links: {} total, {} broken",
        links.total_links, links.total_broken
    );
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["coursekit", "--config", "site.toml", "audit", "--skip-external"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("site.toml")));
        assert!(matches!(cli.command, Command::Audit { skip_external: true }));

        let cli = Cli::parse_from(["coursekit", "fix", "--dry-run"]);
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Command::Fix { dry_run: true }));
    }
}
