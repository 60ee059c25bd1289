//! Accessibility, readability and link auditing for generated course pages,
//! plus the fixers that repair what the audits find.

pub mod a11y;
pub mod auditor;
pub mod color;
pub mod config;
pub mod contrast;
pub mod corpus;
pub mod error;
pub mod fix;
pub mod issue;
pub mod links;
pub mod readability;
pub mod report;

pub use auditor::Auditor;
pub use color::{ColorTable, Rgb, contrast_ratio};
pub use config::{AuditConfig, FixConfig, LinkConfig, LinkRule};
pub use contrast::ContrastChecker;
pub use corpus::{Corpus, Page};
pub use error::{AuditError, Result};
pub use fix::{FileFixes, FixKind, FixOutcome, FixReport, Fixer};
pub use issue::{Issue, IssueKind, Severity};
pub use links::{LinkChecker, LinkKind, LinkRecord, LinkReport, LinkStatus, LinkSummary};
pub use readability::ReadabilityChecker;
pub use report::{AuditReport, AuditSummary, write_audit_report, write_link_report};
