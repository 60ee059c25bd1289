//! Course material extraction: load documents, pull out formulas, concepts,
//! procedures and writing guidance, and fold them into a [`KnowledgeBase`].

pub mod base;
pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;

pub use base::{Detail, KnowledgeBase, KnowledgeItem};
pub use builder::{BuildReport, KnowledgeBuilder};
pub use classify::chapter_key;
pub use config::KnowledgeConfig;
pub use error::{KnowledgeError, Result};
pub use extract::{ExtractedDocument, ExtractedItem, extract_document};
pub use loader::{Category, SourceDocument, SourceFormat, SourceLoader};
