use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeError, Result};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const ENGLISH_KEYWORDS: &[&str] = &["english", "eng111", "writing"];
const MATH_KEYWORDS: &[&str] = &["math", "mat143", "chapter", "unit"];

/// Subject a source document belongs to, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Math,
    English,
    General,
}

impl Category {
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if ENGLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::English
        } else if MATH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Math
        } else {
            Self::General
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::English => "english",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Text,
    Html,
}

impl SourceFormat {
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A course document read once per run.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// Path relative to the project root with `/` separators.
    pub relative: String,
    pub content: String,
    pub format: SourceFormat,
    pub category: Category,
}

pub struct SourceLoader {
    pub max_file_size: u64,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl SourceLoader {
    /// Read and decode one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, exceeds the size limit, has an
    /// unsupported extension, or does not decode as text.
    pub async fn load(&self, path: &Path, root: &Path) -> Result<SourceDocument> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = SourceFormat::from_extension(ext)
            .ok_or_else(|| KnowledgeError::UnsupportedFormat {
                extension: ext.to_owned(),
            })?;

        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > self.max_file_size {
            return Err(KnowledgeError::FileTooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let content = decode_text(&bytes).ok_or_else(|| KnowledgeError::NotText {
            path: path.to_path_buf(),
        })?;

        let relative = relative_path(path, root);
        let category = Category::from_path(&relative);

        Ok(SourceDocument {
            path: path.to_path_buf(),
            relative,
            content,
            format,
            category,
        })
    }
}

/// Decode as UTF-8, falling back to Latin-1. Content with NUL bytes is binary.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s.to_owned()),
        Err(_) => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[must_use]
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
