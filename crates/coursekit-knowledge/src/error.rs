use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("cannot read course material: {0}")]
    Io(#[from] std::io::Error),

    #[error("no loader for .{extension} files")]
    UnsupportedFormat { extension: String },

    #[error("{} is {size} bytes, over the {limit} byte limit", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The file contains NUL bytes.
    #[error("{} is not a text file", path.display())]
    NotText { path: PathBuf },

    #[error("knowledge base JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;
