#[derive(Debug, thiserror::Error)]
pub enum PagesError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
