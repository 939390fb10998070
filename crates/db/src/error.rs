use std::path::PathBuf;
use thiserror::Error;

/// Error types for the tunnel store
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DbError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Results using DbError
pub type Result<T> = std::result::Result<T, DbError>;
