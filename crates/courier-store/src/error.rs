use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid account key: {0:?}")]
    InvalidAccountKey(String),

    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),

    #[error("cannot expand '~': home directory is unknown")]
    HomeDirUnavailable,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
