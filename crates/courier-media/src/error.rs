use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the media layer.
///
/// A missing backend or an inconclusive inspection is never reported here;
/// those surface as `Ok(false)` / `Ok(None)`.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported/unrecognized file type for: {}", path.display())]
    UnrecognizedType { path: PathBuf },

    #[error("unsupported/unrecognized mimetype: {mime}")]
    UnrecognizedMime { mime: String },

    #[error("malformed MIME table at line {line}: {content:?}")]
    MalformedTable { line: usize, content: String },

    #[error("unknown image format: {0}")]
    UnknownFormat(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_type_display() {
        let e = MediaError::UnrecognizedType {
            path: PathBuf::from("/tmp/blob.xyz"),
        };
        assert!(e.to_string().contains("/tmp/blob.xyz"));
    }

    #[test]
    fn unrecognized_mime_display() {
        let e = MediaError::UnrecognizedMime {
            mime: "application/x-nothing".into(),
        };
        assert!(e.to_string().contains("application/x-nothing"));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MediaError = io_err.into();
        assert!(matches!(err, MediaError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
