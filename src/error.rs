//! Error types for kindelabra operations.

use thiserror::Error;

/// Errors that can occur while identifying books or editing collections.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong magic: the bytes belong to some other format.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    /// Right magic, inconsistent structure.
    #[error("damaged container: {0}")]
    DamagedContainer(String),

    #[error("truncated input")]
    TruncatedInput,

    #[error("section {index} out of range ({count} sections)")]
    SectionIndex { index: usize, count: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

impl Error {
    pub(crate) fn damaged(msg: impl Into<String>) -> Self {
        Error::DamagedContainer(msg.into())
    }

    pub(crate) fn mismatch(msg: impl Into<String>) -> Self {
        Error::FormatMismatch(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::SectionIndex { index: 3, count: 2 };
        assert_eq!(err.to_string(), "section 3 out of range (2 sections)");
        assert_eq!(
            Error::mismatch("not BOOKMOBI").to_string(),
            "format mismatch: not BOOKMOBI"
        );
    }
}
