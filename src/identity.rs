//! Book identity: the stable key a Kindle uses to refer to a file.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::io::ByteSource;

/// Metadata recovered by one of the format readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub asin: Option<String>,
    /// Short content type code, e.g. `EBOK` or `PDOC`.
    pub book_type: Option<String>,
}

/// A format-specific metadata extractor.
///
/// Readers see the file through a [`ByteSource`] so on-device files and
/// in-memory buffers go through the same code.
pub trait MetadataReader {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Extract metadata, or fail with `FormatMismatch` when the bytes are not
    /// this reader's format.
    fn read_metadata(&self, source: &dyn ByteSource) -> Result<BookMetadata>;
}

/// Identity of one file on the device.
///
/// `content_hash` is derived from `path` alone; the other fields are set only
/// when extraction succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookIdentity {
    pub content_hash: String,
    pub path: String,
    pub title: Option<String>,
    pub asin: Option<String>,
    pub book_type: Option<String>,
}

impl BookIdentity {
    /// Identity carrying only the path and its hash.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            content_hash: content_hash(&path),
            path,
            title: None,
            asin: None,
            book_type: None,
        }
    }

    pub fn with_metadata(mut self, metadata: BookMetadata) -> Self {
        self.title = metadata.title;
        self.asin = metadata.asin;
        self.book_type = metadata.book_type;
        self
    }

    /// The ASIN, if present and non-empty.
    pub fn asin(&self) -> Option<&str> {
        self.asin.as_deref().filter(|asin| !asin.is_empty())
    }

    /// File name component of the device path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Label for display: the title when known, the file name otherwise.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.file_name())
    }

    /// Lowercased extension of the device path.
    pub fn extension(&self) -> Option<String> {
        Path::new(self.file_name())
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// Lowercase hex SHA-1 of the UTF-8 device path.
pub fn content_hash(device_path: &str) -> String {
    sha1_smol::Sha1::from(device_path.as_bytes()).hexdigest()
}
