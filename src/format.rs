//! Reader selection by file extension.

use std::path::Path;

use crate::error::Result;
use crate::identity::{BookIdentity, BookMetadata, MetadataReader};
use crate::io::{ByteSource, FileSource};
use crate::kindlet::KindletReader;
use crate::mobi::MobiReader;
use crate::topaz::TopazReader;

/// Identity-bearing format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    /// `BOOKMOBI` containers: `.mobi`, `.prc`, `.azw`, `.azw3`.
    Mobi,
    /// `.tpz`, `.azw1`.
    Topaz,
    /// `.azw2`.
    Kindlet,
    /// Anything else: indexed by path hash only.
    Other,
}

impl BookFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mobi" | "prc" | "azw" | "azw3" => BookFormat::Mobi,
            "tpz" | "azw1" => BookFormat::Topaz,
            "azw2" => BookFormat::Kindlet,
            _ => BookFormat::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .unwrap_or(BookFormat::Other)
    }

    /// The reader for this format, or `None` for [`BookFormat::Other`].
    pub fn reader(self) -> Option<&'static dyn MetadataReader> {
        match self {
            BookFormat::Mobi => Some(&MobiReader),
            BookFormat::Topaz => Some(&TopazReader),
            BookFormat::Kindlet => Some(&KindletReader),
            BookFormat::Other => None,
        }
    }

    /// Run this format's reader. `Other` yields empty metadata.
    pub fn read_metadata(self, source: &dyn ByteSource) -> Result<BookMetadata> {
        match self.reader() {
            Some(reader) => reader.read_metadata(source),
            None => Ok(BookMetadata::default()),
        }
    }
}

/// Build the identity of `device_path` from bytes already at hand.
///
/// Extraction failures degrade to a hash-only identity; the error is logged.
pub fn identify_source(
    format: BookFormat,
    device_path: &str,
    source: &dyn ByteSource,
) -> BookIdentity {
    let identity = BookIdentity::new(device_path);
    match format.read_metadata(source) {
        Ok(metadata) => identity.with_metadata(metadata),
        Err(err) => {
            tracing::warn!(path = device_path, ?format, error = %err, "metadata unavailable");
            identity
        }
    }
}

/// Open `host_path` and build the identity of the file the device calls
/// `device_path`. Never fails: unreadable files get a hash-only identity.
pub fn identify_file(host_path: &Path, device_path: &str) -> BookIdentity {
    let format = BookFormat::from_path(host_path);
    if format == BookFormat::Other {
        return BookIdentity::new(device_path);
    }
    match FileSource::open(host_path) {
        Ok(source) => identify_source(format, device_path, &source),
        Err(err) => {
            tracing::warn!(path = %host_path.display(), error = %err, "cannot open file");
            BookIdentity::new(device_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(BookFormat::from_extension("MOBI"), BookFormat::Mobi);
        assert_eq!(BookFormat::from_extension("azw3"), BookFormat::Mobi);
        assert_eq!(BookFormat::from_extension("azw1"), BookFormat::Topaz);
        assert_eq!(BookFormat::from_extension("azw2"), BookFormat::Kindlet);
        assert_eq!(BookFormat::from_extension("pdf"), BookFormat::Other);
        assert_eq!(BookFormat::from_path(Path::new("noext")), BookFormat::Other);
    }

    #[test]
    fn test_bad_bytes_fall_back_to_hash_only() {
        let source = MemorySource::new(b"definitely not a mobi".to_vec());
        let identity = identify_source(BookFormat::Mobi, "/mnt/us/documents/x.mobi", &source);
        assert_eq!(identity, BookIdentity::new("/mnt/us/documents/x.mobi"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let identity = identify_file(
            Path::new("/nonexistent/documents/a.azw"),
            "/mnt/us/documents/a.azw",
        );
        assert!(identity.title.is_none());
        assert_eq!(identity.path, "/mnt/us/documents/a.azw");
    }

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn len(&self) -> u64 {
            100
        }

        fn read_exact_at(&self, _offset: u64, _buf: &mut [u8]) -> std::io::Result<()> {
            Err(std::io::Error::other("device unplugged"))
        }
    }

    #[test]
    fn test_read_errors_fall_back_for_every_format() {
        for (format, path) in [
            (BookFormat::Mobi, "/mnt/us/documents/x.mobi"),
            (BookFormat::Topaz, "/mnt/us/documents/x.tpz"),
            (BookFormat::Kindlet, "/mnt/us/documents/x.azw2"),
        ] {
            assert_eq!(identify_source(format, path, &FailingSource), BookIdentity::new(path));
        }
    }
}
