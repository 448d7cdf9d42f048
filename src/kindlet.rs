//! Identity metadata from Kindlets (`.azw2`), which are JAR archives.

use std::io::Read;
use std::sync::LazyLock;

use regex_lite::Regex;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::identity::{BookMetadata, MetadataReader};
use crate::io::{ByteSource, ByteSourceCursor};
use crate::util::decode_text;

/// Archive entry holding the Kindlet's attributes.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Implementation-Title:[ \t]*(.*?)[ \t\r]*$").unwrap());
static ASIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Amazon-ASIN:[ \t]*(.*?)[ \t\r]*$").unwrap());

/// Pull title and ASIN out of manifest text. Each is independently optional.
pub fn parse_manifest(text: &str) -> BookMetadata {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|value| !value.is_empty())
    };
    BookMetadata {
        title: capture(&TITLE_RE),
        asin: capture(&ASIN_RE),
        book_type: None,
    }
}

/// Reader for Kindlet archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct KindletReader;

impl KindletReader {
    /// Read the manifest text out of the archive.
    pub fn read_manifest(&self, source: &dyn ByteSource) -> Result<String> {
        let mut archive = ZipArchive::new(ByteSourceCursor::new(source)).map_err(|e| match e {
            ZipError::InvalidArchive(msg) => Error::mismatch(format!("not a zip archive: {msg}")),
            other => Error::Zip(other),
        })?;
        let mut entry = archive.by_name(MANIFEST_PATH).map_err(|e| match e {
            ZipError::FileNotFound => Error::damaged(format!("archive has no {MANIFEST_PATH}")),
            other => Error::Zip(other),
        })?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(decode_text(&bytes, None).into_owned())
    }
}

impl MetadataReader for KindletReader {
    fn name(&self) -> &'static str {
        "kindlet"
    }

    fn read_metadata(&self, source: &dyn ByteSource) -> Result<BookMetadata> {
        Ok(parse_manifest(&self.read_manifest(source)?))
    }
}
