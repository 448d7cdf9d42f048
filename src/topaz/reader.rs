//! Identity metadata from Topaz (`.tpz`, `.azw1`) files.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::identity::{BookMetadata, MetadataReader};
use crate::io::ByteSource;

use super::header::TopazHeader;
use super::vwi::Cursor;

/// Tag name of the metadata record, repeated at the start of its body.
const METADATA_TAG: &[u8] = b"metadata";

/// First read when looking for the end of the header table; grown on demand.
const INITIAL_HEADER_WINDOW: u64 = 4096;

pub const KEY_TITLE: &str = "Title";
pub const KEY_ASIN: &str = "ASIN";
pub const KEY_CDE_TYPE: &str = "CDEType";

/// The string-keyed metadata record of a Topaz book.
#[derive(Debug, Clone)]
pub struct TopazMetadata {
    pub flags: u8,
    pub values: BTreeMap<String, String>,
}

impl TopazMetadata {
    /// Parse the metadata record body.
    ///
    /// The body opens with its own tag (`\x08metadata`); anything else means
    /// the header table points at the wrong place.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.get(1..1 + METADATA_TAG.len()) != Some(METADATA_TAG) {
            return Err(Error::damaged("metadata record does not start with its tag"));
        }

        let mut cursor = Cursor::new(body);
        let _tag = cursor.read_string()?;
        let flags = cursor.read_u8()?;
        let count = cursor.read_u8()?;

        let mut values = BTreeMap::new();
        for _ in 0..count {
            let key = cursor.read_string()?;
            let value = cursor.read_string()?;
            values.insert(key, value);
        }
        Ok(Self { flags, values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(str::to_string)
            .ok_or_else(|| Error::damaged(format!("Topaz metadata has no {key} entry")))
    }

    /// Title, ASIN and content type. All three must be present.
    pub fn into_book_metadata(self) -> Result<BookMetadata> {
        Ok(BookMetadata {
            title: Some(self.required(KEY_TITLE)?),
            asin: Some(self.required(KEY_ASIN)?),
            book_type: Some(self.required(KEY_CDE_TYPE)?),
        })
    }
}

/// Read the header table, widening the read until the table fits.
pub fn read_header(source: &dyn ByteSource) -> Result<TopazHeader> {
    let total = source.len();
    let mut window = INITIAL_HEADER_WINDOW.min(total);
    loop {
        let data = source.read_at(0, window as usize)?;
        match TopazHeader::parse(&data) {
            Err(Error::TruncatedInput) if window < total => {
                window = window.saturating_mul(4).min(total);
            }
            result => return result,
        }
    }
}

/// Reader for Topaz containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopazReader;

impl TopazReader {
    /// Validate the container and return its full metadata record.
    pub fn read_record(&self, source: &dyn ByteSource) -> Result<TopazMetadata> {
        let header = read_header(source)?;
        let (start, block) = header.metadata_block()?;
        let end = start.saturating_add(block.len_uncompressed);
        let body = source.read_clamped(start as u64, end as u64)?;
        TopazMetadata::parse(&body)
    }
}

impl MetadataReader for TopazReader {
    fn name(&self) -> &'static str {
        "topaz"
    }

    fn read_metadata(&self, source: &dyn ByteSource) -> Result<BookMetadata> {
        self.read_record(source)?.into_book_metadata()
    }
}
