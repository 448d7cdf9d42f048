//! Identity metadata from MOBI/PRC/AZW files.

use crate::error::{Error, Result};
use crate::identity::{BookMetadata, MetadataReader};
use crate::io::ByteSource;
use crate::util::{be_u32, metadata_string, slice};

use super::exth::{
    EXTH_ASIN, EXTH_CDE_TYPE, EXTH_PREAMBLE_LEN, EXTH_UPDATED_TITLE, ExthRecords,
};
use super::pdb::Sectionizer;

/// Size of the PalmDOC header that precedes the MOBI header in record 0.
/// The MOBI header length field does not count it.
const PALMDOC_HEADER_LEN: usize = 16;

/// Offset of the MOBI header length field within record 0.
const MOBI_LENGTH_OFFSET: usize = 20;

/// Offset of the text encoding (codepage) within record 0.
const ENCODING_OFFSET: usize = 28;

/// Offset of the (title offset, title length) pair within record 0.
const TITLE_OFFSET: usize = 84;

const CODEPAGE_UTF8: u32 = 65001;

/// Metadata parsed out of record 0.
#[derive(Debug, Clone)]
pub struct MobiMetadata {
    /// Title as stored in the MOBI header.
    pub header_title: Option<String>,
    pub exth: ExthRecords,
    encoding: &'static str,
}

impl MobiMetadata {
    /// Parse record 0 of a MOBI container.
    pub fn parse(record0: &[u8]) -> Result<Self> {
        let len_mobi = (be_u32(record0, MOBI_LENGTH_OFFSET)? as usize)
            .checked_add(PALMDOC_HEADER_LEN)
            .ok_or(Error::TruncatedInput)?;
        let mobi_raw = slice(record0, 0, len_mobi)?;

        let encoding = match be_u32(mobi_raw, ENCODING_OFFSET)? {
            CODEPAGE_UTF8 => "utf-8",
            _ => "windows-1252",
        };

        // The title bytes live elsewhere in record 0, addressed from its start.
        let title_offset = be_u32(mobi_raw, TITLE_OFFSET)? as usize;
        let title_len = be_u32(mobi_raw, TITLE_OFFSET + 4)? as usize;
        let header_title =
            metadata_string(slice(record0, title_offset, title_len)?, Some(encoding));

        let exth = match record0.get(len_mobi..len_mobi.saturating_add(4)) {
            Some(b"EXTH") => {
                let exth_len = be_u32(record0, len_mobi + 4)? as usize;
                if exth_len < EXTH_PREAMBLE_LEN {
                    return Err(Error::damaged(format!("EXTH block length {exth_len}")));
                }
                let block = slice(record0, len_mobi, exth_len)?;
                ExthRecords::parse(&block[EXTH_PREAMBLE_LEN..])?
            }
            _ => ExthRecords::default(),
        };

        Ok(Self {
            header_title,
            exth,
            encoding,
        })
    }

    /// Text encoding label declared by the header.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    /// Fold the header and EXTH values into a [`BookMetadata`]. EXTH 503
    /// overrides the header title; absent records leave fields unset.
    pub fn into_book_metadata(self) -> BookMetadata {
        let encoding = Some(self.encoding);
        BookMetadata {
            title: self
                .exth
                .text(EXTH_UPDATED_TITLE, encoding)
                .or(self.header_title),
            asin: self.exth.text(EXTH_ASIN, encoding),
            book_type: self.exth.text(EXTH_CDE_TYPE, encoding),
        }
    }
}

/// Reader for the `BOOKMOBI` family (`.mobi`, `.prc`, `.azw`, `.azw3`).
#[derive(Debug, Default, Clone, Copy)]
pub struct MobiReader;

impl MetadataReader for MobiReader {
    fn name(&self) -> &'static str {
        "mobi"
    }

    fn read_metadata(&self, source: &dyn ByteSource) -> Result<BookMetadata> {
        let sections = Sectionizer::new(source)?;
        let record0 = sections.load_section(0)?;
        Ok(MobiMetadata::parse(&record0)?.into_book_metadata())
    }
}
