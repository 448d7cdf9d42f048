//! PDB (Palm Database) record table shared by MOBI, PRC and AZW files.

use crate::error::{Error, Result};
use crate::io::ByteSource;
use crate::util::be_u16;

/// Size of the fixed PDB preamble that precedes the record table.
pub const PDB_HEADER_LEN: usize = 78;

/// Offset of the 8-byte type/creator identifier.
const IDENT_OFFSET: usize = 0x3C;

/// Offset of the big-endian record count.
const COUNT_OFFSET: usize = 76;

/// End offset used for the final section. Reads past the end of the file are
/// clamped, so the last section simply runs to EOF.
pub const SECTION_SENTINEL: u64 = 0x0FFF_FFFF;

/// Exposes the numbered records of a `BOOKMOBI` container as byte vectors.
pub struct Sectionizer<'a> {
    source: &'a dyn ByteSource,
    /// Section start offsets followed by [`SECTION_SENTINEL`].
    offsets: Vec<u64>,
}

impl<'a> Sectionizer<'a> {
    /// Validate the preamble and read the section offset table.
    ///
    /// Anything that is not a `BOOKMOBI` container, including files too short
    /// to hold the preamble, is a [`Error::FormatMismatch`].
    pub fn new(source: &'a dyn ByteSource) -> Result<Self> {
        if source.len() < PDB_HEADER_LEN as u64 {
            return Err(Error::mismatch("too short for a PDB header"));
        }
        let header = source.read_at(0, PDB_HEADER_LEN)?;

        let ident = &header[IDENT_OFFSET..IDENT_OFFSET + 8];
        if ident != b"BOOKMOBI" {
            return Err(Error::mismatch(format!(
                "expected BOOKMOBI, found {:?}",
                String::from_utf8_lossy(ident)
            )));
        }

        let count = be_u16(&header, COUNT_OFFSET)? as usize;
        let table_len = count * 8;
        if source.len() < (PDB_HEADER_LEN + table_len) as u64 {
            return Err(Error::TruncatedInput);
        }
        let table = source.read_at(PDB_HEADER_LEN as u64, table_len)?;

        // Each entry is (offset, attributes/unique id); only the offset matters.
        let mut offsets: Vec<u64> = table
            .chunks_exact(8)
            .map(|entry| u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]) as u64)
            .collect();
        offsets.push(SECTION_SENTINEL);

        Ok(Self { source, offsets })
    }

    /// Number of real sections (the sentinel is not counted).
    pub fn section_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Start offsets of every section, sentinel included.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Return the bytes `[offsets[index], offsets[index + 1])`.
    pub fn load_section(&self, index: usize) -> Result<Vec<u8>> {
        let count = self.section_count();
        if index >= count {
            return Err(Error::SectionIndex { index, count });
        }
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        if end < start {
            return Err(Error::damaged(format!(
                "section {index} ends before it starts ({start}..{end})"
            )));
        }
        Ok(self.source.read_clamped(start, end)?)
    }
}
