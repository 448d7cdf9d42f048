//! Topaz (`TPZ`) header table.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::vwi::Cursor;

/// Location of one block of a header record, relative to [`TopazHeader::base`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopazBlock {
    pub offset: usize,
    pub len_uncompressed: usize,
    /// Zero when the block is stored uncompressed.
    pub len_compressed: usize,
}

/// The parsed header table of a Topaz container.
#[derive(Debug, Clone)]
pub struct TopazHeader {
    records: HashMap<String, Vec<TopazBlock>>,
    /// Absolute offset that every block offset is relative to.
    pub base: usize,
}

impl TopazHeader {
    /// Parse the magic and header table from the start of a Topaz file.
    ///
    /// `data` must hold at least the whole table; a short buffer fails with
    /// `TruncatedInput` so the caller can retry with more bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data.get(..4) {
            Some(magic) if magic.starts_with(b"TPZ") => {}
            Some(magic) => {
                return Err(Error::mismatch(format!(
                    "expected TPZ magic, found {:?}",
                    String::from_utf8_lossy(magic)
                )));
            }
            None => return Err(Error::mismatch("too short for TPZ magic")),
        }

        let mut cursor = Cursor::at(data, 4);
        let record_count = cursor.read_len()?;
        let mut records: HashMap<String, Vec<TopazBlock>> = HashMap::new();

        for _ in 0..record_count {
            let tag = cursor.read_string()?;
            let block_count = cursor.read_len()?;
            let mut blocks = Vec::with_capacity(block_count.min(64));
            for _ in 0..block_count {
                blocks.push(TopazBlock {
                    offset: cursor.read_len()?,
                    len_uncompressed: cursor.read_len()?,
                    len_compressed: cursor.read_len()?,
                });
            }
            records.entry(tag).or_default().extend(blocks);
        }

        // End-of-table marker.
        let marker = cursor.read_u8()?;
        if marker != b'd' {
            tracing::debug!(marker, "unexpected Topaz end-of-table marker");
        }

        Ok(Self {
            records,
            base: cursor.position(),
        })
    }

    pub fn blocks(&self, tag: &str) -> Option<&[TopazBlock]> {
        self.records.get(tag).map(Vec::as_slice)
    }

    /// Tags present in the table, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.records.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Absolute offset of the first `metadata` block.
    pub fn metadata_block(&self) -> Result<(usize, TopazBlock)> {
        let block = self
            .blocks("metadata")
            .and_then(|blocks| blocks.first())
            .copied()
            .ok_or_else(|| Error::damaged("Topaz header has no metadata record"))?;
        let start = self
            .base
            .checked_add(block.offset)
            .ok_or_else(|| Error::damaged("metadata offset overflows"))?;
        Ok((start, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[(u8, u8, u8)])]) -> Vec<u8> {
        let mut data = b"TPZ0".to_vec();
        data.push(entries.len() as u8);
        for (tag, blocks) in entries {
            data.push(tag.len() as u8);
            data.extend_from_slice(tag.as_bytes());
            data.push(blocks.len() as u8);
            for &(offset, len, compressed) in *blocks {
                data.extend_from_slice(&[offset, len, compressed]);
            }
        }
        data.push(b'd');
        data
    }

    #[test]
    fn test_parse_table() {
        let data = table(&[("metadata", &[(0, 40, 0)]), ("page", &[(40, 10, 0), (50, 12, 6)])]);
        let header = TopazHeader::parse(&data).unwrap();
        assert_eq!(header.base, data.len());
        assert_eq!(header.tags(), vec!["metadata", "page"]);
        assert_eq!(header.blocks("page").unwrap().len(), 2);
        assert_eq!(
            header.blocks("page").unwrap()[1],
            TopazBlock { offset: 50, len_uncompressed: 12, len_compressed: 6 }
        );
        let (start, block) = header.metadata_block().unwrap();
        assert_eq!(start, data.len());
        assert_eq!(block.len_uncompressed, 40);
    }

    #[test]
    fn test_wrong_magic() {
        assert!(matches!(
            TopazHeader::parse(b"BOOKMOBI"),
            Err(Error::FormatMismatch(_))
        ));
        assert!(matches!(
            TopazHeader::parse(b"TP"),
            Err(Error::FormatMismatch(_))
        ));
    }

    #[test]
    fn test_truncated_table() {
        let data = table(&[("metadata", &[(0, 40, 0)])]);
        assert!(matches!(
            TopazHeader::parse(&data[..data.len() - 3]),
            Err(Error::TruncatedInput)
        ));
    }

    #[test]
    fn test_missing_metadata_tag() {
        let header = TopazHeader::parse(&table(&[("page", &[(0, 1, 0)])])).unwrap();
        assert!(matches!(
            header.metadata_block(),
            Err(Error::DamagedContainer(_))
        ));
    }
}
