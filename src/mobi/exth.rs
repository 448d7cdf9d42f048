//! EXTH (extended header) records embedded after the MOBI header.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::util::{be_u32, metadata_string};

/// ASIN (Amazon Standard Identification Number).
pub const EXTH_ASIN: u32 = 113;
/// Content type code ("EBOK", "PDOC", ...).
pub const EXTH_CDE_TYPE: u32 = 501;
/// Updated title, preferred over the title stored in the MOBI header.
pub const EXTH_UPDATED_TITLE: u32 = 503;

/// Bytes of EXTH magic, header length and record count before the records.
pub const EXTH_PREAMBLE_LEN: usize = 12;

/// Record header: 4-byte type + 4-byte length.
const RECORD_HEADER_LEN: usize = 8;

/// Raw EXTH records keyed by type. A repeated type keeps its last value.
#[derive(Debug, Default, Clone)]
pub struct ExthRecords {
    records: HashMap<u32, Vec<u8>>,
}

impl ExthRecords {
    /// Parse the record area (the EXTH block with its 12-byte preamble
    /// already skipped).
    ///
    /// Iteration stops once fewer than 9 bytes remain. A record whose length
    /// is shorter than its own header or runs past the block is damage.
    pub fn parse(mut data: &[u8]) -> Result<Self> {
        let mut records = HashMap::new();
        while data.len() > RECORD_HEADER_LEN {
            let record_type = be_u32(data, 0)?;
            let record_len = be_u32(data, 4)? as usize;
            if record_len < RECORD_HEADER_LEN || record_len > data.len() {
                return Err(Error::damaged(format!(
                    "EXTH record {record_type} has length {record_len} with {} bytes left",
                    data.len()
                )));
            }
            records.insert(record_type, data[RECORD_HEADER_LEN..record_len].to_vec());
            data = &data[record_len..];
        }
        Ok(Self { records })
    }

    pub fn get(&self, record_type: u32) -> Option<&[u8]> {
        self.records.get(&record_type).map(Vec::as_slice)
    }

    /// Decoded text of a record, `None` when missing or blank.
    pub fn text(&self, record_type: u32, encoding: Option<&str>) -> Option<String> {
        self.get(record_type)
            .and_then(|bytes| metadata_string(bytes, encoding))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: u32, data: &[u8]) -> Vec<u8> {
        let mut out = record_type.to_be_bytes().to_vec();
        out.extend_from_slice(&((data.len() + 8) as u32).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_parse_records() {
        let mut data = record(EXTH_ASIN, b"B0000ABCDE");
        data.extend(record(EXTH_CDE_TYPE, b"EBOK"));
        let exth = ExthRecords::parse(&data).unwrap();
        assert_eq!(exth.len(), 2);
        assert_eq!(exth.text(EXTH_ASIN, None).as_deref(), Some("B0000ABCDE"));
        assert_eq!(exth.get(EXTH_CDE_TYPE), Some(&b"EBOK"[..]));
        assert!(exth.get(EXTH_UPDATED_TITLE).is_none());
    }

    #[test]
    fn test_repeated_type_keeps_last() {
        let mut data = record(EXTH_ASIN, b"FIRST");
        data.extend(record(EXTH_ASIN, b"SECOND"));
        let exth = ExthRecords::parse(&data).unwrap();
        assert_eq!(exth.text(EXTH_ASIN, None).as_deref(), Some("SECOND"));
    }

    #[test]
    fn test_short_tail_is_ignored() {
        // Padding of 8 bytes or fewer after the last record ends iteration.
        let mut data = record(EXTH_ASIN, b"B0000ABCDE");
        data.extend_from_slice(&[0u8; 8]);
        let exth = ExthRecords::parse(&data).unwrap();
        assert_eq!(exth.len(), 1);
    }

    #[test]
    fn test_overlong_record_is_damage() {
        let mut data = record(EXTH_ASIN, b"B0000ABCDE");
        data[4..8].copy_from_slice(&500u32.to_be_bytes());
        assert!(matches!(
            ExthRecords::parse(&data),
            Err(Error::DamagedContainer(_))
        ));
    }

    #[test]
    fn test_zero_length_record_is_damage() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&EXTH_ASIN.to_be_bytes());
        assert!(ExthRecords::parse(&data).is_err());
    }
}
