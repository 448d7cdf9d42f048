//! Topaz variable-width integers and a cursor for reading them.
//!
//! Big-endian base-128: every byte contributes its low 7 bits, and a set high
//! bit means another byte follows.

use crate::error::{Error, Result};

/// Decode one variable-width integer from the start of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > u64::MAX >> 7 {
            return Err(Error::damaged("variable-width integer overflows 64 bits"));
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::TruncatedInput)
}

/// Forward-only reader over a Topaz buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_vwi(&mut self) -> Result<u64> {
        let rest = self.data.get(self.pos..).ok_or(Error::TruncatedInput)?;
        let (value, consumed) = decode(rest)?;
        self.pos += consumed;
        Ok(value)
    }

    /// A VWI used as a length or offset within the buffer.
    pub fn read_len(&mut self) -> Result<usize> {
        usize::try_from(self.read_vwi()?).map_err(|_| Error::TruncatedInput)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(Error::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = crate::util::slice(self.data, self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    /// A length-prefixed string: VWI length, then that many bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        Ok(crate::util::decode_text(bytes, None).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Inverse of `decode`, for tests.
    fn encode(mut value: u64) -> Vec<u8> {
        let mut out = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            out.push(0x80 | (value & 0x7F) as u8);
            value >>= 7;
        }
        out.reverse();
        out
    }

    #[test]
    fn test_decode_examples() {
        assert_eq!(decode(&[0x81, 0x00]).unwrap(), (128, 2));
        assert_eq!(decode(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode(&[0x7F, 0xFF]).unwrap(), (127, 1));
        assert_eq!(decode(&[0xFF, 0x7F]).unwrap(), (16383, 2));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode(&[]), Err(Error::TruncatedInput)));
        assert!(matches!(decode(&[0x81, 0x82]), Err(Error::TruncatedInput)));
    }

    #[test]
    fn test_decode_overflow() {
        let data = [0xFF; 11];
        assert!(matches!(decode(&data), Err(Error::DamagedContainer(_))));
    }

    #[test]
    fn test_cursor_sequence() {
        let mut data = vec![0x05];
        data.extend_from_slice(b"Title");
        data.extend_from_slice(&[0x81, 0x00, 0x2A]);
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_string().unwrap(), "Title");
        assert_eq!(cursor.read_vwi().unwrap(), 128);
        assert_eq!(cursor.read_u8().unwrap(), 0x2A);
        assert_eq!(cursor.position(), data.len());
        assert!(matches!(cursor.read_u8(), Err(Error::TruncatedInput)));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            value in any::<u64>(),
            tail in prop::collection::vec(any::<u8>(), 0..4),
        ) {
            let mut bytes = encode(value);
            let len = bytes.len();
            bytes.extend(tail);
            prop_assert_eq!(decode(&bytes).unwrap(), (value, len));
        }
    }
}
