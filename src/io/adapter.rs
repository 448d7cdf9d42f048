use super::byte_source::ByteSource;
use std::io::{self, Read, Seek, SeekFrom};

/// Stateful `Read + Seek` view over a borrowed [`ByteSource`].
///
/// `zip::ZipArchive` wants a cursor; the metadata readers only hold a
/// `&dyn ByteSource`, so the cursor borrows rather than owns it.
pub struct ByteSourceCursor<'a> {
    inner: &'a dyn ByteSource,
    position: u64,
}

impl<'a> ByteSourceCursor<'a> {
    pub fn new(inner: &'a dyn ByteSource) -> Self {
        Self { inner, position: 0 }
    }
}

impl Read for ByteSourceCursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total = self.inner.len();
        if self.position >= total {
            return Ok(0);
        }
        let n = (total - self.position).min(buf.len() as u64) as usize;
        self.inner.read_exact_at(self.position, &mut buf[..n])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for ByteSourceCursor<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.inner.len().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(p) => {
                self.position = p;
                Ok(p)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of source",
            )),
        }
    }
}
