use std::fs::File;
use std::io;
use std::path::Path;
#[cfg(all(not(unix), not(windows)))]
use std::io::{Read, Seek, SeekFrom};

/// A random-access source of bytes shared by every metadata reader.
///
/// Reads are positional and never move a shared cursor, so one source can be
/// handed to several readers in turn while sniffing a file's format.
pub trait ByteSource: Send + Sync {
    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` from `offset`. Fails with `UnexpectedEof` if the source
    /// ends before `buf` is full.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Read exactly `len` bytes at `offset`.
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Read the byte range `[start, end)`, clamping `end` to the end of the
    /// source. An empty vector is returned when `start` is at or past the end.
    fn read_clamped(&self, start: u64, end: u64) -> io::Result<Vec<u8>> {
        let end = end.min(self.len());
        if start >= end {
            return Ok(Vec::new());
        }
        self.read_at(start, (end - start) as usize)
    }

    /// Read the whole source.
    fn read_all(&self) -> io::Result<Vec<u8>> {
        self.read_clamped(0, self.len())
    }
}

fn eof(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, what.to_string())
}

// --- Local file ---

pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

#[cfg(unix)]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }
}

#[cfg(windows)]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.seek_read(&mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                return Err(eof("file ended mid-read"));
            }
            filled += n;
        }
        Ok(())
    }
}

#[cfg(all(not(unix), not(windows)))]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut handle = self.file.try_clone()?;
        handle.seek(SeekFrom::Start(offset))?;
        handle.read_exact(buf)
    }
}

// --- In-memory ---

/// A [`ByteSource`] over an owned buffer. Used for tests and for data that is
/// already in memory (archive members, fixtures).
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for MemorySource {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| eof("offset beyond end of data"))?;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| eof("not enough data"))?;
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_source_read_at() {
        let source = MemorySource::new(b"hello world".to_vec());
        assert_eq!(source.read_at(6, 5).unwrap(), b"world");
        assert!(source.read_at(8, 5).is_err());
    }

    #[test]
    fn test_read_clamped_stops_at_end() {
        let source = MemorySource::from(&b"abcdef"[..]);
        assert_eq!(source.read_clamped(2, 0xFFF_FFFF).unwrap(), b"cdef");
        assert!(source.read_clamped(10, 20).unwrap().is_empty());
    }

    #[test]
    fn test_file_source_matches_contents() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();
        let source = FileSource::open(tmp.path()).unwrap();
        assert_eq!(source.len(), 10);
        assert_eq!(source.read_at(3, 4).unwrap(), b"3456");
        assert_eq!(source.read_all().unwrap(), b"0123456789");
    }
}
