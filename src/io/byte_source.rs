use std::fs::File;
use std::io;
#[cfg(all(not(unix), not(windows)))]
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// A random-access source of package bytes.
///
/// Reads are positioned and must not disturb any shared cursor, so a single
/// source can back the ZIP index scan and every later entry read.
pub trait ByteSource: Send + Sync {
    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` with bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; implementations read all of `buf`
    /// or fail.
    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Read exactly `len` bytes starting at `offset`.
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let read = self.read_at_into(offset, &mut buf)?;
        if read != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "short read from byte source",
            ));
        }
        Ok(buf)
    }
}

/// A package file on local disk.
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

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)?;
        Ok(buf.len())
    }
}

#[cfg(windows)]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        let mut filled = 0;
        while filled < buf.len() {
            let read = self.file.seek_read(&mut buf[filled..], offset + filled as u64)?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "short read from package file",
                ));
            }
            filled += read;
        }
        Ok(filled)
    }
}

#[cfg(all(not(unix), not(windows)))]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut handle = self.file.try_clone()?;
        handle.seek(SeekFrom::Start(offset))?;
        handle.read_exact(buf)?;
        Ok(buf.len())
    }
}

/// A package held in memory, e.g. a blob fetched from a library service.
#[derive(Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "offset beyond end of data")
            })?;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "not enough data"))?;

        buf.copy_from_slice(&self.data[start..end]);
        Ok(buf.len())
    }
}
