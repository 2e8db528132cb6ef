use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use super::byte_source::ByteSource;

/// Stateful `Read + Seek` view over a shared [`ByteSource`].
///
/// `zip::ZipArchive` wants a cursor; the archive index is built once through
/// this adapter and every later entry read goes straight to the source.
pub struct SourceCursor {
    source: Arc<dyn ByteSource>,
    position: u64,
}

impl SourceCursor {
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self {
            source,
            position: 0,
        }
    }
}

impl Read for SourceCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total = self.source.len();
        if self.position >= total || buf.is_empty() {
            return Ok(0);
        }

        let want = (total - self.position).min(buf.len() as u64) as usize;
        let read = self.source.read_at_into(self.position, &mut buf[..want])?;
        self.position += read as u64;
        Ok(read)
    }
}

impl Seek for SourceCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.source.len().checked_add_signed(delta),
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
