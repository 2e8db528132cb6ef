//! Random-access ZIP reading over a [`ByteSource`].

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use zip::ZipArchive;

use crate::error::Result;
use crate::io::{ByteSource, SourceCursor};

/// An opened package archive.
///
/// The central directory is scanned once at open time; entry reads then go
/// straight to the byte source at the cached data offsets, so `read_entry`
/// only needs `&self`.
pub struct Archive {
    source: Arc<dyn ByteSource>,
    index: HashMap<String, EntryLoc>,
    reads: AtomicUsize,
}

#[derive(Clone, Copy)]
struct EntryLoc {
    data_offset: u64,
    compressed_size: u64,
    compression: Compression,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Compression {
    Stored,
    Deflated,
    Unsupported,
}

impl Archive {
    /// Scan the central directory of `source`.
    ///
    /// Fails when the bytes are not a readable ZIP archive.
    pub fn open(source: Arc<dyn ByteSource>) -> Result<Self> {
        let cursor = SourceCursor::new(source.clone());
        let mut zip = ZipArchive::new(cursor)?;

        let mut index = HashMap::with_capacity(zip.len());
        for i in 0..zip.len() {
            let file = zip.by_index_raw(i)?;
            if file.is_dir() {
                continue;
            }
            let Some(data_offset) = file.data_start() else {
                tracing::warn!(entry = %file.name(), "entry data offset unknown, skipping");
                continue;
            };
            index.insert(
                file.name().to_string(),
                EntryLoc {
                    data_offset,
                    compressed_size: file.compressed_size(),
                    compression: Compression::from(file.compression()),
                },
            );
        }

        tracing::debug!(entries = index.len(), "indexed package archive");

        Ok(Self {
            source,
            index,
            reads: AtomicUsize::new(0),
        })
    }

    /// True if the archive holds an entry at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entry names, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of entry reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Read and decompress the entry at `path`.
    pub fn read_entry(&self, path: &str) -> io::Result<Vec<u8>> {
        let loc = self.index.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no entry in archive: {}", path),
            )
        })?;

        self.reads.fetch_add(1, Ordering::Relaxed);
        let compressed = self
            .source
            .read_at(loc.data_offset, loc.compressed_size as usize)?;

        match loc.compression {
            Compression::Stored => Ok(compressed),
            Compression::Deflated => {
                let mut decoder = flate2::read::DeflateDecoder::new(&compressed[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::Unsupported => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported compression method for {}", path),
            )),
        }
    }
}

impl From<zip::CompressionMethod> for Compression {
    fn from(method: zip::CompressionMethod) -> Self {
        match method {
            zip::CompressionMethod::Stored => Compression::Stored,
            zip::CompressionMethod::Deflated => Compression::Deflated,
            _ => Compression::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::io::MemorySource;

    fn build_zip(entries: &[(&str, &[u8], zip::CompressionMethod)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data, method) in entries {
            zip.start_file(*name, SimpleFileOptions::default().compression_method(*method))
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_stored_and_deflated_entries() {
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", zip::CompressionMethod::Stored),
            ("EPUB/p1.xhtml", b"<html>page one</html>", zip::CompressionMethod::Deflated),
        ]);
        let archive = Archive::open(Arc::new(MemorySource::new(bytes))).unwrap();

        assert!(archive.contains("mimetype"));
        assert_eq!(archive.read_entry("mimetype").unwrap(), b"application/epub+zip");
        assert_eq!(
            archive.read_entry("EPUB/p1.xhtml").unwrap(),
            b"<html>page one</html>"
        );
        assert_eq!(archive.reads(), 2);
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let bytes = build_zip(&[("a.txt", b"a", zip::CompressionMethod::Stored)]);
        let archive = Archive::open(Arc::new(MemorySource::new(bytes))).unwrap();

        let err = archive.read_entry("b.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(archive.reads(), 0);
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let result = Archive::open(Arc::new(MemorySource::new(b"not a zip".to_vec())));
        assert!(result.is_err());
    }
}
