//! Asset resolution for page rendering.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;

use super::model::Manifest;
use crate::error::{Error, Result};
use crate::package::Archive;
use crate::util::{decode_entry, normalize_path, sniff_media_type};

/// A resolved asset: its normalized archive path and a display URI that a
/// renderer can put straight into `src`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub path: String,
    pub media_type: String,
    pub uri: Arc<str>,
}

/// Archive-backed asset cache, owned by one [`Book`](super::Book).
///
/// Paths are archive paths (descriptor directory included). Handles are
/// cached for the book's lifetime, so resolving the same asset twice
/// reads the archive once.
pub struct AssetStore {
    archive: Arc<Archive>,
    media_types: HashMap<String, String>,
    cache: Mutex<HashMap<String, AssetHandle>>,
}

impl AssetStore {
    /// Take ownership of `archive`. Media types come from `manifest`, whose
    /// paths are relative to `base_path`.
    pub fn new(archive: Archive, manifest: &Manifest, base_path: &str) -> Self {
        let media_types = manifest
            .iter()
            .map(|entry| {
                (
                    normalize_path(&format!("{}{}", base_path, entry.path)),
                    entry.media_type.clone(),
                )
            })
            .collect();

        Self {
            archive: Arc::new(archive),
            media_types,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve an archive path to a displayable handle.
    ///
    /// Fails with [`Error::AssetNotFound`] when the archive has no such
    /// entry or it cannot be read.
    pub fn resolve(&self, path: &str) -> Result<AssetHandle> {
        let path = normalize_path(path);
        if let Some(handle) = self.cache.lock().get(&path) {
            return Ok(handle.clone());
        }

        let bytes = self.read_bytes(&path)?;
        let media_type = match self.media_types.get(&path) {
            Some(media_type) => media_type.clone(),
            None => sniff_media_type(&path, &bytes).to_string(),
        };
        let uri: Arc<str> =
            format!("data:{};base64,{}", media_type, STANDARD.encode(&bytes)).into();

        tracing::debug!(path = %path, media_type = %media_type, size = bytes.len(), "resolved asset");

        let handle = AssetHandle {
            path: path.clone(),
            media_type,
            uri,
        };
        // A concurrent resolver may have won the race; keep the first handle.
        let mut cache = self.cache.lock();
        Ok(cache.entry(path).or_insert(handle).clone())
    }

    /// Raw entry bytes. Not cached.
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize_path(path);
        self.archive
            .read_entry(&path)
            .map_err(|e| Error::AssetNotFound(format!("{}: {}", path, e)))
    }

    /// Entry decoded as text (UTF-8, declared encoding, then Windows-1252).
    pub fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        Ok(decode_entry(&bytes).into_owned())
    }

    /// [`read_text`](Self::read_text) on the blocking pool, so concurrent
    /// callers suspend instead of holding the executor while the source reads.
    ///
    /// Must be polled inside a tokio runtime.
    pub async fn load_text(&self, path: &str) -> Result<String> {
        let path = normalize_path(path);
        let archive = Arc::clone(&self.archive);
        let entry = path.clone();

        let bytes = tokio::task::spawn_blocking(move || archive.read_entry(&entry))
            .await
            .map_err(|e| Error::AssetNotFound(format!("{}: task join error: {}", path, e)))?
            .map_err(|e| Error::AssetNotFound(format!("{}: {}", path, e)))?;
        Ok(decode_entry(&bytes).into_owned())
    }

    /// True if the archive holds `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.archive.contains(&normalize_path(path))
    }

    /// Number of archive entry reads served so far.
    pub fn archive_reads(&self) -> usize {
        self.archive.reads()
    }

    /// Number of handles currently cached.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

impl fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStore")
            .field("cached", &self.cached())
            .field("archive_reads", &self.archive_reads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::book::ManifestEntry;
    use crate::io::MemorySource;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn store() -> AssetStore {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("EPUB/images/page_001.png", options).unwrap();
        zip.write_all(PNG).unwrap();
        zip.start_file("EPUB/images/blob", options).unwrap();
        zip.write_all(PNG).unwrap();
        zip.start_file("EPUB/p1.xhtml", options).unwrap();
        zip.write_all("<p>caf\u{e9}</p>".as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let archive = Archive::open(Arc::new(MemorySource::new(bytes))).unwrap();
        let mut manifest = Manifest::default();
        manifest.insert(ManifestEntry {
            id: "img_1".into(),
            path: "images/page_001.png".into(),
            media_type: "image/png".into(),
            properties: Vec::new(),
        });
        AssetStore::new(archive, &manifest, "EPUB/")
    }

    #[test]
    fn test_resolve_builds_data_uri() {
        let store = store();
        let handle = store.resolve("EPUB/images/page_001.png").unwrap();

        assert_eq!(handle.path, "EPUB/images/page_001.png");
        assert_eq!(handle.media_type, "image/png");
        assert!(handle.uri.starts_with("data:image/png;base64,"));
        assert_eq!(
            &handle.uri["data:image/png;base64,".len()..],
            STANDARD.encode(PNG)
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let store = store();
        let first = store.resolve("EPUB/images/page_001.png").unwrap();
        let reads = store.archive_reads();
        let second = store.resolve("EPUB/./images/../images/page_001.png").unwrap();

        assert_eq!(store.archive_reads(), reads);
        assert!(Arc::ptr_eq(&first.uri, &second.uri));
        assert_eq!(store.cached(), 1);
    }

    #[test]
    fn test_unlisted_asset_is_sniffed() {
        let store = store();
        let handle = store.resolve("EPUB/images/blob").unwrap();
        assert_eq!(handle.media_type, "image/png");
    }

    #[test]
    fn test_missing_asset() {
        let store = store();
        let err = store.resolve("EPUB/images/missing.png").unwrap_err();
        assert!(matches!(err, Error::AssetNotFound(_)));
        assert_eq!(store.cached(), 0);
    }

    #[tokio::test]
    async fn test_load_text_matches_read_text() {
        let store = store();
        let text = store.load_text("EPUB/p1.xhtml").await.unwrap();
        assert_eq!(text, store.read_text("EPUB/p1.xhtml").unwrap());
        assert!(matches!(
            store.load_text("EPUB/nope.xhtml").await,
            Err(Error::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_read_text_is_not_cached() {
        let store = store();
        assert_eq!(store.read_text("EPUB/p1.xhtml").unwrap(), "<p>caf\u{e9}</p>");
        assert_eq!(store.read_text("EPUB/p1.xhtml").unwrap(), "<p>caf\u{e9}</p>");
        assert_eq!(store.archive_reads(), 2);
        assert_eq!(store.cached(), 0);
    }
}
