//! In-memory book model.
//!
//! A [`Book`] is built once per loaded package and never mutated afterwards;
//! swapping files means dropping the book and loading a new one.

use std::collections::HashMap;

use super::assets::AssetStore;

/// Package metadata (Dublin Core subset).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Metadata {
    pub title: String,
    pub creator: String,
    pub description: String,
    pub language: String,
    pub identifier: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    /// Manifest path of the cover image, if the package declares one.
    pub cover_image: Option<String>,
}

impl Metadata {
    pub const DEFAULT_TITLE: &'static str = "Unknown Title";
    pub const DEFAULT_CREATOR: &'static str = "Unknown Author";
    pub const DEFAULT_LANGUAGE: &'static str = "en";
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            creator: Self::DEFAULT_CREATOR.to_string(),
            description: String::new(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            identifier: None,
            publisher: None,
            date: None,
            cover_image: None,
        }
    }
}

/// A manifest item: one file in the package.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManifestEntry {
    pub id: String,
    /// Path relative to the descriptor's directory.
    pub path: String,
    pub media_type: String,
    /// EPUB3 `properties` tokens (`nav`, `cover-image`, ...).
    pub properties: Vec<String>,
}

impl ManifestEntry {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

/// Manifest map, unique by id.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    /// Insert an entry; a later item with the same id replaces the earlier.
    pub fn insert(&mut self, entry: ManifestEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    /// Find the entry for a path (relative to the descriptor directory).
    pub fn by_path(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.values().find(|e| e.path == path)
    }

    /// The first entry carrying an EPUB3 property.
    pub fn with_property(&self, property: &str) -> Option<&ManifestEntry> {
        self.entries.values().find(|e| e.has_property(property))
    }
}

/// An entry in the reading order, resolved against the manifest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SpineItem {
    pub id: String,
    pub path: String,
    pub media_type: String,
    /// `false` for `linear="no"` itemrefs. Informational only.
    pub linear: bool,
}

/// A navigation label from the package's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NavPoint {
    pub title: String,
    /// Target path relative to the descriptor directory, fragment kept.
    pub href: String,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    /// Depth-first walk over this point and its descendants.
    pub fn walk(&self) -> Vec<&NavPoint> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A renderable page produced from one spine item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    id: String,
    path: String,
    raw_content: String,
    title: String,
}

impl Page {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        raw_content: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            raw_content: raw_content.into(),
            title: title.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A loaded package.
///
/// Owns its pages and the [`AssetStore`] (and through it the archive) for
/// its whole lifetime.
pub struct Book {
    metadata: Metadata,
    manifest: Manifest,
    spine: Vec<SpineItem>,
    pages: Vec<Page>,
    toc: Vec<NavPoint>,
    base_path: String,
    assets: AssetStore,
}

impl Book {
    pub(crate) fn new(
        metadata: Metadata,
        manifest: Manifest,
        spine: Vec<SpineItem>,
        pages: Vec<Page>,
        toc: Vec<NavPoint>,
        base_path: String,
        assets: AssetStore,
    ) -> Self {
        Self {
            metadata,
            manifest,
            spine,
            pages,
            toc,
            base_path,
            assets,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn spine(&self) -> &[SpineItem] {
        &self.spine
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Navigation points parsed from the package's NCX or nav document.
    pub fn toc(&self) -> &[NavPoint] {
        &self.toc
    }

    /// Directory of the package descriptor, with trailing slash (or empty).
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Read-only asset resolution for renderers.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("title", &self.metadata.title)
            .field("spine", &self.spine.len())
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults() {
        let metadata = Metadata::default();
        assert_eq!(metadata.title, "Unknown Title");
        assert_eq!(metadata.creator, "Unknown Author");
        assert_eq!(metadata.description, "");
        assert_eq!(metadata.language, "en");
    }

    #[test]
    fn test_manifest_lookup() {
        let mut manifest = Manifest::default();
        manifest.insert(ManifestEntry {
            id: "nav".into(),
            path: "nav.xhtml".into(),
            media_type: "application/xhtml+xml".into(),
            properties: vec!["nav".into()],
        });
        manifest.insert(ManifestEntry {
            id: "img_1".into(),
            path: "images/page_001.png".into(),
            media_type: "image/png".into(),
            properties: Vec::new(),
        });

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("img_1").unwrap().media_type, "image/png");
        assert_eq!(manifest.by_path("nav.xhtml").unwrap().id, "nav");
        assert_eq!(manifest.with_property("nav").unwrap().id, "nav");
        assert!(manifest.with_property("cover-image").is_none());
    }

    #[test]
    fn test_nav_point_walk_is_depth_first() {
        let mut part = NavPoint::new("Part I", "part1.xhtml");
        part.children.push(NavPoint::new("Chapter 1", "ch1.xhtml"));
        part.children.push(NavPoint::new("Chapter 2", "ch2.xhtml"));

        let titles: Vec<_> = part.walk().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Part I", "Chapter 1", "Chapter 2"]);
    }
}
