//! Loading a package into a [`Book`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;

use super::assets::AssetStore;
use super::model::{Book, NavPoint, Page, SpineItem};
use crate::dom::parse_html;
use crate::error::Result;
use crate::io::{ByteSource, FileSource};
use crate::package::{Archive, load_toc, parse_container, resolve_descriptor};
use crate::util::{is_markup_media_type, normalize_path};

/// Load a package from any byte source.
///
/// Archive, container and descriptor failures are fatal; no partial book
/// is returned. Spine items that cannot be read are skipped with a warning.
pub async fn load_book(source: Arc<dyn ByteSource>) -> Result<Book> {
    let archive = Archive::open(source)?;
    let descriptor_path = parse_container(&archive)?;
    let descriptor = resolve_descriptor(&archive, &descriptor_path)?;
    let toc = load_toc(&archive, &descriptor);

    tracing::info!(
        descriptor = %descriptor_path,
        title = %descriptor.metadata.title,
        spine = descriptor.spine.len(),
        "opened package"
    );

    let assets = AssetStore::new(archive, &descriptor.manifest, &descriptor.base_path);
    let pages = load_pages(&assets, &descriptor.spine, &descriptor.base_path, &toc).await;

    tracing::info!(pages = pages.len(), "loaded pages");

    Ok(Book::new(
        descriptor.metadata,
        descriptor.manifest,
        descriptor.spine,
        pages,
        toc,
        descriptor.base_path,
        assets,
    ))
}

/// Load a package file from disk.
pub async fn load_book_from_path(path: impl AsRef<Path>) -> Result<Book> {
    let source = FileSource::open(path)?;
    load_book(Arc::new(source)).await
}

/// Read every markup spine item and build pages in spine order.
///
/// Entry reads run concurrently on the blocking pool and may finish in any
/// order; results are gathered back by spine position.
pub async fn load_pages(
    assets: &AssetStore,
    spine: &[SpineItem],
    base_path: &str,
    toc: &[NavPoint],
) -> Vec<Page> {
    let labels = toc_labels(toc);

    let reads = spine
        .iter()
        .filter(|item| is_markup_media_type(&item.media_type))
        .map(|item| async move {
            let full_path = format!("{}{}", base_path, item.path);
            (item, assets.load_text(&full_path).await)
        });

    let mut pages = Vec::new();
    for (item, content) in join_all(reads).await {
        let raw_content = match content {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(id = %item.id, path = %item.path, error = %e, "skipping unreadable page");
                continue;
            }
        };

        let title = labels
            .get(normalize_path(&item.path).as_str())
            .map(|label| label.to_string())
            .or_else(|| parse_html(&raw_content).title())
            .unwrap_or_else(|| format!("Page {}", pages.len() + 1));

        pages.push(Page::new(&item.id, &item.path, raw_content, title));
    }

    pages
}

/// First TOC label per target path, fragments dropped.
fn toc_labels(toc: &[NavPoint]) -> HashMap<String, &str> {
    let mut labels = HashMap::new();
    for point in toc.iter().flat_map(NavPoint::walk) {
        labels
            .entry(normalize_path(&point.href))
            .or_insert(point.title.as_str());
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_labels_first_wins() {
        let mut part = NavPoint::new("Part I", "p1.xhtml");
        part.children.push(NavPoint::new("Figure", "p1.xhtml#fig"));
        part.children.push(NavPoint::new("Second", "p2.xhtml"));

        let toc = [part];
        let labels = toc_labels(&toc);
        assert_eq!(labels.get("p1.xhtml"), Some(&"Part I"));
        assert_eq!(labels.get("p2.xhtml"), Some(&"Second"));
    }
}
