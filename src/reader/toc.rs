//! Read-only page index for navigation UI.

use serde::Serialize;

use crate::book::Book;
use crate::util::normalize_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub index: usize,
    pub title: String,
    pub path: String,
}

/// One entry per page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn new(book: &Book) -> Self {
        let entries = book
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| TocEntry {
                index,
                title: page.title().to_string(),
                path: page.path().to_string(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Page index for a link target (fragment and query ignored).
    pub fn page_for_path(&self, href: &str) -> Option<usize> {
        let target = normalize_path(href);
        self.entries
            .iter()
            .find(|entry| normalize_path(&entry.path) == target)
            .map(|entry| entry.index)
    }
}
