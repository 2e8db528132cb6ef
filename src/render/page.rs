//! Page rendering: asset rewriting, overlay detection and text-layer
//! extraction.

use serde::Serialize;

use super::style::{FontSize, parse_inline_style};
use crate::book::{AssetStore, Book, Page};
use crate::dom::{Dom, NodeId, inner_html, outer_html, parse_html};
use crate::error::{Error, Result};
use crate::reader::geometry::PercentBox;
use crate::util::{is_external_reference, parent_dir, resolve_href};

pub const PAGE_CONTAINER_CLASS: &str = "page-container";
pub const TEXT_LAYER_CLASS: &str = "text-layer";

/// Position of a text element in its page, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub usize);

/// One selectable run of text in an overlay page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    pub id: ElementId,
    pub text: String,
    pub bbox: PercentBox,
    pub font_size: Option<FontSize>,
}

/// The text elements of an overlay page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextLayer {
    elements: Vec<TextElement>,
}

impl TextLayer {
    /// Build a layer, renumbering ids by position.
    pub fn new(elements: Vec<TextElement>) -> Self {
        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| TextElement {
                id: ElementId(i),
                ..element
            })
            .collect();
        Self { elements }
    }

    pub fn elements(&self) -> &[TextElement] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&TextElement> {
        self.elements.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|e| e.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Full-page image plus positioned text layer.
    Overlay,
    /// Ordinary flowed markup.
    Flowed,
}

/// Display-ready form of a page. Rebuilt on every display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRenderModel {
    pub page_index: usize,
    pub title: String,
    pub markup: String,
    pub kind: PageKind,
    pub text_layer: Option<TextLayer>,
    /// Archive paths of images that could not be resolved.
    pub unresolved_assets: Vec<String>,
}

impl PageRenderModel {
    pub fn is_overlay(&self) -> bool {
        self.kind == PageKind::Overlay
    }
}

/// Render the page at `index`.
pub async fn render_page(book: &Book, index: usize) -> Result<PageRenderModel> {
    let page = book.page(index).ok_or(Error::PageOutOfRange(index))?;
    Ok(render_markup(index, page, book.assets(), book.base_path()))
}

/// Render one page's raw markup. Never fails: unresolvable images are left
/// as written and listed in `unresolved_assets`.
pub fn render_markup(
    page_index: usize,
    page: &Page,
    assets: &AssetStore,
    base_path: &str,
) -> PageRenderModel {
    let mut dom = parse_html(page.raw_content());
    let page_dir = parent_dir(&format!("{}{}", base_path, page.path())).to_string();
    let unresolved_assets = rewrite_images(&mut dom, assets, &page_dir);

    let (kind, markup, text_layer) = match find_overlay(&dom) {
        Some((container, layer)) => (
            PageKind::Overlay,
            outer_html(&dom, container),
            Some(extract_text_layer(&dom, layer)),
        ),
        None => {
            let root = dom.body().unwrap_or(dom.document());
            (PageKind::Flowed, inner_html(&dom, root), None)
        }
    };

    tracing::debug!(
        page = page_index,
        path = page.path(),
        ?kind,
        elements = text_layer.as_ref().map_or(0, TextLayer::len),
        unresolved = unresolved_assets.len(),
        "rendered page"
    );

    PageRenderModel {
        page_index,
        title: page.title().to_string(),
        markup,
        kind,
        text_layer,
        unresolved_assets,
    }
}

/// Point every package-relative `img@src` and SVG `image@href` at its
/// display URI. Returns the archive paths that failed to resolve.
fn rewrite_images(dom: &mut Dom, assets: &AssetStore, page_dir: &str) -> Vec<String> {
    let mut unresolved = Vec::new();

    for id in dom.descendants(dom.document()) {
        let attr = match dom.element_name(id) {
            Some("img") => "src",
            Some("image") => "href",
            _ => continue,
        };
        let Some(reference) = dom.attr(id, attr).map(str::trim) else {
            continue;
        };
        if reference.is_empty() || is_external_reference(reference) {
            continue;
        }

        let path = resolve_href(page_dir, reference);
        match assets.resolve(&path) {
            Ok(handle) => dom.set_attr(id, attr, handle.uri.as_ref()),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "image left unresolved");
                if !unresolved.contains(&path) {
                    unresolved.push(path);
                }
            }
        }
    }

    unresolved
}

/// First page container that holds a text layer.
fn find_overlay(dom: &Dom) -> Option<(NodeId, NodeId)> {
    dom.find_all_by_class(dom.document(), PAGE_CONTAINER_CLASS)
        .into_iter()
        .find_map(|container| {
            dom.find_all_by_class(container, TEXT_LAYER_CLASS)
                .first()
                .map(|&layer| (container, layer))
        })
}

fn extract_text_layer(dom: &Dom, layer: NodeId) -> TextLayer {
    let elements = dom
        .element_children(layer)
        .enumerate()
        .map(|(i, node)| {
            let text = match dom.attr(node, "data-text") {
                Some(text) => text.to_string(),
                None => dom.text_content(node).trim().to_string(),
            };
            let style = parse_inline_style(dom.attr(node, "style").unwrap_or_default());
            TextElement {
                id: ElementId(i),
                text,
                bbox: PercentBox::new(
                    style.left.unwrap_or(0.0),
                    style.top.unwrap_or(0.0),
                    style.width.unwrap_or(0.0),
                    style.height.unwrap_or(0.0),
                ),
                font_size: style.font_size,
            }
        })
        .collect();
    TextLayer { elements }
}
