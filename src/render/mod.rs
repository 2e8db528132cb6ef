//! Turning stored pages into display-ready markup.

mod page;
mod style;

pub use page::{
    ElementId, PAGE_CONTAINER_CLASS, PageKind, PageRenderModel, TEXT_LAYER_CLASS, TextElement,
    TextLayer, render_markup, render_page,
};
pub use style::{FontSize, InlineStyle, parse_inline_style};
