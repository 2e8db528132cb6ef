//! Page markup as a queryable tree.
//!
//! Pages are parsed with html5ever into an arena ([`Dom`]), queried by tag
//! and class, rewritten in place, and serialized back to markup.

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, Children, Dom, Node, NodeData, NodeId};
pub use serialize::{escape_attr, escape_text, inner_html, outer_html};
pub use tree_sink::{DomSink, parse_html};
