//! Markup serialization for (rewritten) page trees.

use super::arena::{Dom, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize `id` and its subtree.
pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

/// Serialize the children of `id`, without `id` itself.
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else { return };
    match &node.data {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            let raw_parent = dom
                .element_name(node.parent)
                .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
            if raw_parent {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.qualified_name());
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }
            if VOID_ELEMENTS.contains(&tag) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&#160;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr(r#"say "hi" & go"#), "say &quot;hi&quot; &amp; go");
    }

    #[test]
    fn test_inner_html_of_body() {
        let dom = parse_html(
            r#"<html><body><h1 class="t">A &amp; B</h1><p>one<br>two</p><img src="x.png" alt="q&quot;"></body></html>"#,
        );
        let body = dom.body().unwrap();
        assert_eq!(
            inner_html(&dom, body),
            r#"<h1 class="t">A &amp; B</h1><p>one<br/>two</p><img src="x.png" alt="q&quot;"/>"#
        );
    }

    #[test]
    fn test_style_text_is_not_escaped() {
        let dom = parse_html("<html><head><style>p > span { color: red }</style></head></html>");
        let style = dom.find_by_tag("style").unwrap();
        assert_eq!(outer_html(&dom, style), "<style>p > span { color: red }</style>");
    }
}
