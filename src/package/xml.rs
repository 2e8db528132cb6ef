//! Small helpers shared by the quick-xml based parsers.

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute;

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Attribute value with XML escapes resolved; malformed escapes are kept raw.
pub(crate) fn attr_value(attr: &Attribute<'_>) -> String {
    let raw = String::from_utf8_lossy(attr.value.as_ref());
    let unescaped = quick_xml::escape::unescape(&raw).map(Cow::into_owned);
    unescaped.unwrap_or_else(|_| raw.into_owned())
}

/// Resolve an XML entity reference body (`amp`, `#8217`, `#x2019`).
pub(crate) fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element nesting of a document being read.
///
/// quick-xml checks end-tag names but neither unclosed elements at end of
/// input nor a second top-level element; every `Start`, `Empty` and `End`
/// goes through here and [`ElementDepth::finish`] runs at `Eof`.
#[derive(Debug, Default)]
pub(crate) struct ElementDepth {
    depth: usize,
    roots: usize,
}

impl ElementDepth {
    pub(crate) fn start(&mut self) -> Result<(), &'static str> {
        self.count_root()?;
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn empty(&mut self) -> Result<(), &'static str> {
        self.count_root()
    }

    pub(crate) fn end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn finish(&self) -> Result<(), &'static str> {
        if self.roots == 0 {
            Err("document has no root element")
        } else if self.depth > 0 {
            Err("unexpected end of document, element not closed")
        } else {
            Ok(())
        }
    }

    fn count_root(&mut self) -> Result<(), &'static str> {
        if self.depth == 0 {
            if self.roots > 0 {
                return Err("more than one root element");
            }
            self.roots += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"title"), b"title");
        assert_eq!(local_name(b"dc:title"), b"title");
        assert_eq!(local_name(b"opf:meta"), b"meta");
        assert_eq!(local_name(b""), b"");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("bogus"), None);
        assert_eq!(resolve_entity("#xZZ"), None);
    }

    #[test]
    fn test_element_depth() {
        let mut depth = ElementDepth::default();
        assert_eq!(depth.finish(), Err("document has no root element"));

        depth.start().unwrap();
        depth.empty().unwrap();
        assert!(depth.finish().is_err());
        depth.end();
        assert_eq!(depth.finish(), Ok(()));

        assert_eq!(depth.empty(), Err("more than one root element"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Page\n   One \t"), "Page One");
        assert_eq!(collapse_whitespace(""), "");
    }
}
