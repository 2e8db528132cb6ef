//! Table of contents sources: EPUB2 NCX and EPUB3 navigation documents.
//!
//! Both only supply page labels; a missing or broken TOC never fails a load.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::archive::Archive;
use super::descriptor::Descriptor;
use super::xml::{attr_value, collapse_whitespace, local_name, resolve_entity};
use crate::book::NavPoint;
use crate::error::{Error, Result};
use crate::util::{decode_entry, normalize_path, parent_dir};

/// Load the package's table of contents.
///
/// The EPUB3 nav document wins over the NCX. Any failure is logged and
/// yields an empty list; the TOC only supplies page labels.
pub fn load_toc(archive: &Archive, descriptor: &Descriptor) -> Vec<NavPoint> {
    let sources = [
        (descriptor.nav_path.as_deref(), parse_nav_document as fn(&str) -> Result<Vec<NavPoint>>),
        (descriptor.ncx_path.as_deref(), parse_ncx),
    ];

    for (path, parse) in sources {
        let Some(path) = path else { continue };
        let full_path = format!("{}{}", descriptor.base_path, path);
        let bytes = match archive.read_entry(&full_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %full_path, error = %e, "table of contents unreadable");
                continue;
            }
        };
        match parse(&decode_entry(&bytes)) {
            Ok(mut points) if !points.is_empty() => {
                rebase_nav_points(&mut points, path);
                tracing::debug!(path = %full_path, entries = points.len(), "loaded table of contents");
                return points;
            }
            Ok(_) => tracing::debug!(path = %full_path, "table of contents is empty"),
            Err(e) => tracing::warn!(path = %full_path, error = %e, "table of contents malformed"),
        }
    }

    Vec::new()
}

/// Parse an NCX `navMap` into nested nav points.
pub fn parse_ncx(content: &str) -> Result<Vec<NavPoint>> {
    let mut reader = Reader::from_str(content);

    struct NavPointState {
        children: Vec<NavPoint>,
        text: Option<String>,
        src: Option<String>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        children: Vec::new(),
        text: None,
        src: None,
    }];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(NavPointState {
                    children: Vec::new(),
                    text: None,
                    src: None,
                }),
                b"text" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content"
                    && let Some(state) = stack.last_mut()
                {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src" {
                            state.src = Some(attr_value(&attr));
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    state.text.get_or_insert_with(String::new).push_str(&raw);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text
                    && let Some(state) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    state.text.get_or_insert_with(String::new).push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" if stack.len() > 1 => {
                    if let Some(state) = stack.pop()
                        && let (Some(text), Some(src)) = (state.text, state.src)
                    {
                        let mut point = NavPoint::new(collapse_whitespace(&text), src);
                        point.children = state.children;
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(point);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedDescriptor(format!("NCX: {}", e))),
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map(|s| s.children).unwrap_or_default())
}

/// Parse the `toc` nav of an EPUB3 navigation document.
///
/// Only the first `<nav>` whose `epub:type` includes `toc` is read; if no
/// nav is typed, the first `<nav>` is used.
pub fn parse_nav_document(content: &str) -> Result<Vec<NavPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    struct ItemState {
        children: Vec<NavPoint>,
        label: String,
        href: Option<String>,
    }

    let mut nav_depth = 0usize;
    let mut in_nav = false;
    let mut nav_done = false;
    let mut saw_typed_toc = false;
    let mut in_anchor = false;
    let mut roots: Vec<NavPoint> = Vec::new();
    let mut items: Vec<ItemState> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if in_nav {
                    match local {
                        b"nav" => nav_depth += 1,
                        b"li" => items.push(ItemState {
                            children: Vec::new(),
                            label: String::new(),
                            href: None,
                        }),
                        b"a" | b"span" => {
                            in_anchor = true;
                            if let Some(item) = items.last_mut() {
                                for attr in e.attributes().flatten() {
                                    if attr.key.as_ref() == b"href" {
                                        item.href = Some(attr_value(&attr));
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                } else if local == b"nav" && !nav_done {
                    let is_toc = e.attributes().flatten().any(|attr| {
                        local_name(attr.key.as_ref()) == b"type"
                            && attr_value(&attr).split_ascii_whitespace().any(|t| t == "toc")
                    });
                    if is_toc || !saw_typed_toc {
                        in_nav = true;
                        nav_depth = 1;
                        saw_typed_toc |= is_toc;
                        roots.clear();
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_anchor && let Some(item) = items.last_mut() {
                    item.label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_anchor
                    && let Some(item) = items.last_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    item.label.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                if !in_nav {
                    continue;
                }
                match local_name(e.name().as_ref()) {
                    b"a" | b"span" => in_anchor = false,
                    b"li" => {
                        if let Some(item) = items.pop() {
                            let label = collapse_whitespace(&item.label);
                            let point = match item.href {
                                Some(href) if !label.is_empty() => {
                                    let mut point = NavPoint::new(label, href);
                                    point.children = item.children;
                                    Some(point)
                                }
                                _ => None,
                            };
                            if let Some(point) = point {
                                match items.last_mut() {
                                    Some(parent) => parent.children.push(point),
                                    None => roots.push(point),
                                }
                            }
                        }
                    }
                    b"nav" => {
                        nav_depth -= 1;
                        if nav_depth == 0 {
                            in_nav = false;
                            nav_done = saw_typed_toc;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedDescriptor(format!("nav document: {}", e))),
            _ => {}
        }
    }

    Ok(roots)
}

/// Rebase nav hrefs, which are relative to the nav file, onto the
/// descriptor directory so they match manifest paths.
pub fn rebase_nav_points(points: &mut [NavPoint], nav_path: &str) {
    let nav_dir = parent_dir(nav_path);
    for point in points {
        if !point.href.starts_with('#') && !point.href.is_empty() {
            let fragment = point.href.find('#').map(|i| point.href[i..].to_string());
            let mut rebased = normalize_path(&format!("{}{}", nav_dir, point.href));
            if let Some(fragment) = fragment {
                rebased.push_str(&fragment);
            }
            point.href = rebased;
        }
        rebase_nav_points(&mut point.children, nav_path);
    }
}
