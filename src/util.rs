//! Text decoding, media sniffing and package path helpers.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Decode bytes to a string, handling the encodings found in packages.
///
/// Tries UTF-8 first (a BOM is consumed by `encoding_rs`), then the
/// encoding named in the XML declaration, then Windows-1252.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode a package entry using its own XML declaration as the hint.
pub fn decode_entry(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

/// Extract the `encoding="..."` value from an XML declaration.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(100)];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Strip a UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

// ============================================================================
// Media Types
// ============================================================================

/// Media types that carry page markup.
pub fn is_markup_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase();
    matches!(
        essence.as_str(),
        "application/xhtml+xml" | "text/html" | "application/xml" | "text/xml"
    )
}

/// Guess a MIME type from the file extension, then from magic bytes.
///
/// Falls back to `application/octet-stream`.
pub fn sniff_media_type(path: &str, data: &[u8]) -> &'static str {
    let lower = path.to_ascii_lowercase();
    let by_extension = match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("webp") => Some("image/webp"),
        Some("css") => Some("text/css"),
        Some("xhtml") => Some("application/xhtml+xml"),
        Some("html" | "htm") => Some("text/html"),
        _ => None,
    };
    if let Some(media_type) = by_extension {
        return media_type;
    }

    match data {
        [0xFF, 0xD8, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Package Paths
// ============================================================================

/// Directory component of a package path, with a trailing slash.
///
/// `"OEBPS/content.opf"` gives `"OEBPS/"`, `"content.opf"` gives `""`.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// True for references that must not be resolved against the package:
/// URLs with a scheme, protocol-relative and root-relative paths, data URIs.
pub fn is_external_reference(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.starts_with('/') || reference.starts_with('#') {
        return true;
    }
    match reference.find(':') {
        Some(colon) => {
            let scheme = &reference[..colon];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Normalize a package path: percent-decode, drop fragment and query,
/// collapse `.` and `..` segments. `..` above the root is discarded.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['#', '?']).next().unwrap_or(path);
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve `relative` against the directory `base_dir` and normalize.
pub fn resolve_href(base_dir: &str, relative: &str) -> String {
    normalize_path(&format!("{}{}", base_dir, relative.trim()))
}
