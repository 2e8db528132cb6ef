//! Package descriptor (OPF) parsing: metadata, manifest and spine.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::archive::Archive;
use super::xml::{ElementDepth, attr_value, collapse_whitespace, local_name, resolve_entity};
use crate::book::{Manifest, ManifestEntry, Metadata, SpineItem};
use crate::error::{Error, Result};
use crate::util::{decode_entry, parent_dir};

/// Everything the descriptor declares, with the spine already resolved.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Vec<SpineItem>,
    /// Directory of the descriptor; all manifest paths are relative to it.
    pub base_path: String,
    /// Manifest path of the NCX named by `spine@toc`.
    pub ncx_path: Option<String>,
    /// Manifest path of the EPUB3 navigation document.
    pub nav_path: Option<String>,
}

/// Raw descriptor contents before spine resolution.
#[derive(Debug, Default)]
struct OpfData {
    metadata: Metadata,
    manifest: Manifest,
    spine_refs: Vec<SpineRef>,
    toc_id: Option<String>,
    epub2_cover_id: Option<String>,
}

#[derive(Debug)]
struct SpineRef {
    idref: String,
    linear: bool,
}

/// Read and parse the descriptor at `descriptor_path`.
///
/// Fails with [`Error::MalformedDescriptor`] when the entry cannot be read
/// or is not well-formed XML. Spine entries whose idref has no manifest
/// item are skipped with a warning.
pub fn resolve_descriptor(archive: &Archive, descriptor_path: &str) -> Result<Descriptor> {
    let bytes = archive.read_entry(descriptor_path).map_err(|e| {
        Error::MalformedDescriptor(format!("cannot read {}: {}", descriptor_path, e))
    })?;
    let content = decode_entry(&bytes);
    parse_descriptor(&content, parent_dir(descriptor_path))
}

/// Parse descriptor XML. `base_path` is the descriptor's directory.
pub fn parse_descriptor(content: &str, base_path: &str) -> Result<Descriptor> {
    let opf = parse_opf(content)?;

    let mut spine = Vec::with_capacity(opf.spine_refs.len());
    for spine_ref in &opf.spine_refs {
        match opf.manifest.get(&spine_ref.idref) {
            Some(entry) => spine.push(SpineItem {
                id: entry.id.clone(),
                path: entry.path.clone(),
                media_type: entry.media_type.clone(),
                linear: spine_ref.linear,
            }),
            None => {
                tracing::warn!(idref = %spine_ref.idref, "spine itemref not in manifest, skipping");
            }
        }
    }

    let mut metadata = opf.metadata;
    let cover = opf
        .manifest
        .with_property("cover-image")
        .or_else(|| {
            opf.epub2_cover_id
                .as_deref()
                .and_then(|id| opf.manifest.get(id))
        })
        .map(|entry| entry.path.clone());
    metadata.cover_image = cover;

    let ncx_path = opf
        .toc_id
        .as_deref()
        .and_then(|id| opf.manifest.get(id))
        .map(|entry| entry.path.clone());
    let nav_path = opf.manifest.with_property("nav").map(|entry| entry.path.clone());

    tracing::debug!(
        manifest = opf.manifest.len(),
        spine = spine.len(),
        dropped = opf.spine_refs.len() - spine.len(),
        "resolved package descriptor"
    );

    Ok(Descriptor {
        metadata,
        manifest: opf.manifest,
        spine,
        base_path: base_path.to_string(),
        ncx_path,
        nav_path,
    })
}

fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = true;

    let mut opf = OpfData::default();
    let mut depth = ElementDepth::default();
    let mut fields = MetadataFields::default();
    let mut saw_package = false;

    let mut in_metadata = false;
    let mut current_element: Option<MetaField> = None;
    let mut buf_text = String::new();

    loop {
        let event = reader.read_event();
        let nesting = match &event {
            Ok(Event::Start(_)) => depth.start(),
            Ok(Event::Empty(_)) => depth.empty(),
            Ok(Event::End(_)) => {
                depth.end();
                Ok(())
            }
            Ok(Event::Eof) => depth.finish(),
            _ => Ok(()),
        };
        nesting.map_err(|msg| Error::MalformedDescriptor(msg.to_string()))?;

        match event {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"package" => saw_package = true,
                    b"metadata" => in_metadata = true,
                    b"spine" => opf.toc_id = spine_toc(&e),
                    b"item" => push_manifest_item(&mut opf.manifest, &e),
                    b"itemref" => push_spine_ref(&mut opf.spine_refs, &e),
                    _ if in_metadata => {
                        current_element = MetaField::from_local(local);
                        buf_text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"package" => saw_package = true,
                    b"spine" => opf.toc_id = spine_toc(&e),
                    b"item" => push_manifest_item(&mut opf.manifest, &e),
                    b"itemref" => push_spine_ref(&mut opf.spine_refs, &e),
                    b"meta" if in_metadata => {
                        if let Some(cover_id) = epub2_cover(&e) {
                            opf.epub2_cover_id = Some(cover_id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"metadata" {
                    in_metadata = false;
                }
                if let Some(field) = current_element.take() {
                    fields.record(field, collapse_whitespace(&buf_text));
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedDescriptor(e.to_string())),
            _ => {}
        }
    }

    if !saw_package {
        return Err(Error::MalformedDescriptor(
            "descriptor has no package element".into(),
        ));
    }

    opf.metadata = fields.into_metadata();
    Ok(opf)
}

fn push_manifest_item(manifest: &mut Manifest, e: &BytesStart<'_>) {
    let mut id = String::new();
    let mut href = String::new();
    let mut media_type = String::new();
    let mut properties = Vec::new();

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => id = attr_value(&attr),
            b"href" => href = attr_value(&attr),
            b"media-type" => media_type = attr_value(&attr),
            b"properties" => {
                properties = attr_value(&attr)
                    .split_ascii_whitespace()
                    .map(str::to_string)
                    .collect()
            }
            _ => {}
        }
    }

    if id.is_empty() || href.is_empty() {
        tracing::warn!(id = %id, href = %href, "manifest item without id or href, skipping");
        return;
    }

    manifest.insert(ManifestEntry {
        id,
        path: href,
        media_type,
        properties,
    });
}

fn push_spine_ref(spine_refs: &mut Vec<SpineRef>, e: &BytesStart<'_>) {
    let mut idref = None;
    let mut linear = true;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"idref" => idref = Some(attr_value(&attr)),
            b"linear" => linear = attr_value(&attr).trim() != "no",
            _ => {}
        }
    }
    if let Some(idref) = idref {
        spine_refs.push(SpineRef { idref, linear });
    }
}

fn spine_toc(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"toc")
        .map(|attr| attr_value(&attr))
}

fn epub2_cover(e: &BytesStart<'_>) -> Option<String> {
    let mut is_cover = false;
    let mut content = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" if attr.value.as_ref() == b"cover" => is_cover = true,
            b"content" => content = Some(attr_value(&attr)),
            _ => {}
        }
    }
    content.filter(|c| is_cover && !c.is_empty())
}

#[derive(Debug, Clone, Copy)]
enum MetaField {
    Title,
    Creator,
    Description,
    Language,
    Identifier,
    Publisher,
    Date,
}

impl MetaField {
    fn from_local(local: &[u8]) -> Option<Self> {
        Some(match local {
            b"title" => MetaField::Title,
            b"creator" => MetaField::Creator,
            b"description" => MetaField::Description,
            b"language" => MetaField::Language,
            b"identifier" => MetaField::Identifier,
            b"publisher" => MetaField::Publisher,
            b"date" => MetaField::Date,
            _ => return None,
        })
    }
}

/// First non-empty value seen for each metadata field.
#[derive(Debug, Default)]
struct MetadataFields {
    title: Option<String>,
    creator: Option<String>,
    description: Option<String>,
    language: Option<String>,
    identifier: Option<String>,
    publisher: Option<String>,
    date: Option<String>,
}

impl MetadataFields {
    fn record(&mut self, field: MetaField, value: String) {
        if value.is_empty() {
            return;
        }
        let slot = match field {
            MetaField::Title => &mut self.title,
            MetaField::Creator => &mut self.creator,
            MetaField::Description => &mut self.description,
            MetaField::Language => &mut self.language,
            MetaField::Identifier => &mut self.identifier,
            MetaField::Publisher => &mut self.publisher,
            MetaField::Date => &mut self.date,
        };
        slot.get_or_insert(value);
    }

    fn into_metadata(self) -> Metadata {
        let defaults = Metadata::default();
        Metadata {
            title: self.title.unwrap_or(defaults.title),
            creator: self.creator.unwrap_or(defaults.creator),
            description: self.description.unwrap_or(defaults.description),
            language: self.language.unwrap_or(defaults.language),
            identifier: self.identifier,
            publisher: self.publisher,
            date: self.date,
            cover_image: None,
        }
    }
}
