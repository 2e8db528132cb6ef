//! `META-INF/container.xml`: locating the package descriptor.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::archive::Archive;
use super::xml::{ElementDepth, attr_value, local_name};
use crate::error::{Error, Result};
use crate::util::strip_bom;

/// Fixed location of the root descriptor pointer.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Find the package descriptor path named by the archive's container entry.
///
/// Fails with [`Error::MalformedContainer`] when the entry is missing, is
/// not well-formed XML, or has no `rootfile` with a `full-path`.
pub fn parse_container(archive: &Archive) -> Result<String> {
    let bytes = archive.read_entry(CONTAINER_PATH).map_err(|e| {
        Error::MalformedContainer(format!("cannot read {}: {}", CONTAINER_PATH, e))
    })?;
    parse_container_xml(&bytes)
}

/// Parse container XML bytes and return the first rootfile's `full-path`.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| Error::MalformedContainer(format!("container is not UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut full_path = None;
    let mut depth = ElementDepth::default();

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
        nesting.map_err(|msg| Error::MalformedContainer(msg.to_string()))?;

        match event {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if full_path.is_none() && local_name(e.name().as_ref()) == b"rootfile" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"full-path" {
                            let value = attr_value(&attr);
                            let value = value.trim();
                            if !value.is_empty() {
                                full_path = Some(value.to_string());
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedContainer(e.to_string())),
            _ => {}
        }
    }

    full_path.ok_or_else(|| Error::MalformedContainer("no rootfile found in container.xml".into()))
}
