//! In-memory package fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use folio::io::{ByteSource, MemorySource};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// One text element of an overlay page: text and left/top/width/height in
/// percent of the page container.
pub struct Span {
    pub text: &'static str,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

pub const fn span(text: &'static str, left: f64, top: f64, width: f64, height: f64) -> Span {
    Span {
        text,
        left,
        top,
        width,
        height,
    }
}

/// Five elements on a 1000x1000 container:
///
/// - Alpha (100,100)-(200,150) and Beta (250,100)-(350,150) share a line
/// - Gamma (500,100)-(600,150) is on that line but out of reach of Alpha
/// - Delta (100,400)-(300,450)
/// - Epsilon (600,700)-(800,750)
pub const FIVE_SPANS: [Span; 5] = [
    span("Alpha", 10.0, 10.0, 10.0, 5.0),
    span("Beta", 25.0, 10.0, 10.0, 5.0),
    span("Gamma", 50.0, 10.0, 10.0, 5.0),
    span("Delta", 10.0, 40.0, 20.0, 5.0),
    span("Epsilon", 60.0, 70.0, 20.0, 5.0),
];

/// Markup of an overlay page: page image plus a positioned text layer.
pub fn overlay_page(title: &str, image: &str, spans: &[Span]) -> String {
    let mut layer = String::new();
    for s in spans {
        layer.push_str(&format!(
            "<span class=\"text-element\" style=\"left: {}%; top: {}%; width: {}%; height: {}%; font-size: 2.5vh;\" data-text=\"{}\">{}</span>\n",
            s.left, s.top, s.width, s.height, s.text, s.text
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>
<div class="page-container">
<img class="page-image" src="{image}" alt="{title}"/>
<div class="text-layer">
{layer}</div>
</div>
</body>
</html>"#
    )
}

pub fn flowed_page(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
    )
}

pub fn container_xml(descriptor_path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{descriptor_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
    )
}

/// Builds a package archive entry by entry.
#[derive(Default)]
pub struct PackageBuilder {
    entries: Vec<(String, Vec<u8>, CompressionMethod)>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries
            .push((name.to_string(), data.into(), CompressionMethod::Deflated));
        self
    }

    /// Add an uncompressed entry, so its bytes appear verbatim in the archive.
    pub fn stored(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries
            .push((name.to_string(), data.into(), CompressionMethod::Stored));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        for (name, data, method) in &self.entries {
            let options = SimpleFileOptions::default().compression_method(*method);
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn source(&self) -> Arc<dyn ByteSource> {
        Arc::new(MemorySource::new(self.build()))
    }
}

/// A three-page scanned book under `OEBPS/`:
///
/// 1. overlay page with [`FIVE_SPANS`], titled by the nav document
/// 2. overlay page with two spans, no nav entry
/// 3. flowed page
pub fn scanned_book() -> PackageBuilder {
    let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:1234</dc:identifier>
    <dc:title>Scanned Field Notes</dc:title>
    <dc:creator>A. Surveyor</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="p1" href="pages/p1.xhtml" media-type="application/xhtml+xml"/>
    <item id="p2" href="pages/p2.xhtml" media-type="application/xhtml+xml"/>
    <item id="p3" href="pages/p3.xhtml" media-type="application/xhtml+xml"/>
    <item id="img1" href="images/p1.png" media-type="image/png"/>
    <item id="img2" href="images/p2.png" media-type="image/png"/>
  </manifest>
  <spine>
    <itemref idref="p1"/>
    <itemref idref="p2"/>
    <itemref idref="p3"/>
  </spine>
</package>"#;

    let nav = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Contents</title></head>
<body>
<nav epub:type="toc"><ol>
  <li><a href="pages/p1.xhtml">Cover Sheet</a></li>
  <li><a href="pages/p3.xhtml#notes">Notes</a></li>
</ol></nav>
</body>
</html>"#;

    PackageBuilder::new()
        .file("META-INF/container.xml", container_xml("OEBPS/content.opf"))
        .file("OEBPS/content.opf", opf)
        .file("OEBPS/nav.xhtml", nav)
        .file(
            "OEBPS/pages/p1.xhtml",
            overlay_page("Scan 1", "../images/p1.png", &FIVE_SPANS),
        )
        .file(
            "OEBPS/pages/p2.xhtml",
            overlay_page(
                "Scan 2",
                "../images/p2.png",
                &[
                    span("Second", 10.0, 10.0, 20.0, 5.0),
                    span("Page", 40.0, 10.0, 20.0, 5.0),
                ],
            ),
        )
        .file(
            "OEBPS/pages/p3.xhtml",
            flowed_page("Notes", "<h1 id=\"notes\">Notes</h1><p>Transcribed by hand.</p>"),
        )
        .file("OEBPS/images/p1.png", PNG)
        .file("OEBPS/images/p2.png", PNG)
}
