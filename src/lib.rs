//! # folio
//!
//! A reader engine for packaged documents: EPUB-style ZIP archives whose
//! pages may be *overlay pages*, a full-page scan with an invisible,
//! absolutely positioned text layer on top.
//!
//! ## Features
//!
//! - Container, descriptor (OPF) and table-of-contents parsing
//! - Lazy, cached asset resolution into `data:` URIs
//! - Page rendering with overlay detection and text-layer extraction
//! - Click, drag and line selection over text layers, with clipboard export
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{MemoryClipboard, ReaderSession, LoadState};
//! use folio::io::FileSource;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = ReaderSession::default();
//! let source = FileSource::open("scan.epub")?;
//! if let LoadState::Failed(message) = session.open(Arc::new(source)).await {
//!     eprintln!("{}", message);
//! }
//!
//! session.select_all();
//! let clipboard = MemoryClipboard::new();
//! session.copy(&clipboard).await;
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod config;
pub mod dom;
pub mod error;
pub mod io;
pub mod package;
pub mod reader;
pub mod render;
pub(crate) mod util;

pub use book::{AssetHandle, AssetStore, Book, Metadata, NavPoint, Page, load_book};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use reader::{
    Clipboard, FailingClipboard, LoadState, MemoryClipboard, PointerTarget, ReaderSession,
    SelectionEngine, TableOfContents,
};
pub use render::{ElementId, PageKind, PageRenderModel, TextElement, TextLayer, render_page};
