//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while loading, rendering or reading a package.
///
/// `MalformedContainer`, `MalformedDescriptor` and archive failures (`Io`,
/// `Zip`) are fatal to a load. `AssetNotFound` is absorbed by the page
/// renderer, `Clipboard` by the reader session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Malformed package descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
