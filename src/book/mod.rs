//! The loaded book: model, asset store and package loader.

mod assets;
mod loader;
mod model;

pub use assets::{AssetHandle, AssetStore};
pub use loader::{load_book, load_book_from_path, load_pages};
pub use model::{Book, Manifest, ManifestEntry, Metadata, NavPoint, Page, SpineItem};
