//! Random-access byte sources for package archives.
//!
//! The engine never cares where a package came from: a local file, a
//! fetched blob held in memory, anything that can answer positioned reads.

mod byte_source;
mod cursor;

pub use byte_source::{ByteSource, FileSource, MemorySource};
pub use cursor::SourceCursor;
