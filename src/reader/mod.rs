//! Interactive reading: pagination, overlay selection and the session that
//! ties them to a loaded book.

mod clipboard;
pub mod geometry;
mod pagination;
mod selection;
mod session;
mod toc;

pub use clipboard::{Clipboard, FailingClipboard, MemoryClipboard};
pub use geometry::{PercentBox, Point, Rect, SurfaceLayout};
pub use pagination::{Focus, Key, KeyInput, NavCommand, PageCursor, nav_binding};
pub use selection::{
    Drag, HitContext, Mode, Notice, PointerTarget, SelectionEngine, SelectionEvent,
    SelectionState, reduce,
};
pub use session::{LoadState, LoadTicket, ReaderSession};
pub use toc::{TableOfContents, TocEntry};
