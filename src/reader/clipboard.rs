//! The system clipboard, as a capability the reader is handed.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Scoped "write text to the clipboard" operation. Writes may be refused.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// In-process clipboard for headless use and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock() = Some(text.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// A clipboard that refuses every write, like a denied permission.
#[derive(Debug, Clone)]
pub struct FailingClipboard {
    reason: String,
}

impl FailingClipboard {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for FailingClipboard {
    fn default() -> Self {
        Self::new("permission denied")
    }
}

#[async_trait]
impl Clipboard for FailingClipboard {
    async fn write_text(&self, _text: &str) -> Result<()> {
        Err(Error::Clipboard(self.reason.clone()))
    }
}
