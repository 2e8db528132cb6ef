//! A single reading session: load state, active page, scroll and selection.

use std::sync::Arc;

use super::clipboard::Clipboard;
use super::geometry::{Point, SurfaceLayout};
use super::pagination::{Focus, Key, KeyInput, NavCommand, PageCursor, nav_binding};
use super::selection::{Notice, PointerTarget, SelectionEngine};
use super::toc::TableOfContents;
use crate::book::{Book, load_book};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::io::ByteSource;
use crate::render::{ElementId, PageRenderModel, render_page};

/// Where the session is in loading a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Loading,
    Ready,
    /// A fatal load error, as shown to the user.
    Failed(String),
}

/// Proof of which load a result belongs to. Only the latest ticket commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Owns the loaded book and everything scoped to the active page.
///
/// Page changes re-render the page, scroll the surface back to the top and
/// clear the selection.
pub struct ReaderSession {
    generation: u64,
    state: LoadState,
    book: Option<Book>,
    cursor: PageCursor,
    page: Option<PageRenderModel>,
    layout: SurfaceLayout,
    selection: SelectionEngine,
    notices: Vec<Notice>,
}

impl ReaderSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            generation: 0,
            state: LoadState::Empty,
            book: None,
            cursor: PageCursor::new(0),
            page: None,
            layout: SurfaceLayout::default(),
            selection: SelectionEngine::new(config),
            notices: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Start a new load. The current book is dropped and any load still in
    /// flight becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.state = LoadState::Loading;
        self.unload();
        LoadTicket(self.generation)
    }

    /// Commit a load result. Returns `false`, changing nothing, when
    /// `ticket` is not the latest.
    pub async fn finish_load(&mut self, ticket: LoadTicket, result: Result<Book>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale load"
            );
            return false;
        }

        match result {
            Ok(book) => {
                tracing::info!(title = %book.metadata().title, pages = book.pages().len(), "book ready");
                self.cursor = PageCursor::new(book.pages().len());
                self.book = Some(book);
                self.state = LoadState::Ready;
                self.display().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "load failed");
                self.unload();
                self.state = LoadState::Failed(e.to_string());
            }
        }
        true
    }

    /// Load `source` and commit the result.
    pub async fn open(&mut self, source: Arc<dyn ByteSource>) -> &LoadState {
        let ticket = self.begin_load();
        let result = load_book(source).await;
        self.finish_load(ticket, result).await;
        &self.state
    }

    /// Drop the book and return to [`LoadState::Empty`].
    pub fn close(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.unload();
        self.state = LoadState::Empty;
    }

    fn unload(&mut self) {
        self.book = None;
        self.page = None;
        self.cursor = PageCursor::new(0);
        self.selection.reset(None);
        self.layout.scroll = Point::default();
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn toc(&self) -> TableOfContents {
        self.book.as_ref().map(TableOfContents::new).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    pub fn page_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn page_count(&self) -> usize {
        self.cursor.len()
    }

    /// Render model of the active page.
    pub fn page(&self) -> Option<&PageRenderModel> {
        self.page.as_ref()
    }

    pub async fn go_to(&mut self, index: usize) -> bool {
        self.navigate(NavCommand::GoTo(index)).await
    }

    pub async fn next(&mut self) -> bool {
        self.navigate(NavCommand::Next).await
    }

    pub async fn previous(&mut self) -> bool {
        self.navigate(NavCommand::Previous).await
    }

    /// Apply a navigation command; re-renders only if the page changed.
    pub async fn navigate(&mut self, command: NavCommand) -> bool {
        if !self.cursor.apply(command) {
            return false;
        }
        self.display().await;
        true
    }

    async fn display(&mut self) {
        self.layout.scroll = Point::default();
        self.page = None;
        self.selection.reset(None);

        let Some(book) = &self.book else { return };
        match render_page(book, self.cursor.index()).await {
            Ok(model) => {
                self.selection.reset(model.text_layer.clone());
                self.page = Some(model);
            }
            Err(e) => tracing::warn!(index = self.cursor.index(), error = %e, "page render failed"),
        }
    }

    // ------------------------------------------------------------------
    // Surface
    // ------------------------------------------------------------------

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Update the page container rectangle and viewport after a relayout.
    pub fn set_layout(&mut self, layout: SurfaceLayout) {
        self.layout = layout;
    }

    /// Scroll the reading surface. A drag in progress follows the scroll.
    pub fn scroll_to(&mut self, scroll: Point, modifier: bool) {
        self.layout.scroll = scroll;
        self.selection.scrolled(modifier, &self.layout);
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn pointer_down(&mut self, target: PointerTarget, client: Point) {
        self.selection.pointer_down(target, client, &self.layout);
    }

    pub fn pointer_move(&mut self, client: Point, modifier: bool) {
        self.selection.pointer_move(client, modifier, &self.layout);
    }

    pub fn pointer_up(&mut self, target: PointerTarget, modifier: bool) {
        if let Some(notice) = self.selection.pointer_up(target, modifier, &self.layout) {
            self.notices.push(notice);
        }
    }

    pub fn click(&mut self, target: PointerTarget, modifier: bool) {
        self.selection.click(target, modifier, &self.layout);
    }

    pub fn double_click(&mut self, element: ElementId) {
        self.selection.double_click(element, &self.layout);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Copy the selection. A refused clipboard write becomes an error
    /// notice; the selection and page are unaffected.
    pub async fn copy(&mut self, clipboard: &dyn Clipboard) -> Option<String> {
        match self.selection.copy(clipboard).await {
            Ok(Some(text)) => {
                self.notices
                    .push(Notice::Info("Text copied to clipboard".to_string()));
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "copy failed");
                self.notices.push(Notice::Error(e.to_string()));
                None
            }
        }
    }

    /// Route a key press. Returns `true` if the key was consumed.
    pub async fn handle_key(&mut self, input: KeyInput, clipboard: &dyn Clipboard) -> bool {
        if input.key == Key::Escape {
            self.selection.clear();
            return true;
        }
        // Text fields keep their own shortcuts.
        if input.focus == Focus::TextInput {
            return false;
        }

        match input.key {
            Key::Char(c) if input.modifier && c.eq_ignore_ascii_case(&'a') => {
                self.selection.select_all();
                true
            }
            Key::Char(c) if input.modifier && c.eq_ignore_ascii_case(&'c') => {
                if self.selection.selected().is_empty() {
                    return false;
                }
                self.copy(clipboard).await;
                true
            }
            _ => match nav_binding(&input) {
                Some(command) => {
                    self.navigate(command).await;
                    true
                }
                None => false,
            },
        }
    }

    /// Drain pending transient notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Default for ReaderSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for ReaderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSession")
            .field("state", &self.state)
            .field("page", &self.cursor.index())
            .field("pages", &self.cursor.len())
            .field("selected", &self.selection.selected().len())
            .finish_non_exhaustive()
    }
}
