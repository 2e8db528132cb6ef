//! Reader session behaviour: loading, paging and overlay selection.

mod common;

use common::{PackageBuilder, scanned_book};
use folio::reader::{Focus, Key, KeyInput, Notice, Point, Rect, SurfaceLayout};
use folio::{
    ElementId, FailingClipboard, LoadState, MemoryClipboard, PageKind, PointerTarget,
    ReaderSession, load_book,
};

const ALPHA: ElementId = ElementId(0);
const BETA: ElementId = ElementId(1);
const GAMMA: ElementId = ElementId(2);
const DELTA: ElementId = ElementId(3);
const EPSILON: ElementId = ElementId(4);

async fn ready_session() -> ReaderSession {
    let mut session = ReaderSession::default();
    let state = session.open(scanned_book().source()).await.clone();
    assert_eq!(state, LoadState::Ready);
    session.set_layout(SurfaceLayout::new(Rect::new(0.0, 0.0, 1000.0, 1000.0)));
    session
}

fn selected(session: &ReaderSession) -> Vec<ElementId> {
    session.selection().selected().iter().copied().collect()
}

fn drag(session: &mut ReaderSession, from: Point, to: Point, modifier: bool) {
    session.pointer_down(PointerTarget::Surface, from);
    session.pointer_move(to, modifier);
    session.pointer_up(PointerTarget::Surface, modifier);
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_open_lands_on_first_page() {
    let session = ready_session().await;

    assert_eq!(session.page_count(), 3);
    assert_eq!(session.page_index(), 0);
    let page = session.page().unwrap();
    assert_eq!(page.kind, PageKind::Overlay);
    assert_eq!(session.selection().layer().unwrap().len(), 5);
    assert!(selected(&session).is_empty());

    let toc = session.toc();
    let titles: Vec<_> = toc.entries().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Cover Sheet", "Scan 2", "Notes"]);
    assert_eq!(toc.page_for_path("pages/p3.xhtml#notes"), Some(2));
}

#[tokio::test]
async fn test_failed_load_reports_and_holds_no_book() {
    let mut session = ReaderSession::default();
    let broken = PackageBuilder::new().file("OEBPS/content.opf", "<package/>");

    let state = session.open(broken.source()).await.clone();
    assert!(matches!(state, LoadState::Failed(ref message) if message.contains("container")));
    assert!(session.book().is_none());
    assert!(session.page().is_none());
    assert_eq!(session.page_count(), 0);
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    let mut session = ReaderSession::default();
    let stale = session.begin_load();
    let current = session.begin_load();

    let book = load_book(scanned_book().source()).await.unwrap();
    assert!(!session.finish_load(stale, Ok(book)).await);
    assert_eq!(session.state(), &LoadState::Loading);
    assert!(session.book().is_none());

    let book = load_book(scanned_book().source()).await.unwrap();
    assert!(session.finish_load(current, Ok(book)).await);
    assert_eq!(session.state(), &LoadState::Ready);
    assert_eq!(session.page_count(), 3);
}

#[tokio::test]
async fn test_reload_replaces_book_and_selection() {
    let mut session = ready_session().await;
    session.select_all();
    session.next().await;

    session.open(scanned_book().source()).await;
    assert_eq!(session.page_index(), 0);
    assert!(selected(&session).is_empty());

    session.close();
    assert_eq!(session.state(), &LoadState::Empty);
    assert!(session.book().is_none());
}

// ============================================================================
// Paging
// ============================================================================

#[tokio::test]
async fn test_page_change_clears_selection_and_scroll() {
    let mut session = ready_session().await;
    session.select_all();
    session.scroll_to(Point::new(0.0, 240.0), false);
    assert_eq!(selected(&session).len(), 5);

    assert!(session.next().await);

    assert_eq!(session.page_index(), 1);
    assert!(selected(&session).is_empty());
    assert_eq!(session.layout().scroll, Point::default());
    assert_eq!(session.selection().layer().unwrap().len(), 2);
}

#[tokio::test]
async fn test_navigation_is_bounded() {
    let mut session = ready_session().await;

    assert!(!session.previous().await);
    assert!(!session.go_to(0).await);
    assert!(!session.go_to(3).await);
    assert_eq!(session.page_index(), 0);

    assert!(session.go_to(2).await);
    assert!(!session.next().await);
    assert_eq!(session.page().unwrap().kind, PageKind::Flowed);
    assert!(session.selection().layer().is_none());
}

#[tokio::test]
async fn test_same_page_keeps_selection() {
    let mut session = ready_session().await;
    session.select_all();
    assert!(!session.go_to(0).await);
    assert_eq!(selected(&session).len(), 5);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_drag_selects_enclosed_elements() {
    let mut session = ready_session().await;

    drag(
        &mut session,
        Point::new(80.0, 80.0),
        Point::new(370.0, 170.0),
        false,
    );

    assert_eq!(selected(&session), [ALPHA, BETA]);
    assert!(!session.selection().is_dragging());
    assert_eq!(
        session.take_notices(),
        [Notice::Info("2 text elements selected".to_string())]
    );
}

#[tokio::test]
async fn test_click_replaces_previous_selection() {
    let mut session = ready_session().await;

    session.click(PointerTarget::Element(ALPHA), false);
    assert_eq!(selected(&session), [ALPHA]);

    session.click(PointerTarget::Element(BETA), false);
    assert_eq!(selected(&session), [BETA]);

    session.click(PointerTarget::Element(DELTA), true);
    assert_eq!(selected(&session), [BETA, DELTA]);

    session.click(PointerTarget::Surface, false);
    assert!(selected(&session).is_empty());
}

#[tokio::test]
async fn test_escape_clears_selection() {
    let mut session = ready_session().await;
    let clipboard = MemoryClipboard::new();

    drag(
        &mut session,
        Point::new(80.0, 80.0),
        Point::new(370.0, 170.0),
        false,
    );
    assert_eq!(selected(&session), [ALPHA, BETA]);

    assert!(session.handle_key(KeyInput::new(Key::Escape), &clipboard).await);
    assert!(selected(&session).is_empty());
}

#[tokio::test]
async fn test_short_press_is_a_click_not_a_drag() {
    let mut session = ready_session().await;
    session.click(PointerTarget::Element(ALPHA), false);

    session.pointer_down(PointerTarget::Element(GAMMA), Point::new(550.0, 120.0));
    session.pointer_move(Point::new(553.0, 122.0), false);
    session.pointer_up(PointerTarget::Element(GAMMA), false);

    assert_eq!(selected(&session), [GAMMA]);
    assert_eq!(
        session.take_notices(),
        [Notice::Info("1 text element selected".to_string())]
    );
}

#[tokio::test]
async fn test_modifier_drag_extends_selection() {
    let mut session = ready_session().await;
    session.click(PointerTarget::Element(EPSILON), false);

    drag(
        &mut session,
        Point::new(80.0, 80.0),
        Point::new(370.0, 170.0),
        true,
    );
    assert_eq!(selected(&session), [ALPHA, BETA, EPSILON]);

    drag(
        &mut session,
        Point::new(80.0, 80.0),
        Point::new(370.0, 170.0),
        false,
    );
    assert_eq!(selected(&session), [ALPHA, BETA]);
}

#[tokio::test]
async fn test_drag_is_scroll_invariant() {
    let mut session = ready_session().await;
    session.scroll_to(Point::new(0.0, 50.0), false);

    // Client positions 50px higher land on the same document rectangle.
    drag(
        &mut session,
        Point::new(80.0, 30.0),
        Point::new(370.0, 120.0),
        false,
    );
    assert_eq!(selected(&session), [ALPHA, BETA]);
}

#[tokio::test]
async fn test_scrolling_mid_drag_grows_rectangle() {
    let mut session = ready_session().await;

    session.pointer_down(PointerTarget::Surface, Point::new(80.0, 80.0));
    session.pointer_move(Point::new(370.0, 120.0), false);
    assert_eq!(selected(&session), [ALPHA, BETA]);

    session.scroll_to(Point::new(0.0, 300.0), false);
    assert_eq!(selected(&session), [ALPHA, BETA, DELTA]);
    assert_eq!(
        session.selection().drag_rect(),
        Some(Rect::new(80.0, 80.0, 370.0, 420.0))
    );

    session.pointer_up(PointerTarget::Surface, false);
    assert_eq!(selected(&session), [ALPHA, BETA, DELTA]);
}

#[tokio::test]
async fn test_double_click_selects_line() {
    let mut session = ready_session().await;
    session.click(PointerTarget::Element(EPSILON), false);

    session.double_click(ALPHA);
    assert_eq!(selected(&session), [ALPHA, BETA]);
}

#[tokio::test]
async fn test_chrome_press_does_not_start_drag() {
    let mut session = ready_session().await;
    session.select_all();

    session.pointer_down(PointerTarget::Chrome, Point::new(10.0, 10.0));
    session.pointer_move(Point::new(900.0, 900.0), false);
    assert!(!session.selection().is_dragging());
    session.pointer_up(PointerTarget::Chrome, false);

    assert_eq!(selected(&session).len(), 5);
}

// ============================================================================
// Clipboard and keys
// ============================================================================

#[tokio::test]
async fn test_copy_joins_in_document_order() {
    let mut session = ready_session().await;
    let clipboard = MemoryClipboard::new();

    session.click(PointerTarget::Element(DELTA), false);
    session.click(PointerTarget::Element(ALPHA), true);
    session.take_notices();

    assert_eq!(
        session.copy(&clipboard).await.as_deref(),
        Some("Alpha Delta")
    );
    assert_eq!(clipboard.contents().as_deref(), Some("Alpha Delta"));
    assert_eq!(
        session.take_notices(),
        [Notice::Info("Text copied to clipboard".to_string())]
    );
}

#[tokio::test]
async fn test_copy_with_nothing_selected_is_a_no_op() {
    let mut session = ready_session().await;
    let clipboard = MemoryClipboard::new();

    assert_eq!(session.copy(&clipboard).await, None);
    assert_eq!(clipboard.writes(), 0);
    assert!(session.take_notices().is_empty());
}

#[tokio::test]
async fn test_refused_clipboard_keeps_selection() {
    let mut session = ready_session().await;
    session.select_all();

    assert_eq!(session.copy(&FailingClipboard::default()).await, None);

    let notices = session.take_notices();
    assert!(
        matches!(notices.as_slice(), [Notice::Error(message)] if message.contains("permission denied")),
        "{notices:?}"
    );
    assert_eq!(selected(&session).len(), 5);
    assert_eq!(session.page_index(), 0);
}

#[tokio::test]
async fn test_keyboard_shortcuts() {
    let mut session = ready_session().await;
    let clipboard = MemoryClipboard::new();

    let select_all = KeyInput::new(Key::Char('a')).with_modifier();
    assert!(session.handle_key(select_all, &clipboard).await);
    assert_eq!(selected(&session).len(), 5);

    let copy = KeyInput::new(Key::Char('c')).with_modifier();
    assert!(session.handle_key(copy, &clipboard).await);
    assert_eq!(
        clipboard.contents().as_deref(),
        Some("Alpha Beta Gamma Delta Epsilon")
    );

    assert!(session.handle_key(KeyInput::new(Key::Right), &clipboard).await);
    assert_eq!(session.page_index(), 1);
    assert!(session.handle_key(KeyInput::new(Key::End), &clipboard).await);
    assert_eq!(session.page_index(), 2);
    assert!(session.handle_key(KeyInput::new(Key::Home), &clipboard).await);
    assert_eq!(session.page_index(), 0);
}

#[tokio::test]
async fn test_text_input_focus_suppresses_shortcuts() {
    let mut session = ready_session().await;
    let clipboard = MemoryClipboard::new();

    let right = KeyInput::new(Key::Right).in_focus(Focus::TextInput);
    assert!(!session.handle_key(right, &clipboard).await);
    assert_eq!(session.page_index(), 0);

    let select_all = KeyInput::new(Key::Char('a'))
        .with_modifier()
        .in_focus(Focus::TextInput);
    assert!(!session.handle_key(select_all, &clipboard).await);
    assert!(selected(&session).is_empty());
}
