//! Multi-element text selection over an overlay page's text layer.
//!
//! Interaction is a small state machine: [`reduce`] maps a state and an
//! event to the next state without side effects, and [`SelectionEngine`]
//! wraps it with the active text layer, configuration and clipboard export.
//!
//! Element rectangles are never stored. Every hit test places the layer's
//! percentage boxes into the layout passed with the event, so a scrolled or
//! resized surface is always tested against its current geometry.

use std::collections::BTreeSet;

use serde::Serialize;

use super::clipboard::Clipboard;
use super::geometry::{Point, Rect, SurfaceLayout};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::render::{ElementId, TextLayer};

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// A text element of the active page.
    Element(ElementId),
    /// The reading surface outside any text element (image, margins).
    Surface,
    /// Toolbar and other UI outside the reading surface.
    Chrome,
}

/// Pointer-driven interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Dragging(Drag),
}

/// A press in progress. It only becomes a rectangle drag once the pointer
/// travels past the drag threshold; until then releasing it is a click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Press position in document coordinates.
    pub origin: Point,
    /// Latest pointer position in viewport coordinates.
    pub pointer: Point,
    pub pressed_on: PointerTarget,
    /// Drag rectangle in document coordinates, once past the threshold.
    pub rect: Option<Rect>,
}

/// Selected elements plus the interaction mode. Page-scoped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected: BTreeSet<ElementId>,
    pub mode: Mode,
}

impl SelectionState {
    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, Mode::Dragging(_))
    }

    /// The live drag rectangle, in document coordinates.
    pub fn drag_rect(&self) -> Option<Rect> {
        match self.mode {
            Mode::Dragging(drag) => drag.rect,
            Mode::Idle => None,
        }
    }
}

/// Inputs to the selection state machine. Pointer positions are viewport
/// (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEvent {
    PointerDown {
        target: PointerTarget,
        client: Point,
    },
    PointerMove {
        client: Point,
        modifier: bool,
    },
    /// The surface scrolled under a held pointer.
    Scrolled {
        modifier: bool,
    },
    PointerUp {
        target: PointerTarget,
        modifier: bool,
    },
    Click {
        target: PointerTarget,
        modifier: bool,
    },
    DoubleClick {
        element: ElementId,
    },
    SelectAll,
    Clear,
}

/// Everything a transition may read besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub layer: &'a TextLayer,
    pub layout: &'a SurfaceLayout,
    pub config: &'a EngineConfig,
}

impl HitContext<'_> {
    /// Current rectangle of every element, in document order.
    fn element_rects(&self) -> impl Iterator<Item = (ElementId, Rect)> + '_ {
        self.layer
            .elements()
            .iter()
            .map(|e| (e.id, e.bbox.to_rect(&self.layout.container)))
    }

    fn element_rect(&self, id: ElementId) -> Option<Rect> {
        self.layer
            .get(id)
            .map(|e| e.bbox.to_rect(&self.layout.container))
    }

    fn contains(&self, id: ElementId) -> bool {
        self.layer.get(id).is_some()
    }
}

/// Next selection state for `event`.
pub fn reduce(
    state: &SelectionState,
    event: &SelectionEvent,
    ctx: &HitContext<'_>,
) -> SelectionState {
    let mut next = state.clone();

    match *event {
        SelectionEvent::PointerDown { target, client } => {
            if target == PointerTarget::Chrome {
                return next;
            }
            next.mode = Mode::Dragging(Drag {
                origin: ctx.layout.to_document(client),
                pointer: client,
                pressed_on: target,
                rect: None,
            });
        }
        SelectionEvent::PointerMove { client, modifier } => {
            if let Mode::Dragging(mut drag) = next.mode {
                drag.pointer = client;
                // A press on a text element stays a click however far it moves.
                if drag.pressed_on == PointerTarget::Surface {
                    update_drag(&mut next.selected, &mut drag, modifier, ctx);
                }
                next.mode = Mode::Dragging(drag);
            }
        }
        SelectionEvent::Scrolled { modifier } => {
            if let Mode::Dragging(mut drag) = next.mode
                && drag.rect.is_some()
            {
                update_drag(&mut next.selected, &mut drag, modifier, ctx);
                next.mode = Mode::Dragging(drag);
            }
        }
        SelectionEvent::PointerUp { target, modifier } => {
            if let Mode::Dragging(drag) = next.mode {
                next.mode = Mode::Idle;
                if drag.rect.is_none() && drag.pressed_on == target {
                    click(&mut next.selected, target, modifier, ctx);
                }
            }
        }
        SelectionEvent::Click { target, modifier } => {
            click(&mut next.selected, target, modifier, ctx);
        }
        SelectionEvent::DoubleClick { element } => {
            next.selected = line_selection(element, ctx);
        }
        SelectionEvent::SelectAll => {
            next.selected = ctx.layer.ids().collect();
        }
        SelectionEvent::Clear => {
            next.selected.clear();
        }
    }

    next
}

fn click(
    selected: &mut BTreeSet<ElementId>,
    target: PointerTarget,
    modifier: bool,
    ctx: &HitContext<'_>,
) {
    match target {
        PointerTarget::Element(id) if ctx.contains(id) => {
            if !modifier {
                selected.retain(|&other| other == id);
            }
            if !selected.remove(&id) {
                selected.insert(id);
            }
        }
        PointerTarget::Element(_) | PointerTarget::Chrome => {}
        PointerTarget::Surface => selected.clear(),
    }
}

/// Grow the drag rectangle to the pointer and hit-test every element.
fn update_drag(
    selected: &mut BTreeSet<ElementId>,
    drag: &mut Drag,
    modifier: bool,
    ctx: &HitContext<'_>,
) {
    let current = ctx.layout.to_document(drag.pointer);
    if drag.rect.is_none() && drag.origin.distance(current) <= ctx.config.drag_threshold_px {
        return;
    }

    let rect = Rect::spanning(drag.origin, current);
    drag.rect = Some(rect);

    for (id, element_rect) in ctx.element_rects() {
        if element_rect.intersects(&rect) {
            selected.insert(id);
        } else if !modifier {
            selected.remove(&id);
        }
    }
}

/// The element plus every element on the same visual line within reach.
fn line_selection(element: ElementId, ctx: &HitContext<'_>) -> BTreeSet<ElementId> {
    let Some(anchor) = ctx.element_rect(element) else {
        return BTreeSet::new();
    };
    ctx.element_rects()
        .filter(|(id, rect)| {
            *id == element
                || (rect.area() > 0.0
                    && (rect.top - anchor.top).abs() < ctx.config.line_tolerance_px
                    && (rect.left - anchor.left).abs() < ctx.config.line_reach_px)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Transient user-facing message produced by selection operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Selection over the active page.
///
/// Holds the page's text layer; a page without an overlay has no layer
/// and every operation is a no-op.
#[derive(Debug, Default)]
pub struct SelectionEngine {
    config: EngineConfig,
    layer: Option<TextLayer>,
    state: SelectionState,
}

impl SelectionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            layer: None,
            state: SelectionState::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Switch to a new page's layer. Selection is cleared and any pending
    /// drag is aborted.
    pub fn reset(&mut self, layer: Option<TextLayer>) {
        if self.state.is_dragging() {
            tracing::debug!("page change aborted drag");
        }
        self.layer = layer;
        self.state = SelectionState::default();
    }

    pub fn layer(&self) -> Option<&TextLayer> {
        self.layer.as_ref()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> &BTreeSet<ElementId> {
        &self.state.selected
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.state.selected.contains(&id)
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    pub fn drag_rect(&self) -> Option<Rect> {
        self.state.drag_rect()
    }

    /// Feed one event through [`reduce`].
    pub fn handle(&mut self, event: SelectionEvent, layout: &SurfaceLayout) {
        let Some(layer) = &self.layer else { return };
        let ctx = HitContext {
            layer,
            layout,
            config: &self.config,
        };
        let next = reduce(&self.state, &event, &ctx);
        if next.selected != self.state.selected {
            tracing::trace!(?event, selected = next.selected.len(), "selection changed");
        }
        self.state = next;
    }

    pub fn pointer_down(&mut self, target: PointerTarget, client: Point, layout: &SurfaceLayout) {
        self.handle(SelectionEvent::PointerDown { target, client }, layout);
    }

    pub fn pointer_move(&mut self, client: Point, modifier: bool, layout: &SurfaceLayout) {
        self.handle(SelectionEvent::PointerMove { client, modifier }, layout);
    }

    pub fn scrolled(&mut self, modifier: bool, layout: &SurfaceLayout) {
        self.handle(SelectionEvent::Scrolled { modifier }, layout);
    }

    /// Release the pointer. Returns the selection notice if a press ends
    /// with anything selected.
    pub fn pointer_up(
        &mut self,
        target: PointerTarget,
        modifier: bool,
        layout: &SurfaceLayout,
    ) -> Option<Notice> {
        let pressed = self.is_dragging();
        self.handle(SelectionEvent::PointerUp { target, modifier }, layout);
        if pressed { self.selection_summary() } else { None }
    }

    pub fn click(&mut self, target: PointerTarget, modifier: bool, layout: &SurfaceLayout) {
        self.handle(SelectionEvent::Click { target, modifier }, layout);
    }

    pub fn double_click(&mut self, element: ElementId, layout: &SurfaceLayout) {
        self.handle(SelectionEvent::DoubleClick { element }, layout);
    }

    pub fn select_all(&mut self) {
        self.handle(SelectionEvent::SelectAll, &SurfaceLayout::default());
    }

    pub fn clear(&mut self) {
        self.handle(SelectionEvent::Clear, &SurfaceLayout::default());
    }

    /// Selected texts in document order, joined by single spaces.
    pub fn selected_text(&self) -> String {
        let Some(layer) = &self.layer else {
            return String::new();
        };
        self.state
            .selected
            .iter()
            .filter_map(|&id| layer.get(id))
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// "N text elements selected" notice, when anything is selected.
    pub fn selection_summary(&self) -> Option<Notice> {
        match self.state.selected.len() {
            0 => None,
            1 => Some(Notice::Info("1 text element selected".to_string())),
            n => Some(Notice::Info(format!("{} text elements selected", n))),
        }
    }

    /// Write the selected text to `clipboard`.
    ///
    /// Returns `Ok(None)` when nothing is selected. A refused write is an
    /// error for the caller to report; the selection is left untouched.
    pub async fn copy(&self, clipboard: &dyn Clipboard) -> Result<Option<String>> {
        if self.state.selected.is_empty() {
            return Ok(None);
        }
        let text = self.selected_text();
        clipboard.write_text(&text).await?;
        tracing::debug!(elements = self.state.selected.len(), chars = text.len(), "copied selection");
        Ok(Some(text))
    }
}
