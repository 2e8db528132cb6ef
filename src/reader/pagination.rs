//! Page cursor and keyboard bindings.

use serde::Serialize;

/// Bounded position in a book's page list.
///
/// Out-of-range moves are silent no-ops. A cursor over zero pages never
/// moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    index: usize,
    len: usize,
}

impl PageCursor {
    /// Cursor at the first page.
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Move to `index`. Returns `true` only if the cursor moved.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len || index == self.index {
            return false;
        }
        self.index = index;
        true
    }

    pub fn previous(&mut self) -> bool {
        match self.index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.index + 1)
    }

    pub fn first(&mut self) -> bool {
        self.go_to(0)
    }

    pub fn last(&mut self) -> bool {
        match self.len.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Apply a navigation command.
    pub fn apply(&mut self, command: NavCommand) -> bool {
        match command {
            NavCommand::Previous => self.previous(),
            NavCommand::Next => self.next(),
            NavCommand::First => self.first(),
            NavCommand::Last => self.last(),
            NavCommand::GoTo(index) => self.go_to(index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Previous,
    Next,
    First,
    Last,
    GoTo(usize),
}

/// Keys the reader reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Escape,
    Char(char),
}

/// Where keyboard focus currently sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    ReadingSurface,
    /// A text field or editable element; navigation keys belong to it.
    TextInput,
    /// Toolbar and other non-reading UI.
    Chrome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub modifier: bool,
    pub focus: Focus,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifier: false,
            focus: Focus::ReadingSurface,
        }
    }

    pub fn with_modifier(mut self) -> Self {
        self.modifier = true;
        self
    }

    pub fn in_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }
}

/// Navigation command bound to `input`, if any.
///
/// Bindings belong to the reading surface; nothing fires under any other
/// focus or with a modifier held.
pub fn nav_binding(input: &KeyInput) -> Option<NavCommand> {
    if input.focus != Focus::ReadingSurface || input.modifier {
        return None;
    }
    match input.key {
        Key::Left | Key::Up | Key::PageUp => Some(NavCommand::Previous),
        Key::Right | Key::Down | Key::PageDown => Some(NavCommand::Next),
        Key::Home => Some(NavCommand::First),
        Key::End => Some(NavCommand::Last),
        Key::Escape | Key::Char(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_bounded_navigation() {
        let mut cursor = PageCursor::new(3);
        assert_eq!(cursor.index(), 0);
        assert!(!cursor.previous());
        assert!(cursor.next());
        assert!(cursor.next());
        assert!(!cursor.next());
        assert_eq!(cursor.index(), 2);
        assert!(cursor.is_last());
        assert!(cursor.first());
        assert_eq!(cursor.index(), 0);
        assert!(cursor.last());
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_empty_cursor_never_moves() {
        let mut cursor = PageCursor::new(0);
        assert!(cursor.is_empty());
        assert!(!cursor.next());
        assert!(!cursor.last());
        assert!(!cursor.go_to(0));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_key_bindings() {
        let bind = |key| nav_binding(&KeyInput::new(key));
        assert_eq!(bind(Key::Left), Some(NavCommand::Previous));
        assert_eq!(bind(Key::Up), Some(NavCommand::Previous));
        assert_eq!(bind(Key::Right), Some(NavCommand::Next));
        assert_eq!(bind(Key::Down), Some(NavCommand::Next));
        assert_eq!(bind(Key::PageDown), Some(NavCommand::Next));
        assert_eq!(bind(Key::Home), Some(NavCommand::First));
        assert_eq!(bind(Key::End), Some(NavCommand::Last));
        assert_eq!(bind(Key::Escape), None);
        assert_eq!(bind(Key::Char('a')), None);
    }

    #[test]
    fn test_navigation_only_on_reading_surface() {
        let input = KeyInput::new(Key::Right).in_focus(Focus::TextInput);
        assert_eq!(nav_binding(&input), None);
        let chrome = KeyInput::new(Key::Right).in_focus(Focus::Chrome);
        assert_eq!(nav_binding(&chrome), None);
        let surface = KeyInput::new(Key::Right).in_focus(Focus::ReadingSurface);
        assert_eq!(nav_binding(&surface), Some(NavCommand::Next));
        assert_eq!(nav_binding(&surface.with_modifier()), None);
    }

    proptest! {
        #[test]
        fn prop_out_of_range_go_to_is_noop(len in 0usize..50, start in 0usize..50, target in 0usize..200) {
            let mut cursor = PageCursor::new(len);
            cursor.go_to(start);
            let before = cursor.index();
            let moved = cursor.go_to(target);
            if target >= len {
                prop_assert!(!moved);
                prop_assert_eq!(cursor.index(), before);
            } else {
                prop_assert_eq!(cursor.index(), target);
            }
        }
    }
}
