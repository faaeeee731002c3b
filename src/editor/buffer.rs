//! The editing surface seam.
//!
//! The engine talks to the host editor only through [`TextBuffer`];
//! [`MemBuffer`] is the char-indexed in-memory implementation used by
//! the REPL and by tests. All positions are char indices.

use crate::command::EditorAction;

pub const KEYCODE_DPAD_UP: u32 = 19;
pub const KEYCODE_DPAD_DOWN: u32 = 20;
pub const KEYCODE_DPAD_LEFT: u32 = 21;
pub const KEYCODE_DPAD_RIGHT: u32 = 22;
pub const KEYCODE_TAB: u32 = 61;
pub const KEYCODE_SPACE: u32 = 62;
pub const KEYCODE_ENTER: u32 = 66;
pub const KEYCODE_DEL: u32 = 67;
pub const KEYCODE_FORWARD_DEL: u32 = 112;

/// Symbolic key names accepted by `keyCodeStr`.
pub fn key_code_from_str(name: &str) -> Option<u32> {
    let code = match name {
        "DPAD_UP" => KEYCODE_DPAD_UP,
        "DPAD_DOWN" => KEYCODE_DPAD_DOWN,
        "DPAD_LEFT" => KEYCODE_DPAD_LEFT,
        "DPAD_RIGHT" => KEYCODE_DPAD_RIGHT,
        "TAB" => KEYCODE_TAB,
        "SPACE" => KEYCODE_SPACE,
        "ENTER" => KEYCODE_ENTER,
        "DEL" => KEYCODE_DEL,
        "FORWARD_DEL" => KEYCODE_FORWARD_DEL,
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    Cut,
    Copy,
    Paste,
    SelectAll,
}

/// Abstract editor surface. Every mutator reports success; a `false`
/// return must leave the buffer unchanged.
pub trait TextBuffer {
    fn text(&self) -> String;

    /// Current selection as (start, end), start <= end. A collapsed
    /// selection is the cursor.
    fn selection(&self) -> (usize, usize);

    /// Replaces the selection with `text`; the cursor ends up after
    /// the inserted text.
    fn commit_text(&mut self, text: &str) -> bool;

    /// Deletes up to `before` chars left of the selection and `after`
    /// chars right of it, clamped at the buffer edges.
    fn delete_surrounding(&mut self, before: usize, after: usize) -> bool;

    fn set_selection(&mut self, start: usize, end: usize) -> bool;

    fn context_menu_action(&mut self, action: ContextAction) -> bool;

    fn editor_action(&mut self, action: EditorAction) -> bool;

    fn send_key(&mut self, key: ArrowKey) -> bool;

    fn send_key_code(&mut self, code: u32) -> bool;

    fn begin_batch_edit(&mut self);

    fn end_batch_edit(&mut self);

    fn text_before_cursor(&self, n: usize) -> String {
        let (start, _) = self.selection();
        let text = self.text();
        let from = start.saturating_sub(n);
        text.chars().skip(from).take(start - from).collect()
    }

    fn text_after_cursor(&self, n: usize) -> String {
        let (_, end) = self.selection();
        self.text().chars().skip(end).take(n).collect()
    }

    fn selected_text(&self) -> String {
        let (start, end) = self.selection();
        self.text().chars().skip(start).take(end - start).collect()
    }

    fn len(&self) -> usize {
        self.text().chars().count()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory text buffer with a local clipboard.
#[derive(Debug, Default)]
pub struct MemBuffer {
    chars: Vec<char>,
    sel: (usize, usize),
    clipboard: String,
    batch_depth: u32,
    last_action: Option<EditorAction>,
}

impl MemBuffer {
    pub fn new() -> Self {
        MemBuffer::default()
    }

    pub fn with_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let end = chars.len();
        MemBuffer {
            chars,
            sel: (end, end),
            ..MemBuffer::default()
        }
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// The last editor action forwarded to the surface, for tests.
    pub fn last_editor_action(&self) -> Option<EditorAction> {
        self.last_action
    }

    pub fn batch_depth(&self) -> u32 {
        self.batch_depth
    }

    fn replace_selection(&mut self, text: &str) {
        let (start, end) = self.sel;
        let inserted: Vec<char> = text.chars().collect();
        let cursor = start + inserted.len();
        self.chars.splice(start..end, inserted);
        self.sel = (cursor, cursor);
    }

    /// Line/column movement for the up/down arrows.
    fn move_line(&mut self, delta: i32) -> bool {
        let cursor = if delta < 0 { self.sel.0 } else { self.sel.1 };
        let line_start = self.chars[..cursor]
            .iter()
            .rposition(|c| *c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = cursor - line_start;
        if delta < 0 {
            if line_start == 0 {
                return false;
            }
            let prev_start = self.chars[..line_start - 1]
                .iter()
                .rposition(|c| *c == '\n')
                .map(|i| i + 1)
                .unwrap_or(0);
            let prev_len = line_start - 1 - prev_start;
            let target = prev_start + column.min(prev_len);
            self.sel = (target, target);
        } else {
            let next_start = match self.chars[cursor..].iter().position(|c| *c == '\n') {
                Some(i) => cursor + i + 1,
                None => return false,
            };
            let next_len = self.chars[next_start..]
                .iter()
                .position(|c| *c == '\n')
                .unwrap_or(self.chars.len() - next_start);
            let target = next_start + column.min(next_len);
            self.sel = (target, target);
        }
        true
    }
}

impl TextBuffer for MemBuffer {
    fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn selection(&self) -> (usize, usize) {
        self.sel
    }

    fn commit_text(&mut self, text: &str) -> bool {
        self.replace_selection(text);
        true
    }

    fn delete_surrounding(&mut self, before: usize, after: usize) -> bool {
        let (start, end) = self.sel;
        let before = before.min(start);
        let after = after.min(self.chars.len() - end);
        self.chars.drain(end..end + after);
        self.chars.drain(start - before..start);
        self.sel = (start - before, end - before);
        true
    }

    fn set_selection(&mut self, start: usize, end: usize) -> bool {
        if start > end || end > self.chars.len() {
            return false;
        }
        self.sel = (start, end);
        true
    }

    fn context_menu_action(&mut self, action: ContextAction) -> bool {
        match action {
            ContextAction::Cut => {
                let selected = self.selected_text();
                if selected.is_empty() {
                    return false;
                }
                self.clipboard = selected;
                self.replace_selection("");
                true
            }
            ContextAction::Copy => {
                let selected = self.selected_text();
                if selected.is_empty() {
                    return false;
                }
                self.clipboard = selected;
                true
            }
            ContextAction::Paste => {
                let clip = self.clipboard.clone();
                self.replace_selection(&clip);
                true
            }
            ContextAction::SelectAll => {
                self.sel = (0, self.chars.len());
                true
            }
        }
    }

    fn editor_action(&mut self, action: EditorAction) -> bool {
        self.last_action = Some(action);
        true
    }

    fn send_key(&mut self, key: ArrowKey) -> bool {
        match key {
            ArrowKey::Left => {
                let (start, end) = self.sel;
                let target = if start == end {
                    match start.checked_sub(1) {
                        Some(t) => t,
                        None => return false,
                    }
                } else {
                    start
                };
                self.sel = (target, target);
                true
            }
            ArrowKey::Right => {
                let (start, end) = self.sel;
                let target = if start == end {
                    if end >= self.chars.len() {
                        return false;
                    }
                    end + 1
                } else {
                    end
                };
                self.sel = (target, target);
                true
            }
            ArrowKey::Up => self.move_line(-1),
            ArrowKey::Down => self.move_line(1),
        }
    }

    fn send_key_code(&mut self, code: u32) -> bool {
        match code {
            KEYCODE_DPAD_UP => self.send_key(ArrowKey::Up),
            KEYCODE_DPAD_DOWN => self.send_key(ArrowKey::Down),
            KEYCODE_DPAD_LEFT => self.send_key(ArrowKey::Left),
            KEYCODE_DPAD_RIGHT => self.send_key(ArrowKey::Right),
            KEYCODE_DEL => {
                let (start, end) = self.sel;
                if start != end {
                    self.replace_selection("");
                } else if start > 0 {
                    self.chars.remove(start - 1);
                    self.sel = (start - 1, start - 1);
                }
                true
            }
            KEYCODE_FORWARD_DEL => {
                let (start, end) = self.sel;
                if start != end {
                    self.replace_selection("");
                } else if end < self.chars.len() {
                    self.chars.remove(end);
                }
                true
            }
            KEYCODE_ENTER => self.commit_text("\n"),
            KEYCODE_SPACE => self.commit_text(" "),
            KEYCODE_TAB => self.commit_text("\t"),
            _ => false,
        }
    }

    fn begin_batch_edit(&mut self) {
        self.batch_depth += 1;
    }

    fn end_batch_edit(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_replaces_selection_cursor_after() {
        let mut buf = MemBuffer::with_text("hello world");
        assert!(buf.set_selection(0, 5));
        assert!(buf.commit_text("goodbye"));
        assert_eq!(buf.text(), "goodbye world");
        assert_eq!(buf.selection(), (7, 7));
    }

    #[test]
    fn test_delete_surrounding_clamps() {
        let mut buf = MemBuffer::with_text("abcdef");
        assert!(buf.set_selection(2, 4));
        assert!(buf.delete_surrounding(10, 10));
        assert_eq!(buf.text(), "cd");
        assert_eq!(buf.selection(), (0, 2));
    }

    #[test]
    fn test_set_selection_rejects_bad_ranges() {
        let mut buf = MemBuffer::with_text("abc");
        assert!(!buf.set_selection(2, 1));
        assert!(!buf.set_selection(0, 4));
        assert_eq!(buf.selection(), (3, 3));
    }

    #[test]
    fn test_context_text_windows() {
        let mut buf = MemBuffer::with_text("one two three");
        buf.set_selection(4, 7);
        assert_eq!(buf.text_before_cursor(2), "e ");
        assert_eq!(buf.text_before_cursor(100), "one ");
        assert_eq!(buf.text_after_cursor(3), " th");
        assert_eq!(buf.selected_text(), "two");
    }

    #[test]
    fn test_cut_copy_paste() {
        let mut buf = MemBuffer::with_text("one two");
        buf.set_selection(0, 3);
        assert!(buf.context_menu_action(ContextAction::Cut));
        assert_eq!(buf.text(), " two");
        assert_eq!(buf.clipboard(), "one");
        buf.set_selection(4, 4);
        assert!(buf.context_menu_action(ContextAction::Paste));
        assert_eq!(buf.text(), " twoone");
        // Copy with no selection fails.
        assert!(!buf.context_menu_action(ContextAction::Copy));
    }

    #[test]
    fn test_arrow_keys() {
        let mut buf = MemBuffer::with_text("ab\ncdef");
        // Cursor starts at the end (column 4); the first line clamps it.
        assert!(buf.send_key(ArrowKey::Up));
        assert_eq!(buf.selection(), (2, 2));
        assert!(buf.send_key(ArrowKey::Down));
        assert_eq!(buf.selection(), (5, 5));
        assert!(buf.send_key(ArrowKey::Left));
        assert_eq!(buf.selection(), (4, 4));
        assert!(buf.send_key(ArrowKey::Right));
        assert_eq!(buf.selection(), (5, 5));
        assert!(buf.send_key(ArrowKey::Up));
        assert_eq!(buf.selection(), (2, 2));
        // No line above the first.
        assert!(!buf.send_key(ArrowKey::Up));
    }

    #[test]
    fn test_backspace_key_code() {
        let mut buf = MemBuffer::with_text("abc");
        assert!(buf.send_key_code(KEYCODE_DEL));
        assert_eq!(buf.text(), "ab");
        assert!(buf.send_key_code(KEYCODE_ENTER));
        assert_eq!(buf.text(), "ab\n");
    }
}
