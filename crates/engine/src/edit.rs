//! In-cell edit buffer.

use gridbase_core::GridCell;

/// UTF-8 text with a caret measured in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
}

impl EditBuffer {
    /// Buffer holding `text` with the caret at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, s: &str) {
        let at = self.byte_offset(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the char before the caret.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
    }

    /// Delete the char under the caret.
    pub fn delete(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }
}

/// The single cell being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub cell: GridCell,
    pub buffer: EditBuffer,
    /// Displayed value when the edit started.
    pub original: Option<String>,
    /// Queued write that starting the edit cancelled. Re-queued if the edit
    /// ends without writing.
    pub superseded: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_caret() {
        let mut buf = EditBuffer::new("ac");
        buf.left();
        buf.insert("b");
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut buf = EditBuffer::new("héllo");
        buf.home();
        buf.right();
        buf.delete();
        assert_eq!(buf.text(), "hllo");
        buf.end();
        buf.backspace();
        assert_eq!(buf.text(), "hll");
        buf.insert("ø");
        assert_eq!(buf.text(), "hllø");
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_edges_are_noops() {
        let mut buf = EditBuffer::new("x");
        buf.delete();
        assert_eq!(buf.text(), "x");
        buf.home();
        buf.backspace();
        buf.left();
        assert_eq!(buf.text(), "x");
        assert_eq!(buf.cursor(), 0);
        buf.end();
        buf.right();
        assert_eq!(buf.cursor(), 1);
    }
}
