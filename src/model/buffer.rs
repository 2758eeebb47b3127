use ropey::Rope;
use std::path::PathBuf;
use std::time::Instant;

use super::cursor::{CursorState, Position};
use crate::host::EditorHost;

/// Viewport state for scroll tracking.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub top_line: usize,
    pub height: u16,
    pub scroll_off: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_line: 0,
            height: 24,
            scroll_off: 5,
        }
    }
}

/// A single text buffer backed by a Rope.
pub struct Buffer {
    pub rope: Rope,
    pub path: Option<PathBuf>,
    pub dirty: bool,
    pub cursor: CursorState,
    pub viewport: Viewport,
    pub save_debounce: Option<Instant>,
}

impl Buffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            dirty: false,
            cursor: CursorState::default(),
            viewport: Viewport::default(),
            save_debounce: None,
        }
    }

    /// Create a buffer from file contents.
    pub fn from_file(path: PathBuf) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path)?;
        Ok(Self {
            rope: Rope::from_str(&text),
            path: Some(path),
            ..Self::new()
        })
    }

    #[cfg(test)]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::new()
        }
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        let byte_idx = self.cursor_byte_offset();
        self.rope.insert_char(self.rope.byte_to_char(byte_idx), ch);
        self.cursor.col += ch.len_utf8();
        self.cursor.desired_col = self.cursor.col;
        self.dirty = true;
    }

    /// Insert a newline at the cursor position.
    pub fn insert_newline(&mut self) {
        let byte_idx = self.cursor_byte_offset();
        self.rope.insert_char(self.rope.byte_to_char(byte_idx), '\n');
        self.cursor.row += 1;
        self.cursor.col = 0;
        self.cursor.desired_col = 0;
        self.dirty = true;
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        let char_idx = self.position_to_char(self.cursor.position());
        if char_idx == 0 {
            return;
        }

        self.rope.remove(char_idx - 1..char_idx);
        self.set_caret_char(char_idx - 1);
        self.dirty = true;
    }

    /// Text covered by the active selection, empty when nothing is selected.
    pub fn selected_text(&self) -> String {
        let Some((start, end)) = self.cursor.selection() else {
            return String::new();
        };
        let start = self.position_to_char(start);
        let end = self.position_to_char(end);
        self.rope.slice(start..end).to_string()
    }

    pub fn cursor_position(&self) -> Position {
        self.cursor.position()
    }

    /// Insert `text` at `position` without touching any selection.
    ///
    /// Caret and anchor at or after the insertion point shift with the text.
    pub fn insert_text_at(&mut self, position: Position, text: &str) {
        let at = self.position_to_char(position);
        let inserted = text.chars().count();
        let caret = self.position_to_char(self.cursor.position());
        let anchor = self.cursor.anchor.map(|a| self.position_to_char(a));

        self.rope.insert(at, text);

        let shift = |idx: usize| if idx >= at { idx + inserted } else { idx };
        self.set_caret_char(shift(caret));
        self.cursor.anchor = anchor.map(|a| self.char_to_position(shift(a)));
        self.dirty = true;
    }

    /// Replace the selection (or insert at the caret) and leave the caret after `text`.
    pub fn replace_selection(&mut self, text: &str) {
        let at = match self.cursor.selection() {
            Some((start, end)) => {
                let start = self.position_to_char(start);
                let end = self.position_to_char(end);
                self.rope.remove(start..end);
                start
            }
            None => self.position_to_char(self.cursor.position()),
        };

        self.rope.insert(at, text);
        self.cursor.clear_selection();
        self.set_caret_char(at + text.chars().count());
        self.dirty = true;
    }

    pub fn set_cursor_position(&mut self, position: Position) {
        let clamped = self.clamp_position(position);
        self.cursor.move_to(clamped.row, clamped.col);
    }

    /// Move the caret backward by `count` characters, crossing line breaks.
    pub fn move_cursor_chars_back(&mut self, count: usize) {
        let caret = self.position_to_char(self.cursor.position());
        self.set_caret_char(caret.saturating_sub(count));
    }

    /// Compute the byte offset in the rope for the current cursor position.
    fn cursor_byte_offset(&self) -> usize {
        let line_start = self.rope.line_to_byte(self.cursor.row);
        line_start + self.cursor.col
    }

    fn position_to_char(&self, position: Position) -> usize {
        let position = self.clamp_position(position);
        let byte = self.rope.line_to_byte(position.row) + position.col;
        self.rope.byte_to_char(byte)
    }

    fn char_to_position(&self, char_idx: usize) -> Position {
        let char_idx = char_idx.min(self.rope.len_chars());
        let row = self.rope.char_to_line(char_idx);
        let col = self.rope.char_to_byte(char_idx) - self.rope.line_to_byte(row);
        Position::new(row, col)
    }

    fn set_caret_char(&mut self, char_idx: usize) {
        let position = self.char_to_position(char_idx);
        self.cursor.move_to(position.row, position.col);
    }

    fn clamp_position(&self, position: Position) -> Position {
        let row = position.row.min(self.rope.len_lines().saturating_sub(1));
        let line = self.line_text(row).unwrap_or_default();
        let mut col = position.col.min(line.len());
        while !line.is_char_boundary(col) {
            col -= 1;
        }
        Position::new(row, col)
    }

    /// Ensure the cursor stays within valid bounds.
    pub fn clamp_cursor(&mut self) {
        let clamped = self.clamp_position(self.cursor.position());
        self.cursor.row = clamped.row;
        self.cursor.col = clamped.col;
    }

    /// Ensure the viewport keeps the cursor visible.
    pub fn scroll_to_cursor(&mut self) {
        let off = self.viewport.scroll_off as usize;
        let height = self.viewport.height as usize;

        if self.cursor.row < self.viewport.top_line + off {
            self.viewport.top_line = self.cursor.row.saturating_sub(off);
        }
        if self.cursor.row + off >= self.viewport.top_line + height {
            self.viewport.top_line = (self.cursor.row + off + 1).saturating_sub(height);
        }
    }
}

impl EditorHost for Buffer {
    fn selection(&self) -> String {
        self.selected_text()
    }

    fn cursor_position(&self) -> Position {
        Buffer::cursor_position(self)
    }

    fn replace_text_at(&mut self, position: Position, text: &str) {
        self.insert_text_at(position, text);
    }

    fn replace_selection(&mut self, text: &str) {
        Buffer::replace_selection(self, text);
    }

    fn move_cursor_back(&mut self, chars: usize) {
        self.move_cursor_chars_back(chars);
    }
}
