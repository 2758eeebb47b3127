//! Capabilities the Quick Link extension needs from its surroundings.
//!
//! The editor, the vault and the overlay chrome are all host concerns; the
//! extension only talks to them through these traits.

use crate::error::VaultError;
use crate::model::cursor::Position;
use crate::model::vault::NoteEntry;

/// Document access for the active editor.
pub trait EditorHost {
    /// Text of the active selection, empty when there is none.
    fn selection(&self) -> String;
    fn cursor_position(&self) -> Position;
    /// Pure insertion at `position`.
    fn replace_text_at(&mut self, position: Position, text: &str);
    fn replace_selection(&mut self, text: &str);
    /// Move the caret backward by `chars` characters.
    ///
    /// Stands in for setting an absolute cursor position: the alias template
    /// only ever needs to step back from the end of what it just inserted.
    fn move_cursor_back(&mut self, chars: usize);
}

/// Enumerates the notes that can be linked to.
pub trait NoteSource {
    fn list_markdown_titles(&self) -> Result<Vec<NoteEntry>, VaultError>;
}

/// Keys a dialog reacts to. Escape is wired by the host through `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKey {
    Up,
    Down,
    Enter,
}

/// A modal session driven by the host's input loop.
pub trait DialogSession {
    type View;
    type Outcome;

    fn render(&self) -> Self::View;
    /// The input field changed; `value` is its full new contents.
    fn on_input(&mut self, value: &str);
    fn on_key(&mut self, key: DialogKey) -> Option<Self::Outcome>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}
