/// Application interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal mode: navigation and commands.
    #[default]
    Normal,
    /// Insert mode: text editing.
    Insert,
    /// Visual mode: selection grows from the anchor to the caret.
    Visual,
    /// Command palette (`:` prefix).
    Command,
    /// Quick Link picker overlay.
    QuickLink,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::Command => "COMMAND",
            Mode::QuickLink => "LINK",
        }
    }
}
