/// Cursor position and selection state within a buffer.
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    /// Current line (0-indexed).
    pub row: usize,
    /// Current column (0-indexed, byte offset within line).
    pub col: usize,
    /// Desired column for vertical movement ("sticky" column).
    pub desired_col: usize,
    /// Fixed end of the active selection; the caret is the moving end.
    pub anchor: Option<Position>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl CursorState {
    pub fn position(&self) -> Position {
        Position {
            row: self.row,
            col: self.col,
        }
    }

    pub fn move_to(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
        self.desired_col = col;
    }

    pub fn start_selection(&mut self) {
        self.anchor = Some(self.position());
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Normalized half-open selection range, `None` when nothing is selected.
    pub fn selection(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?;
        let head = self.position();
        if anchor == head {
            return None;
        }
        Some((anchor.min(head), anchor.max(head)))
    }
}
