use std::path::PathBuf;

use crate::host::{DialogKey, DialogSession, EditorHost, NoteSource};
use crate::model::cursor::Position;
use crate::model::vault::NoteEntry;

use super::filter::{filter_candidates, visible};
use super::link::wikilink;
use super::selection::Selection;

pub const TITLE: &str = "Quick Link";
pub const PLACEHOLDER: &str = "Search for a note...";
pub const NO_RESULTS: &str = "No results found";

/// What to insert and where, captured when the picker opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsertion {
    pub selected_text: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy)]
pub struct PickerOptions {
    /// Seed the query with the selected text.
    pub prefill_query: bool,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            prefill_query: true,
        }
    }
}

/// A finished choice, ready to be spliced into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub title: String,
    pub path: PathBuf,
    pub position: Position,
    pub text: String,
}

impl Commit {
    pub fn apply(&self, host: &mut impl EditorHost) {
        host.replace_text_at(self.position, &self.text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRow {
    pub title: String,
    pub highlighted: bool,
}

/// Everything the overlay needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerView {
    pub title: &'static str,
    pub query: String,
    pub placeholder: &'static str,
    pub rows: Vec<PickerRow>,
    /// Set when there is nothing to show.
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Committed,
    Closed,
}

/// One-shot search-and-link session.
#[derive(Debug)]
pub struct QuickLinkPicker {
    candidates: Vec<NoteEntry>,
    pending: PendingInsertion,
    query: String,
    results: Vec<NoteEntry>,
    selection: Selection,
    phase: Phase,
}

impl QuickLinkPicker {
    /// Capture the insertion point and the candidate titles, then run the first filter.
    pub fn start(
        source: &impl NoteSource,
        host: &impl EditorHost,
        options: PickerOptions,
    ) -> Self {
        let pending = PendingInsertion {
            selected_text: host.selection(),
            position: host.cursor_position(),
        };

        let candidates = match source.list_markdown_titles() {
            Ok(notes) => notes,
            Err(err) => {
                tracing::warn!("quick link: listing notes failed: {err}");
                Vec::new()
            }
        };

        Self::new(candidates, pending, options)
    }

    pub fn new(
        candidates: Vec<NoteEntry>,
        pending: PendingInsertion,
        options: PickerOptions,
    ) -> Self {
        let query = if options.prefill_query {
            pending.selected_text.clone()
        } else {
            String::new()
        };

        let mut picker = Self {
            candidates,
            pending,
            query,
            results: Vec::new(),
            selection: Selection::Empty,
            phase: Phase::Open,
        };
        picker.refresh();

        tracing::debug!(
            "quick link opened with {} candidates at {:?}",
            picker.candidates.len(),
            picker.pending.position
        );
        picker
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pending(&self) -> &PendingInsertion {
        &self.pending
    }

    pub fn candidates(&self) -> &[NoteEntry] {
        &self.candidates
    }

    /// Full filtered result set, including rows past the visible cap.
    pub fn results(&self) -> &[NoteEntry] {
        &self.results
    }

    pub fn visible_results(&self) -> &[NoteEntry] {
        visible(&self.results)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn highlighted(&self) -> Option<&NoteEntry> {
        self.selection
            .index()
            .and_then(|idx| self.visible_results().get(idx))
    }

    /// Commit the row under a click. Rows past the visible ones are ignored.
    pub fn click(&mut self, row: usize) -> Option<Commit> {
        if !self.is_open() {
            return None;
        }

        let selection = self.selection.select(row);
        if selection.index() != Some(row) {
            return None;
        }
        self.selection = selection;
        self.commit()
    }

    fn refresh(&mut self) {
        self.results = filter_candidates(&self.candidates, &self.query);
        self.selection = Selection::for_rows(self.visible_results().len());
    }

    fn commit(&mut self) -> Option<Commit> {
        let note = self.highlighted()?.clone();
        let text = wikilink(&note.title, &self.pending.selected_text);
        self.phase = Phase::Committed;

        tracing::info!("quick link committed {text} -> {}", note.path.display());
        Some(Commit {
            title: note.title,
            path: note.path,
            position: self.pending.position,
            text,
        })
    }
}

impl DialogSession for QuickLinkPicker {
    type View = PickerView;
    type Outcome = Commit;

    fn render(&self) -> PickerView {
        let highlighted = self.selection.index();
        let rows: Vec<PickerRow> = self
            .visible_results()
            .iter()
            .enumerate()
            .map(|(idx, note)| PickerRow {
                title: note.title.clone(),
                highlighted: Some(idx) == highlighted,
            })
            .collect();

        PickerView {
            title: TITLE,
            query: self.query.clone(),
            placeholder: PLACEHOLDER,
            empty_message: rows.is_empty().then_some(NO_RESULTS),
            rows,
        }
    }

    fn on_input(&mut self, value: &str) {
        if !self.is_open() {
            return;
        }
        self.query = value.to_string();
        self.refresh();
    }

    fn on_key(&mut self, key: DialogKey) -> Option<Commit> {
        if !self.is_open() {
            return None;
        }

        match key {
            DialogKey::Down => {
                self.selection = self.selection.next();
                None
            }
            DialogKey::Up => {
                self.selection = self.selection.prev();
                None
            }
            DialogKey::Enter => self.commit(),
        }
    }

    fn close(&mut self) {
        if self.phase == Phase::Open {
            tracing::debug!("quick link cancelled");
            self.phase = Phase::Closed;
        }
    }

    fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }
}
