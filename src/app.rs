use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use regex::Regex;

use crate::command::{self, Command};
use crate::host::{DialogKey, DialogSession};
use crate::model::buffer::Buffer;
use crate::model::config::AppConfig;
use crate::model::cursor::Position;
use crate::model::mode::Mode;
use crate::model::vault::Vault;
use crate::msg::{Direction as MoveDir, Msg};
use crate::quick_link::picker::Commit;
use crate::quick_link::view::{render_quick_link, row_at};
use crate::quick_link::{PickerOptions, QuickLinkPicker, insert_alias_template};

#[derive(Default)]
struct RenderCache {
    top: usize,
    bottom: usize,
    lines: Vec<Line<'static>>,
    dirty: bool,
}

/// `[[target]]` or `[[target|alias]]`; captures target and alias.
static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|]+)(?:\|([^\[\]]*))?\]\]").expect("valid wikilink regex")
});

const TEXT_STYLE: Style = Style::new().fg(Color::Gray);
const LINK_PUNCT_STYLE: Style = Style::new().fg(Color::DarkGray);
const LINK_TARGET_STYLE: Style = Style::new()
    .fg(Color::Rgb(0, 255, 136))
    .add_modifier(Modifier::UNDERLINED);
const LINK_ALIAS_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::ITALIC);

const MAX_NOTIFICATIONS: usize = 8;

pub struct App {
    pub mode: Mode,
    pub buffer: Buffer,
    pub vault: Vault,
    pub config: AppConfig,
    pub should_quit: bool,
    pub event_tx: mpsc::Sender<Msg>,
    pub notifications: VecDeque<String>,
    command_input: String,
    command_return: Mode,
    picker: Option<QuickLinkPicker>,
    picker_list_area: Rect,
    help_open: bool,
    render_cache: RenderCache,
    quit_confirm_armed: bool,
    quit_confirm_until: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, event_tx: mpsc::Sender<Msg>, file: Option<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(config.vault_path())?;

        let path = file.unwrap_or_else(|| config.scratch_path());
        let mut buffer = if path.exists() {
            Buffer::from_file(path)?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut buf = Buffer::new();
            buf.path = Some(path);
            buf
        };
        buffer.viewport.scroll_off = config.editor.scroll_off;

        let vault = Vault::open(config.vault_path())?.with_hidden(config.quick_link.include_hidden);
        tracing::info!("vault at {}", vault.root().display());

        Ok(Self {
            mode: Mode::Normal,
            buffer,
            vault,
            config,
            should_quit: false,
            event_tx,
            notifications: VecDeque::new(),
            command_input: String::new(),
            command_return: Mode::Normal,
            picker: None,
            picker_list_area: Rect::default(),
            help_open: false,
            render_cache: RenderCache {
                dirty: true,
                ..Default::default()
            },
            quit_confirm_armed: false,
            quit_confirm_until: None,
        })
    }

    fn pending_write_count(&self) -> usize {
        usize::from(self.buffer.dirty || self.buffer.save_debounce.is_some())
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Mouse(mouse) => self.handle_mouse(mouse),
            Msg::RunCommand(command) => self.run_command(command)?,
            Msg::Tick => self.handle_tick(),
            Msg::Resize(_w, h) => {
                self.buffer.viewport.height = h.saturating_sub(1); // status bar
                self.mark_render_dirty();
            }
        }
        Ok(())
    }

    fn run_command(&mut self, command: Command) -> Result<()> {
        tracing::debug!("running command {command:?}");

        match command {
            Command::QuickLink => {
                let options = PickerOptions {
                    prefill_query: self.config.quick_link.prefill_query,
                };
                self.picker = Some(QuickLinkPicker::start(&self.vault, &self.buffer, options));
                self.mode = Mode::QuickLink;
                return Ok(());
            }
            Command::AliasTemplate => {
                insert_alias_template(&mut self.buffer);
                self.after_edit();
                self.mode = Mode::Insert;
            }
            Command::Save => self.save_buffer(),
            Command::Quit => self.request_quit(),
            Command::Help => self.help_open = true,
        }

        self.buffer.cursor.clear_selection();
        Ok(())
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Any key dismisses the help overlay.
        if self.help_open {
            self.help_open = false;
            self.mark_render_dirty();
            return Ok(());
        }

        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::Insert => self.handle_key_insert(key),
            Mode::Visual => self.handle_key_visual(key),
            Mode::Command => self.handle_key_command(key),
            Mode::QuickLink => self.handle_key_quick_link(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> Result<()> {
        if key.code != KeyCode::Char('q') {
            self.quit_confirm_armed = false;
            self.quit_confirm_until = None;
        }

        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.save_buffer();
            }
            KeyCode::Char('q') => self.request_quit(),
            KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('i') => self.mode = Mode::Insert,
            KeyCode::Char('v') => {
                self.buffer.cursor.start_selection();
                self.mode = Mode::Visual;
            }
            KeyCode::Char(':') => self.open_command_palette(),
            _ => self.handle_motion(key),
        }
        Ok(())
    }

    fn handle_key_visual(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.buffer.cursor.clear_selection();
                self.mode = Mode::Normal;
                self.mark_render_dirty();
            }
            KeyCode::Char(':') => self.open_command_palette(),
            _ => {
                self.handle_motion(key);
                self.mark_render_dirty();
            }
        }
        Ok(())
    }

    fn handle_motion(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_cursor(MoveDir::Left),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(MoveDir::Down),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(MoveDir::Up),
            KeyCode::Char('l') | KeyCode::Right => self.move_cursor(MoveDir::Right),
            KeyCode::Char('0') | KeyCode::Home => self.move_cursor(MoveDir::LineStart),
            KeyCode::Char('$') | KeyCode::End => self.move_cursor(MoveDir::LineEnd),
            KeyCode::Char('g') => self.jump_to(Position::new(0, 0)),
            KeyCode::Char('G') => {
                let last = self.buffer.line_count().saturating_sub(1);
                self.jump_to(Position::new(last, 0));
            }
            _ => {}
        }
    }

    fn jump_to(&mut self, position: Position) {
        self.buffer.set_cursor_position(position);
        self.buffer.scroll_to_cursor();
        self.mark_render_dirty();
    }

    fn request_quit(&mut self) {
        let pending = self.pending_write_count();
        if pending == 0 {
            self.should_quit = true;
        } else if self.quit_confirm_armed {
            self.should_quit = true;
            self.quit_confirm_armed = false;
            self.quit_confirm_until = None;
        } else {
            self.quit_confirm_armed = true;
            self.quit_confirm_until = Some(Instant::now() + Duration::from_secs(2));
        }
    }

    fn open_command_palette(&mut self) {
        self.command_return = self.mode;
        self.mode = Mode::Command;
        self.command_input.clear();
    }

    fn handle_key_command(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = self.command_return;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                let input = self.command_input.trim().to_string();
                self.mode = Mode::Normal;
                self.command_input.clear();

                if input.is_empty() {
                    self.buffer.cursor.clear_selection();
                } else if let Some(command) = command::resolve(&input) {
                    let _ = self.event_tx.send(Msg::RunCommand(command));
                } else {
                    self.buffer.cursor.clear_selection();
                    self.push_notification(format!("unknown command: {input}"));
                }
                self.mark_render_dirty();
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.command_input.push(ch);
            }
            _ => {}
        }

        Ok(())
    }

    fn handle_key_insert(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.buffer.insert_newline();
                self.after_edit();
            }
            KeyCode::Backspace => {
                self.buffer.delete_char_before();
                self.after_edit();
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.save_buffer();
            }
            KeyCode::Char(ch) => {
                self.buffer.insert_char(ch);
                self.after_edit();
            }
            KeyCode::Left => self.move_cursor(MoveDir::Left),
            KeyCode::Right => self.move_cursor(MoveDir::Right),
            KeyCode::Up => self.move_cursor(MoveDir::Up),
            KeyCode::Down => self.move_cursor(MoveDir::Down),
            _ => {}
        }
        Ok(())
    }

    fn handle_key_quick_link(&mut self, key: KeyEvent) -> Result<()> {
        let Some(picker) = self.picker.as_mut() else {
            self.mode = Mode::Normal;
            return Ok(());
        };

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let commit = match key.code {
            KeyCode::Esc => {
                picker.close();
                None
            }
            KeyCode::Enter => picker.on_key(DialogKey::Enter),
            KeyCode::Up => picker.on_key(DialogKey::Up),
            KeyCode::Down => picker.on_key(DialogKey::Down),
            KeyCode::Char('p') if ctrl => picker.on_key(DialogKey::Up),
            KeyCode::Char('n') if ctrl => picker.on_key(DialogKey::Down),
            KeyCode::Backspace => {
                let mut query = picker.query().to_string();
                if query.pop().is_some() {
                    picker.on_input(&query);
                }
                None
            }
            KeyCode::Char(ch) if !ctrl => {
                let mut query = picker.query().to_string();
                query.push(ch);
                picker.on_input(&query);
                None
            }
            _ => None,
        };

        self.settle_picker(commit);
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != Mode::QuickLink || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        let Some(row) = row_at(self.picker_list_area, mouse.column, mouse.row) else {
            return;
        };
        let commit = self.picker.as_mut().and_then(|picker| picker.click(row));
        self.settle_picker(commit);
    }

    /// Apply a commit, and drop the picker once it has finished.
    fn settle_picker(&mut self, commit: Option<Commit>) {
        if let Some(commit) = commit {
            commit.apply(&mut self.buffer);
            self.after_edit();
            tracing::debug!("linked {} at {:?}", commit.path.display(), commit.position);
            self.push_notification(format!("linked to {}", commit.title));
        }

        if self.picker.as_ref().is_some_and(|picker| !picker.is_open()) {
            self.picker = None;
            self.mode = Mode::Normal;
            self.buffer.cursor.clear_selection();
            self.mark_render_dirty();
        }
    }

    fn after_edit(&mut self) {
        self.buffer.clamp_cursor();
        self.buffer.scroll_to_cursor();
        self.mark_render_dirty();
        self.schedule_auto_save();
    }

    fn move_cursor(&mut self, dir: MoveDir) {
        let prev_top = self.buffer.viewport.top_line;
        let line = self
            .buffer
            .line_text(self.buffer.cursor.row)
            .unwrap_or_default();
        let last_row = self.buffer.line_count().saturating_sub(1);
        let cursor = &mut self.buffer.cursor;

        match dir {
            MoveDir::Up => {
                if cursor.row > 0 {
                    cursor.row -= 1;
                    cursor.col = cursor.desired_col;
                }
            }
            MoveDir::Down => {
                if cursor.row < last_row {
                    cursor.row += 1;
                    cursor.col = cursor.desired_col;
                }
            }
            MoveDir::Left => {
                if let Some(ch) = line.get(..cursor.col).and_then(|s| s.chars().next_back()) {
                    cursor.col -= ch.len_utf8();
                    cursor.desired_col = cursor.col;
                }
            }
            MoveDir::Right => {
                if let Some(ch) = line.get(cursor.col..).and_then(|s| s.chars().next()) {
                    cursor.col += ch.len_utf8();
                    cursor.desired_col = cursor.col;
                }
            }
            MoveDir::LineStart => {
                cursor.col = 0;
                cursor.desired_col = 0;
            }
            MoveDir::LineEnd => {
                cursor.col = line.len();
                cursor.desired_col = line.len();
            }
        }
        self.buffer.clamp_cursor();
        self.buffer.scroll_to_cursor();
        if self.buffer.viewport.top_line != prev_top {
            self.mark_render_dirty();
        }
    }

    fn schedule_auto_save(&mut self) {
        let debounce_ms = self.config.general.auto_save_debounce_ms;
        self.buffer.save_debounce = Some(Instant::now() + Duration::from_millis(debounce_ms));
    }

    fn handle_tick(&mut self) {
        let now = Instant::now();

        if self.quit_confirm_until.is_some_and(|until| now >= until) {
            self.quit_confirm_armed = false;
            self.quit_confirm_until = None;
        }

        if self.buffer.save_debounce.is_some_and(|deadline| now >= deadline) {
            self.save_buffer();
        }
    }

    fn save_buffer(&mut self) {
        let Some(path) = self.buffer.path.clone() else {
            return;
        };

        self.buffer.save_debounce = None;
        self.buffer.dirty = false;

        let rope = self.buffer.rope.clone();
        spawn_buffer_save(path, rope);
    }

    /// Write pending changes before exit, on the calling thread.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending_write_count() == 0 {
            return Ok(());
        }
        let Some(path) = self.buffer.path.clone() else {
            return Ok(());
        };

        write_rope(&path, &self.buffer.rope)?;
        self.buffer.save_debounce = None;
        self.buffer.dirty = false;
        tracing::info!("flushed {}", path.display());
        Ok(())
    }

    fn mark_render_dirty(&mut self) {
        self.render_cache.dirty = true;
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // body
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        let editor_area = chunks[0];
        self.render_editor(frame, editor_area);
        self.render_selection(frame, editor_area);

        let cursor_x = self.cursor_screen_col(self.buffer.cursor.row, self.buffer.cursor.col)
            + editor_area.x;
        let cursor_y = (self.buffer.cursor.row.saturating_sub(self.buffer.viewport.top_line))
            as u16
            + editor_area.y;
        if cursor_y < editor_area.y + editor_area.height {
            frame.set_cursor_position((cursor_x, cursor_y));
        }

        self.render_status_bar(frame, chunks[1]);

        if self.mode == Mode::Command {
            self.render_command_overlay(frame);
        } else if let Some(picker) = &self.picker {
            self.picker_list_area = render_quick_link(frame, &picker.render());
        }

        if self.help_open {
            render_help_overlay(frame);
        }
    }

    fn cursor_screen_col(&self, row: usize, col: usize) -> u16 {
        self.buffer
            .line_text(row)
            .and_then(|line| line.get(..col).map(|s| s.chars().count()))
            .unwrap_or(col) as u16
    }

    fn render_editor(&mut self, frame: &mut Frame, area: Rect) {
        let top = self.buffer.viewport.top_line;
        let bottom = (top + area.height as usize).min(self.buffer.line_count());

        let needs_rebuild = self.render_cache.dirty
            || self.render_cache.top != top
            || self.render_cache.bottom != bottom;

        if needs_rebuild {
            self.render_cache.lines = (top..bottom)
                .map(|i| {
                    let text = self.buffer.line_text(i).unwrap_or_default();
                    render_note_line(&text)
                })
                .collect();
            self.render_cache.top = top;
            self.render_cache.bottom = bottom;
            self.render_cache.dirty = false;
        }

        let editor = Paragraph::new(self.render_cache.lines.clone());
        frame.render_widget(editor, area);
    }

    fn render_selection(&self, frame: &mut Frame, area: Rect) {
        let Some((start, end)) = self.buffer.cursor.selection() else {
            return;
        };

        let top = self.buffer.viewport.top_line;
        let style = Style::default().add_modifier(Modifier::REVERSED);

        for row in start.row.max(top)..=end.row {
            let offset = row - top;
            if offset >= area.height as usize {
                break;
            }
            let y = offset as u16;
            let line_len = self.buffer.line_text(row).map(|l| l.len()).unwrap_or(0);
            let from = if row == start.row { start.col } else { 0 };
            // Selected line breaks show as one trailing cell.
            let to = if row == end.row { end.col } else { line_len + 1 };

            let x0 = self.cursor_screen_col(row, from);
            let x1 = self.cursor_screen_col(row, to.min(line_len)) + u16::from(to > line_len);
            let width = x1.saturating_sub(x0).min(area.width.saturating_sub(x0));
            if width == 0 {
                continue;
            }

            frame.buffer_mut().set_style(
                Rect::new(area.x + x0, area.y + y, width, 1),
                style,
            );
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::Insert => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let file_name = self
            .buffer
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[scratch]".to_string());

        let dirty_marker = if self.buffer.dirty { " [+]" } else { "" };

        let mut suffix = match self.mode {
            Mode::Command => format!(" | :{}", self.command_input),
            Mode::Visual => {
                let selected = self.buffer.selected_text().chars().count();
                format!(" | {selected} selected")
            }
            Mode::QuickLink => self.picker.as_ref().map_or_else(String::new, |picker| {
                let row = picker.selection().index().map_or(0, |idx| idx + 1);
                let mut info = format!(
                    " | {row}/{} of {} notes",
                    picker.results().len(),
                    picker.candidates().len()
                );
                let alias = &picker.pending().selected_text;
                if !alias.is_empty() {
                    info.push_str(&format!(" | alias: {alias}"));
                }
                info
            }),
            _ => String::new(),
        };

        if self.quit_confirm_armed {
            let pending = self.pending_write_count();
            suffix.push_str(&format!(" | {pending} pending, press q again to save+quit"));
        } else if let Some(note) = self.notifications.back() {
            suffix.push_str(&format!(" | {note}"));
        }

        let info = Span::styled(
            format!(
                " {file_name}{dirty_marker}  {}:{}{} ",
                self.buffer.cursor.row + 1,
                self.buffer.cursor.col + 1,
                suffix
            ),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }

    fn render_command_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(format!(":{}", self.command_input)).block(
            Block::default()
                .title(" Command ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 2 + self.command_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn render_help_overlay(frame: &mut Frame) {
    let lines: Vec<Line> = command::help_lines().into_iter().map(Line::from).collect();
    let height = (lines.len() as u16 + 2).min(frame.area().height);
    let width = frame.area().width.saturating_sub(4).min(100);
    let area = Rect {
        x: frame.area().x + (frame.area().width - width) / 2,
        y: frame.area().y + (frame.area().height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, area);

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help (any key closes) ")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Rgb(15, 15, 24)).fg(Color::Gray)),
    );
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn write_rope(path: &Path, rope: &ropey::Rope) -> Result<()> {
    use std::io::Write;

    let tmp = path.with_extension("tmp");
    let file = std::fs::File::create(&tmp)?;
    let mut writer = std::io::BufWriter::new(file);
    for chunk in rope.chunks() {
        writer.write_all(chunk.as_bytes())?;
    }
    writer.flush()?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn spawn_buffer_save(path: PathBuf, rope: ropey::Rope) {
    std::thread::spawn(move || {
        match write_rope(&path, &rope) {
            Ok(()) => tracing::debug!("saved {}", path.display()),
            Err(e) => tracing::error!("save failed for {}: {e}", path.display()),
        }
    });
}

/// Plain text with every wikilink split into punctuation, target and alias.
fn render_note_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut last = 0;

    for caps in WIKILINK_RE.captures_iter(text) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::styled(text[last..whole.start()].to_string(), TEXT_STYLE));
        }

        spans.push(Span::styled("[[", LINK_PUNCT_STYLE));
        spans.push(Span::styled(target.as_str().to_string(), LINK_TARGET_STYLE));
        if let Some(alias) = caps.get(2) {
            spans.push(Span::styled("|", LINK_PUNCT_STYLE));
            spans.push(Span::styled(alias.as_str().to_string(), LINK_ALIAS_STYLE));
        }
        spans.push(Span::styled("]]", LINK_PUNCT_STYLE));
        last = whole.end();
    }

    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), TEXT_STYLE));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{EditorConfig, GeneralConfig, QuickLinkConfig};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    struct Harness {
        app: App,
        rx: mpsc::Receiver<Msg>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(notes: &[&str], scratch: &str, prefill_query: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let vault = dir.path().join("vault");
            std::fs::create_dir_all(&vault).unwrap();
            for note in notes {
                std::fs::write(vault.join(format!("{note}.md")), "").unwrap();
            }
            std::fs::write(vault.join("scratch.md"), scratch).unwrap();

            let config = config_for(&vault, prefill_query);
            let (tx, rx) = mpsc::channel();
            let app = App::new(config, tx, None).unwrap();
            Self { app, rx, _dir: dir }
        }

        fn press(&mut self, code: KeyCode) {
            self.key(KeyEvent::new(code, KeyModifiers::NONE));
        }

        fn key(&mut self, key: KeyEvent) {
            self.app.update(Msg::Key(key)).unwrap();
            self.pump();
        }

        fn type_str(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn command(&mut self, name: &str) {
            self.press(KeyCode::Char(':'));
            self.type_str(name);
            self.press(KeyCode::Enter);
        }

        fn pump(&mut self) {
            while let Ok(msg) = self.rx.try_recv() {
                self.app.update(msg).unwrap();
            }
        }

        fn text(&self) -> String {
            self.app.buffer.rope.to_string()
        }

        fn draw(&mut self) -> ratatui::buffer::Buffer {
            let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
            terminal.draw(|frame| self.app.view(frame)).unwrap();
            terminal.backend().buffer().clone()
        }
    }

    fn highlighted(h: &Harness) -> Option<&str> {
        h.app
            .picker
            .as_ref()
            .and_then(|picker| picker.highlighted())
            .map(|note| note.title.as_str())
    }

    fn config_for(vault: &Path, prefill_query: bool) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                vault_path: vault.to_string_lossy().to_string(),
                scratch_file: "scratch.md".into(),
                auto_save_debounce_ms: 60_000,
            },
            editor: EditorConfig { scroll_off: 2 },
            quick_link: QuickLinkConfig {
                prefill_query,
                include_hidden: false,
            },
        }
    }

    #[test]
    fn selected_alias_links_to_chosen_note() {
        let mut h = Harness::new(&["Target Note", "Other"], "my alias\n", true);

        h.press(KeyCode::Char('v'));
        h.type_str("$");
        h.command("ql");

        assert_eq!(h.app.mode, Mode::QuickLink);
        let picker = h.app.picker.as_ref().unwrap();
        assert_eq!(picker.query(), "my alias");
        assert!(picker.visible_results().is_empty());

        for _ in 0.."my alias".len() {
            h.press(KeyCode::Backspace);
        }
        h.type_str("target");
        h.press(KeyCode::Enter);

        assert_eq!(h.text(), "my alias[[Target Note|my alias]]\n");
        assert_eq!(h.app.mode, Mode::Normal);
        assert!(h.app.picker.is_none());
        assert!(h.app.buffer.cursor.selection().is_none());
        assert!(h.app.buffer.dirty);
    }

    #[test]
    fn plain_link_goes_to_the_caret_captured_at_open() {
        let mut h = Harness::new(&["Apple Pie", "banana", "Applesauce"], "ab", false);
        h.app.buffer.set_cursor_position(Position::new(0, 1));

        h.command("Quick Link: insert an internal link");
        h.type_str("app");
        h.press(KeyCode::Down);
        h.press(KeyCode::Enter);

        assert_eq!(h.text(), "a[[Applesauce]]b");
    }

    #[test]
    fn escape_cancels_without_editing() {
        let mut h = Harness::new(&["Target Note"], "keep", true);

        h.command("use-selected-word-as-alias");
        h.press(KeyCode::Esc);

        assert_eq!(h.text(), "keep");
        assert_eq!(h.app.mode, Mode::Normal);
        assert!(h.app.picker.is_none());
        assert!(!h.app.buffer.dirty);
    }

    #[test]
    fn enter_without_matches_keeps_picker_open() {
        let mut h = Harness::new(&[], "keep", true);
        h.command("ql");
        h.type_str("zzz");
        h.press(KeyCode::Enter);

        assert_eq!(h.text(), "keep");
        assert_eq!(h.app.mode, Mode::QuickLink);
    }

    #[test]
    fn ctrl_keys_navigate_with_wraparound() {
        let mut h = Harness::new(&["n1", "n2", "n3"], "", false);
        h.command("ql");
        h.type_str("n");

        h.key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL));
        assert_eq!(highlighted(&h), Some("n3"));

        h.key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        assert_eq!(highlighted(&h), Some("n1"));
    }

    #[test]
    fn clicking_a_row_commits_it() {
        let mut h = Harness::new(&["n1", "n2", "n3"], "", false);
        h.command("ql");
        h.type_str("n");
        h.draw();

        let area = h.app.picker_list_area;
        h.app
            .update(Msg::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: area.x,
                row: area.y + 1,
                modifiers: KeyModifiers::NONE,
            }))
            .unwrap();

        assert_eq!(h.text(), "[[n2]]");
        assert_eq!(h.app.mode, Mode::Normal);
    }

    #[test]
    fn alias_template_without_selection_parks_caret_inside() {
        let mut h = Harness::new(&[], "", true);

        h.command("insert-alias-template");

        assert_eq!(h.text(), "[[]]");
        assert_eq!(h.app.buffer.cursor_position(), Position::new(0, 2));
        assert_eq!(h.app.mode, Mode::Insert);

        h.type_str("Note");
        assert_eq!(h.text(), "[[Note]]");
    }

    #[test]
    fn alias_template_wraps_selection() {
        let mut h = Harness::new(&[], "see this", true);
        h.app.buffer.set_cursor_position(Position::new(0, 4));

        h.press(KeyCode::Char('v'));
        h.press(KeyCode::Char('$'));
        h.command("insert-alias-template");

        assert_eq!(h.text(), "see [[|this]]");
        assert_eq!(h.app.buffer.cursor_position(), Position::new(0, 6));
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut h = Harness::new(&[], "", true);

        h.command("frobnicate");

        assert_eq!(h.app.mode, Mode::Normal);
        assert_eq!(
            h.app.notifications.back().map(String::as_str),
            Some("unknown command: frobnicate")
        );
    }

    #[test]
    fn escape_from_palette_returns_to_visual() {
        let mut h = Harness::new(&[], "text", true);

        h.press(KeyCode::Char('v'));
        h.press(KeyCode::Char('l'));
        h.press(KeyCode::Char(':'));
        h.press(KeyCode::Esc);

        assert_eq!(h.app.mode, Mode::Visual);
        assert_eq!(h.app.buffer.selected_text(), "t");
    }

    #[test]
    fn quit_flushes_pending_edits() {
        let mut h = Harness::new(&[], "", true);
        h.press(KeyCode::Char('i'));
        h.type_str("hi");
        h.press(KeyCode::Esc);

        h.press(KeyCode::Char('q'));
        assert!(!h.app.should_quit);
        h.press(KeyCode::Char('q'));
        assert!(h.app.should_quit);

        h.app.flush().unwrap();
        let path = h.app.buffer.path.clone().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hi");
        assert!(!h.app.buffer.dirty);
    }

    #[test]
    fn g_and_shift_g_jump_between_first_and_last_line() {
        let mut h = Harness::new(&[], "one\ntwo\nthree", true);

        h.press(KeyCode::Char('l'));
        h.press(KeyCode::Char('G'));
        assert_eq!(h.app.buffer.cursor_position(), Position::new(2, 0));

        h.press(KeyCode::Char('g'));
        assert_eq!(h.app.buffer.cursor_position(), Position::new(0, 0));
    }

    #[test]
    fn view_draws_the_picker_overlay() {
        let mut h = Harness::new(&["Target Note"], "", false);
        h.command("ql");

        h.draw();

        assert!(h.app.picker_list_area.height > 0);
    }

    #[test]
    fn backspace_on_empty_query_keeps_highlight() {
        let mut h = Harness::new(&["n1", "n2", "n3"], "", false);
        h.command("ql");
        h.press(KeyCode::Down);
        assert_eq!(highlighted(&h), Some("n2"));

        h.press(KeyCode::Backspace);

        assert_eq!(highlighted(&h), Some("n2"));
        assert_eq!(h.app.picker.as_ref().unwrap().query(), "");
    }

    #[test]
    fn help_overlay_lists_every_command_until_a_key() {
        let mut h = Harness::new(&[], "", true);
        h.command("help");

        let screen = row_strings(&h.draw());
        for def in command::COMMANDS {
            assert!(
                screen.iter().any(|row| row.contains(def.id)),
                "{} missing from help",
                def.id
            );
        }

        h.press(KeyCode::Char('j'));
        assert!(!h.app.help_open);
        assert_eq!(h.app.mode, Mode::Normal);
        assert!(!row_strings(&h.draw()).iter().any(|row| row.contains("insert-alias-template")));
    }

    #[test]
    fn committed_link_is_drawn_highlighted() {
        let mut h = Harness::new(&["Target"], "", false);
        h.command("ql");
        h.type_str("tar");
        h.press(KeyCode::Enter);
        assert_eq!(h.text(), "[[Target]]");

        let screen = h.draw();

        assert_eq!(screen[(0, 0)].fg, LINK_PUNCT_STYLE.fg.unwrap());
        assert_eq!(screen[(2, 0)].symbol(), "T");
        assert_eq!(screen[(2, 0)].fg, Color::Rgb(0, 255, 136));
        assert!(screen[(2, 0)].modifier.contains(Modifier::UNDERLINED));
    }

    fn row_strings(screen: &ratatui::buffer::Buffer) -> Vec<String> {
        let area = screen.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| screen[(x, y)].symbol())
                    .collect()
            })
            .collect()
    }

    fn contents(line: &Line) -> Vec<String> {
        line.spans.iter().map(|span| span.content.to_string()).collect()
    }

    #[test]
    fn plain_lines_are_one_span() {
        let line = render_note_line("just text [not a link]");

        assert_eq!(contents(&line), vec!["just text [not a link]"]);
        assert_eq!(line.spans[0].style, TEXT_STYLE);
    }

    #[test]
    fn aliased_link_splits_target_and_alias() {
        let line = render_note_line("see [[Note|my alias]] now");

        assert_eq!(
            contents(&line),
            vec!["see ", "[[", "Note", "|", "my alias", "]]", " now"]
        );
        assert_eq!(line.spans[2].style, LINK_TARGET_STYLE);
        assert_eq!(line.spans[4].style, LINK_ALIAS_STYLE);
    }

    #[test]
    fn adjacent_links_and_unclosed_brackets() {
        let line = render_note_line("[[a]][[b]] [[open");

        assert_eq!(
            contents(&line),
            vec!["[[", "a", "]]", "[[", "b", "]]", " [[open"]
        );
        assert_eq!(contents(&render_note_line("")), vec![""]);
    }
}
