use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position as ScreenPosition, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::filter::MAX_VISIBLE_RESULTS;
use super::picker::PickerView;

/// Draw the picker overlay and return the area holding the result rows.
pub fn render_quick_link(frame: &mut Frame, view: &PickerView) -> Rect {
    let area = overlay_rect(frame.area());
    frame.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(MAX_VISIBLE_RESULTS as u16),
            Constraint::Length(1),
        ])
        .split(area);

    let input_text = if view.query.is_empty() {
        Span::styled(view.placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(view.query.clone(), Style::default().fg(Color::Gray))
    };
    let input = Paragraph::new(Line::from(input_text)).block(
        Block::default()
            .title(format!(" {} ", view.title))
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Rgb(15, 15, 24))),
    );
    frame.render_widget(input, chunks[0]);

    let rows: Vec<Line> = match view.empty_message {
        Some(message) => vec![Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        ))],
        None => view
            .rows
            .iter()
            .map(|row| {
                if row.highlighted {
                    Line::from(Span::styled(
                        format!("> {}", row.title),
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {}", row.title),
                        Style::default().fg(Color::Gray),
                    ))
                }
            })
            .collect(),
    };

    let list = Paragraph::new(rows).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .style(Style::default().bg(Color::Rgb(10, 10, 18))),
    );
    frame.render_widget(list, chunks[1]);

    let footer = Paragraph::new(" Enter: link  Esc: close  ↑/↓: move ").style(
        Style::default()
            .bg(Color::Rgb(15, 15, 24))
            .fg(Color::DarkGray),
    );
    frame.render_widget(footer, chunks[2]);

    let cursor_x = chunks[0].x + 1 + view.query.chars().count() as u16;
    frame.set_cursor_position((cursor_x, chunks[0].y + 1));

    // Row text starts inside the left border.
    Rect {
        x: chunks[1].x + 1,
        width: chunks[1].width.saturating_sub(2),
        ..chunks[1]
    }
}

/// Map a click to a row index inside `list_area`.
pub fn row_at(list_area: Rect, column: u16, row: u16) -> Option<usize> {
    if !list_area.contains(ScreenPosition::new(column, row)) {
        return None;
    }
    Some((row - list_area.y) as usize)
}

fn overlay_rect(r: Rect) -> Rect {
    let height = 3 + MAX_VISIBLE_RESULTS as u16 + 1;
    let width = (r.width * 3 / 5).max(30).min(r.width);

    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + r.height.saturating_sub(height) / 3,
        width,
        height: height.min(r.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quick_link::picker::{NO_RESULTS, PLACEHOLDER, PickerRow, TITLE};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn view(rows: &[(&str, bool)]) -> PickerView {
        PickerView {
            title: TITLE,
            query: String::new(),
            placeholder: PLACEHOLDER,
            rows: rows
                .iter()
                .map(|(title, highlighted)| PickerRow {
                    title: title.to_string(),
                    highlighted: *highlighted,
                })
                .collect(),
            empty_message: rows.is_empty().then_some(NO_RESULTS),
        }
    }

    fn draw(view: &PickerView) -> (String, Rect) {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut list_area = Rect::default();
        terminal
            .draw(|frame| list_area = render_quick_link(frame, view))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>() + "\n")
            .collect();
        (text, list_area)
    }

    #[test]
    fn empty_state_shows_placeholder_and_message() {
        let (text, _) = draw(&view(&[]));

        assert!(text.contains("Quick Link"));
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains(NO_RESULTS));
    }

    #[test]
    fn rows_map_back_to_clicks() {
        let (text, area) = draw(&view(&[("First", false), ("Second", true)]));

        assert!(text.contains("  First"));
        assert!(text.contains("> Second"));
        assert_eq!(row_at(area, area.x, area.y + 1), Some(1));
        assert_eq!(row_at(area, area.x, area.y + area.height), None);
        assert_eq!(row_at(area, 0, area.y), None);
    }
}
