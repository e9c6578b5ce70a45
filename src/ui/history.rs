use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use wordup::{history::overall_best, performance::ScoreBand};

use super::{help_line, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

const SHOWN_RESULTS: usize = 10;

pub(super) fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(SHOWN_RESULTS as u16 + 4),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    if app.history.is_empty() {
        Paragraph::new(Span::styled("No quizzes recorded yet", dim))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("History"))
            .render(chunks[0], buf);
    } else {
        let rows = app.history.iter().take(SHOWN_RESULTS).map(|r| {
            let timer = if r.timer_seconds > 0 {
                format!("{}s", r.timer_seconds)
            } else {
                "-".to_string()
            };
            Row::new(vec![
                Cell::from(r.timestamp.format("%d %b %H:%M").to_string()),
                Cell::from(r.total_questions.to_string()),
                Cell::from(r.direction.badge()),
                Cell::from(timer),
                Cell::from(format!("{}%", r.percentage))
                    .style(Style::default().fg(ScoreBand::for_percentage(r.percentage).color())),
                Cell::from(r.status.to_string()).style(dim),
            ])
        });

        let title = match app.history.len().checked_sub(SHOWN_RESULTS) {
            Some(more) if more > 0 => format!("History (+{more} more)"),
            _ => "History".to_string(),
        };
        Table::new(
            rows,
            [
                Constraint::Length(13),
                Constraint::Length(9),
                Constraint::Length(6),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Min(9),
            ],
        )
        .header(Row::new(vec!["Date", "Questions", "Mode", "Timer", "Score", "Status"]).style(bold))
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(chunks[0], buf);
    }

    let mut best_rows: Vec<Row> = app
        .best
        .iter()
        .map(|(count, r)| {
            Row::new(vec![
                Cell::from(format!("{count} questions")),
                Cell::from(format!("{}%", r.percentage)),
            ])
        })
        .collect();
    if let Some(top) = overall_best(&app.best) {
        best_rows.push(
            Row::new(vec![
                Cell::from("overall"),
                Cell::from(format!("{}%", top.percentage)),
            ])
            .style(bold),
        );
    }
    Table::new(best_rows, [Constraint::Length(16), Constraint::Min(5)])
        .block(Block::default().borders(Borders::ALL).title("Best scores"))
        .render(chunks[1], buf);

    help_line("(b)ack / (r)estart / (c)lear history / (esc)ape").render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use crate::ui::tests::{create_test_app, rendered};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Rect;

    fn press(app: &mut crate::App, c: char) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }

    #[test]
    fn test_history_lists_recorded_quizzes() {
        let mut app = create_test_app(3, 10);
        press(&mut app, 'q');
        press(&mut app, 'r');
        press(&mut app, 'q');
        press(&mut app, 'h');

        let text = rendered(&app, Rect::new(0, 0, 100, 30));

        assert!(text.contains("History"));
        assert!(text.contains("Questions"));
        assert!(text.contains("10s"));
        assert!(text.contains("quit"));
        assert!(text.contains("Best scores"));
        assert!(!text.contains("overall"));
    }

    #[test]
    fn test_clearing_history_empties_screen() {
        let mut app = create_test_app(2, 0);
        press(&mut app, 'q');
        press(&mut app, 'h');
        press(&mut app, 'c');

        let text = rendered(&app, Rect::new(0, 0, 100, 30));
        assert!(text.contains("No quizzes recorded yet"));
    }
}
