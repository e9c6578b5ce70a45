use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use wordup::{performance::Performance, session::SessionStatus};

use super::{help_line, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

/// Finished screen: score, verdict, totals and the words to review
pub(super) fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let Ok(result) = app.session.result() else {
        return;
    };
    let performance = Performance::for_percentage(result.percentage);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = match result.status {
        SessionStatus::Quit => "Quiz ended early",
        _ => "Quiz complete",
    };
    Paragraph::new(Line::from(vec![
        Span::styled(title, bold),
        Span::styled(format!("  {}", result.direction.badge()), dim),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!("{}%", result.percentage),
        bold.fg(performance.color()),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{performance}. "), bold.fg(performance.color())),
        Span::raw(performance.message()),
    ]))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} correct", result.correct_count), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("{} wrong", result.wrong_count), Style::default().fg(Color::Red)),
        Span::raw("  "),
        Span::styled(format!("{} skipped", result.skipped_count), dim),
        Span::raw(format!("  of {}", result.total_questions)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let wrong_words = app.session.wrong_words();
    if !wrong_words.is_empty() {
        let mut lines = vec![Line::from(Span::styled("Words to review", bold))];
        lines.extend(wrong_words.iter().map(|w| {
            Line::from(vec![
                Span::raw(w.english.as_str()),
                Span::styled(" → ", dim),
                Span::styled(w.turkish.as_str(), Style::default().fg(Color::Cyan)),
            ])
        }));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(notice.as_str(), Style::default().fg(Color::Yellow)))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    help_line("(r)estart / retry (w)rong / (h)istory / (m)ute / (esc)ape").render(chunks[6], buf);
}
