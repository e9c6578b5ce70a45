mod history;
mod summary;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use wordup::session::QuestionPhase;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Countdown turns red at this many seconds
const TIMER_WARNING_SECS: u32 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Quiz => render_quiz(self, area, buf),
            AppState::Finished => summary::render(self, area, buf),
            AppState::History => history::render(self, area, buf),
        }
    }
}

fn help_line(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let (Some(state), Some(question), Some(phase)) =
        (session.state(), session.current_question(), session.phase())
    else {
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let green_bold = bold.fg(Color::Green);
    let red_bold = bold.fg(Color::Red);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let (position, total) = session.progress().unwrap_or((0, 0));
    let mut status = vec![
        Span::styled(format!("Question {position}/{total}"), bold),
        Span::raw("   "),
        Span::styled(format!("✓ {}", state.correct_count), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("✗ {}", state.wrong_count), Style::default().fg(Color::Red)),
        Span::raw("  "),
        Span::styled(format!("↷ {}", state.skipped_count), dim),
        Span::raw("   "),
        Span::styled(question.direction().badge(), Style::default().fg(Color::Magenta)),
    ];
    if let Some(secs) = session.time_left() {
        let style = if secs <= TIMER_WARNING_SECS {
            red_bold
        } else {
            bold.fg(Color::Yellow)
        };
        status.push(Span::raw("   "));
        status.push(Span::styled(format!("{secs}s left"), style));
    }
    if app.muted.get() {
        status.push(Span::styled("   muted", dim));
    }
    Paragraph::new(Line::from(status))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let done = state.current_index as f64 / total.max(1) as f64;
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(done.clamp(0.0, 1.0))
        .label("")
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        question.prompt(),
        bold.add_modifier(Modifier::UNDERLINED),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);

    let options: Vec<Line> = app
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = match phase {
                QuestionPhase::Locked {
                    option: picked,
                    correct,
                } if picked == option => {
                    if *correct {
                        green_bold
                    } else {
                        red_bold
                    }
                }
                QuestionPhase::Expired if question.is_correct(option) => green_bold,
                _ => Style::default(),
            };
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), dim),
                Span::styled(option.clone(), style),
            ])
        })
        .collect();
    Paragraph::new(options)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let feedback = match phase {
        QuestionPhase::Locked { correct: true, .. } => {
            Line::from(Span::styled("Correct!", green_bold))
        }
        QuestionPhase::Locked { correct: false, .. } => {
            Line::from(Span::styled("Wrong, try again", red_bold))
        }
        QuestionPhase::Expired => Line::from(vec![
            Span::styled("Time's up! ", red_bold),
            Span::raw("The answer was "),
            Span::styled(question.correct_answer(), green_bold),
        ]),
        QuestionPhase::Unanswered => match &app.notice {
            Some(notice) => Line::from(Span::styled(notice.as_str(), dim)),
            None => Line::default(),
        },
    };
    Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    help_line("(1-4) answer / (s)kip / (q)uit / (m)ute / (esc)ape").render(chunks[7], buf);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::App;
    use rand::{rngs::StdRng, SeedableRng};
    use std::{cell::Cell, rc::Rc, time::Duration};
    use wordup::{
        config::Config,
        history::MemoryResultStore,
        notify::NullSink,
        session::{QuizSession, WRONG_FEEDBACK_DELAY},
        words::WordPool,
    };

    pub(crate) fn create_test_app(question_count: usize, timer_seconds: u32) -> App {
        let pool = Rc::new(WordPool::builtin().unwrap());
        let session = QuizSession::new(pool, Box::new(MemoryResultStore::new()), Box::new(NullSink))
            .with_rng(StdRng::seed_from_u64(3));
        let settings = Config {
            question_count,
            timer_seconds,
            ..Config::default()
        };
        App::new(
            session,
            settings,
            Rc::new(Cell::new(false)),
            Rc::new(Cell::new(false)),
        )
        .unwrap()
    }

    pub(crate) fn rendered(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn answer(app: &mut App, correct: bool) {
        let q = app.session.current_question().unwrap().clone();
        let option = app
            .options
            .iter()
            .find(|o| q.is_correct(o) == correct)
            .unwrap()
            .clone();
        app.session.submit_answer(&option);
    }

    #[test]
    fn test_quiz_shows_prompt_and_options() {
        let app = create_test_app(5, 0);
        let text = rendered(&app, Rect::new(0, 0, 80, 24));

        let prompt = app.session.current_question().unwrap().prompt().to_string();
        assert!(text.contains(&prompt));
        assert!(text.contains("Question 1/5"));
        assert!(text.contains("EN→TR"));
        for (i, option) in app.options.iter().enumerate() {
            assert!(text.contains(&format!("{}. {}", i + 1, option)));
        }
        assert!(!text.contains("s left"));
    }

    #[test]
    fn test_quiz_shows_countdown() {
        let mut app = create_test_app(5, 10);
        app.on_tick(Duration::from_secs(2));

        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("8s left"));
    }

    #[test]
    fn test_feedback_lines() {
        let mut app = create_test_app(5, 0);
        answer(&mut app, false);
        assert!(rendered(&app, Rect::new(0, 0, 80, 24)).contains("Wrong, try again"));

        app.on_tick(WRONG_FEEDBACK_DELAY);
        answer(&mut app, true);
        assert!(rendered(&app, Rect::new(0, 0, 80, 24)).contains("Correct!"));
    }

    #[test]
    fn test_timeout_overlay_reveals_answer() {
        let mut app = create_test_app(5, 5);
        app.on_tick(Duration::from_secs(5));

        let expected = app
            .session
            .current_question()
            .unwrap()
            .correct_answer()
            .to_string();
        let text = rendered(&app, Rect::new(0, 0, 100, 24));
        assert!(text.contains("Time's up!"));
        assert!(text.contains(&expected));
    }

    #[test]
    fn test_render_extreme_sizes() {
        let mut app = create_test_app(3, 5);
        for area in [
            Rect::new(0, 0, 10, 5),
            Rect::new(0, 0, 1, 1),
            Rect::new(0, 0, 300, 100),
        ] {
            rendered(&app, area);
        }

        app.session.quit();
        app.on_tick(Duration::ZERO);
        for area in [Rect::new(0, 0, 10, 5), Rect::new(0, 0, 200, 60)] {
            rendered(&app, area);
        }
    }
}
