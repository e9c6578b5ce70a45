use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};
use std::rc::Rc;
use wordup::{
    history::{MemoryResultStore, ResultRecorder},
    notify::NullSink,
    question::Direction,
    runtime::{QuizEvent, Runner, TestEventSource},
    session::{QuizSession, SessionConfig, SessionStatus},
    words::WordPool,
};

const TICK: Duration = Duration::from_millis(100);

fn key(c: char) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn new_session(store: &MemoryResultStore) -> QuizSession {
    let pool = Rc::new(WordPool::builtin().unwrap());
    QuizSession::new(pool, Box::new(store.clone()), Box::new(NullSink))
        .with_rng(StdRng::seed_from_u64(21))
}

/// Minimal host loop: digits answer by position in the option list, `s` skips,
/// `q` quits. Ticks advance the session by a fixed interval.
fn drive(session: &mut QuizSession, runner: &Runner<TestEventSource>, steps: u32) {
    for _ in 0..steps {
        if session.status() != SessionStatus::Active {
            break;
        }
        match runner.step() {
            QuizEvent::Tick => session.on_tick(TICK),
            QuizEvent::Key(key) => match key.code {
                KeyCode::Char(c @ '1'..='4') => {
                    let idx = c as usize - '1' as usize;
                    if let Some(option) = session
                        .current_question()
                        .map(|q| q.options()[idx].clone())
                    {
                        session.submit_answer(&option);
                    }
                }
                KeyCode::Char('s') => {
                    session.skip();
                }
                KeyCode::Char('q') => {
                    session.quit();
                }
                _ => {}
            },
        }
    }
}

// Headless flow through Runner/TestEventSource without a TTY
#[test]
fn headless_skip_flow_completes() {
    let store = MemoryResultStore::new();
    let mut session = new_session(&store);
    session
        .start(SessionConfig::new(3, 0, Direction::Normal))
        .unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
    for _ in 0..3 {
        tx.send(key('s')).unwrap();
    }

    drive(&mut session, &runner, 100);

    let result = session.result().unwrap();
    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.skipped_count, 3);
    assert_eq!(store.load_history().unwrap().len(), 1);
}

#[test]
fn headless_timed_session_runs_out_on_ticks() {
    let store = MemoryResultStore::new();
    let mut session = new_session(&store);
    session
        .start(SessionConfig::new(2, 5, Direction::Reverse))
        .unwrap();

    // no input at all: each question times out after 50 ticks and
    // moves on 12 ticks later
    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(1));

    drive(&mut session, &runner, 200);

    let result = session.result().unwrap();
    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.wrong_count, 2);
    assert_eq!(result.percentage, 0);
    assert_eq!(result.timer_seconds, 5);
}

#[test]
fn headless_quit_mid_session() {
    let store = MemoryResultStore::new();
    let mut session = new_session(&store);
    session
        .start(SessionConfig::new(4, 10, Direction::Normal))
        .unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
    tx.send(key('s')).unwrap();
    tx.send(key('q')).unwrap();

    drive(&mut session, &runner, 50);

    let result = session.result().unwrap();
    assert_eq!(result.status, SessionStatus::Quit);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.total_questions, 4);
}

#[test]
fn headless_answer_keys_score() {
    let store = MemoryResultStore::new();
    let mut session = new_session(&store);
    session
        .start(SessionConfig::new(1, 0, Direction::Normal))
        .unwrap();

    let q = session.current_question().unwrap();
    let pos = q.options().iter().position(|o| q.is_correct(o)).unwrap();
    let (tx, rx) = mpsc::channel();
    tx.send(key(char::from(b'1' + pos as u8))).unwrap();

    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(1));
    drive(&mut session, &runner, 50);

    assert_eq!(session.result().unwrap().percentage, 100);
}
