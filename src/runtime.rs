use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the host loop reacts to: a key press, or the tick interval passing
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Tick,
}

/// Anything that can hand the runner the next pending event
pub trait QuizEventSource {
    /// Waits at most `timeout`; `None` when nothing arrived
    fn next_event(&self, timeout: Duration) -> Option<QuizEvent>;
}

fn wait_on(rx: &Receiver<QuizEvent>, timeout: Duration) -> Option<QuizEvent> {
    match rx.recv_timeout(timeout) {
        Ok(ev) => Some(ev),
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
    }
}

/// Reads the terminal on a background thread and forwards key presses
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let key = match event::read() {
                // key releases would answer twice on terminals that report them
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(QuizEvent::Key(key)).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn next_event(&self, timeout: Duration) -> Option<QuizEvent> {
        wait_on(&self.rx, timeout)
    }
}

/// Events pushed in by a test through a channel
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn next_event(&self, timeout: Duration) -> Option<QuizEvent> {
        wait_on(&self.rx, timeout)
    }
}

/// Turns an event source into a steady stream of keys and ticks, measuring
/// the wall time between steps so the session clock can follow it.
pub struct Runner<E: QuizEventSource> {
    source: E,
    tick: Duration,
    last_step: Instant,
}

impl<E: QuizEventSource> Runner<E> {
    pub fn new(source: E, tick: Duration) -> Self {
        Self {
            source,
            tick,
            last_step: Instant::now(),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Next key, or Tick when none arrives within one tick interval
    pub fn step(&self) -> QuizEvent {
        self.source.next_event(self.tick).unwrap_or(QuizEvent::Tick)
    }

    /// [`Runner::step`] plus the wall time since the previous call
    pub fn step_timed(&mut self) -> (QuizEvent, Duration) {
        let ev = self.step();
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_step);
        self.last_step = now;
        (ev, elapsed)
    }
}
