use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use crate::error::NotifyError;

/// Side effects triggered by session transitions (audio cues, ads).
///
/// Every method defaults to a no-op so sinks only implement what they care
/// about. Errors are reported back but the session never acts on them.
pub trait NotificationSink {
    fn notify_correct(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify_wrong(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify_finish(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify_timeout(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn on_session_start(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn on_session_end(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Correct,
    Wrong,
    Finish,
    Timeout,
    SessionStart,
    SessionEnd,
}

impl Notification {
    pub fn deliver(self, sink: &mut dyn NotificationSink) -> Result<(), NotifyError> {
        match self {
            Notification::Correct => sink.notify_correct(),
            Notification::Wrong => sink.notify_wrong(),
            Notification::Finish => sink.notify_finish(),
            Notification::Timeout => sink.notify_timeout(),
            Notification::SessionStart => sink.on_session_start(),
            Notification::SessionEnd => sink.on_session_end(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {}

/// Fans every notification out to all children. A failing child does not stop
/// the others; the first error is returned once everyone has been called.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn fan_out(&mut self, n: Notification) -> Result<(), NotifyError> {
        let mut first_err = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = n.deliver(sink.as_mut()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl NotificationSink for CompositeSink {
    fn notify_correct(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::Correct)
    }

    fn notify_wrong(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::Wrong)
    }

    fn notify_finish(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::Finish)
    }

    fn notify_timeout(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::Timeout)
    }

    fn on_session_start(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::SessionStart)
    }

    fn on_session_end(&mut self) -> Result<(), NotifyError> {
        self.fan_out(Notification::SessionEnd)
    }
}

/// Keeps every notification it receives. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    pub fn count(&self, n: Notification) -> usize {
        self.log.borrow().iter().filter(|x| **x == n).count()
    }

    fn push(&mut self, n: Notification) -> Result<(), NotifyError> {
        self.log.borrow_mut().push(n);
        Ok(())
    }
}

impl NotificationSink for RecordingSink {
    fn notify_correct(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::Correct)
    }

    fn notify_wrong(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::Wrong)
    }

    fn notify_finish(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::Finish)
    }

    fn notify_timeout(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::Timeout)
    }

    fn on_session_start(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::SessionStart)
    }

    fn on_session_end(&mut self) -> Result<(), NotifyError> {
        self.push(Notification::SessionEnd)
    }
}

/// Audio cues for a terminal: the bell rings on mistakes and timeouts and
/// twice at the end of a quiz. The mute flag is shared with the host so it can
/// be toggled while a session runs.
pub struct TerminalBell<W: Write> {
    out: W,
    muted: Rc<Cell<bool>>,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout(muted: Rc<Cell<bool>>) -> Self {
        Self::new(io::stdout(), muted)
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W, muted: Rc<Cell<bool>>) -> Self {
        Self { out, muted }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn ring(&mut self, times: usize) -> Result<(), NotifyError> {
        if self.muted.get() {
            return Ok(());
        }
        let bells = "\x07".repeat(times);
        self.out
            .write_all(bells.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| NotifyError::new("bell", e.to_string()))
    }
}

impl<W: Write> NotificationSink for TerminalBell<W> {
    fn notify_wrong(&mut self) -> Result<(), NotifyError> {
        self.ring(1)
    }

    fn notify_timeout(&mut self) -> Result<(), NotifyError> {
        self.ring(1)
    }

    fn notify_finish(&mut self) -> Result<(), NotifyError> {
        self.ring(2)
    }
}
