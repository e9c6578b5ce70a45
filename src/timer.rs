use std::fmt;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

pub type TimeoutCallback = Box<dyn FnMut()>;

/// Per-question countdown ticking once a second.
///
/// The timer does not own a clock: whoever drives it feeds elapsed time through
/// [`Timer::advance`] (or single ticks through [`Timer::tick`]). Sub-second
/// remainders are carried over, including across a pause, so pausing never
/// costs the player countdown time.
pub struct Timer {
    duration: u32,
    remaining: u32,
    state: TimerState,
    carry: Duration,
    on_timeout: Option<TimeoutCallback>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .field("carry", &self.carry)
            .field("has_callback", &self.on_timeout.is_some())
            .finish()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            duration: 0,
            remaining: 0,
            state: TimerState::Idle,
            carry: Duration::ZERO,
            on_timeout: None,
        }
    }

    /// Replaces the timeout handler. Takes effect immediately, also for a running countdown.
    pub fn set_on_timeout(&mut self, callback: TimeoutCallback) {
        self.on_timeout = Some(callback);
    }

    pub fn clear_on_timeout(&mut self) {
        self.on_timeout = None;
    }

    /// Cancels any countdown in flight and starts a fresh one
    pub fn start(&mut self, duration_secs: u32) {
        self.duration = duration_secs;
        self.remaining = duration_secs;
        self.carry = Duration::ZERO;
        self.state = TimerState::Running;
        if duration_secs == 0 {
            self.expire();
        }
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// No-op unless paused; calling it twice never doubles the tick rate
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    /// Cancels ticking and keeps `remaining`. Never fires the callback.
    pub fn stop(&mut self) {
        if matches!(self.state, TimerState::Running | TimerState::Paused) {
            self.state = TimerState::Idle;
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining = self.duration;
        self.carry = Duration::ZERO;
    }

    /// Feeds wall time into the countdown. Returns true when this call expired the timer.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.state != TimerState::Running {
            return false;
        }

        self.carry += elapsed;
        while self.carry >= TICK && self.state == TimerState::Running {
            self.carry -= TICK;
            if self.tick() {
                return true;
            }
        }
        false
    }

    /// One whole-second tick. Returns true when it expired the timer.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire();
            return true;
        }
        false
    }

    fn expire(&mut self) {
        self.state = TimerState::Expired;
        self.carry = Duration::ZERO;
        if let Some(callback) = self.on_timeout.as_mut() {
            callback();
        }
    }

    /// Wall time until the next whole-second tick, None unless running
    pub fn until_next_tick(&self) -> Option<Duration> {
        self.is_running().then(|| TICK - self.carry)
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }
}
