use chrono::{DateTime, Local};
use log::{debug, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::{
    error::QuizError,
    history::{BestScores, ResultRecorder},
    notify::{Notification, NotificationSink},
    question::{build_questions, prepare, Direction, Question},
    schedule::Scheduler,
    shuffle::shuffle,
    timer::Timer,
    words::{WordEntry, WordPool},
};

/// How long a correct pick stays on screen before the next question
pub const CORRECT_ADVANCE_DELAY: Duration = Duration::from_millis(800);
/// How long a wrong pick stays highlighted before the question opens up again
pub const WRONG_FEEDBACK_DELAY: Duration = Duration::from_millis(800);
/// How long the timeout overlay stays before the next question
pub const TIMEOUT_ADVANCE_DELAY: Duration = Duration::from_millis(1200);

pub const MAX_QUESTIONS: usize = 1000;
pub const TIMER_CHOICES: [u32; 3] = [5, 10, 15];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub question_count: usize,
    /// 0 disables the countdown
    pub timer_seconds: u32,
    pub direction: Direction,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            question_count: 20,
            timer_seconds: 0,
            direction: Direction::Normal,
        }
    }
}

impl SessionConfig {
    pub fn new(question_count: usize, timer_seconds: u32, direction: Direction) -> Self {
        Self {
            question_count,
            timer_seconds,
            direction,
        }
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_seconds > 0
    }

    /// Largest question count a pool of `pool_size` words allows
    pub fn max_questions(pool_size: usize) -> usize {
        MAX_QUESTIONS.min(pool_size)
    }

    pub fn validate(&self, pool_size: usize) -> Result<(), QuizError> {
        let max = Self::max_questions(pool_size);
        if self.question_count < 1 || self.question_count > max {
            return Err(QuizError::InvalidConfig(format!(
                "question count must be between 1 and {max}, got {}",
                self.question_count
            )));
        }
        if self.timer_seconds != 0 && !TIMER_CHOICES.contains(&self.timer_seconds) {
            return Err(QuizError::InvalidConfig(format!(
                "timer must be off or one of {TIMER_CHOICES:?} seconds, got {}",
                self.timer_seconds
            )));
        }
        if self.direction == Direction::Reverse && pool_size < 4 {
            return Err(QuizError::InvalidConfig(
                "reverse mode needs at least 4 words in the pool".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Completed,
    Quit,
}

impl SessionStatus {
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Quit)
    }
}

/// Sub-state of the question on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPhase {
    Unanswered,
    /// An option was picked; input is ignored until the feedback delay runs out
    Locked { option: String, correct: bool },
    /// Countdown ran out; the next question follows after a delay
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    /// Not active, or the question is locked
    Ignored,
}

/// Identifies one question of one session; delayed work carries it and is
/// dropped when it no longer matches the live question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionToken {
    pub generation: u64,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub skipped_count: usize,
    pub has_wrong_answer_on_current: bool,
    pub wrong_words: Vec<WordEntry>,
    pub status: SessionStatus,
    pub phase: QuestionPhase,
}

impl SessionState {
    fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current_index: 0,
            correct_count: 0,
            wrong_count: 0,
            skipped_count: 0,
            has_wrong_answer_on_current: false,
            wrong_words: Vec::new(),
            status: SessionStatus::Active,
            phase: QuestionPhase::Unanswered,
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn scored(&self) -> usize {
        self.correct_count + self.wrong_count + self.skipped_count
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn percentage(&self) -> u8 {
        percentage(self.correct_count, self.total())
    }
}

/// `round(100 * correct / total)`, 0 for an empty session
pub fn percentage(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Snapshot of a terminated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub total_questions: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub skipped_count: usize,
    pub percentage: u8,
    pub timer_seconds: u32,
    pub direction: Direction,
    pub status: SessionStatus,
    pub timestamp: DateTime<Local>,
}

impl SessionResult {
    fn from_state(state: &SessionState, config: &SessionConfig) -> Self {
        Self {
            total_questions: state.total(),
            correct_count: state.correct_count,
            wrong_count: state.wrong_count,
            skipped_count: state.skipped_count,
            percentage: state.percentage(),
            timer_seconds: config.timer_seconds,
            direction: config.direction,
            status: state.status,
            timestamp: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Advance,
    Unlock,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    token: QuestionToken,
    action: Action,
}

/// The quiz state machine.
///
/// Owns question sequencing, scoring, the per-question countdown and the
/// delayed auto-advance. Time enters only through [`QuizSession::on_tick`];
/// timer expiry goes through the timer's callback into a single-consumer
/// queue that `on_tick` drains, so every transition runs on the caller's
/// thread in order.
pub struct QuizSession {
    pool: Rc<WordPool>,
    recorder: Box<dyn ResultRecorder>,
    sink: Box<dyn NotificationSink>,
    rng: StdRng,
    timer: Timer,
    scheduler: Scheduler<Scheduled>,
    timeout_tx: Sender<QuestionToken>,
    timeout_rx: Receiver<QuestionToken>,
    generation: u64,
    /// Settings of the live or last session, retry rounds included
    config: Option<SessionConfig>,
    /// Settings last passed to `start`; quick restart repeats these
    chosen: Option<SessionConfig>,
    state: Option<SessionState>,
    result: Option<SessionResult>,
}

impl QuizSession {
    pub fn new(
        pool: Rc<WordPool>,
        recorder: Box<dyn ResultRecorder>,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        let (timeout_tx, timeout_rx) = mpsc::channel();
        Self {
            pool,
            recorder,
            sink,
            rng: StdRng::from_entropy(),
            timer: Timer::new(),
            scheduler: Scheduler::new(),
            timeout_tx,
            timeout_rx,
            generation: 0,
            config: None,
            chosen: None,
            state: None,
            result: None,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Starts a fresh session over `config.question_count` random words
    pub fn start(&mut self, config: SessionConfig) -> Result<(), QuizError> {
        config.validate(self.pool.len())?;
        let entries = build_questions(&self.pool, config.question_count, &mut self.rng)?;
        self.begin(config, entries)?;
        self.chosen = Some(config);
        Ok(())
    }

    /// New random words with the settings last given to [`QuizSession::start`].
    /// Retry rounds do not change them.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        let config = self
            .chosen
            .ok_or_else(|| QuizError::InvalidConfig("no previous session to repeat".into()))?;
        self.start(config)
    }

    /// New session over the words missed in the terminated one
    pub fn retry_wrong(&mut self) -> Result<(), QuizError> {
        let (state, previous) = match (&self.state, self.config) {
            (Some(state), Some(config)) if state.status.is_terminated() => (state, config),
            _ => return Err(QuizError::SessionNotTerminated),
        };
        if state.wrong_words.is_empty() {
            return Err(QuizError::NoWrongAnswers);
        }

        let entries = shuffle(&state.wrong_words, &mut self.rng);
        let config = SessionConfig {
            question_count: entries.len(),
            ..previous
        };
        config.validate(self.pool.len())?;
        self.begin(config, entries)
    }

    fn begin(&mut self, config: SessionConfig, entries: Vec<WordEntry>) -> Result<(), QuizError> {
        let questions = prepare(entries, config.direction, &self.pool, &mut self.rng)?;

        self.teardown();
        self.generation += 1;
        self.state = Some(SessionState::new(questions));
        self.config = Some(config);
        self.result = None;
        debug!(
            "session {} started: {} questions, timer {}s, {}",
            self.generation, config.question_count, config.timer_seconds, config.direction
        );

        self.emit(Notification::SessionStart);
        self.arm_timer();
        Ok(())
    }

    /// Drops the current session without recording it and returns to Idle.
    /// The last config is kept for [`QuizSession::restart`].
    pub fn go_home(&mut self) {
        self.teardown();
        self.generation += 1;
        self.state = None;
        self.result = None;
    }

    /// Cancels everything still pending for the live session
    fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.timer.stop();
        self.timer.clear_on_timeout();
        while self.timeout_rx.try_recv().is_ok() {}

        if self.status() == SessionStatus::Active {
            debug!("session {} abandoned", self.generation);
            self.emit(Notification::SessionEnd);
        }
    }

    pub fn submit_answer(&mut self, option: &str) -> AnswerOutcome {
        let Some(token) = self.token() else {
            return AnswerOutcome::Ignored;
        };
        let Some(state) = self.state.as_mut() else {
            return AnswerOutcome::Ignored;
        };
        if state.phase != QuestionPhase::Unanswered {
            return AnswerOutcome::Ignored;
        }
        let Some(question) = state.questions.get(state.current_index) else {
            return AnswerOutcome::Ignored;
        };

        let correct = question.is_correct(option);
        let entry = question.entry().clone();
        state.phase = QuestionPhase::Locked {
            option: option.to_string(),
            correct,
        };

        if correct {
            if !state.has_wrong_answer_on_current {
                state.correct_count += 1;
            }
            debug!("q{} correct", token.index + 1);
            self.timer.stop();
            self.emit(Notification::Correct);
            self.scheduler.schedule(
                CORRECT_ADVANCE_DELAY,
                Scheduled {
                    token,
                    action: Action::Advance,
                },
            );
            AnswerOutcome::Correct
        } else {
            if !state.has_wrong_answer_on_current {
                state.wrong_count += 1;
                state.wrong_words.push(entry);
                state.has_wrong_answer_on_current = true;
            }
            debug!("q{} wrong: {option}", token.index + 1);
            self.emit(Notification::Wrong);
            self.scheduler.schedule(
                WRONG_FEEDBACK_DELAY,
                Scheduled {
                    token,
                    action: Action::Unlock,
                },
            );
            AnswerOutcome::Wrong
        }
    }

    /// Moves on without answering. A question already answered wrong is not
    /// counted a second time.
    pub fn skip(&mut self) -> bool {
        if self.token().is_none() {
            return false;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.phase != QuestionPhase::Unanswered {
            return false;
        }

        if !state.has_wrong_answer_on_current {
            state.skipped_count += 1;
            if let Some(q) = state.questions.get(state.current_index) {
                state.wrong_words.push(q.entry().clone());
            }
        }
        debug!("q{} skipped", state.current_index + 1);

        self.timer.stop();
        self.advance();
        true
    }

    /// Applies a countdown expiry to the live question
    pub fn handle_timeout(&mut self) {
        if let Some(token) = self.token() {
            self.expire(token);
        }
    }

    fn expire(&mut self, token: QuestionToken) {
        if self.token() != Some(token) {
            debug!("dropping stale timeout for {token:?}");
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let open = match &state.phase {
            QuestionPhase::Unanswered => true,
            QuestionPhase::Locked { correct, .. } => !correct,
            QuestionPhase::Expired => false,
        };
        if !open {
            return;
        }

        if !state.has_wrong_answer_on_current {
            state.wrong_count += 1;
            if let Some(q) = state.questions.get(state.current_index) {
                state.wrong_words.push(q.entry().clone());
            }
            state.has_wrong_answer_on_current = true;
        }
        state.phase = QuestionPhase::Expired;
        debug!("q{} timed out", token.index + 1);

        self.scheduler.cancel_all();
        self.emit(Notification::Timeout);
        self.scheduler.schedule(
            TIMEOUT_ADVANCE_DELAY,
            Scheduled {
                token,
                action: Action::Advance,
            },
        );
    }

    /// Ends the session early. The question on screen is not scored.
    pub fn quit(&mut self) -> bool {
        if self.status() != SessionStatus::Active {
            return false;
        }
        self.timer.pause();
        self.scheduler.cancel_all();
        if let Some(state) = self.state.as_mut() {
            state.status = SessionStatus::Quit;
        }
        self.finish();
        true
    }

    /// Feeds elapsed wall time.
    ///
    /// The interval is cut at every countdown tick and every due task, so a
    /// long gap plays out in the same order as many short ones would.
    pub fn on_tick(&mut self, elapsed: Duration) {
        let mut left = elapsed;
        loop {
            let step = [
                Some(left),
                self.timer.until_next_tick(),
                self.scheduler.until_next_due(),
            ]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(left);

            let due = self.scheduler.advance(step);
            self.timer.advance(step);
            while let Ok(token) = self.timeout_rx.try_recv() {
                self.expire(token);
            }
            for task in due {
                if self.token() != Some(task.token) {
                    continue;
                }
                match task.action {
                    Action::Advance => self.advance(),
                    Action::Unlock => self.unlock(),
                }
            }

            left -= step;
            if left.is_zero() {
                break;
            }
        }
    }

    fn unlock(&mut self) {
        if let Some(state) = self.state.as_mut() {
            if matches!(state.phase, QuestionPhase::Locked { correct: false, .. }) {
                state.phase = QuestionPhase::Unanswered;
            }
        }
    }

    fn advance(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.status != SessionStatus::Active {
            return;
        }
        state.has_wrong_answer_on_current = false;
        state.phase = QuestionPhase::Unanswered;

        if state.is_last() {
            state.status = SessionStatus::Completed;
            self.timer.stop();
            self.emit(Notification::Finish);
            self.finish();
        } else {
            state.current_index += 1;
            self.arm_timer();
        }
    }

    fn finish(&mut self) {
        let (Some(state), Some(config)) = (self.state.as_ref(), self.config.as_ref()) else {
            return;
        };
        let result = SessionResult::from_state(state, config);
        debug!(
            "session {} {}: {}/{} ({}%)",
            self.generation,
            result.status,
            result.correct_count,
            result.total_questions,
            result.percentage
        );

        if let Err(e) = self.recorder.append_result(&result) {
            warn!("could not record session result: {e}");
        }
        self.result = Some(result);
        self.emit(Notification::SessionEnd);
    }

    fn arm_timer(&mut self) {
        let (Some(config), Some(token)) = (self.config, self.token()) else {
            return;
        };
        if !config.timer_enabled() {
            return;
        }
        let tx = self.timeout_tx.clone();
        self.timer.set_on_timeout(Box::new(move || {
            let _ = tx.send(token);
        }));
        self.timer.start(config.timer_seconds);
    }

    fn emit(&mut self, n: Notification) {
        if let Err(e) = n.deliver(self.sink.as_mut()) {
            warn!("{n:?} notification failed: {e}");
        }
    }

    pub fn result(&self) -> Result<SessionResult, QuizError> {
        self.result.clone().ok_or(QuizError::SessionNotTerminated)
    }

    pub fn status(&self) -> SessionStatus {
        self.state
            .as_ref()
            .map_or(SessionStatus::Idle, |s| s.status)
    }

    /// Token of the question on screen while a session is active
    pub fn token(&self) -> Option<QuestionToken> {
        self.state
            .as_ref()
            .filter(|s| s.status == SessionStatus::Active)
            .map(|s| QuestionToken {
                generation: self.generation,
                index: s.current_index,
            })
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn config(&self) -> Option<SessionConfig> {
        self.config
    }

    pub fn pool(&self) -> &WordPool {
        &self.pool
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state
            .as_ref()
            .filter(|s| s.status == SessionStatus::Active)
            .and_then(|s| s.current_question())
    }

    pub fn phase(&self) -> Option<&QuestionPhase> {
        self.state
            .as_ref()
            .filter(|s| s.status == SessionStatus::Active)
            .map(|s| &s.phase)
    }

    /// Options of the current question in a fresh random order
    pub fn display_options(&mut self) -> Vec<String> {
        let Some(state) = self.state.as_ref() else {
            return Vec::new();
        };
        if state.status != SessionStatus::Active {
            return Vec::new();
        }
        match state.current_question() {
            Some(q) => q.display_options(&mut self.rng),
            None => Vec::new(),
        }
    }

    /// 1-based position and total
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.state
            .as_ref()
            .map(|s| ((s.current_index + 1).min(s.total()), s.total()))
    }

    /// Seconds left on the countdown, when the session uses one
    pub fn time_left(&self) -> Option<u32> {
        match (self.config, self.status()) {
            (Some(c), SessionStatus::Active) if c.timer_enabled() => Some(self.timer.remaining()),
            _ => None,
        }
    }

    pub fn wrong_words(&self) -> &[WordEntry] {
        self.state
            .as_ref()
            .map_or(&[][..], |s| s.wrong_words.as_slice())
    }

    /// Recorded history, empty when the store cannot be read
    pub fn history(&self) -> Vec<SessionResult> {
        self.recorder.load_history().unwrap_or_else(|e| {
            warn!("could not load history: {e}");
            Vec::new()
        })
    }

    /// Best results per question count, empty when the store cannot be read
    pub fn best_scores(&self) -> BestScores {
        self.recorder.load_best_scores().unwrap_or_else(|e| {
            warn!("could not load best scores: {e}");
            BestScores::new()
        })
    }

    pub fn clear_history(&mut self) {
        if let Err(e) = self.recorder.clear_all() {
            warn!("could not clear history: {e}");
        }
    }
}
