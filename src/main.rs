mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::warn;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    cell::Cell,
    error::Error,
    io::{self, stdin, Write},
    rc::Rc,
    time::Duration,
};
use wordup::{
    ads::{AdGate, LogAdBackend},
    config::{Config, ConfigStore, FileConfigStore},
    error::QuizError,
    history::{overall_best, BestScores, MemoryResultStore, ResultRecorder, SqliteResultStore},
    notify::{CompositeSink, TerminalBell},
    question::Direction,
    runtime::{CrosstermEventSource, QuizEvent, QuizEventSource, Runner},
    session::{QuestionToken, QuizSession, SessionResult, TIMER_CHOICES},
    words::WordPool,
};

const TICK_RATE_MS: u64 = 100;

/// english-turkish vocabulary quiz for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Multiple-choice English-Turkish vocabulary quiz with an optional per-question countdown, a reverse mode, retry-the-mistakes rounds and local score history."
)]
pub struct Cli {
    /// number of questions per quiz [default: last used, initially 20]
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// seconds per question: 0 (off), 5, 10 or 15
    #[clap(short = 't', long, value_parser = parse_timer)]
    timer: Option<u32>,

    /// normal asks english and answers turkish, reverse the other way round
    #[clap(short = 'd', long, value_enum)]
    direction: Option<Direction>,

    /// silence the terminal bell
    #[clap(long)]
    mute: bool,

    /// print recent results and best scores, then exit
    #[clap(long)]
    history: bool,

    /// delete all recorded results and best scores
    #[clap(long)]
    clear_history: bool,

    /// stop showing ads
    #[clap(long)]
    remove_ads: bool,
}

fn parse_timer(s: &str) -> Result<u32, String> {
    let secs: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if secs == 0 || TIMER_CHOICES.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("timer must be 0, 5, 10 or 15 seconds, got {secs}"))
    }
}

impl Cli {
    /// Stored preferences with the flags given on this run layered on top
    fn apply(&self, stored: Config) -> Config {
        Config {
            question_count: self.questions.unwrap_or(stored.question_count),
            timer_seconds: self.timer.unwrap_or(stored.timer_seconds),
            direction: self.direction.unwrap_or(stored.direction),
            muted: stored.muted || self.mute,
            ads_removed: stored.ads_removed || self.remove_ads,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Quiz,
    Finished,
    History,
}

pub struct App {
    pub session: QuizSession,
    pub state: AppState,
    pub settings: Config,
    pub muted: Rc<Cell<bool>>,
    pub ads_removed: Rc<Cell<bool>>,
    /// Options of the question on screen, in the order they are listed
    pub options: Vec<String>,
    options_token: Option<QuestionToken>,
    pub history: Vec<SessionResult>,
    pub best: BestScores,
    pub notice: Option<String>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("options", &self.options)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(
        session: QuizSession,
        settings: Config,
        muted: Rc<Cell<bool>>,
        ads_removed: Rc<Cell<bool>>,
    ) -> Result<Self, QuizError> {
        let mut app = Self {
            session,
            state: AppState::Quiz,
            settings,
            muted,
            ads_removed,
            options: Vec::new(),
            options_token: None,
            history: Vec::new(),
            best: BestScores::new(),
            notice: None,
        };
        app.session.start(app.settings.session_config())?;
        app.sync();
        Ok(app)
    }

    /// Returns false when the user asked to leave. Leaving mid-quiz abandons
    /// the session without recording it.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.session.go_home();
            return false;
        }
        self.notice = None;

        if key.code == KeyCode::Char('m') {
            self.muted.set(!self.muted.get());
            self.settings.muted = self.muted.get();
            return true;
        }

        match self.state {
            AppState::Quiz => match key.code {
                KeyCode::Char(c @ '1'..='4') => {
                    let idx = c as usize - '1' as usize;
                    if let Some(option) = self.options.get(idx).cloned() {
                        self.session.submit_answer(&option);
                    }
                }
                KeyCode::Char('s') => {
                    self.session.skip();
                }
                KeyCode::Char('q') => {
                    self.session.quit();
                }
                _ => {}
            },
            AppState::Finished => match key.code {
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('w') => {
                    if let Err(e) = self.session.retry_wrong() {
                        self.notice = Some(e.to_string());
                    } else {
                        self.state = AppState::Quiz;
                    }
                }
                KeyCode::Char('h') => self.show_history(),
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Finished,
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('c') => {
                    self.session.clear_history();
                    self.show_history();
                }
                _ => {}
            },
        }

        self.sync();
        true
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.session.on_tick(elapsed);
        self.sync();
    }

    fn restart(&mut self) {
        match self.session.restart() {
            Ok(()) => self.state = AppState::Quiz,
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn show_history(&mut self) {
        self.history = self.session.history();
        self.best = self.session.best_scores();
        self.state = AppState::History;
    }

    /// Follows session transitions and reshuffles options once per question
    fn sync(&mut self) {
        if self.state == AppState::Quiz && self.session.status().is_terminated() {
            self.state = AppState::Finished;
        }

        let token = self.session.token();
        if token != self.options_token {
            self.options = self.session.display_options();
            self.options_token = token;
        }
    }
}

fn open_recorder() -> Box<dyn ResultRecorder> {
    match SqliteResultStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("history database unavailable, results will not persist: {e}");
            Box::new(MemoryResultStore::new())
        }
    }
}

fn print_history<W: Write>(
    out: &mut W,
    history: &[SessionResult],
    best: &BestScores,
) -> io::Result<()> {
    if history.is_empty() {
        writeln!(out, "no quizzes recorded yet")?;
        return Ok(());
    }

    writeln!(out, "recent quizzes:")?;
    for r in history.iter().take(10) {
        let timer = if r.timer_seconds > 0 {
            format!("{}s", r.timer_seconds)
        } else {
            "-".to_string()
        };
        writeln!(
            out,
            "  {}  {:>4} questions  {}  {:>3}  {:>3}%  {}",
            r.timestamp.format("%d %b %H:%M"),
            r.total_questions,
            r.direction.badge(),
            timer,
            r.percentage,
            r.status
        )?;
    }
    if history.len() > 10 {
        writeln!(out, "  +{} more", history.len() - 10)?;
    }

    writeln!(out, "best scores:")?;
    for (count, r) in best {
        writeln!(out, "  {count:>4} questions  {:>3}%", r.percentage)?;
    }
    if let Some(top) = overall_best(best) {
        writeln!(
            out,
            "overall best: {}% on {} questions",
            top.percentage, top.total_questions
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let settings = cli.apply(config_store.load());
    let pool = Rc::new(WordPool::builtin()?);

    if let Err(e) = settings.session_config().validate(pool.len()) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    let mut recorder = open_recorder();
    if cli.clear_history {
        recorder.clear_all()?;
        println!("history cleared");
    }
    if cli.history {
        let history = recorder.load_history()?;
        let best = recorder.load_best_scores()?;
        print_history(&mut io::stdout(), &history, &best)?;
    }
    if cli.history || cli.clear_history {
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let muted = Rc::new(Cell::new(settings.muted));
    let ads_removed = Rc::new(Cell::new(settings.ads_removed));
    let sink = CompositeSink::new()
        .with(Box::new(TerminalBell::stdout(muted.clone())))
        .with(Box::new(AdGate::for_host(LogAdBackend, ads_removed.clone())));
    let session = QuizSession::new(pool, recorder, Box::new(sink));
    let mut app = App::new(session, settings, muted, ads_removed)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let outcome = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // no-op unless the loop ended on an error
    app.session.go_home();
    if let Err(e) = config_store.save(&app.settings) {
        warn!("could not save settings: {e}");
    }

    outcome
}

fn start_tui<B: Backend, E: QuizEventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let (event, elapsed) = runner.step_timed();
        match event {
            QuizEvent::Tick => app.on_tick(elapsed),
            QuizEvent::Key(key) => {
                app.on_tick(elapsed);
                if !app.on_key(key) {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
