mod ui;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    io::{self, stdin},
    time::Duration,
};
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use typometer::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{self, CrosstermEventSource, FixedTicker, Runner, TypingEvent},
    timer::TICK_RATE_MS,
    word_generator::{FixedTextProvider, TextProvider, WordListProvider},
    Applied, Difficulty, ModeKind, SessionConfig, TestResult, TypingTest,
};

/// terminal typing speed test with live wpm and accuracy
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing test. Type the generated words against the clock or for a fixed word count and get WPM, accuracy and error counts as you go."
)]
pub struct Cli {
    /// word list to draw the text from
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// end the test after a time limit or after a number of words
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ModeKind>,

    /// number of seconds in time mode
    #[clap(short = 's', long)]
    time_limit: Option<u64>,

    /// number of words in words mode
    #[clap(short = 'w', long)]
    word_count: Option<usize>,

    /// custom prompt to type instead of generated words
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// print the last finished result as json on exit
    #[clap(long)]
    json: bool,

    /// do not remember these settings for the next run
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// Layers the flags that were given over the stored settings.
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(secs) = self.time_limit {
            cfg.time_limit_secs = secs;
        }
        if let Some(count) = self.word_count {
            cfg.word_count = count;
        }
        cfg
    }

    fn text_provider(&self) -> Box<dyn TextProvider> {
        match &self.prompt {
            Some(prompt) => Box::new(FixedTextProvider::new(prompt.clone())),
            None => Box::new(WordListProvider),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

/// What the event loop should do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Redraw,
    Idle,
    Quit,
}

pub struct App {
    pub test: TypingTest,
    pub state: AppState,
    provider: Box<dyn TextProvider>,
}

impl App {
    pub fn new(session: SessionConfig, provider: Box<dyn TextProvider>) -> Result<Self> {
        let text = provider
            .generate(session.difficulty, session.words_to_generate())
            .context("generating test text")?;
        let mut test = TypingTest::with_system_clock(&text, session)?;
        test.on_complete(|result: &TestResult| {
            debug!(
                target: "runtime",
                difficulty = %result.difficulty,
                mode = ?result.mode,
                secs = result.stats.time_taken_secs,
                "attempt complete"
            );
        });

        Ok(Self {
            test,
            state: AppState::Typing,
            provider,
        })
    }

    /// Same text, fresh attempt.
    pub fn restart(&mut self) {
        self.test.restart();
        self.state = AppState::Typing;
    }

    pub fn new_text(&mut self) -> Result<()> {
        let session = *self.test.config();
        let text = self
            .provider
            .generate(session.difficulty, session.words_to_generate())
            .context("generating test text")?;
        self.test.new_test(&text)?;
        self.state = AppState::Typing;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Control> {
        if key.kind == KeyEventKind::Release {
            return Ok(Control::Idle);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Ok(Control::Quit),
            KeyCode::Char('c') if ctrl => return Ok(Control::Quit),
            KeyCode::Tab => {
                self.restart();
                return Ok(Control::Redraw);
            }
            KeyCode::Char('n') if ctrl => {
                self.new_text()?;
                return Ok(Control::Redraw);
            }
            _ => {}
        }

        match self.state {
            AppState::Typing => {
                let Some(input) = runtime::key_input(&key) else {
                    return Ok(Control::Idle);
                };
                let applied = self.test.apply_key(input);
                Ok(self.after_engine(applied))
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => {
                    self.restart();
                    Ok(Control::Redraw)
                }
                KeyCode::Char('n') => {
                    self.new_text()?;
                    Ok(Control::Redraw)
                }
                KeyCode::Char('q') => Ok(Control::Quit),
                _ => Ok(Control::Idle),
            },
        }
    }

    pub fn handle_paste(&mut self, pasted: &str) -> Control {
        if self.state != AppState::Typing {
            return Control::Idle;
        }
        let value = self.test.input() + pasted;
        let applied = self.test.apply_full_replace(&value);
        self.after_engine(applied)
    }

    /// Lets the engine's periodic tasks catch up with the wall clock.
    pub fn on_tick(&mut self) -> Control {
        let applied = self.test.poll_timers();
        self.after_engine(applied)
    }

    fn after_engine(&mut self, applied: Applied) -> Control {
        match applied {
            Applied::Ignored => Control::Idle,
            Applied::Updated => Control::Redraw,
            Applied::Completed => {
                debug!(target: "runtime", "switching to results");
                self.state = AppState::Results;
                Control::Redraw
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = configure_logging();

    let store = FileConfigStore::new();
    let cfg = cli.apply_to(store.load());
    let session = cfg.session_config()?;
    if !cli.no_save {
        if let Err(e) = store.save(&cfg) {
            warn!(target: "config", path = %store.path().display(), error = %e, "could not save settings");
        }
    }

    let mut app = App::new(session, cli.text_provider())?;

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    outcome?;

    if cli.json {
        if let Some(result) = app.test.result() {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }

    Ok(())
}

/// File logging in the state dir; the terminal belongs to the UI.
fn configure_logging() -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir();
    std::fs::create_dir_all(&dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&dir, "typometer.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        let control = match runner.step() {
            TypingEvent::Tick => Control::Idle,
            TypingEvent::Resize => Control::Redraw,
            TypingEvent::Paste(text) => app.handle_paste(&text),
            TypingEvent::Key(key) => app.handle_key(key)?,
        };
        if control == Control::Quit {
            break;
        }

        // keystrokes can keep the channel busy, so timers are polled every pass
        let ticked = app.on_tick();
        if control == Control::Redraw || ticked == Control::Redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::Parser;
    use typometer::{Lifecycle, TestMode};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn words_app(prompt: &str) -> App {
        let session = SessionConfig::words(Difficulty::Easy, 2).unwrap();
        App::new(session, Box::new(FixedTextProvider::new(prompt))).unwrap()
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typometer"]);

        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.mode, None);
        assert_eq!(cli.time_limit, None);
        assert_eq!(cli.word_count, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.json);
        assert!(!cli.no_save);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "typometer",
            "-d",
            "expert",
            "--mode",
            "words",
            "-w",
            "50",
            "--time-limit",
            "30",
            "--json",
            "--no-save",
        ]);

        assert_eq!(cli.difficulty, Some(Difficulty::Expert));
        assert_eq!(cli.mode, Some(ModeKind::Words));
        assert_eq!(cli.word_count, Some(50));
        assert_eq!(cli.time_limit, Some(30));
        assert!(cli.json);
        assert!(cli.no_save);
    }

    #[test]
    fn test_cli_rejects_unknown_difficulty() {
        assert!(Cli::try_parse_from(["typometer", "-d", "insane"]).is_err());
    }

    #[test]
    fn test_cli_overrides_stored_config() {
        let stored = Config {
            difficulty: Difficulty::Hard,
            mode: ModeKind::Words,
            time_limit_secs: 15,
            word_count: 10,
        };
        let cli = Cli::parse_from(["typometer", "--mode", "time", "-s", "120"]);
        let cfg = cli.apply_to(stored);

        assert_eq!(cfg.difficulty, Difficulty::Hard);
        assert_eq!(cfg.mode, ModeKind::Time);
        assert_eq!(cfg.time_limit_secs, 120);
        assert_eq!(cfg.word_count, 10);
        assert_eq!(
            cfg.session_config().unwrap().mode,
            TestMode::Timed { limit_secs: 120 }
        );
    }

    #[test]
    fn test_cli_prompt_provider() {
        let cli = Cli::parse_from(["typometer", "-p", "hello world"]);
        let text = cli.text_provider().generate(Difficulty::Easy, 99).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_app_new_uses_provider_text() {
        let app = words_app("hi there");
        assert_eq!(app.test.reference(), "hi there");
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.test.lifecycle(), Lifecycle::NotStarted);
    }

    #[test]
    fn test_app_new_rejects_empty_prompt() {
        let session = SessionConfig::words(Difficulty::Easy, 1).unwrap();
        assert!(App::new(session, Box::new(FixedTextProvider::new(""))).is_err());
    }

    #[test]
    fn test_typing_to_the_end_shows_results() {
        let mut app = words_app("hi");
        type_str(&mut app, "h");
        assert_eq!(app.state, AppState::Typing);
        assert!(app.test.has_started());

        type_str(&mut app, "i");
        assert_eq!(app.state, AppState::Results);
        assert!(app.test.has_finished());
        assert!(app.test.result().is_some());
    }

    #[test]
    fn test_results_keys() {
        let mut app = words_app("ab");
        type_str(&mut app, "ab");
        assert_eq!(app.state, AppState::Results);

        // typing keys do nothing on the results screen
        assert_matches!(app.handle_key(key(KeyCode::Char('x'))), Ok(Control::Idle));

        assert_matches!(app.handle_key(key(KeyCode::Char('r'))), Ok(Control::Redraw));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.test.lifecycle(), Lifecycle::NotStarted);
        assert_eq!(app.test.reference(), "ab");

        type_str(&mut app, "ab");
        assert_matches!(app.handle_key(key(KeyCode::Char('n'))), Ok(Control::Redraw));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.test.input_len(), 0);

        type_str(&mut app, "ab");
        assert_matches!(app.handle_key(key(KeyCode::Char('q'))), Ok(Control::Quit));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = words_app("hello");
        assert_matches!(app.handle_key(key(KeyCode::Esc)), Ok(Control::Quit));
        assert_matches!(app.handle_key(ctrl('c')), Ok(Control::Quit));
        // a plain 'q' is just a typo while typing
        assert_matches!(app.handle_key(key(KeyCode::Char('q'))), Ok(Control::Redraw));
    }

    #[test]
    fn test_tab_restarts_mid_test() {
        let mut app = words_app("hello");
        type_str(&mut app, "hel");
        assert_eq!(app.test.input_len(), 3);

        assert_matches!(app.handle_key(key(KeyCode::Tab)), Ok(Control::Redraw));
        assert_eq!(app.test.input_len(), 0);
        assert_eq!(app.test.lifecycle(), Lifecycle::NotStarted);
        assert_eq!(app.test.reference(), "hello");
    }

    #[test]
    fn test_ctrl_n_is_not_typed() {
        let mut app = words_app("hello");
        type_str(&mut app, "he");
        assert_matches!(app.handle_key(ctrl('n')), Ok(Control::Redraw));
        assert_eq!(app.test.input_len(), 0);
        assert!(!app.test.has_started());
    }

    #[test]
    fn test_release_and_navigation_keys_are_idle() {
        let mut app = words_app("hello");
        let mut release = key(KeyCode::Char('h'));
        release.kind = KeyEventKind::Release;
        assert_matches!(app.handle_key(release), Ok(Control::Idle));
        assert_matches!(app.handle_key(key(KeyCode::Left)), Ok(Control::Idle));
        assert_eq!(app.test.input_len(), 0);
    }

    #[test]
    fn test_backspace_on_empty_does_not_start() {
        let mut app = words_app("hello");
        assert_matches!(app.handle_key(key(KeyCode::Backspace)), Ok(Control::Idle));
        assert!(!app.test.has_started());
    }

    #[test]
    fn test_paste_appends_to_input() {
        let mut app = words_app("hello world");
        type_str(&mut app, "he");
        assert_eq!(app.handle_paste("llo "), Control::Redraw);
        assert_eq!(app.test.input(), "hello ");
        assert_eq!(app.test.current_word_index(), 1);

        assert_eq!(app.handle_paste("world"), Control::Redraw);
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.handle_paste("more"), Control::Idle);
        assert_eq!(app.test.input(), "hello world");
    }

    #[test]
    fn test_paste_with_trailing_newline() {
        let mut app = words_app("ab cd");
        assert_eq!(app.handle_paste("ab c\n"), Control::Redraw);
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.test.input(), "ab c");
        assert_eq!(app.test.query_stats().errors, 0);
    }

    #[test]
    fn test_tick_before_start_is_idle() {
        let mut app = words_app("hello");
        assert_eq!(app.on_tick(), Control::Idle);
    }
}
