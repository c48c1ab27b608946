use std::fmt;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::session::{SessionConfig, TestMode, TestResult};
use crate::stats::{self, TypingStats};
use crate::status::{self, CharStatus};
use crate::timer::{PeriodicTask, STATS_REFRESH_MS, TICK_RATE_MS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Lifecycle {
    NotStarted,
    Running,
    Finished,
}

/// A single keystroke as seen by the engine. A space is `Char(' ')`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
}

impl KeyInput {
    /// Maps a key name (`"Backspace"` or a single character) to an input.
    /// Any other payload (`"Shift"`, `"ArrowLeft"`, ...) yields `None`.
    pub fn parse(name: &str) -> Option<Self> {
        if name == "Backspace" {
            return Some(KeyInput::Backspace);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeyInput::Char(c)),
            _ => None,
        }
    }
}

/// What an operation did to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Rejected or a no-op; nothing changed.
    Ignored,
    Updated,
    /// This call moved the test into `Finished`.
    Completed,
}

type CompletionListener = Box<dyn FnMut(&TestResult)>;

/// One typing test attempt against a fixed reference text.
///
/// The engine owns the typed input, the per-character classification, the
/// lifecycle and the timers. Every input event re-derives the classification
/// from scratch; [`TypingTest::query_stats`] derives the statistics from that
/// classification and the recorded elapsed time without touching the clock.
pub struct TypingTest<C: Clock = SystemClock> {
    text: String,
    reference: Vec<char>,
    config: SessionConfig,
    clock: C,
    input: Vec<char>,
    statuses: Vec<CharStatus>,
    word_index: usize,
    lifecycle: Lifecycle,
    started_at: Option<Instant>,
    elapsed: Duration,
    live_stats: TypingStats,
    result: Option<TestResult>,
    clock_task: PeriodicTask,
    stats_task: PeriodicTask,
    on_complete: Option<CompletionListener>,
}

impl TypingTest<SystemClock> {
    pub fn with_system_clock(reference: &str, config: SessionConfig) -> Result<Self, ConfigError> {
        Self::new(reference, config, SystemClock)
    }
}

impl<C: Clock> TypingTest<C> {
    pub fn new(reference: &str, config: SessionConfig, clock: C) -> Result<Self, ConfigError> {
        let reference_chars = validate_reference(reference)?;
        let mut test = Self {
            text: reference.to_string(),
            reference: reference_chars,
            config,
            clock,
            input: Vec::new(),
            statuses: Vec::new(),
            word_index: 0,
            lifecycle: Lifecycle::NotStarted,
            started_at: None,
            elapsed: Duration::ZERO,
            live_stats: TypingStats::default(),
            result: None,
            clock_task: PeriodicTask::new("clock", Duration::from_millis(TICK_RATE_MS)),
            stats_task: PeriodicTask::new("stats", Duration::from_millis(STATS_REFRESH_MS)),
            on_complete: None,
        };
        test.reset();
        Ok(test)
    }

    /// Registers the listener fired once per attempt when the test finishes.
    pub fn on_complete(&mut self, listener: impl FnMut(&TestResult) + 'static) {
        self.on_complete = Some(Box::new(listener));
    }

    /// Installs a new reference text and configuration and resets the attempt.
    pub fn configure(&mut self, reference: &str, config: SessionConfig) -> Result<(), ConfigError> {
        let reference_chars = validate_reference(reference)?;
        self.cancel_timers();
        self.text = reference.to_string();
        self.reference = reference_chars;
        self.config = config;
        self.reset();
        debug!(target: "engine", mode = ?self.config.mode, len = self.reference.len(), "configured");
        Ok(())
    }

    pub fn apply_key(&mut self, key: KeyInput) -> Applied {
        if self.lifecycle == Lifecycle::Finished {
            trace!(target: "engine", ?key, "key rejected after finish");
            return Applied::Ignored;
        }

        match key {
            KeyInput::Char(c) if c.is_control() => {
                trace!(target: "engine", ?key, "control character ignored");
                return Applied::Ignored;
            }
            KeyInput::Char(c) => {
                self.begin_if_needed();
                self.input.push(c);
            }
            KeyInput::Backspace => {
                if self.input.is_empty() {
                    return Applied::Ignored;
                }
                self.begin_if_needed();
                self.input.pop();
            }
        }

        self.after_input()
    }

    /// Replaces the whole input buffer, as a paste or programmatic edit does.
    pub fn apply_full_replace(&mut self, value: &str) -> Applied {
        if self.lifecycle == Lifecycle::Finished {
            trace!(target: "engine", "replace rejected after finish");
            return Applied::Ignored;
        }
        // same rule as typed keys: control characters never reach the buffer
        let input: Vec<char> = value.chars().filter(|c| !c.is_control()).collect();
        if self.lifecycle == Lifecycle::NotStarted && input.is_empty() {
            return Applied::Ignored;
        }

        self.begin_if_needed();
        self.input = input;
        self.after_input()
    }

    /// Re-reads the clock into the elapsed time and ends a timed test whose
    /// limit has been reached.
    pub fn tick(&mut self) -> Applied {
        if self.lifecycle != Lifecycle::Running {
            return Applied::Ignored;
        }

        self.elapsed = self.elapsed_since_start();
        match self.config.mode.time_limit() {
            Some(limit) if self.elapsed >= limit => {
                self.finish();
                Applied::Completed
            }
            _ => Applied::Updated,
        }
    }

    /// Runs whichever periodic task is due: the elapsed-time timer and the
    /// live stats refresh. Both are disarmed outside `Running`.
    pub fn poll_timers(&mut self) -> Applied {
        if self.lifecycle != Lifecycle::Running {
            return Applied::Ignored;
        }

        let now = self.clock.now();
        let mut applied = Applied::Ignored;

        if self.clock_task.poll(now) {
            applied = self.tick();
            if applied == Applied::Completed {
                return applied;
            }
        }

        if self.stats_task.poll(now) {
            self.live_stats = self.query_stats();
            applied = Applied::Updated;
        }

        applied
    }

    pub fn query_stats(&self) -> TypingStats {
        stats::compute(
            &self.statuses,
            self.input.len(),
            self.elapsed,
            self.reference.len(),
        )
    }

    /// Snapshot refreshed by the periodic stats task and at finish.
    pub fn live_stats(&self) -> &TypingStats {
        &self.live_stats
    }

    /// Starts the same text over.
    pub fn restart(&mut self) {
        self.cancel_timers();
        self.reset();
        debug!(target: "engine", "restart");
    }

    /// Starts over with a different text and the same configuration.
    pub fn new_test(&mut self, reference: &str) -> Result<(), ConfigError> {
        let config = self.config;
        self.configure(reference, config)
    }

    pub fn statuses(&self) -> &[CharStatus] {
        &self.statuses
    }

    pub fn current_word_index(&self) -> usize {
        self.word_index
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn has_started(&self) -> bool {
        self.lifecycle != Lifecycle::NotStarted
    }

    pub fn has_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Finished
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time left in a timed test; `None` in word mode.
    pub fn remaining(&self) -> Option<Duration> {
        self.config
            .mode
            .time_limit()
            .map(|limit| limit.saturating_sub(self.elapsed))
    }

    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn reference(&self) -> &str {
        &self.text
    }

    pub fn reference_len(&self) -> usize {
        self.reference.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    fn begin_if_needed(&mut self) {
        if self.lifecycle != Lifecycle::NotStarted {
            return;
        }
        let now = self.clock.now();
        self.started_at = Some(now);
        self.lifecycle = Lifecycle::Running;
        self.clock_task.arm(now);
        self.stats_task.arm(now);
        debug!(target: "engine", mode = ?self.config.mode, "started");
    }

    fn after_input(&mut self) -> Applied {
        self.statuses = status::classify(&self.reference, &self.input);
        self.word_index = status::current_word_index(&self.reference, self.input.len());
        trace!(
            target: "engine",
            typed = self.input.len(),
            word = self.word_index,
            "input applied"
        );

        if matches!(self.config.mode, TestMode::Words { .. })
            && self.input.len() >= self.reference.len()
        {
            self.finish();
            return Applied::Completed;
        }
        Applied::Updated
    }

    /// Moves `Running` into `Finished`. Any later call is a no-op.
    fn finish(&mut self) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        self.lifecycle = Lifecycle::Finished;
        self.cancel_timers();
        self.elapsed = self.elapsed_since_start();

        let stats = self.query_stats();
        self.live_stats = stats;
        let result = TestResult::new(stats, &self.config, Local::now());
        info!(
            target: "engine",
            wpm = stats.wpm,
            raw_wpm = stats.raw_wpm,
            accuracy = stats.accuracy,
            errors = stats.errors,
            "finished"
        );

        if let Some(listener) = self.on_complete.as_mut() {
            listener(&result);
        }
        self.result = Some(result);
    }

    fn cancel_timers(&mut self) {
        self.clock_task.cancel();
        self.stats_task.cancel();
    }

    fn reset(&mut self) {
        self.lifecycle = Lifecycle::NotStarted;
        self.input.clear();
        self.statuses = status::all_pending(&self.reference);
        self.word_index = 0;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.live_stats = TypingStats::empty(self.reference.len());
        self.result = None;
    }

    fn elapsed_since_start(&self) -> Duration {
        self.started_at
            .map(|start| self.clock.now().saturating_duration_since(start))
            .unwrap_or_default()
    }
}

impl<C: Clock> fmt::Debug for TypingTest<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingTest")
            .field("reference", &self.text)
            .field("config", &self.config)
            .field("input", &self.input())
            .field("lifecycle", &self.lifecycle)
            .field("elapsed", &self.elapsed)
            .field("word_index", &self.word_index)
            .finish_non_exhaustive()
    }
}

fn validate_reference(reference: &str) -> Result<Vec<char>, ConfigError> {
    if reference.is_empty() {
        return Err(ConfigError::EmptyReference);
    }
    Ok(reference.chars().collect())
}
