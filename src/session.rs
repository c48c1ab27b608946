use std::time::Duration;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stats::TypingStats;

/// Word lists are tagged with one of these.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];
}

/// Which bound ends the test. Used where the limit itself lives elsewhere
/// (CLI flags, the persisted config).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Time,
    Words,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestMode {
    /// Ends once the elapsed time reaches the limit.
    Timed { limit_secs: u64 },
    /// Ends once the typed input is as long as the reference text.
    Words { count: usize },
}

impl TestMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            TestMode::Timed { .. } => ModeKind::Time,
            TestMode::Words { .. } => ModeKind::Words,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        match self {
            TestMode::Timed { limit_secs } => Some(Duration::from_secs(*limit_secs)),
            TestMode::Words { .. } => None,
        }
    }
}

/// Minimum number of words generated for a timed test.
pub const MIN_TIMED_WORDS: usize = 50;
/// Words generated per second of a timed test (a 240 wpm ceiling).
pub const TIMED_WORDS_PER_SEC: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub mode: TestMode,
}

impl SessionConfig {
    /// Builds a validated configuration. The time limit is required iff the
    /// mode is timed and the word count iff it is word based; the other value
    /// is ignored.
    pub fn new(
        difficulty: Difficulty,
        kind: ModeKind,
        time_limit_secs: Option<u64>,
        word_count: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let mode = match kind {
            ModeKind::Time => match time_limit_secs {
                None => return Err(ConfigError::MissingTimeLimit),
                Some(0) => return Err(ConfigError::ZeroTimeLimit),
                Some(limit_secs) => TestMode::Timed { limit_secs },
            },
            ModeKind::Words => match word_count {
                None => return Err(ConfigError::MissingWordCount),
                Some(0) => return Err(ConfigError::ZeroWordCount),
                Some(count) => TestMode::Words { count },
            },
        };
        Ok(Self { difficulty, mode })
    }

    pub fn timed(difficulty: Difficulty, limit_secs: u64) -> Result<Self, ConfigError> {
        Self::new(difficulty, ModeKind::Time, Some(limit_secs), None)
    }

    pub fn words(difficulty: Difficulty, count: usize) -> Result<Self, ConfigError> {
        Self::new(difficulty, ModeKind::Words, None, Some(count))
    }

    /// How many words the text provider should produce for this session.
    pub fn words_to_generate(&self) -> usize {
        match self.mode {
            TestMode::Words { count } => count,
            TestMode::Timed { limit_secs } => {
                (limit_secs as usize * TIMED_WORDS_PER_SEC).max(MIN_TIMED_WORDS)
            }
        }
    }
}

/// Final statistics of one attempt together with the configuration that
/// produced them. Created once, when the test finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(flatten)]
    pub stats: TypingStats,
    pub difficulty: Difficulty,
    pub mode: TestMode,
    pub completed_at: DateTime<Local>,
}

impl TestResult {
    pub fn new(stats: TypingStats, config: &SessionConfig, completed_at: DateTime<Local>) -> Self {
        Self {
            stats,
            difficulty: config.difficulty,
            mode: config.mode,
            completed_at,
        }
    }
}
