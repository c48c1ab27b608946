use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::session::{Difficulty, ModeKind, SessionConfig, TestMode};

pub const TIME_LIMIT_PRESETS: [u64; 4] = [15, 30, 60, 120];
pub const WORD_COUNT_PRESETS: [usize; 4] = [10, 25, 50, 100];

/// User settings remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub mode: ModeKind,
    pub time_limit_secs: u64,
    pub word_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            mode: ModeKind::Time,
            time_limit_secs: 60,
            word_count: 25,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        SessionConfig::new(
            self.difficulty,
            self.mode,
            Some(self.time_limit_secs),
            Some(self.word_count),
        )
    }
}

impl From<&SessionConfig> for Config {
    /// Keeps the defaults for whichever bound the session does not use.
    fn from(session: &SessionConfig) -> Self {
        let mut cfg = Config {
            difficulty: session.difficulty,
            mode: session.mode.kind(),
            ..Config::default()
        };
        match session.mode {
            TestMode::Timed { limit_secs } => cfg.time_limit_secs = limit_secs,
            TestMode::Words { count } => cfg.word_count = count,
        }
        cfg
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(target: "config", path = %self.path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
