// Library surface for the binary and for headless/integration tests.
// Keep terminal rendering out of here; it lives with the binary in main.rs/ui.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod status;
pub mod timer;
pub mod word_generator;

pub use engine::{Applied, KeyInput, Lifecycle, TypingTest};
pub use error::ConfigError;
pub use session::{Difficulty, ModeKind, SessionConfig, TestMode, TestResult};
pub use stats::TypingStats;
pub use status::{CharState, CharStatus};
