use thiserror::Error;

/// Invalid configuration handed to the engine or the text provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("reference text must contain at least one character")]
    EmptyReference,
    #[error("timed mode requires a time limit")]
    MissingTimeLimit,
    #[error("word mode requires a word count")]
    MissingWordCount,
    #[error("time limit must be greater than zero")]
    ZeroTimeLimit,
    #[error("word count must be greater than zero")]
    ZeroWordCount,
    #[error("no embedded word list named `{0}`")]
    UnknownWordList(String),
    #[error("word list `{name}` is malformed: {reason}")]
    MalformedWordList { name: String, reason: String },
}
