use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::ConfigError;
use crate::language::Language;
use crate::session::Difficulty;

/// Produces the reference text for a test.
pub trait TextProvider {
    /// Returns `word_count` words joined by single spaces.
    fn generate(&self, difficulty: Difficulty, word_count: usize) -> Result<String, ConfigError>;
}

/// Draws words uniformly, with repetition, from the embedded word lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordListProvider;

impl WordListProvider {
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        difficulty: Difficulty,
        word_count: usize,
    ) -> Result<String, ConfigError> {
        if word_count == 0 {
            return Err(ConfigError::ZeroWordCount);
        }
        let language = Language::for_difficulty(difficulty)?;

        let text = (0..word_count)
            .filter_map(|_| language.words.choose(&mut *rng))
            .join(" ");

        debug!(target: "text", %difficulty, word_count, len = text.len(), "generated text");
        Ok(text)
    }
}

impl TextProvider for WordListProvider {
    fn generate(&self, difficulty: Difficulty, word_count: usize) -> Result<String, ConfigError> {
        self.generate_with(&mut rand::thread_rng(), difficulty, word_count)
    }
}

/// Always hands out the same text, whatever is asked for.
#[derive(Debug, Clone)]
pub struct FixedTextProvider {
    prompt: String,
}

impl FixedTextProvider {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl TextProvider for FixedTextProvider {
    fn generate(&self, _difficulty: Difficulty, _word_count: usize) -> Result<String, ConfigError> {
        if self.prompt.is_empty() {
            return Err(ConfigError::EmptyReference);
        }
        Ok(self.prompt.clone())
    }
}
