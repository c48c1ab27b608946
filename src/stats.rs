use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::status::{CharState, CharStatus};

/// Elapsed times below this are treated as this value when deriving rates, so
/// the first keystrokes cannot produce absurd or infinite speeds.
pub const MIN_ELAPSED_SECS: f64 = 0.5;

/// The conventional typing-speed word: five characters.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Snapshot of the derived statistics of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TypingStats {
    pub wpm: u32,
    pub raw_wpm: u32,
    /// Percentage with two decimals.
    pub accuracy: f64,
    pub errors: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    /// Length of the reference text, not of the input.
    pub total_chars: usize,
    pub time_taken_secs: u64,
}

impl TypingStats {
    /// Stats of an attempt where nothing has been typed yet.
    pub fn empty(total_chars: usize) -> Self {
        Self {
            total_chars,
            ..Self::default()
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Words per minute for `chars` characters over `elapsed_secs`, with the
/// elapsed time floored at [`MIN_ELAPSED_SECS`].
pub fn words_per_minute(chars: usize, elapsed_secs: f64) -> u32 {
    let minutes = elapsed_secs.max(MIN_ELAPSED_SECS) / 60.0;
    (chars as f64 / CHARS_PER_WORD / minutes).round() as u32
}

/// Derives the statistics from the classified positions, the typed length,
/// the recorded elapsed time and the reference length.
pub fn compute(
    statuses: &[CharStatus],
    typed_len: usize,
    elapsed: Duration,
    reference_len: usize,
) -> TypingStats {
    let (correct_chars, mismatched) = statuses.iter().take(typed_len).fold(
        (0usize, 0usize),
        |(correct, incorrect), status| match status.state {
            CharState::Correct => (correct + 1, incorrect),
            CharState::Incorrect => (correct, incorrect + 1),
            CharState::Pending | CharState::Extra => (correct, incorrect),
        },
    );
    let incorrect_chars = mismatched + typed_len.saturating_sub(reference_len);

    let accuracy = if typed_len == 0 {
        0.0
    } else {
        round2(100.0 * correct_chars as f64 / typed_len as f64)
    };

    let elapsed_secs = elapsed.as_secs_f64();

    TypingStats {
        wpm: words_per_minute(correct_chars, elapsed_secs),
        raw_wpm: words_per_minute(typed_len, elapsed_secs),
        accuracy,
        errors: incorrect_chars,
        correct_chars,
        incorrect_chars,
        total_chars: reference_len,
        time_taken_secs: elapsed_secs.round() as u64,
    }
}

/// Coarse verdict shown with a finished result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PerformanceRating {
    #[strum(to_string = "Outstanding!")]
    Outstanding,
    #[strum(to_string = "Excellent!")]
    Excellent,
    #[strum(to_string = "Good!")]
    Good,
    #[strum(to_string = "Keep Practicing!")]
    KeepPracticing,
    #[strum(to_string = "Keep Going!")]
    KeepGoing,
}

impl PerformanceRating {
    pub fn for_stats(stats: &TypingStats) -> Self {
        let (wpm, acc) = (stats.wpm, stats.accuracy);
        if wpm >= 80 && acc >= 95.0 {
            PerformanceRating::Outstanding
        } else if wpm >= 60 && acc >= 90.0 {
            PerformanceRating::Excellent
        } else if wpm >= 40 && acc >= 85.0 {
            PerformanceRating::Good
        } else if wpm >= 25 && acc >= 80.0 {
            PerformanceRating::KeepPracticing
        } else {
            PerformanceRating::KeepGoing
        }
    }
}
