use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharState {
    Pending,
    Correct,
    Incorrect,
    /// Typed past the end of the reference text.
    Extra,
}

/// One rendered position. For `Extra` entries `ch` is the typed character,
/// otherwise it is the reference character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharStatus {
    pub ch: char,
    pub state: CharState,
}

impl CharStatus {
    pub fn pending(ch: char) -> Self {
        Self {
            ch,
            state: CharState::Pending,
        }
    }
}

pub fn all_pending(reference: &[char]) -> Vec<CharStatus> {
    reference.iter().copied().map(CharStatus::pending).collect()
}

/// Classifies the whole input against the reference, position by position.
///
/// The result always has `reference.len()` non-extra entries, followed by one
/// `Extra` entry per character typed beyond the reference.
pub fn classify(reference: &[char], input: &[char]) -> Vec<CharStatus> {
    let mut statuses = Vec::with_capacity(reference.len().max(input.len()));

    for (idx, &expected) in reference.iter().enumerate() {
        let state = match input.get(idx) {
            Some(&typed) if typed == expected => CharState::Correct,
            Some(_) => CharState::Incorrect,
            None => CharState::Pending,
        };
        statuses.push(CharStatus { ch: expected, state });
    }

    statuses.extend(input.iter().skip(reference.len()).map(|&ch| CharStatus {
        ch,
        state: CharState::Extra,
    }));

    statuses
}

/// Index of the space-delimited word that contains the first position not yet
/// typed. Once the input has run past the last word boundary the last word
/// stays current.
pub fn current_word_index(reference: &[char], typed_len: usize) -> usize {
    let mut boundary = 0;
    let mut last = 0;
    for (idx, word) in reference.split(|&c| c == ' ').enumerate() {
        boundary += word.len() + 1;
        if typed_len < boundary {
            return idx;
        }
        last = idx;
    }
    last
}
