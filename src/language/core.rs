use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::error::ConfigError;
use crate::session::Difficulty;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// A difficulty-tagged vocabulary embedded in the binary.
#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    pub fn for_difficulty(difficulty: Difficulty) -> Result<Self, ConfigError> {
        read_language_from_file(&format!("{difficulty}.json"))
    }
}

fn read_language_from_file(file_name: &str) -> Result<Language, ConfigError> {
    let name = file_name.trim_end_matches(".json").to_string();
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| ConfigError::UnknownWordList(name.clone()))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| ConfigError::MalformedWordList {
            name: name.clone(),
            reason: "not valid utf-8".to_string(),
        })?;

    let lang: Language = from_str(file_as_str).map_err(|e| ConfigError::MalformedWordList {
        name: name.clone(),
        reason: e.to_string(),
    })?;

    // Word boundaries are single spaces, so a word may not contain one.
    if lang.words.is_empty() || lang.words.iter().any(|w| w.is_empty() || w.contains(' ')) {
        return Err(ConfigError::MalformedWordList {
            name,
            reason: "words must be non-empty and contain no spaces".to_string(),
        });
    }

    Ok(lang)
}
