use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::PoolError;

static WORDS_DIR: Dir = include_dir!("src/words");

const BUILTIN_FILE: &str = "words.json";

/// One vocabulary item. `options` holds the turkish answer plus three
/// pre-baked turkish distractors used by normal-direction questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordEntry {
    pub english: String,
    pub turkish: String,
    pub options: [String; 4],
}

/// The immutable list of words a quiz draws from
#[derive(Debug, Clone)]
pub struct WordPool {
    entries: Vec<WordEntry>,
}

impl WordPool {
    /// Pool compiled into the binary
    pub fn builtin() -> Result<Self, PoolError> {
        let file = WORDS_DIR
            .get_file(BUILTIN_FILE)
            .ok_or_else(|| PoolError::Missing(BUILTIN_FILE.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| PoolError::Parse("word list is not valid utf-8".to_string()))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, PoolError> {
        let entries: Vec<WordEntry> =
            serde_json::from_str(json).map_err(|e| PoolError::Parse(e.to_string()))?;
        Self::new(entries)
    }

    /// Validates that english words are unique and every entry's options
    /// contain its turkish answer exactly once.
    pub fn new(entries: Vec<WordEntry>) -> Result<Self, PoolError> {
        if entries.is_empty() {
            return Err(PoolError::Empty);
        }

        if let Some(dup) = entries.iter().map(|e| e.english.as_str()).duplicates().next() {
            return Err(PoolError::DuplicateEnglish(dup.to_string()));
        }

        for entry in &entries {
            let hits = entry
                .options
                .iter()
                .filter(|o| **o == entry.turkish)
                .count();
            if hits != 1 {
                return Err(PoolError::BadOptions {
                    english: entry.english.clone(),
                    turkish: entry.turkish.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, english: &str) -> Option<&WordEntry> {
        self.entries.iter().find(|e| e.english == english)
    }
}

#[cfg(test)]
pub(crate) fn entry(english: &str, turkish: &str) -> WordEntry {
    WordEntry {
        english: english.to_string(),
        turkish: turkish.to_string(),
        options: [
            turkish.to_string(),
            format!("{turkish}-a"),
            format!("{turkish}-b"),
            format!("{turkish}-c"),
        ],
    }
}
