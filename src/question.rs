use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::QuizError,
    shuffle::{sample, shuffle},
    words::{WordEntry, WordPool},
};

/// Which side of a word is shown and which side is answered
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
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// english prompt, turkish answer
    #[default]
    Normal,
    /// turkish prompt, english answer
    Reverse,
}

impl Direction {
    pub fn badge(&self) -> &'static str {
        match self {
            Direction::Normal => "EN→TR",
            Direction::Reverse => "TR→EN",
        }
    }
}

/// A word as asked in one session
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
    Normal(WordEntry),
    /// `options` holds the entry's own english plus three other english words
    Reverse {
        entry: WordEntry,
        options: [String; 4],
    },
}

impl Question {
    pub fn entry(&self) -> &WordEntry {
        match self {
            Question::Normal(entry) | Question::Reverse { entry, .. } => entry,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Question::Normal(_) => Direction::Normal,
            Question::Reverse { .. } => Direction::Reverse,
        }
    }

    /// Term displayed to the player
    pub fn prompt(&self) -> &str {
        match self {
            Question::Normal(entry) => &entry.english,
            Question::Reverse { entry, .. } => &entry.turkish,
        }
    }

    pub fn correct_answer(&self) -> &str {
        match self {
            Question::Normal(entry) => &entry.turkish,
            Question::Reverse { entry, .. } => &entry.english,
        }
    }

    pub fn options(&self) -> &[String; 4] {
        match self {
            Question::Normal(entry) => &entry.options,
            Question::Reverse { options, .. } => options,
        }
    }

    pub fn is_correct(&self, option: &str) -> bool {
        option == self.correct_answer()
    }

    /// Options in a fresh random order. Each call may reorder; membership never changes.
    pub fn display_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        shuffle(self.options(), rng)
    }
}

/// Samples `count` distinct entries from the pool
pub fn build_questions<R: Rng + ?Sized>(
    pool: &WordPool,
    count: usize,
    rng: &mut R,
) -> Result<Vec<WordEntry>, QuizError> {
    sample(pool.entries(), count, rng)
}

/// Builds reverse-direction questions: three english distractors drawn from
/// the rest of the pool, shuffled together with the correct english word.
pub fn attach_reverse_options<R: Rng + ?Sized>(
    entries: Vec<WordEntry>,
    pool: &WordPool,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    entries
        .into_iter()
        .map(|entry| {
            let others: Vec<&str> = pool
                .entries()
                .iter()
                .filter(|w| w.english != entry.english)
                .map(|w| w.english.as_str())
                .collect();

            let distractors = sample(&others, 3, rng)?;
            let mut options = [
                entry.english.clone(),
                distractors[0].to_string(),
                distractors[1].to_string(),
                distractors[2].to_string(),
            ];
            rand::seq::SliceRandom::shuffle(&mut options[..], rng);

            Ok(Question::Reverse { entry, options })
        })
        .collect()
}

/// Turns sampled entries into questions for `direction`. Normal questions
/// keep their pre-baked options as-is.
pub fn prepare<R: Rng + ?Sized>(
    entries: Vec<WordEntry>,
    direction: Direction,
    pool: &WordPool,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    match direction {
        Direction::Normal => Ok(entries.into_iter().map(Question::Normal).collect()),
        Direction::Reverse => attach_reverse_options(entries, pool, rng),
    }
}
