//! Text analysis behind the `info-extractor` tool
//!
//! Counts characters, words and sentence terminators in a block of text and
//! estimates how long it takes to read.

use std::fmt;

use serde_json::{Map, Value};

use crate::errors::ToolError;

pub const WORDS_PER_MINUTE: u64 = 200;
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Validated arguments of an `info-extractor` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text: String,
}

impl AnalysisRequest {
    /// Fails with `MissingArgument` when `text` is absent or not a string.
    pub fn from_arguments(arguments: Option<&Map<String, Value>>) -> Result<Self, ToolError> {
        let text = arguments
            .and_then(|arguments| arguments.get("text"))
            .and_then(Value::as_str)
            .ok_or(ToolError::MissingArgument { argument: "text" })?;

        Ok(Self {
            text: text.to_string(),
        })
    }
}

/// Reading time in minutes, kept as whole hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ReadingMinutes {
    hundredths: u64,
}

impl ReadingMinutes {
    /// `word_count / 200` rounded to two decimals, halves away from zero.
    pub fn from_word_count(word_count: u64) -> Self {
        Self {
            hundredths: (word_count * 100).div_ceil(WORDS_PER_MINUTE),
        }
    }
}

impl fmt::Display for ReadingMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.hundredths / 100;
        let fraction = self.hundredths % 100;

        if fraction % 10 == 0 {
            write!(f, "{whole}.{}", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisResult {
    pub character_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub estimated_reading_minutes: ReadingMinutes,
}

impl AnalysisResult {
    pub fn report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Analysis Complete ---")?;
        writeln!(f, "Character Count: {}", self.character_count)?;
        writeln!(f, "Word Count: {}", self.word_count)?;
        writeln!(f, "Sentence Count: {}", self.sentence_count)?;
        write!(
            f,
            "Estimated Reading Time: {} minutes",
            self.estimated_reading_minutes
        )
    }
}

pub fn analyze(text: &str) -> AnalysisResult {
    let character_count = text.chars().count();
    let word_count = text.split_whitespace().count();
    let sentence_count = SENTENCE_TERMINATORS
        .iter()
        .map(|terminator| text.matches(*terminator).count())
        .sum();

    AnalysisResult {
        character_count,
        word_count,
        sentence_count,
        estimated_reading_minutes: ReadingMinutes::from_word_count(word_count as u64),
    }
}
