//! Core data model types for readex.
//!
//! Each pipeline stage (raw bank record → normalized passage → assembled exam
//! set → shuffled exam set) produces its own immutable value type. Stages copy
//! on transform; nothing mutates a record across a stage boundary, which is
//! what keeps the memoized shuffled view and grading consistent with what was
//! displayed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of choice slots per normalized question (letters A–D).
pub const CHOICE_SLOTS: usize = 4;

/// Display letter for a 0-based choice slot.
pub fn letter_for_slot(slot: usize) -> char {
    debug_assert!(slot < 26);
    (b'A' + slot as u8) as char
}

/// 0-based slot for a choice letter, restricted to the A–D range.
///
/// Accepts a single-letter string in either case; anything else is `None`.
pub fn slot_for_letter(letter: &str) -> Option<usize> {
    let trimmed = letter.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let upper = first.to_ascii_uppercase();
    if ('A'..='D').contains(&upper) {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// A passage after schema normalization: one stable shape regardless of which
/// historical bank format the record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPassage {
    pub id: String,
    pub title: String,
    pub content: String,
    pub questions: Vec<NormalizedQuestion>,
}

/// A question after schema normalization.
///
/// Invariants held by the normalizer: `choices` always has exactly
/// [`CHOICE_SLOTS`] entries (blank-filled when unrecoverable) and
/// `correct_index` is always in `[0, 3]` (defaulted to 0 with a recorded
/// warning when the source is missing or invalid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuestion {
    pub id: String,
    pub stem: String,
    pub choices: [String; CHOICE_SLOTS],
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Scoring policy selector for an assembled question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multi,
    Summary,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Single => write!(f, "single"),
            QuestionKind::Multi => write!(f, "multi"),
            QuestionKind::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(QuestionKind::Single),
            "multi" => Ok(QuestionKind::Multi),
            "summary" => Ok(QuestionKind::Summary),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// One displayed choice: letter in current display order plus its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub letter: char,
    pub text: String,
}

/// An answerable question inside an assembled exam set.
///
/// `correct` is always expressed in the current display order; the shuffle
/// engine re-derives it whenever the choice layout changes, so it is never
/// stale relative to `choices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub choices: Vec<Choice>,
    pub correct: Vec<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// 1-based position within the exam. Assigned once by the assembler and
    /// never overwritten afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// The fully assembled, answerable unit served to a learner for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSet {
    pub id: String,
    pub title: String,
    pub passage: String,
    pub questions: Vec<ExamQuestion>,
}

impl ExamSet {
    /// Look up a question by its sequence number.
    pub fn question_by_seq(&self, seq: u32) -> Option<&ExamQuestion> {
        self.questions.iter().find(|q| q.seq == Some(seq))
    }
}

/// Accumulated learner answers: question id → selected letters.
pub type AnswerMap = BTreeMap<String, Vec<char>>;
