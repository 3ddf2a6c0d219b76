//! Attempt state: one candidate's run through an exam set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use readex_core::grade::ExamResult;
use readex_core::model::{AnswerMap, ExamSet};

/// Whether the attempt covers the whole exam or one practiced question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttemptMode {
    #[default]
    Full,
    Single,
}

impl AttemptMode {
    /// Parse loosely: anything unrecognized falls back to `Full`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for AttemptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptMode::Full => write!(f, "full"),
            AttemptMode::Single => write!(f, "single"),
        }
    }
}

impl FromStr for AttemptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(AttemptMode::Full),
            "single" => Ok(AttemptMode::Single),
            other => Err(format!("unknown attempt mode: {other}")),
        }
    }
}

/// A single in-flight or finished exam attempt.
///
/// `raw_exam_set` is fixed at creation; the shuffled view is derived from it
/// and `shuffle_seed` on first access and memoized in `shuffled`, so the
/// candidate sees one stable choice order for the attempt's whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub minutes: u32,
    pub started_at: DateTime<Utc>,
    pub submitted: bool,
    pub timed_out: bool,
    pub mode: AttemptMode,
    /// 1-based practiced question for single mode, clamped to 1..=9.
    pub single_index: u32,
    pub shuffle_seed: u64,
    pub raw_exam_set: ExamSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffled: Option<ExamSet>,
    pub answers: AnswerMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
    pub warnings: Vec<String>,
}

impl Attempt {
    /// Total allotted time.
    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.minutes) * 60
    }
}
