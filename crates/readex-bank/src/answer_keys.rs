//! Optional correct-answer overrides loaded from a key file.
//!
//! Key files are hand-authored and spell question ids loosely ("20-7",
//! "20-07", "P20-Q07", ...). Every entry is indexed under all accepted
//! spellings so grading can look keys up by whichever id the bank uses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use readex_core::grade::CorrectAnswerOverride;

use crate::error::BankError;

static KEY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^p?(\d+)[-_]q?(\d+)$").unwrap());

#[derive(Debug, Deserialize)]
struct RawKeyEntry {
    id: String,
    answers: Value,
}

/// Correct answers keyed by question id, indexed under every spelling.
#[derive(Debug, Default)]
pub struct AnswerKey {
    entries: HashMap<String, Vec<char>>,
}

impl AnswerKey {
    pub fn load(path: &Path) -> Result<Self, BankError> {
        if !path.exists() {
            return Err(BankError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Vec<RawKeyEntry> =
            serde_json::from_str(&text).map_err(|source| BankError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = HashMap::new();
        for entry in raw {
            let letters = parse_letters(&entry.answers);
            if letters.is_empty() {
                tracing::warn!("answer key {}: no usable letters, skipped", entry.id);
                continue;
            }
            for spelling in spellings(&entry.id) {
                entries.insert(spelling, letters.clone());
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CorrectAnswerOverride for AnswerKey {
    fn lookup(&self, question_id: &str) -> Option<Vec<char>> {
        if let Some(found) = self.entries.get(question_id) {
            return Some(found.clone());
        }
        // Retry under the structured spellings of the asked-for id.
        for spelling in spellings(question_id) {
            if let Some(found) = self.entries.get(&spelling) {
                return Some(found.clone());
            }
        }
        None
    }
}

/// All accepted spellings of a structured question id. Unstructured ids get
/// only their literal form.
fn spellings(id: &str) -> Vec<String> {
    let trimmed = id.trim();
    let caps = match KEY_ID.captures(trimmed) {
        Some(caps) => caps,
        None => return vec![trimmed.to_string()],
    };
    let p: u32 = match caps[1].parse() {
        Ok(p) => p,
        Err(_) => return vec![trimmed.to_string()],
    };
    let q: u32 = match caps[2].parse() {
        Ok(q) => q,
        Err(_) => return vec![trimmed.to_string()],
    };
    vec![
        format!("{p}-{q}"),
        format!("{p}-{q:02}"),
        format!("P{p}-Q{q:02}"),
        format!("P{p}-Q{q}"),
    ]
}

/// Accepts `"B"`, `"BD"`, or `["B", "D"]` and yields uppercase letters.
fn parse_letters(value: &Value) -> Vec<char> {
    let mut letters = Vec::new();
    match value {
        Value::String(s) => collect_letters(s, &mut letters),
        Value::Array(items) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    collect_letters(s, &mut letters);
                }
            }
        }
        _ => {}
    }
    letters.sort_unstable();
    letters.dedup();
    letters
}

fn collect_letters(s: &str, out: &mut Vec<char>) {
    for ch in s.chars() {
        if ch.is_ascii_alphabetic() {
            out.push(ch.to_ascii_uppercase());
        }
    }
}
