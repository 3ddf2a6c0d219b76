//! Schema normalizer: converts heterogeneous raw passage records into the
//! stable internal representation.
//!
//! The bank has accumulated several historical record shapes. Normalization is
//! deliberately "fail open, warn": a malformed question never aborts its
//! passage — unrecoverable choices become blanks and an unrecoverable correct
//! answer defaults to slot 0, each with a warning keyed by question id, so one
//! bad record cannot take down an entire exam.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::model::{
    letter_for_slot, slot_for_letter, NormalizedPassage, NormalizedQuestion, CHOICE_SLOTS,
};

/// Question type tag for sentence-insertion questions.
pub const INSERT_SENTENCE: &str = "insert_sentence";

/// The closed set of recognized choice shapes, tried in declaration order:
/// plain text list, label/text objects, `[label, text]` pairs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChoices {
    Texts(Vec<String>),
    Labelled(Vec<RawLabelledChoice>),
    Pairs(Vec<(String, String)>),
}

#[derive(Debug, Deserialize)]
struct RawLabelledChoice {
    #[serde(default)]
    label: String,
    #[serde(default)]
    text: String,
}

/// Loose view of one raw question record. Fields that vary in type across
/// bank generations stay as `Value` and are coerced during normalization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    id: Option<Value>,
    number: Option<i64>,
    stem: Option<Value>,
    prompt: Option<Value>,
    question_type: Option<String>,
    sentence: Option<String>,
    paragraph_label: Option<String>,
    paragraph_text: Option<String>,
    options: Option<Value>,
    choices: Option<Value>,
    correct_index: Option<Value>,
    correct: Option<Value>,
    explanation: Option<String>,
    meta: Option<BTreeMap<String, Value>>,
}

/// Stringify a loose JSON scalar the way the bank formats expect: strings are
/// trimmed, everything else rendered compactly, null/absent becomes "".
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn pick_first<'a>(
    obj: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

/// Resolve raw choice data into the fixed 4-slot array addressed by letter.
///
/// Unrecognized shapes produce four blanks plus a warning; a recognized shape
/// whose letters resolve to nothing (all slots blank) is treated the same.
pub fn normalize_choices(raw: Option<&Value>, warnings: &mut Vec<String>, qid: &str) -> [String; CHOICE_SLOTS] {
    let mut out: [String; CHOICE_SLOTS] = Default::default();

    if let Some(value) = raw {
        if let Ok(shape) = RawChoices::deserialize(value) {
            match shape {
                RawChoices::Texts(texts) if texts.len() == CHOICE_SLOTS => {
                    for (slot, text) in out.iter_mut().zip(texts) {
                        *slot = text.trim().to_string();
                    }
                    return out;
                }
                RawChoices::Labelled(items) if items.len() == CHOICE_SLOTS => {
                    for item in items {
                        if let Some(slot) = slot_for_letter(&item.label) {
                            out[slot] = item.text.trim().to_string();
                        }
                    }
                    if out.iter().any(|t| !t.is_empty()) {
                        return out;
                    }
                }
                RawChoices::Pairs(pairs) if pairs.len() == CHOICE_SLOTS => {
                    for (label, text) in pairs {
                        if let Some(slot) = slot_for_letter(&label) {
                            out[slot] = text.trim().to_string();
                        }
                    }
                    if out.iter().any(|t| !t.is_empty()) {
                        return out;
                    }
                }
                _ => {}
            }
        }
    }

    warnings.push(format!("{qid}: choices format not recognized; filled with blanks."));
    Default::default()
}

/// Resolve the correct answer to a slot index in `[0, 3]`.
///
/// Tried in order: integer `correct_index`, `correct` as a single letter,
/// `correct` as a letter list (first element). Defaults to 0 with a warning.
fn normalize_correct_index(q: &RawQuestion, warnings: &mut Vec<String>, qid: &str) -> usize {
    if let Some(ci) = q.correct_index.as_ref().and_then(Value::as_i64) {
        if (0..CHOICE_SLOTS as i64).contains(&ci) {
            return ci as usize;
        }
    }

    match q.correct.as_ref() {
        Some(Value::String(s)) => {
            if let Some(slot) = slot_for_letter(s) {
                return slot;
            }
        }
        Some(Value::Array(items)) => {
            if let Some(first) = items.first() {
                if let Some(slot) = slot_for_letter(&text_of(Some(first))) {
                    return slot;
                }
            }
        }
        _ => {}
    }

    warnings.push(format!("{qid}: missing/invalid correct answer; defaulted to A."));
    0
}

fn insert_sentence_stem(sentence: &str) -> String {
    format!(
        "Look at the four squares [A], [B], [C], [D] that indicate where the following sentence could be added.\n\
         Sentence: {sentence}\n\
         Where would the sentence best fit?"
    )
}

fn default_insert_choices() -> [String; CHOICE_SLOTS] {
    let mut out: [String; CHOICE_SLOTS] = Default::default();
    for (slot, text) in out.iter_mut().enumerate() {
        *text = format!("Insert at [{}]", letter_for_slot(slot));
    }
    out
}

fn normalize_question(
    raw: &Value,
    pid: &str,
    index: usize,
    warnings: &mut Vec<String>,
) -> Option<NormalizedQuestion> {
    let q: RawQuestion = match serde_json::from_value(raw.clone()) {
        Ok(q) => q,
        Err(_) => {
            let label = if pid.is_empty() { "unknown" } else { pid };
            warnings.push(format!("passage {label}: question[{index}] not an object; skipped."));
            return None;
        }
    };

    let mut qid = text_of(q.id.as_ref());
    if qid.is_empty() {
        qid = match q.number {
            Some(num) if !pid.is_empty() => format!("{pid}-{num}"),
            Some(num) => num.to_string(),
            None if !pid.is_empty() => format!("{pid}-q{}", index + 1),
            None => format!("q{}", index + 1),
        };
    }

    let mut stem = text_of(q.stem.as_ref().or(q.prompt.as_ref()));
    let qtype = q.question_type.as_deref().map(str::trim).unwrap_or("");

    let choices = if qtype == INSERT_SENTENCE {
        let sentence = q.sentence.as_deref().map(str::trim).unwrap_or("");
        if !sentence.is_empty() {
            stem = insert_sentence_stem(sentence);
        }
        match q.options.as_ref().or(q.choices.as_ref()) {
            Some(raw_choices) => normalize_choices(Some(raw_choices), warnings, &qid),
            None => default_insert_choices(),
        }
    } else {
        normalize_choices(q.choices.as_ref(), warnings, &qid)
    };

    let correct_index = normalize_correct_index(&q, warnings, &qid);

    // An existing meta map survives normalization untouched except for the
    // insert-sentence keys below; that is what makes a second normalization
    // pass a fixed point.
    let mut meta: BTreeMap<String, String> = q
        .meta
        .as_ref()
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.clone(), text_of(Some(v))))
                .collect()
        })
        .unwrap_or_default();

    if qtype == INSERT_SENTENCE {
        for (key, value) in [
            ("paragraph_label", q.paragraph_label.as_deref()),
            ("paragraph_text", q.paragraph_text.as_deref()),
            ("sentence", q.sentence.as_deref()),
        ] {
            if let Some(v) = value {
                meta.insert(key.to_string(), v.trim().to_string());
            }
        }
    }

    Some(NormalizedQuestion {
        id: qid,
        stem,
        choices,
        correct_index,
        explanation: q.explanation.clone(),
        question_type: (!qtype.is_empty()).then(|| qtype.to_string()),
        meta,
    })
}

/// Normalize one raw passage record of unknown shape.
///
/// Passage id is read from `id` then `passage_id`; body text from `content`,
/// `text`, then `passage`, falling back to the first question's
/// `paragraph_text`. Never fails: structural problems are downgraded to
/// warnings and the offending pieces replaced with safe defaults.
pub fn normalize_passage(raw: &Value, warnings: &mut Vec<String>) -> NormalizedPassage {
    let empty = serde_json::Map::new();
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => {
            warnings.push("passage record is not an object; replaced with an empty passage.".to_string());
            &empty
        }
    };

    let pid = text_of(pick_first(obj, &["id", "passage_id"]));
    let title = text_of(obj.get("title"));
    let mut content = text_of(pick_first(obj, &["content", "text", "passage"]));

    let questions_raw: Vec<Value> = match obj.get("questions") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) | None => {
            let label = if pid.is_empty() { "unknown" } else { &pid };
            warnings.push(format!(
                "passage {label}: questions missing or not a list; replaced with empty list."
            ));
            Vec::new()
        }
    };

    if content.is_empty() {
        if let Some(first) = questions_raw.first().and_then(Value::as_object) {
            let para = text_of(first.get("paragraph_text"));
            if !para.is_empty() {
                content = para;
            }
        }
    }

    let questions = questions_raw
        .iter()
        .enumerate()
        .filter_map(|(i, q)| normalize_question(q, &pid, i, warnings))
        .collect();

    NormalizedPassage {
        id: pid,
        title,
        content,
        questions,
    }
}
