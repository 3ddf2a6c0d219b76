//! The `readex grade` command.
//!
//! Replays a full attempt lifecycle offline: create an attempt for the seed,
//! load the submitted answers, submit, and print the graded result.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde_json::Value;

use readex_bank::{load_config, BankService};
use readex_core::grade::ExamResult;
use readex_core::model::AnswerMap;
use readex_session::{AttemptMode, AttemptStore};

pub fn execute(
    answers_path: PathBuf,
    seed: u64,
    minutes: u32,
    mode: String,
    single_index: u32,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let answers = load_answers(&answers_path)?;
    let mode = AttemptMode::parse_lenient(&mode);

    let config = load_config(config_path.as_deref())?;
    let store = AttemptStore::new(BankService::new(config));

    let attempt_id = store.create_with_seed(minutes, mode, single_index, seed)?;
    store.apply_page_answers(&attempt_id, "", &answers)?;
    let result = store.submit(&attempt_id)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_result(&result),
    }
    Ok(())
}

/// Answer files map question ids to a letter string ("B", "BD") or a list of
/// letter strings.
fn load_answers(path: &PathBuf) -> Result<AnswerMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: BTreeMap<String, Value> = serde_json::from_str(&text)
        .with_context(|| format!("invalid answers JSON in {}", path.display()))?;

    let mut answers = AnswerMap::new();
    for (qid, value) in raw {
        let letters = letters_of(&value);
        if letters.is_empty() {
            tracing::warn!("{qid}: no usable letters in answer file, skipped");
            continue;
        }
        answers.insert(qid, letters);
    }
    Ok(answers)
}

fn letters_of(value: &Value) -> Vec<char> {
    let mut letters = Vec::new();
    match value {
        Value::String(s) => push_letters(s, &mut letters),
        Value::Array(items) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    push_letters(s, &mut letters);
                }
            }
        }
        _ => {}
    }
    letters
}

fn push_letters(s: &str, out: &mut Vec<char>) {
    for ch in s.chars() {
        if ch.is_ascii_alphabetic() {
            out.push(ch.to_ascii_uppercase());
        }
    }
}

fn print_result(result: &ExamResult) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Kind", "Submitted", "Correct", "Points"]);

    for f in &result.feedback {
        let mark = if f.ok { "ok" } else { "x" };
        table.add_row(vec![
            Cell::new(&f.display_id),
            Cell::new(f.kind.to_string()),
            Cell::new(f.submitted.iter().collect::<String>()),
            Cell::new(f.correct.iter().collect::<String>()),
            Cell::new(format!("{}/{} {mark}", f.points, f.max_points)),
        ]);
    }

    println!("{table}");
    println!(
        "\nRaw score: {}/{}   Scaled (0-30): {}",
        result.score, result.total, result.scaled
    );
}
