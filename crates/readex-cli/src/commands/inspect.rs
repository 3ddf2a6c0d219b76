//! The `readex inspect` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use readex_bank::{load_config, BankService};
use readex_core::model::ExamSet;
use readex_core::shuffle::shuffle_exam_set;

pub fn execute(
    seed: u64,
    shuffled: bool,
    show_answers: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let bank = BankService::new(config);

    let loaded = bank.pick_full_exam_set(seed)?;
    for w in &loaded.warnings {
        eprintln!("WARNING: {w}");
    }

    let exam_set = if shuffled {
        shuffle_exam_set(&loaded.exam_set, seed)
    } else {
        loaded.exam_set
    };

    println!("{}", exam_set.title);
    println!(
        "seed {seed}, {} questions, {} order\n",
        exam_set.questions.len(),
        if shuffled { "shuffled" } else { "bank" }
    );

    print_questions(&exam_set, show_answers);
    Ok(())
}

fn print_questions(exam_set: &ExamSet, show_answers: bool) {
    let mut table = Table::new();
    let mut header = vec!["#", "Id", "Kind", "Prompt", "Choices"];
    if show_answers {
        header.push("Correct");
    }
    table.set_header(header);

    for q in &exam_set.questions {
        let seq = q.seq.map(|s| s.to_string()).unwrap_or_default();
        let choices = q
            .choices
            .iter()
            .map(|c| format!("{}. {}", c.letter, truncate(&c.text, 40)))
            .collect::<Vec<_>>()
            .join("\n");

        let mut row = vec![
            Cell::new(seq),
            Cell::new(&q.id),
            Cell::new(q.kind.to_string()),
            Cell::new(truncate(&q.prompt, 60)),
            Cell::new(choices),
        ];
        if show_answers {
            row.push(Cell::new(q.correct.iter().collect::<String>()));
        }
        table.add_row(row);
    }

    println!("{table}");
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
