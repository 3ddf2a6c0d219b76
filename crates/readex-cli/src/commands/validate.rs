//! The `readex validate` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use readex_bank::validate_bank_strict;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&bank_path)
        .with_context(|| format!("failed to read {}", bank_path.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", bank_path.display()))?;

    let errors = validate_bank_strict(&payload);

    let passage_count = payload
        .get("passages")
        .and_then(serde_json::Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    println!("Bank: {} ({passage_count} passages)", bank_path.display());

    if errors.is_empty() {
        println!("Bank is valid.");
        return Ok(());
    }

    for e in &errors {
        println!("  ERROR: {e}");
    }
    bail!("{} error(s) found.", errors.len());
}
