//! Bank error types.
//!
//! These are the "hard failure" tier: a missing or structurally broken bank
//! must fail fast, because there is no safe default exam to serve from it.
//! Per-question problems never appear here — they are downgraded to warnings
//! during normalization.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a passage bank.
#[derive(Debug, Error)]
pub enum BankError {
    /// The bank file does not exist.
    #[error("bank not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The bank file could not be read.
    #[error("failed to read bank {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bank file is not valid JSON.
    #[error("bank {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The root document shape is wrong (not an object, or `passages` is
    /// missing / not a list).
    #[error("invalid bank payload ({}): {}", path.display(), errors.join("; "))]
    InvalidPayload { path: PathBuf, errors: Vec<String> },

    /// The bank parses but contains zero passages.
    #[error("bank {} contains zero passages", .0.display())]
    Empty(PathBuf),
}
