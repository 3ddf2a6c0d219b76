//! Bank loading for the exam engine: cached JSON reads, loose and strict
//! payload validation, seed-based passage selection, supplementary-question
//! merging, answer-key overrides, and the built-in fallback set.

pub mod answer_keys;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod sample;

pub use answer_keys::AnswerKey;
pub use cache::BankCache;
pub use config::{load_config, ReadexConfig, DEFAULT_CONFIG_FILE};
pub use error::BankError;
pub use loader::{validate_bank_strict, BankLoadResult, BankService};
pub use sample::default_exam_set;
