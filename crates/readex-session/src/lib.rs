//! Attempt lifecycle for readex: creation, answer persistence, submission,
//! time-out handling, results, and restarts over an in-memory store.

pub mod attempt;
pub mod error;
pub mod store;

pub use attempt::{Attempt, AttemptMode};
pub use error::SessionError;
pub use store::AttemptStore;
