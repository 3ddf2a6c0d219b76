//! readex-core — Exam content normalization and deterministic grading.
//!
//! This crate defines the data model and the pure engine stages the rest of
//! readex builds on: schema normalization of heterogeneous bank records, exam
//! set assembly, seeded choice shuffling, and scoring with scaled scores.

pub mod assemble;
pub mod grade;
pub mod model;
pub mod normalize;
pub mod shuffle;
