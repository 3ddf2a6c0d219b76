//! Seeded shuffle engine: deterministic per-attempt reordering of each
//! question's choices with correct letters re-derived from the new layout.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::model::{letter_for_slot, Choice, ExamSet};

/// Shuffle every question's choices, deterministically for a given seed.
///
/// Pure function of its inputs: one seeded generator is consumed across
/// questions in document order, so shuffling question 2 picks up the generator
/// state left by question 1 — the call order is part of the contract. The
/// input set is never mutated; the shuffled set is a fresh copy.
///
/// Questions with no choices or no recorded correct letters are left
/// untouched. Correct letters are re-derived by matching the previously
/// correct choice texts against the new layout; this assumes display texts are
/// distinct within a question — under duplicate texts the first matching
/// instance wins, a documented limitation rather than something silently
/// repaired.
pub fn shuffle_exam_set(set: &ExamSet, seed: u64) -> ExamSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = set.clone();

    for q in &mut out.questions {
        if q.choices.is_empty() || q.correct.is_empty() {
            continue;
        }

        let correct_texts: Vec<&str> = q
            .correct
            .iter()
            .filter_map(|letter| {
                q.choices
                    .iter()
                    .find(|c| c.letter == *letter)
                    .map(|c| c.text.as_str())
            })
            .collect();

        let mut texts: Vec<String> = q.choices.iter().map(|c| c.text.clone()).collect();
        texts.shuffle(&mut rng);

        let new_choices: Vec<Choice> = texts
            .into_iter()
            .enumerate()
            .map(|(slot, text)| Choice {
                letter: letter_for_slot(slot),
                text,
            })
            .collect();

        let new_correct: Vec<char> = correct_texts
            .iter()
            .filter_map(|text| {
                new_choices
                    .iter()
                    .find(|c| c.text == *text)
                    .map(|c| c.letter)
            })
            .collect();

        q.choices = new_choices;
        q.correct = new_correct;
    }

    out
}
