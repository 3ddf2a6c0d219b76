//! Scoring engine: per-question correctness under three policies, raw point
//! aggregation, and the bounded scaled score.
//!
//! Summary questions use the partial-credit policy: 3 points for an exact set
//! match, 2 for a non-empty proper subset with zero incorrect selections,
//! 0 otherwise. The older binary 2-point variant is intentionally not
//! implemented; the two must never be blended.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, ExamQuestion, QuestionKind};

/// Optional flat answer-key lookup, consulted only when a question's own
/// record has no resolvable correct letters.
pub trait CorrectAnswerOverride {
    fn lookup(&self, question_id: &str) -> Option<Vec<char>>;
}

/// Per-question grading feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    /// Short "passage-question" form for display, e.g. "P20-Q09" → "20-9".
    pub display_id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub submitted: Vec<char>,
    pub correct: Vec<char>,
    pub ok: bool,
    pub points: u16,
    pub max_points: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Raw grading outcome before score scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub score: u16,
    pub total: u16,
    pub feedback: Vec<QuestionFeedback>,
}

/// Final result of a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: u16,
    pub total: u16,
    pub scaled: u16,
    pub feedback: Vec<QuestionFeedback>,
}

/// Upper-case, sort, and deduplicate a letter selection.
fn clean_letters(letters: &[char]) -> Vec<char> {
    let set: BTreeSet<char> = letters.iter().map(|c| c.to_ascii_uppercase()).collect();
    set.into_iter().collect()
}

fn correct_letters(
    q: &ExamQuestion,
    overrides: Option<&dyn CorrectAnswerOverride>,
) -> Vec<char> {
    let own = clean_letters(&q.correct);
    if !own.is_empty() {
        return own;
    }
    overrides
        .and_then(|ov| ov.lookup(&q.id))
        .map(|letters| clean_letters(&letters))
        .unwrap_or_default()
}

/// Single-choice: 1 point iff exactly one answer matching the correct letter.
fn score_single(user: &[char], correct: &[char]) -> (u16, u16, bool) {
    const MAX: u16 = 1;
    if correct.is_empty() || user.len() != 1 {
        return (0, MAX, false);
    }
    let ok = if correct.len() == 1 {
        user[0] == correct[0]
    } else {
        correct.contains(&user[0])
    };
    (u16::from(ok), MAX, ok)
}

/// Multi-answer (non-summary): 1 point iff exact set match, nothing partial.
fn score_multi_exact(user: &[char], correct: &[char]) -> (u16, u16, bool) {
    const MAX: u16 = 1;
    if correct.is_empty() || user.is_empty() {
        return (0, MAX, false);
    }
    let ok = user == correct;
    (u16::from(ok), MAX, ok)
}

/// Summary (highest-value multi-select), partial-credit policy.
fn score_summary(user: &[char], correct: &[char]) -> (u16, u16, bool) {
    const MAX: u16 = 3;
    if correct.is_empty() || user.is_empty() {
        return (0, MAX, false);
    }

    let user_set: BTreeSet<char> = user.iter().copied().collect();
    let correct_set: BTreeSet<char> = correct.iter().copied().collect();

    if user_set == correct_set {
        return (MAX, MAX, true);
    }
    // Proper subset: every selection right, some missing, none wrong.
    if user_set.is_subset(&correct_set) {
        return (2, MAX, false);
    }
    (0, MAX, false)
}

static QID_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^p(\d+)[-_]?q(\d+)$").expect("static regex")
});
static QID_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)[-_]q?(\d+)$").expect("static regex")
});

/// UI display form of a question id: many tolerated internal spellings
/// (P20-Q09, p11_q10, P11Q10, 11-10, 11_q10) collapse to "20-9" style.
/// Unrecognized ids pass through unchanged.
pub fn display_question_id(qid: &str) -> String {
    let s = qid.trim();
    for re in [&*QID_PREFIXED, &*QID_BARE] {
        if let Some(caps) = re.captures(s) {
            let pid = caps[1].trim_start_matches('0');
            let qn = caps[2].trim_start_matches('0');
            let pid = if pid.is_empty() { "0" } else { pid };
            let qn = if qn.is_empty() { "0" } else { qn };
            return format!("{pid}-{qn}");
        }
    }
    s.to_string()
}

/// Grade submitted answers against a question list.
///
/// Total points is the sum of each question's maximum achievable points, not
/// the question count. Submitted letters are upper-cased and deduplicated
/// before comparison; a question with no resolvable correct answer (after the
/// optional override) always scores 0 and is flagged not-ok.
pub fn grade(
    questions: &[ExamQuestion],
    answers: &AnswerMap,
    overrides: Option<&dyn CorrectAnswerOverride>,
) -> GradeOutcome {
    let mut score = 0u16;
    let mut total = 0u16;
    let mut feedback = Vec::with_capacity(questions.len());

    for q in questions {
        let submitted = answers
            .get(&q.id)
            .map(|letters| clean_letters(letters))
            .unwrap_or_default();
        let correct = correct_letters(q, overrides);

        let (points, max_points, ok) = match q.kind {
            QuestionKind::Single => score_single(&submitted, &correct),
            QuestionKind::Multi => score_multi_exact(&submitted, &correct),
            QuestionKind::Summary => score_summary(&submitted, &correct),
        };

        if correct.is_empty() {
            tracing::warn!(question_id = %q.id, "no correct answer on record; scored 0");
        }

        score += points;
        total += max_points;

        feedback.push(QuestionFeedback {
            question_id: q.id.clone(),
            display_id: display_question_id(&q.id),
            prompt: q.prompt.clone(),
            kind: q.kind,
            submitted,
            correct,
            ok,
            points,
            max_points,
            explanation: q.explanation.clone(),
        });
    }

    GradeOutcome {
        score,
        total,
        feedback,
    }
}

/// Scaled-score lookup calibrated for an 11-point form, indexed by raw points.
const SCALE_TABLE_11: [u16; 12] = [0, 7, 12, 16, 20, 23, 25, 26, 27, 28, 29, 30];

/// Map raw points to the bounded 0–30 reporting scale.
///
/// Totals other than 11 are rescaled to an equivalent raw-out-of-11 value
/// (rounded to nearest) before consulting the same table. The result is
/// always within `[0, 30]`.
pub fn scale_score(score: u16, total: u16) -> u16 {
    if total == 0 {
        return 0;
    }
    let raw = score.min(total);
    let equivalent = if total == 11 {
        u64::from(raw)
    } else {
        ((f64::from(raw) * 11.0 / f64::from(total)).round()) as u64
    };
    SCALE_TABLE_11[equivalent.min(11) as usize]
}

/// Grade and scale in one step.
pub fn grade_with_scaled(
    questions: &[ExamQuestion],
    answers: &AnswerMap,
    overrides: Option<&dyn CorrectAnswerOverride>,
) -> ExamResult {
    let outcome = grade(questions, answers, overrides);
    let scaled = scale_score(outcome.score, outcome.total);
    ExamResult {
        score: outcome.score,
        total: outcome.total,
        scaled,
        feedback: outcome.feedback,
    }
}
