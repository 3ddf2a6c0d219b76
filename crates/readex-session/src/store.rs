//! In-memory attempt store.
//!
//! Owns the bank service and every live attempt. Attempt ids are a monotonic
//! counter; the choice-shuffle seed is drawn once per attempt and reused for
//! both passage selection and shuffling, so a stored attempt can always
//! rebuild its exam view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::Rng;

use readex_bank::{default_exam_set, AnswerKey, BankService};
use readex_core::grade::{grade_with_scaled, CorrectAnswerOverride, ExamResult};
use readex_core::model::{AnswerMap, ExamQuestion, ExamSet};
use readex_core::shuffle::shuffle_exam_set;

use crate::attempt::{Attempt, AttemptMode};
use crate::error::SessionError;

/// Single-question navigation assumes a full set of at least this many.
const MIN_FULL_SET_QUESTIONS: usize = 10;

const SEED_RANGE: std::ops::RangeInclusive<u64> = 1..=1_000_000_000;

pub struct AttemptStore {
    bank: BankService,
    answer_key: Option<AnswerKey>,
    attempts: Mutex<HashMap<String, Attempt>>,
    counter: AtomicU64,
}

impl AttemptStore {
    /// Build a store over a bank service, loading the answer-key override if
    /// one is configured. A missing or unreadable key file is logged and
    /// skipped rather than failing session start-up.
    pub fn new(bank: BankService) -> Self {
        let answer_key = bank
            .config()
            .answer_keys_path
            .as_deref()
            .and_then(|path| match AnswerKey::load(path) {
                Ok(key) => {
                    tracing::info!(entries = key.len(), "loaded answer-key overrides");
                    Some(key)
                }
                Err(e) => {
                    tracing::warn!("answer-key overrides unavailable: {e}");
                    None
                }
            });

        Self {
            bank,
            answer_key,
            attempts: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn bank(&self) -> &BankService {
        &self.bank
    }

    /// Create an attempt with a freshly drawn seed.
    pub fn create(
        &self,
        minutes: u32,
        mode: AttemptMode,
        single_index: u32,
    ) -> Result<String, SessionError> {
        let seed = rand::thread_rng().gen_range(SEED_RANGE);
        self.create_with_seed(minutes, mode, single_index, seed)
    }

    /// Create an attempt with an explicit seed, for reproducible sessions.
    pub fn create_with_seed(
        &self,
        minutes: u32,
        mode: AttemptMode,
        single_index: u32,
        seed: u64,
    ) -> Result<String, SessionError> {
        let id = (self.counter.fetch_add(1, Ordering::SeqCst) + 1).to_string();

        let loaded = self.bank.pick_full_exam_set(seed)?;
        for warning in &loaded.warnings {
            tracing::warn!(attempt_id = %id, "bank: {warning}");
        }

        let attempt = Attempt {
            id: id.clone(),
            minutes,
            started_at: Utc::now(),
            submitted: false,
            timed_out: false,
            mode,
            single_index: single_index.clamp(1, 9),
            shuffle_seed: seed,
            raw_exam_set: loaded.exam_set,
            shuffled: None,
            answers: AnswerMap::new(),
            result: None,
            warnings: loaded.warnings,
        };

        self.lock().insert(id.clone(), attempt);
        Ok(id)
    }

    /// Snapshot of an attempt's current state.
    pub fn attempt(&self, id: &str) -> Result<Attempt, SessionError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// The exam set as the candidate sees it: shuffled once per attempt and
    /// memoized. Single mode falls back to the bundled set when the stored
    /// one is too small for question navigation.
    pub fn exam_set_for_attempt(&self, id: &str) -> Result<ExamSet, SessionError> {
        let mut attempts = self.lock();
        let attempt = attempts
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        Ok(candidate_view(attempt))
    }

    /// Persist one page's answer selections.
    ///
    /// When the page carries no selection for `current_qid`, the question's
    /// saved answer is cleared so an unselected radio does not resurrect a
    /// stale choice.
    pub fn apply_page_answers(
        &self,
        id: &str,
        current_qid: &str,
        page_answers: &AnswerMap,
    ) -> Result<(), SessionError> {
        let mut attempts = self.lock();
        let attempt = attempts
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let qid = current_qid.trim();
        if qid.is_empty() {
            attempt.answers.extend(page_answers.clone());
            return Ok(());
        }

        if let Some(selection) = page_answers.get(qid) {
            attempt.answers.insert(qid.to_string(), selection.clone());
            return Ok(());
        }

        attempt.answers.remove(qid);
        attempt.answers.extend(page_answers.clone());
        Ok(())
    }

    /// Grade and finalize an attempt submitted by the candidate.
    pub fn submit(&self, id: &str) -> Result<ExamResult, SessionError> {
        self.finalize(id, false)
    }

    /// Grade and finalize an attempt whose timer expired.
    pub fn autosubmit(&self, id: &str) -> Result<ExamResult, SessionError> {
        self.finalize(id, true)
    }

    fn finalize(&self, id: &str, timed_out: bool) -> Result<ExamResult, SessionError> {
        let mut attempts = self.lock();
        let attempt = attempts
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let view = candidate_view(attempt);
        let questions = grading_questions(attempt, &view);

        let overrides = self
            .answer_key
            .as_ref()
            .map(|key| key as &dyn CorrectAnswerOverride);
        let result = grade_with_scaled(&questions, &attempt.answers, overrides);

        attempt.submitted = true;
        attempt.timed_out = timed_out;
        attempt.result = Some(result.clone());
        Ok(result)
    }

    /// Result of a finished attempt.
    pub fn result(&self, id: &str) -> Result<ExamResult, SessionError> {
        let attempts = self.lock();
        let attempt = attempts
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        match (&attempt.result, attempt.submitted) {
            (Some(result), true) => Ok(result.clone()),
            _ => Err(SessionError::NotSubmitted(id.to_string())),
        }
    }

    /// Start a fresh attempt with the same settings. The old attempt is kept;
    /// a new id, seed, and exam set are issued.
    pub fn restart(&self, id: &str) -> Result<String, SessionError> {
        let (minutes, mode, single_index) = {
            let attempts = self.lock();
            let attempt = attempts
                .get(id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            (attempt.minutes, attempt.mode, attempt.single_index)
        };
        self.create(minutes, mode, single_index)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Attempt>> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Memoized shuffled view, with the single-mode fallback applied on top.
fn candidate_view(attempt: &mut Attempt) -> ExamSet {
    let view = attempt
        .shuffled
        .get_or_insert_with(|| shuffle_exam_set(&attempt.raw_exam_set, attempt.shuffle_seed))
        .clone();

    if attempt.mode == AttemptMode::Single && view.questions.len() < MIN_FULL_SET_QUESTIONS {
        tracing::warn!(
            attempt_id = %attempt.id,
            got = view.questions.len(),
            "single mode needs a full set, using bundled fallback"
        );
        return default_exam_set();
    }
    view
}

/// The questions that actually get graded: the whole view in full mode, the
/// practiced question alone in single mode.
fn grading_questions(attempt: &Attempt, view: &ExamSet) -> Vec<ExamQuestion> {
    match attempt.mode {
        AttemptMode::Full => view.questions.clone(),
        AttemptMode::Single => {
            if view.questions.is_empty() {
                return Vec::new();
            }
            let seq = attempt.single_index.clamp(1, view.questions.len() as u32);
            let q = view
                .question_by_seq(seq)
                .or_else(|| view.questions.get(seq as usize - 1))
                .cloned();
            q.into_iter().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readex_bank::ReadexConfig;
    use serde_json::json;
    use std::path::Path;

    fn question(id: &str, correct_index: usize) -> serde_json::Value {
        json!({
            "id": id,
            "stem": format!("stem {id}"),
            "choices": ["alpha", "beta", "gamma", "delta"],
            "correct_index": correct_index,
        })
    }

    fn write_banks(dir: &Path, question_count: usize) -> ReadexConfig {
        let questions: Vec<serde_json::Value> = (1..=question_count)
            .map(|i| question(&format!("20-{i}"), i % 4))
            .collect();
        let primary = json!({"passages": [
            {"id": "20", "title": "Meteorites", "content": "Body.", "questions": questions}
        ]});
        let passages_path = dir.join("passages.json");
        std::fs::write(&passages_path, serde_json::to_string(&primary).unwrap()).unwrap();

        ReadexConfig {
            passages_path,
            supplementary_path: dir.join("passages_q9.json"),
            answer_keys_path: None,
            default_minutes: 20,
        }
    }

    fn store(dir: &Path, question_count: usize) -> AttemptStore {
        AttemptStore::new(BankService::new(write_banks(dir, question_count)))
    }

    #[test]
    fn create_assigns_monotonic_ids_and_clamps_single_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);

        let a = store.create_with_seed(20, AttemptMode::Full, 1, 42).unwrap();
        let b = store.create_with_seed(20, AttemptMode::Single, 99, 42).unwrap();
        assert_eq!(a, "1");
        assert_eq!(b, "2");

        let attempt = store.attempt(&b).unwrap();
        assert_eq!(attempt.single_index, 9);
        assert_eq!(attempt.mode, AttemptMode::Single);
        assert!(!attempt.submitted);
        assert_eq!(attempt.duration_seconds(), 1200);
    }

    #[test]
    fn exam_view_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(20, AttemptMode::Full, 1, 7).unwrap();

        let first = store.exam_set_for_attempt(&id).unwrap();
        let second = store.exam_set_for_attempt(&id).unwrap();
        assert_eq!(first, second);

        // Correct answer text survives shuffling.
        let raw = store.attempt(&id).unwrap().raw_exam_set;
        for (rq, sq) in raw.questions.iter().zip(first.questions.iter()) {
            let text_of = |q: &ExamQuestion, letter: char| {
                q.choices
                    .iter()
                    .find(|c| c.letter == letter)
                    .map(|c| c.text.clone())
            };
            assert_eq!(text_of(rq, rq.correct[0]), text_of(sq, sq.correct[0]));
        }
    }

    #[test]
    fn page_answers_update_and_unselect_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(20, AttemptMode::Full, 1, 7).unwrap();

        let mut page = AnswerMap::new();
        page.insert("20-1".to_string(), vec!['B']);
        store.apply_page_answers(&id, "20-1", &page).unwrap();
        assert_eq!(store.attempt(&id).unwrap().answers.get("20-1"), Some(&vec!['B']));

        // Same page revisited with nothing selected clears the saved answer.
        store.apply_page_answers(&id, "20-1", &AnswerMap::new()).unwrap();
        assert!(store.attempt(&id).unwrap().answers.get("20-1").is_none());
    }

    #[test]
    fn submit_grades_and_result_becomes_available() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(20, AttemptMode::Full, 1, 7).unwrap();

        assert!(matches!(
            store.result(&id),
            Err(SessionError::NotSubmitted(_))
        ));

        let view = store.exam_set_for_attempt(&id).unwrap();
        let answers: AnswerMap = view
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.correct.clone()))
            .collect();
        store.apply_page_answers(&id, "", &answers).unwrap();

        let result = store.submit(&id).unwrap();
        assert_eq!(result.score, result.total);
        assert_eq!(result.scaled, 30);

        let attempt = store.attempt(&id).unwrap();
        assert!(attempt.submitted);
        assert!(!attempt.timed_out);
        assert_eq!(store.result(&id).unwrap(), result);
    }

    #[test]
    fn autosubmit_marks_timed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(20, AttemptMode::Full, 1, 7).unwrap();

        let result = store.autosubmit(&id).unwrap();
        assert_eq!(result.score, 0);
        assert!(store.attempt(&id).unwrap().timed_out);
    }

    #[test]
    fn single_mode_grades_only_the_practiced_question() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(20, AttemptMode::Single, 3, 7).unwrap();

        let view = store.exam_set_for_attempt(&id).unwrap();
        let q = view.question_by_seq(3).unwrap().clone();
        let mut page = AnswerMap::new();
        page.insert(q.id.clone(), q.correct.clone());
        store.apply_page_answers(&id, &q.id, &page).unwrap();

        let result = store.submit(&id).unwrap();
        assert_eq!((result.score, result.total), (1, 1));
        assert_eq!(result.feedback.len(), 1);
        assert_eq!(result.feedback[0].question_id, q.id);
    }

    #[test]
    fn single_mode_small_set_falls_back_to_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 2);
        let id = store.create_with_seed(20, AttemptMode::Single, 1, 7).unwrap();

        let view = store.exam_set_for_attempt(&id).unwrap();
        assert_eq!(view.questions.len(), 10);
        assert_eq!(view.id, "reading-sample");
    }

    #[test]
    fn restart_copies_settings_into_a_new_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let id = store.create_with_seed(45, AttemptMode::Single, 5, 7).unwrap();
        store.submit(&id).unwrap();

        let new_id = store.restart(&id).unwrap();
        assert_ne!(new_id, id);

        let fresh = store.attempt(&new_id).unwrap();
        assert_eq!(fresh.minutes, 45);
        assert_eq!(fresh.mode, AttemptMode::Single);
        assert_eq!(fresh.single_index, 5);
        assert!(!fresh.submitted);
        assert!(fresh.answers.is_empty());
        assert!(fresh.result.is_none());

        // The original stays readable.
        assert!(store.result(&id).is_ok());
    }

    #[test]
    fn unknown_attempt_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        assert!(matches!(store.attempt("999"), Err(SessionError::NotFound(_))));
        assert!(matches!(store.submit("999"), Err(SessionError::NotFound(_))));
    }
}
