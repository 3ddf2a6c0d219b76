//! Bank-aware exam set loading.
//!
//! `BankService` is the boundary between the engine and the on-disk banks: it
//! validates the root document shape (hard failures), normalizes the selected
//! passage (soft failures become warnings), assembles the exam set, and merges
//! the supplementary question located by canonical passage id.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use readex_core::assemble::{
    canonical_passage_id, ensure_sequence, exam_question_from_normalized, exam_set_from_passage,
    merge_supplementary_question,
};
use readex_core::model::{ExamQuestion, ExamSet, CHOICE_SLOTS};
use readex_core::normalize::normalize_passage;

use crate::cache::BankCache;
use crate::config::ReadexConfig;
use crate::error::BankError;

/// An assembled exam set plus the soft-failure warnings collected on the way.
#[derive(Debug, Clone)]
pub struct BankLoadResult {
    pub exam_set: ExamSet,
    pub warnings: Vec<String>,
}

/// Loads and assembles exam sets from the configured banks.
#[derive(Debug)]
pub struct BankService {
    config: ReadexConfig,
    cache: BankCache,
}

impl BankService {
    pub fn new(config: ReadexConfig) -> Self {
        Self {
            config,
            cache: BankCache::new(),
        }
    }

    pub fn config(&self) -> &ReadexConfig {
        &self.config
    }

    fn read_payload(&self, path: &Path) -> Result<Arc<Value>, BankError> {
        self.cache.read(path)
    }

    /// Number of passages in the primary bank. Falls back to 1 when the bank
    /// cannot be read, so seed-based index derivation stays total.
    pub fn count_passages(&self) -> usize {
        let payload = match self.read_payload(&self.config.passages_path) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("count_passages fell back to 1: {e}");
                return 1;
            }
        };
        match payload.get("passages").and_then(Value::as_array) {
            Some(passages) if !passages.is_empty() => passages.len(),
            _ => 1,
        }
    }

    /// Derive the passage index for a seed: a seeded generator over the
    /// passage count, so the same seed always picks the same passage.
    pub fn passage_index_for_seed(&self, seed: u64) -> usize {
        let count = self.count_passages().max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        rng.gen_range(0..count)
    }

    /// Load and assemble the passage at `passage_index` from the primary bank.
    ///
    /// Out-of-range indices are wrapped by modulo with a warning; an exam set
    /// with zero questions after normalization is a warning, not an error.
    pub fn load_exam_set(&self, passage_index: usize) -> Result<BankLoadResult, BankError> {
        let path = &self.config.passages_path;
        let payload = self.read_payload(path)?;

        let passages = validated_passages(&payload, path)?;

        let mut warnings = Vec::new();
        let idx = passage_index % passages.len();
        if idx != passage_index {
            warnings.push("passage_index out of range; wrapped by modulo.".to_string());
        }

        let normalized = normalize_passage(&passages[idx], &mut warnings);
        let exam_set = exam_set_from_passage(&normalized);

        if exam_set.questions.is_empty() {
            warnings.push("Selected passage has zero questions after normalization.".to_string());
        }

        Ok(BankLoadResult { exam_set, warnings })
    }

    /// Pick an exam set pseudo-randomly for a seed, with sequence numbers
    /// assigned. Does not merge the supplementary question.
    pub fn pick_exam_set_for_seed(&self, seed: u64) -> Result<BankLoadResult, BankError> {
        let index = self.passage_index_for_seed(seed);
        let mut res = self.load_exam_set(index)?;
        ensure_sequence(&mut res.exam_set);
        Ok(res)
    }

    /// Pick an exam set for a seed and merge in the supplementary question
    /// from the secondary bank. This is the full form served to an attempt.
    pub fn pick_full_exam_set(&self, seed: u64) -> Result<BankLoadResult, BankError> {
        let index = self.passage_index_for_seed(seed);
        let mut res = self.load_exam_set(index)?;

        let passage_id = canonical_passage_id(&res.exam_set.id);
        if passage_id.is_empty() {
            res.warnings
                .push("full set: failed to derive passage id; skipped supplementary merge.".to_string());
        } else if let Some(question) = self.supplementary_question(&passage_id, &mut res.warnings)
        {
            merge_supplementary_question(&mut res.exam_set, question);
        }

        ensure_sequence(&mut res.exam_set);
        Ok(res)
    }

    /// Fetch the supplementary question for a passage from the secondary
    /// bank. Every miss is a warning rather than an error: the exam simply
    /// ships without the extra question.
    pub fn supplementary_question(
        &self,
        passage_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<ExamQuestion> {
        let path = &self.config.supplementary_path;
        if !path.exists() {
            warnings.push(format!("supplementary bank missing: {}", path.display()));
            return None;
        }

        let payload = match self.read_payload(path) {
            Ok(payload) => payload,
            Err(e) => {
                warnings.push(format!("supplementary bank unreadable: {e}"));
                return None;
            }
        };

        let passages = match payload.get("passages").and_then(Value::as_array) {
            Some(passages) if !passages.is_empty() => passages,
            _ => {
                warnings.push("supplementary bank has no passages.".to_string());
                return None;
            }
        };

        let want = canonical_passage_id(passage_id);
        if want.is_empty() {
            warnings.push("supplementary lookup: empty passage id after normalization.".to_string());
            return None;
        }

        let target = passages.iter().find(|p| {
            let obj = match p.as_object() {
                Some(obj) => obj,
                None => return false,
            };
            let raw = obj
                .get("passage_id")
                .or_else(|| obj.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let got = canonical_passage_id(raw);
            !got.is_empty() && got == want
        });

        let target = match target {
            Some(target) => target,
            None => {
                warnings.push(format!("{want}: passage not found in supplementary bank."));
                return None;
            }
        };

        let normalized = normalize_passage(target, warnings);
        match normalized.questions.first() {
            Some(q) => Some(exam_question_from_normalized(q)),
            None => {
                warnings.push(format!("{want}: supplementary questions empty after normalization."));
                None
            }
        }
    }
}

/// Hard-failure validation of the root document, returning the passage list.
fn validated_passages<'a>(payload: &'a Value, path: &Path) -> Result<&'a Vec<Value>, BankError> {
    let obj = payload.as_object().ok_or_else(|| BankError::InvalidPayload {
        path: path.to_path_buf(),
        errors: vec!["Root must be an object.".to_string()],
    })?;
    let passages = match obj.get("passages") {
        Some(Value::Array(list)) => list,
        _ => {
            return Err(BankError::InvalidPayload {
                path: path.to_path_buf(),
                errors: vec!["'passages' must be a list.".to_string()],
            })
        }
    };
    if passages.is_empty() {
        return Err(BankError::Empty(path.to_path_buf()));
    }
    Ok(passages)
}

/// Strict schema validation for authoring tools: reports every missing key,
/// wrong choice arity, and out-of-range correct index instead of stopping at
/// the first structural problem.
pub fn validate_bank_strict(payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let obj = match payload.as_object() {
        Some(obj) => obj,
        None => return vec!["Root must be an object.".to_string()],
    };
    let passages = match obj.get("passages").and_then(Value::as_array) {
        Some(passages) => passages,
        None => return vec!["'passages' must be a list.".to_string()],
    };
    if passages.is_empty() {
        errors.push("'passages' is empty.".to_string());
    }

    for (pi, p) in passages.iter().enumerate() {
        let p = match p.as_object() {
            Some(p) => p,
            None => {
                errors.push(format!("passages[{pi}] must be an object."));
                continue;
            }
        };

        for key in ["id", "title", "content", "questions"] {
            if !p.contains_key(key) {
                errors.push(format!("passages[{pi}] missing key '{key}'."));
            }
        }

        let questions = match p.get("questions").and_then(Value::as_array) {
            Some(questions) => questions,
            None => {
                errors.push(format!("passages[{pi}].questions must be a list."));
                continue;
            }
        };

        for (qi, q) in questions.iter().enumerate() {
            let q = match q.as_object() {
                Some(q) => q,
                None => {
                    errors.push(format!("passages[{pi}].questions[{qi}] must be an object."));
                    continue;
                }
            };

            for key in ["id", "stem", "choices", "correct_index"] {
                if !q.contains_key(key) {
                    errors.push(format!("passages[{pi}].questions[{qi}] missing key '{key}'."));
                }
            }

            let qid = q.get("id").and_then(Value::as_str).unwrap_or("unknown");

            match q.get("choices").and_then(Value::as_array) {
                Some(choices) if choices.len() == CHOICE_SLOTS => {}
                _ => errors.push(format!("{qid}: choices must have length {CHOICE_SLOTS}.")),
            }

            match q.get("correct_index").and_then(Value::as_i64) {
                Some(ci) if (0..CHOICE_SLOTS as i64).contains(&ci) => {}
                _ => errors.push(format!(
                    "{qid}: correct_index must be int in [0, {}].",
                    CHOICE_SLOTS - 1
                )),
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn write_bank(dir: &Path, name: &str, payload: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(payload).unwrap()).unwrap();
        path
    }

    fn question(id: &str, correct_index: usize) -> Value {
        json!({
            "id": id,
            "stem": format!("stem {id}"),
            "choices": ["alpha", "beta", "gamma", "delta"],
            "correct_index": correct_index,
        })
    }

    fn primary_bank() -> Value {
        json!({"passages": [
            {"id": "20", "title": "Meteorites", "content": "Body one.",
             "questions": [question("20-1", 0), question("20-2", 1)]},
            {"id": "21", "title": "Trade Routes", "content": "Body two.",
             "questions": [question("21-1", 2)]},
        ]})
    }

    fn service(dir: &Path, primary: &Value) -> BankService {
        let passages_path = write_bank(dir, "passages.json", primary);
        BankService::new(ReadexConfig {
            passages_path,
            supplementary_path: dir.join("passages_q9.json"),
            answer_keys_path: None,
            default_minutes: 20,
        })
    }

    #[test]
    fn rejects_non_object_root() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &json!(["not", "an", "object"]));
        let err = svc.load_exam_set(0).unwrap_err();
        assert!(matches!(err, BankError::InvalidPayload { .. }));
    }

    #[test]
    fn rejects_missing_or_empty_passages() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &json!({"things": []}));
        assert!(matches!(
            svc.load_exam_set(0).unwrap_err(),
            BankError::InvalidPayload { .. }
        ));

        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &json!({"passages": []}));
        assert!(matches!(svc.load_exam_set(0).unwrap_err(), BankError::Empty(_)));
    }

    #[test]
    fn out_of_range_index_wraps_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &primary_bank());

        let res = svc.load_exam_set(5).unwrap();
        // 5 % 2 == 1 → second passage.
        assert_eq!(res.exam_set.id, "reading-21");
        assert!(res.warnings.iter().any(|w| w.contains("wrapped by modulo")));
    }

    #[test]
    fn same_seed_picks_same_passage() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &primary_bank());

        let a = svc.pick_exam_set_for_seed(1234).unwrap();
        let b = svc.pick_exam_set_for_seed(1234).unwrap();
        assert_eq!(a.exam_set, b.exam_set);
    }

    #[test]
    fn full_set_merges_supplementary_and_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &primary_bank());
        write_bank(
            dir.path(),
            "passages_q9.json",
            &json!({"passages": [
                {"passage_id": "READING-20", "questions": [question("20-9", 3)]},
                {"passage_id": "p21", "questions": [question("21-9", 0)]},
            ]}),
        );

        for seed in [1u64, 2, 3, 4, 5] {
            let res = svc.pick_full_exam_set(seed).unwrap();
            let ids: Vec<&str> = res.exam_set.questions.iter().map(|q| q.id.as_str()).collect();
            assert!(ids.last().unwrap().ends_with("-9"), "seed {seed}: {ids:?}");

            let mut seqs: Vec<u32> =
                res.exam_set.questions.iter().filter_map(|q| q.seq).collect();
            seqs.sort_unstable();
            let expected: Vec<u32> = (1..=res.exam_set.questions.len() as u32).collect();
            assert_eq!(seqs, expected);
        }
    }

    #[test]
    fn missing_supplementary_bank_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &primary_bank());

        let res = svc.pick_full_exam_set(7).unwrap();
        assert!(res
            .warnings
            .iter()
            .any(|w| w.contains("supplementary bank missing")));
        assert!(!res.exam_set.questions.is_empty());
    }

    #[test]
    fn unmatched_passage_in_supplementary_warns() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), &primary_bank());
        write_bank(
            dir.path(),
            "passages_q9.json",
            &json!({"passages": [{"passage_id": "99", "questions": [question("99-9", 0)]}]}),
        );

        let res = svc.pick_full_exam_set(7).unwrap();
        assert!(res
            .warnings
            .iter()
            .any(|w| w.contains("not found in supplementary bank")));
    }

    #[test]
    fn strict_validation_reports_shape_errors() {
        let errors = validate_bank_strict(&json!({"passages": [
            {"id": "1", "title": "t", "content": "c", "questions": [
                {"id": "1-1", "stem": "s", "choices": ["a", "b"], "correct_index": 9}
            ]},
            {"id": "2", "questions": "not a list"},
        ]}));

        assert!(errors.iter().any(|e| e.contains("choices must have length 4")));
        assert!(errors.iter().any(|e| e.contains("correct_index must be int")));
        assert!(errors.iter().any(|e| e.contains("missing key 'title'")));
        assert!(errors.iter().any(|e| e.contains("questions must be a list")));

        assert!(validate_bank_strict(&json!("nope"))
            .iter()
            .any(|e| e.contains("Root must be an object")));
    }

    #[test]
    fn zero_question_passage_is_flagged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            dir.path(),
            &json!({"passages": [{"id": "1", "title": "t", "content": "c", "questions": []}]}),
        );
        let res = svc.load_exam_set(0).unwrap();
        assert!(res.exam_set.questions.is_empty());
        assert!(res.warnings.iter().any(|w| w.contains("zero questions")));
    }
}
