//! Exam set assembler: turns a normalized passage into an orderable,
//! answerable exam set with letter/text choice pairs and re-derived correct
//! letters.

use crate::model::{
    letter_for_slot, Choice, ExamQuestion, ExamSet, NormalizedPassage, NormalizedQuestion,
    QuestionKind, CHOICE_SLOTS,
};

/// Canonical form of a passage identifier, so cross-bank lookups succeed
/// regardless of the caller's original formatting.
///
/// Uppercased; a `READING-` prefix is stripped; purely numeric ids gain a
/// leading `P`; leading zeros in the numeric tail are dropped (`"07"` and
/// `"P07"` both become `"P7"`).
pub fn canonical_passage_id(pid: &str) -> String {
    let mut s = pid.trim().to_ascii_uppercase();
    if s.is_empty() {
        return s;
    }

    if let Some(stripped) = s.strip_prefix("READING-") {
        s = stripped.trim().to_string();
    }

    if let Some(tail) = s.strip_prefix('P') {
        if let Ok(n) = tail.trim().parse::<u64>() {
            return format!("P{n}");
        }
        return s;
    }

    if let Ok(n) = s.parse::<u64>() {
        return format!("P{n}");
    }

    s
}

/// Build the answerable form of one normalized question.
///
/// Choice letters are assigned A–D in slot order and the correct letter is
/// re-derived from `correct_index`, never copied from upstream.
pub fn exam_question_from_normalized(q: &NormalizedQuestion) -> ExamQuestion {
    let index = q.correct_index.min(CHOICE_SLOTS - 1);
    let kind = q
        .question_type
        .as_deref()
        .and_then(|t| t.parse::<QuestionKind>().ok())
        .unwrap_or(QuestionKind::Single);

    ExamQuestion {
        id: q.id.clone(),
        kind,
        prompt: q.stem.clone(),
        choices: q
            .choices
            .iter()
            .enumerate()
            .map(|(slot, text)| Choice {
                letter: letter_for_slot(slot),
                text: text.clone(),
            })
            .collect(),
        correct: vec![letter_for_slot(index)],
        explanation: q.explanation.clone(),
        seq: None,
        meta: q.meta.clone(),
    }
}

/// Assemble an exam set from a normalized passage.
pub fn exam_set_from_passage(p: &NormalizedPassage) -> ExamSet {
    let questions = p.questions.iter().map(exam_question_from_normalized).collect();

    let label = if p.id.is_empty() {
        "Reading Passage".to_string()
    } else {
        format!("Reading Passage {}", p.id)
    };
    let title = if p.title.is_empty() {
        label
    } else {
        format!("{label}: {}", p.title)
    };

    ExamSet {
        id: if p.id.is_empty() {
            "reading".to_string()
        } else {
            format!("reading-{}", p.id)
        },
        title,
        passage: p.content.clone(),
        questions,
    }
}

/// Merge a supplementary question into the set. Idempotent: if a question
/// with the same id already exists, the merge is a no-op and returns `false`.
pub fn merge_supplementary_question(set: &mut ExamSet, question: ExamQuestion) -> bool {
    if set.questions.iter().any(|q| q.id == question.id) {
        return false;
    }
    set.questions.push(question);
    true
}

/// Assign a sequence number to every question that lacks one, using its
/// 1-based position. Existing sequence numbers are never overwritten and
/// question order is never changed.
pub fn ensure_sequence(set: &mut ExamSet) {
    for (i, q) in set.questions.iter_mut().enumerate() {
        if q.seq.is_none() {
            q.seq = Some(i as u32 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn normalized_question(id: &str, correct_index: usize) -> NormalizedQuestion {
        NormalizedQuestion {
            id: id.to_string(),
            stem: format!("stem for {id}"),
            choices: ["w", "x", "y", "z"].map(String::from),
            correct_index,
            explanation: None,
            question_type: None,
            meta: BTreeMap::new(),
        }
    }

    fn normalized_passage() -> NormalizedPassage {
        NormalizedPassage {
            id: "20".to_string(),
            title: "Meteorites".to_string(),
            content: "Body.".to_string(),
            questions: vec![
                normalized_question("20-1", 1),
                normalized_question("20-2", 3),
            ],
        }
    }

    #[test]
    fn canonical_passage_ids() {
        assert_eq!(canonical_passage_id("7"), "P7");
        assert_eq!(canonical_passage_id("07"), "P7");
        assert_eq!(canonical_passage_id("p12"), "P12");
        assert_eq!(canonical_passage_id("P012"), "P12");
        assert_eq!(canonical_passage_id("reading-20"), "P20");
        assert_eq!(canonical_passage_id("READING-P3"), "P3");
        assert_eq!(canonical_passage_id("PX"), "PX");
        assert_eq!(canonical_passage_id("  "), "");
    }

    #[test]
    fn assembly_re_derives_letters() {
        let set = exam_set_from_passage(&normalized_passage());
        assert_eq!(set.id, "reading-20");
        assert_eq!(set.title, "Reading Passage 20: Meteorites");

        let q = &set.questions[0];
        let letters: Vec<char> = q.choices.iter().map(|c| c.letter).collect();
        assert_eq!(letters, vec!['A', 'B', 'C', 'D']);
        assert_eq!(q.correct, vec!['B']);
        assert_eq!(set.questions[1].correct, vec!['D']);
        assert_eq!(q.kind, QuestionKind::Single);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut set = exam_set_from_passage(&normalized_passage());
        let extra = exam_question_from_normalized(&normalized_question("20-9", 0));

        assert!(merge_supplementary_question(&mut set, extra.clone()));
        assert_eq!(set.questions.len(), 3);
        assert!(!merge_supplementary_question(&mut set, extra));
        assert_eq!(set.questions.len(), 3);
    }

    #[test]
    fn sequence_assignment_fills_gaps_without_overwriting() {
        let mut set = exam_set_from_passage(&normalized_passage());
        set.questions[0].seq = Some(1);
        ensure_sequence(&mut set);
        assert_eq!(set.questions[0].seq, Some(1));
        assert_eq!(set.questions[1].seq, Some(2));

        // Merging afterwards keeps {1..N} intact.
        let extra = exam_question_from_normalized(&normalized_question("20-9", 0));
        merge_supplementary_question(&mut set, extra);
        ensure_sequence(&mut set);

        let mut seqs: Vec<u32> = set.questions.iter().filter_map(|q| q.seq).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn question_type_tag_selects_kind() {
        let mut q = normalized_question("20-10", 0);
        q.question_type = Some("summary".to_string());
        assert_eq!(exam_question_from_normalized(&q).kind, QuestionKind::Summary);

        q.question_type = Some("insert_sentence".to_string());
        assert_eq!(exam_question_from_normalized(&q).kind, QuestionKind::Single);
    }
}
