use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use readex_core::grade::{grade, scale_score};
use readex_core::model::{letter_for_slot, AnswerMap, Choice, ExamQuestion, QuestionKind};
use readex_core::shuffle::shuffle_exam_set;
use readex_core::model::ExamSet;

fn make_question(id: usize, kind: QuestionKind, correct: Vec<char>) -> ExamQuestion {
    ExamQuestion {
        id: format!("P1-Q{id}"),
        kind,
        prompt: format!("bench prompt {id}"),
        choices: (0..6)
            .map(|slot| Choice {
                letter: letter_for_slot(slot),
                text: format!("choice text {slot} for question {id}"),
            })
            .collect(),
        correct,
        explanation: None,
        seq: Some(id as u32),
        meta: BTreeMap::new(),
    }
}

fn make_exam() -> (Vec<ExamQuestion>, AnswerMap) {
    let mut questions: Vec<ExamQuestion> = (1..=9)
        .map(|i| make_question(i, QuestionKind::Single, vec!['B']))
        .collect();
    questions.push(make_question(10, QuestionKind::Summary, vec!['A', 'C', 'E']));

    let mut answers = AnswerMap::new();
    for q in &questions {
        answers.insert(q.id.clone(), vec!['B']);
    }
    answers.insert("P1-Q10".to_string(), vec!['A', 'C', 'E']);

    (questions, answers)
}

fn bench_grade(c: &mut Criterion) {
    let (questions, answers) = make_exam();
    let mut group = c.benchmark_group("grade");

    group.bench_function("full_exam", |b| {
        b.iter(|| grade(black_box(&questions), black_box(&answers), None))
    });

    group.bench_function("scale_score", |b| {
        b.iter(|| scale_score(black_box(7), black_box(11)))
    });

    group.finish();
}

fn bench_shuffle(c: &mut Criterion) {
    let (questions, _) = make_exam();
    let set = ExamSet {
        id: "reading-1".into(),
        title: "Reading Passage 1".into(),
        passage: "bench passage".into(),
        questions,
    };

    c.bench_function("shuffle_exam_set", |b| {
        b.iter(|| shuffle_exam_set(black_box(&set), black_box(42)))
    });
}

criterion_group!(benches, bench_grade, bench_shuffle);
criterion_main!(benches);
