//! Built-in fallback exam set.
//!
//! Served when no bank is configured and when single-question mode receives a
//! trimmed set, since single-question navigation assumes a full ten-question
//! exam.

use std::collections::BTreeMap;

use readex_core::model::{Choice, ExamQuestion, ExamSet, QuestionKind};

fn single(id: &str, seq: u32, prompt: &str, choices: [&str; 4], correct: char) -> ExamQuestion {
    ExamQuestion {
        id: id.to_string(),
        kind: QuestionKind::Single,
        prompt: prompt.to_string(),
        choices: choices
            .iter()
            .enumerate()
            .map(|(i, text)| Choice {
                letter: (b'A' + i as u8) as char,
                text: (*text).to_string(),
            })
            .collect(),
        correct: vec![correct],
        explanation: None,
        seq: Some(seq),
        meta: BTreeMap::new(),
    }
}

/// The bundled reading set, always ten questions.
pub fn default_exam_set() -> ExamSet {
    let passage = "\
The glass sponges of the deep Pacific build their skeletons from silica \
drawn out of seawater, weaving it into lattices that can stand for \
centuries after the animal itself has died. Because the sponges grow at a \
nearly constant rate, the layered structure of a skeleton preserves a \
record of the water that surrounded it, much as tree rings preserve a \
record of past climate on land. Researchers who section the oldest \
skeletons have found individuals that settled on the seafloor more than \
ten thousand years ago, making them among the longest-lived animals known.

Reading such a record is not straightforward. Silica is deposited slowly \
and the chemical signals within it are faint, so a single skeleton yields \
only a coarse history. To sharpen the picture, teams compare dozens of \
skeletons collected across a region, aligning their layers by shared \
volcanic ash bands. Where the records agree, they reveal shifts in deep \
ocean temperature that written observations, which span barely a century \
and a half, could never capture.

The sponges also complicate a tidy story about the deep sea as an \
unchanging refuge. Several aligned records show an abrupt warming pulse \
roughly four thousand years ago, followed by a slow recovery. No surface \
climate archive shows a matching event, which suggests that the deep \
ocean can change on its own schedule rather than simply echoing the \
atmosphere above it.";

    let mut questions = vec![
        single(
            "S1-1",
            1,
            "According to paragraph 1, the skeletons of glass sponges are useful to researchers because they",
            [
                "dissolve quickly once the animal dies",
                "grow at a nearly constant rate",
                "are built from material found only on land",
                "change shape in response to warming water",
            ],
            'B',
        ),
        single(
            "S1-2",
            2,
            "The word \"preserves\" in paragraph 1 is closest in meaning to",
            ["distorts", "retains", "conceals", "replaces"],
            'B',
        ),
        single(
            "S1-3",
            3,
            "Why does the author mention tree rings in paragraph 1?",
            [
                "To argue that land archives are more reliable than marine ones",
                "To give a familiar example of a layered natural record",
                "To explain how silica enters seawater",
                "To show that sponges and trees grow at the same rate",
            ],
            'B',
        ),
        single(
            "S1-4",
            4,
            "According to paragraph 2, a single sponge skeleton yields only a coarse history because",
            [
                "volcanic ash destroys most of its layers",
                "its chemical signals are faint and deposited slowly",
                "researchers cannot determine where it grew",
                "written observations contradict it",
            ],
            'B',
        ),
        single(
            "S1-5",
            5,
            "Paragraph 2 indicates that researchers align skeletons from different sites by using",
            [
                "shared volcanic ash bands",
                "the ages of the oldest individuals",
                "measurements of modern water temperature",
                "the thickness of the outermost layer",
            ],
            'A',
        ),
        single(
            "S1-6",
            6,
            "The word \"capture\" in paragraph 2 is closest in meaning to",
            ["record", "prevent", "imitate", "predict"],
            'A',
        ),
        single(
            "S1-7",
            7,
            "Which of the following can be inferred from paragraph 3 about the warming pulse?",
            [
                "It was first detected in surface climate archives",
                "It originated within the deep ocean itself",
                "It destroyed most sponge populations in the region",
                "It lasted less than a decade",
            ],
            'B',
        ),
        single(
            "S1-8",
            8,
            "The author describes the deep sea as complicating \"a tidy story\" in order to",
            [
                "question the methods used to section skeletons",
                "challenge the idea that the deep ocean merely echoes the atmosphere",
                "support the claim that sponges are the longest-lived animals",
                "explain why observations span only a century and a half",
            ],
            'B',
        ),
        single(
            "S1-9",
            9,
            "According to the passage, written observations of deep ocean temperature",
            [
                "span roughly a century and a half",
                "extend back ten thousand years",
                "are aligned using ash bands",
                "show an abrupt warming pulse",
            ],
            'A',
        ),
    ];

    let summary_choices = [
        "Their skeletons grow steadily and preserve a layered chemical record of surrounding water.",
        "Combining many aligned skeletons reveals temperature shifts far beyond the reach of written records.",
        "Some aligned records show deep ocean changes with no counterpart at the surface.",
        "Glass sponges are found only in the deep Pacific.",
        "Tree rings are a more accurate climate archive than sponge skeletons.",
        "Volcanic eruptions four thousand years ago warmed the atmosphere.",
    ];
    questions.push(ExamQuestion {
        id: "S1-10".to_string(),
        kind: QuestionKind::Summary,
        prompt: "An introductory sentence for a brief summary of the passage is provided below. \
                 Select the THREE answer choices that express the most important ideas in the passage. \
                 Glass sponge skeletons serve as long archives of deep ocean history."
            .to_string(),
        choices: summary_choices
            .iter()
            .enumerate()
            .map(|(i, text)| Choice {
                letter: (b'A' + i as u8) as char,
                text: (*text).to_string(),
            })
            .collect(),
        correct: vec!['A', 'B', 'C'],
        explanation: None,
        seq: Some(10),
        meta: BTreeMap::new(),
    });

    ExamSet {
        id: "reading-sample".to_string(),
        title: "Reading Passage: Archives in Glass".to_string(),
        passage: passage.to_string(),
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readex_core::grade::grade_with_scaled;
    use readex_core::model::AnswerMap;

    #[test]
    fn has_ten_sequenced_questions() {
        let set = default_exam_set();
        assert_eq!(set.questions.len(), 10);
        let seqs: Vec<u32> = set.questions.iter().filter_map(|q| q.seq).collect();
        assert_eq!(seqs, (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn summary_question_has_six_choices_and_three_keys() {
        let set = default_exam_set();
        let summary = set.questions.last().unwrap();
        assert_eq!(summary.kind, QuestionKind::Summary);
        assert_eq!(summary.choices.len(), 6);
        assert_eq!(summary.correct.len(), 3);
    }

    #[test]
    fn perfect_answers_hit_top_of_scale() {
        let set = default_exam_set();
        let answers: AnswerMap = set
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.correct.clone()))
            .collect();
        let result = grade_with_scaled(&set.questions, &answers, None);
        assert_eq!(result.score, result.total);
        assert_eq!(result.scaled, 30);
    }
}
