//! Answer shuffling for an issued question.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::{Question, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShuffleError {
    #[error("question {0} has no wrong answers to shuffle")]
    NoWrongAnswers(QuestionId),
    #[error("question {0} has an empty correct answer")]
    EmptyCorrectAnswer(QuestionId),
}

/// One draw of a question's answers in random order.
///
/// Built fresh each time a question is issued and never stored on the
/// `Question` itself. `correct_index` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledQuestion {
    question_id: QuestionId,
    level: u32,
    text: String,
    ordered_answers: Vec<String>,
    correct_index: usize,
}

impl ShuffledQuestion {
    /// Shuffle the answers of `question` uniformly.
    ///
    /// The correct answer is followed by slot, not by text, so duplicate
    /// answer strings still yield the slot the correct answer moved to.
    ///
    /// # Errors
    ///
    /// Returns `ShuffleError` if the question has no wrong answers or an
    /// empty correct answer.
    pub fn new<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Result<Self, ShuffleError> {
        if question.wrong_answers().is_empty() {
            return Err(ShuffleError::NoWrongAnswers(question.id()));
        }
        if question.correct_answer().is_empty() {
            return Err(ShuffleError::EmptyCorrectAnswer(question.id()));
        }

        let answers: Vec<&str> = std::iter::once(question.correct_answer())
            .chain(question.wrong_answers().iter().map(String::as_str))
            .collect();

        // slot 0 is the correct answer
        let mut slots: Vec<usize> = (0..answers.len()).collect();
        slots.shuffle(rng);

        let mut correct_index = 0;
        let mut ordered_answers = Vec::with_capacity(slots.len());
        for (position, &slot) in slots.iter().enumerate() {
            if slot == 0 {
                correct_index = position;
            }
            ordered_answers.push(answers[slot].to_owned());
        }

        Ok(Self {
            question_id: question.id(),
            level: question.level(),
            text: question.text().to_owned(),
            ordered_answers,
            correct_index,
        })
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn ordered_answers(&self) -> &[String] {
        &self.ordered_answers
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Split into the player-visible parts and the server-side index.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<String>, usize) {
        (self.text, self.ordered_answers, self.correct_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn question(correct: &str, wrong: &[&str]) -> Question {
        QuestionDraft {
            level: 2,
            text: "Pick one".into(),
            correct_answer: correct.into(),
            wrong_answers: wrong.iter().map(|w| (*w).to_string()).collect(),
            info: None,
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(QuestionId::new(5))
    }

    #[test]
    fn shuffle_is_a_permutation_with_correct_index() {
        let q = question("Paris", &["Lyon", "Marseille", "Nice"]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let view = ShuffledQuestion::new(&q, &mut rng).unwrap();
            assert_eq!(view.ordered_answers()[view.correct_index()], "Paris");

            let mut got: Vec<&str> = view.ordered_answers().iter().map(String::as_str).collect();
            got.sort_unstable();
            assert_eq!(got, vec!["Lyon", "Marseille", "Nice", "Paris"]);
            assert_eq!(view.question_id(), q.id());
            assert_eq!(view.level(), 2);
        }
    }

    #[test]
    fn shuffle_uses_actual_answer_count() {
        let two = question("yes", &["no"]);
        let six = question("a", &["b", "c", "d", "e", "f"]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(ShuffledQuestion::new(&two, &mut rng).unwrap().ordered_answers().len(), 2);
        assert_eq!(ShuffledQuestion::new(&six, &mut rng).unwrap().ordered_answers().len(), 6);
    }

    #[test]
    fn correct_index_reaches_every_position() {
        let q = question("Paris", &["Lyon", "Marseille", "Nice"]);
        let mut rng = StdRng::seed_from_u64(42);

        let positions: HashSet<usize> = (0..200)
            .map(|_| ShuffledQuestion::new(&q, &mut rng).unwrap().correct_index())
            .collect();
        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn duplicate_texts_keep_a_valid_index() {
        let q = question("same", &["same", "other"]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let view = ShuffledQuestion::new(&q, &mut rng).unwrap();
            assert_eq!(view.ordered_answers()[view.correct_index()], "same");
        }
    }

    #[test]
    fn into_parts_keeps_index_consistent() {
        let q = question("Paris", &["Lyon"]);
        let mut rng = StdRng::seed_from_u64(11);
        let (text, answers, correct) = ShuffledQuestion::new(&q, &mut rng).unwrap().into_parts();
        assert_eq!(text, "Pick one");
        assert_eq!(answers[correct], "Paris");
    }

    #[test]
    fn correct_index_matches_the_only_correct_slot_for_any_seed() {
        let q = question("Paris", &["Lyon", "Marseille", "Nice", "Lille"]);

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let view = ShuffledQuestion::new(&q, &mut rng).unwrap();
            let hits: Vec<usize> = view
                .ordered_answers()
                .iter()
                .enumerate()
                .filter(|(_, answer)| *answer == "Paris")
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits, vec![view.correct_index()], "seed {seed}");
        }
    }
}
