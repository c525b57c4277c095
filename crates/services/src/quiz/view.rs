use serde::Serialize;
use serde_json::{Value, json};

/// Reply to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartView {
    pub level: u32,
    pub score: u64,
}

impl StartView {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "level": self.level, "score": self.score })
    }
}

/// A question as the player sees it: prompt and shuffled answers only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub text: String,
    pub answers: Vec<String>,
    pub level: u32,
}

/// Reply to `begin_or_continue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    Question(QuestionView),
    /// The player's level has no questions left; the session is gone.
    Win { score: u64 },
}

impl QuestionOutcome {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            QuestionOutcome::Question(view) => {
                json!({ "text": view.text, "answers": view.answers, "level": view.level })
            }
            QuestionOutcome::Win { score } => json!({ "outcome": "win", "score": score }),
        }
    }
}

/// Reply to `submit_answer`.
///
/// `info` is the resolved question's background fact, when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct {
        level: u32,
        score: u64,
        info: Option<String>,
    },
    GameOver {
        final_score: u64,
        info: Option<String>,
    },
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct { .. })
    }

    #[must_use]
    pub fn info(&self) -> Option<&str> {
        match self {
            AnswerOutcome::Correct { info, .. } | AnswerOutcome::GameOver { info, .. } => {
                info.as_deref()
            }
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = match self {
            AnswerOutcome::Correct { level, score, .. } => {
                json!({ "correct": true, "level": level, "score": score })
            }
            AnswerOutcome::GameOver { final_score, .. } => {
                json!({ "correct": false, "game_over": true, "final_score": final_score })
            }
        };
        if let (Some(info), Some(map)) = (self.info(), value.as_object_mut()) {
            map.insert("info".into(), Value::from(info));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_json_has_no_answer_key() {
        let outcome = QuestionOutcome::Question(QuestionView {
            text: "Capital of France?".into(),
            answers: vec!["Nice".into(), "Paris".into()],
            level: 0,
        });
        let value = outcome.to_json();

        assert_eq!(value["text"], "Capital of France?");
        assert_eq!(value["answers"][1], "Paris");
        assert_eq!(value["level"], 0);
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn win_and_answer_shapes() {
        assert_eq!(
            QuestionOutcome::Win { score: 300 }.to_json(),
            json!({ "outcome": "win", "score": 300 })
        );
        assert_eq!(
            AnswerOutcome::Correct {
                level: 1,
                score: 100,
                info: None
            }
            .to_json(),
            json!({ "correct": true, "level": 1, "score": 100 })
        );
        assert_eq!(
            AnswerOutcome::GameOver {
                final_score: 100,
                info: Some("Since 987.".into())
            }
            .to_json(),
            json!({ "correct": false, "game_over": true, "final_score": 100, "info": "Since 987." })
        );
    }

    #[test]
    fn start_shape() {
        assert_eq!(
            StartView { level: 0, score: 0 }.to_json(),
            json!({ "level": 0, "score": 0 })
        );
    }
}
