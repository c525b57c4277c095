use std::sync::Arc;

use millionaire_core::ShuffledQuestion;
use millionaire_core::model::{PendingQuestion, SessionState};
use storage::repository::QuestionRepository;

use super::view::{AnswerOutcome, QuestionOutcome, QuestionView, StartView};
use crate::Clock;
use crate::error::QuizError;

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizConfig {
    /// Create a session on the first question request instead of failing
    /// with `QuizError::NotStarted`.
    pub auto_start: bool,
}

/// Drives one player's game: issues questions and judges answers.
///
/// The engine does not own sessions. Callers hand in the player's slot
/// (`None` means no game) and must serialize calls for the same slot; see
/// `SessionRegistry`.
#[derive(Clone)]
pub struct QuizEngine {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    config: QuizConfig,
}

impl QuizEngine {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            clock,
            questions,
            config: QuizConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> QuizConfig {
        self.config
    }

    /// Reset the slot to a fresh game at level 0, whatever it held.
    pub fn start(&self, slot: &mut Option<SessionState>) -> StartView {
        let session = SessionState::new(self.clock.now());
        let view = StartView {
            level: session.level(),
            score: session.score(),
        };
        *slot = Some(session);
        view
    }

    /// Issue a random question on the session's level.
    ///
    /// Every call draws and shuffles anew, replacing any unanswered question.
    /// When the level has no questions the player has won and the session
    /// is cleared.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` if there is no session and auto-start
    /// is off. Returns `QuizError::RepositoryUnavailable` if the lookup fails;
    /// the slot is left as it was.
    pub async fn begin_or_continue(
        &self,
        slot: &mut Option<SessionState>,
    ) -> Result<QuestionOutcome, QuizError> {
        let level = match slot.as_ref() {
            Some(session) => session.level(),
            None if self.config.auto_start => 0,
            None => return Err(QuizError::NotStarted),
        };

        let drawn = self
            .questions
            .random_question_at_level(level)
            .await
            .map_err(|e| {
                log::warn!("question lookup for level {level} failed: {e}");
                QuizError::RepositoryUnavailable(e)
            })?;

        let Some(question) = drawn else {
            let score = slot.as_ref().map_or(0, SessionState::score);
            *slot = None;
            log::info!("level {level} exhausted, player wins with {score}");
            return Ok(QuestionOutcome::Win { score });
        };

        let shuffled = ShuffledQuestion::new(&question, &mut rand::rng())?;
        let (text, answers, correct_index) = shuffled.into_parts();

        let session = slot.get_or_insert_with(|| SessionState::new(self.clock.now()));
        session.issue(PendingQuestion {
            question_id: question.id(),
            correct_index,
            info: question.info().map(str::to_owned),
        });
        log::debug!("issued question {} on level {level}", question.id());

        Ok(QuestionOutcome::Question(QuestionView {
            text,
            answers,
            level,
        }))
    }

    /// Judge an answer to the pending question.
    ///
    /// Indexes outside the answer list, including negative ones, are wrong
    /// answers. A wrong answer ends the game and clears the slot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` without a session and
    /// `QuizError::NoActiveQuestion` when no question is pending. The slot
    /// is untouched in both cases.
    pub fn submit_answer(
        &self,
        slot: &mut Option<SessionState>,
        index: i64,
    ) -> Result<AnswerOutcome, QuizError> {
        let session = slot.as_mut().ok_or(QuizError::NotStarted)?;
        let pending = session.take_pending().ok_or(QuizError::NoActiveQuestion)?;

        if usize::try_from(index).ok() == Some(pending.correct_index) {
            let reached = session.level_up();
            log::info!(
                "correct answer to question {}, now level {} with {}",
                pending.question_id,
                reached.level,
                reached.score
            );
            return Ok(AnswerOutcome::Correct {
                level: reached.level,
                score: reached.score,
                info: pending.info,
            });
        }

        let final_score = session.score();
        *slot = None;
        log::info!(
            "wrong answer to question {}, game over with {final_score}",
            pending.question_id
        );
        Ok(AnswerOutcome::GameOver {
            final_score,
            info: pending.info,
        })
    }
}

/// Parse a raw answer index as received from a client.
///
/// # Errors
///
/// Returns `QuizError::InvalidInput` for missing, blank or non-integer input.
pub fn parse_answer_index(raw: Option<&str>) -> Result<i64, QuizError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QuizError::InvalidInput("missing answer index".into()))?;
    raw.parse::<i64>()
        .map_err(|_| QuizError::InvalidInput(format!("invalid answer index: {raw}")))
}
