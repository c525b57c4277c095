use std::sync::Arc;

use millionaire_core::model::{Question, QuestionDraft, QuestionId, QuestionPatch};
use serde::Deserialize;
use storage::repository::{LevelCount, NewQuestionRecord, QuestionRepository, StorageError};

use crate::Clock;
use crate::error::QuestionServiceError;

/// Admin input for a new question. Every field but `info` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewQuestion {
    pub level: Option<u32>,
    pub text: Option<String>,
    pub correct_answer: Option<String>,
    pub wrong_answers: Option<Vec<String>>,
    pub info: Option<String>,
}

impl NewQuestion {
    fn into_draft(self) -> Result<QuestionDraft, QuestionServiceError> {
        Ok(QuestionDraft {
            level: self.level.ok_or(QuestionServiceError::MissingField("level"))?,
            text: self.text.ok_or(QuestionServiceError::MissingField("text"))?,
            correct_answer: self
                .correct_answer
                .ok_or(QuestionServiceError::MissingField("correct_answer"))?,
            wrong_answers: self
                .wrong_answers
                .ok_or(QuestionServiceError::MissingField("wrong_answers"))?,
            info: self.info,
        })
    }
}

/// Content management for the question bank.
///
/// Unlike the player-facing engine, results here include the correct answer.
#[derive(Clone)]
pub struct QuestionService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { clock, questions }
    }

    /// List every question ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn list_questions(&self) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.questions.list_questions().await?)
    }

    /// Fetch one question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::NotFound` if the ID is unknown.
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn get_question(&self, id: QuestionId) -> Result<Question, QuestionServiceError> {
        self.questions
            .get_question(id)
            .await?
            .ok_or(QuestionServiceError::NotFound(id))
    }

    /// Validate and store a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::MissingField` for absent required fields,
    /// `QuestionServiceError::Question` for invalid content and
    /// `QuestionServiceError::Storage` if persistence fails.
    pub async fn create_question(&self, input: NewQuestion) -> Result<Question, QuestionServiceError> {
        let validated = input.into_draft()?.validate(self.clock.now())?;
        let id = self
            .questions
            .insert_new_question(NewQuestionRecord::from_validated(&validated))
            .await?;
        log::info!("created question {id} on level {}", validated.level);
        Ok(validated.assign_id(id))
    }

    /// Apply a partial update to an existing question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::EmptyUpdate` if the patch changes nothing,
    /// `QuestionServiceError::NotFound` if the ID is unknown,
    /// `QuestionServiceError::Question` if the merged content is invalid and
    /// `QuestionServiceError::Storage` if persistence fails.
    pub async fn update_question(
        &self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question, QuestionServiceError> {
        if patch.is_empty() {
            return Err(QuestionServiceError::EmptyUpdate);
        }
        let current = self.get_question(id).await?;
        let updated = current.apply_patch(patch, self.clock.now())?;

        self.questions
            .update_question(&updated)
            .await
            .map_err(|e| not_found_as(id, e))?;
        log::info!("updated question {id}");
        Ok(updated)
    }

    /// Remove a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::NotFound` if the ID is unknown.
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuestionServiceError> {
        self.questions
            .delete_question(id)
            .await
            .map_err(|e| not_found_as(id, e))?;
        log::info!("deleted question {id}");
        Ok(())
    }

    /// Case-insensitive search over prompts and answers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn search_questions(&self, needle: &str) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.questions.search_questions(needle.trim()).await?)
    }

    /// Number of questions per level.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn level_counts(&self) -> Result<Vec<LevelCount>, QuestionServiceError> {
        Ok(self.questions.count_by_level().await?)
    }
}

fn not_found_as(id: QuestionId, err: StorageError) -> QuestionServiceError {
    match err {
        StorageError::NotFound => QuestionServiceError::NotFound(id),
        other => QuestionServiceError::Storage(other),
    }
}
