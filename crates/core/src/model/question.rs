use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question content, as typed by an author or read from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub level: u32,
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl QuestionDraft {
    /// Trim and check every field.
    ///
    /// Blank `info` is normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any answer is blank, or if
    /// there is no wrong answer to shuffle against.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuestion, QuestionError> {
        let text = non_blank(self.text).ok_or(QuestionError::EmptyText)?;
        let correct_answer = non_blank(self.correct_answer).ok_or(QuestionError::EmptyCorrectAnswer)?;

        if self.wrong_answers.is_empty() {
            return Err(QuestionError::NoWrongAnswers);
        }
        let wrong_answers = self
            .wrong_answers
            .into_iter()
            .enumerate()
            .map(|(index, answer)| non_blank(answer).ok_or(QuestionError::EmptyWrongAnswer { index }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedQuestion {
            level: self.level,
            text,
            correct_answer,
            wrong_answers,
            info: self.info.and_then(non_blank),
            created_at: now,
        })
    }
}

/// Question content that passed validation but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub level: u32,
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            level: self.level,
            text: self.text,
            correct_answer: self.correct_answer,
            wrong_answers: self.wrong_answers,
            info: self.info,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// A stored quiz question.
///
/// Fields are private so every instance went through `QuestionDraft::validate`
/// or `Question::from_persisted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    level: u32,
    text: String,
    correct_answer: String,
    wrong_answers: Vec<String>,
    info: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Question {
    /// Rehydrate a question from storage, re-running content validation.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the persisted content is no longer valid.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        level: u32,
        text: String,
        correct_answer: String,
        wrong_answers: Vec<String>,
        info: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let draft = QuestionDraft {
            level,
            text,
            correct_answer,
            wrong_answers,
            info,
        };
        let mut question = draft.validate(created_at)?.assign_id(id);
        question.updated_at = updated_at;
        Ok(question)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
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
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn wrong_answers(&self) -> &[String] {
        &self.wrong_answers
    }

    #[must_use]
    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Total number of answer choices (correct plus wrong).
    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.wrong_answers.len() + 1
    }

    /// Case-insensitive substring match over the prompt and every answer.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        std::iter::once(self.text.as_str())
            .chain(std::iter::once(self.correct_answer.as_str()))
            .chain(self.wrong_answers.iter().map(String::as_str))
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Apply a partial update, re-validating the merged content.
    ///
    /// `id` and `created_at` are preserved; `updated_at` is set to `now`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the merged content fails validation.
    pub fn apply_patch(&self, patch: QuestionPatch, now: DateTime<Utc>) -> Result<Self, QuestionError> {
        let draft = QuestionDraft {
            level: patch.level.unwrap_or(self.level),
            text: patch.text.unwrap_or_else(|| self.text.clone()),
            correct_answer: patch
                .correct_answer
                .unwrap_or_else(|| self.correct_answer.clone()),
            wrong_answers: patch
                .wrong_answers
                .unwrap_or_else(|| self.wrong_answers.clone()),
            info: match patch.info {
                Some(info) => Some(info),
                None => self.info.clone(),
            },
        };
        let mut updated = draft.validate(self.created_at)?.assign_id(self.id);
        updated.updated_at = now;
        Ok(updated)
    }
}

/// Partial update for an existing question. `None` keeps the current value.
///
/// Setting `info` to an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPatch {
    pub level: Option<u32>,
    pub text: Option<String>,
    pub correct_answer: Option<String>,
    pub wrong_answers: Option<Vec<String>>,
    pub info: Option<String>,
}

impl QuestionPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.text.is_none()
            && self.correct_answer.is_none()
            && self.wrong_answers.is_none()
            && self.info.is_none()
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("correct answer is empty")]
    EmptyCorrectAnswer,

    #[error("a question needs at least one wrong answer")]
    NoWrongAnswers,

    #[error("wrong answer #{index} is empty")]
    EmptyWrongAnswer { index: usize },
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_owned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
