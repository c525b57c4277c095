//! Shared error types for the services crate.

use thiserror::Error;

use millionaire_core::ShuffleError;
use millionaire_core::model::{QuestionError, QuestionId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizEngine`.
///
/// Every variant is a client-side or collaborator failure. None of them
/// leaves a session half-updated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("game not started")]
    NotStarted,
    #[error("no active question")]
    NoActiveQuestion,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("question repository unavailable")]
    RepositoryUnavailable(#[source] StorageError),
    #[error(transparent)]
    Shuffle(#[from] ShuffleError),
}

impl QuizError {
    /// True for errors caused by the caller rather than by the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QuizError::NotStarted | QuizError::NoActiveQuestion | QuizError::InvalidInput(_)
        )
    }
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("no input data provided")]
    EmptyUpdate,
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
