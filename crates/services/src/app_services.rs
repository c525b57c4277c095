use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_service::QuestionService;
use crate::quiz::{QuizConfig, QuizEngine, SessionRegistry};

/// Assembles the player-facing and admin services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    engine: Arc<QuizEngine>,
    questions: Arc<QuestionService>,
    sessions: SessionRegistry,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, config: QuizConfig) -> Self {
        let engine = Arc::new(
            QuizEngine::new(clock, Arc::clone(&storage.questions)).with_config(config),
        );
        let questions = Arc::new(QuestionService::new(clock, Arc::clone(&storage.questions)));
        Self {
            engine,
            questions,
            sessions: SessionRegistry::new(),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: QuizConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, config))
    }

    #[must_use]
    pub fn engine(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.engine)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
