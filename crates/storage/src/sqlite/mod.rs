use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{QuestionRepository, Storage};

mod mapping;
mod migrate;
mod question_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

/// A private in-memory database lives and dies with a single connection.
fn is_private_memory(database_url: &str) -> bool {
    database_url.contains(":memory:")
        || (database_url.contains("mode=memory") && !database_url.contains("cache=shared"))
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// Foreign keys are switched on per connection; wrong answers rely on
    /// them to cascade when a question is deleted. Private in-memory URLs get
    /// one long-lived connection so every query sees the migrated schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// a connection pragma fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let mut options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        options = if is_private_memory(database_url) {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        };

        let pool = options
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        log::debug!("question storage ready at {database_url}");
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Ok(Self { questions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repository::NewQuestionRecord;
    use millionaire_core::time::fixed_now;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[test]
    fn only_unshared_memory_urls_are_private() {
        assert!(is_private_memory("sqlite::memory:"));
        assert!(is_private_memory("sqlite:file:bank?mode=memory"));
        assert!(!is_private_memory("sqlite:file:bank?mode=memory&cache=shared"));
        assert!(!is_private_memory("sqlite:///tmp/millionaire.sqlite3"));
    }

    #[tokio::test]
    async fn private_memory_storage_keeps_schema_across_queries() {
        let storage = Storage::sqlite("sqlite::memory:").await.unwrap();
        let record = NewQuestionRecord {
            level: 0,
            text: "Capital of France?".into(),
            correct_answer: "Paris".into(),
            wrong_answers: vec!["Lyon".into()],
            info: None,
            created_at: fixed_now(),
        };

        let (a, b, c) = tokio::join!(
            storage.questions.insert_new_question(record.clone()),
            storage.questions.insert_new_question(record.clone()),
            storage.questions.list_questions(),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        for _ in 0..5 {
            assert_eq!(storage.questions.list_questions().await.unwrap().len(), 2);
        }
    }
}
