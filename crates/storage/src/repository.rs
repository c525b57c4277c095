use async_trait::async_trait;
use chrono::{DateTime, Utc};
use millionaire_core::model::{Question, QuestionId, ValidatedQuestion};
use rand::seq::IndexedRandom;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a question that has no id yet.
///
/// The repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub level: u32,
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewQuestionRecord {
    #[must_use]
    pub fn from_validated(question: &ValidatedQuestion) -> Self {
        Self {
            level: question.level,
            text: question.text.clone(),
            correct_answer: question.correct_answer.clone(),
            wrong_answers: question.wrong_answers.clone(),
            info: question.info.clone(),
            created_at: question.created_at,
        }
    }
}

/// Number of stored questions on one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCount {
    pub level: u32,
    pub count: u64,
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Pick one question on `level`, each with equal probability.
    ///
    /// Returns `Ok(None)` when the level has no questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn random_question_at_level(&self, level: u32) -> Result<Option<Question>, StorageError>;

    /// All questions ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Insert a new question and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_new_question(&self, record: NewQuestionRecord) -> Result<QuestionId, StorageError>;

    /// Replace an existing question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this ID.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Remove a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this ID.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// Case-insensitive substring search over prompt and answers, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn search_questions(&self, needle: &str) -> Result<Vec<Question>, StorageError>;

    /// Question counts per level, ascending by level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn count_by_level(&self) -> Result<Vec<LevelCount>, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    questions: BTreeMap<QuestionId, Question>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn choose_uniform(candidates: &[&Question]) -> Option<Question> {
    candidates.choose(&mut rand::rng()).map(|q| (*q).clone())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn random_question_at_level(&self, level: u32) -> Result<Option<Question>, StorageError> {
        let guard = self.lock()?;
        let candidates: Vec<&Question> = guard
            .questions
            .values()
            .filter(|q| q.level() == level)
            .collect();
        Ok(choose_uniform(&candidates))
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.questions.values().cloned().collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.questions.get(&id).cloned())
    }

    async fn insert_new_question(&self, record: NewQuestionRecord) -> Result<QuestionId, StorageError> {
        let mut guard = self.lock()?;
        guard.next_id += 1;
        let id = QuestionId::new(guard.next_id);
        let question = Question::from_persisted(
            id,
            record.level,
            record.text,
            record.correct_answer,
            record.wrong_answers,
            record.info,
            record.created_at,
            record.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.questions.insert(id, question);
        Ok(id)
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        match guard.questions.get_mut(&question.id()) {
            Some(slot) => {
                *slot = question.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn search_questions(&self, needle: &str) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .filter(|q| q.matches(needle))
            .cloned()
            .collect())
    }

    async fn count_by_level(&self) -> Result<Vec<LevelCount>, StorageError> {
        let guard = self.lock()?;
        let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
        for question in guard.questions.values() {
            *counts.entry(question.level()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(level, count)| LevelCount { level, count })
            .collect())
    }
}

/// Holds the question repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(InMemoryRepository::new());
        Self { questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millionaire_core::model::QuestionDraft;
    use millionaire_core::time::fixed_now;
    use std::collections::HashSet;

    fn record(level: u32, text: &str, correct: &str) -> NewQuestionRecord {
        let validated = QuestionDraft {
            level,
            text: text.into(),
            correct_answer: correct.into(),
            wrong_answers: vec!["Lyon".into(), "Marseille".into(), "Nice".into()],
            info: None,
        }
        .validate(fixed_now())
        .unwrap();
        NewQuestionRecord::from_validated(&validated)
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let repo = InMemoryRepository::new();
        let a = repo.insert_new_question(record(0, "A?", "a")).await.unwrap();
        let b = repo.insert_new_question(record(0, "B?", "b")).await.unwrap();
        assert!(b > a);

        let listed = repo.list_questions().await.unwrap();
        assert_eq!(listed.iter().map(Question::id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[tokio::test]
    async fn random_question_stays_on_level_and_covers_it() {
        let repo = InMemoryRepository::new();
        for i in 0..3 {
            repo.insert_new_question(record(1, &format!("L1 #{i}"), "x"))
                .await
                .unwrap();
        }
        repo.insert_new_question(record(2, "L2", "y")).await.unwrap();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let q = repo.random_question_at_level(1).await.unwrap().unwrap();
            assert_eq!(q.level(), 1);
            seen.insert(q.id());
        }
        assert_eq!(seen.len(), 3);
        assert!(repo.random_question_at_level(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_new_question(record(0, "Q?", "a")).await.unwrap();
        let question = repo.get_question(id).await.unwrap().unwrap();

        repo.delete_question(id).await.unwrap();
        assert!(matches!(
            repo.delete_question(id).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.update_question(&question).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn search_and_level_counts() {
        let repo = InMemoryRepository::new();
        repo.insert_new_question(record(0, "Capital of France?", "Paris"))
            .await
            .unwrap();
        repo.insert_new_question(record(0, "Capital of Italy?", "Rome"))
            .await
            .unwrap();
        repo.insert_new_question(record(3, "Largest ocean?", "Pacific"))
            .await
            .unwrap();

        assert_eq!(repo.search_questions("capital").await.unwrap().len(), 2);
        assert_eq!(repo.search_questions("marseille").await.unwrap().len(), 3);
        assert!(repo.search_questions("Berlin").await.unwrap().is_empty());

        let counts = repo.count_by_level().await.unwrap();
        assert_eq!(
            counts,
            vec![
                LevelCount { level: 0, count: 2 },
                LevelCount { level: 3, count: 1 },
            ]
        );
    }
}
