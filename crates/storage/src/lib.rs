#![forbid(unsafe_code)]

pub mod import;
pub mod repository;
pub mod sqlite;

pub use import::{ImportError, parse_question_file};
pub use repository::{
    InMemoryRepository, LevelCount, NewQuestionRecord, QuestionRepository, Storage, StorageError,
};
