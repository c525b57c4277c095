#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_service;
pub mod quiz;

pub use millionaire_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionServiceError, QuizError};
pub use question_service::{NewQuestion, QuestionService};

pub use quiz::{
    AnswerOutcome, QuestionOutcome, QuestionView, QuizConfig, QuizEngine, SessionRegistry,
    StartView, parse_answer_index,
};
