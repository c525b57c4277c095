mod engine;
mod registry;
mod view;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use engine::{QuizConfig, QuizEngine, parse_answer_index};
pub use registry::{SessionRegistry, SessionSlot};
pub use view::{AnswerOutcome, QuestionOutcome, QuestionView, StartView};
