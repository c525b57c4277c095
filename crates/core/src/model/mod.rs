mod ids;
mod question;
mod session;

pub use ids::{ParseIdError, QuestionId, SessionId};

pub use question::{Question, QuestionDraft, QuestionError, QuestionPatch, ValidatedQuestion};
pub use session::{LevelUp, POINTS_PER_LEVEL, PendingQuestion, SessionState};
