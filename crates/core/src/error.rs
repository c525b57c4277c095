use thiserror::Error;

use crate::model::QuestionError;
use crate::shuffle::ShuffleError;

/// Any domain failure raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Shuffle(#[from] ShuffleError),
}
