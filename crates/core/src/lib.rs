#![forbid(unsafe_code)]

//! Domain model for the millionaire quiz: questions, answer shuffling and
//! per-player session progress.

pub mod error;
pub mod model;
pub mod shuffle;
pub mod time;

pub use error::Error;
pub use shuffle::{ShuffleError, ShuffledQuestion};
pub use time::Clock;
