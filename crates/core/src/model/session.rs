use chrono::{DateTime, Utc};

use crate::model::QuestionId;

/// Points awarded per level reached: reaching level `n` adds `n * POINTS_PER_LEVEL`.
pub const POINTS_PER_LEVEL: u64 = 100;

/// Progress of one player through one game.
///
/// The issued question is remembered only by its id, the position of its
/// correct answer (which never leaves the server) and its background info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    level: u32,
    score: u64,
    pending: Option<PendingQuestion>,
    started_at: DateTime<Utc>,
}

/// The question currently out with the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub question_id: QuestionId,
    pub correct_index: usize,
    pub info: Option<String>,
}

/// Level and score after a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub score: u64,
}

impl SessionState {
    /// Fresh game at level 0 with no question issued.
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            level: 0,
            score: 0,
            pending: None,
            started_at,
        }
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True while a question is out and unanswered.
    #[must_use]
    pub fn is_awaiting_answer(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending_correct_index(&self) -> Option<usize> {
        self.pending.as_ref().map(|p| p.correct_index)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingQuestion> {
        self.pending.as_ref()
    }

    /// Record a newly issued question, replacing any earlier unanswered one.
    pub fn issue(&mut self, pending: PendingQuestion) {
        self.pending = Some(pending);
    }

    /// Consume the pending question, if any. Leaves the session untouched
    /// when nothing is pending.
    pub fn take_pending(&mut self) -> Option<PendingQuestion> {
        self.pending.take()
    }

    /// Advance one level and add the level-weighted reward.
    pub fn level_up(&mut self) -> LevelUp {
        self.level = self.level.saturating_add(1);
        self.score = self
            .score
            .saturating_add(POINTS_PER_LEVEL.saturating_mul(u64::from(self.level)));
        LevelUp {
            level: self.level,
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_session_starts_empty() {
        let session = SessionState::new(fixed_now());
        assert_eq!(session.level(), 0);
        assert_eq!(session.score(), 0);
        assert!(!session.is_awaiting_answer());
        assert_eq!(session.started_at(), fixed_now());
    }

    #[test]
    fn level_up_is_level_weighted() {
        let mut session = SessionState::new(fixed_now());
        assert_eq!(session.level_up(), LevelUp { level: 1, score: 100 });
        assert_eq!(session.level_up(), LevelUp { level: 2, score: 300 });
        assert_eq!(session.level_up(), LevelUp { level: 3, score: 600 });
    }

    fn pending(id: u64, correct_index: usize) -> PendingQuestion {
        PendingQuestion {
            question_id: QuestionId::new(id),
            correct_index,
            info: None,
        }
    }

    #[test]
    fn issue_overwrites_pending_question() {
        let mut session = SessionState::new(fixed_now());
        session.issue(pending(1, 2));
        session.issue(pending(2, 0));
        assert_eq!(session.pending_correct_index(), Some(0));
        assert_eq!(session.take_pending(), Some(pending(2, 0)));
        assert_eq!(session.take_pending(), None);
        assert!(!session.is_awaiting_answer());
    }
}
