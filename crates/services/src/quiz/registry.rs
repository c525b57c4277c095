use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use millionaire_core::model::{SessionId, SessionState};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One player's session slot. `None` means no game is running.
pub type SessionSlot = Arc<AsyncMutex<Option<SessionState>>>;

/// Per-player session slots keyed by `SessionId`.
///
/// Each slot has its own async mutex, so operations on one player's game run
/// one at a time while different players never wait on each other.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    slots: Arc<Mutex<HashMap<SessionId, SessionSlot>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty slot and return its id.
    #[must_use]
    pub fn open(&self) -> SessionId {
        let id = SessionId::random();
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(AsyncMutex::new(None)));
        id
    }

    /// Lock a player's slot for the duration of one operation.
    ///
    /// Returns `None` for unknown ids.
    pub async fn lock(&self, id: SessionId) -> Option<OwnedMutexGuard<Option<SessionState>>> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()?;
        Some(slot.lock_owned().await)
    }

    /// Forget a slot. Returns whether it existed.
    pub fn close(&self, id: SessionId) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millionaire_core::time::fixed_now;
    use std::time::Duration;

    #[tokio::test]
    async fn slots_are_independent() {
        let registry = SessionRegistry::new();
        let alice = registry.open();
        let bob = registry.open();
        assert_eq!(registry.len(), 2);

        registry
            .lock(alice)
            .await
            .unwrap()
            .replace(SessionState::new(fixed_now()));

        assert!(registry.lock(alice).await.unwrap().is_some());
        assert!(registry.lock(bob).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_and_closed_ids_have_no_slot() {
        let registry = SessionRegistry::new();
        assert!(registry.lock(SessionId::random()).await.is_none());

        let id = registry.open();
        assert!(registry.close(id));
        assert!(!registry.close(id));
        assert!(registry.lock(id).await.is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn same_slot_is_serialized() {
        let registry = SessionRegistry::new();
        let id = registry.open();

        let guard = registry.lock(id).await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(20), registry.lock(id)).await;
        assert!(second.is_err(), "second lock must wait for the first");

        drop(guard);
        assert!(registry.lock(id).await.is_some());
    }
}
