use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{Activity, ActivitySnapshot},
    error::RosterError,
};
use tokio::sync::RwLock;

use crate::{seed::RosterSeed, RosterStore, StoreError};

/// Process-local roster guarded by a single lock.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    activities: Arc<RwLock<ActivitySnapshot>>,
}

impl MemoryRosterStore {
    pub fn new(activities: ActivitySnapshot) -> Self {
        Self {
            activities: Arc::new(RwLock::new(activities)),
        }
    }

    pub fn from_seed(seed: &RosterSeed) -> Self {
        Self::new(seed.to_snapshot())
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn list(&self) -> Result<ActivitySnapshot, StoreError> {
        Ok(self.activities.read().await.clone())
    }

    async fn activity(&self, name: &str) -> Result<Option<Activity>, StoreError> {
        Ok(self.activities.read().await.get(name).cloned())
    }

    async fn signup(&self, name: &str, email: &str) -> Result<Activity, StoreError> {
        let mut guard = self.activities.write().await;
        let activity = guard.get_mut(name).ok_or(RosterError::NotFound)?;
        if activity.has_participant(email) {
            return Err(RosterError::AlreadyRegistered.into());
        }
        if activity.is_full() {
            return Err(RosterError::Full.into());
        }
        activity.participants.push(email.to_string());
        Ok(activity.clone())
    }

    async fn unregister(&self, name: &str, email: &str) -> Result<Activity, StoreError> {
        let mut guard = self.activities.write().await;
        let activity = guard.get_mut(name).ok_or(RosterError::NotFound)?;
        let position = activity
            .participants
            .iter()
            .position(|p| p == email)
            .ok_or(RosterError::NotRegistered)?;
        activity.participants.remove(position);
        Ok(activity.clone())
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
