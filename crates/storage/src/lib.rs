use async_trait::async_trait;
use shared::{
    domain::{Activity, ActivitySnapshot},
    error::RosterError,
};
use thiserror::Error;

mod memory;
mod seed;
mod sqlite;

pub use memory::MemoryRosterStore;
pub use seed::{ActivitySeed, RosterSeed, SeedError, DEFAULT_SEED_TOML};
pub use sqlite::SqliteRosterStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("roster backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Backend(value.into())
    }
}

impl StoreError {
    pub fn roster(&self) -> Option<RosterError> {
        match self {
            StoreError::Roster(kind) => Some(*kind),
            StoreError::Backend(_) => None,
        }
    }
}

/// Authoritative owner of every activity roster.
///
/// Implementations run each check-then-mutate sequence under mutual exclusion,
/// so a roster never exceeds `max_participants` and never holds the same email
/// twice, however many requests race.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn list(&self) -> Result<ActivitySnapshot, StoreError>;

    async fn activity(&self, name: &str) -> Result<Option<Activity>, StoreError>;

    /// Appends `email` to the roster. Checks run in order: unknown activity,
    /// duplicate email, capacity.
    async fn signup(&self, name: &str, email: &str) -> Result<Activity, StoreError>;

    async fn unregister(&self, name: &str, email: &str) -> Result<Activity, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
