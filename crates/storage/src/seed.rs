use std::{collections::HashSet, fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared::domain::{Activity, ActivitySnapshot};
use thiserror::Error;

pub const DEFAULT_SEED_TOML: &str = include_str!("../seed/activities.toml");

/// Out-of-band provisioning data: the activity catalogue and initial rosters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSeed {
    #[serde(rename = "activity", default)]
    pub activities: Vec<ActivitySeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySeed {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("activity name must not be empty")]
    EmptyName,
    #[error("activity '{0}' is declared more than once")]
    DuplicateActivity(String),
    #[error("activity '{0}' must allow at least one participant")]
    ZeroCapacity(String),
    #[error("activity '{activity}' lists '{email}' more than once")]
    DuplicateParticipant { activity: String, email: String },
    #[error("activity '{activity}' seeds {count} participants but allows {max}")]
    OverCapacity {
        activity: String,
        count: usize,
        max: u32,
    },
}

impl RosterSeed {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(DEFAULT_SEED_TOML).context("built-in roster seed is invalid")
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let seed: RosterSeed = toml::from_str(raw).context("failed to parse roster seed")?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read roster seed '{}'", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in roster seed '{}'", path.display()))
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        let mut names = HashSet::new();
        for activity in &self.activities {
            if activity.name.trim().is_empty() {
                return Err(SeedError::EmptyName);
            }
            if !names.insert(activity.name.as_str()) {
                return Err(SeedError::DuplicateActivity(activity.name.clone()));
            }
            if activity.max_participants == 0 {
                return Err(SeedError::ZeroCapacity(activity.name.clone()));
            }

            let mut emails = HashSet::new();
            for email in &activity.participants {
                if !emails.insert(email.as_str()) {
                    return Err(SeedError::DuplicateParticipant {
                        activity: activity.name.clone(),
                        email: email.clone(),
                    });
                }
            }
            if activity.participants.len() > activity.max_participants as usize {
                return Err(SeedError::OverCapacity {
                    activity: activity.name.clone(),
                    count: activity.participants.len(),
                    max: activity.max_participants,
                });
            }
        }
        Ok(())
    }

    pub fn to_snapshot(&self) -> ActivitySnapshot {
        self.activities
            .iter()
            .map(|seed| {
                (
                    seed.name.clone(),
                    Activity {
                        description: seed.description.clone(),
                        schedule: seed.schedule.clone(),
                        max_participants: seed.max_participants,
                        participants: seed.participants.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/seed_tests.rs"]
mod tests;
