use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{Activity, ActivitySnapshot},
    error::RosterError,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite, SqliteConnection,
};
use tokio::sync::RwLock;

use crate::{seed::RosterSeed, RosterStore, StoreError};

/// Roster persisted in SQLite.
///
/// Mutations take the write half of `write_lock` and run inside a transaction,
/// so capacity and duplicate checks always see the rows they are about to
/// change. Readers share the read half and observe whole operations only.
#[derive(Clone)]
pub struct SqliteRosterStore {
    pool: Pool<Sqlite>,
    write_lock: Arc<RwLock<()>>,
}

impl SqliteRosterStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            write_lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Inserts every seeded activity that is not stored yet, together with its
    /// initial roster. Activities already present keep their current roster.
    /// Returns how many activities were created.
    pub async fn provision(&self, seed: &RosterSeed) -> Result<usize> {
        seed.validate()?;

        let _guard = self.write_lock.write().await;
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for activity in &seed.activities {
            let inserted = sqlx::query(
                "INSERT INTO activities (name, description, schedule, max_participants)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(name) DO NOTHING
                 RETURNING id",
            )
            .bind(&activity.name)
            .bind(&activity.description)
            .bind(&activity.schedule)
            .bind(i64::from(activity.max_participants))
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("failed to provision activity '{}'", activity.name))?;

            let Some(row) = inserted else {
                continue;
            };
            let activity_id: i64 = row.get(0);
            for email in &activity.participants {
                sqlx::query("INSERT INTO participants (activity_id, email) VALUES (?, ?)")
                    .bind(activity_id)
                    .bind(email)
                    .execute(&mut *tx)
                    .await?;
            }
            created += 1;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn locate(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<StoredActivity>, StoreError> {
        let row = sqlx::query(
            "SELECT id, description, schedule, max_participants FROM activities WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(StoredActivity {
            id: row.get(0),
            description: row.get(1),
            schedule: row.get(2),
            max_participants: capacity_from_column(row.get(3))?,
        }))
    }

    async fn participants_of(
        conn: &mut SqliteConnection,
        activity_id: i64,
    ) -> Result<Vec<String>, StoreError> {
        let emails: Vec<String> = sqlx::query_scalar(
            "SELECT email FROM participants WHERE activity_id = ? ORDER BY id",
        )
        .bind(activity_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(emails)
    }

    async fn hydrate(
        conn: &mut SqliteConnection,
        stored: StoredActivity,
    ) -> Result<Activity, StoreError> {
        let participants = Self::participants_of(conn, stored.id).await?;
        Ok(Activity {
            description: stored.description,
            schedule: stored.schedule,
            max_participants: stored.max_participants,
            participants,
        })
    }
}

struct StoredActivity {
    id: i64,
    description: String,
    schedule: String,
    max_participants: u32,
}

fn capacity_from_column(raw: i64) -> Result<u32, StoreError> {
    u32::try_from(raw)
        .map_err(|_| StoreError::Backend(anyhow!("stored capacity {raw} is out of range")))
}

#[async_trait]
impl RosterStore for SqliteRosterStore {
    async fn list(&self) -> Result<ActivitySnapshot, StoreError> {
        let _guard = self.write_lock.read().await;
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(
            "SELECT id, name, description, schedule, max_participants
             FROM activities
             ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut snapshot = ActivitySnapshot::with_capacity(rows.len());
        for row in rows {
            let stored = StoredActivity {
                id: row.get(0),
                description: row.get(2),
                schedule: row.get(3),
                max_participants: capacity_from_column(row.get(4))?,
            };
            let name: String = row.get(1);
            let activity = Self::hydrate(&mut conn, stored).await?;
            snapshot.insert(name, activity);
        }
        Ok(snapshot)
    }

    async fn activity(&self, name: &str) -> Result<Option<Activity>, StoreError> {
        let _guard = self.write_lock.read().await;
        let mut conn = self.pool.acquire().await?;
        match Self::locate(&mut conn, name).await? {
            Some(stored) => Ok(Some(Self::hydrate(&mut conn, stored).await?)),
            None => Ok(None),
        }
    }

    async fn signup(&self, name: &str, email: &str) -> Result<Activity, StoreError> {
        let _guard = self.write_lock.write().await;
        let mut tx = self.pool.begin().await?;

        let stored = Self::locate(&mut tx, name)
            .await?
            .ok_or(RosterError::NotFound)?;
        let registered: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM participants WHERE activity_id = ? AND email = ?")
                .bind(stored.id)
                .bind(email)
                .fetch_optional(&mut *tx)
                .await?;
        if registered.is_some() {
            return Err(RosterError::AlreadyRegistered.into());
        }
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE activity_id = ?")
            .bind(stored.id)
            .fetch_one(&mut *tx)
            .await?;
        if taken >= i64::from(stored.max_participants) {
            return Err(RosterError::Full.into());
        }

        sqlx::query("INSERT INTO participants (activity_id, email) VALUES (?, ?)")
            .bind(stored.id)
            .bind(email)
            .execute(&mut *tx)
            .await?;
        let activity = Self::hydrate(&mut tx, stored).await?;
        tx.commit().await?;
        Ok(activity)
    }

    async fn unregister(&self, name: &str, email: &str) -> Result<Activity, StoreError> {
        let _guard = self.write_lock.write().await;
        let mut tx = self.pool.begin().await?;

        let stored = Self::locate(&mut tx, name)
            .await?
            .ok_or(RosterError::NotFound)?;
        let removed = sqlx::query("DELETE FROM participants WHERE activity_id = ? AND email = ?")
            .bind(stored.id)
            .bind(email)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(RosterError::NotRegistered.into());
        }

        let activity = Self::hydrate(&mut tx, stored).await?;
        tx.commit().await?;
        Ok(activity)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/sqlite_tests.rs"]
mod tests;
