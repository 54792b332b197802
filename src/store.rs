use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub times_started: i64,
    pub last_seen: String,
}

/// Thread-safe SQLite store for user records, interaction log and blocklist.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Enable WAL mode for better concurrent read performance
        // journal_mode PRAGMA always returns the resulting mode, so use query_row
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        Self::run_migrations(&conn)?;

        info!("Store initialized at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            -- One row per user who ever issued /start or had a submission relayed
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                times_started INTEGER NOT NULL DEFAULT 0,
                last_seen TEXT NOT NULL
            );

            -- Append-only interaction log
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                interaction_time TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_user
                ON interactions(user_id, interaction_time);

            CREATE TABLE IF NOT EXISTS blocked_users (
                id INTEGER PRIMARY KEY
            );
            ",
        )
        .context("Failed to run migrations")?;

        Ok(())
    }

    /// Insert a user on first sight, otherwise bump the start counter and
    /// advance last_seen.
    pub async fn record_or_touch_user(&self, user_id: u64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, times_started, last_seen) VALUES (?1, 1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                times_started = times_started + 1,
                last_seen = excluded.last_seen",
            rusqlite::params![user_id as i64, now],
        )
        .context("Failed to upsert user")?;
        Ok(())
    }

    /// Append a row to the interaction log.
    pub async fn record_interaction(&self, user_id: u64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO interactions (user_id, interaction_time) VALUES (?1, ?2)",
            rusqlite::params![user_id as i64, now],
        )
        .context("Failed to record interaction")?;
        Ok(())
    }

    /// Add a user to the blocklist. Blocking an already-blocked user is a no-op.
    pub async fn block_user(&self, user_id: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO blocked_users (id) VALUES (?1)",
            rusqlite::params![user_id as i64],
        )
        .context("Failed to block user")?;
        Ok(())
    }

    pub async fn is_blocked(&self, user_id: u64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM blocked_users WHERE id = ?1",
            rusqlite::params![user_id as i64],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Look up a user record by id.
    #[allow(dead_code)]
    pub async fn user(&self, user_id: u64) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                "SELECT id, times_started, last_seen FROM users WHERE id = ?1",
                rusqlite::params![user_id as i64],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        times_started: row.get(1)?,
                        last_seen: row.get(2)?,
                    })
                },
            )
            .ok();
        Ok(record)
    }

    /// Number of logged interactions for a user.
    #[allow(dead_code)]
    pub async fn interaction_count(&self, user_id: u64) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM interactions WHERE user_id = ?1",
            rusqlite::params![user_id as i64],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
