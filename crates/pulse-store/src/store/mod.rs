//! SQLite-backed survey store.
//!
//! Split into focused submodules:
//! - `users` — user lifecycle (create, list, update, guarded delete, import)
//! - `campaigns` — campaign CRUD and active-window queries
//! - `responses` — response insertion, rolling totals, analytics
//! - `message_log` — append-only SMS audit trail and delivery reconciliation

mod campaigns;
mod message_log;
mod responses;
mod users;

pub use campaigns::{CampaignStats, DailyStats};
pub use message_log::SmsStat;
pub use responses::{AnalyticsSummary, UserWeeklySummary};

use pulse_core::config::{shellexpand, StoreConfig};
use pulse_core::error::PulseError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent survey store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new store, running migrations on first use.
    pub async fn new(config: &StoreConfig) -> Result<Self, PulseError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PulseError::Store(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| PulseError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| PulseError::Store(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Survey store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Quick liveness probe for status endpoints.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Run SQL migrations, tracking which have already been applied.
    /// Safe to call repeatedly: already-applied migrations are skipped.
    pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<(), PulseError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| PulseError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        PulseError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| PulseError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| PulseError::Store(format!("failed to record migration {name}: {e}")))?;
        }
        Ok(())
    }
}

/// Map an insert/update failure, promoting unique-key violations to
/// `Conflict` so callers can surface a 409 instead of a 500.
pub(crate) fn map_write_err(e: sqlx::Error, what: &str) -> PulseError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        PulseError::Conflict(format!("{what}: duplicate key"))
    } else {
        PulseError::Store(format!("{what}: {msg}"))
    }
}
