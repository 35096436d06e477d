//! SQLite-backed store. Every tenant-owned query is scoped by the caller's
//! [`TenantContext`].
//!
//! Split into focused submodules:
//! - `campaigns`: campaign rows and the auto-reply flag
//! - `contacts`: contact lookup, batch insert, upsert-with-merge import
//! - `messages`: per-lead history, read flags, conversation list
//! - `prompts`: AI prompt CRUD
//! - `tenants`: user → schema directory and custom settings
//! - `outbox`: failed webhook payloads awaiting redelivery

mod campaigns;
mod contacts;
mod messages;
mod outbox;
mod prompts;
mod tenants;


pub use contacts::{ContactStats, ImportReport, UpsertOutcome};
pub use outbox::{OutboxEntry, OutboxStatus};

use chrono::{DateTime, SecondsFormat, Utc};
use herald_core::{config::StoreConfig, error::HeraldError, shellexpand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store, running migrations on first use.
    ///
    /// `:memory:` opens a private in-memory database on a single connection.
    pub async fn new(config: &StoreConfig) -> Result<Self, HeraldError> {
        let pool = if config.is_in_memory() {
            let opts = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| HeraldError::Store(format!("invalid db path: {e}")))?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await
                .map_err(|e| HeraldError::Store(format!("failed to open sqlite: {e}")))?
        } else {
            let db_path = shellexpand(&config.db_path);

            // Ensure parent directory exists.
            if let Some(parent) = std::path::Path::new(&db_path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| HeraldError::Store(format!("failed to create data dir: {e}")))?;
            }

            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
                .map_err(|e| HeraldError::Store(format!("invalid db path: {e}")))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(opts)
                .await
                .map_err(|e| HeraldError::Store(format!("failed to connect to sqlite: {e}")))?;
            info!("Store initialized at {db_path}");
            pool
        };

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, HeraldError> {
        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HeraldError::Store(format!("pragma failed: {e}")))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HeraldError::Store(format!("pragma failed: {e}")))?;

        Ok((page_count * page_size) as u64)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), HeraldError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| HeraldError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_prompts_tenants",
                include_str!("../../migrations/002_prompts_tenants.sql"),
            ),
            (
                "003_webhook_outbox",
                include_str!("../../migrations/003_webhook_outbox.sql"),
            ),
            (
                "004_outbox_claims",
                include_str!("../../migrations/004_outbox_claims.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        HeraldError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| HeraldError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| HeraldError::Store(format!("failed to record migration {name}: {e}")))?;
        }

        Ok(())
    }
}

/// Current time as stored: RFC 3339, UTC, microsecond precision. Fixed width
/// so lexical order matches chronological order.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, HeraldError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| HeraldError::Store(format!("bad timestamp '{raw}': {e}")))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
