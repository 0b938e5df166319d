//! Durable serial-code storage
//!
//! Every write is a single SQL statement, so concurrent readers never see a
//! partial update. Usage counts only ever move upward through the quota
//! enforcer's conditional update; this store resets them and manages the
//! rest of the row.

use crate::error::{GateError, Result};
use crate::store::types::{CodeRow, SeedEntry, SerialCode, SyncReport};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CodeStore {
    pub db: SqlitePool,
}

impl CodeStore {
    /// Open (creating if missing) the database and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS serial_codes (
                code TEXT PRIMARY KEY,
                audio_url TEXT NOT NULL,
                usage_count INTEGER NOT NULL DEFAULT 0,
                max_uses INTEGER NOT NULL DEFAULT 3,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_redeemed_at TEXT
            )
            "#,
        )
        .execute(&db)
        .await?;

        Ok(Self { db })
    }

    /// Read-only fetch; no side effects.
    pub async fn lookup(&self, code: &str) -> Result<Option<SerialCode>> {
        let row = sqlx::query_as::<_, CodeRow>(
            r#"
            SELECT code, audio_url, usage_count, max_uses, created_at, last_redeemed_at
            FROM serial_codes
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(SerialCode::from))
    }

    /// Create or overwrite a code. `audio_url` and `max_uses` always take
    /// the new values; `usage_count` is only written on creation, except
    /// that a shrunken `max_uses` clamps an existing count down to keep the
    /// quota invariant intact.
    ///
    /// Returns `true` when the row was created.
    pub async fn upsert(
        &self,
        code: &str,
        audio_url: &str,
        max_uses: i64,
        initial_usage_count: i64,
    ) -> Result<bool> {
        if code.trim().is_empty() {
            return Err(GateError::InvalidCode("empty code".to_string()));
        }
        if max_uses < 1 {
            return Err(GateError::InvalidCode(format!(
                "code {code}: max_uses must be at least 1 (got {max_uses})"
            )));
        }
        if initial_usage_count < 0 || initial_usage_count > max_uses {
            return Err(GateError::InvalidCode(format!(
                "code {code}: usage_count {initial_usage_count} outside 0..={max_uses}"
            )));
        }

        let created = self.lookup(code).await?.is_none();

        sqlx::query(
            r#"
            INSERT INTO serial_codes (code, audio_url, usage_count, max_uses)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                audio_url = excluded.audio_url,
                max_uses = excluded.max_uses,
                usage_count = MIN(usage_count, excluded.max_uses)
            "#,
        )
        .bind(code)
        .bind(audio_url)
        .bind(initial_usage_count)
        .bind(max_uses)
        .execute(&self.db)
        .await?;

        debug!(
            "Upserted code {} ({})",
            code,
            if created { "created" } else { "updated" }
        );
        Ok(created)
    }

    /// Reset one code's usage count to zero, returning the post-state.
    pub async fn reset_one(&self, code: &str) -> Result<Option<SerialCode>> {
        let affected = sqlx::query("UPDATE serial_codes SET usage_count = 0 WHERE code = ?")
            .bind(code)
            .execute(&self.db)
            .await?
            .rows_affected();

        if affected == 0 {
            return Ok(None);
        }

        info!("Reset usage count for code {}", code);
        self.lookup(code).await
    }

    /// Reset every code's usage count to zero; returns rows affected.
    pub async fn reset_all(&self) -> Result<u64> {
        let affected = sqlx::query("UPDATE serial_codes SET usage_count = 0")
            .execute(&self.db)
            .await?
            .rows_affected();

        info!("Reset usage count for {} codes", affected);
        Ok(affected)
    }

    /// Upsert every entry from a seed source. Codes absent from the source
    /// are left untouched.
    pub async fn sync_from_entries(
        &self,
        entries: &BTreeMap<String, SeedEntry>,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for (code, entry) in entries {
            if self
                .upsert(code, &entry.audio_url, entry.max_uses, entry.usage_count)
                .await?
            {
                report.created += 1;
            } else {
                report.updated += 1;
            }
        }

        info!(
            "Synced codes from seed source: {} created, {} updated",
            report.created, report.updated
        );
        Ok(report)
    }

    /// All codes, for the admin surface.
    pub async fn list(&self) -> Result<Vec<SerialCode>> {
        let rows = sqlx::query_as::<_, CodeRow>(
            r#"
            SELECT code, audio_url, usage_count, max_uses, created_at, last_redeemed_at
            FROM serial_codes
            ORDER BY code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SerialCode::from).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM serial_codes")
            .fetch_one(&self.db)
            .await?;

        Ok(count.0)
    }
}
