//! Atomic check-and-increment of a code's usage count
//!
//! A separate read-then-write would let two concurrent redemptions both see
//! one remaining use and both record it. The conditional update below is a
//! single statement, so the database totally orders all consumers of a code:
//! at most `max_uses` of them ever succeed.

use crate::error::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

/// Result of one consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The use was recorded; carries the post-increment count.
    Consumed { usage_count: i64 },
    /// The code exists but has no remaining uses.
    QuotaExhausted,
    /// The code does not exist.
    NotFound,
}

#[derive(Clone)]
pub struct QuotaEnforcer {
    db: SqlitePool,
}

impl QuotaEnforcer {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record one use of `code` iff its quota allows it.
    pub async fn try_consume(&self, code: &str) -> Result<ConsumeOutcome> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE serial_codes
               SET usage_count = usage_count + 1,
                   last_redeemed_at = ?
             WHERE code = ? AND usage_count < max_uses
            RETURNING usage_count
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        if let Some((usage_count,)) = row {
            debug!("Consumed one use of code {} (now {})", code, usage_count);
            return Ok(ConsumeOutcome::Consumed { usage_count });
        }

        // The conditional update matched nothing: either the code is unknown
        // or its quota is spent. Distinguish for the caller.
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT usage_count FROM serial_codes WHERE code = ?")
                .bind(code)
                .fetch_optional(&self.db)
                .await?;

        Ok(match exists {
            Some(_) => ConsumeOutcome::QuotaExhausted,
            None => ConsumeOutcome::NotFound,
        })
    }
}
