use serde::{Deserialize, Serialize};

/// One serial code row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SerialCode {
    /// Short numeric string, primary key.
    pub code: String,
    /// Absolute URL or a local file name under the audio directory.
    pub audio_url: String,
    pub usage_count: i64,
    pub max_uses: i64,
    pub created_at: String,
    pub last_redeemed_at: Option<String>,
}

impl SerialCode {
    /// Whether the quota pre-check should turn the caller away.
    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.max_uses
    }

    pub fn remaining_uses(&self) -> i64 {
        (self.max_uses - self.usage_count).max(0)
    }
}

pub(crate) type CodeRow = (String, String, i64, i64, String, Option<String>);

impl From<CodeRow> for SerialCode {
    fn from(row: CodeRow) -> Self {
        let (code, audio_url, usage_count, max_uses, created_at, last_redeemed_at) = row;
        Self {
            code,
            audio_url,
            usage_count,
            max_uses,
            created_at,
            last_redeemed_at,
        }
    }
}

/// Seed/sync entry as supplied by `serial_codes.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedEntry {
    pub audio_url: String,
    #[serde(default)]
    pub usage_count: i64,
    #[serde(default = "default_max_uses")]
    pub max_uses: i64,
}

fn default_max_uses() -> i64 {
    3
}

/// Outcome of one sync pass over a seed source.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
}
