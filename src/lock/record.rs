//! Lock record serialization.

use crate::error::LockError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The JSON object stored at a lock path.
///
/// Records are written pretty-printed but parse from compact JSON just as
/// well. Fields this crate does not know about are collected into `extra`,
/// so a refresh rewrites them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Session identifier of the holder. Never changes for the life of
    /// the record; a refresh only moves `expires_at`.
    pub owner: String,

    /// When the lock was acquired.
    pub created_at: DateTime<Utc>,

    /// When the record stops granting ownership. An expired record reads
    /// as no lock at all.
    pub expires_at: DateTime<Utc>,

    /// Optional free-form note from the holder.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Fields written by other tooling, preserved across refresh.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LockRecord {
    /// Build a fresh record owned by `owner`, valid for `ttl` from `now`.
    pub fn new(
        owner: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
        description: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            created_at: now,
            expires_at: now + ttl,
            description: description.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LockError> {
        serde_json::to_string_pretty(self).map_err(|e| LockError::Serialize { source: e })
    }

    /// True once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
