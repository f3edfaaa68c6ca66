//! Parental consent record
//!
//! A consent record is persisted client-side and checked at process start
//! before any child session may run. Records are valid for 30 days from the
//! consent date; an expired record is deleted and the parent is re-prompted.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// How long a consent record stays valid
pub const CONSENT_VALID_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub parent_name: String,
    pub email: String,
    pub child_age: u8,
    pub consent_date: DateTime<Utc>,
    pub session_id: String,
}

impl ConsentRecord {
    pub fn new(parent_name: String, email: String, child_age: u8) -> Self {
        Self {
            parent_name,
            email,
            child_age,
            consent_date: Utc::now(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.consent_date + Duration::days(CONSENT_VALID_DAYS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// File-backed store for the consent record
pub struct ConsentStore {
    path: PathBuf,
}

impl ConsentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record, clearing it if it has expired
    pub fn load(&self) -> Result<Option<ConsentRecord>> {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Option<ConsentRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read consent record at {}", self.path.display()))?;
        let record: ConsentRecord =
            serde_json::from_str(&raw).context("Failed to parse consent record")?;

        if record.is_expired_at(now) {
            info!("Consent record expired on {}, clearing", record.expires_at());
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    pub fn save(&self, record: &ConsentRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(record).context("Failed to encode consent record")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write consent record at {}", self.path.display()))?;
        info!("Consent recorded for {} until {}", record.parent_name, record.expires_at());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove consent record at {}", self.path.display())
            })?;
        }
        Ok(())
    }
}
