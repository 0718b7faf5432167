//! Persistence for the last-checked watermark.
//!
//! The watermark is a single instant stored as
//! `{"last_checked_time": "<ISO-8601>"}`. A store that is missing, unreadable,
//! or holds anything else reads back as "no watermark"; only writes can fail.

use crate::error::{Error, Result};
use crate::utils::parse_timestamp;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Durable storage for one watermark instant.
pub trait WatermarkStore {
    /// The stored watermark, or `None` if there is none usable.
    fn get(&self) -> Option<DateTime<FixedOffset>>;

    /// Replace the stored watermark.
    fn set(&self, timestamp: DateTime<FixedOffset>) -> Result<()>;
}

/// On-disk layout of the watermark file.
#[derive(Debug, Serialize, Deserialize)]
struct WatermarkRecord {
    last_checked_time: String,
}

/// Watermark kept in a small JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    timezone: Tz,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
        }
    }
}

#[cfg(test)]
impl JsonFileStore {
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl WatermarkStore for JsonFileStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn get(&self) -> Option<DateTime<FixedOffset>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "No readable watermark file");
                return None;
            }
        };

        let record: WatermarkRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Watermark file is not a watermark record; ignoring it");
                return None;
            }
        };

        let stored = record.last_checked_time;
        let parsed = parse_timestamp(&stored, self.timezone);
        if parsed.is_none() {
            warn!(%stored, "Watermark timestamp is unparseable; ignoring it");
        }
        parsed
    }

    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    fn set(&self, timestamp: DateTime<FixedOffset>) -> Result<()> {
        let path = self.path.display().to_string();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::watermark(&path, e))?;
        }

        let record = WatermarkRecord {
            last_checked_time: timestamp.to_rfc3339(),
        };
        let json = serde_json::to_string(&record).map_err(|e| Error::watermark(&path, e))?;

        fs::write(&self.path, json).map_err(|e| Error::watermark(&path, e))?;
        info!(watermark = %timestamp.to_rfc3339(), "Stored watermark");
        Ok(())
    }
}

/// In-process watermark, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<DateTime<FixedOffset>>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(initial: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            value: Mutex::new(initial),
            writes: Mutex::new(0),
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WatermarkStore for MemoryStore {
    fn get(&self) -> Option<DateTime<FixedOffset>> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, timestamp: DateTime<FixedOffset>) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(timestamp);
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
