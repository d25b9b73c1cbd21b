//! Backup filename codec.
//!
//! A backup's name records when it was taken:
//!
//! ```text
//! <base>-<unixSeconds><extension>.bak      e.g. DDDA-1700000000.sav.bak
//! ```
//!
//! The archive needs no index; everything is recovered from directory
//! listings. `base` never contains `-`, which is what makes the name
//! splittable; [`BackupNaming::new`] enforces it.

use crate::utils::{ArchiverError, Result};
use chrono::{DateTime, Local, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix appended after the save extension.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Label format for catalog display (`Jan  2 15:04:05`).
const LABEL_FORMAT: &str = "%b %e %H:%M:%S";

/// Naming parameters for one kind of save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupNaming {
    base: String,
    extension: String,
}

impl BackupNaming {
    /// Validate and bundle a base name and extension.
    pub fn new(base: impl Into<String>, extension: impl Into<String>) -> Result<Self> {
        let base = base.into();
        let extension = extension.into();

        if base.is_empty() || base.contains('-') {
            return Err(ArchiverError::InvalidBaseName(base));
        }
        if !extension.starts_with('.') {
            return Err(ArchiverError::Config(format!(
                "save extension '{extension}' must begin with '.'"
            )));
        }

        Ok(Self { base, extension })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Name of the live save, e.g. `DDDA.sav`
    pub fn primary_name(&self) -> String {
        format!("{}{}", self.base, self.extension)
    }

    /// Trailing part shared by every backup name, e.g. `.sav.bak`
    pub fn backup_suffix(&self) -> String {
        format!("{}{}", self.extension, BACKUP_SUFFIX)
    }

    /// Whether a directory entry looks like one of our backups.
    pub fn is_backup_name(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.backup_suffix())
    }

    pub fn encode(&self, timestamp: i64) -> String {
        encode(&self.base, &self.extension, timestamp)
    }

    pub fn decode(&self, file_name: &str) -> Result<i64> {
        decode(file_name, &self.extension)
    }
}

/// Build a backup file name from its parts.
pub fn encode(base: &str, extension: &str, timestamp: i64) -> String {
    format!("{base}-{timestamp}{extension}{BACKUP_SUFFIX}")
}

/// Recover the Unix timestamp (seconds) encoded in a backup file name.
///
/// The name minus `<extension>.bak` must split on `-` into exactly two
/// segments. A sign directly after the separator belongs to the number.
pub fn decode(file_name: &str, extension: &str) -> Result<i64> {
    let suffix = format!("{extension}{BACKUP_SUFFIX}");
    let stem = file_name.strip_suffix(suffix.as_str()).unwrap_or(file_name);

    let number = split_stem(stem).ok_or_else(|| ArchiverError::InvalidBackupName(stem.to_string()))?;

    number
        .parse::<i64>()
        .map_err(|_| ArchiverError::InvalidTimestamp(number.to_string()))
}

fn split_stem(stem: &str) -> Option<&str> {
    let (_base, rest) = stem.split_once('-')?;
    let unsigned = rest.strip_prefix('-').unwrap_or(rest);
    if unsigned.contains('-') {
        return None;
    }
    Some(rest)
}

/// Whole seconds since the Unix epoch, floored for pre-epoch times.
///
/// Saturates at the ends of `i64` instead of failing.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => {
            let before = before.duration();
            let secs = before.as_secs() + u64::from(before.subsec_nanos() > 0);
            i64::try_from(secs).map(|s| -s).unwrap_or(i64::MIN)
        }
    }
}

/// Human-readable label for a backup timestamp, in local time.
pub fn display_label(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&Local).format(LABEL_FORMAT).to_string(),
        None => format!("@{timestamp}"),
    }
}
