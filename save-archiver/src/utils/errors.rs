//! Custom error types for the save archiver.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Step of a restore transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    /// Moving the live save aside to `<primary>.orig`
    Rename,
    /// Reading the chosen backup's modification time
    ReadBackupTime,
    /// Copying the backup into the live position
    Copy,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreStage::Rename => "rename live save",
            RestoreStage::ReadBackupTime => "read backup time",
            RestoreStage::Copy => "copy backup",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not discover save directories: {0}")]
    Discovery(String),

    #[error("Invalid backup base name '{0}': must be non-empty and contain no '-'")]
    InvalidBaseName(String),

    #[error("Invalid backup name: {0}")]
    InvalidBackupName(String),

    #[error("Invalid backup timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Could not check file time of {}: {source}", .path.display())]
    WatchRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Restore aborted ({stage}) at {}: {source}", .path.display())]
    RestoreAborted {
        stage: RestoreStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No backup named '{0}' in the selected directory")]
    UnknownBackup(String),

    #[error("No save directory #{0}")]
    UnknownDirectory(usize),
}

impl ArchiverError {
    /// Restore stage that failed, if this is a restore abort
    pub fn restore_stage(&self) -> Option<RestoreStage> {
        match self {
            ArchiverError::RestoreAborted { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Non-fatal restore problem: the live save was restored but its
/// timestamps could not be set to the backup's.
#[derive(Error, Debug)]
#[error("Could not set file times of {}: {source}", .path.display())]
pub struct RestoreTimestampWarning {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type Result<T> = std::result::Result<T, ArchiverError>;
