//! Backup catalog: the archive state of a directory, rebuilt from its
//! listing alone.

use super::naming::{display_label, BackupNaming};
use crate::fs::walker::{list_directory, EntryKind};
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One archived copy of the live save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// File name inside the save directory; the entry's identity
    pub file_name: String,

    /// Unix seconds decoded from the name
    pub timestamp: i64,

    /// Display label derived from `timestamp`
    pub label: String,
}

impl BackupEntry {
    pub fn new(file_name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            file_name: file_name.into(),
            timestamp,
            label: display_label(timestamp),
        }
    }

    /// Parse an entry from its file name.
    pub fn parse(naming: &BackupNaming, file_name: &str) -> Result<Self> {
        let timestamp = naming.decode(file_name)?;
        Ok(Self::new(file_name, timestamp))
    }
}

/// List every backup in `directory`, oldest first.
///
/// One malformed backup name fails the whole listing; nothing is skipped.
/// Entries sharing a timestamp are ordered by name.
pub fn discover(directory: &Path, naming: &BackupNaming) -> Result<Vec<BackupEntry>> {
    let mut entries = list_directory(directory, EntryKind::File)?
        .into_iter()
        .filter(|listed| naming.is_backup_name(&listed.file_name))
        .map(|listed| BackupEntry::parse(naming, &listed.file_name))
        .collect::<Result<Vec<_>>>()?;

    sort_chronologically(&mut entries);

    tracing::debug!(
        "Discovered {} backup(s) in {}",
        entries.len(),
        directory.display()
    );

    Ok(entries)
}

pub(crate) fn sort_chronologically(entries: &mut [BackupEntry]) {
    entries.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ArchiverError;
    use std::fs;
    use tempfile::TempDir;

    fn naming() -> BackupNaming {
        BackupNaming::new("DDDA", ".sav").unwrap()
    }

    #[test]
    fn test_discover_ignores_unrelated_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("DDDA-200.sav.bak"), b"b")?;
        fs::write(temp_dir.path().join("DDDA-100.sav.bak"), b"a")?;
        fs::write(temp_dir.path().join("notes.txt"), b"n")?;

        let entries = discover(temp_dir.path(), &naming())?;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "DDDA-100.sav.bak");
        assert_eq!(entries[0].timestamp, 100);
        assert_eq!(entries[1].file_name, "DDDA-200.sav.bak");
        assert_eq!(entries[1].timestamp, 200);
        assert_eq!(entries[1].label, display_label(200));

        Ok(())
    }

    #[test]
    fn test_discover_skips_live_and_orig() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("DDDA.sav"), b"live")?;
        fs::write(temp_dir.path().join("DDDA.sav.orig"), b"old")?;

        assert!(discover(temp_dir.path(), &naming())?.is_empty());

        Ok(())
    }

    #[test]
    fn test_discover_fails_on_malformed_name() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("DDDA-100.sav.bak"), b"a")?;
        fs::write(temp_dir.path().join("DDDA-oops.sav.bak"), b"b")?;

        let err = discover(temp_dir.path(), &naming()).unwrap_err();
        assert!(matches!(err, ArchiverError::InvalidTimestamp(_)));

        Ok(())
    }

    #[test]
    fn test_discover_ignores_backup_named_directories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir(temp_dir.path().join("DDDA-1.sav.bak"))?;

        assert!(discover(temp_dir.path(), &naming())?.is_empty());

        Ok(())
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover(&temp_dir.path().join("gone"), &naming()).unwrap_err();
        assert!(matches!(err, ArchiverError::Io(_)));
    }

    #[test]
    fn test_sort_is_chronological_not_lexical() {
        let mut entries = vec![
            BackupEntry::new("DDDA-1000.sav.bak", 1000),
            BackupEntry::new("DDDA-999.sav.bak", 999),
            BackupEntry::new("DDDA--5.sav.bak", -5),
        ];
        sort_chronologically(&mut entries);

        let stamps: Vec<i64> = entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![-5, 999, 1000]);
    }
}
