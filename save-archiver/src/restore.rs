//! Restore transaction: put a chosen backup back into the live position.
//!
//! Steps, each its own failure point:
//!
//! 1. rename `<primary>` to `<primary>.orig`
//! 2. read the backup's modification time
//! 3. copy the backup to `<primary>`
//! 4. stamp `<primary>` with the time read in step 2 (warning only)
//!
//! Step 1 is not rolled back when 2 or 3 fail. The live save is then
//! missing and `<primary>.orig` holds the displaced content; recovery is
//! manual. A copy that fails partway has its truncated output removed, so
//! the live position is never left holding half a save.

use crate::archive::{BackupEntry, BackupNaming};
use crate::fs::metadata::{copy_contents, modified_time, occupied, set_file_times};
use crate::utils::{ArchiverError, RestoreStage, RestoreTimestampWarning, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Suffix given to the displaced live save
pub const ORIGINAL_SUFFIX: &str = ".orig";

/// Successful restore
#[derive(Debug)]
pub struct RestoreReport {
    /// The backup now in the live position
    pub entry: BackupEntry,

    /// Where the displaced live save went
    pub displaced: PathBuf,

    /// Set when the restored file kept the copy time instead of the backup's
    pub warning: Option<RestoreTimestampWarning>,
}

/// Path the live save is moved to during a restore
pub fn displaced_path(directory: &Path, naming: &BackupNaming) -> PathBuf {
    directory.join(format!("{}{}", naming.primary_name(), ORIGINAL_SUFFIX))
}

/// Restore `backup_name` from `directory` over the live save.
pub async fn restore(
    directory: &Path,
    naming: &BackupNaming,
    backup_name: &str,
) -> Result<RestoreReport> {
    if Path::new(backup_name).file_name() != Some(OsStr::new(backup_name)) {
        return Err(ArchiverError::InvalidBackupName(backup_name.to_string()));
    }
    let entry = BackupEntry::parse(naming, backup_name)?;

    let live = directory.join(naming.primary_name());
    let displaced = displaced_path(directory, naming);
    let backup = directory.join(backup_name);

    info!("Restoring {} ({}) in {}", entry.file_name, entry.label, directory.display());

    // 1. Move the live save aside. An existing .orig is never replaced.
    if occupied(&displaced) {
        return Err(aborted(
            RestoreStage::Rename,
            &displaced,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "previous original still present"),
        ));
    }
    tokio::fs::rename(&live, &displaced)
        .await
        .map_err(|e| aborted(RestoreStage::Rename, &live, e))?;

    // 2. Capture the backup's time before copying
    let backup_time = modified_time(&backup)
        .await
        .map_err(|e| aborted(RestoreStage::ReadBackupTime, &backup, e))?;

    // 3. Recreate the live save
    copy_into_place(&backup, &live)
        .await
        .map_err(|e| aborted(RestoreStage::Copy, &backup, e))?;

    // 4. Best effort
    let warning = match set_file_times(&live, backup_time).await {
        Ok(()) => None,
        Err(source) => {
            warn!("Restored {} but could not set its file times: {}", live.display(), source);
            Some(RestoreTimestampWarning { path: live.clone(), source })
        }
    };

    info!("Backup '{}' restored", entry.label);

    Ok(RestoreReport {
        entry,
        displaced,
        warning,
    })
}

/// Copy `backup` to `live`, removing whatever the copy left behind on failure.
///
/// `live` was moved aside in step 1, so anything at that path after a failed
/// copy is partial output.
async fn copy_into_place(backup: &Path, live: &Path) -> std::io::Result<()> {
    let Err(e) = copy_contents(backup, live).await else {
        return Ok(());
    };
    match tokio::fs::remove_file(live).await {
        Ok(()) => debug!("Removed partial copy at {}", live.display()),
        Err(cleanup) if cleanup.kind() == std::io::ErrorKind::NotFound => {}
        Err(cleanup) => warn!("Could not remove partial copy at {}: {}", live.display(), cleanup),
    }
    Err(e)
}

fn aborted(stage: RestoreStage, path: &Path, source: std::io::Error) -> ArchiverError {
    error!("Restore aborted during {} ({}): {}", stage, path.display(), source);
    ArchiverError::RestoreAborted {
        stage,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::metadata::set_file_times_blocking;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn naming() -> BackupNaming {
        BackupNaming::new("DDDA", ".sav").unwrap()
    }

    #[tokio::test]
    async fn test_restore_swaps_backup_in() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA.sav"), b"A")?;
        fs::write(dir.join("DDDA-500.sav.bak"), b"B")?;
        let backup_time = UNIX_EPOCH + Duration::from_secs(500);
        set_file_times_blocking(&dir.join("DDDA-500.sav.bak"), backup_time)?;

        let report = restore(dir, &naming(), "DDDA-500.sav.bak").await?;

        assert_eq!(fs::read(dir.join("DDDA.sav.orig"))?, b"A");
        assert_eq!(fs::read(dir.join("DDDA.sav"))?, b"B");
        assert_eq!(fs::metadata(dir.join("DDDA.sav"))?.modified()?, backup_time);
        assert_eq!(report.entry.timestamp, 500);
        assert_eq!(report.displaced, dir.join("DDDA.sav.orig"));
        assert!(report.warning.is_none());
        // The backup itself is untouched
        assert_eq!(fs::read(dir.join("DDDA-500.sav.bak"))?, b"B");

        Ok(())
    }

    #[tokio::test]
    async fn test_restore_copy_failure_leaves_live_missing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA.sav"), b"A")?;
        // Readable time, uncopyable content
        fs::create_dir(dir.join("DDDA-500.sav.bak"))?;

        let err = restore(dir, &naming(), "DDDA-500.sav.bak").await.unwrap_err();

        assert_eq!(err.restore_stage(), Some(RestoreStage::Copy));
        assert!(!dir.join("DDDA.sav").exists());
        assert_eq!(fs::read(dir.join("DDDA.sav.orig"))?, b"A");

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_copy_removes_partial_output() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        let live = dir.join("DDDA.sav");
        fs::write(&live, b"trunc")?;
        fs::create_dir(dir.join("DDDA-500.sav.bak"))?;

        assert!(copy_into_place(&dir.join("DDDA-500.sav.bak"), &live).await.is_err());
        assert!(!live.exists());

        // Nothing to clean up is not an error of its own
        let err = copy_into_place(&dir.join("DDDA-500.sav.bak"), &live).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);

        Ok(())
    }

    #[tokio::test]
    async fn test_restore_missing_backup_after_rename() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA.sav"), b"A")?;

        let err = restore(dir, &naming(), "DDDA-500.sav.bak").await.unwrap_err();

        assert_eq!(err.restore_stage(), Some(RestoreStage::ReadBackupTime));
        assert!(!dir.join("DDDA.sav").exists());
        assert_eq!(fs::read(dir.join("DDDA.sav.orig"))?, b"A");

        Ok(())
    }

    #[tokio::test]
    async fn test_restore_refuses_existing_orig() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA.sav"), b"A")?;
        fs::write(dir.join("DDDA.sav.orig"), b"older")?;
        fs::write(dir.join("DDDA-500.sav.bak"), b"B")?;

        let err = restore(dir, &naming(), "DDDA-500.sav.bak").await.unwrap_err();

        assert_eq!(err.restore_stage(), Some(RestoreStage::Rename));
        assert_eq!(fs::read(dir.join("DDDA.sav"))?, b"A");
        assert_eq!(fs::read(dir.join("DDDA.sav.orig"))?, b"older");

        Ok(())
    }

    #[tokio::test]
    async fn test_restore_missing_live_save() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA-500.sav.bak"), b"B")?;

        let err = restore(dir, &naming(), "DDDA-500.sav.bak").await.unwrap_err();

        assert_eq!(err.restore_stage(), Some(RestoreStage::Rename));
        assert!(!dir.join("DDDA.sav.orig").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_restore_rejects_bad_names_without_touching_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        fs::write(dir.join("DDDA.sav"), b"A")?;

        let err = restore(dir, &naming(), "DDDA-x.sav.bak").await.unwrap_err();
        assert!(matches!(err, ArchiverError::InvalidTimestamp(_)));

        let err = restore(dir, &naming(), "../DDDA-5.sav.bak").await.unwrap_err();
        assert!(matches!(err, ArchiverError::InvalidBackupName(_)));

        assert_eq!(fs::read(dir.join("DDDA.sav"))?, b"A");
        assert!(!dir.join("DDDA.sav.orig").exists());

        Ok(())
    }
}
