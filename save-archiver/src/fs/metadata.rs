//! File timestamp handling for backup and restore.
//!
//! The watcher compares modification times and restore puts the backup's
//! modification time back onto the recreated live save.

use std::fs::{self, FileTimes, OpenOptions};
use std::path::Path;
use std::time::SystemTime;

/// Last modification time of a file.
pub async fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    tokio::fs::metadata(path).await?.modified()
}

/// Set both access and modification time of a file.
pub async fn set_file_times(path: &Path, time: SystemTime) -> std::io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || set_file_times_blocking(&path, time))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

/// Blocking variant of [`set_file_times`].
pub fn set_file_times_blocking(path: &Path, time: SystemTime) -> std::io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
}

/// Copy a file's full contents. Returns bytes copied.
pub async fn copy_contents(from: &Path, to: &Path) -> std::io::Result<u64> {
    // fs::copy refuses directories on some platforms only
    if tokio::fs::metadata(from).await?.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is a directory", from.display()),
        ));
    }
    tokio::fs::copy(from, to).await
}

/// Whether something already occupies `path` (file, directory or link).
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
