//! Save directory discovery.
//!
//! Steam keeps cloud saves per user under
//! `<steam>/userdata/<user id>/<app id>/remote/`. Every user directory
//! holding the live save is a candidate.

use crate::fs::walker::{list_directory, EntryKind};
use crate::utils::{ArchiverError, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Steam app id of Dragon's Dogma: Dark Arisen
pub const DEFAULT_APP_ID: &str = "367500";

/// Places Steam is commonly installed, most likely first.
pub fn default_steam_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(base) = BaseDirs::new() {
        roots.push(base.home_dir().join(".steam").join("steam"));
        roots.push(base.data_dir().join("Steam"));
    }

    if cfg!(windows) {
        roots.push(PathBuf::from(r"C:\Program Files (x86)\Steam"));
        roots.push(PathBuf::from(r"C:\Program Files\Steam"));
    }

    roots
}

/// Pick the Steam installation to search.
///
/// A configured path must exist; otherwise the first existing default wins.
pub fn resolve_steam_root(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(ArchiverError::Discovery(format!(
            "configured Steam path {} is not a directory",
            path.display()
        )));
    }

    default_steam_roots()
        .into_iter()
        .find(|root| root.join("userdata").is_dir())
        .ok_or_else(|| {
            ArchiverError::Discovery(
                "no Steam installation found; set [steam] path or pass --save-dir".to_string(),
            )
        })
}

/// Directories below `steam_root` that contain `primary_name`, sorted.
pub fn discover_save_dirs(steam_root: &Path, app_id: &str, primary_name: &str) -> Result<Vec<PathBuf>> {
    let userdata = steam_root.join("userdata");
    let users = list_directory(&userdata, EntryKind::Dir).map_err(|e| {
        ArchiverError::Discovery(format!("could not read {}: {}", userdata.display(), e))
    })?;

    let mut save_dirs: Vec<PathBuf> = users
        .into_iter()
        .map(|user| user.path.join(app_id).join("remote"))
        .filter(|dir| std::fs::metadata(dir.join(primary_name)).is_ok())
        .collect();
    save_dirs.sort();

    if save_dirs.is_empty() {
        return Err(ArchiverError::Discovery(format!(
            "no {} found below {}",
            primary_name,
            userdata.display()
        )));
    }

    for dir in &save_dirs {
        tracing::debug!("Found save directory {}", dir.display());
    }

    Ok(save_dirs)
}
