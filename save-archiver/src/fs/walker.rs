//! Single-level directory listing.
//!
//! Backups live flat next to the live save, and Steam keeps one directory
//! per user below `userdata`, so nothing here recurses.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What kind of entries a listing should keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// An entry found directly below the listed directory
#[derive(Debug, Clone)]
pub struct ListedEntry {
    /// Full path to the entry
    pub path: PathBuf,

    /// File name as UTF-8
    pub file_name: String,

    /// Is this a symlink?
    pub is_symlink: bool,
}

impl ListedEntry {
    /// Returns None for names that are not valid UTF-8; they can never
    /// match a backup or Steam user name.
    fn from_entry(entry: &DirEntry) -> Option<Self> {
        let file_name = entry.file_name().to_str()?.to_string();
        Some(Self {
            path: entry.path().to_path_buf(),
            file_name,
            is_symlink: entry.path_is_symlink(),
        })
    }
}

/// List the entries of `root` of the requested kind, in listing order.
///
/// Symlinks are followed, so a link to a file counts as a file.
///
/// # Example
/// ```no_run
/// use save_archiver::fs::walker::{list_directory, EntryKind};
/// use std::path::Path;
///
/// let files = list_directory(Path::new("/saves"), EntryKind::File).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn list_directory(root: &Path, kind: EntryKind) -> std::io::Result<Vec<ListedEntry>> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // A dangling link in a save directory is not worth failing over
            Err(e) if e.depth() > 0 && e.io_error().is_some_and(is_dangling_link) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let keep = match kind {
            EntryKind::File => entry.file_type().is_file(),
            EntryKind::Dir => entry.file_type().is_dir(),
        };
        if !keep {
            continue;
        }

        if let Some(listed) = ListedEntry::from_entry(&entry) {
            entries.push(listed);
        }
    }

    Ok(entries)
}

fn is_dangling_link(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_empty_directory() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let files = list_directory(temp_dir.path(), EntryKind::File)?;
        assert_eq!(files.len(), 0);
        Ok(())
    }

    #[test]
    fn test_list_files_only() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;

        fs::write(temp_dir.path().join("file1.txt"), b"content1")?;
        fs::create_dir(temp_dir.path().join("subdir"))?;
        fs::write(temp_dir.path().join("subdir/nested.txt"), b"content2")?;

        let files = list_directory(temp_dir.path(), EntryKind::File)?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "file1.txt");

        let dirs = list_directory(temp_dir.path(), EntryKind::Dir)?;
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].file_name, "subdir");

        Ok(())
    }

    #[test]
    fn test_missing_directory_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_directory(&temp_dir.path().join("nope"), EntryKind::File).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_dangling_symlink_skipped() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("real.txt"), b"x")?;
        std::os::unix::fs::symlink(temp_dir.path().join("gone"), temp_dir.path().join("link"))?;

        let files = list_directory(temp_dir.path(), EntryKind::File)?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "real.txt");

        Ok(())
    }
}
