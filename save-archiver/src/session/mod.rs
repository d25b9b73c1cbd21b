//! Shared archive session.
//!
//! The watcher task and the interactive side both touch the selected
//! directory and its catalog. All of that lives behind one lock here; the
//! watcher only ever appends, the interactive side replaces.

pub mod events;

use crate::archive::catalog::{discover, sort_chronologically};
use crate::archive::{BackupEntry, BackupNaming};
use crate::restore::{self, RestoreReport};
use crate::utils::{ArchiverError, Result};
pub use events::{ArchiveEvent, EventBus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

struct SessionState {
    directories: Vec<PathBuf>,
    selected: usize,
    catalog: Vec<BackupEntry>,
}

impl SessionState {
    fn selected_directory(&self) -> &Path {
        &self.directories[self.selected]
    }
}

/// Cloneable handle to the shared session
#[derive(Clone)]
pub struct ArchiveSession {
    naming: BackupNaming,
    state: Arc<RwLock<SessionState>>,
    events: EventBus,
}

impl ArchiveSession {
    /// Open a session on the first of `directories`.
    pub async fn open(directories: Vec<PathBuf>, naming: BackupNaming) -> Result<Self> {
        let Some(first) = directories.first().cloned() else {
            return Err(ArchiverError::Discovery("no save directories to choose from".to_string()));
        };

        let catalog = load_catalog(first.clone(), naming.clone()).await?;
        info!("Opened {} ({} backups)", first.display(), catalog.len());

        Ok(Self {
            naming,
            state: Arc::new(RwLock::new(SessionState {
                directories,
                selected: 0,
                catalog,
            })),
            events: EventBus::new(),
        })
    }

    pub fn naming(&self) -> &BackupNaming {
        &self.naming
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArchiveEvent> {
        self.events.subscribe()
    }

    pub async fn directories(&self) -> Vec<PathBuf> {
        self.state.read().await.directories.clone()
    }

    /// Index of the selected directory within [`Self::directories`]
    pub async fn selected_index(&self) -> usize {
        self.state.read().await.selected
    }

    pub async fn selected_directory(&self) -> PathBuf {
        self.state.read().await.selected_directory().to_path_buf()
    }

    /// Snapshot of the selected directory's catalog
    pub async fn catalog(&self) -> Vec<BackupEntry> {
        self.state.read().await.catalog.clone()
    }

    /// Switch to another candidate directory and rebuild its catalog.
    ///
    /// The write lock is held across the listing so a backup recorded
    /// meanwhile lands either in the listing or after it. On error the
    /// previous selection stays in place.
    pub async fn select_directory(&self, index: usize) -> Result<Vec<BackupEntry>> {
        let (directory, catalog) = {
            let mut state = self.state.write().await;
            let directory = state
                .directories
                .get(index)
                .cloned()
                .ok_or(ArchiverError::UnknownDirectory(index))?;

            let catalog = load_catalog(directory.clone(), self.naming.clone()).await?;
            state.selected = index;
            state.catalog = catalog.clone();
            (directory, catalog)
        };

        info!("Selected {} ({} backups)", directory.display(), catalog.len());
        self.events.publish(ArchiveEvent::CatalogRefreshed {
            directory,
            entries: catalog.len(),
        });

        Ok(catalog)
    }

    /// Re-list the selected directory.
    pub async fn refresh(&self) -> Result<Vec<BackupEntry>> {
        let index = self.selected_index().await;
        self.select_directory(index).await
    }

    /// Record a backup the watcher just wrote into `directory`.
    ///
    /// The catalog only changes if `directory` is still selected. Returns
    /// whether it changed.
    pub async fn record_backup(&self, directory: &Path, entry: BackupEntry) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            if state.selected_directory() == directory {
                state.catalog.retain(|e| e.file_name != entry.file_name);
                state.catalog.push(entry.clone());
                sort_chronologically(&mut state.catalog);
                true
            } else {
                false
            }
        };

        self.events.publish(ArchiveEvent::BackupCreated {
            directory: directory.to_path_buf(),
            entry,
        });

        changed
    }

    /// Tell observers the watcher on `directory` has ended.
    pub fn watcher_stopped(&self, directory: &Path, error: Option<&ArchiverError>) {
        self.events.publish(ArchiveEvent::WatcherStopped {
            directory: directory.to_path_buf(),
            error: error.map(ToString::to_string),
        });
    }

    /// Restore a backup of the selected directory by file name.
    pub async fn restore(&self, file_name: &str) -> Result<RestoreReport> {
        let (directory, known) = {
            let state = self.state.read().await;
            let known = state.catalog.iter().any(|e| e.file_name == file_name);
            (state.selected_directory().to_path_buf(), known)
        };

        if !known {
            return Err(ArchiverError::UnknownBackup(file_name.to_string()));
        }

        match restore::restore(&directory, &self.naming, file_name).await {
            Ok(report) => {
                self.events.publish(ArchiveEvent::RestoreCompleted {
                    directory,
                    entry: report.entry.clone(),
                    warning: report.warning.as_ref().map(ToString::to_string),
                });
                Ok(report)
            }
            Err(e) => {
                warn!("Restore of {} failed: {}", file_name, e);
                self.events.publish(ArchiveEvent::RestoreFailed {
                    directory,
                    backup: file_name.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

async fn load_catalog(directory: PathBuf, naming: BackupNaming) -> Result<Vec<BackupEntry>> {
    tokio::task::spawn_blocking(move || discover(&directory, &naming))
        .await
        .map_err(|e| ArchiverError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}
