//! Events published to session observers.

use crate::archive::BackupEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum number of queued events per subscriber
const EVENT_CAPACITY: usize = 256;

/// Something observers of the archive should know about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ArchiveEvent {
    /// The watcher archived a new version of the live save
    #[serde(rename = "backup:created")]
    BackupCreated { directory: PathBuf, entry: BackupEntry },

    /// The selected directory changed or was re-listed
    #[serde(rename = "catalog:refreshed")]
    CatalogRefreshed { directory: PathBuf, entries: usize },

    /// The watcher ended; `error` is None on a requested stop
    #[serde(rename = "watcher:stopped")]
    WatcherStopped {
        directory: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "restore:completed")]
    RestoreCompleted {
        directory: PathBuf,
        entry: BackupEntry,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },

    #[serde(rename = "restore:failed")]
    RestoreFailed {
        directory: PathBuf,
        backup: String,
        error: String,
    },
}

/// Fan-out of archive events to any number of observers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ArchiveEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Having no observers is normal.
    pub fn publish(&self, event: ArchiveEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Published event to {} observer(s)", count),
            Err(broadcast::error::SendError(event)) => {
                debug!("No observers for event: {:?}", event)
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArchiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
