//! Live save watcher.
//!
//! Polls the live save's modification time on a fixed interval and copies
//! it to a timestamped backup whenever the time moves strictly past the
//! high-water mark. Equal or older times are ignored, so repeated polls of
//! an unchanged file never duplicate a backup. Writes landing within the
//! same mtime quantum between two polls collapse into one backup.
//!
//! A failed stat or copy stops the watcher for good; whoever owns it must
//! start a new one to resume monitoring.

use crate::archive::naming::unix_seconds;
use crate::archive::{BackupEntry, BackupNaming};
use crate::fs::metadata::{copy_contents, modified_time};
use crate::session::ArchiveSession;
use crate::utils::{ArchiverError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where the high-water mark starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// Watcher start time; anything written before is not archived
    Now,
    /// The live save's current modification time
    Current,
    /// A fixed point in time
    At(SystemTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Comparing,
    Stopped,
}

pub struct Watcher {
    directory: PathBuf,
    live_path: PathBuf,
    naming: BackupNaming,
    interval: Duration,
    high_water: SystemTime,
    state: WatcherState,
}

impl Watcher {
    /// Create a watcher for the live save in `directory`.
    ///
    /// `interval` must be non-zero.
    pub async fn new(
        directory: impl Into<PathBuf>,
        naming: BackupNaming,
        interval: Duration,
        baseline: Baseline,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(ArchiverError::Config("poll interval must be non-zero".to_string()));
        }

        let directory = directory.into();
        let live_path = directory.join(naming.primary_name());

        let high_water = match baseline {
            Baseline::Now => SystemTime::now(),
            Baseline::At(time) => time,
            Baseline::Current => modified_time(&live_path).await.map_err(|source| {
                ArchiverError::WatchRead {
                    path: live_path.clone(),
                    source,
                }
            })?,
        };

        Ok(Self {
            directory,
            live_path,
            naming,
            interval,
            high_water,
            state: WatcherState::Idle,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    pub fn high_water_mark(&self) -> SystemTime {
        self.high_water
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Compare the live save once, backing it up if it changed.
    ///
    /// A stopped watcher does nothing and returns `Ok(None)`.
    pub async fn poll_once(&mut self) -> Result<Option<BackupEntry>> {
        if self.state == WatcherState::Stopped {
            return Ok(None);
        }
        self.state = WatcherState::Comparing;

        let modified = match modified_time(&self.live_path).await {
            Ok(modified) => modified,
            Err(source) => {
                self.state = WatcherState::Stopped;
                return Err(ArchiverError::WatchRead {
                    path: self.live_path.clone(),
                    source,
                });
            }
        };

        if modified <= self.high_water {
            debug!("No change in {}", self.live_path.display());
            self.state = WatcherState::Idle;
            return Ok(None);
        }
        self.high_water = modified;

        let timestamp = unix_seconds(modified);
        let name = self.naming.encode(timestamp);
        let backup_path = self.directory.join(&name);

        info!("File changed, backing up to {}", name);
        if let Err(source) = copy_contents(&self.live_path, &backup_path).await {
            self.state = WatcherState::Stopped;
            return Err(ArchiverError::Copy {
                from: self.live_path.clone(),
                to: backup_path,
                source,
            });
        }

        self.state = WatcherState::Idle;
        Ok(Some(BackupEntry::new(name, timestamp)))
    }

    /// Poll until cancelled or until a poll fails.
    ///
    /// New backups are recorded in `session`; the end of the loop is
    /// announced there too. The first check happens one interval after
    /// start.
    pub async fn run(mut self, session: ArchiveSession, cancel: CancellationToken) -> Result<()> {
        info!(
            "Monitoring {} every {:?}...",
            self.live_path.display(),
            self.interval
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Stopped monitoring {}", self.live_path.display());
                    self.state = WatcherState::Stopped;
                    session.watcher_stopped(&self.directory, None);
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            match self.poll_once().await {
                Ok(Some(entry)) => {
                    session.record_backup(&self.directory, entry).await;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Watcher stopped: {}", e);
                    session.watcher_stopped(&self.directory, Some(&e));
                    return Err(e);
                }
            }
        }
    }
}
