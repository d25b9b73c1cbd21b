//! Save Archiver Library
//!
//! Watches a game's live save file, keeps a timestamped backup of every
//! version it takes, and restores any of them on request.

pub mod archive;
pub mod config;
pub mod console;
pub mod daemon;
pub mod discovery;
pub mod fs;
pub mod restore;
pub mod session;
pub mod utils;
pub mod watcher;

// Re-export commonly used types
pub use archive::{BackupEntry, BackupNaming};
pub use config::Config;
pub use restore::RestoreReport;
pub use session::{ArchiveEvent, ArchiveSession};
pub use utils::errors::ArchiverError;
pub use watcher::{Baseline, Watcher};
pub type Result<T> = std::result::Result<T, ArchiverError>;
