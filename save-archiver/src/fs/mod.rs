//! Filesystem helpers shared by the catalog, watcher and restore.

pub mod metadata;
pub mod walker;
