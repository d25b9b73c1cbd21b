//! The on-disk archive: backup naming and catalog discovery.

pub mod catalog;
pub mod naming;

pub use catalog::{discover, BackupEntry};
pub use naming::BackupNaming;
