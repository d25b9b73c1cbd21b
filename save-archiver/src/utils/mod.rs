//! Utility modules for the save archiver.

pub mod errors;
pub mod logger;

pub use errors::{ArchiverError, RestoreStage, RestoreTimestampWarning, Result};
