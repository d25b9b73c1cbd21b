//! Process lifecycle.

pub mod shutdown;
pub mod supervisor;

pub use shutdown::ShutdownCoordinator;
pub use supervisor::{supervise, ExitReason};
