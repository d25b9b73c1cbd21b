//! Shutdown handling for SIGTERM and SIGINT.
//!
//! The watcher and the console both hold a child of one cancellation
//! token; a signal cancels it and both wind down at their next check.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shutdown coordinator
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled on shutdown
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancel everything holding a token
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("Shutting down");
            self.token.cancel();
        }
    }

    /// Wait for SIGINT or SIGTERM, then shut down.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C)");
            }
            _ = terminate => {
                info!("Received SIGTERM");
            }
            _ = self.token.cancelled() => return,
        }

        self.shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_cancels_tokens() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();

        let handle = tokio::spawn(async move {
            token.cancelled().await;
        });

        coordinator.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_after_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown();
        // Already cancelled, so this must not wait for a signal
        coordinator.wait_for_signal().await;
    }
}
