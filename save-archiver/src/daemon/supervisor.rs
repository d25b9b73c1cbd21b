//! Runs the watcher and the console side by side.
//!
//! Whichever ends first ends the other: `quit` or end of input on the
//! console, a stopped watcher, or SIGINT/SIGTERM.

use super::ShutdownCoordinator;
use crate::console;
use crate::session::ArchiveSession;
use crate::utils::Result;
use crate::watcher::Watcher;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Why a watch session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    Console,
    WatcherStopped,
}

/// Watch until the console quits, the watcher stops or a signal arrives.
pub async fn supervise<W>(
    session: ArchiveSession,
    watcher: Watcher,
    input: mpsc::Receiver<String>,
    output: W,
    shutdown: &ShutdownCoordinator,
) -> Result<ExitReason>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut watcher_handle = tokio::spawn(watcher.run(session.clone(), shutdown.token()));
    let mut console_handle = tokio::spawn(console::run(session, input, output, shutdown.token()));

    let reason = tokio::select! {
        _ = shutdown.wait_for_signal() => ExitReason::Signal,
        result = &mut console_handle => {
            if let Err(e) = result.map_err(std::io::Error::from)? {
                error!("Console error: {}", e);
            }
            ExitReason::Console
        }
        result = &mut watcher_handle => {
            if let Err(e) = result.map_err(std::io::Error::from)? {
                info!("Watcher ended the session: {}", e);
            }
            ExitReason::WatcherStopped
        }
    };

    shutdown.shutdown();

    if reason != ExitReason::WatcherStopped {
        if let Err(e) = watcher_handle.await.map_err(std::io::Error::from)? {
            // Already announced to the console when it happened
            debug!("Watcher had stopped: {}", e);
        }
    }
    if reason != ExitReason::Console {
        if let Err(e) = console_handle.await.map_err(std::io::Error::from)? {
            error!("Console error: {}", e);
        }
    }

    info!("Watch session ended ({:?})", reason);
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::BackupNaming;
    use crate::watcher::Baseline;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn setup(dir: &Path) -> (ArchiveSession, Watcher) {
        let naming = BackupNaming::new("DDDA", ".sav").unwrap();
        fs::write(dir.join("DDDA.sav"), b"v1").unwrap();
        let session = ArchiveSession::open(vec![dir.to_path_buf()], naming.clone())
            .await
            .unwrap();
        let watcher = Watcher::new(dir, naming, Duration::from_millis(20), Baseline::Current)
            .await
            .unwrap();
        (session, watcher)
    }

    #[tokio::test]
    async fn test_stopped_watcher_ends_session() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (session, watcher) = setup(temp_dir.path()).await;
        fs::remove_file(temp_dir.path().join("DDDA.sav"))?;

        // Console input stays open; only the watcher can end this
        let (_tx, rx) = mpsc::channel(1);
        let shutdown = ShutdownCoordinator::new();

        let reason = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(session, watcher, rx, tokio::io::sink(), &shutdown),
        )
        .await
        .expect("session ends once the live save is gone")?;

        assert_eq!(reason, ExitReason::WatcherStopped);
        Ok(())
    }

    #[tokio::test]
    async fn test_quit_ends_session() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (session, watcher) = setup(temp_dir.path()).await;

        let (tx, rx) = mpsc::channel(1);
        tx.send("quit".to_string()).await.unwrap();
        let shutdown = ShutdownCoordinator::new();

        let reason = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(session, watcher, rx, tokio::io::sink(), &shutdown),
        )
        .await
        .expect("quit ends the session")?;

        assert_eq!(reason, ExitReason::Console);
        Ok(())
    }
}
