//! Interactive console for a running archive session.
//!
//! Reads one command per line and prints the catalog, switches
//! directories or restores backups. Backups made by the watcher in the
//! meantime are announced as they arrive.

use crate::archive::BackupEntry;
use crate::session::{ArchiveEvent, ArchiveSession};
use crate::utils::ArchiverError;
use std::io::BufRead;
use std::str::FromStr;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const HELP: &str = "\
Commands:
  list               show backups of the selected directory
  dirs               show save directories
  select <n>         switch to save directory n
  restore <n|name>   restore backup n (or by file name)
  help               show this help
  quit               stop watching and exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List,
    Dirs,
    /// 1-based directory number
    Select(usize),
    /// Backup number (1-based) or file name
    Restore(String),
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();

        if words.next().is_some() {
            return Err(format!("too many arguments for '{command}'"));
        }

        match (command, argument) {
            ("list" | "ls", None) => Ok(ConsoleCommand::List),
            ("dirs", None) => Ok(ConsoleCommand::Dirs),
            ("select", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(ConsoleCommand::Select(n)),
                _ => Err(format!("'{n}' is not a directory number")),
            },
            ("restore", Some(which)) => Ok(ConsoleCommand::Restore(which.to_string())),
            ("help" | "?", None) => Ok(ConsoleCommand::Help),
            ("quit" | "exit", None) => Ok(ConsoleCommand::Quit),
            ("select" | "restore", None) => Err(format!("'{command}' needs an argument")),
            _ => Err(format!("unknown command '{}'; try 'help'", line.trim())),
        }
    }
}

/// Read stdin on a dedicated thread, one line per message.
///
/// A blocking read on a runtime thread would hold up shutdown until the
/// next newline; a detached thread does not.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the console until `quit`, end of input or cancellation.
pub async fn run<W>(
    session: ArchiveSession,
    mut input: mpsc::Receiver<String>,
    mut output: W,
    cancel: CancellationToken,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut events = session.subscribe();
    let mut events_open = true;

    output.write_all(HELP.as_bytes()).await?;
    print_catalog(&session, &mut output).await?;
    output.flush().await?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = input.recv() => {
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => execute(&session, command, &mut output).await?,
                    Err(message) => output.write_all(format!("{message}\n").as_bytes()).await?,
                }
            }
            event = events.recv(), if events_open => match event {
                Ok(event) => announce(&event, &mut output).await?,
                Err(RecvError::Lagged(missed)) => debug!("Console missed {} event(s)", missed),
                Err(RecvError::Closed) => events_open = false,
            },
        }
        output.flush().await?;
    }

    output.flush().await
}

async fn execute<W>(session: &ArchiveSession, command: ConsoleCommand, output: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match command {
        ConsoleCommand::List => print_catalog(session, output).await,
        ConsoleCommand::Dirs => print_directories(session, output).await,
        ConsoleCommand::Help => output.write_all(HELP.as_bytes()).await,
        ConsoleCommand::Select(n) => match session.select_directory(n - 1).await {
            Ok(_) => print_catalog(session, output).await,
            Err(ArchiverError::UnknownDirectory(_)) => {
                output
                    .write_all(format!("Error: no save directory {n}; see 'dirs'\n").as_bytes())
                    .await
            }
            Err(e) => output.write_all(format!("Error: {e}\n").as_bytes()).await,
        },
        ConsoleCommand::Restore(which) => {
            let catalog = session.catalog().await;
            let Some(entry) = resolve_backup(&catalog, &which) else {
                return output
                    .write_all(format!("Error: no backup '{which}'; see 'list'\n").as_bytes())
                    .await;
            };
            let message = match session.restore(&entry.file_name).await {
                Ok(report) => {
                    let mut message = format!("Backup '{}' restored\n", report.entry.label);
                    if let Some(warning) = report.warning {
                        message.push_str(&format!("Warning: {warning}\n"));
                    }
                    message
                }
                Err(e) => format!("Error: {e}\n"),
            };
            output.write_all(message.as_bytes()).await
        }
        ConsoleCommand::Quit => Ok(()),
    }
}

/// Find a backup by 1-based position or exact file name.
pub fn resolve_backup<'a>(catalog: &'a [BackupEntry], which: &str) -> Option<&'a BackupEntry> {
    match which.parse::<usize>() {
        Ok(n) if n > 0 => catalog.get(n - 1),
        _ => catalog.iter().find(|e| e.file_name == which),
    }
}

async fn print_catalog<W>(session: &ArchiveSession, output: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let directory = session.selected_directory().await;
    let catalog = session.catalog().await;

    let mut text = format!("Backups in {}:\n", directory.display());
    if catalog.is_empty() {
        text.push_str("  (none)\n");
    }
    for (i, entry) in catalog.iter().enumerate() {
        text.push_str(&format!("  {:>3}. {}  {}\n", i + 1, entry.label, entry.file_name));
    }
    output.write_all(text.as_bytes()).await
}

async fn print_directories<W>(session: &ArchiveSession, output: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let selected = session.selected_index().await;
    let mut text = String::new();
    for (i, dir) in session.directories().await.iter().enumerate() {
        let marker = if i == selected { '*' } else { ' ' };
        text.push_str(&format!("{} {:>3}. {}\n", marker, i + 1, dir.display()));
    }
    output.write_all(text.as_bytes()).await
}

async fn announce<W>(event: &ArchiveEvent, output: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let text = match event {
        ArchiveEvent::BackupCreated { entry, .. } => {
            format!("New backup: {}  {}\n", entry.label, entry.file_name)
        }
        ArchiveEvent::WatcherStopped { directory, error: Some(error) } => {
            format!("Watcher for {} stopped: {}\n", directory.display(), error)
        }
        // Outcomes of our own commands are printed where they are issued
        _ => return Ok(()),
    };
    output.write_all(text.as_bytes()).await
}
