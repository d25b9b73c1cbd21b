//! Save Archiver - Main entry point
//!
//! Watches the live save and archives every version of it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use save_archiver::{
    console,
    daemon::{self, ShutdownCoordinator},
    discovery, utils, ArchiveSession, Config, Watcher,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Use this save directory instead of searching the Steam installation
    #[arg(short, long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List candidate save directories
    Dirs,

    /// List backups of the first save directory
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a backup over the live save
    Restore {
        /// Backup file name, e.g. DDDA-1700000000.sav.bak
        backup: String,
    },

    /// Watch the live save and accept console commands
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!("Starting save-archiver v{}", env!("CARGO_PKG_VERSION"));

    let naming = config.naming()?;
    let directories = match &args.save_dir {
        Some(dir) => vec![dir.clone()],
        None => {
            let steam_root = discovery::resolve_steam_root(config.steam.path.as_deref())?;
            discovery::discover_save_dirs(&steam_root, &config.game.app_id, &naming.primary_name())?
        }
    };

    match args.command {
        Command::Dirs => {
            for dir in &directories {
                println!("{}", dir.display());
            }
        }
        Command::List { json } => {
            let session = ArchiveSession::open(directories, naming).await?;
            let catalog = session.catalog().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                for entry in &catalog {
                    println!("{}  {}", entry.label, entry.file_name);
                }
            }
        }
        Command::Restore { backup } => {
            let session = ArchiveSession::open(directories, naming).await?;
            let report = session.restore(&backup).await?;
            println!("Backup '{}' restored", report.entry.label);
            println!("Previous save kept as {}", report.displaced.display());
            if let Some(warning) = report.warning {
                eprintln!("Warning: {warning}");
            }
        }
        Command::Watch => {
            let session = ArchiveSession::open(directories, naming).await?;
            watch(session, &config).await?;
        }
    }

    Ok(())
}

/// Run the watcher and the console until either ends or a signal arrives.
async fn watch(session: ArchiveSession, config: &Config) -> Result<()> {
    let shutdown = ShutdownCoordinator::new();

    let directory = session.selected_directory().await;
    let watcher = Watcher::new(
        directory,
        session.naming().clone(),
        config.poll_interval(),
        config.watch.baseline.into(),
    )
    .await?;

    let reason = daemon::supervise(
        session,
        watcher,
        console::spawn_stdin_reader(),
        tokio::io::stdout(),
        &shutdown,
    )
    .await?;

    if reason == daemon::ExitReason::WatcherStopped {
        eprintln!("Watcher stopped; exiting");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
