//! Anime browser CLI application.

use std::io::BufRead;
use std::path::PathBuf;

use anime_browser::{input, view, App, BookmarkSet, Command};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jikan_client::JikanClient;
use shared::{Config, DataPaths, LogConfig, SqliteStore};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging (also logs to stderr)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Browse interactively from stdin (default)
    Interactive,
    /// Print one page of search results
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Print the full record of one anime
    Show { id: u32 },
    /// Print saved anime
    Saved,
    /// Remove a saved anime
    Unsave { id: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize data paths
    let storage_path = config.storage_path();
    let log_dir = config.log_dir();
    let mut dirs = Vec::new();
    if let Some(parent) = storage_path.parent() {
        dirs.push(parent);
    }
    if config.logging.file {
        dirs.push(log_dir.as_path());
    }
    DataPaths::new(config.data_dir())
        .create_dirs(&dirs)
        .context("Failed to create data directories")?;

    // Initialize logging
    let mut log_config = LogConfig::from_config(&config, "anime-browser");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
        log_config.console = true;
    }
    shared::logging::init(log_config)?;

    info!("Anime browser starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Open storage and load bookmarks
    info!(path = %storage_path.display(), "Opening storage");
    let store = SqliteStore::open(&storage_path).context("Failed to open storage")?;
    let mut bookmarks = BookmarkSet::load(store, config.storage.bookmarks_key.clone());

    // Initialize API client
    let client = JikanClient::new(
        config.catalog.base_url.clone(),
        config.request_timeout(),
        &config.catalog.user_agent,
    )
    .context("Failed to create Jikan client")?;

    match args.command.unwrap_or(Mode::Interactive) {
        Mode::Interactive => interactive(client, bookmarks, &config).await?,
        Mode::Search { query, page } => {
            let results = client
                .search(&query, page)
                .await
                .with_context(|| format!("Search for \"{}\" failed", query))?;

            if results.data.is_empty() {
                println!("No anime found for \"{}\"", query);
            }
            for item in &results.data {
                println!("{}", view::result_line(item, bookmarks.contains(item.mal_id)));
            }
            println!("{}", view::page_line(results.current_page(), results.last_page()));
        }
        Mode::Show { id } => {
            let item = client
                .get_by_id(id)
                .await
                .with_context(|| format!("Failed to fetch anime {}", id))?;
            print!("{}", view::detail(&item, bookmarks.contains(id)));
        }
        Mode::Saved => {
            let saved: Vec<_> = bookmarks.iter().cloned().collect();
            print!("{}", view::bookmark_list(&saved));
        }
        Mode::Unsave { id } => {
            if bookmarks.remove(id)? {
                println!("Removed {} from saved anime", id);
            } else {
                println!("Anime {} is not saved", id);
            }
        }
    }

    info!("Anime browser finished");
    Ok(())
}

async fn interactive(
    client: JikanClient,
    bookmarks: BookmarkSet<SqliteStore>,
    config: &Config,
) -> Result<()> {
    let app = App::new(client, bookmarks, config.debounce());
    let mut snapshots = app.subscribe();

    println!("{}", view::render(&snapshots.borrow_and_update()));
    println!("{}", anime_browser::app::HELP);

    let renderer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let out = view::render(&snapshots.borrow_and_update());
            println!("{}", out);
        }
    });

    let (tx, rx) = mpsc::channel(32);
    spawn_stdin_reader(tx);

    app.run(rx).await?;
    renderer.await.context("Renderer task failed")?;
    Ok(())
}

/// Blocking stdin reads run on their own thread, outside the runtime
fn spawn_stdin_reader(commands: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };

            match input::parse_line(&line) {
                Ok(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{:#}", e),
            }
        }
    });
}
