use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floor_stats::api::state::AppState;
use floor_stats::api::{build_router, cors_layer};
use floor_stats::config::AppConfig;
use floor_stats::fetch::GistFetcher;
use floor_stats::query::{query_matchups, query_play_rates, query_win_rates};
use floor_stats::refresh::{RefreshKey, RefreshSummary, RefreshWorker};
use floor_stats::storage::{CsvTableStore, RawMatchStore, StorageConfig, TableStore};

#[derive(Parser)]
#[command(name = "floor-stats")]
#[command(about = "Guilty Gear Strive per-floor win rates, play rates and matchups")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch the latest snapshot and rebuild all tables
    Refresh,

    /// Rebuild all tables from the stored raw snapshot
    Rebuild,

    /// Print the statistics for one floor
    Show {
        /// Floor code (1-10, 99) or "celestial"
        #[arg(long)]
        floor: String,
    },

    /// Print the digest of a refresh secret for `refresh.key_sha256`
    HashKey {
        secret: String,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_worker(config: &AppConfig, tables: Arc<dyn TableStore>) -> Result<Arc<RefreshWorker>> {
    let storage = StorageConfig::new(config.data_dir.clone());
    let fetcher = GistFetcher::new(config.source.fetcher_config())?;
    Ok(Arc::new(RefreshWorker::new(
        Arc::new(fetcher),
        RawMatchStore::new(&storage),
        tables,
    )))
}

fn print_summary(summary: &RefreshSummary) {
    println!("\n=== Refresh Results ===");
    println!("Rows read:        {}", summary.rows_read);
    println!("Malformed rows:   {}", summary.malformed_rows);
    println!("Rejected rows:    {}", summary.rejected_rows);
    println!("Matches:          {}", summary.matches_aggregated);
    println!("Tables written:   {}", summary.tables_written);
    println!(
        "Duration:         {}ms",
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
}

fn show(store: &dyn TableStore, floor: &str) -> Result<()> {
    let win_rates = query_win_rates(store, floor)?;
    let play_rates = query_play_rates(store, floor)?;
    let matchups = query_matchups(store, floor)?;

    println!("\n=== Win Rates ===");
    for entry in win_rates.iter().rev() {
        println!(
            "{:<14} {:>6.1}% ± {:.1}",
            entry.character,
            entry.win_rate * 100.0,
            entry.confidence * 100.0
        );
    }

    println!("\n=== Play Rates ===");
    for entry in play_rates.iter().rev() {
        println!("{:<14} {:>6.1}%", entry.character, entry.play_rate * 100.0);
    }

    println!("\n=== Matchups (row vs column, out of 10) ===");
    print!("{:<14}", "");
    for name in &matchups.characters {
        print!(" {:>4.4}", name);
    }
    println!();
    for (name, row) in matchups.characters.iter().zip(&matchups.cells) {
        print!("{:<14}", name);
        for cell in row {
            print!(" {:>4.1}", cell * 10.0);
        }
        println!();
    }

    Ok(())
}

fn load_config(cli: &Cli, path: &Path) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::HashKey { secret } = &cli.command {
        println!("{}", RefreshKey::hash_secret(secret));
        return Ok(());
    }

    let config = load_config(&cli, &cli.config)?;
    init_tracing(&config.log_level, cli.json_logs);

    tracing::info!("Starting floor-stats v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let tables: Arc<dyn TableStore> = Arc::new(CsvTableStore::new(storage));

    match cli.command {
        Commands::Serve { host, port } => {
            let refresh_key = RefreshKey::from_hex(&config.refresh.key_sha256)
                .context("Invalid refresh.key_sha256")?;
            if !refresh_key.is_enabled() {
                tracing::warn!("No refresh key configured, POST /update is disabled");
            }

            let worker = build_worker(&config, tables.clone())?;
            let state = AppState::new(tables, worker, refresh_key);
            let app = build_router(state, cors_layer(&config.server.cors_origin));

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Refresh => {
            let worker = build_worker(&config, tables)?;
            let summary = worker.run_once().await?;
            print_summary(&summary);
        }
        Commands::Rebuild => {
            let worker = build_worker(&config, tables)?;
            let summary = worker.rebuild_from_raw().await?;
            print_summary(&summary);
        }
        Commands::Show { floor } => {
            show(tables.as_ref(), &floor)?;
        }
        Commands::HashKey { .. } => {}
    }

    Ok(())
}
