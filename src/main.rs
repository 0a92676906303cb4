use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use reqwest::Url;

use filegrid::{
    api, config::LoaderConfig, store::demo_files, FetchOutcome, FileStore, HttpFetcher,
    PageLoader, Phase, QueryStyle,
};

#[derive(Parser, Debug)]
#[command(name = "filegrid", version, about = "Paged file listing service and infinite scroll loader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `GET/POST /api/files` over an in-memory collection
    Serve {
        /// Listen address
        #[arg(long, default_value = ":::3000")]
        bind: String,
        /// Number of sample documents to start with
        #[arg(long, default_value_t = 67)]
        seed: usize,
    },
    /// Load a listing page by page until it is exhausted
    Browse {
        /// Listing endpoint, e.g. http://localhost:3000/api/files
        endpoint: Url,
        /// Json loader config
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Records per page, overrides the config
        #[arg(long)]
        page_size: Option<usize>,
        /// Size the first page to this viewport height
        #[arg(long, value_name = "PX")]
        viewport_height: Option<f64>,
        /// Query string style of the endpoint
        #[arg(long, value_enum, default_value_t = QueryStyle::Skip)]
        style: QueryStyle,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Serve { bind, seed } => serve(&bind, seed).await,
        Command::Browse { endpoint, config, page_size, viewport_height, style } => {
            let mut config = match config {
                Some(path) => LoaderConfig::load(&path)?,
                None => LoaderConfig::default(),
            };
            if let Some(page_size) = page_size {
                config.page_size = page_size;
            }
            browse(HttpFetcher::new(endpoint).style(style), config, viewport_height).await
        }
    }
}

async fn serve(bind: &str, seed: usize) -> Result<()> {
    let store = Arc::new(FileStore::with_records(demo_files(seed)));
    let app = api::router(Arc::clone(&store));

    let listener =
        tokio::net::TcpListener::bind(bind).await.with_context(|| format!("binding {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, files = store.count()?, "serving /api/files");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
    }
}

async fn browse(
    fetcher: HttpFetcher,
    config: LoaderConfig,
    viewport_height: Option<f64>,
) -> Result<()> {
    let page_size = config.page_size;
    let loader = PageLoader::new(fetcher, config);

    // Renderer: print every snapshot
    let mut snapshots = loader.snapshots();
    let render = tokio::spawn(async move {
        while let Some(state) = snapshots.next().await {
            match state.phase() {
                Phase::Loading => println!("Loading..."),
                Phase::Error => println!(
                    "Failed to load data: {}",
                    state.error.as_deref().unwrap_or_default()
                ),
                Phase::Idle | Phase::Exhausted => {
                    println!("Showing {} of {} rows", state.records.len(), state.total);
                }
            }
        }
    });

    let mut outcome = match viewport_height {
        Some(height) => loader.initialize_for_viewport(height).await?,
        None => loader.initialize(page_size).await?,
    };
    while let FetchOutcome::Appended { .. } = outcome {
        outcome = loader.request_next_page().await?;
    }

    let state = loader.state();
    drop(loader);
    render.await?;

    match state.error {
        Some(e) => Err(anyhow::anyhow!("listing stopped after {} rows: {e}", state.records.len())),
        None => Ok(()),
    }
}
