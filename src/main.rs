use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use marian::coordinator::handlers::{handle_refresh, handle_status};
use marian::coordinator::service::Coordinator;
use marian::manifest::fetcher::{ManifestFetcher, ManifestSource};
use marian::pool::pool::{Pool, DEFAULT_POOL_SIZE};
use marian::search::handlers::handle_search;
use marian::spelling::Dictionary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --source <bucket:BUCKET/PREFIX | dir:PATH> [--bind <addr:port>] [--workers <n>] [--words <path>]",
            args[0]
        );
        eprintln!("Example: {} --source dir:./manifests", args[0]);
        eprintln!(
            "Example: {} --source bucket:docs-search/prod --bind 127.0.0.1:8080 --workers 4",
            args[0]
        );
        std::process::exit(1);
    }

    let mut source: Option<String> = None;
    let mut bind_addr: SocketAddr = "0.0.0.0:8080".parse()?;
    let mut worker_count = DEFAULT_POOL_SIZE;
    let mut wordlist: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--source" => {
                source = Some(args[i + 1].clone());
                i += 2;
            }
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            "--workers" => {
                worker_count = args[i + 1].parse()?;
                i += 2;
            }
            "--words" => {
                wordlist = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let source = source.expect("--source is required");
    // a bad source string is fatal before anything starts
    let source = ManifestSource::from_str(&source)?;

    let dictionary = match &wordlist {
        Some(path) => {
            let dictionary = Dictionary::load(path)?;
            tracing::info!("Loaded {} dictionary words from {:?}", dictionary.len(), path);
            Some(Arc::new(dictionary))
        }
        None => None,
    };

    tracing::info!("Starting {} search workers", worker_count);
    let pool = Arc::new(Pool::new(worker_count, dictionary)?);

    let fetcher = ManifestFetcher::for_source(&source);
    let coordinator = Arc::new(Coordinator::new(pool.clone(), fetcher));

    // 1. Initial load: failures are recorded, not fatal; the service comes
    // up answering still-indexing until a sync lands.
    match coordinator.load().await {
        Ok(outcome) => tracing::info!("Initial manifest load finished: {:?}", outcome),
        Err(err) => tracing::error!("Initial manifest load failed: {}", err),
    }

    // 2. HTTP router:
    let app = Router::new()
        .route("/health/routes", get(handle_routes))
        .route("/search", get(handle_search))
        .route("/status", get(handle_status))
        .route("/refresh", post(handle_refresh))
        .layer(Extension(pool.clone()))
        .layer(Extension(coordinator.clone()));

    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct RoutesResponse {
    routes: Vec<&'static str>,
}

async fn handle_routes() -> Json<RoutesResponse> {
    Json(RoutesResponse {
        routes: vec!["/health/routes", "/search", "/status", "/refresh"],
    })
}
