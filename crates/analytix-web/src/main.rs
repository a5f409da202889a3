use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use analytix_core::{AnalysisController, Config, FileStore, KeyValueStore, MemoryStore, Session};

mod api;
mod error;

/// AnalytiX Hub web server - JSON API and live run events.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on (defaults to ANALYTIX_PORT, then 5001)
    #[arg(long)]
    port: Option<u16>,

    /// Key-value store file; in-memory when unset
    #[arg(long)]
    store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Resolve config from CLI flags > env vars > defaults
    let config = Config::from_env();
    let port = args
        .port
        .or_else(|| std::env::var("ANALYTIX_PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(5001);

    let store: Arc<dyn KeyValueStore> = match args.store.or(config.store_path) {
        Some(path) => {
            log::info!("using store {}", path.display());
            Arc::new(FileStore::open(path)?)
        }
        None => {
            log::info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(api::AppState {
        controller: AnalysisController::new(config.timing),
        session: Session::new(store),
    });
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await?;

    Ok(())
}
