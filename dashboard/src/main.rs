mod aggregate;
mod config;
mod routes;
mod store;
mod types;
mod ui;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::store::sqlite::SqliteStore;
use crate::store::supabase::SupabaseStore;
use crate::store::SharedStore;

/// Shared application state passed to all route handlers via Axum's State
/// extractor. The store is constructed once at startup and held for the
/// process lifetime; nothing here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

#[derive(Parser)]
#[command(
    name = "dashboard",
    about = "Read-only monitoring dashboard over a Polymarket trading agent's record store"
)]
struct Cli {
    /// Listen port (overrides DASHBOARD_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Path to the agent's SQLite database (overrides DATABASE_PATH)
    #[arg(long)]
    db: Option<String>,

    /// Load config from a specific .env file
    #[arg(long)]
    config_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env_file(cli.config_file.as_deref())?;
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(db) = cli.db {
        cfg.db_path = db;
    }

    let store: SharedStore = match cfg.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&cfg.db_path)?),
        StoreBackend::Supabase => {
            Arc::new(SupabaseStore::new(&cfg.supabase_url, &cfg.supabase_anon_key))
        }
    };

    info!("══════════════════════════════════════════════════════");
    info!("  POLYMARKET AGENT DASHBOARD (read-only)");
    match cfg.backend {
        StoreBackend::Sqlite => info!("  Store: sqlite at {}", cfg.db_path),
        StoreBackend::Supabase => info!("  Store: supabase at {}", cfg.supabase_url),
    }
    info!("  http://localhost:{}", cfg.port);
    info!("══════════════════════════════════════════════════════");

    let state = AppState { store };

    let app = Router::new()
        .route("/", get(ui::page))
        .route("/api/health", get(routes::health::health))
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/analytics", get(routes::analytics::get_analytics))
        .route("/api/positions", get(routes::positions::get_positions))
        .route("/api/prices", get(routes::prices::get_prices))
        .route("/api/trades", get(routes::trades::get_trades))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("Routes:");
    info!("  GET  /api/dashboard");
    info!("  GET  /api/analytics");
    info!("  GET  /api/positions");
    info!("  GET  /api/prices?marketId=...&limit=200");
    info!("  GET  /api/trades?status=&strategy=&limit=50&offset=0");
    info!("  GET  /api/health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
