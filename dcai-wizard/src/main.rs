//! dcai-wizard - DataCleanAI Wizard Service
//!
//! Guides a user through a 4-step flow (upload PDF → extract text → clean
//! with AI → database integration), owning the wizard session state and
//! proxying all heavy lifting to the configured external backend.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dcai_wizard::AppState;

/// Command-line arguments for dcai-wizard
#[derive(Parser, Debug)]
#[command(name = "dcai-wizard")]
#[command(about = "DataCleanAI wizard service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "DCAI_PORT")]
    port: Option<u16>,

    /// Data folder holding the SQLite database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Backend base URL for all proxy routes
    #[arg(short, long)]
    backend_url: Option<String>,
}

/// Default HTTP listen port
const DEFAULT_PORT: u16 = 5810;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dcai_wizard=info,dcai_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting dcai-wizard (DataCleanAI Wizard Service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve data folder (CLI > ENV > TOML > OS default)
    let root_folder = dcai_common::config::resolve_root_folder(
        args.root_folder.as_deref(),
        "DCAI_ROOT_FOLDER",
    );
    dcai_common::config::ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize data folder: {}", e))?;
    info!("Data folder: {}", root_folder.display());

    // Step 2: Open or create database
    let db_path = root_folder.join("dcai.db");
    info!("Database: {}", db_path.display());
    let db_pool = dcai_wizard::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Step 3: Resolve backend URL (CLI > ENV > TOML)
    let backend_url = dcai_wizard::config::resolve_backend_url(args.backend_url);

    // Step 4: Create application state and rehydrate the wizard session
    let state = AppState::new(db_pool, backend_url);
    state
        .store
        .hydrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to rehydrate wizard state: {}", e))?;

    let port = args.port.unwrap_or_else(|| {
        dcai_common::config::load_toml_config()
            .ok()
            .and_then(|config| config.port)
            .unwrap_or(DEFAULT_PORT)
    });

    // Build router and serve
    let app = dcai_wizard::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
