//! tlft-tk (Tracker) - Production/QC workflow tracking service
//!
//! Tracks programming and QC progress on clinical reporting deliverables:
//! per-item workflow state, programmer assignment, threaded review comments
//! with a consistent unresolved count, and SSE change notifications.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tlft_common::config::{database_path, resolve_root_folder};
use tlft_common::db::init::init_database;
use tlft_tk::workflow::BulkPolicy;
use tlft_tk::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "tlft-tk", about = "TLFT tracker service")]
struct Args {
    /// Root folder holding the database (falls back to TLFT_ROOT_FOLDER,
    /// then the config file, then the OS data directory)
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen host
    #[arg(long, env = "TLFT_TK_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(long, env = "TLFT_TK_PORT", default_value_t = 5780)]
    port: u16,

    /// Missing-id handling for bulk updates: best_effort or strict
    #[arg(long, env = "TLFT_BULK_POLICY", default_value = "best_effort")]
    bulk_policy: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting TLFT Tracker (tlft-tk) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let bulk_policy = BulkPolicy::parse(&args.bulk_policy).ok_or_else(|| {
        anyhow::anyhow!(
            "invalid bulk policy '{}' (expected best_effort or strict)",
            args.bulk_policy
        )
    })?;

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "TLFT_ROOT_FOLDER")?;
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Connected to database");

    let state = AppState::new(pool, bulk_policy);
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("tlft-tk listening on http://{addr}");
    info!("Health check: http://{addr}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
