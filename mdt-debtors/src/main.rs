//! mdt-debtors - Debtor lookup microservice
//!
//! Serves debtor records to the web tier and enriches them with contact
//! phones from the local cache, the remote client registry and the external
//! registry (EDR).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use mdt_common::config::TomlConfig;
use mdt_debtors::config::EnrichmentConfig;
use mdt_debtors::services::{
    EdrClient, IdentityResolver, PhoneCache, PhoneEnricher, SqlIdentityResolver,
};
use mdt_debtors::AppState;

/// Command-line arguments for mdt-debtors
#[derive(Parser, Debug)]
#[command(name = "mdt-debtors")]
#[command(about = "Debtor lookup microservice with phone enrichment")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "MDT_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Installed first so config loading is logged
    let log_handle = mdt_debtors::logging::init();

    let args = Args::parse();

    let mut config = mdt_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    mdt_debtors::logging::apply_configured_level(&log_handle, &config.logging.level);

    info!("Starting mdt-debtors (Debtor lookup) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let db = mdt_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let resolver = connect_resolver(&config).await;
    let enrichment_config = EnrichmentConfig::from_toml(&config);

    let registry = EdrClient::new(
        enrichment_config.registry_base_url.clone(),
        enrichment_config.registry_timeout_ms,
        enrichment_config.registry_api_token.clone(),
    )
    .context("Failed to build registry client")?;

    let enricher = PhoneEnricher::new(
        enrichment_config,
        PhoneCache::new(db.clone()),
        resolver,
        Arc::new(registry),
    );
    info!(enabled = enricher.is_enabled(), "Phone enrichment configured");

    let state = AppState::new(db, Arc::new(enricher));
    let app = mdt_debtors::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Remote identity resolver, or `None` when the remote database is not
/// configured or unreachable (enrichment then stays disabled)
async fn connect_resolver(config: &TomlConfig) -> Option<Arc<dyn IdentityResolver>> {
    if !config.remote_db_enabled() {
        info!("Remote identity database not configured, phone enrichment disabled");
        return None;
    }

    let url = config.remote_database.as_ref()?.url.as_str();
    match mdt_common::db::connect_remote(url).await {
        Ok(pool) => Some(Arc::new(SqlIdentityResolver::new(pool))),
        Err(e) => {
            warn!(error = %e, "Remote identity database unavailable, phone enrichment disabled");
            None
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
