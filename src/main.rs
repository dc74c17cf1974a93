//! Media Cache - A caching proxy for media segments
//!
//! Deduplicates concurrent segment fetches, keeps cacheable media in a blob
//! store, and evicts oldest insertions first to stay within a byte budget.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_cache::api::{create_router, AppState};
use media_cache::cache::{BlobStore, DiskBlobStore, MemoryBlobStore};
use media_cache::proxy::ReqwestTransport;
use media_cache::{spawn_stats_log_task, Config, MediaCache};

/// Main entry point for the media caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the blob store and build the upstream transport
/// 4. Start background usage log task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Media Cache proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}B, eviction_target_ratio={}, port={}, cache_dir={:?}, drm_domains={:?}",
        config.capacity_bytes,
        config.eviction_target_ratio,
        config.server_port,
        config.cache_dir,
        config.drm_license_domains
    );

    let store: Arc<dyn BlobStore> = match &config.cache_dir {
        Some(dir) => {
            let store = DiskBlobStore::open(dir)
                .await
                .with_context(|| format!("failed to open cache directory {}", dir.display()))?;
            info!("Disk store opened at {}", store.root().display());
            warn!("Usage accounting starts at zero; objects already on disk are not tracked");
            Arc::new(store)
        }
        None => Arc::new(MemoryBlobStore::new()),
    };

    let transport = ReqwestTransport::new(Duration::from_secs(config.fetch_timeout))
        .context("failed to build upstream HTTP client")?;

    let cache = MediaCache::from_config(&config, store, Arc::new(transport))?;
    info!("Cache engine initialized");

    let stats_handle = spawn_stats_log_task(cache.clone(), config.stats_log_interval);
    info!("Background usage log task started");

    let app = create_router(AppState::new(cache));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stats_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the usage log task and allows graceful shutdown.
async fn shutdown_signal(stats_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    stats_handle.abort();
    warn!("Usage log task aborted");
}
