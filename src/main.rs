use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use locomotive::{
    config::Config,
    orders::{HttpOrders, InMemoryOrders, OrderSource},
    routes::{router, AppState},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .context("building HTTP client")?;

    let orders: Arc<dyn OrderSource> = match (&config.orders_api_base, &config.orders_seed_file) {
        (Some(base), _) => {
            tracing::info!("Orders served from {}", base);
            Arc::new(HttpOrders::new(http.clone(), base.clone()))
        }
        (None, Some(path)) => Arc::new(InMemoryOrders::from_seed_file(path)?),
        (None, None) => Arc::new(InMemoryOrders::new()),
    };

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&config, http, orders, shutdown.clone());
    let app = router(state, &config.spa_dir);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, spa_dir = %config.spa_dir.display(), "🚀 Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("🛑 Shutting down gracefully");
    shutdown.cancel();
}
