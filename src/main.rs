use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderName;
use snaplink::auth::HeaderPrincipalProvider;
use snaplink::config::{AppConfig, LogConfig, LogFormat};
use snaplink::store::SqliteLinkStore;
use snaplink::{build_router, AppState};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let generator = config
        .slug_generator()
        .context("invalid slug configuration")?;
    let principal_header = HeaderName::try_from(config.auth.principal_header.as_str())
        .context("invalid auth.principal_header")?;

    let store = SqliteLinkStore::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;

    let state = Arc::new(AppState::new(
        Arc::new(store),
        generator,
        Arc::new(HeaderPrincipalProvider::new(principal_header)),
        config.server.public_base_url.clone(),
    ));

    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "snaplink listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(in_flight = state.clicks.in_flight(), "waiting for pending click writes");
    state.clicks.drain().await;
    tracing::info!("shutdown complete");

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("snaplink={},tower_http=info", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}
