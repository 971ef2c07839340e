//! Coordination backend for live multi-participant quiz sessions.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use live_quiz_back::{
    config::{AppConfig, SharedSecret},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = AppConfig::load();
    let authorizer = Arc::new(SharedSecret::from_env());
    let state = AppState::new(config, authorizer);

    attach_store(&state).await?;
    tokio::spawn(storage_supervisor::run(state.clone()));

    let app = routes::build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding 0.0.0.0:{port}"))?;
    info!(port, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

/// Connect the MongoDB store in the background so startup never blocks on
/// storage; the service stays degraded until the first connection lands.
#[cfg(feature = "mongo-store")]
async fn attach_store(state: &SharedState) -> anyhow::Result<()> {
    use live_quiz_back::dao::mongodb::{MongoConfig, MongoQuizStore};
    use tracing::error;

    let mongo_config = MongoConfig::from_env()
        .await
        .context("reading MongoDB configuration")?;

    let state = state.clone();
    tokio::spawn(async move {
        match MongoQuizStore::connect(mongo_config).await {
            Ok(store) => state.install_quiz_store(Arc::new(store)).await,
            Err(err) => error!(error = %err, "initial MongoDB connection failed"),
        }
    });
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
async fn attach_store(state: &SharedState) -> anyhow::Result<()> {
    use live_quiz_back::dao::memory::MemoryQuizStore;
    use tracing::warn;

    warn!("built without mongo-store; quiz data will not survive a restart");
    state
        .install_quiz_store(Arc::new(MemoryQuizStore::new()))
        .await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
