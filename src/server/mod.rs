//! The gateway (spec §4.6): the axum router, shared application state,
//! and the admission middleware stack. Grounded on the teacher's
//! `server/mod.rs` `AppState`/`serve()` shape, supplemented with
//! graceful shutdown from the Go `api/main.go` `signal.NotifyContext` +
//! `server.Shutdown` pair.

pub mod handlers;
pub mod middleware;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::events::Notifier;
use crate::index::InvertedIndex;
use crate::ingester::Ingester;
use crate::repository::Store;
use crate::search::SearchEngine;

/// Shared state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ingester: Arc<Ingester>,
    pub search_engine: Arc<SearchEngine>,
    pub auth: Arc<AuthService>,
    /// Non-blocking admission gate for `/api/search` (spec §4.6):
    /// `try_acquire` only, 503 immediately if full.
    pub search_semaphore: Arc<Semaphore>,
    /// Token-bucket limiter for `/api/isearch`, shared across requests.
    pub search_rate_limiter: Arc<middleware::rate::RateLimiter>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        ingester: Arc<Ingester>,
        search_engine: Arc<SearchEngine>,
        auth: Arc<AuthService>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            ingester,
            search_engine,
            auth,
            search_semaphore: Arc::new(Semaphore::new(settings.gateway.search_concurrency)),
            search_rate_limiter: Arc::new(middleware::rate::RateLimiter::new(
                settings.gateway.search_rate,
            )),
        }
    }
}

/// Binds and serves the router, shutting down gracefully on Ctrl-C so
/// in-flight handlers finish before exit (spec §5's bounded shutdown
/// deadline).
pub async fn serve(state: AppState, listen_addr: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = listen_addr.parse()?;
    tracing::info!(%addr, "starting gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}
