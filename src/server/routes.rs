//! Router configuration (spec §6's route table). Grounded on the
//! teacher's `server/routes.rs` builder-chain style.

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::middleware as gateway_middleware;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let search_route = Router::new()
        .route("/api/search", get(handlers::search))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway_middleware::concurrency::concurrency_gate,
        ));

    let isearch_route = Router::new()
        .route("/api/isearch", get(handlers::isearch))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway_middleware::rate::rate_limit,
        ));

    let authenticated = Router::new()
        .route("/api/db/update", post(handlers::db_update))
        .route("/api/db", delete(handlers::db_drop))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway_middleware::auth::require_auth,
        ));

    Router::new()
        .route("/api/login", post(handlers::login))
        .route("/api/ping", get(handlers::ping))
        .route("/api/db/stats", get(handlers::db_stats))
        .route("/api/db/status", get(handlers::db_status))
        .merge(authenticated)
        .merge(search_route)
        .merge(isearch_route)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
