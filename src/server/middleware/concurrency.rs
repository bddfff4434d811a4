//! Non-blocking concurrency gate for `/api/search` (spec §4.6). Grounded
//! directly on the Go `middleware/concurrency.go` (`select` against a
//! buffered channel acting as a semaphore) - ported to
//! `tokio::sync::Semaphore::try_acquire`, which gives the same
//! "reject immediately, don't queue" behavior.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Semaphore;

use crate::error::AppError;
use crate::server::AppState;

pub async fn concurrency_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let semaphore: Arc<Semaphore> = Arc::clone(&state.search_semaphore);
    let permit = semaphore.try_acquire_owned().map_err(|_| {
        AppError::Unavailable("search concurrency limit reached".to_string())
    })?;

    let response = next.run(request).await;
    drop(permit);
    Ok(response)
}
