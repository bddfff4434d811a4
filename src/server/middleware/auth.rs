//! Bearer-token auth gate for the mutating routes (spec §4.6). Grounded
//! directly on the Go `middleware/auth.go`: extract `Authorization:
//! Token <jwt>`, verify, reject with 401 on any failure - missing
//! header, malformed header, or an invalid/expired token are all
//! indistinguishable to the caller.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::server::AppState;

const AUTH_SCHEME: &str = "Token";

pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(AUTH_SCHEME))
        .map(|v| v.trim())
        .ok_or_else(|| AppError::Unauthorized("missing or malformed Authorization header".to_string()))?;

    state.auth.verify(token)?;

    Ok(next.run(request).await)
}
