//! Token-bucket rate limiter for `/api/isearch` (spec §4.6): burst 1,
//! waits (honoring cancellation) rather than rejecting on saturation.
//! Grounded directly on the Go `middleware/rate.go`
//! (`golang.org/x/time/rate`, `Wait`). Crate: `governor`.

use std::num::NonZeroU32;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{Quota, RateLimiter as GovernorLimiter};

use crate::server::AppState;

pub struct RateLimiter {
    inner: GovernorLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        let per_second = NonZeroU32::new(requests_per_second.max(1.0).round() as u32)
            .unwrap_or(NonZeroU32::new(1).unwrap());
        let quota = Quota::per_second(per_second).allow_burst(NonZeroU32::new(1).unwrap());
        Self {
            inner: GovernorLimiter::direct(quota),
        }
    }

    /// Waits until a token is available. The caller's request task is the
    /// only thing suspended - cancellation (e.g. client disconnect) is
    /// honored by axum/tokio dropping this future.
    pub async fn until_ready(&self) {
        self.inner.until_ready().await;
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.search_rate_limiter.until_ready().await;
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_first_request_immediately() {
        let limiter = RateLimiter::new(1.0);
        let start = std::time::Instant::now();
        limiter.until_ready().await;
        assert!(start.elapsed() < std::time::Duration::from_millis(100));
    }
}
