//! Request throttling for the API surface.
//!
//! Every authenticated route shares one budget of requests per second,
//! sized from `general.rate_limit_per_sec`. Chat streams hold their
//! connection open after the initial request, so only request starts
//! count against the budget. When it is spent the middleware answers
//! 429 with a Retry-After header before any handler state is touched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Shared request budget over a fixed one-second window.
#[derive(Clone)]
pub struct RequestBudget {
    limit: u64,
    spent: Arc<AtomicU64>,
    window: Arc<AtomicU64>,
}

impl RequestBudget {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            spent: Arc::new(AtomicU64::new(0)),
            window: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spend one unit. Returns `false` once the current window's
    /// budget is exhausted.
    fn spend(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        if self.window.swap(now, Ordering::Relaxed) != now {
            // First request of a fresh window.
            self.spent.store(1, Ordering::Relaxed);
            return true;
        }
        self.spent.fetch_add(1, Ordering::Relaxed) < self.limit
    }
}

/// Axum middleware enforcing the shared budget.
pub async fn throttle_middleware(
    Extension(budget): Extension<RequestBudget>,
    req: Request,
    next: Next,
) -> Response {
    if budget.spend() {
        return next.run(req).await;
    }
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, "1")],
        Json(serde_json::json!({
            "error": "too_many_requests",
            "message": "Rate limit exceeded"
        })),
    )
        .into_response()
}
