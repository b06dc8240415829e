use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tracing::info;

use crate::auth::AppState;

/// Count of static file requests served under `/app`.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU64,
}

impl HitCounter {
    pub fn record(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Middleware: bump the hit counter, then serve the request.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.hits.record();
    next.run(req).await
}

/// GET /admin/metrics
pub async fn admin_metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html><body><h1>Welcome, Chirpy Admin</h1><p>Chirpy has been visited {} times!</p></body></html>",
        state.hits.hits()
    ))
}

/// GET /api/metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("Hits: {}", state.hits.hits()),
    )
}

/// POST /admin/reset
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.hits.reset();
    info!("Hit counter reset");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Hits reset to 0",
    )
}
