use axum::{
    Router,
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use tower_http::services::ServeDir;

use crate::auth::{self, AppState};
use crate::chirps;
use crate::metrics::{self, count_hits};
use crate::middleware::require_auth;
use crate::users;

/// The JSON API, the admin endpoints and the static site under `/app`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/chirps", get(chirps::list_chirps))
        .route("/api/chirps/{id}", get(chirps::get_chirp))
        .route("/api/users", get(users::list_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .route("/api/metrics", get(metrics::metrics))
        .route("/api/reset", post(metrics::reset))
        .route("/admin/metrics", get(metrics::admin_metrics))
        .route("/admin/reset", post(metrics::reset))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/chirps", post(chirps::create_chirp))
        .route("/api/chirps/{id}", delete(chirps::delete_chirp))
        .route("/api/users", put(users::update_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    // Every request under /app counts as a hit
    let app_routes = Router::new()
        .nest_service("/app", ServeDir::new(&state.assets_dir))
        .layer(middleware::from_fn_with_state(state, count_hits));

    public_routes.merge(protected_routes).merge(app_routes)
}

async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}
