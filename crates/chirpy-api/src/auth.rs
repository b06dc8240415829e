use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{error, info};

use chirpy_crypto::password::{self, PasswordError};
use chirpy_db::{Database, StoreError};
use chirpy_types::api::{AuthResponse, CredentialsRequest};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::metrics::HitCounter;
use crate::middleware::bearer_token;
use crate::session::SessionIssuer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionIssuer,
    pub hits: HitCounter,
    /// Root of the static site mounted under `/app`.
    pub assets_dir: PathBuf,
}

impl AppStateInner {
    pub fn new(
        db: Database,
        sessions: SessionIssuer,
        assets_dir: impl Into<PathBuf>,
    ) -> AppState {
        Arc::new(Self {
            db,
            sessions,
            hits: HitCounter::default(),
            assets_dir: assets_dir.into(),
        })
    }
}

fn bad_credentials() -> ApiError {
    ApiError::Unauthorized("Incorrect email or password".into())
}

/// POST /api/login: verify the password, then mint an access token and a
/// fresh refresh session. Nothing is issued or stored on a bad password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.db.get_user_by_email(&req.email).map_err(|e| match e {
        StoreError::NotFound(_) => bad_credentials(),
        other => other.into(),
    })?;

    // Keep Argon2 off the async workers.
    let stored = user.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify(&stored, &req.password))
        .await?
        .map_err(|e: PasswordError| {
            error!("Login for user {} hit an unusable hash: {}", user.id, e);
            bad_credentials()
        })?;
    if !verified {
        return Err(bad_credentials());
    }

    let token = state.sessions.issue_access_token(user.id)?;
    let (refresh_token, ttl) = state.sessions.issue_refresh_token();
    let user = state.db.set_refresh_token(user.id, &refresh_token, ttl)?;

    info!("User {} logged in", user.id);
    Ok(Json(AuthResponse {
        id: user.id,
        email: user.email,
        token,
        refresh_token,
    }))
}

fn refresh_lookup_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound(_) => ApiError::Unauthorized("Refresh token not recognised".into()),
        StoreError::Expired => ApiError::Unauthorized("Refresh token has expired".into()),
        other => other.into(),
    }
}

/// POST /api/refresh: trade a live refresh token for a new access token.
/// The refresh token itself is returned unchanged.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthResponse>, ApiError> {
    let presented = bearer_token(&headers)?;
    let user = state
        .db
        .get_user_by_refresh_token(presented)
        .map_err(refresh_lookup_error)?;

    let token = state.sessions.issue_access_token(user.id)?;

    Ok(Json(AuthResponse {
        id: user.id,
        email: user.email,
        token,
        refresh_token: presented.to_string(),
    }))
}

/// POST /api/revoke: end the refresh session the presented token belongs to.
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let presented = bearer_token(&headers)?;
    let user = state
        .db
        .get_user_by_refresh_token(presented)
        .map_err(refresh_lookup_error)?;

    state.sessions.revoke(&state.db, user.id)?;

    info!("Refresh session revoked for user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}
