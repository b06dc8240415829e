use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use chirpy_db::queries::validate_chirp_body;
use chirpy_types::api::CreateChirpRequest;
use chirpy_types::models::Chirp;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AuthUser, authorize_ownership};
use crate::profanity::clean_body;

/// GET /api/chirps: all chirps, oldest first.
pub async fn list_chirps(State(state): State<AppState>) -> Result<Json<Vec<Chirp>>, ApiError> {
    let chirps = state.db.list_chirps()?;
    Ok(Json(chirps.iter().map(Chirp::from).collect()))
}

/// GET /api/chirps/{id}
pub async fn get_chirp(
    State(state): State<AppState>,
    ApiPath(chirp_id): ApiPath<u64>,
) -> Result<Json<Chirp>, ApiError> {
    let chirp = state.db.get_chirp(chirp_id)?;
    Ok(Json(Chirp::from(&chirp)))
}

/// POST /api/chirps: the length limit applies to the body as sent, before
/// banned words are masked.
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_chirp_body(&req.body)?;

    let chirp = state.db.create_chirp(&clean_body(&req.body), user_id)?;

    info!("User {} posted chirp {}", user_id, chirp.id);
    Ok((StatusCode::CREATED, Json(Chirp::from(&chirp))))
}

/// DELETE /api/chirps/{id}: authors only.
pub async fn delete_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiPath(chirp_id): ApiPath<u64>,
) -> Result<StatusCode, ApiError> {
    let chirp = state.db.get_chirp(chirp_id)?;
    authorize_ownership(chirp.author_id, user_id)?;

    state.db.delete_chirp(chirp_id)?;

    info!("User {} deleted chirp {}", user_id, chirp_id);
    Ok(StatusCode::NO_CONTENT)
}
