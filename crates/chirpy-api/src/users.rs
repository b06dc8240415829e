use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use chirpy_crypto::password;
use chirpy_db::StoreError;
use chirpy_types::api::CredentialsRequest;
use chirpy_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;

fn validate_credentials(req: &CredentialsRequest) -> Result<(), ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }
    Ok(())
}

async fn hash_password(plain: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || password::hash(&plain)).await??;
    Ok(hash)
}

/// POST /api/users: sign up.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&req)?;

    let password_hash = hash_password(req.password).await?;
    let user = state.db.create_user(&req.email, &password_hash)?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(User::from(&user))))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.db.list_users()?;
    Ok(Json(users.iter().map(User::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<u64>,
) -> Result<Json<User>, ApiError> {
    let user = state.db.get_user(user_id)?;
    Ok(Json(User::from(&user)))
}

/// PUT /api/users: change the caller's own email and password. The refresh
/// session survives the update.
///
/// Lookup, hashing and the write are separate store calls; a concurrent
/// update of the same user between them is last-writer-wins.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    validate_credentials(&req)?;

    state.db.get_user(user_id).map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::Unauthorized("Couldn't get user from token".into()),
        other => other.into(),
    })?;

    let password_hash = hash_password(req.password).await?;
    let user = state.db.update_user(user_id, &req.email, &password_hash)?;

    info!("Updated user {}", user.id);
    Ok(Json(User::from(&user)))
}
