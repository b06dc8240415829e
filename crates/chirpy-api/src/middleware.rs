use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::session::SessionIssuer;

/// Id of the user whose access token authenticated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub u64);

/// Pull the bearer token out of the Authorization header.
///
/// Only the last whitespace-separated word is used, so `Bearer <token>` and a
/// bare `<token>` both work; the scheme word itself is not checked.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Authorization header required".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Authorization header is not valid text".into()))?;

    value
        .split_whitespace()
        .last()
        .ok_or_else(|| ApiError::Unauthorized("Authorization header is empty".into()))
}

/// Resolve the request's access token to a user id.
pub fn resolve(sessions: &SessionIssuer, headers: &HeaderMap) -> Result<u64, ApiError> {
    let token = bearer_token(headers)?;
    let user_id = sessions.validate_access_token(token)?;
    Ok(user_id)
}

/// Fail with 403 unless the resource's author is the caller.
pub fn authorize_ownership(author_id: u64, user_id: u64) -> Result<(), ApiError> {
    if author_id != user_id {
        return Err(ApiError::Forbidden(
            "You're only allowed to modify your own chirps".into(),
        ));
    }
    Ok(())
}

/// Validate the access token and stash [`AuthUser`] in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = resolve(&state.sessions, req.headers())?;
    debug!("Authenticated request from user {}", user_id);

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
