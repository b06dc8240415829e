use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Access token claims. `sub` carries the decimal user id; it stays a string
/// on the wire so a malformed subject can be told apart from a bad signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

/// Body of signup, login and profile update requests.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: u64,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

// -- Chirps --

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
