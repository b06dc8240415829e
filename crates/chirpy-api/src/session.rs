use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use chirpy_crypto::keys::generate_refresh_token;
use chirpy_db::{Database, StoreError};
use chirpy_types::api::Claims;

/// `iss` claim on every access token.
pub const ISSUER: &str = "chirpy";

/// Secrets that ship in example configs and must never sign real tokens.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub fn access_token_ttl() -> Duration {
    Duration::hours(1)
}

pub fn refresh_token_ttl() -> Duration {
    Duration::days(60)
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT signing secret is unset, empty or a placeholder")]
    Configuration,

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("access token has expired")]
    Expired,

    #[error("access token subject {0:?} is not a user id")]
    MalformedSubject(String),

    #[error("failed to sign access token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Mints HS256 access tokens and opaque refresh tokens.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Result<Self, SessionError> {
        if secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&secret) {
            return Err(SessionError::Configuration);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue_access_token(&self, user_id: u64) -> Result<String, SessionError> {
        self.issue_access_token_at(user_id, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + access_token_ttl()).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(SessionError::Signing)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<u64, SessionError> {
        self.validate_access_token_at(token, Utc::now())
    }

    /// Verify signature and issuer, then judge expiry against `now`.
    ///
    /// jsonwebtoken only knows the system clock and applies leeway, so the
    /// `exp` check is done here instead.
    pub fn validate_access_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken(e.to_string()),
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(SessionError::Expired);
        }

        match claims.sub.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(SessionError::MalformedSubject(claims.sub)),
        }
    }

    /// A fresh refresh token and how long it should live.
    pub fn issue_refresh_token(&self) -> (String, Duration) {
        (generate_refresh_token(), refresh_token_ttl())
    }

    /// End the user's refresh session.
    pub fn revoke(&self, db: &Database, user_id: u64) -> Result<(), StoreError> {
        db.revoke_refresh_token(user_id)
    }
}
