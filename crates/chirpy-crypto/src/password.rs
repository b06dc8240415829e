use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash.
///
/// A mismatch is `Ok(false)`. Only a hash that cannot be parsed, or a
/// verifier failure other than a mismatch, is an error.
pub fn verify(password_hash: &str, password: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(password_hash).map_err(PasswordError::MalformedHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::MalformedHash(e)),
    }
}
