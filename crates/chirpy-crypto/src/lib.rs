//! Chirpy Crypto Library
//!
//! Password hashing (Argon2id, PHC strings) and the random material behind
//! refresh tokens. Access token signing lives with the session issuer in
//! chirpy-api.

pub mod keys;
pub mod password;
