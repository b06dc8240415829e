use serde::{Deserialize, Serialize};

/// A chirp as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

/// Public view of an account. The password hash and refresh session stay
/// inside the store and are never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}
