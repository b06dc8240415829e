//! Snapshot row types. These map directly to the on-disk JSON document.
//! Distinct from chirpy-types API models so the password hash and refresh
//! session never leave the store by accident.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chirpy_types::models::{Chirp, User};

/// The whole database. Maps are keyed by id, so iteration (and therefore
/// every listing) is in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub chirps: BTreeMap<u64, ChirpRow>,
    #[serde(default)]
    pub users: BTreeMap<u64, UserRow>,
    /// Highest id ever handed out per collection. Files written before this
    /// key existed load with zeroes and fall back to the largest stored id.
    #[serde(default)]
    pub sequences: Sequences,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub chirps: u64,
    pub users: u64,
}

impl Snapshot {
    pub fn next_chirp_id(&mut self) -> u64 {
        let id = next_id(self.sequences.chirps, &self.chirps);
        self.sequences.chirps = id;
        id
    }

    pub fn next_user_id(&mut self) -> u64 {
        let id = next_id(self.sequences.users, &self.users);
        self.sequences.users = id;
        id
    }

    /// Id of the account holding `email`, if any.
    pub fn user_id_by_email(&self, email: &str) -> Option<u64> {
        self.users
            .values()
            .find(|user| user.email == email)
            .map(|user| user.id)
    }
}

fn next_id<T>(sequence: u64, rows: &BTreeMap<u64, T>) -> u64 {
    let highest = rows.keys().next_back().copied().unwrap_or(0);
    sequence.max(highest) + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChirpRow {
    pub id: u64,
    pub body: String,
    #[serde(default)]
    pub author_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: u64,
    pub email: String,
    /// PHC-formatted password hash. Callers rendering a user must drop it.
    pub password: String,
    #[serde(default)]
    pub refresh_token: Option<RefreshTokenRow>,
}

impl UserRow {
    /// The live refresh session, ignoring cleared (empty-token) entries.
    pub fn session(&self) -> Option<&RefreshTokenRow> {
        self.refresh_token
            .as_ref()
            .filter(|session| !session.token.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRow {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl RefreshTokenRow {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

impl From<&ChirpRow> for Chirp {
    fn from(row: &ChirpRow) -> Self {
        Chirp {
            id: row.id,
            body: row.body.clone(),
            author_id: row.author_id,
        }
    }
}

impl From<&UserRow> for User {
    fn from(row: &UserRow) -> Self {
        User {
            id: row.id,
            email: row.email.clone(),
        }
    }
}
