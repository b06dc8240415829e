use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::{ChirpRow, RefreshTokenRow, Snapshot, UserRow};
use crate::Database;

/// Longest accepted chirp body, in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;

pub fn validate_chirp_body(body: &str) -> Result<()> {
    let length = body.chars().count();
    if length > MAX_CHIRP_LENGTH {
        return Err(StoreError::Validation(format!(
            "Chirp is too long ({length} characters, max {MAX_CHIRP_LENGTH})"
        )));
    }
    Ok(())
}

impl Database {
    // -- Chirps --

    pub fn list_chirps(&self) -> Result<Vec<ChirpRow>> {
        self.with_snapshot(|snapshot| Ok(snapshot.chirps.values().cloned().collect()))
    }

    pub fn get_chirp(&self, id: u64) -> Result<ChirpRow> {
        self.with_snapshot(|snapshot| {
            snapshot
                .chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("chirp {id}")))
        })
    }

    /// Store a new chirp. Bodies over [`MAX_CHIRP_LENGTH`] characters are
    /// rejected before the snapshot is touched.
    pub fn create_chirp(&self, body: &str, author_id: u64) -> Result<ChirpRow> {
        validate_chirp_body(body)?;

        self.with_snapshot_mut(|snapshot| {
            let id = snapshot.next_chirp_id();
            let row = ChirpRow {
                id,
                body: body.to_string(),
                author_id,
            };
            snapshot.chirps.insert(id, row.clone());
            debug!("Added chirp {} by user {}", id, author_id);
            Ok(row)
        })
    }

    /// Remove a chirp. Callers are responsible for checking authorship.
    pub fn delete_chirp(&self, id: u64) -> Result<()> {
        self.with_snapshot_mut(|snapshot| {
            snapshot
                .chirps
                .remove(&id)
                .ok_or_else(|| StoreError::NotFound(format!("chirp {id}")))?;
            debug!("Deleted chirp {}", id);
            Ok(())
        })
    }

    // -- Users --

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_snapshot(|snapshot| Ok(snapshot.users.values().cloned().collect()))
    }

    /// A user whose stored email is empty counts as absent.
    pub fn get_user(&self, id: u64) -> Result<UserRow> {
        self.with_snapshot(|snapshot| {
            snapshot
                .users
                .get(&id)
                .filter(|user| !user.email.is_empty())
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<UserRow> {
        self.with_snapshot(|snapshot| {
            snapshot
                .users
                .values()
                .find(|user| !email.is_empty() && user.email == email)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("user with email {email}")))
        })
    }

    pub fn get_user_by_refresh_token(&self, token: &str) -> Result<UserRow> {
        self.get_user_by_refresh_token_at(token, Utc::now())
    }

    /// Look up the owner of a refresh token, judging expiry against `now`.
    /// Expiry is only ever detected here; nothing sweeps stale sessions.
    pub fn get_user_by_refresh_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserRow> {
        self.with_snapshot(|snapshot| {
            let user = snapshot
                .users
                .values()
                .find(|user| {
                    user.session()
                        .is_some_and(|session| session.token == token)
                })
                .ok_or_else(|| StoreError::NotFound("refresh token".to_string()))?;

            if user.session().is_some_and(|session| session.is_expired_at(now)) {
                return Err(StoreError::Expired);
            }
            Ok(user.clone())
        })
    }

    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRow> {
        if email.is_empty() {
            return Err(StoreError::Validation("Email is required".to_string()));
        }

        self.with_snapshot_mut(|snapshot| {
            if snapshot.user_id_by_email(email).is_some() {
                return Err(StoreError::Conflict(email.to_string()));
            }

            let id = snapshot.next_user_id();
            let row = UserRow {
                id,
                email: email.to_string(),
                password: password_hash.to_string(),
                refresh_token: None,
            };
            snapshot.users.insert(id, row.clone());
            debug!("Added user {}: {}", id, email);
            Ok(row)
        })
    }

    /// Replace a user's email and password hash. The refresh session is kept.
    pub fn update_user(&self, id: u64, email: &str, password_hash: &str) -> Result<UserRow> {
        if email.is_empty() {
            return Err(StoreError::Validation("Email is required".to_string()));
        }

        self.with_snapshot_mut(|snapshot| {
            if snapshot.user_id_by_email(email).is_some_and(|owner| owner != id) {
                return Err(StoreError::Conflict(email.to_string()));
            }

            let user = live_user_mut(snapshot, id)?;
            user.email = email.to_string();
            user.password = password_hash.to_string();
            debug!("Updated user {}: {}", id, email);
            Ok(user.clone())
        })
    }

    pub fn set_refresh_token(&self, id: u64, token: &str, ttl: Duration) -> Result<UserRow> {
        self.set_refresh_token_at(id, token, ttl, Utc::now())
    }

    /// Attach a refresh session expiring `ttl` after `now`, replacing any
    /// previous one.
    pub fn set_refresh_token_at(
        &self,
        id: u64,
        token: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<UserRow> {
        self.with_snapshot_mut(|snapshot| {
            let user = live_user_mut(snapshot, id)?;
            user.refresh_token = Some(RefreshTokenRow {
                token: token.to_string(),
                expiry: now + ttl,
            });
            debug!("Refresh token set for user {}", id);
            Ok(user.clone())
        })
    }

    pub fn revoke_refresh_token(&self, id: u64) -> Result<()> {
        self.with_snapshot_mut(|snapshot| {
            let user = live_user_mut(snapshot, id)?;
            user.refresh_token = None;
            debug!("Refresh token revoked for user {}", id);
            Ok(())
        })
    }
}

/// Users with an empty stored email count as absent, for reads and writes
/// alike.
fn live_user_mut(snapshot: &mut Snapshot, id: u64) -> Result<&mut UserRow> {
    snapshot
        .users
        .get_mut(&id)
        .filter(|user| !user.email.is_empty())
        .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
}
