use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matched the lookup.
    #[error("{0} not found")]
    NotFound(String),

    /// A refresh session matched but its expiry has passed.
    #[error("refresh token has expired")]
    Expired,

    /// Input rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    /// Another account already holds this email.
    #[error("email {0} is already registered")]
    Conflict(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True for failures of the backing file rather than of the request.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Poisoned | Self::Io(_) | Self::Json(_))
    }
}
