pub mod auth;
pub mod chirps;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod profanity;
pub mod routes;
pub mod session;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use session::SessionIssuer;
