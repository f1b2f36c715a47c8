//! Error types for the Electra client.
//!
//! Transport-level failures (reqwest errors, undecodable bodies) never leak
//! their native types past the transport boundary; they are mapped into the
//! variants here so callers can make retry decisions: retry on [`Error::Timeout`],
//! give up on [`Error::Auth`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to the Electra cloud.
#[derive(Debug, Error)]
pub enum Error {
    /// The request to the vendor endpoint timed out.
    #[error("timed out communicating with the Electra API: {0}")]
    Timeout(String),

    /// The vendor endpoint could not be reached or dropped the connection.
    #[error("failed to communicate with the Electra API: {0}")]
    Connection(String),

    /// The response body was not JSON or did not match the envelope shape.
    #[error("received an invalid response from the Electra API: {0}")]
    InvalidResponse(String),

    /// The long-lived token was rejected during session acquisition.
    ///
    /// Not retried automatically; the credentials themselves are invalid.
    #[error("failed to acquire a session id: {0}")]
    Auth(String),

    /// The remote accepted the request but reported a non-zero status.
    #[error("Electra API reported failure (status {status}): {desc}")]
    RemoteFailure { status: i64, desc: String },

    /// A session acquisition was requested inside the anti-lockout window.
    ///
    /// Raised instead of silently skipping the call so callers can back off
    /// deliberately; `retry_after` is the remaining window in seconds.
    #[error("session requested again within the lockout window; retry in {retry_after}s")]
    RateLimited { retry_after: u64 },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}
