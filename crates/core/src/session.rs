//! Session-credential lifecycle for the Electra cloud API.
//!
//! Most commands require a short-lived session id (sid) obtained by
//! exchanging the long-lived token via `VALIDATE_TOKEN`. This module owns
//! that sid, its expiration clock, and the anti-lockout delay between
//! acquisition attempts.
//!
//! # Lifecycle
//!
//! 1. The manager starts empty; the first [`SessionManager::ensure_session`]
//!    call acquires a sid and stamps it with a one-hour expiry.
//! 2. Subsequent calls are cheap no-ops while the clock says the sid is
//!    still valid; no network traffic happens.
//! 3. Expiry is observed lazily on access, never by a background timer.
//!    The moment a check sees the clock passed, the cached sid is cleared -
//!    a failed re-acquisition can therefore never resurrect a stale sid.
//!
//! # Lockout avoidance
//!
//! The vendor locks out identities that request sessions too frequently
//! ("intruder lockout"). If an acquisition is needed less than
//! [`LOCKOUT_DELAY`] after the previous attempt, the manager raises
//! [`Error::RateLimited`] without touching the network, so callers can
//! back off deliberately instead of proceeding with a stale session.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use electra_protocol::{ApiRequest, ApiResponse};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Lifetime of an acquired session id, in seconds.
pub const SESSION_TTL: u64 = 3600;

/// Minimum interval between session-acquisition attempts, in seconds.
pub const LOCKOUT_DELAY: u64 = 300;

/// In-memory session state. `sid` is `Some` iff the manager believes the
/// session unexpired; an expired-by-clock sid is cleared on the next check.
#[derive(Debug, Default)]
struct SessionState {
    sid: Option<String>,
    expires_at: u64,
    last_attempt: u64,
}

impl SessionState {
    /// Lazy expiry check. Clears the cached sid as a side effect when the
    /// clock has passed, so the "no session" state is entered before any
    /// acquisition is attempted.
    fn expired(&mut self, now: u64) -> bool {
        if self.sid.is_some() && now < self.expires_at {
            return false;
        }
        self.sid = None;
        true
    }
}

/// Owns the sid, its expiration clock, and the lockout window.
///
/// Check-then-acquire runs under one async mutex, so concurrent callers
/// (e.g. parallel telemetry fetches) either reuse the cached sid or wait
/// for the single in-flight acquisition instead of issuing duplicates.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    imei: String,
    token: String,
    ttl: u64,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, imei: String, token: String, ttl: u64) -> Self {
        Self {
            transport,
            imei,
            token,
            ttl,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Guarantee a valid sid, acquiring one if needed, and return it.
    ///
    /// With a still-valid cached sid this performs no network call. With
    /// `force` the cached sid is discarded first.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimited`] when acquisition is needed inside the
    ///   lockout window; the cached expiry is left untouched.
    /// * [`Error::Auth`] when the remote rejects the token (fatal; not
    ///   retried automatically).
    /// * Transport errors from the acquisition call itself.
    pub async fn ensure_session(&self, force: bool) -> Result<String> {
        let mut state = self.state.lock().await;
        let now = epoch_now();

        if !force && !state.expired(now) {
            if let Some(sid) = &state.sid {
                debug!(target: "electra.session", "found valid sid in cache, using it");
                return Ok(sid.clone());
            }
        }
        state.sid = None;

        if state.last_attempt != 0 && now < state.last_attempt + LOCKOUT_DELAY {
            let retry_after = state.last_attempt + LOCKOUT_DELAY - now;
            warn!(
                target: "electra.session",
                retry_after,
                "session requested less than {LOCKOUT_DELAY}s after the previous attempt; refusing to avoid intruder lockout"
            );
            return Err(Error::RateLimited { retry_after });
        }

        // Record the attempt before the call so a failed acquisition still
        // counts against the lockout window.
        state.last_attempt = now;

        let request = ApiRequest::validate_token(&self.imei, &self.token);
        let body = serde_json::to_value(&request)?;
        let value = self.transport.post(body).await?;
        let response: ApiResponse = serde_json::from_value(value)?;

        match response.sid() {
            Some(sid) => {
                state.sid = Some(sid.to_string());
                state.expires_at = now + self.ttl;
                debug!(target: "electra.session", "acquired new sid");
                Ok(sid.to_string())
            }
            None => Err(Error::Auth(
                response
                    .description()
                    .unwrap_or("no session id in VALIDATE_TOKEN response")
                    .to_string(),
            )),
        }
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
