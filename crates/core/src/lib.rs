// electra: Async client for the Electra Smart air-conditioner cloud API.
//
// Authenticates a phone-number-bound device identity, exchanges the
// long-lived token for a short-lived session id, discovers registered
// air-conditioner units, polls their last reported telemetry, and pushes
// state changes back to the cloud.

pub mod client;
pub mod device;
pub mod error;
pub mod fake_transport;
pub mod session;
pub mod transport;
pub mod util;

pub use client::{ElectraClient, ElectraClientBuilder};
pub use device::{
    AirConditioner, DISCONNECT_THRESHOLD_SECS, FanSpeed, Feature, MAX_TEMP, MIN_TEMP,
    OperationMode,
};
pub use error::{Error, Result};
pub use session::{LOCKOUT_DELAY, SESSION_TTL};
pub use transport::{BASE_URL, HttpTransport, Transport, USER_AGENT};
pub use util::generate_imei;

/// Wire types, re-exported for callers that need to inspect raw envelopes.
pub use electra_protocol as protocol;
