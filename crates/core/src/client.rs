//! Request orchestration for the Electra cloud API.
//!
//! Every public operation follows the same shape: ensure a valid session
//! (where one is required), build the request envelope, post it through the
//! shared transport, decode the reply, check the status field, and map the
//! payload into a typed result or error. Discovery additionally fans out
//! into one concurrent telemetry fetch per surviving device and waits for
//! all of them before returning.

use std::sync::Arc;

use electra_protocol::{ApiRequest, ApiResponse, TelemetryPayload};
use futures_util::future::try_join_all;
use tracing::debug;

use crate::device::AirConditioner;
use crate::error::{Error, Result};
use crate::session::{SESSION_TTL, SessionManager};
use crate::transport::{HttpTransport, Transport};

/// Builder for [`ElectraClient`], mirroring the defaults of the vendor's
/// own mobile app. The transport override and shortened session TTL exist
/// for tests.
pub struct ElectraClientBuilder {
    imei: String,
    token: String,
    transport: Option<Arc<dyn Transport>>,
    session_ttl: u64,
}

impl ElectraClientBuilder {
    pub fn new(imei: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            imei: imei.into(),
            token: token.into(),
            transport: None,
            session_ttl: SESSION_TTL,
        }
    }

    /// Replace the HTTP transport, e.g. with a
    /// [`crate::fake_transport::FakeTransport`].
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the session lifetime, in seconds.
    pub fn with_session_ttl(mut self, ttl: u64) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<ElectraClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };
        let session = SessionManager::new(
            Arc::clone(&transport),
            self.imei.clone(),
            self.token,
            self.session_ttl,
        );
        Ok(ElectraClient {
            transport,
            session,
            imei: self.imei,
        })
    }
}

/// Async client for the Electra air-conditioner cloud.
///
/// Holds the immutable device credential (`imei` + long-lived token) for
/// its whole lifetime and manages the short-lived session id internally;
/// session state lives only in memory and is not persisted across
/// restarts.
pub struct ElectraClient {
    transport: Arc<dyn Transport>,
    session: SessionManager,
    imei: String,
}

impl ElectraClient {
    /// Client over the production endpoint.
    pub fn new(imei: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::builder(imei, token).build()
    }

    pub fn builder(imei: impl Into<String>, token: impl Into<String>) -> ElectraClientBuilder {
        ElectraClientBuilder::new(imei, token)
    }

    /// Enrollment step 1: ask the vendor to text a one-time passcode to
    /// `phone`. Needs no session (it precedes one existing) and returns the
    /// raw decoded reply; delivery is not verified here.
    pub async fn request_otp(&self, phone: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::send_otp(&self.imei, phone)).await
    }

    /// Enrollment step 2: exchange the passcode for the long-lived token.
    ///
    /// On success the reply carries the token under `data.token` (see
    /// [`ApiResponse::token`]); persisting it for future clients is the
    /// caller's job.
    pub async fn validate_otp(&self, phone: &str, code: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::check_otp(&self.imei, phone, code))
            .await
    }

    /// Discover the account's air-conditioner units with telemetry already
    /// populated.
    ///
    /// Non-A/C appliance types are discarded silently. Telemetry for all
    /// surviving units is fetched concurrently; the first failure aborts
    /// the whole discovery and no partial list is returned.
    pub async fn discover_devices(&self) -> Result<Vec<AirConditioner>> {
        debug!(target: "electra.client", "discovering devices");
        let sid = self.session.ensure_session(false).await?;

        let response = self.send(ApiRequest::get_devices(sid)).await?;
        if !response.is_success() {
            return Err(remote_failure(&response));
        }

        let mut devices = Vec::new();
        for entry in response.devices()? {
            if entry.is_air_conditioner() {
                debug!(target: "electra.client", name = %entry.name, "discovered A/C device");
                devices.push(AirConditioner::from_entry(entry));
            } else {
                debug!(
                    target: "electra.client",
                    name = %entry.name,
                    kind = %entry.device_type_name,
                    "discovered non-A/C device, skipping"
                );
            }
        }

        try_join_all(
            devices
                .iter_mut()
                .map(|device| self.fetch_telemetry(device)),
        )
        .await?;

        for device in &mut devices {
            device.update_features();
        }

        Ok(devices)
    }

    /// Fetch the last reported telemetry for one device and overwrite its
    /// in-memory state with it.
    pub async fn fetch_telemetry(&self, device: &mut AirConditioner) -> Result<()> {
        debug!(target: "electra.client", id = device.id(), "fetching last telemetry");
        let sid = self.session.ensure_session(false).await?;

        let response = self
            .send(ApiRequest::get_last_telemetry(sid, device.id()))
            .await?;
        if !response.is_success() {
            return Err(remote_failure(&response));
        }

        let payload: TelemetryPayload = serde_json::from_value(response.data.clone())?;
        device.update_from_telemetry(&payload)
    }

    /// Push the device's current in-memory operating state to the cloud and
    /// return the raw decoded acknowledgment.
    pub async fn push_state(&self, device: &mut AirConditioner) -> Result<ApiResponse> {
        let command_json = device.operation_state_json()?;
        let sid = self.session.ensure_session(false).await?;

        self.send(ApiRequest::send_command(sid, device.id(), command_json))
            .await
    }

    /// Discard the cached session id and acquire a fresh one now.
    ///
    /// Subject to the same lockout window as any other acquisition.
    pub async fn refresh_session(&self) -> Result<()> {
        self.session.ensure_session(true).await.map(drop)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let body = serde_json::to_value(&request)?;
        let value = self.transport.post(body).await?;
        let response: ApiResponse = serde_json::from_value(value)?;
        Ok(response)
    }
}

fn remote_failure(response: &ApiResponse) -> Error {
    Error::RemoteFailure {
        status: response.status,
        desc: response
            .description()
            .unwrap_or("no description provided")
            .to_string(),
    }
}
