//! Request and response envelopes for the Electra mobile API.
//!
//! Every call is a POST of a single JSON object to one fixed endpoint:
//!
//! ```json
//! {
//!   "pvdid": 1,
//!   "id": 99,
//!   "cmd": "GET_DEVICES",
//!   "sid": "abc123"
//! }
//! ```
//!
//! and every reply carries an integer `status` where `0` means success:
//!
//! ```json
//! {
//!   "id": 99,
//!   "status": 0,
//!   "desc": null,
//!   "data": { ... }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::device::DeviceEntry;

/// Fixed provider id sent with every request.
pub const PROVIDER_ID: u32 = 1;
/// Fixed message id sent with every request.
pub const MESSAGE_ID: u32 = 99;
/// `status` value signalling success.
pub const STATUS_SUCCESS: i64 = 0;

/// Operating-system fields the vendor expects on credential calls.
pub const CLIENT_OS: &str = "android";
/// Claimed OS build id, matching the vendor's mobile app.
pub const CLIENT_OS_VERSION: &str = "M4B30Z";

/// Command names understood by the endpoint.
pub mod cmd {
    pub const SEND_OTP: &str = "SEND_OTP";
    pub const CHECK_OTP: &str = "CHECK_OTP";
    pub const VALIDATE_TOKEN: &str = "VALIDATE_TOKEN";
    pub const GET_DEVICES: &str = "GET_DEVICES";
    pub const GET_LAST_TELEMETRY: &str = "GET_LAST_TELEMETRY";
    pub const SEND_COMMAND: &str = "SEND_COMMAND";
}

/// Request envelope sent to the Electra endpoint.
///
/// `sid` and `data` are omitted entirely (not serialized as `null`) when
/// absent; the remote rejects envelopes with unexpected null members.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    pub pvdid: u32,
    pub id: u32,
    pub cmd: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiRequest {
    fn new(cmd: &'static str) -> Self {
        Self {
            pvdid: PROVIDER_ID,
            id: MESSAGE_ID,
            cmd,
            sid: None,
            data: None,
        }
    }

    /// Enrollment step 1: ask the vendor to text a one-time passcode.
    pub fn send_otp(imei: &str, phone: &str) -> Self {
        let mut request = Self::new(cmd::SEND_OTP);
        request.data = Some(json!({ "imei": imei, "phone": phone }));
        request
    }

    /// Enrollment step 2: exchange the passcode for a long-lived token.
    pub fn check_otp(imei: &str, phone: &str, code: &str) -> Self {
        let mut request = Self::new(cmd::CHECK_OTP);
        request.data = Some(json!({
            "imei": imei,
            "phone": phone,
            "code": code,
            "os": CLIENT_OS,
            "osver": CLIENT_OS_VERSION,
        }));
        request
    }

    /// Exchange the long-lived token for a short-lived session id.
    pub fn validate_token(imei: &str, token: &str) -> Self {
        let mut request = Self::new(cmd::VALIDATE_TOKEN);
        request.data = Some(json!({
            "imei": imei,
            "token": token,
            "os": CLIENT_OS,
            "osver": CLIENT_OS_VERSION,
        }));
        request
    }

    /// List the devices registered to the authenticated account.
    pub fn get_devices(sid: impl Into<String>) -> Self {
        let mut request = Self::new(cmd::GET_DEVICES);
        request.sid = Some(sid.into());
        request
    }

    /// Fetch the last reported telemetry for one device.
    ///
    /// `commandName` selects both the operating-state (`OPER`) and the
    /// diagnostic-measurement (`DIAG_L2`) channels.
    pub fn get_last_telemetry(sid: impl Into<String>, device_id: i64) -> Self {
        let mut request = Self::new(cmd::GET_LAST_TELEMETRY);
        request.sid = Some(sid.into());
        request.data = Some(json!({ "id": device_id, "commandName": "OPER,DIAG_L2" }));
        request
    }

    /// Push an operating-state change to one device.
    ///
    /// `command_json` is the already double-encoded `{"OPER": {...}}` string
    /// produced by [`crate::state::OperEnvelope::encode`].
    pub fn send_command(sid: impl Into<String>, device_id: i64, command_json: String) -> Self {
        let mut request = Self::new(cmd::SEND_COMMAND);
        request.sid = Some(sid.into());
        request.data = Some(json!({ "id": device_id, "commandJson": command_json }));
        request
    }
}

/// Response envelope returned by the Electra endpoint.
///
/// `status` is required: a body without one is malformed (likely truncated)
/// and must fail to decode rather than pass for success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub status: i64,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    /// Whether the remote reported success for this call.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Failure description, preferring the top-level `desc` over the
    /// `data.res_desc` the vendor sometimes uses instead. Often absent.
    pub fn description(&self) -> Option<&str> {
        self.desc
            .as_deref()
            .or_else(|| self.data.get("res_desc").and_then(Value::as_str))
            .filter(|desc| !desc.is_empty())
    }

    /// Session id from a `VALIDATE_TOKEN` reply. An empty string counts as
    /// missing: it is what the vendor returns for a rejected token.
    pub fn sid(&self) -> Option<&str> {
        self.data
            .get("sid")
            .and_then(Value::as_str)
            .filter(|sid| !sid.is_empty())
    }

    /// Long-lived token from a `CHECK_OTP` reply.
    pub fn token(&self) -> Option<&str> {
        self.data
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }

    /// Device list from a `GET_DEVICES` reply.
    pub fn devices(&self) -> serde_json::Result<Vec<DeviceEntry>> {
        let devices = self
            .data
            .get("devices")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        serde_json::from_value(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_token_envelope_matches_wire_format() {
        let request = ApiRequest::validate_token("2b95000012345678", "secret");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "pvdid": 1,
                "id": 99,
                "cmd": "VALIDATE_TOKEN",
                "data": {
                    "imei": "2b95000012345678",
                    "token": "secret",
                    "os": "android",
                    "osver": "M4B30Z",
                }
            })
        );
    }

    #[test]
    fn absent_sid_and_data_are_omitted() {
        let request = ApiRequest::get_devices("s1");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sid"], "s1");
        assert!(value.get("data").is_none());

        let request = ApiRequest::send_otp("imei", "0521234567");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("sid").is_none());
        assert_eq!(value["data"]["phone"], "0521234567");
    }

    #[test]
    fn telemetry_envelope_selects_both_channels() {
        let request = ApiRequest::get_last_telemetry("s1", 42);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["cmd"], "GET_LAST_TELEMETRY");
        assert_eq!(value["data"]["id"], 42);
        assert_eq!(value["data"]["commandName"], "OPER,DIAG_L2");
    }

    #[test]
    fn response_success_and_description() {
        let response: ApiResponse =
            serde_json::from_value(json!({ "id": 99, "status": 0, "desc": null, "data": {} }))
                .unwrap();
        assert!(response.is_success());
        assert_eq!(response.description(), None);

        let response: ApiResponse = serde_json::from_value(json!({
            "id": 99,
            "status": 7,
            "desc": null,
            "data": { "res_desc": "Intruder lockout" }
        }))
        .unwrap();
        assert!(!response.is_success());
        assert_eq!(response.description(), Some("Intruder lockout"));
    }

    #[test]
    fn missing_status_fails_to_decode() {
        // A truncated reply without a status must not read as success.
        let result: serde_json::Result<ApiResponse> =
            serde_json::from_value(json!({ "id": 99, "data": { "sid": "abc" } }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_sid_counts_as_missing() {
        let response: ApiResponse =
            serde_json::from_value(json!({ "status": 0, "data": { "sid": "" } })).unwrap();
        assert_eq!(response.sid(), None);

        let response: ApiResponse =
            serde_json::from_value(json!({ "status": 0, "data": { "sid": "abc" } })).unwrap();
        assert_eq!(response.sid(), Some("abc"));
    }
}
