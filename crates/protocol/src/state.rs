//! Telemetry payloads and the double-encoded state sub-format.
//!
//! `GET_LAST_TELEMETRY` returns (and `SEND_COMMAND` accepts) a `commandJson`
//! block whose `OPER` and `DIAG_L2` members are each a JSON-encoded *string*.
//! Decoding one of those strings yields an object with a single top-level key
//! matching its own name, wrapping the actual field map:
//!
//! ```json
//! { "OPER": { "AC_MODE": "COOL", "SPT": "24", ... } }
//! ```
//!
//! The double encoding is a vendor quirk that must be reproduced exactly for
//! wire compatibility, so encode/decode lives here and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field map carried inside an `OPER` or `DIAG_L2` sub-document.
///
/// Values are kept as raw JSON values; the vendor sends everything as
/// strings (`"SPT": "24"`) and the client re-serializes them untouched.
/// Key order follows the decoded document (serde_json's `preserve_order`
/// feature), so re-encoding an unedited map is byte-identical to the
/// unit's own report.
pub type FieldMap = serde_json::Map<String, Value>;

/// The `commandJson` block: two independently string-encoded sub-documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandJson {
    #[serde(rename = "OPER")]
    pub oper: String,
    #[serde(rename = "DIAG_L2")]
    pub diag_l2: String,
}

/// `data` payload of a successful `GET_LAST_TELEMETRY` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryPayload {
    #[serde(rename = "commandJson")]
    pub command_json: CommandJson,
    /// Seconds since the unit last reported to the cloud.
    #[serde(rename = "timeDelta", default)]
    pub time_delta: i64,
}

/// Self-named wrapper around the operating-state field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperEnvelope {
    #[serde(rename = "OPER")]
    pub oper: FieldMap,
}

impl OperEnvelope {
    /// Decode the string-encoded `OPER` sub-document into its field map.
    pub fn decode(raw: &str) -> serde_json::Result<FieldMap> {
        let envelope: OperEnvelope = serde_json::from_str(raw)?;
        Ok(envelope.oper)
    }

    /// Re-encode a field map into the wire string form `{"OPER": {...}}`.
    pub fn encode(oper: &FieldMap) -> serde_json::Result<String> {
        serde_json::to_string(&OperEnvelope { oper: oper.clone() })
    }
}

/// Self-named wrapper around the diagnostic-measurement field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagEnvelope {
    #[serde(rename = "DIAG_L2")]
    pub diag_l2: FieldMap,
}

impl DiagEnvelope {
    /// Decode the string-encoded `DIAG_L2` sub-document into its field map.
    pub fn decode(raw: &str) -> serde_json::Result<FieldMap> {
        let envelope: DiagEnvelope = serde_json::from_str(raw)?;
        Ok(envelope.diag_l2)
    }
}
