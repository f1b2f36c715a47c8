//! In-memory model of one discovered air-conditioner unit.
//!
//! The orchestration layer treats the operating-state blob as opaque; this
//! module is the only place that interprets fields inside it. State edits
//! mutate the decoded field map in place and are serialized back to the
//! wire string form only when a command is pushed.

use electra_protocol::{DeviceEntry, DiagEnvelope, FieldMap, OperEnvelope, TelemetryPayload};
use serde_json::Value;

use crate::error::Result;

/// Lowest settable setpoint, in degrees Celsius.
pub const MIN_TEMP: i64 = 17;
/// Highest settable setpoint, in degrees Celsius.
pub const MAX_TEMP: i64 = 30;

/// Default threshold for considering a unit disconnected, in seconds.
pub const DISCONNECT_THRESHOLD_SECS: i64 = 60;

const ON: &str = "ON";
const OFF: &str = "OFF";

/// Operating mode as carried in `AC_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Cool,
    Heat,
    Auto,
    Dry,
    Fan,
    Standby,
}

impl OperationMode {
    pub fn as_wire(self) -> &'static str {
        match self {
            OperationMode::Cool => "COOL",
            OperationMode::Heat => "HEAT",
            OperationMode::Auto => "AUTO",
            OperationMode::Dry => "DRY",
            OperationMode::Fan => "FAN",
            OperationMode::Standby => "STBY",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "COOL" => Some(OperationMode::Cool),
            "HEAT" => Some(OperationMode::Heat),
            "AUTO" => Some(OperationMode::Auto),
            "DRY" => Some(OperationMode::Dry),
            "FAN" => Some(OperationMode::Fan),
            "STBY" => Some(OperationMode::Standby),
            _ => None,
        }
    }
}

/// Fan speed as carried in `FANSPD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    Low,
    Med,
    High,
    Auto,
}

impl FanSpeed {
    pub fn as_wire(self) -> &'static str {
        match self {
            FanSpeed::Low => "LOW",
            FanSpeed::Med => "MED",
            FanSpeed::High => "HIGH",
            FanSpeed::Auto => "AUTO",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "LOW" => Some(FanSpeed::Low),
            "MED" => Some(FanSpeed::Med),
            "HIGH" => Some(FanSpeed::High),
            "AUTO" => Some(FanSpeed::Auto),
            _ => None,
        }
    }
}

/// Optional capabilities advertised by a unit's operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    VerticalSwing,
    HorizontalSwing,
}

/// One air-conditioner unit: identity from discovery plus the last decoded
/// telemetry. Created on discovery, refreshed in place by telemetry
/// fetches, edited by the setters below.
#[derive(Debug, Clone)]
pub struct AirConditioner {
    id: i64,
    name: String,
    regdate: Option<String>,
    model: Option<String>,
    mac: Option<String>,
    serial_number: Option<String>,
    manufacturer: Option<String>,
    token: Option<String>,
    oper: FieldMap,
    time_delta: i64,
    features: Vec<Feature>,
    collected_measure: Option<i64>,
    outdoor_mode: Option<String>,
}

impl AirConditioner {
    pub(crate) fn from_entry(entry: DeviceEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            regdate: entry.regdate,
            model: entry.model,
            mac: entry.mac,
            serial_number: entry.serial_number,
            manufacturer: entry.manufacturer,
            token: entry.token,
            oper: FieldMap::new(),
            time_delta: 0,
            features: Vec::new(),
            collected_measure: None,
            outdoor_mode: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regdate(&self) -> Option<&str> {
        self.regdate.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    /// Device-scoped token issued at registration time.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Capabilities derived from the last telemetry (see
    /// [`Self::update_features`]).
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Whether the unit has not reported for longer than `thresh` seconds.
    pub fn is_disconnected(&self, thresh: i64) -> bool {
        self.time_delta > thresh
    }

    pub fn mode(&self) -> Option<OperationMode> {
        self.oper_str("AC_MODE").and_then(OperationMode::from_wire)
    }

    /// Change the operating mode. Standby is entered via [`Self::turn_off`],
    /// not here; passing it is ignored like any other no-op edit.
    pub fn set_mode(&mut self, mode: OperationMode) {
        if mode == OperationMode::Standby {
            return;
        }
        if self.mode() != Some(mode) {
            self.set_oper("AC_MODE", mode.as_wire());
        }
    }

    /// Units without a discrete power key signal standby through `AC_MODE`.
    pub fn is_on(&self) -> bool {
        match self.oper_str("TURN_ON_OFF") {
            Some(value) => value == ON,
            None => self.mode() != Some(OperationMode::Standby),
        }
    }

    pub fn turn_on(&mut self) {
        if !self.is_on() && self.oper.contains_key("TURN_ON_OFF") {
            self.set_oper("TURN_ON_OFF", ON);
        }
    }

    pub fn turn_off(&mut self) {
        if !self.is_on() {
            return;
        }
        if self.oper.contains_key("TURN_ON_OFF") {
            self.set_oper("TURN_ON_OFF", OFF);
        } else {
            self.set_oper("AC_MODE", OperationMode::Standby.as_wire());
        }
    }

    /// Setpoint temperature (`SPT`), stringly-typed on the wire.
    pub fn temperature(&self) -> Option<i64> {
        self.oper_str("SPT").and_then(|raw| raw.parse().ok())
    }

    /// Change the setpoint. Values outside the 17-30 range are ignored.
    pub fn set_temperature(&mut self, val: i64) {
        if !(MIN_TEMP..=MAX_TEMP).contains(&val) {
            return;
        }
        if self.temperature() != Some(val) {
            self.set_oper("SPT", &val.to_string());
        }
    }

    pub fn fan_speed(&self) -> Option<FanSpeed> {
        self.oper_str("FANSPD").and_then(FanSpeed::from_wire)
    }

    pub fn set_fan_speed(&mut self, speed: FanSpeed) {
        if self.fan_speed() != Some(speed) {
            self.set_oper("FANSPD", speed.as_wire());
        }
    }

    pub fn is_vertical_swing(&self) -> bool {
        self.oper_str("VSWING") == Some(ON)
    }

    /// No-op on units that do not advertise vertical swing.
    pub fn set_vertical_swing(&mut self, enable: bool) {
        if self.oper.contains_key("VSWING") {
            self.set_oper("VSWING", if enable { ON } else { OFF });
        }
    }

    pub fn is_horizontal_swing(&self) -> bool {
        self.oper_str("HSWING") == Some(ON)
    }

    /// No-op on units that do not advertise horizontal swing.
    pub fn set_horizontal_swing(&mut self, enable: bool) {
        if self.oper.contains_key("HSWING") {
            self.set_oper("HSWING", if enable { ON } else { OFF });
        }
    }

    pub fn turbo(&self) -> bool {
        self.oper_str("TURBO") == Some(ON)
    }

    pub fn set_turbo(&mut self, enable: bool) {
        self.set_oper("TURBO", if enable { ON } else { OFF });
    }

    pub fn shabat(&self) -> bool {
        self.oper_str("SHABAT") == Some(ON)
    }

    pub fn set_shabat(&mut self, enable: bool) {
        self.set_oper("SHABAT", if enable { ON } else { OFF });
    }

    /// Last measured ambient temperature, from the diagnostic channel.
    pub fn ambient_temperature(&self) -> Option<i64> {
        self.collected_measure
    }

    /// Outdoor-unit mode (`O_ODU_MODE`) from the diagnostic channel.
    pub fn outdoor_mode(&self) -> Option<&str> {
        self.outdoor_mode.as_deref()
    }

    /// Overwrite the operating state and measurements from a telemetry
    /// payload. `I_CALC_AT` supersedes `I_RAT` when both are present.
    pub(crate) fn update_from_telemetry(&mut self, payload: &TelemetryPayload) -> Result<()> {
        self.oper = OperEnvelope::decode(&payload.command_json.oper)?;
        self.time_delta = payload.time_delta;

        let measurements = DiagEnvelope::decode(&payload.command_json.diag_l2)?;
        if let Some(raw) = field_i64(&measurements, "I_RAT") {
            self.collected_measure = Some(raw);
        }
        if let Some(raw) = field_i64(&measurements, "I_CALC_AT") {
            self.collected_measure = Some(raw);
        }
        self.outdoor_mode = measurements
            .get("O_ODU_MODE")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(())
    }

    /// Rebuild the feature list from the current operating state.
    pub(crate) fn update_features(&mut self) {
        self.features.clear();
        if self.oper.contains_key("VSWING") {
            self.features.push(Feature::VerticalSwing);
        }
        if self.oper.contains_key("HSWING") {
            self.features.push(Feature::HorizontalSwing);
        }
    }

    /// Serialize the current operating state to the wire string form.
    ///
    /// When the state carries an `AC_STSRC` key it is forced to `"WI-FI"`
    /// so the unit attributes the change to the app rather than the remote
    /// control.
    pub(crate) fn operation_state_json(&mut self) -> Result<String> {
        if self.oper.contains_key("AC_STSRC") {
            self.set_oper("AC_STSRC", "WI-FI");
        }
        Ok(OperEnvelope::encode(&self.oper)?)
    }

    fn oper_str(&self, key: &str) -> Option<&str> {
        self.oper.get(key).and_then(Value::as_str)
    }

    fn set_oper(&mut self, key: &str, value: &str) {
        self.oper
            .insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn field_i64(fields: &FieldMap, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::String(raw) => raw.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
