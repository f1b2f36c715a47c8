// Integration tests for the discovery / telemetry / push-state flows,
// driven end to end through the public client API with a scripted
// transport.

use std::sync::Arc;

use electra::fake_transport::{FakeTransportBuilder, FakeTransportController};
use electra::{ElectraClient, Error, FanSpeed, Feature, OperationMode};
use serde_json::{Value, json};

const OPER_FIXTURE: &str = r#"{"OPER":{"TURN_ON_OFF":"OFF","AC_MODE":"COOL","SPT":"24","FANSPD":"AUTO","VSWING":"OFF","SLEEP":"OFF","HSWING":"OFF","CLEAR_FILT":"OFF","IDU_PN":"","IFEEL":"OFF","MSGTYPE":"OPER","OP_VAL_ERR":"OK","SHABAT":"OFF","TIMER":"OFF","TURBO":"OFF"}}"#;
const DIAG_FIXTURE: &str = r#"{"DIAG_L2":{"I_RAT":"24","O_ODU_MODE":"COOL","IDU_FAN":"AUTO","IDU_PN":"","MSGTYPE":"DIAG_L2","O_OAT":""}}"#;

fn sid_response() -> Value {
    json!({ "id": 99, "status": 0, "desc": null, "data": { "sid": "sid-1", "res": 0 } })
}

fn device_entry(id: i64, name: &str, type_name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "deviceTypeName": type_name,
        "sn": format!("SN{id}"),
        "mac": "aa:bb:cc:dd:ee:ff",
        "model": "EMD-AI",
        "manufactor": "Midea",
        "regdate": "2021-03-31T21:12:39",
        "deviceToken": format!("devtok-{id}"),
        "status": 1
    })
}

fn devices_response(devices: Vec<Value>) -> Value {
    json!({
        "id": 99,
        "status": 0,
        "desc": null,
        "data": { "devices": devices, "res": 0, "res_desc": null }
    })
}

fn telemetry_response() -> Value {
    json!({
        "id": 99,
        "status": 0,
        "desc": null,
        "data": {
            "timeDelta": 15,
            "commandJson": { "OPER": OPER_FIXTURE, "DIAG_L2": DIAG_FIXTURE },
            "res": 0,
            "res_desc": null
        }
    })
}

fn client_with(
    builder: FakeTransportBuilder,
) -> (ElectraClient, FakeTransportController) {
    let (transport, controller) = builder.build();
    let client = ElectraClient::builder("2b95000012345678", "token")
        .with_transport(Arc::new(transport))
        .build()
        .expect("failed to build client");
    (client, controller)
}

#[tokio::test]
async fn discovery_filters_non_ac_devices_and_populates_telemetry() {
    let (client, controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            .respond(devices_response(vec![
                device_entry(1, "Living room", "A/C"),
                device_entry(2, "Boiler", "Water heater"),
                device_entry(3, "Bedroom", "A/C"),
                device_entry(4, "Sensor", "Sensor"),
                device_entry(5, "Office", "A/C"),
            ]))
            .respond(telemetry_response())
            .respond(telemetry_response())
            .respond(telemetry_response()),
    );

    let devices = client.discover_devices().await.expect("discovery failed");
    assert_eq!(devices.len(), 3);
    for device in &devices {
        assert_eq!(device.mode(), Some(OperationMode::Cool));
        assert_eq!(device.temperature(), Some(24));
        assert_eq!(device.fan_speed(), Some(FanSpeed::Auto));
        assert!(device.features().contains(&Feature::VerticalSwing));
    }
    let ids: Vec<i64> = devices.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec![1, 3, 5]);

    // One acquisition + one GET_DEVICES + three telemetry fetches.
    let sent = controller.take_sent();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[0]["cmd"], "VALIDATE_TOKEN");
    assert_eq!(sent[1]["cmd"], "GET_DEVICES");
    assert_eq!(sent[1]["sid"], "sid-1");
    for body in &sent[2..] {
        assert_eq!(body["cmd"], "GET_LAST_TELEMETRY");
        assert_eq!(body["sid"], "sid-1");
        assert_eq!(body["data"]["commandName"], "OPER,DIAG_L2");
    }
}

#[tokio::test]
async fn discovery_failure_status_yields_remote_failure_and_no_devices() {
    let (client, controller) = client_with(
        FakeTransportBuilder::new().respond(sid_response()).respond(json!({
            "id": 99,
            "status": 3,
            "desc": "server busy",
            "data": {}
        })),
    );

    let err = client.discover_devices().await.unwrap_err();
    match err {
        Error::RemoteFailure { status, desc } => {
            assert_eq!(status, 3);
            assert_eq!(desc, "server busy");
        }
        other => panic!("expected RemoteFailure, got {other:?}"),
    }
    // No telemetry fetch may have been attempted.
    assert_eq!(controller.sent_count(), 2);
}

#[tokio::test]
async fn one_failed_telemetry_fetch_aborts_the_whole_discovery() {
    let (client, _controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            .respond(devices_response(vec![
                device_entry(1, "Living room", "A/C"),
                device_entry(2, "Bedroom", "A/C"),
            ]))
            .respond(telemetry_response())
            .fail(Error::Timeout("deadline elapsed".to_string())),
    );

    let err = client.discover_devices().await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn transport_timeout_surfaces_as_timeout_error() {
    let (client, _controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            .respond(devices_response(vec![device_entry(1, "AC", "A/C")]))
            .fail(Error::Timeout("deadline elapsed".to_string())),
    );

    let err = client.discover_devices().await.unwrap_err();
    assert!(err.is_timeout(), "expected a timeout-kind error, got {err:?}");
    assert!(!matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn undecodable_body_is_an_invalid_response_error() {
    let (client, _controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            // An array where an envelope object is expected.
            .respond(json!([1, 2, 3])),
    );

    let err = client.discover_devices().await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn status_less_reply_is_an_invalid_response_not_a_success() {
    let (client, _controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            // Truncated envelope with no status field at all.
            .respond(json!({ "id": 99, "data": {} })),
    );

    let err = client.discover_devices().await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn session_is_reused_across_operations() {
    let (client, controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            .respond(devices_response(vec![device_entry(1, "AC", "A/C")]))
            .respond(telemetry_response()),
    );

    let mut devices = client.discover_devices().await.unwrap();
    let device = &mut devices[0];
    controller.take_sent();

    // Telemetry refresh and push within the TTL must not re-acquire.
    controller.push_response(telemetry_response());
    client.fetch_telemetry(device).await.unwrap();

    controller.push_response(json!({ "id": 99, "status": 0, "desc": null, "data": {} }));
    device.set_temperature(26);
    client.push_state(device).await.unwrap();

    let sent = controller.take_sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["cmd"], "GET_LAST_TELEMETRY");
    assert_eq!(sent[1]["cmd"], "SEND_COMMAND");
}

#[tokio::test]
async fn push_state_sends_double_encoded_command_json() {
    let (client, controller) = client_with(
        FakeTransportBuilder::new()
            .respond(sid_response())
            .respond(devices_response(vec![device_entry(7, "AC", "A/C")]))
            .respond(telemetry_response()),
    );

    let mut devices = client.discover_devices().await.unwrap();
    let device = &mut devices[0];
    device.set_temperature(26);

    controller.push_response(json!({ "id": 99, "status": 0, "desc": null, "data": { "res": 0 } }));
    let ack = client.push_state(device).await.unwrap();
    assert!(ack.is_success());

    let sent = controller.take_sent();
    let push = sent.last().unwrap();
    assert_eq!(push["cmd"], "SEND_COMMAND");
    assert_eq!(push["data"]["id"], 7);

    // commandJson must be a string-encoded document, not a nested object.
    let command_json = push["data"]["commandJson"]
        .as_str()
        .expect("commandJson must be a JSON-encoded string");
    let oper: Value = serde_json::from_str(command_json).unwrap();
    assert_eq!(oper["OPER"]["SPT"], "26");
    assert_eq!(oper["OPER"]["AC_MODE"], "COOL");
}

#[tokio::test]
async fn expired_session_within_lockout_window_is_rate_limited() {
    // TTL of zero expires the session immediately after acquisition, so the
    // next ensure falls into the lockout window armed by the first attempt.
    let (transport, controller) = FakeTransportBuilder::new()
        .respond(sid_response())
        .respond(devices_response(vec![device_entry(1, "AC", "A/C")]))
        .build();
    let client = ElectraClient::builder("2b95000012345678", "token")
        .with_transport(Arc::new(transport))
        .with_session_ttl(0)
        .build()
        .unwrap();

    let err = client.discover_devices().await.unwrap_err();
    assert!(err.is_rate_limited(), "expected RateLimited, got {err:?}");

    // Exactly one acquisition went out; the telemetry ensure was refused
    // before any network call.
    let sent = controller.take_sent();
    let validates = sent.iter().filter(|b| b["cmd"] == "VALIDATE_TOKEN").count();
    assert_eq!(validates, 1);
}

#[tokio::test]
async fn refresh_session_forces_reacquisition_only_outside_the_window() {
    let (client, controller) = client_with(FakeTransportBuilder::new().respond(sid_response()));

    client.refresh_session().await.unwrap();
    assert_eq!(controller.sent_count(), 1);

    // A second forced refresh inside the lockout window is refused.
    let err = client.refresh_session().await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(controller.sent_count(), 1);
}
