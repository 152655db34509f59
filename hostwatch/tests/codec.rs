//! Frame codec: handshake encoding and gateway frame decoding.
use hostwatch::codec::{decode, encode, GatewayEvent, UNSPECIFIED_GATEWAY_ERROR};
use hostwatch::error::CodecError;
use hostwatch::model::{
    ConnectionRequest, ProcessSample, ResourceGauge, ServiceStatus, UpdateShape,
};

#[test]
fn handshake_uses_gateway_field_names() {
    let req = ConnectionRequest::new("10.0.0.5", "root", "x");
    let text = encode(&req).expect("encode");
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v, serde_json::json!({"ip": "10.0.0.5", "username": "root", "password": "x"}));
}

#[test]
fn debug_output_hides_secret() {
    let req = ConnectionRequest::new("h", "u", "hunter2");
    let dbg = format!("{req:?}");
    assert!(!dbg.contains("hunter2"), "{dbg}");
}

#[test]
fn decodes_connected_with_and_without_ip() {
    assert_eq!(
        decode(r#"{"status":"connected"}"#).unwrap(),
        GatewayEvent::Connected { host: None }
    );
    assert_eq!(
        decode(r#"{"status":"connected","ip":"10.0.0.5","message":"Connected to 10.0.0.5"}"#)
            .unwrap(),
        GatewayEvent::Connected {
            host: Some("10.0.0.5".into())
        }
    );
}

#[test]
fn decodes_error_message_verbatim() {
    assert_eq!(
        decode(r#"{"status":"error","message":"Auth failed"}"#).unwrap(),
        GatewayEvent::Failed {
            message: "Auth failed".into()
        }
    );
    assert_eq!(
        decode(r#"{"status":"error"}"#).unwrap(),
        GatewayEvent::Failed {
            message: UNSPECIFIED_GATEWAY_ERROR.into()
        }
    );
}

#[test]
fn missing_or_unknown_status_is_malformed() {
    for text in [
        r#"{"cpu": 12.0}"#,
        r#"{"status":"rebooting"}"#,
        "not json at all",
        "",
        r#"["status","connected"]"#,
        r#"{"status":"monitoring","cpu":"abc"}"#,
        r#"{"status":"monitoring"}"#,
    ] {
        assert!(
            matches!(decode(text), Err(CodecError::MalformedFrame(_))),
            "expected MalformedFrame for {text:?}"
        );
    }
}

#[test]
fn log_shape_coerces_numeric_strings() {
    let GatewayEvent::Update(u) =
        decode(r#"{"status":"monitoring","ip":"10.0.0.5","cpu":"42.567","timestamp":1234.5}"#)
            .unwrap()
    else {
        panic!("expected update");
    };
    assert_eq!(u.shape(), UpdateShape::Log);
    assert_eq!(u.cpu, 42.567);
    assert_eq!(u.memory, None);
    assert_eq!(u.host.as_deref(), Some("10.0.0.5"));
}

#[test]
fn full_dashboard_frame_reproduces_every_field() {
    let text = r#"{
        "status": "monitoring",
        "ip": "10.0.0.5",
        "cpu": 37.25,
        "memory": "61.5",
        "services": [
            {"name": "nginx", "status": "active"},
            {"name": "cron", "status": "failed"},
            {"name": "sshd", "status": "activating"}
        ],
        "processes": [
            {"pid": 812, "name": "postgres", "cpu": "12.5", "mem": 3.25},
            {"pid": "1", "name": "systemd", "cpu": 0.1, "mem": "0.4"}
        ]
    }"#;
    let GatewayEvent::Update(u) = decode(text).unwrap() else {
        panic!("expected update");
    };
    assert_eq!(u.shape(), UpdateShape::Dashboard);
    let snap = u.into_snapshot();
    assert_eq!(
        snap.gauge,
        ResourceGauge {
            cpu_percent: 37.25,
            memory_percent: 61.5
        }
    );
    assert_eq!(
        snap.services,
        vec![
            ServiceStatus { name: "nginx".into(), state: "active".into() },
            ServiceStatus { name: "cron".into(), state: "failed".into() },
            ServiceStatus { name: "sshd".into(), state: "activating".into() },
        ]
    );
    assert_eq!(
        snap.processes,
        vec![
            ProcessSample { pid: 812, name: "postgres".into(), cpu_percent: 12.5, mem_percent: 3.25 },
            ProcessSample { pid: 1, name: "systemd".into(), cpu_percent: 0.1, mem_percent: 0.4 },
        ]
    );
}

#[test]
fn negative_pid_is_malformed() {
    let text = r#"{"status":"monitoring","cpu":1,"processes":[{"pid":-4,"name":"x","cpu":0,"mem":0}]}"#;
    assert!(matches!(decode(text), Err(CodecError::MalformedFrame(_))));
}

#[test]
fn out_of_range_gauge_is_kept_but_flagged() {
    let GatewayEvent::Update(u) =
        decode(r#"{"status":"monitoring","cpu":130.0,"memory":-2}"#).unwrap()
    else {
        panic!("expected update");
    };
    let snap = u.into_snapshot();
    assert_eq!(snap.gauge.cpu_percent, 130.0);
    assert_eq!(snap.gauge.memory_percent, -2.0);
    assert!(!snap.gauge.is_plausible());
}

#[test]
fn non_finite_numbers_are_malformed() {
    for cpu in ["NaN", "nan", "inf", "-inf", "infinity", "+Infinity"] {
        let frame = format!(r#"{{"status":"monitoring","ip":"10.0.0.5","cpu":"{cpu}"}}"#);
        assert!(
            matches!(decode(&frame), Err(CodecError::MalformedFrame(_))),
            "cpu {cpu:?} was accepted"
        );
    }
    let frame = r#"{"status":"monitoring","cpu":"1.0","memory":"NaN"}"#;
    assert!(matches!(decode(frame), Err(CodecError::MalformedFrame(_))));
    let frame = r#"{"status":"monitoring","cpu":1.0,"processes":[{"pid":"inf","name":"x","cpu":0,"mem":0}]}"#;
    assert!(matches!(decode(frame), Err(CodecError::MalformedFrame(_))));
}
