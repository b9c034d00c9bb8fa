//! Remediation monitor (plug power-cycling)
//!
//! - Scenario C: offline past threshold with plug on -> OFF then ON, in recovery;
//!   still unreachable past the recovery threshold -> OFF, recovery abandoned
//! - Reachable target with a plug reporting off -> plug turned back on
//! - Same flow against the plug REST bridge over real HTTP

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use homewatch_core::application::{Cycle, Hysteresis, Monitor, RemediationPolicy};
use homewatch_core::domain::{DeviceHandle, HostAddress, Target, TargetRegistry};
use homewatch_core::port::probe::mocks::{ScriptedProbe, ScriptedReply};
use homewatch_core::port::remediator::mocks::FakePlug;
use homewatch_core::port::{PowerState, Remediator};
use homewatch_infra_http::{build_client, HttpPlugRemediator, DEFAULT_HTTP_TIMEOUT};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const UPLINK: &str = "8.8.8.8";
const PLUG: &str = "192.168.1.60";

fn uplink_monitor(
    probe: Arc<ScriptedProbe>,
    remediator: Arc<dyn Remediator>,
) -> Monitor<RemediationPolicy> {
    let hysteresis = Hysteresis {
        offline_threshold: 4,
        recovery_threshold: 10,
        interval: Duration::from_secs(30),
    };
    let policy =
        RemediationPolicy::new(remediator, hysteresis).with_power_cycle_pause(Duration::ZERO);
    let target = Target::new("uplink", HostAddress::parse(UPLINK).unwrap())
        .with_remediation(DeviceHandle::new(PLUG));
    Monitor::new(
        "plug-toggler",
        TargetRegistry::new(vec![target]).unwrap(),
        probe,
        policy,
    )
}

#[tokio::test]
async fn test_scenario_c_power_cycle_then_abandon() {
    let probe = Arc::new(ScriptedProbe::new());
    probe.script(UPLINK, [ScriptedReply::Down]);
    let plug = Arc::new(FakePlug::new());
    let monitor = uplink_monitor(probe, plug.clone());

    for _ in 0..4 {
        monitor.run_cycle().await;
    }
    assert!(plug.commands().is_empty(), "below threshold: plug untouched");

    monitor.run_cycle().await;
    assert_eq!(
        plug.commands(),
        vec![
            (PLUG.to_string(), PowerState::Off),
            (PLUG.to_string(), PowerState::On)
        ]
    );
    assert!(monitor.state_of("uplink").await.unwrap().in_recovery);

    // Recovery window: 10 cycles of waiting
    for _ in 0..10 {
        monitor.run_cycle().await;
    }
    assert_eq!(plug.commands().len(), 2);
    assert!(monitor.state_of("uplink").await.unwrap().in_recovery);

    monitor.run_cycle().await;
    let commands = plug.commands();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[2], (PLUG.to_string(), PowerState::Off));
    let state = monitor.state_of("uplink").await.unwrap();
    assert!(!state.in_recovery);
    assert_eq!(plug.state(PLUG), PowerState::Off);
}

#[tokio::test]
async fn test_recovery_clears_state() {
    let probe = Arc::new(ScriptedProbe::new());
    let mut replies = vec![ScriptedReply::Down; 6];
    replies.push(ScriptedReply::Up(18.0));
    probe.script(UPLINK, replies);
    let plug = Arc::new(FakePlug::new());
    let monitor = uplink_monitor(probe, plug.clone());

    for _ in 0..7 {
        monitor.run_cycle().await;
    }

    let state = monitor.state_of("uplink").await.unwrap();
    assert_eq!(state.consecutive_offline, 0);
    assert!(!state.in_recovery);
    // One power-cycle only; plug was on when connectivity returned
    assert_eq!(plug.commands().len(), 2);
}

#[tokio::test]
async fn test_contradiction_turns_plug_on_without_crashing() {
    let probe = Arc::new(ScriptedProbe::new());
    probe.script(UPLINK, [ScriptedReply::Up(12.0)]);
    let plug = Arc::new(FakePlug::new());
    plug.force_state(PLUG, PowerState::Off);
    let monitor = uplink_monitor(probe, plug.clone());

    let report = monitor.run_cycle().await;

    assert_eq!(report.evaluated, 1);
    assert_eq!(plug.commands(), vec![(PLUG.to_string(), PowerState::On)]);
}

type Bridge = Arc<Mutex<(bool, Vec<bool>)>>;

async fn spawn_bridge(bridge: Bridge) -> String {
    let router = Router::new()
        .route(
            "/plugs/{plug}/state",
            get(|State(b): State<Bridge>, Path(_plug): Path<String>| async move {
                let on = b.lock().unwrap().0;
                Json(json!({ "payload": { "on": on } }))
            })
            .put(
                |State(b): State<Bridge>, Path(_plug): Path<String>, Json(body): Json<Value>| async move {
                    let on = body["on"].as_bool().unwrap_or_default();
                    let mut guard = b.lock().unwrap();
                    guard.0 = on;
                    guard.1.push(on);
                    StatusCode::OK
                },
            ),
        )
        .with_state(bridge);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}/plugs")
}

#[tokio::test]
async fn test_power_cycle_over_http_bridge() {
    let bridge: Bridge = Arc::new(Mutex::new((true, Vec::new())));
    let endpoint = spawn_bridge(bridge.clone()).await;
    let remediator = Arc::new(HttpPlugRemediator::new(
        build_client(DEFAULT_HTTP_TIMEOUT).unwrap(),
        endpoint,
    ));
    let probe = Arc::new(ScriptedProbe::new());
    probe.script(UPLINK, [ScriptedReply::Down]);
    let monitor = uplink_monitor(probe, remediator);

    for _ in 0..5 {
        monitor.run_cycle().await;
    }

    let guard = bridge.lock().unwrap();
    assert_eq!(guard.1, vec![false, true], "OFF then ON");
    assert!(guard.0);
}
