//! Alert-only monitor, end to end through the repeating task
//!
//! - Scenario A: 5 unreachable cycles at threshold 4 -> one alert at cycle 5
//! - Scenario B: recovery on cycle 6 -> exactly one "back online"
//! - A probe error on one target does not stop the others
//! - A failing recipient does not stop delivery to the others

use homewatch_core::application::{
    AlertPolicy, CycleOutcome, Dispatcher, Hysteresis, Monitor, RepeatingTask,
};
use homewatch_core::domain::{HostAddress, Recipient, Target, TargetRegistry};
use homewatch_core::port::notifier::mocks::RecordingNotifier;
use homewatch_core::port::probe::mocks::{ScriptedProbe, ScriptedReply};
use homewatch_core::port::time_provider::mocks::MockTimeProvider;
use homewatch_core::port::TimeProvider;
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(30);
const NOW: i64 = 1_700_000_000_000;

struct Harness {
    probe: Arc<ScriptedProbe>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<MockTimeProvider>,
    task: RepeatingTask<Monitor<AlertPolicy>>,
}

fn harness(targets: Vec<Target>, recipients: Vec<Recipient>) -> Harness {
    let probe = Arc::new(ScriptedProbe::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(MockTimeProvider::new(NOW));
    let hysteresis = Hysteresis {
        offline_threshold: 4,
        recovery_threshold: 10,
        interval: INTERVAL,
    };
    let policy = AlertPolicy::new(
        Dispatcher::new(notifier.clone(), recipients),
        clock.clone(),
        hysteresis,
    );
    let monitor = Monitor::new(
        "ip-checker",
        TargetRegistry::new(targets).unwrap(),
        probe.clone(),
        policy,
    );
    Harness {
        probe,
        notifier,
        clock,
        task: RepeatingTask::new(monitor, INTERVAL),
    }
}

fn device(name: &str, address: &str) -> Target {
    Target::new(name, HostAddress::parse(address).unwrap())
}

fn alice() -> Vec<Recipient> {
    vec![Recipient::new("alice", "+15551111111")]
}

#[tokio::test]
async fn test_scenario_a_single_alert_at_cycle_five() {
    let h = harness(vec![device("router", "192.168.1.1")], alice());
    h.probe.script("192.168.1.1", [ScriptedReply::Down]);

    for cycle in 1..=4 {
        h.task.trigger().await;
        assert_eq!(h.notifier.sent_count(), 0, "no alert on cycle {cycle}");
    }

    h.task.trigger().await;

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].message,
        format!(
            "{} - The device, 'router' has been offline for 2.5 minutes!",
            h.clock.timestamp()
        )
    );

    // Still offline: no repeat
    for _ in 0..5 {
        h.task.trigger().await;
    }
    assert_eq!(h.notifier.sent_count(), 1);
}

#[tokio::test]
async fn test_scenario_b_recovery_alert_once() {
    let h = harness(
        vec![device("router", "192.168.1.1").with_messages(
            Some("The router is back".to_string()),
            Some("The router went down".to_string()),
        )],
        alice(),
    );
    let mut replies = vec![ScriptedReply::Down; 5];
    replies.push(ScriptedReply::Up(2.0));
    h.probe.script("192.168.1.1", replies);

    for _ in 0..5 {
        h.task.trigger().await;
    }
    h.notifier.clear();

    for _ in 0..3 {
        h.task.trigger().await;
    }

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].message,
        format!("{} - The router is back", h.clock.timestamp())
    );
    let state = h.task.cycle().state_of("router").await.unwrap();
    assert!(!state.alerted);
    assert_eq!(state.consecutive_offline, 0);
}

#[tokio::test]
async fn test_probe_error_does_not_block_other_targets() {
    let h = harness(
        vec![
            device("router", "192.168.1.1"),
            device("nas", "192.168.1.5"),
            device("printer", "192.168.1.9"),
        ],
        alice(),
    );
    h.probe.script("192.168.1.1", [ScriptedReply::Down]);
    h.probe
        .script("192.168.1.5", [ScriptedReply::Error("resolver exploded".into())]);
    h.probe.script("192.168.1.9", [ScriptedReply::Down]);

    let mut last = None;
    for _ in 0..5 {
        last = Some(h.task.trigger().await);
    }

    match last {
        Some(CycleOutcome::Completed(report)) => {
            assert_eq!(report.evaluated, 2);
            assert_eq!(report.skipped, 1);
        }
        other => panic!("expected completed cycle, got {other:?}"),
    }
    let messages: Vec<String> = h.notifier.sent().into_iter().map(|m| m.message).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().any(|m| m.contains("'router'")));
    assert!(messages.iter().any(|m| m.contains("'printer'")));
    assert_eq!(
        h.task.cycle().state_of("nas").await.unwrap().consecutive_offline,
        0
    );
}

#[tokio::test]
async fn test_failing_recipient_does_not_block_others() {
    let h = harness(
        vec![device("router", "192.168.1.1")],
        vec![
            Recipient::new("alice", "+15551111111"),
            Recipient::new("bob", "+15552222222"),
            Recipient::new("carol", "+15553333333"),
        ],
    );
    h.notifier.fail_for("+15552222222");
    h.probe.script("192.168.1.1", [ScriptedReply::Down]);

    for _ in 0..5 {
        h.task.trigger().await;
    }

    assert_eq!(h.notifier.sent_to("+15551111111").len(), 1);
    assert_eq!(h.notifier.sent_to("+15553333333").len(), 1);
    assert!(h.notifier.sent_to("+15552222222").is_empty());
    assert!(h.task.cycle().state_of("router").await.unwrap().alerted);
}

#[tokio::test(start_paused = true)]
async fn test_alert_arrives_after_two_minutes_of_virtual_time() {
    let h = Arc::new(harness(vec![device("router", "192.168.1.1")], alice()));
    h.probe.script("192.168.1.1", [ScriptedReply::Down]);
    let (shutdown_tx, shutdown_rx) = homewatch_core::application::shutdown_channel();

    let runner = {
        let h = h.clone();
        tokio::spawn(async move { h.task.run(shutdown_rx).await })
    };

    // Cycles at t=0,30,60,90: below threshold
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(h.notifier.sent_count(), 0);

    // Cycle 5 at t=120
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.notifier.sent_count(), 1);

    shutdown_tx.shutdown();
    runner.await.unwrap();
    assert_eq!(h.task.completed_cycles(), 5);
}
