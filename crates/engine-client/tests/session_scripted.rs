//! Session state machine against a scripted transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use eco_domain::config::SimulationConfig;
use eco_engine_client::{
    ErrorKind, SessionBuilder, SessionError, SessionEvent, SessionState, SnapshotKind,
    TransportError, TransportEvent, TransportKind,
};
use eco_snapshots::SnapshotBuffer;
use serde_json::json;

fn config() -> SimulationConfig {
    SimulationConfig::with_population(50, 200)
}

#[tokio::test(start_paused = true)]
async fn full_lifecycle_over_process_transport() {
    let buffer = Arc::new(SnapshotBuffer::new(16));
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new()
        .snapshot_buffer(buffer.clone())
        .spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    let status = session.status();
    assert_eq!(status.state, SessionState::Running);
    assert!(status.initialized);
    assert!(!status.pending_init);
    assert_eq!(status.planned_work_units, 200);

    session.send_step(5).unwrap();
    expect_event(&mut events, |e| matches!(e, SessionEvent::Stepped { .. })).await;
    session.request_snapshot(SnapshotKind::Metrics).unwrap();
    let snap = expect_event(&mut events, |e| matches!(e, SessionEvent::Snapshot(_))).await;
    assert_eq!(snap, SessionEvent::Snapshot(json!({"tick": 5, "metrics": {"population": 105}})));

    session.stop().await.unwrap();
    let rest = collect_until(&mut events, |e| *e == SessionEvent::Stopped).await;
    assert_eq!(milestones(&rest), vec![SessionEvent::Stopped]);

    assert_eq!(script.sent_ops(), vec!["init", "step", "snapshot", "stop"]);
    let init = &script.sent()[0];
    assert_eq!(init["data"]["provider"], "mesa");
    assert_eq!(init["data"]["config"]["agents"]["initialPopulation"], 50);

    let stored = buffer.read_latest().unwrap();
    assert_eq!(stored.sequence, 5);
    assert_eq!(buffer.extract_series("metrics.population", 0, 10)[0].value, 105.0);

    let status = session.status();
    assert_eq!(status.state, SessionState::Stopped);
    assert_eq!(status.current_tick, 5);
    assert!(!status.initialized);
}

#[tokio::test(start_paused = true)]
async fn milestone_order_for_a_short_run() {
    let (transport, _script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    let mut seen = collect_until(&mut events, |e| *e == SessionEvent::Started).await;
    session.send_step(1).unwrap();
    seen.extend(collect_until(&mut events, |e| matches!(e, SessionEvent::Stepped { .. })).await);
    session.request_snapshot(SnapshotKind::Full).unwrap();
    seen.extend(collect_until(&mut events, |e| matches!(e, SessionEvent::Snapshot(_))).await);
    session.stop().await.unwrap();
    seen.extend(collect_until(&mut events, |e| *e == SessionEvent::Stopped).await);

    let kinds: Vec<&str> = milestones(&seen)
        .iter()
        .map(|e| match e {
            SessionEvent::Started => "started",
            SessionEvent::Stepped { .. } => "stepped",
            SessionEvent::Snapshot(_) => "snapshot",
            SessionEvent::Stopped => "stopped",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["started", "stepped", "snapshot", "stopped"]);
}

#[tokio::test(start_paused = true)]
async fn remote_failure_during_init_moves_to_error() {
    let responder = Box::new(|_: &serde_json::Value| {
        vec![line(json!({"success": false, "op": "init", "error": "boom"}))]
    });
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, responder);
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();

    let seen = collect_until(&mut events, is_error).await;
    assert_eq!(
        seen.last(),
        Some(&SessionEvent::Error {
            kind: ErrorKind::RemoteError,
            message: "boom".into()
        })
    );
    assert!(!seen.contains(&SessionEvent::Started));

    session.wait_for_state(SessionState::Error).await.unwrap();
    let status = session.status();
    assert!(!status.initialized);
    assert!(!status.pending_init);
    assert_eq!(script.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_while_running_is_a_logged_no_op() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    session.start().unwrap();
    let log = expect_event(&mut events, |e| matches!(e, SessionEvent::Log(_))).await;
    assert!(matches!(log, SessionEvent::Log(m) if m.contains("already")));
    assert_eq!(script.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn step_requires_initialized_running_session() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    session.send_step(3).unwrap();
    let err = expect_event(&mut events, is_error).await;
    assert!(matches!(err, SessionEvent::Error { kind: ErrorKind::InvalidCommand, .. }));

    assert_eq!(
        session.send_step(0),
        Err(SessionError::InvalidCommand("step count must be positive".into()))
    );
    let err = expect_event(&mut events, is_error).await;
    assert!(matches!(err, SessionEvent::Error { kind: ErrorKind::InvalidCommand, .. }));

    assert!(script.sent().is_empty());
    assert_eq!(session.state(), SessionState::Running);
}

#[tokio::test(start_paused = true)]
async fn invalid_init_is_rejected_synchronously() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    let bad = SimulationConfig::with_population(0, 100);
    let err = session.send_init(&bad).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfiguration(ref m) if m.contains("agents.initialPopulation")));

    let bad = json!({"simulation": {"maxSteps": -1}, "agents": {"initialPopulation": 5}});
    assert!(matches!(
        session.send_init_value(bad),
        Err(SessionError::InvalidConfiguration(_))
    ));

    let ev = expect_event(&mut events, is_error).await;
    assert!(matches!(ev, SessionEvent::Error { kind: ErrorKind::InvalidConfiguration, .. }));

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    assert!(!session.status().pending_init);
    assert!(script.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_init_is_ignored() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.send_init(&config()).unwrap();
    let log = expect_event(&mut events, |e| matches!(e, SessionEvent::Log(_))).await;
    assert!(matches!(log, SessionEvent::Log(m) if m.starts_with("init ignored")));

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    assert_eq!(script.sent_ops(), vec!["init"]);
}

#[tokio::test(start_paused = true)]
async fn startup_timeout_when_engine_never_answers() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, silent());
    let (session, mut events) = SessionBuilder::new()
        .startup_timeout(Duration::from_secs(5))
        .spawn_with(transport);

    session.send_init(&config()).unwrap();
    let started_at = tokio::time::Instant::now();
    session.start().unwrap();

    let err = expect_event(&mut events, is_error).await;
    assert_eq!(
        err,
        SessionEvent::Error {
            kind: ErrorKind::StartupTimeout,
            message: "startup timeout".into()
        }
    );
    assert!(started_at.elapsed() >= Duration::from_secs(5));
    assert_eq!(session.state(), SessionState::Error);
    assert_eq!(script.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_target_fails_immediately() {
    let (transport, _script) = ScriptedTransport::new(TransportKind::Process, silent());
    let transport = transport.on_open(|_| {
        Err(TransportError::TargetUnreachable("/no/such/engine: not found".into()))
    });
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    let err = expect_event(&mut events, is_error).await;
    match err {
        SessionEvent::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::TargetUnreachable);
            assert!(message.starts_with("target unreachable"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Error);
}

#[tokio::test(start_paused = true)]
async fn restart_after_error_resets_tick() {
    let mut fail_first = true;
    let responder = Box::new(move |frame: &serde_json::Value| {
        if frame_op(frame) == "init" && fail_first {
            fail_first = false;
            return vec![line(json!({"success": false, "op": "init", "error": "bad seed"}))];
        }
        vec![line(json!({"success": true, "op": frame_op(frame), "data": {"tick": 4}}))]
    });
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, responder);
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, is_error).await;

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    session.send_step(4).unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Stepped { tick: 4 }).await;
    assert_eq!(script.opens(), 2);
    assert!(session.status().initialized);
}

#[tokio::test(start_paused = true)]
async fn step_tick_falls_back_and_never_decreases() {
    let mut replies = vec![
        json!({"success": true, "op": "step", "data": {}}),
        json!({"success": true, "op": "step", "data": {"tick": 2}}),
        json!({"success": true, "op": "step", "data": {"tick": 9}}),
    ]
    .into_iter();
    let responder = Box::new(move |frame: &serde_json::Value| match frame_op(frame) {
        "init" => vec![line(json!({"success": true, "op": "init", "data": {}}))],
        "step" => replies.next().map(line).into_iter().collect(),
        _ => vec![],
    });
    let (transport, _script) = ScriptedTransport::new(TransportKind::Process, responder);
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    let mut ticks = Vec::new();
    for _ in 0..3 {
        session.send_step(3).unwrap();
        if let SessionEvent::Stepped { tick } =
            expect_event(&mut events, |e| matches!(e, SessionEvent::Stepped { .. })).await
        {
            ticks.push(tick);
        }
    }
    // No tick → current + steps; a lower tick never moves the counter back.
    assert_eq!(ticks, vec![3, 3, 9]);
}

#[tokio::test(start_paused = true)]
async fn malformed_line_is_reported_and_dropped() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    script.push(TransportEvent::Data(b"this is not json\n".to_vec()));
    let err = expect_event(&mut events, is_error).await;
    assert!(matches!(err, SessionEvent::Error { kind: ErrorKind::ProtocolError, .. }));

    session.send_step(1).unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Stepped { tick: 1 }).await;
    assert_eq!(session.state(), SessionState::Running);
}

#[tokio::test(start_paused = true)]
async fn oversized_output_reports_buffer_overflow() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    script.push(TransportEvent::Data(vec![b'a'; 1024 * 1024 + 1]));
    let err = expect_event(&mut events, is_error).await;
    match err {
        SessionEvent::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::BufferOverflow);
            assert!(message.contains("buffer overflow"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Running);
}

#[tokio::test(start_paused = true)]
async fn stderr_lines_become_logs() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    script.push(TransportEvent::Stderr("mesa: warming up".into()));
    let log = expect_event(&mut events, |e| matches!(e, SessionEvent::Log(_))).await;
    assert_eq!(log, SessionEvent::Log("mesa: warming up".into()));
}

#[tokio::test(start_paused = true)]
async fn process_exit_outside_stop() {
    for (code, signaled, expected) in [
        (Some(3), false, Some(ErrorKind::ProcessExitedNonZero)),
        (None, true, Some(ErrorKind::ProcessCrashed)),
        (Some(0), false, None),
    ] {
        let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
        let (session, mut events) = SessionBuilder::new().spawn_with(transport);
        session.start().unwrap();
        expect_event(&mut events, |e| *e == SessionEvent::Started).await;

        script.push(TransportEvent::Exited { code, signaled });
        let ev = expect_event(&mut events, |e| is_error(e) || *e == SessionEvent::Stopped).await;
        match expected {
            Some(kind) => {
                assert!(matches!(ev, SessionEvent::Error { kind: k, .. } if k == kind));
                assert_eq!(session.state(), SessionState::Error);
            }
            None => {
                assert_eq!(ev, SessionEvent::Stopped);
                session.wait_for_state(SessionState::Stopped).await.unwrap();
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn unsolicited_stop_ack_stops_session() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    script.push(line(json!({"success": true, "op": "stop", "data": {}})));
    expect_event(&mut events, |e| *e == SessionEvent::Stopped).await;
    session.wait_for_state(SessionState::Stopped).await.unwrap();
    assert!(!session.status().initialized);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    // Idle: nothing happens.
    session.stop().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    session.stop().await.unwrap();
    session.stop().await.unwrap();
    session.shutdown().await.unwrap();

    let mut stopped = 0;
    while let Some(ev) = events.recv().await {
        if ev == SessionEvent::Stopped {
            stopped += 1;
        }
    }
    assert_eq!(stopped, 1);
    assert_eq!(script.sent_ops().iter().filter(|op| *op == "stop").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_without_ack_waits_grace_then_closes() {
    let responder = Box::new(|frame: &serde_json::Value| match frame_op(frame) {
        "init" => vec![line(json!({"success": true, "op": "init", "data": {}}))],
        _ => vec![],
    });
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, responder);
    let (session, mut events) = SessionBuilder::new()
        .stop_grace(Duration::from_secs(2))
        .spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    let t0 = tokio::time::Instant::now();
    session.stop().await.unwrap();
    assert!(t0.elapsed() >= Duration::from_secs(2));
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(script.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn snapshot_ignored_before_init_and_state_query_needs_socket() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    session.request_snapshot(SnapshotKind::Metrics).unwrap();
    session.request_state().unwrap();
    let err = expect_event(&mut events, is_error).await;
    assert!(matches!(err, SessionEvent::Error { kind: ErrorKind::InvalidCommand, ref message } if message.contains("socket")));
    assert!(script.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_all_handles_ends_the_actor() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;

    drop(session);
    let rest = collect_until(&mut events, |e| *e == SessionEvent::Stopped).await;
    assert!(rest.contains(&SessionEvent::Stopped));
    assert!(events.recv().await.is_none());
    assert_eq!(script.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn ping_reply_while_starting_promotes_to_running() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, silent());
    let transport = transport.on_open(|_| {
        Ok(vec![
            TransportEvent::Ready,
            line(json!({"success": true, "op": "ping", "data": {}})),
        ])
    });
    let (session, mut events) = SessionBuilder::new()
        .startup_timeout(Duration::from_secs(5))
        .spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();

    let seen = collect_until(&mut events, |e| *e == SessionEvent::Started || is_error(e)).await;
    assert_eq!(seen.last(), Some(&SessionEvent::Started));
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(script.sent_ops(), vec!["init"]);
}

#[tokio::test(start_paused = true)]
async fn init_after_initialization_is_ignored_before_validation() {
    let (transport, script) = ScriptedTransport::new(TransportKind::Process, sidecar());
    let (session, mut events) = SessionBuilder::new().spawn_with(transport);

    session.send_init(&config()).unwrap();
    session.start().unwrap();
    expect_event(&mut events, |e| *e == SessionEvent::Started).await;
    assert!(session.status().initialized);

    let bad = SimulationConfig::with_population(0, 100);
    session.send_init(&bad).unwrap();
    let seen = collect_until(&mut events, |e| matches!(e, SessionEvent::Log(_)) || is_error(e)).await;
    assert!(matches!(seen.last(), Some(SessionEvent::Log(m)) if m.starts_with("init ignored")));
    assert_eq!(script.sent_ops(), vec!["init"]);
}
