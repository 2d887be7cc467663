//! Scripted in-memory transport and event helpers shared by the session tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eco_engine_client::transport::EventSender;
use eco_engine_client::{SessionEvent, Transport, TransportError, TransportEvent, TransportKind};
use serde_json::{json, Value};
use tokio::sync::mpsc;

type Responder = Box<dyn FnMut(&Value) -> Vec<TransportEvent> + Send>;
type OpenHook = Box<dyn FnMut(usize) -> Result<Vec<TransportEvent>, TransportError> + Send>;

#[derive(Default)]
struct Shared {
    opens: usize,
    closes: usize,
    sent: Vec<Value>,
    events: Option<EventSender>,
}

/// Test-side view of a [`ScriptedTransport`].
#[derive(Clone)]
pub struct Script {
    shared: Arc<Mutex<Shared>>,
}

impl Script {
    pub fn opens(&self) -> usize {
        self.shared.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.shared.lock().unwrap().closes
    }

    /// Every frame the session wrote, decoded.
    pub fn sent(&self) -> Vec<Value> {
        self.shared.lock().unwrap().sent.clone()
    }

    /// Operation names of sent frames (`op` for process, `type` for socket).
    pub fn sent_ops(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|f| frame_op(f).to_string())
            .collect()
    }

    /// Inject an event on the current connection.
    pub fn push(&self, ev: TransportEvent) {
        if let Some(tx) = &self.shared.lock().unwrap().events {
            let _ = tx.send(ev);
        }
    }
}

/// A transport whose peer is a closure.
pub struct ScriptedTransport {
    kind: TransportKind,
    shared: Arc<Mutex<Shared>>,
    responder: Responder,
    on_open: OpenHook,
}

impl ScriptedTransport {
    pub fn new(kind: TransportKind, responder: Responder) -> (Self, Script) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let t = Self {
            kind,
            shared: shared.clone(),
            responder,
            on_open: Box::new(|_| Ok(vec![TransportEvent::Ready])),
        };
        (t, Script { shared })
    }

    /// Override what happens on the n-th (1-based) `open`.
    pub fn on_open(
        mut self,
        hook: impl FnMut(usize) -> Result<Vec<TransportEvent>, TransportError> + Send + 'static,
    ) -> Self {
        self.on_open = Box::new(hook);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn open(&mut self, events: EventSender) -> Result<(), TransportError> {
        let n = {
            let mut s = self.shared.lock().unwrap();
            s.opens += 1;
            s.opens
        };
        let initial = (self.on_open)(n)?;
        for ev in initial {
            let _ = events.send(ev);
        }
        self.shared.lock().unwrap().events = Some(events);
        Ok(())
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let value: Value = serde_json::from_str(frame.trim_end()).map_err(TransportError::Json)?;
        let replies = (self.responder)(&value);
        let mut s = self.shared.lock().unwrap();
        s.sent.push(value);
        let tx = s.events.as_ref().ok_or(TransportError::NotConnected)?;
        for ev in replies {
            let _ = tx.send(ev);
        }
        Ok(())
    }

    async fn close(&mut self, _grace: Duration) {
        let mut s = self.shared.lock().unwrap();
        s.closes += 1;
        s.events = None;
    }
}

pub fn frame_op(frame: &Value) -> &str {
    frame
        .get("op")
        .or_else(|| frame.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// One stdout line carrying `value`.
pub fn line(value: Value) -> TransportEvent {
    TransportEvent::Data(format!("{value}\n").into_bytes())
}

/// One socket message carrying `{event, data, timestamp}`.
pub fn socket_event(name: &str, data: Value) -> TransportEvent {
    TransportEvent::Message(json!({ "event": name, "data": data, "timestamp": 0 }).to_string())
}

/// A well-behaved sidecar: acks every op and counts ticks.
pub fn sidecar() -> Responder {
    let mut tick: u64 = 0;
    Box::new(move |frame| {
        let op = frame_op(frame).to_string();
        let reply = match op.as_str() {
            "init" => json!({"success": true, "op": "init", "data": {}}),
            "step" => {
                tick += frame["data"]["steps"].as_u64().unwrap_or(1);
                json!({"success": true, "op": "step", "data": {"tick": tick}})
            }
            "snapshot" => json!({
                "success": true, "op": "snapshot",
                "data": {"snapshot": {"tick": tick, "metrics": {"population": 100 + tick}}}
            }),
            "stop" => json!({"success": true, "op": "stop", "data": {}}),
            "ping" => json!({"success": true, "op": "ping", "data": {}}),
            other => json!({"success": false, "op": other, "error": "unknown op"}),
        };
        vec![line(reply)]
    })
}

/// A well-behaved engine server speaking the socket event protocol.
pub fn engine_server() -> Responder {
    let mut tick: u64 = 0;
    Box::new(move |frame| {
        let kind = frame_op(frame).to_string();
        match kind.as_str() {
            "start" => vec![socket_event("engine:started", json!({"running": true}))],
            "step" => {
                tick += frame["data"]["steps"].as_u64().unwrap_or(1);
                vec![socket_event("engine:step", json!({"tick": tick}))]
            }
            "snapshot" => vec![socket_event(
                "snapshot:update",
                json!({"tick": tick, "metrics": {"population": 100 + tick}}),
            )],
            "stop" => vec![socket_event("engine:stopped", json!({}))],
            "ping" => vec![socket_event("pong", json!({}))],
            "getState" => vec![socket_event("state:update", json!({"running": true, "tick": tick}))],
            _ => vec![],
        }
    })
}

/// Responder that never answers.
pub fn silent() -> Responder {
    Box::new(|_| Vec::new())
}

/// Receive events until one matches `pred`; return everything seen, including it.
pub async fn collect_until<F>(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    mut pred: F,
) -> Vec<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    let fut = async {
        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            let done = pred(&ev);
            seen.push(ev);
            if done {
                return seen;
            }
        }
        panic!("event stream ended; saw {seen:?}");
    };
    tokio::time::timeout(Duration::from_secs(120), fut)
        .await
        .expect("timed out waiting for session event")
}

/// Wait for the first event matching `pred`.
pub async fn expect_event<F>(rx: &mut mpsc::UnboundedReceiver<SessionEvent>, pred: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let mut seen = collect_until(rx, pred).await;
    seen.pop().expect("collect_until returns at least one event")
}

/// Drop bookkeeping events, keeping what a consumer acts on.
pub fn milestones(events: &[SessionEvent]) -> Vec<SessionEvent> {
    events
        .iter()
        .filter(|e| {
            !matches!(
                e,
                SessionEvent::StateChanged(_)
                    | SessionEvent::Log(_)
                    | SessionEvent::Connected
                    | SessionEvent::Disconnected
                    | SessionEvent::StateUpdate { .. }
            )
        })
        .cloned()
        .collect()
}

pub fn is_error(ev: &SessionEvent) -> bool {
    matches!(ev, SessionEvent::Error { .. })
}
