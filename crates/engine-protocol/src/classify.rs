//! Normalizes both inbound frame shapes into one [`Signal`].

use serde_json::Value;

use crate::{events, read_tick, Operation, ProcessResponse, SocketEvent};

/// What an inbound frame means to the session, independent of transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A successful reply. `op` is `None` when the engine did not echo one.
    /// For `Snapshot` acks `data` is the snapshot payload itself.
    Ack { op: Option<Operation>, data: Value },
    /// The engine reported a failure.
    Failure {
        message: String,
        stack: Option<String>,
    },
    /// Unsolicited running/tick report.
    StateUpdate {
        running: bool,
        tick: Option<u64>,
        snapshot: Option<Value>,
    },
    /// Socket heartbeat reply.
    Pong,
    /// The engine server is going away on purpose.
    ServerShutdown { message: String },
    /// A well-formed frame with an operation or event name we do not handle.
    Unrecognized { name: String },
}

/// Classify one process response line.
pub fn classify_response(resp: &ProcessResponse) -> Signal {
    if !resp.success || resp.error.is_some() {
        return Signal::Failure {
            message: resp
                .error
                .clone()
                .unwrap_or_else(|| "unknown engine error".to_string()),
            stack: resp.stack.clone(),
        };
    }

    match resp.op.as_deref() {
        Some(name) => match Operation::from_process_name(name) {
            Some(Operation::Snapshot) => Signal::Ack {
                op: Some(Operation::Snapshot),
                data: snapshot_payload(&resp.data),
            },
            Some(op) => Signal::Ack {
                op: Some(op),
                data: resp.data.clone(),
            },
            None => Signal::Unrecognized {
                name: name.to_string(),
            },
        },
        // Bare replies carry their result at the top level.
        None => {
            if let Some(snapshot) = resp.extra.get("snapshot") {
                Signal::Ack {
                    op: Some(Operation::Snapshot),
                    data: snapshot.clone(),
                }
            } else if resp.extra.contains_key("tick") {
                Signal::Ack {
                    op: Some(Operation::Step),
                    data: Value::Object(resp.extra.clone()),
                }
            } else {
                Signal::Ack {
                    op: None,
                    data: resp.data.clone(),
                }
            }
        }
    }
}

/// Classify one socket event.
pub fn classify_event(ev: &SocketEvent) -> Signal {
    match ev.event.as_str() {
        events::ENGINE_CONNECTED | events::STATE_UPDATE => Signal::StateUpdate {
            running: ev
                .data
                .get("running")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            tick: read_tick(&ev.data),
            snapshot: ev.data.get("snapshot").filter(|s| !s.is_null()).cloned(),
        },
        events::ENGINE_STARTED => Signal::Ack {
            op: Some(Operation::Init),
            data: ev.data.clone(),
        },
        events::ENGINE_STOPPED => Signal::Ack {
            op: Some(Operation::Stop),
            data: ev.data.clone(),
        },
        events::ENGINE_STEP | events::ENGINE_STEPPED => Signal::Ack {
            op: Some(Operation::Step),
            data: ev.data.clone(),
        },
        events::SNAPSHOT_UPDATE => Signal::Ack {
            op: Some(Operation::Snapshot),
            data: ev.data.clone(),
        },
        events::ERROR => Signal::Failure {
            message: ev
                .data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown engine error")
                .to_string(),
            stack: ev
                .data
                .get("stack")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        events::PONG => Signal::Pong,
        events::SERVER_SHUTDOWN => Signal::ServerShutdown {
            message: ev
                .data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("server shutting down")
                .to_string(),
        },
        other => Signal::Unrecognized {
            name: other.to_string(),
        },
    }
}

fn snapshot_payload(data: &Value) -> Value {
    match data.get("snapshot") {
        Some(inner) if !inner.is_null() => inner.clone(),
        _ => data.clone(),
    }
}
