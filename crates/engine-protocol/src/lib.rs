//! Engine protocol: command and frame types for both engine transports.
//!
//! Two wire shapes carry the same commands:
//! - **Process** (sidecar over stdio): one compact JSON object per line,
//!   `{"op", "data"}` out and `{"success", "op", "data", "error"?}` back.
//! - **Socket** (engine server over WebSocket): one JSON object per message,
//!   `{"type", "data"?, "timestamp"}` out and `{"event", "data", "timestamp"}` back.

pub mod classify;
pub mod codec;

pub use classify::{classify_event, classify_response, Signal};
pub use codec::{
    decode_message, encode_message, encode_request, LineDecoder, MAX_LINE_BUFFER_BYTES,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Commands
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Operations the client can ask the engine to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Step,
    Snapshot,
    Stop,
    Ping,
    /// Query running/tick state (socket engines only).
    State,
}

impl Operation {
    /// Name used in the `op` field of a process request.
    pub fn process_name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Step => "step",
            Operation::Snapshot => "snapshot",
            Operation::Stop => "stop",
            Operation::Ping => "ping",
            Operation::State => "state",
        }
    }

    /// Name used in the `type` field of a socket message.
    pub fn socket_name(self) -> &'static str {
        match self {
            Operation::Init => "start",
            Operation::Step => "step",
            Operation::Snapshot => "snapshot",
            Operation::Stop => "stop",
            Operation::Ping => "ping",
            Operation::State => "getState",
        }
    }

    /// Parse the `op` echoed back in a process response.
    pub fn from_process_name(name: &str) -> Option<Self> {
        match name {
            "init" => Some(Operation::Init),
            "step" => Some(Operation::Step),
            "snapshot" => Some(Operation::Snapshot),
            "stop" => Some(Operation::Stop),
            "ping" => Some(Operation::Ping),
            "state" => Some(Operation::State),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.process_name())
    }
}

/// Snapshot granularity requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Aggregate metrics only (population, infection counts, ...).
    #[default]
    Metrics,
    /// Full world state including agent positions.
    Full,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Metrics => "metrics",
            SnapshotKind::Full => "full",
        }
    }
}

impl std::str::FromStr for SnapshotKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metrics" => Ok(SnapshotKind::Metrics),
            "full" => Ok(SnapshotKind::Full),
            other => Err(ProtocolError::Malformed(format!(
                "unknown snapshot kind: {other}"
            ))),
        }
    }
}

/// An outgoing request. Transport-neutral; the codec picks the wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub op: Operation,
    pub data: Value,
}

impl Command {
    pub fn init(provider: impl Into<String>, config: Value) -> Self {
        Self {
            op: Operation::Init,
            data: serde_json::json!({ "provider": provider.into(), "config": config }),
        }
    }

    pub fn step(steps: u32) -> Self {
        Self {
            op: Operation::Step,
            data: serde_json::json!({ "steps": steps }),
        }
    }

    pub fn snapshot(kind: SnapshotKind) -> Self {
        Self {
            op: Operation::Snapshot,
            data: serde_json::json!({ "kind": kind.as_str() }),
        }
    }

    pub fn stop() -> Self {
        Self {
            op: Operation::Stop,
            data: Value::Object(Default::default()),
        }
    }

    pub fn ping() -> Self {
        Self {
            op: Operation::Ping,
            data: Value::Object(Default::default()),
        }
    }

    pub fn state() -> Self {
        Self {
            op: Operation::State,
            data: Value::Object(Default::default()),
        }
    }

    pub fn is_ping(&self) -> bool {
        self.op == Operation::Ping
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Process wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A request line written to the sidecar's stdin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessRequest {
    pub op: String,
    pub data: Value,
}

/// A response line read from the sidecar's stdout.
///
/// Older sidecars answer with `ok` instead of `success`, or omit both and put
/// `tick` / `snapshot` at the top level; those keys land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessResponse {
    #[serde(default = "d_true", alias = "ok")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn d_true() -> bool {
    true
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Socket wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Client → engine server message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: i64,
}

/// Engine server → client event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: i64,
}

/// Event names the engine server is known to send.
pub mod events {
    pub const ENGINE_CONNECTED: &str = "engine:connected";
    pub const STATE_UPDATE: &str = "state:update";
    pub const ENGINE_STARTED: &str = "engine:started";
    pub const ENGINE_STOPPED: &str = "engine:stopped";
    pub const ENGINE_STEP: &str = "engine:step";
    pub const ENGINE_STEPPED: &str = "engine:stepped";
    pub const SNAPSHOT_UPDATE: &str = "snapshot:update";
    pub const ERROR: &str = "error";
    pub const PONG: &str = "pong";
    pub const SERVER_SHUTDOWN: &str = "server:shutdown";
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors raised while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("buffer overflow ({0} bytes without a newline)")]
    BufferOverflow(usize),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a non-negative tick counter from `value["tick"]`.
pub fn read_tick(value: &Value) -> Option<u64> {
    let tick = value.get("tick")?;
    tick.as_u64()
        .or_else(|| tick.as_f64().filter(|t| *t >= 0.0).map(|t| t as u64))
}
