//! Session lifecycle states and the events a session emits.

use std::fmt;

use serde_json::Value;

use crate::error::ErrorKind;

/// Lifecycle of an engine session.
///
/// `Idle → Starting → Running ⇄ Stepping → Stopping → Stopped`, with `Error`
/// reachable from any non-terminal state. `start()` leaves `Stopped` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stepping,
    Stopping,
    Stopped,
    Error,
}

impl SessionState {
    /// `Running` or `Stepping`.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Stepping)
    }

    /// A session in this state has a live (or starting) transport.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Running | SessionState::Stepping
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stepping => "stepping",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
            SessionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a session, published on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionStatus {
    pub state: SessionState,
    pub current_tick: u64,
    pub initialized: bool,
    pub pending_init: bool,
    /// `simulation.maxSteps` from the last accepted init.
    pub planned_work_units: i64,
    pub connected: bool,
}

/// Everything a session reports to its consumer, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Stopped,
    Stepped { tick: u64 },
    Snapshot(Value),
    Error { kind: ErrorKind, message: String },
    StateChanged(SessionState),
    Log(String),
    /// Socket transport connected (or reconnected).
    Connected,
    Disconnected,
    /// Reconnect attempts exhausted.
    ConnectionFailed(String),
    /// Unsolicited running/tick report from the engine.
    StateUpdate { running: bool, tick: u64 },
}

impl SessionEvent {
    pub(crate) fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        SessionEvent::Error {
            kind,
            message: message.into(),
        }
    }
}
