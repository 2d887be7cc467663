//! Engine session: a handle plus one actor task per session.
//!
//! ```text
//!  EngineSession ──Request──▶ actor ──frames──▶ Transport ──▶ engine
//!        ▲                     │  ◀──TransportEvent──┘
//!        │ watch<SessionStatus>│
//!        └─────────────────────┴──SessionEvent──▶ consumer
//! ```
//!
//! The actor owns the transport, every timer (startup, heartbeat, reconnect)
//! and all mutable session state. Handle calls never block on the engine.

mod actor;

pub(crate) use actor::spawn_actor;

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use eco_domain::config::SimulationConfig;
use eco_protocol::SnapshotKind;

use crate::error::SessionError;
use crate::events::{SessionState, SessionStatus};
use crate::reconnect::ReconnectPolicy;

/// Tunables fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Engine provider sent with `init`.
    pub provider: String,
    pub startup_timeout: Duration,
    pub stop_grace: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            provider: "mesa".into(),
            startup_timeout: Duration::from_secs(5),
            stop_grace: Duration::from_secs(2),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

pub(crate) enum Request {
    Start,
    Init(Value),
    Step(u32),
    Snapshot(SnapshotKind),
    State,
    Stop(oneshot::Sender<()>),
    /// A handle-side validation failure to surface on the event stream.
    Rejected(SessionError),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running session actor.
///
/// The actor exits when `shutdown` is called or the last handle is dropped.
#[derive(Clone)]
pub struct EngineSession {
    id: Uuid,
    requests: mpsc::UnboundedSender<Request>,
    status: watch::Receiver<SessionStatus>,
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("id", &self.id)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl EngineSession {
    pub(crate) fn new(
        id: Uuid,
        requests: mpsc::UnboundedSender<Request>,
        status: watch::Receiver<SessionStatus>,
    ) -> Self {
        Self {
            id,
            requests,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn request(&self, req: Request) -> Result<(), SessionError> {
        self.requests.send(req).map_err(|_| SessionError::SessionClosed)
    }

    /// Report a validation failure on the event stream and return it.
    fn reject(&self, err: SessionError) -> Result<(), SessionError> {
        let _ = self.requests.send(Request::Rejected(err.clone()));
        Err(err)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open the transport. No-op (with a `Log`) when already starting or running.
    pub fn start(&self) -> Result<(), SessionError> {
        self.request(Request::Start)
    }

    /// Send `init` with a typed simulation config.
    pub fn send_init(&self, config: &SimulationConfig) -> Result<(), SessionError> {
        self.send_init_value(config.to_json())
    }

    /// Send `init` with a raw JSON config.
    ///
    /// `simulation.maxSteps` and `agents.initialPopulation` must be positive
    /// integers; otherwise nothing is sent and `InvalidConfiguration` is returned.
    /// Once the engine is initialized or an init is pending, the call is a
    /// logged no-op and the payload is not inspected.
    pub fn send_init_value(&self, config: Value) -> Result<(), SessionError> {
        let status = self.status();
        if status.initialized || status.pending_init {
            return self.request(Request::Init(config));
        }
        for pointer in ["/simulation/maxSteps", "/agents/initialPopulation"] {
            let ok = config
                .pointer(pointer)
                .and_then(Value::as_i64)
                .map(|v| v > 0)
                .unwrap_or(false);
            if !ok {
                let field = pointer.trim_start_matches('/').replace('/', ".");
                return self.reject(SessionError::InvalidConfiguration(format!(
                    "{field} must be a positive integer"
                )));
            }
        }
        self.request(Request::Init(config))
    }

    /// Advance the engine by `steps` ticks.
    pub fn send_step(&self, steps: u32) -> Result<(), SessionError> {
        if steps == 0 {
            return self.reject(SessionError::InvalidCommand(
                "step count must be positive".into(),
            ));
        }
        self.request(Request::Step(steps))
    }

    /// Ask for a snapshot. Ignored unless the session is initialized and running.
    pub fn request_snapshot(&self, kind: SnapshotKind) -> Result<(), SessionError> {
        self.request(Request::Snapshot(kind))
    }

    /// Query running/tick state. Socket transport only.
    pub fn request_state(&self) -> Result<(), SessionError> {
        self.request(Request::State)
    }

    /// Stop the engine and wait until the session reaches `Stopped`.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::Stop(tx))?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    /// Stop if needed, then end the actor.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::Shutdown(tx))?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    /// A receiver that sees every published status change.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Wait until the session reaches `state`, or the actor exits.
    pub async fn wait_for_state(&self, state: SessionState) -> Result<(), SessionError> {
        let mut rx = self.status.clone();
        rx.wait_for(|s| s.state == state)
            .await
            .map(|_| ())
            .map_err(|_| SessionError::SessionClosed)
    }
}
