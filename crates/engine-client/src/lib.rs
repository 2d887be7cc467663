//! `eco-engine-client` — drive a simulation engine and consume its results.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Control application                                        │
//! │                                                             │
//! │   let (session, events) = SessionBuilder::from_config(&cfg) │
//! │       .snapshot_buffer(buffer.clone())                      │
//! │       .spawn();                                             │
//! │   session.send_init(&cfg.simulation)?;                      │
//! │   session.start()?;                                         │
//! │   session.send_step(10)?;                                   │
//! │   session.stop().await?;                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Session flow
//!
//! 1. `start()` opens the transport (spawn sidecar or connect WebSocket)
//! 2. On ready: send the retained `init`, or go straight to `Running`
//! 3. Any successful frame while `Starting` promotes to `Running` (`Started`)
//! 4. `step` → `Stepping` → ack → `Running` + `Stepped { tick }`
//! 5. Snapshots are written to the attached buffer and emitted
//! 6. Socket only: ping every heartbeat interval; on drop, reconnect with a
//!    fixed delay up to `max_attempts`, buffering outbound frames meanwhile
//! 7. `stop()` asks the engine to stop, waits the grace period, then closes

pub mod builder;
pub mod error;
pub mod events;
pub mod observer;
pub mod reconnect;
pub mod session;
pub mod transport;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::SessionBuilder;
pub use error::{ErrorKind, SessionError, TransportError};
pub use events::{SessionEvent, SessionState, SessionStatus};
pub use observer::{dispatch_event, pump_events, SessionObserver};
pub use reconnect::ReconnectPolicy;
pub use session::{EngineSession, SessionSettings};
pub use transport::{ProcessTransport, SocketTransport, Transport, TransportEvent, TransportKind};

pub use eco_protocol::SnapshotKind;
