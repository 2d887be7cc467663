//! Engine transports.
//!
//! A transport moves encoded frames to the engine and reports what comes back
//! as [`TransportEvent`]s on the channel handed to [`Transport::open`]. It owns
//! the OS resource (child process or socket); the session owns everything else.
//! - **Process**: spawn the sidecar, line-delimited JSON over stdin/stdout.
//! - **Socket**: persistent WebSocket to an engine server.

mod process;
mod socket;

pub use process::ProcessTransport;
pub use socket::SocketTransport;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Which wire format a transport speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Process,
    Socket,
}

impl From<eco_domain::config::EngineTransportKind> for TransportKind {
    fn from(kind: eco_domain::config::EngineTransportKind) -> Self {
        match kind {
            eco_domain::config::EngineTransportKind::Process => TransportKind::Process,
            eco_domain::config::EngineTransportKind::Socket => TransportKind::Socket,
        }
    }
}

/// What a transport observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The process started or the socket handshake completed.
    Ready,
    /// Raw stdout bytes (process). Not line-aligned.
    Data(Vec<u8>),
    /// One complete text message (socket).
    Message(String),
    /// One line of the child's stderr.
    Stderr(String),
    /// The socket closed or failed to connect.
    Closed { reason: String },
    /// The child exited. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32>, signaled: bool },
}

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

#[async_trait]
pub trait Transport: Send {
    fn kind(&self) -> TransportKind;

    /// Begin connecting. Returns once the attempt is underway; readiness is
    /// reported as [`TransportEvent::Ready`]. Fails fast with
    /// [`TransportError::TargetUnreachable`] when the target cannot even be tried.
    async fn open(&mut self, events: EventSender) -> Result<(), TransportError>;

    /// Write one encoded frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Release the connection, waiting at most about `grace` for a clean exit
    /// before forcing it.
    async fn close(&mut self, grace: Duration);
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    fn kind(&self) -> TransportKind {
        (**self).kind()
    }

    async fn open(&mut self, events: EventSender) -> Result<(), TransportError> {
        (**self).open(events).await
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        (**self).send(frame).await
    }

    async fn close(&mut self, grace: Duration) {
        (**self).close(grace).await
    }
}
