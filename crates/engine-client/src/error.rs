use std::fmt;

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The executable could not be spawned or the address is malformed.
    #[error("target unreachable: {0}")]
    TargetUnreachable(String),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport closed")]
    Closed,
}

/// Errors returned synchronously from [`EngineSession`](crate::EngineSession) calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The session actor has exited.
    #[error("session closed")]
    SessionClosed,
}

/// Classification carried on [`SessionEvent::Error`](crate::SessionEvent::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TargetUnreachable,
    StartupTimeout,
    ProtocolError,
    BufferOverflow,
    InvalidCommand,
    InvalidConfiguration,
    RemoteError,
    ConnectionLost,
    ConnectionFailed,
    ProcessCrashed,
    ProcessExitedNonZero,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TargetUnreachable => "target_unreachable",
            ErrorKind::StartupTimeout => "startup_timeout",
            ErrorKind::ProtocolError => "protocol_error",
            ErrorKind::BufferOverflow => "buffer_overflow",
            ErrorKind::InvalidCommand => "invalid_command",
            ErrorKind::InvalidConfiguration => "invalid_configuration",
            ErrorKind::RemoteError => "remote_error",
            ErrorKind::ConnectionLost => "connection_lost",
            ErrorKind::ConnectionFailed => "connection_failed",
            ErrorKind::ProcessCrashed => "process_crashed",
            ErrorKind::ProcessExitedNonZero => "process_exited_non_zero",
        }
    }

    /// Whether this kind moves the session into the `Error` state.
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            ErrorKind::ProtocolError
                | ErrorKind::BufferOverflow
                | ErrorKind::InvalidCommand
                | ErrorKind::InvalidConfiguration
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionError> for ErrorKind {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::InvalidCommand(_) | SessionError::SessionClosed => ErrorKind::InvalidCommand,
            SessionError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }
}
