//! Builder for constructing an [`EngineSession`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use eco_domain::config::{EngineConfig, EngineTransportKind};
use eco_snapshots::SnapshotBuffer;

use crate::events::SessionEvent;
use crate::reconnect::ReconnectPolicy;
use crate::session::{spawn_actor, EngineSession, SessionSettings};
use crate::transport::{ProcessTransport, SocketTransport, Transport};

/// Fluent builder for [`EngineSession`].
///
/// # Example
///
/// ```rust,no_run
/// # use eco_engine_client::SessionBuilder;
/// # async fn demo() {
/// let (session, _events) = SessionBuilder::new()
///     .socket("ws://localhost:8765")
///     .provider("mesa")
///     .startup_timeout(std::time::Duration::from_secs(10))
///     .spawn();
/// session.start().unwrap();
/// # }
/// ```
pub struct SessionBuilder {
    settings: SessionSettings,
    target: Target,
    buffer: Option<Arc<SnapshotBuffer>>,
}

enum Target {
    Process {
        command: String,
        args: Vec<String>,
        env: Vec<(String, String)>,
    },
    Socket {
        url: String,
    },
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            settings: SessionSettings::default(),
            target: Target::Process {
                command: "node".into(),
                args: Vec::new(),
                env: Vec::new(),
            },
            buffer: None,
        }
    }

    /// Take transport, provider, timeouts and reconnect policy from config.
    pub fn from_config(config: &EngineConfig) -> Self {
        let target = match config.transport {
            EngineTransportKind::Process => Target::Process {
                command: config.command.clone(),
                args: config.args.clone(),
                env: config
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
            EngineTransportKind::Socket => Target::Socket {
                url: config.url.clone(),
            },
        };
        Self {
            settings: SessionSettings {
                provider: config.provider.clone(),
                startup_timeout: config.startup_timeout(),
                stop_grace: config.stop_grace(),
                reconnect: ReconnectPolicy::from(&config.reconnect),
            },
            target,
            buffer: None,
        }
    }

    // ── Target ───────────────────────────────────────────────────────

    /// Spawn `command args...` and speak line-delimited JSON over stdio.
    pub fn process(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.target = Target::Process {
            command: command.into(),
            args,
            env: Vec::new(),
        };
        self
    }

    /// Connect to an engine server at `url` (`ws://` or `wss://`).
    pub fn socket(mut self, url: impl Into<String>) -> Self {
        self.target = Target::Socket { url: url.into() };
        self
    }

    // ── Tunables ─────────────────────────────────────────────────────

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.settings.provider = provider.into();
        self
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.settings.startup_timeout = timeout;
        self
    }

    pub fn stop_grace(mut self, grace: Duration) -> Self {
        self.settings.stop_grace = grace;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.settings.reconnect = policy;
        self
    }

    /// Write every received snapshot into `buffer`.
    pub fn snapshot_buffer(mut self, buffer: Arc<SnapshotBuffer>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // ── Spawn ────────────────────────────────────────────────────────

    /// Spawn the session actor with the configured transport.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(self) -> (EngineSession, mpsc::UnboundedReceiver<SessionEvent>) {
        let Self {
            settings,
            target,
            buffer,
        } = self;
        match target {
            Target::Process { command, args, env } => {
                let transport = env
                    .into_iter()
                    .fold(ProcessTransport::new(command, args), |t, (k, v)| t.env(k, v));
                spawn_actor(transport, settings, buffer)
            }
            Target::Socket { url } => spawn_actor(SocketTransport::new(url), settings, buffer),
        }
    }

    /// Spawn the session actor over a caller-supplied transport.
    pub fn spawn_with<T>(self, transport: T) -> (EngineSession, mpsc::UnboundedReceiver<SessionEvent>)
    where
        T: Transport + 'static,
    {
        spawn_actor(transport, self.settings, self.buffer)
    }
}
