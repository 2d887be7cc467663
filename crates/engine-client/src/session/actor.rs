use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use eco_protocol::{
    classify_event, classify_response, codec, decode_message, encode_message, encode_request,
    read_tick, Command, LineDecoder, Operation, ProtocolError, Signal, SnapshotKind,
};
use eco_snapshots::SnapshotBuffer;

use super::{EngineSession, Request, SessionSettings};
use crate::error::ErrorKind;
use crate::events::{SessionEvent, SessionState, SessionStatus};
use crate::reconnect::ReconnectState;
use crate::transport::{Transport, TransportEvent, TransportKind};

/// Spawn the actor task for `transport` and return its handle and event stream.
pub(crate) fn spawn_actor<T>(
    transport: T,
    settings: SessionSettings,
    buffer: Option<Arc<SnapshotBuffer>>,
) -> (EngineSession, mpsc::UnboundedReceiver<SessionEvent>)
where
    T: Transport + 'static,
{
    let id = Uuid::new_v4();
    let kind = transport.kind();
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(SessionStatus::default());

    let actor = Actor {
        transport,
        kind,
        settings,
        buffer,
        events: event_tx,
        status: status_tx,
        state: SessionState::Idle,
        current_tick: 0,
        initialized: false,
        pending_init: None,
        init_sent: false,
        planned_work_units: 0,
        steps_in_flight: 0,
        decoder: LineDecoder::new(),
        link: None,
        connected: false,
        outbox: VecDeque::new(),
        reconnect: ReconnectState::default(),
        startup_deadline: None,
        reconnect_at: None,
        next_ping: None,
    };

    let span = tracing::info_span!("engine_session", session_id = %id, transport = ?kind);
    tokio::spawn(actor.run(req_rx).instrument(span));

    (EngineSession::new(id, req_tx, status_rx), event_rx)
}

/// What woke the actor loop.
enum Wake {
    Request(Option<Request>),
    Transport(Option<TransportEvent>),
    StartupTimeout,
    Reconnect,
    Heartbeat,
}

struct Actor<T> {
    transport: T,
    kind: TransportKind,
    settings: SessionSettings,
    buffer: Option<Arc<SnapshotBuffer>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Sender<SessionStatus>,

    state: SessionState,
    current_tick: u64,
    initialized: bool,
    /// Most recent accepted init payload, until the engine acknowledges it.
    pending_init: Option<Value>,
    init_sent: bool,
    planned_work_units: i64,
    /// Step count of the outstanding `step`, for acks that omit `tick`.
    steps_in_flight: u32,
    decoder: LineDecoder,

    /// Events from the current transport connection. `None` once released.
    link: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    connected: bool,
    /// Socket frames held while disconnected, flushed FIFO on reconnect.
    outbox: VecDeque<String>,
    reconnect: ReconnectState,

    startup_deadline: Option<Instant>,
    reconnect_at: Option<Instant>,
    next_ping: Option<Instant>,
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn next_event(
    link: &mut Option<mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match link {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl<T: Transport> Actor<T> {
    async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request>) {
        tracing::debug!("session actor started");
        loop {
            let wake = tokio::select! {
                req = requests.recv() => Wake::Request(req),
                ev = next_event(&mut self.link) => Wake::Transport(ev),
                _ = sleep_opt(self.startup_deadline) => Wake::StartupTimeout,
                _ = sleep_opt(self.reconnect_at) => Wake::Reconnect,
                _ = sleep_opt(self.next_ping) => Wake::Heartbeat,
            };

            let keep_running = match wake {
                Wake::Request(Some(req)) => self.handle_request(req).await,
                Wake::Request(None) => {
                    tracing::debug!("all session handles dropped");
                    self.stop().await;
                    false
                }
                Wake::Transport(Some(ev)) => {
                    self.handle_transport(ev).await;
                    true
                }
                Wake::Transport(None) => {
                    self.link = None;
                    true
                }
                Wake::StartupTimeout => {
                    self.on_startup_timeout().await;
                    true
                }
                Wake::Reconnect => {
                    self.on_reconnect_due().await;
                    true
                }
                Wake::Heartbeat => {
                    self.on_heartbeat().await;
                    true
                }
            };

            self.publish();
            if !keep_running {
                break;
            }
        }
        tracing::debug!("session actor finished");
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Requests
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn handle_request(&mut self, req: Request) -> bool {
        match req {
            Request::Start => self.start().await,
            Request::Init(config) => self.init(config).await,
            Request::Step(steps) => self.step(steps).await,
            Request::Snapshot(kind) => self.snapshot(kind).await,
            Request::State => self.query_state().await,
            Request::Stop(done) => {
                self.stop().await;
                self.publish();
                let _ = done.send(());
            }
            Request::Rejected(err) => {
                self.emit(SessionEvent::error(ErrorKind::from(&err), err.to_string()));
            }
            Request::Shutdown(done) => {
                self.stop().await;
                self.publish();
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    async fn start(&mut self) {
        if self.state.is_live() {
            self.log(format!("start ignored: session is already {}", self.state));
            return;
        }

        self.current_tick = 0;
        self.decoder.clear();
        self.outbox.clear();
        self.initialized = false;
        self.init_sent = false;
        self.steps_in_flight = 0;
        self.reconnect.reset();

        let (tx, rx) = mpsc::unbounded_channel();
        match self.transport.open(tx).await {
            Ok(()) => {
                self.link = Some(rx);
                self.startup_deadline = Some(Instant::now() + self.settings.startup_timeout);
                self.set_state(SessionState::Starting);
                tracing::info!("engine session starting");
            }
            Err(e) => {
                let message = match e {
                    crate::error::TransportError::TargetUnreachable(_) => e.to_string(),
                    other => format!("target unreachable: {other}"),
                };
                tracing::warn!(error = %message, "engine could not be started");
                self.pending_init = None;
                self.set_state(SessionState::Error);
                self.emit(SessionEvent::error(ErrorKind::TargetUnreachable, message));
            }
        }
    }

    async fn init(&mut self, config: Value) {
        if self.initialized || self.pending_init.is_some() {
            self.log("init ignored: engine already initialized or init pending");
            return;
        }

        self.pending_init = Some(config.clone());
        let ready =
            self.state.is_active() || (self.state == SessionState::Starting && self.connected);
        if ready {
            self.init_sent = true;
            let cmd = Command::init(self.settings.provider.clone(), config);
            self.dispatch(cmd).await;
        } else {
            tracing::debug!(state = %self.state, "init retained until the transport is ready");
        }
    }

    async fn step(&mut self, steps: u32) {
        if !self.initialized || self.state != SessionState::Running {
            let reason = if self.initialized {
                format!("session is {}", self.state)
            } else {
                "engine is not initialized".to_string()
            };
            self.emit(SessionEvent::error(
                ErrorKind::InvalidCommand,
                format!("cannot step: {reason}"),
            ));
            return;
        }
        self.steps_in_flight = steps;
        self.set_state(SessionState::Stepping);
        self.dispatch(Command::step(steps)).await;
    }

    async fn snapshot(&mut self, kind: SnapshotKind) {
        if !self.initialized || !self.state.is_active() {
            tracing::debug!(state = %self.state, "snapshot request ignored");
            return;
        }
        self.dispatch(Command::snapshot(kind)).await;
    }

    async fn query_state(&mut self) {
        if self.kind != TransportKind::Socket {
            self.emit(SessionEvent::error(
                ErrorKind::InvalidCommand,
                "state query requires the socket transport",
            ));
            return;
        }
        if self.state.is_live() {
            self.dispatch(Command::state()).await;
        }
    }

    /// Ends in `Stopped` from any state except `Idle` and `Stopped`.
    async fn stop(&mut self) {
        if matches!(self.state, SessionState::Idle | SessionState::Stopped) {
            return;
        }
        tracing::info!(state = %self.state, "stopping engine session");

        self.clear_timers();
        let graceful = self.initialized && self.connected && self.link.is_some();
        self.set_state(SessionState::Stopping);

        if graceful {
            self.dispatch(Command::stop()).await;
            if let Some(link) = self.link.as_mut() {
                let waited = tokio::time::timeout(
                    self.settings.stop_grace,
                    wait_for_stop(link, &mut self.decoder, &self.events),
                )
                .await;
                if waited.is_err() {
                    tracing::debug!("no stop acknowledgement within grace period");
                }
            }
        }

        self.release_transport(self.settings.stop_grace).await;
        self.reset_engine_state();
        self.set_state(SessionState::Stopped);
        self.emit(SessionEvent::Stopped);
        tracing::info!("engine session stopped");
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Transport events
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn handle_transport(&mut self, ev: TransportEvent) {
        match ev {
            TransportEvent::Ready => self.on_ready().await,
            TransportEvent::Data(bytes) => {
                for frame in self.decoder.push(&bytes) {
                    match frame {
                        Ok(resp) => self.on_signal(classify_response(&resp)).await,
                        Err(e) => self.on_protocol_error(e),
                    }
                    if self.link.is_none() {
                        break;
                    }
                }
            }
            TransportEvent::Message(text) => match decode_message(&text) {
                Ok(event) => self.on_signal(classify_event(&event)).await,
                Err(e) => self.on_protocol_error(e),
            },
            TransportEvent::Stderr(line) => {
                tracing::debug!(line = %line, "engine stderr");
                self.emit(SessionEvent::Log(line));
            }
            TransportEvent::Closed { reason } => self.on_closed(reason).await,
            TransportEvent::Exited { code, signaled } => self.on_exited(code, signaled).await,
        }
    }

    async fn on_ready(&mut self) {
        self.connected = true;

        if self.kind == TransportKind::Socket {
            if self.reconnect.attempts > 0 {
                tracing::info!(attempts = self.reconnect.attempts, "reconnected to engine");
            }
            self.reconnect.reset();
            self.reconnect_at = None;
            self.next_ping = Some(Instant::now() + self.settings.reconnect.heartbeat_interval);
            self.emit(SessionEvent::Connected);
            self.flush_outbox().await;
        }

        if self.state == SessionState::Starting {
            match self.pending_init.clone() {
                Some(config) if !self.init_sent => {
                    self.init_sent = true;
                    let cmd = Command::init(self.settings.provider.clone(), config);
                    self.dispatch(cmd).await;
                }
                Some(_) => {}
                None => self.enter_running(),
            }
        }
    }

    async fn on_closed(&mut self, reason: String) {
        let was_connected = std::mem::replace(&mut self.connected, false);
        self.next_ping = None;
        if !self.state.is_live() {
            return;
        }
        tracing::warn!(reason = %reason, state = %self.state, "engine connection lost");

        if self.kind != TransportKind::Socket {
            self.fail(ErrorKind::ConnectionLost, format!("connection lost: {reason}"))
                .await;
            return;
        }

        if was_connected {
            self.emit(SessionEvent::Disconnected);
        }
        if self.reconnect.disabled_by_server || !self.settings.reconnect.enabled {
            self.fail(ErrorKind::ConnectionLost, format!("connection lost: {reason}"))
                .await;
            return;
        }

        match self.reconnect.next_attempt(&self.settings.reconnect) {
            Some((attempt, delay)) => {
                tracing::info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            None => {
                tracing::error!(
                    attempts = self.reconnect.attempts,
                    "reconnect attempts exhausted"
                );
                self.emit(SessionEvent::ConnectionFailed(reason.clone()));
                self.fail(
                    ErrorKind::ConnectionFailed,
                    format!("connection failed after {} attempts: {reason}", self.reconnect.attempts),
                )
                .await;
            }
        }
    }

    async fn on_exited(&mut self, code: Option<i32>, signaled: bool) {
        self.connected = false;
        if !self.state.is_live() {
            return;
        }

        match code {
            Some(0) if !signaled => {
                tracing::info!("engine process exited cleanly");
                self.clear_timers();
                self.release_transport(Duration::ZERO).await;
                self.reset_engine_state();
                self.set_state(SessionState::Stopped);
                self.emit(SessionEvent::Stopped);
            }
            Some(c) if !signaled => {
                self.fail(
                    ErrorKind::ProcessExitedNonZero,
                    format!("engine process exited with code {c}"),
                )
                .await;
            }
            _ => {
                self.fail(ErrorKind::ProcessCrashed, "engine process crashed")
                    .await;
            }
        }
    }

    fn on_protocol_error(&mut self, err: ProtocolError) {
        tracing::warn!(error = %err, "dropping undecodable engine output");
        let kind = match err {
            ProtocolError::BufferOverflow(_) => ErrorKind::BufferOverflow,
            _ => ErrorKind::ProtocolError,
        };
        self.emit(SessionEvent::error(kind, err.to_string()));
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Classified frames
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn on_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Ack { op, data } => {
                if self.state == SessionState::Starting {
                    if op == Some(Operation::Init) {
                        self.accept_init();
                    }
                    self.enter_running();
                    if matches!(op, Some(Operation::Init) | None) {
                        return;
                    }
                }
                match op {
                    Some(Operation::Init) => self.accept_init(),
                    Some(Operation::Step) => self.on_step_ack(&data),
                    Some(Operation::Snapshot) => self.on_snapshot(data),
                    Some(Operation::Stop) => self.on_remote_stop().await,
                    Some(Operation::State) => {
                        let running = data.get("running").and_then(Value::as_bool).unwrap_or(false);
                        self.on_state_update(running, read_tick(&data), None);
                    }
                    Some(Operation::Ping) => tracing::trace!("ping acknowledged"),
                    None => tracing::debug!("engine acknowledged"),
                }
            }
            Signal::Failure { message, stack } => {
                if let Some(stack) = stack {
                    tracing::debug!(stack = %stack, "engine error stack");
                }
                self.fail(ErrorKind::RemoteError, message).await;
            }
            Signal::StateUpdate {
                running,
                tick,
                snapshot,
            } => {
                if self.state == SessionState::Starting {
                    self.enter_running();
                }
                self.on_state_update(running, tick, snapshot);
            }
            Signal::Pong => {
                if self.state == SessionState::Starting {
                    self.enter_running();
                }
                tracing::trace!("received pong");
            }
            Signal::ServerShutdown { message } => {
                tracing::info!(message = %message, "engine server shutting down, reconnect disabled");
                self.reconnect.disabled_by_server = true;
                self.emit(SessionEvent::Log(format!("server shutdown: {message}")));
            }
            Signal::Unrecognized { name } => {
                self.log(format!("unrecognized operation: {name}"));
            }
        }
    }

    fn accept_init(&mut self) {
        self.initialized = true;
        self.init_sent = false;
        if let Some(config) = self.pending_init.take() {
            self.planned_work_units = config
                .pointer("/simulation/maxSteps")
                .and_then(Value::as_i64)
                .unwrap_or(0);
        }
        tracing::info!(planned = self.planned_work_units, "engine initialized");
    }

    fn on_step_ack(&mut self, data: &Value) {
        let steps = std::mem::take(&mut self.steps_in_flight) as u64;
        let tick = read_tick(data).unwrap_or(self.current_tick + steps);
        self.advance_tick(tick);
        if self.state == SessionState::Stepping {
            self.set_state(SessionState::Running);
        }
        self.emit(SessionEvent::Stepped {
            tick: self.current_tick,
        });
    }

    fn on_snapshot(&mut self, payload: Value) {
        let sequence = read_tick(&payload)
            .map(|t| t as i64)
            .or_else(|| payload.get("step").and_then(Value::as_i64))
            .unwrap_or(self.current_tick as i64);
        if let Some(buffer) = &self.buffer {
            buffer.write(sequence, payload.clone());
        }
        self.emit(SessionEvent::Snapshot(payload));
    }

    fn on_state_update(&mut self, running: bool, tick: Option<u64>, snapshot: Option<Value>) {
        if let Some(t) = tick {
            self.advance_tick(t);
        }
        self.emit(SessionEvent::StateUpdate {
            running,
            tick: self.current_tick,
        });
        if let Some(s) = snapshot {
            self.on_snapshot(s);
        }
    }

    /// The engine stopped without being asked.
    async fn on_remote_stop(&mut self) {
        tracing::info!("engine reported stop");
        self.clear_timers();
        self.release_transport(self.settings.stop_grace).await;
        self.reset_engine_state();
        self.set_state(SessionState::Stopped);
        self.emit(SessionEvent::Stopped);
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Timers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn on_startup_timeout(&mut self) {
        self.startup_deadline = None;
        if self.state == SessionState::Starting {
            tracing::warn!(
                timeout_ms = self.settings.startup_timeout.as_millis() as u64,
                "engine did not become ready in time"
            );
            self.fail(ErrorKind::StartupTimeout, "startup timeout").await;
        }
    }

    async fn on_reconnect_due(&mut self) {
        self.reconnect_at = None;
        if !self.state.is_live() {
            return;
        }
        tracing::info!(attempt = self.reconnect.attempts, "reconnecting to engine");
        let (tx, rx) = mpsc::unbounded_channel();
        match self.transport.open(tx).await {
            Ok(()) => self.link = Some(rx),
            Err(e) => self.on_closed(e.to_string()).await,
        }
    }

    async fn on_heartbeat(&mut self) {
        self.next_ping = None;
        if self.connected && self.kind == TransportKind::Socket {
            self.next_ping = Some(Instant::now() + self.settings.reconnect.heartbeat_interval);
            self.dispatch(Command::ping()).await;
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Helpers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Encode and send, or hold the frame while a socket is reconnecting.
    async fn dispatch(&mut self, cmd: Command) {
        let encoded = match self.kind {
            TransportKind::Process => encode_request(&cmd),
            TransportKind::Socket => encode_message(&cmd, codec::now_millis()),
        };
        let frame = match encoded {
            Ok(frame) => frame,
            Err(e) => {
                self.emit(SessionEvent::error(ErrorKind::ProtocolError, e.to_string()));
                return;
            }
        };

        if self.kind == TransportKind::Socket && !self.connected {
            if !cmd.is_ping() {
                tracing::debug!(op = %cmd.op, queued = self.outbox.len() + 1, "buffering while disconnected");
                self.outbox.push_back(frame);
            }
            return;
        }

        tracing::debug!(op = %cmd.op, "sending command");
        if let Err(e) = self.transport.send(frame.clone()).await {
            match self.kind {
                TransportKind::Socket => {
                    tracing::debug!(op = %cmd.op, error = %e, "send failed, buffering");
                    if !cmd.is_ping() {
                        self.outbox.push_back(frame);
                    }
                }
                TransportKind::Process => {
                    self.fail(
                        ErrorKind::ConnectionLost,
                        format!("failed to write to engine: {e}"),
                    )
                    .await;
                }
            }
        }
    }

    async fn flush_outbox(&mut self) {
        if !self.outbox.is_empty() {
            tracing::debug!(count = self.outbox.len(), "flushing buffered messages");
        }
        while let Some(frame) = self.outbox.pop_front() {
            if let Err(e) = self.transport.send(frame.clone()).await {
                tracing::debug!(error = %e, "flush interrupted");
                self.outbox.push_front(frame);
                break;
            }
        }
    }

    fn enter_running(&mut self) {
        self.startup_deadline = None;
        self.set_state(SessionState::Running);
        self.emit(SessionEvent::Started);
        tracing::info!("engine session running");
    }

    /// Move to `Error`, clear init bookkeeping and tear the transport down.
    async fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = %kind, message = %message, "engine session failed");
        self.clear_timers();
        self.reset_engine_state();
        self.set_state(SessionState::Error);
        self.emit(SessionEvent::error(kind, message));
        self.release_transport(Duration::ZERO).await;
    }

    fn clear_timers(&mut self) {
        self.startup_deadline = None;
        self.reconnect_at = None;
        self.next_ping = None;
    }

    fn reset_engine_state(&mut self) {
        self.initialized = false;
        self.pending_init = None;
        self.init_sent = false;
        self.steps_in_flight = 0;
        self.outbox.clear();
    }

    async fn release_transport(&mut self, grace: Duration) {
        self.link = None;
        self.connected = false;
        self.next_ping = None;
        self.transport.close(grace).await;
    }

    fn advance_tick(&mut self, tick: u64) {
        self.current_tick = self.current_tick.max(tick);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "state change");
            self.state = state;
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(message = %message, "session log");
        self.emit(SessionEvent::Log(message));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        let next = SessionStatus {
            state: self.state,
            current_tick: self.current_tick,
            initialized: self.initialized,
            pending_init: self.pending_init.is_some(),
            planned_work_units: self.planned_work_units,
            connected: self.connected,
        };
        self.status.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

/// Drain the link until the engine acknowledges `stop` or the connection ends.
async fn wait_for_stop(
    link: &mut mpsc::UnboundedReceiver<TransportEvent>,
    decoder: &mut LineDecoder,
    events: &mpsc::UnboundedSender<SessionEvent>,
) {
    let is_stop_ack = |s: &Signal| {
        matches!(
            s,
            Signal::Ack {
                op: Some(Operation::Stop),
                ..
            }
        )
    };

    while let Some(ev) = link.recv().await {
        match ev {
            TransportEvent::Data(bytes) => {
                let acked = decoder
                    .push(&bytes)
                    .into_iter()
                    .flatten()
                    .any(|resp| is_stop_ack(&classify_response(&resp)));
                if acked {
                    return;
                }
            }
            TransportEvent::Message(text) => {
                if let Ok(event) = decode_message(&text) {
                    if is_stop_ack(&classify_event(&event)) {
                        return;
                    }
                }
            }
            TransportEvent::Stderr(line) => {
                let _ = events.send(SessionEvent::Log(line));
            }
            TransportEvent::Closed { .. } | TransportEvent::Exited { .. } => return,
            TransportEvent::Ready => {}
        }
    }
}
