use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, watch};

use super::{EventSender, Transport, TransportEvent, TransportKind};
use crate::error::TransportError;

/// How long to wait after SIGTERM before killing outright.
const TERM_WAIT: Duration = Duration::from_secs(1);

/// Stdout read size. Frames are reassembled by the session's line decoder.
const READ_CHUNK: usize = 8 * 1024;

/// Runs the engine sidecar as a child process.
///
/// Requests go to stdin one line each; stdout is forwarded raw as
/// [`TransportEvent::Data`], stderr line by line. A monitor task owns the
/// [`Child`] and reports [`TransportEvent::Exited`] once stdout is drained.
pub struct ProcessTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin: Option<ChildStdin>,
    pid: Option<u32>,
    kill_tx: Option<mpsc::Sender<()>>,
    exited: Option<watch::Receiver<bool>>,
}

impl ProcessTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            stdin: None,
            pid: None,
            kill_tx: None,
            exited: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn is_running(&self) -> bool {
        self.exited
            .as_ref()
            .map(|rx| !*rx.borrow())
            .unwrap_or(false)
    }

    /// Wait up to `limit` for the monitor to observe exit.
    async fn wait_exit(&mut self, limit: Duration) -> bool {
        let Some(rx) = self.exited.as_mut() else {
            return true;
        };
        let wait = async move {
            let _ = rx.wait_for(|done| *done).await;
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }

    #[cfg(unix)]
    fn terminate(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = self.pid {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                tracing::debug!(pid, error = %e, "SIGTERM failed");
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self) {}
}

#[async_trait]
impl Transport for ProcessTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Process
    }

    async fn open(&mut self, events: EventSender) -> Result<(), TransportError> {
        if self.is_running() {
            self.close(Duration::ZERO).await;
        }

        let mut cmd = tokio::process::Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::TargetUnreachable(format!("{}: {e}", self.command)))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "failed to capture child stdin",
            ))
        })?;

        self.pid = child.id();
        tracing::info!(command = %self.command, pid = ?self.pid, "engine process spawned");

        let (kill_tx, kill_rx) = mpsc::channel::<()>(1);
        let (exit_tx, exit_rx) = watch::channel(false);
        spawn_monitor(child, events.clone(), kill_rx, exit_tx);

        self.stdin = Some(stdin);
        self.kill_tx = Some(kill_tx);
        self.exited = Some(exit_rx);

        let _ = events.send(TransportEvent::Ready);
        Ok(())
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::NotConnected)?;
        stdin.write_all(frame.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Close stdin, wait `grace`, SIGTERM, wait a second, then kill.
    async fn close(&mut self, grace: Duration) {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!(error = %e, "error closing engine stdin");
            }
        }

        if self.exited.is_none() {
            return;
        }

        if !self.wait_exit(grace).await {
            tracing::debug!(pid = ?self.pid, "engine did not exit after stdin close, terminating");
            self.terminate();
            if !self.wait_exit(TERM_WAIT).await {
                tracing::warn!(pid = ?self.pid, "engine ignored SIGTERM, killing");
                if let Some(tx) = &self.kill_tx {
                    let _ = tx.try_send(());
                }
                self.wait_exit(TERM_WAIT).await;
            }
        }

        self.kill_tx = None;
        self.exited = None;
        self.pid = None;
    }
}

/// Background task owning the child: forwards output and reports the exit.
fn spawn_monitor(
    mut child: Child,
    events: EventSender,
    mut kill_rx: mpsc::Receiver<()>,
    exit_tx: watch::Sender<bool>,
) {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    tokio::spawn(async move {
        let out_events = events.clone();
        let stdout_task = tokio::spawn(async move {
            let Some(mut stdout) = stdout else { return };
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                match stdout.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if out_events.send(TransportEvent::Data(chunk[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "engine stdout read failed");
                        break;
                    }
                }
            }
        });

        let err_events = events.clone();
        let stderr_task = tokio::spawn(async move {
            let Some(stderr) = stderr else { return };
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if err_events.send(TransportEvent::Stderr(line)).is_err() {
                    break;
                }
            }
        });

        let result = tokio::select! {
            result = child.wait() => result,
            _ = kill_rx.recv() => {
                let _ = child.kill().await;
                child.wait().await
            }
        };

        // Deliver any remaining output before the exit notice.
        let _ = tokio::time::timeout(TERM_WAIT, stdout_task).await;
        let _ = tokio::time::timeout(TERM_WAIT, stderr_task).await;

        let (code, signaled) = match result {
            Ok(status) => (status.code(), status.code().is_none()),
            Err(e) => {
                tracing::warn!(error = %e, "error waiting for engine process");
                (None, true)
            }
        };
        tracing::info!(code = ?code, signaled, "engine process exited");

        let _ = exit_tx.send(true);
        let _ = events.send(TransportEvent::Exited { code, signaled });
    });
}
