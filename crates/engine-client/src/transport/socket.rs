use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::{EventSender, Transport, TransportEvent, TransportKind};
use crate::error::TransportError;

/// Persistent WebSocket connection to an engine server.
///
/// Each `open` spawns one connection task that connects, then shuttles
/// outbound frames to the sink and inbound text to the event channel until
/// either side closes. Reconnection is the session's decision; this type
/// only reports [`TransportEvent::Closed`].
pub struct SocketTransport {
    url: String,
    outbound: Option<mpsc::UnboundedSender<String>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outbound: None,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn shutdown_task(&mut self, grace: Duration) {
        self.cancel.cancel();
        self.outbound = None;
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                tracing::debug!(url = %self.url, "socket task did not finish in time, aborting");
                task.abort();
            }
        }
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    async fn open(&mut self, events: EventSender) -> Result<(), TransportError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(TransportError::TargetUnreachable(format!(
                "{}: expected a ws:// or wss:// address",
                self.url
            )));
        }
        let request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::TargetUnreachable(format!("{}: {e}", self.url)))?;

        self.shutdown_task(Duration::ZERO).await;

        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
        let cancel = CancellationToken::new();
        self.cancel = cancel.clone();
        self.outbound = Some(out_tx);

        let url = self.url.clone();
        self.task = Some(tokio::spawn(async move {
            tracing::info!(url = %url, "connecting to engine server");
            let reason = match tokio::select! {
                r = tokio_tungstenite::connect_async(request) => Some(r),
                _ = cancel.cancelled() => None,
            } {
                None => return,
                Some(Err(e)) => format!("connect failed: {e}"),
                Some(Ok((ws, _response))) => {
                    tracing::info!(url = %url, "connected to engine server");
                    if events.send(TransportEvent::Ready).is_err() {
                        return;
                    }
                    match run_connection(ws, out_rx, &events, &cancel).await {
                        Some(reason) => reason,
                        None => return,
                    }
                }
            };
            tracing::warn!(url = %url, reason = %reason, "engine connection closed");
            let _ = events.send(TransportEvent::Closed { reason });
        }));
        Ok(())
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let tx = self.outbound.as_ref().ok_or(TransportError::NotConnected)?;
        tx.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self, grace: Duration) {
        self.shutdown_task(grace).await;
    }
}

/// Pump one established connection. Returns the close reason, or `None`
/// when closed locally.
async fn run_connection<S>(
    ws: tokio_tungstenite::WebSocketStream<S>,
    mut out_rx: mpsc::UnboundedReceiver<String>,
    events: &EventSender,
    cancel: &CancellationToken,
) -> Option<String>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return None;
            }
            out = out_rx.recv() => {
                let Some(text) = out else {
                    let _ = sink.send(Message::Close(None)).await;
                    return None;
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    return Some(format!("send failed: {e}"));
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Message(text)).is_err() {
                        return None;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    match String::from_utf8(bytes) {
                        Ok(text) => {
                            if events.send(TransportEvent::Message(text)).is_err() {
                                return None;
                            }
                        }
                        Err(_) => tracing::debug!("dropping non-UTF-8 binary frame"),
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    return Some(match frame {
                        Some(f) if !f.reason.is_empty() => format!("closed by server: {}", f.reason),
                        _ => "closed by server".to_string(),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Some(format!("read failed: {e}")),
                None => return Some("connection ended".to_string()),
            }
        }
    }
}
