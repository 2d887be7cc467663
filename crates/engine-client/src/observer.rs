//! Callback-style consumption of session events.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ErrorKind;
use crate::events::{SessionEvent, SessionState};

/// Receives session events as method calls. Every method defaults to a no-op.
pub trait SessionObserver: Send {
    fn on_started(&mut self) {}
    fn on_stopped(&mut self) {}
    fn on_stepped(&mut self, _tick: u64) {}
    fn on_snapshot(&mut self, _payload: &Value) {}
    fn on_error(&mut self, _kind: ErrorKind, _message: &str) {}
    fn on_state_changed(&mut self, _state: SessionState) {}
    fn on_log(&mut self, _message: &str) {}
    fn on_connected(&mut self) {}
    fn on_disconnected(&mut self) {}
    fn on_connection_failed(&mut self, _reason: &str) {}
    fn on_state_update(&mut self, _running: bool, _tick: u64) {}
}

/// Route one event to the matching observer method.
pub fn dispatch_event<O: SessionObserver + ?Sized>(observer: &mut O, event: &SessionEvent) {
    match event {
        SessionEvent::Started => observer.on_started(),
        SessionEvent::Stopped => observer.on_stopped(),
        SessionEvent::Stepped { tick } => observer.on_stepped(*tick),
        SessionEvent::Snapshot(payload) => observer.on_snapshot(payload),
        SessionEvent::Error { kind, message } => observer.on_error(*kind, message),
        SessionEvent::StateChanged(state) => observer.on_state_changed(*state),
        SessionEvent::Log(message) => observer.on_log(message),
        SessionEvent::Connected => observer.on_connected(),
        SessionEvent::Disconnected => observer.on_disconnected(),
        SessionEvent::ConnectionFailed(reason) => observer.on_connection_failed(reason),
        SessionEvent::StateUpdate { running, tick } => observer.on_state_update(*running, *tick),
    }
}

/// Feed every event from `rx` to `observer` until the session's event stream ends.
pub async fn pump_events<O: SessionObserver + ?Sized>(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    observer: &mut O,
) {
    while let Some(event) = rx.recv().await {
        dispatch_event(observer, &event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SessionObserver for Recorder {
        fn on_started(&mut self) {
            self.calls.push("started".into());
        }
        fn on_stepped(&mut self, tick: u64) {
            self.calls.push(format!("stepped:{tick}"));
        }
        fn on_error(&mut self, kind: ErrorKind, message: &str) {
            self.calls.push(format!("error:{kind}:{message}"));
        }
        fn on_stopped(&mut self) {
            self.calls.push("stopped".into());
        }
    }

    #[tokio::test]
    async fn pump_routes_events_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(SessionEvent::Started).unwrap();
        tx.send(SessionEvent::Log("ignored".into())).unwrap();
        tx.send(SessionEvent::Stepped { tick: 3 }).unwrap();
        tx.send(SessionEvent::Error {
            kind: ErrorKind::RemoteError,
            message: "boom".into(),
        })
        .unwrap();
        tx.send(SessionEvent::Stopped).unwrap();
        drop(tx);

        let mut rec = Recorder::default();
        pump_events(rx, &mut rec).await;
        assert_eq!(
            rec.calls,
            vec!["started", "stepped:3", "error:remote_error:boom", "stopped"]
        );
    }
}
