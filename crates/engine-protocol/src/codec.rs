//! Encoding of outgoing commands and framing of incoming data.

use serde_json::Value;

use crate::{Command, Operation, ProcessRequest, ProcessResponse, ProtocolError, SocketEvent, SocketMessage};

/// Upper bound on bytes buffered without a newline before the buffer is discarded.
pub const MAX_LINE_BUFFER_BYTES: usize = 1024 * 1024;

/// Longest slice of an offending line quoted in a `Malformed` error.
const PREVIEW_CHARS: usize = 120;

/// Encode a command as one newline-terminated line for the process transport.
pub fn encode_request(cmd: &Command) -> Result<String, ProtocolError> {
    let req = ProcessRequest {
        op: cmd.op.process_name().to_string(),
        data: cmd.data.clone(),
    };
    let mut line = serde_json::to_string(&req)?;
    line.push('\n');
    Ok(line)
}

/// Encode a command as a single socket text message stamped with `timestamp_ms`.
///
/// `init` is sent as `start` with the provider moved under `options` and
/// `autoRun` disabled, so the engine waits for explicit `step` commands.
pub fn encode_message(cmd: &Command, timestamp_ms: i64) -> Result<String, ProtocolError> {
    let data = match cmd.op {
        Operation::Init => Some(serde_json::json!({
            "config": cmd.data.get("config").cloned().unwrap_or(Value::Null),
            "options": { "provider": cmd.data.get("provider").cloned().unwrap_or(Value::Null) },
            "autoRun": false,
        })),
        Operation::Step | Operation::Snapshot => Some(cmd.data.clone()),
        Operation::Stop | Operation::Ping | Operation::State => None,
    };
    let msg = SocketMessage {
        kind: cmd.op.socket_name().to_string(),
        data,
        timestamp: timestamp_ms,
    };
    Ok(serde_json::to_string(&msg)?)
}

/// Current wall-clock time in milliseconds, for socket message timestamps.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Decode one socket text message.
pub fn decode_message(text: &str) -> Result<SocketEvent, ProtocolError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ProtocolError::Malformed(format!("{e}: {}", preview(text))))?;
    if !value.is_object() {
        return Err(ProtocolError::Malformed(format!(
            "expected a JSON object: {}",
            preview(text)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::Malformed(format!("{e}: {}", preview(text))))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Line framing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reassembles newline-delimited JSON from arbitrarily split byte chunks.
///
/// Every complete, non-blank line yields one item. A line that is not a JSON
/// object yields `Malformed` and decoding continues with the next line. If the
/// unterminated tail grows past the limit it is discarded with `BufferOverflow`.
#[derive(Debug)]
pub struct LineDecoder {
    buf: Vec<u8>,
    limit: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::with_limit(MAX_LINE_BUFFER_BYTES)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    /// Bytes currently held waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Feed a chunk and return every frame it completes, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ProcessResponse, ProtocolError>> {
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos;
            let line = self.buf[start..end].trim_ascii();
            if !line.is_empty() {
                out.push(parse_line(line));
            }
            start = end + 1;
        }
        self.buf.drain(..start);

        if self.buf.len() > self.limit {
            let dropped = self.buf.len();
            self.buf.clear();
            tracing::warn!(bytes = dropped, "line buffer overflow, discarding");
            out.push(Err(ProtocolError::BufferOverflow(dropped)));
        }

        out
    }
}

fn parse_line(line: &[u8]) -> Result<ProcessResponse, ProtocolError> {
    let text = String::from_utf8_lossy(line);
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| ProtocolError::Malformed(format!("{e}: {}", preview(&text))))?;
    if !value.is_object() {
        return Err(ProtocolError::Malformed(format!(
            "expected a JSON object: {}",
            preview(&text)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::Malformed(format!("{e}: {}", preview(&text))))
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}
