use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Transport kind for reaching the simulation engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineTransportKind {
    /// Spawn the engine sidecar and talk line-delimited JSON over stdio.
    #[default]
    Process,
    /// Connect to a running engine server over WebSocket.
    Socket,
}

/// How to reach and drive the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub transport: EngineTransportKind,

    /// Executable to spawn for the process transport (e.g. `"node"`).
    #[serde(default = "d_command")]
    pub command: String,

    /// Arguments passed to `command` (typically the sidecar script path).
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the spawned sidecar.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// WebSocket endpoint for the socket transport.
    #[serde(default = "d_url")]
    pub url: String,

    /// Engine provider sent with `init` (`mesa`, `agentsjl`, `mason`, `mock`, ...).
    #[serde(default = "d_provider")]
    pub provider: String,

    /// How long the session may sit in `Starting` before giving up.
    #[serde(default = "d_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// How long `stop()` waits for a graceful shutdown before escalating.
    #[serde(default = "d_stop_grace_ms")]
    pub stop_grace_ms: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transport: EngineTransportKind::default(),
            command: d_command(),
            args: Vec::new(),
            env: HashMap::new(),
            url: d_url(),
            provider: d_provider(),
            startup_timeout_ms: d_startup_timeout_ms(),
            stop_grace_ms: d_stop_grace_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Reconnect and heartbeat settings (socket transport only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "d_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "d_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: d_max_attempts(),
            delay_ms: d_delay_ms(),
            heartbeat_interval_ms: d_heartbeat_interval_ms(),
        }
    }
}

impl ReconnectConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

fn d_command() -> String {
    "node".into()
}
fn d_url() -> String {
    "ws://localhost:8765".into()
}
fn d_provider() -> String {
    "mesa".into()
}
fn d_startup_timeout_ms() -> u64 {
    5_000
}
fn d_stop_grace_ms() -> u64 {
    2_000
}
fn d_true() -> bool {
    true
}
fn d_max_attempts() -> u32 {
    5
}
fn d_delay_ms() -> u64 {
    2_000
}
fn d_heartbeat_interval_ms() -> u64 {
    5_000
}
