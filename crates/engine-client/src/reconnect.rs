//! Reconnect and heartbeat policy for socket sessions.

use std::time::Duration;

use eco_domain::config::ReconnectConfig;

/// Controls how a socket session recovers from an unexpected disconnect.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Fixed wait before each reconnect attempt.
    pub delay: Duration,
    /// Attempts allowed after a drop before giving up. `0` means never retry.
    pub max_attempts: u32,
    /// Interval between pings while connected.
    pub heartbeat_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_secs(2),
            max_attempts: 5,
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(cfg: &ReconnectConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            delay: cfg.delay(),
            max_attempts: cfg.max_attempts,
            heartbeat_interval: cfg.heartbeat_interval(),
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Delay before attempt number `attempt` (1-based). Constant.
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }

    /// Whether `attempts` already made exhaust the policy.
    pub fn should_give_up(&self, attempts: u32) -> bool {
        !self.enabled || attempts >= self.max_attempts
    }
}

/// Per-session reconnect bookkeeping.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReconnectState {
    pub attempts: u32,
    /// Set by `server:shutdown`; sticks for the session's lifetime.
    pub disabled_by_server: bool,
}

impl ReconnectState {
    /// Decide what to do after a disconnect: `Some((attempt, delay))` to retry.
    pub fn next_attempt(&mut self, policy: &ReconnectPolicy) -> Option<(u32, Duration)> {
        if self.disabled_by_server || policy.should_give_up(self.attempts) {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, policy.delay_for_attempt(self.attempts)))
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
