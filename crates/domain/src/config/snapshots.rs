use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Snapshot retention
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotsConfig {
    /// Maximum number of snapshots kept in memory.
    #[serde(default = "d_capacity")]
    pub capacity: usize,
    /// Keep every Nth snapshot (1 = keep all).
    #[serde(default = "d_downsample")]
    pub downsample: usize,
}

impl Default for SnapshotsConfig {
    fn default() -> Self {
        Self {
            capacity: d_capacity(),
            downsample: d_downsample(),
        }
    }
}

fn d_capacity() -> usize {
    1000
}
fn d_downsample() -> usize {
    1
}
