use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::series::{extract_value, SeriesPoint};

pub const DEFAULT_CAPACITY: usize = 1000;

/// A stored snapshot. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub sequence: i64,
    pub payload: Value,
}

/// Notifications from a [`SnapshotBuffer`].
///
/// Callbacks run on the writer's thread after the buffer lock is released,
/// so they may read the buffer back.
pub trait BufferListener: Send + Sync {
    fn on_entry_added(&self, _sequence: i64) {}
    /// An entry was stored while the buffer was full and the oldest was evicted.
    fn on_wraparound(&self) {}
    fn on_cleared(&self) {}
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ring state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Ring {
    slots: Vec<Option<SnapshotEntry>>,
    /// Next slot to write.
    head: usize,
    size: usize,
    downsample: usize,
    write_counter: u64,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            head: 0,
            size: 0,
            downsample: 1,
            write_counter: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot index of the `i`-th oldest entry.
    fn slot(&self, i: usize) -> usize {
        let cap = self.capacity();
        (self.head + cap - self.size + i) % cap
    }

    fn get(&self, i: usize) -> Option<&SnapshotEntry> {
        if i >= self.size {
            return None;
        }
        self.slots[self.slot(i)].as_ref()
    }

    fn iter(&self) -> impl Iterator<Item = &SnapshotEntry> + '_ {
        (0..self.size).filter_map(move |i| self.slots[self.slot(i)].as_ref())
    }

    /// Downsampling gate: the first write after a reset is kept, then every Nth.
    fn admit(&mut self) -> bool {
        let keep = self.write_counter % self.downsample as u64 == 0;
        self.write_counter += 1;
        keep
    }

    /// Store an entry; returns `true` if the oldest entry was evicted.
    fn push(&mut self, entry: SnapshotEntry) -> bool {
        let evicted = self.size == self.capacity();
        let head = self.head;
        self.slots[head] = Some(entry);
        self.head = (head + 1) % self.capacity();
        if !evicted {
            self.size += 1;
        }
        evicted
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SnapshotBuffer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fixed-capacity circular store of `(sequence, payload)` snapshots.
///
/// Safe to share behind an `Arc`: one writer (the engine session) and any
/// number of readers.
pub struct SnapshotBuffer {
    /// All ring state. Listeners live behind their own lock and are only
    /// called after this one is released.
    ring: Mutex<Ring>,
    listeners: RwLock<Vec<Arc<dyn BufferListener>>>,
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for SnapshotBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("SnapshotBuffer")
            .field("size", &ring.size)
            .field("capacity", &ring.capacity())
            .field("downsample", &ring.downsample)
            .finish()
    }
}

impl SnapshotBuffer {
    /// Create a buffer holding up to `capacity` entries (`0` falls back to the default).
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        Self {
            ring: Mutex::new(Ring::new(capacity)),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn BufferListener>) {
        self.listeners.write().push(listener);
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Resize, keeping the newest `min(size, capacity)` entries in order.
    /// A capacity below 1 is ignored.
    pub fn configure_capacity(&self, capacity: usize) {
        if capacity < 1 {
            return;
        }
        let mut ring = self.ring.lock();
        if capacity == ring.capacity() {
            return;
        }

        let keep = ring.size.min(capacity);
        let skip = ring.size - keep;
        let mut slots: Vec<Option<SnapshotEntry>> = ring.iter().skip(skip).cloned().map(Some).collect();
        slots.resize(capacity, None);

        ring.slots = slots;
        ring.size = keep;
        ring.head = keep % capacity;
        tracing::debug!(capacity, kept = keep, "snapshot buffer resized");
    }

    /// Keep only every `interval`-th write from now on. Values below 1 mean 1.
    /// Restarts the downsampling count; stored entries are untouched.
    pub fn configure_downsample(&self, interval: usize) {
        let mut ring = self.ring.lock();
        ring.downsample = interval.max(1);
        ring.write_counter = 0;
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    pub fn downsample_interval(&self) -> usize {
        self.ring.lock().downsample
    }

    pub fn size(&self) -> usize {
        self.ring.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().size == 0
    }

    pub fn is_full(&self) -> bool {
        let ring = self.ring.lock();
        ring.size == ring.capacity()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Store a snapshot unless downsampling skips it. Returns whether it was stored.
    pub fn write(&self, sequence: i64, payload: Value) -> bool {
        let evicted = {
            let mut ring = self.ring.lock();
            if !ring.admit() {
                return false;
            }
            ring.push(SnapshotEntry { sequence, payload })
        };

        let listeners = self.listeners.read().clone();
        for l in &listeners {
            l.on_entry_added(sequence);
            if evicted {
                l.on_wraparound();
            }
        }
        true
    }

    /// Store bare metrics as `{"step": sequence, "metrics": metrics}`.
    pub fn write_metrics(&self, sequence: i64, metrics: Value) -> bool {
        self.write(
            sequence,
            serde_json::json!({ "step": sequence, "metrics": metrics }),
        )
    }

    /// Drop every entry and restart the downsampling count.
    pub fn clear(&self) {
        {
            let mut ring = self.ring.lock();
            ring.slots.iter_mut().for_each(|s| *s = None);
            ring.head = 0;
            ring.size = 0;
            ring.write_counter = 0;
        }
        let listeners = self.listeners.read().clone();
        for l in &listeners {
            l.on_cleared();
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn read_latest(&self) -> Option<SnapshotEntry> {
        let ring = self.ring.lock();
        match ring.size {
            0 => None,
            n => ring.get(n - 1).cloned(),
        }
    }

    /// Entry at `index`, where 0 is the oldest retained entry.
    pub fn read_at(&self, index: usize) -> Option<SnapshotEntry> {
        self.ring.lock().get(index).cloned()
    }

    /// All retained entries, oldest first.
    pub fn read_all(&self) -> Vec<SnapshotEntry> {
        self.ring.lock().iter().cloned().collect()
    }

    /// Smallest and largest retained sequence, or `(-1, -1)` when empty.
    pub fn sequence_range(&self) -> (i64, i64) {
        let ring = self.ring.lock();
        ring.iter().fold(None, |acc: Option<(i64, i64)>, e| match acc {
            None => Some((e.sequence, e.sequence)),
            Some((lo, hi)) => Some((lo.min(e.sequence), hi.max(e.sequence))),
        })
        .unwrap_or((-1, -1))
    }

    /// Values at `path` for every entry with `from <= sequence <= to`, oldest first.
    pub fn extract_series(&self, path: &str, from: i64, to: i64) -> Vec<SeriesPoint> {
        let ring = self.ring.lock();
        ring.iter()
            .filter(|e| e.sequence >= from && e.sequence <= to)
            .map(|e| SeriesPoint {
                sequence: e.sequence,
                value: extract_value(&e.payload, path),
            })
            .collect()
    }
}
