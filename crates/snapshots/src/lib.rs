//! Bounded in-memory history of simulation snapshots.
//!
//! A [`SnapshotBuffer`] keeps the newest `capacity` snapshots in a fixed slot
//! array, optionally keeping only every Nth write, and can pull a numeric
//! time series out of the stored payloads by dot path for charting.

mod buffer;
mod series;

pub use buffer::{BufferListener, SnapshotBuffer, SnapshotEntry, DEFAULT_CAPACITY};
pub use series::{extract_value, SeriesPoint};
