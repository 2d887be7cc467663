use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `(sequence, value)` sample of an extracted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub sequence: i64,
    pub value: f64,
}

/// Resolve a dot path (`"metrics.population"`) inside `payload` as a number.
///
/// Missing keys, traversal through a non-object, and non-numeric leaves all
/// read as `0.0`. String leaves are parsed as floats.
pub fn extract_value(payload: &Value, path: &str) -> f64 {
    let mut current = payload;
    for part in path.split('.') {
        match current.as_object().and_then(|obj| obj.get(part)) {
            Some(next) => current = next,
            None => return 0.0,
        }
    }

    match current {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
