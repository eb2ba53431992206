//! The bounded per-metric sample ring exposed at `/metrics/data`
//!
//! Each named series is capped independently: past capacity, the oldest
//! half is dropped and the newest half retained.

use std::collections::HashMap;
use std::sync::Mutex;

/// Thread-safe, process-wide bounded sample store
#[derive(Debug)]
pub struct MetricRing {
    inner: Mutex<HashMap<String, Vec<f64>>>,
    max_capacity: usize,
}

impl MetricRing {
    /// Create a ring where each named series is capped at `max_capacity` samples
    pub fn new(max_capacity: usize) -> Self {
        Self { inner: Mutex::new(HashMap::new()), max_capacity: max_capacity.max(1) }
    }

    /// Append `value` to the named series, trimming to the newest half if
    /// the series has grown past capacity.
    pub fn report(&self, name: &str, value: f64) {
        let mut series = self.inner.lock().unwrap();
        let values = series.entry(name.to_string()).or_default();
        values.push(value);
        if values.len() > self.max_capacity {
            let keep = self.max_capacity.div_ceil(2);
            let drop_count = values.len() - keep;
            values.drain(0..drop_count);
        }
    }

    /// Return a snapshot of every series as it stands right now
    pub fn snapshot(&self) -> HashMap<String, Vec<f64>> {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_newest_half_on_overflow() {
        let ring = MetricRing::new(10);
        for v in 1..=15 {
            ring.report("latency", v as f64);
        }
        let snap = ring.snapshot();
        let series = &snap["latency"];
        assert!(series.len() <= 10);
        assert_eq!(*series.last().unwrap(), 15.0);
    }

    #[test]
    fn series_are_independent() {
        let ring = MetricRing::new(10);
        ring.report("round_trip", 1.0);
        ring.report("bandwidth", 2.0);
        let snap = ring.snapshot();
        assert_eq!(snap["round_trip"], vec![1.0]);
        assert_eq!(snap["bandwidth"], vec![2.0]);
    }

    #[test]
    fn snapshot_is_a_shallow_copy() {
        let ring = MetricRing::new(10);
        ring.report("x", 1.0);
        let mut snap = ring.snapshot();
        snap.get_mut("x").unwrap().push(99.0);
        assert_eq!(ring.snapshot()["x"], vec![1.0]);
    }
}
