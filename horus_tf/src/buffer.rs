//! Circular buffer for time-based transform storage
//!
//! Provides bounded storage and retrieval of timestamped transforms
//! with interpolation between samples.

use crate::transform::Transform;

/// A fixed-capacity circular buffer
///
/// When full, the oldest element is overwritten.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    /// Ring buffer storage
    data: Vec<T>,
    /// Maximum capacity
    capacity: usize,
    /// Index of the oldest element once the buffer has wrapped
    head: usize,
}

impl<T: Clone> CircularBuffer<T> {
    /// Create a new circular buffer with the given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Push a new element, overwriting the oldest one if full
    pub fn push(&mut self, item: T) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }

    /// Get element at logical index (0 = oldest, len-1 = newest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.data.len() {
            return None;
        }
        self.data.get((self.head + index) % self.data.len())
    }

    pub fn oldest(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn newest(&self) -> Option<&T> {
        self.data.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate over elements from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.data.len()).filter_map(move |i| self.get(i))
    }

    /// Replace the contents with `items` (oldest first), keeping the newest ones if too many
    fn refill(&mut self, items: Vec<T>) {
        self.clear();
        let skip = items.len().saturating_sub(self.capacity);
        for item in items.into_iter().skip(skip) {
            self.push(item);
        }
    }
}

// Specialized implementation for timestamped transforms
impl CircularBuffer<(u64, Transform)> {
    /// Insert a sample keeping the buffer ordered by time
    ///
    /// A sample with an already buffered timestamp replaces the old one.
    pub fn insert(&mut self, timestamp: u64, transform: Transform) {
        match self.newest().map(|(ts, _)| *ts) {
            Some(newest) if timestamp < newest => {}
            Some(newest) if timestamp == newest => {
                let last = self.data.len() - 1;
                let index = (self.head + last) % self.data.len();
                self.data[index] = (timestamp, transform);
                return;
            }
            _ => {
                self.push((timestamp, transform));
                return;
            }
        }

        // Out-of-order sample
        let mut items: Vec<_> = self.iter().cloned().collect();
        match items.binary_search_by_key(&timestamp, |(ts, _)| *ts) {
            Ok(i) => items[i] = (timestamp, transform),
            Err(i) => items.insert(i, (timestamp, transform)),
        }
        self.refill(items);
    }

    /// Get the latest transform and its timestamp
    pub fn latest(&self) -> Option<(u64, Transform)> {
        self.newest().copied()
    }

    /// Get the time range covered by the buffer
    pub fn time_range(&self) -> Option<(u64, u64)> {
        Some((self.oldest()?.0, self.newest()?.0))
    }

    /// Check if a timestamp is within the buffer's time range
    pub fn contains_time(&self, timestamp: u64) -> bool {
        self.time_range()
            .map(|(oldest, newest)| timestamp >= oldest && timestamp <= newest)
            .unwrap_or(false)
    }

    /// Get the transform at `timestamp`, interpolating between samples
    ///
    /// Returns `None` outside the buffered range; no extrapolation is done.
    pub fn interpolate_at(&self, timestamp: u64) -> Option<Transform> {
        if !self.contains_time(timestamp) {
            return None;
        }

        let mut before: Option<&(u64, Transform)> = None;
        for sample in self.iter() {
            if sample.0 == timestamp {
                return Some(sample.1);
            }
            if sample.0 > timestamp {
                let b = before?;
                let t = (timestamp - b.0) as f64 / (sample.0 - b.0) as f64;
                return Some(b.1.interpolate(&sample.1, t));
            }
            before = Some(sample);
        }
        before.map(|(_, tf)| *tf)
    }

    /// Remove transforms older than the given timestamp, always keeping the newest one
    pub fn prune_before(&mut self, timestamp: u64) {
        let Some(newest) = self.latest() else {
            return;
        };
        if self.oldest().map(|(ts, _)| *ts >= timestamp).unwrap_or(true) {
            return;
        }

        let mut items: Vec<_> = self
            .iter()
            .filter(|(ts, _)| *ts >= timestamp)
            .cloned()
            .collect();
        if items.is_empty() {
            items.push(newest);
        }
        self.refill(items);
    }
}
