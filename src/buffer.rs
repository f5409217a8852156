//! Bounded, thread-safe sample buffer.
//!
//! Sits between the sensor intake and the upload queue. When an add would
//! exceed the capacity, the oldest samples are dropped first, so a reader
//! always observes the most recent window of activity.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::Sample;

/// Upper bound on buffered samples between flushes.
pub const MAX_BUFFER: usize = 10_000;

pub struct SampleBuffer {
    samples: Mutex<VecDeque<Sample>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Appends a sample, evicting from the front while over capacity.
    pub fn add(&self, sample: Sample) {
        let mut samples = self.lock();
        samples.push_back(sample);
        while samples.len() > self.capacity {
            samples.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Takes the whole contents, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Sample> {
        let mut samples = self.lock();
        samples.drain(..).collect()
    }

    /// Discards all contents without observing them.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_not_empty(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Samples lost to overflow since construction.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Sample>> {
        match self.samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
