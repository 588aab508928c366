// SlidingWindow - fixed-capacity sample collector
//
// Batches are appended until the window is full. Samples that do not fit
// are dropped, never carried over. After a classification pass the window
// is drained according to the configured DrainPolicy.

use crate::config::DrainPolicy;
use crate::sensor::Sample;

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: Vec<Sample>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append as much of `batch` as fits
    ///
    /// # Returns
    /// Number of samples accepted
    pub fn extend(&mut self, batch: &[Sample]) -> usize {
        let room = self.capacity - self.samples.len();
        let accepted = batch.len().min(room);
        self.samples.extend_from_slice(&batch[..accepted]);
        accepted
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Prepare the window for the next pass
    pub fn drain(&mut self, policy: DrainPolicy) {
        match policy {
            DrainPolicy::FullReset => self.samples.clear(),
            DrainPolicy::HalfSlide => {
                let keep_from = self.samples.len().saturating_sub(self.capacity / 2);
                self.samples.drain(..keep_from);
            }
        }
    }
}
