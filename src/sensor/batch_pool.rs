// BatchPool - lock-free sample batch pool with dual SPSC queues
//
// Moves accelerometer batches from the sensor callback to the sampling loop
// without allocating after start-up. Two rtrb ring buffers carry the
// batches around:
// - DATA_QUEUE: sensor side pushes filled batches, sampler consumes
// - POOL_QUEUE: sampler returns drained batches, sensor side recycles
//
// When the sampler falls behind and no empty batch is available, the sensor
// side drops the incoming batch and counts it instead of blocking.

use rtrb::{Consumer, Producer};

use super::Sample;

/// Batches kept in flight by default
pub const DEFAULT_BATCH_COUNT: usize = 8;

/// Samples per batch delivered by the driver at 10 Hz
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Sensor batch type - pre-allocated vector of samples
pub type SampleBatch = Vec<Sample>;

/// All four queue endpoints, before they are handed to their threads
pub struct BatchPoolChannels {
    /// Producer for sending filled batches to the sampler
    pub data_producer: Producer<SampleBatch>,
    /// Consumer for receiving filled batches in the sampler
    pub data_consumer: Consumer<SampleBatch>,
    /// Producer for returning drained batches from the sampler
    pub pool_producer: Producer<SampleBatch>,
    /// Consumer for retrieving empty batches on the sensor side
    pub pool_consumer: Consumer<SampleBatch>,
}

impl BatchPoolChannels {
    /// Split into the sensor-side and sampler-side halves
    pub fn split(self) -> (SensorChannels, SamplerChannels) {
        (
            SensorChannels {
                data_producer: self.data_producer,
                pool_consumer: self.pool_consumer,
                dropped_batches: 0,
            },
            SamplerChannels {
                data_consumer: self.data_consumer,
                pool_producer: self.pool_producer,
            },
        )
    }
}

/// Sensor-side endpoints
pub struct SensorChannels {
    data_producer: Producer<SampleBatch>,
    pool_consumer: Consumer<SampleBatch>,
    dropped_batches: u64,
}

impl SensorChannels {
    /// Copy `samples` into a recycled batch and queue it for the sampler
    ///
    /// # Returns
    /// `true` if the batch was queued, `false` if it was dropped because the
    /// pool is exhausted
    pub fn submit(&mut self, samples: &[Sample]) -> bool {
        let mut batch = match self.pool_consumer.pop() {
            Ok(batch) => batch,
            Err(_) => {
                self.dropped_batches += 1;
                log::warn!(
                    "[BatchPool] No free batch, dropped {} samples (total dropped: {})",
                    samples.len(),
                    self.dropped_batches
                );
                return false;
            }
        };

        batch.clear();
        batch.extend_from_slice(samples);

        match self.data_producer.push(batch) {
            Ok(()) => true,
            Err(_) => {
                self.dropped_batches += 1;
                false
            }
        }
    }

    /// Whether the next `submit` has a recycled batch to fill
    pub fn has_free_batch(&self) -> bool {
        !self.pool_consumer.is_empty()
    }

    /// Batches dropped since start-up
    pub fn dropped_batches(&self) -> u64 {
        self.dropped_batches
    }
}

/// Sampler-side endpoints
pub struct SamplerChannels {
    data_consumer: Consumer<SampleBatch>,
    pool_producer: Producer<SampleBatch>,
}

impl SamplerChannels {
    /// Next filled batch, if any
    pub fn next_batch(&mut self) -> Option<SampleBatch> {
        self.data_consumer.pop().ok()
    }

    /// Hand a drained batch back to the sensor side
    pub fn recycle(&mut self, batch: SampleBatch) {
        if self.pool_producer.push(batch).is_err() {
            log::debug!("[BatchPool] Pool queue full, releasing batch");
        }
    }
}

/// Lock-free batch pool using dual SPSC ring buffers
///
/// # Example
/// ```ignore
/// let (mut sensor, mut sampler) = BatchPool::new(8, 10).split();
///
/// // In the sensor callback:
/// sensor.submit(&samples);
///
/// // In the sampling loop:
/// if let Some(batch) = sampler.next_batch() {
///     // Process batch
///     sampler.recycle(batch);
/// }
/// ```
pub struct BatchPool;

impl BatchPool {
    /// Create a new BatchPool with pre-allocated batches
    ///
    /// # Arguments
    /// * `batch_count` - Number of batches to pre-allocate
    /// * `batch_size` - Sample capacity of each batch
    ///
    /// # Panics
    /// Panics if batch_count is 0 or batch_size is 0
    #[allow(clippy::new_ret_no_self)]
    pub fn new(batch_count: usize, batch_size: usize) -> BatchPoolChannels {
        assert!(batch_count > 0, "batch_count must be greater than 0");
        assert!(batch_size > 0, "batch_size must be greater than 0");

        let (mut pool_producer, pool_consumer) = rtrb::RingBuffer::new(batch_count);
        let (data_producer, data_consumer) = rtrb::RingBuffer::new(batch_count);

        for _ in 0..batch_count {
            if pool_producer
                .push(Vec::with_capacity(batch_size))
                .is_err()
            {
                break;
            }
        }

        BatchPoolChannels {
            data_producer,
            data_consumer,
            pool_producer,
            pool_consumer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_pool_creation() {
        let mut channels = BatchPool::new(DEFAULT_BATCH_COUNT, DEFAULT_BATCH_SIZE);

        let mut available = 0;
        while let Ok(batch) = channels.pool_consumer.pop() {
            assert!(batch.capacity() >= DEFAULT_BATCH_SIZE);
            available += 1;
        }
        assert_eq!(available, DEFAULT_BATCH_COUNT);
        assert!(channels.data_consumer.pop().is_err());
    }

    #[test]
    fn test_batch_circulation() {
        let (mut sensor, mut sampler) = BatchPool::new(2, 10).split();

        assert!(sensor.submit(&[Sample::new(1, 2, 3), Sample::new(4, 5, 6)]));
        let batch = sampler.next_batch().expect("queued batch");
        assert_eq!(batch, vec![Sample::new(1, 2, 3), Sample::new(4, 5, 6)]);
        sampler.recycle(batch);

        assert!(sensor.submit(&[Sample::new(7, 8, 9)]));
        let batch = sampler.next_batch().expect("queued batch");
        assert_eq!(batch, vec![Sample::new(7, 8, 9)]);
        assert!(sampler.next_batch().is_none());
    }

    #[test]
    fn test_exhausted_pool_drops_batches() {
        let (mut sensor, mut sampler) = BatchPool::new(2, 10).split();

        assert!(sensor.submit(&[Sample::new(0, 0, 1000)]));
        assert!(sensor.submit(&[Sample::new(0, 0, 1000)]));
        assert!(!sensor.has_free_batch());
        assert!(!sensor.submit(&[Sample::new(0, 0, 1000)]));
        assert_eq!(sensor.dropped_batches(), 1);

        let batch = sampler.next_batch().expect("queued batch");
        sampler.recycle(batch);
        assert!(sensor.has_free_batch());
        assert!(sensor.submit(&[Sample::new(0, 0, 1000)]));
    }

    #[test]
    fn test_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SensorChannels>();
        assert_send::<SamplerChannels>();
    }

    #[test]
    #[should_panic(expected = "batch_count must be greater than 0")]
    fn test_zero_batch_count_panics() {
        BatchPool::new(0, 10);
    }
}
