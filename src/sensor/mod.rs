// Sensor module - accelerometer samples and their transport
//
// Samples are raw triaxial readings in milli-g as delivered by the driver.
// Batches travel from the sensor callback to the sampling loop through a
// lock-free pool, and the synthetic module produces deterministic motion
// waveforms for simulations and tests.

use serde::{Deserialize, Serialize};

pub mod batch_pool;
pub mod synthetic;

pub use batch_pool::{BatchPool, BatchPoolChannels, SampleBatch, SamplerChannels, SensorChannels};

/// One raw accelerometer reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Sample {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}
