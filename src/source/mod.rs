//! Amplitude sample sources.
//!
//! Two backends produce the same stream of `i16` amplitudes: a live capture device and a
//! shared-memory region written by another process. The monitor is written against
//! [`SampleSource`] only and never learns which backend it is reading.

pub mod device;
pub mod downsample;
pub mod memory;

pub use device::DeviceSource;
pub use downsample::Downsampler;
pub use memory::MemorySource;

use crate::config::{Backend, SourceConfig};
use std::time::Duration;

/// A backend that yields batches of amplitude samples.
pub trait SampleSource {
    /// Returns the next batch of samples. An empty batch is normal.
    fn poll(&mut self) -> Vec<i16>;

    /// Pause the monitor loop takes after each poll.
    fn idle_interval(&self) -> Duration {
        Duration::ZERO
    }

    /// Releases the underlying handle. Safe to call more than once.
    fn close(&mut self);
}

/// Opens the backend selected by `config`.
///
/// # Errors
/// - If the shared-memory region cannot be opened or mapped
/// - If the capture device cannot be found or its stream cannot be started
pub fn open(config: &SourceConfig) -> anyhow::Result<Box<dyn SampleSource>> {
    match config.backend {
        Backend::Memory => Ok(Box::new(MemorySource::open(&config.shm_name)?)),
        Backend::Device => Ok(Box::new(DeviceSource::open(
            &config.device,
            config.sample_rate,
        )?)),
    }
}
