//! Capture-device sample source.
//!
//! The device is opened with two interleaved 16-bit channels and a fixed period of 64
//! frames. The capture callback forwards each period's raw little-endian bytes into a
//! bounded channel, and [`DeviceSource::poll`] blocks on that channel for the next one.
//! Only the second channel of every 4-byte frame is decoded.

use super::SampleSource;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Frames per capture period.
pub const PERIOD_FRAMES: u32 = 64;
/// Interleaved channels requested from the device.
const CHANNELS: u16 = 2;
/// Bytes per interleaved frame.
const FRAME_BYTES: usize = 4;
/// Offset of the decoded sample inside a frame.
const SAMPLE_OFFSET: usize = 2;
/// Backoff after a read that produced no data.
const UNDERRUN_BACKOFF: Duration = Duration::from_millis(50);
/// Periods buffered between the capture callback and the monitor loop.
const PERIOD_QUEUE: usize = 64;

/// Blocking reader over a live capture stream.
pub struct DeviceSource {
    periods: Receiver<Vec<u8>>,
    /// Kept alive for as long as capture should run
    stream: Option<cpal::Stream>,
    underruns: u64,
    /// Periods the capture callback could not queue
    dropped: Arc<AtomicU64>,
}

impl DeviceSource {
    /// Opens the capture device and starts streaming.
    ///
    /// # Arguments
    /// * `device_name` - "default", an index from `levelscope list-devices`, or a device name
    /// * `sample_rate` - Capture rate in Hz
    ///
    /// # Errors
    /// - If the device cannot be found
    /// - If the device rejects 2 channels at `sample_rate` with 64-frame periods
    /// - If the stream cannot be started
    pub fn open(device_name: &str, sample_rate: u32) -> Result<Self> {
        let device = suppress_stderr(|| {
            let host = cpal::default_host();
            if device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device(&host, device_name)
            }
        })?;

        let resolved_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!(
            "Capture device: {} ({}Hz, {} frames per period)",
            resolved_name,
            sample_rate,
            PERIOD_FRAMES
        );

        let config = cpal::StreamConfig {
            channels: CHANNELS,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(PERIOD_FRAMES),
        };

        let (sender, periods) = mpsc::sync_channel(PERIOD_QUEUE);
        let dropped = Arc::new(AtomicU64::new(0));
        let callback_dropped = Arc::clone(&dropped);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    forward_period(&sender, data, &callback_dropped);
                },
                |err| {
                    tracing::error!("Capture stream error: {}", err);
                },
                None,
            )
            .map_err(|e| anyhow!("Failed to open capture device '{resolved_name}': {e}"))?;

        stream
            .play()
            .map_err(|e| anyhow!("Failed to start capture on '{resolved_name}': {e}"))?;
        tracing::debug!("Capture stream started");

        Ok(Self::from_periods(periods, Some(stream), dropped))
    }

    pub(crate) fn from_periods(
        periods: Receiver<Vec<u8>>,
        stream: Option<cpal::Stream>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            periods,
            stream,
            underruns: 0,
            dropped,
        }
    }

    /// Periods lost because the reader fell behind.
    pub fn dropped_periods(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Blocks for the next period. An empty buffer means nothing was read.
    fn read_period(&self) -> Vec<u8> {
        // A disconnected channel means the stream is gone; it is handled like any
        // other empty read so the loop keeps running.
        self.periods.recv().unwrap_or_default()
    }
}

impl SampleSource for DeviceSource {
    fn poll(&mut self) -> Vec<i16> {
        let bytes = self.read_period();
        if bytes.is_empty() {
            self.underruns += 1;
            tracing::debug!("Capture underrun #{}, backing off", self.underruns);
            std::thread::sleep(UNDERRUN_BACKOFF);
            return Vec::new();
        }
        decode_frames(&bytes)
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!(
                "Capture stream closed after {} underruns, {} dropped periods",
                self.underruns,
                self.dropped_periods()
            );
        }
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Serializes interleaved samples to little-endian bytes and hands them to the reader.
///
/// A full queue drops the period rather than blocking the audio thread; each drop is
/// counted in `dropped`.
fn forward_period(sender: &SyncSender<Vec<u8>>, data: &[i16], dropped: &AtomicU64) {
    let bytes: Vec<u8> = data.iter().flat_map(|s| s.to_le_bytes()).collect();
    if sender.try_send(bytes).is_err() {
        dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decodes one sample per 4-byte frame, skipping the first 2 bytes of each frame.
///
/// A trailing partial frame is ignored.
pub fn decode_frames(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(FRAME_BYTES)
        .map(|frame| i16::from_le_bytes([frame[SAMPLE_OFFSET], frame[SAMPLE_OFFSET + 1]]))
        .collect()
}

/// Input devices that report a name, in enumeration order.
///
/// These are the devices `list-devices` numbers, so an index refers to the same
/// device in both places.
///
/// # Errors
/// - If enumeration fails
pub fn named_input_devices(host: &cpal::Host) -> Result<Vec<cpal::Device>> {
    Ok(host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
        .filter(|device| device.name().is_ok())
        .collect())
}

/// Finds an input device by numeric index or exact name.
///
/// # Errors
/// - If enumeration fails
/// - If no device matches
pub fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    pick_device(named_input_devices(host)?, |d| d.name().ok(), device_spec)
}

/// Selects from `devices` by index among the named ones, or by exact name.
fn pick_device<D>(
    devices: Vec<D>,
    name_of: impl Fn(&D) -> Option<String>,
    device_spec: &str,
) -> Result<D> {
    let mut named = devices.into_iter().filter_map(|device| {
        let name = name_of(&device)?;
        Some((name, device))
    });

    if let Ok(index) = device_spec.parse::<usize>() {
        let named: Vec<_> = named.collect();
        let count = named.len();
        return named
            .into_iter()
            .nth(index)
            .map(|(_, device)| device)
            .ok_or_else(|| {
                anyhow!(
                    "Device index {} is out of range (0-{})",
                    index,
                    count.saturating_sub(1)
                )
            });
    }

    named
        .find(|(name, _)| name == device_spec)
        .map(|(_, device)| device)
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'levelscope list-devices' to see available devices."
            )
        })
}

/// Runs `f` with stderr pointed at /dev/null so ALSA chatter does not land on the screen.
#[cfg(target_os = "linux")]
pub fn suppress_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(saved) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub fn suppress_stderr<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
