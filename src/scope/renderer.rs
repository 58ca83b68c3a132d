//! Throttled ASCII waveform renderer.
//!
//! Each accepted frame plots the sliding window as vertical bars around a horizontal
//! baseline at the middle of the screen. Samples are scaled so full scale reaches the
//! edge of a band 10 rows inside the top and bottom of the viewport.

use super::surface::Surface;
use super::window::PLOT_MARGIN;
use std::time::{Duration, Instant};

/// Minimum time between two accepted frames (about 25 frames per second).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(40);

const BAR: char = '#';
const BASELINE: char = '-';
/// Left edge of the plot, before the first step.
const PLOT_LEFT: i32 = 10;
/// Columns advanced per sample.
const X_STEP: i32 = 1;

/// Vertical scale: rows per amplitude unit for a viewport `height` rows tall.
pub fn vertical_scale(height: u16) -> f64 {
    (f64::from(height) - f64::from(PLOT_MARGIN)) / 32768.0 / 2.0
}

/// Bar length in rows for `sample`, truncated toward zero.
pub fn bar_length(sample: i16, y_k: f64) -> i32 {
    (f64::from(sample.unsigned_abs()) * y_k) as i32
}

/// Renders the waveform and owns the state that persists between frames.
pub struct Renderer {
    source_label: String,
    last_draw: Option<Instant>,
    /// Signed sample with the largest magnitude seen by any accepted frame
    peak: i16,
}

impl Renderer {
    /// Creates a renderer. `source_label` is shown on the second header line.
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            last_draw: None,
            peak: 0,
        }
    }

    /// Running maximum shown in the footer.
    pub fn peak(&self) -> i16 {
        self.peak
    }

    /// Draws a frame unless the previous one was less than [`FRAME_INTERVAL`] ago.
    ///
    /// Returns whether a frame was drawn.
    ///
    /// # Errors
    /// - If the surface fails to submit the frame
    pub fn draw<S, I>(&mut self, samples: I, surface: &mut S) -> anyhow::Result<bool>
    where
        S: Surface + ?Sized,
        I: IntoIterator<Item = i16>,
    {
        self.draw_at(Instant::now(), samples, surface)
    }

    /// [`Renderer::draw`] with an explicit clock reading.
    pub fn draw_at<S, I>(
        &mut self,
        now: Instant,
        samples: I,
        surface: &mut S,
    ) -> anyhow::Result<bool>
    where
        S: Surface + ?Sized,
        I: IntoIterator<Item = i16>,
    {
        if let Some(last) = self.last_draw {
            if now.saturating_duration_since(last) < FRAME_INTERVAL {
                return Ok(false);
            }
        }
        self.last_draw = Some(now);

        let viewport = surface.size();
        let width = i32::from(viewport.width);
        let center_y = i32::from(viewport.height / 2);
        let y_k = vertical_scale(viewport.height);

        surface.clear();
        surface.put_str(
            1,
            1,
            &format!(
                "y_k={}, x_k={}, bounds={}x{}",
                y_k, X_STEP, viewport.width, viewport.height
            ),
        );
        surface.put_str(1, 2, &self.source_label);

        let mut x = PLOT_LEFT + X_STEP;
        for sample in samples {
            if sample.unsigned_abs() > self.peak.unsigned_abs() {
                self.peak = sample;
            }

            let length = bar_length(sample, y_k);
            if length > 0 {
                if sample < 0 {
                    surface.vline(x, center_y, BAR, length);
                } else {
                    surface.vline(x, center_y - length, BAR, length);
                }
            }
            x += X_STEP;
        }

        surface.hline(
            PLOT_LEFT + X_STEP,
            center_y,
            BASELINE,
            width - i32::from(PLOT_MARGIN),
        );
        surface.put_str(1, 3, &format!("max value {}", self.peak));
        surface.put_str(
            1,
            4,
            &format!("time {}", chrono::Local::now().format("%H:%M:%S%.3f")),
        );
        surface.refresh()?;

        Ok(true)
    }
}
