//! The scrolling waveform display.
//!
//! Samples flow into a [`SlidingWindow`] sized to the terminal; a [`Renderer`] plots the
//! window onto a [`Surface`] at a bounded frame rate.

pub mod renderer;
pub mod surface;
pub mod window;

pub use renderer::Renderer;
pub use surface::{Surface, TerminalSurface};
pub use window::{capacity_for_width, SlidingWindow};
