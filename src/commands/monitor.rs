//! Live amplitude monitor.
//!
//! Opens the configured sample source, takes over the terminal, and loops drawing the
//! waveform until interrupted by SIGINT/SIGTERM or a quit key (q, Escape, Ctrl+C).
//!
//! The first signal asks the loop to stop at its next check. A capture read can block
//! for as long as the device delivers nothing, so a second signal exits immediately
//! with status 1.

use crate::config::{FileConfig, SourceConfig, SourceOverrides};
use crate::scope::{capacity_for_width, Renderer, SlidingWindow, Surface, TerminalSurface};
use crate::source::{self, Downsampler, SampleSource};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runs the monitor until interrupted.
///
/// # Errors
/// - If the config file is malformed or the merged settings are invalid
/// - If the sample source cannot be opened
/// - If the terminal cannot be initialized or drawn to
pub fn handle_monitor(overrides: SourceOverrides) -> anyhow::Result<()> {
    tracing::info!("=== levelscope monitor started ===");

    let config = SourceConfig::resolve(&FileConfig::load()?, overrides)?;
    tracing::info!(
        "Configuration: backend={:?}, device={}, sample_rate={}Hz, stride={}, shm={}",
        config.backend,
        config.device,
        config.sample_rate,
        config.stride(),
        config.shm_name
    );

    // Opened before the terminal is taken over so a failure message stays readable.
    let mut source = source::open(&config).map_err(|e| {
        tracing::error!("Failed to open sample source: {e}");
        e
    })?;

    let interrupted = Arc::new(AtomicBool::new(false));
    register_interrupts(&interrupted)?;

    let mut surface = TerminalSurface::open()?;
    let viewport = surface.size();
    let mut window = SlidingWindow::filled(capacity_for_width(viewport.width));
    let mut renderer = Renderer::new(config.describe());
    let mut downsampler = Downsampler::new(config.stride());
    tracing::debug!(
        "Viewport {}x{}, window capacity {}",
        viewport.width,
        viewport.height,
        window.capacity()
    );

    let result = run(
        source.as_mut(),
        &mut window,
        &mut renderer,
        &mut surface,
        &mut downsampler,
        || Ok(interrupted.load(Ordering::Relaxed) || quit_requested()?),
    );

    source.close();
    if let Err(e) = surface.restore() {
        tracing::warn!("Failed to restore terminal: {e}");
    }

    match &result {
        Ok(()) => tracing::info!(
            "=== levelscope monitor exited (peak {}) ===",
            renderer.peak()
        ),
        Err(e) => tracing::error!("Monitor stopped: {e}"),
    }
    result
}

/// Sets `interrupted` on SIGINT/SIGTERM, and exits with status 1 on a signal that
/// arrives while it is already set.
fn register_interrupts(interrupted: &Arc<AtomicBool>) -> anyhow::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // Must come before the flag handler so the first signal only sets the flag.
        signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(interrupted))
            .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;
        signal_hook::flag::register(signal, Arc::clone(interrupted))
            .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;
    }
    Ok(())
}

/// Draw, poll, downsample into the window, idle; repeated until `should_stop` says so.
///
/// # Errors
/// - If drawing fails
/// - If `should_stop` fails
pub fn run<S, F>(
    source: &mut dyn SampleSource,
    window: &mut SlidingWindow,
    renderer: &mut Renderer,
    surface: &mut S,
    downsampler: &mut Downsampler,
    mut should_stop: F,
) -> anyhow::Result<()>
where
    S: Surface + ?Sized,
    F: FnMut() -> anyhow::Result<bool>,
{
    while !should_stop()? {
        renderer.draw(window.snapshot(), surface)?;

        for sample in downsampler.select(source.poll()) {
            window.push(sample);
        }

        let idle = source.idle_interval();
        if !idle.is_zero() {
            std::thread::sleep(idle);
        }
    }
    Ok(())
}

/// Drains pending terminal events; true if any was a quit key.
fn quit_requested() -> anyhow::Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    tracing::debug!("Quit key pressed");
                    return Ok(true);
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    tracing::debug!("Ctrl+C pressed");
                    return Ok(true);
                }
                _ => {}
            }
        }
    }
    Ok(false)
}
