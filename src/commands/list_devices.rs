//! List available audio capture devices.

use crate::source::device::{named_input_devices, suppress_stderr};
use cpal::traits::{DeviceTrait, HostTrait};

/// Prints every capture device with the index accepted by `--device`.
///
/// # Errors
/// - If the audio host cannot enumerate its devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let (default_name, devices) = suppress_stderr(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = named_input_devices(&host)?;
        Ok((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio capture devices found on this system.");
        return Ok(());
    }

    println!("Capture devices (use the ID or name with --device):");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if default_name.as_ref() == Some(&name) {
            " [DEFAULT]"
        } else {
            ""
        };
        let config = match device.default_input_config() {
            Ok(config) => format!("{}Hz, {} channels", config.sample_rate().0, config.channels()),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  {index:>2}  {name}{marker}");
        println!("      {config}");
    }

    Ok(())
}
