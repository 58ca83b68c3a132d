//! Command handlers for levelscope.
//!
//! # Commands
//! - `monitor`: live waveform of the capture device or shared memory (default)
//! - `list_devices`: list available capture devices
//! - `logs`: display recent log entries

pub mod list_devices;
pub mod logs;
pub mod monitor;

pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use monitor::handle_monitor;
