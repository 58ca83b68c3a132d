//! Command-line parsing and command routing.

use crate::commands;
use crate::config::SourceOverrides;
use crate::logging;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

/// Terminal oscilloscope for a live audio amplitude stream
#[derive(Parser)]
#[command(name = "levelscope")]
#[command(version)]
#[command(
    long_about = "Terminal oscilloscope for a live audio amplitude stream.\n\nDraws a scrolling ASCII waveform of samples read from a capture device or from the\nshared-memory region published by the capture service. Press q, Escape or Ctrl+C to quit.\n\nEXAMPLES:\n    # Capture from the default device at 16 kHz\n    $ levelscope\n\n    # Capture from a specific device at 48 kHz\n    $ levelscope --device hw:1,0 --rate 48000\n\n    # Watch the capture service's shared memory, keeping every 10th value\n    $ levelscope --memory --memory-rate 10"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/levelscope/levelscope.toml\n    Logs:               ~/.local/state/levelscope/levelscope.log.*"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Sample source selection, shared by the default action and `monitor`.
#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// Read samples from the capture service's shared memory instead of a device
    #[arg(long)]
    memory: bool,

    /// Keep every Nth value of each shared-memory snapshot [default: 50]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    memory_rate: Option<u64>,

    /// Capture device: "default", an ID from `list-devices`, or a device name [default: default]
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Capture sample rate in Hz [default: 16000]
    #[arg(long, value_name = "HZ", value_parser = clap::value_parser!(u32).range(1..))]
    rate: Option<u32>,
}

impl From<SourceArgs> for SourceOverrides {
    fn from(args: SourceArgs) -> Self {
        Self {
            memory: args.memory,
            memory_stride: args.memory_rate.map(|n| n as usize),
            device: args.device,
            sample_rate: args.rate,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live waveform (default)
    #[command(visible_alias = "m")]
    Monitor(SourceArgs),

    /// List available audio capture devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show the last 50 lines of the most recent log file
    Logs,

    /// Generate shell completion script
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parses the command line and runs the selected command.
///
/// # Errors
/// - If logging initialization fails
/// - If the selected command fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "levelscope", &mut io::stdout());
            Ok(())
        }
        Some(Commands::ListDevices) => commands::handle_list_devices(),
        Some(Commands::Logs) => commands::handle_logs(),
        Some(Commands::Monitor(args)) => {
            logging::init_logging()?;
            commands::handle_monitor(args.into())
        }
        None => {
            logging::init_logging()?;
            commands::handle_monitor(cli.source.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_action_flags() {
        let cli = Cli::try_parse_from(["levelscope", "--memory", "--memory-rate", "3"]).unwrap();
        assert!(cli.command.is_none());

        let overrides: SourceOverrides = cli.source.into();
        assert!(overrides.memory);
        assert_eq!(overrides.memory_stride, Some(3));
        assert_eq!(overrides.device, None);
        assert_eq!(overrides.sample_rate, None);
    }

    #[test]
    fn test_monitor_subcommand_flags() {
        let cli =
            Cli::try_parse_from(["levelscope", "monitor", "--device", "hw:1", "--rate", "8000"])
                .unwrap();
        let Some(Commands::Monitor(args)) = cli.command else {
            panic!("expected monitor command");
        };
        let overrides: SourceOverrides = args.into();
        assert!(!overrides.memory);
        assert_eq!(overrides.device.as_deref(), Some("hw:1"));
        assert_eq!(overrides.sample_rate, Some(8000));
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(Cli::try_parse_from(["levelscope", "--memory-rate", "0"]).is_err());
    }
}
