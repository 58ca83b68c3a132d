//! Configuration management for levelscope.
//!
//! An optional TOML file supplies defaults for the sample source. Command-line flags
//! override it, and the merged result is frozen into a [`SourceConfig`] before the
//! monitor starts.

pub mod file;
pub mod source;

pub use file::FileConfig;
pub use source::{Backend, SourceConfig, SourceOverrides};
