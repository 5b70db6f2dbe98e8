//! Report generation for fleet and telemetry data
//!
//! Two generators are provided: a console renderer with optional ANSI colors, and a JSON
//! writer for machine consumption. Both write into any `core::fmt::Write` sink so callers
//! decide where the output goes.

mod console;
mod json;

use clap::ValueEnum;

pub use console::{generate_fleet as generate_console_fleet, generate_telemetry as generate_console_telemetry};
pub use json::generate as generate_json;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    #[default]
    Auto,
}
