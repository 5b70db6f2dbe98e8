//! Fleet configuration: which repositories make up the fleet, and how long fetched data stays fresh.

mod config;
mod tool;

pub use config::{Config, DEFAULT_CONFIG_TOML, TelemetryConfig};
pub use tool::{ArchivedToolConfig, ToolConfig, ToolKind};
