//! A command-line monitor for a fleet of internal tools.
//!
//! # Overview
//!
//! `fleetmon` tracks a configured set of tools, each backed by a GitHub repository. For every
//! tool it shows which weekdays of the current week saw commits, a coarse status label
//! (`LIVE`, `BETA`, `MAINT`) derived from the last push, and a trend label (`UP`, `STABLE`,
//! `FLAT`, `DOWN`) derived from recent commit volume. It can also summarize usage telemetry
//! read from a Prometheus-compatible backend.
//!
//! # Quick Start
//!
//! ```bash
//! fleetmon init                 # write fleet.toml with the default fleet
//! export GITHUB_TOKEN=ghp_xxxx  # optional, raises the GitHub rate limit
//! fleetmon fleet
//! ```
//!
//! # Commands
//!
//! **Fleet report:**
//! ```bash
//! fleetmon fleet
//! fleetmon fleet --json
//! fleetmon fleet --snapshot fleet-snapshot.json   # prefer frozen data where available
//! ```
//!
//! **Single repository:**
//! ```bash
//! fleetmon activity SheetFreak
//! fleetmon stats acme/SheetFreak
//! ```
//!
//! **Batch refresh** (retries rate-limited requests with backoff):
//! ```bash
//! fleetmon snapshot fleet-snapshot.json
//! ```
//!
//! **Periodic refresh:**
//! ```bash
//! fleetmon watch              # every `refresh_interval` minutes
//! fleetmon watch --count 3
//! ```
//!
//! **Telemetry:**
//! ```bash
//! export GRAFANA_PROMETHEUS_URL=https://prometheus.example.net
//! export GRAFANA_INSTANCE_ID=123456
//! export GRAFANA_API_TOKEN=glc_xxxx
//! fleetmon telemetry
//! fleetmon telemetry --query 'sum(claude_code_session_count)'
//! fleetmon telemetry --query 'sum(claude_code_cost_usage)' --range --step 300
//! fleetmon telemetry --check
//! ```
//!
//! # Configuration
//!
//! Configuration is read from `fleet.toml`, `fleet.yml`, `fleet.yaml`, or `fleet.json` in the
//! current directory, or from the path given with `--config`.
//!
//! ```toml
//! owner = "acme"
//! hosting_cache_ttl = 30     # minutes
//! telemetry_cache_ttl = 60   # seconds
//! refresh_interval = 5       # minutes
//!
//! [[tools]]
//! name = "SHEETFREAK"
//! repo = "SheetFreak"
//! kind = "TOOL"
//! description = "CLI tool for programmatic Google Sheets control"
//! teams = ["Specialists", "Content"]
//!
//! [[archived]]
//! name = "TITLE_STRUCT"
//! repo = "titlestruct"
//! kind = "DASH"
//! archived_date = "2025-09-19"
//! ```
//!
//! # Caching
//!
//! GitHub and telemetry responses are cached in two JSON files under the platform cache
//! directory (or `--cache-dir`). Use `fleetmon clear-cache` to drop them.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use fleetmon::Result;

mod commands;

use crate::commands::{
    ActivityArgs, ClearCacheArgs, FleetArgs, InitArgs, SnapshotArgs, StatsArgs, TelemetryArgs, ValidateArgs, WatchArgs, clear_cache,
    init_config, process_activity, process_fleet, process_snapshot, process_stats, process_telemetry, process_watch, validate_config,
};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "fleetmon", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: FleetSubcommand,
}

#[derive(Subcommand, Debug)]
enum FleetSubcommand {
    /// Show activity, status, and trend for every configured tool
    Fleet(Box<FleetArgs>),
    /// Show this week's commit activity for one repository
    Activity(Box<ActivityArgs>),
    /// Show repository stats for one repository
    Stats(Box<StatsArgs>),
    /// Show usage telemetry or run a raw metrics query
    Telemetry(Box<TelemetryArgs>),
    /// Collect the fleet live from GitHub with retries and save it as a snapshot file
    Snapshot(Box<SnapshotArgs>),
    /// Refresh the fleet report periodically
    Watch(Box<WatchArgs>),
    /// Delete the cached API responses
    ClearCache(ClearCacheArgs),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match &Cli::parse().command {
        FleetSubcommand::Fleet(args) => process_fleet(args).await,
        FleetSubcommand::Activity(args) => process_activity(args).await,
        FleetSubcommand::Stats(args) => process_stats(args).await,
        FleetSubcommand::Telemetry(args) => process_telemetry(args).await,
        FleetSubcommand::Snapshot(args) => process_snapshot(args).await,
        FleetSubcommand::Watch(args) => process_watch(args).await,
        FleetSubcommand::ClearCache(args) => clear_cache(args),
        FleetSubcommand::Init(args) => init_config(args),
        FleetSubcommand::Validate(args) => validate_config(args),
    }
}
