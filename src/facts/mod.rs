//! Data collection for the tool fleet
//!
//! This module gathers everything the dashboard knows about the tools it tracks: weekly
//! commit activity and repository metadata from GitHub, plus usage telemetry from a
//! Prometheus-compatible metrics backend.
//!
//! # Implementation Model
//!
//! The [`ActivityAggregator`] turns a repository's commit list into a Monday-to-Friday
//! activity vector for the current week. The classifier derives coarse `Status` and `Trend`
//! labels from repository stats and commit volume. The [`FleetCollector`] runs both for every
//! configured tool concurrently.
//!
//! External services are reached through the [`CommitSource`] and [`StatsSource`] traits.
//! The GitHub-backed `hosting::Provider` implements both and memoises successful responses
//! in a [`TtlCache`] persisted to a JSON file. Each call is wrapped in a [`ProviderResult`],
//! which can be `Found`, `NotFound`, `RateLimited`, or `Error`; none of these ever abort a
//! fleet run.

pub mod activity;
pub mod cache;
pub mod classify;
mod collector;
pub mod hosting;
mod provider_result;
mod repo_spec;
mod snapshot;
mod sources;
pub mod telemetry;
mod tool_report;

pub use activity::{ActivityAggregator, CommitRecord, WeekActivity};
pub use cache::{CacheStore, FileStore, MemoryStore, TtlCache};
pub use classify::{Status, Trend};
pub use collector::FleetCollector;
pub use provider_result::ProviderResult;
pub use repo_spec::RepoSpec;
pub use snapshot::FleetSnapshot;
pub use sources::{CommitSource, StatsSource};
pub use tool_report::{ARCHIVED_STATUS, ArchivedReport, ToolReport};
