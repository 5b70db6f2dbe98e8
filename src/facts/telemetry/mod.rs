//! Usage telemetry read from a Prometheus-compatible metrics backend.

mod client;
mod extract;
mod summary;

pub use client::{QueryKind, TelemetryClient, TelemetryCredentials};
pub use extract::{EditDecisions, extract_by_label, extract_edit_decisions, extract_scalar};
pub use summary::{CostUsage, LinesOfCode, TelemetrySummary, TokenUsage};
