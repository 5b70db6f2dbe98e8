mod activity;
mod cache;
mod common;
mod fleet;
mod init;
mod snapshot;
mod stats;
mod telemetry;
mod validate;
mod watch;

pub use activity::{ActivityArgs, process_activity};
pub use cache::{ClearCacheArgs, clear_cache};
pub use fleet::{FleetArgs, process_fleet};
pub use init::{InitArgs, init_config};
pub use snapshot::{SnapshotArgs, process_snapshot};
pub use stats::{StatsArgs, process_stats};
pub use telemetry::{TelemetryArgs, process_telemetry};
pub use validate::{ValidateArgs, validate_config};
pub use watch::{WatchArgs, process_watch};
