use super::common::{Common, CommonArgs};
use super::fleet::collect_fleet;
use camino::Utf8PathBuf;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::FleetCollector;
use fleetmon::facts::hosting::RetryPolicy;

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output snapshot file path
    #[arg(value_name = "PATH", default_value = "fleet-snapshot.json")]
    pub output: Utf8PathBuf,
}

/// Collect the whole fleet straight from GitHub and save it. Fresh results also refresh the cache.
pub async fn process_snapshot(args: &SnapshotArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let collector = FleetCollector::new(common.provider(RetryPolicy::batch())?.bypass_cache_reads());

    let fleet = collect_fleet(&collector, &common.config, None).await?;
    fleet.save(&args.output)?;

    println!("Wrote snapshot of {} tools and {} archived tools to {}", fleet.tool_fleet.len(), fleet.archived.len(), args.output);
    Ok(())
}
