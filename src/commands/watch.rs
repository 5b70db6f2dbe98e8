use super::common::{Common, CommonArgs};
use super::fleet::{collect_fleet, render_fleet};
use camino::Utf8PathBuf;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::hosting::RetryPolicy;
use fleetmon::facts::{FleetCollector, FleetSnapshot};
use tokio::time::{MissedTickBehavior, interval};

const LOG_TARGET: &str = "     watch";

#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Snapshot file whose tool data takes precedence over live queries
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<Utf8PathBuf>,

    /// Stop after this many refreshes [default: run until interrupted]
    #[arg(long, value_name = "COUNT")]
    pub count: Option<u64>,

    /// Print each report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Re-collect and print the fleet every refresh interval.
///
/// A refresh that outlasts the interval delays the next one; ticks missed meanwhile are skipped.
pub async fn process_watch(args: &WatchArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let snapshot = args.snapshot.as_deref().map(FleetSnapshot::load).transpose()?;
    let collector = FleetCollector::new(common.provider(RetryPolicy::none())?);

    let mut ticker = interval(common.config.refresh_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut runs = 0_u64;
    while args.count.is_none_or(|count| runs < count) {
        let _ = ticker.tick().await;
        runs += 1;

        log::info!(target: LOG_TARGET, "Refresh #{runs}");
        match collect_fleet(&collector, &common.config, snapshot.as_ref()).await {
            Ok(fleet) => print!("{}", render_fleet(&fleet, args.json, common.color)?),
            Err(e) => eprintln!("❌ Refresh failed: {e}"),
        }
    }

    Ok(())
}
