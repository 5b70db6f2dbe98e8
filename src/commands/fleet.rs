use super::common::{Common, CommonArgs};
use camino::Utf8PathBuf;
use chrono::Local;
use clap::Parser;
use fleetmon::Result;
use fleetmon::config::Config;
use fleetmon::facts::hosting::{Provider, RetryPolicy};
use fleetmon::facts::{FleetCollector, FleetSnapshot};
use fleetmon::reports::{ColorMode, generate_console_fleet, generate_json};

#[derive(Parser, Debug)]
pub struct FleetArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Snapshot file whose tool data takes precedence over live queries
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<Utf8PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn process_fleet(args: &FleetArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let snapshot = args.snapshot.as_deref().map(FleetSnapshot::load).transpose()?;
    let collector = FleetCollector::new(common.provider(RetryPolicy::none())?);

    let fleet = collect_fleet(&collector, &common.config, snapshot.as_ref()).await?;
    print!("{}", render_fleet(&fleet, args.json, common.color)?);
    Ok(())
}

pub async fn collect_fleet(collector: &FleetCollector<Provider>, config: &Config, snapshot: Option<&FleetSnapshot>) -> Result<FleetSnapshot> {
    collector.collect(config, snapshot, &Local::now()).await
}

pub fn render_fleet(fleet: &FleetSnapshot, json: bool, color: ColorMode) -> Result<String> {
    let mut output = String::new();
    if json {
        generate_json(fleet, &mut output)?;
    } else {
        generate_console_fleet(fleet, color, &mut output)?;
    }
    Ok(output)
}
