use super::common::{Common, CommonArgs};
use chrono::Local;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::ActivityAggregator;
use fleetmon::facts::activity::week_start;
use fleetmon::facts::hosting::RetryPolicy;
use fleetmon::reports::generate_json;

#[derive(Parser, Debug)]
pub struct ActivityArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Repository as `repo`, `owner/repo`, or a GitHub URL
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Print the activity vector as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub async fn process_activity(args: &ActivityArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let repo = common.config.repo_spec(&args.repo)?;
    let aggregator = ActivityAggregator::new(common.provider(RetryPolicy::none())?);

    let now = Local::now();
    let activity = aggregator.weekly_activity(&repo, &now).await;

    if args.json {
        let mut output = String::new();
        generate_json(&activity, &mut output)?;
        print!("{output}");
    } else {
        println!("{repo}, week of {}", week_start(&now).format("%Y-%m-%d"));
        println!("Mon Tue Wed Thu Fri");
        let days: Vec<_> = activity.to_string().chars().map(|glyph| format!(" {glyph} ")).collect();
        println!("{}", days.join(" "));
    }

    Ok(())
}
