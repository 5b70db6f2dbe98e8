use super::common::{Common, CommonArgs};
use chrono::Utc;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::telemetry::QueryKind;
use fleetmon::reports::{generate_console_telemetry, generate_json};
use ohno::bail;

#[derive(Parser, Debug)]
pub struct TelemetryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Run a single PromQL query and print the raw response
    #[arg(long, value_name = "PROMQL")]
    pub query: Option<String>,

    /// Run the query over a time range instead of at a single instant
    #[arg(long, requires = "query", conflicts_with = "time")]
    pub range: bool,

    /// Evaluation time of an instant query
    #[arg(long, value_name = "TIME", requires = "query")]
    pub time: Option<String>,

    /// Start of a range query [default: end of range minus the configured default range]
    #[arg(long, value_name = "TIME", requires = "range")]
    pub start: Option<String>,

    /// End of a range query [default: now]
    #[arg(long, value_name = "TIME", requires = "range")]
    pub end: Option<String>,

    /// Resolution of a range query [default: from configuration]
    #[arg(long, value_name = "STEP", requires = "range")]
    pub step: Option<String>,

    /// Only check whether the telemetry backend is reachable
    #[arg(long, conflicts_with = "query")]
    pub check: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn process_telemetry(args: &TelemetryArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let client = common.telemetry_client()?;
    let now = Utc::now();

    if args.check {
        if client.check_connection(now).await {
            println!("Telemetry backend is connected");
            return Ok(());
        }
        bail!("telemetry backend is not reachable");
    }

    if let Some(query) = &args.query {
        let kind = if args.range {
            QueryKind::Range {
                start: args.start.clone(),
                end: args.end.clone(),
                step: args.step.clone(),
            }
        } else {
            QueryKind::Instant { time: args.time.clone() }
        };

        let response = client.query(query, &kind, now).await?;
        let mut output = String::new();
        generate_json(&response, &mut output)?;
        print!("{output}");
        return Ok(());
    }

    let (summary, decisions) = tokio::try_join!(client.summary(now), client.edit_decisions(now))?;

    let mut output = String::new();
    if args.json {
        generate_json(&serde_json::json!({ "summary": summary, "editDecisions": decisions }), &mut output)?;
    } else {
        generate_console_telemetry(&summary, Some(&decisions), common.color, &mut output)?;
    }
    print!("{output}");

    Ok(())
}
