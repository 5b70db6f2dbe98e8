use super::common::{Common, CommonArgs};
use chrono::Utc;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::classify::{classify_status, days_since, estimated_users};
use fleetmon::facts::hosting::RetryPolicy;
use fleetmon::facts::{ProviderResult, StatsSource};
use fleetmon::reports::generate_json;
use ohno::bail;

#[derive(Parser, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Repository as `repo`, `owner/repo`, or a GitHub URL
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Print the stats as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn process_stats(args: &StatsArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let repo = common.config.repo_spec(&args.repo)?;
    let provider = common.provider(RetryPolicy::none())?;

    let now = Utc::now();
    let stats = match provider.repo_stats(&repo, now).await {
        ProviderResult::Found(stats) => stats,
        ProviderResult::NotFound => bail!("repository '{repo}' not found"),
        ProviderResult::RateLimited => bail!("GitHub API rate limit exceeded while fetching '{repo}'"),
        ProviderResult::Error(e) => bail!("could not fetch stats for '{repo}': {e}"),
    };

    if args.json {
        let mut output = String::new();
        generate_json(&stats, &mut output)?;
        print!("{output}");
        return Ok(());
    }

    println!("Repository     : {repo}");
    println!("URL            : {}", common.config.repo_url(&repo));
    println!("Status         : {}", classify_status(Some(&stats), now));
    println!("Stars          : {}", stats.stars);
    println!("Forks          : {}", stats.forks);
    println!("Watchers       : {}", stats.watchers);
    println!("Open issues    : {}", stats.open_issues);
    if let Some(users) = estimated_users(Some(&stats)) {
        println!("Est. users     : {users}");
    }
    if let Some(language) = &stats.language {
        println!("Language       : {language}");
    }
    println!("Size           : {} KB", stats.size_kb);
    println!("Private        : {}", if stats.is_private { "yes" } else { "no" });
    if let Some(pushed_at) = stats.pushed_at {
        println!("Last push      : {} ({} days ago)", pushed_at.format("%Y-%m-%d %H:%M UTC"), days_since(pushed_at, now));
    }
    if let Some(updated_at) = stats.updated_at {
        println!("Last update    : {}", updated_at.format("%Y-%m-%d %H:%M UTC"));
    }

    Ok(())
}
