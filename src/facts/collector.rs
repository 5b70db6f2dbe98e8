use crate::Result;
use crate::config::{ArchivedToolConfig, Config, ToolConfig};
use crate::facts::activity::ActivityAggregator;
use crate::facts::classify::{classify_status, classify_trend, estimated_users};
use crate::facts::hosting::RepoStats;
use crate::facts::snapshot::FleetSnapshot;
use crate::facts::sources::{CommitSource, StatsSource};
use crate::facts::tool_report::{ARCHIVED_STATUS, ArchivedReport, ToolReport};
use crate::facts::{ProviderResult, RepoSpec};
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use futures_util::future::join_all;

/// Log target for collector
const LOG_TARGET: &str = " collector";

/// Gathers activity, stats, and labels for every tool in the fleet.
#[derive(Debug)]
pub struct FleetCollector<S> {
    aggregator: ActivityAggregator<S>,
}

impl<S: CommitSource + StatsSource> FleetCollector<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            aggregator: ActivityAggregator::new(source),
        }
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        self.aggregator.source()
    }

    /// Build a report for every configured tool.
    ///
    /// Tools found in `snapshot` reuse its activity, stats, and labels; all other tools are
    /// queried concurrently. Fetch failures degrade to empty data rather than errors.
    pub async fn collect<Tz: TimeZone>(&self, config: &Config, snapshot: Option<&FleetSnapshot>, now: &DateTime<Tz>) -> Result<FleetSnapshot> {
        let now_utc = now.with_timezone(&Utc);
        let window_start = recent_window_start(now_utc, config.recent_commit_window);

        let tools = config
            .tools
            .iter()
            .enumerate()
            .map(|(index, tool)| self.tool_report(config, index + 1, tool, snapshot, window_start, now));

        let archived = config
            .archived
            .iter()
            .enumerate()
            .map(|(index, tool)| self.archived_report(config, index + 1, tool, now_utc));

        let (tools, archived) = tokio::join!(join_all(tools), join_all(archived));

        Ok(FleetSnapshot {
            tool_fleet: tools.into_iter().collect::<Result<_>>()?,
            archived: archived.into_iter().collect::<Result<_>>()?,
            last_updated: now_utc,
        })
    }

    async fn tool_report<Tz: TimeZone>(
        &self,
        config: &Config,
        id: usize,
        tool: &ToolConfig,
        snapshot: Option<&FleetSnapshot>,
        window_start: DateTime<Utc>,
        now: &DateTime<Tz>,
    ) -> Result<ToolReport> {
        let repo = config.repo_spec(&tool.repo)?;
        let now_utc = now.with_timezone(&Utc);

        let (activity, stats, status, trend, recent_commits) = if let Some(frozen) = snapshot.and_then(|s| s.find_tool(&tool.name)) {
            log::debug!(target: LOG_TARGET, "Using snapshot data for '{}'", tool.name);
            (frozen.activity, frozen.stats.clone(), frozen.status, frozen.trend, frozen.recent_commits)
        } else {
            let (activity, stats, recent_commits) = tokio::join!(
                self.aggregator.weekly_activity(&repo, now),
                self.stats(&repo, now_utc),
                self.recent_commit_count(&repo, window_start, now_utc),
            );

            let status = classify_status(stats.as_ref(), now_utc);
            let trend = classify_trend(stats.as_ref(), recent_commits, now_utc);
            (activity, stats, status, trend, recent_commits)
        };

        log::debug!(target: LOG_TARGET, "'{}': {status} {trend} {activity}", tool.name);

        Ok(ToolReport {
            id,
            name: tool.name.clone(),
            kind: tool.kind,
            status,
            trend,
            users: estimated_users(stats.as_ref()),
            activity,
            recent_commits,
            repo_name: tool.repo.clone(),
            repo_url: config.repo_url(&repo),
            description: tool.description.clone(),
            teams: tool.teams.clone(),
            stats,
        })
    }

    async fn archived_report(&self, config: &Config, id: usize, tool: &ArchivedToolConfig, now: DateTime<Utc>) -> Result<ArchivedReport> {
        let repo = config.repo_spec(&tool.repo)?;

        Ok(ArchivedReport {
            id,
            name: tool.name.clone(),
            kind: tool.kind,
            status: ARCHIVED_STATUS.to_string(),
            repo_name: tool.repo.clone(),
            archived_date: tool.archived_date,
            description: tool.description.clone(),
            repo_url: config.repo_url(&repo),
            stats: self.stats(&repo, now).await,
        })
    }

    async fn stats(&self, repo: &RepoSpec, now: DateTime<Utc>) -> Option<RepoStats> {
        match self.source().repo_stats(repo, now).await {
            ProviderResult::Found(stats) => Some(stats),
            ProviderResult::NotFound => {
                log::warn!(target: LOG_TARGET, "Repository '{repo}' not found while fetching stats");
                None
            }
            ProviderResult::RateLimited => {
                log::warn!(target: LOG_TARGET, "Rate limit exceeded while fetching stats for '{repo}'");
                None
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Failed to fetch stats for '{repo}': {e:#}");
                None
            }
        }
    }

    async fn recent_commit_count(&self, repo: &RepoSpec, since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        let result = self.source().commits_since(repo, since, now).await;
        if !result.is_found() {
            log::debug!(target: LOG_TARGET, "No recent commit count for '{repo}': {}", result.status_str());
        }

        result.ok().map_or(0, |commits| commits.len() as u64)
    }
}

/// Start of the trend window, truncated to UTC midnight so it stays stable for a whole day.
fn recent_window_start(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    let days = i64::try_from(days).unwrap_or(i64::MAX);
    let start = TimeDelta::try_days(days).and_then(|d| now.checked_sub_signed(d)).unwrap_or(DateTime::<Utc>::MIN_UTC);
    start.date_naive().and_time(NaiveTime::MIN).and_utc()
}
