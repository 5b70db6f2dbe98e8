use crate::facts::ProviderResult;
use crate::facts::activity::CommitRecord;
use crate::facts::cache::TtlCache;
use crate::facts::hosting::{Client, RepoStats};
use crate::facts::repo_spec::RepoSpec;
use crate::facts::sources::{CommitSource, StatsSource};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "   hosting";
const COMMIT_PAGE_SIZE: u8 = 100;

/// GitHub-backed source of commits and repository metadata.
///
/// Successful responses are memoised in the hosting cache; failures are never cached.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
    cache: Arc<TtlCache>,
    read_cache: bool,
}

impl Provider {
    #[must_use]
    pub const fn new(client: Client, cache: Arc<TtlCache>) -> Self {
        Self {
            client,
            cache,
            read_cache: true,
        }
    }

    /// Always query GitHub, still storing successful responses for later readers.
    #[must_use]
    pub const fn bypass_cache_reads(mut self) -> Self {
        self.read_cache = false;
        self
    }

    fn cached<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        if self.read_cache { self.cache.get_as(key, now) } else { None }
    }

    #[must_use]
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    fn commits_key(repo: &RepoSpec, since: DateTime<Utc>) -> String {
        format!("commits:{repo}:{}", since.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    fn stats_key(repo: &RepoSpec) -> String {
        format!("stats:{repo}")
    }
}

impl CommitSource for Provider {
    async fn commits_since(&self, repo: &RepoSpec, since: DateTime<Utc>, now: DateTime<Utc>) -> ProviderResult<Vec<CommitRecord>> {
        let key = Self::commits_key(repo, since);
        if let Some(commits) = self.cached::<Vec<CommitRecord>>(&key, now) {
            log::debug!(target: LOG_TARGET, "Using cached commits for '{repo}' since {since}");
            return ProviderResult::Found(commits);
        }

        log::info!(target: LOG_TARGET, "Querying GitHub for commits of '{repo}' since {since}");
        let result = self
            .client
            .get_commits(repo.owner(), repo.repo(), since, COMMIT_PAGE_SIZE, now)
            .await;

        if let ProviderResult::Found(commits) = &result {
            self.cache.put_as(key, commits, now);
        }

        result
    }
}

impl StatsSource for Provider {
    async fn repo_stats(&self, repo: &RepoSpec, now: DateTime<Utc>) -> ProviderResult<RepoStats> {
        let key = Self::stats_key(repo);
        if let Some(stats) = self.cached::<RepoStats>(&key, now) {
            log::debug!(target: LOG_TARGET, "Using cached stats for '{repo}'");
            return ProviderResult::Found(stats);
        }

        log::info!(target: LOG_TARGET, "Querying GitHub for stats of '{repo}'");
        let result = self.client.get_repository(repo.owner(), repo.repo(), now).await;

        if let ProviderResult::Found(stats) = &result {
            self.cache.put_as(key, stats, now);
        }

        result
    }
}
