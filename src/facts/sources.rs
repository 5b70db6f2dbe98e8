//! Seams between the dashboard logic and the services it reads from.

use crate::facts::activity::CommitRecord;
use crate::facts::hosting::RepoStats;
use crate::facts::{ProviderResult, RepoSpec};
use chrono::{DateTime, Utc};

/// Lists the commits of a repository.
pub trait CommitSource {
    /// Commits whose author timestamp is at or after `since`.
    fn commits_since(
        &self,
        repo: &RepoSpec,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl Future<Output = ProviderResult<Vec<CommitRecord>>> + Send;
}

/// Reports point-in-time repository metadata.
pub trait StatsSource {
    fn repo_stats(&self, repo: &RepoSpec, now: DateTime<Utc>) -> impl Future<Output = ProviderResult<RepoStats>> + Send;
}
