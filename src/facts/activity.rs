//! Weekly commit activity.
//!
//! Weeks are anchored on Monday at local midnight (ISO weekday numbering, so a Sunday
//! belongs to the week that started six days earlier). Only Monday through Friday are
//! tracked; weekend commits are ignored.

use crate::facts::sources::CommitSource;
use crate::facts::{ProviderResult, RepoSpec};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "  activity";

/// Number of tracked weekdays, Monday through Friday.
pub const WEEKDAYS: usize = 5;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A commit, reduced to the only field the dashboard uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author_timestamp: DateTime<Utc>,
}

/// Whether at least one commit landed on each weekday of a week. Index 0 is Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekActivity([bool; WEEKDAYS]);

impl WeekActivity {
    #[must_use]
    pub const fn new(days: [bool; WEEKDAYS]) -> Self {
        Self(days)
    }

    #[must_use]
    pub const fn days(&self) -> [bool; WEEKDAYS] {
        self.0
    }

    /// Whether the weekday at `index` (0 = Monday) saw a commit. Out-of-range indices are inactive.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn active_days(&self) -> usize {
        self.0.iter().filter(|&&active| active).count()
    }
}

impl Display for WeekActivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for active in self.0 {
            f.write_str(if active { "■" } else { "·" })?;
        }
        Ok(())
    }
}

/// The Monday at local midnight that begins the week containing `now`.
///
/// The result is never later than `now`. When local midnight does not exist because of a
/// daylight-saving transition, the first existing instant of that Monday is used.
#[must_use]
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let offset = u64::from(now.weekday().number_from_monday() - 1);
    let today = now.date_naive();
    let monday = today.checked_sub_days(Days::new(offset)).unwrap_or(today);

    start_of_day(&now.timezone(), monday)
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);

    // Transitions move clocks by at most a few hours; probe in 15 minute steps.
    let mut local = midnight;
    for _ in 0..(24 * 4) {
        if let Some(start) = tz.from_local_datetime(&local).earliest() {
            return start;
        }
        local += TimeDelta::minutes(15);
    }

    tz.from_utc_datetime(&midnight)
}

/// Mark each weekday of the week beginning at `week_start` that has at least one commit.
///
/// Commits before the week, on the weekend, or in a later week leave the vector untouched.
pub fn bucket_commits<'a, Tz: TimeZone>(commits: impl IntoIterator<Item = &'a CommitRecord>, week_start: &DateTime<Tz>) -> WeekActivity {
    let start = week_start.with_timezone(&Utc);
    let mut activity = WeekActivity::default();

    for commit in commits {
        if commit.author_timestamp < start {
            continue;
        }

        let days = commit.author_timestamp.signed_duration_since(start).num_milliseconds() / MILLIS_PER_DAY;
        if let Ok(index) = usize::try_from(days)
            && let Some(slot) = activity.0.get_mut(index)
        {
            *slot = true;
        }
    }

    activity
}

/// Turns a repository's commit list into this week's activity vector.
#[derive(Debug, Clone)]
pub struct ActivityAggregator<S> {
    source: S,
}

impl<S: CommitSource> ActivityAggregator<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Compute the activity of `repo` for the week containing `now`.
    ///
    /// Never fails: a missing repository, a rate limit, or any other fetch failure is logged
    /// and yields an all-inactive week.
    pub async fn weekly_activity<Tz: TimeZone>(&self, repo: &RepoSpec, now: &DateTime<Tz>) -> WeekActivity {
        let monday = week_start(now);
        let since = monday.with_timezone(&Utc);

        match self.source.commits_since(repo, since, now.with_timezone(&Utc)).await {
            ProviderResult::Found(commits) => {
                let activity = bucket_commits(&commits, &monday);
                log::debug!(target: LOG_TARGET, "Activity for '{repo}' since {since}: {activity} ({} commits)", commits.len());
                activity
            }
            ProviderResult::RateLimited => {
                log::warn!(target: LOG_TARGET, "Rate limit exceeded while fetching commits for '{repo}'");
                WeekActivity::default()
            }
            ProviderResult::NotFound => {
                log::warn!(target: LOG_TARGET, "Repository '{repo}' not found while fetching commits");
                WeekActivity::default()
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Failed to fetch commits for '{repo}': {e:#}");
                WeekActivity::default()
            }
        }
    }
}
