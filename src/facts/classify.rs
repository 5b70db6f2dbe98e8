//! Coarse labels derived from repository recency and commit volume.

use crate::facts::hosting::RepoStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

const LIVE_MAX_DAYS: i64 = 7;
const BETA_MAX_DAYS: i64 = 30;
const DORMANT_AFTER_DAYS: i64 = 30;
const RISING_MIN_COMMITS: u64 = 10;
const STEADY_MIN_COMMITS: u64 = 3;

/// How actively a tool is being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Status {
    /// Pushed to within the last week
    Live,
    /// Pushed to within the last month
    Beta,
    /// Idle for a month or more, or unknown
    Maint,
}

/// Direction of recent commit volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Stable,
    Flat,
    Down,
}

/// Whole days elapsed from `then` to `now`, rounded down. Negative if `then` is in the future.
#[must_use]
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(then).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

#[must_use]
pub fn classify_status(stats: Option<&RepoStats>, now: DateTime<Utc>) -> Status {
    let Some(pushed_at) = stats.and_then(|s| s.pushed_at) else {
        return Status::Maint;
    };

    match days_since(pushed_at, now) {
        days if days < LIVE_MAX_DAYS => Status::Live,
        days if days < BETA_MAX_DAYS => Status::Beta,
        _ => Status::Maint,
    }
}

/// `commit_count` is the number of commits in the recent window.
#[must_use]
pub fn classify_trend(stats: Option<&RepoStats>, commit_count: u64, now: DateTime<Utc>) -> Trend {
    let Some(stats) = stats else {
        return Trend::Flat;
    };

    if commit_count > RISING_MIN_COMMITS {
        return Trend::Up;
    }

    if commit_count > STEADY_MIN_COMMITS {
        return Trend::Stable;
    }

    match stats.pushed_at {
        Some(pushed_at) if days_since(pushed_at, now) > DORMANT_AFTER_DAYS => Trend::Down,
        _ => Trend::Flat,
    }
}

/// Rough audience estimate shown next to each tool: watchers count double, stars triple.
#[must_use]
pub fn estimated_users(stats: Option<&RepoStats>) -> Option<u64> {
    stats.map(|s| s.watchers.saturating_mul(2).saturating_add(s.stars.saturating_mul(3)).max(1))
}
