use crate::config::ToolKind;
use crate::facts::activity::WeekActivity;
use crate::facts::classify::{Status, Trend};
use crate::facts::hosting::RepoStats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status label shown for every archived tool.
pub const ARCHIVED_STATUS: &str = "ARCHIVED";

/// Everything the dashboard shows for one active tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolReport {
    /// 1-based position in the configured fleet
    pub id: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub status: Status,
    pub trend: Trend,
    pub users: Option<u64>,
    pub activity: WeekActivity,
    /// Commits in the recent window, capped at one page
    pub recent_commits: u64,
    pub repo_name: String,
    pub repo_url: String,
    pub description: String,
    pub teams: Vec<String>,
    pub stats: Option<RepoStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedReport {
    pub id: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub status: String,
    pub repo_name: String,
    pub archived_date: NaiveDate,
    pub description: String,
    pub repo_url: String,
    pub stats: Option<RepoStats>,
}
