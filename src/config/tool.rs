use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad category of a fleet tool, shown as a badge in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ToolKind {
    Bot,
    Dash,
    Tool,
    Seo,
    Scrape,
}

/// An active tool backed by a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    pub name: String,

    /// Repository name (resolved against the configured owner) or `owner/repo`
    pub repo: String,

    pub kind: ToolKind,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub teams: Vec<String>,
}

/// A discontinued tool. Only repository stats are tracked for these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchivedToolConfig {
    pub name: String,
    pub repo: String,
    pub kind: ToolKind,

    #[serde(default)]
    pub description: String,

    pub archived_date: NaiveDate,
}
