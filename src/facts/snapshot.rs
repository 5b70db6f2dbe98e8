use crate::Result;
use crate::facts::tool_report::{ArchivedReport, ToolReport};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;

const LOG_TARGET: &str = "  snapshot";

/// A complete fleet report frozen to disk.
///
/// Snapshots are produced by unattended batch refreshes and let the dashboard render
/// without touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    pub tool_fleet: Vec<ToolReport>,
    pub archived: Vec<ArchivedReport>,
    pub last_updated: DateTime<Utc>,
}

impl FleetSnapshot {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("could not read snapshot file '{path}'"))?;
        let snapshot: Self = serde_json::from_str(&text).into_app_err_with(|| format!("could not parse snapshot file '{path}'"))?;

        log::debug!(
            target: LOG_TARGET,
            "Loaded snapshot '{path}' with {} tools from {}",
            snapshot.tool_fleet.len(),
            snapshot.last_updated
        );

        Ok(snapshot)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).into_app_err_with(|| format!("could not create directory '{parent}'"))?;
        }

        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).into_app_err_with(|| format!("could not write snapshot file '{path}'"))?;

        log::info!(target: LOG_TARGET, "Saved snapshot with {} tools to '{path}'", self.tool_fleet.len());
        Ok(())
    }

    #[must_use]
    pub fn find_tool(&self, name: &str) -> Option<&ToolReport> {
        self.tool_fleet.iter().find(|t| t.name == name)
    }
}
