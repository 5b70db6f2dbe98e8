use super::client::{QueryKind, TelemetryClient};
use super::extract::{EditDecisions, extract_by_label, extract_edit_decisions, extract_scalar};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub total: f64,
    pub by_type: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostUsage {
    pub total: f64,
    pub by_model: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LinesOfCode {
    pub added: f64,
    pub removed: f64,
}

/// Headline usage numbers shown by the telemetry widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySummary {
    pub sessions: f64,
    pub tokens: TokenUsage,
    pub cost: CostUsage,
    pub lines_of_code: LinesOfCode,
    pub commits: f64,
    pub pull_requests: f64,
    pub active_time_seconds: f64,
    pub last_updated: DateTime<Utc>,
}

impl TelemetryClient {
    async fn instant(&self, query: String, now: DateTime<Utc>) -> Result<serde_json::Value> {
        self.query(&query, &QueryKind::default(), now).await
    }

    async fn sum(&self, metric: &str, now: DateTime<Utc>) -> Result<f64> {
        let resp = self.instant(format!("sum({})", self.metric(metric)), now).await?;
        Ok(extract_scalar(&resp))
    }

    async fn sum_by(&self, metric: &str, label: &str, now: DateTime<Utc>) -> Result<BTreeMap<String, f64>> {
        let resp = self.instant(format!("sum by ({label}) ({})", self.metric(metric)), now).await?;
        Ok(extract_by_label(&resp, label))
    }

    /// Fetch every headline number concurrently. Fails if any single query fails.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<TelemetrySummary> {
        let (sessions, tokens_by_type, tokens_total, cost_total, cost_by_model, lines, commits, pull_requests, active_time) = tokio::try_join!(
            self.sum("session_count", now),
            self.sum_by("token_usage", "type", now),
            self.sum("token_usage", now),
            self.sum("cost_usage", now),
            self.sum_by("cost_usage", "model", now),
            self.sum_by("lines_of_code_count", "type", now),
            self.sum("commit_count", now),
            self.sum("pull_request_count", now),
            self.sum("active_time_total", now),
        )?;

        Ok(TelemetrySummary {
            sessions,
            tokens: TokenUsage {
                total: tokens_total,
                by_type: tokens_by_type,
            },
            cost: CostUsage {
                total: cost_total,
                by_model: cost_by_model,
            },
            lines_of_code: LinesOfCode {
                added: lines.get("added").copied().unwrap_or(0.0),
                removed: lines.get("removed").copied().unwrap_or(0.0),
            },
            commits,
            pull_requests,
            active_time_seconds: active_time,
            last_updated: now,
        })
    }

    /// Accept/reject counts of code edit tools.
    pub async fn edit_decisions(&self, now: DateTime<Utc>) -> Result<EditDecisions> {
        let resp = self
            .instant(format!("sum by (tool, decision) ({})", self.metric("code_edit_tool_decision")), now)
            .await?;
        Ok(extract_edit_decisions(&resp))
    }
}
