//! GitHub API client
//!
//! Minimal GitHub API client for fetching repository metadata and commit lists.

use crate::facts::ProviderResult;
use crate::facts::activity::CommitRecord;
use crate::facts::hosting::RepoStats;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "    github";

#[derive(Debug, Deserialize)]
#[expect(clippy::struct_field_names, reason = "field names match GitHub API exactly")]
pub struct Repository {
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub watchers_count: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
}

impl From<Repository> for RepoStats {
    fn from(repo: Repository) -> Self {
        Self {
            stars: repo.stargazers_count.unwrap_or(0),
            forks: repo.forks_count.unwrap_or(0),
            open_issues: repo.open_issues_count.unwrap_or(0),
            watchers: repo.watchers_count.unwrap_or(0),
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            size_kb: repo.size.unwrap_or(0),
            language: repo.language,
            is_private: repo.private,
        }
    }
}

/// Minimal commit info with only the fields we need
#[derive(Debug, Deserialize)]
pub struct CommitItem {
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub author: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
pub struct GitActor {
    pub date: Option<DateTime<Utc>>,
}

impl CommitItem {
    /// Commits without an author date carry no activity information.
    #[must_use]
    pub fn into_record(self) -> Option<CommitRecord> {
        let author_timestamp = self.commit.author?.date?;
        Some(CommitRecord { author_timestamp })
    }
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited (403 or 429)
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound(Option<RateLimitInfo>),

    /// Request failed
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

/// How many times a request is attempted and how long to wait in between.
///
/// The n-th retry waits `n` times the base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub rate_limit_delay: Duration,
    pub error_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt. Used where a fast, possibly empty answer beats a slow one.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            rate_limit_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
        }
    }

    /// Three attempts with linear backoff, for unattended batch refreshes.
    #[must_use]
    pub const fn batch() -> Self {
        Self {
            attempts: 3,
            rate_limit_delay: Duration::from_secs(2),
            error_delay: Duration::from_secs(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Client {
    /// Create a new hosting API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, retry: RetryPolicy) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder().user_agent("fleetmon").default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Make an API call and classify the result, retrying according to the client's policy
    pub async fn api_call(&self, url: &str, now: DateTime<Utc>) -> HostingApiResult<reqwest::Response> {
        let attempts = self.retry.attempts.max(1);

        for attempt in 1..=attempts {
            let last = attempt == attempts;

            let resp = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) if last => return HostingApiResult::Failed(e.into(), None),
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Request to '{url}' failed, retrying ({attempt}/{attempts}): {e:#}");
                    tokio::time::sleep(self.retry.error_delay * attempt).await;
                    continue;
                }
            };

            let result = classify_response(resp, now);
            match result {
                HostingApiResult::RateLimited(_) if !last => {
                    log::warn!(target: LOG_TARGET, "Rate limited, waiting before retry {attempt}/{attempts}");
                    tokio::time::sleep(self.retry.rate_limit_delay * attempt).await;
                }
                _ => return result,
            }
        }

        HostingApiResult::Failed(app_err!("no attempt was made to fetch '{url}'"), None)
    }

    /// Fetch `url` and deserialize its JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, now: DateTime<Utc>) -> ProviderResult<T> {
        match self.api_call(url, now).await {
            HostingApiResult::Success(resp, rate_limit) => {
                if let Some(info) = rate_limit {
                    log::trace!(target: LOG_TARGET, "GitHub rate limit remaining: {}", info.remaining);
                }

                match resp.json::<T>().await.into_app_err_with(|| format!("could not parse response from '{url}'")) {
                    Ok(data) => ProviderResult::Found(data),
                    Err(e) => ProviderResult::Error(Arc::new(e)),
                }
            }
            HostingApiResult::RateLimited(info) => {
                log::warn!(
                    target: LOG_TARGET,
                    "GitHub API rate limit exceeded for '{url}', resets at {}",
                    info.reset_at.with_timezone(&chrono::Local).format("%T")
                );
                ProviderResult::RateLimited
            }
            HostingApiResult::NotFound(_) => {
                log::info!(target: LOG_TARGET, "'{url}' not found (404)");
                ProviderResult::NotFound
            }
            HostingApiResult::Failed(e, _) => {
                log::warn!(target: LOG_TARGET, "Request to '{url}' failed: {e:#}");
                ProviderResult::Error(Arc::new(e.enrich_with(|| format!("could not fetch '{url}'"))))
            }
        }
    }

    /// Fetch the metadata of a repository
    pub async fn get_repository(&self, owner: &str, repo: &str, now: DateTime<Utc>) -> ProviderResult<RepoStats> {
        let url = format!("{}/repos/{owner}/{repo}", self.base_url);
        self.get_json::<Repository>(&url, now).await.map(RepoStats::from)
    }

    /// Fetch the first page of commits authored at or after `since`
    pub async fn get_commits(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
        per_page: u8,
        now: DateTime<Utc>,
    ) -> ProviderResult<Vec<CommitRecord>> {
        let since_str = since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let url = format!("{}/repos/{owner}/{repo}/commits?since={since_str}&per_page={per_page}", self.base_url);

        self.get_json::<Vec<CommitItem>>(&url, now)
            .await
            .map(|items| items.into_iter().filter_map(CommitItem::into_record).collect())
    }
}

fn classify_response(resp: reqwest::Response, now: DateTime<Utc>) -> HostingApiResult<reqwest::Response> {
    // Extract rate limit info from response headers before checking status
    let rate_limit = extract_rate_limit_from_headers(resp.headers());

    let status = resp.status();
    if status.is_success() {
        return HostingApiResult::Success(resp, rate_limit);
    }

    let status_code = status.as_u16();
    if matches!(status_code, 403 | 429) {
        // Rate limited - use rate limit info from headers or default to 1 hour retry
        let rate_limit = rate_limit.unwrap_or_else(|| RateLimitInfo {
            remaining: 0,
            reset_at: now + chrono::Duration::hours(1),
        });
        return HostingApiResult::RateLimited(rate_limit);
    }

    if status_code == 404 {
        return HostingApiResult::NotFound(rate_limit);
    }

    HostingApiResult::Failed(app_err!("HTTP status {status} from '{}'", resp.url()), rate_limit)
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
