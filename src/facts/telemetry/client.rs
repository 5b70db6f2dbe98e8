use crate::Result;
use crate::config::TelemetryConfig;
use crate::facts::cache::TtlCache;
use chrono::{DateTime, TimeDelta, Utc};
use ohno::{IntoAppError, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::sync::Arc;

const LOG_TARGET: &str = " telemetry";

/// Where the metrics backend lives and how to authenticate against it.
#[derive(Clone)]
pub struct TelemetryCredentials {
    pub endpoint: String,
    pub instance_id: String,
    pub api_token: String,
}

impl core::fmt::Debug for TelemetryCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TelemetryCredentials")
            .field("endpoint", &self.endpoint)
            .field("instance_id", &self.instance_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl TelemetryCredentials {
    /// Returns `None` unless all three parts are present and non-empty.
    #[must_use]
    pub fn from_parts(endpoint: Option<&str>, instance_id: Option<&str>, api_token: Option<&str>) -> Option<Self> {
        let non_empty = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

        Some(Self {
            endpoint: non_empty(endpoint)?.trim_end_matches('/').to_string(),
            instance_id: non_empty(instance_id)?,
            api_token: non_empty(api_token)?,
        })
    }
}

/// Shape of a metrics query.
///
/// Parameters are passed through to the backend untouched, so both unix timestamps and
/// RFC 3339 strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Instant { time: Option<String> },
    Range {
        start: Option<String>,
        end: Option<String>,
        step: Option<String>,
    },
}

impl Default for QueryKind {
    fn default() -> Self {
        Self::Instant { time: None }
    }
}

impl QueryKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Instant { .. } => "instant",
            Self::Range { .. } => "range",
        }
    }

    /// The options as the caller supplied them, before any defaults are applied.
    fn supplied_options(&self) -> Vec<(&'static str, &str)> {
        let options = match self {
            Self::Instant { time } => vec![("time", time.as_deref())],
            Self::Range { start, end, step } => vec![("start", start.as_deref()), ("end", end.as_deref()), ("step", step.as_deref())],
        };

        options.into_iter().filter_map(|(name, value)| value.map(|v| (name, v))).collect()
    }
}

/// Proxy to a Prometheus-compatible query API with a short-lived response cache.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
    credentials: Option<TelemetryCredentials>,
    cache: Arc<TtlCache>,
    settings: TelemetryConfig,
}

impl TelemetryClient {
    pub fn new(credentials: Option<TelemetryCredentials>, settings: TelemetryConfig, cache: Arc<TtlCache>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().user_agent("fleetmon").default_headers(headers).build()?;

        Ok(Self {
            http,
            credentials,
            cache,
            settings,
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    #[must_use]
    pub const fn settings(&self) -> &TelemetryConfig {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Full name of a metric, including the configured prefix.
    #[must_use]
    pub fn metric(&self, name: &str) -> String {
        format!("{}_{name}", self.settings.metric_prefix)
    }

    /// Run `query` against the backend and return its JSON response verbatim.
    pub async fn query(&self, query: &str, kind: &QueryKind, now: DateTime<Utc>) -> Result<serde_json::Value> {
        let Some(credentials) = &self.credentials else {
            bail!("telemetry not configured: missing GRAFANA_PROMETHEUS_URL, GRAFANA_INSTANCE_ID, or GRAFANA_API_TOKEN");
        };

        if query.trim().is_empty() {
            bail!("missing query");
        }

        let key = cache_key(query, kind);
        if let Some(data) = self.cache.get(&key, now) {
            log::debug!(target: LOG_TARGET, "Using cached response for {key}");
            return Ok(data);
        }

        let (path, params) = self.request_params(query, kind, now);
        let url = format!("{}{path}", credentials.endpoint);

        log::info!(target: LOG_TARGET, "Querying telemetry backend: {query}");
        let resp = self
            .http
            .get(&url)
            .basic_auth(&credentials.instance_id, Some(&credentials.api_token))
            .query(&params)
            .send()
            .await
            .into_app_err_with(|| format!("could not reach telemetry backend at '{url}'"))?;

        let status = resp.status();
        if !status.is_success() {
            let details = resp.text().await.unwrap_or_default();
            log::warn!(target: LOG_TARGET, "Telemetry query failed with HTTP status {status}");
            bail!("telemetry query failed with HTTP status {}: {details}", status.as_u16());
        }

        let data: serde_json::Value = resp.json().await.into_app_err("could not parse telemetry response")?;
        self.cache.put(key, data.clone(), now);

        Ok(data)
    }

    fn request_params(&self, query: &str, kind: &QueryKind, now: DateTime<Utc>) -> (&'static str, Vec<(&'static str, String)>) {
        let mut params = vec![("query", query.to_string())];

        match kind {
            QueryKind::Instant { time } => {
                if let Some(t) = time {
                    params.push(("time", t.clone()));
                }
                ("/api/v1/query", params)
            }
            QueryKind::Range { start, end, step } => {
                let range = TimeDelta::seconds(i64::try_from(self.settings.default_range).unwrap_or(i64::MAX));
                let default_start = now.checked_sub_signed(range).unwrap_or(DateTime::<Utc>::MIN_UTC);

                params.push(("start", start.clone().unwrap_or_else(|| default_start.timestamp().to_string())));
                params.push(("end", end.clone().unwrap_or_else(|| now.timestamp().to_string())));
                params.push(("step", step.clone().unwrap_or_else(|| self.settings.default_step.clone())));
                ("/api/v1/query_range", params)
            }
        }
    }

    /// Whether the backend answers a trivial query successfully.
    pub async fn check_connection(&self, now: DateTime<Utc>) -> bool {
        match self.query("up", &QueryKind::default(), now).await {
            Ok(resp) => resp.get("status").and_then(serde_json::Value::as_str) == Some("success"),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Telemetry connection check failed: {e:#}");
                false
            }
        }
    }
}

fn cache_key(query: &str, kind: &QueryKind) -> String {
    let options: Vec<_> = kind.supplied_options().into_iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}_{query}_{}", kind.name(), options.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::cache::MemoryStore;
    use core::time::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn client(credentials: Option<TelemetryCredentials>) -> TelemetryClient {
        let cache = Arc::new(TtlCache::load(MemoryStore::new(), Duration::from_secs(60), now()));
        TelemetryClient::new(credentials, TelemetryConfig::default(), cache).unwrap()
    }

    fn credentials() -> TelemetryCredentials {
        TelemetryCredentials::from_parts(Some("http://127.0.0.1:9/"), Some("1234"), Some("secret")).unwrap()
    }

    #[test]
    fn test_credentials_require_all_parts() {
        assert!(TelemetryCredentials::from_parts(None, Some("id"), Some("token")).is_none());
        assert!(TelemetryCredentials::from_parts(Some("http://x"), Some(""), Some("token")).is_none());
        assert!(TelemetryCredentials::from_parts(Some("http://x"), Some("id"), None).is_none());

        let creds = credentials();
        assert_eq!(creds.endpoint, "http://127.0.0.1:9");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_cache_key_uses_supplied_options_only() {
        assert_eq!(cache_key("up", &QueryKind::default()), "instant_up_");

        let range = QueryKind::Range {
            start: Some("100".into()),
            end: None,
            step: Some("30".into()),
        };
        assert_eq!(cache_key("sum(x)", &range), "range_sum(x)_start=100&step=30");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    fn test_range_defaults() {
        let client = client(Some(credentials()));
        let kind = QueryKind::Range {
            start: None,
            end: None,
            step: None,
        };

        let (path, params) = client.request_params("up", &kind, now());
        assert_eq!(path, "/api/v1/query_range");

        let now_secs = now().timestamp();
        assert!(params.contains(&("query", "up".to_string())));
        assert!(params.contains(&("start", (now_secs - 3600).to_string())));
        assert!(params.contains(&("end", now_secs.to_string())));
        assert!(params.contains(&("step", "60".to_string())));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    fn test_instant_params() {
        let client = client(Some(credentials()));

        let (path, params) = client.request_params("up", &QueryKind::default(), now());
        assert_eq!(path, "/api/v1/query");
        assert_eq!(params, vec![("query", "up".to_string())]);

        let kind = QueryKind::Instant { time: Some("1700000000".into()) };
        let (_, params) = client.request_params("up", &kind, now());
        assert!(params.contains(&("time", "1700000000".to_string())));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    async fn test_query_not_configured() {
        let client = client(None);
        assert!(!client.is_configured());

        let err = client.query("up", &QueryKind::default(), now()).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
        assert!(!client.check_connection(now()).await);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    async fn test_query_empty() {
        let client = client(Some(credentials()));

        let err = client.query("  ", &QueryKind::default(), now()).await.unwrap_err();
        assert!(err.to_string().contains("missing query"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    fn test_metric_prefix() {
        assert_eq!(client(None).metric("session_count"), "claude_code_session_count");
    }
}
