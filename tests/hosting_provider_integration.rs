//! Integration tests for the GitHub provider and activity aggregation using wiremock

use chrono::{DateTime, Utc};
use core::time::Duration;
use fleetmon::facts::hosting::{Client, Provider, RepoStats, RetryPolicy};
use fleetmon::facts::{ActivityAggregator, FileStore, MemoryStore, ProviderResult, RepoSpec, StatsSource, TtlCache, WeekActivity};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TTL: Duration = Duration::from_secs(30 * 60);

/// Wednesday noon
fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-14T12:00:00Z").unwrap().with_timezone(&Utc)
}

fn commit(date: &str) -> serde_json::Value {
    json!({ "sha": "0000", "commit": { "author": { "name": "dev", "email": "dev@example.com", "date": date } } })
}

fn provider(server: &MockServer, retry: RetryPolicy) -> Provider {
    let client = Client::new(Some("test-token"), server.uri(), retry).unwrap();
    let cache = Arc::new(TtlCache::load(MemoryStore::new(), TTL, now()));
    Provider::new(client, cache)
}

fn repo() -> RepoSpec {
    RepoSpec::new("acme", "widgets")
}

#[tokio::test]
async fn test_weekly_activity_from_commits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .and(query_param("since", "2026-10-12T00:00:00Z"))
        .and(query_param("per_page", "100"))
        .and(header("authorization", "token test-token"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            commit("2026-10-14T09:00:00Z"),
            commit("2026-10-12T10:00:00Z"),
            commit("2026-10-12T11:30:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let aggregator = ActivityAggregator::new(provider(&server, RetryPolicy::none()));
    let activity = aggregator.weekly_activity(&repo(), &now()).await;

    assert_eq!(activity, WeekActivity::new([true, false, true, false, false]));
    assert_eq!(activity.active_days(), 2);

    // Served from the cache, so the mock is hit only once
    let again = aggregator.weekly_activity(&repo(), &now()).await;
    assert_eq!(again, activity);
    assert_eq!(aggregator.source().cache().len(), 1);
}

#[tokio::test]
async fn test_weekly_activity_on_monday_morning_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let monday = DateTime::parse_from_rfc3339("2026-10-12T00:00:00Z").unwrap().with_timezone(&Utc);
    let aggregator = ActivityAggregator::new(provider(&server, RetryPolicy::none()));

    assert_eq!(aggregator.weekly_activity(&repo(), &monday).await, WeekActivity::default());
}

#[tokio::test]
async fn test_rate_limited_commits_yield_empty_week_and_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1792000000")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let aggregator = ActivityAggregator::new(provider(&server, RetryPolicy::none()));

    assert_eq!(aggregator.weekly_activity(&repo(), &now()).await, WeekActivity::default());
    assert!(aggregator.source().cache().is_empty());

    // Nothing cached, so the next call asks again
    assert_eq!(aggregator.weekly_activity(&repo(), &now()).await, WeekActivity::default());
}

#[tokio::test]
async fn test_missing_repository() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = provider(&server, RetryPolicy::none());
    assert!(matches!(provider.repo_stats(&repo(), now()).await, ProviderResult::NotFound));

    let aggregator = ActivityAggregator::new(provider);
    assert_eq!(aggregator.weekly_activity(&repo(), &now()).await, WeekActivity::default());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let provider = provider(&server, RetryPolicy::none());
    match provider.repo_stats(&repo(), now()).await {
        ProviderResult::Error(e) => assert!(e.to_string().contains("502")),
        other => panic!("expected an error, got {}", other.status_str()),
    }
}

#[tokio::test]
async fn test_repo_stats_are_cached_on_disk() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "acme/widgets",
            "stargazers_count": 7,
            "forks_count": 2,
            "open_issues_count": 1,
            "watchers_count": 7,
            "updated_at": "2026-10-10T08:00:00Z",
            "pushed_at": "2026-10-13T16:45:00Z",
            "size": 512,
            "language": "TypeScript",
            "private": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("github-cache.json");

    let client = Client::new(None, server.uri(), RetryPolicy::none()).unwrap();
    let cache = Arc::new(TtlCache::load(FileStore::new(&cache_path), TTL, now()));
    let provider = Provider::new(client, cache);

    let ProviderResult::Found(stats) = provider.repo_stats(&repo(), now()).await else {
        panic!("expected stats");
    };
    assert_eq!(stats.stars, 7);
    assert_eq!(stats.language.as_deref(), Some("TypeScript"));

    let persisted: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&cache_path).unwrap()).unwrap();
    let entry = &persisted["stats:acme/widgets"];
    assert_eq!(entry["value"]["stars"], 7);
    assert!(entry["fetchedAt"].is_string());

    // A fresh cache over the same file answers without touching the server
    let client = Client::new(None, server.uri(), RetryPolicy::none()).unwrap();
    let reloaded = Provider::new(client, Arc::new(TtlCache::load(FileStore::new(&cache_path), TTL, now())));
    assert!(reloaded.repo_stats(&repo(), now()).await.is_found());
}

#[tokio::test]
async fn test_retry_after_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stargazers_count": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        attempts: 3,
        rate_limit_delay: Duration::from_millis(5),
        error_delay: Duration::from_millis(5),
    };

    let provider = provider(&server, retry);
    let stats = provider.repo_stats(&repo(), now()).await.ok().unwrap();
    assert_eq!(stats.stars, 1);
}

#[tokio::test]
async fn test_retries_exhausted_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        attempts: 2,
        rate_limit_delay: Duration::from_millis(5),
        error_delay: Duration::from_millis(5),
    };

    let provider = provider(&server, retry);
    assert!(matches!(provider.repo_stats(&repo(), now()).await, ProviderResult::RateLimited));
}

#[tokio::test]
async fn test_bypassing_cache_reads_fetches_live_and_refreshes_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stargazers_count": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(TtlCache::load(MemoryStore::new(), TTL, now()));
    let stale = RepoStats {
        stars: 3,
        ..RepoStats::default()
    };
    cache.put_as("stats:acme/widgets", &stale, now());
    assert_eq!(cache.get_as::<RepoStats>("stats:acme/widgets", now()), Some(stale));

    let client = Client::new(None, server.uri(), RetryPolicy::none()).unwrap();
    let live = Provider::new(client.clone(), Arc::clone(&cache)).bypass_cache_reads();
    assert_eq!(live.repo_stats(&repo(), now()).await.ok().unwrap().stars, 42);

    // Regular readers now see the refreshed entry without another request
    let cached = Provider::new(client, cache);
    assert_eq!(cached.repo_stats(&repo(), now()).await.ok().unwrap().stars, 42);
}
