//! End-to-end tests for fleet collection against a mocked GitHub API

use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate, Utc};
use core::time::Duration;
use fleetmon::config::{ArchivedToolConfig, Config, ToolConfig, ToolKind};
use fleetmon::facts::hosting::{Client, Provider, RetryPolicy};
use fleetmon::facts::{ARCHIVED_STATUS, FleetCollector, FleetSnapshot, MemoryStore, Status, Trend, TtlCache, WeekActivity};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wednesday noon
fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-14T12:00:00Z").unwrap().with_timezone(&Utc)
}

fn commits(dates: &[&str]) -> serde_json::Value {
    dates
        .iter()
        .map(|date| json!({ "sha": "0000", "commit": { "author": { "name": "dev", "date": date } } }))
        .collect()
}

fn config(server: &MockServer) -> Config {
    Config {
        owner: "acme".to_string(),
        api_base_url: server.uri(),
        web_base_url: "https://github.com".to_string(),
        recent_commit_window: 30,
        tools: vec![
            ToolConfig {
                name: "WIDGETS".to_string(),
                repo: "widgets".to_string(),
                kind: ToolKind::Tool,
                description: "Widget factory".to_string(),
                teams: vec!["Platform".to_string()],
            },
            ToolConfig {
                name: "GHOST".to_string(),
                repo: "ghost".to_string(),
                kind: ToolKind::Bot,
                description: String::new(),
                teams: Vec::new(),
            },
        ],
        archived: vec![ArchivedToolConfig {
            name: "OLD_DASH".to_string(),
            repo: "old-dash".to_string(),
            kind: ToolKind::Dash,
            description: "Retired dashboard".to_string(),
            archived_date: NaiveDate::from_ymd_opt(2025, 9, 19).unwrap(),
        }],
        ..Config::default()
    }
}

fn collector(server: &MockServer) -> FleetCollector<Provider> {
    let client = Client::new(None, server.uri(), RetryPolicy::none()).unwrap();
    let cache = Arc::new(TtlCache::load(MemoryStore::new(), Duration::from_secs(30 * 60), now()));
    FleetCollector::new(Provider::new(client, cache))
}

async fn mount_widgets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stargazers_count": 4,
            "watchers_count": 4,
            "forks_count": 1,
            "open_issues_count": 0,
            "pushed_at": "2026-10-14T09:00:00Z",
            "language": "Python"
        })))
        .mount(server)
        .await;

    // This week
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .and(query_param("since", "2026-10-12T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits(&["2026-10-14T09:00:00Z", "2026-10-12T15:00:00Z"])))
        .mount(server)
        .await;

    // Trend window, 30 days back at UTC midnight
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .and(query_param("since", "2026-09-14T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits(&[
            "2026-10-14T09:00:00Z",
            "2026-10-12T15:00:00Z",
            "2026-10-01T10:00:00Z",
            "2026-09-25T10:00:00Z",
            "2026-09-20T10:00:00Z",
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/old-dash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stargazers_count": 9,
            "pushed_at": "2025-09-01T00:00:00Z"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_collect_live_fleet() {
    let server = MockServer::start().await;
    mount_widgets(&server).await;

    let fleet = collector(&server).collect(&config(&server), None, &now()).await.unwrap();

    assert_eq!(fleet.last_updated, now());
    assert_eq!(fleet.tool_fleet.len(), 2);

    let widgets = &fleet.tool_fleet[0];
    assert_eq!(widgets.id, 1);
    assert_eq!(widgets.activity, WeekActivity::new([true, false, true, false, false]));
    assert_eq!(widgets.status, Status::Live);
    assert_eq!(widgets.recent_commits, 5);
    assert_eq!(widgets.trend, Trend::Stable);
    assert_eq!(widgets.users, Some(4 * 2 + 4 * 3));
    assert_eq!(widgets.repo_url, "https://github.com/acme/widgets");
    assert_eq!(widgets.stats.as_ref().and_then(|s| s.language.as_deref()), Some("Python"));

    // Unknown repositories degrade instead of failing the run
    let ghost = &fleet.tool_fleet[1];
    assert_eq!(ghost.id, 2);
    assert_eq!(ghost.activity, WeekActivity::default());
    assert_eq!(ghost.status, Status::Maint);
    assert_eq!(ghost.trend, Trend::Flat);
    assert!(ghost.stats.is_none());
    assert!(ghost.users.is_none());

    let archived = &fleet.archived[0];
    assert_eq!(archived.status, ARCHIVED_STATUS);
    assert_eq!(archived.stats.as_ref().map(|s| s.stars), Some(9));
}

#[tokio::test]
async fn test_snapshot_round_trip_takes_precedence() {
    let server = MockServer::start().await;
    mount_widgets(&server).await;

    let fleet = collector(&server).collect(&config(&server), None, &now()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = Utf8PathBuf::from_path_buf(dir.path().join("data").join("fleet-snapshot.json")).unwrap();
    fleet.save(&snapshot_path).unwrap();

    let snapshot = FleetSnapshot::load(&snapshot_path).unwrap();
    assert_eq!(snapshot.tool_fleet.len(), 2);

    let text = std::fs::read_to_string(&snapshot_path).unwrap();
    assert!(text.contains("\"toolFleet\""));
    assert!(text.contains("\"lastUpdated\""));

    // A server that knows nothing: the snapshot has to carry the answer
    let empty = MockServer::start().await;
    let refreshed = collector(&empty).collect(&config(&empty), Some(&snapshot), &now()).await.unwrap();

    let widgets = &refreshed.tool_fleet[0];
    assert_eq!(widgets.activity, WeekActivity::new([true, false, true, false, false]));
    assert_eq!(widgets.status, Status::Live);
    assert_eq!(widgets.trend, Trend::Stable);
    assert_eq!(widgets.recent_commits, 5);

    // Archived stats are always fetched live
    assert!(refreshed.archived[0].stats.is_none());
}
