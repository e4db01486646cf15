// Integration tests for the data sources and dashboard against a mock stats
// API and saved responses.

use std::sync::Arc;

use pitchlab_core::config::{ApiConfig, ChartsConfig, Config, LeaderboardsConfig, SessionConfig};
use pitchlab_core::dashboard::{Dashboard, DashboardRequest, RefreshOutcome};
use pitchlab_core::source::{Fetched, FileStatsSource, HttpStatsSource, SourceError, StatsSource};
use pitchlab_stats::leaderboard::LeaderboardKind;
use pitchlab_stats::query::{build_query, FilterSpec, PitcherTypeFilter, RawFilters, SeasonWindow, SortKey, SortOrder};
use pitchlab_stats::reference::{PitcherMetric, ReferenceTable, StrikeZone};

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===========================================================================
// Test helpers
// ===========================================================================

const FIXTURES: &str = "tests/fixtures";

fn fixture(name: &str) -> String {
    let path = format!("{FIXTURES}/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

fn json_response(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(fixture(name), "application/json")
}

fn config_for(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        season: SeasonWindow::default(),
        strike_zone: StrikeZone::default(),
        leaderboards: LeaderboardsConfig { size: 5 },
        charts: ChartsConfig { limit: 20 },
        reference_lines: ReferenceTable::default(),
        session: SessionConfig::default(),
    }
}

async fn mock_api() -> (MockServer, HttpStatsSource) {
    let server = MockServer::start().await;
    let config = config_for(&format!("{}/api/v1", server.uri()));
    let source = HttpStatsSource::new(&config.api).expect("client should build");
    (server, source)
}

// ===========================================================================
// HTTP source
// ===========================================================================

#[tokio::test]
async fn lists_teams() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/teams"))
        .respond_with(json_response("teams_response.json"))
        .expect(1)
        .mount(&server)
        .await;

    let teams = source.teams().await.unwrap().into_data();
    assert_eq!(teams, vec!["Chicago Cubs", "San Diego Padres", "Texas Rangers"]);
}

#[tokio::test]
async fn teams_are_sorted_whatever_the_server_order() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success":true,"data":["Texas Rangers","Chicago Cubs","Texas Rangers"],"error":null}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let teams = source.teams().await.unwrap().into_data();
    assert_eq!(teams, vec!["Chicago Cubs", "Texas Rangers"]);
}

#[tokio::test]
async fn sends_only_set_filters() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pitcher-stats"))
        .and(query_param("team", "San Diego Padres"))
        .and(query_param("sort_by", "strikeout_pct"))
        .and(query_param("order", "desc"))
        .and(query_param("min_pitches", "50"))
        .and(query_param("pitcher_type", "S"))
        .and(query_param_is_missing("start_date"))
        .and(query_param_is_missing("end_date"))
        .and(query_param_is_missing("max_pitches"))
        .and(query_param_is_missing("min_batters"))
        .and(query_param_is_missing("max_batters"))
        .respond_with(json_response("pitcher_stats_response.json"))
        .expect(1)
        .mount(&server)
        .await;

    let raw = RawFilters {
        start_date: "".into(),
        min_pitches: "50".into(),
        pitcher_type: "starter".into(),
        ..Default::default()
    };
    let query = build_query("San Diego Padres", SortKey::StrikeoutPct, SortOrder::Desc, &raw.parse().unwrap());
    let fetched = source.pitcher_stats(&query).await.unwrap();
    assert!(fetched.is_available());
    assert_eq!(fetched.into_data().len(), 4);
}

#[tokio::test]
async fn success_false_is_unavailable() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pitcher-stats"))
        .respond_with(json_response("unavailable_response.json"))
        .mount(&server)
        .await;

    let query = build_query("San Diego Padres", SortKey::Name, SortOrder::Desc, &FilterSpec::default());
    match source.pitcher_stats(&query).await.unwrap() {
        Fetched::Unavailable(reason) => assert!(reason.contains("padres_project_data.csv")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/teams"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source.teams().await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 503, .. }), "got {err}");
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pitcher-stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"success":true,"data":"nope"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let query = build_query("X", SortKey::Name, SortOrder::Desc, &FilterSpec::default());
    let err = source.pitcher_stats(&query).await.unwrap_err();
    assert!(matches!(err, SourceError::Decode { .. }), "got {err}");
}

// ===========================================================================
// File source
// ===========================================================================

#[tokio::test]
async fn file_source_applies_team_and_type() {
    let source = FileStatsSource::new(format!("{FIXTURES}/pitcher_stats_response.json"));

    let teams = source.teams().await.unwrap().into_data();
    assert_eq!(teams, vec!["San Diego Padres", "Texas Rangers"]);

    let filters = FilterSpec {
        pitcher_type: PitcherTypeFilter::Starter,
        ..Default::default()
    };
    let query = build_query("san diego padres", SortKey::Fip, SortOrder::Asc, &filters);
    let records = source.pitcher_stats(&query).await.unwrap().into_data();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Dylan Cease", "Michael King"]);
}

#[tokio::test]
async fn file_source_missing_file_is_io_error() {
    let source = FileStatsSource::new(format!("{FIXTURES}/does_not_exist.json"));
    let err = source.teams().await.unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }));
}

// ===========================================================================
// Dashboard over HTTP
// ===========================================================================

#[tokio::test]
async fn dashboard_builds_boards_and_charts_from_api() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pitcher-stats"))
        .respond_with(json_response("pitcher_stats_response.json"))
        .mount(&server)
        .await;

    let config = config_for(&format!("{}/api/v1", server.uri()));
    let dashboard = Dashboard::new(Arc::new(source), &config);
    let outcome = dashboard
        .refresh(&DashboardRequest::for_team("San Diego Padres"))
        .await
        .unwrap();
    let RefreshOutcome::Published(snapshot) = outcome else {
        panic!("expected a published snapshot");
    };

    let velocity = snapshot.leaderboards.rows(LeaderboardKind::Velocity);
    assert_eq!(velocity[0].pitcher_name, "Robert Suarez");
    assert_eq!(velocity[0].value, 98.4);

    // Suarez has no exit velocity and is left off that board.
    let exit: Vec<&str> = snapshot
        .leaderboards
        .rows(LeaderboardKind::ExitVelocity)
        .iter()
        .map(|r| r.pitcher_name.as_str())
        .collect();
    assert_eq!(exit, vec!["Dylan Cease", "Michael King", "Nathan Eovaldi"]);

    let in_zone = snapshot.leaderboards.rows(LeaderboardKind::InZone);
    let slider = in_zone.iter().find(|r| r.pitch_type.as_deref() == Some("SL")).unwrap();
    assert_eq!(slider.value, 50.0);

    let chart = dashboard.chart(PitcherMetric::KBbRatio).unwrap();
    assert_eq!(chart.points[0].label, "Robert Suarez");
    assert_eq!(chart.domain.unwrap().max, 5.0);
}

#[tokio::test]
async fn dashboard_with_unavailable_api_has_empty_boards() {
    let (server, source) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pitcher-stats"))
        .respond_with(json_response("unavailable_response.json"))
        .mount(&server)
        .await;

    let config = config_for(&format!("{}/api/v1", server.uri()));
    let dashboard = Dashboard::new(Arc::new(source), &config);
    dashboard
        .refresh(&DashboardRequest::for_team("San Diego Padres"))
        .await
        .unwrap();

    let snapshot = dashboard.snapshot().unwrap();
    assert!(snapshot.leaderboards.is_empty());
    assert!(snapshot.unavailable.is_some());
}
