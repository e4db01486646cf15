// Data sources for the dashboard: the stats HTTP API and saved JSON
// responses on disk. Both decode the `{success, data, error}` envelope and
// sanitize records before handing them to the engine.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pitchlab_stats::models::{sanitize_all, PitcherRecord};
use pitchlab_stats::query::{PitcherTypeFilter, SortKey, SortOrder, StatsQuery};
use pitchlab_stats::reference::PitcherMetric;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Result of a fetch that reached the API. `Unavailable` carries the
/// server's reason when it answered `success: false`; callers treat it as
/// empty data.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    Unavailable(String),
}

impl<T: Default> Fetched<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Fetched::Data(_))
    }

    /// The payload, or an empty one when the source was unavailable.
    pub fn into_data(self) -> T {
        match self {
            Fetched::Data(data) => data,
            Fetched::Unavailable(reason) => {
                warn!("stats source unavailable: {reason}");
                T::default()
            }
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(data) => Fetched::Data(f(data)),
            Fetched::Unavailable(reason) => Fetched::Unavailable(reason),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

fn decode_envelope<T: DeserializeOwned + Default>(text: &str, origin: &str) -> Result<Fetched<T>, SourceError> {
    let response: ApiResponse<T> = serde_json::from_str(text).map_err(|e| SourceError::Decode {
        origin: origin.to_string(),
        source: e,
    })?;
    if response.success {
        Ok(Fetched::Data(response.data.unwrap_or_default()))
    } else {
        let reason = response.error.unwrap_or_else(|| "no reason given".to_string());
        Ok(Fetched::Unavailable(reason))
    }
}

// ---------------------------------------------------------------------------
// StatsSource trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Team names, sorted and deduplicated.
    async fn teams(&self) -> Result<Fetched<Vec<String>>, SourceError>;

    /// Sanitized pitcher records matching `query`.
    async fn pitcher_stats(&self, query: &StatsQuery) -> Result<Fetched<Vec<PitcherRecord>>, SourceError>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

pub struct HttpStatsSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatsSource {
    pub fn new(api: &ApiConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pitchlab/", env!("CARGO_PKG_VERSION")))
            .timeout(api.timeout())
            .build()
            .map_err(SourceError::Client)?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_envelope<T: DeserializeOwned + Default>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<Fetched<T>, SourceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Transport { url: url.clone(), source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { url, status: status.as_u16() });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::Transport { url: url.clone(), source: e })?;
        decode_envelope(&text, &url)
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn teams(&self) -> Result<Fetched<Vec<String>>, SourceError> {
        let fetched: Fetched<Vec<String>> = self.get_envelope("teams", &[]).await?;
        Ok(fetched.map(sorted_teams))
    }

    async fn pitcher_stats(&self, query: &StatsQuery) -> Result<Fetched<Vec<PitcherRecord>>, SourceError> {
        debug!("GET pitcher-stats?{query}");
        let fetched: Fetched<Vec<PitcherRecord>> = self.get_envelope("pitcher-stats", query.params()).await?;
        Ok(fetched.map(sanitize_all))
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Serves a saved `pitcher-stats` response. Team, pitcher type, pitch/batter
/// bounds and sort order are applied locally; date filters are not, since
/// the records are already aggregated.
pub struct FileStatsSource {
    path: PathBuf,
}

impl FileStatsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Fetched<Vec<PitcherRecord>>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io { path: self.path.clone(), source: e })?;
        let origin = self.path.display().to_string();
        let fetched: Fetched<Vec<PitcherRecord>> = decode_envelope(&text, &origin)?;
        Ok(fetched.map(sanitize_all))
    }
}

#[async_trait]
impl StatsSource for FileStatsSource {
    async fn teams(&self) -> Result<Fetched<Vec<String>>, SourceError> {
        Ok(self
            .load()
            .await?
            .map(|records| sorted_teams(records.into_iter().filter_map(|r| r.team).collect())))
    }

    async fn pitcher_stats(&self, query: &StatsQuery) -> Result<Fetched<Vec<PitcherRecord>>, SourceError> {
        let fetched = self.load().await?;
        Ok(fetched.map(|records| {
            let total = records.len();
            let kept = apply_query(records, query);
            info!("{}: {} of {total} pitchers match {query}", self.path.display(), kept.len());
            kept
        }))
    }
}

fn sorted_teams(mut teams: Vec<String>) -> Vec<String> {
    teams.sort();
    teams.dedup();
    teams
}

// ---------------------------------------------------------------------------
// Local query evaluation
// ---------------------------------------------------------------------------

fn param_u32(query: &StatsQuery, key: &str) -> Option<u32> {
    let raw = query.get(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring non-numeric {key}={raw}");
            None
        }
    }
}

fn within(value: Option<u32>, min: Option<u32>, max: Option<u32>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
}

fn sort_metric(key: SortKey) -> Option<PitcherMetric> {
    PitcherMetric::ALL.into_iter().find(|m| m.sort_key() == Some(key))
}

/// Compare two records on `key`, ascending. Missing metric values compare
/// greater than any present one.
fn compare(a: &PitcherRecord, b: &PitcherRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Team => a.team.cmp(&b.team),
        other => {
            let Some(metric) = sort_metric(other) else {
                return Ordering::Equal;
            };
            match (metric.value(a), metric.value(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }
}

/// Filter and sort `records` the way the stats API would for `query`.
pub fn apply_query(records: Vec<PitcherRecord>, query: &StatsQuery) -> Vec<PitcherRecord> {
    let team = query.get("team").map(str::to_lowercase);
    let pitcher_type = query
        .get("pitcher_type")
        .and_then(PitcherTypeFilter::from_api_code)
        .unwrap_or_default();
    let (min_pitches, max_pitches) = (param_u32(query, "min_pitches"), param_u32(query, "max_pitches"));
    let (min_batters, max_batters) = (param_u32(query, "min_batters"), param_u32(query, "max_batters"));

    let mut kept: Vec<PitcherRecord> = records
        .into_iter()
        .filter(|r| match &team {
            Some(team) => r.team.as_deref().is_some_and(|t| t.to_lowercase() == *team),
            None => true,
        })
        .filter(|r| pitcher_type.matches(r.pitcher_type))
        .filter(|r| within(r.total_pitches, min_pitches, max_pitches))
        .filter(|r| within(r.total_batters, min_batters, max_batters))
        .collect();

    let key = query.get("sort_by").and_then(|s| s.parse::<SortKey>().ok());
    let order = query
        .get("order")
        .and_then(|s| s.parse::<SortOrder>().ok())
        .unwrap_or_default();
    if let Some(key) = key {
        kept.sort_by(|a, b| {
            let ord = compare(a, b, key);
            // Missing values stay last in either direction.
            if order == SortOrder::Desc && is_missing(a, key) == is_missing(b, key) {
                ord.reverse()
            } else {
                ord
            }
        });
    }
    kept
}

fn is_missing(record: &PitcherRecord, key: SortKey) -> bool {
    sort_metric(key).is_some_and(|m| m.value(record).is_none())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pitchlab_stats::models::PitcherType;
    use pitchlab_stats::query::{build_query, FilterSpec};

    fn record(name: &str, team: &str, kind: PitcherType, pitches: u32, k: Option<f64>) -> PitcherRecord {
        PitcherRecord {
            name: name.into(),
            team: Some(team.into()),
            pitcher_type: kind,
            innings_pitched: Some(10.0),
            avg_hit_speed: None,
            fip: None,
            strikeout_pct: k,
            walk_pct: None,
            first_pitch_strike_pct: None,
            k_minus_bb: None,
            k_bb_ratio: None,
            total_pitches: Some(pitches),
            total_batters: Some(pitches / 4),
            pitch_data: Vec::new(),
        }
    }

    fn names(records: &[PitcherRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn envelope_success_and_failure() {
        let ok: Fetched<Vec<String>> = decode_envelope(r#"{"success":true,"data":["A","B"],"error":null}"#, "t").unwrap();
        assert_eq!(ok, Fetched::Data(vec!["A".to_string(), "B".to_string()]));

        let down: Fetched<Vec<String>> =
            decode_envelope(r#"{"success":false,"data":[],"error":"db offline"}"#, "t").unwrap();
        assert_eq!(down, Fetched::Unavailable("db offline".into()));
        assert!(down.into_data().is_empty());

        let null_data: Fetched<Vec<String>> = decode_envelope(r#"{"success":true,"data":null}"#, "t").unwrap();
        assert_eq!(null_data, Fetched::Data(Vec::new()));
    }

    #[test]
    fn envelope_with_wrong_shape_is_a_decode_error() {
        let err = decode_envelope::<Vec<String>>(r#"{"success":true,"data":{"not":"a list"}}"#, "t").unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[test]
    fn apply_query_filters_team_type_and_bounds() {
        let records = vec![
            record("Cease", "San Diego Padres", PitcherType::Starter, 571, Some(31.4)),
            record("Suarez", "San Diego Padres", PitcherType::Reliever, 162, Some(24.4)),
            record("Seager", "Texas Rangers", PitcherType::Starter, 400, Some(20.0)),
            record("King", "san diego padres", PitcherType::Starter, 90, Some(27.1)),
        ];
        let filters = FilterSpec {
            min_pitches: Some(100),
            pitcher_type: PitcherTypeFilter::Starter,
            ..Default::default()
        };
        let query = build_query("San Diego Padres", SortKey::Name, SortOrder::Asc, &filters);
        assert_eq!(names(&apply_query(records.clone(), &query)), vec!["Cease"]);

        let query = build_query("SAN DIEGO PADRES", SortKey::StrikeoutPct, SortOrder::Desc, &FilterSpec::default());
        assert_eq!(names(&apply_query(records, &query)), vec!["Cease", "King", "Suarez"]);
    }

    #[test]
    fn missing_sort_values_go_last_both_ways() {
        let records = vec![
            record("NoK", "T", PitcherType::Starter, 100, None),
            record("High", "T", PitcherType::Starter, 100, Some(30.0)),
            record("Low", "T", PitcherType::Starter, 100, Some(10.0)),
        ];
        let desc = build_query("T", SortKey::StrikeoutPct, SortOrder::Desc, &FilterSpec::default());
        assert_eq!(names(&apply_query(records.clone(), &desc)), vec!["High", "Low", "NoK"]);
        let asc = build_query("T", SortKey::StrikeoutPct, SortOrder::Asc, &FilterSpec::default());
        assert_eq!(names(&apply_query(records, &asc)), vec!["Low", "High", "NoK"]);
    }

    #[test]
    fn bounds_exclude_records_without_counts() {
        assert!(within(None, None, None));
        assert!(!within(None, Some(1), None));
        assert!(within(Some(10), Some(10), Some(10)));
        assert!(!within(Some(11), None, Some(10)));
    }
}
