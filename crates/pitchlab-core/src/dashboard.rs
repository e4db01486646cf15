// Dashboard orchestration: fetch records for a team and filter selection,
// derive leaderboards, and serve charts from the latest published snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use pitchlab_stats::chart::{arsenal_series, ChartData, MetricChart, SeriesPoint};
use pitchlab_stats::leaderboard::{
    build_leaderboards, default_pitcher, find_pitcher, LeaderboardSettings, Leaderboards,
};
use pitchlab_stats::models::PitcherRecord;
use pitchlab_stats::query::{build_query, FilterSpec, SeasonWindow, SortKey, SortOrder, StatsQuery};
use pitchlab_stats::reference::{PitcherMetric, ReferenceTable};
use tracing::{debug, info};

use crate::config::Config;
use crate::refresh::RefreshGate;
use crate::source::{Fetched, StatsSource};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What to load: one team, a server-side sort, and the filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub team: String,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub filters: FilterSpec,
}

impl DashboardRequest {
    pub fn for_team(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            sort_key: SortKey::Name,
            sort_order: SortOrder::default(),
            filters: FilterSpec::default(),
        }
    }
}

/// Everything derived from one completed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub generation: u64,
    pub team: String,
    pub query: StatsQuery,
    pub records: Vec<PitcherRecord>,
    pub leaderboards: Leaderboards,
    /// Server-reported reason when the stats API answered `success: false`.
    pub unavailable: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Published(Arc<Snapshot>),
    /// A newer refresh started while this one was in flight; its result was
    /// dropped.
    Stale { generation: u64 },
}

/// Arsenal view for one pitcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ArsenalView {
    pub pitcher: PitcherRecord,
    pub usage: Vec<SeriesPoint>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard {
    source: Arc<dyn StatsSource>,
    season: SeasonWindow,
    settings: LeaderboardSettings,
    references: ReferenceTable,
    chart_limit: usize,
    gate: RefreshGate,
    current: Mutex<Option<Arc<Snapshot>>>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn StatsSource>, config: &Config) -> Self {
        Self {
            source,
            season: config.season,
            settings: config.leaderboard_settings(),
            references: config.reference_lines.clone(),
            chart_limit: config.charts.limit,
            gate: RefreshGate::new(),
            current: Mutex::new(None),
        }
    }

    pub async fn teams(&self) -> Result<Vec<String>> {
        let fetched = self.source.teams().await.context("fetching team list")?;
        Ok(fetched.into_data())
    }

    /// Fetch and derive a snapshot for `request`. The result is published
    /// only if no newer refresh started in the meantime.
    pub async fn refresh(&self, request: &DashboardRequest) -> Result<RefreshOutcome> {
        request
            .filters
            .validate(&self.season)
            .context("invalid filter selection")?;

        let token = self.gate.begin();
        let query = build_query(&request.team, request.sort_key, request.sort_order, &request.filters);
        debug!("refresh #{} started: {query}", token.generation());

        let fetched = self
            .source
            .pitcher_stats(&query)
            .await
            .with_context(|| format!("fetching pitcher stats for {}", request.team))?;
        let unavailable = match &fetched {
            Fetched::Unavailable(reason) => Some(reason.clone()),
            Fetched::Data(_) => None,
        };
        let records = fetched.into_data();
        let leaderboards = build_leaderboards(&records, &self.settings);

        let snapshot = Arc::new(Snapshot {
            generation: token.generation(),
            team: request.team.clone(),
            query,
            records,
            leaderboards,
            unavailable,
        });

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.gate.is_current(token) {
            debug!(
                "discarding stale refresh (gen: {}, latest: {})",
                token.generation(),
                self.gate.latest()
            );
            return Ok(RefreshOutcome::Stale {
                generation: token.generation(),
            });
        }
        info!(
            "loaded {} pitchers for {} (gen: {})",
            snapshot.records.len(),
            snapshot.team,
            snapshot.generation
        );
        *current = Some(Arc::clone(&snapshot));
        Ok(RefreshOutcome::Published(snapshot))
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot()
            .context("no data loaded yet; refresh the dashboard first")
    }

    /// Chart one metric over the current snapshot.
    pub fn chart(&self, metric: PitcherMetric) -> Result<ChartData> {
        let snapshot = self.require_snapshot()?;
        let chart = MetricChart::for_metric(metric, &self.references).with_limit(self.chart_limit);
        chart
            .build(&snapshot.records)
            .with_context(|| format!("building {} chart", metric.label()))
    }

    /// Arsenal for `pitcher`, or for the first pitcher when none is named.
    /// `None` when the pitcher is unknown or nothing is loaded.
    pub fn arsenal(&self, pitcher: Option<&str>) -> Result<Option<ArsenalView>> {
        let snapshot = self.require_snapshot()?;
        let found = match pitcher {
            Some(name) => find_pitcher(&snapshot.records, name),
            None => default_pitcher(&snapshot.records),
        };
        Ok(found.map(|p| ArsenalView {
            pitcher: p.clone(),
            usage: arsenal_series(p),
        }))
    }

    pub fn settings(&self) -> &LeaderboardSettings {
        &self.settings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
