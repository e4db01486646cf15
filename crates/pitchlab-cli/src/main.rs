mod cli;
mod render;

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use pitchlab_core::config::{self, Config};
use pitchlab_core::dashboard::{Dashboard, DashboardRequest, RefreshOutcome, Snapshot};
use pitchlab_core::session::{FileTeamStore, MemoryTeamStore, SessionContext, TeamStore};
use pitchlab_core::source::{FileStatsSource, HttpStatsSource, StatsSource};
use pitchlab_stats::chart::MetricChart;
use pitchlab_stats::query::{SortKey, SortOrder};
use pitchlab_stats::reference::{Better, PitcherMetric};

use crate::cli::{Cli, Command, FilterArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::load_config_at(&cli.config_dir).context("failed to load configuration")?;
    info!("configuration loaded from {}", cli.config_dir.display());

    let source: Arc<dyn StatsSource> = match &cli.input {
        Some(path) => {
            info!("reading pitcher stats from {}", path.display());
            Arc::new(FileStatsSource::new(path))
        }
        None => Arc::new(HttpStatsSource::new(&config.api).context("failed to build HTTP client")?),
    };
    let dashboard = Dashboard::new(source, &config);
    let session = open_session(&config);

    match cli.command {
        Command::Teams => {
            let teams = dashboard.teams().await?;
            let current = remembered_team(&session);
            render::write_teams(&mut std::io::stdout().lock(), &teams, current.as_deref())?;
        }
        Command::Leaderboards { team, filters } => {
            let team = pick_team(&session, team.as_deref())?;
            let snapshot = load(&dashboard, request(team, &filters, SortKey::Name, SortOrder::Desc)?).await?;
            let mut out = std::io::stdout().lock();
            report_unavailable(&mut out, &snapshot)?;
            render::write_leaderboards(&mut out, &snapshot.leaderboards)?;
        }
        Command::Arsenal { pitcher, team, filters } => {
            let team = pick_team(&session, team.as_deref())?;
            let snapshot = load(&dashboard, request(team, &filters, SortKey::Name, SortOrder::Desc)?).await?;
            let mut out = std::io::stdout().lock();
            report_unavailable(&mut out, &snapshot)?;
            match dashboard.arsenal(pitcher.as_deref())? {
                Some(view) => render::write_arsenal(&mut out, &view, &dashboard.settings().zone)?,
                None => match pitcher {
                    Some(name) => writeln!(out, "No pitcher named '{name}' for {}.", snapshot.team)?,
                    None => writeln!(out, "No pitchers for {}.", snapshot.team)?,
                },
            }
        }
        Command::Chart {
            metric,
            team,
            limit,
            csv,
            filters,
        } => {
            let team = pick_team(&session, team.as_deref())?;
            let (sort_key, sort_order) = chart_sort(metric);
            let snapshot = load(&dashboard, request(team, &filters, sort_key, sort_order)?).await?;
            let chart = match limit {
                Some(limit) => MetricChart::for_metric(metric, &config.reference_lines)
                    .with_limit(limit)
                    .build(&snapshot.records)
                    .with_context(|| format!("building {} chart", metric.label()))?,
                None => dashboard.chart(metric)?,
            };
            let mut out = std::io::stdout().lock();
            report_unavailable(&mut out, &snapshot)?;
            render::write_chart(&mut out, &chart)?;
            if let Some(path) = csv {
                render::export_series_csv(&path, &chart.points)?;
                info!("wrote {} points to {}", chart.points.len(), path.display());
            }
        }
    }

    Ok(())
}

/// Initialize tracing. Logs go to stderr so stdout stays clean for output.
fn init_tracing() -> anyhow::Result<()> {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pitchlab=info,warn")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;
    Ok(())
}

fn open_session(config: &Config) -> SessionContext {
    let store: Box<dyn TeamStore> = match FileTeamStore::from_config(&config.session) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("team selection will not be remembered: {e}");
            Box::new(MemoryTeamStore::default())
        }
    };
    SessionContext::new(store, config.session.default_team.clone())
}

/// The remembered team, for display only. Store failures are logged and
/// treated as no selection.
fn remembered_team(session: &SessionContext) -> Option<String> {
    match session.last_team() {
        Ok(team) => team,
        Err(e) => {
            warn!("could not read the remembered team: {e}");
            None
        }
    }
}

fn pick_team(session: &SessionContext, explicit: Option<&str>) -> anyhow::Result<String> {
    match session.resolve_team(explicit)? {
        Some(team) => Ok(team),
        None => bail!("no team selected; pass --team"),
    }
}

fn request(team: String, filters: &FilterArgs, sort_key: SortKey, sort_order: SortOrder) -> anyhow::Result<DashboardRequest> {
    let filters = filters.to_raw().parse().context("invalid filter")?;
    Ok(DashboardRequest {
        team,
        sort_key,
        sort_order,
        filters,
    })
}

/// Server-side sort matching the chart's best-first order.
fn chart_sort(metric: PitcherMetric) -> (SortKey, SortOrder) {
    let order = match metric.better() {
        Better::Higher => SortOrder::Desc,
        Better::Lower => SortOrder::Asc,
    };
    (metric.sort_key().unwrap_or(SortKey::Name), order)
}

async fn load(dashboard: &Dashboard, request: DashboardRequest) -> anyhow::Result<Arc<Snapshot>> {
    match dashboard.refresh(&request).await? {
        RefreshOutcome::Published(snapshot) => Ok(snapshot),
        // Only one refresh runs per invocation.
        RefreshOutcome::Stale { generation } => bail!("refresh #{generation} was superseded"),
    }
}

fn report_unavailable<W: Write>(out: &mut W, snapshot: &Snapshot) -> std::io::Result<()> {
    match &snapshot.unavailable {
        Some(reason) => writeln!(out, "Data unavailable for {}: {reason}\n", snapshot.team),
        None => Ok(()),
    }
}
