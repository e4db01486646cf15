// Leaderboard engine: flattens pitcher records into per-pitch-type entries
// and ranks them (or the pitchers themselves) into independent top-N lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::{in_zone_percent, swinging_strike_rate};
use crate::models::{PitchLocation, PitchTypeRecord, PitcherRecord};
use crate::pitch_types::pitch_name;
use crate::reference::{PitcherMetric, StrikeZone};

/// Rows per leaderboard unless configured otherwise.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Ranking primitive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort `entries` by `key` in `direction` and keep the first `n`.
///
/// The input is left untouched; the result borrows from it. Entries with
/// equal keys stay in input order (`sort_by` is a stable merge sort). Keys
/// are compared with `f64::total_cmp`, so NaN keys cannot break the sort;
/// callers are expected to have excluded them already.
pub fn rank_top_n<'a, T, F>(entries: &'a [T], key: F, n: usize, direction: SortDirection) -> Vec<&'a T>
where
    F: Fn(&T) -> f64,
{
    let mut keyed: Vec<(f64, &'a T)> = entries.iter().map(|e| (key(e), e)).collect();
    keyed.sort_by(|(a, _), (b, _)| match direction {
        SortDirection::Asc => a.total_cmp(b),
        SortDirection::Desc => b.total_cmp(a),
    });
    keyed.truncate(n);
    keyed.into_iter().map(|(_, e)| e).collect()
}

/// 1-based rank of the entry at `index` in an already-sorted list.
pub fn rank_at(index: usize) -> usize {
    index + 1
}

/// How a rank is shown: medals for the podium, a plain ordinal after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMarker {
    Gold,
    Silver,
    Bronze,
    Ordinal(usize),
}

impl RankMarker {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankMarker::Gold,
            2 => RankMarker::Silver,
            3 => RankMarker::Bronze,
            n => RankMarker::Ordinal(n),
        }
    }
}

impl fmt::Display for RankMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankMarker::Gold => f.write_str("🥇"),
            RankMarker::Silver => f.write_str("🥈"),
            RankMarker::Bronze => f.write_str("🥉"),
            RankMarker::Ordinal(n) => write!(f, "{n}."),
        }
    }
}

// ---------------------------------------------------------------------------
// Pitch entries
// ---------------------------------------------------------------------------

/// One (pitcher, pitch type) pair, borrowed from the source records.
///
/// Raw values keep their missingness; the `velocity()` / `spin()` /
/// `whiff()` accessors substitute 0.0 for ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchEntry<'a> {
    pub pitcher_name: &'a str,
    pub pitch_type: &'a str,
    pub pitch_name: &'a str,
    pub avg_velocity: Option<f64>,
    pub avg_spin: Option<f64>,
    /// Upstream whiff %, or the swinging-strike rate from `locations` when
    /// upstream has none.
    pub whiff_pct: Option<f64>,
    pub in_zone_percent: f64,
    pub locations: &'a [PitchLocation],
}

impl PitchEntry<'_> {
    pub fn velocity(&self) -> f64 {
        self.avg_velocity.unwrap_or(0.0)
    }

    pub fn spin(&self) -> f64 {
        self.avg_spin.unwrap_or(0.0)
    }

    pub fn whiff(&self) -> f64 {
        self.whiff_pct.unwrap_or(0.0)
    }
}

fn effective_whiff(pitch: &PitchTypeRecord) -> Option<f64> {
    pitch.whiff_pct.or_else(|| swinging_strike_rate(&pitch.locations))
}

/// Flatten every pitcher's arsenal into entries, pitcher order first, then
/// arsenal order. Pitchers without pitch data contribute nothing.
pub fn flatten_pitch_entries<'a>(pitchers: &'a [PitcherRecord], zone: &StrikeZone) -> Vec<PitchEntry<'a>> {
    pitchers
        .iter()
        .flat_map(|pitcher| {
            pitcher.pitch_data.iter().map(move |pitch| PitchEntry {
                pitcher_name: &pitcher.name,
                pitch_type: &pitch.pitch_type,
                pitch_name: pitch_name(&pitch.pitch_type),
                avg_velocity: pitch.avg_velocity,
                avg_spin: pitch.avg_spin_rate,
                whiff_pct: effective_whiff(pitch),
                in_zone_percent: in_zone_percent(&pitch.locations, zone),
                locations: &pitch.locations,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardKind {
    Velocity,
    SpinRate,
    InZone,
    WhiffRate,
    ExitVelocity,
    InningsPitched,
}

impl LeaderboardKind {
    pub const ALL: [LeaderboardKind; 6] = [
        LeaderboardKind::Velocity,
        LeaderboardKind::SpinRate,
        LeaderboardKind::InZone,
        LeaderboardKind::WhiffRate,
        LeaderboardKind::ExitVelocity,
        LeaderboardKind::InningsPitched,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            LeaderboardKind::Velocity => "Average Velocity Leaders",
            LeaderboardKind::SpinRate => "Average Spin Rate Leaders",
            LeaderboardKind::InZone => "In Strike Zone % Leaders",
            LeaderboardKind::WhiffRate => "Whiff % Leaders",
            LeaderboardKind::ExitVelocity => "Lowest Avg Exit Velocity",
            LeaderboardKind::InningsPitched => "Innings Pitched Leaders",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            LeaderboardKind::Velocity | LeaderboardKind::ExitVelocity => "mph",
            LeaderboardKind::SpinRate => "rpm",
            LeaderboardKind::InZone | LeaderboardKind::WhiffRate => "%",
            LeaderboardKind::InningsPitched => "IP",
        }
    }

    pub fn direction(&self) -> SortDirection {
        match self {
            LeaderboardKind::ExitVelocity => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    /// Whether rows are (pitcher, pitch type) pairs rather than pitchers.
    pub fn is_per_pitch(&self) -> bool {
        !matches!(self, LeaderboardKind::ExitVelocity | LeaderboardKind::InningsPitched)
    }
}

/// A ranked row, owned so it can outlive the source payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub pitcher_name: String,
    pub pitch_type: Option<String>,
    pub pitch_name: Option<String>,
    pub value: f64,
    /// The ranked value was absent upstream and `value` is a stand-in 0.0.
    pub missing: bool,
}

impl LeaderboardRow {
    pub fn marker(&self) -> RankMarker {
        RankMarker::for_rank(self.rank)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub kind: LeaderboardKind,
    pub rows: Vec<LeaderboardRow>,
}

/// The full set of leaderboards for one payload, in [`LeaderboardKind::ALL`]
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Leaderboards {
    pub boards: Vec<Leaderboard>,
}

impl Leaderboards {
    pub fn get(&self, kind: LeaderboardKind) -> Option<&Leaderboard> {
        self.boards.iter().find(|b| b.kind == kind)
    }

    pub fn rows(&self, kind: LeaderboardKind) -> &[LeaderboardRow] {
        self.get(kind).map(|b| b.rows.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.boards.iter().all(|b| b.rows.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardSettings {
    pub size: usize,
    pub zone: StrikeZone,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_LEADERBOARD_SIZE,
            zone: StrikeZone::default(),
        }
    }
}

/// Rank (pitcher, pitch type) entries. Absent or non-finite values rank as
/// 0.0 and the row is flagged `missing`.
fn pitch_rows<'a>(
    entries: &[PitchEntry<'a>],
    size: usize,
    direction: SortDirection,
    value: impl Fn(&PitchEntry<'a>) -> Option<f64>,
) -> Vec<LeaderboardRow> {
    let finite = |e: &PitchEntry<'a>| value(e).filter(|v| v.is_finite());
    rank_top_n(entries, |e| finite(e).unwrap_or(0.0), size, direction)
        .into_iter()
        .enumerate()
        .map(|(i, e)| {
            let raw = finite(e);
            LeaderboardRow {
                rank: rank_at(i),
                pitcher_name: e.pitcher_name.to_string(),
                pitch_type: Some(e.pitch_type.to_string()),
                pitch_name: Some(e.pitch_name.to_string()),
                value: raw.unwrap_or(0.0),
                missing: raw.is_none(),
            }
        })
        .collect()
}

/// Rank pitchers on a per-pitcher metric. Pitchers without a finite value
/// are left off the board entirely.
fn pitcher_rows(
    pitchers: &[PitcherRecord],
    metric: PitcherMetric,
    size: usize,
    direction: SortDirection,
) -> Vec<LeaderboardRow> {
    let rated: Vec<(&PitcherRecord, f64)> = pitchers
        .iter()
        .filter_map(|p| metric.value(p).map(|v| (p, v)))
        .collect();

    rank_top_n(&rated, |(_, v)| *v, size, direction)
        .into_iter()
        .enumerate()
        .map(|(i, (p, v))| LeaderboardRow {
            rank: rank_at(i),
            pitcher_name: p.name.clone(),
            pitch_type: None,
            pitch_name: None,
            value: *v,
            missing: false,
        })
        .collect()
}

/// Build one leaderboard of `kind` from a payload.
pub fn build_leaderboard(
    pitchers: &[PitcherRecord],
    kind: LeaderboardKind,
    settings: &LeaderboardSettings,
) -> Leaderboard {
    let entries = if kind.is_per_pitch() {
        flatten_pitch_entries(pitchers, &settings.zone)
    } else {
        Vec::new()
    };
    leaderboard_from_entries(pitchers, &entries, kind, settings)
}

fn leaderboard_from_entries(
    pitchers: &[PitcherRecord],
    entries: &[PitchEntry<'_>],
    kind: LeaderboardKind,
    settings: &LeaderboardSettings,
) -> Leaderboard {
    let size = settings.size;
    let dir = kind.direction();
    let rows = match kind {
        LeaderboardKind::Velocity => pitch_rows(entries, size, dir, |e| e.avg_velocity),
        LeaderboardKind::SpinRate => pitch_rows(entries, size, dir, |e| e.avg_spin),
        LeaderboardKind::WhiffRate => pitch_rows(entries, size, dir, |e| e.whiff_pct),
        LeaderboardKind::InZone => pitch_rows(entries, size, dir, |e| {
            (!e.locations.is_empty()).then_some(e.in_zone_percent)
        }),
        LeaderboardKind::ExitVelocity => pitcher_rows(pitchers, PitcherMetric::AvgHitSpeed, size, dir),
        LeaderboardKind::InningsPitched => {
            pitcher_rows(pitchers, PitcherMetric::InningsPitched, size, dir)
        }
    };
    Leaderboard { kind, rows }
}

/// Build all six leaderboards. Each is ranked independently, so one
/// pitcher/pitch pair can appear on several boards or none.
pub fn build_leaderboards(pitchers: &[PitcherRecord], settings: &LeaderboardSettings) -> Leaderboards {
    let entries = flatten_pitch_entries(pitchers, &settings.zone);
    let boards = LeaderboardKind::ALL
        .into_iter()
        .map(|kind| leaderboard_from_entries(pitchers, &entries, kind, settings))
        .collect();
    Leaderboards { boards }
}

// ---------------------------------------------------------------------------
// Pitcher selection and arsenal ordering
// ---------------------------------------------------------------------------

pub fn find_pitcher<'a>(pitchers: &'a [PitcherRecord], name: &str) -> Option<&'a PitcherRecord> {
    pitchers.iter().find(|p| p.name == name)
}

/// The pitcher a view shows before the user picks one.
pub fn default_pitcher(pitchers: &[PitcherRecord]) -> Option<&PitcherRecord> {
    pitchers.first()
}

/// Arsenal sorted by usage, most used first. Pitch types without a usage
/// share sort last.
pub fn arsenal_by_usage(pitcher: &PitcherRecord) -> Vec<&PitchTypeRecord> {
    rank_top_n(
        &pitcher.pitch_data,
        |p| p.usage_pct.unwrap_or(f64::NEG_INFINITY),
        pitcher.pitch_data.len(),
        SortDirection::Desc,
    )
}

/// Arsenal sorted by whiff rate, highest first.
pub fn arsenal_by_whiff(pitcher: &PitcherRecord) -> Vec<&PitchTypeRecord> {
    rank_top_n(
        &pitcher.pitch_data,
        |p| effective_whiff(p).unwrap_or(f64::NEG_INFINITY),
        pitcher.pitch_data.len(),
        SortDirection::Desc,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
