// Shared constants: the strike zone used for in-zone calculations and the
// league-average reference values drawn on metric charts. Every consumer
// reads them from here (or from config that deserializes into these types).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{PitchLocation, PitcherRecord};
use crate::query::SortKey;

// ---------------------------------------------------------------------------
// Strike zone
// ---------------------------------------------------------------------------

/// Half the plate width plus a ball's radius, in feet.
pub const DEFAULT_ZONE_HALF_WIDTH: f64 = 0.83;
/// Bottom of the rulebook zone used across the dashboard, in feet.
pub const DEFAULT_ZONE_BOTTOM: f64 = 1.5;
/// Top of the zone, in feet.
pub const DEFAULT_ZONE_TOP: f64 = 3.5;

/// Axis-aligned strike zone rectangle at the front of the plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeZone {
    pub half_width: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Default for StrikeZone {
    fn default() -> Self {
        Self {
            half_width: DEFAULT_ZONE_HALF_WIDTH,
            bottom: DEFAULT_ZONE_BOTTOM,
            top: DEFAULT_ZONE_TOP,
        }
    }
}

impl StrikeZone {
    /// Inclusive on every edge.
    pub fn contains(&self, loc: &PitchLocation) -> bool {
        loc.plate_x.abs() <= self.half_width && loc.plate_z >= self.bottom && loc.plate_z <= self.top
    }
}

// ---------------------------------------------------------------------------
// Per-pitcher metrics
// ---------------------------------------------------------------------------

/// Which end of a metric's scale is good for the pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Better {
    Higher,
    Lower,
}

/// A scalar carried on [`PitcherRecord`] that can be charted or ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitcherMetric {
    Fip,
    StrikeoutPct,
    WalkPct,
    FirstPitchStrikePct,
    KMinusBb,
    KBbRatio,
    InningsPitched,
    AvgHitSpeed,
}

impl PitcherMetric {
    pub const ALL: [PitcherMetric; 8] = [
        PitcherMetric::Fip,
        PitcherMetric::StrikeoutPct,
        PitcherMetric::WalkPct,
        PitcherMetric::FirstPitchStrikePct,
        PitcherMetric::KMinusBb,
        PitcherMetric::KBbRatio,
        PitcherMetric::InningsPitched,
        PitcherMetric::AvgHitSpeed,
    ];

    /// Snake-case key, matching the API field name.
    pub fn key(&self) -> &'static str {
        match self {
            PitcherMetric::Fip => "fip",
            PitcherMetric::StrikeoutPct => "strikeout_pct",
            PitcherMetric::WalkPct => "walk_pct",
            PitcherMetric::FirstPitchStrikePct => "first_pitch_strike_pct",
            PitcherMetric::KMinusBb => "k_minus_bb",
            PitcherMetric::KBbRatio => "k_bb_ratio",
            PitcherMetric::InningsPitched => "innings_pitched",
            PitcherMetric::AvgHitSpeed => "avg_hit_speed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PitcherMetric::Fip => "FIP",
            PitcherMetric::StrikeoutPct => "Strikeout %",
            PitcherMetric::WalkPct => "Walk %",
            PitcherMetric::FirstPitchStrikePct => "First Pitch Strike %",
            PitcherMetric::KMinusBb => "K-BB %",
            PitcherMetric::KBbRatio => "K/BB",
            PitcherMetric::InningsPitched => "Innings Pitched",
            PitcherMetric::AvgHitSpeed => "Avg Exit Velocity",
        }
    }

    pub fn better(&self) -> Better {
        match self {
            PitcherMetric::Fip | PitcherMetric::WalkPct | PitcherMetric::AvgHitSpeed => Better::Lower,
            _ => Better::Higher,
        }
    }

    /// Whether values are percentages on a 0-100 scale.
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            PitcherMetric::StrikeoutPct | PitcherMetric::WalkPct | PitcherMetric::FirstPitchStrikePct
        )
    }

    /// The server-side `sort_by` key for this metric, if the API has one.
    pub fn sort_key(&self) -> Option<SortKey> {
        match self {
            PitcherMetric::Fip => Some(SortKey::Fip),
            PitcherMetric::StrikeoutPct => Some(SortKey::StrikeoutPct),
            PitcherMetric::WalkPct => Some(SortKey::WalkPct),
            PitcherMetric::FirstPitchStrikePct => Some(SortKey::FirstPitchStrikePct),
            PitcherMetric::KMinusBb => Some(SortKey::KMinusBb),
            PitcherMetric::KBbRatio => Some(SortKey::KBbRatio),
            PitcherMetric::InningsPitched | PitcherMetric::AvgHitSpeed => None,
        }
    }

    /// The field as stored, without any finiteness check.
    pub fn raw(&self, p: &PitcherRecord) -> Option<f64> {
        match self {
            PitcherMetric::Fip => p.fip,
            PitcherMetric::StrikeoutPct => p.strikeout_pct,
            PitcherMetric::WalkPct => p.walk_pct,
            PitcherMetric::FirstPitchStrikePct => p.first_pitch_strike_pct,
            PitcherMetric::KMinusBb => p.k_minus_bb,
            PitcherMetric::KBbRatio => p.k_bb_ratio,
            PitcherMetric::InningsPitched => p.innings_pitched,
            PitcherMetric::AvgHitSpeed => p.avg_hit_speed,
        }
    }

    /// The field if present and finite.
    pub fn value(&self, p: &PitcherRecord) -> Option<f64> {
        self.raw(p).filter(|v| v.is_finite())
    }
}

impl fmt::Display for PitcherMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}`")]
pub struct UnknownMetric(pub String);

impl FromStr for PitcherMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        PitcherMetric::ALL
            .into_iter()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Reference lines
// ---------------------------------------------------------------------------

/// League-average values per metric, used as chart reference lines and to
/// band points as better/worse than average. Missing keys in config keep
/// these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTable {
    pub fip: Option<f64>,
    pub strikeout_pct: Option<f64>,
    pub walk_pct: Option<f64>,
    pub first_pitch_strike_pct: Option<f64>,
    pub k_minus_bb: Option<f64>,
    pub k_bb_ratio: Option<f64>,
    pub innings_pitched: Option<f64>,
    pub avg_hit_speed: Option<f64>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self {
            fip: Some(4.08),
            strikeout_pct: Some(22.6),
            walk_pct: Some(8.2),
            first_pitch_strike_pct: Some(62.4),
            k_minus_bb: None,
            k_bb_ratio: Some(2.76),
            innings_pitched: None,
            avg_hit_speed: None,
        }
    }
}

impl ReferenceTable {
    pub fn get(&self, metric: PitcherMetric) -> Option<f64> {
        match metric {
            PitcherMetric::Fip => self.fip,
            PitcherMetric::StrikeoutPct => self.strikeout_pct,
            PitcherMetric::WalkPct => self.walk_pct,
            PitcherMetric::FirstPitchStrikePct => self.first_pitch_strike_pct,
            PitcherMetric::KMinusBb => self.k_minus_bb,
            PitcherMetric::KBbRatio => self.k_bb_ratio,
            PitcherMetric::InningsPitched => self.innings_pitched,
            PitcherMetric::AvgHitSpeed => self.avg_hit_speed,
        }
    }

    /// Metrics whose configured reference is not a finite number.
    pub fn non_finite(&self) -> Vec<PitcherMetric> {
        PitcherMetric::ALL
            .into_iter()
            .filter(|m| self.get(*m).is_some_and(|v| !v.is_finite()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
