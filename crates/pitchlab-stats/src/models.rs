// Pitcher stat records as delivered by the stats API, plus the one-time
// normalization applied when a payload crosses into the engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Starter or reliever. The API spells these either in full or as the
/// single-letter codes it also accepts as a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitcherType {
    #[serde(alias = "S", alias = "starter")]
    Starter,
    #[serde(alias = "R", alias = "reliever")]
    Reliever,
}

impl PitcherType {
    /// The code the stats API uses for this type in `pitcher_type`.
    pub fn code(&self) -> &'static str {
        match self {
            PitcherType::Starter => "S",
            PitcherType::Reliever => "R",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PitcherType::Starter => "Starter",
            PitcherType::Reliever => "Reliever",
        }
    }
}

/// Where a single pitch crossed the plate.
///
/// `plate_x` is in feet from the center of the plate, catcher's view
/// (positive is the catcher's right); `plate_z` is in feet above the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchLocation {
    pub plate_x: f64,
    pub plate_z: f64,
    #[serde(default)]
    pub swinging_strike: bool,
}

/// One pitch type in a pitcher's arsenal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchTypeRecord {
    pub pitch_type: String,
    /// Share of the pitcher's pitches of this type, 0-100.
    #[serde(default)]
    pub usage_pct: Option<f64>,
    #[serde(default)]
    pub avg_velocity: Option<f64>,
    #[serde(default)]
    pub avg_spin_rate: Option<f64>,
    #[serde(default)]
    pub whiff_pct: Option<f64>,
    #[serde(default)]
    pub locations: Vec<PitchLocation>,
}

/// Season (or date-window) line for one pitcher.
///
/// Every scalar besides `name` and `pitcher_type` is nullable upstream; a
/// `None` means "not available" and is never the same thing as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherRecord {
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(rename = "type")]
    pub pitcher_type: PitcherType,
    #[serde(default)]
    pub innings_pitched: Option<f64>,
    #[serde(default)]
    pub avg_hit_speed: Option<f64>,
    #[serde(default)]
    pub fip: Option<f64>,
    #[serde(default)]
    pub strikeout_pct: Option<f64>,
    #[serde(default)]
    pub walk_pct: Option<f64>,
    #[serde(default)]
    pub first_pitch_strike_pct: Option<f64>,
    #[serde(default)]
    pub k_minus_bb: Option<f64>,
    #[serde(default)]
    pub k_bb_ratio: Option<f64>,
    #[serde(default)]
    pub total_pitches: Option<u32>,
    #[serde(default)]
    pub total_batters: Option<u32>,
    #[serde(default)]
    pub pitch_data: Vec<PitchTypeRecord>,
}

// ---------------------------------------------------------------------------
// Boundary normalization
// ---------------------------------------------------------------------------

/// Keep `value` only if it is finite; log what was dropped.
fn finite_or_none(pitcher: &str, field: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if !v.is_finite() => {
            debug!("pitcher '{pitcher}': dropping non-finite {field} ({v})");
            None
        }
        other => other,
    }
}

impl PitchTypeRecord {
    /// False when a usage share is present but not a finite value in [0, 100].
    pub fn has_valid_usage(&self) -> bool {
        self.usage_pct
            .map_or(true, |u| u.is_finite() && (0.0..=100.0).contains(&u))
    }

    fn sanitize(mut self, pitcher: &str) -> Self {
        let label = format!("{pitcher}/{}", self.pitch_type);
        self.avg_velocity = finite_or_none(&label, "avg_velocity", self.avg_velocity);
        self.avg_spin_rate = finite_or_none(&label, "avg_spin_rate", self.avg_spin_rate);
        self.whiff_pct = finite_or_none(&label, "whiff_pct", self.whiff_pct);

        let before = self.locations.len();
        self.locations
            .retain(|loc| loc.plate_x.is_finite() && loc.plate_z.is_finite());
        if self.locations.len() < before {
            debug!(
                "{label}: dropped {} locations with non-finite coordinates",
                before - self.locations.len()
            );
        }
        self
    }
}

impl PitcherRecord {
    /// Normalize a freshly decoded record so downstream code can trust it:
    /// non-finite scalars become `None`, negative innings become `None`,
    /// pitch types with an unusable usage share are dropped, and locations
    /// with non-finite coordinates are dropped.
    pub fn sanitize(mut self) -> Self {
        let name = self.name.clone();

        self.innings_pitched = match finite_or_none(&name, "innings_pitched", self.innings_pitched) {
            Some(ip) if ip < 0.0 => {
                warn!("pitcher '{name}': negative innings_pitched ({ip}), treating as missing");
                None
            }
            other => other,
        };
        self.avg_hit_speed = finite_or_none(&name, "avg_hit_speed", self.avg_hit_speed);
        self.fip = finite_or_none(&name, "fip", self.fip);
        self.strikeout_pct = finite_or_none(&name, "strikeout_pct", self.strikeout_pct);
        self.walk_pct = finite_or_none(&name, "walk_pct", self.walk_pct);
        self.first_pitch_strike_pct =
            finite_or_none(&name, "first_pitch_strike_pct", self.first_pitch_strike_pct);
        self.k_minus_bb = finite_or_none(&name, "k_minus_bb", self.k_minus_bb);
        self.k_bb_ratio = finite_or_none(&name, "k_bb_ratio", self.k_bb_ratio);

        self.pitch_data = std::mem::take(&mut self.pitch_data)
            .into_iter()
            .filter(|pitch| {
                let ok = pitch.has_valid_usage();
                if !ok {
                    warn!(
                        "pitcher '{name}': skipping pitch type '{}': usage_pct {:?} outside 0-100",
                        pitch.pitch_type, pitch.usage_pct
                    );
                }
                ok
            })
            .map(|pitch| pitch.sanitize(&name))
            .collect();

        self
    }
}

/// Sanitize a whole payload, preserving order.
pub fn sanitize_all(records: Vec<PitcherRecord>) -> Vec<PitcherRecord> {
    records.into_iter().map(PitcherRecord::sanitize).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
