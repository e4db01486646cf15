// Metrics derived from per-pitch location data: in-zone rate and
// swing-and-miss filtering.

use crate::models::PitchLocation;
use crate::reference::StrikeZone;

/// Percentage (0-100) of `locations` inside `zone`.
///
/// Returns 0.0 for an empty slice.
pub fn in_zone_percent(locations: &[PitchLocation], zone: &StrikeZone) -> f64 {
    if locations.is_empty() {
        return 0.0;
    }
    let in_zone = locations.iter().filter(|loc| zone.contains(loc)).count();
    (in_zone as f64 / locations.len() as f64) * 100.0
}

/// The pitches that drew a swing and miss, in input order.
pub fn swinging_strikes(locations: &[PitchLocation]) -> Vec<&PitchLocation> {
    locations.iter().filter(|loc| loc.swinging_strike).collect()
}

/// Swinging strikes per pitch thrown, as a percentage.
///
/// This is the fallback whiff rate when the feed carries no `whiff_pct`.
/// `None` when there are no pitches to measure.
pub fn swinging_strike_rate(locations: &[PitchLocation]) -> Option<f64> {
    if locations.is_empty() {
        return None;
    }
    let misses = locations.iter().filter(|loc| loc.swinging_strike).count();
    Some((misses as f64 / locations.len() as f64) * 100.0)
}

/// Pitch and whiff counts split by zone membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneSplit {
    pub in_zone: usize,
    pub out_of_zone: usize,
    pub in_zone_whiffs: usize,
    pub chase_whiffs: usize,
}

impl ZoneSplit {
    pub fn total(&self) -> usize {
        self.in_zone + self.out_of_zone
    }

    pub fn whiffs(&self) -> usize {
        self.in_zone_whiffs + self.chase_whiffs
    }
}

pub fn zone_split(locations: &[PitchLocation], zone: &StrikeZone) -> ZoneSplit {
    locations.iter().fold(ZoneSplit::default(), |mut split, loc| {
        match (zone.contains(loc), loc.swinging_strike) {
            (true, true) => {
                split.in_zone += 1;
                split.in_zone_whiffs += 1;
            }
            (true, false) => split.in_zone += 1,
            (false, true) => {
                split.out_of_zone += 1;
                split.chase_whiffs += 1;
            }
            (false, false) => split.out_of_zone += 1,
        }
        split
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
