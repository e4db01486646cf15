// Filter/query builder: turns a dashboard filter selection into the
// normalized parameter list the pitcher-stats endpoint expects.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leaderboard::SortDirection;
use crate::models::PitcherType;

/// Wire format for every date parameter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid number for `{field}`: {value:?} (expected a non-negative integer)")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date for `{field}`: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown pitcher type {0:?} (expected all, starter or reliever)")]
    InvalidPitcherType(String),

    #[error("unknown sort key {0:?}")]
    InvalidSortKey(String),

    #[error("unknown sort order {0:?} (expected asc or desc)")]
    InvalidSortOrder(String),

    #[error("`{field}` {date} is outside the season window {start}..={end}")]
    DateOutsideSeason {
        field: &'static str,
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("`{min_field}` is greater than `{max_field}`")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Sort key / order
// ---------------------------------------------------------------------------

/// Server-side sort keys accepted by `sort_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Team,
    FirstPitchStrikePct,
    StrikeoutPct,
    WalkPct,
    KMinusBb,
    KBbRatio,
    Fip,
}

impl SortKey {
    const ALL: [SortKey; 8] = [
        SortKey::Name,
        SortKey::Team,
        SortKey::FirstPitchStrikePct,
        SortKey::StrikeoutPct,
        SortKey::WalkPct,
        SortKey::KMinusBb,
        SortKey::KBbRatio,
        SortKey::Fip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Team => "team",
            SortKey::FirstPitchStrikePct => "first_pitch_strike_pct",
            SortKey::StrikeoutPct => "strikeout_pct",
            SortKey::WalkPct => "walk_pct",
            SortKey::KMinusBb => "k_minus_bb",
            SortKey::KBbRatio => "k_bb_ratio",
            SortKey::Fip => "fip",
        }
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| QueryError::InvalidSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn direction(&self) -> SortDirection {
        match self {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(QueryError::InvalidSortOrder(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Pitcher type filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitcherTypeFilter {
    #[default]
    All,
    Starter,
    Reliever,
}

impl PitcherTypeFilter {
    /// The `pitcher_type` value to send, or `None` to leave the parameter
    /// out. This is the only place the starter/reliever codes are mapped.
    pub fn api_code(&self) -> Option<&'static str> {
        match self {
            PitcherTypeFilter::All => None,
            PitcherTypeFilter::Starter => Some(PitcherType::Starter.code()),
            PitcherTypeFilter::Reliever => Some(PitcherType::Reliever.code()),
        }
    }

    pub fn matches(&self, pitcher_type: PitcherType) -> bool {
        match self {
            PitcherTypeFilter::All => true,
            PitcherTypeFilter::Starter => pitcher_type == PitcherType::Starter,
            PitcherTypeFilter::Reliever => pitcher_type == PitcherType::Reliever,
        }
    }

    /// Inverse of [`api_code`](Self::api_code); also accepts `all`.
    pub fn from_api_code(code: &str) -> Option<Self> {
        match code {
            "all" => Some(PitcherTypeFilter::All),
            "S" => Some(PitcherTypeFilter::Starter),
            "R" => Some(PitcherTypeFilter::Reliever),
            _ => None,
        }
    }
}

impl FromStr for PitcherTypeFilter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(PitcherTypeFilter::All),
            "starter" => Ok(PitcherTypeFilter::Starter),
            "reliever" => Ok(PitcherTypeFilter::Reliever),
            _ => Err(QueryError::InvalidPitcherType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Season window
// ---------------------------------------------------------------------------

/// Inclusive range of dates the data set covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for SeasonWindow {
    fn default() -> Self {
        let july_2024 = |day| NaiveDate::from_ymd_opt(2024, 7, day).unwrap_or_default();
        Self {
            start: july_2024(1),
            end: july_2024(31),
        }
    }
}

impl SeasonWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Typed filter selection. `None` means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_pitches: Option<u32>,
    pub max_pitches: Option<u32>,
    pub min_batters: Option<u32>,
    pub max_batters: Option<u32>,
    pub pitcher_type: PitcherTypeFilter,
}

impl FilterSpec {
    /// Calendar date of `instant` in UTC, whatever zone it was taken in.
    pub fn date_from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
        instant.with_timezone(&Utc).date_naive()
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }

    /// Check dates against the season window and min/max pairs against
    /// each other.
    pub fn validate(&self, season: &SeasonWindow) -> Result<(), QueryError> {
        for (field, date) in [("start_date", self.start_date), ("end_date", self.end_date)] {
            if let Some(date) = date {
                if !season.contains(date) {
                    return Err(QueryError::DateOutsideSeason {
                        field,
                        date,
                        start: season.start,
                        end: season.end,
                    });
                }
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(QueryError::InvertedRange {
                    min_field: "start_date",
                    max_field: "end_date",
                });
            }
        }
        let pairs = [
            ("min_pitches", self.min_pitches, "max_pitches", self.max_pitches),
            ("min_batters", self.min_batters, "max_batters", self.max_batters),
        ];
        for (min_field, min, max_field, max) in pairs {
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(QueryError::InvertedRange { min_field, max_field });
                }
            }
        }
        Ok(())
    }
}

/// Filters as a form hands them over: every field a string, blank meaning
/// unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawFilters {
    pub start_date: String,
    pub end_date: String,
    pub min_pitches: String,
    pub max_pitches: String,
    pub min_batters: String,
    pub max_batters: String,
    pub pitcher_type: String,
}

fn parse_count(field: &'static str, raw: &str) -> Result<Option<u32>, QueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<u32>().map(Some).map_err(|_| QueryError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, QueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| QueryError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

impl RawFilters {
    pub fn parse(&self) -> Result<FilterSpec, QueryError> {
        Ok(FilterSpec {
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            min_pitches: parse_count("min_pitches", &self.min_pitches)?,
            max_pitches: parse_count("max_pitches", &self.max_pitches)?,
            min_batters: parse_count("min_batters", &self.min_batters)?,
            max_batters: parse_count("max_batters", &self.max_batters)?,
            pitcher_type: self.pitcher_type.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Ordered, normalized parameters for one pitcher-stats request. Unset
/// filters are absent, never sent as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    params: Vec<(&'static str, String)>,
}

impl StatsQuery {
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Unencoded `key=value&...` form, for logs.
impl fmt::Display for StatsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Build the parameter list for a pitcher-stats request.
///
/// `team`, `sort_by` and `order` are always present; each filter is added
/// only when set. Call [`FilterSpec::validate`] first to reject out-of-window
/// or inverted ranges.
pub fn build_query(team: &str, sort_key: SortKey, sort_order: SortOrder, filters: &FilterSpec) -> StatsQuery {
    let mut params: Vec<(&'static str, String)> = vec![
        ("team", team.to_string()),
        ("sort_by", sort_key.as_str().to_string()),
        ("order", sort_order.as_str().to_string()),
    ];

    let dates = [("start_date", filters.start_date), ("end_date", filters.end_date)];
    for (key, date) in dates {
        if let Some(date) = date {
            params.push((key, date.format(DATE_FORMAT).to_string()));
        }
    }

    let counts = [
        ("min_pitches", filters.min_pitches),
        ("max_pitches", filters.max_pitches),
        ("min_batters", filters.min_batters),
        ("max_batters", filters.max_batters),
    ];
    for (key, count) in counts {
        if let Some(count) = count {
            params.push((key, count.to_string()));
        }
    }

    if let Some(code) = filters.pitcher_type.api_code() {
        params.push(("pitcher_type", code.to_string()));
    }

    StatsQuery { params }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn form_filters_omit_unset_fields() {
        let raw = RawFilters {
            start_date: "".into(),
            min_pitches: "50".into(),
            pitcher_type: "starter".into(),
            ..Default::default()
        };
        let filters = raw.parse().unwrap();
        let query = build_query("San Diego Padres", SortKey::StrikeoutPct, SortOrder::Desc, &filters);

        assert_eq!(query.get("min_pitches"), Some("50"));
        assert_eq!(query.get("pitcher_type"), Some("S"));
        for absent in ["start_date", "end_date", "max_pitches", "min_batters", "max_batters"] {
            assert!(!query.contains(absent), "{absent} should be omitted");
        }
        assert_eq!(query.get("team"), Some("San Diego Padres"));
        assert_eq!(query.get("sort_by"), Some("strikeout_pct"));
        assert_eq!(query.get("order"), Some("desc"));
    }

    #[test]
    fn every_set_field_is_included() {
        let filters = FilterSpec {
            start_date: Some(date(2024, 7, 3)),
            end_date: Some(date(2024, 7, 20)),
            min_pitches: Some(0),
            max_pitches: Some(400),
            min_batters: Some(10),
            max_batters: Some(90),
            pitcher_type: PitcherTypeFilter::Reliever,
        };
        let query = build_query("Texas Rangers", SortKey::Fip, SortOrder::Asc, &filters);
        assert_eq!(
            query.to_string(),
            "team=Texas Rangers&sort_by=fip&order=asc&start_date=2024-07-03&end_date=2024-07-20\
             &min_pitches=0&max_pitches=400&min_batters=10&max_batters=90&pitcher_type=R"
        );
    }

    #[test]
    fn all_pitcher_types_omits_parameter() {
        let query = build_query("X", SortKey::Name, SortOrder::Desc, &FilterSpec::default());
        assert!(!query.contains("pitcher_type"));
        assert_eq!(query.params().len(), 3);
    }

    #[test]
    fn zero_is_a_real_filter_value() {
        let raw = RawFilters { min_batters: "0".into(), ..Default::default() };
        let query = build_query("X", SortKey::Name, SortOrder::Desc, &raw.parse().unwrap());
        assert_eq!(query.get("min_batters"), Some("0"));
    }

    #[test]
    fn rejects_bad_numbers() {
        for bad in ["-5", "ten", "1.5"] {
            let raw = RawFilters { max_pitches: bad.into(), ..Default::default() };
            match raw.parse() {
                Err(QueryError::InvalidNumber { field, .. }) => assert_eq!(field, "max_pitches"),
                other => panic!("expected InvalidNumber for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_bad_dates_and_types() {
        let raw = RawFilters { end_date: "07/04/2024".into(), ..Default::default() };
        assert!(matches!(raw.parse(), Err(QueryError::InvalidDate { field: "end_date", .. })));

        let raw = RawFilters { pitcher_type: "closer".into(), ..Default::default() };
        assert!(matches!(raw.parse(), Err(QueryError::InvalidPitcherType(_))));
    }

    #[test]
    fn blank_pitcher_type_means_all() {
        let raw = RawFilters { pitcher_type: "  ".into(), ..Default::default() };
        assert_eq!(raw.parse().unwrap().pitcher_type, PitcherTypeFilter::All);
        assert!(raw.parse().unwrap().is_empty());
    }

    #[test]
    fn instant_west_of_utc_uses_utc_date() {
        // 20:30 on July 15 in UTC-7 is already July 16 in UTC.
        let pdt = FixedOffset::west_opt(7 * 3600).unwrap();
        let instant = pdt.with_ymd_and_hms(2024, 7, 15, 20, 30, 0).unwrap();
        assert_eq!(FilterSpec::date_from_instant(&instant), date(2024, 7, 16));
    }

    #[test]
    fn instant_east_of_utc_uses_utc_date() {
        // Local midnight July 10 in UTC+9 is still July 9 in UTC.
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = jst.with_ymd_and_hms(2024, 7, 10, 0, 0, 0).unwrap();
        assert_eq!(FilterSpec::date_from_instant(&instant), date(2024, 7, 9));

        let utc_instant = Utc.with_ymd_and_hms(2024, 7, 10, 0, 0, 0).unwrap();
        assert_eq!(FilterSpec::date_from_instant(&utc_instant), date(2024, 7, 10));
    }

    #[test]
    fn dates_serialize_as_calendar_days() {
        let filters = FilterSpec { start_date: Some(date(2024, 7, 1)), ..Default::default() };
        let query = build_query("X", SortKey::Name, SortOrder::Desc, &filters);
        assert_eq!(query.get("start_date"), Some("2024-07-01"));
    }

    #[test]
    fn validate_rejects_dates_outside_season() {
        let season = SeasonWindow::default();
        let filters = FilterSpec { start_date: Some(date(2024, 6, 30)), ..Default::default() };
        assert!(matches!(
            filters.validate(&season),
            Err(QueryError::DateOutsideSeason { field: "start_date", .. })
        ));
        let filters = FilterSpec { end_date: Some(date(2024, 8, 1)), ..Default::default() };
        assert!(filters.validate(&season).is_err());
        let filters = FilterSpec {
            start_date: Some(date(2024, 7, 1)),
            end_date: Some(date(2024, 7, 31)),
            ..Default::default()
        };
        assert!(filters.validate(&season).is_ok());
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let season = SeasonWindow::default();
        let filters = FilterSpec {
            start_date: Some(date(2024, 7, 20)),
            end_date: Some(date(2024, 7, 2)),
            ..Default::default()
        };
        assert!(matches!(
            filters.validate(&season),
            Err(QueryError::InvertedRange { min_field: "start_date", .. })
        ));
        let filters = FilterSpec { min_batters: Some(50), max_batters: Some(10), ..Default::default() };
        assert_eq!(
            filters.validate(&season),
            Err(QueryError::InvertedRange { min_field: "min_batters", max_field: "max_batters" })
        );
        let filters = FilterSpec { min_pitches: Some(10), max_pitches: Some(10), ..Default::default() };
        assert!(filters.validate(&season).is_ok());
    }

    #[test]
    fn sort_key_and_order_parse() {
        assert_eq!("k_bb_ratio".parse::<SortKey>().unwrap(), SortKey::KBbRatio);
        assert!("era".parse::<SortKey>().is_err());
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Asc.direction(), SortDirection::Asc);
    }

    #[test]
    fn pitcher_type_codes_round_trip() {
        for filter in [PitcherTypeFilter::Starter, PitcherTypeFilter::Reliever] {
            let code = filter.api_code().unwrap();
            assert_eq!(PitcherTypeFilter::from_api_code(code), Some(filter));
        }
        assert_eq!(PitcherTypeFilter::from_api_code("all"), Some(PitcherTypeFilter::All));
        assert!(PitcherTypeFilter::Starter.matches(PitcherType::Starter));
        assert!(!PitcherTypeFilter::Starter.matches(PitcherType::Reliever));
        assert!(PitcherTypeFilter::All.matches(PitcherType::Reliever));
    }
}
