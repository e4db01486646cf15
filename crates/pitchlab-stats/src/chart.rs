// Chart data adapter: reduces ranked records to plain
// (label, value, category, order) points for a rendering layer.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::leaderboard::{arsenal_by_usage, rank_top_n, SortDirection};
use crate::models::{PitchTypeRecord, PitcherRecord};
use crate::pitch_types::pitch_name;
use crate::reference::{Better, PitcherMetric, ReferenceTable};

/// Bars shown on a metric chart when no limit is configured.
pub const DEFAULT_CHART_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("non-finite value {value} for '{label}'")]
    NonFiniteValue { label: String, value: f64 },
}

// ---------------------------------------------------------------------------
// Generic series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
    pub category: String,
    /// Position of the source record in the input slice.
    pub order: usize,
}

type TextFn<'a, T> = Box<dyn Fn(&T) -> String + 'a>;

/// How to label and categorize points, and how many to keep.
pub struct SeriesOptions<'a, T> {
    label: TextFn<'a, T>,
    category: TextFn<'a, T>,
    limit: Option<usize>,
}

impl<'a, T> SeriesOptions<'a, T> {
    pub fn new(label: impl Fn(&T) -> String + 'a) -> Self {
        Self {
            label: Box::new(label),
            category: Box::new(|_| String::new()),
            limit: None,
        }
    }

    pub fn with_category(mut self, category: impl Fn(&T) -> String + 'a) -> Self {
        self.category = Box::new(category);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Map `records` to series points in input order.
///
/// `value_fn` returning `None` drops the record. A non-finite value is an
/// error; every record is checked before the limit is applied.
pub fn to_ranked_series<T>(
    records: &[T],
    value_fn: impl Fn(&T) -> Option<f64>,
    options: &SeriesOptions<'_, T>,
) -> Result<Vec<SeriesPoint>, ChartError> {
    let mut points = Vec::with_capacity(records.len());
    for (order, record) in records.iter().enumerate() {
        let Some(value) = value_fn(record) else {
            debug!("series: skipping '{}' with no value", (options.label)(record));
            continue;
        };
        let label = (options.label)(record);
        if !value.is_finite() {
            return Err(ChartError::NonFiniteValue { label, value });
        }
        points.push(SeriesPoint {
            label,
            value,
            category: (options.category)(record),
            order,
        });
    }
    if let Some(limit) = options.limit {
        points.truncate(limit);
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Metric charts
// ---------------------------------------------------------------------------

/// Where a value sits relative to the league reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Better,
    Worse,
    Average,
}

impl Band {
    pub fn classify(value: f64, reference: Option<f64>, better: Better) -> Self {
        let Some(reference) = reference else {
            return Band::Average;
        };
        match (value.total_cmp(&reference), better) {
            (std::cmp::Ordering::Equal, _) => Band::Average,
            (std::cmp::Ordering::Greater, Better::Higher) | (std::cmp::Ordering::Less, Better::Lower) => {
                Band::Better
            }
            _ => Band::Worse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Better => "better",
            Band::Worse => "worse",
            Band::Average => "average",
        }
    }
}

/// Value axis range for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DomainPolicy {
    /// `[0, min(100, ceil(max * 1.1))]`.
    Percentage,
    /// `[min(0, min), max]`, leaving room for negative values.
    IncludeZero,
    /// `[0, max(max, reference + headroom)]`.
    ReferenceHeadroom(f64),
}

impl DomainPolicy {
    pub fn for_metric(metric: PitcherMetric) -> Self {
        match metric {
            m if m.is_percentage() => DomainPolicy::Percentage,
            PitcherMetric::KBbRatio => DomainPolicy::ReferenceHeadroom(2.0),
            _ => DomainPolicy::IncludeZero,
        }
    }

    /// `None` when there is nothing to plot.
    pub fn domain(&self, values: &[f64], reference: Option<f64>) -> Option<AxisDomain> {
        let max = values.iter().copied().reduce(f64::max)?;
        let min = values.iter().copied().reduce(f64::min)?;
        let domain = match *self {
            DomainPolicy::Percentage => AxisDomain {
                min: 0.0,
                max: (max * 1.1).ceil().min(100.0),
            },
            DomainPolicy::IncludeZero => AxisDomain { min: min.min(0.0), max },
            DomainPolicy::ReferenceHeadroom(headroom) => AxisDomain {
                min: 0.0,
                max: reference.map_or(max, |r| max.max(r + headroom)),
            },
        };
        Some(domain)
    }
}

/// Everything a renderer needs to draw one metric chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub metric: PitcherMetric,
    pub title: String,
    pub points: Vec<SeriesPoint>,
    pub reference: Option<f64>,
    pub domain: Option<AxisDomain>,
}

/// Description of a bar chart over one per-pitcher metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricChart {
    pub metric: PitcherMetric,
    pub title: String,
    pub order: SortDirection,
    pub reference: Option<f64>,
    pub better: Better,
    pub domain_policy: DomainPolicy,
    pub limit: usize,
}

impl MetricChart {
    /// Best values first: ascending for lower-is-better metrics.
    pub fn for_metric(metric: PitcherMetric, references: &ReferenceTable) -> Self {
        let better = metric.better();
        Self {
            metric,
            title: metric.label().to_string(),
            order: match better {
                Better::Higher => SortDirection::Desc,
                Better::Lower => SortDirection::Asc,
            },
            reference: references.get(metric),
            better,
            domain_policy: DomainPolicy::for_metric(metric),
            limit: DEFAULT_CHART_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(&self, records: &[PitcherRecord]) -> Result<ChartData, ChartError> {
        let mut present: Vec<(usize, &PitcherRecord, f64)> = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match self.metric.raw(record) {
                Some(value) if !value.is_finite() => {
                    return Err(ChartError::NonFiniteValue {
                        label: record.name.clone(),
                        value,
                    });
                }
                Some(value) => present.push((index, record, value)),
                None => debug!("{}: '{}' has no value, leaving it out", self.metric, record.name),
            }
        }

        let ranked: Vec<(usize, &PitcherRecord, f64)> = rank_top_n(&present, |entry| entry.2, self.limit, self.order)
            .into_iter()
            .copied()
            .collect();

        let (reference, better) = (self.reference, self.better);
        let options = SeriesOptions::new(|entry: &(usize, &PitcherRecord, f64)| entry.1.name.clone())
            .with_category(move |entry: &(usize, &PitcherRecord, f64)| {
                Band::classify(entry.2, reference, better).as_str().to_string()
            });
        let mut points = to_ranked_series(&ranked, |entry| Some(entry.2), &options)?;
        // Positions refer to `records`, not to the ranked slice.
        for point in &mut points {
            point.order = ranked[point.order].0;
        }

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        Ok(ChartData {
            metric: self.metric,
            title: self.title.clone(),
            domain: self.domain_policy.domain(&values, self.reference),
            reference: self.reference,
            points,
        })
    }
}

/// Usage share per pitch type, most used first. Labels are pitch names;
/// the category is the pitch code and `order` the position in `pitch_data`.
pub fn arsenal_series(pitcher: &PitcherRecord) -> Vec<SeriesPoint> {
    let position = |pitch: &PitchTypeRecord| {
        pitcher
            .pitch_data
            .iter()
            .position(|p| std::ptr::eq(p, pitch))
            .unwrap_or_default()
    };
    arsenal_by_usage(pitcher)
        .into_iter()
        .filter_map(|pitch| pitch.usage_pct.map(|usage| (pitch, usage)))
        .map(|(pitch, usage)| SeriesPoint {
            label: pitch_name(&pitch.pitch_type).to_string(),
            value: usage,
            category: pitch.pitch_type.clone(),
            order: position(pitch),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
