// Plain-text rendering of leaderboards, charts and arsenals, plus CSV export
// of chart series.

use std::io::{self, Write};
use std::path::Path;

use pitchlab_core::dashboard::ArsenalView;
use pitchlab_stats::chart::{AxisDomain, ChartData, SeriesPoint};
use pitchlab_stats::leaderboard::{arsenal_by_whiff, Leaderboard, Leaderboards};
use pitchlab_stats::metrics::{in_zone_percent, zone_split};
use pitchlab_stats::pitch_types::pitch_name;
use pitchlab_stats::reference::StrikeZone;

const BAR_WIDTH: usize = 30;
const MISSING: &str = "-";

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_value(value: f64, missing: bool) -> String {
    if missing {
        MISSING.to_string()
    } else {
        format!("{value:.1}")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.1}"))
}

/// Bar length for `value` within `domain`, clamped to `[0, width]`.
pub fn bar_len(value: f64, domain: &AxisDomain, width: usize) -> usize {
    let span = domain.max - domain.min;
    if span <= 0.0 {
        return 0;
    }
    let fraction = ((value - domain.min) / span).clamp(0.0, 1.0);
    (fraction * width as f64).round() as usize
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn write_teams<W: Write>(out: &mut W, teams: &[String], current: Option<&str>) -> io::Result<()> {
    if teams.is_empty() {
        return writeln!(out, "No teams available.");
    }
    for team in teams {
        let mark = if Some(team.as_str()) == current { "*" } else { " " };
        writeln!(out, "{mark} {team}")?;
    }
    Ok(())
}

pub fn write_leaderboard<W: Write>(out: &mut W, board: &Leaderboard) -> io::Result<()> {
    writeln!(out, "{} ({})", board.kind.title(), board.kind.unit())?;
    if board.rows.is_empty() {
        return writeln!(out, "  no data");
    }
    for row in &board.rows {
        let pitch = row
            .pitch_name
            .as_deref()
            .map(|name| format!(" [{name}]"))
            .unwrap_or_default();
        writeln!(
            out,
            "  {:<4} {}{}  {}",
            row.marker().to_string(),
            row.pitcher_name,
            pitch,
            format_value(row.value, row.missing)
        )?;
    }
    Ok(())
}

pub fn write_leaderboards<W: Write>(out: &mut W, boards: &Leaderboards) -> io::Result<()> {
    for (i, board) in boards.boards.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_leaderboard(out, board)?;
    }
    Ok(())
}

pub fn write_chart<W: Write>(out: &mut W, chart: &ChartData) -> io::Result<()> {
    writeln!(out, "{}", chart.title)?;
    if let Some(reference) = chart.reference {
        writeln!(out, "  league average: {reference:.2}")?;
    }
    let Some(domain) = chart.domain else {
        return writeln!(out, "  no data");
    };
    let width = chart.points.iter().map(|p| p.label.len()).max().unwrap_or(0);
    for point in &chart.points {
        let bar = "#".repeat(bar_len(point.value, &domain, BAR_WIDTH));
        writeln!(
            out,
            "  {:<width$}  {:>7.2}  {:<7}  {bar}",
            point.label, point.value, point.category
        )?;
    }
    writeln!(out, "  axis: {:.2} to {:.2}", domain.min, domain.max)
}

pub fn write_arsenal<W: Write>(out: &mut W, view: &ArsenalView, zone: &StrikeZone) -> io::Result<()> {
    let pitcher = &view.pitcher;
    writeln!(out, "{} ({})", pitcher.name, pitcher.pitcher_type.label())?;

    writeln!(out, "Usage")?;
    if view.usage.is_empty() {
        writeln!(out, "  no data")?;
    }
    for point in &view.usage {
        writeln!(out, "  {:<18} {:>5.1}%", point.label, point.value)?;
    }

    writeln!(out, "Whiffs and zone")?;
    for pitch in arsenal_by_whiff(pitcher) {
        let split = zone_split(&pitch.locations, zone);
        let in_zone = if pitch.locations.is_empty() {
            MISSING.to_string()
        } else {
            format!("{:.1}", in_zone_percent(&pitch.locations, zone))
        };
        writeln!(
            out,
            "  {:<18} whiff {:>5}  in-zone {:>5}  chase whiffs {}/{}",
            pitch_name(&pitch.pitch_type),
            format_optional(pitch.whiff_pct),
            in_zone,
            split.chase_whiffs,
            split.whiffs()
        )?;
    }
    Ok(())
}

/// Write a chart series as CSV with a header row.
pub fn write_series_csv<W: Write>(out: W, points: &[SeriesPoint]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_series_csv(path: &Path, points: &[SeriesPoint]) -> anyhow::Result<()> {
    use anyhow::Context;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_series_csv(file, points).with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
