use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pitchlab_stats::query::RawFilters;
use pitchlab_stats::reference::PitcherMetric;

#[derive(Parser, Debug)]
#[command(author, version, about = "Pitching leaderboards and charts from the stats API")]
pub struct Cli {
    /// Read a saved pitcher-stats response instead of calling the API
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// Directory holding config/ (seeded from defaults/ on first run)
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Command
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[command(rename_all = "lower_case")]
pub enum Command {
    /// List teams with data
    Teams,
    /// Show the velocity, spin, in-zone, whiff, exit velocity and innings leaderboards
    Leaderboards {
        /// Team name (remembered for later commands)
        #[arg(short, long)]
        team: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show one pitcher's arsenal: usage, whiffs and zone split per pitch type
    Arsenal {
        /// Pitcher name (defaults to the first pitcher returned)
        #[arg(short, long)]
        pitcher: Option<String>,
        #[arg(short, long)]
        team: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Chart one metric: fip, strikeout_pct, walk_pct, first_pitch_strike_pct,
    /// k_minus_bb, k_bb_ratio, innings_pitched or avg_hit_speed
    Chart {
        metric: PitcherMetric,
        #[arg(short, long)]
        team: Option<String>,
        /// Maximum bars (defaults to charts.limit from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Also write the chart series to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Filter flags, kept as strings so they go through the same parsing as
/// any other form input.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// First game date, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,
    /// Last game date, YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub min_pitches: Option<String>,
    #[arg(long)]
    pub max_pitches: Option<String>,
    #[arg(long)]
    pub min_batters: Option<String>,
    #[arg(long)]
    pub max_batters: Option<String>,
    /// all, starter or reliever
    #[arg(long)]
    pub pitcher_type: Option<String>,
}

impl FilterArgs {
    pub fn to_raw(&self) -> RawFilters {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        RawFilters {
            start_date: field(&self.start_date),
            end_date: field(&self.end_date),
            min_pitches: field(&self.min_pitches),
            max_pitches: field(&self.max_pitches),
            min_batters: field(&self.min_batters),
            max_batters: field(&self.max_batters),
            pitcher_type: field(&self.pitcher_type),
        }
    }
}
