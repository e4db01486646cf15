// Pitching analytics engine: record model, derived metrics, leaderboards,
// query building and chart-ready series. Everything here is pure and
// synchronous; I/O lives in `pitchlab-core`.

pub mod chart;
pub mod leaderboard;
pub mod metrics;
pub mod models;
pub mod pitch_types;
pub mod query;
pub mod reference;
