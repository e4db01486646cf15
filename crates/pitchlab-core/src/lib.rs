// Services around the stats engine: configuration, data sources, the
// remembered team, and refresh orchestration.

pub mod config;
pub mod dashboard;
pub mod refresh;
pub mod session;
pub mod source;
