// Configuration loading and validation (dashboard.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use pitchlab_stats::chart::DEFAULT_CHART_LIMIT;
use pitchlab_stats::leaderboard::{LeaderboardSettings, DEFAULT_LEADERBOARD_SIZE};
use pitchlab_stats::query::SeasonWindow;
use pitchlab_stats::reference::{ReferenceTable, StrikeZone};
use serde::Deserialize;
use thiserror::Error;

/// Name of the single config file under `config/` (and `defaults/`).
pub const DASHBOARD_FILE: &str = "dashboard.toml";

/// Built-in copy of `defaults/dashboard.toml`, written out when the binary
/// runs somewhere without a `defaults/` directory.
const BUILTIN_DASHBOARD: &str = include_str!("../defaults/dashboard.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    pub season: SeasonWindow,
    pub strike_zone: StrikeZone,
    pub leaderboards: LeaderboardsConfig,
    pub charts: ChartsConfig,
    pub reference_lines: ReferenceTable,
    pub session: SessionConfig,
}

impl Config {
    pub fn leaderboard_settings(&self) -> LeaderboardSettings {
        LeaderboardSettings {
            size: self.leaderboards.size,
            zone: self.strike_zone,
        }
    }
}

// ---------------------------------------------------------------------------
// dashboard.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire dashboard.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DashboardFile {
    api: ApiConfig,
    season: SeasonWindow,
    #[serde(default)]
    strike_zone: StrikeZone,
    #[serde(default)]
    leaderboards: LeaderboardsConfig,
    #[serde(default)]
    charts: ChartsConfig,
    #[serde(default)]
    reference_lines: ReferenceTable,
    #[serde(default)]
    session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Prefix for `/teams` and `/pitcher-stats`, without a trailing slash.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LeaderboardsConfig {
    pub size: usize,
}

impl Default for LeaderboardsConfig {
    fn default() -> Self {
        Self { size: DEFAULT_LEADERBOARD_SIZE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChartsConfig {
    pub limit: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self { limit: DEFAULT_CHART_LIMIT }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Team used when none was given and none is remembered.
    #[serde(default)]
    pub default_team: Option<String>,
    /// Where the last selected team is stored. Defaults to the platform
    /// data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/dashboard.toml` relative to `base_dir`.
///
/// This does not seed missing files; see [`load_config_at`].
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(DASHBOARD_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: DashboardFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        api: ApiConfig {
            base_url: file.api.base_url.trim_end_matches('/').to_string(),
            timeout_secs: file.api.timeout_secs,
        },
        season: file.season,
        strike_zone: file.strike_zone,
        leaderboards: file.leaderboards,
        charts: file.charts,
        reference_lines: file.reference_lines,
        session: file.session,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/dashboard.toml` exists, copying missing files from
/// `defaults/` (or writing the built-in default when there is no
/// `defaults/`). Returns the files that were created. Skips `.example`
/// files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    if !defaults_dir.exists() {
        let target = config_dir.join(DASHBOARD_FILE);
        return Ok(write_new(&target, BUILTIN_DASHBOARD.as_bytes())?
            .into_iter()
            .collect());
    }

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        copied.extend(write_new(&config_dir.join(file_name), &content)?);
    }

    Ok(copied)
}

/// Seed and load config under `base_dir`.
pub fn load_config_at(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_at(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Create `target` with `content` unless it already exists. Returns the path
/// when a file was written.
fn write_new(target: &Path, content: &[u8]) -> Result<Option<PathBuf>, ConfigError> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target.to_path_buf()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(invalid("api.base_url", "must not be empty"));
    }
    let url = &config.api.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid("api.base_url", format!("must be an http(s) URL, got '{url}'")));
    }
    if config.api.timeout_secs == 0 {
        return Err(invalid("api.timeout_secs", "must be greater than 0"));
    }

    let season = &config.season;
    if season.start > season.end {
        return Err(invalid(
            "season.start",
            format!("must not be after season.end ({} > {})", season.start, season.end),
        ));
    }

    let zone = &config.strike_zone;
    let zone_fields: &[(&str, f64)] = &[
        ("strike_zone.half_width", zone.half_width),
        ("strike_zone.bottom", zone.bottom),
        ("strike_zone.top", zone.top),
    ];
    for (name, val) in zone_fields {
        if !val.is_finite() || *val <= 0.0 {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }
    if zone.bottom >= zone.top {
        return Err(invalid(
            "strike_zone.bottom",
            format!("must be below strike_zone.top ({} >= {})", zone.bottom, zone.top),
        ));
    }

    if config.leaderboards.size == 0 {
        return Err(invalid("leaderboards.size", "must be greater than 0"));
    }
    if config.charts.limit == 0 {
        return Err(invalid("charts.limit", "must be greater than 0"));
    }

    if let Some(metric) = config.reference_lines.non_finite().first() {
        return Err(invalid(
            &format!("reference_lines.{}", metric.key()),
            "must be a finite number",
        ));
    }

    if let Some(team) = &config.session.default_team {
        if team.trim().is_empty() {
            return Err(invalid("session.default_team", "must not be blank when set"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use chrono::NaiveDate;
    use pitchlab_stats::reference::PitcherMetric;

    /// Helper: returns the path to the pitchlab-core crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/pitchlab-core/defaults").exists() {
            cwd.join("crates/pitchlab-core")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    fn default_text() -> String {
        fs::read_to_string(project_root().join("defaults").join(DASHBOARD_FILE)).unwrap()
    }

    /// Write `text` as config/dashboard.toml under a fresh temp dir.
    fn scratch_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(DASHBOARD_FILE), text).unwrap();
        tmp
    }

    fn expect_invalid(name: &str, text: &str, field: &str) {
        let tmp = scratch_config(name, text);
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field: f, .. } => assert_eq!(f, field),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let tmp = scratch_config("pitchlab_config_defaults", &default_text());
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.season, SeasonWindow::default());
        assert_eq!(config.strike_zone, StrikeZone::default());
        assert_eq!(config.leaderboards.size, 5);
        assert_eq!(config.charts.limit, 20);
        assert_eq!(config.reference_lines, ReferenceTable::default());
        assert_eq!(config.session.default_team.as_deref(), Some("San Diego Padres"));
        assert!(config.session.path.is_none());

        let settings = config.leaderboard_settings();
        assert_eq!(settings.size, 5);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn builtin_default_matches_defaults_dir() {
        assert_eq!(BUILTIN_DASHBOARD, default_text());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let text = r#"
[api]
base_url = "https://stats.example.com/api/v1/"
timeout_secs = 3

[season]
start = "2024-07-01"
end = "2024-07-31"

[reference_lines]
fip = 3.9
"#;
        let tmp = scratch_config("pitchlab_config_minimal", text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.api.base_url, "https://stats.example.com/api/v1");
        assert_eq!(config.strike_zone, StrikeZone::default());
        assert_eq!(config.leaderboards.size, DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(config.reference_lines.get(PitcherMetric::Fip), Some(3.9));
        // Keys left out keep their defaults.
        assert_eq!(config.reference_lines.get(PitcherMetric::WalkPct), Some(8.2));
        assert_eq!(config.session, SessionConfig::default());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn season_and_zone_overrides() {
        let text = default_text()
            .replace("end = \"2024-07-31\"", "end = \"2024-08-15\"")
            .replace("half_width = 0.83", "half_width = 0.851");
        let tmp = scratch_config("pitchlab_config_overrides", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.season.end, NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
        assert!((config.strike_zone.half_width - 0.851).abs() < f64::EPSILON);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let text = default_text().replace("timeout_secs = 10", "timeout_secs = 0");
        expect_invalid("pitchlab_config_zero_timeout", &text, "api.timeout_secs");
    }

    #[test]
    fn rejects_empty_base_url() {
        let text = default_text().replace("\"http://localhost:8000/api/v1\"", "\"  \"");
        expect_invalid("pitchlab_config_empty_url", &text, "api.base_url");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let text = default_text().replace("http://localhost:8000", "ftp://localhost:8000");
        expect_invalid("pitchlab_config_ftp_url", &text, "api.base_url");
    }

    #[test]
    fn rejects_inverted_season() {
        let text = default_text().replace("start = \"2024-07-01\"", "start = \"2024-08-01\"");
        expect_invalid("pitchlab_config_inverted_season", &text, "season.start");
    }

    #[test]
    fn rejects_inverted_zone() {
        let text = default_text().replace("bottom = 1.5", "bottom = 3.6");
        expect_invalid("pitchlab_config_inverted_zone", &text, "strike_zone.bottom");
    }

    #[test]
    fn rejects_zero_leaderboard_size() {
        let text = default_text().replace("size = 5", "size = 0");
        expect_invalid("pitchlab_config_zero_size", &text, "leaderboards.size");
    }

    #[test]
    fn rejects_non_finite_reference() {
        let text = default_text().replace("fip = 4.08", "fip = nan");
        expect_invalid("pitchlab_config_nan_reference", &text, "reference_lines.fip");
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_config("pitchlab_config_invalid_toml", "[api\nbase_url = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }), "got: {err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_dashboard_toml() {
        let tmp = std::env::temp_dir().join("pitchlab_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("config/dashboard.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_copies_defaults_once_and_skips_examples() {
        let tmp = std::env::temp_dir().join("pitchlab_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(DASHBOARD_FILE), default_text()).unwrap();
        fs::write(tmp.join("defaults/extra.toml.example"), "# template").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(DASHBOARD_FILE)]);
        assert!(!tmp.join("config/extra.toml.example").exists());

        // A user edit survives a second run.
        fs::write(tmp.join("config").join(DASHBOARD_FILE), "# edited").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(fs::read_to_string(tmp.join("config").join(DASHBOARD_FILE)).unwrap(), "# edited");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_writes_builtin_without_defaults_dir() {
        let tmp = std::env::temp_dir().join("pitchlab_config_builtin");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let config = load_config_at(&tmp).unwrap();
        assert_eq!(config.leaderboards.size, 5);
        assert!(tmp.join("config").join(DASHBOARD_FILE).exists());

        let _ = fs::remove_dir_all(&tmp);
    }
}
