// Session context: remembers the last team the user looked at so later
// commands can default to it.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;

const SESSION_FILE: &str = "session.json";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no data directory available for this platform")]
    NoDataDir,

    #[error("could not read session file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Where the last selected team is kept between runs.
pub trait TeamStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&self, team: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    last_team: Option<String>,
}

/// JSON file store, by default `<data dir>/pitchlab/session.json`.
#[derive(Debug, Clone)]
pub struct FileTeamStore {
    path: PathBuf,
}

impl FileTeamStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, SessionError> {
        let dirs = ProjectDirs::from("", "", "pitchlab").ok_or(SessionError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join(SESSION_FILE)))
    }

    /// Use the configured path, falling back to the platform data dir.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        match &config.path {
            Some(path) => Ok(Self::new(path)),
            None => Self::default_location(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TeamStore for FileTeamStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let file: SessionFile = serde_json::from_str(&text).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(file.last_team)
    }

    fn save(&self, team: &str) -> Result<(), SessionError> {
        let write_err = |e| SessionError::Write {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = SessionFile {
            last_team: Some(team.to_string()),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(write_err)?;
        debug!("saved last team '{team}' to {}", self.path.display());
        Ok(())
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTeamStore {
    team: Mutex<Option<String>>,
}

impl MemoryTeamStore {
    pub fn with_team(team: &str) -> Self {
        Self {
            team: Mutex::new(Some(team.to_string())),
        }
    }
}

impl TeamStore for MemoryTeamStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.team.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, team: &str) -> Result<(), SessionError> {
        *self.team.lock().unwrap_or_else(PoisonError::into_inner) = Some(team.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

pub struct SessionContext {
    store: Box<dyn TeamStore>,
    default_team: Option<String>,
}

impl SessionContext {
    pub fn new(store: Box<dyn TeamStore>, default_team: Option<String>) -> Self {
        Self { store, default_team }
    }

    /// The remembered team. A corrupt session file is logged and ignored.
    pub fn last_team(&self) -> Result<Option<String>, SessionError> {
        match self.store.load() {
            Err(SessionError::Corrupt { path, source }) => {
                warn!("ignoring corrupt session file {}: {source}", path.display());
                Ok(None)
            }
            other => other,
        }
    }

    pub fn remember(&self, team: &str) -> Result<(), SessionError> {
        self.store.save(team)
    }

    /// Pick the team for this run: an explicit choice (which is then
    /// remembered), else the remembered team, else the configured default.
    pub fn resolve_team(&self, explicit: Option<&str>) -> Result<Option<String>, SessionError> {
        if let Some(team) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            self.remember(team)?;
            info!("selected team '{team}'");
            return Ok(Some(team.to_string()));
        }
        if let Some(team) = self.last_team()? {
            debug!("using remembered team '{team}'");
            return Ok(Some(team));
        }
        Ok(self.default_team.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
