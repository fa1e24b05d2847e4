use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use crate::error::{Result, SheetError};

pub const DB_PATH_ENV: &str = "SHEETBASE_DB";
pub const DB_FILE_NAME: &str = "sheets.sqlite";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl AppConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Explicit override first, then `SHEETBASE_DB`, then the per-user data dir.
    pub fn resolve(db_override: Option<&Path>) -> Result<Self> {
        if let Some(path) = db_override {
            return Ok(Self::new(path));
        }
        match std::env::var_os(DB_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => default_db_path().map(Self::new),
        }
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "sheetbase", "sheetbase").ok_or(SheetError::Config)?;
    Ok(project_dirs.data_local_dir().join(DB_FILE_NAME))
}
