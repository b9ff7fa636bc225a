//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve database location and logging settings once at startup.
//!
//! # Invariants
//! - Blank or whitespace-only values are treated as unset.
//! - The database path always resolves; logging is optional.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "NOOMA_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "NOOMA_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "NOOMA_LOG_DIR";

/// Database location used when `NOOMA_DB_PATH` is unset, relative to the
/// working directory.
pub const DEFAULT_DB_PATH: &str = "../data/nooma.db";

#[derive(Debug)]
pub enum ConfigError {
    /// Working directory could not be determined for the default path.
    CurrentDir(std::io::Error),
    /// An environment variable was set but not valid unicode.
    NotUnicode(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentDir(err) => write!(f, "cannot resolve working directory: {err}"),
            Self::NotUnicode(name) => write!(f, "`{name}` is not valid unicode"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::NotUnicode(_) => None,
        }
    }
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Reads `NOOMA_DB_PATH`, `NOOMA_LOG_LEVEL` and `NOOMA_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(cwd, |name| match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
        })
    }

    fn from_lookup(
        cwd: PathBuf,
        lookup: impl Fn(&'static str) -> Result<Option<String>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let db_path = resolve_db_path(&cwd, non_blank(lookup(DB_PATH_ENV)?).as_deref());
        let log_level =
            non_blank(lookup(LOG_LEVEL_ENV)?).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_blank(lookup(LOG_DIR_ENV)?);
        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

/// Returns `configured` when given, else [`DEFAULT_DB_PATH`] joined onto `cwd`.
pub fn resolve_db_path(cwd: &std::path::Path, configured: Option<&str>) -> PathBuf {
    match configured {
        Some(path) => PathBuf::from(path),
        None => cwd.join(DEFAULT_DB_PATH),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path, AppConfig, ConfigError, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn config_from(vars: &[(&'static str, &str)]) -> AppConfig {
        let vars: HashMap<&'static str, String> = vars
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect();
        AppConfig::from_lookup(PathBuf::from("/srv/app"), |name| {
            Ok::<_, ConfigError>(vars.get(name).cloned())
        })
        .expect("lookup never fails")
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.db_path, Path::new("/srv/app").join("../data/nooma.db"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(DB_PATH_ENV, "   "), (LOG_LEVEL_ENV, ""), (LOG_DIR_ENV, " ")]);
        assert_eq!(config.db_path, Path::new("/srv/app").join("../data/nooma.db"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_trimmed_and_used() {
        let config = config_from(&[
            (DB_PATH_ENV, " /tmp/nooma.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/nooma"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/nooma.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/nooma"));
    }

    #[test]
    fn resolve_db_path_prefers_configured_value() {
        assert_eq!(
            resolve_db_path(Path::new("/a"), Some("b.db")),
            PathBuf::from("b.db")
        );
        assert_eq!(
            resolve_db_path(Path::new("/a"), None),
            PathBuf::from("/a/../data/nooma.db")
        );
    }
}
