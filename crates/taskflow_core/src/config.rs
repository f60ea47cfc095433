//! Application configuration.
//!
//! # Responsibility
//! - Resolve settings from defaults, an optional TOML file, environment
//!   variables and caller overrides, in that order.
//!
//! # Invariants
//! - Resolved directories are absolute.
//! - Unknown keys in the TOML file are rejected.
//! - A missing default config file is not an error; a missing explicit one is.

use crate::ai::gemini::{GeminiConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::ai::prioritize::DEFAULT_USER_HABITS;
use crate::db::DB_FILE_NAME;
use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "taskflow";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_DATA_DIR: &str = "TASKFLOW_DATA_DIR";
pub const ENV_LOG_DIR: &str = "TASKFLOW_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "TASKFLOW_LOG_LEVEL";
pub const ENV_USER_HABITS: &str = "TASKFLOW_USER_HABITS";
pub const ENV_GEMINI_MODEL: &str = "TASKFLOW_GEMINI_MODEL";
pub const ENV_GEMINI_BASE_URL: &str = "TASKFLOW_GEMINI_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TASKFLOW_REQUEST_TIMEOUT_SECS";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

#[derive(Debug)]
pub enum ConfigError {
    /// Neither an override nor the platform provides a data directory.
    NoDataDir,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "could not determine a data directory; set {ENV_DATA_DIR} or pass --data-dir"
            ),
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// On-disk TOML shape; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub user_habits: Option<String>,
    #[serde(default)]
    pub gemini: GeminiFileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiFileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Caller-supplied values that win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub user_habits: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub user_habits: String,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with_env(overrides, |name| std::env::var(name).ok())
    }

    /// Resolves configuration with an injectable environment lookup.
    pub fn resolve_with_env(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let file = match overrides.config_path.as_deref() {
            Some(path) => load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => load_file(&path)?,
                _ => FileConfig::default(),
            },
        };

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .or(file.data_dir)
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .ok_or(ConfigError::NoDataDir)?;
        let data_dir = make_absolute(data_dir)?;

        let log_dir = env(ENV_LOG_DIR)
            .map(PathBuf::from)
            .or(file.log_dir)
            .unwrap_or_else(|| data_dir.join("logs"));
        let log_dir = make_absolute(log_dir)?;

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| env(ENV_LOG_LEVEL))
            .or(file.log_level)
            .unwrap_or_else(|| default_log_level().to_string());

        let user_habits = overrides
            .user_habits
            .clone()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| env(ENV_USER_HABITS))
            .or(file.user_habits)
            .unwrap_or_else(|| DEFAULT_USER_HABITS.to_string());

        let timeout_secs = match env(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                key: ENV_REQUEST_TIMEOUT_SECS,
                message: err.to_string(),
            })?,
            None => file.gemini.timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }

        let gemini = GeminiConfig {
            api_key: env(ENV_GEMINI_API_KEY)
                .or_else(|| env(ENV_GOOGLE_API_KEY))
                .or(file.gemini.api_key),
            model: env(ENV_GEMINI_MODEL)
                .or(file.gemini.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: env(ENV_GEMINI_BASE_URL)
                .or(file.gemini.base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            data_dir,
            log_dir,
            log_level,
            user_habits,
            gemini,
        })
    }

    /// Path of the SQLite file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

/// Default location of the TOML config file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Reads and parses one TOML config file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn make_absolute(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::{
        load_file, AppConfig, ConfigError, ConfigOverrides, ENV_GEMINI_API_KEY, ENV_GOOGLE_API_KEY,
        ENV_LOG_LEVEL, ENV_REQUEST_TIMEOUT_SECS,
    };
    use crate::ai::prioritize::DEFAULT_USER_HABITS;
    use std::collections::HashMap;
    use std::time::Duration;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn overrides_beat_env_and_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
log_level = "warn"
user_habits = "night owl"

[gemini]
api_key = "from-file"
model = "file-model"
"#,
        );
        let overrides = ConfigOverrides {
            config_path: Some(path),
            data_dir: Some(dir.path().join("data")),
            log_level: Some("debug".to_string()),
            user_habits: None,
        };
        let env = env_from(&[(ENV_LOG_LEVEL, "error"), (ENV_GEMINI_API_KEY, "from-env")]);

        let config = AppConfig::resolve_with_env(&overrides, env).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.user_habits, "night owl");
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.gemini.model, "file-model");
        assert_eq!(config.data_dir, dir.path().join("data"));
        assert_eq!(config.log_dir, dir.path().join("data").join("logs"));
        assert_eq!(config.db_path(), dir.path().join("data").join("taskflow.sqlite3"));
    }

    #[test]
    fn defaults_apply_without_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");
        let overrides = ConfigOverrides {
            config_path: Some(path),
            data_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        let config =
            AppConfig::resolve_with_env(&overrides, env_from(&[(ENV_GOOGLE_API_KEY, "g")])).unwrap();
        assert_eq!(config.user_habits, DEFAULT_USER_HABITS);
        assert_eq!(config.gemini.api_key.as_deref(), Some("g"));
        assert_eq!(config.gemini.timeout, Duration::from_secs(60));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "colour = \"blue\"\n");
        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(dir.path().join("absent.toml")),
            data_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };
        let err = AppConfig::resolve_with_env(&overrides, env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn zero_or_malformed_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");
        let overrides = ConfigOverrides {
            config_path: Some(path),
            data_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        for raw in ["0", "soon"] {
            let err = AppConfig::resolve_with_env(
                &overrides,
                env_from(&[(ENV_REQUEST_TIMEOUT_SECS, raw)]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{raw}");
        }
    }
}
