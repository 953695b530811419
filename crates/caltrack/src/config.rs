//! Configuration management for caltrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::report::DEFAULT_PLACEHOLDER;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "caltrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "caltrack.db";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "CALTRACK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CALTRACK_`, sections separated
///    by `__`, e.g. `CALTRACK_DISPLAY__LOCALE=en`)
/// 2. TOML config file at `~/.config/caltrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Display configuration.
    pub display: DisplayConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/caltrack/caltrack.db`
    pub database_path: Option<PathBuf>,
}

/// Display-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Locale for labels and messages.
    pub locale: Locale,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Cell text shown where a date is absent.
    pub placeholder: String,
}

/// Authentication-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Consecutive failed logins per email before further attempts are refused.
    pub max_failed_attempts: u32,
    /// Minutes after the last failed login before the count starts over.
    pub lockout_minutes: u32,
    /// Minimum password length accepted at registration.
    pub min_password_length: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_minutes: 15,
            min_password_length: 6,
        }
    }
}

impl AuthConfig {
    /// How long failed logins count toward the limit.
    #[must_use]
    pub fn lockout_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.lockout_minutes))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth.max_failed_attempts == 0 {
            return Err(Error::ConfigValidation {
                message: "max_failed_attempts must be greater than 0".to_string(),
            });
        }

        if self.auth.lockout_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "lockout_minutes must be greater than 0".to_string(),
            });
        }

        if self.auth.min_password_length == 0 {
            return Err(Error::ConfigValidation {
                message: "min_password_length must be greater than 0".to_string(),
            });
        }

        if self.export.placeholder.contains(['\n', '\r']) {
            return Err(Error::ConfigValidation {
                message: "placeholder must be a single line".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.display.locale, Locale::Sk);
        assert_eq!(config.export.placeholder, "N/A");
        assert_eq!(config.auth.max_failed_attempts, 5);
        assert_eq!(config.auth.lockout_minutes, 15);
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.auth.lockout_window(), chrono::Duration::minutes(15));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.auth.max_failed_attempts = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_failed_attempts"));
    }

    #[test]
    fn test_validate_zero_lockout() {
        let mut config = Config::default();
        config.auth.lockout_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("lockout_minutes"));
    }

    #[test]
    fn test_validate_zero_password_length() {
        let mut config = Config::default();
        config.auth.min_password_length = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_password_length"));
    }

    #[test]
    fn test_validate_multiline_placeholder() {
        let mut config = Config::default();
        config.export.placeholder = "a\nb".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("caltrack.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_output_dir_default() {
        assert_eq!(Config::default().output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("caltrack"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.auth, AuthConfig::default());
        assert_eq!(config.export.placeholder, "N/A");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[display]
locale = "de"

[export]
placeholder = "-"

[auth]
max_failed_attempts = 3
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.display.locale, Locale::De);
        assert_eq!(config.export.placeholder, "-");
        assert_eq!(config.auth.max_failed_attempts, 3);
        assert_eq!(config.auth.min_password_length, 6);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nmax_failed_attempts = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_locale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nlocale = \"fr\"\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_config_serializes_sections() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"display\""));
        assert!(json.contains("\"max_failed_attempts\""));
    }
}
