//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data.

use super::ScanProfile;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netsweep)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/netsweep)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Discover the per-user directories and make sure they exist.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "netsweep", "netsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Self::rooted(project.config_dir(), project.data_dir())
    }

    /// Use explicit directories, creating them if needed.
    pub fn rooted(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let paths = Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the session storage directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Get the path to the bookmarks file.
    pub fn bookmarks_file(&self) -> PathBuf {
        self.data_dir.join("bookmarks.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Profile used when `scan` is given none.
    pub default_profile: ScanProfile,
    /// Bound on the reachability probe in milliseconds.
    pub ping_timeout_ms: u64,
    /// Persist sessions to the data directory.
    pub auto_save_sessions: bool,
    /// Default output format (plain, json, csv).
    pub default_output_format: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_profile: ScanProfile::Quick,
            ping_timeout_ms: 1000,
            auto_save_sessions: true,
            default_output_format: "plain".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        let file = paths.settings_file();

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&file, content).map_err(|e| ConfigError::WriteFailed {
            path: file,
            reason: e.to_string(),
        })
    }

    /// Reachability probe bound.
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_profile, ScanProfile::Quick);
        assert_eq!(settings.ping_timeout(), Duration::from_secs(1));
        assert!(settings.auto_save_sessions);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"default_profile": "full"}"#).unwrap();
        assert_eq!(settings.default_profile, ScanProfile::Full);
        assert_eq!(settings.ping_timeout_ms, 1000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path().join("config"), dir.path().join("data")).unwrap();

        assert_eq!(AppSettings::load(&paths).unwrap().ping_timeout_ms, 1000);

        let settings = AppSettings {
            ping_timeout_ms: 250,
            ..AppSettings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = AppSettings::load(&paths).unwrap();
        assert_eq!(loaded.ping_timeout_ms, 250);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, "{not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&file),
            Err(ConfigError::InvalidFormat(_))
        ));
    }
}
