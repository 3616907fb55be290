//! Site-wide defaults from INI configuration files.
//!
//! Command-line flags always win, but the fallback values they override can
//! be customized through an INI file, looked up with the following
//! precedence:
//!
//! 1. Local configuration (`./cflevels.cfg`)
//! 2. User configuration (`~/.config/cflevels/cflevels.cfg`)
//! 3. Built-in defaults
//!
//! # Configuration File Format
//!
//! ```ini
//! [files]
//! up = out1.dat
//! down = out2.dat
//!
//! [levels]
//! basis = dz2,dxz,dyz,dx2,dxy
//! decimals = 6
//! dominant_threshold = 10.0
//!
//! [survey]
//! gap = 2.0
//! ```

use configparser::ini::Ini;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// INI syntax error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// A key holds a value of the wrong type
    #[error("invalid value '{value}' for key '{key}'")]
    InvalidValue {
        /// Offending key, as `section.key`
        key: String,
        /// Value found in the file
        value: String,
    },
}

/// Default values configurable through the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default spin-up file name for `levels`
    pub up_file: String,
    /// Default spin-down file name for `levels`
    pub down_file: String,
    /// Default basis specification for `levels`
    pub basis: String,
    /// Default decimal places in reports
    pub decimals: usize,
    /// Default dominant-orbital percentage threshold
    pub dominant_threshold: f64,
    /// Default distance-grouping gap for `survey`
    pub survey_gap: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            up_file: "out1.dat".to_string(),
            down_file: "out2.dat".to_string(),
            basis: "dz2,dxz,dyz,dx2,dxy".to_string(),
            decimals: 6,
            dominant_threshold: 10.0,
            survey_gap: 2.0,
        }
    }
}

impl Settings {
    /// Loads settings with local-then-user precedence, falling back to the
    /// built-in defaults when no file exists or a file cannot be used.
    pub fn load() -> Settings {
        for path in Self::candidate_paths() {
            if !path.is_file() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(settings) => {
                    info!("loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => {
                    warn!("ignoring settings file {}: {}", path.display(), e);
                }
            }
        }
        debug!("no settings file found, using built-in defaults");
        Settings::default()
    }

    /// Reads one settings file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Settings, SettingsError> {
        let mut ini = Ini::new();
        ini.load(path).map_err(SettingsError::IniParse)?;

        let mut settings = Settings::default();
        if let Some(v) = ini.get("files", "up") {
            settings.up_file = v;
        }
        if let Some(v) = ini.get("files", "down") {
            settings.down_file = v;
        }
        if let Some(v) = ini.get("levels", "basis") {
            settings.basis = v;
        }
        if let Some(v) = ini.get("levels", "decimals") {
            settings.decimals = parse_key("levels.decimals", &v)?;
        }
        if let Some(v) = ini.get("levels", "dominant_threshold") {
            settings.dominant_threshold = parse_key("levels.dominant_threshold", &v)?;
        }
        if let Some(v) = ini.get("survey", "gap") {
            settings.survey_gap = parse_key("survey.gap", &v)?;
        }
        Ok(settings)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("cflevels.cfg")];
        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("cflevels")
                    .join("cflevels.cfg"),
            );
        }
        paths
    }
}

fn parse_key<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_file_overrides_and_defaults() {
        let path = std::env::temp_dir().join("cflevels_settings_test.cfg");
        fs::write(
            &path,
            "[files]\nup = majority.dat\n\n[levels]\ndecimals = 4\n\n[survey]\ngap = 1.5\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.up_file, "majority.dat");
        assert_eq!(settings.down_file, "out2.dat");
        assert_eq!(settings.decimals, 4);
        assert!((settings.survey_gap - 1.5).abs() < 1e-12);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_value_reported() {
        let path = std::env::temp_dir().join("cflevels_settings_bad.cfg");
        fs::write(&path, "[levels]\ndecimals = six\n").unwrap();

        let result = Settings::from_file(&path);
        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));

        fs::remove_file(&path).unwrap();
    }
}
