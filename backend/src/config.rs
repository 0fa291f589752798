//! # Configuration
//!
//! Resolves where the on-device data lives and loads the optional
//! `settings.yaml` stored next to the data blobs.
//!
//! ## File Structure
//!
//! ```text
//! Safe Drive/
//! ├── .safe_drive_redirect   (optional, points at another directory)
//! ├── settings.yaml          (optional)
//! ├── profiles.json
//! ├── consumptions.json
//! ├── results.json
//! └── current_profile
//! ```

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIRECTORY_NAME: &str = "Safe Drive";
pub const REDIRECT_FILE: &str = ".safe_drive_redirect";
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Threshold labels shown alongside the estimates
///
/// These only feed explanation text and threshold metadata; the wait-time
/// formula does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target serum level for the primary recommendation (ng/mL)
    pub conservative_threshold_ng_per_ml: f64,
    /// Secondary, less strict target shown for context (ng/mL)
    pub informational_threshold_ng_per_ml: f64,
    /// Statutory limit referenced in disclaimers (ng/mL)
    pub legal_limit_ng_per_ml: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            conservative_threshold_ng_per_ml: 1.0,
            informational_threshold_ng_per_ml: 2.5,
            legal_limit_ng_per_ml: 3.5,
        }
    }
}

impl Settings {
    /// Load settings from a data directory, falling back to defaults
    pub fn load(data_directory: &Path) -> Self {
        let path = data_directory.join(SETTINGS_FILE);
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_yaml::from_str::<Settings>(&content).map_err(anyhow::Error::from));

        match parsed {
            Ok(settings) if settings.is_valid() => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Ok(settings) => {
                warn!("Ignoring invalid settings in {}: {:?}. Using defaults.", path.display(), settings);
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read settings from {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Persist settings into a data directory
    pub fn save(&self, data_directory: &Path) -> Result<()> {
        if !self.is_valid() {
            return Err(anyhow::anyhow!("Refusing to save invalid settings: {:?}", self));
        }

        fs::create_dir_all(data_directory)?;
        let path = data_directory.join(SETTINGS_FILE);
        let yaml_content = serde_yaml::to_string(self)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        info!("Saved settings to {}", path.display());
        Ok(())
    }

    fn is_valid(&self) -> bool {
        let values = [
            self.conservative_threshold_ng_per_ml,
            self.informational_threshold_ng_per_ml,
            self.legal_limit_ng_per_ml,
        ];
        values.iter().all(|v| v.is_finite() && *v > 0.0)
            && self.conservative_threshold_ng_per_ml < self.informational_threshold_ng_per_ml
    }
}

/// Per-user data directory, honouring a redirect file if present
pub fn default_data_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory for this user"))?;

    Ok(resolve_redirect(&base.join(APP_DIRECTORY_NAME)))
}

/// Follow `.safe_drive_redirect` inside `directory` if it names an existing directory
pub fn resolve_redirect(directory: &Path) -> PathBuf {
    let redirect_file = directory.join(REDIRECT_FILE);
    if !redirect_file.exists() {
        return directory.to_path_buf();
    }

    match fs::read_to_string(&redirect_file) {
        Ok(redirected_path) => {
            let path = PathBuf::from(redirected_path.trim());
            if path.is_dir() {
                info!("Found redirect file, using data directory: {}", path.display());
                path
            } else {
                warn!(
                    "Redirect file points to non-existent directory: {}. Using default.",
                    path.display()
                );
                directory.to_path_buf()
            }
        }
        Err(e) => {
            error!("Failed to read redirect file: {}. Using default directory.", e);
            directory.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(Settings::load(temp_dir.path()), Settings::default());
    }

    #[test]
    fn test_settings_roundtrip_through_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            conservative_threshold_ng_per_ml: 0.5,
            ..Settings::default()
        };

        settings.save(temp_dir.path()).unwrap();
        assert_eq!(Settings::load(temp_dir.path()), settings);
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SETTINGS_FILE), "legal_limit_ng_per_ml: 2.0\n").unwrap();

        let settings = Settings::load(temp_dir.path());
        assert_eq!(settings.legal_limit_ng_per_ml, 2.0);
        assert_eq!(settings.conservative_threshold_ng_per_ml, 1.0);
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            "conservative_threshold_ng_per_ml: 3.0\ninformational_threshold_ng_per_ml: 2.5\n",
        )
        .unwrap();
        assert_eq!(Settings::load(temp_dir.path()), Settings::default());

        fs::write(temp_dir.path().join(SETTINGS_FILE), "conservative_threshold_ng_per_ml: lots\n").unwrap();
        assert_eq!(Settings::load(temp_dir.path()), Settings::default());
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            informational_threshold_ng_per_ml: -1.0,
            ..Settings::default()
        };
        assert!(settings.save(temp_dir.path()).is_err());
    }

    #[test]
    fn test_resolve_redirect() {
        let default_dir = TempDir::new().unwrap();
        let target_dir = TempDir::new().unwrap();

        assert_eq!(resolve_redirect(default_dir.path()), default_dir.path());

        fs::write(
            default_dir.path().join(REDIRECT_FILE),
            format!("{}\n", target_dir.path().display()),
        )
        .unwrap();
        assert_eq!(resolve_redirect(default_dir.path()), target_dir.path());

        fs::write(default_dir.path().join(REDIRECT_FILE), "/definitely/not/here").unwrap();
        assert_eq!(resolve_redirect(default_dir.path()), default_dir.path());
    }
}
