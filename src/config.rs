// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraFacing;
use crate::constants::{DEFAULT_SAVE_FOLDER, PREVIEW_SCALE_DIVISOR, QR_COOLDOWN, app_info};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// How long a directory grant is reused before the user is asked again
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum GrantCachePolicy {
    /// Prompt on every capture
    EveryCapture,
    /// Prompt once, reuse the grant until the process exits
    #[default]
    Process,
    /// Reuse the grant for the given number of minutes
    Minutes(u32),
}

impl GrantCachePolicy {
    /// Maximum age of a cached grant, `None` meaning unbounded
    pub fn max_age(&self) -> Option<Duration> {
        match self {
            Self::EveryCapture => Some(Duration::ZERO),
            Self::Process => None,
            Self::Minutes(minutes) => Some(Duration::from_secs(u64::from(*minutes) * 60)),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// QR cooldown window in milliseconds
    pub cooldown_ms: u64,
    /// Application subfolder created inside the granted directory
    pub save_folder_name: String,
    /// Directory grant reuse policy
    pub grant_cache: GrantCachePolicy,
    /// Camera facing at startup
    pub default_facing: CameraFacing,
    /// Linear downscale factor of the capture preview
    pub preview_divisor: u32,
    /// Open URL-class codes with the platform opener
    pub open_urls: bool,
    /// Where captured images live until they are saved and dismissed
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooldown_ms: QR_COOLDOWN.as_millis() as u64,
            save_folder_name: DEFAULT_SAVE_FOLDER.to_string(),
            grant_cache: GrantCachePolicy::default(),
            default_facing: CameraFacing::default(),
            preview_divisor: PREVIEW_SCALE_DIVISOR,
            open_urls: true,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Default config file location (`<config dir>/qrcam/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_NAME).join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    ///
    /// A missing file is normal; a malformed file is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    fn validate(&self) -> AppResult<()> {
        if self.preview_divisor == 0 {
            return Err(AppError::Config("preview_divisor must be at least 1".into()));
        }
        let name = self.save_folder_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(AppError::Config(format!(
                "invalid save_folder_name: {:?}",
                self.save_folder_name
            )));
        }
        Ok(())
    }

    /// Cooldown window as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Directory for captured images awaiting save
    pub fn capture_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(app_info::APP_NAME)
        })
    }
}
