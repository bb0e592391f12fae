/// Application configuration
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/image-gallery/config.json
/// - macOS: ~/Library/Application Support/image-gallery/config.json
/// - Windows: %APPDATA%\image-gallery\config.json
///
/// Missing file or missing keys fall back to defaults.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::batch::DEFAULT_PACING;
use crate::error::{GalleryError, Result};
use crate::gesture::DEFAULT_LONG_PRESS_DELAY;

/// Size of the generated demo collection
pub const DEMO_TOTAL: usize = 48;
/// Simulated round trip of the demo collection
pub const DEMO_LATENCY_MS: u64 = 500;

/// Where images come from
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Generated demo collection
    Mock { total: usize, latency_ms: u64 },
    /// Gallery server, e.g. `http://localhost:8000`
    Rest { base_url: String },
    /// Folder on this machine
    Local { dir: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Mock {
            total: DEMO_TOTAL,
            latency_ms: DEMO_LATENCY_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    /// Images requested per page
    pub page_size: u32,
    /// Hold time before a press selects an image
    pub long_press_ms: u64,
    /// Pause between two downloads of a batch
    pub batch_pacing_ms: u64,
    /// Distance from the bottom of the grid that triggers the next page
    pub scroll_threshold_px: f32,
    /// Defaults to the system download folder
    pub download_dir: Option<PathBuf>,
    /// Keep the session token across restarts
    pub remember_session: bool,
    /// Put an image back when the server refuses to delete it
    pub restore_failed_deletes: bool,
    /// How long notifications stay on screen
    pub notice_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            page_size: 12,
            long_press_ms: DEFAULT_LONG_PRESS_DELAY.as_millis() as u64,
            batch_pacing_ms: DEFAULT_PACING.as_millis() as u64,
            scroll_threshold_px: 200.0,
            download_dir: None,
            remember_session: false,
            restore_failed_deletes: true,
            notice_ttl_secs: 4,
        }
    }
}

impl Config {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path`, returning defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let config: Self = serde_json::from_str(&json)
            .map_err(|e| GalleryError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get the path where the config file should be stored
    pub fn default_path() -> PathBuf {
        app_dir(dirs::config_dir()).join("config.json")
    }

    /// Where the session token is kept when `remember_session` is on
    pub fn session_path() -> PathBuf {
        app_dir(dirs::data_dir()).join("session")
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

/// `<base>/image-gallery`, falling back to the home directory
fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("image-gallery")
}
