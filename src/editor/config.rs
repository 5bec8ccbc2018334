// Editor configuration persisted per user

use crate::time::SnapSetting;
use std::path::PathBuf;

/// User-level editor settings.
///
/// Stored as RON under the platform config directory; a missing or
/// unreadable file falls back to defaults so a broken config never
/// blocks startup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorConfig {
    /// Default horizontal zoom
    pub px_per_beat: f64,
    /// Default sequencer snap setting
    pub snap: SnapSetting,
    /// Whether the audio lane snaps
    pub audio_snap_enabled: bool,
    /// Directory scanned into the sample pool on startup
    pub sample_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            px_per_beat: 24.0,
            snap: SnapSetting::default(),
            audio_snap_enabled: true,
            sample_dir: None,
        }
    }
}

impl EditorConfig {
    /// Platform config file location, when one exists
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("arranger").join("config.ron"))
    }

    /// Load the user config, falling back to defaults
    pub fn load_or_default() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|data| match ron::from_str(&data) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("ignoring unreadable editor config: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Write the config to `path` (callers pass `config_path()` or a
    /// test location)
    pub fn save_to(&self, path: &PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = ron::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, data)
    }
}
