//! Settings Persistence
//!
//! Provides persistent studio settings with:
//! - Atomic file writes (temp file + rename)
//! - Per-section defaults so partial or older files still load
//! - Normalization that corrects bad values instead of failing
//!
//! Storage location: {config_dir}/capforge/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{info, warn};

use crate::core::export::ExportKind;
use crate::core::template::models::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_DURATION_SEC, MAX_DURATION_SEC, MIN_DURATION_SEC,
};
use crate::core::template::DraftDefaults;
use crate::core::timeline::DEFAULT_TICK_INTERVAL_MS;
use crate::core::{fs as core_fs, is_hex_color, AspectRatio, CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "capforge";

/// Studio settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct StudioSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Draft defaults
    #[serde(default)]
    pub editor: EditorSettings,

    /// Preview playback
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Export behavior
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            editor: EditorSettings::default(),
            playback: PlaybackSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl StudioSettings {
    /// Clamps and repairs values so the settings are always usable.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.editor.default_duration = self
            .editor
            .default_duration
            .clamp(MIN_DURATION_SEC, MAX_DURATION_SEC);
        if !is_hex_color(&self.editor.default_background_color) {
            warn!(
                "Invalid default background color {:?}, using {}",
                self.editor.default_background_color, DEFAULT_BACKGROUND_COLOR
            );
            self.editor.default_background_color = DEFAULT_BACKGROUND_COLOR.to_string();
        }

        self.playback.tick_interval_ms = self.playback.tick_interval_ms.clamp(10, 1000);
    }

    /// Draft defaults derived from the editor section
    pub fn draft_defaults(&self) -> DraftDefaults {
        DraftDefaults {
            name: String::new(),
            duration: self.editor.default_duration,
            aspect_ratio: self.editor.default_aspect_ratio,
            background_color: self.editor.default_background_color.clone(),
        }
    }
}

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Duration of a new draft in seconds
    #[serde(default = "default_duration")]
    pub default_duration: u32,

    #[serde(default)]
    pub default_aspect_ratio: AspectRatio,

    #[serde(default = "default_background_color")]
    pub default_background_color: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            default_aspect_ratio: AspectRatio::default(),
            default_background_color: default_background_color(),
        }
    }
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SEC
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Wall-clock period between preview ticks (10 - 1000 ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl PlaybackSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

/// Export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Document written when no kind is given
    #[serde(default)]
    pub default_kind: ExportKind,

    /// Directory for exported files; current directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a settings manager storing `settings.json` in `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self {
            settings_path: dir.join(SETTINGS_FILE),
        }
    }

    /// Create a settings manager for an explicit file path
    pub fn with_path(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Settings manager in the platform config directory
    pub fn in_config_dir() -> CoreResult<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            CoreError::Internal("No platform configuration directory".to_string())
        })?;
        Ok(Self::new(base.join(APP_DIR_NAME)))
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Load settings from disk, returning defaults if the file is missing or
    /// unreadable
    pub fn load(&self) -> StudioSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(StudioSettings::default());
            }

            let mut settings: StudioSettings = core_fs::read_json(&self.settings_path)?;
            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
            }
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                StudioSettings::default()
            }
        }
    }

    /// Normalize and save settings atomically. Returns what was written.
    pub fn save(&self, settings: &StudioSettings) -> CoreResult<StudioSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();
            core_fs::atomic_write_json_pretty(&self.settings_path, &normalized)?;
            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<StudioSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(StudioSettings::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = StudioSettings::default();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.editor.default_duration, 15);
        assert_eq!(settings.editor.default_aspect_ratio, AspectRatio::Vertical);
        assert_eq!(settings.editor.default_background_color, "#000000");
        assert_eq!(settings.playback.tick_interval_ms, 100);
        assert_eq!(settings.export.default_kind, ExportKind::CapCut);
        assert!(settings.export.output_dir.is_none());
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut settings = StudioSettings::default();
        settings.version = 0;
        settings.editor.default_duration = 0;
        settings.editor.default_background_color = "black".to_string();
        settings.playback.tick_interval_ms = 5_000;

        settings.normalize();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.editor.default_duration, 1);
        assert_eq!(settings.editor.default_background_color, "#000000");
        assert_eq!(settings.playback.tick_interval_ms, 1000);
    }

    #[test]
    fn test_partial_json_uses_section_defaults() {
        let settings: StudioSettings =
            serde_json::from_str(r#"{ "editor": { "defaultDuration": 30 } }"#).unwrap();

        assert_eq!(settings.editor.default_duration, 30);
        assert_eq!(settings.editor.default_background_color, "#000000");
        assert_eq!(settings.playback.tick_interval_ms, 100);
    }

    #[test]
    fn test_draft_defaults_follow_editor_section() {
        let mut settings = StudioSettings::default();
        settings.editor.default_duration = 45;
        settings.editor.default_aspect_ratio = AspectRatio::Horizontal;

        let defaults = settings.draft_defaults();
        assert_eq!(defaults.duration, 45);
        assert_eq!(defaults.aspect_ratio, AspectRatio::Horizontal);
        assert!(defaults.name.is_empty());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        assert_eq!(manager.load(), StudioSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());

        let mut settings = StudioSettings::default();
        settings.editor.default_duration = 60;
        settings.export.default_kind = ExportKind::Template;
        settings.export.output_dir = Some(PathBuf::from("/tmp/exports"));

        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved, settings);
        assert_eq!(manager.load(), settings);
    }

    #[test]
    fn test_save_normalizes() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());

        let mut settings = StudioSettings::default();
        settings.editor.default_duration = 10_000;
        let saved = manager.save(&settings).unwrap();

        assert_eq!(saved.editor.default_duration, 300);
        assert_eq!(manager.load().editor.default_duration, 300);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        std::fs::write(manager.settings_path(), "{ not json").unwrap();

        assert_eq!(manager.load(), StudioSettings::default());
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        manager.save(&StudioSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let settings = manager.reset().unwrap();
        assert_eq!(settings, StudioSettings::default());
        assert!(!manager.settings_path().exists());
    }
}
