//! # Settings
//!
//! Persisted user configuration for the prototype: whether the virtual
//! pad may be used at all, whether it stays on screen while a physical
//! controller is connected, and whether the debug overlay is drawn.
//!
//! ## Key Abstractions
//! - [`Settings`] is the serializable snapshot, stored as TOML under the
//!   platform config directory (`<config-dir>/pixelpad/settings.toml`).
//! - [`SettingsPortal`] wraps the snapshot in `Arc<RwLock<_>>` so the
//!   frame loop and background save tasks share one copy. Access is
//!   non-blocking: reads and writes use `try_read`/`try_write` with a
//!   bounded retry before giving up.
//!
//! ## Error Handling Strategy
//! Missing or unparsable settings files degrade to defaults rather than
//! preventing startup; only real I/O failures surface as errors.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SETTINGS_DIR: &str = "pixelpad";
const SETTINGS_FILE: &str = "settings.toml";

const MAX_LOCK_ATTEMPTS: usize = 5;
const LOCK_RETRY_DELAY_MS: u64 = 10;

/// Virtual pad configuration read at arbitration-decision points.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PadSettings {
    /// Whether virtual input is permitted at all.
    pub virtual_pad_enabled: bool,
    /// Whether the virtual pad stays active while a physical controller
    /// is connected.
    pub virtual_pad_always_visible: bool,
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            virtual_pad_enabled: true,
            virtual_pad_always_visible: false,
        }
    }
}

/// Debug overlay configuration.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct OverlaySettings {
    pub overlay_enabled: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            overlay_enabled: true,
        }
    }
}

/// Complete persisted configuration snapshot.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub pad: PadSettings,
    pub overlay: OverlaySettings,
}

/// Shared handle to the live settings, cloneable across tasks.
#[derive(Clone, Debug)]
pub struct SettingsPortal {
    settings: Arc<RwLock<Settings>>,
}

impl SettingsPortal {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns a copy of the current settings. Falls back to defaults
    /// with a warning if the lock stays contended past the retry limit.
    pub fn snapshot(&self) -> Settings {
        let mut attempts = 0;
        loop {
            match self.settings.try_read() {
                Ok(guard) => return *guard,
                Err(e) => {
                    attempts += 1;
                    warn!(
                        "Settings read blocked: {} (attempt {}/{})",
                        e, attempts, MAX_LOCK_ATTEMPTS
                    );
                    if attempts >= MAX_LOCK_ATTEMPTS {
                        warn!("Settings unavailable, using defaults");
                        return Settings::default();
                    }
                    std::thread::sleep(std::time::Duration::from_millis(LOCK_RETRY_DELAY_MS));
                }
            }
        }
    }

    pub fn pad(&self) -> PadSettings {
        self.snapshot().pad
    }

    pub fn overlay_enabled(&self) -> bool {
        self.snapshot().overlay.overlay_enabled
    }

    /// Replaces the current settings, with the same bounded retry as
    /// reads. Returns false when the lock could not be acquired.
    pub fn replace(&self, settings: Settings) -> bool {
        let mut attempts = 0;
        loop {
            match self.settings.try_write() {
                Ok(mut guard) => {
                    *guard = settings;
                    return true;
                }
                Err(e) => {
                    attempts += 1;
                    warn!(
                        "Settings write blocked: {} (attempt {}/{})",
                        e, attempts, MAX_LOCK_ATTEMPTS
                    );
                    if attempts >= MAX_LOCK_ATTEMPTS {
                        return false;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(LOCK_RETRY_DELAY_MS));
                }
            }
        }
    }

    /// Writes the current settings to the settings file.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.snapshot();
        save_settings(&snapshot).await
    }
}

/// Loads settings from disk, creating the file with defaults when it
/// does not exist yet. Unparsable content degrades to defaults.
pub async fn load_or_create() -> Result<Settings> {
    let path = settings_path();

    if !tokio::fs::try_exists(&path)
        .await
        .map_err(|e| eyre!("Failed to check settings file: {}", e))?
    {
        info!("No settings file found, creating defaults at {:?}", path);
        let settings = Settings::default();
        save_settings(&settings).await?;
        return Ok(settings);
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| eyre!("Failed to read settings file: {}", e))?;

    match toml::from_str(&content) {
        Ok(settings) => {
            debug!("Loaded settings: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            warn!("Settings file is not valid TOML ({}), using defaults", e);
            Ok(Settings::default())
        }
    }
}

async fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path();
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| eyre!("Failed to write settings file: {}", e))?;

    info!("Settings saved to {:?}", path);
    Ok(())
}

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(SETTINGS_DIR);
    path.push(SETTINGS_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.pad.virtual_pad_enabled);
        assert!(!settings.pad.virtual_pad_always_visible);
        assert!(settings.overlay.overlay_enabled);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            pad: PadSettings {
                virtual_pad_enabled: false,
                virtual_pad_always_visible: true,
            },
            overlay: OverlaySettings {
                overlay_enabled: false,
            },
        };

        let content = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&content).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let parsed: Settings = toml::from_str("[pad]\nvirtual_pad_enabled = false\n").unwrap();
        assert!(!parsed.pad.virtual_pad_enabled);
        assert!(!parsed.pad.virtual_pad_always_visible);
        assert!(parsed.overlay.overlay_enabled);
    }

    #[test]
    fn test_portal_snapshot_and_replace() {
        let portal = SettingsPortal::new(Settings::default());
        assert!(portal.pad().virtual_pad_enabled);

        let mut changed = portal.snapshot();
        changed.pad.virtual_pad_always_visible = true;
        assert!(portal.replace(changed));

        assert!(portal.pad().virtual_pad_always_visible);
        assert!(portal.overlay_enabled());
    }
}
