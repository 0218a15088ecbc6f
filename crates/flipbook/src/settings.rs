use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::media::types::PlayDirection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub version: u32,
    /// Delay multiplier; 1.0 plays at the authored speed.
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub direction: PlayDirection,
    #[serde(default)]
    pub ping_pong: bool,
    #[serde(default)]
    pub start_paused: bool,
    /// Decode every frame before playing instead of streaming.
    #[serde(default)]
    pub preload: bool,
}

fn default_speed() -> f32 {
    1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            version: 1,
            speed: default_speed(),
            direction: PlayDirection::Forward,
            ping_pong: false,
            start_paused: false,
            preload: false,
        }
    }
}

impl PlaybackSettings {
    /// `<config dir>/flipbook/settings.json`
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flipbook").join("settings.json"))
    }

    /// Load from the user config dir, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable settings: {e:#}");
                }
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            log::warn!("Failed to save settings: {e:#}");
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        if !self.speed.is_finite() || self.speed < 0.0 {
            log::warn!("Invalid speed {} in settings, using 1.0", self.speed);
            self.speed = default_speed();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = PlaybackSettings {
            speed: 0.5,
            direction: PlayDirection::Backward,
            ping_pong: true,
            preload: true,
            ..PlaybackSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(PlaybackSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "version": 1, "ping_pong": true }"#).unwrap();
        let settings = PlaybackSettings::load_from(&path).unwrap();
        assert!(settings.ping_pong);
        assert_eq!(settings.speed, 1.0);
        assert_eq!(settings.direction, PlayDirection::Forward);
    }

    #[test]
    fn negative_speed_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "version": 1, "speed": -2.0 }"#).unwrap();
        assert_eq!(PlaybackSettings::load_from(&path).unwrap().speed, 1.0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(PlaybackSettings::load_from(&path).is_err());
    }
}
