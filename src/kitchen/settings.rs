use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::stage_classifier::StageThresholds;
use super::store::{StorageKey, Store};

const API_URL_ENV: &str = "COOKMATE_API_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default = "default_true")]
    pub voice: bool,

    #[serde(default = "default_true")]
    pub sounds: bool,

    #[serde(default = "default_true")]
    pub auto_stage: bool,

    #[serde(default)]
    pub gestures: bool,

    #[serde(default = "default_voice_speed")]
    pub voice_speed: f32,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    #[serde(default)]
    pub detection_url: Option<String>,

    #[serde(default)]
    pub stage_thresholds: StageThresholds,
}

// Helper functions for default values
fn default_version() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
fn default_voice_speed() -> f32 {
    0.9
}
fn default_sensitivity() -> f32 {
    0.5
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            voice: true,
            sounds: true,
            auto_stage: true,
            gestures: false,
            voice_speed: default_voice_speed(),
            sensitivity: default_sensitivity(),
            detection_url: None,
            stage_thresholds: StageThresholds::default(),
        }
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChange {
    pub voice: Option<bool>,
    pub sounds: Option<bool>,
    pub auto_stage: Option<bool>,
    pub gestures: Option<bool>,
    pub voice_speed: Option<f32>,
    pub sensitivity: Option<f32>,
}

impl Settings {
    pub fn load(store: &Store) -> Self {
        let mut settings = match store.get::<Settings>(StorageKey::Settings) {
            Some(mut settings) => {
                settings.migrate();
                settings
            }
            None => {
                let default = Settings::default();
                default.save(store);
                default
            }
        };
        settings.apply_env_overrides();
        settings
    }

    pub fn save(&self, store: &Store) -> bool {
        store.set(StorageKey::Settings, self)
    }

    pub fn apply(&mut self, change: &SettingsChange) {
        if let Some(voice) = change.voice {
            self.voice = voice;
        }
        if let Some(sounds) = change.sounds {
            self.sounds = sounds;
        }
        if let Some(auto_stage) = change.auto_stage {
            self.auto_stage = auto_stage;
        }
        if let Some(gestures) = change.gestures {
            self.gestures = gestures;
        }
        if let Some(voice_speed) = change.voice_speed {
            self.voice_speed = voice_speed.clamp(0.1, 2.0);
        }
        if let Some(sensitivity) = change.sensitivity {
            self.sensitivity = sensitivity.clamp(0.0, 1.0);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            match normalize_endpoint(&url) {
                Some(url) => {
                    info!(target: "settings", "detection endpoint from {}: {}", API_URL_ENV, url);
                    self.detection_url = Some(url);
                }
                None => warn!(target: "settings", "ignoring {}={:?}", API_URL_ENV, url),
            }
        }
    }

    fn migrate(&mut self) {
        match self.version {
            0 | 1 => {
                self.stage_thresholds = StageThresholds::default();
                self.version = 2;
            }
            _ => (),
        }
    }

    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }
}

/// Accepts only http(s) URLs; strips a trailing slash.
pub fn normalize_endpoint(url: &str) -> Option<String> {
    let url = url.trim();
    if !url.starts_with("http") {
        return None;
    }
    Some(url.strip_suffix('/').unwrap_or(url).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_writes_defaults_when_missing() {
        std::env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let settings = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert!(store.get::<Settings>(StorageKey::Settings).is_some());
    }

    #[test]
    #[serial]
    fn test_partial_blob_gets_field_defaults() {
        std::env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::fs::write(
            dir.path().join("cookmate_settings.json"),
            r#"{"version": 1, "voice": false}"#,
        )
        .unwrap();

        let settings = Settings::load(&store);
        assert!(!settings.voice);
        assert!(settings.sounds);
        assert_eq!(settings.voice_speed, 0.9);
        assert_eq!(settings.version, 2);
    }

    #[test]
    #[serial]
    fn test_env_overrides_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::env::set_var(API_URL_ENV, "https://vision.example.com/");
        let settings = Settings::load(&store);
        std::env::remove_var(API_URL_ENV);
        assert_eq!(
            settings.detection_url.as_deref(),
            Some("https://vision.example.com")
        );
    }

    #[test]
    fn test_apply_change() {
        let mut settings = Settings::default();
        settings.apply(&SettingsChange {
            sounds: Some(false),
            sensitivity: Some(4.0),
            ..Default::default()
        });
        assert!(!settings.sounds);
        assert!(settings.voice);
        assert_eq!(settings.sensitivity, 1.0);
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint(" http://localhost:5000/ "),
            Some("http://localhost:5000".to_string())
        );
        assert_eq!(normalize_endpoint("localhost:5000"), None);
        assert_eq!(normalize_endpoint(""), None);
    }
}
