//! Player preferences
//!
//! Persisted as JSON in LocalStorage; native builds always use defaults.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound cue volume (0.0 - 1.0)
    pub cue_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,
    /// Play background music when a track is available
    pub music_enabled: bool,
    /// Mute when the window loses focus
    pub mute_on_blur: bool,

    // === Simulation ===
    /// Seed for pipe heights; `None` picks one at startup
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            cue_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            music_enabled: true,
            mute_on_blur: true,
            seed: None,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "flappy_settings";

    /// Clamp volumes into range after loading untrusted data
    pub fn sanitized(mut self) -> Self {
        for v in [
            &mut self.master_volume,
            &mut self.cue_volume,
            &mut self.music_volume,
        ] {
            *v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        }
        self
    }

    /// Parse stored JSON, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring malformed settings: {e}");
                Self::default()
            }
        }
    }

    /// Effective cue gain (respects mute)
    pub fn effective_cue_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.cue_volume
        }
    }

    /// Effective music gain (respects mute and the music toggle)
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted || !self.music_enabled {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Flip the mute flag and persist it. Returns the new state.
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.save();
        self.muted
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} storage on native, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"muted": true, "seed": 42}"#);
        assert!(settings.muted);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.music_volume, 0.7);
        assert_eq!(settings.effective_cue_volume(), 0.0);
    }

    #[test]
    fn test_out_of_range_volumes_clamped() {
        let settings = Settings::from_json(r#"{"master_volume": 3.0, "cue_volume": -1.0}"#);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.cue_volume, 0.0);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
    }

    #[test]
    fn test_toggle_muted_silences_both_buses() {
        let mut settings = Settings::default();
        assert!(settings.toggle_muted());
        assert_eq!(settings.effective_cue_volume(), 0.0);
        assert_eq!(settings.effective_music_volume(), 0.0);
        assert!(!settings.toggle_muted());
        assert_eq!(settings.effective_music_volume(), 0.7);
    }

    #[test]
    fn test_music_toggle() {
        let mut settings = Settings::default();
        assert!(settings.effective_music_volume() > 0.0);
        settings.music_enabled = false;
        assert_eq!(settings.effective_music_volume(), 0.0);
        assert_eq!(settings.effective_cue_volume(), 1.0);
    }
}
