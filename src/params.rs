/*
 * Parameters Module
 *
 * This module defines the showcase configuration. Every tuning constant of
 * the camera controller, the warp timers, the tunnel layout, the void view
 * and the external collaborators lives here so it can be overridden from a
 * TOML file instead of being hardcoded. Missing keys keep their defaults.
 *
 * It also holds the runtime view settings that the debug UI can change,
 * together with the snapshot-based change detection the app uses to know
 * when the tunnel layout has to be rebuilt.
 */

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

// Camera controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub wheel_sensitivity: f32,
    pub wheel_sound_threshold: f32,
    // Pixels per wheel "line" so line and pixel deltas share one scale
    pub line_delta_pixels: f32,
    pub key_step: f32,
    pub touch_sensitivity: f32,
    pub touch_sound_threshold: f32,
    pub limit_buffer: f32,
    pub damping: f32,
    pub warp_damping: f32,
    pub warp_forward_speed: f32,
    pub warp_reverse_speed: f32,
    pub reverse_entry_depth: f32,
    pub normal_fov: f32,
    pub wide_fov: f32,
    pub fov_speed_threshold: f32,
    pub fov_rate: f32,
    pub shake_speed_threshold: f32,
    pub shake_light: f32,
    pub shake_heavy: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            wheel_sensitivity: 0.05,
            wheel_sound_threshold: 5.0,
            line_delta_pixels: 100.0,
            key_step: 50.0,
            touch_sensitivity: 2.0,
            touch_sound_threshold: 2.0,
            limit_buffer: 50.0,
            damping: 5.0,
            warp_damping: 3.0,
            warp_forward_speed: 500.0,
            warp_reverse_speed: 1000.0,
            reverse_entry_depth: -2000.0,
            normal_fov: 70.0,
            wide_fov: 110.0,
            fov_speed_threshold: 50.0,
            fov_rate: 2.0,
            shake_speed_threshold: 1.0,
            shake_light: 0.05,
            shake_heavy: 0.2,
        }
    }
}

// Durations of the timer-driven view transitions, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingParams {
    pub warp_to_void_ms: u64,
    pub reverse_warp_ms: u64,
    pub oracle_handoff_ms: u64,
    pub scroll_sound_interval_ms: u64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            warp_to_void_ms: 2000,
            reverse_warp_ms: 2500,
            oracle_handoff_ms: 2000,
            scroll_sound_interval_ms: 150,
        }
    }
}

// Spiral tunnel layout, with a compact variant for narrow windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub z_spacing: f32,
    pub radius: f32,
    pub angle_step: f32,
    pub tile_scale: f32,
    pub compact_z_spacing: f32,
    pub compact_radius: f32,
    pub compact_angle_step: f32,
    pub compact_tile_scale: f32,
    pub compact_width_threshold: f32,
    pub first_tile_offset: f32,
    pub logo_offset: f32,
    pub oracle_logo_offset: f32,
    pub oracle_stop_buffer: f32,
    pub min_tunnel_length: f32,
    pub tunnel_tail: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            z_spacing: 15.0,
            radius: 8.0,
            angle_step: 1.2,
            tile_scale: 1.0,
            compact_z_spacing: 22.0,
            compact_radius: 3.5,
            compact_angle_step: 1.5,
            compact_tile_scale: 0.8,
            compact_width_threshold: 768.0,
            first_tile_offset: 20.0,
            logo_offset: 60.0,
            oracle_logo_offset: 50.0,
            oracle_stop_buffer: 20.0,
            min_tunnel_length: 1000.0,
            tunnel_tail: 300.0,
        }
    }
}

// Constellation (void) view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidParams {
    pub sphere_radius: f32,
    pub camera_distance: f32,
    pub fov: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub auto_rotate_speed: f32,
}

impl Default for VoidParams {
    fn default() -> Self {
        Self {
            sphere_radius: 20.0,
            camera_distance: 35.0,
            fov: 60.0,
            min_distance: 10.0,
            max_distance: 60.0,
            auto_rotate_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioParams {
    pub volume: f32,
    pub muted: bool,
    // Looping background track; empty disables it
    pub ambience_url: String,
    // Recorded warp cue; empty keeps the procedural sweep
    pub warp_url: String,
    pub ambience_gain: f32,
    pub ambience_fade_in_secs: f32,
    pub warp_asset_gain: f32,
    pub asset_timeout_secs: u64,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            volume: 0.5,
            muted: false,
            ambience_url: "https://claim.monad.xyz/sounds/sign-in-loop.mp3".to_string(),
            warp_url: "https://claim.monad.xyz/sounds/enter-the-portal.mp3".to_string(),
            ambience_gain: 0.3,
            ambience_fade_in_secs: 3.0,
            warp_asset_gain: 0.9,
            asset_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleParams {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub catalog_path: PathBuf,
    pub camera: CameraParams,
    pub timing: TimingParams,
    pub layout: LayoutParams,
    pub void_view: VoidParams,
    pub audio: AudioParams,
    pub oracle: OracleParams,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("data/catalog.json"),
            camera: CameraParams::default(),
            timing: TimingParams::default(),
            layout: LayoutParams::default(),
            void_view: VoidParams::default(),
            audio: AudioParams::default(),
            oracle: OracleParams::default(),
        }
    }
}

impl ShowcaseConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the config file if it exists; any failure falls back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

// View settings that can be adjusted via UI
pub struct ViewSettings {
    pub show_debug: bool,
    pub show_stars: bool,
    pub compact_layout: bool,
    pub star_count: usize,

    // Internal state for tracking changes
    previous_values: Option<SettingsSnapshot>,
}

// A snapshot of the values whose change requires a layout rebuild
struct SettingsSnapshot {
    compact_layout: bool,
    star_count: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_debug: false,
            show_stars: true,
            compact_layout: false,
            star_count: 1500,
            previous_values: None,
        }
    }
}

impl ViewSettings {
    // Take a snapshot of current values for change detection
    pub fn take_snapshot(&mut self) {
        self.previous_values = Some(SettingsSnapshot {
            compact_layout: self.compact_layout,
            star_count: self.star_count,
        });
    }

    // Returns (layout_changed, stars_changed) since the last snapshot
    pub fn detect_changes(&self) -> (bool, bool) {
        match &self.previous_values {
            Some(prev) => (
                self.compact_layout != prev.compact_layout,
                self.star_count != prev.star_count,
            ),
            None => (false, false),
        }
    }

    pub fn get_star_count_range() -> std::ops::RangeInclusive<usize> {
        0..=5000
    }
}

impl CameraParams {
    // Slider ranges for the debug window
    pub fn get_damping_range() -> std::ops::RangeInclusive<f32> {
        0.5..=20.0
    }

    pub fn get_sensitivity_range() -> std::ops::RangeInclusive<f32> {
        0.01..=0.5
    }

    pub fn get_fov_range() -> std::ops::RangeInclusive<f32> {
        30.0..=150.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_defaults() {
        let config = ShowcaseConfig::from_toml(
            r#"
catalog_path = "other.json"

[timing]
warp_to_void_ms = 1500
"#,
        )
        .unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("other.json"));
        assert_eq!(config.timing.warp_to_void_ms, 1500);
        assert_eq!(config.timing.reverse_warp_ms, 2500);
        assert_eq!(config.camera, CameraParams::default());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = ShowcaseConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ShowcaseConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(ShowcaseConfig::from_toml("camera = 3").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = ShowcaseConfig::load_or_default(Path::new("does/not/exist.toml"));
        assert_eq!(config, ShowcaseConfig::default());
    }

    #[test]
    fn settings_change_detection() {
        let mut settings = ViewSettings::default();
        assert_eq!(settings.detect_changes(), (false, false));
        settings.take_snapshot();
        settings.compact_layout = true;
        assert_eq!(settings.detect_changes(), (true, false));
        settings.take_snapshot();
        settings.star_count = 10;
        assert_eq!(settings.detect_changes(), (false, true));
    }
}
