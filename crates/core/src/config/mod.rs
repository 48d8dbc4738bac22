use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{KeyBindings, LightError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub beat: BeatConfig,
    pub keys: KeyBindings,
}

impl AppConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.display.validate()?;
        self.beat.validate()?;
        self.keys.validate()
    }
}

/// Window settings used until the operator switches to fullscreen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    pub start_fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_width: 60 * 16,
            window_height: 60 * 9,
            title: "Beamlight".to_string(),
            start_fullscreen: false,
        }
    }
}

impl DisplayConfig {
    fn validate(&self) -> Result<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(LightError::invalid_config(format!(
                "window size {}x{} must be non-zero",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }
}

/// Tap tracking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Period in seconds used before the first tap session.
    pub initial_period: f64,
    /// Gaps between taps at or above this many seconds are not tempos.
    pub max_tap_gap: f64,
    /// A session goes stale after this many periods without a tap.
    pub stale_multiplier: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            initial_period: 5.0,
            max_tap_gap: 15.0,
            stale_multiplier: 2.0,
        }
    }
}

impl BeatConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("initial_period", self.initial_period),
            ("max_tap_gap", self.max_tap_gap),
            ("stale_multiplier", self.stale_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LightError::invalid_config(format!(
                    "beat.{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
