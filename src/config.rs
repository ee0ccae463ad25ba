// Zone configuration.
//
// A `ZoneConfig` can be built in code or deserialized from a TOML file. Every
// field has a default, so a file only needs the keys it wants to change:
//
// ```toml
// brush_radius = 80
// policy = "erase_where_opaque"
// alpha_threshold = 0.5
// trigger_threshold = 0.9
// reset_mode = "quiescent"
// ```
//
// Out-of-range values are not rejected; `sanitized()` clamps them when the
// zone is activated.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::mask::EligibilityPolicy;

/// Smallest brush radius, in texels.
pub const MIN_BRUSH_RADIUS: u32 = 2;
/// Lowest trigger threshold; configured values are clamped up to it.
pub const MIN_TRIGGER_THRESHOLD: f32 = 0.05;

/// How Reset synchronizes with the pixel worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Never waits on the worker. An operation already being rasterized can
    /// still repaint a few texels after the buffer is restored.
    #[default]
    Fast,
    /// Waits for the worker to go idle before restoring the buffer. No stale
    /// write survives, at the cost of a blocking Reset.
    Quiescent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Brush radius in texels.
    pub brush_radius: u32,
    /// Which texels the brush may touch.
    pub policy: EligibilityPolicy,
    /// Alpha cut-off in [0,1] used to build the eligibility mask.
    pub alpha_threshold: f32,
    /// Coverage ratio in [0.05,1] that fires the trigger.
    pub trigger_threshold: f32,
    /// RGB written by the brush in paint mode.
    pub brush_color: [u8; 3],
    pub reset_mode: ResetMode,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            brush_radius: 32,
            policy: EligibilityPolicy::PaintWhereTransparent,
            alpha_threshold: 0.5,
            trigger_threshold: 0.9,
            brush_color: [0xFF, 0xFF, 0xFF],
            reset_mode: ResetMode::Fast,
        }
    }
}

impl ZoneConfig {
    /// Defaults of an erase zone: bigger brush, erase where opaque.
    pub fn eraser() -> Self {
        Self { brush_radius: 80, policy: EligibilityPolicy::EraseWhereOpaque, ..Self::default() }
    }

    /// Copy with every field clamped into its legal range.
    pub fn sanitized(&self) -> Self {
        let alpha_threshold = if self.alpha_threshold.is_nan() { 0.0 } else { self.alpha_threshold.clamp(0.0, 1.0) };
        let trigger_threshold = if self.trigger_threshold.is_nan() {
            MIN_TRIGGER_THRESHOLD
        } else {
            self.trigger_threshold.clamp(MIN_TRIGGER_THRESHOLD, 1.0)
        };
        Self {
            brush_radius: self.brush_radius.clamp(MIN_BRUSH_RADIUS, i32::MAX as u32),
            alpha_threshold,
            trigger_threshold,
            ..self.clone()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigRead(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
