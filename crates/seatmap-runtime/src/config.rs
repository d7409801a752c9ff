#![forbid(unsafe_code)]

//! Policy-as-data configuration for the seating views.
//!
//! Every tunable of the interaction engine lives in one [`SeatmapConfig`]
//! that a host can load from TOML or JSON at startup (feature
//! `config-file`) instead of patching constants.
//!
//! # Loading
//!
//! ```toml
//! # seatmap.toml
//! [zoom]
//! max_scale = 2.5
//!
//! [gesture]
//! long_press_ms = 500
//!
//! [turn_time.timeline_policy]
//! kind = "party_size_buckets"
//! up_to_2 = 60
//! up_to_4 = 75
//! up_to_6 = 90
//! larger = 105
//! ```
//!
//! ```rust,ignore
//! let config = SeatmapConfig::from_toml_file("seatmap.toml")?.validated()?;
//! ```
//!
//! # Defaults
//!
//! Every field defaults to the constant the engine uses when no config is
//! given, so `SeatmapConfig::default()` behaves exactly like the bare
//! constructors.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use seatmap_core::animation::DEFAULT_CAMERA_STIFFNESS;
use seatmap_core::entity::Rgba;
use seatmap_core::fit::{DEFAULT_FOCUS_SCALE, FIT_PADDING, FitConfig};
use seatmap_core::gesture::momentum::{DEFAULT_DECELERATION, DEFAULT_MIN_FLING_VELOCITY};
use seatmap_core::gesture::{GestureConfig, LONG_PRESS_THRESHOLD, MomentumConfig, TOUCH_SLOP, tap};
use seatmap_core::transform::{MAX_SCALE, MIN_SCALE, ZoomLimits};
use web_time::Duration;

use crate::turn_time::{TurnTimePolicy, TurnTimeThresholds};

// ---------------------------------------------------------------------------
// Top-level SeatmapConfig
// ---------------------------------------------------------------------------

/// All tunables, grouped by concern.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct SeatmapConfig {
    pub zoom: ZoomSection,
    pub fit: FitSection,
    pub gesture: GestureSection,
    pub momentum: MomentumSection,
    pub camera: CameraSection,
    pub drag: DragSection,
    pub turn_time: TurnTimeSection,
    pub render: RenderSection,
}

impl SeatmapConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(target: "seatmap.config", path = %path.as_ref().display(), "loading TOML config");
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(target: "seatmap.config", path = %path.as_ref().display(), "loading JSON config");
        Self::from_json_str(&content)
    }

    /// Serialize to pretty TOML.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter is in range.
    ///
    /// Returns the list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let z = &self.zoom;
        if !(z.min_scale >= MIN_SCALE && z.min_scale <= MAX_SCALE) {
            errors.push(format!(
                "zoom.min_scale must be in [{MIN_SCALE}, {MAX_SCALE}], got {}",
                z.min_scale
            ));
        }
        if !(z.max_scale >= MIN_SCALE && z.max_scale <= MAX_SCALE) {
            errors.push(format!(
                "zoom.max_scale must be in [{MIN_SCALE}, {MAX_SCALE}], got {}",
                z.max_scale
            ));
        }
        if z.min_scale > z.max_scale {
            errors.push(format!(
                "zoom.min_scale ({}) must not exceed zoom.max_scale ({})",
                z.min_scale, z.max_scale
            ));
        }

        if !(self.fit.padding >= 0.0 && self.fit.padding.is_finite()) {
            errors.push(format!("fit.padding must be >= 0, got {}", self.fit.padding));
        }
        if !(self.fit.focus_scale > 0.0 && self.fit.focus_scale.is_finite()) {
            errors.push(format!(
                "fit.focus_scale must be > 0, got {}",
                self.fit.focus_scale
            ));
        }

        let g = &self.gesture;
        if g.double_tap_window_ms == 0 {
            errors.push("gesture.double_tap_window_ms must be > 0".into());
        }
        if !(g.double_tap_distance > 0.0) {
            errors.push(format!(
                "gesture.double_tap_distance must be > 0, got {}",
                g.double_tap_distance
            ));
        }
        if g.long_press_ms == 0 {
            errors.push("gesture.long_press_ms must be > 0".into());
        }
        if !(g.touch_slop >= 0.0 && g.touch_slop.is_finite()) {
            errors.push(format!("gesture.touch_slop must be >= 0, got {}", g.touch_slop));
        }

        let m = &self.momentum;
        if !(m.deceleration > 0.0 && m.deceleration.is_finite()) {
            errors.push(format!(
                "momentum.deceleration must be > 0, got {}",
                m.deceleration
            ));
        }
        if !(m.min_velocity >= 0.0) {
            errors.push(format!(
                "momentum.min_velocity must be >= 0, got {}",
                m.min_velocity
            ));
        }

        if !(self.camera.stiffness > 0.0 && self.camera.stiffness.is_finite()) {
            errors.push(format!(
                "camera.stiffness must be > 0, got {}",
                self.camera.stiffness
            ));
        }

        if self.drag.error_notice_ms == 0 {
            errors.push("drag.error_notice_ms must be > 0".into());
        }

        let th = &self.turn_time.thresholds;
        if !(th.amber_from >= 0.0 && th.amber_from <= th.red_above) {
            errors.push(format!(
                "turn_time.thresholds: need 0 <= amber_from ({}) <= red_above ({})",
                th.amber_from, th.red_above
            ));
        }
        for (name, policy) in [
            ("floor_policy", &self.turn_time.floor_policy),
            ("timeline_policy", &self.turn_time.timeline_policy),
        ] {
            let zero = match *policy {
                TurnTimePolicy::Flat { minutes } => minutes == 0,
                TurnTimePolicy::PartySizeBuckets {
                    up_to_2,
                    up_to_4,
                    up_to_6,
                    larger,
                } => [up_to_2, up_to_4, up_to_6, larger].contains(&0),
            };
            if zero {
                errors.push(format!("turn_time.{name}: expected minutes must be > 0"));
            }
        }

        let r = &self.render;
        if r.show_grid && !(r.grid_spacing > 0.0) {
            errors.push(format!(
                "render.grid_spacing must be > 0 when the grid is shown, got {}",
                r.grid_spacing
            ));
        }
        for (name, v) in [
            ("border_width", r.border_width),
            ("server_ring_width", r.server_ring_width),
            ("selection_ring_width", r.selection_ring_width),
            ("shadow_spread", r.shadow_spread),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                errors.push(format!("render.{name} must be >= 0, got {v}"));
            }
        }

        errors
    }

    /// `self` if valid, otherwise [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            tracing::warn!(target: "seatmap.config", count = errors.len(), "config rejected");
            Err(ConfigError::Validation(errors))
        }
    }

    // -----------------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min_scale: self.zoom.min_scale,
            max_scale: self.zoom.max_scale,
        }
    }

    #[must_use]
    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            padding: self.fit.padding,
            limits: self.zoom_limits(),
        }
    }

    #[must_use]
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            double_tap_window: Duration::from_millis(self.gesture.double_tap_window_ms),
            double_tap_distance: self.gesture.double_tap_distance,
            long_press_threshold: Duration::from_millis(self.gesture.long_press_ms),
            touch_slop: self.gesture.touch_slop,
            momentum: MomentumConfig {
                deceleration: self.momentum.deceleration,
                min_velocity: self.momentum.min_velocity,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Zoom range; a sub-range of the hard `[0.5, 3.0]` limits.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ZoomSection {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ZoomSection {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct FitSection {
    /// Content-space padding around the fitted box.
    pub padding: f64,
    /// Scale used by `zoom_to_entity` when the host gives none.
    pub focus_scale: f64,
}

impl Default for FitSection {
    fn default() -> Self {
        Self {
            padding: FIT_PADDING,
            focus_scale: DEFAULT_FOCUS_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct GestureSection {
    pub double_tap_window_ms: u64,
    /// Screen pixels.
    pub double_tap_distance: f64,
    pub long_press_ms: u64,
    /// Screen pixels.
    pub touch_slop: f64,
}

impl Default for GestureSection {
    fn default() -> Self {
        Self {
            double_tap_window_ms: tap::DOUBLE_TAP_WINDOW.as_millis() as u64,
            double_tap_distance: tap::DOUBLE_TAP_DISTANCE,
            long_press_ms: LONG_PRESS_THRESHOLD.as_millis() as u64,
            touch_slop: TOUCH_SLOP,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct MomentumSection {
    pub enabled: bool,
    /// px/s².
    pub deceleration: f64,
    /// px/s.
    pub min_velocity: f64,
}

impl Default for MomentumSection {
    fn default() -> Self {
        Self {
            enabled: true,
            deceleration: DEFAULT_DECELERATION,
            min_velocity: DEFAULT_MIN_FLING_VELOCITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct CameraSection {
    /// Animate reset/zoom moves; when false the transform jumps.
    pub animate: bool,
    pub stiffness: f64,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            animate: true,
            stiffness: DEFAULT_CAMERA_STIFFNESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct DragSection {
    /// How long a reassignment error stays visible.
    pub error_notice_ms: u64,
}

impl Default for DragSection {
    fn default() -> Self {
        Self {
            error_notice_ms: 4_000,
        }
    }
}

/// Turn-time lookups per view. The two views historically disagree; both
/// are configurable and neither is derived from the other.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct TurnTimeSection {
    pub floor_policy: TurnTimePolicy,
    pub timeline_policy: TurnTimePolicy,
    pub thresholds: TurnTimeThresholds,
}

impl Default for TurnTimeSection {
    fn default() -> Self {
        Self {
            floor_policy: TurnTimePolicy::default(),
            timeline_policy: TurnTimePolicy::BUCKETED,
            thresholds: TurnTimeThresholds::default(),
        }
    }
}

/// Colours and layer sizes for the floor plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct RenderSection {
    pub background: Rgba,
    pub show_grid: bool,
    /// Content units between grid lines.
    pub grid_spacing: f64,
    pub grid_color: Rgba,
    pub border_color: Rgba,
    pub border_width: f64,
    pub server_ring_width: f64,
    pub selection_color: Rgba,
    pub selection_ring_width: f64,
    pub shadow_color: Rgba,
    pub shadow_spread: f64,
    pub decor_fill: Rgba,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            background: Rgba(0xFAFAFAFF),
            show_grid: true,
            grid_spacing: 50.0,
            grid_color: Rgba(0xE0E0E0FF),
            border_color: Rgba(0x9E9E9EFF),
            border_width: 2.0,
            server_ring_width: 4.0,
            selection_color: Rgba(0x1E88E5FF),
            selection_ring_width: 3.0,
            shadow_color: Rgba(0x00000033),
            shadow_spread: 4.0,
            decor_fill: Rgba(0xBDBDBDFF),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[cfg(feature = "config-file")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
