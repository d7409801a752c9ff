#![forbid(unsafe_code)]

//! Gesture recognition for the seating views.
//!
//! Four recognizers feed one [`GestureArena`]:
//!
//! - **tap** ([`tap`]): immediate single taps plus manual double-tap pairing;
//! - **long press**: held within the touch slop past the threshold;
//! - **pan + pinch** ([`pan`]): recognised simultaneously against a snapshot;
//! - **momentum** ([`momentum`]): coasting after a fast release.
//!
//! The arena decides which family owns a touch session; the viewport
//! controller turns its output into transform writes and host intents.

pub mod arena;
pub mod momentum;
pub mod pan;
pub mod tap;

pub use arena::{Family, GestureArena, GestureOutput};
pub use momentum::{Momentum, MomentumConfig};
pub use pan::{TransformGesture, VelocityTracker};
pub use tap::{TapKind, TapRecord, TapTracker};

use web_time::Duration;

/// Default hold time before a press becomes a long press.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(400);
/// Default movement (screen px) tolerated before a press becomes a pan.
pub const TOUCH_SLOP: f64 = 8.0;

/// Thresholds for the recognizers.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Maximum time between two taps of a double tap.
    pub double_tap_window: Duration,
    /// Maximum distance between two taps of a double tap.
    pub double_tap_distance: f64,
    /// Hold time before a long press fires.
    pub long_press_threshold: Duration,
    /// Movement tolerated before the press family loses to pan.
    pub touch_slop: f64,
    pub momentum: MomentumConfig,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window: tap::DOUBLE_TAP_WINDOW,
            double_tap_distance: tap::DOUBLE_TAP_DISTANCE,
            long_press_threshold: LONG_PRESS_THRESHOLD,
            touch_slop: TOUCH_SLOP,
            momentum: MomentumConfig::default(),
        }
    }
}
