#![forbid(unsafe_code)]

//! Post-release pan momentum under constant deceleration.
//!
//! Each axis coasts independently: with release velocity `v` and
//! deceleration `a` it travels `v·|v| / (2a)` over `|v| / a` seconds. Every
//! sample is clamped to the pan bounds at the terminal scale, so a fling
//! toward an edge stops at the edge.

use web_time::Duration;

use crate::geometry::Point;
use crate::transform::{ViewFrame, ViewportTransform};

/// Default deceleration in px/s².
pub const DEFAULT_DECELERATION: f64 = 2000.0;
/// Releases slower than this (px/s) do not coast.
pub const DEFAULT_MIN_FLING_VELOCITY: f64 = 50.0;

/// Momentum tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumConfig {
    pub deceleration: f64,
    pub min_velocity: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            deceleration: DEFAULT_DECELERATION,
            min_velocity: DEFAULT_MIN_FLING_VELOCITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Axis {
    start: f64,
    velocity: f64,
    duration: f64,
}

impl Axis {
    fn new(start: f64, velocity: f64, decel: f64) -> Self {
        Self {
            start,
            velocity,
            duration: velocity.abs() / decel,
        }
    }

    fn at(&self, secs: f64, decel: f64) -> f64 {
        let t = secs.min(self.duration);
        self.start + self.velocity * t - self.velocity.signum() * decel * t * t / 2.0
    }

    fn rest(&self, decel: f64) -> f64 {
        self.start + self.velocity * self.velocity.abs() / (2.0 * decel)
    }
}

/// A coasting pan.
#[derive(Debug, Clone)]
pub struct Momentum {
    scale: f64,
    x: Axis,
    y: Axis,
    decel: f64,
    elapsed: f64,
    frame: ViewFrame,
}

impl Momentum {
    /// Start coasting from `from` with release `velocity` (px/s). Returns
    /// `None` for a release too slow to coast.
    #[must_use]
    pub fn start(
        from: ViewportTransform,
        velocity: Point,
        config: &MomentumConfig,
        frame: ViewFrame,
    ) -> Option<Self> {
        if !velocity.is_finite()
            || velocity.length() < config.min_velocity
            || config.deceleration <= 0.0
        {
            return None;
        }
        Some(Self {
            scale: from.scale,
            x: Axis::new(from.translate_x, velocity.x, config.deceleration),
            y: Axis::new(from.translate_y, velocity.y, config.deceleration),
            decel: config.deceleration,
            elapsed: 0.0,
            frame,
        })
    }

    /// Where the coast ends (already clamped).
    #[must_use]
    pub fn resting(&self) -> ViewportTransform {
        self.frame.clamp(ViewportTransform {
            scale: self.scale,
            translate_x: self.x.rest(self.decel),
            translate_y: self.y.rest(self.decel),
        })
    }

    /// Advance by `dt` and return the clamped sample.
    pub fn advance(&mut self, dt: Duration) -> ViewportTransform {
        self.elapsed += dt.as_secs_f64();
        self.frame.clamp(ViewportTransform {
            scale: self.scale,
            translate_x: self.x.at(self.elapsed, self.decel),
            translate_y: self.y.at(self.elapsed, self.decel),
        })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.x.duration.max(self.y.duration)
    }
}
