#![forbid(unsafe_code)]

//! Camera motion: springs that carry the viewport transform to a target.
//!
//! Used for the animated return to the fit transform after a double-tap and
//! for host-driven `zoom_to_entity` moves. Each component of the transform
//! rides its own critically damped [`Spring`], so the motion eases in without
//! bouncing past the framing.

pub mod spring;

pub use spring::Spring;

use web_time::Duration;

use crate::transform::ViewportTransform;

/// Default stiffness for camera moves. Roughly 0.5 s to settle.
pub const DEFAULT_CAMERA_STIFFNESS: f64 = 170.0;

/// An in-flight camera move.
#[derive(Debug, Clone)]
pub struct CameraAnimation {
    scale: Spring,
    translate_x: Spring,
    translate_y: Spring,
    target: ViewportTransform,
}

impl CameraAnimation {
    /// Start a move from `from` to `to`.
    #[must_use]
    pub fn new(from: ViewportTransform, to: ViewportTransform, stiffness: f64) -> Self {
        Self {
            scale: Spring::critical(from.scale, to.scale, stiffness),
            translate_x: Spring::critical(from.translate_x, to.translate_x, stiffness),
            translate_y: Spring::critical(from.translate_y, to.translate_y, stiffness),
            target: to,
        }
    }

    /// Where the camera is heading.
    #[must_use]
    pub fn target(&self) -> ViewportTransform {
        self.target
    }

    /// Current sample without advancing.
    #[must_use]
    pub fn current(&self) -> ViewportTransform {
        ViewportTransform {
            scale: self.scale.position(),
            translate_x: self.translate_x.position(),
            translate_y: self.translate_y.position(),
        }
    }

    /// Advance all components by `dt` and return the new sample.
    pub fn advance(&mut self, dt: Duration) -> ViewportTransform {
        self.scale.advance(dt);
        self.translate_x.advance(dt);
        self.translate_y.advance(dt);
        if self.is_settled() {
            self.target
        } else {
            self.current()
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.scale.is_settled() && self.translate_x.is_settled() && self.translate_y.is_settled()
    }
}
