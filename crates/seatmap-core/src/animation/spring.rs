#![forbid(unsafe_code)]

//! Damped spring used to glide the camera.
//!
//! Models `a = -k (x - target) - c v` and integrates with semi-implicit
//! Euler. Large frame deltas are split into steps of at most 4 ms so a
//! stalled frame does not make the camera overshoot wildly.
//!
//! # Invariants
//!
//! 1. Stiffness is at least [`MIN_STIFFNESS`]; damping is non-negative.
//! 2. Once settled, `position() == target()` exactly and the spring stays
//!    put.

use web_time::Duration;

const MAX_STEP_SECS: f64 = 0.004;
const MIN_STIFFNESS: f64 = 0.1;

/// One-dimensional damped spring.
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    /// Settling threshold, relative to the start-to-target distance.
    tolerance: f64,
    settled: bool,
}

impl Spring {
    /// Critically damped spring from `from` to `to` with stiffness `k`.
    #[must_use]
    pub fn critical(from: f64, to: f64, stiffness: f64) -> Self {
        let k = stiffness.max(MIN_STIFFNESS);
        Self::new(from, to, k, 2.0 * k.sqrt())
    }

    /// Spring with explicit stiffness and damping.
    #[must_use]
    pub fn new(from: f64, to: f64, stiffness: f64, damping: f64) -> Self {
        let span = (to - from).abs();
        Self {
            position: from,
            velocity: 0.0,
            target: to,
            stiffness: stiffness.max(MIN_STIFFNESS),
            damping: damping.max(0.0),
            tolerance: (span * 1e-4).max(1e-6),
            settled: span == 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    fn step(&mut self, dt: f64) {
        let accel = -self.stiffness * (self.position - self.target) - self.damping * self.velocity;
        self.velocity += accel * dt;
        self.position += self.velocity * dt;
    }

    /// Advance by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        if self.settled {
            return;
        }
        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_SECS);
            self.step(h);
            remaining -= h;
        }
        if (self.position - self.target).abs() < self.tolerance
            && self.velocity.abs() < self.tolerance * 10.0
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.settled = true;
        }
    }
}
