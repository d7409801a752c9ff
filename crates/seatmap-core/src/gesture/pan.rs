#![forbid(unsafe_code)]

//! Simultaneous pan + pinch.
//!
//! Pan and pinch are recognised together because a two-finger zoom always
//! drifts a little too. Both are computed against the snapshot taken when
//! the gesture started:
//!
//! ```text
//! scale'     = clamp(saved.scale * span / start_span)
//! translate' = saved.t - (focal - saved.t) * (scale'/saved.scale - 1)   // pinch
//!            + (centroid - start_centroid)                              // pan
//! ```
//!
//! then each axis is clamped (see [`clamp_axis`]). When a finger lands or
//! lifts mid-gesture the snapshot is rebased onto the current transform, so
//! the content never jumps.
//!
//! [`clamp_axis`]: crate::transform::clamp_axis

use web_time::{Duration, Instant};

use crate::geometry::Point;
use crate::transform::{ViewFrame, ViewportTransform};

/// Pinch distance below which the ratio is considered undefined.
const MIN_PINCH_SPAN: f64 = 1.0;

/// Snapshot and reference points of an active pan/pinch.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformGesture {
    saved: ViewportTransform,
    start_centroid: Point,
    start_span: Option<f64>,
}

impl TransformGesture {
    /// Begin from `saved` with the given contact points (1 or 2 used).
    #[must_use]
    pub fn begin(saved: ViewportTransform, contacts: &[Point]) -> Self {
        Self {
            saved,
            start_centroid: centroid(contacts),
            start_span: span(contacts),
        }
    }

    /// Transform captured at gesture start (or the last rebase).
    #[must_use]
    pub fn saved(&self) -> ViewportTransform {
        self.saved
    }

    /// Pinch focal point (screen space).
    #[must_use]
    pub fn focal(&self) -> Point {
        self.start_centroid
    }

    /// Whether this segment is pinching.
    #[must_use]
    pub fn is_pinch(&self) -> bool {
        self.start_span.is_some()
    }

    /// Restart from `current` with a new set of contacts.
    pub fn rebase(&mut self, current: ViewportTransform, contacts: &[Point]) {
        *self = Self::begin(current, contacts);
    }

    /// Transform for the given contact positions, clamped to `frame`.
    #[must_use]
    pub fn update(&self, contacts: &[Point], frame: &ViewFrame) -> ViewportTransform {
        let mut next = self.saved;

        if let (Some(start), Some(now)) = (self.start_span, span(contacts)) {
            let ratio = now / start;
            if ratio.is_finite() && ratio > 0.0 {
                let scale = frame.limits.clamp(self.saved.scale * ratio);
                next = self.saved.zoom_about(self.start_centroid, scale, frame.axes);
            }
        }

        let delta = centroid(contacts) - self.start_centroid;
        next.translate_x += delta.x;
        next.translate_y += delta.y;

        frame.clamp(next)
    }
}

/// Mean of up to the first two contacts.
#[must_use]
pub fn centroid(contacts: &[Point]) -> Point {
    match contacts {
        [] => Point::ORIGIN,
        [a] => *a,
        [a, b, ..] => a.midpoint(*b),
    }
}

/// Distance between the first two contacts, if there are two and they are
/// not on top of each other.
#[must_use]
pub fn span(contacts: &[Point]) -> Option<f64> {
    match contacts {
        [a, b, ..] => Some(a.distance(*b)).filter(|d| *d >= MIN_PINCH_SPAN),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

/// Samples older than this are ignored when estimating release velocity.
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Estimates centroid velocity (px/s) from recent samples.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: Vec<(Instant, Point)>,
}

impl VelocityTracker {
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn add(&mut self, at: Instant, pos: Point) {
        self.samples.retain(|(t, _)| {
            at.checked_duration_since(*t)
                .is_some_and(|age| age <= VELOCITY_WINDOW)
        });
        self.samples.push((at, pos));
    }

    /// Velocity over the window ending at `now`; zero with fewer than two
    /// samples in it. A finger that stopped moving before `now` has no
    /// samples left and reports zero.
    #[must_use]
    pub fn velocity(&self, now: Instant) -> Point {
        let mut recent = self.samples.iter().filter(|(t, _)| {
            now.checked_duration_since(*t)
                .is_some_and(|age| age <= VELOCITY_WINDOW)
        });
        let (Some(first), Some(last)) = (recent.next(), recent.last()) else {
            return Point::ORIGIN;
        };
        let dt = last.0.saturating_duration_since(first.0).as_secs_f64();
        if dt <= 0.0 {
            return Point::ORIGIN;
        }
        (last.1 - first.1) * (1.0 / dt)
    }
}
