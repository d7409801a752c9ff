#![forbid(unsafe_code)]

//! Manual double-tap detection.
//!
//! A classic tap recognizer that waits to see whether a second tap follows
//! delays every single tap by the double-tap window. Seating staff tap
//! tables constantly, so instead every tap is acted on immediately and also
//! recorded; when the next tap lands within 300 ms and 50 px of the previous
//! one, it is reported as a double tap (which resets the view).

use web_time::{Duration, Instant};

use crate::geometry::Point;

/// Default double-tap time window.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
/// Default double-tap distance threshold, in screen pixels.
pub const DOUBLE_TAP_DISTANCE: f64 = 50.0;

/// When and where a tap landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapRecord {
    pub at: Instant,
    pub pos: Point,
}

impl TapRecord {
    #[must_use]
    pub const fn new(at: Instant, pos: Point) -> Self {
        Self { at, pos }
    }
}

/// `Δt < window ∧ distance < max_distance`, with a non-negative Δt.
#[must_use]
pub fn is_double_tap_within(
    prev: &TapRecord,
    next: &TapRecord,
    window: Duration,
    max_distance: f64,
) -> bool {
    let Some(dt) = next.at.checked_duration_since(prev.at) else {
        return false;
    };
    dt < window && prev.pos.distance(next.pos) < max_distance
}

/// Double-tap test with the default 300 ms / 50 px thresholds.
#[must_use]
pub fn is_double_tap(prev: &TapRecord, next: &TapRecord) -> bool {
    is_double_tap_within(prev, next, DOUBLE_TAP_WINDOW, DOUBLE_TAP_DISTANCE)
}

/// Classification of a completed tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapKind {
    Single,
    Double,
}

/// Remembers the previous tap across gesture sessions.
#[derive(Debug, Clone)]
pub struct TapTracker {
    window: Duration,
    max_distance: f64,
    last: Option<TapRecord>,
}

impl Default for TapTracker {
    fn default() -> Self {
        Self::new(DOUBLE_TAP_WINDOW, DOUBLE_TAP_DISTANCE)
    }
}

impl TapTracker {
    #[must_use]
    pub fn new(window: Duration, max_distance: f64) -> Self {
        Self {
            window,
            max_distance,
            last: None,
        }
    }

    /// Record a tap and classify it against the previous one.
    ///
    /// A double tap consumes the pair: a third quick tap starts a new pair
    /// instead of resetting the view again.
    pub fn record(&mut self, tap: TapRecord) -> TapKind {
        match self.last.take() {
            Some(prev) if is_double_tap_within(&prev, &tap, self.window, self.max_distance) => {
                TapKind::Double
            }
            _ => {
                self.last = Some(tap);
                TapKind::Single
            }
        }
    }

    /// Forget the previous tap.
    pub fn clear(&mut self) {
        self.last = None;
    }

    #[must_use]
    pub fn last(&self) -> Option<&TapRecord> {
        self.last.as_ref()
    }
}
