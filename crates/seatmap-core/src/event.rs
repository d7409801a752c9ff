#![forbid(unsafe_code)]

//! Canonical pointer events fed to the gesture arena.
//!
//! Hosts translate their platform touch/mouse callbacks into
//! [`PointerEvent`]s in screen space. Timestamps travel alongside the event
//! (as `now` arguments), the same way the recognizers take their clock.

use crate::geometry::Point;

/// Identifies one finger (or the mouse) for the life of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// Phase of a pointer contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// Contact started.
    Down,
    /// Contact moved while down.
    Move,
    /// Contact lifted normally.
    Up,
    /// The platform took the contact away (system gesture, focus loss).
    Cancel,
}

/// A single pointer sample in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub pos: Point,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(pointer: PointerId, phase: PointerPhase, pos: Point) -> Self {
        Self { pointer, phase, pos }
    }

    #[must_use]
    pub const fn down(pointer: u32, x: f64, y: f64) -> Self {
        Self::new(PointerId(pointer), PointerPhase::Down, Point::new(x, y))
    }

    #[must_use]
    pub const fn moved(pointer: u32, x: f64, y: f64) -> Self {
        Self::new(PointerId(pointer), PointerPhase::Move, Point::new(x, y))
    }

    #[must_use]
    pub const fn up(pointer: u32, x: f64, y: f64) -> Self {
        Self::new(PointerId(pointer), PointerPhase::Up, Point::new(x, y))
    }

    #[must_use]
    pub const fn cancel(pointer: u32, x: f64, y: f64) -> Self {
        Self::new(PointerId(pointer), PointerPhase::Cancel, Point::new(x, y))
    }
}
