#![forbid(unsafe_code)]

//! Gesture arena: composition of the four recognizers.
//!
//! Two families compete for each touch session:
//!
//! - **Press**: tap and long-press, recognised simultaneously (neither
//!   delays the other).
//! - **Transform**: pan and pinch, recognised simultaneously.
//!
//! The families race. Whichever satisfies its criteria first wins the
//! session and the other is cancelled:
//!
//! | Event | Winner |
//! |-------|--------|
//! | movement beyond the touch slop | Transform (pan) |
//! | a second finger lands | Transform (pinch) |
//! | release within slop, before the long-press threshold | Press (tap) |
//! | held within slop past the threshold (on `tick`) | Press (long-press) |
//!
//! # State machine
//!
//! ```text
//! Idle --down--> Possible --(pan|pinch)--> Won(Transform) --all up--> Idle
//!                    |------(long press)--> Won(Press) ------all up--> Idle
//!                    `------(tap)--------------------------------------> Idle
//! any --cancel()--> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one session exists; a session starts only from `Idle`.
//! 2. Events for pointers the session does not track are ignored.
//! 3. Tap and transform output never both come from one session.
//! 4. Only the Transform family writes the [`TransformStore`], and only while
//!    it holds the [`WriterId::Gesture`] lease claimed at session start.
//! 5. After [`GestureArena::cancel`] the arena is `Idle` and nothing written
//!    by the cancelled session is rolled back or re-emitted.

use web_time::{Duration, Instant};

use crate::event::{PointerEvent, PointerId, PointerPhase};
use crate::geometry::Point;
use crate::transform::{ViewFrame, ViewportTransform};
use crate::transform_store::{TransformStore, WriterId};

use super::GestureConfig;
use super::pan::{TransformGesture, VelocityTracker};
use super::tap::{TapKind, TapRecord, TapTracker};

/// Pan and pinch use at most this many contacts.
const MAX_CONTACTS: usize = 2;

/// The two competing gesture families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Tap + long-press.
    Press,
    /// Pan + pinch.
    Transform,
}

/// What the arena produced for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutput {
    /// A new session started (first finger down).
    SessionStarted,
    /// A completed single tap at a screen point.
    Tap { pos: Point },
    /// A tap that completed a double tap.
    DoubleTap { pos: Point },
    /// Held past the threshold without moving.
    LongPress { pos: Point, held: Duration },
    /// Pan/pinch won the session.
    TransformBegan,
    /// The store now holds `transform`.
    TransformChanged(ViewportTransform),
    /// All fingers lifted after a pan/pinch.
    TransformEnded { velocity: Point },
    /// A family lost the race or the session was cancelled.
    Cancelled { family: Family },
}

/// Ephemeral per-touch state.
#[derive(Debug, Clone)]
struct Session {
    contacts: Vec<(PointerId, Point)>,
    started_at: Instant,
    origin: Point,
    moved_beyond_slop: bool,
    transform: Option<TransformGesture>,
}

impl Session {
    fn positions(&self) -> Vec<Point> {
        self.contacts.iter().map(|(_, p)| *p).collect()
    }

    fn index_of(&self, id: PointerId) -> Option<usize> {
        self.contacts.iter().position(|(p, _)| *p == id)
    }
}

#[derive(Debug, Clone)]
enum ArenaState {
    Idle,
    Possible(Session),
    Won(Family, Session),
}

/// Gesture recognizer and composer for one view.
pub struct GestureArena {
    config: GestureConfig,
    state: ArenaState,
    taps: TapTracker,
    velocity: VelocityTracker,
}

impl std::fmt::Debug for GestureArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureArena")
            .field("active", &self.is_active())
            .field("winner", &self.winner())
            .finish()
    }
}

impl GestureArena {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        let taps = TapTracker::new(config.double_tap_window, config.double_tap_distance);
        Self {
            config,
            state: ArenaState::Idle,
            taps,
            velocity: VelocityTracker::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether a session is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, ArenaState::Idle)
    }

    /// The family that won the current session, if decided.
    #[must_use]
    pub fn winner(&self) -> Option<Family> {
        match self.state {
            ArenaState::Won(family, _) => Some(family),
            _ => None,
        }
    }

    /// Number of contacts the current session tracks.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        match &self.state {
            ArenaState::Idle => 0,
            ArenaState::Possible(s) | ArenaState::Won(_, s) => s.contacts.len(),
        }
    }

    /// Feed one pointer sample.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        store: &TransformStore,
        frame: &ViewFrame,
    ) -> Vec<GestureOutput> {
        let mut out = Vec::with_capacity(2);
        match event.phase {
            PointerPhase::Down => self.on_down(event, now, store, &mut out),
            PointerPhase::Move => self.on_move(event, now, store, frame, &mut out),
            PointerPhase::Up | PointerPhase::Cancel => {
                self.on_release(event, now, store, &mut out);
            }
        }
        out
    }

    /// Poll time-based recognizers (long-press). Call on every tick.
    pub fn tick(&mut self, now: Instant) -> Option<GestureOutput> {
        let ArenaState::Possible(session) = &self.state else {
            return None;
        };
        if session.contacts.len() != 1 || session.moved_beyond_slop {
            return None;
        }
        let held = now.saturating_duration_since(session.started_at);
        if held < self.config.long_press_threshold {
            return None;
        }
        let pos = session.contacts[0].1;
        self.decide(Family::Press);
        tracing::debug!(target: "seatmap.gesture", x = pos.x, y = pos.y, "long press recognised");
        Some(GestureOutput::LongPress { pos, held })
    }

    /// Discard the session without emitting any tap/long-press/transform.
    pub fn cancel(&mut self, store: &TransformStore) -> Option<GestureOutput> {
        let state = std::mem::replace(&mut self.state, ArenaState::Idle);
        self.velocity.reset();
        store.release(WriterId::Gesture);
        match state {
            ArenaState::Idle => None,
            ArenaState::Possible(_) => Some(GestureOutput::Cancelled {
                family: Family::Press,
            }),
            ArenaState::Won(family, _) => Some(GestureOutput::Cancelled { family }),
        }
    }

    /// Forget the previous tap, e.g. after the view was reset by the host.
    pub fn forget_taps(&mut self) {
        self.taps.clear();
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_down(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        store: &TransformStore,
        out: &mut Vec<GestureOutput>,
    ) {
        match &mut self.state {
            ArenaState::Idle => {
                store.claim(WriterId::Gesture);
                self.velocity.reset();
                self.velocity.add(now, event.pos);
                self.state = ArenaState::Possible(Session {
                    contacts: vec![(event.pointer, event.pos)],
                    started_at: now,
                    origin: event.pos,
                    moved_beyond_slop: false,
                    transform: None,
                });
                out.push(GestureOutput::SessionStarted);
            }
            ArenaState::Possible(session) => {
                if session.index_of(event.pointer).is_some() {
                    return;
                }
                session.contacts.push((event.pointer, event.pos));
                // Second finger: pinch satisfied.
                self.begin_transform(store, out);
            }
            ArenaState::Won(family, session) => {
                if session.index_of(event.pointer).is_some()
                    || session.contacts.len() >= MAX_CONTACTS
                {
                    return;
                }
                session.contacts.push((event.pointer, event.pos));
                if *family == Family::Transform {
                    let positions = session.positions();
                    if let Some(g) = session.transform.as_mut() {
                        g.rebase(store.load(), &positions);
                    }
                    self.velocity.reset();
                }
            }
        }
    }

    fn on_move(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        store: &TransformStore,
        frame: &ViewFrame,
        out: &mut Vec<GestureOutput>,
    ) {
        let slop = self.config.touch_slop;
        let pan_now = match &mut self.state {
            ArenaState::Idle => return,
            ArenaState::Possible(session) => {
                let Some(i) = session.index_of(event.pointer) else {
                    return;
                };
                session.contacts[i].1 = event.pos;
                if event.pos.distance(session.origin) > slop {
                    session.moved_beyond_slop = true;
                    true
                } else {
                    false
                }
            }
            ArenaState::Won(family, session) => {
                let Some(i) = session.index_of(event.pointer) else {
                    return;
                };
                session.contacts[i].1 = event.pos;
                if *family == Family::Press {
                    return;
                }
                let positions = session.positions();
                self.velocity.add(now, super::pan::centroid(&positions));
                if let Some(g) = &session.transform {
                    let next = g.update(&positions, frame);
                    if store.store_as(WriterId::Gesture, next) {
                        out.push(GestureOutput::TransformChanged(next));
                    }
                }
                return;
            }
        };

        if pan_now {
            self.begin_transform(store, out);
            // Apply the movement that satisfied the pan straight away.
            if let ArenaState::Won(_, session) = &self.state {
                let positions = session.positions();
                self.velocity.add(now, super::pan::centroid(&positions));
                if let Some(g) = &session.transform {
                    let next = g.update(&positions, frame);
                    if store.store_as(WriterId::Gesture, next) {
                        out.push(GestureOutput::TransformChanged(next));
                    }
                }
            }
        }
    }

    fn on_release(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        store: &TransformStore,
        out: &mut Vec<GestureOutput>,
    ) {
        let cancelled = event.phase == PointerPhase::Cancel;
        let state = std::mem::replace(&mut self.state, ArenaState::Idle);
        match state {
            ArenaState::Idle => {}
            ArenaState::Possible(mut session) => {
                let Some(i) = session.index_of(event.pointer) else {
                    self.state = ArenaState::Possible(session);
                    return;
                };
                session.contacts.remove(i);
                if !session.contacts.is_empty() {
                    self.state = ArenaState::Possible(session);
                    return;
                }
                store.release(WriterId::Gesture);
                let held = now.saturating_duration_since(session.started_at);
                let within_slop = event.pos.distance(session.origin) <= self.config.touch_slop;
                if cancelled || !within_slop || held >= self.config.long_press_threshold {
                    out.push(GestureOutput::Cancelled {
                        family: Family::Press,
                    });
                    return;
                }
                // Tap satisfied: the press family wins and the transform
                // family never started.
                let pos = session.origin;
                match self.taps.record(TapRecord::new(now, pos)) {
                    TapKind::Single => out.push(GestureOutput::Tap { pos }),
                    TapKind::Double => {
                        tracing::debug!(target: "seatmap.gesture", x = pos.x, y = pos.y, "double tap");
                        out.push(GestureOutput::DoubleTap { pos });
                    }
                }
            }
            ArenaState::Won(family, mut session) => {
                let Some(i) = session.index_of(event.pointer) else {
                    self.state = ArenaState::Won(family, session);
                    return;
                };
                session.contacts.remove(i);
                if !session.contacts.is_empty() {
                    if family == Family::Transform {
                        let positions = session.positions();
                        if let Some(g) = session.transform.as_mut() {
                            g.rebase(store.load(), &positions);
                        }
                        self.velocity.reset();
                    }
                    self.state = ArenaState::Won(family, session);
                    return;
                }
                store.release(WriterId::Gesture);
                if family == Family::Transform {
                    let velocity = if cancelled {
                        Point::ORIGIN
                    } else {
                        self.velocity.velocity(now)
                    };
                    self.velocity.reset();
                    out.push(GestureOutput::TransformEnded { velocity });
                }
            }
        }
    }

    /// Move `Possible` to `Won(Transform)` and snapshot the store.
    fn begin_transform(&mut self, store: &TransformStore, out: &mut Vec<GestureOutput>) {
        let ArenaState::Possible(mut session) = std::mem::replace(&mut self.state, ArenaState::Idle)
        else {
            return;
        };
        session.contacts.truncate(MAX_CONTACTS);
        // Pan/pinch measure from where the touch started so the content
        // tracks the finger exactly.
        let anchor: Vec<Point> = if session.contacts.len() == 1 {
            vec![session.origin]
        } else {
            session.positions()
        };
        session.transform = Some(TransformGesture::begin(store.load(), &anchor));
        self.velocity.reset();
        out.push(GestureOutput::Cancelled {
            family: Family::Press,
        });
        out.push(GestureOutput::TransformBegan);
        tracing::debug!(
            target: "seatmap.gesture",
            contacts = session.contacts.len(),
            "transform family won"
        );
        self.state = ArenaState::Won(Family::Transform, session);
    }

    /// Move `Possible` to `Won(family)` without touching the store.
    fn decide(&mut self, family: Family) {
        if let ArenaState::Possible(session) = std::mem::replace(&mut self.state, ArenaState::Idle)
        {
            self.state = ArenaState::Won(family, session);
        }
    }
}
