#![forbid(unsafe_code)]

//! Host-visible intents: the hand-off boundary out of the interaction path.
//!
//! Gesture handling never calls host code inline. Every side effect the host
//! cares about (selection, long-press menus, haptics, error toasts) is queued
//! as a [`HostIntent`] and delivered when the host drains the queue.
//!
//! # Invariants
//!
//! 1. At most one `EntitySelected`/`BackgroundTap`/`ViewReset` per tap.
//! 2. `DragCompleted` is emitted only after the reassignment call succeeded.
//! 3. `ReassignFailed` always follows a rollback of the optimistic state.

use crate::entity::EntityId;
use crate::geometry::Point;

/// Interaction context. Changes what a tap on an entity means; never
/// changes geometry or hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Mode {
    #[default]
    Normal,
    /// Seating a party that walked in without a reservation.
    WalkIn,
    /// Seating the party picked from the waitlist.
    SeatWaitlist,
    /// Adding/removing tables from a server's section.
    ServerAssignment,
}

impl Mode {
    /// What tapping an entity does in this mode.
    #[must_use]
    pub const fn tap_action(self) -> TapAction {
        match self {
            Self::Normal => TapAction::Select,
            Self::WalkIn => TapAction::SeatWalkIn,
            Self::SeatWaitlist => TapAction::SeatWaitlistParty,
            Self::ServerAssignment => TapAction::ToggleServerSection,
        }
    }
}

/// Meaning of an entity tap, resolved from the [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapAction {
    Select,
    SeatWalkIn,
    SeatWaitlistParty,
    ToggleServerSection,
}

/// Haptic pulse requested by a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticKind {
    /// Light tick on selection.
    Selection,
    /// Heavier pulse when a long press is recognised.
    LongPress,
    /// Drop onto a new target.
    Drop,
    /// A reassignment failed and was rolled back.
    Error,
}

/// Something the host should act on.
#[derive(Debug, Clone, PartialEq)]
pub enum HostIntent {
    /// An entity was tapped; `action` says what the tap means in the
    /// current mode.
    EntitySelected { id: EntityId, action: TapAction },
    /// An entity was held past the long-press threshold.
    EntityLongPressed { id: EntityId },
    /// A tap landed on empty floor; `content` is where, in content space.
    BackgroundTap { content: Point },
    /// The camera started returning to the fit transform.
    ViewReset,
    /// A drag-and-reassign was confirmed by the data layer.
    DragCompleted { entity: EntityId, target: EntityId },
    /// A reassignment failed; local state has been rolled back.
    ReassignFailed { entity: EntityId, message: String },
    /// Feedback pulse.
    Haptic(HapticKind),
}

/// FIFO queue of intents awaiting the host.
#[derive(Debug, Default)]
pub struct IntentQueue {
    pending: Vec<HostIntent>,
}

impl IntentQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: HostIntent) {
        tracing::trace!(target: "seatmap.intent", ?intent, "queued host intent");
        self.pending.push(intent);
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<HostIntent> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Peek without draining.
    #[must_use]
    pub fn as_slice(&self) -> &[HostIntent] {
        &self.pending
    }
}
