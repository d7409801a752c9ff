#![forbid(unsafe_code)]

//! Drag-and-reassign on the timeline, with optimistic update and rollback.
//!
//! A reservation bar is dragged from its row onto another row (table). On
//! release the new assignment is shown immediately and the host's
//! reassignment transport is called in the background; a failure restores
//! the exact pre-drag state and shows a short-lived error notice.
//!
//! # State machine
//!
//! ```text
//! Idle/RolledBack --start_drag--> Dragging --end_drag (changed)--> Committing
//!                                    |                                 |
//!                                    |--end_drag (unchanged)--> Idle   |--ok----> Idle
//!                                    `--cancel_drag-----------> Idle   `--error-> RolledBack
//! ```
//!
//! # Invariants
//!
//! 1. At most one drag exists. `start_drag` while `Dragging` or
//!    `Committing` is a no-op.
//! 2. `end_drag` calls the [`Reassigner`] exactly once when the target
//!    differs from the bar's current assignment, and never otherwise.
//! 3. Rollback restores the overlay entry captured before the optimistic
//!    write; nothing is recomputed.
//! 4. `cancel_drag` has no side effects: no call, no overlay change, no
//!    intent.
//!
//! # Threading
//!
//! With [`DispatchMode::Background`] every commit runs the blocking
//! transport on its own thread; the outcome comes back over an mpsc channel
//! and is applied by [`DragController::poll`] on the interaction path.
//! [`DispatchMode::Inline`] runs the call synchronously instead, which keeps
//! tests deterministic. Outcomes are applied by `poll` in both modes.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use ahash::AHashMap;
use seatmap_core::entity::EntityId;
use seatmap_core::geometry::Point;
use seatmap_core::hit_test::RowLayout;
use seatmap_core::intent::{HapticKind, HostIntent, IntentQueue};
use web_time::{Duration, Instant};

/// How long an error notice stays up by default.
pub const DEFAULT_ERROR_NOTICE: Duration = Duration::from_millis(4_000);

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// A reservation bar on the timeline, bound to one row (table).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservationBar {
    pub id: EntityId,
    /// The table row the host currently records for this reservation.
    pub row: EntityId,
    /// Horizontal extent in content units.
    pub start_x: f64,
    pub end_x: f64,
}

/// Failure reported by the reassignment transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassignError {
    #[error("reassignment rejected: {0}")]
    Rejected(String),
    #[error("reassignment transport failed: {0}")]
    Transport(String),
}

/// The host's `reassign_owner(entity, target)` operation. Implementations may
/// block; they are never called on the interaction path in background mode.
pub trait Reassigner: Send + Sync + 'static {
    fn reassign_owner(&self, entity: EntityId, target: EntityId) -> Result<(), ReassignError>;
}

impl<F> Reassigner for F
where
    F: Fn(EntityId, EntityId) -> Result<(), ReassignError> + Send + Sync + 'static,
{
    fn reassign_owner(&self, entity: EntityId, target: EntityId) -> Result<(), ReassignError> {
        self(entity, target)
    }
}

/// Where the reassignment call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// A thread per commit.
    #[default]
    Background,
    /// Synchronously inside `end_drag`.
    Inline,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragPhase {
    Idle,
    Dragging,
    Committing,
    RolledBack,
}

/// Optimistic assignments not yet reflected in host data.
#[derive(Debug, Clone, Default)]
pub struct AssignmentOverlay {
    rows: AHashMap<EntityId, EntityId>,
}

impl AssignmentOverlay {
    /// Overlay row for `bar`, if any.
    #[must_use]
    pub fn get(&self, bar: EntityId) -> Option<EntityId> {
        self.rows.get(&bar).copied()
    }

    /// Row to display for `bar`: the overlay if present, else host data.
    #[must_use]
    pub fn effective_row(&self, bar: &ReservationBar) -> EntityId {
        self.get(bar.id).unwrap_or(bar.row)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn set(&mut self, bar: EntityId, row: Option<EntityId>) {
        match row {
            Some(row) => {
                self.rows.insert(bar, row);
            }
            None => {
                self.rows.remove(&bar);
            }
        }
    }
}

/// Transient error shown after a rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotice {
    pub entity: EntityId,
    pub message: String,
    pub expires_at: Instant,
}

/// The active drag.
#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    bar: EntityId,
    /// Row the bar showed when the drag started.
    original: EntityId,
    /// `grab_absolute - grab_relative` at start.
    offset: Point,
    /// Scroll translate at start.
    scroll_start: Point,
    candidate: Option<EntityId>,
}

/// A commit awaiting its outcome.
#[derive(Debug, Clone, PartialEq)]
struct PendingCommit {
    request: u64,
    bar: EntityId,
    target: EntityId,
    /// Overlay entry before the optimistic write.
    snapshot: Option<EntityId>,
}

#[derive(Debug)]
struct Outcome {
    request: u64,
    result: Result<(), ReassignError>,
}

/// What `end_drag` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDrag {
    /// No drag was active.
    Ignored,
    /// Released over the current row or outside every row; nothing called.
    Unchanged,
    /// Optimistically moved; the reassignment call is in flight.
    Committing { bar: EntityId, target: EntityId },
}

/// Drag-and-reassign controller.
pub struct DragController {
    reassigner: Arc<dyn Reassigner>,
    dispatch: DispatchMode,
    phase: DragPhase,
    session: Option<DragSession>,
    pending: Option<PendingCommit>,
    overlay: AssignmentOverlay,
    notice: Option<ErrorNotice>,
    notice_ttl: Duration,
    next_request: u64,
    sender: mpsc::Sender<Outcome>,
    receiver: mpsc::Receiver<Outcome>,
    intents: IntentQueue,
}

impl std::fmt::Debug for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("phase", &self.phase)
            .field("dispatch", &self.dispatch)
            .field("overlay", &self.overlay.len())
            .finish()
    }
}

impl DragController {
    #[must_use]
    pub fn new(reassigner: Arc<dyn Reassigner>, dispatch: DispatchMode) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            reassigner,
            dispatch,
            phase: DragPhase::Idle,
            session: None,
            pending: None,
            overlay: AssignmentOverlay::default(),
            notice: None,
            notice_ttl: DEFAULT_ERROR_NOTICE,
            next_request: 0,
            sender,
            receiver,
            intents: IntentQueue::new(),
        }
    }

    /// Override how long error notices stay up.
    #[must_use]
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    #[must_use]
    pub fn overlay(&self) -> &AssignmentOverlay {
        &self.overlay
    }

    /// Current drop candidate while dragging.
    #[must_use]
    pub fn candidate(&self) -> Option<EntityId> {
        self.session.as_ref().and_then(|s| s.candidate)
    }

    /// Bar being dragged.
    #[must_use]
    pub fn dragged(&self) -> Option<EntityId> {
        self.session.as_ref().map(|s| s.bar)
    }

    /// Visible error notice, if not yet expired at `now`.
    #[must_use]
    pub fn notice(&self, now: Instant) -> Option<&ErrorNotice> {
        self.notice.as_ref().filter(|n| now < n.expires_at)
    }

    /// Whether a drag or commit is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging | DragPhase::Committing)
    }

    /// Begin dragging `bar`. Returns `false` (and does nothing) while
    /// another drag or commit is active.
    pub fn start_drag(
        &mut self,
        bar: &ReservationBar,
        grab_absolute: Point,
        grab_relative: Point,
        scroll: Point,
    ) -> bool {
        if self.is_active() {
            tracing::debug!(
                target: "seatmap.drag",
                bar = %bar.id,
                phase = ?self.phase,
                "drag rejected: another drag is active"
            );
            return false;
        }
        let original = self.overlay.effective_row(bar);
        self.session = Some(DragSession {
            bar: bar.id,
            original,
            offset: grab_absolute - grab_relative,
            scroll_start: scroll,
            candidate: Some(original),
        });
        self.phase = DragPhase::Dragging;
        tracing::debug!(target: "seatmap.drag", bar = %bar.id, row = %original, "drag started");
        true
    }

    /// Move the drag to `absolute` with the view scrolled to `scroll`.
    /// Returns the new candidate row.
    pub fn update_drag(
        &mut self,
        absolute: Point,
        scroll: Point,
        layout: &RowLayout,
    ) -> Option<EntityId> {
        let session = self.session.as_mut()?;
        let relative = absolute - session.offset - (scroll - session.scroll_start);
        session.candidate = layout.hit_content(relative);
        session.candidate
    }

    /// Release the drag.
    pub fn end_drag(&mut self) -> EndDrag {
        if self.phase != DragPhase::Dragging {
            return EndDrag::Ignored;
        }
        let Some(session) = self.session.take() else {
            self.phase = DragPhase::Idle;
            return EndDrag::Ignored;
        };
        let Some(target) = session.candidate.filter(|t| *t != session.original) else {
            self.phase = DragPhase::Idle;
            tracing::debug!(target: "seatmap.drag", bar = %session.bar, "drag ended without change");
            return EndDrag::Unchanged;
        };

        let snapshot = self.overlay.get(session.bar);
        self.overlay.set(session.bar, Some(target));
        let request = self.next_request;
        self.next_request += 1;
        self.pending = Some(PendingCommit {
            request,
            bar: session.bar,
            target,
            snapshot,
        });
        self.phase = DragPhase::Committing;
        self.intents.push(HostIntent::Haptic(HapticKind::Drop));
        tracing::debug!(
            target: "seatmap.drag",
            bar = %session.bar,
            from = %session.original,
            to = %target,
            "optimistic reassignment"
        );

        self.dispatch(request, session.bar, target);
        EndDrag::Committing {
            bar: session.bar,
            target,
        }
    }

    /// Abort the drag without side effects. Commits already in flight are
    /// not affected; returns whether a drag was discarded.
    pub fn cancel_drag(&mut self) -> bool {
        if self.phase != DragPhase::Dragging {
            return false;
        }
        self.session = None;
        self.phase = DragPhase::Idle;
        tracing::debug!(target: "seatmap.drag", "drag cancelled");
        true
    }

    /// Apply finished reassignment calls and expire the error notice.
    /// Returns whether anything changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.receiver.try_recv() {
            changed |= self.apply_outcome(outcome, now);
        }
        if self.notice.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notice = None;
            changed = true;
        }
        if self.phase == DragPhase::RolledBack && self.notice.is_none() {
            self.phase = DragPhase::Idle;
            changed = true;
        }
        changed
    }

    /// Drop overlay entries the host data now agrees with, and entries for
    /// bars the host no longer reports. The bar of an in-flight commit keeps
    /// its entry until the outcome arrives.
    pub fn reconcile(&mut self, bars: &[ReservationBar]) {
        let before = self.overlay.len();
        let host: AHashMap<EntityId, EntityId> = bars.iter().map(|b| (b.id, b.row)).collect();
        let in_flight = self.pending.as_ref().map(|p| p.bar);
        self.overlay.rows.retain(|bar, row| match host.get(bar) {
            Some(host_row) => host_row != row,
            None => in_flight == Some(*bar),
        });
        let dropped = before - self.overlay.len();
        if dropped > 0 {
            tracing::trace!(target: "seatmap.drag", dropped, "overlay reconciled");
        }
    }

    pub fn drain_intents(&mut self) -> Vec<HostIntent> {
        self.intents.drain()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn dispatch(&self, request: u64, bar: EntityId, target: EntityId) {
        match self.dispatch {
            DispatchMode::Inline => {
                let result = call_reassigner(self.reassigner.as_ref(), bar, target);
                let _ = self.sender.send(Outcome { request, result });
            }
            DispatchMode::Background => {
                let reassigner = Arc::clone(&self.reassigner);
                let sender = self.sender.clone();
                thread::spawn(move || {
                    let result = call_reassigner(reassigner.as_ref(), bar, target);
                    // The controller may be gone; nothing left to update.
                    let _ = sender.send(Outcome { request, result });
                });
            }
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome, now: Instant) -> bool {
        let Some(pending) = self
            .pending
            .take_if(|p| p.request == outcome.request)
        else {
            tracing::warn!(target: "seatmap.drag", request = outcome.request, "stale reassignment outcome");
            return false;
        };

        match outcome.result {
            Ok(()) => {
                self.phase = DragPhase::Idle;
                tracing::debug!(
                    target: "seatmap.drag",
                    bar = %pending.bar,
                    to = %pending.target,
                    "reassignment confirmed"
                );
                self.intents.push(HostIntent::DragCompleted {
                    entity: pending.bar,
                    target: pending.target,
                });
            }
            Err(err) => {
                self.overlay.set(pending.bar, pending.snapshot);
                self.phase = DragPhase::RolledBack;
                let message = err.to_string();
                tracing::warn!(
                    target: "seatmap.drag",
                    bar = %pending.bar,
                    error = %message,
                    "reassignment failed; rolled back"
                );
                self.notice = Some(ErrorNotice {
                    entity: pending.bar,
                    message: message.clone(),
                    expires_at: now + self.notice_ttl,
                });
                self.intents.push(HostIntent::ReassignFailed {
                    entity: pending.bar,
                    message,
                });
                self.intents.push(HostIntent::Haptic(HapticKind::Error));
            }
        }
        true
    }
}

/// Run the transport, turning a panic into a transport failure so every
/// commit produces exactly one outcome.
fn call_reassigner(
    reassigner: &dyn Reassigner,
    bar: EntityId,
    target: EntityId,
) -> Result<(), ReassignError> {
    panic::catch_unwind(AssertUnwindSafe(|| reassigner.reassign_owner(bar, target)))
        .unwrap_or_else(|payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            tracing::error!(
                target: "seatmap.drag",
                bar = %bar,
                to = %target,
                panic = %detail,
                "reassigner panicked"
            );
            Err(ReassignError::Transport(format!("reassigner panicked: {detail}")))
        })
}
