#![forbid(unsafe_code)]

//! Runtime: viewports, drag-to-reassign, turn-time, and frame building.
//!
//! # Role in Seatmap
//! `seatmap-runtime` is what a host embeds. It wires the pure pieces from
//! `seatmap-core` into two views, the spatial floor plan and the reservation
//! timeline, and reports everything the host must act on as
//! [`HostIntent`](seatmap_core::HostIntent)s.
//!
//! # Primary responsibilities
//! - **FloorViewport / TimelineViewport**: pointer routing, fit, reset,
//!   zoom-to-entity, momentum and camera motion on a shared transform.
//! - **DragController**: optimistic row reassignment with exactly-once
//!   dispatch and rollback.
//! - **Turn-time**: elapsed-vs-expected badges under either policy.
//! - **Render**: an ordered, per-frame [`RenderPlan`](render::RenderPlan).
//! - **Config**: [`SeatmapConfig`](config::SeatmapConfig), optionally
//!   loaded from TOML or JSON (`config-file` feature).
//!
//! # How it fits in the system
//! The host feeds pointer events and ticks in, reads the transform from the
//! [`TransformStore`](seatmap_core::TransformStore) on its render path, and
//! drains intents after each call. Reassignment calls run on a background
//! thread and are applied on the next tick.

pub mod config;
pub mod drag;
#[cfg(feature = "log-subscriber")]
pub mod logging;
pub mod render;
pub mod turn_time;
pub mod viewport;

pub use config::{ConfigError, SeatmapConfig};
pub use drag::{DispatchMode, DragController, DragPhase, EndDrag, ReassignError, Reassigner, ReservationBar};
pub use render::{DrawOp, RenderPlan};
pub use turn_time::{TurnTimeBadge, TurnTimePolicy, TurnTimeStatus, TurnTimeThresholds};
pub use viewport::{FloorViewport, HitSurface, TimelineViewport, ViewportController};
