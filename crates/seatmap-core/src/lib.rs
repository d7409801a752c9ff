#![forbid(unsafe_code)]

//! Core: geometry, viewport transform, hit-testing, and gestures.
//!
//! # Role in Seatmap
//! `seatmap-core` is the pure layer under the seating views. It owns the
//! coordinate spaces (content vs. screen), the shared transform cell that
//! the render path polls, entity hit-testing in paint order, and the gesture
//! arena that turns raw pointer samples into taps, long presses, and
//! pan/pinch transform updates.
//!
//! # Primary responsibilities
//! - **ViewportTransform**: scale + translate, inverse mapping, pan clamp.
//! - **TransformStore**: wait-free, single-writer transform cell.
//! - **Fit**: framing the content with padding, focusing on one entity.
//! - **Hit-testing**: rotated shapes on the floor, rows on the timeline.
//! - **GestureArena**: tap/long-press vs. pan/pinch composition.
//! - **CameraAnimation** and **Momentum**: timed transform motion.
//!
//! # How it fits in the system
//! `seatmap-runtime` wires these pieces into the floor and timeline
//! viewports, the drag-to-reassign controller, and the frame builder. Nothing
//! here spawns threads or performs I/O.

pub mod animation;
pub mod entity;
pub mod event;
pub mod fit;
pub mod geometry;
pub mod gesture;
pub mod hit_test;
pub mod intent;
pub mod transform;
pub mod transform_store;

pub use entity::{EntityId, PositionedEntity, Shape, StatusCategory};
pub use event::{PointerEvent, PointerId, PointerPhase};
pub use geometry::{Bounds, Canvas, Point, Size};
pub use intent::{HostIntent, Mode};
pub use transform::{ViewportTransform, ZoomAxes};
pub use transform_store::{TransformStore, WriterId};
