#![forbid(unsafe_code)]

//! Shared viewport transform between the interaction and render paths.
//!
//! The render path polls the transform every frame (~60 Hz) while the
//! interaction path rewrites it on every pointer event. [`TransformStore`]
//! keeps the whole [`ViewportTransform`] behind an [`arc_swap::ArcSwap`], so a
//! reader always sees the three fields from the same write (no tearing) and
//! never blocks on a writer.
//!
//! # Single writer
//!
//! Exactly one writer owns the transform at a time. A writer takes the lease
//! with [`TransformStore::claim`]; a later claim by someone else pre-empts it.
//! Writes from a writer that no longer holds the lease are rejected by
//! [`TransformStore::store_as`], which is how a momentum tick that races a
//! fresh pan, or a camera animation interrupted by a pinch, stays silent.
//!
//! ```
//! use seatmap_core::transform::ViewportTransform;
//! use seatmap_core::transform_store::{TransformStore, WriterId};
//!
//! let store = TransformStore::new(ViewportTransform::IDENTITY);
//! store.claim(WriterId::Camera);
//! store.claim(WriterId::Gesture);
//! assert!(!store.store_as(WriterId::Camera, ViewportTransform::new(2.0, 0.0, 0.0)));
//! assert!(store.store_as(WriterId::Gesture, ViewportTransform::new(2.0, 0.0, 0.0)));
//! assert_eq!(store.load().scale, 2.0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::transform::ViewportTransform;

/// Who is allowed to write the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WriterId {
    /// No one; every `store_as` is rejected until a claim.
    Vacant = 0,
    /// The active pan/pinch gesture.
    Gesture = 1,
    /// Post-release momentum.
    Momentum = 2,
    /// Reset-to-fit / zoom-to-entity animation.
    Camera = 3,
    /// Direct host writes (mount, resize).
    Host = 4,
}

impl WriterId {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Gesture,
            2 => Self::Momentum,
            3 => Self::Camera,
            4 => Self::Host,
            _ => Self::Vacant,
        }
    }
}

/// Wait-free transform cell with a single-writer lease.
pub struct TransformStore {
    value: ArcSwap<ViewportTransform>,
    writer: AtomicU8,
    generation: AtomicU64,
}

impl std::fmt::Debug for TransformStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformStore")
            .field("value", &*self.value.load())
            .field("writer", &self.holder())
            .field("generation", &self.generation())
            .finish()
    }
}

impl TransformStore {
    /// Create a store holding `initial`, with no writer.
    #[must_use]
    pub fn new(initial: ViewportTransform) -> Self {
        Self {
            value: ArcSwap::from_pointee(initial),
            writer: AtomicU8::new(WriterId::Vacant as u8),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a store behind an `Arc` for sharing with the render path.
    #[must_use]
    pub fn shared(initial: ViewportTransform) -> Arc<Self> {
        Arc::new(Self::new(initial))
    }

    /// Current transform (wait-free).
    #[inline]
    #[must_use]
    pub fn load(&self) -> ViewportTransform {
        **self.value.load()
    }

    /// Incremented on every accepted write. The render path can compare
    /// generations to skip repainting an unchanged frame.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The writer currently holding the lease.
    #[inline]
    #[must_use]
    pub fn holder(&self) -> WriterId {
        WriterId::from_u8(self.writer.load(Ordering::Acquire))
    }

    /// Hand the lease to `writer`, returning the previous holder.
    pub fn claim(&self, writer: WriterId) -> WriterId {
        let prev = WriterId::from_u8(self.writer.swap(writer as u8, Ordering::AcqRel));
        if prev != writer {
            tracing::trace!(
                target: "seatmap.transform",
                from = ?prev,
                to = ?writer,
                "transform writer changed"
            );
        }
        prev
    }

    /// Give up the lease if `writer` still holds it.
    pub fn release(&self, writer: WriterId) -> bool {
        self.writer
            .compare_exchange(
                writer as u8,
                WriterId::Vacant as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Write `value` if `writer` holds the lease. Returns whether the write
    /// was accepted.
    pub fn store_as(&self, writer: WriterId, value: ViewportTransform) -> bool {
        if writer == WriterId::Vacant || self.holder() != writer {
            return false;
        }
        self.value.store(Arc::new(value));
        self.generation.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Claim as [`WriterId::Host`], write, and release.
    pub fn replace(&self, value: ViewportTransform) {
        self.claim(WriterId::Host);
        self.store_as(WriterId::Host, value);
        self.release(WriterId::Host);
    }
}
