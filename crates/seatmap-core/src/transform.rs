#![forbid(unsafe_code)]

//! The viewport transform: scale + translate from content to screen space.
//!
//! ```text
//! screen = content * scale + translate
//! content = (screen - translate) / scale
//! ```
//!
//! In the timeline ([`ZoomAxes::Horizontal`]) only the x axis is scaled;
//! row heights are fixed, so y maps 1:1 and only the translate applies.
//!
//! # Invariants
//!
//! 1. `MIN_SCALE <= scale <= MAX_SCALE` for every value built through
//!    [`ViewportTransform::new`] or [`ViewportTransform::with_scale`].
//! 2. [`to_content`](ViewportTransform::to_content) is the exact inverse of
//!    [`to_screen`](ViewportTransform::to_screen) up to float rounding.

use crate::geometry::{Bounds, Point, Size};

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.5;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 3.0;

/// Clamp a scale into `[MIN_SCALE, MAX_SCALE]`. NaN collapses to 1.0.
#[inline]
#[must_use]
pub fn clamp_scale(scale: f64) -> f64 {
    clamp_scale_to(scale, MIN_SCALE, MAX_SCALE)
}

/// Clamp a scale into a caller-provided range. NaN collapses to 1.0 (then
/// clamped), so a bad pinch ratio never poisons the store.
#[inline]
#[must_use]
pub fn clamp_scale_to(scale: f64, min: f64, max: f64) -> f64 {
    if scale.is_nan() {
        return 1.0_f64.clamp(min, max);
    }
    scale.clamp(min, max)
}

/// Configured zoom range; always a sub-range of `[MIN_SCALE, MAX_SCALE]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl ZoomLimits {
    /// Clamp into this range (and the hard limits).
    #[inline]
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        clamp_scale(clamp_scale_to(scale, self.min_scale, self.max_scale))
    }
}

/// Which axes a zoom applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZoomAxes {
    /// Floor plan: uniform zoom.
    #[default]
    Both,
    /// Timeline: only the time axis zooms.
    Horizontal,
}

/// Scale + translate pair mapping content space to screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// Create a transform, clamping `scale` into the allowed range.
    #[must_use]
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale: clamp_scale(scale),
            translate_x,
            translate_y,
        }
    }

    #[must_use]
    pub fn with_scale(self, scale: f64) -> Self {
        Self {
            scale: clamp_scale(scale),
            ..self
        }
    }

    #[must_use]
    pub fn with_translate(self, translate: Point) -> Self {
        Self {
            translate_x: translate.x,
            translate_y: translate.y,
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn translate(&self) -> Point {
        Point::new(self.translate_x, self.translate_y)
    }

    /// Scale actually applied to the y axis.
    #[inline]
    #[must_use]
    pub fn scale_y(&self, axes: ZoomAxes) -> f64 {
        match axes {
            ZoomAxes::Both => self.scale,
            ZoomAxes::Horizontal => 1.0,
        }
    }

    /// Content space to screen space.
    #[inline]
    #[must_use]
    pub fn to_screen(&self, content: Point, axes: ZoomAxes) -> Point {
        Point::new(
            content.x * self.scale + self.translate_x,
            content.y * self.scale_y(axes) + self.translate_y,
        )
    }

    /// Screen space to content space.
    #[inline]
    #[must_use]
    pub fn to_content(&self, screen: Point, axes: ZoomAxes) -> Point {
        Point::new(
            (screen.x - self.translate_x) / self.scale,
            (screen.y - self.translate_y) / self.scale_y(axes),
        )
    }

    /// The rectangle of content currently visible through a viewport.
    #[must_use]
    pub fn visible_content(&self, viewport: Size, axes: ZoomAxes) -> Bounds {
        let min = self.to_content(Point::ORIGIN, axes);
        let max = self.to_content(Point::new(viewport.width, viewport.height), axes);
        Bounds::new(min.x, min.y, max.x, max.y)
    }

    /// Zoom to `new_scale` keeping the screen point `focal` stationary,
    /// measured against `self` as the saved snapshot.
    ///
    /// `t' = t - (focal - t) * (s'/s - 1)` per zoomed axis.
    #[must_use]
    pub fn zoom_about(&self, focal: Point, new_scale: f64, axes: ZoomAxes) -> Self {
        let ratio = new_scale / self.scale;
        let tx = self.translate_x - (focal.x - self.translate_x) * (ratio - 1.0);
        let ty = match axes {
            ZoomAxes::Both => self.translate_y - (focal.y - self.translate_y) * (ratio - 1.0),
            ZoomAxes::Horizontal => self.translate_y,
        };
        Self {
            scale: new_scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Clamp both translate components so `content` stays framed.
    #[must_use]
    pub fn clamped(&self, content: &Bounds, viewport: Size, axes: ZoomAxes) -> Self {
        Self {
            scale: self.scale,
            translate_x: clamp_axis(
                self.translate_x,
                content.min_x,
                content.max_x,
                self.scale,
                viewport.width,
            ),
            translate_y: clamp_axis(
                self.translate_y,
                content.min_y,
                content.max_y,
                self.scale_y(axes),
                viewport.height,
            ),
        }
    }

    /// Component-wise closeness, used by tests and animation settling.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.scale - other.scale).abs() <= eps
            && (self.translate_x - other.translate_x).abs() <= eps
            && (self.translate_y - other.translate_y).abs() <= eps
    }
}

/// Everything needed to keep a transform legal for one view: the viewport,
/// the content extent panning is limited to, the zoomed axes, and the zoom
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrame {
    pub viewport: Size,
    pub content: Bounds,
    pub axes: ZoomAxes,
    pub limits: ZoomLimits,
}

impl ViewFrame {
    /// Clamp scale into the zoom range, then translate per axis.
    #[must_use]
    pub fn clamp(&self, t: ViewportTransform) -> ViewportTransform {
        let scaled = ViewportTransform {
            scale: self.limits.clamp(t.scale),
            ..t
        };
        scaled.clamped(&self.content, self.viewport, self.axes)
    }
}

/// Per-axis pan clamp.
///
/// With content spanning `[content_min, content_max]`:
/// - if the scaled extent fits in the viewport, the content is centred;
/// - otherwise translate is kept within
///   `[viewport - content_max*scale, -content_min*scale]`, so no gap opens
///   at either edge.
///
/// For content starting at 0 this is exactly `[viewport - scaled, 0]` and
/// the centred value `(viewport - scaled) / 2`.
#[must_use]
pub fn clamp_axis(
    candidate: f64,
    content_min: f64,
    content_max: f64,
    scale: f64,
    viewport_extent: f64,
) -> f64 {
    let scaled_extent = (content_max - content_min) * scale;
    let origin = content_min * scale;
    if scaled_extent <= viewport_extent {
        return (viewport_extent - scaled_extent) / 2.0 - origin;
    }
    let lo = viewport_extent - scaled_extent - origin;
    let hi = -origin;
    if candidate.is_nan() {
        return hi;
    }
    candidate.clamp(lo, hi)
}
