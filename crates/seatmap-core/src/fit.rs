#![forbid(unsafe_code)]

//! Fit-to-content: the transform that frames every entity.
//!
//! Run once at mount and on an explicit reset (double-tap, host
//! `reset_view`). It is not re-run when the entity list changes, so a view
//! the user has panned does not jump under them.
//!
//! The bounding box uses each entity's unrotated half extents. A rotated
//! table can poke slightly outside the box; the padding absorbs that for the
//! coarse framing this is used for.

use crate::entity::{PositionedEntity, ResolvedGeometry};
use crate::geometry::{Bounds, Canvas, Point, Size};
use crate::transform::{ViewportTransform, ZoomAxes, ZoomLimits};

/// Padding added around the content box, in content units.
pub const FIT_PADDING: f64 = 40.0;

/// Scale used by `zoom_to_entity` when the host does not pick one.
pub const DEFAULT_FOCUS_SCALE: f64 = 1.5;

/// Fit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub padding: f64,
    pub limits: ZoomLimits,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            padding: FIT_PADDING,
            limits: ZoomLimits::default(),
        }
    }
}

/// Union of the unrotated boxes of every entity with valid geometry.
#[must_use]
pub fn content_bounds(entities: &[PositionedEntity], canvas: &Canvas) -> Option<Bounds> {
    bounds_of(entities.iter().filter_map(|e| e.geometry(canvas)))
}

/// Union over already-resolved geometry.
#[must_use]
pub fn bounds_of(geometry: impl IntoIterator<Item = ResolvedGeometry>) -> Option<Bounds> {
    geometry
        .into_iter()
        .map(|g| g.bounds())
        .reduce(|acc, b| acc.union(&b))
}

/// Transform centering `bounds` (padded) in `viewport`.
///
/// With no bounds, the viewport rectangle itself is framed, which yields the
/// identity at scale 1 (clamped).
#[must_use]
pub fn fit_bounds(
    bounds: Option<Bounds>,
    viewport: Size,
    config: &FitConfig,
    axes: ZoomAxes,
) -> ViewportTransform {
    let padded = bounds
        .unwrap_or_else(|| Bounds::from_size(viewport))
        .expand(config.padding);
    let box_w = padded.width();
    let box_h = padded.height();

    let raw = match axes {
        ZoomAxes::Both => (viewport.width / box_w).min(viewport.height / box_h),
        ZoomAxes::Horizontal => viewport.width / box_w,
    };
    let scale = if raw.is_finite() && raw > 0.0 {
        config.limits.clamp(raw)
    } else {
        config.limits.clamp(1.0)
    };

    let scale_y = match axes {
        ZoomAxes::Both => scale,
        ZoomAxes::Horizontal => 1.0,
    };
    // Center of viewport minus box origin scaled, offset by half the
    // unused extent on each axis.
    let translate_x = (viewport.width - box_w * scale) / 2.0 - padded.min_x * scale;
    let translate_y = match axes {
        ZoomAxes::Both => (viewport.height - box_h * scale_y) / 2.0 - padded.min_y * scale_y,
        // Rows are not zoomed: keep the first row at the top.
        ZoomAxes::Horizontal => -padded.min_y.max(0.0),
    };

    ViewportTransform {
        scale,
        translate_x,
        translate_y,
    }
}

/// `computeFitTransform`: frame every valid entity in the viewport.
#[must_use]
pub fn compute_fit_transform(
    entities: &[PositionedEntity],
    canvas: &Canvas,
    viewport: Size,
    config: &FitConfig,
) -> ViewportTransform {
    let bounds = content_bounds(entities, canvas);
    let fit = fit_bounds(bounds, viewport, config, ZoomAxes::Both);
    tracing::debug!(
        target: "seatmap.fit",
        entities = entities.len(),
        scale = fit.scale,
        tx = fit.translate_x,
        ty = fit.translate_y,
        "computed fit transform"
    );
    fit
}

/// Transform centring `target` (content space) at `scale`.
#[must_use]
pub fn focus_on(
    target: Point,
    scale: f64,
    viewport: Size,
    limits: &ZoomLimits,
    axes: ZoomAxes,
) -> ViewportTransform {
    let scale = limits.clamp(scale);
    let scale_y = match axes {
        ZoomAxes::Both => scale,
        ZoomAxes::Horizontal => 1.0,
    };
    ViewportTransform {
        scale,
        translate_x: viewport.width / 2.0 - target.x * scale,
        translate_y: viewport.height / 2.0 - target.y * scale_y,
    }
}

/// Transform centring one floor entity at `target_scale` (default
/// [`DEFAULT_FOCUS_SCALE`]). `None` if the entity has no valid geometry.
#[must_use]
pub fn compute_entity_focus(
    entity: &PositionedEntity,
    canvas: &Canvas,
    viewport: Size,
    target_scale: Option<f64>,
    limits: &ZoomLimits,
) -> Option<ViewportTransform> {
    let geometry = entity.geometry(canvas)?;
    Some(focus_on(
        geometry.center,
        target_scale.unwrap_or(DEFAULT_FOCUS_SCALE),
        viewport,
        limits,
        ZoomAxes::Both,
    ))
}
