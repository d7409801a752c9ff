#![forbid(unsafe_code)]

//! Floor-plan and timeline viewports.
//!
//! A [`ViewportController`] owns one view's interaction state: the shared
//! [`TransformStore`], the [`GestureArena`], any running momentum or camera
//! animation, the interaction [`Mode`], and the queue of [`HostIntent`]s.
//! It is generic over what is being looked at through the [`HitSurface`]
//! trait, so the floor plan ([`FloorSurface`]) and the timeline
//! ([`TimelineSurface`]) share every line of gesture handling.
//!
//! [`FloorViewport`] and [`TimelineViewport`] are the host-facing wrappers:
//! they keep the per-view data (canvas and selection, or row layout and the
//! drag controller) and build the surface from the host's current data on
//! every call.
//!
//! # Writers
//!
//! The transform has one writer at a time:
//!
//! | Writer | Claims when | Loses to |
//! |--------|-------------|----------|
//! | gesture | first finger down | camera (host call) |
//! | momentum | fling released | a new touch, camera |
//! | camera | `reset_view`, `zoom_to_entity`, double tap | a new touch |
//! | host | mount, resize | - |
//!
//! A writer that lost its lease stops at its next write attempt.

use std::sync::Arc;

use seatmap_core::animation::CameraAnimation;
use seatmap_core::entity::{EntityId, Occupant, PositionedEntity};
use seatmap_core::event::PointerEvent;
use seatmap_core::fit::{FitConfig, content_bounds, fit_bounds, focus_on};
use seatmap_core::geometry::{Bounds, Canvas, Point, Size};
use seatmap_core::gesture::{GestureArena, GestureOutput, Momentum, MomentumConfig};
use seatmap_core::hit_test::{HitFilter, RowLayout, hit_test};
use seatmap_core::intent::{HapticKind, HostIntent, IntentQueue, Mode};
use seatmap_core::transform::{ViewFrame, ViewportTransform, ZoomAxes};
use seatmap_core::transform_store::{TransformStore, WriterId};
use web_time::{Duration, Instant};

use crate::config::{RenderSection, SeatmapConfig};
use crate::drag::{
    AssignmentOverlay, DispatchMode, DragController, DragPhase, EndDrag, Reassigner, ReservationBar,
};
use crate::render::{FrameInput, RenderPlan, build_floor_plan};
use crate::turn_time::{TurnTimeBadge, TurnTimePolicy, TurnTimeThresholds, turn_time_status};

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// What a viewport looks at: hit-testing and extents in content space.
pub trait HitSurface {
    /// Axes the view zooms.
    fn axes(&self) -> ZoomAxes;

    /// Entity under a screen point.
    fn hit(&self, screen: Point, transform: &ViewportTransform) -> Option<EntityId>;

    /// Extent of everything on the surface; `None` when empty.
    fn content_bounds(&self) -> Option<Bounds>;

    /// Extent of one entity.
    fn entity_bounds(&self, id: EntityId) -> Option<Bounds>;
}

/// The floor plan: free-form, rotated shapes.
#[derive(Debug, Clone, Copy)]
pub struct FloorSurface<'a> {
    pub entities: &'a [PositionedEntity],
    pub canvas: Canvas,
    pub selected: Option<EntityId>,
    pub filter: HitFilter,
}

impl HitSurface for FloorSurface<'_> {
    fn axes(&self) -> ZoomAxes {
        ZoomAxes::Both
    }

    fn hit(&self, screen: Point, transform: &ViewportTransform) -> Option<EntityId> {
        hit_test(
            screen,
            transform,
            self.entities,
            &self.canvas,
            self.selected,
            self.filter,
        )
    }

    fn content_bounds(&self) -> Option<Bounds> {
        content_bounds(self.entities, &self.canvas)
    }

    fn entity_bounds(&self, id: EntityId) -> Option<Bounds> {
        self.entities
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.geometry(&self.canvas))
            .map(|g| g.bounds())
    }
}

/// The timeline: one fixed-height row per table, bars laid along x.
#[derive(Debug, Clone, Copy)]
pub struct TimelineSurface<'a> {
    pub layout: &'a RowLayout,
    pub bars: &'a [ReservationBar],
    /// Optimistic row assignments that override `bars[i].row`.
    pub overlay: Option<&'a AssignmentOverlay>,
    pub content_width: f64,
}

impl TimelineSurface<'_> {
    fn row_of_bar(&self, bar: &ReservationBar) -> EntityId {
        self.overlay.map_or(bar.row, |o| o.effective_row(bar))
    }
}

impl HitSurface for TimelineSurface<'_> {
    fn axes(&self) -> ZoomAxes {
        ZoomAxes::Horizontal
    }

    fn hit(&self, screen: Point, transform: &ViewportTransform) -> Option<EntityId> {
        self.layout.hit(screen, transform)
    }

    fn content_bounds(&self) -> Option<Bounds> {
        if self.layout.is_empty() || !(self.content_width > 0.0) {
            return None;
        }
        Some(Bounds::new(
            0.0,
            0.0,
            self.content_width,
            self.layout.total_height(),
        ))
    }

    /// A row (table) id gives the whole row; a bar id gives the bar inside
    /// its current row.
    fn entity_bounds(&self, id: EntityId) -> Option<Bounds> {
        if let Some(row) = self.layout.row_of(id) {
            return self.layout.row_bounds(row, self.content_width);
        }
        let bar = self.bars.iter().find(|b| b.id == id)?;
        let row = self.layout.row_of(self.row_of_bar(bar))?;
        let (top, bottom) = self.layout.span(row)?;
        Some(Bounds::new(bar.start_x, top, bar.end_x, bottom))
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Timed transform motion owned by the controller.
#[derive(Debug, Clone)]
enum Motion {
    Still,
    Coasting(Momentum),
    Camera(CameraAnimation),
}

impl Motion {
    fn writer(&self) -> Option<WriterId> {
        match self {
            Self::Still => None,
            Self::Coasting(_) => Some(WriterId::Momentum),
            Self::Camera(_) => Some(WriterId::Camera),
        }
    }
}

/// Interaction state of one view.
#[derive(Debug)]
pub struct ViewportController {
    store: Arc<TransformStore>,
    arena: GestureArena,
    axes: ZoomAxes,
    viewport: Size,
    fit: FitConfig,
    focus_scale: f64,
    momentum: Option<MomentumConfig>,
    camera_animate: bool,
    camera_stiffness: f64,
    mode: Mode,
    motion: Motion,
    last_tick: Option<Instant>,
    mounted: bool,
    intents: IntentQueue,
}

impl ViewportController {
    #[must_use]
    pub fn new(axes: ZoomAxes, config: &SeatmapConfig) -> Self {
        let gesture = config.gesture_config();
        let momentum = config.momentum.enabled.then_some(gesture.momentum);
        Self {
            store: TransformStore::shared(ViewportTransform::IDENTITY),
            arena: GestureArena::new(gesture),
            axes,
            viewport: Size::default(),
            fit: config.fit_config(),
            focus_scale: config.fit.focus_scale,
            momentum,
            camera_animate: config.camera.animate,
            camera_stiffness: config.camera.stiffness,
            mode: Mode::default(),
            motion: Motion::Still,
            last_tick: None,
            mounted: false,
            intents: IntentQueue::new(),
        }
    }

    /// Handle for the render path.
    #[must_use]
    pub fn store(&self) -> Arc<TransformStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.store.load()
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether a touch session is in progress.
    #[must_use]
    pub fn is_gesture_active(&self) -> bool {
        self.arena.is_active()
    }

    /// Whether momentum or a camera move still needs ticks.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !matches!(self.motion, Motion::Still)
    }

    /// Pan/zoom limits for the current viewport and surface.
    #[must_use]
    pub fn frame(&self, surface: &impl HitSurface) -> ViewFrame {
        let padding = self.fit.padding;
        let content = surface
            .content_bounds()
            .unwrap_or_else(|| Bounds::from_size(self.viewport));
        let content = match self.axes {
            ZoomAxes::Both => content.expand(padding),
            // Rows are not padded vertically.
            ZoomAxes::Horizontal => Bounds::new(
                content.min_x - padding,
                content.min_y,
                content.max_x + padding,
                content.max_y,
            ),
        };
        ViewFrame {
            viewport: self.viewport,
            content,
            axes: self.axes,
            limits: self.fit.limits,
        }
    }

    /// Transform that frames the whole surface.
    #[must_use]
    pub fn fit_transform(&self, surface: &impl HitSurface) -> ViewportTransform {
        let fit = fit_bounds(surface.content_bounds(), self.viewport, &self.fit, self.axes);
        self.frame(surface).clamp(fit)
    }

    /// Size the view and jump to the fit transform.
    pub fn mount(&mut self, viewport: Size, surface: &impl HitSurface) {
        self.stop_motion();
        self.arena.cancel(&self.store);
        self.viewport = viewport;
        let fit = self.fit_transform(surface);
        self.store.replace(fit);
        self.mounted = true;
        tracing::debug!(
            target: "seatmap.viewport",
            axes = ?self.axes,
            width = viewport.width,
            height = viewport.height,
            scale = fit.scale,
            "mounted"
        );
    }

    /// Change the viewport size, keeping the current zoom and re-clamping
    /// the pan. Does not re-fit.
    pub fn resize(&mut self, viewport: Size, surface: &impl HitSurface) {
        if !self.mounted {
            self.mount(viewport, surface);
            return;
        }
        self.stop_motion();
        self.viewport = viewport;
        let clamped = self.frame(surface).clamp(self.store.load());
        self.store.replace(clamped);
        tracing::debug!(target: "seatmap.viewport", width = viewport.width, height = viewport.height, "resized");
    }

    /// Route one pointer sample.
    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant, surface: &impl HitSurface) {
        if !self.mounted {
            return;
        }
        let frame = self.frame(surface);
        for output in self.arena.handle(event, now, &self.store, &frame) {
            self.apply(output, now, surface, &frame);
        }
    }

    /// Advance long-press detection and running motion. Returns whether
    /// another tick is needed.
    pub fn tick(&mut self, now: Instant, surface: &impl HitSurface) -> bool {
        if !self.mounted {
            return false;
        }
        if let Some(output) = self.arena.tick(now) {
            let frame = self.frame(surface);
            self.apply(output, now, surface, &frame);
        }
        self.step_motion(now)
    }

    /// Animate back to the fit transform.
    pub fn reset_view(&mut self, now: Instant, surface: &impl HitSurface) {
        if !self.mounted {
            return;
        }
        let target = self.fit_transform(surface);
        self.arena.forget_taps();
        self.start_camera(target, now);
        self.intents.push(HostIntent::ViewReset);
        tracing::debug!(target: "seatmap.viewport", scale = target.scale, "reset to fit");
    }

    /// Animate to centre `id` at `target_scale` (default from config).
    /// Returns `false` if the surface has no such entity.
    pub fn zoom_to_entity(
        &mut self,
        id: EntityId,
        target_scale: Option<f64>,
        now: Instant,
        surface: &impl HitSurface,
    ) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(bounds) = surface.entity_bounds(id) else {
            tracing::warn!(target: "seatmap.viewport", entity = %id, "zoom_to_entity: unknown entity");
            return false;
        };
        let scale = target_scale.unwrap_or(self.focus_scale);
        let target = self.frame(surface).clamp(focus_on(
            bounds.center(),
            scale,
            self.viewport,
            &self.fit.limits,
            self.axes,
        ));
        self.start_camera(target, now);
        tracing::debug!(target: "seatmap.viewport", entity = %id, scale = target.scale, "zoom to entity");
        true
    }

    /// Change what a tap means. Any touch session is discarded.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.arena.cancel(&self.store);
        tracing::debug!(target: "seatmap.viewport", from = ?self.mode, to = ?mode, "mode changed");
        self.mode = mode;
    }

    /// Discard the touch session and stop any motion. Emits nothing.
    pub fn cancel(&mut self) {
        self.arena.cancel(&self.store);
        self.stop_motion();
    }

    pub fn drain_intents(&mut self) -> Vec<HostIntent> {
        self.intents.drain()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply(
        &mut self,
        output: GestureOutput,
        now: Instant,
        surface: &impl HitSurface,
        frame: &ViewFrame,
    ) {
        match output {
            GestureOutput::SessionStarted => self.stop_motion(),
            GestureOutput::Tap { pos } => self.dispatch_tap(pos, surface),
            GestureOutput::DoubleTap { .. } => self.reset_view(now, surface),
            GestureOutput::LongPress { pos, .. } => {
                if let Some(id) = surface.hit(pos, &self.store.load()) {
                    self.intents.push(HostIntent::EntityLongPressed { id });
                    self.intents.push(HostIntent::Haptic(HapticKind::LongPress));
                }
            }
            GestureOutput::TransformEnded { velocity } => {
                let Some(config) = self.momentum else {
                    return;
                };
                if let Some(momentum) = Momentum::start(self.store.load(), velocity, &config, *frame)
                {
                    self.store.claim(WriterId::Momentum);
                    self.motion = Motion::Coasting(momentum);
                    self.last_tick = Some(now);
                    tracing::trace!(target: "seatmap.viewport", vx = velocity.x, vy = velocity.y, "momentum");
                }
            }
            GestureOutput::TransformBegan
            | GestureOutput::TransformChanged(_)
            | GestureOutput::Cancelled { .. } => {}
        }
    }

    fn dispatch_tap(&mut self, pos: Point, surface: &impl HitSurface) {
        let transform = self.store.load();
        match surface.hit(pos, &transform) {
            Some(id) => {
                self.intents.push(HostIntent::EntitySelected {
                    id,
                    action: self.mode.tap_action(),
                });
                self.intents.push(HostIntent::Haptic(HapticKind::Selection));
            }
            None => self.intents.push(HostIntent::BackgroundTap {
                content: transform.to_content(pos, self.axes),
            }),
        }
    }

    fn start_camera(&mut self, target: ViewportTransform, now: Instant) {
        self.arena.cancel(&self.store);
        self.stop_motion();
        self.store.claim(WriterId::Camera);
        if self.camera_animate {
            self.motion = Motion::Camera(CameraAnimation::new(
                self.store.load(),
                target,
                self.camera_stiffness,
            ));
            self.last_tick = Some(now);
        } else {
            self.store.store_as(WriterId::Camera, target);
            self.store.release(WriterId::Camera);
        }
    }

    fn stop_motion(&mut self) {
        if let Some(writer) = self.motion.writer() {
            self.store.release(writer);
        }
        self.motion = Motion::Still;
        self.last_tick = None;
    }

    fn step_motion(&mut self, now: Instant) -> bool {
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        let (writer, next, finished) = match &mut self.motion {
            Motion::Still => return false,
            Motion::Coasting(m) => {
                let next = m.advance(dt);
                (WriterId::Momentum, next, m.is_finished())
            }
            Motion::Camera(a) => {
                let next = a.advance(dt);
                (WriterId::Camera, next, a.is_settled())
            }
        };

        if !self.store.store_as(writer, next) {
            // Pre-empted by another writer.
            self.motion = Motion::Still;
            self.last_tick = None;
            return false;
        }
        if finished {
            self.stop_motion();
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Floor plan
// ---------------------------------------------------------------------------

/// The spatial floor-plan view.
#[derive(Debug)]
pub struct FloorViewport {
    controller: ViewportController,
    canvas: Canvas,
    selected: Option<EntityId>,
    render: RenderSection,
    turn_time: TurnTimePolicy,
    thresholds: TurnTimeThresholds,
}

impl FloorViewport {
    #[must_use]
    pub fn new(canvas: Canvas, config: &SeatmapConfig) -> Self {
        Self {
            controller: ViewportController::new(ZoomAxes::Both, config),
            canvas,
            selected: None,
            render: config.render.clone(),
            turn_time: config.turn_time.floor_policy,
            thresholds: config.turn_time.thresholds,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    /// Surface over the host's current entity list.
    #[must_use]
    pub fn surface<'a>(&self, entities: &'a [PositionedEntity]) -> FloorSurface<'a> {
        FloorSurface {
            entities,
            canvas: self.canvas,
            selected: self.selected,
            filter: HitFilter::TablesOnly,
        }
    }

    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// The host's current selection; painted last and hit first.
    pub fn set_selected(&mut self, selected: Option<EntityId>) {
        self.selected = selected;
    }

    #[must_use]
    pub fn store(&self) -> Arc<TransformStore> {
        self.controller.store()
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.controller.transform()
    }

    pub fn mount(&mut self, viewport: Size, entities: &[PositionedEntity]) {
        let surface = self.surface(entities);
        self.controller.mount(viewport, &surface);
    }

    pub fn resize(&mut self, viewport: Size, entities: &[PositionedEntity]) {
        let surface = self.surface(entities);
        self.controller.resize(viewport, &surface);
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant, entities: &[PositionedEntity]) {
        let surface = self.surface(entities);
        self.controller.handle_pointer(event, now, &surface);
    }

    pub fn tick(&mut self, now: Instant, entities: &[PositionedEntity]) -> bool {
        let surface = self.surface(entities);
        self.controller.tick(now, &surface)
    }

    pub fn reset_view(&mut self, now: Instant, entities: &[PositionedEntity]) {
        let surface = self.surface(entities);
        self.controller.reset_view(now, &surface);
    }

    pub fn zoom_to_entity(
        &mut self,
        id: EntityId,
        target_scale: Option<f64>,
        now: Instant,
        entities: &[PositionedEntity],
    ) -> bool {
        let surface = self.surface(entities);
        self.controller.zoom_to_entity(id, target_scale, now, &surface)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.controller.set_mode(mode);
    }

    pub fn cancel(&mut self) {
        self.controller.cancel();
    }

    pub fn drain_intents(&mut self) -> Vec<HostIntent> {
        self.controller.drain_intents()
    }

    /// Build the current frame.
    #[must_use]
    pub fn frame(&self, entities: &[PositionedEntity], now_ms: i64) -> RenderPlan {
        build_floor_plan(FrameInput {
            entities,
            canvas: self.canvas,
            selected: self.selected,
            transform: self.controller.transform(),
            viewport: self.controller.viewport(),
            now_ms,
            style: &self.render,
            turn_time: &self.turn_time,
            thresholds: &self.thresholds,
        })
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// The reservation timeline: horizontal zoom, fixed rows, drag-to-reassign.
#[derive(Debug)]
pub struct TimelineViewport {
    controller: ViewportController,
    layout: RowLayout,
    content_width: f64,
    drag: DragController,
    turn_time: TurnTimePolicy,
    thresholds: TurnTimeThresholds,
}

impl TimelineViewport {
    #[must_use]
    pub fn new(
        layout: RowLayout,
        content_width: f64,
        reassigner: Arc<dyn Reassigner>,
        dispatch: DispatchMode,
        config: &SeatmapConfig,
    ) -> Self {
        let drag = DragController::new(reassigner, dispatch)
            .with_notice_ttl(Duration::from_millis(config.drag.error_notice_ms));
        Self {
            controller: ViewportController::new(ZoomAxes::Horizontal, config),
            layout,
            content_width,
            drag,
            turn_time: config.turn_time.timeline_policy,
            thresholds: config.turn_time.thresholds,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    #[must_use]
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    #[must_use]
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Replace the rows (tables changed). The transform is kept.
    pub fn set_layout(&mut self, layout: RowLayout) {
        self.layout = layout;
    }

    pub fn set_content_width(&mut self, content_width: f64) {
        self.content_width = content_width;
    }

    #[must_use]
    pub fn surface<'a>(&'a self, bars: &'a [ReservationBar]) -> TimelineSurface<'a> {
        timeline_surface(&self.layout, &self.drag, bars, self.content_width)
    }

    #[must_use]
    pub fn store(&self) -> Arc<TransformStore> {
        self.controller.store()
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.controller.transform()
    }

    /// Row a bar should be drawn in, including optimistic moves.
    #[must_use]
    pub fn displayed_row(&self, bar: &ReservationBar) -> EntityId {
        self.drag.overlay().effective_row(bar)
    }

    pub fn mount(&mut self, viewport: Size, bars: &[ReservationBar]) {
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        self.controller.mount(viewport, &surface);
    }

    pub fn resize(&mut self, viewport: Size, bars: &[ReservationBar]) {
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        self.controller.resize(viewport, &surface);
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant, bars: &[ReservationBar]) {
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        self.controller.handle_pointer(event, now, &surface);
    }

    /// Advance gestures, motion, and pending reassignments. Returns whether
    /// another tick is needed.
    pub fn tick(&mut self, now: Instant, bars: &[ReservationBar]) -> bool {
        self.drag.poll(now);
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        let moving = self.controller.tick(now, &surface);
        moving || self.drag.phase() != DragPhase::Idle
    }

    pub fn reset_view(&mut self, now: Instant, bars: &[ReservationBar]) {
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        self.controller.reset_view(now, &surface);
    }

    /// Centre a table row or a reservation bar.
    pub fn zoom_to_entity(
        &mut self,
        id: EntityId,
        target_scale: Option<f64>,
        now: Instant,
        bars: &[ReservationBar],
    ) -> bool {
        let surface = timeline_surface(&self.layout, &self.drag, bars, self.content_width);
        self.controller.zoom_to_entity(id, target_scale, now, &surface)
    }

    /// Start dragging `bar` grabbed at screen point `grab_absolute`, which
    /// is `grab_relative` in timeline content. The touch session that led
    /// here (usually a long press) is discarded so the finger does not pan.
    pub fn start_drag(
        &mut self,
        bar: &ReservationBar,
        grab_absolute: Point,
        grab_relative: Point,
    ) -> bool {
        let scroll = self.controller.transform().translate();
        let started = self.drag.start_drag(bar, grab_absolute, grab_relative, scroll);
        if started {
            self.controller.arena.cancel(&self.controller.store);
        }
        started
    }

    /// Move the drag; returns the candidate row.
    pub fn update_drag(&mut self, absolute: Point) -> Option<EntityId> {
        let scroll = self.controller.transform().translate();
        self.drag.update_drag(absolute, scroll, &self.layout)
    }

    pub fn end_drag(&mut self) -> EndDrag {
        self.drag.end_drag()
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.cancel_drag()
    }

    /// Drop optimistic entries the host data now reflects or whose bars are
    /// gone from `bars`.
    pub fn reconcile(&mut self, bars: &[ReservationBar]) {
        self.drag.reconcile(bars);
    }

    /// Changing mode also abandons an in-progress drag.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.controller.mode() {
            self.drag.cancel_drag();
        }
        self.controller.set_mode(mode);
    }

    pub fn cancel(&mut self) {
        self.drag.cancel_drag();
        self.controller.cancel();
    }

    /// Intents from gestures and from the drag controller, in that order.
    pub fn drain_intents(&mut self) -> Vec<HostIntent> {
        let mut intents = self.controller.drain_intents();
        intents.extend(self.drag.drain_intents());
        intents
    }

    /// Turn-time badge under the timeline's policy.
    #[must_use]
    pub fn turn_time_badge(&self, occupant: &Occupant, now_ms: i64) -> TurnTimeBadge {
        turn_time_status(occupant, now_ms, &self.turn_time, &self.thresholds)
    }
}

fn timeline_surface<'a>(
    layout: &'a RowLayout,
    drag: &'a DragController,
    bars: &'a [ReservationBar],
    content_width: f64,
) -> TimelineSurface<'a> {
    TimelineSurface {
        layout,
        bars,
        overlay: Some(drag.overlay()),
        content_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatmap_core::entity::Shape;
    use seatmap_core::intent::TapAction;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn entities() -> Vec<PositionedEntity> {
        vec![
            PositionedEntity::table(1, Shape::Square, Point::new(25.0, 25.0), 100.0, 100.0),
            PositionedEntity::table(2, Shape::Circle, Point::new(75.0, 75.0), 100.0, 100.0),
        ]
    }

    fn floor() -> FloorViewport {
        let mut v = FloorViewport::new(Canvas::new(1000.0, 1000.0), &SeatmapConfig::default());
        v.mount(Size::new(500.0, 500.0), &entities());
        v
    }

    fn screen_of(v: &FloorViewport, content: Point) -> Point {
        v.transform().to_screen(content, ZoomAxes::Both)
    }

    fn tap(v: &mut FloorViewport, at: Point, now: Instant) {
        let es = entities();
        v.handle_pointer(&PointerEvent::down(1, at.x, at.y), now, &es);
        v.handle_pointer(&PointerEvent::up(1, at.x, at.y), now + ms(40), &es);
    }

    #[test]
    fn mount_applies_fit() {
        let v = floor();
        // Entities span 200..800; padded 160..840 = 680 wide into 500.
        assert!((v.transform().scale - 500.0 / 680.0).abs() < 1e-9);
        assert!(v.controller().is_mounted());
    }

    #[test]
    fn tap_on_table_selects_it() {
        let mut v = floor();
        let t0 = Instant::now();
        let at = screen_of(&v, Point::new(250.0, 250.0));
        tap(&mut v, at, t0);
        let intents = v.drain_intents();
        assert_eq!(
            intents,
            vec![
                HostIntent::EntitySelected { id: EntityId(1), action: TapAction::Select },
                HostIntent::Haptic(HapticKind::Selection),
            ]
        );
    }

    #[test]
    fn tap_on_background_reports_content_point() {
        let mut v = floor();
        let at = screen_of(&v, Point::new(500.0, 250.0));
        tap(&mut v, at, Instant::now());
        let intents = v.drain_intents();
        let [HostIntent::BackgroundTap { content }] = intents[..] else {
            panic!("expected background tap, got {intents:?}");
        };
        assert!((content.x - 500.0).abs() < 1e-6 && (content.y - 250.0).abs() < 1e-6);
    }

    #[test]
    fn mode_changes_tap_meaning() {
        let mut v = floor();
        v.set_mode(Mode::WalkIn);
        let at = screen_of(&v, Point::new(750.0, 750.0));
        tap(&mut v, at, Instant::now());
        assert_eq!(
            v.drain_intents()[0],
            HostIntent::EntitySelected { id: EntityId(2), action: TapAction::SeatWalkIn }
        );
    }

    #[test]
    fn long_press_on_table() {
        let mut v = floor();
        let es = entities();
        let t0 = Instant::now();
        let at = screen_of(&v, Point::new(750.0, 750.0));
        v.handle_pointer(&PointerEvent::down(1, at.x, at.y), t0, &es);
        v.tick(t0 + ms(200), &es);
        assert!(v.drain_intents().is_empty());
        v.tick(t0 + ms(450), &es);
        v.handle_pointer(&PointerEvent::up(1, at.x, at.y), t0 + ms(600), &es);
        assert_eq!(
            v.drain_intents(),
            vec![
                HostIntent::EntityLongPressed { id: EntityId(2) },
                HostIntent::Haptic(HapticKind::LongPress),
            ]
        );
    }

    #[test]
    fn zoom_to_entity_animates_to_focus() {
        let mut v = floor();
        let es = entities();
        let t0 = Instant::now();
        assert!(v.zoom_to_entity(EntityId(2), Some(2.0), t0, &es));
        assert!(v.controller().is_animating());
        let mut t = t0;
        for _ in 0..300 {
            t += ms(16);
            if !v.tick(t, &es) {
                break;
            }
        }
        assert!(!v.controller().is_animating());
        let tr = v.transform();
        assert!((tr.scale - 2.0).abs() < 1e-9);
        // Centring (750, 750) would open a gap past the padded edge at 840,
        // so the pan stops at 500 - 840 * 2.
        assert!((tr.translate_x - -1180.0).abs() < 1e-9);
        assert!((tr.translate_y - -1180.0).abs() < 1e-9);
        assert_eq!(v.store().holder(), WriterId::Vacant);
    }

    #[test]
    fn zoom_to_unknown_entity_is_noop() {
        let mut v = floor();
        let before = v.transform();
        assert!(!v.zoom_to_entity(EntityId(99), None, Instant::now(), &entities()));
        assert!(!v.controller().is_animating());
        assert_eq!(v.transform(), before);
    }

    #[test]
    fn touch_interrupts_camera() {
        let mut v = floor();
        let es = entities();
        let t0 = Instant::now();
        v.zoom_to_entity(EntityId(1), Some(3.0), t0, &es);
        v.tick(t0 + ms(16), &es);
        v.handle_pointer(&PointerEvent::down(1, 10.0, 10.0), t0 + ms(20), &es);
        assert!(!v.controller().is_animating());
        let frozen = v.transform();
        assert!(!v.tick(t0 + ms(40), &es));
        assert_eq!(v.transform(), frozen);
    }

    #[test]
    fn fling_coasts_then_stops() {
        let mut v = floor();
        let es = entities();
        v.resize(Size::new(200.0, 200.0), &es);
        let t0 = Instant::now();
        v.handle_pointer(&PointerEvent::down(1, 100.0, 100.0), t0, &es);
        for i in 1..=5u64 {
            let x = 100.0 - i as f64 * 12.0;
            v.handle_pointer(&PointerEvent::moved(1, x, 100.0), t0 + ms(i * 10), &es);
        }
        v.handle_pointer(&PointerEvent::up(1, 40.0, 100.0), t0 + ms(50), &es);
        assert!(v.controller().is_animating(), "1200 px/s release should coast");
        let released = v.transform().translate_x;

        let mut t = t0 + ms(50);
        while v.tick(t, &es) {
            t += ms(16);
        }
        assert!(v.transform().translate_x < released);
        assert_eq!(v.store().holder(), WriterId::Vacant);
    }

    #[test]
    fn fling_then_rest_does_not_coast() {
        let mut v = floor();
        let es = entities();
        v.resize(Size::new(200.0, 200.0), &es);
        let t0 = Instant::now();
        v.handle_pointer(&PointerEvent::down(1, 100.0, 100.0), t0, &es);
        for i in 1..=5u64 {
            let x = 100.0 - i as f64 * 12.0;
            v.handle_pointer(&PointerEvent::moved(1, x, 100.0), t0 + ms(i * 10), &es);
        }
        let held = v.transform();
        v.tick(t0 + ms(500), &es);
        v.handle_pointer(&PointerEvent::up(1, 40.0, 100.0), t0 + ms(1_050), &es);
        assert!(!v.controller().is_animating());
        assert!(!v.tick(t0 + ms(1_066), &es));
        assert_eq!(v.transform(), held);
        assert_eq!(v.store().holder(), WriterId::Vacant);
    }

    #[test]
    fn cancel_is_silent() {
        let mut v = floor();
        let es = entities();
        let at = screen_of(&v, Point::new(250.0, 250.0));
        v.handle_pointer(&PointerEvent::down(1, at.x, at.y), Instant::now(), &es);
        v.cancel();
        v.handle_pointer(&PointerEvent::up(1, at.x, at.y), Instant::now(), &es);
        assert!(v.drain_intents().is_empty());
    }

    #[test]
    fn events_before_mount_are_ignored() {
        let mut v = FloorViewport::new(Canvas::new(100.0, 100.0), &SeatmapConfig::default());
        let es = entities();
        v.handle_pointer(&PointerEvent::down(1, 1.0, 1.0), Instant::now(), &es);
        assert!(!v.controller().is_gesture_active());
    }

    #[test]
    fn resize_keeps_scale() {
        let mut v = floor();
        let es = entities();
        let before = v.transform().scale;
        v.resize(Size::new(900.0, 400.0), &es);
        assert_eq!(v.transform().scale, before);
    }

    // -- timeline -----------------------------------------------------------

    fn bars() -> Vec<ReservationBar> {
        vec![ReservationBar {
            id: EntityId(500),
            row: EntityId(2),
            start_x: 600.0,
            end_x: 800.0,
        }]
    }

    fn timeline() -> TimelineViewport {
        let layout = RowLayout::uniform((1..=20).map(EntityId), 60.0);
        let reassigner =
            |_: EntityId, _: EntityId| -> Result<(), crate::drag::ReassignError> { Ok(()) };
        let mut v = TimelineViewport::new(
            layout,
            2_000.0,
            Arc::new(reassigner),
            DispatchMode::Inline,
            &SeatmapConfig::default(),
        );
        v.mount(Size::new(400.0, 600.0), &bars());
        v
    }

    #[test]
    fn timeline_fit_is_horizontal_only() {
        let v = timeline();
        let t = v.transform();
        // 2080 padded units into 400 px: clamped to min scale.
        assert_eq!(t.scale, 0.5);
        assert_eq!(t.translate_y, 0.0);
    }

    #[test]
    fn timeline_tap_selects_row() {
        let mut v = timeline();
        let t0 = Instant::now();
        let b = bars();
        // y = 130 is row 2 (120..180) whatever the x.
        v.handle_pointer(&PointerEvent::down(1, 17.0, 130.0), t0, &b);
        v.handle_pointer(&PointerEvent::up(1, 17.0, 130.0), t0 + ms(30), &b);
        assert_eq!(
            v.drain_intents()[0],
            HostIntent::EntitySelected { id: EntityId(3), action: TapAction::Select }
        );
    }

    #[test]
    fn timeline_zoom_to_bar_centres_it() {
        let mut v = timeline();
        let b = bars();
        let t0 = Instant::now();
        assert!(v.zoom_to_entity(EntityId(500), Some(1.0), t0, &b));
        let mut t = t0;
        while v.tick(t, &b) {
            t += ms(16);
        }
        let tr = v.transform();
        // Bar centre (700, 90) at scale 1 in a 400 wide viewport.
        assert!((tr.scale - 1.0).abs() < 1e-9);
        assert!((tr.translate_x - (200.0 - 700.0)).abs() < 1e-6);
    }

    #[test]
    fn timeline_drag_reassigns_through_viewport() {
        let mut v = timeline();
        let b = bars();
        let t0 = Instant::now();
        let ty = v.transform().translate_y;
        // Bar sits in row 1 (60..120); grab its middle.
        let grab_rel = Point::new(700.0, 90.0);
        let grab_abs = Point::new(150.0, 90.0 + ty);
        assert!(v.start_drag(&b[0], grab_abs, grab_rel));
        assert_eq!(v.update_drag(Point::new(150.0, 250.0 + ty)), Some(EntityId(5)));
        assert!(matches!(v.end_drag(), EndDrag::Committing { .. }));
        assert_eq!(v.displayed_row(&b[0]), EntityId(5));
        v.tick(t0, &b);
        assert!(v
            .drain_intents()
            .contains(&HostIntent::DragCompleted { entity: EntityId(500), target: EntityId(5) }));
    }

    #[test]
    fn mode_change_cancels_drag() {
        let mut v = timeline();
        let b = bars();
        assert!(v.start_drag(&b[0], Point::new(1.0, 90.0), Point::new(700.0, 90.0)));
        v.set_mode(Mode::ServerAssignment);
        assert_eq!(v.drag().phase(), DragPhase::Idle);
        assert!(v.drain_intents().is_empty());
    }
}
