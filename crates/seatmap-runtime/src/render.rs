#![forbid(unsafe_code)]

//! Floor-plan frame building: a deterministic, back-to-front list of draw
//! operations.
//!
//! The render path polls the [`TransformStore`](seatmap_core::TransformStore)
//! and the host's entity list at its own cadence and calls
//! [`build_floor_plan`]. The plan is plain data; the host's drawing backend
//! walks it in order.
//!
//! # Draw order
//!
//! 1. background fill
//! 2. reference grid (over the visible content rectangle)
//! 3. decorative elements, ascending z-index
//! 4. every table except the selected one, in input order
//! 5. the selected table, so its ring is never covered
//! 6. turn-time badges
//!
//! Entities use [`paint_order`], the same ordering hit-testing walks in
//! reverse, so what is drawn on top is what a tap hits.
//!
//! # Entity layers
//!
//! An entity is drawn as successive fills of its own shape, each grown by an
//! outset, painted largest first: shadow, selection ring, server ring,
//! border, fill. No nested containers.

use bitflags::bitflags;
use seatmap_core::entity::{EntityId, PositionedEntity, ResolvedGeometry, Rgba, Shape};
use seatmap_core::geometry::{Bounds, Canvas, Point, Size};
use seatmap_core::hit_test::paint_order;
use seatmap_core::transform::{ViewportTransform, ZoomAxes};

use crate::config::RenderSection;
use crate::turn_time::{TurnTimeBadge, TurnTimePolicy, TurnTimeThresholds, turn_time_status};

bitflags! {
    /// Which layers an entity gets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u8 {
        const SHADOW         = 0b0_0001;
        const SELECTION_RING = 0b0_0010;
        const SERVER_RING    = 0b0_0100;
        const BORDER         = 0b0_1000;
        const FILL           = 0b1_0000;
    }
}

/// One layer of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Shadow,
    SelectionRing,
    ServerRing,
    Border,
    Fill,
}

/// A same-shape fill grown by `outset` content units on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeLayer {
    pub layer: Layer,
    pub outset: f64,
    /// Translation of the layer relative to the entity (shadows only).
    pub offset: Point,
    pub color: Rgba,
}

/// One drawing step, in content space unless noted.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Background {
        color: Rgba,
    },
    Grid {
        spacing: f64,
        color: Rgba,
        area: Bounds,
    },
    Entity {
        id: EntityId,
        shape: Shape,
        geometry: ResolvedGeometry,
        layers: Vec<ShapeLayer>,
    },
    Badge {
        id: EntityId,
        anchor: Point,
        badge: TurnTimeBadge,
    },
}

/// An ordered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Transform the plan was built against.
    pub transform: ViewportTransform,
    pub ops: Vec<DrawOp>,
}

impl RenderPlan {
    /// Entity ids in the order they are painted.
    #[must_use]
    pub fn entity_order(&self) -> Vec<EntityId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Entity { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Badge ops, in paint order.
    pub fn badges(&self) -> impl Iterator<Item = (EntityId, &TurnTimeBadge)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Badge { id, badge, .. } => Some((*id, badge)),
            _ => None,
        })
    }
}

/// Everything one floor frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub entities: &'a [PositionedEntity],
    pub canvas: Canvas,
    pub selected: Option<EntityId>,
    pub transform: ViewportTransform,
    pub viewport: Size,
    /// Unix epoch milliseconds, for turn-time badges.
    pub now_ms: i64,
    pub style: &'a RenderSection,
    pub turn_time: &'a TurnTimePolicy,
    pub thresholds: &'a TurnTimeThresholds,
}

/// Layers for an entity given the current selection.
#[must_use]
pub fn layer_flags(entity: &PositionedEntity, selected: Option<EntityId>) -> LayerFlags {
    if !entity.is_table() {
        return LayerFlags::BORDER | LayerFlags::FILL;
    }
    let mut flags = LayerFlags::SHADOW | LayerFlags::BORDER | LayerFlags::FILL;
    if entity.server_color.is_some() {
        flags |= LayerFlags::SERVER_RING;
    }
    if selected == Some(entity.id) {
        flags |= LayerFlags::SELECTION_RING;
    }
    flags
}

/// Layers for `entity`, largest extent first.
#[must_use]
pub fn entity_layers(
    entity: &PositionedEntity,
    flags: LayerFlags,
    style: &RenderSection,
) -> Vec<ShapeLayer> {
    let fill_color = if entity.is_table() {
        entity.status.fill()
    } else {
        style.decor_fill
    };

    // Built inside-out, each ring growing the outset, then reversed.
    let mut layers = Vec::with_capacity(5);
    let mut outset = 0.0;
    let mut push = |layer, grow: f64, color, layers: &mut Vec<ShapeLayer>| {
        outset += grow;
        layers.push(ShapeLayer {
            layer,
            outset,
            offset: Point::ORIGIN,
            color,
        });
    };

    if flags.contains(LayerFlags::FILL) {
        push(Layer::Fill, 0.0, fill_color, &mut layers);
    }
    if flags.contains(LayerFlags::BORDER) {
        push(Layer::Border, style.border_width, style.border_color, &mut layers);
    }
    if flags.contains(LayerFlags::SERVER_RING)
        && let Some(color) = entity.server_color
    {
        push(Layer::ServerRing, style.server_ring_width, color, &mut layers);
    }
    if flags.contains(LayerFlags::SELECTION_RING) {
        push(
            Layer::SelectionRing,
            style.selection_ring_width,
            style.selection_color,
            &mut layers,
        );
    }
    if flags.contains(LayerFlags::SHADOW) {
        push(Layer::Shadow, style.shadow_spread, style.shadow_color, &mut layers);
        if let Some(shadow) = layers.last_mut() {
            shadow.offset = Point::new(0.0, style.shadow_spread * 0.5);
        }
    }

    layers.reverse();
    layers
}

/// Build the floor frame.
#[must_use]
pub fn build_floor_plan(input: FrameInput<'_>) -> RenderPlan {
    let style = input.style;
    let order = paint_order(input.entities, &input.canvas, input.selected);
    let mut ops = Vec::with_capacity(order.len() + 2);

    ops.push(DrawOp::Background {
        color: style.background,
    });
    if style.show_grid && style.grid_spacing > 0.0 {
        ops.push(DrawOp::Grid {
            spacing: style.grid_spacing,
            color: style.grid_color,
            area: input
                .transform
                .visible_content(input.viewport, ZoomAxes::Both),
        });
    }

    let mut badges = Vec::new();
    for &i in &order {
        let entity = &input.entities[i];
        let Some(geometry) = entity.geometry(&input.canvas) else {
            continue;
        };
        let flags = layer_flags(entity, input.selected);
        ops.push(DrawOp::Entity {
            id: entity.id,
            shape: entity.shape,
            geometry,
            layers: entity_layers(entity, flags, style),
        });

        if entity.is_table()
            && entity.status.is_occupied()
            && let Some(occupant) = &entity.occupant
        {
            badges.push(DrawOp::Badge {
                id: entity.id,
                anchor: geometry.center + Point::new(geometry.half_w, -geometry.half_h),
                badge: turn_time_status(occupant, input.now_ms, input.turn_time, input.thresholds),
            });
        }
    }
    ops.extend(badges);

    tracing::trace!(
        target: "seatmap.render",
        entities = order.len(),
        ops = ops.len(),
        "built floor plan"
    );

    RenderPlan {
        transform: input.transform,
        ops,
    }
}
