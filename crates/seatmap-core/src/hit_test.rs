#![forbid(unsafe_code)]

//! Hit-testing: which entity, if any, lies under a screen point.
//!
//! Everything here is a pure function of its inputs, so the same code serves
//! tap, long-press, press-start, and drag-update handlers.
//!
//! Two variants:
//!
//! - **Free-form** ([`hit_test`]): floor plan. Walks entities topmost-first
//!   (reverse of [`paint_order`]), maps the point into each entity's local
//!   frame (translate, then rotate by the negated rotation), and runs the
//!   shape predicate.
//! - **Row** ([`RowLayout::hit`]): timeline. Only the content y matters; it
//!   is mapped to a row through prefix sums of the fixed row heights.

use ahash::AHashMap;

use crate::entity::{EntityId, PositionedEntity};
use crate::geometry::{Bounds, Canvas, Point};
use crate::transform::{ViewportTransform, ZoomAxes};

/// Which entities take part in a free-form hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitFilter {
    /// Tables only; decorative elements are not selectable.
    #[default]
    TablesOnly,
    /// Every entity with valid geometry.
    All,
}

impl HitFilter {
    #[inline]
    fn admits(self, entity: &PositionedEntity) -> bool {
        match self {
            Self::TablesOnly => entity.is_table(),
            Self::All => true,
        }
    }
}

/// Back-to-front paint order as indices into `entities`.
///
/// Decorative elements come first, ascending by z-index (ties keep input
/// order); then every table except the selected one, in input order; the
/// selected table goes last so nothing covers its highlight. Entities with
/// invalid geometry are left out.
#[must_use]
pub fn paint_order(
    entities: &[PositionedEntity],
    canvas: &Canvas,
    selected: Option<EntityId>,
) -> Vec<usize> {
    let mut decor = Vec::new();
    let mut tables = Vec::with_capacity(entities.len());
    let mut selected_idx = None;

    for (i, e) in entities.iter().enumerate() {
        if e.geometry(canvas).is_none() {
            continue;
        }
        if !e.is_table() {
            decor.push(i);
        } else if Some(e.id) == selected && selected_idx.is_none() {
            selected_idx = Some(i);
        } else {
            tables.push(i);
        }
    }

    decor.sort_by_key(|&i| entities[i].z_index);

    let mut order = decor;
    order.extend(tables);
    order.extend(selected_idx);
    order
}

/// Free-form hit test of a content-space point.
#[must_use]
pub fn hit_test_content(
    content: Point,
    entities: &[PositionedEntity],
    canvas: &Canvas,
    selected: Option<EntityId>,
    filter: HitFilter,
) -> Option<EntityId> {
    if !content.is_finite() {
        return None;
    }
    paint_order(entities, canvas, selected)
        .into_iter()
        .rev()
        .map(|i| &entities[i])
        .filter(|e| filter.admits(e))
        .find(|e| {
            e.geometry(canvas)
                .is_some_and(|g| g.contains(e.shape, content))
        })
        .map(|e| e.id)
}

/// Free-form hit test of a screen point under `transform`.
#[must_use]
pub fn hit_test(
    screen: Point,
    transform: &ViewportTransform,
    entities: &[PositionedEntity],
    canvas: &Canvas,
    selected: Option<EntityId>,
    filter: HitFilter,
) -> Option<EntityId> {
    let content = transform.to_content(screen, ZoomAxes::Both);
    hit_test_content(content, entities, canvas, selected, filter)
}

/// Row hit test of a screen point: the timeline counterpart of [`hit_test`].
#[must_use]
pub fn hit_test_rows(
    screen: Point,
    transform: &ViewportTransform,
    layout: &RowLayout,
) -> Option<EntityId> {
    layout.hit(screen, transform)
}

// ---------------------------------------------------------------------------
// Row layout (timeline)
// ---------------------------------------------------------------------------

/// Fixed-height rows, each bound to one entity (a table in the timeline).
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    ids: Vec<EntityId>,
    /// `prefix[i]` is the top of row `i`; `prefix[len]` is the total height.
    prefix: Vec<f64>,
    index: AHashMap<EntityId, usize>,
}

impl RowLayout {
    /// Build from `(entity, height)` pairs in display order. Rows with a
    /// non-positive or non-finite height are dropped; a repeated id keeps
    /// its first row.
    #[must_use]
    pub fn new(rows: impl IntoIterator<Item = (EntityId, f64)>) -> Self {
        let mut layout = Self {
            ids: Vec::new(),
            prefix: vec![0.0],
            index: AHashMap::new(),
        };
        let mut top = 0.0;
        for (id, height) in rows {
            if !(height > 0.0 && height.is_finite()) || layout.index.contains_key(&id) {
                continue;
            }
            layout.index.insert(id, layout.ids.len());
            layout.ids.push(id);
            top += height;
            layout.prefix.push(top);
        }
        layout
    }

    /// Uniform row height.
    #[must_use]
    pub fn uniform(ids: impl IntoIterator<Item = EntityId>, height: f64) -> Self {
        Self::new(ids.into_iter().map(|id| (id, height)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sum of all row heights.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.prefix.last().copied().unwrap_or(0.0)
    }

    /// Row index containing content `y` (top inclusive, bottom exclusive).
    #[must_use]
    pub fn row_at(&self, y: f64) -> Option<usize> {
        if !(y >= 0.0 && y < self.total_height()) {
            return None;
        }
        // First prefix strictly above y, minus one.
        let upper = self.prefix.partition_point(|&top| top <= y);
        upper.checked_sub(1).filter(|&row| row < self.ids.len())
    }

    /// Entity bound to row `row`.
    #[must_use]
    pub fn entity(&self, row: usize) -> Option<EntityId> {
        self.ids.get(row).copied()
    }

    /// Row index of `id`.
    #[must_use]
    pub fn row_of(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Vertical span `[top, bottom)` of a row.
    #[must_use]
    pub fn span(&self, row: usize) -> Option<(f64, f64)> {
        Some((*self.prefix.get(row)?, *self.prefix.get(row + 1)?))
    }

    /// Content-space box of a row given the timeline's content width.
    #[must_use]
    pub fn row_bounds(&self, row: usize, content_width: f64) -> Option<Bounds> {
        let (top, bottom) = self.span(row)?;
        Some(Bounds::new(0.0, top, content_width, bottom))
    }

    /// Row hit test of a content-space point; x is ignored.
    #[must_use]
    pub fn hit_content(&self, content: Point) -> Option<EntityId> {
        self.row_at(content.y).and_then(|row| self.entity(row))
    }

    /// Row hit test of a screen point. The y axis is not zoomed, so only
    /// the vertical translate applies.
    #[must_use]
    pub fn hit(&self, screen: Point, transform: &ViewportTransform) -> Option<EntityId> {
        self.hit_content(transform.to_content(screen, ZoomAxes::Horizontal))
    }

    /// Iterate `(row, entity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, EntityId)> + '_ {
        self.ids.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Shape;

    fn canvas() -> Canvas {
        Canvas::new(100.0, 100.0)
    }

    fn square(id: u64, x: f64, y: f64) -> PositionedEntity {
        PositionedEntity::table(id, Shape::Square, Point::new(x, y), 10.0, 10.0)
    }

    #[test]
    fn centre_hits() {
        let es = vec![square(1, 20.0, 20.0), square(2, 60.0, 60.0)];
        let t = ViewportTransform::IDENTITY;
        let hit = hit_test(Point::new(60.0, 60.0), &t, &es, &canvas(), None, HitFilter::All);
        assert_eq!(hit, Some(EntityId(2)));
    }

    #[test]
    fn miss_returns_none() {
        let es = vec![square(1, 20.0, 20.0)];
        let t = ViewportTransform::IDENTITY;
        assert_eq!(
            hit_test(Point::new(40.0, 40.0), &t, &es, &canvas(), None, HitFilter::All),
            None
        );
    }

    #[test]
    fn topmost_wins_on_overlap() {
        let es = vec![square(1, 50.0, 50.0), square(2, 52.0, 50.0)];
        let t = ViewportTransform::IDENTITY;
        let p = Point::new(51.0, 50.0);
        assert_eq!(
            hit_test(p, &t, &es, &canvas(), None, HitFilter::All),
            Some(EntityId(2))
        );
        // Selection paints last, so it also hit-tests first.
        assert_eq!(
            hit_test(p, &t, &es, &canvas(), Some(EntityId(1)), HitFilter::All),
            Some(EntityId(1))
        );
    }

    #[test]
    fn tables_only_skips_decor() {
        let wall = PositionedEntity::table(9, Shape::Wall, Point::new(50.0, 50.0), 80.0, 4.0)
            .with_z_index(5);
        let es = vec![wall];
        let t = ViewportTransform::IDENTITY;
        let p = Point::new(50.0, 50.0);
        assert_eq!(hit_test(p, &t, &es, &canvas(), None, HitFilter::TablesOnly), None);
        assert_eq!(
            hit_test(p, &t, &es, &canvas(), None, HitFilter::All),
            Some(EntityId(9))
        );
    }

    #[test]
    fn transform_is_applied() {
        let es = vec![square(1, 20.0, 20.0)];
        let t = ViewportTransform::new(2.0, 100.0, 50.0);
        // content (20,20) -> screen (140, 90)
        assert_eq!(
            hit_test(Point::new(140.0, 90.0), &t, &es, &canvas(), None, HitFilter::All),
            Some(EntityId(1))
        );
    }

    #[test]
    fn paint_order_layers() {
        let es = vec![
            square(1, 10.0, 10.0),
            PositionedEntity::table(2, Shape::Plant, Point::new(5.0, 5.0), 4.0, 4.0).with_z_index(3),
            square(3, 30.0, 30.0),
            PositionedEntity::table(4, Shape::Label, Point::new(5.0, 5.0), 4.0, 4.0).with_z_index(-1),
            square(5, 50.0, 50.0),
        ];
        let order = paint_order(&es, &canvas(), Some(EntityId(1)));
        let ids: Vec<u64> = order.iter().map(|&i| es[i].id.0).collect();
        assert_eq!(ids, vec![4, 2, 3, 5, 1]);
    }

    #[test]
    fn row_lookup_with_mixed_heights() {
        let rows = RowLayout::new([
            (EntityId(10), 40.0),
            (EntityId(11), 60.0),
            (EntityId(12), 40.0),
        ]);
        assert_eq!(rows.total_height(), 140.0);
        assert_eq!(rows.row_at(0.0), Some(0));
        assert_eq!(rows.row_at(39.9), Some(0));
        assert_eq!(rows.row_at(40.0), Some(1));
        assert_eq!(rows.row_at(99.0), Some(1));
        assert_eq!(rows.row_at(139.0), Some(2));
        assert_eq!(rows.row_at(140.0), None);
        assert_eq!(rows.row_at(-1.0), None);
        assert_eq!(rows.row_at(f64::NAN), None);
    }

    #[test]
    fn row_hit_ignores_x_and_uses_translate() {
        let rows = RowLayout::uniform([EntityId(1), EntityId(2)], 50.0);
        let t = ViewportTransform::new(2.5, -300.0, -30.0);
        // screen y 40 -> content 70 -> row 1
        assert_eq!(rows.hit(Point::new(-9999.0, 40.0), &t), Some(EntityId(2)));
        assert_eq!(rows.hit(Point::new(9999.0, 10.0), &t), Some(EntityId(1)));
    }

    #[test]
    fn bad_rows_are_dropped() {
        let rows = RowLayout::new([
            (EntityId(1), 0.0),
            (EntityId(2), f64::INFINITY),
            (EntityId(3), 20.0),
            (EntityId(3), 20.0),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.row_of(EntityId(3)), Some(0));
    }
}
