//! Property-based tests for free-form and row hit-testing.
//!
//! 1. **Center hits**: an entity's own center always hits it, for every
//!    shape, size and rotation.
//! 2. **Radius bound**: a point farther from the center than the half
//!    diagonal never hits, whatever the rotation.
//! 3. **Topmost wins**: of two identical, overlapping tables the one
//!    painted last is reported, and selection moves it on top.
//! 4. **Rows**: every y inside the layout maps to exactly the row whose
//!    span contains it.

use proptest::prelude::*;
use seatmap_core::entity::{EntityId, PositionedEntity, Shape};
use seatmap_core::geometry::{Canvas, Point};
use seatmap_core::hit_test::{HitFilter, RowLayout, hit_test, hit_test_content};
use seatmap_core::transform::ViewportTransform;

const SHAPES: [Shape; 11] = [
    Shape::Rectangle,
    Shape::Square,
    Shape::Circle,
    Shape::Oval,
    Shape::Bar,
    Shape::Wall,
    Shape::Divider,
    Shape::Column,
    Shape::Plant,
    Shape::Label,
    Shape::ZoneMarker,
];

fn shape() -> impl Strategy<Value = Shape> {
    (0..SHAPES.len()).prop_map(|i| SHAPES[i])
}

fn canvas() -> Canvas {
    Canvas::new(2_000.0, 1_500.0)
}

proptest! {
    #[test]
    fn center_always_hits(
        shape in shape(),
        px in 5.0..95.0f64,
        py in 5.0..95.0f64,
        w in 1.0..300.0f64,
        h in 1.0..300.0f64,
        rotation in -720.0..720.0f64,
    ) {
        let e = PositionedEntity::table(9, shape, Point::new(px, py), w, h).with_rotation(rotation);
        let center = canvas().resolve(e.center_percent);
        let hit = hit_test_content(center, &[e], &canvas(), None, HitFilter::All);
        prop_assert_eq!(hit, Some(EntityId(9)));
    }

    #[test]
    fn beyond_bounding_radius_never_hits(
        shape in shape(),
        w in 1.0..300.0f64,
        h in 1.0..300.0f64,
        rotation in 0.0..360.0f64,
        angle in 0.0..std::f64::consts::TAU,
        extra in 0.01..500.0f64,
    ) {
        let e = PositionedEntity::table(3, shape, Point::new(50.0, 50.0), w, h).with_rotation(rotation);
        let g = e.geometry(&canvas()).unwrap();
        let r = g.bounding_radius() + extra;
        let p = Point::new(g.center.x + r * angle.cos(), g.center.y + r * angle.sin());
        prop_assert_eq!(hit_test_content(p, &[e], &canvas(), None, HitFilter::All), None);
    }

    #[test]
    fn screen_hit_matches_content_hit(
        scale in 0.5..3.0f64,
        tx in -1_000.0..1_000.0f64,
        ty in -1_000.0..1_000.0f64,
        sx in 0.0..1_200.0f64,
        sy in 0.0..900.0f64,
    ) {
        let entities: Vec<_> = (0..12u32)
            .map(|i| {
                let x = 8.0 + f64::from(i % 4) * 28.0;
                let y = 15.0 + f64::from(i / 4) * 30.0;
                PositionedEntity::table(u64::from(i), Shape::Oval, Point::new(x, y), 180.0, 120.0)
                    .with_rotation(f64::from(i) * 17.0)
            })
            .collect();
        let t = ViewportTransform::new(scale, tx, ty);
        let screen = Point::new(sx, sy);
        let content = t.to_content(screen, seatmap_core::ZoomAxes::Both);
        prop_assert_eq!(
            hit_test(screen, &t, &entities, &canvas(), None, HitFilter::TablesOnly),
            hit_test_content(content, &entities, &canvas(), None, HitFilter::TablesOnly)
        );
    }

    #[test]
    fn topmost_of_overlapping_tables_wins(dx in -10.0..10.0f64, dy in -10.0..10.0f64) {
        let a = PositionedEntity::table(1, Shape::Square, Point::new(50.0, 50.0), 100.0, 100.0);
        let b = PositionedEntity::table(2, Shape::Square, Point::new(50.0, 50.0), 100.0, 100.0);
        let p = canvas().resolve(Point::new(50.0, 50.0)) + Point::new(dx, dy);
        let entities = [a, b];
        prop_assert_eq!(
            hit_test_content(p, &entities, &canvas(), None, HitFilter::TablesOnly),
            Some(EntityId(2))
        );
        prop_assert_eq!(
            hit_test_content(p, &entities, &canvas(), Some(EntityId(1)), HitFilter::TablesOnly),
            Some(EntityId(1))
        );
    }

    #[test]
    fn row_lookup_matches_spans(
        heights in prop::collection::vec(4.0..120.0f64, 1..60),
        frac in 0.0..0.999f64,
    ) {
        let layout = RowLayout::new(heights.iter().enumerate().map(|(i, h)| (EntityId(i as u64), *h)));
        let y = frac * layout.total_height();
        let row = layout.row_at(y);
        prop_assert!(row.is_some());
        let row = row.unwrap();
        let (top, bottom) = layout.span(row).unwrap();
        prop_assert!(top <= y && y < bottom, "{y} not in [{top}, {bottom})");
        prop_assert_eq!(layout.hit_content(Point::new(0.0, y)), layout.entity(row));
    }
}
