//! Drag-to-reassign on the timeline with background dispatch.
//!
//! The reassigner blocks on a barrier so each test can observe the
//! optimistic state while the call is still in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use seatmap_core::geometry::{Point, Size};
use seatmap_core::hit_test::RowLayout;
use seatmap_core::intent::{HapticKind, HostIntent};
use seatmap_core::EntityId;
use seatmap_runtime::config::SeatmapConfig;
use seatmap_runtime::drag::{DispatchMode, DragPhase, EndDrag, ReassignError, ReservationBar};
use seatmap_runtime::viewport::TimelineViewport;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::{Duration, Instant};

const ROW_H: f64 = 60.0;

fn bars() -> Vec<ReservationBar> {
    vec![
        ReservationBar {
            id: EntityId(900),
            row: EntityId(1),
            start_x: 100.0,
            end_x: 300.0,
        },
        ReservationBar {
            id: EntityId(901),
            row: EntityId(3),
            start_x: 400.0,
            end_x: 500.0,
        },
    ]
}

struct Harness {
    view: TimelineViewport,
    calls: Arc<AtomicUsize>,
    gate: Arc<Barrier>,
}

fn harness(result: Result<(), ReassignError>) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Barrier::new(2));
    let (c, g) = (Arc::clone(&calls), Arc::clone(&gate));
    let reassigner = move |_: EntityId, _: EntityId| -> Result<(), ReassignError> {
        c.fetch_add(1, Ordering::SeqCst);
        g.wait();
        result.clone()
    };
    let mut view = TimelineViewport::new(
        RowLayout::uniform((1..=6).map(EntityId), ROW_H),
        1_200.0,
        Arc::new(reassigner),
        DispatchMode::Background,
        &SeatmapConfig::default(),
    );
    view.mount(Size::new(600.0, 400.0), &bars());
    Harness { view, calls, gate }
}

/// Drag bar 900 from row 1 to the row under content y.
fn drag_to(view: &mut TimelineViewport, content_y: f64) -> EndDrag {
    let t = view.transform();
    let grab_rel = Point::new(200.0, ROW_H / 2.0);
    let grab_abs = Point::new(200.0 * t.scale + t.translate_x, grab_rel.y + t.translate_y);
    assert!(view.start_drag(&bars()[0], grab_abs, grab_rel));
    view.update_drag(Point::new(grab_abs.x, content_y + t.translate_y));
    view.end_drag()
}

/// Tick until the in-flight call lands.
fn settle(view: &mut TimelineViewport, bars: &[ReservationBar], start: Instant) -> Instant {
    let mut now = start;
    for _ in 0..500 {
        view.tick(now, bars);
        if view.drag().phase() != DragPhase::Committing {
            return now;
        }
        thread::sleep(std::time::Duration::from_millis(2));
        now += Duration::from_millis(2);
    }
    panic!("reassignment never completed");
}

#[test]
fn successful_move_is_optimistic_then_confirmed() {
    let Harness {
        mut view,
        calls,
        gate,
    } = harness(Ok(()));
    let b = bars();

    let end = drag_to(&mut view, 4.5 * ROW_H);
    assert_eq!(
        end,
        EndDrag::Committing {
            bar: EntityId(900),
            target: EntityId(5)
        }
    );
    // The call is blocked; the bar already shows in its new row.
    assert_eq!(view.displayed_row(&b[0]), EntityId(5));
    assert_eq!(view.drag().phase(), DragPhase::Committing);
    assert!(!view.start_drag(&b[1], Point::ORIGIN, Point::ORIGIN));

    gate.wait();
    settle(&mut view, &b, Instant::now());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(view.drag().phase(), DragPhase::Idle);
    assert_eq!(
        view.drain_intents(),
        vec![
            HostIntent::Haptic(HapticKind::Drop),
            HostIntent::DragCompleted {
                entity: EntityId(900),
                target: EntityId(5)
            },
        ]
    );

    // Host data catches up; the overlay entry goes away.
    let mut updated = b.clone();
    updated[0].row = EntityId(5);
    view.reconcile(&updated);
    assert!(view.drag().overlay().is_empty());
    assert_eq!(view.displayed_row(&updated[0]), EntityId(5));
}

#[test]
fn failed_move_rolls_back_and_shows_notice() {
    let Harness {
        mut view,
        calls,
        gate,
    } = harness(Err(ReassignError::Rejected("table is blocked".into())));
    let b = bars();

    drag_to(&mut view, 2.5 * ROW_H);
    assert_eq!(view.displayed_row(&b[0]), EntityId(3));

    gate.wait();
    let landed = settle(&mut view, &b, Instant::now());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(view.displayed_row(&b[0]), EntityId(1));
    assert_eq!(view.drag().phase(), DragPhase::RolledBack);
    let notice = view.drag().notice(landed).expect("error notice");
    assert!(notice.message.contains("table is blocked"));

    let intents = view.drain_intents();
    assert_eq!(intents.last(), Some(&HostIntent::Haptic(HapticKind::Error)));
    assert!(intents.iter().any(|i| matches!(
        i,
        HostIntent::ReassignFailed { entity: EntityId(900), .. }
    )));

    // Notice expires after four seconds; the controller is usable again.
    view.tick(landed + Duration::from_millis(4_000), &b);
    assert!(view.drag().notice(landed + Duration::from_millis(4_000)).is_none());
    assert_eq!(view.drag().phase(), DragPhase::Idle);
}

#[test]
fn drop_on_origin_row_never_calls() {
    let Harness { mut view, calls, .. } = harness(Ok(()));
    let end = drag_to(&mut view, 0.5 * ROW_H);
    assert_eq!(end, EndDrag::Unchanged);
    view.tick(Instant::now(), &bars());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(view.drain_intents().is_empty());
}

#[test]
fn drop_outside_rows_never_calls() {
    let Harness { mut view, calls, .. } = harness(Ok(()));
    let end = drag_to(&mut view, 50.0 * ROW_H);
    assert_eq!(end, EndDrag::Unchanged);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Log capture
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

#[test]
fn optimistic_move_is_logged() {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let reassigner = move |_: EntityId, _: EntityId| -> Result<(), ReassignError> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        let mut view = TimelineViewport::new(
            RowLayout::uniform((1..=6).map(EntityId), ROW_H),
            1_200.0,
            Arc::new(reassigner),
            DispatchMode::Inline,
            &SeatmapConfig::default(),
        );
        view.mount(Size::new(600.0, 400.0), &bars());
        drag_to(&mut view, 3.5 * ROW_H);
        view.tick(Instant::now(), &bars());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    });

    let events = capture.events.lock().unwrap();
    let moved = events
        .iter()
        .find(|e| {
            e.target == "seatmap.drag"
                && e.fields.get("message").map(String::as_str) == Some("optimistic reassignment")
        })
        .expect("optimistic reassignment event");
    assert_eq!(moved.fields.get("to").map(String::as_str), Some("#4"));
    assert!(events.iter().any(|e| {
        e.fields.get("message").map(String::as_str) == Some("reassignment confirmed")
    }));
}
