//! Controller lifecycle: binding, debounced projection, precondition
//! failures and teardown.

use std::sync::{Arc, Mutex};

use dashgrid::{
    ClassNames, DashboardConfig, DashboardController, DashboardError, DashboardMode, FlowGrid,
    MemorySurface, MovedSlot, OrderError, Placement, Point, PointerEvent, Rect, TileDescriptor, TileId,
};
use pretty_assertions::assert_eq;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use web_time::{Duration, Instant};

const WINDOW: Duration = Duration::from_millis(250);

fn surface(container: Rect, n: usize) -> MemorySurface {
    MemorySurface::new(container, FlowGrid::new(100.0, 100.0, 0.0)).with_tiles(
        (0..n).map(|i| TileDescriptor::new(format!("widget {i}"))),
        "dashboard-item",
    )
}

fn bound(n: usize, now: Instant) -> (DashboardController<MemorySurface>, Vec<TileId>) {
    let surface = surface(Rect::new(0.0, 0.0, 400.0, 300.0), n);
    let tiles = surface.mounted().to_vec();
    let mut controller = DashboardController::default();
    controller.initialize(surface, ClassNames::default());
    for &tile in &tiles {
        controller.add_tile(tile, now).expect("tile registers");
    }
    (controller, tiles)
}

#[derive(Debug, Default, Clone, PartialEq)]
struct CapturedEvent {
    level: String,
    message: Option<String>,
    operation: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        #[derive(Default)]
        struct Visitor {
            message: Option<String>,
            operation: Option<String>,
        }

        impl tracing::field::Visit for Visitor {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                match field.name() {
                    "message" => self.message = Some(value.to_owned()),
                    "operation" => self.operation = Some(value.to_owned()),
                    _ => {}
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                let rendered = format!("{value:?}").trim_matches('"').to_owned();
                match field.name() {
                    "message" => self.message = Some(rendered),
                    "operation" => self.operation = Some(rendered),
                    _ => {}
                }
            }
        }

        let mut visitor = Visitor::default();
        event.record(&mut visitor);
        self.events
            .lock()
            .expect("capture lock")
            .push(CapturedEvent {
                level: event.metadata().level().to_string(),
                message: visitor.message,
                operation: visitor.operation,
            });
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<CapturedEvent>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: Arc::clone(&events),
    });
    let out = {
        let _guard = tracing::subscriber::set_default(subscriber);
        tracing::callsite::rebuild_interest_cache();
        f()
    };
    let events = events.lock().expect("capture lock").clone();
    (out, events)
}

#[test]
fn burst_of_position_requests_runs_one_pass() {
    let t0 = Instant::now();
    let (mut controller, _) = bound(3, t0);
    assert!(controller.tick(t0 + WINDOW).expect("container present"));
    assert_eq!(controller.projection_count(), 1);

    let t1 = t0 + Duration::from_secs(2);
    assert!(controller.set_elements_position(t1).expect("container present"));
    for ms in [1, 20, 90, 180, 249] {
        assert!(
            !controller
                .set_elements_position(t1 + Duration::from_millis(ms))
                .expect("container present")
        );
    }
    assert_eq!(controller.next_deadline(), Some(t1 + WINDOW));

    assert!(!controller.tick(t1 + Duration::from_millis(249)).expect("ok"));
    assert!(controller.tick(t1 + WINDOW).expect("ok"));
    assert!(!controller.tick(t1 + Duration::from_secs(10)).expect("ok"));
    assert_eq!(controller.projection_count(), 2);
}

#[test]
fn content_boxes_are_container_relative() {
    let t0 = Instant::now();
    let surface = surface(Rect::new(40.0, 100.0, 400.0, 300.0), 5);
    let tiles = surface.mounted().to_vec();
    let mut controller = DashboardController::default();
    controller.initialize(surface, ClassNames::default());
    for &tile in &tiles {
        controller.add_tile(tile, t0).expect("tile registers");
    }
    controller
        .surface_mut()
        .expect("bound")
        .scroll_to(30.0);
    controller.tick(t0 + WINDOW).expect("container present");

    let surface = controller.surface().expect("bound");
    assert_eq!(
        surface.content_box(tiles[0]),
        Some(Rect::new(0.0, 0.0, 100.0, 100.0))
    );
    assert_eq!(
        surface.content_box(tiles[4]),
        Some(Rect::new(0.0, 100.0, 100.0, 100.0))
    );
}

#[test]
fn public_order_reorders_and_schedules_layout() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(5, t0);
    controller.tick(t0 + WINDOW).expect("ok");

    let t1 = t0 + Duration::from_secs(1);
    let changes = controller
        .order(1, 3, Placement::Before, t1)
        .expect("valid slots");
    assert_eq!(changes.len(), 3);
    assert_eq!(controller.slots(), &[t[0], t[3], t[1], t[2], t[4]]);
    assert_eq!(controller.next_deadline(), Some(t1 + WINDOW));

    let surface = controller.surface().expect("bound");
    assert_eq!(surface.flow_order(), controller.slots().to_vec());
}

#[test]
fn order_onto_own_slot_is_a_noop() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(3, t0);
    controller.tick(t0 + WINDOW).expect("ok");
    let changes = controller
        .order(1, 1, Placement::After, t0 + Duration::from_secs(1))
        .expect("valid");
    assert!(changes.is_empty());
    assert_eq!(controller.next_deadline(), None);
    assert_eq!(controller.slots(), t.as_slice());
}

#[test]
fn out_of_range_order_is_rejected_without_mutation() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(3, t0);
    let err = controller
        .order(0, 7, Placement::Before, t0)
        .expect_err("slot 7 does not exist");
    assert_eq!(
        err,
        DashboardError::Order(OrderError::SlotOutOfRange { slot: 7, len: 3 })
    );
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(controller.slots(), t.as_slice());
}

#[test]
fn front_insert_slots_a_mounted_tile() {
    let t0 = Instant::now();
    let surface = surface(Rect::new(0.0, 0.0, 400.0, 300.0), 4);
    let t = surface.mounted().to_vec();
    let mut controller = DashboardController::default();
    controller.initialize(surface, ClassNames::default());
    for &tile in &t[..3] {
        controller.add_tile(tile, t0).expect("tile registers");
    }
    controller.tick(t0 + WINDOW).expect("ok");

    let t1 = t0 + Duration::from_secs(1);
    controller
        .order(0, MovedSlot::Front(t[3]), Placement::After, t1)
        .expect("mounted tile enters the order");
    assert_eq!(controller.slots(), &[t[0], t[3], t[1], t[2]]);
    assert_eq!(controller.next_deadline(), Some(t1 + WINDOW));
    let surface = controller.surface().expect("bound");
    assert_eq!(surface.flow_order(), controller.slots().to_vec());
}

#[test]
fn front_insert_rejects_tiles_the_surface_lacks() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(3, t0);
    assert_eq!(
        controller.order(0, MovedSlot::Front(TileId(999)), Placement::After, t0),
        Err(DashboardError::UnknownTile(TileId(999)))
    );
    assert_eq!(
        controller.order(0, MovedSlot::Front(t[2]), Placement::Before, t0),
        Err(DashboardError::Order(OrderError::DuplicateTile(t[2])))
    );
    assert_eq!(controller.slots(), t.as_slice());
    let surface = controller.surface().expect("bound");
    assert_eq!(surface.flow_order(), controller.slots().to_vec());
}

#[test]
fn registration_errors() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(2, t0);
    assert_eq!(
        controller.add_tile(t[0], t0),
        Err(DashboardError::AlreadyRegistered(t[0]))
    );
    assert_eq!(
        controller.add_tile(TileId(999), t0),
        Err(DashboardError::UnknownTile(TileId(999)))
    );
    assert_eq!(
        controller.arm_foreign(t[1]),
        Err(DashboardError::AlreadyRegistered(t[1]))
    );
}

#[test]
fn missing_container_logs_and_aborts() {
    let (result, events) = capture(|| {
        let mut controller: DashboardController<MemorySurface> = DashboardController::default();
        controller.set_elements_position(Instant::now())
    });
    assert_eq!(
        result,
        Err(DashboardError::ContainerMissing {
            operation: "set_elements_position"
        })
    );
    let errors: Vec<&CapturedEvent> = events.iter().filter(|e| e.level == "ERROR").collect();
    assert_eq!(errors.len(), 1, "events: {events:?}");
    assert_eq!(
        errors[0].message.as_deref(),
        Some("dashgrid.controller.container_missing")
    );
    assert_eq!(errors[0].operation.as_deref(), Some("set_elements_position"));
}

#[test]
fn detached_container_blocks_mutations() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(3, t0);
    controller
        .surface_mut()
        .expect("bound")
        .detach_container();

    assert_eq!(
        controller.order(0, 2, Placement::After, t0),
        Err(DashboardError::ContainerMissing { operation: "order" })
    );
    assert_eq!(controller.slots(), t.as_slice());
    assert!(matches!(
        controller.handle_pointer(&PointerEvent::down(50.0, 50.0), t0),
        Err(DashboardError::ContainerMissing { .. })
    ));
}

#[test]
fn due_pass_without_container_reports_and_recovers() {
    let t0 = Instant::now();
    let (mut controller, _) = bound(2, t0);
    controller
        .surface_mut()
        .expect("bound")
        .detach_container();
    assert!(controller.tick(t0 + WINDOW).is_err());
    assert_eq!(controller.projection_count(), 0);
    // The busy window closed, so nothing is left pending.
    assert_eq!(controller.tick(t0 + WINDOW * 2), Ok(false));
}

#[test]
fn destroy_is_idempotent() {
    let t0 = Instant::now();
    let (mut controller, _) = bound(3, t0);

    let (released, events) = capture(|| controller.destroy());
    assert!(released.is_some());
    assert!(
        events
            .iter()
            .any(|e| e.message.as_deref() == Some("dashgrid.controller.destroyed"))
    );

    let (again, events) = capture(|| controller.destroy());
    assert!(again.is_none());
    assert!(events.is_empty());

    assert!(!controller.is_initialized());
    assert!(controller.slots().is_empty());
    assert_eq!(controller.next_deadline(), None);
    assert!(matches!(
        controller.add_tile(TileId(1), t0),
        Err(DashboardError::ContainerMissing { operation: "add_tile" })
    ));
}

#[test]
fn destroy_mid_drag_cleans_the_surface() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(4, t0);
    controller
        .handle_pointer(&PointerEvent::down(350.0, 50.0), t0)
        .expect("ok");
    controller
        .handle_pointer(&PointerEvent::moved(125.0, 50.0), t0)
        .expect("ok");

    let surface = controller.destroy().expect("was bound");
    assert!(surface.proxy().is_none());
    assert_eq!(surface.opacity(t[3]), None);
    assert!(!surface.has_class(t[1], "dashboard-item-left"));
    assert!(!controller.is_dragging());
}

#[test]
fn release_after_container_loss_still_clears_the_proxy() {
    let t0 = Instant::now();
    let (mut controller, t) = bound(4, t0);
    controller
        .handle_pointer(&PointerEvent::down(350.0, 50.0), t0)
        .expect("ok");
    controller
        .handle_pointer(&PointerEvent::moved(125.0, 50.0), t0)
        .expect("ok");
    controller
        .surface_mut()
        .expect("bound")
        .detach_container();

    assert_eq!(
        controller.handle_pointer(&PointerEvent::up(125.0, 50.0), t0),
        Err(DashboardError::ContainerMissing {
            operation: "pointer_up"
        })
    );
    assert!(!controller.is_dragging());
    assert_eq!(controller.slots(), t.as_slice());
    {
        let surface = controller.surface().expect("bound");
        assert!(surface.proxy().is_none());
        assert_eq!(surface.opacity(t[3]), None);
        assert!(!surface.has_class(t[1], "dashboard-item-left"));
    }

    controller
        .surface_mut()
        .expect("bound")
        .resize(Rect::new(0.0, 0.0, 400.0, 300.0));
    let surface = controller.destroy().expect("was bound");
    assert!(surface.proxy().is_none());
    assert_eq!(surface.opacity(t[3]), None);
}

#[test]
fn reinitialize_starts_from_scratch() {
    let t0 = Instant::now();
    let (mut controller, _) = bound(3, t0);
    let fresh = surface(Rect::new(0.0, 0.0, 200.0, 200.0), 1);
    let only = fresh.mounted()[0];
    controller.initialize(fresh, ClassNames::default());
    assert!(controller.slots().is_empty());
    assert_eq!(controller.add_tile(only, t0), Ok(0));
}

#[test]
fn hover_mode_follows_the_pointer() {
    let t0 = Instant::now();
    let (mut controller, _) = bound(1, t0);
    controller.tick(t0 + WINDOW).expect("ok");

    let t1 = t0 + Duration::from_secs(1);
    assert_eq!(
        controller.update_hover_mode(Point::new(10.0, 10.0), t1),
        Ok(Some(DashboardMode::Expanded))
    );
    assert_eq!(controller.next_deadline(), Some(t1 + WINDOW));
    assert_eq!(
        controller.update_hover_mode(Point::new(20.0, 20.0), t1),
        Ok(None)
    );

    assert_eq!(controller.set_mode(DashboardMode::FullScreen, t1), Ok(true));
    assert_eq!(
        controller.update_hover_mode(Point::new(900.0, 900.0), t1),
        Ok(None)
    );
    assert_eq!(controller.mode(), DashboardMode::FullScreen);
}

#[test]
fn hover_helpers() {
    let t0 = Instant::now();
    let (controller, t) = bound(2, t0);
    assert!(controller.is_hovering_tile(t[1], 150.0, 50.0));
    assert!(!controller.is_hovering_tile(t[1], 50.0, 50.0));
    assert!(controller.is_hovering_container(400.0, 300.0));
    assert!(!controller.is_hovering_container(401.0, 300.0));
    assert!(dashgrid::is_hovering(Rect::new(0.0, 0.0, 10.0, 10.0), 10.0, 0.0));
}

#[test]
fn invalid_config_is_rejected() {
    let config = DashboardConfig::default().with_dim_opacity(2.0);
    assert!(DashboardController::<MemorySurface>::new(config).is_err());
}
