#![forbid(unsafe_code)]

//! Drag-and-drop reordering engine for widget dashboards.
//!
//! The crate is headless: a host implements [`DashboardSurface`] over its
//! container and tiles, feeds pointer events and a clock into a
//! [`DashboardController`], and renders what the controller writes back
//! (slots, content boxes, indicator classes, the drag proxy).
//!
//! # Example
//!
//! ```
//! use dashgrid::{
//!     ClassNames, DashboardController, FlowGrid, MemorySurface, PointerEvent, Rect,
//!     TileDescriptor,
//! };
//! use web_time::Instant;
//!
//! let surface = MemorySurface::new(Rect::new(0.0, 0.0, 400.0, 300.0), FlowGrid::new(100.0, 100.0, 0.0))
//!     .with_tiles((0..4).map(|i| TileDescriptor::new(format!("widget {i}"))), "dashboard-item");
//! let tiles = surface.mounted().to_vec();
//!
//! let mut controller = DashboardController::default();
//! controller.initialize(surface, ClassNames::default());
//! let now = Instant::now();
//! for &tile in &tiles {
//!     controller.add_tile(tile, now).unwrap();
//! }
//!
//! // Drag the last tile onto the left half of the second one.
//! controller.handle_pointer(&PointerEvent::down(350.0, 50.0), now).unwrap();
//! controller.handle_pointer(&PointerEvent::moved(120.0, 50.0), now).unwrap();
//! controller.handle_pointer(&PointerEvent::up(120.0, 50.0), now).unwrap();
//!
//! assert_eq!(controller.slots(), &[tiles[0], tiles[3], tiles[1], tiles[2]]);
//! ```

pub mod config;
pub mod controller;
pub mod drag;
pub mod memory;
pub mod mode;
pub mod surface;

pub use config::{ClassNames, ConfigError, DashboardConfig};
pub use controller::{DashboardController, DashboardError};
pub use drag::{
    DragCandidate, DragEffect, DragNoopReason, DragPhase, DragProxy, DragResolution, DragSession,
    DragSource, DragState, DragTransition, DropPlan, HoverTarget, plan_drop,
};
pub use memory::MemorySurface;
pub use mode::{DashboardMode, HoverModeTracker};
pub use surface::{DashboardSurface, ProxyView, TileDescriptor, TileVisual};

pub use dashgrid_core::{
    Placement, Point, PointerButton, PointerEvent, PointerEventKind, Rect, Size, TileId,
    is_hovering,
};
pub use dashgrid_layout::{FlowGrid, MovedSlot, OrderError, SlotChange, SlotOrder};
