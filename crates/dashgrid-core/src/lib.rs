#![forbid(unsafe_code)]

//! Core: geometry, tile identity, and pointer events.
//!
//! # Role in dashgrid
//! `dashgrid-core` is the vocabulary layer. It owns the coordinate types used
//! for hit-testing and projection, the opaque [`TileId`] handle a host uses to
//! name its tile elements, and the normalized [`PointerEvent`] values the
//! controller consumes.
//!
//! # How it fits in the system
//! `dashgrid-layout` builds the slot order and projection math on these
//! types; `dashgrid` wires them into the drag controller and host surface.

pub mod event;
pub mod geometry;
pub mod tile;

pub use event::{PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Point, Rect, Size, is_hovering};
pub use tile::{Placement, PlacementParseError, TileId};
