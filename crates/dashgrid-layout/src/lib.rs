#![forbid(unsafe_code)]

//! Layout primitives: slot order, projection, and flow placement.
//!
//! - [`SlotOrder`] is the Order Store. It keeps one [`TileId`] per slot in a
//!   dense `0..N-1` sequence and implements the reorder algorithm.
//! - [`LayoutProjector`] turns measured tile boxes into container-relative
//!   content boxes, gated by a trailing-edge [`Debouncer`].
//! - [`FlowGrid`] is a responsive column flow used by hosts that do not have
//!   a layout engine of their own.

pub mod debounce;
pub mod flow;
pub mod order;
pub mod projector;

pub use dashgrid_core::geometry::{Point, Rect, Size};
pub use dashgrid_core::tile::{Placement, TileId};
pub use debounce::{DebouncePhase, Debouncer};
pub use flow::FlowGrid;
pub use order::{MovedSlot, OrderError, SlotChange, SlotOrder};
pub use projector::{
    DEFAULT_PROJECTION_WINDOW, LayoutProjector, ProjectedBox, content_box,
    scroll_adjusted_origin,
};
