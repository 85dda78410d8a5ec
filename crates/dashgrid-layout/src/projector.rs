#![forbid(unsafe_code)]

//! Layout Projector: measured tile boxes to container-relative content boxes.
//!
//! A projection pass reads each tile's bounding box (as laid out by the host
//! from the current slot order) and expresses it relative to the container's
//! scroll-adjusted origin. Hosts write the result onto each tile's content
//! node as `left/top/width/height`, which is what drives the flip animation.
//! The projector never reads or writes slots.

use dashgrid_core::geometry::{Point, Rect};
use dashgrid_core::tile::TileId;
use web_time::{Duration, Instant};

use crate::debounce::Debouncer;

/// Default coalescing window for projection passes.
pub const DEFAULT_PROJECTION_WINDOW: Duration = Duration::from_millis(250);

/// Origin that content boxes are expressed against.
///
/// The container's top edge moves up as it scrolls, so the scroll offset is
/// added back to keep content boxes in the container's scrollable space.
#[inline]
#[must_use]
pub fn scroll_adjusted_origin(container: Rect, scroll_top: f64) -> Point {
    Point::new(container.left(), container.top() - scroll_top)
}

/// Content box for one tile.
#[inline]
#[must_use]
pub fn content_box(tile_rect: Rect, origin: Point) -> Rect {
    tile_rect.relative_to(origin)
}

/// One projected content box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBox {
    pub tile: TileId,
    pub rect: Rect,
}

/// Debounced projection scheduler plus the projection math.
#[derive(Debug, Clone)]
pub struct LayoutProjector {
    debouncer: Debouncer,
    passes: u64,
}

impl Default for LayoutProjector {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECTION_WINDOW)
    }
}

impl LayoutProjector {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            passes: 0,
        }
    }

    /// Request a pass. Returns `true` if this opened a new window.
    pub fn request(&mut self, now: Instant) -> bool {
        let opened = self.debouncer.request(now);
        if opened {
            tracing::trace!(
                message = "dashgrid.projector.scheduled",
                window_ms = self.debouncer.window().as_millis() as u64
            );
        }
        opened
    }

    /// Whether a pass should run now. When this returns `true` the caller
    /// must run the pass and then call [`finish`](Self::finish).
    pub fn due(&mut self, now: Instant) -> bool {
        self.debouncer.poll(now)
    }

    /// Close the running pass.
    pub fn finish(&mut self, now: Instant) {
        self.debouncer.complete(now);
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Completed projection passes.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    pub fn reset(&mut self) {
        self.debouncer.reset();
    }

    /// Compute content boxes for measured tiles.
    pub fn project<I>(&mut self, container: Rect, scroll_top: f64, tiles: I) -> Vec<ProjectedBox>
    where
        I: IntoIterator<Item = (TileId, Rect)>,
    {
        let origin = scroll_adjusted_origin(container, scroll_top);
        let boxes: Vec<ProjectedBox> = tiles
            .into_iter()
            .map(|(tile, rect)| ProjectedBox {
                tile,
                rect: content_box(rect, origin),
            })
            .collect();
        self.passes = self.passes.saturating_add(1);
        tracing::debug!(
            message = "dashgrid.projector.pass",
            pass = self.passes,
            tiles = boxes.len(),
            scroll_top
        );
        boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_box_is_relative_to_scrolled_container() {
        let container = Rect::new(40.0, 100.0, 800.0, 600.0);
        // Scrolled by 30px: the tile at client y=90 sits 20px into the content.
        let tile = Rect::new(60.0, 90.0, 200.0, 120.0);
        let origin = scroll_adjusted_origin(container, 30.0);
        assert_eq!(origin, Point::new(40.0, 70.0));
        assert_eq!(content_box(tile, origin), Rect::new(20.0, 20.0, 200.0, 120.0));
    }

    #[test]
    fn project_counts_passes_and_keeps_input_order() {
        let mut projector = LayoutProjector::default();
        let container = Rect::new(0.0, 0.0, 400.0, 400.0);
        let boxes = projector.project(
            container,
            0.0,
            [
                (TileId(2), Rect::new(100.0, 0.0, 100.0, 100.0)),
                (TileId(1), Rect::new(0.0, 0.0, 100.0, 100.0)),
            ],
        );
        assert_eq!(projector.passes(), 1);
        assert_eq!(boxes[0].tile, TileId(2));
        assert_eq!(boxes[0].rect.x, 100.0);
    }

    #[test]
    fn due_follows_the_debounce_window() {
        let mut projector = LayoutProjector::default();
        let t = Instant::now();
        assert!(projector.request(t));
        assert!(!projector.request(t + Duration::from_millis(100)));
        assert!(!projector.due(t + Duration::from_millis(100)));
        assert!(projector.due(t + DEFAULT_PROJECTION_WINDOW));
        projector.finish(t + DEFAULT_PROJECTION_WINDOW);
        assert!(!projector.is_pending());
    }
}
