#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A point in host (client) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise offset from `origin` to `self`.
    #[inline]
    pub fn delta_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }

    /// Squared euclidean distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Point) -> f64 {
        let (dx, dy) = self.delta_from(other);
        dx * dx + dy * dy
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned bounding box, as reported by a host layout engine.
///
/// Uses client coordinates (origin at top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle, edges included on all sides.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    /// Check if a point falls in the left half. The vertical center line
    /// belongs to the left half.
    #[inline]
    pub fn left_half_contains(&self, x: f64, y: f64) -> bool {
        x >= self.left()
            && x <= self.right() - self.width / 2.0
            && y >= self.top()
            && y <= self.bottom()
    }

    /// Check if a point falls in the right half.
    #[inline]
    pub fn right_half_contains(&self, x: f64, y: f64) -> bool {
        x >= self.left() + self.width / 2.0
            && x <= self.right()
            && y >= self.top()
            && y <= self.bottom()
    }

    /// Move the rectangle by the given offset, keeping its size.
    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Express this rectangle relative to `origin`.
    #[inline]
    #[must_use]
    pub fn relative_to(&self, origin: Point) -> Rect {
        self.translate(-origin.x, -origin.y)
    }
}

/// Geometric hit-test: whether `(x, y)` lies within `rect`, edges included.
///
/// Hosts reuse this for hover-state switching on the container itself.
#[inline]
pub fn is_hovering(rect: Rect, x: f64, y: f64) -> bool {
    rect.contains(x, y)
}
