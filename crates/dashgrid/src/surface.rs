#![forbid(unsafe_code)]

//! Host seam: the container and its tiles as the engine sees them.
//!
//! A browser host implements [`DashboardSurface`] over DOM nodes (bounding
//! client rects, `style.order`, `classList`, a cloned proxy node); a native
//! host implements it over its own widget tree. The engine only ever talks
//! to the container through this trait.

use dashgrid_core::geometry::Rect;
use dashgrid_core::tile::{Placement, TileId};
use serde::{Deserialize, Serialize};

/// Snapshot of a tile's visual content, used to seed the drag proxy and to
/// build tiles inserted from a foreign source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileVisual {
    /// Classes on the tile root.
    pub classes: Vec<String>,
    /// Markup or text of the content node.
    pub content: String,
    /// Computed background of the content node, if any.
    pub background: Option<String>,
    /// Grid columns the tile spans.
    pub span: u16,
}

impl Default for TileVisual {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl TileVisual {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            classes: Vec::new(),
            content: content.into(),
            background: None,
            span: 1,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: u16) -> Self {
        self.span = span.max(1);
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class unless already present.
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

/// Initial tile rendered by the host before the controller attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub content: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default = "default_span")]
    pub span: u16,
}

fn default_span() -> u16 {
    1
}

impl TileDescriptor {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            classes: Vec::new(),
            span: 1,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: u16) -> Self {
        self.span = span;
        self
    }

    /// Visual for this descriptor, carrying `root_class` first.
    #[must_use]
    pub fn into_visual(self, root_class: &str) -> TileVisual {
        let mut visual = TileVisual::new(self.content).with_span(self.span);
        visual.add_class(root_class);
        for class in self.classes {
            visual.add_class(class);
        }
        visual
    }
}

/// The floating clone shown while a tile is dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyView {
    pub source: TileId,
    /// Client-space box of the proxy.
    pub rect: Rect,
    pub visual: TileVisual,
}

/// Operations the engine needs from its host container.
///
/// Rect queries return client coordinates. Queries for ids the host does not
/// know return `None`; mutations on unknown ids are ignored.
pub trait DashboardSurface {
    /// Bounding box of the container, `None` once it is unmounted.
    fn container_rect(&self) -> Option<Rect>;

    /// Vertical scroll offset of the container.
    fn scroll_top(&self) -> f64;

    /// Bounding box of a tile or foreign drag source.
    fn tile_rect(&self, tile: TileId) -> Option<Rect>;

    /// Visual snapshot of a tile or foreign drag source.
    fn tile_visual(&self, tile: TileId) -> Option<TileVisual>;

    /// Write a tile's flow slot (`style.order` in a browser).
    fn apply_slot(&mut self, tile: TileId, slot: usize);

    /// Write the container-relative box onto the tile's content node.
    fn set_content_box(&mut self, tile: TileId, rect: Rect);

    fn add_class(&mut self, tile: TileId, class: &str);

    fn remove_class(&mut self, tile: TileId, class: &str);

    /// Set (`Some`) or clear (`None`) a tile's opacity override.
    fn set_opacity(&mut self, tile: TileId, opacity: Option<f32>);

    fn show_proxy(&mut self, proxy: &ProxyView);

    fn move_proxy(&mut self, rect: Rect);

    fn hide_proxy(&mut self);

    /// Create and append a new tile inside the container.
    fn mount_tile(&mut self, visual: &TileVisual) -> TileId;

    /// Detach a tile from the container.
    fn unmount_tile(&mut self, tile: TileId);

    /// Swap a tile with its previous (`Before`) or next (`After`) sibling in
    /// mount (DOM) order. Slots are untouched. Returns the sibling, or `None`
    /// when the tile has no sibling on that side.
    fn swap_sibling(&mut self, tile: TileId, side: Placement) -> Option<TileId>;
}
