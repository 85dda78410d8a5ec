#![forbid(unsafe_code)]

//! Deterministic in-memory surface.
//!
//! [`MemorySurface`] lays its tiles out in slot order with a [`FlowGrid`],
//! the way a browser's flex-wrap container honours `style.order`, and records
//! every write the controller makes so tests and headless hosts can inspect
//! it. Foreign drag sources live beside the container and are never laid
//! out.
//!
//! The layout is computed on first query and reused until a slot, mount,
//! scroll or container change invalidates it.

use std::cell::{Cell, OnceCell};

use dashgrid_core::geometry::Rect;
use dashgrid_core::tile::{Placement, TileId};
use dashgrid_layout::FlowGrid;
use rustc_hash::FxHashMap;

use crate::surface::{DashboardSurface, ProxyView, TileDescriptor, TileVisual};

#[derive(Debug, Clone)]
struct MemoryTile {
    visual: TileVisual,
    slot: usize,
    content_box: Option<Rect>,
    opacity: Option<f32>,
}

#[derive(Debug, Clone)]
struct ForeignSource {
    rect: Rect,
    visual: TileVisual,
    opacity: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    container: Option<Rect>,
    scroll_top: f64,
    grid: FlowGrid,
    next_id: u64,
    tiles: FxHashMap<TileId, MemoryTile>,
    mount_order: Vec<TileId>,
    foreign: FxHashMap<TileId, ForeignSource>,
    proxy: Option<ProxyView>,
    layout: OnceCell<FxHashMap<TileId, Rect>>,
    layout_passes: Cell<u64>,
}

impl MemorySurface {
    #[must_use]
    pub fn new(container: Rect, grid: FlowGrid) -> Self {
        Self {
            container: Some(container),
            scroll_top: 0.0,
            grid,
            next_id: 1,
            tiles: FxHashMap::default(),
            mount_order: Vec::new(),
            foreign: FxHashMap::default(),
            proxy: None,
            layout: OnceCell::new(),
            layout_passes: Cell::new(0),
        }
    }

    /// Render initial tiles, each tagged with `root_class`.
    #[must_use]
    pub fn with_tiles<I>(mut self, tiles: I, root_class: &str) -> Self
    where
        I: IntoIterator<Item = TileDescriptor>,
    {
        for descriptor in tiles {
            let visual = descriptor.into_visual(root_class);
            self.mount_tile(&visual);
        }
        self
    }

    /// Place a foreign drag source (e.g. an item of a sibling dashboard).
    pub fn add_foreign(&mut self, rect: Rect, visual: TileVisual) -> TileId {
        let id = self.allocate();
        self.foreign.insert(
            id,
            ForeignSource {
                rect,
                visual,
                opacity: None,
            },
        );
        id
    }

    pub fn resize(&mut self, container: Rect) {
        self.container = Some(container);
        self.invalidate_layout();
    }

    pub fn scroll_to(&mut self, scroll_top: f64) {
        self.scroll_top = scroll_top.max(0.0);
        self.invalidate_layout();
    }

    /// Simulate the container being unmounted by the host.
    pub fn detach_container(&mut self) {
        self.container = None;
        self.invalidate_layout();
    }

    /// Tiles in mount (DOM) order.
    #[must_use]
    pub fn mounted(&self) -> &[TileId] {
        &self.mount_order
    }

    /// Mounted tiles sorted by their written slot.
    #[must_use]
    pub fn flow_order(&self) -> Vec<TileId> {
        let mut order: Vec<(usize, usize, TileId)> = self
            .mount_order
            .iter()
            .enumerate()
            .filter_map(|(dom, id)| self.tiles.get(id).map(|tile| (tile.slot, dom, *id)))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, _, id)| id).collect()
    }

    #[must_use]
    pub fn slot(&self, tile: TileId) -> Option<usize> {
        self.tiles.get(&tile).map(|t| t.slot)
    }

    #[must_use]
    pub fn content_box(&self, tile: TileId) -> Option<Rect> {
        self.tiles.get(&tile).and_then(|t| t.content_box)
    }

    #[must_use]
    pub fn opacity(&self, tile: TileId) -> Option<f32> {
        match self.tiles.get(&tile) {
            Some(t) => t.opacity,
            None => self.foreign.get(&tile).and_then(|f| f.opacity),
        }
    }

    #[must_use]
    pub fn has_class(&self, tile: TileId, class: &str) -> bool {
        self.tiles
            .get(&tile)
            .is_some_and(|t| t.visual.has_class(class))
    }

    #[must_use]
    pub fn visual(&self, tile: TileId) -> Option<&TileVisual> {
        self.tiles.get(&tile).map(|t| &t.visual)
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&ProxyView> {
        self.proxy.as_ref()
    }

    #[must_use]
    pub const fn grid(&self) -> &FlowGrid {
        &self.grid
    }

    /// How many times the flow layout has been computed.
    #[must_use]
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes.get()
    }

    fn allocate(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }

    fn invalidate_layout(&mut self) {
        self.layout = OnceCell::new();
    }

    fn layout(&self) -> &FxHashMap<TileId, Rect> {
        self.layout.get_or_init(|| self.compute_layout())
    }

    fn compute_layout(&self) -> FxHashMap<TileId, Rect> {
        self.layout_passes.set(self.layout_passes.get() + 1);
        let Some(container) = self.container else {
            return FxHashMap::default();
        };
        let order = self.flow_order();
        let spans: Vec<u16> = order
            .iter()
            .map(|id| self.tiles.get(id).map_or(1, |t| t.visual.span))
            .collect();
        let area = container.translate(0.0, -self.scroll_top);
        order
            .into_iter()
            .zip(self.grid.place(area, &spans))
            .collect()
    }
}

impl DashboardSurface for MemorySurface {
    fn container_rect(&self) -> Option<Rect> {
        self.container
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn tile_rect(&self, tile: TileId) -> Option<Rect> {
        if let Some(source) = self.foreign.get(&tile) {
            return Some(source.rect);
        }
        if !self.tiles.contains_key(&tile) {
            return None;
        }
        self.layout().get(&tile).copied()
    }

    fn tile_visual(&self, tile: TileId) -> Option<TileVisual> {
        self.tiles
            .get(&tile)
            .map(|t| t.visual.clone())
            .or_else(|| self.foreign.get(&tile).map(|source| source.visual.clone()))
    }

    fn apply_slot(&mut self, tile: TileId, slot: usize) {
        if let Some(t) = self.tiles.get_mut(&tile)
            && t.slot != slot
        {
            t.slot = slot;
            self.invalidate_layout();
        }
    }

    fn set_content_box(&mut self, tile: TileId, rect: Rect) {
        if let Some(t) = self.tiles.get_mut(&tile) {
            t.content_box = Some(rect);
        }
    }

    fn add_class(&mut self, tile: TileId, class: &str) {
        if let Some(t) = self.tiles.get_mut(&tile) {
            t.visual.add_class(class);
        }
    }

    fn remove_class(&mut self, tile: TileId, class: &str) {
        if let Some(t) = self.tiles.get_mut(&tile) {
            t.visual.remove_class(class);
        }
    }

    fn set_opacity(&mut self, tile: TileId, opacity: Option<f32>) {
        if let Some(t) = self.tiles.get_mut(&tile) {
            t.opacity = opacity;
        } else if let Some(source) = self.foreign.get_mut(&tile) {
            source.opacity = opacity;
        }
    }

    fn show_proxy(&mut self, proxy: &ProxyView) {
        self.proxy = Some(proxy.clone());
    }

    fn move_proxy(&mut self, rect: Rect) {
        if let Some(proxy) = self.proxy.as_mut() {
            proxy.rect = rect;
        }
    }

    fn hide_proxy(&mut self) {
        self.proxy = None;
    }

    fn mount_tile(&mut self, visual: &TileVisual) -> TileId {
        let id = self.allocate();
        let slot = self.tiles.len();
        self.tiles.insert(
            id,
            MemoryTile {
                visual: visual.clone(),
                slot,
                content_box: None,
                opacity: None,
            },
        );
        self.mount_order.push(id);
        self.invalidate_layout();
        id
    }

    fn unmount_tile(&mut self, tile: TileId) {
        if self.tiles.remove(&tile).is_some() {
            self.mount_order.retain(|id| *id != tile);
            self.invalidate_layout();
        }
    }

    fn swap_sibling(&mut self, tile: TileId, side: Placement) -> Option<TileId> {
        let index = self.mount_order.iter().position(|id| *id == tile)?;
        let other = match side {
            Placement::Before => index.checked_sub(1)?,
            Placement::After => index + 1,
        };
        let sibling = *self.mount_order.get(other)?;
        self.mount_order.swap(index, other);
        self.invalidate_layout();
        Some(sibling)
    }
}
