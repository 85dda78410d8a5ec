#![forbid(unsafe_code)]

//! Dashboard controller: one container, its slot order, the debounced layout
//! projector and the active drag session.
//!
//! Every operation that needs the container fails with
//! [`DashboardError::ContainerMissing`] (logged at `error`) and changes
//! nothing when no surface is bound or the surface reports no container.
//!
//! Time is supplied by the host. Projection requests coalesce in a trailing
//! window; the host calls [`DashboardController::tick`] from its event loop
//! (or wakes at [`DashboardController::next_deadline`]) to run due passes.

use std::fmt;

use dashgrid_core::event::{PointerButton, PointerEvent, PointerEventKind};
use dashgrid_core::geometry::{Point, Rect, is_hovering};
use dashgrid_core::tile::{Placement, TileId};
use dashgrid_layout::{LayoutProjector, MovedSlot, OrderError, SlotChange, SlotOrder};
use rustc_hash::FxHashSet;
use web_time::Instant;

use crate::config::{ClassNames, ConfigError, DashboardConfig};
use crate::drag::{
    DragCandidate, DragEffect, DragProxy, DragResolution, DragSeed, DragSession, DragSource,
    DropPlan, HoverTarget, inserted_visual, plan_drop, proxy_visual,
};
use crate::mode::{DashboardMode, HoverModeTracker};
use crate::surface::DashboardSurface;

/// Controller errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// No container is bound (before `initialize`, after `destroy`, or the
    /// host unmounted it).
    ContainerMissing { operation: &'static str },
    Order(OrderError),
    UnknownTile(TileId),
    AlreadyRegistered(TileId),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerMissing { operation } => {
                write!(f, "{operation}: container is not defined")
            }
            Self::Order(error) => write!(f, "slot order rejected the operation: {error}"),
            Self::UnknownTile(tile) => write!(f, "{tile} is not known to the surface"),
            Self::AlreadyRegistered(tile) => write!(f, "{tile} is already registered"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Order(error) = self {
            return Some(error);
        }
        None
    }
}

impl From<OrderError> for DashboardError {
    fn from(error: OrderError) -> Self {
        Self::Order(error)
    }
}

pub struct DashboardController<S: DashboardSurface> {
    config: DashboardConfig,
    surface: Option<S>,
    store: SlotOrder,
    foreign: FxHashSet<TileId>,
    projector: LayoutProjector,
    session: DragSession,
    hover: HoverModeTracker,
}

impl<S: DashboardSurface> Default for DashboardController<S> {
    fn default() -> Self {
        Self::with_valid_config(DashboardConfig::default())
    }
}

impl<S: DashboardSurface> fmt::Debug for DashboardController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardController")
            .field("bound", &self.surface.is_some())
            .field("slots", &self.store.tiles())
            .field("foreign", &self.foreign.len())
            .field("phase", &self.session.phase())
            .field("mode", &self.hover.mode())
            .field("passes", &self.projector.passes())
            .finish()
    }
}

impl<S: DashboardSurface> DashboardController<S> {
    /// Unbound controller with a validated config.
    pub fn new(config: DashboardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: DashboardConfig) -> Self {
        Self {
            projector: LayoutProjector::new(config.projection_window()),
            session: DragSession::new(config.drag_threshold),
            config,
            surface: None,
            store: SlotOrder::new(),
            foreign: FxHashSet::default(),
            hover: HoverModeTracker::default(),
        }
    }

    /// Bind the controller to a container and its class vocabulary.
    ///
    /// Rebinding drops all state held for the previous container.
    pub fn initialize(&mut self, surface: S, class_names: ClassNames) {
        if self.surface.is_some() {
            self.reset_state();
        }
        self.config.class_names = class_names;
        tracing::info!(
            message = "dashgrid.controller.initialized",
            root = self.config.class_names.root.as_str(),
            has_container = surface.container_rect().is_some()
        );
        self.surface = Some(surface);
    }

    /// Release the surface and every reference to it. Idempotent: the second
    /// call returns `None` and logs nothing.
    pub fn destroy(&mut self) -> Option<S> {
        let mut surface = self.surface.take()?;
        if let Some(source) = self.session.source() {
            clear_drag_visuals(&mut surface, source, &self.store, &self.config.class_names);
        }
        tracing::info!(
            message = "dashgrid.controller.destroyed",
            root = self.config.class_names.root.as_str(),
            tiles = self.store.len()
        );
        self.reset_state();
        Some(surface)
    }

    fn reset_state(&mut self) {
        self.store = SlotOrder::new();
        self.foreign.clear();
        self.projector.reset();
        self.session.reset();
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Tiles in slot order: the ordered position list.
    #[must_use]
    pub fn slots(&self) -> &[TileId] {
        self.store.tiles()
    }

    #[must_use]
    pub fn slot_of(&self, tile: TileId) -> Option<usize> {
        self.store.slot_of(tile)
    }

    #[must_use]
    pub const fn session(&self) -> &DragSession {
        &self.session
    }

    /// Whether a drag is in progress. Hosts should hold external mutations
    /// while this is true.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.session.is_active()
    }

    #[must_use]
    pub const fn mode(&self) -> DashboardMode {
        self.hover.mode()
    }

    /// Completed layout projection passes.
    #[must_use]
    pub const fn projection_count(&self) -> u64 {
        self.projector.passes()
    }

    /// When the pending projection window closes.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.projector.next_deadline()
    }

    /// Register a tile: assign the next slot, make it draggable and schedule
    /// a layout pass. Returns the assigned slot.
    pub fn add_tile(&mut self, tile: TileId, now: Instant) -> Result<usize, DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "add_tile")?;
        if self.store.contains(tile) {
            tracing::warn!(message = "dashgrid.controller.already_registered", tile = tile.get());
            return Err(DashboardError::AlreadyRegistered(tile));
        }
        if surface.tile_visual(tile).is_none() {
            tracing::warn!(message = "dashgrid.controller.unknown_tile", tile = tile.get());
            return Err(DashboardError::UnknownTile(tile));
        }
        let slot = self.store.push(tile)?;
        surface.apply_slot(tile, slot);
        self.foreign.remove(&tile);
        tracing::debug!(message = "dashgrid.controller.tile_added", tile = tile.get(), slot);
        self.projector.request(now);
        Ok(slot)
    }

    /// Unregister and unmount a tile, re-densifying the slots behind it.
    /// Returns the freed slot.
    pub fn remove_tile(&mut self, tile: TileId, now: Instant) -> Result<usize, DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "remove_tile")?;
        let (slot, changes) = self.store.remove(tile).map_err(|error| {
            tracing::warn!(message = "dashgrid.controller.remove_rejected", %error);
            DashboardError::from(error)
        })?;
        apply_changes(surface, &changes);
        surface.unmount_tile(tile);
        self.projector.request(now);
        Ok(slot)
    }

    /// Make an element outside the tile set draggable into this container.
    pub fn arm_foreign(&mut self, source: TileId) -> Result<(), DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "arm_foreign")?;
        if self.store.contains(source) {
            return Err(DashboardError::AlreadyRegistered(source));
        }
        if surface.tile_rect(source).is_none() {
            tracing::warn!(message = "dashgrid.controller.unknown_tile", tile = source.get());
            return Err(DashboardError::UnknownTile(source));
        }
        self.foreign.insert(source);
        tracing::debug!(message = "dashgrid.controller.foreign_armed", source = source.get());
        Ok(())
    }

    /// Forget an armed foreign element. Returns whether it was armed.
    pub fn disarm_foreign(&mut self, source: TileId) -> bool {
        self.foreign.remove(&source)
    }

    /// Request a debounced layout pass (resize, mode change, ...). Returns
    /// `true` if this call opened a new window.
    pub fn set_elements_position(&mut self, now: Instant) -> Result<bool, DashboardError> {
        require_container(self.surface.as_mut(), "set_elements_position")?;
        Ok(self.projector.request(now))
    }

    /// Run the projection pass if its window has closed. Returns whether a
    /// pass ran.
    pub fn tick(&mut self, now: Instant) -> Result<bool, DashboardError> {
        if !self.projector.due(now) {
            return Ok(false);
        }
        let result = self.project();
        self.projector.finish(now);
        result.map(|()| true)
    }

    fn project(&mut self) -> Result<(), DashboardError> {
        let (surface, container) =
            require_container(self.surface.as_mut(), "set_elements_position")?;
        let measured: Vec<(TileId, Rect)> = self
            .store
            .tiles()
            .iter()
            .filter_map(|&tile| surface.tile_rect(tile).map(|rect| (tile, rect)))
            .collect();
        let boxes = self
            .projector
            .project(container, surface.scroll_top(), measured);
        for projected in boxes {
            surface.set_content_box(projected.tile, projected.rect);
        }
        Ok(())
    }

    /// Move the tile at `moved` next to the tile at `base` and schedule a
    /// layout pass. A move onto its own slot changes nothing.
    pub fn order(
        &mut self,
        base: usize,
        moved: impl Into<MovedSlot>,
        placement: Placement,
        now: Instant,
    ) -> Result<Vec<SlotChange>, DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "order")?;
        let moved = moved.into();
        if moved == MovedSlot::At(base) {
            return Ok(Vec::new());
        }
        if let MovedSlot::Front(tile) = moved
            && surface.tile_visual(tile).is_none()
        {
            tracing::warn!(message = "dashgrid.controller.unknown_tile", tile = tile.get());
            return Err(DashboardError::UnknownTile(tile));
        }
        let changes = self.store.reorder(base, moved, placement).map_err(|error| {
            tracing::warn!(message = "dashgrid.controller.order_rejected", %error, base);
            DashboardError::from(error)
        })?;
        if let MovedSlot::Front(tile) = moved {
            self.foreign.remove(&tile);
        }
        apply_changes(surface, &changes);
        self.projector.request(now);
        Ok(changes)
    }

    /// Whether `(x, y)` lies over a tile or foreign source.
    #[must_use]
    pub fn is_hovering_tile(&self, tile: TileId, x: f64, y: f64) -> bool {
        self.surface
            .as_ref()
            .and_then(|surface| surface.tile_rect(tile))
            .is_some_and(|rect| is_hovering(rect, x, y))
    }

    /// Whether `(x, y)` lies over the container.
    #[must_use]
    pub fn is_hovering_container(&self, x: f64, y: f64) -> bool {
        self.surface
            .as_ref()
            .and_then(|surface| surface.container_rect())
            .is_some_and(|rect| is_hovering(rect, x, y))
    }

    /// Force a display mode; a change schedules a layout pass.
    pub fn set_mode(&mut self, mode: DashboardMode, now: Instant) -> Result<bool, DashboardError> {
        require_container(self.surface.as_mut(), "set_mode")?;
        let changed = self.hover.set(mode);
        if changed {
            tracing::debug!(message = "dashgrid.controller.mode", mode = mode.as_str());
            self.projector.request(now);
        }
        Ok(changed)
    }

    /// Expand or condense on hover. Returns the new mode when it changed.
    pub fn update_hover_mode(
        &mut self,
        pointer: Point,
        now: Instant,
    ) -> Result<Option<DashboardMode>, DashboardError> {
        let (_, container) = require_container(self.surface.as_mut(), "update_hover_mode")?;
        let changed = self.hover.update(container, pointer);
        if let Some(mode) = changed {
            tracing::debug!(message = "dashgrid.controller.mode", mode = mode.as_str());
            self.projector.request(now);
        }
        Ok(changed)
    }

    /// Route one pointer event. Only the primary button drags; pointer-up
    /// yields the resolution of the finished gesture.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        now: Instant,
    ) -> Result<Option<DragResolution>, DashboardError> {
        let position = event.position();
        match event.kind {
            PointerEventKind::Down(PointerButton::Primary) => {
                self.pointer_down(position)?;
                Ok(None)
            }
            PointerEventKind::Moved => {
                self.pointer_move(position)?;
                Ok(None)
            }
            PointerEventKind::Up(PointerButton::Primary) => self.pointer_up(position, now),
            PointerEventKind::Down(_) | PointerEventKind::Up(_) => Ok(None),
        }
    }

    /// Hit-test a press against tiles and armed foreign sources and arm a
    /// session on the one under the pointer.
    pub fn pointer_down(&mut self, position: Point) -> Result<Option<DragSource>, DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "pointer_down")?;
        if self.session.is_active() {
            return Ok(None);
        }
        let hit = |tile: TileId| {
            surface
                .tile_rect(tile)
                .is_some_and(|rect| is_hovering(rect, position.x, position.y))
        };
        let source = self
            .store
            .tiles()
            .iter()
            .copied()
            .find(|&tile| hit(tile))
            .map(DragSource::Tile)
            .or_else(|| {
                let mut foreign: Vec<TileId> = self.foreign.iter().copied().collect();
                foreign.sort_unstable();
                foreign
                    .into_iter()
                    .find(|&tile| hit(tile))
                    .map(DragSource::Foreign)
            });
        match source {
            Some(source) => self.begin_drag(source.id(), position),
            None => Ok(None),
        }
    }

    /// Arm a session on a known tile or foreign source, skipping the
    /// hit-test (for hosts that dispatch presses per element). Returns
    /// `None` when a session is already active.
    pub fn begin_drag(
        &mut self,
        source: TileId,
        position: Point,
    ) -> Result<Option<DragSource>, DashboardError> {
        require_container(self.surface.as_mut(), "begin_drag")?;
        let source = if self.store.contains(source) {
            DragSource::Tile(source)
        } else if self.foreign.contains(&source) {
            DragSource::Foreign(source)
        } else {
            return Err(DashboardError::UnknownTile(source));
        };
        let transition = self.session.pointer_down(source, position);
        tracing::debug!(
            message = "dashgrid.drag.down",
            transition_id = transition.transition_id,
            source = source.id().get(),
            foreign = source.is_foreign(),
            effect = ?transition.effect
        );
        Ok(match transition.effect {
            DragEffect::Armed { .. } => Some(source),
            _ => None,
        })
    }

    /// Track pointer motion: start the drag past the threshold, move the
    /// proxy and refresh the insert indicators. Returns the candidate held.
    pub fn pointer_move(&mut self, position: Point) -> Result<Option<DragCandidate>, DashboardError> {
        if !self.session.is_active() {
            return Ok(None);
        }
        let (surface, container) = require_container(self.surface.as_mut(), "pointer_move")?;
        let Self {
            config,
            store,
            session,
            ..
        } = self;

        let transition = session.pointer_move(position, |source| {
            let id = source.id();
            let rect = surface.tile_rect(id).unwrap_or_default();
            let visual = surface.tile_visual(id).unwrap_or_default();
            DragSeed {
                moved_slot: source.tile().and_then(|tile| store.slot_of(tile)),
                proxy: DragProxy {
                    rect,
                    visual: proxy_visual(&visual, &config.class_names, &config.proxy_classes),
                },
            }
        });

        match transition.effect {
            DragEffect::DragStarted { source, .. } => {
                if let Some(proxy) = session.proxy() {
                    surface.show_proxy(&proxy.view(source.id()));
                }
                surface.set_opacity(source.id(), Some(config.dim_opacity));
                tracing::debug!(
                    message = "dashgrid.drag.started",
                    transition_id = transition.transition_id,
                    source = source.id().get(),
                    foreign = source.is_foreign()
                );
            }
            DragEffect::DragUpdated { proxy, .. } => {
                surface.move_proxy(proxy);
            }
            effect => {
                tracing::trace!(message = "dashgrid.drag.move_ignored", effect = ?effect);
                return Ok(None);
            }
        }

        let hover = mark_hover(surface, store, &config.class_names, container, position);
        let candidate = session.retarget(hover);
        tracing::trace!(
            message = "dashgrid.drag.hover",
            x = position.x,
            y = position.y,
            base_slot = candidate.map(|c| c.base_slot),
            placement = candidate.map(|c| c.placement.as_str())
        );
        Ok(candidate)
    }

    /// Finish the gesture and commit what it stands for.
    ///
    /// The proxy, dimming and indicators are always cleared and a layout
    /// pass is scheduled, whatever the outcome.
    pub fn pointer_up(
        &mut self,
        position: Point,
        now: Instant,
    ) -> Result<Option<DragResolution>, DashboardError> {
        if !self.session.is_active() {
            return Ok(None);
        }
        let (transition, release) = self.session.pointer_up(position);
        // The session is over either way; a released proxy never outlives it.
        if let (Some(surface), Some(release)) = (self.surface.as_mut(), release.as_ref()) {
            clear_drag_visuals(surface, release.source, &self.store, &self.config.class_names);
        }
        let (surface, container) = require_container(self.surface.as_mut(), "pointer_up")?;
        tracing::debug!(
            message = "dashgrid.drag.up",
            transition_id = transition.transition_id,
            effect = ?transition.effect
        );

        let Some(release) = release else {
            return Ok(match transition.effect {
                DragEffect::Released { source, .. } => Some(DragResolution::Released { source }),
                _ => None,
            });
        };

        let inside = is_hovering(container, position.x, position.y);
        let moved_slot = release
            .source
            .tile()
            .and_then(|tile| self.store.slot_of(tile));
        let plan = plan_drop(inside, release.source, moved_slot, release.candidate);
        tracing::debug!(message = "dashgrid.drag.plan", inside, plan = ?plan);

        let resolution = match plan {
            DropPlan::Remove { tile } => self
                .remove_tile(tile, now)
                .map(|slot| DragResolution::Removed { tile, slot }),
            DropPlan::Discard => Ok(DragResolution::Discarded {
                source: release.source,
            }),
            DropPlan::Reorder {
                base_slot,
                moved_slot,
                placement,
            } => self
                .order(base_slot, moved_slot, placement, now)
                .map(|changes| DragResolution::Reordered {
                    tile: release.source.id(),
                    changes,
                }),
            DropPlan::SwapInPlace { tile, side } => {
                let sibling = surface.swap_sibling(tile, side);
                Ok(DragResolution::SwappedInPlace { tile, sibling })
            }
            DropPlan::Insert { candidate } => {
                self.insert_from_proxy(release.source, &release.proxy, candidate)
            }
            DropPlan::Settle => Ok(DragResolution::Settled {
                source: release.source,
            }),
        };
        self.projector.request(now);

        if let Ok(resolution) = &resolution {
            tracing::debug!(
                message = "dashgrid.drag.resolved",
                resolution = resolution.as_str(),
                source = release.source.id().get()
            );
        }
        resolution.map(Some)
    }

    /// Create a tile from a dropped proxy at the next free slot, then move it
    /// to the candidate when there is one.
    fn insert_from_proxy(
        &mut self,
        source: DragSource,
        proxy: &DragProxy,
        candidate: Option<DragCandidate>,
    ) -> Result<DragResolution, DashboardError> {
        let (surface, _) = require_container(self.surface.as_mut(), "insert")?;
        let source_classes = surface
            .tile_visual(source.id())
            .map(|visual| visual.classes)
            .unwrap_or_default();
        let visual = inserted_visual(&source_classes, proxy, &self.config.class_names);
        let tile = surface.mount_tile(&visual);
        let appended = self.store.push(tile)?;
        surface.apply_slot(tile, appended);

        if let Some(candidate) = candidate {
            match self
                .store
                .reorder(candidate.base_slot, appended, candidate.placement)
            {
                Ok(changes) => apply_changes(surface, &changes),
                Err(error) => {
                    tracing::warn!(
                        message = "dashgrid.drag.insert_candidate_stale",
                        %error,
                        base_slot = candidate.base_slot
                    );
                }
            }
        }

        let slot = self.store.slot_of(tile).unwrap_or(appended);
        tracing::debug!(
            message = "dashgrid.drag.inserted",
            tile = tile.get(),
            source = source.id().get(),
            slot
        );
        Ok(DragResolution::Inserted { tile, slot })
    }
}

fn require_container<'a, S: DashboardSurface>(
    surface: Option<&'a mut S>,
    operation: &'static str,
) -> Result<(&'a mut S, Rect), DashboardError> {
    match surface {
        Some(surface) => match surface.container_rect() {
            Some(container) => Ok((surface, container)),
            None => Err(container_missing(operation)),
        },
        None => Err(container_missing(operation)),
    }
}

fn container_missing(operation: &'static str) -> DashboardError {
    tracing::error!(message = "dashgrid.controller.container_missing", operation);
    DashboardError::ContainerMissing { operation }
}

fn apply_changes<S: DashboardSurface>(surface: &mut S, changes: &[SlotChange]) {
    for change in changes {
        surface.apply_slot(change.tile, change.to);
    }
}

fn clear_indicators<S: DashboardSurface>(surface: &mut S, store: &SlotOrder, names: &ClassNames) {
    for &tile in store.tiles() {
        surface.remove_class(tile, &names.insert_left);
        surface.remove_class(tile, &names.insert_right);
    }
}

/// Hide the proxy and undo the source's dimming and the insert indicators.
fn clear_drag_visuals<S: DashboardSurface>(
    surface: &mut S,
    source: DragSource,
    store: &SlotOrder,
    names: &ClassNames,
) {
    surface.hide_proxy();
    surface.set_opacity(source.id(), None);
    clear_indicators(surface, store, names);
}

/// Clear every indicator, then mark the tile halves under `position`. The
/// last hit in slot order wins.
fn mark_hover<S: DashboardSurface>(
    surface: &mut S,
    store: &SlotOrder,
    names: &ClassNames,
    container: Rect,
    position: Point,
) -> HoverTarget {
    clear_indicators(surface, store, names);
    if !container.contains(position.x, position.y) {
        return HoverTarget::Outside;
    }
    let mut hover = HoverTarget::Container;
    for (slot, &tile) in store.tiles().iter().enumerate() {
        let Some(rect) = surface.tile_rect(tile) else {
            continue;
        };
        if rect.left_half_contains(position.x, position.y) {
            surface.add_class(tile, &names.insert_left);
            hover = HoverTarget::Tile(DragCandidate::new(slot, Placement::Before));
        } else if rect.right_half_contains(position.x, position.y) {
            surface.add_class(tile, &names.insert_right);
            hover = HoverTarget::Tile(DragCandidate::new(slot, Placement::After));
        }
    }
    hover
}
