#![forbid(unsafe_code)]

//! Drag session lifecycle.
//!
//! ```text
//! Idle -> Armed -> Dragging -> Idle
//!   \------> Idle (pointer-up before the threshold: a plain click)
//! ```
//!
//! [`DragSession`] only tracks pointer motion, the proxy box and the current
//! drop candidate. Hit-testing against tiles and every surface mutation stay
//! with the controller; [`plan_drop`] turns a finished session into the
//! mutation it stands for.

use dashgrid_core::geometry::{Point, Rect};
use dashgrid_core::tile::{Placement, TileId};
use dashgrid_layout::SlotChange;

use crate::config::ClassNames;
use crate::surface::{ProxyView, TileVisual};

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// A tile registered with this controller.
    Tile(TileId),
    /// An armed element outside the registered tile set.
    Foreign(TileId),
}

impl DragSource {
    #[must_use]
    pub const fn id(self) -> TileId {
        match self {
            Self::Tile(id) | Self::Foreign(id) => id,
        }
    }

    #[must_use]
    pub const fn tile(self) -> Option<TileId> {
        match self {
            Self::Tile(id) => Some(id),
            Self::Foreign(_) => None,
        }
    }

    #[must_use]
    pub const fn is_foreign(self) -> bool {
        matches!(self, Self::Foreign(_))
    }
}

/// Where the dragged item would land if released now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragCandidate {
    pub base_slot: usize,
    pub placement: Placement,
}

impl DragCandidate {
    #[must_use]
    pub const fn new(base_slot: usize, placement: Placement) -> Self {
        Self {
            base_slot,
            placement,
        }
    }
}

/// Result of hit-testing one pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    /// Outside the container: no candidate is held.
    Outside,
    /// Inside the container, between tiles: the last candidate stands.
    Container,
    /// Over a tile half.
    Tile(DragCandidate),
}

/// The floating proxy owned by a dragging session.
#[derive(Debug, Clone, PartialEq)]
pub struct DragProxy {
    pub rect: Rect,
    pub visual: TileVisual,
}

/// Everything the session needs when it enters `Dragging`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSeed {
    /// Slot of the dragged tile; `None` when it cannot be resolved.
    pub moved_slot: Option<usize>,
    pub proxy: DragProxy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Armed {
        source: DragSource,
        origin: Point,
        current: Point,
    },
    Dragging {
        source: DragSource,
        origin: Point,
        current: Point,
        moved_slot: Option<usize>,
        proxy: DragProxy,
        candidate: Option<DragCandidate>,
    },
}

/// Coarse lifecycle phase, for transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Dragging,
}

impl DragState {
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Armed { .. } => DragPhase::Armed,
            Self::Dragging { .. } => DragPhase::Dragging,
        }
    }
}

/// Explicit no-op diagnostics for pointer events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    SessionAlreadyActive,
    ThresholdNotReached,
}

impl DragNoopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdleWithoutActiveDrag => "idle_without_active_drag",
            Self::SessionAlreadyActive => "session_already_active",
            Self::ThresholdNotReached => "threshold_not_reached",
        }
    }
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEffect {
    Armed {
        source: DragSource,
        origin: Point,
    },
    DragStarted {
        source: DragSource,
        origin: Point,
        current: Point,
        proxy: Rect,
    },
    DragUpdated {
        source: DragSource,
        previous: Point,
        current: Point,
        proxy: Rect,
    },
    /// Pointer-up; `dragged` is false when the session never left `Armed`.
    Released {
        source: DragSource,
        end: Point,
        dragged: bool,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

/// Final snapshot of a session that reached `Dragging`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragRelease {
    pub source: DragSource,
    pub end: Point,
    pub moved_slot: Option<usize>,
    pub candidate: Option<DragCandidate>,
    pub proxy: DragProxy,
}

/// Single drag session state machine. One per controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    state: DragState,
    drag_threshold: f64,
    transition_counter: u64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl DragSession {
    /// Session with the given drag-start threshold in pixels. Negative or
    /// non-finite thresholds are treated as zero.
    #[must_use]
    pub fn new(drag_threshold: f64) -> Self {
        let drag_threshold = if drag_threshold.is_finite() {
            drag_threshold.max(0.0)
        } else {
            0.0
        };
        Self {
            state: DragState::Idle,
            drag_threshold,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.state.phase()
    }

    #[must_use]
    pub const fn drag_threshold(&self) -> f64 {
        self.drag_threshold
    }

    /// Whether a session is Armed or Dragging.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    #[must_use]
    pub const fn source(&self) -> Option<DragSource> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed { source, .. } | DragState::Dragging { source, .. } => Some(*source),
        }
    }

    #[must_use]
    pub const fn candidate(&self) -> Option<DragCandidate> {
        match &self.state {
            DragState::Dragging { candidate, .. } => *candidate,
            _ => None,
        }
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&DragProxy> {
        match &self.state {
            DragState::Dragging { proxy, .. } => Some(proxy),
            _ => None,
        }
    }

    /// Arm a session on pointer-down.
    pub fn pointer_down(&mut self, source: DragSource, position: Point) -> DragTransition {
        let from = self.phase();
        let effect = match self.state {
            DragState::Idle => {
                self.state = DragState::Armed {
                    source,
                    origin: position,
                    current: position,
                };
                DragEffect::Armed {
                    source,
                    origin: position,
                }
            }
            _ => DragEffect::Noop {
                reason: DragNoopReason::SessionAlreadyActive,
            },
        };
        self.record(from, effect)
    }

    /// Track motion. On the move that crosses the threshold `seed` is called
    /// once to resolve the moved slot and build the proxy.
    pub fn pointer_move<F>(&mut self, position: Point, seed: F) -> DragTransition
    where
        F: FnOnce(DragSource) -> DragSeed,
    {
        let from = self.phase();
        let effect = match &mut self.state {
            DragState::Idle => DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutActiveDrag,
            },
            DragState::Armed {
                source,
                origin,
                current,
            } => {
                let (source, origin) = (*source, *origin);
                *current = position;
                if crossed_drag_threshold(origin, position, self.drag_threshold) {
                    let DragSeed {
                        moved_slot,
                        mut proxy,
                    } = seed(source);
                    let (dx, dy) = position.delta_from(origin);
                    proxy.rect = proxy.rect.translate(dx, dy);
                    let proxy_rect = proxy.rect;
                    self.state = DragState::Dragging {
                        source,
                        origin,
                        current: position,
                        moved_slot,
                        proxy,
                        candidate: None,
                    };
                    DragEffect::DragStarted {
                        source,
                        origin,
                        current: position,
                        proxy: proxy_rect,
                    }
                } else {
                    DragEffect::Noop {
                        reason: DragNoopReason::ThresholdNotReached,
                    }
                }
            }
            DragState::Dragging {
                source,
                current,
                proxy,
                ..
            } => {
                let previous = *current;
                let (dx, dy) = position.delta_from(previous);
                proxy.rect = proxy.rect.translate(dx, dy);
                *current = position;
                DragEffect::DragUpdated {
                    source: *source,
                    previous,
                    current: position,
                    proxy: proxy.rect,
                }
            }
        };
        self.record(from, effect)
    }

    /// Apply a hit-test result to the held candidate. Returns the candidate
    /// now held. Ignored unless dragging.
    pub fn retarget(&mut self, hover: HoverTarget) -> Option<DragCandidate> {
        if let DragState::Dragging { candidate, .. } = &mut self.state {
            match hover {
                HoverTarget::Outside => *candidate = None,
                HoverTarget::Container => {}
                HoverTarget::Tile(next) => *candidate = Some(next),
            }
            *candidate
        } else {
            None
        }
    }

    /// End the session on pointer-up. Returns the release snapshot when the
    /// session had reached `Dragging`.
    pub fn pointer_up(&mut self, position: Point) -> (DragTransition, Option<DragRelease>) {
        let from = self.phase();
        let previous = std::mem::replace(&mut self.state, DragState::Idle);
        let (effect, release) = match previous {
            DragState::Idle => (
                DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag,
                },
                None,
            ),
            DragState::Armed { source, .. } => (
                DragEffect::Released {
                    source,
                    end: position,
                    dragged: false,
                },
                None,
            ),
            DragState::Dragging {
                source,
                moved_slot,
                proxy,
                candidate,
                ..
            } => (
                DragEffect::Released {
                    source,
                    end: position,
                    dragged: true,
                },
                Some(DragRelease {
                    source,
                    end: position,
                    moved_slot,
                    candidate,
                    proxy,
                }),
            ),
        };
        (self.record(from, effect), release)
    }

    /// Drop any session without resolving it.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    fn record(&mut self, from: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.phase(),
            effect,
        }
    }
}

fn crossed_drag_threshold(origin: Point, current: Point, threshold: f64) -> bool {
    current.distance_squared(origin) >= threshold * threshold
}

/// The mutation a released drag stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlan {
    /// Registered tile dropped outside: remove it.
    Remove { tile: TileId },
    /// Foreign source dropped outside: nothing to do.
    Discard,
    Reorder {
        base_slot: usize,
        moved_slot: usize,
        placement: Placement,
    },
    /// Dropped on its own slot: swap with the sibling on that side.
    SwapInPlace { tile: TileId, side: Placement },
    /// Foreign or unresolvable source dropped inside: create a tile.
    Insert { candidate: Option<DragCandidate> },
    /// Registered tile dropped inside with no candidate.
    Settle,
}

/// How a pointer-up was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResolution {
    /// Released before the drag threshold: a click.
    Released { source: DragSource },
    Reordered {
        tile: TileId,
        changes: Vec<SlotChange>,
    },
    SwappedInPlace {
        tile: TileId,
        sibling: Option<TileId>,
    },
    Inserted { tile: TileId, slot: usize },
    Removed { tile: TileId, slot: usize },
    /// Dropped inside the container with nothing to change.
    Settled { source: DragSource },
    /// Foreign source dropped outside the container.
    Discarded { source: DragSource },
}

impl DragResolution {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Released { .. } => "released",
            Self::Reordered { .. } => "reordered",
            Self::SwappedInPlace { .. } => "swapped_in_place",
            Self::Inserted { .. } => "inserted",
            Self::Removed { .. } => "removed",
            Self::Settled { .. } => "settled",
            Self::Discarded { .. } => "discarded",
        }
    }
}

/// Decide what a release means.
///
/// `moved_slot` is the dragged tile's current slot, `None` for a foreign
/// source or a tile whose slot cannot be resolved.
#[must_use]
pub fn plan_drop(
    inside: bool,
    source: DragSource,
    moved_slot: Option<usize>,
    candidate: Option<DragCandidate>,
) -> DropPlan {
    if !inside {
        return match source {
            DragSource::Tile(tile) if moved_slot.is_some() => DropPlan::Remove { tile },
            _ => DropPlan::Discard,
        };
    }
    match (source, moved_slot, candidate) {
        (DragSource::Tile(tile), Some(moved), Some(candidate)) => {
            if candidate.base_slot == moved {
                DropPlan::SwapInPlace {
                    tile,
                    side: candidate.placement,
                }
            } else {
                DropPlan::Reorder {
                    base_slot: candidate.base_slot,
                    moved_slot: moved,
                    placement: candidate.placement,
                }
            }
        }
        (DragSource::Tile(_), Some(_), None) => DropPlan::Settle,
        (_, _, candidate) => DropPlan::Insert { candidate },
    }
}

/// Proxy visual cloned from a source: the content class is stripped and the
/// proxy classes are added.
#[must_use]
pub fn proxy_visual(
    source: &TileVisual,
    class_names: &ClassNames,
    proxy_classes: &[String],
) -> TileVisual {
    let mut visual = source.clone();
    visual.remove_class(&class_names.content);
    for class in proxy_classes {
        visual.add_class(class.as_str());
    }
    visual
}

/// Visual for a tile created from a dropped proxy: the root class, then the
/// source's own classes, carrying the proxy's content.
#[must_use]
pub fn inserted_visual(
    source_classes: &[String],
    proxy: &DragProxy,
    class_names: &ClassNames,
) -> TileVisual {
    let mut visual = TileVisual::new(proxy.visual.content.clone()).with_span(proxy.visual.span);
    visual.background = proxy.visual.background.clone();
    visual.add_class(class_names.root.as_str());
    for class in source_classes {
        visual.add_class(class.as_str());
    }
    visual
}

impl DragProxy {
    /// Surface view of this proxy.
    #[must_use]
    pub fn view(&self, source: TileId) -> ProxyView {
        ProxyView {
            source,
            rect: self.rect,
            visual: self.visual.clone(),
        }
    }
}
