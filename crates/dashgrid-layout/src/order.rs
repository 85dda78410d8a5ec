#![forbid(unsafe_code)]

//! Order Store: the dense slot sequence behind a dashboard's flow order.
//!
//! Every registered tile owns exactly one slot in `0..N-1`. The store keeps
//! the tiles in a slot-indexed vector, so density and uniqueness hold by
//! construction; the host's visual order is a projection of it.
//!
//! # Reorder algorithm
//!
//! [`SlotOrder::reorder`] moves the tile at `moved` next to the tile at
//! `base`:
//!
//! ```text
//! ascending  (moved < base): target = base      (after) | base - 1 (before)
//!                            tiles in (moved, target] shift down by one
//! descending (moved > base): target = base + 1  (after) | base     (before)
//!                            tiles in [target, moved) shift up by one
//! ```
//!
//! The moved tile takes the target slot. [`MovedSlot::Front`] is the
//! insert-before-first sentinel: every slot shifts up by one, the incoming
//! tile enters at slot 0 and the base slot is bumped before the ascending
//! branch runs.
//!
//! # Invariants
//!
//! 1. After any successful mutation, `slot_of(tiles()[i]) == Some(i)` for all
//!    `i`, and no tile appears twice.
//! 2. Failed operations leave the store untouched.

use std::fmt;

use dashgrid_core::tile::{Placement, TileId};
use rustc_hash::FxHashMap;

/// The tile being moved by [`SlotOrder::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovedSlot {
    /// The tile currently at this slot.
    At(usize),
    /// A tile not yet in the order, entering before the first tile.
    Front(TileId),
}

impl From<usize> for MovedSlot {
    fn from(slot: usize) -> Self {
        Self::At(slot)
    }
}

/// One slot reassignment produced by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotChange {
    pub tile: TileId,
    /// Previous slot; `None` for a tile that just entered the order.
    pub from: Option<usize>,
    pub to: usize,
}

/// Order store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    SlotOutOfRange { slot: usize, len: usize },
    UnknownTile(TileId),
    DuplicateTile(TileId),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotOutOfRange { slot, len } => {
                write!(f, "slot {slot} out of range for {len} tiles")
            }
            Self::UnknownTile(tile) => write!(f, "{tile} is not in the slot order"),
            Self::DuplicateTile(tile) => write!(f, "{tile} already holds a slot"),
        }
    }
}

impl std::error::Error for OrderError {}

/// Dense slot-indexed tile order.
#[derive(Debug, Clone, Default)]
pub struct SlotOrder {
    tiles: Vec<TileId>,
    index: FxHashMap<TileId, usize>,
}

impl SlotOrder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an order from tiles listed in slot order.
    pub fn from_tiles(tiles: impl IntoIterator<Item = TileId>) -> Result<Self, OrderError> {
        let mut order = Self::new();
        for tile in tiles {
            order.push(tile)?;
        }
        Ok(order)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in slot order.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    #[inline]
    #[must_use]
    pub fn slot_of(&self, tile: TileId) -> Option<usize> {
        self.index.get(&tile).copied()
    }

    #[inline]
    #[must_use]
    pub fn tile_at(&self, slot: usize) -> Option<TileId> {
        self.tiles.get(slot).copied()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        self.index.contains_key(&tile)
    }

    /// Highest occupied slot, `None` when empty.
    #[must_use]
    pub fn highest_slot(&self) -> Option<usize> {
        self.tiles.len().checked_sub(1)
    }

    /// Append a tile at the next slot (`highest_slot() + 1`).
    pub fn push(&mut self, tile: TileId) -> Result<usize, OrderError> {
        if self.contains(tile) {
            return Err(OrderError::DuplicateTile(tile));
        }
        let slot = self.tiles.len();
        self.tiles.push(tile);
        self.index.insert(tile, slot);
        Ok(slot)
    }

    /// Remove a tile, shifting every higher slot down by one.
    ///
    /// Returns the freed slot and the reassignments of the shifted tiles.
    pub fn remove(&mut self, tile: TileId) -> Result<(usize, Vec<SlotChange>), OrderError> {
        let slot = self.slot_of(tile).ok_or(OrderError::UnknownTile(tile))?;
        self.tiles.remove(slot);
        self.index.remove(&tile);
        let changes = self.tiles[slot..]
            .iter()
            .enumerate()
            .map(|(offset, &shifted)| SlotChange {
                tile: shifted,
                from: Some(slot + offset + 1),
                to: slot + offset,
            })
            .collect();
        self.reindex_from(slot);
        tracing::debug!(
            message = "dashgrid.order.remove",
            tile = tile.get(),
            slot,
            remaining = self.tiles.len()
        );
        Ok((slot, changes))
    }

    /// Move a tile next to the tile at `base`.
    ///
    /// A move onto its own slot is a no-op and returns no changes. Slots are
    /// bounds-checked; on error nothing is mutated.
    pub fn reorder(
        &mut self,
        base: usize,
        moved: impl Into<MovedSlot>,
        placement: Placement,
    ) -> Result<Vec<SlotChange>, OrderError> {
        self.check_slot(base)?;
        match moved.into() {
            MovedSlot::At(moved) => {
                self.check_slot(moved)?;
                if base == moved {
                    return Ok(Vec::new());
                }
                let target = target_slot(base, moved, placement);
                tracing::debug!(
                    message = "dashgrid.order.reorder",
                    base,
                    moved,
                    target,
                    direction = if moved < base { "ascending" } else { "descending" },
                    placement = placement.as_str()
                );
                Ok(self.relocate(moved, target))
            }
            MovedSlot::Front(tile) => {
                if self.contains(tile) {
                    return Err(OrderError::DuplicateTile(tile));
                }
                let previous = self.index.clone();
                self.tiles.insert(0, tile);
                let base = base + 1;
                let target = target_slot(base, 0, placement);
                self.tiles.remove(0);
                self.tiles.insert(target, tile);
                self.reindex_from(0);
                tracing::debug!(
                    message = "dashgrid.order.reorder_front",
                    tile = tile.get(),
                    base,
                    target,
                    placement = placement.as_str()
                );
                Ok(self.diff_against(&previous, 0, self.tiles.len()))
            }
        }
    }

    /// `(tile, slot)` pairs in slot order.
    pub fn assignments(&self) -> impl Iterator<Item = (TileId, usize)> + '_ {
        self.tiles.iter().enumerate().map(|(slot, &tile)| (tile, slot))
    }

    /// Check the dense-permutation invariant.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.index.len() == self.tiles.len()
            && self
                .tiles
                .iter()
                .enumerate()
                .all(|(slot, tile)| self.index.get(tile) == Some(&slot))
    }

    fn check_slot(&self, slot: usize) -> Result<(), OrderError> {
        if slot < self.tiles.len() {
            Ok(())
        } else {
            Err(OrderError::SlotOutOfRange {
                slot,
                len: self.tiles.len(),
            })
        }
    }

    fn relocate(&mut self, from: usize, to: usize) -> Vec<SlotChange> {
        if from == to {
            return Vec::new();
        }
        let tile = self.tiles.remove(from);
        self.tiles.insert(to, tile);
        let (lo, hi) = (from.min(to), from.max(to));
        let changes = (lo..=hi)
            .map(|slot| {
                let tile = self.tiles[slot];
                let previous = if tile == self.tiles[to] {
                    from
                } else if from < to {
                    slot + 1
                } else {
                    slot - 1
                };
                SlotChange {
                    tile,
                    from: Some(previous),
                    to: slot,
                }
            })
            .collect();
        for slot in lo..=hi {
            self.index.insert(self.tiles[slot], slot);
        }
        changes
    }

    fn reindex_from(&mut self, start: usize) {
        for (slot, &tile) in self.tiles.iter().enumerate().skip(start) {
            self.index.insert(tile, slot);
        }
    }

    fn diff_against(
        &self,
        previous: &FxHashMap<TileId, usize>,
        start: usize,
        end: usize,
    ) -> Vec<SlotChange> {
        self.tiles[start..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, &tile)| {
                let to = start + offset;
                let from = previous.get(&tile).copied();
                (from != Some(to)).then_some(SlotChange { tile, from, to })
            })
            .collect()
    }
}

/// Destination slot for a move from `moved` next to `base`.
fn target_slot(base: usize, moved: usize, placement: Placement) -> usize {
    if moved < base {
        match placement {
            Placement::After => base,
            Placement::Before => base.saturating_sub(1),
        }
    } else {
        match placement {
            Placement::After => base + 1,
            Placement::Before => base,
        }
    }
}
