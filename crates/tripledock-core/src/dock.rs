//! The dock: a bounded, insertion-ordered holding area.
//!
//! Matching ignores order; order only decides *which* three tiles of a kind
//! are cleared (always the oldest three).

use crate::level::TRIPLET;
use crate::tile::{TileId, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tile sitting in the dock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockSlot {
    pub id: TileId,
    pub kind: TileKind,
}

/// What a Resolve pass should do with the current dock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A triplet of this kind is present
    Match(TileKind),
    /// Dock and pile are both empty
    Won,
    /// Dock is full and nothing resolves
    Lost,
    /// Keep playing
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dock {
    capacity: usize,
    slots: Vec<DockSlot>,
}

impl Dock {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Slots oldest first
    pub fn slots(&self) -> &[DockSlot] {
        &self.slots
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    /// Append a tile. Refused once the dock is full.
    pub fn push(&mut self, slot: DockSlot) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots.push(slot);
        true
    }

    /// Count of docked tiles per kind
    pub fn kind_counts(&self) -> HashMap<TileKind, usize> {
        let mut counts = HashMap::new();
        for slot in &self.slots {
            *counts.entry(slot.kind).or_insert(0) += 1;
        }
        counts
    }

    /// How many tiles of `kind` are docked
    pub fn count_of(&self, kind: TileKind) -> usize {
        self.slots.iter().filter(|slot| slot.kind == kind).count()
    }

    /// The kind to clear next, if any kind has reached a triplet.
    ///
    /// When several kinds qualify, the one docked first wins.
    pub fn triplet_kind(&self) -> Option<TileKind> {
        let counts = self.kind_counts();
        self.slots
            .iter()
            .map(|slot| slot.kind)
            .find(|kind| counts.get(kind).copied().unwrap_or(0) >= TRIPLET)
    }

    /// Remove the oldest three tiles of `kind`.
    ///
    /// Returns `None` and leaves the dock untouched if fewer than three are
    /// present.
    pub fn take_triplet(&mut self, kind: TileKind) -> Option<[DockSlot; TRIPLET]> {
        if self.count_of(kind) < TRIPLET {
            return None;
        }

        let mut taken = Vec::with_capacity(TRIPLET);
        self.slots.retain(|slot| {
            if slot.kind == kind && taken.len() < TRIPLET {
                taken.push(*slot);
                false
            } else {
                true
            }
        });

        taken.try_into().ok()
    }

    /// Decide the outcome of a Resolve pass.
    ///
    /// A present triplet always takes priority over terminal checks.
    pub fn evaluate(&self, pile_empty: bool) -> Resolution {
        if let Some(kind) = self.triplet_kind() {
            return Resolution::Match(kind);
        }
        if self.is_empty() && pile_empty {
            return Resolution::Won;
        }
        if self.is_full() {
            return Resolution::Lost;
        }
        Resolution::Continue
    }
}
