//! Tile representation.
//!
//! This module contains:
//! - The tile symbol catalog
//! - Pile coordinates
//! - The forward-only tile lifecycle
//! - The `Tile` record shared by the pile, the dock and snapshots

use serde::{Deserialize, Serialize};

/// Tile identifier, stable for the lifetime of a level
pub type TileId = u32;

/// Tile symbols - the "type" a triplet is matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    Apple,
    Banana,
    Cherry,
    Grape,
    Lemon,
    Melon,
    Orange,
    Peach,
    Pear,
    Strawberry,
    Carrot,
    Mushroom,
}

impl TileKind {
    /// Full symbol catalog
    pub const ALL: [TileKind; 12] = [
        TileKind::Apple,
        TileKind::Banana,
        TileKind::Cherry,
        TileKind::Grape,
        TileKind::Lemon,
        TileKind::Melon,
        TileKind::Orange,
        TileKind::Peach,
        TileKind::Pear,
        TileKind::Strawberry,
        TileKind::Carrot,
        TileKind::Mushroom,
    ];

    /// Glyph drawn on the tile face
    pub fn symbol(&self) -> &'static str {
        match self {
            TileKind::Apple => "🍎",
            TileKind::Banana => "🍌",
            TileKind::Cherry => "🍒",
            TileKind::Grape => "🍇",
            TileKind::Lemon => "🍋",
            TileKind::Melon => "🍉",
            TileKind::Orange => "🍊",
            TileKind::Peach => "🍑",
            TileKind::Pear => "🍐",
            TileKind::Strawberry => "🍓",
            TileKind::Carrot => "🥕",
            TileKind::Mushroom => "🍄",
        }
    }
}

/// Tile centre, relative to the centre of the play area
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where a tile currently lives.
///
/// Tiles only ever move forward: `OnPile -> InDock -> Cleared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileLocation {
    OnPile,
    InDock,
    Cleared,
}

impl TileLocation {
    /// The only location this one may advance to
    pub fn next(&self) -> Option<TileLocation> {
        match self {
            TileLocation::OnPile => Some(TileLocation::InDock),
            TileLocation::InDock => Some(TileLocation::Cleared),
            TileLocation::Cleared => None,
        }
    }
}

/// A single tile of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub position: Position,
    /// Stacking order, higher is on top
    pub depth: u32,
    /// Cosmetic rotation in degrees
    pub tilt: f32,
    pub location: TileLocation,
}

impl Tile {
    /// Create a tile sitting on the pile
    pub fn new(id: TileId, kind: TileKind, position: Position, depth: u32, tilt: f32) -> Self {
        Self {
            id,
            kind,
            position,
            depth,
            tilt,
            location: TileLocation::OnPile,
        }
    }

    pub fn is_on_pile(&self) -> bool {
        self.location == TileLocation::OnPile
    }

    pub fn is_in_dock(&self) -> bool {
        self.location == TileLocation::InDock
    }

    /// Advance the lifecycle by one step.
    ///
    /// Returns false (and leaves the tile untouched) for anything other than
    /// the single forward transition.
    pub fn advance_to(&mut self, location: TileLocation) -> bool {
        if self.location.next() == Some(location) {
            self.location = location;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_distinct() {
        let mut kinds = TileKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), TileKind::ALL.len());
    }

    #[test]
    fn test_lifecycle_only_moves_forward() {
        let mut tile = Tile::new(0, TileKind::Apple, Position::default(), 0, 0.0);
        assert!(tile.is_on_pile());

        // Can't skip the dock
        assert!(!tile.advance_to(TileLocation::Cleared));
        assert!(tile.advance_to(TileLocation::InDock));

        // No take-back
        assert!(!tile.advance_to(TileLocation::OnPile));
        assert!(tile.advance_to(TileLocation::Cleared));
        assert!(!tile.advance_to(TileLocation::Cleared));
        assert_eq!(tile.location, TileLocation::Cleared);
    }
}
