//! Occlusion: which pile tiles are buried under a higher neighbour.
//!
//! Geometry uses axis-aligned footprints only. Tilt is cosmetic and never
//! enters the test.

use crate::tile::{Tile, TileId};
use std::collections::BTreeSet;

/// Centre distance (per axis) below which two tiles overlap
pub fn overlap_threshold(tile_size: f32, overlap_ratio: f32) -> f32 {
    tile_size * overlap_ratio
}

/// Whether the footprints of `a` and `b` overlap on both axes
pub fn overlaps(a: &Tile, b: &Tile, threshold: f32) -> bool {
    (a.position.x - b.position.x).abs() < threshold
        && (a.position.y - b.position.y).abs() < threshold
}

/// Whether `tile` is covered by any strictly higher on-pile tile.
///
/// Tiles in `pile` that are no longer on the pile are ignored.
pub fn is_covered(tile: &Tile, pile: &[Tile], threshold: f32) -> bool {
    pile.iter().any(|other| {
        other.is_on_pile()
            && other.id != tile.id
            && other.depth > tile.depth
            && overlaps(tile, other, threshold)
    })
}

/// Ids of every covered on-pile tile, recomputed from scratch
pub fn covered_ids(pile: &[Tile], threshold: f32) -> BTreeSet<TileId> {
    pile.iter()
        .filter(|tile| tile.is_on_pile() && is_covered(tile, pile, threshold))
        .map(|tile| tile.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Position, TileKind, TileLocation};

    const THRESHOLD: f32 = 85.0;

    fn tile(id: TileId, depth: u32, x: f32, y: f32) -> Tile {
        Tile::new(id, TileKind::Apple, Position::new(x, y), depth, 0.0)
    }

    #[test]
    fn test_threshold_scales_with_tile() {
        assert_eq!(overlap_threshold(100.0, 0.85), 85.0);
    }

    #[test]
    fn test_higher_overlapping_tile_covers() {
        let pile = vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 40.0, -40.0)];

        assert!(is_covered(&pile[0], &pile, THRESHOLD));
        assert!(!is_covered(&pile[1], &pile, THRESHOLD));
    }

    #[test]
    fn test_must_overlap_on_both_axes() {
        let pile = vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 10.0, 90.0)];
        assert!(!is_covered(&pile[0], &pile, THRESHOLD));
    }

    #[test]
    fn test_boundary_distance_does_not_overlap() {
        let pile = vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 85.0, 0.0)];
        assert!(!is_covered(&pile[0], &pile, THRESHOLD));
    }

    #[test]
    fn test_tilt_is_ignored() {
        let mut pile = vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 84.0, 84.0)];
        pile[1].tilt = 45.0;
        assert!(is_covered(&pile[0], &pile, THRESHOLD));

        pile[0].tilt = -8.0;
        pile[1] = tile(1, 1, 86.0, 0.0);
        pile[1].tilt = 45.0;
        assert!(!is_covered(&pile[0], &pile, THRESHOLD));
    }

    #[test]
    fn test_docked_tiles_do_not_cover() {
        let mut pile = vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 0.0, 0.0)];
        assert_eq!(covered_ids(&pile, THRESHOLD), BTreeSet::from([0]));

        pile[1].location = TileLocation::InDock;
        assert!(covered_ids(&pile, THRESHOLD).is_empty());
    }

    #[test]
    fn test_covered_set_is_idempotent() {
        let pile = vec![
            tile(0, 0, 0.0, 0.0),
            tile(1, 1, 30.0, 30.0),
            tile(2, 2, 60.0, 60.0),
            tile(3, 3, -200.0, 0.0),
        ];
        let first = covered_ids(&pile, THRESHOLD);
        let second = covered_ids(&pile, THRESHOLD);

        assert_eq!(first, BTreeSet::from([0, 1]));
        assert_eq!(first, second);
    }
}
