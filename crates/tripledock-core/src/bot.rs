//! Automatic players for Tripledock.
//!
//! Used for hints and for playing levels out in tests:
//! - Easy: Random uncovered tile
//! - Medium: Prefer kinds already waiting in the dock
//! - Hard: Also guards the last dock slots and digs out buried tiles

use crate::game::GameState;
use crate::occlusion::{covered_ids, overlap_threshold};
use crate::tile::{Tile, TileId, TileLocation};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

/// Free dock slots at which the hard bot stops opening new kinds
const GUARDED_SLOTS: usize = 2;

/// A bot that picks which tile to tap next
pub struct Bot {
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a tile to tap, or `None` if nothing is tappable
    pub fn choose_tap(&mut self, game: &GameState) -> Option<TileId> {
        let candidates = game.tappable_ids();
        if candidates.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => candidates.choose(&mut self.rng).copied(),
            BotDifficulty::Medium => self.choose_medium(game, &candidates),
            BotDifficulty::Hard => self.choose_hard(game, &candidates),
        }
    }

    /// Medium: most-docked kind first, random among equals
    fn choose_medium(&mut self, game: &GameState, candidates: &[TileId]) -> Option<TileId> {
        let scored: Vec<(TileId, i32)> = candidates
            .iter()
            .filter_map(|&id| game.tile(id))
            .map(|tile| (tile.id, game.dock.count_of(tile.kind) as i32))
            .collect();
        self.pick_best(&scored)
    }

    /// Hard: completing a triplet beats everything, opening a new kind
    /// with the dock nearly full is avoided, and taps that uncover more
    /// tiles are preferred.
    fn choose_hard(&mut self, game: &GameState, candidates: &[TileId]) -> Option<TileId> {
        let free_slots = game.dock.capacity() - game.dock.len();

        let scored: Vec<(TileId, i32)> = candidates
            .iter()
            .filter_map(|&id| game.tile(id))
            .map(|tile| {
                let docked = game.dock.count_of(tile.kind) as i32;
                let mut score = docked * 100;
                if docked == 0 && free_slots <= GUARDED_SLOTS {
                    score -= 1000;
                }
                score += uncover_gain(game, tile) as i32 * 10;
                (tile.id, score)
            })
            .collect();
        self.pick_best(&scored)
    }

    fn pick_best(&mut self, scored: &[(TileId, i32)]) -> Option<TileId> {
        let best = scored.iter().map(|(_, score)| *score).max()?;
        let top: Vec<TileId> = scored
            .iter()
            .filter(|(_, score)| *score == best)
            .map(|(id, _)| *id)
            .collect();
        top.choose(&mut self.rng).copied()
    }
}

/// How many pile tiles become uncovered if `tile` leaves the pile
fn uncover_gain(game: &GameState, tile: &Tile) -> usize {
    let threshold = overlap_threshold(game.config.tile_size, game.config.overlap_ratio);
    let before = covered_ids(&game.tiles, threshold);

    let after_tiles: Vec<Tile> = game
        .tiles
        .iter()
        .map(|other| {
            let mut other = other.clone();
            if other.id == tile.id {
                other.location = TileLocation::InDock;
            }
            other
        })
        .collect();
    let after = covered_ids(&after_tiles, threshold);

    before.difference(&after).count()
}
