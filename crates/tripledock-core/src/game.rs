//! Core game state machine.
//!
//! This module contains the main `GameState` struct that ties level
//! generation, occlusion and the dock together.
//!
//! The engine never sleeps. A Resolve pass that finds a triplet hands back a
//! [`PendingMatch`]; the driver waits [`MATCH_DELAY_MS`] and then calls
//! [`GameState::complete_match`]. Pending matches carry the level generation
//! they were issued for, so a restart in between turns them into no-ops.

use crate::actions::{GameAction, GameEvent};
use crate::dock::{Dock, DockSlot, Resolution};
use crate::level::{generate_level_with_rng, ConfigError, LevelConfig};
use crate::occlusion::{covered_ids, is_covered, overlap_threshold};
use crate::tile::{Tile, TileId, TileKind, TileLocation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Pause between a triplet forming and it leaving the dock
pub const MATCH_DELAY_MS: u64 = 400;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No level loaded yet
    Idle,
    Playing,
    Won,
    Lost,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// A triplet waiting out its visual delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMatch {
    /// Level the match was found in
    pub generation: u64,
    pub kind: TileKind,
}

/// Result of starting a Resolve pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStep {
    /// Wait, then hand this back to [`GameState::complete_match`]
    Match(PendingMatch),
    /// The pass finished immediately; events are empty if nothing changed
    Settled(Vec<GameEvent>),
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub generation: u64,
    pub phase: GamePhase,
    /// On-pile tiles, bottom first
    pub pile: Vec<Tile>,
    /// Docked tiles, oldest first
    pub dock: Vec<Tile>,
    pub covered: BTreeSet<TileId>,
    pub dock_capacity: usize,
    /// A matched triplet is waiting to be cleared
    pub resolving: bool,
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Configuration of the current level
    pub config: LevelConfig,
    /// Every tile of the level, bottom first, whatever its location
    pub tiles: Vec<Tile>,
    pub dock: Dock,
    pub phase: GamePhase,
    /// Bumped on every level start
    generation: u64,
    /// A Resolve pass is in flight
    resolving: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Create an idle game with no level loaded
    pub fn new() -> Self {
        let config = LevelConfig::default();
        Self {
            dock: Dock::new(config.dock_capacity),
            config,
            tiles: Vec::new(),
            phase: GamePhase::Idle,
            generation: 0,
            resolving: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Look up a tile of the current level
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.id == id)
    }

    /// Tiles still on the pile, bottom first
    pub fn pile(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_on_pile())
    }

    pub fn pile_is_empty(&self) -> bool {
        self.pile().next().is_none()
    }

    fn threshold(&self) -> f32 {
        overlap_threshold(self.config.tile_size, self.config.overlap_ratio)
    }

    /// Ids of every covered pile tile
    pub fn covered_ids(&self) -> BTreeSet<TileId> {
        covered_ids(&self.tiles, self.threshold())
    }

    /// Whether a tap on `id` would currently be accepted
    pub fn is_tappable(&self, id: TileId) -> bool {
        let threshold = self.threshold();
        self.phase == GamePhase::Playing
            && !self.dock.is_full()
            && self.tile(id).is_some_and(|tile| {
                tile.is_on_pile() && !is_covered(tile, &self.tiles, threshold)
            })
    }

    /// Uncovered pile tiles, bottom first
    pub fn tappable_ids(&self) -> Vec<TileId> {
        if self.phase != GamePhase::Playing || self.dock.is_full() {
            return Vec::new();
        }
        let covered = self.covered_ids();
        self.pile()
            .filter(|tile| !covered.contains(&tile.id))
            .map(|tile| tile.id)
            .collect()
    }

    /// Start a new level with the thread-local RNG
    pub fn start_level(&mut self, config: LevelConfig) -> Result<Vec<GameEvent>, GameError> {
        let mut rng = rand::thread_rng();
        self.start_level_with_rng(config, &mut rng)
    }

    /// Start a new level with a specific RNG.
    ///
    /// Callable in any phase. Any pending match from the previous level is
    /// invalidated.
    pub fn start_level_with_rng<R: Rng>(
        &mut self,
        config: LevelConfig,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let tiles = generate_level_with_rng(&config, rng)?;
        self.load_level(config, tiles);
        Ok(vec![GameEvent::LevelStarted {
            generation: self.generation,
            tile_count: self.tiles.len(),
        }])
    }

    /// Replace the current level with a prepared pile.
    ///
    /// The caller is responsible for the tiles satisfying the level
    /// invariants; this is how hand-built layouts are loaded.
    pub fn load_level(&mut self, config: LevelConfig, mut tiles: Vec<Tile>) {
        tiles.sort_by_key(|tile| tile.depth);
        self.generation += 1;
        self.dock = Dock::new(config.dock_capacity);
        self.config = config;
        self.tiles = tiles;
        self.phase = GamePhase::Playing;
        self.resolving = false;

        debug!(
            generation = self.generation,
            tiles = self.tiles.len(),
            "level started"
        );
    }

    /// Tap a pile tile.
    ///
    /// Covered, docked, cleared or unknown tiles, a full dock and terminal
    /// phases are silently ignored (empty event list). Taps are accepted while
    /// a match is waiting to clear.
    pub fn tap(&mut self, id: TileId) -> Vec<GameEvent> {
        if !self.is_tappable(id) {
            return Vec::new();
        }

        let Some(tile) = self.tile_mut(id) else {
            return Vec::new();
        };
        tile.advance_to(TileLocation::InDock);
        let slot = DockSlot {
            id: tile.id,
            kind: tile.kind,
        };
        self.dock.push(slot);

        vec![GameEvent::TileDocked {
            tile: slot.id,
            kind: slot.kind,
            dock_len: self.dock.len(),
        }]
    }

    /// Start a Resolve pass.
    ///
    /// Returns `None` if a pass is already in flight or the game is not being
    /// played.
    pub fn begin_resolve(&mut self) -> Option<ResolveStep> {
        if self.resolving || self.phase != GamePhase::Playing {
            return None;
        }

        let step = match self.dock.evaluate(self.pile_is_empty()) {
            Resolution::Match(kind) => {
                self.resolving = true;
                return Some(ResolveStep::Match(PendingMatch {
                    generation: self.generation,
                    kind,
                }));
            }
            Resolution::Won => {
                self.phase = GamePhase::Won;
                vec![GameEvent::GameWon]
            }
            Resolution::Lost => {
                self.phase = GamePhase::Lost;
                vec![GameEvent::GameLost]
            }
            Resolution::Continue => Vec::new(),
        };

        if self.phase.is_terminal() {
            debug!(generation = self.generation, phase = ?self.phase, "game over");
        }

        Some(ResolveStep::Settled(step))
    }

    /// Finish a match after its delay.
    ///
    /// Does nothing if the level has been restarted since the match was
    /// found. Terminal state is not checked here; the driver runs another
    /// Resolve pass.
    pub fn complete_match(&mut self, pending: PendingMatch) -> Vec<GameEvent> {
        if pending.generation != self.generation {
            debug!(
                stale = pending.generation,
                current = self.generation,
                "discarding stale match"
            );
            return Vec::new();
        }

        self.resolving = false;

        let Some(triplet) = self.dock.take_triplet(pending.kind) else {
            return Vec::new();
        };

        for slot in &triplet {
            if let Some(tile) = self.tile_mut(slot.id) {
                tile.advance_to(TileLocation::Cleared);
            }
        }

        debug!(kind = ?pending.kind, dock = self.dock.len(), "triplet cleared");

        vec![GameEvent::TripletCleared {
            kind: pending.kind,
            tiles: triplet.map(|slot| slot.id),
        }]
    }

    /// Run Resolve passes back to back without waiting.
    ///
    /// Keeps going after each match so queued triplets and the terminal
    /// check are picked up.
    pub fn resolve_now(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();

        while let Some(step) = self.begin_resolve() {
            match step {
                ResolveStep::Match(pending) => events.extend(self.complete_match(pending)),
                ResolveStep::Settled(settled) => {
                    events.extend(settled);
                    break;
                }
            }
        }

        events
    }

    /// Apply an action. Taps do not resolve; the driver decides when to.
    pub fn apply_action(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::StartLevel(config) => self.start_level(config),
            GameAction::Tap(id) => Ok(self.tap(id)),
        }
    }

    /// Derived view of the current state
    pub fn snapshot(&self) -> GameSnapshot {
        let dock = self
            .dock
            .slots()
            .iter()
            .filter_map(|slot| self.tile(slot.id).cloned())
            .collect();

        GameSnapshot {
            generation: self.generation,
            phase: self.phase,
            pile: self.pile().cloned().collect(),
            dock,
            covered: self.covered_ids(),
            dock_capacity: self.dock.capacity(),
            resolving: self.resolving,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Position;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Tiles spread far enough apart that none covers another
    fn flat_level(kinds: &[TileKind], capacity: usize) -> GameState {
        let config = LevelConfig {
            tile_count: kinds.len(),
            dock_capacity: capacity,
            ..LevelConfig::default()
        };
        let tiles = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                Tile::new(i as TileId, kind, Position::new(i as f32 * 100.0, 0.0), i as u32, 0.0)
            })
            .collect();

        let mut game = GameState::new();
        game.load_level(config, tiles);
        game
    }

    #[test]
    fn test_new_game_is_idle() {
        let mut game = GameState::new();
        assert_eq!(game.phase, GamePhase::Idle);
        assert!(game.tap(0).is_empty());
        assert!(game.begin_resolve().is_none());
    }

    #[test]
    fn test_start_level_rejects_bad_config() {
        let mut game = GameState::new();
        let config = LevelConfig {
            tile_count: 7,
            ..LevelConfig::default()
        };
        assert_eq!(
            game.start_level(config),
            Err(GameError::InvalidConfiguration(ConfigError::TileCount(7)))
        );
        assert_eq!(game.phase, GamePhase::Idle);

        let config = LevelConfig {
            area_size: f32::INFINITY,
            ..LevelConfig::default()
        };
        assert!(matches!(
            game.start_level(config),
            Err(GameError::InvalidConfiguration(ConfigError::TileSize { .. }))
        ));
        assert_eq!(game.phase, GamePhase::Idle);
    }

    #[test]
    fn test_start_level_begins_playing() {
        let mut game = GameState::new();
        let mut rng = StdRng::seed_from_u64(42);
        let events = game
            .start_level_with_rng(LevelConfig::default(), &mut rng)
            .unwrap();

        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(
            events,
            vec![GameEvent::LevelStarted {
                generation: 1,
                tile_count: 45
            }]
        );
        assert!(game.dock.is_empty());
    }

    #[test]
    fn test_tap_moves_one_tile_into_dock() {
        let mut game = flat_level(&[TileKind::Apple, TileKind::Pear, TileKind::Grape], 7);

        let events = game.tap(1);
        assert_eq!(
            events,
            vec![GameEvent::TileDocked {
                tile: 1,
                kind: TileKind::Pear,
                dock_len: 1
            }]
        );
        assert_eq!(game.tile(1).unwrap().location, TileLocation::InDock);
        assert_eq!(game.pile().count(), 2);

        // Tapping it again is a no-op
        assert!(game.tap(1).is_empty());
        assert_eq!(game.dock.len(), 1);
    }

    #[test]
    fn test_tap_ignores_covered_and_unknown_tiles() {
        let mut game = GameState::new();
        let tiles = vec![
            Tile::new(0, TileKind::Apple, Position::new(0.0, 0.0), 0, 0.0),
            Tile::new(1, TileKind::Apple, Position::new(10.0, 10.0), 1, 0.0),
            Tile::new(2, TileKind::Apple, Position::new(200.0, 0.0), 2, 0.0),
        ];
        game.load_level(
            LevelConfig {
                tile_count: 3,
                ..LevelConfig::default()
            },
            tiles,
        );

        assert!(game.tap(0).is_empty());
        assert!(game.tap(99).is_empty());
        assert_eq!(game.tappable_ids(), vec![1, 2]);

        // Clearing the top tile uncovers the one beneath
        game.tap(1);
        assert!(game.is_tappable(0));
    }

    #[test]
    fn test_tap_respects_capacity() {
        let mut game = flat_level(
            &[
                TileKind::Apple,
                TileKind::Pear,
                TileKind::Grape,
                TileKind::Apple,
                TileKind::Pear,
                TileKind::Grape,
            ],
            3,
        );
        game.tap(0);
        game.tap(1);
        game.tap(2);

        assert!(game.tap(3).is_empty());
        assert_eq!(game.dock.len(), 3);
        assert!(game.tappable_ids().is_empty());
    }

    #[test]
    fn test_match_waits_for_completion() {
        let mut game = flat_level(&[TileKind::Apple; 3], 7);
        for id in 0..3 {
            game.tap(id);
        }

        let Some(ResolveStep::Match(pending)) = game.begin_resolve() else {
            panic!("expected a match");
        };
        assert_eq!(pending.kind, TileKind::Apple);
        assert!(game.is_resolving());
        assert_eq!(game.dock.len(), 3);

        // Re-entrant passes are suppressed
        assert!(game.begin_resolve().is_none());

        let events = game.complete_match(pending);
        assert_eq!(
            events,
            vec![GameEvent::TripletCleared {
                kind: TileKind::Apple,
                tiles: [0, 1, 2]
            }]
        );
        assert!(game.dock.is_empty());
        assert!(!game.is_resolving());

        // The match pass itself never declares a winner
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(
            game.begin_resolve(),
            Some(ResolveStep::Settled(vec![GameEvent::GameWon]))
        );
        assert_eq!(game.phase, GamePhase::Won);
    }

    #[test]
    fn test_taps_accepted_while_match_pending() {
        let mut game = flat_level(
            &[
                TileKind::Apple,
                TileKind::Apple,
                TileKind::Apple,
                TileKind::Pear,
                TileKind::Pear,
                TileKind::Pear,
            ],
            7,
        );
        for id in 0..3 {
            game.tap(id);
        }
        let Some(ResolveStep::Match(pending)) = game.begin_resolve() else {
            panic!("expected a match");
        };

        for id in 3..6 {
            assert_eq!(game.tap(id).len(), 1);
        }
        assert!(game.begin_resolve().is_none());

        game.complete_match(pending);
        let events = game.resolve_now();
        assert_eq!(
            events,
            vec![
                GameEvent::TripletCleared {
                    kind: TileKind::Pear,
                    tiles: [3, 4, 5]
                },
                GameEvent::GameWon
            ]
        );
    }

    #[test]
    fn test_full_dock_without_match_loses() {
        let mut game = flat_level(
            &[
                TileKind::Apple,
                TileKind::Pear,
                TileKind::Grape,
                TileKind::Apple,
                TileKind::Pear,
                TileKind::Grape,
            ],
            3,
        );
        game.tap(0);
        assert!(game.resolve_now().is_empty());
        game.tap(1);
        game.tap(2);

        assert_eq!(game.resolve_now(), vec![GameEvent::GameLost]);
        assert_eq!(game.phase, GamePhase::Lost);

        // Terminal: nothing else is accepted
        assert!(game.tap(3).is_empty());
        assert!(game.begin_resolve().is_none());
    }

    #[test]
    fn test_restart_discards_pending_match() {
        let mut game = flat_level(&[TileKind::Apple; 3], 7);
        for id in 0..3 {
            game.tap(id);
        }
        let Some(ResolveStep::Match(pending)) = game.begin_resolve() else {
            panic!("expected a match");
        };

        let mut rng = StdRng::seed_from_u64(1);
        game.start_level_with_rng(LevelConfig::default(), &mut rng)
            .unwrap();
        let before = game.snapshot();

        assert!(game.complete_match(pending).is_empty());
        assert_eq!(game.snapshot(), before);
        assert!(!game.is_resolving());
    }

    #[test]
    fn test_apply_action() {
        let mut game = GameState::new();
        let events = game
            .apply_action(GameAction::StartLevel(LevelConfig::default()))
            .unwrap();
        assert_eq!(events.len(), 1);

        let top = *game.tappable_ids().last().unwrap();
        let events = game.apply_action(GameAction::Tap(top)).unwrap();
        assert!(matches!(events[0], GameEvent::TileDocked { tile, .. } if tile == top));
    }

    #[test]
    fn test_snapshot_shape() {
        let mut game = flat_level(&[TileKind::Apple, TileKind::Pear, TileKind::Grape], 5);
        game.tap(2);
        game.tap(0);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.dock_capacity, 5);
        assert_eq!(
            snapshot.dock.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![2, 0]
        );
        assert_eq!(
            snapshot.pile.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![1]
        );
        assert!(snapshot.covered.is_empty());
        assert!(!snapshot.resolving);
    }
}
