//! Player actions and the events they produce.

use crate::level::LevelConfig;
use crate::tile::{TileId, TileKind};
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameAction {
    /// Generate a fresh level, discarding whatever was in progress
    StartLevel(LevelConfig),
    /// Tap a tile on the pile
    Tap(TileId),
}

/// Terminal outcome, forwarded to the commentary collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new level was generated
    LevelStarted { generation: u64, tile_count: usize },

    /// A tile moved from the pile into the dock
    TileDocked {
        tile: TileId,
        kind: TileKind,
        dock_len: usize,
    },

    /// Three tiles of a kind left the dock
    TripletCleared { kind: TileKind, tiles: [TileId; 3] },

    /// Pile and dock are empty
    GameWon,

    /// Dock filled with nothing left to match
    GameLost,
}

impl GameEvent {
    /// The outcome this event announces, if it is terminal
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            GameEvent::GameWon => Some(Outcome::Won),
            GameEvent::GameLost => Some(Outcome::Lost),
            _ => None,
        }
    }
}
