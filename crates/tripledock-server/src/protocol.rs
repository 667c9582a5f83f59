//! WebSocket protocol messages for Tripledock sessions.

use serde::{Deserialize, Serialize};
use tripledock_core::{BotDifficulty, GameEvent, GameSnapshot, LevelConfig, Outcome, TileId};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Start (or restart) a level
    StartLevel {
        #[serde(default)]
        config: LevelConfig,
        /// Fixed seed for a reproducible layout
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Tap a pile tile
    Tap { tile_id: TileId },

    /// Ask which tile to tap next
    Hint {
        #[serde(default)]
        difficulty: Option<BotDifficulty>,
    },

    /// Request the current snapshot
    Snapshot,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with the session ID
    Welcome { session_id: Uuid },

    /// Engine state after a committed change
    Snapshot { snapshot: GameSnapshot },

    /// Events produced by the last change
    Events { events: Vec<GameEvent> },

    /// Suggested tile, if any is tappable
    Hint { tile_id: Option<TileId> },

    /// Commentary for a finished game; `None` when unavailable
    Commentary {
        outcome: Outcome,
        text: Option<String>,
    },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
