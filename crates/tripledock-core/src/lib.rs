//! Tripledock - a stack-and-dock tile matching puzzle engine
//!
//! This crate provides the core game logic for Tripledock, including:
//! - Level generation with depth ordering and a centre-biased heap layout
//! - Occlusion: which tiles are buried and cannot be tapped
//! - The dock, triplet matching and win/loss determination
//! - A game facade producing read-only snapshots for the presentation layer
//!
//! # Architecture
//!
//! The engine is synchronous and platform-agnostic. The visual pause before
//! a triplet clears is modelled as an explicit pending step that the caller
//! completes after [`game::MATCH_DELAY_MS`], so it can be driven by:
//! - An async runtime on a server
//! - JavaScript timers through WebAssembly
//! - Tests, without waiting at all
//!
//! # Modules
//!
//! - [`tile`]: Tile kinds, positions and the tile lifecycle
//! - [`level`]: Level configuration and pile generation
//! - [`occlusion`]: Covered-tile computation
//! - [`dock`]: The bounded dock and triplet selection
//! - [`game`]: Game state machine
//! - [`bot`]: Automatic players and hints

pub mod actions;
pub mod bot;
pub mod dock;
pub mod game;
pub mod level;
pub mod occlusion;
pub mod tile;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Outcome};
pub use bot::{Bot, BotDifficulty};
pub use dock::{Dock, DockSlot, Resolution};
pub use game::{
    GameError, GamePhase, GameSnapshot, GameState, PendingMatch, ResolveStep, MATCH_DELAY_MS,
};
pub use level::{generate_level, generate_level_with_rng, ConfigError, LevelConfig, TRIPLET};
pub use tile::{Position, Tile, TileId, TileKind, TileLocation};
