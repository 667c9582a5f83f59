//! A single game driven in real time.
//!
//! The session owns one [`GameState`] and serializes every mutation through
//! its mutex. Resolve passes that find a triplet are finished by a spawned
//! task after [`MATCH_DELAY_MS`]; the pending match carries its level
//! generation, so a restart during the pause turns the task into a no-op.

use crate::commentary::Commentator;
use crate::protocol::ServerMessage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tripledock_core::{
    Bot, BotDifficulty, GameError, GameEvent, GameSnapshot, GameState, LevelConfig, Outcome,
    PendingMatch, ResolveStep, TileId, MATCH_DELAY_MS,
};

/// Commentary received for a level
#[derive(Debug, Clone, PartialEq)]
struct CachedCommentary {
    generation: u64,
    text: String,
}

#[derive(Clone)]
pub struct GameSession {
    game: Arc<Mutex<GameState>>,
    commentary: Arc<Mutex<Option<CachedCommentary>>>,
    updates: mpsc::UnboundedSender<ServerMessage>,
    commentator: Option<Arc<dyn Commentator>>,
    match_delay: Duration,
}

impl GameSession {
    pub fn new(
        updates: mpsc::UnboundedSender<ServerMessage>,
        commentator: Option<Arc<dyn Commentator>>,
    ) -> Self {
        Self {
            game: Arc::new(Mutex::new(GameState::new())),
            commentary: Arc::new(Mutex::new(None)),
            updates,
            commentator,
            match_delay: Duration::from_millis(MATCH_DELAY_MS),
        }
    }

    fn game(&self) -> MutexGuard<'_, GameState> {
        self.game.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cached_commentary(&self) -> MutexGuard<'_, Option<CachedCommentary>> {
        self.commentary.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Send a message to this session's client
    pub fn reply(&self, msg: ServerMessage) {
        // The client may already be gone
        let _ = self.updates.send(msg);
    }

    fn publish(&self, game: &GameState, events: Vec<GameEvent>) {
        if !events.is_empty() {
            self.reply(ServerMessage::Events { events });
        }
        self.reply(ServerMessage::Snapshot {
            snapshot: game.snapshot(),
        });
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game().snapshot()
    }

    /// Commentary for the current level, if any has arrived
    pub fn commentary(&self) -> Option<String> {
        let generation = self.game().generation();
        self.cached_commentary()
            .as_ref()
            .filter(|cached| cached.generation == generation)
            .map(|cached| cached.text.clone())
    }

    /// Start a level, optionally from a fixed seed
    pub fn start_level(&self, config: LevelConfig, seed: Option<u64>) -> Result<(), GameError> {
        let mut game = self.game();
        let events = match seed {
            Some(seed) => game.start_level_with_rng(config, &mut StdRng::seed_from_u64(seed))?,
            None => game.start_level(config)?,
        };
        *self.cached_commentary() = None;

        info!(generation = game.generation(), seed = ?seed, "level started");
        self.publish(&game, events);
        Ok(())
    }

    /// Load a prepared pile
    #[cfg(test)]
    pub fn load_level(&self, config: LevelConfig, tiles: Vec<tripledock_core::Tile>) {
        let mut game = self.game();
        game.load_level(config, tiles);
        *self.cached_commentary() = None;
        self.publish(&game, Vec::new());
    }

    /// Tap a tile; ignored taps produce no messages
    pub fn tap(&self, tile_id: TileId) {
        {
            let mut game = self.game();
            let events = game.tap(tile_id);
            if events.is_empty() {
                debug!(tile_id, "tap ignored");
                return;
            }
            self.publish(&game, events);
        }
        self.resolve();
    }

    /// Suggest the next tap
    pub fn hint(&self, difficulty: BotDifficulty) -> Option<TileId> {
        Bot::new(difficulty).choose_tap(&self.game())
    }

    /// Run one Resolve pass, scheduling the delayed half of a match
    pub fn resolve(&self) {
        let mut game = self.game();
        let Some(step) = game.begin_resolve() else {
            return;
        };

        match step {
            ResolveStep::Match(pending) => {
                debug!(kind = ?pending.kind, "triplet pending");
                self.publish(&game, Vec::new());
                drop(game);

                let session = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(session.match_delay).await;
                    session.finish_match(pending);
                });
            }
            ResolveStep::Settled(events) => {
                if events.is_empty() {
                    return;
                }
                let generation = game.generation();
                let outcomes: Vec<Outcome> = events.iter().filter_map(GameEvent::outcome).collect();
                self.publish(&game, events);
                drop(game);

                for outcome in outcomes {
                    info!(generation, ?outcome, "game over");
                    self.request_commentary(outcome, generation);
                }
            }
        }
    }

    fn finish_match(&self, pending: PendingMatch) {
        {
            let mut game = self.game();
            let events = game.complete_match(pending);
            if events.is_empty() {
                return;
            }
            self.publish(&game, events);
        }
        // Picks up taps made during the pause and the empty-pile win
        self.resolve();
    }

    /// Fire-and-forget commentary for a finished level
    fn request_commentary(&self, outcome: Outcome, generation: u64) {
        let Some(commentator) = self.commentator.clone() else {
            return;
        };

        let session = self.clone();
        tokio::spawn(async move {
            let text = match commentator.comment(outcome).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Commentary unavailable: {}", e);
                    None
                }
            };

            // Held until the reply is queued so a restart cannot slip in between
            let game = session.game();
            if game.generation() != generation {
                debug!(generation, "dropping commentary for an old level");
                return;
            }
            if let Some(text) = &text {
                *session.cached_commentary() = Some(CachedCommentary {
                    generation,
                    text: text.clone(),
                });
            }
            session.reply(ServerMessage::Commentary { outcome, text });
            drop(game);
        });
    }
}
