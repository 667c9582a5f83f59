//! WebAssembly bindings for the Tripledock engine.
//!
//! JavaScript owns the match delay: after a tap it calls `beginResolve`, and
//! when that returns a pending match it waits `matchDelayMs()` before handing
//! it back to `completeMatch`.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::bot::{Bot, BotDifficulty};
#[cfg(feature = "wasm")]
use crate::game::{GameState, PendingMatch, ResolveStep, MATCH_DELAY_MS};
#[cfg(feature = "wasm")]
use crate::level::LevelConfig;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create an idle game
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame {
            state: GameState::new(),
        }
    }

    /// Start a level from a JSON config; missing fields take defaults
    #[wasm_bindgen(js_name = startLevel)]
    pub fn start_level(&mut self, config_json: &str) -> Result<String, JsValue> {
        let config: LevelConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid level config: {}", e)))?;

        match self.state.start_level(config) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        }
    }

    /// Tap a tile, returns events JSON (empty when ignored)
    pub fn tap(&mut self, tile_id: u32) -> String {
        let events = self.state.tap(tile_id);
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Start a Resolve pass.
    ///
    /// Returns `null` when suppressed, `{"pending": ...}` for a match that
    /// must wait, or `{"events": [...]}` when the pass settled.
    #[wasm_bindgen(js_name = beginResolve)]
    pub fn begin_resolve(&mut self) -> String {
        let value = match self.state.begin_resolve() {
            None => serde_json::Value::Null,
            Some(ResolveStep::Match(pending)) => serde_json::json!({ "pending": pending }),
            Some(ResolveStep::Settled(events)) => serde_json::json!({ "events": events }),
        };
        value.to_string()
    }

    /// Finish a pending match returned by `beginResolve`
    #[wasm_bindgen(js_name = completeMatch)]
    pub fn complete_match(&mut self, pending_json: &str) -> Result<String, JsValue> {
        let pending: PendingMatch = serde_json::from_str(pending_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid pending match: {}", e)))?;
        let events = self.state.complete_match(pending);
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    #[wasm_bindgen(js_name = matchDelayMs)]
    pub fn match_delay_ms(&self) -> u32 {
        MATCH_DELAY_MS as u32
    }

    /// Get the current snapshot as JSON
    #[wasm_bindgen(js_name = getSnapshot)]
    pub fn get_snapshot(&self) -> String {
        serde_json::to_string(&self.state.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current phase as a string
    #[wasm_bindgen(js_name = getPhase)]
    pub fn get_phase(&self) -> String {
        serde_json::to_string(&self.state.phase).unwrap_or_else(|_| "\"Unknown\"".to_string())
    }

    /// Suggest a tile to tap
    /// difficulty: "Easy", "Medium", or "Hard"
    #[wasm_bindgen(js_name = getHint)]
    pub fn get_hint(&self, difficulty: &str) -> Option<u32> {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            "Medium" => BotDifficulty::Medium,
            "Hard" => BotDifficulty::Hard,
            _ => BotDifficulty::Medium,
        };
        Bot::new(diff).choose_tap(&self.state)
    }
}

#[cfg(feature = "wasm")]
impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
