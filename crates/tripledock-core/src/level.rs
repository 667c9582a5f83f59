//! Level configuration and pile generation.
//!
//! A generated level is always solvable in the counting sense: every kind
//! appears in whole triplets. Later tiles are stacked on top and pulled
//! toward the centre so the pile reads as a loose heap.

use crate::tile::{Position, Tile, TileId, TileKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tiles per match
pub const TRIPLET: usize = 3;

/// Largest cosmetic tilt in either direction, in degrees
pub const MAX_TILT: f32 = 8.0;

/// Fraction of the play area half-width every tile may use
const MIN_SPREAD: f32 = 0.6;

/// Extra spread granted to the bottom of the pile
const CENTRALITY_SPREAD: f32 = 0.4;

/// Parameters for a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Total tiles on the pile, must be a multiple of three
    pub tile_count: usize,
    /// Distinct kinds drawn from the catalog (clamped to its size)
    pub kind_pool: usize,
    /// Side length of the square play area
    pub area_size: f32,
    /// Side length of a tile
    pub tile_size: f32,
    /// Dock slots
    pub dock_capacity: usize,
    /// Fraction of `tile_size` under which two centres count as overlapping
    pub overlap_ratio: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tile_count: 45,
            kind_pool: 8,
            area_size: 340.0,
            tile_size: 56.0,
            dock_capacity: 7,
            overlap_ratio: 0.85,
        }
    }
}

/// Why a configuration was refused
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("tile count {0} is not a positive multiple of three")]
    TileCount(usize),

    #[error("kind pool must not be empty")]
    EmptyKindPool,

    #[error("tile size {tile_size} does not fit an area of {area_size}")]
    TileSize { tile_size: f32, area_size: f32 },

    #[error("dock capacity {0} cannot hold a triplet")]
    DockCapacity(usize),

    #[error("overlap ratio {0} must be in (0, 1]")]
    OverlapRatio(f32),
}

impl LevelConfig {
    /// Check the divisibility and sizing invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_count == 0 || self.tile_count % TRIPLET != 0 {
            return Err(ConfigError::TileCount(self.tile_count));
        }
        if self.kind_pool == 0 {
            return Err(ConfigError::EmptyKindPool);
        }
        let finite = self.tile_size.is_finite() && self.area_size.is_finite();
        if !(finite && self.tile_size > 0.0 && self.tile_size <= self.area_size) {
            return Err(ConfigError::TileSize {
                tile_size: self.tile_size,
                area_size: self.area_size,
            });
        }
        if self.dock_capacity < TRIPLET {
            return Err(ConfigError::DockCapacity(self.dock_capacity));
        }
        if !(self.overlap_ratio > 0.0 && self.overlap_ratio <= 1.0) {
            return Err(ConfigError::OverlapRatio(self.overlap_ratio));
        }
        Ok(())
    }

    /// Largest distance a tile centre may sit from the area centre
    pub fn max_offset(&self) -> f32 {
        (self.area_size - self.tile_size) / 2.0
    }
}

/// Generate a level using the thread-local RNG
pub fn generate_level(config: &LevelConfig) -> Result<Vec<Tile>, ConfigError> {
    let mut rng = rand::thread_rng();
    generate_level_with_rng(config, &mut rng)
}

/// Generate a level with a specific RNG (for deterministic tests).
///
/// Tiles are returned in placement order, so index equals depth.
pub fn generate_level_with_rng<R: Rng>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<Vec<Tile>, ConfigError> {
    config.validate()?;

    let kinds = select_kinds(config.kind_pool, rng);

    // Triplets round-robin over the selected kinds keeps the counts even
    let mut bag: Vec<(TileId, TileKind)> = (0..config.tile_count / TRIPLET)
        .flat_map(|triplet| std::iter::repeat(kinds[triplet % kinds.len()]).take(TRIPLET))
        .enumerate()
        .map(|(id, kind)| (id as TileId, kind))
        .collect();
    bag.shuffle(rng);

    let total = config.tile_count as f32;
    let max_offset = config.max_offset();

    let tiles = bag
        .into_iter()
        .enumerate()
        .map(|(depth, (id, kind))| {
            let centrality = 1.0 - depth as f32 / total;
            let half = max_offset * (MIN_SPREAD + CENTRALITY_SPREAD * centrality);
            let position = Position::new(
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            );
            let tilt = rng.gen_range(-MAX_TILT..=MAX_TILT);
            Tile::new(id, kind, position, depth as u32, tilt)
        })
        .collect();

    Ok(tiles)
}

/// Draw `pool` distinct kinds from the catalog, without replacement
fn select_kinds<R: Rng>(pool: usize, rng: &mut R) -> Vec<TileKind> {
    let mut catalog = TileKind::ALL.to_vec();
    catalog.shuffle(rng);
    catalog.truncate(pool.min(TileKind::ALL.len()));
    catalog
}
