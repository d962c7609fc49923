//! Level catalog
//!
//! Levels are authored as rows of bricks; each row expands into concrete
//! brick placements scaled to the play field.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::consts::*;
use crate::error::LevelError;

/// Catalog shipped with the game
const BUNDLED_LEVELS: &str = include_str!("../assets/levels.json");

fn default_health() -> u32 {
    BRICK_HEALTH
}

fn default_restitution() -> f32 {
    BRICK_RESTITUTION
}

fn default_friction() -> f32 {
    BRICK_FRICTION
}

fn default_stock() -> u32 {
    DEFAULT_STOCK
}

/// One brick placement handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickSpec {
    /// Center position
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_health")]
    pub health: u32,
    #[serde(default = "default_restitution")]
    pub restitution: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
}

impl BrickSpec {
    /// Default-sized brick centered at (x, y)
    pub fn new(x: f32, y: f32, health: u32) -> Self {
        Self {
            x,
            y,
            width: BRICK_WIDTH,
            height: BRICK_HEIGHT,
            health,
            restitution: BRICK_RESTITUTION,
            friction: BRICK_FRICTION,
        }
    }

    /// Health a brick actually spawns with (zero means "unspecified")
    pub fn spawn_health(&self) -> u32 {
        if self.health == 0 {
            BRICK_HEALTH
        } else {
            self.health
        }
    }
}

/// Everything the game needs to run one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Decoration descriptor, passed through to the presentation layer
    #[serde(default)]
    pub background: serde_json::Value,
    #[serde(default)]
    pub bricks: Vec<BrickSpec>,
    #[serde(default = "default_stock")]
    pub stock: u32,
}

impl LevelData {
    pub fn new(bricks: Vec<BrickSpec>, stock: u32) -> Self {
        Self {
            background: serde_json::Value::Null,
            bricks,
            stock,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), DEFAULT_STOCK)
    }
}

/// A row of bricks as authored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDef {
    /// Fraction of field height
    pub y: f32,
    pub count: u32,
    #[serde(default)]
    pub health: Option<u32>,
    /// Fraction of field width for the first brick center (centered when absent)
    #[serde(default)]
    pub x: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrickLayoutDef {
    #[serde(default)]
    pub rows: Vec<RowDef>,
}

/// A level as authored in the catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub background: serde_json::Value,
    #[serde(default)]
    pub bricks: Option<BrickLayoutDef>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl RowDef {
    /// Expand the row into brick placements for the given field
    pub fn expand(&self, field: &FieldConfig) -> Vec<BrickSpec> {
        let y = self.y * field.height;
        let health = self.health.filter(|h| *h > 0).unwrap_or(BRICK_HEALTH);
        let count = self.count as f32;

        let start_x = match self.x {
            Some(x) => x * field.width,
            None => {
                let total_width = count * BRICK_WIDTH + (count - 1.0).max(0.0) * BRICK_GAP;
                (field.width - total_width) / 2.0 + BRICK_WIDTH / 2.0
            }
        };

        (0..self.count)
            .map(|i| BrickSpec::new(start_x + i as f32 * (BRICK_WIDTH + BRICK_GAP), y, health))
            .collect()
    }
}

impl LevelDef {
    pub fn to_level_data(&self, field: &FieldConfig) -> LevelData {
        let bricks = self
            .bricks
            .as_ref()
            .map(|layout| layout.rows.iter().flat_map(|row| row.expand(field)).collect())
            .unwrap_or_default();

        LevelData {
            background: self.background.clone(),
            bricks,
            // Zero means "unspecified", as with brick health
            stock: self.stock.filter(|s| *s > 0).unwrap_or(DEFAULT_STOCK),
        }
    }
}

/// All levels, keyed by level number
#[derive(Debug, Clone, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<u32, LevelDef>,
}

impl LevelCatalog {
    /// Parse a catalog JSON object (`{ "1": {...}, "2": {...} }`)
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let raw: BTreeMap<String, LevelDef> = serde_json::from_str(json)?;
        let mut levels = BTreeMap::new();
        for (key, def) in raw {
            match key.trim().parse::<u32>() {
                Ok(number) => {
                    levels.insert(number, def);
                }
                Err(_) => log::warn!("Skipping level with non-numeric key {:?}", key),
            }
        }
        Ok(Self { levels })
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&text)?;
        log::info!("Loaded {} levels from {}", catalog.level_count(), path.display());
        Ok(catalog)
    }

    /// The catalog compiled into the binary
    pub fn bundled() -> Result<Self, LevelError> {
        Self::from_json_str(BUNDLED_LEVELS)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Level data for `number`, falling back to level 1 when undefined
    pub fn level(&self, number: u32, field: &FieldConfig) -> LevelData {
        if let Some(def) = self.levels.get(&number) {
            return def.to_level_data(field);
        }
        log::warn!("Level {} not defined, falling back to level 1", number);
        self.levels
            .get(&1)
            .map(|def| def.to_level_data(field))
            .unwrap_or_else(LevelData::empty)
    }
}
