//! Level progress record
//!
//! Best stars per level and the highest unlocked level. Only the data and
//! its JSON form live here; where it is stored is up to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Most stars a level can award
pub const MAX_STARS: u8 = 3;

/// Best results across levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Best star count per level number
    pub level_stars: BTreeMap<u32, u8>,
    /// Highest level the player may start (level 1 is always open)
    pub max_level_unlocked: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level_stars: BTreeMap::new(),
            max_level_unlocked: 1,
        }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt's stars, keeping the best. When `unlock_next` is set
    /// the following level opens up. Returns true if this was a new best.
    pub fn record(&mut self, level: u32, stars: u8, unlock_next: bool) -> bool {
        let stars = stars.min(MAX_STARS);
        let best = self.level_stars.entry(level).or_insert(0);
        let improved = stars > *best;
        if improved {
            *best = stars;
        }

        if unlock_next {
            self.max_level_unlocked = self.max_level_unlocked.max(level.saturating_add(1));
        }
        if improved {
            log::info!("Level {} best is now {} star(s)", level, stars);
        }
        improved
    }

    /// Best stars earned on `level` (0 if never cleared)
    pub fn stars_for(&self, level: u32) -> u8 {
        self.level_stars.get(&level).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        (1..=self.max_level_unlocked).contains(&level)
    }

    pub fn total_stars(&self) -> u32 {
        self.level_stars.values().map(|&s| s as u32).sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a saved record. Level 1 stays unlocked even if the data says otherwise.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut progress: Self = serde_json::from_str(json)?;
        progress.max_level_unlocked = progress.max_level_unlocked.max(1);
        Ok(progress)
    }
}
