//! Engine tunables, loaded from JSON.

use serde::{Deserialize, Serialize};

use ashfall_logic::constants::camp::EMERGENCY_RECALL_HOURS;
use ashfall_logic::constants::MAX_ITEMS_PER_TILE;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the world RNG. Same seed, same outcomes.
    pub seed: u64,
    /// Maximum line-of-sight range in tiles.
    pub sight_range: i32,
    /// Light level on outdoor tiles, 0..=100.
    pub ambient_light: u8,
    /// Run the field cellular automaton each turn.
    pub process_fields: bool,
    /// Let fire ignite neighbouring tiles.
    pub fire_spread: bool,
    /// Hours a companion must be away before emergency recall is offered.
    pub emergency_recall_hours: i64,
    /// Item stack capacity per tile before placement spills over.
    pub tile_item_capacity: usize,
    /// Food stored by the faction when a new world starts, in kcal.
    pub starting_food: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            sight_range: 60,
            ambient_light: 100,
            process_fields: true,
            fire_spread: true,
            emergency_recall_hours: EMERGENCY_RECALL_HOURS,
            tile_item_capacity: MAX_ITEMS_PER_TILE,
            starting_food: 20_000,
        }
    }
}

impl SimConfig {
    /// Parse and validate a config. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { what: "config", source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sight_range <= 0 {
            return Err(ConfigError::Invalid {
                field: "sight_range",
                reason: format!("must be positive, got {}", self.sight_range),
            });
        }
        if self.ambient_light > 100 {
            return Err(ConfigError::Invalid {
                field: "ambient_light",
                reason: format!("must be at most 100, got {}", self.ambient_light),
            });
        }
        if self.emergency_recall_hours < 0 {
            return Err(ConfigError::Invalid {
                field: "emergency_recall_hours",
                reason: "must not be negative".to_string(),
            });
        }
        if self.tile_item_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "tile_item_capacity",
                reason: "a tile must hold at least one item".to_string(),
            });
        }
        if self.starting_food < 0 {
            return Err(ConfigError::Invalid {
                field: "starting_food",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimConfig::from_json(r#"{ "seed": 7, "fire_spread": false }"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert!(!cfg.fire_spread);
        assert_eq!(cfg.sight_range, SimConfig::default().sight_range);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(SimConfig::from_json(r#"{ "sight_range": 0 }"#).is_err());
        assert!(SimConfig::from_json(r#"{ "tile_item_capacity": 0 }"#).is_err());
        assert!(SimConfig::from_json("not json").is_err());
    }
}
