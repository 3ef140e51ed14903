//! Camp construction and crafting content.
//!
//! Blueprints describe what an expansion can become: the materials, time and
//! skill a build takes, the stamp laid down when it's finished, and the
//! capabilities it provides. Blueprints sharing a `path` form an upgrade
//! chain through `requires`. Fortification and crafting recipes live in the
//! same file.

use std::collections::BTreeMap;

use serde::Deserialize;

use ashfall_logic::calendar::TimeSpan;
use ashfall_logic::fortify::FortLevel;
use ashfall_logic::skills::SkillId;
use ashfall_logic::travel::to_workdays;

use crate::error::ConfigError;

const BLUEPRINTS_JSON: &str = include_str!("../../../../data/blueprints.json");

/// Materials as item id → units.
pub type Components = BTreeMap<String, i64>;

#[derive(Debug, Clone, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    /// Expansion type this blueprint belongs to.
    pub path: String,
    /// Blueprint that must already be built on the expansion.
    #[serde(default)]
    pub requires: Option<String>,
    /// Overmap terrain an expansion of this type may be surveyed on. Only
    /// meaningful for the first blueprint of a path.
    #[serde(default)]
    pub terrain: Vec<String>,
    #[serde(default)]
    pub components: Components,
    #[serde(default = "default_skill")]
    pub skill: SkillId,
    #[serde(default)]
    pub difficulty: i32,
    #[serde(default)]
    pub time_minutes: i64,
    #[serde(default)]
    pub provides: BTreeMap<String, i32>,
    #[serde(default)]
    pub stamp: Option<String>,
    #[serde(default = "yes")]
    pub must_feed: bool,
    /// Built one pipe segment at a time.
    #[serde(default)]
    pub pipe: bool,
}

impl Blueprint {
    /// Companion time for one build, stretched over work days.
    pub fn work_time(&self) -> TimeSpan {
        to_workdays(TimeSpan::minutes(self.time_minutes))
    }

    /// First blueprint of a path: what a survey lays down.
    pub fn is_expansion(&self) -> bool {
        self.requires.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FortificationRecipe {
    pub id: String,
    pub name: String,
    #[serde(default = "default_skill")]
    pub skill: SkillId,
    #[serde(default)]
    pub difficulty: i32,
    /// Minutes per batch. A run of `n` tiles is `2n - 2` batches.
    pub time_minutes: i64,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CraftRecipe {
    pub id: String,
    pub result: String,
    #[serde(default = "one")]
    pub count: i32,
    /// Capability a camp needs to craft this.
    pub requires: String,
    #[serde(default)]
    pub components: Components,
    #[serde(default = "default_skill")]
    pub skill: SkillId,
    #[serde(default)]
    pub difficulty: i32,
    pub time_minutes: i64,
}

impl CraftRecipe {
    pub fn work_time(&self, batch: i32) -> TimeSpan {
        to_workdays(TimeSpan::minutes(self.time_minutes) * batch.max(1) as i64)
    }
}

fn default_skill() -> SkillId {
    SkillId::Fabrication
}

fn yes() -> bool {
    true
}

fn one() -> i32 {
    1
}

#[derive(Deserialize)]
struct BlueprintFile {
    blueprints: Vec<Blueprint>,
    #[serde(default)]
    fortifications: Vec<FortificationRecipe>,
    #[serde(default)]
    recipes: Vec<CraftRecipe>,
}

/// Blueprints, fortification recipes and craft recipes by id.
#[derive(Debug, Clone, Default)]
pub struct BlueprintCatalog {
    blueprints: BTreeMap<String, Blueprint>,
    fortifications: BTreeMap<String, FortificationRecipe>,
    recipes: BTreeMap<String, CraftRecipe>,
}

impl BlueprintCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BLUEPRINTS_JSON)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: BlueprintFile =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { what: "blueprints", source })?;
        let blueprints: BTreeMap<String, Blueprint> =
            file.blueprints.into_iter().map(|b| (b.id.clone(), b)).collect();
        for bp in blueprints.values() {
            if let Some(req) = &bp.requires {
                match blueprints.get(req) {
                    Some(parent) if parent.path == bp.path => {}
                    _ => {
                        return Err(ConfigError::Invalid {
                            field: "blueprints",
                            reason: format!("{} requires {req}, which isn't on the {} path", bp.id, bp.path),
                        })
                    }
                }
            }
            if bp.components.values().any(|&n| n <= 0) {
                return Err(ConfigError::Invalid {
                    field: "blueprints",
                    reason: format!("{} has a non-positive component count", bp.id),
                });
            }
        }
        Ok(Self {
            blueprints,
            fortifications: file.fortifications.into_iter().map(|f| (f.id.clone(), f)).collect(),
            recipes: file.recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
        })
    }

    pub fn blueprint(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.get(id)
    }

    pub fn blueprints(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.values()
    }

    /// The founding blueprint of an expansion path.
    pub fn expansion_root(&self, path: &str) -> Option<&Blueprint> {
        self.blueprints.values().find(|b| b.path == path && b.is_expansion())
    }

    /// Expansion types that can be surveyed onto `oter`.
    pub fn expansions_for(&self, oter: &str) -> Vec<&Blueprint> {
        self.blueprints
            .values()
            .filter(|b| b.is_expansion() && b.terrain.iter().any(|t| t == oter))
            .collect()
    }

    /// Blueprints that can be started next on an expansion of `path` that
    /// has already built `built`.
    pub fn next_upgrades(&self, path: &str, built: &[String]) -> Vec<&Blueprint> {
        self.blueprints
            .values()
            .filter(|b| b.path == path && !built.contains(&b.id))
            .filter(|b| b.requires.as_ref().is_some_and(|r| built.contains(r)))
            .collect()
    }

    pub fn fortification(&self, level: FortLevel) -> Option<&FortificationRecipe> {
        self.fortifications.get(level.blueprint())
    }

    pub fn recipe(&self, id: &str) -> Option<&CraftRecipe> {
        self.recipes.get(id)
    }

    /// Recipes a camp offering `capability` can craft.
    pub fn recipes_for<'a>(&'a self, capability: &'a str) -> impl Iterator<Item = &'a CraftRecipe> + 'a {
        self.recipes.values().filter(move |r| r.requires == capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_content_parses() {
        let cat = BlueprintCatalog::builtin().unwrap();
        let tent = cat.blueprint("faction_base_camp_1").unwrap();
        assert_eq!(tent.components.get("stick_long"), Some(&8));
        assert!(!tent.must_feed);
        assert!(cat.fortification(FortLevel::SpikedTrench).is_some());
        assert!(cat.recipe("pointy_stick").is_some());
    }

    #[test]
    fn upgrades_follow_the_chain() {
        let cat = BlueprintCatalog::builtin().unwrap();
        let built = vec!["faction_base_camp_0".to_string()];
        let next: Vec<&str> = cat.next_upgrades("camp", &built).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(next, vec!["faction_base_camp_1"]);

        let built = vec!["faction_base_camp_0".to_string(), "faction_base_camp_1".to_string()];
        let next: Vec<&str> = cat.next_upgrades("camp", &built).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(next, vec!["faction_base_camp_2"]);
    }

    #[test]
    fn expansions_are_filtered_by_terrain() {
        let cat = BlueprintCatalog::builtin().unwrap();
        let field: Vec<&str> = cat.expansions_for("field").iter().map(|b| b.path.as_str()).collect();
        assert!(field.contains(&"farm"));
        assert!(cat.expansions_for("river_center").is_empty());
    }

    #[test]
    fn broken_chains_are_rejected() {
        let text = r#"{ "blueprints": [ { "id": "a", "name": "A", "path": "x", "requires": "missing" } ] }"#;
        assert!(BlueprintCatalog::from_json(text).is_err());
    }
}
