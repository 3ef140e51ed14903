//! Items, item types and weighted item groups.
//!
//! Item types and groups are content: they're parsed from
//! `data/item_groups.json` at startup. Mission code asks an
//! [`ItemGroupRoller`] for loot and never looks at the tables directly.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::food::Freshness;

use crate::error::ConfigError;

const ITEM_GROUPS_JSON: &str = include_str!("../../../data/item_groups.json");

/// Mass and volume assumed for ids the catalog doesn't know.
const DEFAULT_MASS_G: i64 = 250;
const DEFAULT_VOLUME_ML: i64 = 250;

/// One item, or a stack of charges of one item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub type_id: String,
    /// Zero for items that don't count by charges.
    pub charges: i32,
    /// Active items need per-turn processing.
    pub active: bool,
    pub mass_g: i64,
    pub volume_ml: i64,
    /// Food energy per item (or per charge). Zero for non-food.
    pub kcal: i64,
    pub fun: i32,
    pub flammable: bool,
    pub birthday: TimePoint,
    /// When the food goes bad, if ever.
    pub rots_at: Option<TimePoint>,
    /// What a seed grows into.
    pub fruit: Option<String>,
}

impl Item {
    /// A bare item of an id with default mass and volume.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            charges: 0,
            active: false,
            mass_g: DEFAULT_MASS_G,
            volume_ml: DEFAULT_VOLUME_ML,
            kcal: 0,
            fun: 0,
            flammable: false,
            birthday: TimePoint::START,
            rots_at: None,
            fruit: None,
        }
    }

    pub fn from_type(ty: &ItemType, now: TimePoint) -> Self {
        Self {
            type_id: ty.id.clone(),
            charges: ty.charges,
            active: ty.active,
            mass_g: ty.mass_g,
            volume_ml: ty.volume_ml,
            kcal: ty.kcal,
            fun: ty.fun,
            flammable: ty.flammable,
            birthday: now,
            rots_at: ty.shelf_life_hours.map(|h| now + TimeSpan::hours(h)),
            fruit: ty.fruit.clone(),
        }
    }

    pub fn counts_by_charges(&self) -> bool {
        self.charges > 0
    }

    /// Units this stack represents: charges, or 1.
    pub fn count(&self) -> i64 {
        if self.counts_by_charges() {
            self.charges as i64
        } else {
            1
        }
    }

    pub fn is_food(&self) -> bool {
        self.kcal > 0
    }

    pub fn is_seed(&self) -> bool {
        self.fruit.is_some()
    }

    pub fn total_kcal(&self) -> i64 {
        self.kcal * self.count()
    }

    pub fn freshness(&self, now: TimePoint) -> Freshness {
        Freshness::from_time_left(self.rots_at.map(|t| t - now))
    }

    /// Whether `other` merges into this stack instead of taking a new slot.
    pub fn stacks_with(&self, other: &Item) -> bool {
        self.counts_by_charges() && other.counts_by_charges() && self.type_id == other.type_id
    }
}

// ============================================================================
// CONTENT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ItemType {
    pub id: String,
    #[serde(default = "default_mass")]
    pub mass_g: i64,
    #[serde(default = "default_volume")]
    pub volume_ml: i64,
    #[serde(default)]
    pub charges: i32,
    #[serde(default)]
    pub kcal: i64,
    #[serde(default)]
    pub fun: i32,
    #[serde(default)]
    pub shelf_life_hours: Option<i64>,
    #[serde(default)]
    pub flammable: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub fruit: Option<String>,
}

fn default_mass() -> i64 {
    DEFAULT_MASS_G
}

fn default_volume() -> i64 {
    DEFAULT_VOLUME_ML
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub item: String,
    pub weight: u32,
    /// Inclusive count range; defaults to exactly one.
    #[serde(default = "one_to_one")]
    pub count: [i32; 2],
}

fn one_to_one() -> [i32; 2] {
    [1, 1]
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemGroup {
    pub entries: Vec<GroupEntry>,
}

#[derive(Deserialize)]
struct ItemContent {
    items: Vec<ItemType>,
    groups: HashMap<String, ItemGroup>,
}

/// Rolls loot from named groups.
pub trait ItemGroupRoller {
    /// One draw from `group`. Unknown groups yield nothing.
    fn roll(&self, group: &str, now: TimePoint, rng: &mut StdRng) -> Vec<Item>;

    /// A fresh item of `id` as of `now`.
    fn create(&self, id: &str, now: TimePoint) -> Item;

    /// `count` units of `id`: one stack if it counts by charges, otherwise
    /// `count` separate items.
    fn create_n(&self, id: &str, count: i32, now: TimePoint) -> Vec<Item> {
        if count <= 0 {
            return Vec::new();
        }
        let proto = self.create(id, now);
        if proto.counts_by_charges() {
            let mut stack = proto;
            stack.charges = count;
            vec![stack]
        } else {
            vec![proto; count as usize]
        }
    }
}

/// Item types and groups loaded from JSON.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    types: HashMap<String, ItemType>,
    groups: HashMap<String, ItemGroup>,
}

impl ItemCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(ITEM_GROUPS_JSON)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let content: ItemContent =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { what: "item groups", source })?;
        let types: HashMap<String, ItemType> = content.items.into_iter().map(|t| (t.id.clone(), t)).collect();
        for (name, group) in &content.groups {
            if group.entries.is_empty() || group.entries.iter().all(|e| e.weight == 0) {
                return Err(ConfigError::Invalid {
                    field: "groups",
                    reason: format!("group {name} has no weighted entries"),
                });
            }
            if let Some(bad) = group.entries.iter().find(|e| e.count[0] > e.count[1] || e.count[0] < 0) {
                return Err(ConfigError::Invalid {
                    field: "groups",
                    reason: format!("group {name} entry {} has a bad count range", bad.item),
                });
            }
        }
        Ok(Self {
            types,
            groups: content.groups,
        })
    }

    pub fn item_type(&self, id: &str) -> Option<&ItemType> {
        self.types.get(id)
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }
}

impl ItemGroupRoller for ItemCatalog {
    fn roll(&self, group: &str, now: TimePoint, rng: &mut StdRng) -> Vec<Item> {
        let Some(g) = self.groups.get(group) else {
            log::warn!("unknown item group {group:?}");
            return Vec::new();
        };
        let dist = match WeightedIndex::new(g.entries.iter().map(|e| e.weight)) {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };
        let entry = &g.entries[dist.sample(rng)];
        let count = rng.gen_range(entry.count[0]..=entry.count[1]);
        self.create_n(&entry.item, count, now)
    }

    fn create(&self, id: &str, now: TimePoint) -> Item {
        match self.types.get(id) {
            Some(ty) => Item::from_type(ty, now),
            None => {
                let mut item = Item::new(id);
                item.birthday = now;
                item
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::builtin().unwrap()
    }

    #[test]
    fn builtin_content_parses() {
        let cat = catalog();
        assert!(cat.has_group("forest"));
        assert!(cat.has_group("gathering_faction_base_camp_firewood"));
        for season in ["spring", "summer", "autumn", "winter"] {
            assert!(cat.has_group(&format!("foraging_faction_camp_{season}")));
        }
        assert!(cat.item_type("log").is_some());
    }

    #[test]
    fn rolls_come_from_the_group() {
        let cat = catalog();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            for item in cat.roll("gathering_faction_base_camp_firewood", TimePoint::START, &mut rng) {
                assert!(["stick", "splinter", "log"].contains(&item.type_id.as_str()));
            }
        }
        assert!(cat.roll("no_such_group", TimePoint::START, &mut rng).is_empty());
    }

    #[test]
    fn food_spoils() {
        let cat = catalog();
        let berries = cat.create("blueberries", TimePoint::START);
        assert!(berries.is_food());
        assert_eq!(berries.freshness(TimePoint::START), Freshness::Fresh);
        let later = TimePoint::START + TimeSpan::days(30);
        assert_eq!(berries.freshness(later), Freshness::Rotten);
    }

    #[test]
    fn charges_stack() {
        let cat = catalog();
        let nails = cat.create_n("nail", 12, TimePoint::START);
        assert_eq!(nails.len(), 1);
        assert_eq!(nails[0].count(), 12);
        assert!(nails[0].stacks_with(&cat.create("nail", TimePoint::START)));
        assert_eq!(cat.create_n("log", 3, TimePoint::START).len(), 3);
    }

    #[test]
    fn rejects_empty_groups() {
        let json = r#"{ "items": [], "groups": { "g": { "entries": [] } } }"#;
        assert!(ItemCatalog::from_json(json).is_err());
    }
}
