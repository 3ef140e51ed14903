//! Followers: the faction's NPCs as entities in an ECS world.
//!
//! Every follower has an [`Npc`] component. Companions sent away from camp
//! also carry an [`OnMission`] marker; the follower pool proper is every
//! `Npc` without one.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use ashfall_logic::coords::Tripoint;
use ashfall_logic::skills::{SkillId, SkillProfile};
use ashfall_logic::travel::{DEFAULT_CARRY_MASS_G, DEFAULT_CARRY_VOLUME_ML};

use crate::camp::MissionKey;
use crate::item::Item;

/// Stable follower id. Survives save/load, unlike `hecs::Entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpcId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub skills: SkillProfile,
    pub perception: i32,
    pub inventory: Vec<Item>,
    pub carry_mass_g: i64,
    pub carry_volume_ml: i64,
    /// Absolute tile position.
    pub position: Tripoint,
}

impl Npc {
    pub fn new(id: NpcId, name: impl Into<String>, skills: SkillProfile) -> Self {
        Self {
            id,
            name: name.into(),
            skills,
            perception: 8,
            inventory: Vec::new(),
            carry_mass_g: DEFAULT_CARRY_MASS_G,
            carry_volume_ml: DEFAULT_CARRY_VOLUME_ML,
            position: Tripoint::default(),
        }
    }
}

/// Marker: the companion is away on this mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnMission {
    pub key: MissionKey,
}

/// What camp and examine code need from whoever is acting.
pub trait Character {
    fn name(&self) -> &str;
    fn skill_level(&self, skill: SkillId) -> i32;
    fn perception(&self) -> i32;
    fn has_item(&self, id: &str) -> bool {
        self.count_item(id) > 0
    }
    /// Units held: charges for stacks, one per item otherwise.
    fn count_item(&self, id: &str) -> i64;
    fn add_item(&mut self, item: Item);
    /// Take one unit of `id`: a whole item, or one charge off a stack.
    fn remove_item(&mut self, id: &str) -> Option<Item>;
    fn position(&self) -> Tripoint;
    fn set_position(&mut self, p: Tripoint);
}

impl Character for Npc {
    fn name(&self) -> &str {
        &self.name
    }

    fn skill_level(&self, skill: SkillId) -> i32 {
        self.skills.level(skill)
    }

    fn perception(&self) -> i32 {
        self.perception
    }

    fn count_item(&self, id: &str) -> i64 {
        self.inventory.iter().filter(|i| i.type_id == id).map(Item::count).sum()
    }

    fn add_item(&mut self, item: Item) {
        if let Some(stack) = self.inventory.iter_mut().find(|s| s.stacks_with(&item)) {
            stack.charges += item.charges;
            return;
        }
        self.inventory.push(item);
    }

    fn remove_item(&mut self, id: &str) -> Option<Item> {
        let index = self.inventory.iter().position(|i| i.type_id == id)?;
        let stack = &mut self.inventory[index];
        if stack.charges > 1 {
            stack.charges -= 1;
            let mut one = stack.clone();
            one.charges = 1;
            return Some(one);
        }
        Some(self.inventory.remove(index))
    }

    fn position(&self) -> Tripoint {
        self.position
    }

    fn set_position(&mut self, p: Tripoint) {
        self.position = p;
    }
}

// ============================================================================
// FOLLOWER POOL
// ============================================================================

/// Flattened follower for saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerRecord {
    pub npc: Npc,
    pub on_mission: Option<OnMission>,
}

pub struct FollowerPool {
    world: World,
    /// Entity of every living follower.
    index: HashMap<NpcId, Entity>,
    next_id: u32,
}

impl FollowerPool {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, name: impl Into<String>, skills: SkillProfile) -> NpcId {
        let id = NpcId(self.next_id);
        self.next_id += 1;
        let e = self.world.spawn((Npc::new(id, name, skills),));
        self.index.insert(id, e);
        id
    }

    /// Add a fully built follower, e.g. a new recruit.
    pub fn insert(&mut self, mut npc: Npc) -> NpcId {
        let id = NpcId(self.next_id);
        self.next_id += 1;
        npc.id = id;
        let e = self.world.spawn((npc,));
        self.index.insert(id, e);
        id
    }

    fn entity(&self, id: NpcId) -> Option<Entity> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: NpcId) -> bool {
        self.entity(id).is_some()
    }

    pub fn get(&self, id: NpcId) -> Option<hecs::Ref<'_, Npc>> {
        let e = self.entity(id)?;
        self.world.get::<&Npc>(e).ok()
    }

    pub fn get_mut(&self, id: NpcId) -> Option<hecs::RefMut<'_, Npc>> {
        let e = self.entity(id)?;
        self.world.get::<&mut Npc>(e).ok()
    }

    pub fn mission_of(&self, id: NpcId) -> Option<MissionKey> {
        let e = self.entity(id)?;
        self.world.get::<&OnMission>(e).ok().map(|m| m.key.clone())
    }

    /// In the follower pool: exists and isn't away.
    pub fn is_available(&self, id: NpcId) -> bool {
        self.entity(id).is_some_and(|e| self.world.get::<&OnMission>(e).is_err())
    }

    pub fn available(&self) -> Vec<NpcId> {
        let mut ids: Vec<NpcId> = self
            .world
            .query::<&Npc>()
            .without::<&OnMission>()
            .iter()
            .map(|(_, npc)| npc.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn away(&self) -> Vec<(NpcId, MissionKey)> {
        let mut out: Vec<(NpcId, MissionKey)> = self
            .world
            .query::<(&Npc, &OnMission)>()
            .iter()
            .map(|(_, (npc, m))| (npc.id, m.key.clone()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Take a follower out of the pool for a mission.
    pub fn reserve_for_mission(&mut self, id: NpcId, key: MissionKey) -> bool {
        match self.entity(id) {
            Some(e) if self.world.get::<&OnMission>(e).is_err() => {
                self.world.insert_one(e, OnMission { key }).is_ok()
            }
            _ => false,
        }
    }

    /// Put a companion back in the pool.
    pub fn return_from_mission(&mut self, id: NpcId) -> bool {
        match self.entity(id) {
            Some(e) => self.world.remove_one::<OnMission>(e).is_ok(),
            None => false,
        }
    }

    /// Remove a follower for good. Returns what they were carrying.
    pub fn kill(&mut self, id: NpcId) -> Option<Npc> {
        let e = self.entity(id)?;
        let npc = self.world.get::<&Npc>(e).ok().map(|n| (*n).clone());
        self.index.remove(&id);
        self.world.despawn(e).ok()?;
        npc
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<FollowerRecord> {
        let mut out: Vec<FollowerRecord> = self
            .world
            .query::<(&Npc, Option<&OnMission>)>()
            .iter()
            .map(|(_, (npc, m))| FollowerRecord {
                npc: npc.clone(),
                on_mission: m.cloned(),
            })
            .collect();
        out.sort_by_key(|r| r.npc.id);
        out
    }

    pub fn from_records(records: Vec<FollowerRecord>) -> Self {
        let mut pool = Self::new();
        for r in records {
            pool.next_id = pool.next_id.max(r.npc.id.0 + 1);
            let id = r.npc.id;
            let e = pool.world.spawn((r.npc,));
            pool.index.insert(id, e);
            if let Some(m) = r.on_mission {
                let _ = pool.world.insert_one(e, m);
            }
        }
        pool
    }
}

impl Default for FollowerPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A random recruit name.
pub fn random_name(rng: &mut impl Rng) -> String {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];
    format!("{given} {family}")
}

static GIVEN_NAMES: &[&str] = &[
    "Ada", "Abel", "Bea", "Boris", "Cora", "Dale", "Edie", "Finn", "Greta", "Hank", "Iris", "Jude",
    "Kit", "Lena", "Milo", "Nell", "Otto", "Pia", "Quinn", "Ruth", "Sam", "Tess", "Vern", "Wren",
];

static FAMILY_NAMES: &[&str] = &[
    "Ashby", "Birch", "Crane", "Dunn", "Ellery", "Fisk", "Graves", "Holt", "Ives", "Jessup",
    "Kerr", "Lowe", "Marsh", "Noble", "Orr", "Pike", "Reyes", "Stone", "Tate", "Vance",
];

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::direction::CompassDir;
    use ashfall_logic::missions::MissionKind;

    fn key() -> MissionKey {
        MissionKey::new(MissionKind::Foraging, CompassDir::Base)
    }

    #[test]
    fn reserve_moves_out_of_the_pool() {
        let mut pool = FollowerPool::new();
        let a = pool.spawn("Ada Ashby", SkillProfile::default());
        let b = pool.spawn("Boris Birch", SkillProfile::default());
        assert_eq!(pool.available(), vec![a, b]);

        assert!(pool.reserve_for_mission(a, key()));
        assert!(!pool.reserve_for_mission(a, key()));
        assert_eq!(pool.available(), vec![b]);
        assert_eq!(pool.away(), vec![(a, key())]);
        assert_eq!(pool.mission_of(a), Some(key()));

        assert!(pool.return_from_mission(a));
        assert!(pool.is_available(a));
    }

    #[test]
    fn kill_removes_for_good() {
        let mut pool = FollowerPool::new();
        let a = pool.spawn("Ada Ashby", SkillProfile::default());
        let dead = pool.kill(a).unwrap();
        assert_eq!(dead.name, "Ada Ashby");
        assert!(!pool.contains(a));
        assert!(pool.is_empty());
    }

    #[test]
    fn records_round_trip_with_ids() {
        let mut pool = FollowerPool::new();
        let a = pool.spawn("Ada Ashby", SkillProfile::default());
        let b = pool.spawn("Boris Birch", SkillProfile::default());
        pool.reserve_for_mission(b, key());

        let restored = FollowerPool::from_records(pool.records());
        assert_eq!(restored.available(), vec![a]);
        assert_eq!(restored.away(), vec![(b, key())]);
        let mut restored = restored;
        let c = restored.spawn("Cora Crane", SkillProfile::default());
        assert!(c > b);
    }

    #[test]
    fn lookups_follow_spawns_and_deaths() {
        let mut pool = FollowerPool::new();
        let ids: Vec<NpcId> = (0..50).map(|i| pool.spawn(format!("Hand {i}"), SkillProfile::default())).collect();
        pool.kill(ids[10]);
        let recruit = pool.insert(Npc::new(NpcId(0), "Cora Crane", SkillProfile::default()));

        assert_eq!(pool.len(), 50);
        assert!(pool.get(ids[10]).is_none());
        assert_eq!(pool.get(ids[11]).unwrap().name, "Hand 11");
        assert_eq!(pool.get(recruit).unwrap().id, recruit);

        let restored = FollowerPool::from_records(pool.records());
        assert_eq!(restored.len(), 50);
        assert_eq!(restored.get(ids[49]).unwrap().name, "Hand 49");
        assert!(!restored.contains(ids[10]));
    }

    #[test]
    fn charges_come_off_one_at_a_time() {
        let mut npc = Npc::new(NpcId(1), "Ada", SkillProfile::default());
        let mut nails = Item::new("nail");
        nails.charges = 3;
        npc.add_item(nails);
        assert_eq!(npc.count_item("nail"), 3);
        let one = npc.remove_item("nail").unwrap();
        assert_eq!(one.charges, 1);
        assert_eq!(npc.count_item("nail"), 2);
        assert!(npc.remove_item("log").is_none());
    }
}
