//! Faction camps and the companion missions they run.
//!
//! A [`Basecamp`] sits on one overmap tile and grows by adding expansions on
//! the eight tiles around it. Each expansion builds up through a chain of
//! blueprints, and what it has built decides which missions the camp can
//! offer.
//!
//! Missions follow one state machine:
//!
//! ```text
//! Available ──dispatch──► AwaitingReturn ──resolve──► Resolved
//!                              │
//!                              └──emergency_recall (after 24h)──► Recalled
//! ```
//!
//! Dispatch validates everything first and only then spends food and
//! materials and takes the companion out of the follower pool. While away
//! the companion is nothing but a [`CompanionMission`] ledger entry; the
//! world never simulates them. Resolution happens when the player asks for
//! it, after `expected_return`.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`blueprint`] | Expansion blueprints, fortification and craft recipes |
//! | [`inventory`] | The camp stockpile |
//! | [`dispatch`] | Mission orders and the dispatch transaction |
//! | [`resolve`] | Return handling, food reconciliation, emergency recall |
//! | [`catalog`] | The mission listing shown in the camp manager |
//! | [`gathering`] | Gathering yields and random encounters |
//! | [`forestry`] | Felling trees on an overmap tile |
//! | [`farm`] | Plowing, planting and harvesting farm plots |

pub mod blueprint;
pub mod catalog;
pub mod dispatch;
pub mod farm;
pub mod forestry;
pub mod gathering;
pub mod inventory;
pub mod resolve;

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::coords::{line_to, Tripoint};
use ashfall_logic::direction::{CompassDir, StampOrientation};
use ashfall_logic::food::{distribution_credit, FactionLedger};
use ashfall_logic::fortify::FortificationPlan;
use ashfall_logic::missions::MissionKind;
use ashfall_logic::salt_pipe::SaltWaterPipe;

use crate::config::SimConfig;
use crate::item::{Item, ItemGroupRoller};
use crate::map::{MapBuffer, MapGenerator, MapGrid, MapgenUpdater, OmtSite, SubmapLoader};
use crate::npc::{FollowerPool, NpcId};
use crate::overmap::OvermapBuffer;
use crate::registry::Registry;

pub use blueprint::{Blueprint, BlueprintCatalog, Components, CraftRecipe, FortificationRecipe};
pub use catalog::{EntryAction, MissionEntry};
pub use dispatch::{DispatchReceipt, MissionOrder};
pub use farm::FarmOp;
pub use inventory::CampInventory;
pub use resolve::{try_resolve, MissionReport, ResolutionOutcome, ReturnKind};

// ============================================================================
// MISSIONS
// ============================================================================

/// Identifies a mission slot: what, where, and for parameterised missions
/// which blueprint or recipe. Worker caps count companions per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissionKey {
    pub kind: MissionKind,
    pub dir: CompassDir,
    pub parameters: String,
}

impl MissionKey {
    pub fn new(kind: MissionKind, dir: CompassDir) -> Self {
        Self {
            kind,
            dir,
            parameters: String::new(),
        }
    }

    pub fn with_parameters(kind: MissionKind, dir: CompassDir, parameters: impl Into<String>) -> Self {
        Self {
            kind,
            dir,
            parameters: parameters.into(),
        }
    }
}

/// Mission-specific state carried from dispatch to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissionPayload {
    None,
    /// Goods the companion is bringing back.
    Haul(Vec<Item>),
    Survey { target: Tripoint, blueprint: String },
    HideSite { target: Tripoint, stash: Vec<Item> },
    Relay { target: Tripoint, send: Vec<Item>, bring_back: bool },
    /// `built` tiles of the run are already done.
    Fortify { plan: FortificationPlan, z: i32, built: usize },
    Route(Vec<Tripoint>),
    Farm { target: Tripoint, seeds: Vec<Item> },
    Upgrade { blueprint: String },
    PipeSegment { segment: usize },
    Craft { recipe: String, batch: i32 },
}

/// A companion away from camp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionMission {
    pub npc: NpcId,
    pub key: MissionKey,
    pub start: TimePoint,
    pub expected_return: TimePoint,
    /// Food taken from the ledger at dispatch.
    pub reserved_food: i64,
    /// Whether the camp pays the companion's food for this job.
    pub fed: bool,
    pub payload: MissionPayload,
}

impl CompanionMission {
    pub fn reserved_duration(&self) -> TimeSpan {
        self.expected_return - self.start
    }
}

// ============================================================================
// BASECAMP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    /// Blueprint path, e.g. `camp`, `farm`, `saltworks`.
    pub path: String,
    /// Absolute overmap tile.
    pub pos: Tripoint,
    /// Blueprints finished here, oldest first.
    pub built: Vec<String>,
    pub provides: BTreeMap<String, i32>,
    /// Blueprint (or pipe segment token) under construction.
    pub in_progress: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basecamp {
    pub name: String,
    pub omt_pos: Tripoint,
    pub expansions: BTreeMap<CompassDir, Expansion>,
    pub inventory: CampInventory,
    /// Overmap tiles with a dug trench, ready for spikes.
    pub fortifications: Vec<Tripoint>,
    pub salt_water_pipes: Vec<SaltWaterPipe>,
    pub missions: Vec<CompanionMission>,
}

impl Basecamp {
    /// Found a camp. The base tile starts with the `camp` path's founding
    /// blueprint already built.
    pub fn new(name: impl Into<String>, omt_pos: Tripoint, blueprints: &BlueprintCatalog) -> Self {
        let mut base = Expansion {
            path: "camp".to_string(),
            pos: omt_pos,
            built: Vec::new(),
            provides: BTreeMap::new(),
            in_progress: None,
        };
        match blueprints.expansion_root("camp") {
            Some(root) => {
                base.built.push(root.id.clone());
                base.provides = root.provides.clone();
            }
            None => log::warn!("no founding blueprint for camps"),
        }
        Self {
            name: name.into(),
            omt_pos,
            expansions: BTreeMap::from([(CompassDir::Base, base)]),
            inventory: CampInventory::new(),
            fortifications: Vec::new(),
            salt_water_pipes: Vec::new(),
            missions: Vec::new(),
        }
    }

    /// Any expansion offers `capability`.
    pub fn has_provides(&self, capability: &str) -> bool {
        self.expansions
            .values()
            .any(|e| e.provides.get(capability).copied().unwrap_or(0) > 0)
    }

    pub fn expansion(&self, dir: CompassDir) -> Option<&Expansion> {
        self.expansions.get(&dir)
    }

    /// Expansions other than the camp tile itself.
    pub fn expansion_count(&self) -> usize {
        self.expansions.keys().filter(|&&d| d != CompassDir::Base).count()
    }

    /// Record `blueprint` as built on the expansion at `dir` and grant what
    /// it provides.
    pub fn complete_blueprint(&mut self, dir: CompassDir, blueprint: &Blueprint) {
        let Some(exp) = self.expansions.get_mut(&dir) else {
            log::warn!("{}: no expansion at {dir:?} to finish {}", self.name, blueprint.id);
            return;
        };
        if !exp.built.contains(&blueprint.id) {
            exp.built.push(blueprint.id.clone());
        }
        for (cap, &n) in &blueprint.provides {
            let slot = exp.provides.entry(cap.clone()).or_insert(0);
            *slot = (*slot).max(n);
        }
        exp.in_progress = None;
    }

    /// Companions currently assigned to `key`.
    pub fn workers(&self, key: &MissionKey) -> usize {
        self.missions.iter().filter(|m| &m.key == key).count()
    }

    pub fn mission_of(&self, npc: NpcId) -> Option<&CompanionMission> {
        self.missions.iter().find(|m| m.npc == npc)
    }

    pub fn pipe_for(&self, dir: CompassDir) -> Option<&SaltWaterPipe> {
        self.salt_water_pipes.iter().find(|p| p.expansion == dir)
    }

    fn pipe_for_mut(&mut self, dir: CompassDir) -> Option<&mut SaltWaterPipe> {
        self.salt_water_pipes.iter_mut().find(|p| p.expansion == dir)
    }

    /// Hand the stockpile's food to the larder. Food too rotten or too
    /// unpleasant to eat stays behind. Returns the kcal credited.
    pub fn distribute_food(&mut self, ledger: &mut FactionLedger, now: TimePoint) -> i64 {
        let pantry = self.has_provides("pantry");
        let credit = |item: &Item| distribution_credit(item.total_kcal(), item.fun, item.freshness(now), pantry);
        let eaten = self.inventory.drain_where(|i| i.is_food() && credit(i) > 0);
        let total: i64 = eaten.iter().map(credit).sum();
        if total > 0 {
            ledger.camp_food_supply(total);
            log::info!("{}: {} food items added {total} kcal to the larder", self.name, eaten.len());
        }
        total
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Everything a camp operation may read or change besides the camp itself.
pub struct CampEnv<'a> {
    pub now: TimePoint,
    pub config: &'a SimConfig,
    pub ledger: &'a mut FactionLedger,
    pub followers: &'a mut FollowerPool,
    pub map: &'a mut MapGrid,
    pub mapbuffer: &'a mut dyn MapBuffer,
    pub mapgen: &'a mut dyn MapGenerator,
    pub overmap: &'a mut dyn OvermapBuffer,
    pub stamps: &'a dyn MapgenUpdater,
    pub items: &'a dyn ItemGroupRoller,
    pub blueprints: &'a BlueprintCatalog,
    pub rng: &'a mut StdRng,
}

/// What code working on an open [`OmtSite`] may use.
pub struct SiteTools<'t> {
    pub now: TimePoint,
    pub rng: &'t mut StdRng,
    pub items: &'t dyn ItemGroupRoller,
    pub stamps: &'t dyn MapgenUpdater,
    pub registry: Arc<Registry>,
}

impl SiteTools<'_> {
    pub fn stamp(&self, id: &str, site: &mut OmtSite, orientation: StampOrientation) -> bool {
        self.stamps.run(id, site, orientation, &self.registry)
    }
}

impl CampEnv<'_> {
    pub fn recall_after(&self) -> TimeSpan {
        TimeSpan::hours(self.config.emergency_recall_hours)
    }

    /// Open overmap tile `omt`, run `f` on it and put it back.
    pub fn with_site<R>(&mut self, omt: Tripoint, f: impl FnOnce(&mut OmtSite, &mut SiteTools<'_>) -> R) -> R {
        let registry = self.map.registry_arc();
        let mut loader = SubmapLoader::new(&mut *self.mapbuffer, &mut *self.mapgen, &*self.overmap, &registry);
        let mut site = OmtSite::open(omt, &mut *self.map, &mut loader);
        let mut tools = SiteTools {
            now: self.now,
            rng: &mut *self.rng,
            items: self.items,
            stamps: self.stamps,
            registry: registry.clone(),
        };
        let out = f(&mut site, &mut tools);
        site.finish(&mut *self.map, &mut loader);
        out
    }

    /// Look at overmap tile `omt` without changing it. Submaps fetched from
    /// outside the live window are dropped afterwards, not stored.
    pub fn peek_site<R>(&mut self, omt: Tripoint, f: impl FnOnce(&OmtSite) -> R) -> R {
        let registry = self.map.registry_arc();
        let mut loader = SubmapLoader::new(&mut *self.mapbuffer, &mut *self.mapgen, &*self.overmap, &registry);
        let site = OmtSite::open(omt, &mut *self.map, &mut loader);
        let out = f(&site);
        site.release(&mut *self.map);
        out
    }

    /// Overmap terrain at the same z as `omt`.
    pub fn oter(&self, omt: Tripoint) -> String {
        self.overmap.ter(omt)
    }

    /// Terrain of every tile walked going from `from` to `to`.
    pub fn journey(&self, from: Tripoint, to: Tripoint) -> Vec<String> {
        line_to(from.xy(), to.xy(), 0)
            .into_iter()
            .map(|p| self.overmap.ter(p.with_z(from.z)))
            .collect()
    }
}
