//! Simulation engine - owns the world and runs it turn by turn.
//!
//! The engine holds the content tables, the live map window, the submap
//! store, the overmap, the followers, the faction's food ledger and every
//! camp. Camp commands go through [`SimulationEngine::dispatch`],
//! [`SimulationEngine::resolve`] and friends, which hand the camp a
//! [`CampEnv`] borrowing the rest of the world.

use std::io::{Read, Write};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::coords::Tripoint;
use ashfall_logic::food::FactionLedger;

use crate::camp::{
    Basecamp, BlueprintCatalog, CampEnv, DispatchReceipt, MissionEntry, MissionOrder, MissionReport,
    ResolutionOutcome,
};
use crate::config::SimConfig;
use crate::error::{ConfigError, DispatchError, ResolveError, SaveError};
use crate::item::ItemCatalog;
use crate::map::{FieldReport, MapBuffer, MapGenerator, MapGrid, MemoryMapBuffer, StampLibrary, SubmapLoader, TerrainMapgen, TurnContext};
use crate::npc::{FollowerPool, NpcId};
use crate::overmap::MemoryOvermap;
use crate::persistence::{load_world, save_world, SaveData, SAVE_VERSION};
use crate::registry::Registry;

/// One game turn.
pub const TURN: TimeSpan = TimeSpan::seconds(1);

/// Main simulation engine
pub struct SimulationEngine {
    pub config: SimConfig,
    pub items: ItemCatalog,
    pub stamps: StampLibrary,
    pub blueprints: BlueprintCatalog,
    /// The live window of loaded submaps
    pub map: MapGrid,
    pub overmap: MemoryOvermap,
    pub followers: FollowerPool,
    pub ledger: FactionLedger,
    pub camps: Vec<Basecamp>,
    pub now: TimePoint,
    mapbuffer: Box<dyn MapBuffer>,
    mapgen: Box<dyn MapGenerator>,
    rng: StdRng,
}

impl SimulationEngine {
    /// A fresh world with the built-in content and an in-memory submap
    /// store.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Arc::new(Registry::builtin());
        Ok(Self {
            items: ItemCatalog::builtin()?,
            stamps: StampLibrary::builtin()?,
            blueprints: BlueprintCatalog::builtin()?,
            map: MapGrid::new(registry, &config),
            overmap: MemoryOvermap::default(),
            followers: FollowerPool::new(),
            ledger: FactionLedger::new(config.starting_food),
            camps: Vec::new(),
            now: TimePoint::START,
            mapbuffer: Box::new(MemoryMapBuffer::new()),
            mapgen: Box::new(TerrainMapgen::new(config.seed)),
            rng: StdRng::seed_from_u64(config.seed),
            config,
        })
    }

    /// Swap in another submap store, e.g. a
    /// [`DiskMapBuffer`](crate::map::DiskMapBuffer).
    pub fn with_mapbuffer(mut self, buffer: Box<dyn MapBuffer>) -> Self {
        self.mapbuffer = buffer;
        self
    }

    /// The submap store.
    pub fn mapbuffer(&self) -> &dyn MapBuffer {
        &*self.mapbuffer
    }

    /// Move the live window so its corner submap is `abs_sub`.
    pub fn load_map(&mut self, abs_sub: Tripoint) {
        let registry = self.map.registry_arc();
        let mut loader = SubmapLoader::new(&mut *self.mapbuffer, &mut *self.mapgen, &self.overmap, &registry);
        self.map.save(&mut loader);
        self.map.load(abs_sub, &mut loader);
    }

    /// Advance the clock by `turns`, processing fields every turn when
    /// enabled.
    pub fn update(&mut self, turns: u32) -> FieldReport {
        let mut total = FieldReport::default();
        for _ in 0..turns {
            self.now += TURN;
            if !self.config.process_fields {
                continue;
            }
            let mut ctx = TurnContext {
                now: self.now,
                rng: &mut self.rng,
                items: &self.items,
            };
            let report = self.map.process_fields(&mut ctx, self.config.fire_spread);
            total.processed += report.processed;
            total.removed += report.removed;
            total.spread += report.spread;
            total.ignited.extend(report.ignited);
            total.burnt.extend(report.burnt);
        }
        total
    }

    /// Advance the clock without touching the map.
    pub fn advance(&mut self, span: TimeSpan) {
        self.now += span;
    }

    // ========================================================================
    // CAMPS
    // ========================================================================

    /// Found a camp on overmap tile `omt`. Returns its index.
    pub fn found_camp(&mut self, name: &str, omt: Tripoint) -> usize {
        self.camps.push(Basecamp::new(name, omt, &self.blueprints));
        log::info!("founded {name} at {omt:?}");
        self.camps.len() - 1
    }

    /// Run `f` on camp `idx` with the rest of the world borrowed.
    pub fn with_camp<R>(&mut self, idx: usize, f: impl FnOnce(&mut Basecamp, &mut CampEnv<'_>) -> R) -> Option<R> {
        let camp = self.camps.get_mut(idx)?;
        let mut env = CampEnv {
            now: self.now,
            config: &self.config,
            ledger: &mut self.ledger,
            followers: &mut self.followers,
            map: &mut self.map,
            mapbuffer: &mut *self.mapbuffer,
            mapgen: &mut *self.mapgen,
            overmap: &mut self.overmap,
            stamps: &self.stamps,
            items: &self.items,
            blueprints: &self.blueprints,
            rng: &mut self.rng,
        };
        Some(f(camp, &mut env))
    }

    pub fn dispatch(&mut self, camp: usize, npc: NpcId, order: MissionOrder) -> Result<DispatchReceipt, DispatchError> {
        self.with_camp(camp, |c, env| c.dispatch(env, npc, order))
            .unwrap_or_else(|| Err(DispatchError::InvalidTarget(format!("no camp #{camp}"))))
    }

    pub fn try_resolve(&self, camp: usize, npc: NpcId) -> Result<ResolutionOutcome, ResolveError> {
        let c = self
            .camps
            .get(camp)
            .ok_or_else(|| ResolveError::Invalid(format!("no camp #{camp}")))?;
        c.try_resolve(npc, self.now, TimeSpan::hours(self.config.emergency_recall_hours))
    }

    pub fn resolve(&mut self, camp: usize, npc: NpcId) -> Result<MissionReport, ResolveError> {
        self.with_camp(camp, |c, env| c.resolve(env, npc))
            .unwrap_or_else(|| Err(ResolveError::Invalid(format!("no camp #{camp}"))))
    }

    pub fn emergency_recall(&mut self, camp: usize, npc: NpcId) -> Result<MissionReport, ResolveError> {
        self.with_camp(camp, |c, env| c.emergency_recall(env, npc))
            .unwrap_or_else(|| Err(ResolveError::Invalid(format!("no camp #{camp}"))))
    }

    /// Move camp food into the larder. Returns kcal credited.
    pub fn distribute_food(&mut self, camp: usize) -> i64 {
        let now = self.now;
        match self.camps.get_mut(camp) {
            Some(c) => c.distribute_food(&mut self.ledger, now),
            None => 0,
        }
    }

    pub fn available_missions(&self, camp: usize) -> Vec<MissionEntry> {
        let recall_after = TimeSpan::hours(self.config.emergency_recall_hours);
        self.camps
            .get(camp)
            .map(|c| c.available_missions(&self.blueprints, self.now, recall_after))
            .unwrap_or_default()
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Save the world state to a writer. Live submaps are flushed to the
    /// submap store first.
    pub fn save<W: Write>(&mut self, writer: W) -> Result<(), SaveError> {
        let registry = self.map.registry_arc();
        let mut loader = SubmapLoader::new(&mut *self.mapbuffer, &mut *self.mapgen, &self.overmap, &registry);
        self.map.save(&mut loader);

        let rng_seed: u64 = self.rng.gen();
        self.rng = StdRng::seed_from_u64(rng_seed);
        let data = SaveData {
            version: SAVE_VERSION,
            now: self.now,
            config: self.config.clone(),
            ledger: self.ledger.clone(),
            followers: self.followers.records(),
            camps: self.camps.clone(),
            overmap: self.overmap.clone(),
            rng_seed,
        };
        save_world(writer, &data)
    }

    /// Load world state from a reader. The submap store must be the one the
    /// save was taken with; the live window starts empty.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = load_world(reader)?;
        self.map = MapGrid::new(self.map.registry_arc(), &data.config);
        self.config = data.config;
        self.now = data.now;
        self.ledger = data.ledger;
        self.followers = FollowerPool::from_records(data.followers);
        self.camps = data.camps;
        self.overmap = data.overmap;
        self.rng = StdRng::seed_from_u64(data.rng_seed);
        log::info!("loaded world at turn {}", self.now.0);
        Ok(())
    }
}
