//! Ashfall Core - tile map simulation and faction camp engine
//!
//! A post-apocalyptic world built out of 12×12-tile submaps. A square
//! window of submaps around the player is live: fields age, spread and burn
//! every turn, terrain can be bashed down, and roofs fall in when their
//! supports go. Everything outside the window sits in a submap store.
//!
//! On top of the map, a faction runs camps. Companions are sent out on
//! missions (gathering, logging, building expansions, fortifying, farming,
//! scouting) and the camp settles up with them when they come back.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Engine tunables loaded from JSON |
//! | [`error`] | Error types for storage, content and camp commands |
//! | [`registry`] | Terrain, furniture, field and trap definitions |
//! | [`item`] | Items, item types and loot groups |
//! | [`npc`] | Followers as ECS entities, mission markers |
//! | [`overmap`] | Overmap terrain, notes and seen tiles |
//! | [`map`] | Submaps, the live grid, fields, bashing, mapgen |
//! | [`camp`] | Basecamps, expansions and companion missions |
//! | [`engine`] | The simulation engine tying it all together |
//! | [`persistence`] | Save/load of the world state |
//!
//! # Example
//!
//! ```rust,no_run
//! use ashfall_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default()).unwrap();
//! let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
//! let ash = engine.followers.spawn("Ash", SkillProfile::default());
//! engine.dispatch(camp, ash, MissionOrder::Menial).unwrap();
//!
//! engine.update(3 * 3600);
//! let report = engine.resolve(camp, ash).unwrap();
//! println!("{}", report.messages.join("\n"));
//! ```

pub mod camp;
pub mod config;
pub mod engine;
pub mod error;
pub mod item;
pub mod map;
pub mod npc;
pub mod overmap;
pub mod persistence;
pub mod registry;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::camp::{Basecamp, MissionKey, MissionOrder, MissionReport, ResolutionOutcome};
    pub use crate::config::SimConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::{DispatchError, ResolveError};
    pub use crate::item::{Item, ItemCatalog, ItemGroupRoller};
    pub use crate::map::{MapGrid, OmtSite};
    pub use crate::npc::{FollowerPool, Npc, NpcId};
    pub use crate::overmap::{MemoryOvermap, OvermapBuffer};
    pub use ashfall_logic::calendar::{TimePoint, TimeSpan};
    pub use ashfall_logic::coords::{Point, Tripoint};
    pub use ashfall_logic::direction::CompassDir;
    pub use ashfall_logic::missions::MissionKind;
    pub use ashfall_logic::skills::{SkillId, SkillProfile};
}
