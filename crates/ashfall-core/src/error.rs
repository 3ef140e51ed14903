//! Error types surfaced by the engine.
//!
//! Invalid coordinates and unknown ids never produce these; they degrade to
//! sentinels. Errors are reserved for storage failures, bad content, and
//! camp commands the player has to be told about.

use ashfall_logic::calendar::TimeSpan;
use ashfall_logic::coords::Tripoint;
use ashfall_logic::fortify::FortifyError;
use ashfall_logic::salt_pipe::PipeRouteError;
use ashfall_logic::skills::SkillId;
use thiserror::Error;

use crate::npc::NpcId;

/// Backing-store failures for a single submap.
#[derive(Debug, Error)]
pub enum MapBufferError {
    #[error("submap store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode submap {pos:?}: {source}")]
    Encode {
        pos: Tripoint,
        #[source]
        source: bincode::Error,
    },
    #[error("submap {pos:?} is corrupt: {reason}")]
    Corrupt { pos: Tripoint, reason: String },
}

/// Item placement failed everywhere within the spill radius.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no room for {item} near {pos:?}")]
pub struct PlaceError {
    pub item: String,
    pub pos: Tripoint,
}

/// Why a mission could not be dispatched. Nothing has changed when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("this camp has no expansion offering {0}")]
    MissingCapability(String),
    #[error("all {max} positions for this job are filled")]
    WorkersFull { max: usize },
    #[error("you don't have enough food stored to feed your companion ({need} kcal needed, {have} stored)")]
    InsufficientFood { need: i64, have: i64 },
    #[error("you don't have the materials: {item} needs {need}, camp has {have}")]
    MissingMaterials { item: String, need: i64, have: i64 },
    #[error("companion {0:?} isn't following you")]
    UnknownCompanion(NpcId),
    #[error("{0} is already away on a mission")]
    CompanionBusy(String),
    #[error("{name} needs {skill:?} {need} for this job")]
    SkillTooLow {
        name: String,
        skill: SkillId,
        need: i32,
    },
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("{0}")]
    Fortify(FortifyError),
    #[error("{0}")]
    Pipe(PipeRouteError),
    #[error("this camp already has the maximum of {0} expansions")]
    MaxExpansions(usize),
    #[error("you already have an expansion to the {0}")]
    ExpansionExists(String),
    #[error("unknown blueprint {0}")]
    UnknownBlueprint(String),
    #[error("{0} is already under construction")]
    AlreadyInProgress(String),
    #[error("your companion needs equipment to carry")]
    NoEquipment,
    #[error("there is nothing there to work on")]
    NothingToDo,
    #[error("you have no seeds to give your companions")]
    NoSeeds,
}

/// Why a mission could not be resolved or recalled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("no companion {0:?} is out on a mission from this camp")]
    UnknownMission(NpcId),
    #[error("the companion isn't due back for another {0}")]
    NotYetReturnable(TimeSpan),
    #[error("emergency recall is available after {0} away")]
    RecallTooEarly(TimeSpan),
    #[error("companion {0:?} no longer exists")]
    CompanionMissing(NpcId),
    /// An update-mapgen stamp was refused; the companion stays out.
    #[error("{0}, perhaps there is a vehicle in the way")]
    Blocked(String),
    #[error("{0}")]
    Invalid(String),
}

/// Bad built-in content or configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Save or load of the world state failed.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file encoding error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("save format {found} isn't supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
}
