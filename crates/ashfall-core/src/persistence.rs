//! Save/load of the world state.
//!
//! Uses bincode for the whole snapshot. Submaps are not part of it: they
//! live in the engine's [`MapBuffer`](crate::map::MapBuffer), which is
//! flushed when a save is taken. Followers come out of the ECS world as
//! flat records and are respawned on load.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::TimePoint;
use ashfall_logic::food::FactionLedger;

use crate::camp::Basecamp;
use crate::config::SimConfig;
use crate::error::SaveError;
use crate::npc::FollowerRecord;
use crate::overmap::MemoryOvermap;

/// Version number for the save format (increment when it changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of everything but the submaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub now: TimePoint,
    pub config: SimConfig,
    pub ledger: FactionLedger,
    pub followers: Vec<FollowerRecord>,
    pub camps: Vec<Basecamp>,
    pub overmap: MemoryOvermap,
    /// Reseeds the world RNG so a loaded game rolls the same dice.
    pub rng_seed: u64,
}

pub fn save_world<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    Ok(())
}

pub fn load_world<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camp::BlueprintCatalog;
    use ashfall_logic::coords::Tripoint;

    fn sample() -> SaveData {
        let blueprints = BlueprintCatalog::builtin().unwrap();
        SaveData {
            version: SAVE_VERSION,
            now: TimePoint(3600),
            config: SimConfig::default(),
            ledger: FactionLedger::new(5000),
            followers: Vec::new(),
            camps: vec![Basecamp::new("Ridge", Tripoint::new(2, 3, 0), &blueprints)],
            overmap: MemoryOvermap::default(),
            rng_seed: 42,
        }
    }

    #[test]
    fn snapshot_survives_a_save() {
        let data = sample();
        let mut buf = Vec::new();
        save_world(&mut buf, &data).unwrap();
        assert_eq!(load_world(buf.as_slice()).unwrap(), data);
    }

    #[test]
    fn other_versions_are_refused() {
        let mut data = sample();
        data.version = SAVE_VERSION + 1;
        let mut buf = Vec::new();
        save_world(&mut buf, &data).unwrap();
        assert!(matches!(
            load_world(buf.as_slice()),
            Err(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }
}
