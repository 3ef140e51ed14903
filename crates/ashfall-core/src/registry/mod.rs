//! Static lookup tables: terrain, furniture, fields, traps.
//!
//! The registry is populated once and shared read-only (behind an `Arc`) by
//! the map grid, the mapgen stamps and the camp code. Lookups of ids that
//! don't exist log a warning and hand back the null entry so callers never
//! have to branch on a failed lookup.

pub mod field;
pub mod terrain;
pub mod trap;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use field::{FieldDef, FieldTypeId};
pub use terrain::{
    BashDrop, BashInfo, ExamineAction, FurnId, FurnitureDef, TerFlag, TerFlags, TerId, TerrainDef,
};
pub use trap::{TrapDef, TrapId};

/// Display colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    Red,
    Green,
    Brown,
    Blue,
    Magenta,
    Cyan,
    LightGray,
    DarkGray,
    LightRed,
    LightGreen,
    Yellow,
    LightBlue,
    Pink,
    LightCyan,
    White,
}

pub struct Registry {
    terrain: Vec<TerrainDef>,
    furniture: Vec<FurnitureDef>,
    ter_index: HashMap<&'static str, TerId>,
    furn_index: HashMap<&'static str, FurnId>,
}

impl Registry {
    /// Build from content tables. Row 0 of each table is always the null
    /// entry: a table that doesn't start with `t_null` / `f_null` gets one
    /// put in front, and any other null row is dropped.
    pub fn new(mut terrain: Vec<TerrainDef>, mut furniture: Vec<FurnitureDef>) -> Self {
        if terrain.first().map(|d| d.id) != Some(terrain::NULL_TERRAIN) {
            terrain.retain(|d| d.id != terrain::NULL_TERRAIN);
            terrain.insert(0, terrain::null_terrain());
        }
        if furniture.first().map(|d| d.id) != Some(terrain::NULL_FURNITURE) {
            furniture.retain(|d| d.id != terrain::NULL_FURNITURE);
            furniture.insert(0, terrain::null_furniture());
        }
        let ter_index = terrain
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id, TerId(i as u16)))
            .collect();
        let furn_index = furniture
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id, FurnId(i as u16)))
            .collect();
        Self {
            terrain,
            furniture,
            ter_index,
            furn_index,
        }
    }

    /// The built-in content tables.
    pub fn builtin() -> Self {
        Self::new(terrain::builtin_terrain(), terrain::builtin_furniture())
    }

    pub fn ter(&self, id: TerId) -> &TerrainDef {
        match self.terrain.get(id.0 as usize) {
            Some(def) => def,
            None => {
                log::warn!("invalid terrain id {}", id.0);
                &self.terrain[0]
            }
        }
    }

    pub fn furn(&self, id: FurnId) -> &FurnitureDef {
        match self.furniture.get(id.0 as usize) {
            Some(def) => def,
            None => {
                log::warn!("invalid furniture id {}", id.0);
                &self.furniture[0]
            }
        }
    }

    pub fn try_ter_id(&self, name: &str) -> Option<TerId> {
        self.ter_index.get(name).copied()
    }

    /// Terrain id by name, `t_null` when unknown.
    pub fn ter_id(&self, name: &str) -> TerId {
        self.try_ter_id(name).unwrap_or_else(|| {
            log::warn!("unknown terrain {name:?}");
            TerId::NULL
        })
    }

    pub fn try_furn_id(&self, name: &str) -> Option<FurnId> {
        if name.is_empty() {
            return Some(FurnId::NULL);
        }
        self.furn_index.get(name).copied()
    }

    /// Furniture id by name, `f_null` when unknown or empty.
    pub fn furn_id(&self, name: &str) -> FurnId {
        self.try_furn_id(name).unwrap_or_else(|| {
            log::warn!("unknown furniture {name:?}");
            FurnId::NULL
        })
    }

    pub fn field(&self, ty: FieldTypeId) -> &'static FieldDef {
        ty.def()
    }

    pub fn trap(&self, trap: TrapId) -> TrapDef {
        trap.def()
    }

    pub fn terrain_count(&self) -> usize {
        self.terrain.len()
    }

    pub fn furniture_count(&self) -> usize {
        self.furniture.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
