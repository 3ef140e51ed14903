//! One `SEEX × SEEY` block of the world: the unit of persistence.
//!
//! Layers are flat arrays indexed by `y * SEEX + x`. Local coordinates must be
//! in range; the map grid checks bounds before calling in here. The
//! `active_item_count` and `field_count` counters are kept exact on every
//! mutation so the per-turn passes can skip idle submaps.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::constants::{MAX_FIELD_DENSITY, SEEX, SEEY};
use ashfall_logic::coords::Point;

use super::vehicle::{Vehicle, VehicleId};
use crate::item::Item;
use crate::registry::{FieldTypeId, FurnId, TerId, TrapId};

pub const SUBMAP_TILES: usize = (SEEX * SEEY) as usize;

/// One field instance on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// 1..=3
    pub density: u8,
    pub age: TimeSpan,
}

/// All fields on one tile, at most one per type.
pub type FieldLayer = BTreeMap<FieldTypeId, FieldEntry>;

/// Deferred monster spawn, placed when the submap first goes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub monster: String,
    pub count: i32,
    pub pos: Point,
    pub faction: String,
    pub friendly: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computer {
    pub name: String,
    pub security: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submap {
    ter: Vec<TerId>,
    frn: Vec<FurnId>,
    trp: Vec<TrapId>,
    rad: Vec<i32>,
    itm: Vec<Vec<Item>>,
    fld: Vec<FieldLayer>,
    graffiti: BTreeMap<usize, String>,
    pub vehicles: Vec<Box<Vehicle>>,
    pub spawns: Vec<SpawnPoint>,
    pub computer: Option<Computer>,
    /// Name of the basecamp anchored here, if any.
    pub camp: Option<String>,
    pub last_touched: TimePoint,
    active_item_count: usize,
    field_count: usize,
}

/// Mutable view of one tile's item stack. Fixes up the submap's active item
/// counter when dropped.
pub struct ItemStackMut<'a> {
    stack: &'a mut Vec<Item>,
    active_count: &'a mut usize,
    before: usize,
}

impl Deref for ItemStackMut<'_> {
    type Target = Vec<Item>;
    fn deref(&self) -> &Vec<Item> {
        self.stack
    }
}

impl DerefMut for ItemStackMut<'_> {
    fn deref_mut(&mut self) -> &mut Vec<Item> {
        self.stack
    }
}

impl Drop for ItemStackMut<'_> {
    fn drop(&mut self) {
        let after = self.stack.iter().filter(|i| i.active).count();
        *self.active_count = *self.active_count + after - self.before;
    }
}

impl Submap {
    /// A submap filled with one terrain and nothing else.
    pub fn new(fill: TerId) -> Self {
        Self {
            ter: vec![fill; SUBMAP_TILES],
            frn: vec![FurnId::NULL; SUBMAP_TILES],
            trp: vec![TrapId::None; SUBMAP_TILES],
            rad: vec![0; SUBMAP_TILES],
            itm: vec![Vec::new(); SUBMAP_TILES],
            fld: vec![FieldLayer::new(); SUBMAP_TILES],
            graffiti: BTreeMap::new(),
            vehicles: Vec::new(),
            spawns: Vec::new(),
            computer: None,
            camp: None,
            last_touched: TimePoint::START,
            active_item_count: 0,
            field_count: 0,
        }
    }

    pub fn in_bounds(p: Point) -> bool {
        p.x >= 0 && p.x < SEEX && p.y >= 0 && p.y < SEEY
    }

    fn idx(p: Point) -> usize {
        debug_assert!(Self::in_bounds(p), "submap-local point out of range: {:?}", p);
        (p.y * SEEX + p.x) as usize
    }

    // ── Terrain, furniture, traps, radiation ──────────────────────────────

    pub fn ter(&self, p: Point) -> TerId {
        self.ter[Self::idx(p)]
    }

    pub fn set_ter(&mut self, p: Point, id: TerId) {
        self.ter[Self::idx(p)] = id;
    }

    pub fn furn(&self, p: Point) -> FurnId {
        self.frn[Self::idx(p)]
    }

    pub fn set_furn(&mut self, p: Point, id: FurnId) {
        self.frn[Self::idx(p)] = id;
    }

    pub fn trap(&self, p: Point) -> TrapId {
        self.trp[Self::idx(p)]
    }

    pub fn set_trap(&mut self, p: Point, trap: TrapId) {
        self.trp[Self::idx(p)] = trap;
    }

    pub fn radiation(&self, p: Point) -> i32 {
        self.rad[Self::idx(p)]
    }

    pub fn set_radiation(&mut self, p: Point, level: i32) {
        self.rad[Self::idx(p)] = level.max(0);
    }

    // ── Items ─────────────────────────────────────────────────────────────

    pub fn items(&self, p: Point) -> &[Item] {
        &self.itm[Self::idx(p)]
    }

    pub fn items_mut(&mut self, p: Point) -> ItemStackMut<'_> {
        let stack = &mut self.itm[Self::idx(p)];
        let before = stack.iter().filter(|i| i.active).count();
        ItemStackMut {
            stack,
            active_count: &mut self.active_item_count,
            before,
        }
    }

    pub fn add_item(&mut self, p: Point, item: Item) {
        if item.active {
            self.active_item_count += 1;
        }
        self.itm[Self::idx(p)].push(item);
    }

    pub fn remove_item(&mut self, p: Point, index: usize) -> Option<Item> {
        let stack = &mut self.itm[Self::idx(p)];
        if index >= stack.len() {
            return None;
        }
        let item = stack.remove(index);
        if item.active {
            self.active_item_count -= 1;
        }
        Some(item)
    }

    pub fn take_items(&mut self, p: Point) -> Vec<Item> {
        let items = std::mem::take(&mut self.itm[Self::idx(p)]);
        self.active_item_count -= items.iter().filter(|i| i.active).count();
        items
    }

    pub fn active_item_count(&self) -> usize {
        self.active_item_count
    }

    // ── Fields ────────────────────────────────────────────────────────────

    pub fn fields(&self, p: Point) -> &FieldLayer {
        &self.fld[Self::idx(p)]
    }

    pub fn field(&self, p: Point, ty: FieldTypeId) -> Option<FieldEntry> {
        self.fld[Self::idx(p)].get(&ty).copied()
    }

    /// Add `density` of a field. Stacks onto an existing instance of the
    /// same type, capped at the maximum density. Returns true if a new
    /// instance was created.
    pub fn add_field(&mut self, p: Point, ty: FieldTypeId, density: u8, age: TimeSpan) -> bool {
        if ty == FieldTypeId::Null || density == 0 {
            return false;
        }
        let layer = &mut self.fld[Self::idx(p)];
        match layer.get_mut(&ty) {
            Some(entry) => {
                entry.density = entry.density.saturating_add(density).min(MAX_FIELD_DENSITY);
                false
            }
            None => {
                layer.insert(
                    ty,
                    FieldEntry {
                        density: density.min(MAX_FIELD_DENSITY),
                        age,
                    },
                );
                self.field_count += 1;
                true
            }
        }
    }

    pub fn remove_field(&mut self, p: Point, ty: FieldTypeId) -> bool {
        let removed = self.fld[Self::idx(p)].remove(&ty).is_some();
        if removed {
            self.field_count -= 1;
        }
        removed
    }

    /// Set the density of an existing field. Zero or less removes it.
    pub fn set_field_density(&mut self, p: Point, ty: FieldTypeId, density: i32) -> bool {
        if density <= 0 {
            return self.remove_field(p, ty);
        }
        match self.fld[Self::idx(p)].get_mut(&ty) {
            Some(entry) => {
                entry.density = density.min(MAX_FIELD_DENSITY as i32) as u8;
                true
            }
            None => false,
        }
    }

    pub fn set_field_age(&mut self, p: Point, ty: FieldTypeId, age: TimeSpan) {
        if let Some(entry) = self.fld[Self::idx(p)].get_mut(&ty) {
            entry.age = age;
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    // ── Graffiti ──────────────────────────────────────────────────────────

    pub fn graffiti(&self, p: Point) -> Option<&str> {
        self.graffiti.get(&Self::idx(p)).map(String::as_str)
    }

    pub fn set_graffiti(&mut self, p: Point, text: impl Into<String>) {
        self.graffiti.insert(Self::idx(p), text.into());
    }

    pub fn clear_graffiti(&mut self, p: Point) -> bool {
        self.graffiti.remove(&Self::idx(p)).is_some()
    }

    // ── Vehicles ──────────────────────────────────────────────────────────

    pub fn vehicle_index(&self, id: VehicleId) -> Option<usize> {
        self.vehicles.iter().position(|v| v.id == id)
    }

    /// Whether any vehicle part covers the local tile.
    pub fn has_vehicle_at(&self, p: Point) -> bool {
        self.vehicles
            .iter()
            .any(|v| v.parts.iter().any(|part| v.pos + part.mount == p))
    }

    // ── Consistency ───────────────────────────────────────────────────────

    /// Check layer sizes and counters. Used when decoding from storage.
    pub fn validate(&self) -> Result<(), String> {
        let sizes = [
            self.ter.len(),
            self.frn.len(),
            self.trp.len(),
            self.rad.len(),
            self.itm.len(),
            self.fld.len(),
        ];
        if sizes.iter().any(|&n| n != SUBMAP_TILES) {
            return Err(format!("layer sizes {:?}, expected {}", sizes, SUBMAP_TILES));
        }
        let active: usize = self.itm.iter().map(|s| s.iter().filter(|i| i.active).count()).sum();
        if active != self.active_item_count {
            return Err(format!("active item count {} but found {}", self.active_item_count, active));
        }
        let fields: usize = self.fld.iter().map(|l| l.len()).sum();
        if fields != self.field_count {
            return Err(format!("field count {} but found {}", self.field_count, fields));
        }
        if self
            .fld
            .iter()
            .flat_map(|l| l.values())
            .any(|f| f.density == 0 || f.density > MAX_FIELD_DENSITY)
        {
            return Err("field density out of range".to_string());
        }
        if let Some(&bad) = self.graffiti.keys().find(|&&k| k >= SUBMAP_TILES) {
            return Err(format!("graffiti index {bad} out of range"));
        }
        Ok(())
    }
}
