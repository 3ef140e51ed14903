//! The reality bubble: a `MAPSIZE × MAPSIZE` window of live submaps.
//!
//! Coordinates handed to the grid are *local* tile coordinates: `(0, 0)` is
//! the north-west tile of the submap at `abs_sub`. The grid holds a single
//! z-level, `abs_sub.z`; any other z is out of bounds.
//!
//! Out-of-bounds reads return the null sentinel for whatever was asked
//! (`t_null`, no furniture, no items, no fields). Out-of-bounds writes are
//! dropped with a debug log. Derived caches live in [`super::cache`] and
//! are dirtied here on every edit that affects them.

use std::collections::BTreeMap;
use std::sync::Arc;

use ashfall_logic::constants::{MAPSIZE, MAP_TILES_X, MAP_TILES_Y, SEEX, SEEY};
use ashfall_logic::calendar::TimeSpan;
use ashfall_logic::coords::{rl_dist, submap_origin_tile, trig_dist, Point, Tripoint};

use super::cache::MapCaches;
use super::mapbuffer::SubmapLoader;
use super::submap::{FieldEntry, FieldLayer, SpawnPoint, Submap};
use super::vehicle::{Vehicle, VehicleId};
use crate::config::SimConfig;
use crate::error::PlaceError;
use crate::item::Item;
use crate::registry::{FieldTypeId, FurnId, FurnitureDef, Registry, TerFlag, TerId, TerrainDef, TrapId};

static NO_FIELDS: FieldLayer = BTreeMap::new();

/// Farthest an item spills from where it was dropped.
const SPILL_RADIUS: i32 = 2;

pub struct MapGrid {
    pub(super) registry: Arc<Registry>,
    pub(super) grid: Vec<Option<Box<Submap>>>,
    pub(super) abs_sub: Tripoint,
    pub(super) caches: MapCaches,
    pub(super) sight_range: i32,
    pub(super) ambient_light: u8,
    pub(super) viewer: Option<Tripoint>,
    pending_spawns: Vec<(Tripoint, SpawnPoint)>,
    item_capacity: usize,
}

impl MapGrid {
    /// An empty window at the origin. Every tile reads as out of bounds
    /// until submaps are loaded.
    pub fn new(registry: Arc<Registry>, config: &SimConfig) -> Self {
        Self {
            registry,
            grid: (0..MAPSIZE * MAPSIZE).map(|_| None).collect(),
            abs_sub: Tripoint::default(),
            caches: MapCaches::new(),
            sight_range: config.sight_range,
            ambient_light: config.ambient_light,
            viewer: None,
            pending_spawns: Vec::new(),
            item_capacity: config.tile_item_capacity,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_arc(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn abs_sub(&self) -> Tripoint {
        self.abs_sub
    }

    // ========================================================================
    // COORDINATES
    // ========================================================================

    pub fn inbounds(&self, p: Tripoint) -> bool {
        p.z == self.abs_sub.z && p.x >= 0 && p.y >= 0 && p.x < MAP_TILES_X && p.y < MAP_TILES_Y
    }

    /// Local tile → absolute tile.
    pub fn getabs(&self, p: Tripoint) -> Tripoint {
        Tripoint::new(p.x + self.abs_sub.x * SEEX, p.y + self.abs_sub.y * SEEY, p.z)
    }

    /// Absolute tile → local tile.
    pub fn getlocal(&self, p: Tripoint) -> Tripoint {
        Tripoint::new(p.x - self.abs_sub.x * SEEX, p.y - self.abs_sub.y * SEEY, p.z)
    }

    fn slot_index(&self, abs_sm: Tripoint) -> Option<usize> {
        let dx = abs_sm.x - self.abs_sub.x;
        let dy = abs_sm.y - self.abs_sub.y;
        if abs_sm.z != self.abs_sub.z || dx < 0 || dy < 0 || dx >= MAPSIZE || dy >= MAPSIZE {
            return None;
        }
        Some((dy * MAPSIZE + dx) as usize)
    }

    /// Absolute submap position of a grid slot.
    pub(super) fn slot_pos(&self, index: usize) -> Tripoint {
        let i = index as i32;
        self.abs_sub + Point::new(i % MAPSIZE, i / MAPSIZE)
    }

    /// Local tile of a slot's north-west corner.
    pub(super) fn slot_origin(index: usize) -> Point {
        let i = index as i32;
        Point::new(i % MAPSIZE * SEEX, i / MAPSIZE * SEEY)
    }

    pub(super) fn locate(&self, p: Tripoint) -> Option<(usize, Point)> {
        if !self.inbounds(p) {
            return None;
        }
        let index = (p.y / SEEY * MAPSIZE + p.x / SEEX) as usize;
        Some((index, Point::new(p.x % SEEX, p.y % SEEY)))
    }

    pub(super) fn submap(&self, p: Tripoint) -> Option<(&Submap, Point)> {
        let (i, l) = self.locate(p)?;
        self.grid[i].as_deref().map(|sm| (sm, l))
    }

    pub(super) fn submap_mut(&mut self, p: Tripoint) -> Option<(&mut Submap, Point)> {
        let (i, l) = self.locate(p)?;
        self.grid[i].as_deref_mut().map(|sm| (sm, l))
    }

    fn write_target(&mut self, p: Tripoint, what: &str) -> Option<(&mut Submap, Point)> {
        let found = self.submap_mut(p);
        if found.is_none() {
            log::debug!("dropped {what} write at {p:?}: outside the loaded map");
        }
        found
    }

    // ========================================================================
    // LOADING AND SHIFTING
    // ========================================================================

    /// Load the whole window with its north-west submap at `abs_sub`.
    pub fn load(&mut self, abs_sub: Tripoint, loader: &mut SubmapLoader) {
        self.abs_sub = abs_sub;
        for i in 0..self.grid.len() {
            let pos = self.slot_pos(i);
            let sm = loader.fetch(pos);
            self.install(i, sm);
        }
        self.caches.invalidate_all();
    }

    /// Fill the window with fresh submaps of one terrain.
    pub fn fill(&mut self, abs_sub: Tripoint, ter: TerId) {
        self.abs_sub = abs_sub;
        for i in 0..self.grid.len() {
            self.grid[i] = Some(Box::new(Submap::new(ter)));
        }
        self.caches.invalidate_all();
    }

    fn install(&mut self, index: usize, mut sm: Box<Submap>) {
        let origin = submap_origin_tile(self.slot_pos(index));
        for spawn in sm.spawns.drain(..) {
            self.pending_spawns.push((origin + spawn.pos, spawn));
        }
        self.grid[index] = Some(sm);
    }

    /// Move the window by `(sx, sy)` submaps. Submaps leaving the window are
    /// stored, the ones entering are loaded or generated.
    pub fn shift(&mut self, sx: i32, sy: i32, loader: &mut SubmapLoader) {
        if sx == 0 && sy == 0 {
            return;
        }
        let old_abs = self.abs_sub;
        let old: Vec<Option<Box<Submap>>> = std::mem::take(&mut self.grid);
        self.abs_sub = old_abs + Point::new(sx, sy);
        self.grid = (0..MAPSIZE * MAPSIZE).map(|_| None).collect();

        for (i, slot) in old.into_iter().enumerate() {
            let Some(sm) = slot else { continue };
            let pos = old_abs + Point::new(i as i32 % MAPSIZE, i as i32 / MAPSIZE);
            match self.slot_index(pos) {
                Some(ni) => self.grid[ni] = Some(sm),
                None => loader.store(pos, &sm),
            }
        }
        for i in 0..self.grid.len() {
            if self.grid[i].is_none() {
                let sm = loader.fetch(self.slot_pos(i));
                self.install(i, sm);
            }
        }
        if let Some(v) = self.viewer.as_mut() {
            *v = *v - Point::new(sx * SEEX, sy * SEEY);
        }
        self.caches.invalidate_all();
    }

    /// Store every live submap.
    pub fn save(&self, loader: &mut SubmapLoader) {
        for (i, slot) in self.grid.iter().enumerate() {
            if let Some(sm) = slot {
                loader.store(self.slot_pos(i), sm);
            }
        }
    }

    /// Spawns drained from submaps as they entered the window, in absolute
    /// tile coordinates.
    pub fn take_pending_spawns(&mut self) -> Vec<(Tripoint, SpawnPoint)> {
        std::mem::take(&mut self.pending_spawns)
    }

    /// Lend a live submap out, e.g. to an [`super::OmtSite`].
    pub fn take_submap(&mut self, abs_sm: Tripoint) -> Option<Box<Submap>> {
        let i = self.slot_index(abs_sm)?;
        let sm = self.grid[i].take();
        if sm.is_some() {
            self.caches.invalidate_all();
        }
        sm
    }

    pub fn put_submap(&mut self, abs_sm: Tripoint, sm: Box<Submap>) -> bool {
        match self.slot_index(abs_sm) {
            Some(i) => {
                self.grid[i] = Some(sm);
                self.caches.invalidate_all();
                true
            }
            None => false,
        }
    }

    pub fn submap_at(&self, abs_sm: Tripoint) -> Option<&Submap> {
        self.slot_index(abs_sm).and_then(|i| self.grid[i].as_deref())
    }

    pub fn loaded_submaps(&self) -> usize {
        self.grid.iter().filter(|s| s.is_some()).count()
    }

    pub fn set_viewer(&mut self, p: Option<Tripoint>) {
        self.viewer = p;
        self.caches.seen_dirty = true;
    }

    // ========================================================================
    // TERRAIN AND FURNITURE
    // ========================================================================

    pub fn ter(&self, p: Tripoint) -> TerId {
        self.submap(p).map(|(sm, l)| sm.ter(l)).unwrap_or(TerId::NULL)
    }

    pub fn ter_def(&self, p: Tripoint) -> &TerrainDef {
        self.registry.ter(self.ter(p))
    }

    pub fn ter_set(&mut self, p: Tripoint, id: TerId) {
        if let Some((sm, l)) = self.write_target(p, "terrain") {
            sm.set_ter(l, id);
            self.caches.terrain_changed();
        }
    }

    /// Terrain by name. Unknown names resolve to `t_null`.
    pub fn ter_set_named(&mut self, p: Tripoint, name: &str) {
        let id = self.registry.ter_id(name);
        self.ter_set(p, id);
    }

    pub fn furn(&self, p: Tripoint) -> FurnId {
        self.submap(p).map(|(sm, l)| sm.furn(l)).unwrap_or(FurnId::NULL)
    }

    pub fn furn_def(&self, p: Tripoint) -> &FurnitureDef {
        self.registry.furn(self.furn(p))
    }

    pub fn furn_set(&mut self, p: Tripoint, id: FurnId) {
        if let Some((sm, l)) = self.write_target(p, "furniture") {
            sm.set_furn(l, id);
            self.caches.terrain_changed();
        }
    }

    pub fn furn_set_named(&mut self, p: Tripoint, name: &str) {
        let id = self.registry.furn_id(name);
        self.furn_set(p, id);
    }

    pub fn has_furn(&self, p: Tripoint) -> bool {
        !self.furn(p).is_null()
    }

    /// Terrain or furniture carries `flag`.
    pub fn has_flag(&self, p: Tripoint, flag: TerFlag) -> bool {
        self.ter_def(p).has_flag(flag) || self.furn_def(p).has_flag(flag)
    }

    pub fn has_flag_ter(&self, p: Tripoint, flag: TerFlag) -> bool {
        self.ter_def(p).has_flag(flag)
    }

    pub fn has_flag_furn(&self, p: Tripoint, flag: TerFlag) -> bool {
        self.furn_def(p).has_flag(flag)
    }

    pub fn name(&self, p: Tripoint) -> &'static str {
        if self.has_furn(p) {
            self.furn_def(p).name
        } else {
            self.ter_def(p).name
        }
    }

    // ========================================================================
    // MOVEMENT AND SIGHT
    // ========================================================================

    /// Movement cost of `p`: 0 is impassable, anything else a multiplier.
    ///
    /// A vehicle part on the tile decides the cost on its own unless it
    /// belongs to `ignored`.
    pub fn move_cost(&mut self, p: Tripoint, ignored: Option<VehicleId>) -> i32 {
        if !self.inbounds(p) {
            return 0;
        }
        self.ensure_vehicle_cache();
        if let Some(slot) = self.caches.vehicle_slot(p) {
            if Some(slot.id) != ignored {
                return self.grid[slot.grid]
                    .as_deref()
                    .and_then(|sm| sm.vehicles.get(slot.vehicle))
                    .map(|v| v.part_move_cost(slot.part))
                    .unwrap_or(0);
            }
        }
        self.static_move_cost(p)
    }

    /// Terrain, furniture and fields only.
    pub fn static_move_cost(&self, p: Tripoint) -> i32 {
        let Some((sm, l)) = self.submap(p) else {
            return 0;
        };
        let ter = self.registry.ter(sm.ter(l)).move_cost;
        if ter <= 0 {
            return 0;
        }
        let furn = self.registry.furn(sm.furn(l)).move_cost_mod;
        if furn < 0 {
            return 0;
        }
        let fields: i32 = sm
            .fields(l)
            .iter()
            .map(|(ty, f)| ty.def().move_cost(f.density))
            .sum();
        (ter + furn + fields).max(1)
    }

    pub fn passable(&mut self, p: Tripoint) -> bool {
        self.move_cost(p, None) > 0
    }

    /// Whether light passes through `p`.
    pub fn trans(&mut self, p: Tripoint) -> bool {
        self.ensure_transparency();
        self.caches.transparent(p)
    }

    /// Line of sight from `from` to `to` within `range` tiles (Euclidean).
    ///
    /// `tc` is the Bresenham bias that worked last time; it's tried first
    /// and updated on success.
    pub fn sees(&mut self, from: Tripoint, to: Tripoint, range: i32, tc: &mut i32) -> bool {
        if !self.inbounds(from) || !self.inbounds(to) {
            return false;
        }
        if range >= 0 && trig_dist(from.xy(), to.xy()) > range as f64 {
            return false;
        }
        if from == to {
            return true;
        }
        self.ensure_transparency();
        let span = (to.x - from.x).abs().max((to.y - from.y).abs());
        let candidates = std::iter::once(*tc).chain((-span..=span).filter(|t| *t != *tc));
        for t in candidates {
            let line = ashfall_logic::coords::line_to(from.xy(), to.xy(), t);
            if line.last() != Some(&to.xy()) {
                continue;
            }
            let clear = line[..line.len() - 1]
                .iter()
                .all(|q| self.caches.transparent(q.with_z(from.z)));
            if clear {
                *tc = t;
                return true;
            }
        }
        false
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    pub fn items(&self, p: Tripoint) -> &[Item] {
        match self.submap(p) {
            Some((sm, l)) => sm.items(l),
            None => &[],
        }
    }

    pub fn take_items(&mut self, p: Tripoint) -> Vec<Item> {
        match self.submap_mut(p) {
            Some((sm, l)) => sm.take_items(l),
            None => Vec::new(),
        }
    }

    pub fn remove_item(&mut self, p: Tripoint, index: usize) -> Option<Item> {
        let (sm, l) = self.submap_mut(p)?;
        sm.remove_item(l, index)
    }

    /// Take up to `count` units of `id` from the tile. Returns units taken.
    pub fn use_items(&mut self, p: Tripoint, id: &str, count: i64) -> i64 {
        let Some((sm, l)) = self.submap_mut(p) else {
            return 0;
        };
        let mut stack = sm.items_mut(l);
        let mut taken = 0;
        stack.retain_mut(|item| {
            if taken >= count || item.type_id != id {
                return true;
            }
            if item.counts_by_charges() {
                let n = (item.charges as i64).min(count - taken);
                item.charges -= n as i32;
                taken += n;
                item.charges > 0
            } else {
                taken += 1;
                false
            }
        });
        taken
    }

    pub fn count_items(&self, p: Tripoint, id: &str) -> i64 {
        self.items(p).iter().filter(|i| i.type_id == id).map(Item::count).sum()
    }

    /// Whether `item` could go on `p` without spilling.
    pub fn can_put_item(&self, p: Tripoint, item: &Item) -> bool {
        let Some((sm, l)) = self.submap(p) else {
            return false;
        };
        let ter = self.registry.ter(sm.ter(l));
        let furn = self.registry.furn(sm.furn(l));
        let blocked = |f| ter.has_flag(f) || furn.has_flag(f);
        if blocked(TerFlag::NoItem) || blocked(TerFlag::Sealed) {
            return false;
        }
        if ter.move_cost == 0 && !ter.has_flag(TerFlag::PlaceItem) && !furn.has_flag(TerFlag::PlaceItem) {
            return false;
        }
        let stack = sm.items(l);
        stack.len() < self.item_capacity || stack.iter().any(|s| s.stacks_with(item))
    }

    /// Put `item` on `p`, or the nearest tile within the spill radius that
    /// takes it. Charges merge into an existing stack of the same type.
    pub fn add_item_or_charges(&mut self, p: Tripoint, item: Item) -> Result<Tripoint, PlaceError> {
        let mut candidates: Vec<Tripoint> = (-SPILL_RADIUS..=SPILL_RADIUS)
            .flat_map(|dy| (-SPILL_RADIUS..=SPILL_RADIUS).map(move |dx| p + Point::new(dx, dy)))
            .collect();
        candidates.sort_by(|a, b| {
            let da = (rl_dist(p.xy(), a.xy()), trig_dist(p.xy(), a.xy()));
            let db = (rl_dist(p.xy(), b.xy()), trig_dist(p.xy(), b.xy()));
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        let Some(target) = candidates.into_iter().find(|&q| self.can_put_item(q, &item)) else {
            return Err(PlaceError {
                item: item.type_id,
                pos: p,
            });
        };
        if let Some((sm, l)) = self.submap_mut(target) {
            let mut stack = sm.items_mut(l);
            match stack.iter_mut().find(|s| s.stacks_with(&item)) {
                Some(existing) => existing.charges += item.charges,
                None => stack.push(item),
            }
        }
        Ok(target)
    }

    pub fn active_item_count(&self) -> usize {
        self.grid.iter().flatten().map(|sm| sm.active_item_count()).sum()
    }

    // ========================================================================
    // TRAPS, RADIATION, GRAFFITI
    // ========================================================================

    /// The tile's trap, or the one built into its terrain.
    pub fn trap(&self, p: Tripoint) -> TrapId {
        let Some((sm, l)) = self.submap(p) else {
            return TrapId::None;
        };
        match sm.trap(l) {
            TrapId::None => self.registry.ter(sm.ter(l)).trap,
            t => t,
        }
    }

    pub fn trap_set(&mut self, p: Tripoint, trap: TrapId) {
        if let Some((sm, l)) = self.write_target(p, "trap") {
            sm.set_trap(l, trap);
        }
    }

    pub fn remove_trap(&mut self, p: Tripoint) {
        self.trap_set(p, TrapId::None);
    }

    pub fn radiation(&self, p: Tripoint) -> i32 {
        self.submap(p).map(|(sm, l)| sm.radiation(l)).unwrap_or(0)
    }

    pub fn set_radiation(&mut self, p: Tripoint, level: i32) {
        if let Some((sm, l)) = self.write_target(p, "radiation") {
            sm.set_radiation(l, level);
        }
    }

    /// Add `delta` to the tile's radiation, never going below zero.
    pub fn adjust_radiation(&mut self, p: Tripoint, delta: i32) {
        let level = (self.radiation(p) + delta).max(0);
        self.set_radiation(p, level);
    }

    pub fn graffiti(&self, p: Tripoint) -> Option<&str> {
        self.submap(p).and_then(|(sm, l)| sm.graffiti(l))
    }

    pub fn set_graffiti(&mut self, p: Tripoint, text: &str) {
        if let Some((sm, l)) = self.write_target(p, "graffiti") {
            sm.set_graffiti(l, text);
        }
    }

    pub fn clear_graffiti(&mut self, p: Tripoint) -> bool {
        self.submap_mut(p).is_some_and(|(sm, l)| sm.clear_graffiti(l))
    }

    // ========================================================================
    // FIELDS
    // ========================================================================

    pub fn fields(&self, p: Tripoint) -> &FieldLayer {
        match self.submap(p) {
            Some((sm, l)) => sm.fields(l),
            None => &NO_FIELDS,
        }
    }

    pub fn get_field(&self, p: Tripoint, ty: FieldTypeId) -> Option<FieldEntry> {
        self.submap(p).and_then(|(sm, l)| sm.field(l, ty))
    }

    /// Density of `ty` at `p`, 0 when absent.
    pub fn field_density(&self, p: Tripoint, ty: FieldTypeId) -> u8 {
        self.get_field(p, ty).map(|f| f.density).unwrap_or(0)
    }

    /// Add a field, stacking onto an existing one of the same type. Returns
    /// true if a new instance was created.
    pub fn add_field(&mut self, p: Tripoint, ty: FieldTypeId, density: u8, age: TimeSpan) -> bool {
        let Some((sm, l)) = self.write_target(p, "field") else {
            return false;
        };
        let created = sm.add_field(l, ty, density, age);
        self.caches.fields_changed();
        created
    }

    pub fn remove_field(&mut self, p: Tripoint, ty: FieldTypeId) -> bool {
        let removed = self.submap_mut(p).is_some_and(|(sm, l)| sm.remove_field(l, ty));
        if removed {
            self.caches.fields_changed();
        }
        removed
    }

    /// Set a field's density; zero or less removes it.
    pub fn set_field_density(&mut self, p: Tripoint, ty: FieldTypeId, density: i32) -> bool {
        let changed = self
            .submap_mut(p)
            .is_some_and(|(sm, l)| sm.set_field_density(l, ty, density));
        if changed {
            self.caches.fields_changed();
        }
        changed
    }

    pub fn set_field_age(&mut self, p: Tripoint, ty: FieldTypeId, age: TimeSpan) {
        if let Some((sm, l)) = self.submap_mut(p) {
            sm.set_field_age(l, ty, age);
        }
    }

    pub fn field_count(&self) -> usize {
        self.grid.iter().flatten().map(|sm| sm.field_count()).sum()
    }

    // ========================================================================
    // VEHICLES
    // ========================================================================

    /// Place a vehicle with its origin at local tile `p`. The submap
    /// containing `p` takes ownership.
    pub fn add_vehicle(&mut self, p: Tripoint, mut vehicle: Vehicle) -> bool {
        let Some((sm, l)) = self.write_target(p, "vehicle") else {
            return false;
        };
        vehicle.pos = l;
        sm.vehicles.push(Box::new(vehicle));
        self.caches.vehicles_dirty = true;
        true
    }

    /// Vehicle covering `p` and the index of the part there.
    pub fn vehicle_at(&mut self, p: Tripoint) -> Option<(&Vehicle, usize)> {
        self.ensure_vehicle_cache();
        let slot = self.caches.vehicle_slot(p)?;
        let v = self.grid[slot.grid].as_deref()?.vehicles.get(slot.vehicle)?;
        Some((v.as_ref(), slot.part))
    }

    fn find_vehicle(&self, id: VehicleId) -> Option<(usize, usize)> {
        self.grid.iter().enumerate().find_map(|(gi, slot)| {
            let vi = slot.as_deref()?.vehicle_index(id)?;
            Some((gi, vi))
        })
    }

    /// Local origin tile of a vehicle.
    pub fn vehicle_pos(&self, id: VehicleId) -> Option<Tripoint> {
        let (gi, vi) = self.find_vehicle(id)?;
        let v = &self.grid[gi].as_deref()?.vehicles[vi];
        Some((Self::slot_origin(gi) + v.pos).with_z(self.abs_sub.z))
    }

    /// Move a vehicle by `dp` tiles, handing it to another submap when it
    /// crosses a boundary. Fails if the destination is off the map.
    pub fn displace_vehicle(&mut self, id: VehicleId, dp: Point) -> bool {
        let Some((gi, vi)) = self.find_vehicle(id) else {
            return false;
        };
        let Some(from) = self.vehicle_pos(id) else {
            return false;
        };
        let Some((ni, nl)) = self.locate(from + dp) else {
            log::debug!("vehicle {id:?} can't leave the loaded map");
            return false;
        };
        if self.grid[ni].is_none() {
            return false;
        }
        if ni == gi {
            if let Some(sm) = self.grid[gi].as_deref_mut() {
                sm.vehicles[vi].pos = nl;
            }
        } else {
            let Some(mut v) = self.grid[gi].as_deref_mut().map(|sm| sm.vehicles.remove(vi)) else {
                return false;
            };
            v.pos = nl;
            if let Some(sm) = self.grid[ni].as_deref_mut() {
                sm.vehicles.push(v);
            }
        }
        self.caches.vehicles_dirty = true;
        true
    }

    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Box<Vehicle>> {
        let (gi, vi) = self.find_vehicle(id)?;
        let v = self.grid[gi].as_deref_mut()?.vehicles.remove(vi);
        self.caches.vehicles_dirty = true;
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::vehicle::VehiclePart;

    fn grid(fill: &str) -> MapGrid {
        let reg = Arc::new(Registry::builtin());
        let id = reg.ter_id(fill);
        let mut g = MapGrid::new(reg, &SimConfig::default());
        g.fill(Tripoint::new(10, -4, 0), id);
        g
    }

    #[test]
    fn coordinates_round_trip() {
        let g = grid("t_dirt");
        for p in [Tripoint::new(0, 0, 0), Tripoint::new(131, 131, 0), Tripoint::new(57, 3, 0)] {
            assert_eq!(g.getlocal(g.getabs(p)), p);
            let abs = g.getabs(p);
            assert_eq!(g.getabs(g.getlocal(abs)), abs);
        }
        assert_eq!(g.getabs(Tripoint::new(0, 0, 0)), Tripoint::new(120, -48, 0));
    }

    #[test]
    fn out_of_bounds_reads_are_sentinels() {
        let mut g = grid("t_dirt");
        for p in [Tripoint::new(-1, 0, 0), Tripoint::new(0, 132, 0), Tripoint::new(5, 5, 1)] {
            assert_eq!(g.ter(p), TerId::NULL);
            assert!(g.items(p).is_empty());
            assert!(g.fields(p).is_empty());
            assert_eq!(g.move_cost(p, None), 0);
            g.ter_set_named(p, "t_wall");
        }
        assert_eq!(g.ter(Tripoint::new(5, 5, 0)), g.registry().ter_id("t_dirt"));
    }

    #[test]
    fn furniture_and_walls_block() {
        let mut g = grid("t_dirt");
        let p = Tripoint::new(3, 3, 0);
        assert_eq!(g.move_cost(p, None), 2);
        g.furn_set_named(p, "f_bookcase");
        assert_eq!(g.move_cost(p, None), 0);
        g.furn_set(p, FurnId::NULL);
        g.furn_set_named(p, "f_chair");
        assert_eq!(g.move_cost(p, None), 3);
        g.ter_set_named(p, "t_wall");
        assert_eq!(g.move_cost(p, None), 0);
    }

    #[test]
    fn vehicles_override_unless_ignored() {
        let mut g = grid("t_dirt");
        let v = Vehicle::new(VehicleId(7), "cart")
            .with_part(VehiclePart::frame(Point::new(0, 0)))
            .with_part(VehiclePart::seat(Point::new(1, 0)));
        assert!(g.add_vehicle(Tripoint::new(10, 10, 0), v));
        assert_eq!(g.move_cost(Tripoint::new(10, 10, 0), None), 0);
        assert_eq!(g.move_cost(Tripoint::new(11, 10, 0), None), 4);
        assert_eq!(g.move_cost(Tripoint::new(10, 10, 0), Some(VehicleId(7))), 2);
    }

    #[test]
    fn displaced_vehicles_change_owner() {
        let mut g = grid("t_dirt");
        let v = Vehicle::new(VehicleId(1), "cart").with_part(VehiclePart::frame(Point::ZERO));
        g.add_vehicle(Tripoint::new(11, 5, 0), v);
        assert!(g.displace_vehicle(VehicleId(1), Point::new(1, 0)));
        assert_eq!(g.vehicle_pos(VehicleId(1)), Some(Tripoint::new(12, 5, 0)));
        let owner = g.abs_sub() + Point::new(1, 0);
        assert_eq!(g.submap_at(owner).map(|sm| sm.vehicles.len()), Some(1));
        assert_eq!(g.submap_at(g.abs_sub()).map(|sm| sm.vehicles.len()), Some(0));
        assert!(g.vehicle_at(Tripoint::new(12, 5, 0)).is_some());
        assert!(g.vehicle_at(Tripoint::new(11, 5, 0)).is_none());
        assert!(!g.displace_vehicle(VehicleId(1), Point::new(-20, 0)));
    }

    #[test]
    fn items_spill_and_charges_merge() {
        let mut g = grid("t_dirt");
        let p = Tripoint::new(20, 20, 0);
        g.ter_set_named(p, "t_wall");
        let placed = g.add_item_or_charges(p, Item::new("rock")).unwrap();
        assert_eq!(rl_dist(placed.xy(), p.xy()), 1);

        let q = Tripoint::new(30, 30, 0);
        let mut nails = Item::new("nail");
        nails.charges = 5;
        g.add_item_or_charges(q, nails.clone()).unwrap();
        g.add_item_or_charges(q, nails).unwrap();
        assert_eq!(g.items(q).len(), 1);
        assert_eq!(g.count_items(q, "nail"), 10);
        assert_eq!(g.use_items(q, "nail", 4), 4);
        assert_eq!(g.count_items(q, "nail"), 6);
    }

    #[test]
    fn placement_fails_when_surrounded() {
        let mut g = grid("t_wall");
        assert!(g.add_item_or_charges(Tripoint::new(40, 40, 0), Item::new("rock")).is_err());
    }

    #[test]
    fn radiation_never_goes_negative() {
        let mut g = grid("t_dirt");
        let p = Tripoint::new(1, 1, 0);
        g.adjust_radiation(p, 5);
        g.adjust_radiation(p, -20);
        assert_eq!(g.radiation(p), 0);
    }

    #[test]
    fn terrain_traps_show_through() {
        let mut g = grid("t_dirt");
        let p = Tripoint::new(4, 4, 0);
        g.ter_set_named(p, "t_pit");
        assert_eq!(g.trap(p), TrapId::Pit);
        g.trap_set(p, TrapId::BearTrap);
        assert_eq!(g.trap(p), TrapId::BearTrap);
    }

    #[test]
    fn sight_stops_at_walls_and_range() {
        let mut g = grid("t_dirt");
        let a = Tripoint::new(10, 10, 0);
        let b = Tripoint::new(20, 10, 0);
        let mut tc = 0;
        assert!(g.sees(a, b, 60, &mut tc));
        assert!(!g.sees(a, b, 5, &mut tc));
        g.ter_set_named(Tripoint::new(15, 10, 0), "t_wall");
        assert!(!g.sees(a, b, 60, &mut tc));
        g.ter_set_named(Tripoint::new(15, 10, 0), "t_window");
        assert!(g.sees(a, b, 60, &mut tc));
    }
}
