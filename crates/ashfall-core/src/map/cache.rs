//! Derived per-tile caches over the live window.
//!
//! Each cache is a flat array over every local tile of the window, indexed
//! `y * MAP_TILES_X + x`, with its own dirty flag. Edits set the flags; the
//! first read afterwards rebuilds what it depends on. `build_map_cache`
//! rebuilds everything in dependency order: transparency, outside, light,
//! then seen.

use std::collections::HashMap;

use ashfall_logic::constants::{MAP_TILES_X, MAP_TILES_Y};
use ashfall_logic::coords::{line_to, trig_dist, Point, Tripoint};

use super::grid::MapGrid;
use super::vehicle::VehicleId;
use crate::registry::{FieldTypeId, TerFlag};

const TILE_COUNT: usize = (MAP_TILES_X * MAP_TILES_Y) as usize;

/// Light a fire field gives off per density level.
const FIRE_LIGHT: u8 = 30;
/// How far fire light reaches, in tiles.
const FIRE_LIGHT_RADIUS: i32 = 4;

/// Where a vehicle part sits in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct VehicleSlot {
    pub id: VehicleId,
    pub grid: usize,
    pub vehicle: usize,
    pub part: usize,
    pub obstacle: bool,
}

pub struct MapCaches {
    transparency: Vec<bool>,
    outside: Vec<bool>,
    light: Vec<u8>,
    seen: Vec<bool>,
    vehicles: HashMap<Tripoint, VehicleSlot>,
    pub(super) transparency_dirty: bool,
    pub(super) outside_dirty: bool,
    pub(super) light_dirty: bool,
    pub(super) seen_dirty: bool,
    pub(super) vehicles_dirty: bool,
}

fn index(p: Tripoint) -> Option<usize> {
    if p.x < 0 || p.y < 0 || p.x >= MAP_TILES_X || p.y >= MAP_TILES_Y {
        return None;
    }
    Some((p.y * MAP_TILES_X + p.x) as usize)
}

impl MapCaches {
    pub fn new() -> Self {
        Self {
            transparency: vec![false; TILE_COUNT],
            outside: vec![false; TILE_COUNT],
            light: vec![0; TILE_COUNT],
            seen: vec![false; TILE_COUNT],
            vehicles: HashMap::new(),
            transparency_dirty: true,
            outside_dirty: true,
            light_dirty: true,
            seen_dirty: true,
            vehicles_dirty: true,
        }
    }

    pub fn invalidate_all(&mut self) {
        self.transparency_dirty = true;
        self.outside_dirty = true;
        self.light_dirty = true;
        self.seen_dirty = true;
        self.vehicles_dirty = true;
    }

    pub(super) fn terrain_changed(&mut self) {
        self.transparency_dirty = true;
        self.outside_dirty = true;
        self.light_dirty = true;
        self.seen_dirty = true;
    }

    pub(super) fn fields_changed(&mut self) {
        self.transparency_dirty = true;
        self.light_dirty = true;
        self.seen_dirty = true;
    }

    pub fn any_dirty(&self) -> bool {
        self.transparency_dirty || self.outside_dirty || self.light_dirty || self.seen_dirty || self.vehicles_dirty
    }

    /// Raw read; callers rebuild first.
    pub(super) fn transparent(&self, p: Tripoint) -> bool {
        index(p).is_some_and(|i| self.transparency[i])
    }

    pub(super) fn vehicle_slot(&self, p: Tripoint) -> Option<VehicleSlot> {
        self.vehicles.get(&p).copied()
    }
}

impl Default for MapCaches {
    fn default() -> Self {
        Self::new()
    }
}

impl MapGrid {
    /// Rebuild every dirty cache, in dependency order.
    pub fn build_map_cache(&mut self) {
        self.ensure_transparency();
        self.ensure_outside();
        self.ensure_light();
        self.ensure_seen();
        self.ensure_vehicle_cache();
    }

    pub(super) fn ensure_transparency(&mut self) {
        if !self.caches.transparency_dirty {
            return;
        }
        let mut cache = std::mem::take(&mut self.caches.transparency);
        cache.resize(TILE_COUNT, false);
        for (i, t) in cache.iter_mut().enumerate() {
            let p = tile_of(i, self.abs_sub.z);
            *t = self.submap(p).is_some_and(|(sm, l)| {
                self.registry.ter(sm.ter(l)).has_flag(TerFlag::Transparent)
                    && self.registry.furn(sm.furn(l)).has_flag(TerFlag::Transparent)
                    && sm.fields(l).iter().all(|(ty, f)| ty.def().is_transparent(f.density))
            });
        }
        self.caches.transparency = cache;
        self.caches.transparency_dirty = false;
    }

    pub(super) fn ensure_outside(&mut self) {
        if !self.caches.outside_dirty {
            return;
        }
        let mut cache = std::mem::take(&mut self.caches.outside);
        cache.resize(TILE_COUNT, false);
        for (i, o) in cache.iter_mut().enumerate() {
            let p = tile_of(i, self.abs_sub.z);
            *o = self.submap(p).is_some_and(|(sm, l)| {
                !self.registry.ter(sm.ter(l)).has_flag(TerFlag::Indoors)
                    && !self.registry.furn(sm.furn(l)).has_flag(TerFlag::Indoors)
            });
        }
        self.caches.outside = cache;
        self.caches.outside_dirty = false;
    }

    fn ensure_light(&mut self) {
        if !self.caches.light_dirty && !self.caches.transparency_dirty && !self.caches.outside_dirty {
            return;
        }
        self.ensure_transparency();
        self.ensure_outside();
        let ambient = self.ambient_light;
        let mut light: Vec<u8> = self
            .caches
            .outside
            .iter()
            .map(|&outside| if outside { ambient } else { 0 })
            .collect();

        let fires: Vec<(Tripoint, u8)> = (0..TILE_COUNT)
            .map(|i| tile_of(i, self.abs_sub.z))
            .filter_map(|p| {
                let d = self.field_density(p, FieldTypeId::Fire);
                (d > 0).then_some((p, d))
            })
            .collect();
        for (src, density) in fires {
            let strength = FIRE_LIGHT.saturating_mul(density);
            for dy in -FIRE_LIGHT_RADIUS..=FIRE_LIGHT_RADIUS {
                for dx in -FIRE_LIGHT_RADIUS..=FIRE_LIGHT_RADIUS {
                    let q = src + Point::new(dx, dy);
                    let Some(qi) = index(q) else { continue };
                    let dist = trig_dist(src.xy(), q.xy());
                    if dist > FIRE_LIGHT_RADIUS as f64 {
                        continue;
                    }
                    let path = line_to(src.xy(), q.xy(), 0);
                    let lit = path.len() <= 1
                        || path[..path.len() - 1]
                            .iter()
                            .all(|m| self.caches.transparent(m.with_z(src.z)));
                    if lit {
                        let add = (strength as f64 / (1.0 + dist)) as u8;
                        light[qi] = light[qi].saturating_add(add);
                    }
                }
            }
        }
        self.caches.light = light;
        self.caches.light_dirty = false;
    }

    fn ensure_seen(&mut self) {
        if !self.caches.seen_dirty && !self.caches.light_dirty && !self.caches.transparency_dirty {
            return;
        }
        self.ensure_light();
        let mut seen = vec![false; TILE_COUNT];
        if let Some(viewer) = self.viewer.filter(|v| self.inbounds(*v)) {
            let range = self.sight_range;
            for (i, s) in seen.iter_mut().enumerate() {
                let p = tile_of(i, viewer.z);
                if trig_dist(viewer.xy(), p.xy()) > range as f64 {
                    continue;
                }
                let adjacent = (p.x - viewer.x).abs() <= 1 && (p.y - viewer.y).abs() <= 1;
                if !adjacent && self.caches.light[i] == 0 {
                    continue;
                }
                let path = line_to(viewer.xy(), p.xy(), 0);
                *s = path.len() <= 1
                    || path[..path.len() - 1]
                        .iter()
                        .all(|m| self.caches.transparent(m.with_z(viewer.z)));
            }
        }
        self.caches.seen = seen;
        self.caches.seen_dirty = false;
    }

    pub(super) fn ensure_vehicle_cache(&mut self) {
        if !self.caches.vehicles_dirty {
            return;
        }
        let z = self.abs_sub.z;
        let mut map: HashMap<Tripoint, VehicleSlot> = HashMap::new();
        for (gi, slot) in self.grid.iter().enumerate() {
            let Some(sm) = slot.as_deref() else { continue };
            let origin = MapGrid::slot_origin(gi);
            for (vi, v) in sm.vehicles.iter().enumerate() {
                for (pi, part) in v.parts.iter().enumerate() {
                    let p = (origin + v.pos + part.mount).with_z(z);
                    let entry = VehicleSlot {
                        id: v.id,
                        grid: gi,
                        vehicle: vi,
                        part: pi,
                        obstacle: part.obstacle,
                    };
                    match map.get(&p) {
                        Some(existing) if existing.obstacle || !entry.obstacle => {}
                        _ => {
                            map.insert(p, entry);
                        }
                    }
                }
            }
        }
        self.caches.vehicles = map;
        self.caches.vehicles_dirty = false;
    }

    /// Whether the tile is open to the sky.
    pub fn is_outside(&mut self, p: Tripoint) -> bool {
        self.ensure_outside();
        self.inbounds(p) && index(p).is_some_and(|i| self.caches.outside[i])
    }

    pub fn light_at(&mut self, p: Tripoint) -> u8 {
        self.ensure_light();
        if !self.inbounds(p) {
            return 0;
        }
        index(p).map(|i| self.caches.light[i]).unwrap_or(0)
    }

    /// Whether the viewer can currently see the tile.
    pub fn is_seen(&mut self, p: Tripoint) -> bool {
        self.ensure_seen();
        self.inbounds(p) && index(p).is_some_and(|i| self.caches.seen[i])
    }

    pub fn caches_dirty(&self) -> bool {
        self.caches.any_dirty()
    }
}

fn tile_of(i: usize, z: i32) -> Tripoint {
    let i = i as i32;
    Tripoint::new(i % MAP_TILES_X, i / MAP_TILES_X, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::registry::Registry;
    use ashfall_logic::calendar::TimeSpan;
    use std::sync::Arc;

    fn grid() -> MapGrid {
        let reg = Arc::new(Registry::builtin());
        let dirt = reg.ter_id("t_dirt");
        let mut config = SimConfig::default();
        config.ambient_light = 0;
        let mut g = MapGrid::new(reg, &config);
        g.fill(Tripoint::new(0, 0, 0), dirt);
        g
    }

    #[test]
    fn edits_dirty_and_reads_rebuild() {
        let mut g = grid();
        g.build_map_cache();
        assert!(!g.caches_dirty());
        let p = Tripoint::new(5, 5, 0);
        assert!(g.trans(p));
        g.ter_set_named(p, "t_wall");
        assert!(g.caches_dirty());
        assert!(!g.trans(p));
        g.add_field(Tripoint::new(6, 6, 0), FieldTypeId::Smoke, 3, TimeSpan::ZERO);
        assert!(!g.trans(Tripoint::new(6, 6, 0)));
    }

    #[test]
    fn floors_are_inside() {
        let mut g = grid();
        let p = Tripoint::new(8, 8, 0);
        assert!(g.is_outside(p));
        g.ter_set_named(p, "t_floor");
        assert!(!g.is_outside(p));
    }

    #[test]
    fn fire_lights_the_dark() {
        let mut g = grid();
        let fire = Tripoint::new(20, 20, 0);
        assert_eq!(g.light_at(Tripoint::new(21, 20, 0)), 0);
        g.add_field(fire, FieldTypeId::Fire, 2, TimeSpan::ZERO);
        assert!(g.light_at(Tripoint::new(21, 20, 0)) > 0);
        assert_eq!(g.light_at(Tripoint::new(30, 20, 0)), 0);
    }

    #[test]
    fn viewer_sees_only_lit_tiles_in_line() {
        let mut g = grid();
        let viewer = Tripoint::new(10, 10, 0);
        g.set_viewer(Some(viewer));
        assert!(g.is_seen(Tripoint::new(11, 10, 0)));
        assert!(!g.is_seen(Tripoint::new(15, 10, 0)));

        g.add_field(Tripoint::new(15, 10, 0), FieldTypeId::Fire, 3, TimeSpan::ZERO);
        assert!(g.is_seen(Tripoint::new(15, 10, 0)));
        g.ter_set_named(Tripoint::new(13, 10, 0), "t_wall");
        assert!(!g.is_seen(Tripoint::new(15, 10, 0)));
    }
}
