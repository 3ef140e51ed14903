//! A whole overmap tile (2×2 submaps) opened for editing.
//!
//! Missions act on tiles far from the player. An [`OmtSite`] borrows the four
//! submaps out of the live grid when they're loaded there and pulls them
//! through the loader otherwise; [`OmtSite::finish`] puts every submap back
//! where it came from. [`OmtSite::release`] is for looking only: nothing
//! reaches the store.

use std::sync::Arc;

use ashfall_logic::constants::{OMT_SUBMAPS, OMT_TILES, SEEX, SEEY};
use ashfall_logic::coords::{omt_origin_submap, points_in_rectangle, Point, Tripoint};

use super::grid::MapGrid;
use super::mapbuffer::SubmapLoader;
use super::submap::Submap;
use crate::item::Item;
use crate::registry::{FurnId, Registry, TerFlag, TerId};

struct Slot {
    pos: Tripoint,
    submap: Box<Submap>,
    from_grid: bool,
}

pub struct OmtSite {
    omt: Tripoint,
    registry: Arc<Registry>,
    slots: Vec<Slot>,
}

impl OmtSite {
    pub fn open(omt: Tripoint, grid: &mut MapGrid, loader: &mut SubmapLoader) -> Self {
        let origin = omt_origin_submap(omt);
        let mut slots = Vec::with_capacity((OMT_SUBMAPS * OMT_SUBMAPS) as usize);
        for dy in 0..OMT_SUBMAPS {
            for dx in 0..OMT_SUBMAPS {
                let pos = origin + Point::new(dx, dy);
                let slot = match grid.take_submap(pos) {
                    Some(submap) => Slot {
                        pos,
                        submap,
                        from_grid: true,
                    },
                    None => Slot {
                        pos,
                        submap: loader.fetch(pos),
                        from_grid: false,
                    },
                };
                slots.push(slot);
            }
        }
        Self {
            omt,
            registry: grid.registry_arc(),
            slots,
        }
    }

    /// Return every submap to the grid or the store.
    pub fn finish(self, grid: &mut MapGrid, loader: &mut SubmapLoader) {
        for slot in self.slots {
            if slot.from_grid {
                grid.put_submap(slot.pos, slot.submap);
            } else {
                loader.store(slot.pos, &slot.submap);
            }
        }
    }

    /// Give borrowed submaps back to the grid and drop the rest unsaved.
    pub fn release(self, grid: &mut MapGrid) {
        for slot in self.slots.into_iter().filter(|s| s.from_grid) {
            grid.put_submap(slot.pos, slot.submap);
        }
    }

    pub fn omt(&self) -> Tripoint {
        self.omt
    }

    pub fn in_bounds(p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < OMT_TILES && p.y < OMT_TILES
    }

    /// Every tile of the site, row by row.
    pub fn points() -> impl Iterator<Item = Point> {
        points_in_rectangle(Point::ZERO, Point::new(OMT_TILES - 1, OMT_TILES - 1))
    }

    fn locate(&self, p: Point) -> Option<(usize, Point)> {
        if !Self::in_bounds(p) {
            log::debug!("site tile {p:?} outside overmap tile {:?}", self.omt);
            return None;
        }
        let index = (p.y / SEEY * OMT_SUBMAPS + p.x / SEEX) as usize;
        Some((index, Point::new(p.x % SEEX, p.y % SEEY)))
    }

    pub fn ter(&self, p: Point) -> TerId {
        self.locate(p)
            .map(|(i, l)| self.slots[i].submap.ter(l))
            .unwrap_or(TerId::NULL)
    }

    pub fn set_ter(&mut self, p: Point, id: TerId) {
        if let Some((i, l)) = self.locate(p) {
            self.slots[i].submap.set_ter(l, id);
        }
    }

    pub fn furn(&self, p: Point) -> FurnId {
        self.locate(p)
            .map(|(i, l)| self.slots[i].submap.furn(l))
            .unwrap_or(FurnId::NULL)
    }

    pub fn set_furn(&mut self, p: Point, id: FurnId) {
        if let Some((i, l)) = self.locate(p) {
            self.slots[i].submap.set_furn(l, id);
        }
    }

    pub fn ter_name(&self, p: Point) -> &'static str {
        self.registry.ter(self.ter(p)).id
    }

    pub fn furn_name(&self, p: Point) -> &'static str {
        self.registry.furn(self.furn(p)).id
    }

    /// Terrain or furniture flag.
    pub fn has_flag(&self, p: Point, flag: TerFlag) -> bool {
        self.registry.ter(self.ter(p)).has_flag(flag) || self.registry.furn(self.furn(p)).has_flag(flag)
    }

    pub fn items(&self, p: Point) -> &[Item] {
        match self.locate(p) {
            Some((i, l)) => self.slots[i].submap.items(l),
            None => &[],
        }
    }

    pub fn add_item(&mut self, p: Point, item: Item) {
        if let Some((i, l)) = self.locate(p) {
            self.slots[i].submap.add_item(l, item);
        }
    }

    pub fn take_items(&mut self, p: Point) -> Vec<Item> {
        match self.locate(p) {
            Some((i, l)) => self.slots[i].submap.take_items(l),
            None => Vec::new(),
        }
    }

    pub fn has_vehicle(&self, p: Point) -> bool {
        self.locate(p)
            .is_some_and(|(i, l)| self.slots[i].submap.has_vehicle_at(l))
    }

    /// Count of tiles with terrain `id`.
    pub fn count_ter(&self, id: TerId) -> usize {
        Self::points().filter(|&p| self.ter(p) == id).count()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::map::mapbuffer::{MapBuffer, MemoryMapBuffer};
    use crate::map::mapgen::TerrainMapgen;
    use crate::overmap::MemoryOvermap;

    #[test]
    fn off_window_edits_land_in_the_store() {
        let reg = Arc::new(Registry::builtin());
        let mut grid = MapGrid::new(reg.clone(), &SimConfig::default());
        let mut buf = MemoryMapBuffer::new();
        let mut gen = TerrainMapgen::new(1);
        let om = MemoryOvermap::default();
        let omt = Tripoint::new(40, 40, 0);

        let mut loader = SubmapLoader::new(&mut buf, &mut gen, &om, &reg);
        let mut site = OmtSite::open(omt, &mut grid, &mut loader);
        let dirt = reg.ter_id("t_dirt");
        site.set_ter(Point::new(23, 23), dirt);
        site.add_item(Point::new(0, 0), Item::new("log"));
        assert_eq!(site.ter(Point::new(23, 23)), dirt);
        assert_eq!(site.ter(Point::new(24, 0)), TerId::NULL);
        site.finish(&mut grid, &mut loader);

        let sm = buf.load(Tripoint::new(81, 81, 0)).unwrap().unwrap();
        assert_eq!(sm.ter(Point::new(11, 11)), dirt);
        let sm = buf.load(Tripoint::new(80, 80, 0)).unwrap().unwrap();
        assert_eq!(sm.items(Point::new(0, 0)).len(), 1);
    }
}
