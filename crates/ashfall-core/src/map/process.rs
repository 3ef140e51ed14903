//! Per-turn field processing.
//!
//! One pass is a synchronous cellular-automaton step. Every field on every
//! loaded submap is read from a snapshot taken at the start of the pass, all
//! decisions are made against that snapshot, and only then are the edits
//! applied. A fire lit this pass can't spread again until the next one, and
//! gas can't hop two tiles in one turn.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use ashfall_logic::calendar::TimeSpan;
use ashfall_logic::constants::{MAX_FIELD_DENSITY, SEEX, SEEY};
use ashfall_logic::coords::{Point, Tripoint};

use super::grid::MapGrid;
use super::submap::FieldLayer;
use super::{dice, one_in, TurnContext};
use crate::registry::{FieldTypeId, TerFlag, TerFlags};

/// Per-pass age increment.
const TICK: TimeSpan = TimeSpan::seconds(1);

/// What a pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldReport {
    /// Field instances looked at.
    pub processed: usize,
    /// Instances that hit zero and were removed.
    pub removed: usize,
    /// Gas density moved into a neighbour.
    pub spread: usize,
    /// Tiles set alight by a neighbouring fire.
    pub ignited: Vec<Tripoint>,
    /// Tiles whose fuel was burnt away.
    pub burnt: Vec<Tripoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fuel {
    Items,
    Furniture,
    Terrain,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Update { p: Tripoint, ty: FieldTypeId, density: i32, age: TimeSpan },
    Burn { p: Tripoint, fuel: Fuel },
    Radiate { p: Tripoint, amount: i32 },
    Add { p: Tripoint, ty: FieldTypeId },
}

type Snapshot = HashMap<Tripoint, FieldLayer>;

fn snapshot_density(snap: &Snapshot, p: Tripoint, ty: FieldTypeId) -> u8 {
    snap.get(&p).and_then(|l| l.get(&ty)).map(|f| f.density).unwrap_or(0)
}

impl MapGrid {
    fn field_snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new();
        for (i, slot) in self.grid.iter().enumerate() {
            let Some(sm) = slot.as_deref() else { continue };
            if sm.field_count() == 0 {
                continue;
            }
            let origin = Self::slot_origin(i);
            for y in 0..SEEY {
                for x in 0..SEEX {
                    let l = Point::new(x, y);
                    let layer = sm.fields(l);
                    if !layer.is_empty() {
                        let p = (origin + l).with_z(self.abs_sub.z);
                        snap.insert(p, layer.clone());
                    }
                }
            }
        }
        snap
    }

    /// What a fire at `p` would feed on, best first.
    fn fire_fuel(&self, p: Tripoint) -> Option<(Fuel, TerFlag)> {
        if self.items(p).iter().any(|i| i.flammable) {
            return Some((Fuel::Items, TerFlag::Flammable));
        }
        let furn = self.furn_def(p);
        if furn.flags.is_flammable() {
            return Some((Fuel::Furniture, strongest_fuel_flag(furn.flags)));
        }
        let ter = self.ter_def(p);
        if ter.flags.is_flammable() {
            return Some((Fuel::Terrain, strongest_fuel_flag(ter.flags)));
        }
        None
    }

    /// Gas can drift into open, see-through tiles.
    fn open_to_gas(&self, p: Tripoint) -> bool {
        self.inbounds(p)
            && self.static_move_cost(p) > 0
            && self.ter_def(p).has_flag(TerFlag::Transparent)
            && (!self.has_furn(p) || self.furn_def(p).has_flag(TerFlag::Transparent))
    }

    /// Age, decay, burn and spread every field on the loaded map once.
    pub fn process_fields(&mut self, ctx: &mut TurnContext, fire_spread: bool) -> FieldReport {
        let snap = self.field_snapshot();
        let mut report = FieldReport::default();
        let mut ops: Vec<Op> = Vec::new();

        let mut tiles: Vec<&Tripoint> = snap.keys().collect();
        tiles.sort();
        for &p in tiles {
            let outside = self.is_outside(p);
            for (&ty, entry) in &snap[&p] {
                report.processed += 1;
                let def = ty.def();
                let mut density = entry.density as i32;
                let mut age = entry.age + TICK;
                if def.is_gas && outside {
                    age += TICK;
                }

                if def.halflife > TimeSpan::ZERO
                    && age > TimeSpan::ZERO
                    && dice(ctx.rng, 2, age.as_seconds()) > dice(ctx.rng, 2, def.halflife.as_seconds())
                {
                    density -= 1;
                    age = TimeSpan::ZERO;
                }

                match ty {
                    FieldTypeId::Fire => self.plan_fire(p, &snap, &mut density, &mut age, fire_spread, ctx, &mut ops),
                    FieldTypeId::NukeGas => ops.push(Op::Radiate { p, amount: density.max(0) }),
                    _ => {}
                }
                if def.is_gas && density > 1 {
                    let targets: Vec<Tripoint> = p
                        .neighbors()
                        .filter(|&q| self.open_to_gas(q) && (snapshot_density(&snap, q, ty) as i32) < density)
                        .collect();
                    if let Some(&q) = targets.choose(&mut *ctx.rng) {
                        density -= 1;
                        ops.push(Op::Add { p: q, ty });
                        report.spread += 1;
                    }
                }

                if density <= 0 {
                    report.removed += 1;
                }
                ops.push(Op::Update {
                    p,
                    ty,
                    density: density.min(MAX_FIELD_DENSITY as i32),
                    age,
                });
            }
        }

        self.apply_field_ops(ops, &mut report);
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_fire(
        &self,
        p: Tripoint,
        snap: &Snapshot,
        density: &mut i32,
        age: &mut TimeSpan,
        fire_spread: bool,
        ctx: &mut TurnContext,
        ops: &mut Vec<Op>,
    ) {
        if self.has_flag_ter(p, TerFlag::Liquid) {
            *density = 0;
            return;
        }
        let Some((fuel, flag)) = self.fire_fuel(p) else {
            // Nothing to burn: it dies down.
            *density -= 1;
            return;
        };

        let consumed = match flag {
            TerFlag::LFlammable => one_in(ctx.rng, 2),
            TerFlag::Flammable => *density >= 2 && one_in(ctx.rng, 3),
            _ => *density >= 3 && one_in(ctx.rng, 4),
        };
        if consumed || fuel == Fuel::Items {
            ops.push(Op::Burn { p, fuel });
            *age = TimeSpan::ZERO;
        }

        if *density < MAX_FIELD_DENSITY as i32 && one_in(ctx.rng, 2) {
            *density += 1;
        } else if fire_spread {
            let candidates: Vec<(Tripoint, bool)> = p
                .neighbors()
                .filter(|&q| self.inbounds(q) && snapshot_density(snap, q, FieldTypeId::Fire) == 0)
                .filter_map(|q| {
                    self.fire_fuel(q)
                        .map(|(_, flag)| (q, flag == TerFlag::LFlammable))
                })
                .collect();
            if let Some(&(q, light)) = candidates.choose(&mut *ctx.rng) {
                let chance = 10 * *density + if light { 20 } else { 0 };
                if ctx.rng.gen_range(0..100) < chance {
                    ops.push(Op::Add { p: q, ty: FieldTypeId::Fire });
                }
            }
        }

        if *density >= 2 && one_in(ctx.rng, 3) {
            ops.push(Op::Add { p, ty: FieldTypeId::Smoke });
        }
    }

    fn apply_field_ops(&mut self, ops: Vec<Op>, report: &mut FieldReport) {
        // Own updates first, then what neighbours push in.
        let (updates, adds): (Vec<Op>, Vec<Op>) = ops.into_iter().partition(|op| !matches!(op, Op::Add { .. }));
        for op in updates {
            match op {
                Op::Update { p, ty, density, age } => {
                    if self.set_field_density(p, ty, density) {
                        self.set_field_age(p, ty, age);
                    }
                }
                Op::Burn { p, fuel } => {
                    self.burn_fuel(p, fuel);
                    report.burnt.push(p);
                }
                Op::Radiate { p, amount } => self.adjust_radiation(p, amount),
                Op::Add { .. } => {}
            }
        }
        for op in adds {
            if let Op::Add { p, ty } = op {
                let fresh = self.field_density(p, ty) == 0;
                self.add_field(p, ty, 1, TimeSpan::ZERO);
                if ty == FieldTypeId::Fire && fresh {
                    report.ignited.push(p);
                }
            }
        }
    }

    fn burn_fuel(&mut self, p: Tripoint, fuel: Fuel) {
        match fuel {
            Fuel::Items => {
                if let Some((sm, l)) = self.submap_mut(p) {
                    sm.items_mut(l).retain(|i| !i.flammable);
                }
            }
            Fuel::Furniture => {
                let next = self.furn_def(p).burnt.unwrap_or("f_null");
                self.furn_set_named(p, next);
            }
            Fuel::Terrain => {
                let next = self.ter_def(p).burnt.unwrap_or("t_dirt");
                self.ter_set_named(p, next);
            }
        }
    }
}

fn strongest_fuel_flag(flags: TerFlags) -> TerFlag {
    if flags.has(TerFlag::LFlammable) {
        TerFlag::LFlammable
    } else if flags.has(TerFlag::Flammable) {
        TerFlag::Flammable
    } else {
        TerFlag::Flammable2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::item::{Item, ItemCatalog};
    use crate::registry::Registry;
    use ashfall_logic::calendar::TimePoint;
    use ashfall_logic::coords::rl_dist;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn grid() -> MapGrid {
        let reg = Arc::new(Registry::builtin());
        let dirt = reg.ter_id("t_dirt");
        let mut g = MapGrid::new(reg, &SimConfig::default());
        g.fill(Tripoint::new(0, 0, 0), dirt);
        g
    }

    fn all_densities(g: &MapGrid) -> Vec<u8> {
        g.field_snapshot()
            .values()
            .flat_map(|l| l.values().map(|f| f.density).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn densities_stay_in_range() {
        let mut g = grid();
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for x in 10..20 {
            g.furn_set_named(Tripoint::new(x, 10, 0), "f_hay");
        }
        g.add_field(Tripoint::new(10, 10, 0), FieldTypeId::Fire, 1, TimeSpan::ZERO);
        g.add_field(Tripoint::new(40, 40, 0), FieldTypeId::ToxicGas, 3, TimeSpan::ZERO);
        for _ in 0..200 {
            let mut ctx = TurnContext {
                now: TimePoint::START,
                rng: &mut rng,
                items: &cat,
            };
            g.process_fields(&mut ctx, true);
            assert!(all_densities(&g).iter().all(|&d| (1..=3).contains(&d)));
        }
    }

    #[test]
    fn gas_spreads_one_step_per_pass() {
        let mut g = grid();
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let src = Tripoint::new(60, 60, 0);
        g.add_field(src, FieldTypeId::TearGas, 3, TimeSpan::ZERO);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let report = g.process_fields(&mut ctx, false);
        assert_eq!(report.spread, 1);
        let reached: Vec<Tripoint> = g.field_snapshot().into_keys().collect();
        assert!(reached.iter().all(|&q| rl_dist(src.xy(), q.xy()) <= 1));
        assert_eq!(g.field_density(src, FieldTypeId::TearGas), 2);
    }

    #[test]
    fn water_puts_fire_out() {
        let mut g = grid();
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let p = Tripoint::new(5, 5, 0);
        g.ter_set_named(p, "t_water_sh");
        g.add_field(p, FieldTypeId::Fire, 3, TimeSpan::ZERO);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        g.process_fields(&mut ctx, true);
        assert_eq!(g.field_density(p, FieldTypeId::Fire), 0);
    }

    #[test]
    fn burning_items_are_consumed() {
        let mut g = grid();
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let p = Tripoint::new(8, 8, 0);
        let mut rag = Item::new("rag");
        rag.flammable = true;
        g.add_item_or_charges(p, rag).unwrap();
        g.add_item_or_charges(p, Item::new("rock")).unwrap();
        g.add_field(p, FieldTypeId::Fire, 1, TimeSpan::ZERO);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let report = g.process_fields(&mut ctx, false);
        assert_eq!(report.burnt, vec![p]);
        assert_eq!(g.count_items(p, "rag"), 0);
        assert_eq!(g.count_items(p, "rock"), 1);
    }

}
