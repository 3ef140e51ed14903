//! Farm plots on a farm expansion: plow, plant, harvest.
//!
//! The farm stamp fences in an 8×8 plot area in the middle of the tile.
//! Planted seeds sit on the tile as items under a seedling; after
//! [`GROWING_TIME`] the plant is ready and harvest turns the seed into its
//! fruit.

use rand::Rng;
use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::coords::{points_in_rectangle, Point};
use ashfall_logic::missions::MissionKind;

use crate::item::Item;
use crate::map::OmtSite;
use crate::registry::{FurnId, TerFlag};

use super::SiteTools;

/// Corners of the plot area inside the farm tile.
pub const PLOT_MIN: Point = Point::new(8, 8);
pub const PLOT_MAX: Point = Point::new(15, 15);

/// Seed to harvestable plant.
pub const GROWING_TIME: TimeSpan = TimeSpan::days(7);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmOp {
    Plow,
    Plant,
    Harvest,
}

impl FarmOp {
    pub fn from_kind(kind: MissionKind) -> Option<Self> {
        match kind {
            MissionKind::Plow => Some(Self::Plow),
            MissionKind::Plant => Some(Self::Plant),
            MissionKind::Harvest => Some(Self::Harvest),
            _ => None,
        }
    }

    pub fn kind(self) -> MissionKind {
        match self {
            Self::Plow => MissionKind::Plow,
            Self::Plant => MissionKind::Plant,
            Self::Harvest => MissionKind::Harvest,
        }
    }

    /// Work per plot.
    pub fn time_per_plot(self) -> TimeSpan {
        match self {
            Self::Plow => TimeSpan::minutes(5),
            Self::Plant => TimeSpan::minutes(1),
            Self::Harvest => TimeSpan::minutes(3),
        }
    }
}

fn plot_area() -> impl Iterator<Item = Point> {
    points_in_rectangle(PLOT_MIN, PLOT_MAX)
}

fn is_ripe(site: &OmtSite, p: Point, now: TimePoint) -> bool {
    match site.furn_name(p) {
        "f_plant_harvest" => true,
        "f_plant_seed" | "f_plant_mature" => site
            .items(p)
            .iter()
            .any(|i| i.is_seed() && now - i.birthday >= GROWING_TIME),
        _ => false,
    }
}

/// Plots `op` would work on right now.
pub fn plots(site: &OmtSite, op: FarmOp, now: TimePoint) -> Vec<Point> {
    plot_area()
        .filter(|&p| match op {
            FarmOp::Plow => site.furn(p).is_null() && site.has_flag(p, TerFlag::Plowable),
            FarmOp::Plant => site.furn(p).is_null() && site.has_flag(p, TerFlag::Plantable),
            FarmOp::Harvest => is_ripe(site, p, now),
        })
        .collect()
}

/// Result of a farm shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmWork {
    pub plots: usize,
    pub harvest: Vec<Item>,
}

/// Work every eligible plot. Planting uses up `seeds` one unit per plot.
pub fn work_plots(site: &mut OmtSite, tools: &mut SiteTools<'_>, op: FarmOp, seeds: &mut Vec<Item>) -> FarmWork {
    let reg = tools.registry.clone();
    let mut out = FarmWork::default();
    for p in plots(site, op, tools.now) {
        match op {
            FarmOp::Plow => site.set_ter(p, reg.ter_id("t_dirtmound")),
            FarmOp::Plant => {
                let Some(mut seed) = take_one(seeds) else {
                    break;
                };
                seed.birthday = tools.now;
                site.add_item(p, seed);
                site.set_furn(p, reg.furn_id("f_plant_seed"));
            }
            FarmOp::Harvest => {
                let (seed, rest): (Vec<Item>, Vec<Item>) = site.take_items(p).into_iter().partition(Item::is_seed);
                for item in rest {
                    site.add_item(p, item);
                }
                let Some(fruit) = seed.first().and_then(|s| s.fruit.clone()) else {
                    site.set_furn(p, FurnId::NULL);
                    continue;
                };
                let n = tools.rng.gen_range(1..=3);
                out.harvest.extend(tools.items.create_n(&fruit, n, tools.now));
                site.set_furn(p, FurnId::NULL);
                site.set_ter(p, reg.ter_id("t_dirt"));
            }
        }
        out.plots += 1;
    }
    out
}

fn take_one(seeds: &mut Vec<Item>) -> Option<Item> {
    let last = seeds.last_mut()?;
    if last.charges > 1 {
        last.charges -= 1;
        let mut one = last.clone();
        one.charges = 1;
        return Some(one);
    }
    seeds.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_time_scales_by_job() {
        assert!(FarmOp::Plow.time_per_plot() > FarmOp::Harvest.time_per_plot());
        assert!(FarmOp::Harvest.time_per_plot() > FarmOp::Plant.time_per_plot());
        assert_eq!(FarmOp::from_kind(MissionKind::Plant), Some(FarmOp::Plant));
        assert_eq!(FarmOp::from_kind(MissionKind::Menial), None);
    }

    #[test]
    fn seeds_are_taken_one_unit_at_a_time() {
        let mut stack = Item::new("seed_wheat");
        stack.charges = 2;
        stack.fruit = Some("wheat".into());
        let mut seeds = vec![stack];
        assert_eq!(take_one(&mut seeds).map(|s| s.charges), Some(1));
        assert_eq!(seeds[0].charges, 1);
        assert!(take_one(&mut seeds).is_some());
        assert!(take_one(&mut seeds).is_none());
    }
}
