//! Felling trees on an overmap tile for logging and clearcutting.

use rand::Rng;

use ashfall_logic::coords::{line_to, Point};
use ashfall_logic::direction::CompassDir;

use crate::item::Item;
use crate::map::OmtSite;
use crate::registry::{FurnId, TerFlag};

use super::SiteTools;

/// Trees and young trees on the site a crew would expect to fell at
/// `chance` percent.
pub fn estimate_trees(site: &OmtSite, chance: i64) -> (i64, i64) {
    let (mut trees, mut young) = (0, 0);
    for p in OmtSite::points() {
        if site.has_flag(p, TerFlag::Tree) {
            trees += 1;
        } else if site.has_flag(p, TerFlag::YoungTree) {
            young += 1;
        }
    }
    (trees * chance / 100, young * chance / 100)
}

/// Trees still standing on the site.
pub fn standing_trees(site: &OmtSite) -> usize {
    OmtSite::points().filter(|&p| site.has_flag(p, TerFlag::Tree)).count()
}

/// What a logging crew did on one tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Felled {
    pub trees: i64,
    pub young_trees: i64,
    /// Logs and sticks gathered up for the trip home.
    pub haul: Vec<Item>,
}

/// Fell each tree with `chance` percent. A felled tree drops in a random
/// direction leaving a line of trunk. With `buck` set the trunks are cut
/// into logs and everything on the ground is gathered up.
pub fn cut_down_trees(site: &mut OmtSite, tools: &mut SiteTools<'_>, chance: i32, buck: bool) -> Felled {
    let reg = tools.registry.clone();
    let trunk = reg.ter_id("t_trunk");
    let dirt = reg.ter_id("t_dirt");
    let mut out = Felled::default();

    let trees: Vec<Point> = OmtSite::points().filter(|&p| site.has_flag(p, TerFlag::Tree)).collect();
    for p in trees {
        if tools.rng.gen_range(0..100) >= chance {
            continue;
        }
        let dir = CompassDir::EXPANSIONS[tools.rng.gen_range(0..CompassDir::EXPANSIONS.len())];
        let length = tools.rng.gen_range(3..=8);
        let tip = Point::new(p.x + dir.offset().x * length, p.y + dir.offset().y * length);
        for q in line_to(p, tip, 0) {
            if !OmtSite::in_bounds(q) {
                break;
            }
            site.set_furn(q, FurnId::NULL);
            site.set_ter(q, trunk);
        }
        site.set_ter(p, dirt);
        out.trees += 1;
    }

    let young: Vec<Point> = OmtSite::points()
        .filter(|&p| site.has_flag(p, TerFlag::YoungTree))
        .collect();
    for p in young {
        if tools.rng.gen_range(0..100) >= chance {
            continue;
        }
        let Some(bash) = reg.ter(site.ter(p)).bash.clone() else {
            continue;
        };
        for drop in &bash.items {
            let n = tools.rng.gen_range(drop.min..=drop.max);
            out.haul.extend(tools.items.create_n(drop.item, n, tools.now));
        }
        site.set_ter(p, reg.ter_id(bash.ter_set));
        out.young_trees += 1;
    }

    if buck {
        for p in OmtSite::points() {
            if site.ter(p) == trunk {
                site.set_ter(p, dirt);
                let n = tools.rng.gen_range(2..=3);
                for item in tools.items.create_n("log", n, tools.now) {
                    site.add_item(p, item);
                }
            }
        }
        // a few pieces always get left behind
        for p in OmtSite::points() {
            for item in site.take_items(p) {
                if tools.rng.gen_range(0..100) < 95 {
                    out.haul.push(item);
                }
            }
        }
    }
    log::debug!(
        "felled {} trees and {} young trees on {:?}",
        out.trees,
        out.young_trees,
        site.omt()
    );
    out
}
