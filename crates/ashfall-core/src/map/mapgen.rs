//! Submap generation and update-mapgen stamps.
//!
//! [`MapGenerator`] builds a submap from scratch given the overmap terrain it
//! belongs to. [`MapgenUpdater`] stamps a pre-authored layout onto one overmap
//! tile of an existing map; camp construction uses it for buildings, farm
//! plots, fortification trenches and pipe segments.

use std::collections::HashMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Deserialize;

use ashfall_logic::constants::{OMT_TILES, SEEX, SEEY};
use ashfall_logic::coords::{submap_origin_tile, Point, Tripoint};
use ashfall_logic::direction::StampOrientation;
use ashfall_logic::travel::{is_forest_trail, is_river};

use super::site::OmtSite;
use super::submap::Submap;
use crate::error::ConfigError;
use crate::registry::{FurnId, Registry, TerId};

const BLUEPRINTS_JSON: &str = include_str!("../../../../data/blueprints.json");

pub trait MapGenerator {
    /// A fresh submap at absolute submap position `pos` inside an overmap
    /// tile of terrain `oter`. Must give the same submap every time it's
    /// asked for the same position and terrain.
    fn generate(&mut self, pos: Tripoint, oter: &str, registry: &Registry) -> Submap;
}

/// Outdoor terrain generator. Deterministic per seed and position.
#[derive(Debug, Clone)]
pub struct TerrainMapgen {
    seed: u64,
}

impl TerrainMapgen {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, pos: Tripoint) -> StdRng {
        let h = (pos.x as i64).wrapping_mul(73_856_093)
            ^ (pos.y as i64).wrapping_mul(19_349_663)
            ^ (pos.z as i64).wrapping_mul(83_492_791);
        StdRng::seed_from_u64(self.seed ^ h as u64)
    }
}

/// Terrain weights in percent, checked in order; the rest is the base.
struct Scatter {
    base: &'static str,
    weights: &'static [(&'static str, u32)],
}

fn scatter_for(oter: &str) -> Scatter {
    match oter {
        "forest" => Scatter {
            base: "t_grass",
            weights: &[("t_tree", 30), ("t_tree_young", 15), ("t_underbrush", 15)],
        },
        "forest_thick" => Scatter {
            base: "t_grass",
            weights: &[("t_tree", 50), ("t_tree_young", 10), ("t_underbrush", 15)],
        },
        "forest_water" => Scatter {
            base: "t_grass",
            weights: &[("t_water_sh", 25), ("t_tree", 20), ("t_tree_young", 10), ("t_underbrush", 15)],
        },
        "swamp" => Scatter {
            base: "t_grass",
            weights: &[("t_water_sh", 40), ("t_underbrush", 20)],
        },
        o if is_forest_trail(o) => Scatter {
            base: "t_grass",
            weights: &[("t_tree", 30), ("t_tree_young", 15), ("t_underbrush", 15)],
        },
        o if o.starts_with("road") => Scatter {
            base: "t_pavement",
            weights: &[],
        },
        o if is_river(o) => Scatter {
            base: "t_water_dp",
            weights: &[],
        },
        o if o.starts_with("faction_") => Scatter {
            base: "t_dirt",
            weights: &[],
        },
        _ => Scatter {
            base: "t_grass",
            weights: &[("t_shrub", 3), ("t_underbrush", 3)],
        },
    }
}

impl MapGenerator for TerrainMapgen {
    fn generate(&mut self, pos: Tripoint, oter: &str, registry: &Registry) -> Submap {
        let mut rng = self.rng_for(pos);
        let scatter = scatter_for(oter);
        let mut sm = Submap::new(registry.ter_id(scatter.base));
        let weighted: Vec<(TerId, u32)> = scatter
            .weights
            .iter()
            .map(|&(id, w)| (registry.ter_id(id), w))
            .collect();
        let poppy = registry.furn_id("f_flower_poppy");
        let origin = submap_origin_tile(pos);

        for y in 0..SEEY {
            for x in 0..SEEX {
                let p = Point::new(x, y);
                let mut roll = rng.gen_range(0..100u32);
                for &(ter, w) in &weighted {
                    if roll < w {
                        sm.set_ter(p, ter);
                        break;
                    }
                    roll -= w;
                }
                if oter == "field" && rng.gen_range(0..150) == 0 {
                    sm.set_furn(p, poppy);
                }
                // Trails run north-south through the middle of the tile.
                if is_forest_trail(oter) {
                    let col = (origin.x + x).rem_euclid(OMT_TILES);
                    if col == OMT_TILES / 2 - 1 || col == OMT_TILES / 2 {
                        sm.set_ter(p, registry.ter_id("t_dirt"));
                    }
                }
            }
        }
        sm
    }
}

// ============================================================================
// UPDATE-MAPGEN STAMPS
// ============================================================================

pub trait MapgenUpdater {
    /// Apply stamp `id` to `site`. Returns false, leaving the site untouched,
    /// when the stamp is unknown or something in the way blocks it.
    fn run(&self, id: &str, site: &mut OmtSite, orientation: StampOrientation, registry: &Registry) -> bool;

    fn has_stamp(&self, id: &str) -> bool;
}

/// A coordinate or an inclusive range of them.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Span {
    One(i32),
    Range([i32; 2]),
}

impl Span {
    fn bounds(self) -> (i32, i32) {
        match self {
            Span::One(v) => (v, v),
            Span::Range([a, b]) => (a.min(b), a.max(b)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Placement {
    x: Span,
    y: Span,
    #[serde(default)]
    ter: Option<String>,
    #[serde(default)]
    furn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Stamp {
    place: Vec<Placement>,
}

#[derive(Deserialize)]
struct StampFile {
    stamps: HashMap<String, Stamp>,
}

/// Stamps parsed from `data/blueprints.json`.
#[derive(Debug, Clone, Default)]
pub struct StampLibrary {
    stamps: HashMap<String, Stamp>,
}

/// One resolved tile edit.
struct Edit {
    p: Point,
    ter: Option<TerId>,
    furn: Option<FurnId>,
}

impl StampLibrary {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BLUEPRINTS_JSON)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: StampFile =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { what: "stamps", source })?;
        for (id, stamp) in &file.stamps {
            for place in &stamp.place {
                let (x0, x1) = place.x.bounds();
                let (y0, y1) = place.y.bounds();
                if x0 < 0 || y0 < 0 || x1 >= OMT_TILES || y1 >= OMT_TILES {
                    return Err(ConfigError::Invalid {
                        field: "stamps",
                        reason: format!("stamp {id} places outside the overmap tile"),
                    });
                }
            }
        }
        Ok(Self { stamps: file.stamps })
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    fn plan(&self, stamp: &Stamp, orientation: StampOrientation, registry: &Registry) -> Option<Vec<Edit>> {
        let mut edits = Vec::new();
        for place in &stamp.place {
            let ter = match &place.ter {
                Some(name) => Some(registry.try_ter_id(name).or_else(|| {
                    log::warn!("stamp names unknown terrain {name:?}");
                    None
                })?),
                None => None,
            };
            let furn = match &place.furn {
                Some(name) => Some(registry.try_furn_id(name).or_else(|| {
                    log::warn!("stamp names unknown furniture {name:?}");
                    None
                })?),
                None => None,
            };
            let (x0, x1) = place.x.bounds();
            let (y0, y1) = place.y.bounds();
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let p = orientation.apply(Point::new(x, y), OMT_TILES);
                    edits.push(Edit { p, ter, furn });
                }
            }
        }
        Some(edits)
    }
}

impl MapgenUpdater for StampLibrary {
    fn run(&self, id: &str, site: &mut OmtSite, orientation: StampOrientation, registry: &Registry) -> bool {
        let diag = format!("{id}_diag");
        let stamp = match (orientation.orthogonal, self.stamps.get(&diag)) {
            (false, Some(s)) => s,
            _ => match self.stamps.get(id) {
                Some(s) => s,
                None => {
                    log::warn!("unknown update-mapgen stamp {id:?}");
                    return false;
                }
            },
        };
        let Some(edits) = self.plan(stamp, orientation, registry) else {
            return false;
        };
        if edits.iter().any(|e| site.has_vehicle(e.p)) {
            log::debug!("stamp {id} blocked by a vehicle at {:?}", site.omt());
            return false;
        }
        for e in edits {
            if let Some(t) = e.ter {
                site.set_ter(e.p, t);
            }
            if let Some(f) = e.furn {
                site.set_furn(e.p, f);
            }
        }
        true
    }

    fn has_stamp(&self, id: &str) -> bool {
        self.stamps.contains_key(id)
    }
}
