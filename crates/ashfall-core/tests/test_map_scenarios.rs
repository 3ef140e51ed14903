//! Integration tests for the live map window.
//!
//! Exercises: bashing → collapse chain, field processing → fire growth and spread,
//! window shifting → submap store, coordinate conversion, movement cost.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use ashfall_core::config::SimConfig;
use ashfall_core::item::ItemCatalog;
use ashfall_core::map::{
    MapGenerator, MapGrid, MemoryMapBuffer, SubmapLoader, TerrainMapgen, TurnContext,
};
use ashfall_core::overmap::MemoryOvermap;
use ashfall_core::registry::{FieldTypeId, Registry};
use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::coords::{rl_dist, Point, Tripoint};

// ── Helpers ────────────────────────────────────────────────────────────

fn dirt_grid() -> MapGrid {
    let reg = Arc::new(Registry::builtin());
    let dirt = reg.ter_id("t_dirt");
    let mut g = MapGrid::new(reg, &SimConfig::default());
    g.fill(Tripoint::new(0, 0, 0), dirt);
    g
}

fn ctx<'a>(rng: &'a mut StdRng, items: &'a ItemCatalog) -> TurnContext<'a> {
    TurnContext {
        now: TimePoint::START,
        rng,
        items,
    }
}

// ── Bashing and collapse ───────────────────────────────────────────────

#[test]
fn breaking_a_wall_checks_each_neighbour_once() {
    let mut g = dirt_grid();
    let items = ItemCatalog::builtin().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let p = Tripoint::new(30, 30, 0);
    g.ter_set_named(p, "t_wall");

    let out = g.destroy(p, &mut ctx(&mut rng, &items));
    assert!(out.success);
    assert_eq!(out.collapse_checks.len(), 4);
    for n in p.orthogonal_neighbors() {
        assert!(out.collapse_checks.contains(&n));
    }
    // open ground has no roof to lose
    assert!(out.collapsed.is_empty());
    assert!(g.count_items(p, "rock") >= 2);
}

#[test]
fn a_collapse_only_spreads_through_roofed_tiles() {
    let mut g = dirt_grid();
    let items = ItemCatalog::builtin().unwrap();
    let mut rng = StdRng::seed_from_u64(12);
    let p = Tripoint::new(30, 30, 0);
    g.ter_set_named(p, "t_wall");
    for x in 31..36 {
        g.ter_set_named(Tripoint::new(x, 30, 0), "t_floor");
    }

    let out = g.destroy(p, &mut ctx(&mut rng, &items));
    for q in &out.collapsed {
        assert_eq!(q.y, 30);
        assert!((31..36).contains(&q.x));
        assert_eq!(g.ter(*q), g.registry().ter_id("t_dirt"));
    }
    let mut seen = out.collapse_checks.clone();
    seen.sort_by_key(|t| (t.x, t.y));
    seen.dedup();
    assert_eq!(seen.len(), out.collapse_checks.len());
}

#[test]
fn collapse_inside_a_roofed_block_ends_and_stays_inside() {
    let items = ItemCatalog::builtin().unwrap();
    let centre = Tripoint::new(32, 32, 0);
    let inside = |q: &Tripoint| (29..=35).contains(&q.x) && (29..=35).contains(&q.y);

    for seed in 0..40 {
        let mut g = dirt_grid();
        let mut rng = StdRng::seed_from_u64(seed);
        for x in 29..=35 {
            for y in 29..=35 {
                g.ter_set_named(Tripoint::new(x, y, 0), "t_floor");
            }
        }
        g.ter_set_named(centre, "t_wall");
        // three walls hold the roof around the one being knocked out
        for q in [Tripoint::new(32, 31, 0), Tripoint::new(31, 32, 0), Tripoint::new(33, 32, 0)] {
            g.ter_set_named(q, "t_wall");
        }

        let out = g.destroy(centre, &mut ctx(&mut rng, &items));
        assert!(out.success);

        let mut seen = out.collapse_checks.clone();
        seen.sort_by_key(|t| (t.x, t.y));
        seen.dedup();
        assert_eq!(seen.len(), out.collapse_checks.len(), "seed {seed}: a tile was checked twice");
        assert!(!out.collapse_checks.contains(&centre));
        for q in &out.collapsed {
            assert!(inside(q), "seed {seed}: {q:?} caved in outside the block");
            assert!(out.collapse_checks.contains(q));
        }
        for q in [Tripoint::new(32, 31, 0), Tripoint::new(31, 32, 0), Tripoint::new(33, 32, 0)] {
            assert_eq!(g.ter(q), g.registry().ter_id("t_wall"));
        }
    }
}

// ── Fields ─────────────────────────────────────────────────────────────

#[test]
fn fire_spreads_at_most_one_tile_per_turn() {
    let mut g = dirt_grid();
    let items = ItemCatalog::builtin().unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    let src = Tripoint::new(20, 20, 0);
    for x in 20..40 {
        g.furn_set_named(Tripoint::new(x, 20, 0), "f_hay");
    }
    g.add_field(src, FieldTypeId::Fire, 3, TimeSpan::ZERO);

    let mut front = src.x;
    for _ in 0..10 {
        let report = g.process_fields(&mut ctx(&mut rng, &items), true);
        for lit in &report.ignited {
            assert!(lit.x <= front + 1, "fire jumped to {lit:?} from x={front}");
        }
        front = report.ignited.iter().map(|t| t.x).max().unwrap_or(front).max(front);
    }
}

#[test]
fn a_small_fire_either_grows_or_spreads_in_one_pass() {
    let items = ItemCatalog::builtin().unwrap();
    let src = Tripoint::new(20, 20, 0);
    let mut grew = 0;
    let mut spread = 0;

    for seed in 0..200 {
        let mut g = dirt_grid();
        let mut rng = StdRng::seed_from_u64(seed);
        for x in 19..=21 {
            for y in 19..=21 {
                g.furn_set_named(Tripoint::new(x, y, 0), "f_hay");
            }
        }
        g.add_field(src, FieldTypeId::Fire, 1, TimeSpan::ZERO);

        let report = g.process_fields(&mut ctx(&mut rng, &items), true);
        let density = g.field_density(src, FieldTypeId::Fire);
        assert!(density <= 3);
        assert!(report.ignited.len() <= 1, "seed {seed}: {:?}", report.ignited);
        assert!(report.ignited.iter().all(|q| rl_dist(src.xy(), q.xy()) == 1));
        let rose = density > 1;
        assert!(!(rose && !report.ignited.is_empty()), "seed {seed}: grew and spread");
        grew += u32::from(rose);
        spread += u32::from(!report.ignited.is_empty());
    }
    assert!(grew > 0);
    assert!(spread > 0);
}

#[test]
fn no_spread_means_no_new_fires() {
    let mut g = dirt_grid();
    let items = ItemCatalog::builtin().unwrap();
    let mut rng = StdRng::seed_from_u64(14);
    let src = Tripoint::new(20, 20, 0);
    for x in 19..22 {
        g.furn_set_named(Tripoint::new(x, 20, 0), "f_hay");
    }
    g.add_field(src, FieldTypeId::Fire, 3, TimeSpan::ZERO);

    for _ in 0..20 {
        let report = g.process_fields(&mut ctx(&mut rng, &items), false);
        assert!(report.ignited.is_empty());
    }
    for x in [19, 21] {
        assert_eq!(g.field_density(Tripoint::new(x, 20, 0), FieldTypeId::Fire), 0);
    }
}

#[test]
fn gas_cloud_stays_near_its_source() {
    let mut g = dirt_grid();
    let items = ItemCatalog::builtin().unwrap();
    let mut rng = StdRng::seed_from_u64(15);
    let src = Tripoint::new(60, 60, 0);
    g.add_field(src, FieldTypeId::ToxicGas, 3, TimeSpan::ZERO);

    for turn in 1..=5 {
        g.process_fields(&mut ctx(&mut rng, &items), false);
        for x in 50..=70 {
            for y in 50..=70 {
                let q = Tripoint::new(x, y, 0);
                if g.field_density(q, FieldTypeId::ToxicGas) > 0 {
                    assert!(rl_dist(src.xy(), q.xy()) <= turn);
                }
            }
        }
    }
}

// ── Coordinates and movement ───────────────────────────────────────────

#[test]
fn local_and_absolute_coordinates_round_trip_after_a_shift() {
    let reg = Arc::new(Registry::builtin());
    let mut g = MapGrid::new(reg.clone(), &SimConfig::default());
    let mut buffer = MemoryMapBuffer::new();
    let mut mapgen = TerrainMapgen::new(1);
    let overmap = MemoryOvermap::default();
    let mut loader = SubmapLoader::new(&mut buffer, &mut mapgen, &overmap, &reg);

    g.load(Tripoint::new(-3, 7, 0), &mut loader);
    g.shift(2, -1, &mut loader);
    assert_eq!(g.abs_sub(), Tripoint::new(-1, 6, 0));
    for p in [Tripoint::new(0, 0, 0), Tripoint::new(17, 90, 0), Tripoint::new(131, 131, 0)] {
        assert_eq!(g.getlocal(g.getabs(p)), p);
    }
}

#[test]
fn move_cost_is_never_negative() {
    let reg = Arc::new(Registry::builtin());
    let mut g = MapGrid::new(reg.clone(), &SimConfig::default());
    let mut buffer = MemoryMapBuffer::new();
    let mut mapgen = TerrainMapgen::new(2);
    let mut overmap = MemoryOvermap::default();
    overmap.fill(Tripoint::new(0, 0, 0), Tripoint::new(5, 5, 0), "forest_thick");
    let mut loader = SubmapLoader::new(&mut buffer, &mut mapgen, &overmap, &reg);
    g.load(Tripoint::new(0, 0, 0), &mut loader);

    for x in -2..70 {
        for y in -2..70 {
            let p = Tripoint::new(x, y, 0);
            assert!(g.move_cost(p, None) >= 0);
            assert_eq!(g.passable(p), g.move_cost(p, None) > 0);
        }
    }
}

#[test]
fn generated_terrain_matches_after_a_round_trip_through_the_store() {
    let reg = Arc::new(Registry::builtin());
    let mut g = MapGrid::new(reg.clone(), &SimConfig::default());
    let mut buffer = MemoryMapBuffer::new();
    let mut mapgen = TerrainMapgen::new(3);
    let overmap = MemoryOvermap::default();
    let p = Tripoint::new(5, 5, 0);
    let expected = mapgen.generate(Tripoint::new(0, 0, 0), "field", &reg);

    let mut loader = SubmapLoader::new(&mut buffer, &mut mapgen, &overmap, &reg);
    g.load(Tripoint::new(0, 0, 0), &mut loader);
    g.ter_set_named(p, "t_wall");
    g.save(&mut loader);
    g.fill(Tripoint::new(40, 40, 0), reg.ter_id("t_dirt"));
    g.load(Tripoint::new(0, 0, 0), &mut loader);

    assert_eq!(g.ter(p), reg.ter_id("t_wall"));
    assert_eq!(g.ter(Tripoint::new(6, 5, 0)), expected.ter(Point::new(6, 5)));
}
