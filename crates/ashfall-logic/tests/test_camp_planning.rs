//! Integration tests for camp planning math.
//!
//! Exercises: travel estimate → work days → food cost, pipe routing →
//! segment orientation, fortification run → stamp plan, and training after
//! an encounter.
//!
//! All tests are pure logic — no map state, no engine.

use ashfall_logic::calendar::TimeSpan;
use ashfall_logic::coords::{line_to, rl_dist, Point};
use ashfall_logic::direction::CompassDir;
use ashfall_logic::encounter::{resolve_encounter, training_difficulty, EncounterOutcome, EncounterRolls};
use ashfall_logic::food::{time_to_food, FactionLedger};
use ashfall_logic::fortify::{FortLevel, FortificationPlan};
use ashfall_logic::missions::MissionKind;
use ashfall_logic::salt_pipe::{plan_route, PipeTerrain, SaltWaterPipe};
use ashfall_logic::skills::{train_group, SkillId, SkillProfile};
use ashfall_logic::travel::{
    carry_weight_to_trips, companion_travel_time, cutting_time, log_haul_items, to_workdays,
};

// ── Helpers ────────────────────────────────────────────────────────────

/// Overmap terrain along a straight walk from the camp.
fn journey(from: Point, to: Point, oter: impl Fn(Point) -> &'static str) -> Vec<&'static str> {
    line_to(from, to, 0).into_iter().map(oter).collect()
}

/// A world of fields with a swamp band along y == -6.
fn swamp_band(p: Point) -> PipeTerrain {
    if p.y == -6 {
        PipeTerrain::Swamp
    } else if p.y < -6 {
        PipeTerrain::Illegal
    } else {
        PipeTerrain::Legal
    }
}

// ── Logging trip estimate ──────────────────────────────────────────────

#[test]
fn logging_trip_costs_add_up() {
    let camp = Point::new(0, 0);
    let forest = Point::new(3, 0);
    let path = journey(camp, forest, |p| if p.x < 3 { "field" } else { "forest" });
    assert_eq!(path, vec!["field", "field", "forest"]);

    let trees = 4;
    let young = 6;
    let chop = cutting_time(trees, young);
    let haul = log_haul_items(trees, young);
    assert_eq!(haul, 26);

    let travel = companion_travel_time(&path, TimeSpan::ZERO, 2, haul);
    // field 30 + 30*26, twice, plus forest 40 + 30*26
    let one_way = 2 * (30 + 30 * 26) + (40 + 30 * 26);
    assert_eq!(travel, TimeSpan::seconds(one_way * 2));

    let total = to_workdays(travel + chop);
    assert!(total >= travel + chop);

    let mut ledger = FactionLedger::new(50_000);
    let before = ledger.food_supply;
    let charged = ledger.consume_for(total);
    assert_eq!(charged, time_to_food(total));
    assert_eq!(ledger.food_supply, before - charged);
}

#[test]
fn heavier_loads_need_more_trips() {
    let light = carry_weight_to_trips(10_000, 5_000, 30_000, 20_000);
    let heavy = carry_weight_to_trips(100_000, 5_000, 30_000, 20_000);
    assert!(heavy > light);
    assert_eq!(light % 2, 0);
    assert_eq!(heavy % 2, 0);
}

// ── Salt-water pipe ────────────────────────────────────────────────────

#[test]
fn pipe_route_reaches_the_swamp_band() {
    let camp = Point::new(0, 0);
    let expansion = CompassDir::N;
    let connection_dir = Point::new(0, -1);
    let connection = camp + expansion.offset() + connection_dir;

    let route = plan_route(camp, connection, swamp_band).unwrap();
    assert_eq!(route.first().map(|p| p.y), Some(-6));
    assert_eq!(route.last(), Some(&connection));
    assert!(route.len() <= 20);
    for pair in route.windows(2) {
        assert_eq!(rl_dist(pair[0], pair[1]), 1);
    }

    let pipe = SaltWaterPipe::new(expansion, connection_dir, &route);
    assert_eq!(pipe.next_segment(), Some(0));
    let (incoming, _) = pipe.segment_orientations(0);
    assert!(incoming.is_none());
    let last = pipe.segments.len() - 1;
    let (_, outgoing) = pipe.segment_orientations(last);
    assert_eq!(outgoing, CompassDir::S.stamp_orientation());
}

#[test]
fn pipe_never_crosses_the_camp() {
    let camp = Point::new(0, 0);
    // Swamp only directly south of the camp; the connection tile is north.
    let connection = Point::new(0, -2);
    let route = plan_route(camp, connection, |p| {
        if p == Point::new(0, 3) {
            PipeTerrain::Swamp
        } else {
            PipeTerrain::Legal
        }
    })
    .unwrap();
    for p in &route {
        assert!(rl_dist(*p, camp) > 1, "{:?} is inside the camp", p);
    }
}

// ── Fortifications ─────────────────────────────────────────────────────

#[test]
fn trench_then_spikes() {
    let camp = Point::new(0, 0);
    let trench = FortificationPlan::new(
        FortLevel::Trench,
        camp,
        Point::new(-2, 4),
        Point::new(2, 4),
        |_| "field".to_string(),
        &[],
    )
    .unwrap();
    assert_eq!(trench.points.len(), 5);
    assert_eq!(trench.batch_size(), 8);

    let dug: Vec<Point> = trench.points.clone();
    let spikes = FortificationPlan::new(
        FortLevel::SpikedTrench,
        camp,
        Point::new(2, 4),
        Point::new(-2, 4),
        |_| "field".to_string(),
        &dug,
    )
    .unwrap();
    assert_eq!(spikes.points, trench.points);
    let stamps = spikes.stamps();
    assert_eq!(stamps[0].1, vec!["faction_wall_level_E_1"]);
    assert_eq!(stamps[4].1, vec!["faction_wall_level_W_1"]);
}

// ── Encounters and training ────────────────────────────────────────────

#[test]
fn surviving_an_encounter_trains_the_right_group() {
    let mut skills = SkillProfile::with_levels(&[(SkillId::Speech, 6)]);
    let rolls = EncounterRolls {
        notice: 10,
        talk: 3,
        monsters: 0,
        own_mult: 8,
        foe_mult: 12,
    };
    let outcome = resolve_encounter(&skills, 0, rolls);
    assert_eq!(outcome, EncounterOutcome::TalkedDown);

    let group = outcome.trains().unwrap();
    let before = skills.exercise(SkillId::Speech);
    train_group(&mut skills, group, TimeSpan::minutes(10), training_difficulty(0));
    assert!(skills.exercise(SkillId::Speech) > before);
}

#[test]
fn gathering_missions_bill_actual_time() {
    for kind in MissionKind::ALL {
        if kind.is_gathering() {
            assert!(!kind.spec().fixed_time, "{:?}", kind);
        }
    }
    assert!(MissionKind::CutLogs.spec().fixed_time);
}
