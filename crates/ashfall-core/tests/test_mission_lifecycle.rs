//! Integration tests for companion missions, start to finish.
//!
//! Exercises: dispatch → food reservation → clock → resolve / recall
//! → food settlement → follower pool
//!
//! Everything runs against the built-in content with an in-memory submap
//! store and field processing switched off.

use ashfall_core::camp::ReturnKind;
use ashfall_core::map::MapBuffer;
use ashfall_core::overmap::OvermapBuffer;
use ashfall_core::prelude::*;
use ashfall_logic::coords::omt_origin_submap;
use ashfall_logic::food::time_to_food;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine_with_food(food: i64) -> SimulationEngine {
    let config = SimConfig {
        process_fields: false,
        starting_food: food,
        ..SimConfig::default()
    };
    SimulationEngine::new(config).unwrap()
}

/// Someone who always slips away from trouble.
fn woodsman() -> SkillProfile {
    SkillProfile::with_levels(&[
        (SkillId::Survival, 10),
        (SkillId::Speech, 10),
        (SkillId::Construction, 3),
        (SkillId::Melee, 10),
        (SkillId::Dodge, 10),
    ])
}

fn forage(hours: i64) -> MissionOrder {
    MissionOrder::Gather {
        kind: MissionKind::Foraging,
        duration: Some(TimeSpan::hours(hours)),
    }
}

/// Recalling never leaves the larder below what it held before dispatch,
/// less what the companion ate while away.
fn assert_recall_bound(engine: &SimulationEngine, before_dispatch: i64, away: TimeSpan) {
    let floor = before_dispatch - time_to_food(away);
    assert!(
        engine.ledger.food_supply >= floor,
        "larder at {} after {away}, floor {floor}",
        engine.ledger.food_supply
    );
}

fn tent_upgrade() -> MissionOrder {
    MissionOrder::Upgrade {
        dir: CompassDir::Base,
        blueprint: "faction_base_camp_1".to_string(),
    }
}

fn stock(engine: &mut SimulationEngine, camp: usize, id: &str, count: i32) {
    let items = engine.items.create_n(id, count, engine.now);
    engine.camps[camp].inventory.extend(items);
}

// ── Gathering ──────────────────────────────────────────────────────────

#[test]
fn three_hour_forage_is_billed_exactly_what_was_reserved() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    let receipt = engine.dispatch(camp, ash, forage(3)).unwrap();
    assert_eq!(receipt.reserved_food, 312);
    assert_eq!(engine.ledger.food_supply, 9_688);
    assert_eq!(receipt.expected_return, TimePoint::START + TimeSpan::hours(3));
    assert!(!engine.followers.is_available(ash));

    engine.advance(TimeSpan::hours(3));
    assert_eq!(engine.try_resolve(camp, ash).unwrap(), ResolutionOutcome::Returnable);

    let report = engine.resolve(camp, ash).unwrap();
    assert_eq!(report.kind, ReturnKind::Returned);
    assert_eq!(report.food_settled, 0);
    assert_eq!(engine.ledger.food_supply, 9_688);
    assert!(engine.followers.is_available(ash));
    assert!(engine.camps[camp].missions.is_empty());
}

#[test]
fn late_return_pays_for_the_extra_hours() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    engine.dispatch(camp, ash, forage(3)).unwrap();
    engine.advance(TimeSpan::hours(6));
    let report = engine.resolve(camp, ash).unwrap();

    // 6h is 625 kcal, 312 of it was paid up front
    assert_eq!(report.food_settled, 313);
    assert_eq!(engine.ledger.food_supply, 10_000 - 625);
}

#[test]
fn early_resolve_is_refused_and_keeps_the_mission() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    engine.dispatch(camp, ash, forage(4)).unwrap();
    engine.advance(TimeSpan::hours(1));

    match engine.resolve(camp, ash) {
        Err(ResolveError::NotYetReturnable(left)) => assert_eq!(left, TimeSpan::hours(3)),
        other => panic!("expected NotYetReturnable, got {other:?}"),
    }
    assert_eq!(engine.camps[camp].missions.len(), 1);
    assert!(!engine.followers.is_available(ash));
}

// ── Recall ─────────────────────────────────────────────────────────────

#[test]
fn recall_refunds_the_unspent_reservation() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    let receipt = engine.dispatch(camp, ash, forage(48)).unwrap();
    assert_eq!(receipt.reserved_food, 5_000);

    engine.advance(TimeSpan::hours(2));
    assert_eq!(
        engine.emergency_recall(camp, ash),
        Err(ResolveError::RecallTooEarly(TimeSpan::hours(24)))
    );
    assert_eq!(engine.camps[camp].missions.len(), 1);

    engine.advance(TimeSpan::hours(28));
    let report = engine.emergency_recall(camp, ash).unwrap();
    // 30h away costs 3125 kcal
    assert_eq!(report.kind, ReturnKind::Recalled);
    assert_eq!(report.food_settled, -1_875);
    assert_eq!(engine.ledger.food_supply, 6_875);
    assert!(engine.followers.is_available(ash));
}

#[test]
fn recall_is_allowed_exactly_at_the_threshold() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    engine.dispatch(camp, ash, forage(48)).unwrap();
    engine.advance(TimeSpan::hours(24));
    let report = engine.emergency_recall(camp, ash).unwrap();

    // 5000 reserved, 2500 eaten
    assert_eq!(report.food_settled, -2_500);
    assert_eq!(engine.ledger.food_supply, 7_500);
    assert_recall_bound(&engine, 10_000, TimeSpan::hours(24));
}

#[test]
fn recall_past_the_return_time_refunds_nothing() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    let receipt = engine.dispatch(camp, ash, forage(25)).unwrap();
    assert_eq!(receipt.reserved_food, 2_604);
    engine.advance(TimeSpan::hours(40));
    let report = engine.emergency_recall(camp, ash).unwrap();

    assert_eq!(report.kind, ReturnKind::Recalled);
    assert_eq!(report.food_settled, 0);
    assert_eq!(engine.ledger.food_supply, 10_000 - 2_604);
    assert_recall_bound(&engine, 10_000, TimeSpan::hours(40));
    assert!(engine.followers.is_available(ash));
}

#[test]
fn recalling_an_unfed_job_leaves_the_larder_alone() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    stock(&mut engine, camp, "stick_long", 8);

    let receipt = engine.dispatch(camp, ash, tent_upgrade()).unwrap();
    assert_eq!(receipt.reserved_food, 0);
    engine.advance(TimeSpan::hours(24));
    let report = engine.emergency_recall(camp, ash).unwrap();

    assert_eq!(report.food_settled, 0);
    assert_eq!(engine.ledger.food_supply, 10_000);
    assert_recall_bound(&engine, 10_000, TimeSpan::hours(24));
    assert!(!engine.camps[camp].has_provides("hunting"));
    assert_eq!(engine.camps[camp].expansions[&CompassDir::Base].in_progress, None);
}

#[test]
fn recall_entry_appears_after_the_threshold() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    engine.dispatch(camp, ash, forage(48)).unwrap();

    let recall = |engine: &SimulationEngine| {
        engine
            .available_missions(camp)
            .iter()
            .any(|e| e.key.kind == MissionKind::Foraging && e.action == ashfall_core::camp::EntryAction::Recall)
    };
    engine.advance(TimeSpan::hours(23));
    assert!(!recall(&engine));
    engine.advance(TimeSpan::hours(1));
    assert!(recall(&engine));
}

// ── Unfed jobs ─────────────────────────────────────────────────────────

#[test]
fn unfed_jobs_pay_only_for_overtime() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    stock(&mut engine, camp, "stick_long", 8);

    let receipt = engine.dispatch(camp, ash, tent_upgrade()).unwrap();
    let planned = receipt.expected_return - engine.now;
    assert_eq!(engine.ledger.food_supply, 10_000);

    engine.advance(planned + TimeSpan::hours(6));
    let report = engine.resolve(camp, ash).unwrap();
    let overtime = time_to_food(planned + TimeSpan::hours(6)) - time_to_food(planned);
    assert!(overtime > 0);
    assert_eq!(report.food_settled, overtime);
    assert_eq!(engine.ledger.food_supply, 10_000 - overtime);
}

#[test]
fn unfed_jobs_back_on_time_cost_nothing() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    stock(&mut engine, camp, "stick_long", 8);

    let receipt = engine.dispatch(camp, ash, tent_upgrade()).unwrap();
    engine.advance(receipt.expected_return - engine.now);
    let report = engine.resolve(camp, ash).unwrap();
    assert_eq!(report.food_settled, 0);
    assert_eq!(engine.ledger.food_supply, 10_000);
}

// ── Dispatch atomicity ─────────────────────────────────────────────────

#[test]
fn short_of_food_changes_nothing() {
    let mut engine = engine_with_food(100);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    let before = engine.camps[camp].clone();

    let err = engine.dispatch(camp, ash, forage(48)).unwrap_err();
    assert_eq!(err, DispatchError::InsufficientFood { need: 5_000, have: 100 });
    assert_eq!(engine.ledger.food_supply, 100);
    assert_eq!(engine.camps[camp], before);
    assert!(engine.followers.is_available(ash));
}

#[test]
fn rejected_logging_job_leaves_the_forest_unvisited() {
    let mut engine = engine_with_food(0);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let sawyer = engine.followers.spawn(
        "Sawyer",
        SkillProfile::with_levels(&[(SkillId::Fabrication, 4), (SkillId::Survival, 4)]),
    );
    engine.camps[camp]
        .expansions
        .get_mut(&CompassDir::Base)
        .unwrap()
        .provides
        .insert("logging".to_string(), 1);
    let target = Tripoint::new(5, 0, 0);
    engine.overmap.fill(Tripoint::new(1, -2, 0), Tripoint::new(8, 2, 0), "forest");
    let origin = omt_origin_submap(target);

    let err = engine.dispatch(camp, sawyer, MissionOrder::CutLogs { target }).unwrap_err();
    assert!(matches!(err, DispatchError::InsufficientFood { have: 0, .. }));
    for dy in 0..2 {
        for dx in 0..2 {
            assert!(!engine.mapbuffer().contains(origin + Point::new(dx, dy)));
        }
    }
    assert_eq!(engine.overmap.ter(target), "forest");
    assert!(engine.followers.is_available(sawyer));

    engine.ledger.food_supply = 1_000_000;
    engine.dispatch(camp, sawyer, MissionOrder::CutLogs { target }).unwrap();
    assert!(engine.mapbuffer().contains(origin));
}

#[test]
fn a_companion_can_only_be_in_one_place() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    engine.dispatch(camp, ash, forage(4)).unwrap();
    let food = engine.ledger.food_supply;
    assert!(matches!(
        engine.dispatch(camp, ash, MissionOrder::Menial),
        Err(DispatchError::CompanionBusy(_))
    ));
    assert_eq!(engine.ledger.food_supply, food);
    assert_eq!(engine.camps[camp].missions.len(), 1);
}

#[test]
fn worker_cap_is_enforced() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let crew: Vec<NpcId> = (0..4).map(|i| engine.followers.spawn(format!("Hand {i}"), woodsman())).collect();

    for &npc in &crew[..3] {
        engine.dispatch(camp, npc, forage(4)).unwrap();
    }
    assert_eq!(
        engine.dispatch(camp, crew[3], forage(4)),
        Err(DispatchError::WorkersFull { max: 3 })
    );
}

#[test]
fn jobs_need_an_expansion_that_offers_them() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    let order = MissionOrder::Gather {
        kind: MissionKind::Hunting,
        duration: None,
    };
    assert_eq!(
        engine.dispatch(camp, ash, order),
        Err(DispatchError::MissingCapability("hunting".to_string()))
    );
}

// ── Upgrades ───────────────────────────────────────────────────────────

#[test]
fn upgrade_short_of_logs_is_rejected_whole() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());

    stock(&mut engine, camp, "stick_long", 8);
    let first = MissionOrder::Upgrade {
        dir: CompassDir::Base,
        blueprint: "faction_base_camp_1".to_string(),
    };
    let receipt = engine.dispatch(camp, ash, first).unwrap();
    assert_eq!(engine.camps[camp].inventory.count("stick_long"), 0);
    engine.advance(receipt.expected_return - engine.now);
    engine.resolve(camp, ash).unwrap();
    assert!(engine.camps[camp].has_provides("hunting"));

    stock(&mut engine, camp, "log", 3);
    let camp_before = engine.camps[camp].clone();
    let ledger_before = engine.ledger.clone();

    let second = MissionOrder::Upgrade {
        dir: CompassDir::Base,
        blueprint: "faction_base_camp_2".to_string(),
    };
    assert_eq!(
        engine.dispatch(camp, ash, second),
        Err(DispatchError::MissingMaterials {
            item: "log".to_string(),
            need: 5,
            have: 3,
        })
    );
    assert_eq!(engine.camps[camp], camp_before);
    assert_eq!(engine.ledger, ledger_before);
    assert!(engine.followers.is_available(ash));
}

#[test]
fn upgrades_follow_their_path() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    stock(&mut engine, camp, "log", 10);

    let skip = MissionOrder::Upgrade {
        dir: CompassDir::Base,
        blueprint: "faction_base_camp_2".to_string(),
    };
    assert!(matches!(
        engine.dispatch(camp, ash, skip),
        Err(DispatchError::InvalidTarget(_))
    ));
    assert_eq!(engine.camps[camp].inventory.count("log"), 10);
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn missions_survive_a_save_mid_trip() {
    let mut engine = engine_with_food(10_000);
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", woodsman());
    engine.dispatch(camp, ash, forage(4)).unwrap();
    engine.advance(TimeSpan::hours(1));

    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();
    let mut restored = engine_with_food(0);
    restored.load(buf.as_slice()).unwrap();

    assert!(!restored.followers.is_available(ash));
    assert_eq!(restored.camps[camp].missions, engine.camps[camp].missions);
    restored.advance(TimeSpan::hours(3));
    let report = restored.resolve(camp, ash).unwrap();
    assert_eq!(report.food_settled, 0);
    assert!(restored.followers.is_available(ash));
}
