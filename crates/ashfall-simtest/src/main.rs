//! Ashfall Headless Simulation Harness
//!
//! Drives the engine through scripted map and camp scenarios and checks the
//! results. Runs entirely in-process with an in-memory submap store.
//!
//! Usage:
//!   cargo run -p ashfall-simtest
//!   cargo run -p ashfall-simtest -- --verbose

use ashfall_core::camp::{BlueprintCatalog, EntryAction, ReturnKind};
use ashfall_core::map::{MapgenUpdater, StampLibrary};
use ashfall_core::prelude::*;
use ashfall_core::registry::FieldTypeId;
use ashfall_logic::constants::{MAPSIZE, MAP_TILES_X};
use ashfall_logic::food::time_to_food;
use ashfall_logic::fortify::FortLevel;
use serde::Deserialize;

// ── Harness config (optional JSON on the command line) ──────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HarnessConfig {
    seed: u64,
    field_turns: u32,
    starting_food: i64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            field_turns: 300,
            starting_food: 10_000,
        }
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let harness = match std::env::args().skip(1).find(|a| a.ends_with(".json")) {
        Some(path) => match std::fs::read_to_string(&path).map(|t| serde_json::from_str::<HarnessConfig>(&t)) {
            Ok(Ok(cfg)) => cfg,
            Ok(Err(e)) => {
                eprintln!("bad harness config {path}: {e}");
                std::process::exit(2);
            }
            Err(e) => {
                eprintln!("can't read {path}: {e}");
                std::process::exit(2);
            }
        },
        None => HarnessConfig::default(),
    };
    println!("=== Ashfall Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Built-in content
    results.extend(validate_content(verbose));

    // 2. Field automaton sweep
    results.extend(validate_fields(&harness, verbose));

    // 3. Gathering round trip
    results.extend(validate_gathering(&harness, verbose));

    // 4. Expansions and upgrades
    results.extend(validate_expansions(&harness, verbose));

    // 5. Emergency recall
    results.extend(validate_recall(&harness, verbose));

    // 6. Save and load
    results.extend(validate_persistence(&harness, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn engine(harness: &HarnessConfig) -> Option<SimulationEngine> {
    let config = SimConfig {
        seed: harness.seed,
        starting_food: harness.starting_food,
        ..SimConfig::default()
    };
    match SimulationEngine::new(config) {
        Ok(e) => Some(e),
        Err(e) => {
            eprintln!("engine failed to start: {e}");
            None
        }
    }
}

fn engine_failed(name: &str) -> Vec<TestResult> {
    vec![TestResult {
        name: format!("{name}_engine"),
        passed: false,
        detail: "engine failed to start".into(),
    }]
}

/// A companion good enough at everything to come home safely.
fn veteran() -> SkillProfile {
    SkillProfile::with_levels(&[
        (SkillId::Survival, 10),
        (SkillId::Speech, 10),
        (SkillId::Construction, 4),
        (SkillId::Fabrication, 4),
        (SkillId::Melee, 8),
        (SkillId::Dodge, 8),
    ])
}

// ── 1. Content ──────────────────────────────────────────────────────────

fn validate_content(verbose: bool) -> Vec<TestResult> {
    println!("--- Content ---");
    let mut results = Vec::new();

    let parsed = (
        BlueprintCatalog::builtin(),
        StampLibrary::builtin(),
        ItemCatalog::builtin(),
    );
    let (blueprints, stamps, items) = match parsed {
        (Ok(b), Ok(s), Ok(i)) => (b, s, i),
        (b, s, i) => {
            let errors: Vec<String> = [
                b.err().map(|e| e.to_string()),
                s.err().map(|e| e.to_string()),
                i.err().map(|e| e.to_string()),
            ]
            .into_iter()
            .flatten()
            .collect();
            results.push(TestResult {
                name: "content_parse".into(),
                passed: false,
                detail: errors.join("; "),
            });
            return results;
        }
    };

    let count = blueprints.blueprints().count();
    results.push(TestResult {
        name: "content_blueprints".into(),
        passed: count > 0 && blueprints.expansion_root("camp").is_some(),
        detail: format!("{count} blueprints, {} stamps", stamps.len()),
    });

    let missing_stamps: Vec<&str> = blueprints
        .blueprints()
        .filter_map(|b| b.stamp.as_deref())
        .filter(|s| !stamps.has_stamp(s))
        .collect();
    results.push(TestResult {
        name: "content_stamps_exist".into(),
        passed: missing_stamps.is_empty(),
        detail: if missing_stamps.is_empty() {
            "every blueprint stamp is defined".into()
        } else {
            format!("missing: {}", missing_stamps.join(", "))
        },
    });

    let unknown_items: Vec<String> = blueprints
        .blueprints()
        .flat_map(|b| b.components.keys().cloned())
        .chain(
            [FortLevel::Trench, FortLevel::SpikedTrench]
                .iter()
                .filter_map(|&l| blueprints.fortification(l))
                .flat_map(|f| f.components.keys().cloned()),
        )
        .filter(|id| items.item_type(id).is_none())
        .collect();
    if verbose {
        for bp in blueprints.blueprints() {
            println!("    {} ({}): {:?}", bp.id, bp.path, bp.components);
        }
    }
    results.push(TestResult {
        name: "content_components_known".into(),
        passed: unknown_items.is_empty(),
        detail: if unknown_items.is_empty() {
            "all components are known item types".into()
        } else {
            format!("unknown: {}", unknown_items.join(", "))
        },
    });

    results.push(TestResult {
        name: "content_corpse_item".into(),
        passed: items.item_type("corpse").is_some(),
        detail: "fallen companions leave a corpse".into(),
    });

    results
}

// ── 2. Fields ───────────────────────────────────────────────────────────

fn validate_fields(harness: &HarnessConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Fields ---");
    let Some(mut engine) = engine(harness) else {
        return engine_failed("fields");
    };
    let mut results = Vec::new();

    engine.load_map(Tripoint::new(0, 0, 0));
    for x in 20..60 {
        engine.map.furn_set_named(Tripoint::new(x, 30, 0), "f_hay");
    }
    engine.map.add_field(Tripoint::new(20, 30, 0), FieldTypeId::Fire, 3, TimeSpan::ZERO);
    engine.map.add_field(Tripoint::new(80, 80, 0), FieldTypeId::ToxicGas, 3, TimeSpan::ZERO);

    let mut bad_density = 0;
    let mut peak_fields = 0;
    let mut ignited = 0;
    for turn in 0..harness.field_turns {
        let report = engine.update(1);
        ignited += report.ignited.len();
        peak_fields = peak_fields.max(engine.map.field_count());
        for x in 0..MAP_TILES_X {
            for y in [30, 80] {
                let d = engine.map.field_density(Tripoint::new(x, y, 0), FieldTypeId::Fire);
                if d > 3 {
                    bad_density += 1;
                }
            }
        }
        if verbose && turn % 50 == 0 {
            println!("    turn {turn}: {} fields", engine.map.field_count());
        }
    }

    results.push(TestResult {
        name: "fields_density_range".into(),
        passed: bad_density == 0,
        detail: format!("{bad_density} out-of-range densities over {} turns", harness.field_turns),
    });
    results.push(TestResult {
        name: "fields_fire_spreads".into(),
        passed: ignited > 0,
        detail: format!("{ignited} tiles caught fire, peak {peak_fields} fields"),
    });

    let abs = engine.map.abs_sub();
    let mut broken = Vec::new();
    for y in 0..MAPSIZE {
        for x in 0..MAPSIZE {
            let pos = Tripoint::new(abs.x + x, abs.y + y, abs.z);
            if let Some(Err(e)) = engine.map.submap_at(pos).map(|sm| sm.validate()) {
                broken.push(format!("{pos:?}: {e}"));
            }
        }
    }
    results.push(TestResult {
        name: "fields_submaps_consistent".into(),
        passed: broken.is_empty(),
        detail: if broken.is_empty() {
            "field counters match on every submap".into()
        } else {
            broken.join("; ")
        },
    });

    results
}

// ── 3. Gathering ────────────────────────────────────────────────────────

fn validate_gathering(harness: &HarnessConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Gathering ---");
    let Some(mut engine) = engine(harness) else {
        return engine_failed("gathering");
    };
    let mut results = Vec::new();
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", veteran());

    let order = MissionOrder::Gather {
        kind: MissionKind::Foraging,
        duration: Some(TimeSpan::hours(3)),
    };
    let receipt = match engine.dispatch(camp, ash, order) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "gathering_dispatch".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    let reserved = time_to_food(TimeSpan::hours(3));
    results.push(TestResult {
        name: "gathering_reserves_food".into(),
        passed: receipt.reserved_food == reserved && engine.ledger.food_supply == harness.starting_food - reserved,
        detail: format!("reserved {} kcal, {} left", receipt.reserved_food, engine.ledger.food_supply),
    });

    engine.advance(TimeSpan::hours(3));
    match engine.resolve(camp, ash) {
        Ok(report) => {
            if verbose {
                for m in &report.messages {
                    println!("    {m}");
                }
            }
            results.push(TestResult {
                name: "gathering_returns".into(),
                passed: report.kind == ReturnKind::Returned && engine.followers.is_available(ash),
                detail: format!("{} items delivered", report.delivered.len()),
            });
            results.push(TestResult {
                name: "gathering_no_extra_food".into(),
                passed: report.food_settled == 0,
                detail: format!("{} kcal settled on return", report.food_settled),
            });
        }
        Err(e) => results.push(TestResult {
            name: "gathering_returns".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    let apples = engine.items.create_n("apple", 10, engine.now);
    engine.camps[camp].inventory.extend(apples);
    let before = engine.ledger.food_supply;
    let credited = engine.distribute_food(camp);
    results.push(TestResult {
        name: "gathering_distribute_food".into(),
        passed: credited > 0 && engine.ledger.food_supply == before + credited,
        detail: format!("{credited} kcal moved to the larder"),
    });

    results
}

// ── 4. Expansions ───────────────────────────────────────────────────────

fn validate_expansions(harness: &HarnessConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Expansions ---");
    let Some(mut engine) = engine(harness) else {
        return engine_failed("expansions");
    };
    let mut results = Vec::new();
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", veteran());

    let survey = MissionOrder::Survey {
        dir: CompassDir::N,
        path: "farm".to_string(),
    };
    let sent = engine.dispatch(camp, ash, survey).map(|r| {
        engine.advance(r.expected_return - engine.now);
    });
    let surveyed = sent.is_ok() && engine.resolve(camp, ash).is_ok();
    results.push(TestResult {
        name: "expansions_survey_farm".into(),
        passed: surveyed && engine.camps[camp].expansion(CompassDir::N).is_some(),
        detail: format!("{} expansions", engine.camps[camp].expansion_count()),
    });

    let entries = engine.available_missions(camp);
    if verbose {
        for e in &entries {
            println!("    {} [{:?}] {}/{}", e.name, e.action, e.workers, e.max_workers);
        }
    }
    results.push(TestResult {
        name: "expansions_offer_farm_work".into(),
        passed: entries
            .iter()
            .any(|e| e.key.kind == MissionKind::Plow && e.key.dir == CompassDir::N && e.action == EntryAction::Start),
        detail: format!("{} entries in the mission list", entries.len()),
    });

    let items = engine.items.create_n("log", 3, engine.now);
    engine.camps[camp].inventory.extend(items);
    let sticks = engine.items.create_n("stick_long", 8, engine.now);
    engine.camps[camp].inventory.extend(sticks);
    let upgrade = |bp: &str| MissionOrder::Upgrade {
        dir: CompassDir::Base,
        blueprint: bp.to_string(),
    };
    let built = engine.dispatch(camp, ash, upgrade("faction_base_camp_1")).map(|r| {
        engine.advance(r.expected_return - engine.now);
    });
    let built = built.is_ok() && engine.resolve(camp, ash).is_ok();
    results.push(TestResult {
        name: "expansions_tent_camp".into(),
        passed: built && engine.camps[camp].has_provides("hunting"),
        detail: "tent camp built from 8 long sticks".into(),
    });

    let snapshot = engine.camps[camp].clone();
    let rejected = engine.dispatch(camp, ash, upgrade("faction_base_camp_2"));
    results.push(TestResult {
        name: "expansions_short_materials_rejected".into(),
        passed: rejected.is_err() && engine.camps[camp] == snapshot,
        detail: match rejected {
            Err(e) => e.to_string(),
            Ok(_) => "dispatched with 3 of 5 logs".into(),
        },
    });

    results
}

// ── 5. Recall ───────────────────────────────────────────────────────────

fn validate_recall(harness: &HarnessConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Recall ---");
    let Some(mut engine) = engine(harness) else {
        return engine_failed("recall");
    };
    let mut results = Vec::new();
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", veteran());

    let order = MissionOrder::Gather {
        kind: MissionKind::GatherMaterials,
        duration: Some(TimeSpan::hours(72)),
    };
    if let Err(e) = engine.dispatch(camp, ash, order) {
        results.push(TestResult {
            name: "recall_dispatch".into(),
            passed: false,
            detail: e.to_string(),
        });
        return results;
    }

    engine.advance(TimeSpan::hours(1));
    results.push(TestResult {
        name: "recall_too_early".into(),
        passed: engine.emergency_recall(camp, ash).is_err(),
        detail: "recall refused after 1h".into(),
    });

    engine.advance(TimeSpan::hours(29));
    let before = engine.ledger.food_supply;
    match engine.emergency_recall(camp, ash) {
        Ok(report) => {
            let refund = time_to_food(TimeSpan::hours(72)) - time_to_food(TimeSpan::hours(30));
            results.push(TestResult {
                name: "recall_refund".into(),
                passed: -report.food_settled == refund && engine.ledger.food_supply == before + refund,
                detail: format!("{} kcal returned", -report.food_settled),
            });
        }
        Err(e) => results.push(TestResult {
            name: "recall_refund".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }
    results.push(TestResult {
        name: "recall_companion_home".into(),
        passed: engine.followers.is_available(ash),
        detail: "recalled companion is back in the pool".into(),
    });

    results
}

// ── 6. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(harness: &HarnessConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let (Some(mut engine), Some(mut restored)) = (engine(harness), engine(harness)) else {
        return engine_failed("persistence");
    };
    let mut results = Vec::new();
    let camp = engine.found_camp("Ridge", Tripoint::new(0, 0, 0));
    let ash = engine.followers.spawn("Ash", veteran());
    let order = MissionOrder::Gather {
        kind: MissionKind::Foraging,
        duration: None,
    };
    let dispatched = engine.dispatch(camp, ash, order).is_ok();
    engine.advance(TimeSpan::hours(1));

    let mut buf = Vec::new();
    let saved = engine.save(&mut buf);
    let loaded = saved.and_then(|_| restored.load(buf.as_slice()));
    results.push(TestResult {
        name: "persistence_round_trip".into(),
        passed: dispatched && loaded.is_ok(),
        detail: format!("{} bytes", buf.len()),
    });
    results.push(TestResult {
        name: "persistence_state_matches".into(),
        passed: restored.now == engine.now
            && restored.camps == engine.camps
            && restored.ledger == engine.ledger
            && restored.followers.records() == engine.followers.records(),
        detail: format!("{} camps, {} followers", restored.camps.len(), restored.followers.len()),
    });

    results
}
