//! Field processing throughput over a full live window.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ashfall_core::config::SimConfig;
use ashfall_core::item::ItemCatalog;
use ashfall_core::map::{MapGrid, TurnContext};
use ashfall_core::registry::{FieldTypeId, Registry};
use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::coords::Tripoint;

fn burning_grid() -> MapGrid {
    let reg = Arc::new(Registry::builtin());
    let grass = reg.ter_id("t_grass");
    let mut g = MapGrid::new(reg, &SimConfig::default());
    g.fill(Tripoint::new(0, 0, 0), grass);
    for y in (10..120).step_by(6) {
        for x in 10..120 {
            g.furn_set_named(Tripoint::new(x, y, 0), "f_hay");
        }
        g.add_field(Tripoint::new(10, y, 0), FieldTypeId::Fire, 3, TimeSpan::ZERO);
    }
    for i in 0..20 {
        g.add_field(Tripoint::new(15 + i * 5, 13, 0), FieldTypeId::ToxicGas, 3, TimeSpan::ZERO);
    }
    g
}

fn bench_process_fields(c: &mut Criterion) {
    let items = ItemCatalog::builtin().unwrap();

    c.bench_function("process_fields_100_turns", |b| {
        b.iter_with_setup(
            || (burning_grid(), StdRng::seed_from_u64(7)),
            |(mut g, mut rng)| {
                for _ in 0..100 {
                    let mut ctx = TurnContext {
                        now: TimePoint::START,
                        rng: &mut rng,
                        items: &items,
                    };
                    black_box(g.process_fields(&mut ctx, true));
                }
            },
        )
    });

    c.bench_function("process_fields_idle_window", |b| {
        let reg = Arc::new(Registry::builtin());
        let dirt = reg.ter_id("t_dirt");
        let mut g = MapGrid::new(reg, &SimConfig::default());
        g.fill(Tripoint::new(0, 0, 0), dirt);
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let mut ctx = TurnContext {
                now: TimePoint::START,
                rng: &mut rng,
                items: &items,
            };
            black_box(g.process_fields(&mut ctx, true))
        })
    });
}

criterion_group!(benches, bench_process_fields);
criterion_main!(benches);
