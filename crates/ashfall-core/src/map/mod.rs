//! The tile world: submaps, the live map grid and everything that edits it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`submap`] | 12×12 persistence unit with all tile layers |
//! | [`vehicle`] | Vehicles owned by submaps |
//! | [`grid`] | The `MAPSIZE × MAPSIZE` window of live submaps |
//! | [`cache`] | Transparency, outside, light and seen caches |
//! | [`bash`] | Bashing, destruction and roof collapse |
//! | [`process`] | Per-turn field processing |
//! | [`examine`] | Per-terrain examine behaviors |
//! | [`mapbuffer`] | Submap backing stores and the load-or-generate path |
//! | [`mapgen`] | Fresh submap generation and update-mapgen stamps |
//! | [`site`] | 2×2-submap view of one overmap tile |

pub mod bash;
pub mod cache;
pub mod examine;
pub mod grid;
pub mod mapbuffer;
pub mod mapgen;
pub mod process;
pub mod site;
pub mod submap;
pub mod vehicle;

use rand::rngs::StdRng;

use ashfall_logic::calendar::TimePoint;

use crate::item::ItemGroupRoller;

pub use bash::{BashOutcome, BashParams};
pub use examine::ExamineOutcome;
pub use grid::MapGrid;
pub use mapbuffer::{DiskMapBuffer, MapBuffer, MemoryMapBuffer, SubmapLoader};
pub use mapgen::{MapGenerator, MapgenUpdater, StampLibrary, TerrainMapgen};
pub use process::FieldReport;
pub use site::OmtSite;
pub use submap::{FieldEntry, FieldLayer, SpawnPoint, Submap};
pub use vehicle::{Vehicle, VehicleId, VehiclePart};

/// What a map edit needs besides the map: the clock, dice and loot tables.
pub struct TurnContext<'a> {
    pub now: TimePoint,
    pub rng: &'a mut StdRng,
    pub items: &'a dyn ItemGroupRoller,
}

/// `true` with probability `1/n`. Anything at or below 1 always hits.
pub(crate) fn one_in(rng: &mut StdRng, n: i32) -> bool {
    use rand::Rng;
    n <= 1 || rng.gen_range(0..n) == 0
}

/// Sum of `n` rolls of a `sides`-sided die.
pub(crate) fn dice(rng: &mut StdRng, n: i32, sides: i64) -> i64 {
    use rand::Rng;
    if sides < 1 {
        return 0;
    }
    (0..n).map(|_| rng.gen_range(1..=sides)).sum()
}
