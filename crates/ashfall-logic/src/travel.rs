//! Overland travel time and hauling.
//!
//! Companions walk straight lines across overmap tiles. Each tile costs a
//! number of seconds depending on its terrain; carrying cargo adds a fixed
//! per-tile penalty per unit of haulage. Rivers are the slow outlier since
//! most cargo has to be portaged.

use crate::calendar::TimeSpan;

/// Mass a companion hauls per harvested log or bundle, in grams.
pub const HAUL_ITEM_MASS_G: i64 = 10_000;
/// Volume of the same, in millilitres.
pub const HAUL_ITEM_VOLUME_ML: i64 = 5_000;
/// Carry capacity assumed when no companion is chosen yet: 30 kg...
pub const DEFAULT_CARRY_MASS_G: i64 = 30_000;
/// ...and the volume of a makeshift sling on top of normal gear.
pub const DEFAULT_CARRY_VOLUME_ML: i64 = 20_000;

/// River tiles share an id prefix.
pub fn is_river(oter: &str) -> bool {
    oter.starts_with("river")
}

pub fn is_forest(oter: &str) -> bool {
    matches!(oter, "forest" | "forest_thick" | "forest_water") || is_forest_trail(oter)
}

pub fn is_forest_trail(oter: &str) -> bool {
    oter.starts_with("forest_trail")
}

/// Seconds to cross one overmap tile of `oter` carrying `haulage` loads.
pub fn tile_traverse_seconds(oter: &str, haulage: i64) -> i64 {
    if oter == "field" {
        30 + 30 * haulage
    } else if is_forest_trail(oter) {
        35 + 30 * haulage
    } else if oter == "forest_thick" {
        50 + 30 * haulage
    } else if oter == "forest_water" {
        60 + 30 * haulage
    } else if is_river(oter) {
        200 + 40 * haulage
    } else {
        40 + 30 * haulage
    }
}

/// Total mission time: `work` plus `trips` one-way walks over `journey`.
pub fn companion_travel_time<S: AsRef<str>>(
    journey: &[S],
    work: TimeSpan,
    trips: i64,
    haulage: i64,
) -> TimeSpan {
    let one_way: i64 = journey
        .iter()
        .map(|oter| tile_traverse_seconds(oter.as_ref(), haulage))
        .sum();
    work + TimeSpan::seconds(one_way * trips)
}

/// Number of one-way trips needed to move a load, counting the walk back.
pub fn carry_weight_to_trips(
    mass_g: i64,
    volume_ml: i64,
    carry_mass_g: i64,
    carry_volume_ml: i64,
) -> i64 {
    let trips_m = 1 + mass_g / carry_mass_g.max(1);
    let trips_v = 1 + volume_ml / carry_volume_ml.max(1);
    2 * trips_m.max(trips_v)
}

/// Time spent felling and bucking before any travel.
pub fn cutting_time(trees: i64, young_trees: i64) -> TimeSpan {
    TimeSpan::hours(6) + TimeSpan::hours(1) * trees + TimeSpan::minutes(7) * young_trees
}

/// Stretch a work estimate over companion work days of ten hours each.
///
/// Short jobs finish the same day. Longer ones take a full 24 hours per
/// ten hours worked, plus the remainder unless it would fit in a day.
pub fn to_workdays(work: TimeSpan) -> TimeSpan {
    if work < TimeSpan::hours(11) {
        return work;
    }
    let mut days = work.as_seconds() / TimeSpan::hours(10).as_seconds();
    let mut excess = work - TimeSpan::hours(10) * days;
    if excess > TimeSpan::hours(11) {
        days += 1;
        excess = TimeSpan::ZERO;
    }
    TimeSpan::hours(24) * days + excess
}

/// Loads hauled back from a logging trip.
pub fn log_haul_items(trees: i64, young_trees: i64) -> i64 {
    2 * trees + 3 * young_trees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_cheaper_than_forest_cheaper_than_river() {
        let field = tile_traverse_seconds("field", 0);
        let forest = tile_traverse_seconds("forest_thick", 0);
        let river = tile_traverse_seconds("river_center", 0);
        assert!(field < forest);
        assert!(forest < river);
    }

    #[test]
    fn hauling_slows_travel() {
        assert_eq!(tile_traverse_seconds("field", 0), 30);
        assert_eq!(tile_traverse_seconds("field", 2), 90);
        assert_eq!(tile_traverse_seconds("river_ne", 1), 240);
    }

    #[test]
    fn travel_time_sums_journey() {
        let journey = ["field", "forest_trail", "road"];
        let t = companion_travel_time(&journey, TimeSpan::hours(1), 2, 0);
        assert_eq!(t, TimeSpan::hours(1) + TimeSpan::seconds((30 + 35 + 40) * 2));
    }

    #[test]
    fn trips_are_round_trips() {
        assert_eq!(carry_weight_to_trips(0, 0, 30_000, 20_000), 2);
        assert_eq!(carry_weight_to_trips(65_000, 1_000, 30_000, 20_000), 6);
    }

    #[test]
    fn logging_time() {
        assert_eq!(cutting_time(0, 0), TimeSpan::hours(6));
        assert_eq!(
            cutting_time(3, 2),
            TimeSpan::hours(9) + TimeSpan::minutes(14)
        );
        assert_eq!(log_haul_items(3, 2), 12);
    }

    #[test]
    fn workdays_stretch_long_jobs() {
        assert_eq!(to_workdays(TimeSpan::hours(3)), TimeSpan::hours(3));
        assert_eq!(to_workdays(TimeSpan::hours(20)), TimeSpan::hours(48));
        assert_eq!(to_workdays(TimeSpan::hours(25)), TimeSpan::hours(53));
    }

    #[test]
    fn forest_classification() {
        assert!(is_forest("forest_trail_ns"));
        assert!(is_forest("forest_water"));
        assert!(!is_forest("field"));
    }
}
