//! Faction food ledger: kcal stock, labor cost, and the morale fallout of
//! running out.
//!
//! The ledger is an explicit value threaded through camp operations. Every
//! mission reserves its food up front with [`FactionLedger::consume_for`]
//! and may reconcile at resolution.

use serde::{Deserialize, Serialize};

use crate::calendar::TimeSpan;
use crate::constants::camp::KCAL_PER_DAY;

/// Food needed to pay a companion for `work`.
///
/// One day's ration (2500 kcal) per 24 hours, charged in whole hours.
pub fn time_to_food(work: TimeSpan) -> i64 {
    KCAL_PER_DAY * work.whole_hours().max(0) / 24
}

/// Per-faction shared counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionLedger {
    /// Stored food in kcal. Never negative.
    pub food_supply: i64,
    /// How much the followers like the player (morale).
    pub likes_u: i64,
    /// How much the followers respect the player (discipline).
    pub respects_u: i64,
    pub trusts_u: i64,
}

impl FactionLedger {
    pub fn new(food_supply: i64) -> Self {
        Self {
            food_supply: food_supply.max(0),
            ..Self::default()
        }
    }

    /// Apply `change` kcal and return the resulting supply.
    ///
    /// A result below zero is floored at zero and the shortfall is taken out
    /// of morale, discipline and trust instead.
    pub fn camp_food_supply(&mut self, change: i64) -> i64 {
        self.food_supply += change;
        if self.food_supply < 0 {
            let shortfall = self.food_supply;
            self.likes_u += shortfall / 1250;
            self.respects_u += shortfall / 625;
            self.trusts_u += shortfall / 625;
            self.food_supply = 0;
        }
        self.food_supply
    }

    /// Whole days of rations in stock.
    pub fn food_days(&self) -> i64 {
        self.food_supply / KCAL_PER_DAY
    }

    /// Charge the food cost of `work`. Returns the amount charged.
    pub fn consume_for(&mut self, work: TimeSpan) -> i64 {
        let cost = time_to_food(work);
        self.camp_food_supply(-cost);
        cost
    }

    pub fn can_feed(&self, work: TimeSpan) -> bool {
        self.food_supply >= time_to_food(work)
    }

    pub fn camp_discipline(&mut self, change: i64) -> i64 {
        self.respects_u += change;
        self.respects_u
    }

    pub fn camp_morale(&mut self, change: i64) -> i64 {
        self.likes_u += change;
        self.likes_u
    }
}

/// How close a food item is to rotting when handed to the larder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    Rotten,
    /// Rots in under two days.
    Perishing,
    /// Rots in under five days.
    Perishable,
    Fresh,
}

impl Freshness {
    pub fn from_time_left(rots_in: Option<TimeSpan>) -> Self {
        match rots_in {
            None => Self::Fresh,
            Some(t) if t <= TimeSpan::ZERO => Self::Rotten,
            Some(t) if t < TimeSpan::days(2) => Self::Perishing,
            Some(t) if t < TimeSpan::days(5) => Self::Perishable,
            Some(_) => Self::Fresh,
        }
    }

    /// Percentage of the item's kcal the larder credits. A pantry slows
    /// the losses on food that is about to turn.
    pub fn credit_percent(self, pantry: bool) -> i64 {
        match (self, pantry) {
            (Self::Rotten, _) => 0,
            (Self::Perishing, false) => 60,
            (Self::Perishing, true) => 70,
            (Self::Perishable, false) => 80,
            (Self::Perishable, true) => 85,
            (Self::Fresh, _) => 100,
        }
    }
}

/// Lowest enjoyability a ration may have and still be accepted.
pub const MIN_ACCEPTED_FUN: i32 = -6;

/// Kcal credited for one food stack handed to the larder.
pub fn distribution_credit(kcal: i64, fun: i32, freshness: Freshness, pantry: bool) -> i64 {
    if fun < MIN_ACCEPTED_FUN {
        return 0;
    }
    kcal.max(0) * freshness.credit_percent(pantry) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_hours_of_food() {
        assert_eq!(time_to_food(TimeSpan::hours(3)), 312);
        assert_eq!(time_to_food(TimeSpan::hours(24)), 2500);
        assert_eq!(time_to_food(TimeSpan::minutes(59)), 0);
    }

    #[test]
    fn supply_change_round_trips() {
        let mut ledger = FactionLedger::new(10_000);
        ledger.camp_food_supply(750);
        ledger.camp_food_supply(-750);
        assert_eq!(ledger.food_supply, 10_000);
        assert_eq!(ledger.likes_u, 0);
    }

    #[test]
    fn shortfall_hits_morale() {
        let mut ledger = FactionLedger::new(500);
        let left = ledger.camp_food_supply(-3000);
        assert_eq!(left, 0);
        assert_eq!(ledger.likes_u, -2);
        assert_eq!(ledger.respects_u, -4);
        assert_eq!(ledger.trusts_u, -4);
    }

    #[test]
    fn food_days() {
        assert_eq!(FactionLedger::new(7600).food_days(), 3);
    }

    #[test]
    fn consume_for_charges_time_to_food() {
        let mut ledger = FactionLedger::new(10_000);
        let charged = ledger.consume_for(TimeSpan::hours(3));
        assert_eq!(charged, 312);
        assert_eq!(ledger.food_supply, 9688);
    }

    #[test]
    fn freshness_credit() {
        assert_eq!(distribution_credit(1000, 0, Freshness::Fresh, false), 1000);
        assert_eq!(distribution_credit(1000, 0, Freshness::Perishing, false), 600);
        assert_eq!(distribution_credit(1000, 0, Freshness::Perishing, true), 700);
        assert_eq!(distribution_credit(1000, 0, Freshness::Rotten, true), 0);
        assert_eq!(distribution_credit(1000, -7, Freshness::Fresh, false), 0);
        assert_eq!(
            Freshness::from_time_left(Some(TimeSpan::days(3))),
            Freshness::Perishable
        );
    }
}
