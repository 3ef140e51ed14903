//! Companion skills, practice and level progression.
//!
//! Skills are integer levels (0–10) with an exercise pool that fills as the
//! companion practices. Camp missions train whole skill groups: a foraging
//! trip trains survival, a patrol trains the melee family, and so on.
//!
//! ```
//! use ashfall_logic::skills::{SkillId, SkillProfile};
//!
//! let mut p = SkillProfile::default();
//! p.set_level(SkillId::Survival, 2);
//! let gained = p.practice(SkillId::Survival, 900);
//! assert_eq!(gained, 1);
//! assert_eq!(p.level(SkillId::Survival), 3);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calendar::TimeSpan;

/// Highest level reachable through practice.
pub const MAX_SKILL_LEVEL: i32 = 10;

/// Every skill a companion can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillId {
    Survival,
    Speech,
    Melee,
    Bashing,
    Cutting,
    Stabbing,
    Unarmed,
    Dodge,
    Gun,
    Traps,
    Fabrication,
    Construction,
    Swimming,
    Cooking,
}

impl SkillId {
    pub const ALL: [SkillId; 14] = [
        SkillId::Survival,
        SkillId::Speech,
        SkillId::Melee,
        SkillId::Bashing,
        SkillId::Cutting,
        SkillId::Stabbing,
        SkillId::Unarmed,
        SkillId::Dodge,
        SkillId::Gun,
        SkillId::Traps,
        SkillId::Fabrication,
        SkillId::Construction,
        SkillId::Swimming,
        SkillId::Cooking,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Speech => "speech",
            Self::Melee => "melee",
            Self::Bashing => "bashing",
            Self::Cutting => "cutting",
            Self::Stabbing => "stabbing",
            Self::Unarmed => "unarmed",
            Self::Dodge => "dodge",
            Self::Gun => "marksmanship",
            Self::Traps => "devices",
            Self::Fabrication => "fabrication",
            Self::Construction => "construction",
            Self::Swimming => "swimming",
            Self::Cooking => "cooking",
        }
    }
}

/// A named bundle of skills trained together by a mission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillGroup {
    Gathering,
    Trapping,
    Hunting,
    Combat,
    Construction,
    Menial,
    Recruiting,
    Farming,
    Single(SkillId),
}

impl SkillGroup {
    /// Skills practiced by this group with their relative weights.
    pub fn weights(self) -> Vec<(SkillId, u32)> {
        match self {
            Self::Gathering => vec![(SkillId::Survival, 3), (SkillId::Fabrication, 1)],
            Self::Trapping => vec![(SkillId::Traps, 3), (SkillId::Survival, 1)],
            Self::Hunting => vec![(SkillId::Gun, 2), (SkillId::Survival, 2)],
            Self::Combat => vec![
                (SkillId::Melee, 2),
                (SkillId::Dodge, 2),
                (SkillId::Bashing, 1),
                (SkillId::Cutting, 1),
                (SkillId::Stabbing, 1),
                (SkillId::Unarmed, 1),
            ],
            Self::Construction => vec![(SkillId::Construction, 3), (SkillId::Fabrication, 1)],
            Self::Menial => vec![(SkillId::Fabrication, 1), (SkillId::Cooking, 1)],
            Self::Recruiting => vec![(SkillId::Speech, 1)],
            Self::Farming => vec![(SkillId::Survival, 1)],
            Self::Single(id) => vec![(id, 1)],
        }
    }
}

/// Level plus accumulated exercise toward the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillLevel {
    pub level: i32,
    pub exercise: i32,
}

/// Exercise needed to advance from `level` to `level + 1`.
pub fn exercise_for_next(level: i32) -> i32 {
    (level + 1) * (level + 1) * 100
}

/// Mutable skill sheet for one companion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    skills: BTreeMap<SkillId, SkillLevel>,
}

impl SkillProfile {
    /// Build a profile from `(skill, level)` pairs.
    pub fn with_levels(levels: &[(SkillId, i32)]) -> Self {
        let mut p = Self::default();
        for &(id, lvl) in levels {
            p.set_level(id, lvl);
        }
        p
    }

    pub fn level(&self, id: SkillId) -> i32 {
        self.skills.get(&id).map(|s| s.level).unwrap_or(0)
    }

    pub fn exercise(&self, id: SkillId) -> i32 {
        self.skills.get(&id).map(|s| s.exercise).unwrap_or(0)
    }

    pub fn set_level(&mut self, id: SkillId, level: i32) {
        let entry = self.skills.entry(id).or_default();
        entry.level = level.clamp(0, MAX_SKILL_LEVEL);
        entry.exercise = 0;
    }

    /// Add `amount` exercise to a skill. Returns the number of levels gained.
    pub fn practice(&mut self, id: SkillId, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let entry = self.skills.entry(id).or_default();
        if entry.level >= MAX_SKILL_LEVEL {
            return 0;
        }
        entry.exercise += amount;
        let mut gained = 0;
        while entry.level < MAX_SKILL_LEVEL && entry.exercise >= exercise_for_next(entry.level) {
            entry.exercise -= exercise_for_next(entry.level);
            entry.level += 1;
            gained += 1;
        }
        if entry.level >= MAX_SKILL_LEVEL {
            entry.exercise = 0;
        }
        gained
    }

    /// Combined fighting ability used by ambush resolution.
    pub fn combat_rating(&self) -> i32 {
        let total = self.level(SkillId::Melee) as f64
            + 0.5 * self.level(SkillId::Survival) as f64
            + self.level(SkillId::Bashing) as f64
            + self.level(SkillId::Cutting) as f64
            + self.level(SkillId::Stabbing) as f64
            + self.level(SkillId::Unarmed) as f64
            + self.level(SkillId::Dodge) as f64;
        total as i32
    }
}

/// Split `checks` practice checks across a group's skills by weight.
///
/// Checks are dealt round-robin over a weight-expanded list so the split is
/// deterministic and every skill with weight gets its share.
pub fn practice_plan(group: SkillGroup, checks: u32) -> Vec<(SkillId, u32)> {
    let weights = group.weights();
    let deck: Vec<SkillId> = weights
        .iter()
        .flat_map(|&(id, w)| std::iter::repeat(id).take(w as usize))
        .collect();
    let mut plan: Vec<(SkillId, u32)> = weights.iter().map(|&(id, _)| (id, 0)).collect();
    if deck.is_empty() {
        return plan;
    }
    for i in 0..checks as usize {
        let id = deck[i % deck.len()];
        if let Some(slot) = plan.iter_mut().find(|(s, _)| *s == id) {
            slot.1 += 1;
        }
    }
    plan.retain(|(_, n)| *n > 0);
    plan
}

/// Train a group for `time_worked` at `difficulty`.
///
/// One check per ten minutes worked (plus one), each worth `difficulty`
/// exercise (at least 1). Returns total levels gained.
pub fn train_group(
    profile: &mut SkillProfile,
    group: SkillGroup,
    time_worked: TimeSpan,
    difficulty: i32,
) -> i32 {
    let difficulty = difficulty.max(1);
    let checks = 1 + (time_worked.whole_minutes().max(0) / 10) as u32;
    practice_plan(group, checks)
        .into_iter()
        .map(|(id, n)| profile.practice(id, difficulty * n as i32))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_skill_is_zero() {
        let p = SkillProfile::default();
        assert_eq!(p.level(SkillId::Gun), 0);
        assert_eq!(p.exercise(SkillId::Gun), 0);
    }

    #[test]
    fn practice_levels_up_and_carries_exercise() {
        let mut p = SkillProfile::default();
        // 100 for level 1, 400 for level 2
        assert_eq!(p.practice(SkillId::Speech, 550), 2);
        assert_eq!(p.level(SkillId::Speech), 2);
        assert_eq!(p.exercise(SkillId::Speech), 50);
    }

    #[test]
    fn practice_caps_at_max() {
        let mut p = SkillProfile::with_levels(&[(SkillId::Melee, MAX_SKILL_LEVEL)]);
        assert_eq!(p.practice(SkillId::Melee, 1_000_000), 0);
        assert_eq!(p.level(SkillId::Melee), MAX_SKILL_LEVEL);
    }

    #[test]
    fn set_level_clamps() {
        let mut p = SkillProfile::default();
        p.set_level(SkillId::Dodge, 42);
        assert_eq!(p.level(SkillId::Dodge), MAX_SKILL_LEVEL);
        p.set_level(SkillId::Dodge, -3);
        assert_eq!(p.level(SkillId::Dodge), 0);
    }

    #[test]
    fn combat_rating_halves_survival() {
        let p = SkillProfile::with_levels(&[
            (SkillId::Melee, 2),
            (SkillId::Survival, 3),
            (SkillId::Dodge, 1),
        ]);
        // 2 + 1.5 + 1 = 4.5, truncated
        assert_eq!(p.combat_rating(), 4);
    }

    #[test]
    fn practice_plan_respects_weights() {
        let plan = practice_plan(SkillGroup::Gathering, 8);
        let survival = plan.iter().find(|(s, _)| *s == SkillId::Survival).unwrap().1;
        let fab = plan.iter().find(|(s, _)| *s == SkillId::Fabrication).unwrap().1;
        assert_eq!(survival + fab, 8);
        assert_eq!(survival, 6);
    }

    #[test]
    fn train_group_counts_checks() {
        let mut p = SkillProfile::default();
        // 3 hours = 18 checks + 1, difficulty 2 -> 38 exercise into one skill
        train_group(&mut p, SkillGroup::Recruiting, TimeSpan::hours(3), 2);
        assert_eq!(p.exercise(SkillId::Speech), 38);
    }
}
