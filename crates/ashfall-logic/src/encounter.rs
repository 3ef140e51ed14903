//! Random encounters met by companions away from camp.
//!
//! The outcome is a pure function of the companion's skills, the task's
//! favor and threat, and a set of dice already rolled by the caller.

use serde::{Deserialize, Serialize};

use crate::calendar::TimeSpan;
use crate::skills::{SkillGroup, SkillId, SkillProfile};

/// Dice for one encounter. The caller draws these from its RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterRolls {
    /// `rng(0, 10)` against survival.
    pub notice: i32,
    /// `rng(0, 10)` against speech.
    pub talk: i32,
    /// `rng(0, threat)`: size of the ambushing group.
    pub monsters: i32,
    /// `rng(8, 12)` scaling the companion's side.
    pub own_mult: i32,
    /// `rng(8, 12)` scaling the ambushers' side.
    pub foe_mult: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterOutcome {
    SlippedAway,
    TalkedDown,
    FoughtOff,
    Killed,
}

impl EncounterOutcome {
    pub fn survived(self) -> bool {
        self != Self::Killed
    }

    /// Skill group trained by a survived encounter.
    pub fn trains(self) -> Option<SkillGroup> {
        match self {
            Self::SlippedAway => Some(SkillGroup::Gathering),
            Self::TalkedDown => Some(SkillGroup::Recruiting),
            Self::FoughtOff => Some(SkillGroup::Combat),
            Self::Killed => None,
        }
    }

    pub fn narrative(self) -> &'static str {
        match self {
            Self::SlippedAway => "noticed the antlered horror and slipped away before it got too close",
            Self::TalkedDown => "met another survivor asking for directions and parted on friendly terms without mentioning the camp",
            Self::FoughtOff => "was ambushed but fought the attackers off",
            Self::Killed => "didn't detect the ambush until it was too late",
        }
    }
}

/// Time credited for training after an encounter.
pub const ENCOUNTER_TRAINING: TimeSpan = TimeSpan::minutes(10);

/// Resolve an encounter: notice, then talk, then fight.
pub fn resolve_encounter(skills: &SkillProfile, favor: i32, rolls: EncounterRolls) -> EncounterOutcome {
    if skills.level(SkillId::Survival) + favor > rolls.notice {
        EncounterOutcome::SlippedAway
    } else if skills.level(SkillId::Speech) + favor > rolls.talk {
        EncounterOutcome::TalkedDown
    } else if skills.combat_rating() * rolls.own_mult > rolls.monsters * rolls.foe_mult {
        EncounterOutcome::FoughtOff
    } else {
        EncounterOutcome::Killed
    }
}

/// Training difficulty after surviving; lower when the task was easy.
pub fn training_difficulty(favor: i32) -> i32 {
    10 - favor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rolls(notice: i32, talk: i32, monsters: i32) -> EncounterRolls {
        EncounterRolls {
            notice,
            talk,
            monsters,
            own_mult: 10,
            foe_mult: 10,
        }
    }

    #[test]
    fn survivalist_slips_away() {
        let skills = SkillProfile::with_levels(&[(SkillId::Survival, 5)]);
        assert_eq!(resolve_encounter(&skills, 2, rolls(6, 10, 10)), EncounterOutcome::SlippedAway);
    }

    #[test]
    fn talker_talks() {
        let skills = SkillProfile::with_levels(&[(SkillId::Speech, 8)]);
        assert_eq!(resolve_encounter(&skills, 0, rolls(10, 7, 10)), EncounterOutcome::TalkedDown);
    }

    #[test]
    fn fighter_survives_small_ambush() {
        let skills = SkillProfile::with_levels(&[(SkillId::Melee, 3), (SkillId::Dodge, 2)]);
        assert_eq!(resolve_encounter(&skills, 0, rolls(10, 10, 4)), EncounterOutcome::FoughtOff);
    }

    #[test]
    fn unskilled_dies() {
        let skills = SkillProfile::default();
        let outcome = resolve_encounter(&skills, 0, rolls(10, 10, 1));
        assert_eq!(outcome, EncounterOutcome::Killed);
        assert!(!outcome.survived());
        assert_eq!(outcome.trains(), None);
    }

    #[test]
    fn empty_ambush_is_a_draw_and_a_loss() {
        // 0 * mult > 0 * mult is false
        let skills = SkillProfile::default();
        assert_eq!(resolve_encounter(&skills, 0, rolls(10, 10, 0)), EncounterOutcome::Killed);
    }
}
