//! Companion mission kinds and their static tuning.
//!
//! Each kind has a fixed profile: worker cap, the minimum time away before the
//! companion can be recovered, how the food bill is reconciled, which skill
//! group is trained on return, and which expansion capability unlocks it.

use serde::{Deserialize, Serialize};

use crate::calendar::TimeSpan;
use crate::skills::{SkillGroup, SkillId};

/// Static description of a mission kind.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSpec {
    pub name: &'static str,
    /// Concurrent companions allowed per mission key.
    pub max_workers: usize,
    /// Earliest a companion may be recovered after dispatch.
    pub min_duration: TimeSpan,
    /// Bill food for the reserved duration instead of the time actually
    /// spent away.
    pub fixed_time: bool,
    pub trains: SkillGroup,
    pub return_difficulty: i32,
    /// Skill and level a companion needs to be sent.
    pub required_skill: Option<(SkillId, i32)>,
    /// Expansion capability tag that unlocks the mission.
    pub capability: Option<&'static str>,
    pub must_feed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum MissionKind {
    GatherMaterials = 0,
    CollectFirewood = 1,
    Menial = 2,
    SurveyExpansion = 3,
    CutLogs = 4,
    Clearcut = 5,
    SetupHideSite = 6,
    RelayHideSite = 7,
    Foraging = 8,
    Trapping = 9,
    Hunting = 10,
    Fortifications = 11,
    Recruiting = 12,
    Scouting = 13,
    CombatPatrol = 14,
    Plow = 15,
    Plant = 16,
    Harvest = 17,
    Crafting = 18,
    Upgrade = 19,
    DistributeFood = 20,
    EmergencyRecall = 21,
}

impl MissionKind {
    pub const ALL: [MissionKind; 22] = [
        MissionKind::GatherMaterials,
        MissionKind::CollectFirewood,
        MissionKind::Menial,
        MissionKind::SurveyExpansion,
        MissionKind::CutLogs,
        MissionKind::Clearcut,
        MissionKind::SetupHideSite,
        MissionKind::RelayHideSite,
        MissionKind::Foraging,
        MissionKind::Trapping,
        MissionKind::Hunting,
        MissionKind::Fortifications,
        MissionKind::Recruiting,
        MissionKind::Scouting,
        MissionKind::CombatPatrol,
        MissionKind::Plow,
        MissionKind::Plant,
        MissionKind::Harvest,
        MissionKind::Crafting,
        MissionKind::Upgrade,
        MissionKind::DistributeFood,
        MissionKind::EmergencyRecall,
    ];

    pub fn from_u8(val: u8) -> Option<Self> {
        Self::ALL.get(val as usize).copied()
    }

    /// Whether the mission sends a companion away at all.
    pub fn is_companion_mission(self) -> bool {
        !matches!(self, Self::DistributeFood | Self::EmergencyRecall)
    }

    /// Gathering-style missions roll yields at return.
    pub fn is_gathering(self) -> bool {
        matches!(
            self,
            Self::GatherMaterials
                | Self::CollectFirewood
                | Self::Foraging
                | Self::Trapping
                | Self::Hunting
        )
    }

    pub fn spec(self) -> MissionSpec {
        let base = MissionSpec {
            name: "",
            max_workers: 1,
            min_duration: TimeSpan::hours(3),
            fixed_time: true,
            trains: SkillGroup::Menial,
            return_difficulty: 2,
            required_skill: None,
            capability: None,
            must_feed: true,
        };
        match self {
            Self::GatherMaterials => MissionSpec {
                name: "Gather Materials",
                max_workers: 3,
                fixed_time: false,
                trains: SkillGroup::Gathering,
                return_difficulty: 1,
                required_skill: Some((SkillId::Survival, 0)),
                capability: Some("gathering"),
                ..base
            },
            Self::CollectFirewood => MissionSpec {
                name: "Collect Firewood",
                max_workers: 3,
                fixed_time: false,
                trains: SkillGroup::Gathering,
                return_difficulty: 1,
                required_skill: Some((SkillId::Survival, 0)),
                capability: Some("firewood"),
                ..base
            },
            Self::Menial => MissionSpec {
                name: "Menial Labor",
                capability: Some("sorting"),
                ..base
            },
            Self::SurveyExpansion => MissionSpec {
                name: "Expand Base",
                trains: SkillGroup::Construction,
                required_skill: Some((SkillId::Gun, 0)),
                ..base
            },
            Self::CutLogs => MissionSpec {
                name: "Cut Logs",
                min_duration: TimeSpan::hours(6),
                trains: SkillGroup::Construction,
                required_skill: Some((SkillId::Fabrication, 2)),
                capability: Some("logging"),
                ..base
            },
            Self::Clearcut => MissionSpec {
                name: "Clear a forest",
                min_duration: TimeSpan::hours(6),
                trains: SkillGroup::Construction,
                return_difficulty: 1,
                required_skill: Some((SkillId::Fabrication, 1)),
                capability: Some("logging"),
                ..base
            },
            Self::SetupHideSite => MissionSpec {
                name: "Setup Hide Site",
                trains: SkillGroup::Gathering,
                return_difficulty: 3,
                required_skill: Some((SkillId::Survival, 3)),
                capability: Some("relaying"),
                ..base
            },
            Self::RelayHideSite => MissionSpec {
                name: "Relay Hide Site",
                trains: SkillGroup::Gathering,
                return_difficulty: 3,
                required_skill: Some((SkillId::Survival, 3)),
                capability: Some("relaying"),
                ..base
            },
            Self::Foraging => MissionSpec {
                name: "Forage for plants",
                max_workers: 3,
                min_duration: TimeSpan::hours(4),
                fixed_time: false,
                trains: SkillGroup::Gathering,
                return_difficulty: 1,
                required_skill: Some((SkillId::Survival, 0)),
                capability: Some("foraging"),
                ..base
            },
            Self::Trapping => MissionSpec {
                name: "Trap Small Game",
                max_workers: 2,
                min_duration: TimeSpan::hours(6),
                fixed_time: false,
                trains: SkillGroup::Trapping,
                return_difficulty: 1,
                required_skill: Some((SkillId::Traps, 0)),
                capability: Some("trapping"),
                ..base
            },
            Self::Hunting => MissionSpec {
                name: "Hunt Large Animals",
                min_duration: TimeSpan::hours(6),
                fixed_time: false,
                trains: SkillGroup::Hunting,
                return_difficulty: 1,
                required_skill: Some((SkillId::Gun, 0)),
                capability: Some("hunting"),
                ..base
            },
            Self::Fortifications => MissionSpec {
                name: "Construct Map Fortifications",
                trains: SkillGroup::Construction,
                required_skill: Some((SkillId::Construction, 0)),
                capability: Some("walls"),
                ..base
            },
            Self::Recruiting => MissionSpec {
                name: "Recruit Companions",
                min_duration: TimeSpan::days(4),
                trains: SkillGroup::Recruiting,
                required_skill: Some((SkillId::Gun, 0)),
                capability: Some("recruiting"),
                ..base
            },
            Self::Scouting => MissionSpec {
                name: "Scout Mission",
                max_workers: 3,
                trains: SkillGroup::Combat,
                return_difficulty: 4,
                required_skill: Some((SkillId::Survival, 3)),
                capability: Some("scouting"),
                ..base
            },
            Self::CombatPatrol => MissionSpec {
                name: "Combat Patrol",
                max_workers: 3,
                trains: SkillGroup::Combat,
                return_difficulty: 4,
                required_skill: Some((SkillId::Survival, 3)),
                capability: Some("patrolling"),
                ..base
            },
            Self::Plow => MissionSpec {
                name: "Plow Fields",
                min_duration: TimeSpan::minutes(15),
                trains: SkillGroup::Farming,
                capability: Some("farming"),
                ..base
            },
            Self::Plant => MissionSpec {
                name: "Plant Fields",
                min_duration: TimeSpan::minutes(15),
                trains: SkillGroup::Farming,
                required_skill: Some((SkillId::Survival, 1)),
                capability: Some("farming"),
                ..base
            },
            Self::Harvest => MissionSpec {
                name: "Harvest Fields",
                min_duration: TimeSpan::minutes(15),
                trains: SkillGroup::Farming,
                required_skill: Some((SkillId::Survival, 1)),
                capability: Some("farming"),
                ..base
            },
            Self::Crafting => MissionSpec {
                name: "Craft Item",
                max_workers: 3,
                min_duration: TimeSpan::ZERO,
                fixed_time: false,
                trains: SkillGroup::Construction,
                ..base
            },
            Self::Upgrade => MissionSpec {
                name: "Upgrade Camp",
                min_duration: TimeSpan::ZERO,
                fixed_time: false,
                trains: SkillGroup::Construction,
                ..base
            },
            Self::DistributeFood => MissionSpec {
                name: "Distribute Food",
                max_workers: 0,
                min_duration: TimeSpan::ZERO,
                must_feed: false,
                ..base
            },
            Self::EmergencyRecall => MissionSpec {
                name: "Emergency Recall",
                max_workers: 0,
                min_duration: TimeSpan::hours(24),
                must_feed: false,
                return_difficulty: 0,
                ..base
            },
        }
    }
}

/// Gathering roll parameters, by mission kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatheringParams {
    /// One in `danger` trips meets an encounter.
    pub danger: i32,
    pub favor: i32,
    pub threat: i32,
    pub checks_per_cycle: i64,
    /// Upper bound of the per-attempt difficulty roll.
    pub difficulty: i32,
}

impl GatheringParams {
    pub fn for_kind(kind: MissionKind) -> Self {
        let mut p = GatheringParams {
            danger: 20,
            favor: 2,
            threat: 10,
            checks_per_cycle: 6,
            difficulty: 15,
        };
        match kind {
            MissionKind::Foraging => {
                p.danger = 15;
                p.checks_per_cycle = 12;
            }
            MissionKind::Trapping => {
                p.favor = 1;
                p.danger = 15;
                p.checks_per_cycle = 4;
                p.difficulty = 30;
            }
            MissionKind::Hunting => {
                p.danger = 10;
                p.favor = 0;
                p.threat = 12;
                p.checks_per_cycle = 2;
                p.difficulty = 30;
            }
            _ => {}
        }
        p
    }

    /// Yield attempts for a trip that lasted `elapsed`.
    pub fn attempts(&self, elapsed: TimeSpan, base: TimeSpan) -> i64 {
        if base.as_seconds() <= 0 {
            return 0;
        }
        self.checks_per_cycle * elapsed.as_seconds().max(0) / base.as_seconds()
    }
}

/// Gathering skill score from skill levels and perception.
pub fn gathering_skill(kind: MissionKind, survival: i32, traps: i32, gun: i32, per: i32) -> i32 {
    match kind {
        MissionKind::Trapping => 2 * traps + per,
        MissionKind::Hunting => (1.5 * gun as f64 + per as f64 / 2.0) as i32,
        _ => 2 * survival + per,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_caps() {
        assert_eq!(MissionKind::Foraging.spec().max_workers, 3);
        assert_eq!(MissionKind::Trapping.spec().max_workers, 2);
        assert_eq!(MissionKind::Hunting.spec().max_workers, 1);
        assert_eq!(MissionKind::CombatPatrol.spec().max_workers, 3);
        assert_eq!(MissionKind::Upgrade.spec().max_workers, 1);
    }

    #[test]
    fn from_u8_round_trips() {
        for kind in MissionKind::ALL {
            assert_eq!(MissionKind::from_u8(kind as u8), Some(kind));
        }
        assert_eq!(MissionKind::from_u8(99), None);
    }

    #[test]
    fn gathering_attempts_scale_with_time() {
        let p = GatheringParams::for_kind(MissionKind::Foraging);
        assert_eq!(p.attempts(TimeSpan::hours(4), TimeSpan::hours(4)), 12);
        assert_eq!(p.attempts(TimeSpan::hours(8), TimeSpan::hours(4)), 24);
        assert_eq!(p.attempts(TimeSpan::hours(8), TimeSpan::ZERO), 0);
    }

    #[test]
    fn hunting_skill_weights_marksmanship() {
        assert_eq!(gathering_skill(MissionKind::Hunting, 9, 9, 4, 8), 10);
        assert_eq!(gathering_skill(MissionKind::Trapping, 0, 3, 0, 8), 14);
        assert_eq!(gathering_skill(MissionKind::GatherMaterials, 2, 0, 0, 8), 12);
    }

    #[test]
    fn only_companion_missions_take_workers() {
        for kind in MissionKind::ALL {
            assert_eq!(kind.is_companion_mission(), kind.spec().max_workers > 0);
        }
    }
}
