//! What gathering trips bring home, and what they run into on the way.

use rand::rngs::StdRng;
use rand::Rng;

use ashfall_logic::calendar::{Season, TimePoint, TimeSpan};
use ashfall_logic::encounter::{resolve_encounter, EncounterOutcome, EncounterRolls};
use ashfall_logic::missions::{gathering_skill, GatheringParams, MissionKind};
use ashfall_logic::skills::{SkillId, SkillProfile};
use ashfall_logic::travel::is_forest;

use crate::item::{Item, ItemGroupRoller};
use crate::npc::Npc;

/// Item group a gathering trip draws from. Plain gathering depends on the
/// terrain around the camp; foraging on the season.
pub fn gathering_group(kind: MissionKind, camp_oter: &str, season: Season) -> &'static str {
    match kind {
        MissionKind::CollectFirewood => "gathering_faction_base_camp_firewood",
        MissionKind::Trapping => "trapping_faction_camp",
        MissionKind::Hunting => "hunting_faction_camp",
        MissionKind::Foraging => match season {
            Season::Spring => "foraging_faction_camp_spring",
            Season::Summer => "foraging_faction_camp_summer",
            Season::Autumn => "foraging_faction_camp_autumn",
            Season::Winter => "foraging_faction_camp_winter",
        },
        _ if is_forest(camp_oter) => "forest",
        _ => "field",
    }
}

/// Draw the dice for an encounter and resolve it.
pub fn random_encounter(rng: &mut StdRng, skills: &SkillProfile, favor: i32, threat: i32) -> EncounterOutcome {
    let rolls = EncounterRolls {
        notice: rng.gen_range(0..=10),
        talk: rng.gen_range(0..=10),
        monsters: rng.gen_range(0..=threat.max(0)),
        own_mult: rng.gen_range(8..=12),
        foe_mult: rng.gen_range(8..=12),
    };
    resolve_encounter(skills, favor, rolls)
}

/// Everything a companion found on a gathering trip that lasted `elapsed`.
///
/// Each attempt succeeds when the companion's score beats a roll against
/// the job's difficulty.
pub fn gather_yield(
    npc: &Npc,
    kind: MissionKind,
    group: &str,
    elapsed: TimeSpan,
    now: TimePoint,
    rng: &mut StdRng,
    items: &dyn ItemGroupRoller,
) -> Vec<Item> {
    let params = GatheringParams::for_kind(kind);
    let skill = gathering_skill(
        kind,
        npc.skills.level(SkillId::Survival),
        npc.skills.level(SkillId::Traps),
        npc.skills.level(SkillId::Gun),
        npc.perception,
    );
    let attempts = params.attempts(elapsed, kind.spec().min_duration);
    let mut found = Vec::new();
    for _ in 0..attempts {
        if skill > rng.gen_range(0..=params.difficulty) {
            found.extend(items.roll(group, now, rng));
        }
    }
    log::debug!("{} made {attempts} {kind:?} attempts, found {} items", npc.name, found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::item::ItemCatalog;
    use crate::npc::NpcId;

    #[test]
    fn groups_follow_terrain_and_season() {
        assert_eq!(gathering_group(MissionKind::GatherMaterials, "forest", Season::Summer), "forest");
        assert_eq!(gathering_group(MissionKind::GatherMaterials, "field", Season::Summer), "field");
        assert_eq!(
            gathering_group(MissionKind::Foraging, "field", Season::Winter),
            "foraging_faction_camp_winter"
        );
    }

    #[test]
    fn sharp_eyes_slip_away() {
        let mut rng = StdRng::seed_from_u64(3);
        let skills = SkillProfile::with_levels(&[(SkillId::Survival, 10)]);
        for _ in 0..50 {
            assert_eq!(random_encounter(&mut rng, &skills, 2, 10), EncounterOutcome::SlippedAway);
        }
    }

    #[test]
    fn unskilled_gatherers_bring_back_nothing() {
        let catalog = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut npc = Npc::new(NpcId(1), "Ash", SkillProfile::default());
        npc.perception = 0;
        let found = gather_yield(
            &npc,
            MissionKind::Trapping,
            "trapping_faction_camp",
            TimeSpan::hours(12),
            TimePoint::START,
            &mut rng,
            &catalog,
        );
        assert!(found.is_empty());
    }
}
