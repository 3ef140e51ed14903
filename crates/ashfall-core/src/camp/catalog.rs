//! The camp manager's mission list.

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::constants::camp::MAX_EXPANSIONS;
use ashfall_logic::direction::CompassDir;
use ashfall_logic::fortify::FortLevel;
use ashfall_logic::missions::MissionKind;

use super::blueprint::BlueprintCatalog;
use super::resolve::{try_resolve, ResolutionOutcome};
use super::{Basecamp, MissionKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Send someone.
    Start,
    /// Somebody is back and waiting to report.
    Return,
    /// Somebody has been out long enough to be called back.
    Recall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionEntry {
    pub key: MissionKey,
    pub name: String,
    pub action: EntryAction,
    /// Companions on this key now.
    pub workers: usize,
    pub max_workers: usize,
    /// Whether the entry can be picked right now.
    pub available: bool,
}

impl Basecamp {
    fn start_entry(&self, key: MissionKey, name: impl Into<String>) -> MissionEntry {
        let spec = key.kind.spec();
        let workers = self.workers(&key);
        MissionEntry {
            name: name.into(),
            action: EntryAction::Start,
            workers,
            max_workers: spec.max_workers,
            available: workers < spec.max_workers,
            key,
        }
    }

    /// Everything the camp manager would show: jobs that can be started,
    /// companions ready to report back, and companions who can be recalled.
    pub fn available_missions(
        &self,
        blueprints: &BlueprintCatalog,
        now: TimePoint,
        recall_after: TimeSpan,
    ) -> Vec<MissionEntry> {
        let mut entries = Vec::new();
        let base = CompassDir::Base;

        for kind in MissionKind::ALL {
            let spec = kind.spec();
            let offered = match spec.capability {
                Some(cap) => self.has_provides(cap),
                None => false,
            };
            if !offered || matches!(kind, MissionKind::Plow | MissionKind::Plant | MissionKind::Harvest) {
                continue;
            }
            if kind == MissionKind::Fortifications {
                for level in [FortLevel::Trench, FortLevel::SpikedTrench] {
                    if blueprints.fortification(level).is_some() {
                        let key = MissionKey::with_parameters(kind, base, level.blueprint());
                        entries.push(self.start_entry(key, spec.name));
                    }
                }
                continue;
            }
            entries.push(self.start_entry(MissionKey::new(kind, base), spec.name));
        }

        if self.expansion_count() < MAX_EXPANSIONS {
            for dir in CompassDir::EXPANSIONS {
                if !self.expansions.contains_key(&dir) {
                    let key = MissionKey::new(MissionKind::SurveyExpansion, dir);
                    entries.push(self.start_entry(key, format!("Expand Base {}", dir.bracket_abbr())));
                }
            }
        }

        for (&dir, exp) in &self.expansions {
            for bp in blueprints.next_upgrades(&exp.path, &exp.built) {
                let key = MissionKey::with_parameters(MissionKind::Upgrade, dir, bp.id.clone());
                let mut entry = self.start_entry(key, format!("{} {}", bp.name, dir.bracket_abbr()));
                entry.available &= bp.pipe || exp.in_progress.is_none();
                entries.push(entry);
            }
            if exp.provides.get("farming").copied().unwrap_or(0) > 0 {
                for kind in [MissionKind::Plow, MissionKind::Plant, MissionKind::Harvest] {
                    let key = MissionKey::new(kind, dir);
                    entries.push(self.start_entry(key, format!("{} {}", kind.spec().name, dir.bracket_abbr())));
                }
            }
        }

        for exp in self.expansions.values() {
            for cap in exp.provides.keys() {
                for recipe in blueprints.recipes_for(cap) {
                    let key = MissionKey::with_parameters(MissionKind::Crafting, base, recipe.id.clone());
                    if entries.iter().all(|e| e.key != key) {
                        entries.push(self.start_entry(key, format!("Craft {}", recipe.result)));
                    }
                }
            }
        }

        entries.push(MissionEntry {
            key: MissionKey::new(MissionKind::DistributeFood, base),
            name: MissionKind::DistributeFood.spec().name.to_string(),
            action: EntryAction::Start,
            workers: 0,
            max_workers: 0,
            available: !self.inventory.is_empty(),
        });

        for m in &self.missions {
            let action = match try_resolve(m, now, recall_after) {
                ResolutionOutcome::Returnable => EntryAction::Return,
                ResolutionOutcome::Pending { can_recall: true, .. } => EntryAction::Recall,
                ResolutionOutcome::Pending { .. } => continue,
            };
            let name = match action {
                EntryAction::Recall => MissionKind::EmergencyRecall.spec().name.to_string(),
                _ => format!("Recover from {}", m.key.kind.spec().name),
            };
            entries.push(MissionEntry {
                key: m.key.clone(),
                name,
                action,
                workers: self.workers(&m.key),
                max_workers: m.key.kind.spec().max_workers,
                available: true,
            });
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::coords::Tripoint;

    #[test]
    fn new_camp_offers_its_founding_jobs() {
        let blueprints = BlueprintCatalog::builtin().unwrap();
        let camp = Basecamp::new("Ridge", Tripoint::new(0, 0, 0), &blueprints);
        let entries = camp.available_missions(&blueprints, TimePoint::START, TimeSpan::hours(24));
        let kinds: Vec<MissionKind> = entries.iter().map(|e| e.key.kind).collect();
        assert!(kinds.contains(&MissionKind::GatherMaterials));
        assert!(kinds.contains(&MissionKind::Foraging));
        assert!(!kinds.contains(&MissionKind::Hunting));
        assert!(entries
            .iter()
            .any(|e| e.key.kind == MissionKind::Upgrade && e.key.parameters == "faction_base_camp_1"));
        assert_eq!(
            entries.iter().filter(|e| e.key.kind == MissionKind::SurveyExpansion).count(),
            8
        );
    }
}
