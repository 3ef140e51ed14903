//! Bringing companions home.
//!
//! [`try_resolve`] only looks at the clock. [`Basecamp::resolve`] does the
//! mission's work on the world, settles the food bill against what was
//! reserved at dispatch, trains the companion and returns them to the
//! follower pool. A stamp that can't be laid down leaves the mission open so
//! the player can clear the way and try again.

use rand::Rng;

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::constants::camp::{HIDE_SITE_OTER, KCAL_PER_DAY};
use ashfall_logic::constants::OMT_TILES;
use ashfall_logic::coords::{Point, Tripoint};
use ashfall_logic::direction::{CompassDir, StampOrientation};
use ashfall_logic::encounter::{training_difficulty, EncounterOutcome, ENCOUNTER_TRAINING};
use ashfall_logic::food::time_to_food;
use ashfall_logic::fortify::FortLevel;
use ashfall_logic::missions::{GatheringParams, MissionKind};
use ashfall_logic::salt_pipe::SaltWaterPipe;
use ashfall_logic::skills::{train_group, SkillId, SkillProfile};
use ashfall_logic::travel::is_river;

use crate::error::ResolveError;
use crate::item::Item;
use crate::map::{one_in, OmtSite};
use crate::npc::{random_name, Npc, NpcId};

use super::farm::{self, FarmOp};
use super::gathering::{gather_yield, gathering_group, random_encounter};
use super::{Basecamp, CampEnv, CompanionMission, Expansion, MissionKey, MissionPayload};

/// Tile of a hide site where the stash is kept.
const STASH_TILE: Point = Point::new(11, 10);
/// Tile of an overmap tile where a fallen companion is left.
const CENTER_TILE: Point = Point::new(12, 12);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Still out. `can_recall` says whether an emergency recall is allowed.
    Pending { remaining: TimeSpan, can_recall: bool },
    Returnable,
}

/// Where a mission stands at `now`.
pub fn try_resolve(mission: &CompanionMission, now: TimePoint, recall_after: TimeSpan) -> ResolutionOutcome {
    if now >= mission.expected_return {
        ResolutionOutcome::Returnable
    } else {
        ResolutionOutcome::Pending {
            remaining: mission.expected_return - now,
            can_recall: now - mission.start >= recall_after,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Returned,
    Died,
    Recalled,
}

/// What came of a finished mission.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub npc: NpcId,
    pub name: String,
    pub key: MissionKey,
    pub kind: ReturnKind,
    pub messages: Vec<String>,
    /// Food charged on return beyond the reservation. Negative for a refund.
    pub food_settled: i64,
    /// Items added to the camp stockpile.
    pub delivered: Vec<Item>,
    pub levels_gained: i32,
    pub encounter: Option<EncounterOutcome>,
    pub recruit: Option<NpcId>,
}

/// Result of the mission-specific part of a return.
#[derive(Default)]
struct Outcome {
    messages: Vec<String>,
    delivered: Vec<Item>,
    encounter: Option<(EncounterOutcome, i32)>,
    /// Overmap tile the companion died on.
    died_at: Option<Tripoint>,
    recruit: Option<NpcId>,
}

impl Outcome {
    fn say(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }
}

impl Basecamp {
    fn mission_index(&self, npc: NpcId) -> Result<usize, ResolveError> {
        self.missions
            .iter()
            .position(|m| m.npc == npc)
            .ok_or(ResolveError::UnknownMission(npc))
    }

    /// Clock check for the mission of `npc`.
    pub fn try_resolve(&self, npc: NpcId, now: TimePoint, recall_after: TimeSpan) -> Result<ResolutionOutcome, ResolveError> {
        let idx = self.mission_index(npc)?;
        Ok(try_resolve(&self.missions[idx], now, recall_after))
    }

    /// Bring `npc` home from a mission that's due.
    pub fn resolve(&mut self, env: &mut CampEnv<'_>, npc: NpcId) -> Result<MissionReport, ResolveError> {
        let idx = self.mission_index(npc)?;
        if let ResolutionOutcome::Pending { remaining, .. } = try_resolve(&self.missions[idx], env.now, env.recall_after()) {
            return Err(ResolveError::NotYetReturnable(remaining));
        }
        let Some(companion) = env.followers.get(npc).map(|n| (*n).clone()) else {
            let orphan = self.missions.remove(idx);
            log::warn!("{}: dropping mission {:?} of a missing companion", self.name, orphan.key);
            return Err(ResolveError::CompanionMissing(npc));
        };
        let mission = self.missions[idx].clone();
        let outcome = self.run_return(env, idx, &mission, &companion)?;
        self.missions.remove(idx);

        if let Some(at) = outcome.died_at {
            return Ok(self.bury(env, &mission, companion, outcome, at));
        }
        Ok(self.finish_return(env, &mission, companion, outcome))
    }

    /// Call a companion back early. Allowed once they've been away for the
    /// recall threshold; whatever they were doing is abandoned and the food
    /// they didn't eat goes back to the larder.
    pub fn emergency_recall(&mut self, env: &mut CampEnv<'_>, npc: NpcId) -> Result<MissionReport, ResolveError> {
        let idx = self.mission_index(npc)?;
        let recall_after = env.recall_after();
        let elapsed = env.now - self.missions[idx].start;
        if elapsed < recall_after {
            return Err(ResolveError::RecallTooEarly(recall_after));
        }
        let mission = self.missions.remove(idx);
        let refund = (mission.reserved_food - time_to_food(elapsed)).max(0);
        env.ledger.camp_food_supply(refund);

        let dir = mission.key.dir;
        if let MissionPayload::PipeSegment { segment } = mission.payload {
            if let Some(seg) = self.pipe_for_mut(dir).and_then(|p| p.segments.get_mut(segment)) {
                seg.started = false;
            }
        }
        if matches!(mission.payload, MissionPayload::PipeSegment { .. } | MissionPayload::Upgrade { .. }) {
            if let Some(exp) = self.expansions.get_mut(&dir) {
                exp.in_progress = None;
            }
        }
        env.followers.return_from_mission(npc);
        let name = env.followers.get(npc).map(|n| n.name.clone()).unwrap_or_default();
        log::info!("{}: {name} recalled from {}, {refund} kcal refunded", self.name, mission.key.kind.spec().name);
        Ok(MissionReport {
            npc,
            name: name.clone(),
            key: mission.key,
            kind: ReturnKind::Recalled,
            messages: vec![format!("{name} was recalled and is heading home.")],
            food_settled: -refund,
            delivered: Vec::new(),
            levels_gained: 0,
            encounter: None,
            recruit: None,
        })
    }

    /// Settle food, train and return a companion who made it back.
    ///
    /// The larder pays for time away past what was planned, fed or not.
    /// A fed job already paid for the planned time at dispatch. An unfed job
    /// had its planned time covered by the companion, so only the overtime
    /// is billed.
    fn finish_return(
        &mut self,
        env: &mut CampEnv<'_>,
        mission: &CompanionMission,
        mut companion: Npc,
        outcome: Outcome,
    ) -> MissionReport {
        let spec = mission.key.kind.spec();
        let billable = if spec.fixed_time {
            mission.reserved_duration()
        } else {
            env.now - mission.start
        };
        let already_paid = if mission.fed {
            mission.reserved_food
        } else {
            time_to_food(mission.reserved_duration())
        };
        let extra = time_to_food(billable) - already_paid;
        if extra != 0 {
            env.ledger.camp_food_supply(-extra);
        }

        let mut levels = train_group(&mut companion.skills, spec.trains, billable, spec.return_difficulty);
        if let Some((enc, favor)) = outcome.encounter {
            if let Some(group) = enc.trains() {
                levels += train_group(&mut companion.skills, group, ENCOUNTER_TRAINING, training_difficulty(favor));
            }
        }
        if let Some(mut npc) = env.followers.get_mut(mission.npc) {
            npc.skills = companion.skills.clone();
            npc.position = Tripoint::new(
                self.omt_pos.x * OMT_TILES + CENTER_TILE.x,
                self.omt_pos.y * OMT_TILES + CENTER_TILE.y,
                self.omt_pos.z,
            );
        }
        env.followers.return_from_mission(mission.npc);
        self.inventory.extend(outcome.delivered.iter().cloned());

        log::info!(
            "{}: {} returned from {} ({} items, {extra} kcal overtime)",
            self.name,
            companion.name,
            spec.name,
            outcome.delivered.len()
        );
        MissionReport {
            npc: mission.npc,
            name: companion.name,
            key: mission.key.clone(),
            kind: ReturnKind::Returned,
            messages: outcome.messages,
            food_settled: extra,
            delivered: outcome.delivered,
            levels_gained: levels,
            encounter: outcome.encounter.map(|(e, _)| e),
            recruit: outcome.recruit,
        }
    }

    /// A companion who didn't make it: remove them and leave their body
    /// where they fell.
    fn bury(
        &mut self,
        env: &mut CampEnv<'_>,
        mission: &CompanionMission,
        companion: Npc,
        outcome: Outcome,
        at: Tripoint,
    ) -> MissionReport {
        env.followers.kill(mission.npc);
        let now = env.now;
        env.with_site(at, |site, tools| {
            site.add_item(CENTER_TILE, tools.items.create("corpse", now));
            for item in companion.inventory.iter().cloned() {
                site.add_item(CENTER_TILE, item);
            }
        });
        env.overmap.add_note(at, &format!("DEAD NPC: {}", companion.name));
        log::warn!("{}: {} died on {}", self.name, companion.name, mission.key.kind.spec().name);
        MissionReport {
            npc: mission.npc,
            name: companion.name,
            key: mission.key.clone(),
            kind: ReturnKind::Died,
            messages: outcome.messages,
            food_settled: 0,
            delivered: Vec::new(),
            levels_gained: 0,
            encounter: outcome.encounter.map(|(e, _)| e),
            recruit: None,
        }
    }

    /// The mission-specific part of a return. On error nothing has changed
    /// beyond progress recorded for a partly built fortification.
    fn run_return(
        &mut self,
        env: &mut CampEnv<'_>,
        idx: usize,
        mission: &CompanionMission,
        npc: &Npc,
    ) -> Result<Outcome, ResolveError> {
        let mut out = Outcome::default();
        let kind = mission.key.kind;
        let dir = mission.key.dir;

        match &mission.payload {
            MissionPayload::None if kind.is_gathering() => {
                let params = GatheringParams::for_kind(kind);
                if one_in(env.rng, params.danger) {
                    let enc = random_encounter(env.rng, &npc.skills, params.favor, params.threat);
                    out.say(format!("{} {}.", npc.name, enc.narrative()));
                    out.encounter = Some((enc, params.favor));
                    if !enc.survived() {
                        out.died_at = Some(self.omt_pos);
                        return Ok(out);
                    }
                }
                let group = gathering_group(kind, &env.oter(self.omt_pos), env.now.season());
                let elapsed = env.now - mission.start;
                out.delivered = gather_yield(npc, kind, group, elapsed, env.now, env.rng, env.items);
                out.say(format!("{} returns with {} items.", npc.name, out.delivered.len()));
            }

            MissionPayload::None if kind == MissionKind::Recruiting => {
                let recruit = self.recruit(env, npc, &mut out);
                out.recruit = recruit;
            }

            MissionPayload::None => {
                out.say(format!("{} finished {}.", npc.name, kind.spec().name));
            }

            MissionPayload::Haul(items) => {
                out.delivered = items.clone();
                out.say(format!("{} hauled back {} loads.", npc.name, items.len()));
            }

            MissionPayload::Survey { target, blueprint } => {
                if self.expansions.contains_key(&dir) {
                    return Err(ResolveError::Invalid(format!("there's already an expansion to the {}", dir.bracket_abbr())));
                }
                let bp = env
                    .blueprints
                    .blueprint(blueprint)
                    .cloned()
                    .ok_or_else(|| ResolveError::Invalid(format!("unknown blueprint {blueprint}")))?;
                if let Some(stamp) = &bp.stamp {
                    let orientation = dir.stamp_orientation();
                    if !env.with_site(*target, |site, tools| tools.stamp(stamp, site, orientation)) {
                        return Err(ResolveError::Blocked(format!("{} failed to lay out the {}", npc.name, bp.name)));
                    }
                }
                self.expansions.insert(
                    dir,
                    Expansion {
                        path: bp.path.clone(),
                        pos: *target,
                        built: vec![bp.id.clone()],
                        provides: bp.provides.clone(),
                        in_progress: None,
                    },
                );
                out.say(format!("{} surveyed a new {} to the {}.", npc.name, bp.name, dir.bracket_abbr()));
            }

            MissionPayload::HideSite { target, stash } => {
                if !env.with_site(*target, |site, tools| tools.stamp("faction_hide_site_0", site, StampOrientation::IDENTITY)) {
                    return Err(ResolveError::Blocked(format!("{} couldn't build the hide site", npc.name)));
                }
                let stash = stash.clone();
                env.with_site(*target, |site, _| {
                    for item in stash {
                        site.add_item(STASH_TILE, item);
                    }
                });
                env.overmap.ter_set(*target, HIDE_SITE_OTER);
                env.overmap.reveal(*target, 3);
                out.say(format!("{} set up a hide site.", npc.name));
            }

            MissionPayload::Relay { target, send, bring_back } => {
                let send = send.clone();
                let bring_back = *bring_back;
                let fetched = env.with_site(*target, |site, _| {
                    let fetched = if bring_back {
                        OmtSite::points().flat_map(|p| site.take_items(p)).collect()
                    } else {
                        Vec::new()
                    };
                    for item in send {
                        site.add_item(STASH_TILE, item);
                    }
                    fetched
                });
                out.say(format!("{} relayed goods, bringing back {} items.", npc.name, fetched.len()));
                out.delivered = fetched;
            }

            MissionPayload::Fortify { plan, z, built } => {
                let stamps = plan.stamps();
                for (i, (p, ids)) in stamps.iter().enumerate().skip(*built) {
                    let tile = p.with_z(*z);
                    let ok = env.with_site(tile, |site, tools| {
                        ids.iter().all(|id| tools.stamp(id, site, StampOrientation::IDENTITY))
                    });
                    if !ok {
                        if let MissionPayload::Fortify { built, .. } = &mut self.missions[idx].payload {
                            *built = i;
                        }
                        return Err(ResolveError::Blocked(format!("{} couldn't fortify {tile:?}", npc.name)));
                    }
                    if plan.level == FortLevel::Trench && !self.fortifications.contains(&tile) {
                        self.fortifications.push(tile);
                    }
                }
                out.say(format!("{} finished {} tiles of fortifications.", npc.name, stamps.len()));
            }

            MissionPayload::Route(route) => {
                let patrol = kind == MissionKind::CombatPatrol;
                let (danger, favor) = if patrol { (5, 0) } else { (10, 2) };
                let mut walked = 0;
                for &pt in route {
                    let oter = env.oter(pt);
                    if is_river(&oter) && npc.skills.level(SkillId::Swimming) < 2 {
                        out.say(format!("{} couldn't cross the river and turned back.", npc.name));
                        break;
                    }
                    if one_in(env.rng, danger) {
                        let enc = random_encounter(env.rng, &npc.skills, favor, 10);
                        out.say(format!("{} {}.", npc.name, enc.narrative()));
                        out.encounter = Some((enc, favor));
                        if !enc.survived() {
                            out.died_at = Some(pt);
                            return Ok(out);
                        }
                    }
                    env.overmap.reveal(pt, 2);
                    walked += 1;
                }
                out.say(format!("{} covered {walked} tiles.", npc.name));
            }

            MissionPayload::Farm { target, seeds } => {
                let op = FarmOp::from_kind(kind)
                    .ok_or_else(|| ResolveError::Invalid(format!("{kind:?} isn't farm work")))?;
                let mut seeds = seeds.clone();
                let work = env.with_site(*target, |site, tools| farm::work_plots(site, tools, op, &mut seeds));
                out.delivered = work.harvest;
                out.delivered.extend(seeds);
                out.say(format!("{} worked {} plots.", npc.name, work.plots));
            }

            MissionPayload::Craft { recipe, batch } => {
                let r = env
                    .blueprints
                    .recipe(recipe)
                    .ok_or_else(|| ResolveError::Invalid(format!("unknown recipe {recipe}")))?;
                out.delivered = env.items.create_n(&r.result, r.count * batch, env.now);
                out.say(format!("{} crafted {} {}.", npc.name, r.count * batch, r.result));
            }

            MissionPayload::Upgrade { blueprint } => {
                let bp = env
                    .blueprints
                    .blueprint(blueprint)
                    .cloned()
                    .ok_or_else(|| ResolveError::Invalid(format!("unknown blueprint {blueprint}")))?;
                let pos = self
                    .expansion(dir)
                    .map(|e| e.pos)
                    .ok_or_else(|| ResolveError::Invalid(format!("the {} expansion is gone", dir.bracket_abbr())))?;
                if let Some(stamp) = &bp.stamp {
                    let orientation = dir.stamp_orientation();
                    if !env.with_site(pos, |site, tools| tools.stamp(stamp, site, orientation)) {
                        return Err(ResolveError::Blocked(format!("{} failed to build the {}", npc.name, bp.name)));
                    }
                }
                self.complete_blueprint(dir, &bp);
                out.say(format!("{} finished the {}.", npc.name, bp.name));
            }

            MissionPayload::PipeSegment { segment } => {
                self.build_pipe_segment(env, mission, *segment, npc, &mut out)?;
            }
        }
        Ok(out)
    }

    fn build_pipe_segment(
        &mut self,
        env: &mut CampEnv<'_>,
        mission: &CompanionMission,
        n: usize,
        npc: &Npc,
        out: &mut Outcome,
    ) -> Result<(), ResolveError> {
        let dir = mission.key.dir;
        let pipe = self
            .pipe_for(dir)
            .cloned()
            .ok_or_else(|| ResolveError::Invalid(format!("no pipe planned to the {}", dir.bracket_abbr())))?;
        let seg = *pipe
            .segments
            .get(n)
            .ok_or_else(|| ResolveError::Invalid(format!("pipe has no segment {n}")))?;
        let (incoming, outgoing) = pipe.segment_orientations(n);
        let tile = seg.point.with_z(self.omt_pos.z);
        let stamped = env.with_site(tile, |site, tools| match incoming {
            None => tools.stamp("faction_salt_water_pipe_swamp_N", site, outgoing),
            Some(inc) => {
                tools.stamp("faction_salt_water_pipe_N", site, outgoing)
                    && tools.stamp("faction_salt_water_pipe_N", site, inc)
            }
        });
        if !stamped {
            return Err(ResolveError::Blocked(format!("{} couldn't lay pipe at {tile:?}", npc.name)));
        }

        let last = n + 1 == pipe.segments.len();
        let blueprint = mission.key.parameters.clone();
        let bp = env.blueprints.blueprint(&blueprint).cloned();
        if last {
            let exp_pos = self.expansion(dir).map(|e| e.pos);
            if let (Some(bp), Some(pos)) = (&bp, exp_pos) {
                if let Some(stamp) = &bp.stamp {
                    let orientation = CompassDir::from_offset(pipe.connection_direction).stamp_orientation();
                    if !env.with_site(pos, |site, tools| tools.stamp(stamp, site, orientation)) {
                        return Err(ResolveError::Blocked(format!("{} couldn't install the pump", npc.name)));
                    }
                }
            }
        }

        if let Some(p) = self.pipe_for_mut(dir) {
            p.segments[n].finished = true;
        }
        if let Some(exp) = self.expansions.get_mut(&dir) {
            exp.in_progress = None;
        }
        let pipe_done = self.pipe_for(dir).is_some_and(SaltWaterPipe::is_complete);
        if let (true, Some(bp)) = (pipe_done, bp) {
            self.complete_blueprint(dir, &bp);
            out.say(format!("{} finished the {}.", npc.name, bp.name));
        } else {
            out.say(format!("{} laid pipe segment {} of {}.", npc.name, n + 1, pipe.segments.len()));
        }
        Ok(())
    }

    /// Four days of looking for survivors willing to join.
    fn recruit(&mut self, env: &mut CampEnv<'_>, npc: &Npc, out: &mut Outcome) -> Option<NpcId> {
        let survival = npc.skills.level(SkillId::Survival);
        if env.rng.gen_range(1..=20) + survival <= 17 {
            out.say(format!("{} didn't find anyone to recruit.", npc.name));
            return None;
        }
        let speech = npc.skills.level(SkillId::Speech);
        if env.rng.gen_range(1..=20) + speech <= 19 {
            out.say(format!("{} found a survivor but couldn't convince them to listen.", npc.name));
            return None;
        }

        let mut skills = SkillProfile::default();
        for id in [SkillId::Survival, SkillId::Melee, SkillId::Fabrication, SkillId::Construction] {
            skills.set_level(id, env.rng.gen_range(0..=4));
        }
        let best = SkillId::ALL.iter().map(|&s| skills.level(s)).max().unwrap_or(0);
        let mut appeal = env.rng.gen_range(-5..=3) + (best / 3).min(3);
        let mut food_desire: i64 = env.rng.gen_range(0..=5);
        // what we can't pay in food has to be made up in charm
        let affordable = env.ledger.food_days().max(0);
        if food_desire > affordable {
            appeal -= (food_desire - affordable) as i32;
            food_desire = affordable;
        }
        appeal += food_desire as i32;
        if env.rng.gen_range(1..=20) + appeal < 10 {
            out.say(format!("{} made an offer, but the survivor turned it down.", npc.name));
            return None;
        }

        env.ledger.camp_food_supply(-food_desire * KCAL_PER_DAY);
        let mut recruit = Npc::new(NpcId(0), random_name(env.rng), skills);
        recruit.perception = env.rng.gen_range(6..=10);
        let name = recruit.name.clone();
        let id = env.followers.insert(recruit);
        out.say(format!("{} convinced {name} to join for {food_desire} days of food.", npc.name));
        log::info!("{}: {name} joined the faction", self.name);
        Some(id)
    }
}
