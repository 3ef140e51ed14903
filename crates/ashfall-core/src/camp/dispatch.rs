//! Sending companions out.
//!
//! [`Basecamp::dispatch`] is all-or-nothing. Every check runs against an
//! untouched world; only once the order is known to be valid does it take
//! the companion out of the follower pool, spend materials, reserve food and
//! record the mission. A rejected order returns a [`DispatchError`] and
//! changes nothing.

use ashfall_logic::calendar::{TimePoint, TimeSpan};
use ashfall_logic::constants::camp::{FOREST_CLEARED_BELOW, HIDE_SITE_OTER, MAX_EXPANSIONS};
use ashfall_logic::coords::{line_to, rl_dist, Point, Tripoint};
use ashfall_logic::direction::CompassDir;
use ashfall_logic::food::time_to_food;
use ashfall_logic::fortify::{FortLevel, FortificationPlan};
use ashfall_logic::missions::MissionKind;
use ashfall_logic::salt_pipe::{plan_route, PipeTerrain, SaltWaterPipe};
use ashfall_logic::skills::SkillId;
use ashfall_logic::travel::{
    carry_weight_to_trips, companion_travel_time, cutting_time, is_forest, is_forest_trail, log_haul_items,
    to_workdays,
};

use crate::error::DispatchError;
use crate::item::Item;
use crate::map::OmtSite;
use crate::npc::{Npc, NpcId};

use super::blueprint::Components;
use super::farm::{self, FarmOp};
use super::forestry;
use super::{Basecamp, CampEnv, CompanionMission, MissionKey, MissionPayload};

/// Hide sites and logging camps must be at least this far out.
const HIDE_SITE_MIN_RANGE: i32 = 10;
const OFFSITE_MAX_RANGE: i32 = 90;
const LOGGING_MAX_RANGE: i32 = 50;
/// Longest scouting or patrol route, in overmap tiles.
const MAX_ROUTE_LENGTH: usize = 90;

/// Felling odds for a logging crew and for a clearcut.
const CUT_LOGS_CHANCE: i32 = 50;
const CLEARCUT_CHANCE: i32 = 95;
const HIDE_SITE_SETUP: TimeSpan = TimeSpan::hours(6);

/// What the player asked a companion to do.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionOrder {
    /// Any of the gathering jobs. `duration` defaults to the job's minimum.
    Gather { kind: MissionKind, duration: Option<TimeSpan> },
    Menial,
    Survey { dir: CompassDir, path: String },
    CutLogs { target: Tripoint },
    Clearcut { target: Tripoint },
    SetupHideSite { target: Tripoint, equipment: Components },
    RelayHideSite { target: Tripoint, send: Components, bring_back: bool },
    /// `start` and `stop` are absolute overmap tiles on the camp's z-level.
    Fortify { level: FortLevel, start: Point, stop: Point },
    Recruit,
    /// Waypoints; the companion walks straight lines between them.
    Scout { waypoints: Vec<Tripoint> },
    Patrol { waypoints: Vec<Tripoint> },
    Farm { op: FarmOp, dir: CompassDir },
    Craft { recipe: String, batch: i32 },
    Upgrade { dir: CompassDir, blueprint: String },
}

/// What a successful dispatch committed.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReceipt {
    pub key: MissionKey,
    pub expected_return: TimePoint,
    pub reserved_food: i64,
}

/// Dispatch-time work done on the world once the order is committed.
enum Work {
    None,
    Cut {
        target: Tripoint,
        chance: i32,
        buck: bool,
        chop: TimeSpan,
        journey: Vec<String>,
    },
    NewPipe(SaltWaterPipe),
    StartSegment(usize),
    Build(CompassDir, String),
}

/// A validated order.
struct Plan {
    key: MissionKey,
    duration: TimeSpan,
    fed: bool,
    /// Skill needed on top of the mission kind's own requirement.
    skill: Option<(SkillId, i32)>,
    materials: Components,
    payload: MissionPayload,
    work: Work,
}

impl Plan {
    fn new(key: MissionKey, duration: TimeSpan, payload: MissionPayload) -> Self {
        Self {
            key,
            duration,
            fed: true,
            skill: None,
            materials: Components::new(),
            payload,
            work: Work::None,
        }
    }
}

fn invalid(msg: impl Into<String>) -> DispatchError {
    DispatchError::InvalidTarget(msg.into())
}

fn check_range(camp: Tripoint, target: Tripoint, min: i32, max: i32) -> Result<(), DispatchError> {
    let d = rl_dist(camp.xy(), target.xy());
    if target.z != camp.z || d < min || d > max {
        return Err(invalid(format!("{target:?} must be {min} to {max} tiles from camp")));
    }
    Ok(())
}

/// Mass, volume and units of a load, priced from fresh items.
fn load_of(env: &CampEnv<'_>, load: &Components) -> (i64, i64, i64) {
    load.iter().fold((0, 0, 0), |(m, v, n), (id, &count)| {
        let proto = env.items.create(id, env.now);
        (m + proto.mass_g * count, v + proto.volume_ml * count, n + count)
    })
}

fn trips_for(npc: &Npc, mass: i64, volume: i64) -> i64 {
    carry_weight_to_trips(mass, volume, npc.carry_mass_g, npc.carry_volume_ml)
}

/// Loads slow the walk only when they take more than one round trip.
fn haulage(trips: i64, units: i64) -> i64 {
    if trips <= 2 {
        0
    } else {
        units
    }
}

impl Basecamp {
    /// Send companion `npc` on `order`.
    pub fn dispatch(
        &mut self,
        env: &mut CampEnv<'_>,
        npc_id: NpcId,
        order: MissionOrder,
    ) -> Result<DispatchReceipt, DispatchError> {
        let npc = env
            .followers
            .get(npc_id)
            .map(|n| (*n).clone())
            .ok_or(DispatchError::UnknownCompanion(npc_id))?;
        if !env.followers.is_available(npc_id) {
            return Err(DispatchError::CompanionBusy(npc.name));
        }

        let plan = self.plan(env, &npc, &order)?;
        let spec = plan.key.kind.spec();

        if let Some(cap) = spec.capability {
            if !self.has_provides(cap) {
                return Err(DispatchError::MissingCapability(cap.to_string()));
            }
        }
        if self.workers(&plan.key) >= spec.max_workers {
            return Err(DispatchError::WorkersFull { max: spec.max_workers });
        }
        for (skill, need) in spec.required_skill.into_iter().chain(plan.skill) {
            if npc.skills.level(skill) < need {
                return Err(DispatchError::SkillTooLow {
                    name: npc.name,
                    skill,
                    need,
                });
            }
        }
        let fed = spec.must_feed && plan.fed;
        if fed {
            let need = time_to_food(plan.duration);
            if env.ledger.food_supply < need {
                return Err(DispatchError::InsufficientFood {
                    need,
                    have: env.ledger.food_supply,
                });
            }
        }
        if let Some((item, need, have)) = self.inventory.missing(&plan.materials, 1) {
            return Err(DispatchError::MissingMaterials { item, need, have });
        }

        // Commit. Nothing below can fail.
        if !env.followers.reserve_for_mission(npc_id, plan.key.clone()) {
            return Err(DispatchError::CompanionBusy(npc.name));
        }
        let consumed = self.inventory.consume(&plan.materials, 1);
        let reserved_food = if fed { env.ledger.consume_for(plan.duration) } else { 0 };

        let mut duration = plan.duration;
        let mut payload = plan.payload;
        match &mut payload {
            MissionPayload::HideSite { stash, .. } => *stash = consumed,
            MissionPayload::Relay { send, .. } => *send = consumed,
            MissionPayload::Farm { seeds, .. } => *seeds = consumed,
            _ => {}
        }
        match plan.work {
            Work::None => {}
            Work::Cut {
                target,
                chance,
                buck,
                chop,
                journey,
            } => {
                let (felled, left) = env.with_site(target, |site, tools| {
                    let felled = forestry::cut_down_trees(site, tools, chance, buck);
                    (felled, forestry::standing_trees(site))
                });
                let oter = env.oter(target);
                if left < FOREST_CLEARED_BELOW as usize && (!buck || oter != "forest_water") {
                    env.overmap.ter_set(target, "field");
                }
                let hauled = felled.haul.len() as i64;
                duration = companion_travel_time(&journey, chop, 2, hauled);
                payload = MissionPayload::Haul(felled.haul);
            }
            Work::NewPipe(mut pipe) => {
                if let Some(seg) = pipe.segments.first_mut() {
                    seg.started = true;
                }
                if let Some(exp) = self.expansions.get_mut(&pipe.expansion) {
                    exp.in_progress = Some(SaltWaterPipe::segment_token(0));
                }
                self.salt_water_pipes.push(pipe);
            }
            Work::StartSegment(n) => {
                let dir = plan.key.dir;
                if let Some(pipe) = self.pipe_for_mut(dir) {
                    pipe.segments[n].started = true;
                }
                if let Some(exp) = self.expansions.get_mut(&dir) {
                    exp.in_progress = Some(SaltWaterPipe::segment_token(n));
                }
            }
            Work::Build(dir, id) => {
                if let Some(exp) = self.expansions.get_mut(&dir) {
                    exp.in_progress = Some(id);
                }
            }
        }

        let mission = CompanionMission {
            npc: npc_id,
            key: plan.key.clone(),
            start: env.now,
            expected_return: env.now + duration,
            reserved_food,
            fed,
            payload,
        };
        log::info!(
            "{}: {} leaves on {} for {}",
            self.name,
            npc.name,
            spec.name,
            duration
        );
        let receipt = DispatchReceipt {
            key: plan.key,
            expected_return: mission.expected_return,
            reserved_food,
        };
        self.missions.push(mission);
        Ok(receipt)
    }

    /// Validate an order without changing anything. Sites are only ever
    /// peeked at here.
    fn plan(&self, env: &mut CampEnv<'_>, npc: &Npc, order: &MissionOrder) -> Result<Plan, DispatchError> {
        let camp = self.omt_pos;
        let plan = match order {
            MissionOrder::Gather { kind, duration } => {
                if !kind.is_gathering() {
                    return Err(invalid(format!("{} isn't a gathering job", kind.spec().name)));
                }
                let duration = duration.unwrap_or(kind.spec().min_duration);
                if duration <= TimeSpan::ZERO {
                    return Err(invalid("a gathering trip needs some time"));
                }
                Plan::new(MissionKey::new(*kind, CompassDir::Base), duration, MissionPayload::None)
            }

            MissionOrder::Menial => Plan::new(
                MissionKey::new(MissionKind::Menial, CompassDir::Base),
                MissionKind::Menial.spec().min_duration,
                MissionPayload::None,
            ),

            MissionOrder::Survey { dir, path } => {
                if *dir == CompassDir::Base {
                    return Err(invalid("the camp itself can't be surveyed"));
                }
                if self.expansion_count() >= MAX_EXPANSIONS {
                    return Err(DispatchError::MaxExpansions(MAX_EXPANSIONS));
                }
                if self.expansions.contains_key(dir) {
                    return Err(DispatchError::ExpansionExists(dir.bracket_abbr().to_string()));
                }
                if self
                    .missions
                    .iter()
                    .any(|m| m.key.kind == MissionKind::SurveyExpansion && m.key.dir == *dir)
                {
                    return Err(DispatchError::AlreadyInProgress(format!("the {} survey", dir.bracket_abbr())));
                }
                let bp = env
                    .blueprints
                    .expansion_root(path)
                    .ok_or_else(|| DispatchError::UnknownBlueprint(path.clone()))?;
                let target = camp + dir.offset();
                let oter = env.oter(target);
                if !bp.terrain.iter().any(|t| *t == oter) {
                    return Err(invalid(format!("a {} can't be built on {oter}", bp.name)));
                }
                Plan::new(
                    MissionKey::with_parameters(MissionKind::SurveyExpansion, *dir, path.clone()),
                    MissionKind::SurveyExpansion.spec().min_duration,
                    MissionPayload::Survey {
                        target,
                        blueprint: bp.id.clone(),
                    },
                )
            }

            MissionOrder::CutLogs { target } | MissionOrder::Clearcut { target } => {
                let buck = matches!(order, MissionOrder::CutLogs { .. });
                let oter = env.oter(*target);
                let loggable = is_forest(&oter) || is_forest_trail(&oter);
                if !loggable || (!buck && oter == "forest_water") {
                    return Err(invalid(format!("there's no timber to take on {oter}")));
                }
                check_range(camp, *target, 1, LOGGING_MAX_RANGE)?;
                let chance = if buck { CUT_LOGS_CHANCE } else { CLEARCUT_CHANCE };
                let (trees, young) = env.peek_site(*target, |site| forestry::estimate_trees(site, chance as i64));
                let chop = cutting_time(trees, young);
                let haul = if buck { log_haul_items(trees, young) } else { 0 };
                let journey = env.journey(camp, *target);
                let kind = if buck { MissionKind::CutLogs } else { MissionKind::Clearcut };
                let mut plan = Plan::new(
                    MissionKey::new(kind, CompassDir::Base),
                    companion_travel_time(&journey, chop, 2, haul),
                    MissionPayload::None,
                );
                plan.work = Work::Cut {
                    target: *target,
                    chance,
                    buck,
                    chop,
                    journey,
                };
                plan
            }

            MissionOrder::SetupHideSite { target, equipment } => {
                let oter = env.oter(*target);
                if !(is_forest(&oter) || is_forest_trail(&oter) || oter == "field") {
                    return Err(invalid(format!("a hide site can't be set up on {oter}")));
                }
                check_range(camp, *target, HIDE_SITE_MIN_RANGE, OFFSITE_MAX_RANGE)?;
                if equipment.values().all(|&n| n <= 0) {
                    return Err(DispatchError::NoEquipment);
                }
                let (mass, volume, units) = load_of(env, equipment);
                let trips = trips_for(npc, mass, volume);
                let journey = env.journey(camp, *target);
                let mut plan = Plan::new(
                    MissionKey::new(MissionKind::SetupHideSite, CompassDir::Base),
                    companion_travel_time(&journey, HIDE_SITE_SETUP, trips, haulage(trips, units)),
                    MissionPayload::HideSite {
                        target: *target,
                        stash: Vec::new(),
                    },
                );
                plan.materials = equipment.clone();
                plan
            }

            MissionOrder::RelayHideSite {
                target,
                send,
                bring_back,
            } => {
                if env.oter(*target) != HIDE_SITE_OTER {
                    return Err(invalid(format!("there is no hide site at {target:?}")));
                }
                check_range(camp, *target, HIDE_SITE_MIN_RANGE, OFFSITE_MAX_RANGE)?;
                let stash: Vec<Item> = if *bring_back {
                    env.peek_site(*target, |site| {
                        OmtSite::points().flat_map(|p| site.items(p).to_vec()).collect()
                    })
                } else {
                    Vec::new()
                };
                if send.values().all(|&n| n <= 0) && stash.is_empty() {
                    return Err(DispatchError::NoEquipment);
                }
                let (mass, volume, units) = load_of(env, send);
                let back_mass: i64 = stash.iter().map(|i| i.mass_g * i.count()).sum();
                let back_volume: i64 = stash.iter().map(|i| i.volume_ml * i.count()).sum();
                let trips = trips_for(npc, mass, volume).max(trips_for(npc, back_mass, back_volume));
                let units = units.max(stash.iter().map(Item::count).sum());
                let journey = env.journey(camp, *target);
                let mut plan = Plan::new(
                    MissionKey::new(MissionKind::RelayHideSite, CompassDir::Base),
                    companion_travel_time(&journey, TimeSpan::ZERO, trips, haulage(trips, units)),
                    MissionPayload::Relay {
                        target: *target,
                        send: Vec::new(),
                        bring_back: *bring_back,
                    },
                );
                plan.materials = send.clone();
                plan
            }

            MissionOrder::Fortify { level, start, stop } => {
                let recipe = env
                    .blueprints
                    .fortification(*level)
                    .ok_or_else(|| DispatchError::UnknownBlueprint(level.blueprint().to_string()))?;
                let trenches: Vec<Point> = self.fortifications.iter().map(|t| t.xy()).collect();
                let overmap = &*env.overmap;
                let fort = FortificationPlan::new(
                    *level,
                    camp.xy(),
                    *start,
                    *stop,
                    |p| overmap.ter(p.with_z(camp.z)),
                    &trenches,
                )
                .map_err(DispatchError::Fortify)?;
                let batch = fort.batch_size() as i64;
                let first = fort.points[0].with_z(camp.z);
                let mut journey = env.journey(camp, first);
                journey.extend(fort.points.iter().map(|p| env.oter(p.with_z(camp.z))));
                let work = to_workdays(TimeSpan::minutes(recipe.time_minutes) * batch);
                let mut plan = Plan::new(
                    MissionKey::with_parameters(MissionKind::Fortifications, CompassDir::Base, level.blueprint()),
                    companion_travel_time(&journey, work, 2, 0),
                    MissionPayload::Fortify {
                        plan: fort,
                        z: camp.z,
                        built: 0,
                    },
                );
                plan.materials = recipe.components.iter().map(|(id, &n)| (id.clone(), n * batch)).collect();
                plan.skill = Some((recipe.skill, recipe.difficulty));
                plan
            }

            MissionOrder::Recruit => Plan::new(
                MissionKey::new(MissionKind::Recruiting, CompassDir::Base),
                MissionKind::Recruiting.spec().min_duration,
                MissionPayload::None,
            ),

            MissionOrder::Scout { waypoints } | MissionOrder::Patrol { waypoints } => {
                let kind = if matches!(order, MissionOrder::Scout { .. }) {
                    MissionKind::Scouting
                } else {
                    MissionKind::CombatPatrol
                };
                let route = expand_route(camp, waypoints)?;
                let terrain: Vec<String> = route.iter().map(|&p| env.oter(p)).collect();
                Plan::new(
                    MissionKey::new(kind, CompassDir::Base),
                    companion_travel_time(&terrain, TimeSpan::ZERO, 2, 0),
                    MissionPayload::Route(route),
                )
            }

            MissionOrder::Farm { op, dir } => {
                let exp = self
                    .expansion(*dir)
                    .filter(|e| e.provides.get("farming").copied().unwrap_or(0) > 0)
                    .ok_or_else(|| DispatchError::MissingCapability("farming".to_string()))?;
                let target = exp.pos;
                let now = env.now;
                let plots = env.peek_site(target, |site| farm::plots(site, *op, now).len());
                if plots == 0 {
                    return Err(DispatchError::NothingToDo);
                }
                let mut materials = Components::new();
                let mut worked = plots as i64;
                if *op == FarmOp::Plant {
                    let mut wanted = plots as i64;
                    for seed in self.inventory.items().iter().filter(|i| i.is_seed()) {
                        if wanted == 0 {
                            break;
                        }
                        let n = seed.count().min(wanted);
                        *materials.entry(seed.type_id.clone()).or_insert(0) += n;
                        wanted -= n;
                    }
                    if materials.is_empty() {
                        return Err(DispatchError::NoSeeds);
                    }
                    worked = plots as i64 - wanted;
                }
                let mut plan = Plan::new(
                    MissionKey::new(op.kind(), *dir),
                    op.time_per_plot() * worked,
                    MissionPayload::Farm {
                        target,
                        seeds: Vec::new(),
                    },
                );
                plan.materials = materials;
                plan
            }

            MissionOrder::Craft { recipe, batch } => {
                let r = env
                    .blueprints
                    .recipe(recipe)
                    .ok_or_else(|| DispatchError::UnknownBlueprint(recipe.clone()))?;
                if !self.has_provides(&r.requires) {
                    return Err(DispatchError::MissingCapability(r.requires.clone()));
                }
                if *batch < 1 {
                    return Err(invalid("craft at least one batch"));
                }
                let mut plan = Plan::new(
                    MissionKey::with_parameters(MissionKind::Crafting, CompassDir::Base, recipe.clone()),
                    r.work_time(*batch),
                    MissionPayload::Craft {
                        recipe: recipe.clone(),
                        batch: *batch,
                    },
                );
                plan.materials = r
                    .components
                    .iter()
                    .map(|(id, &n)| (id.clone(), n * *batch as i64))
                    .collect();
                plan.skill = Some((r.skill, r.difficulty));
                plan
            }

            MissionOrder::Upgrade { dir, blueprint } => self.plan_upgrade(env, *dir, blueprint)?,
        };
        Ok(plan)
    }

    fn plan_upgrade(&self, env: &CampEnv<'_>, dir: CompassDir, id: &str) -> Result<Plan, DispatchError> {
        let exp = self
            .expansion(dir)
            .ok_or_else(|| invalid(format!("there is no expansion to the {}", dir.bracket_abbr())))?;
        let bp = env
            .blueprints
            .blueprint(id)
            .ok_or_else(|| DispatchError::UnknownBlueprint(id.to_string()))?;
        if !env.blueprints.next_upgrades(&exp.path, &exp.built).iter().any(|b| b.id == bp.id) {
            return Err(invalid(format!("{} can't be built here yet", bp.name)));
        }
        let key = MissionKey::with_parameters(MissionKind::Upgrade, dir, bp.id.clone());

        if bp.pipe {
            let (work, segment) = match self.pipe_for(dir) {
                Some(pipe) => {
                    let n = pipe
                        .next_segment()
                        .ok_or_else(|| DispatchError::AlreadyInProgress(bp.name.clone()))?;
                    (Work::StartSegment(n), n)
                }
                None => {
                    let connection = exp.pos + dir.offset();
                    let z = self.omt_pos.z;
                    let route = plan_route(self.omt_pos.xy(), connection.xy(), |p| {
                        PipeTerrain::classify(&env.overmap.ter(p.with_z(z)))
                    })
                    .map_err(DispatchError::Pipe)?;
                    (Work::NewPipe(SaltWaterPipe::new(dir, dir.offset(), &route)), 0)
                }
            };
            let mut plan = Plan::new(key, bp.work_time(), MissionPayload::PipeSegment { segment });
            plan.fed = bp.must_feed;
            plan.materials = bp.components.clone();
            plan.skill = Some((bp.skill, bp.difficulty));
            plan.work = work;
            return Ok(plan);
        }

        if let Some(building) = &exp.in_progress {
            return Err(DispatchError::AlreadyInProgress(building.clone()));
        }
        let mut plan = Plan::new(
            key,
            bp.work_time(),
            MissionPayload::Upgrade {
                blueprint: bp.id.clone(),
            },
        );
        plan.fed = bp.must_feed;
        plan.materials = bp.components.clone();
        plan.skill = Some((bp.skill, bp.difficulty));
        plan.work = Work::Build(dir, bp.id.clone());
        Ok(plan)
    }
}

/// Every tile walked visiting `waypoints` in order from camp.
fn expand_route(camp: Tripoint, waypoints: &[Tripoint]) -> Result<Vec<Tripoint>, DispatchError> {
    if waypoints.is_empty() {
        return Err(invalid("a route needs at least one waypoint"));
    }
    let mut route = Vec::new();
    let mut at = camp;
    for &w in waypoints {
        if w.z != camp.z {
            return Err(invalid("routes stay on the surface"));
        }
        route.extend(line_to(at.xy(), w.xy(), 0).into_iter().map(|p| p.with_z(camp.z)));
        at = w;
    }
    if route.is_empty() || route.len() > MAX_ROUTE_LENGTH {
        return Err(invalid(format!("routes are 1 to {MAX_ROUTE_LENGTH} tiles long")));
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_join_waypoints_with_lines() {
        let camp = Tripoint::new(0, 0, 0);
        let route = expand_route(camp, &[Tripoint::new(3, 0, 0), Tripoint::new(3, 2, 0)]).unwrap();
        assert_eq!(route.len(), 5);
        assert_eq!(route.last(), Some(&Tripoint::new(3, 2, 0)));
    }

    #[test]
    fn empty_and_overlong_routes_are_rejected() {
        let camp = Tripoint::new(0, 0, 0);
        assert!(expand_route(camp, &[]).is_err());
        assert!(expand_route(camp, &[Tripoint::new(200, 0, 0)]).is_err());
    }

    #[test]
    fn light_loads_do_not_slow_the_walk() {
        assert_eq!(haulage(2, 40), 0);
        assert_eq!(haulage(4, 40), 40);
    }
}
