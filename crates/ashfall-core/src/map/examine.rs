//! Examine behaviors.
//!
//! Terrain and furniture name an [`ExamineAction`]; this module gives each
//! one its behavior. Furniture with an action wins over the terrain under
//! it.

use rand::Rng;

use ashfall_logic::calendar::Season;
use ashfall_logic::coords::{Point, Tripoint};

use super::grid::MapGrid;
use super::TurnContext;
use crate::item::ItemGroupRoller;
use crate::npc::Character;
use crate::registry::{ExamineAction, FurnId};

/// Gate controls reach this far.
const GATE_RADIUS: i32 = 4;
/// Card readers and switches reach this far.
const MECHANISM_RADIUS: i32 = 8;
/// Fuel handed out by one pump use.
const PUMP_CHARGES: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamineOutcome {
    pub message: String,
    /// The map or the actor's inventory changed.
    pub changed: bool,
}

impl ExamineOutcome {
    fn looked(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: false,
        }
    }

    fn did(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: true,
        }
    }
}

fn square(p: Tripoint, radius: i32) -> impl Iterator<Item = Tripoint> {
    (-radius..=radius).flat_map(move |dy| (-radius..=radius).map(move |dx| p + Point::new(dx, dy)))
}

impl ExamineAction {
    pub fn on_examine(
        self,
        map: &mut MapGrid,
        actor: &mut dyn Character,
        p: Tripoint,
        ctx: &mut TurnContext,
    ) -> ExamineOutcome {
        use ExamineAction::*;
        match self {
            ExamineAction::None => ExamineOutcome::looked(format!("That is a {}.", map.name(p))),
            Pit | PitSpiked => cover_pit(map, actor, p, self == PitSpiked),
            PitCovered => {
                let spiked = map.ter(p) == map.registry().ter_id("t_pit_spiked_covered");
                map.ter_set_named(p, if spiked { "t_pit_spiked" } else { "t_pit" });
                actor.add_item(ctx.items.create("2x4", ctx.now));
                ExamineOutcome::did("You remove the plank.")
            }
            Rubble => {
                map.furn_set(p, FurnId::NULL);
                let n = ctx.rng.gen_range(1..=3);
                place_all(map, p, ctx.items.create_n("rock", n, ctx.now));
                ExamineOutcome::did("You clear up the rubble.")
            }
            Wreckage => {
                map.furn_set(p, FurnId::NULL);
                let n = ctx.rng.gen_range(2..=6);
                place_all(map, p, ctx.items.create_n("scrap", n, ctx.now));
                ExamineOutcome::did("You clear the wreckage up.")
            }
            Tent => {
                let tent = map.registry().furn_id("f_tent");
                for q in square(p, 1) {
                    if map.furn(q) == tent {
                        map.furn_set(q, FurnId::NULL);
                    }
                }
                actor.add_item(ctx.items.create("tent_kit", ctx.now));
                ExamineOutcome::did("You take down the tent.")
            }
            Shelter => {
                map.furn_set(p, FurnId::NULL);
                actor.add_item(ctx.items.create("shelter_kit", ctx.now));
                ExamineOutcome::did("You take down the shelter.")
            }
            Recycler => recycle(map, p, ctx),
            ChainFence => {
                actor.set_position(map.getabs(p));
                ExamineOutcome::did("You vault over the chain link fence.")
            }
            FencePost => {
                map.ter_set_named(p, "t_dirt");
                actor.add_item(ctx.items.create("pointy_stick", ctx.now));
                ExamineOutcome::did("You pull up the fence post.")
            }
            GasPump => {
                if !actor.has_item("jerrycan") {
                    return ExamineOutcome::looked("You need a container to pump gas into.");
                }
                for stack in ctx.items.create_n("gasoline", PUMP_CHARGES, ctx.now) {
                    actor.add_item(stack);
                }
                ExamineOutcome::did("With a clang and a shudder, the gas pump fills your jerrycan.")
            }
            CardReader => {
                if actor.remove_item("id_science").is_none() {
                    return ExamineOutcome::looked("The card reader wants a science ID.");
                }
                let locked = map.registry().ter_id("t_door_metal_locked");
                let opened = map.registry().ter_id("t_door_metal_c");
                let mut count = 0;
                for q in square(p, MECHANISM_RADIUS) {
                    if map.ter(q) == locked {
                        map.ter_set(q, opened);
                        count += 1;
                    }
                }
                log::debug!("card reader at {p:?} unlocked {count} doors");
                ExamineOutcome::did("You swipe your ID card. The nearby doors unlock.")
            }
            SlotMachine => {
                if ctx.rng.gen_range(0..5) == 0 {
                    ExamineOutcome::looked("Three cherries. The machine has no coins left to give.")
                } else {
                    ExamineOutcome::looked("No luck.")
                }
            }
            Elevator => ExamineOutcome::looked("You press the button. Nothing happens."),
            ControlsGate => toggle(map, p, GATE_RADIUS, "t_gate_c", "t_gate_o", "You flip the gate lever."),
            Pedestal => {
                map.ter_set_named(p, "t_rock_floor");
                actor.add_item(ctx.items.create("small_relic", ctx.now));
                ExamineOutcome::did("You lift the relic from the pedestal.")
            }
            FSwitch => toggle(
                map,
                p,
                MECHANISM_RADIUS,
                "t_switch_wall",
                "t_switch_floor",
                "You hear the rumble of rock on rock!",
            ),
            TreeApple => {
                if !matches!(ctx.now.season(), Season::Summer | Season::Autumn) {
                    return ExamineOutcome::looked("There are no apples on the tree this season.");
                }
                let n = ctx.rng.gen_range(3..=6);
                for apple in ctx.items.create_n("apple", n, ctx.now) {
                    actor.add_item(apple);
                }
                map.ter_set_named(p, "t_tree_apple_harvested");
                ExamineOutcome::did("You pick some apples.")
            }
            Shrub => {
                let n = ctx.rng.gen_range(1..=2);
                for v in ctx.items.create_n("veggy_wild", n, ctx.now) {
                    actor.add_item(v);
                }
                map.ter_set_named(p, "t_underbrush");
                ExamineOutcome::did("You forage through the shrub.")
            }
            FlowerPoppy => {
                map.furn_set(p, FurnId::NULL);
                actor.add_item(ctx.items.create("poppy_bud", ctx.now));
                ExamineOutcome::did("You pick the poppy bud.")
            }
        }
    }
}

fn cover_pit(map: &mut MapGrid, actor: &mut dyn Character, p: Tripoint, spiked: bool) -> ExamineOutcome {
    if actor.remove_item("2x4").is_none() {
        return ExamineOutcome::looked("There is a pit here. A plank of wood could cover it.");
    }
    map.ter_set_named(p, if spiked { "t_pit_spiked_covered" } else { "t_pit_covered" });
    ExamineOutcome::did("You place a plank of wood over the pit.")
}

fn place_all(map: &mut MapGrid, p: Tripoint, items: Vec<crate::item::Item>) {
    for item in items {
        if let Err(e) = map.add_item_or_charges(p, item) {
            log::debug!("examine drop lost: {e}");
        }
    }
}

/// Turn everything on the tile into scrap by weight.
fn recycle(map: &mut MapGrid, p: Tripoint, ctx: &mut TurnContext) -> ExamineOutcome {
    let items = map.take_items(p);
    if items.is_empty() {
        return ExamineOutcome::looked("The recycler is empty.");
    }
    let mass: i64 = items.iter().map(|i| i.mass_g * i.count().max(1)).sum();
    let scrap = ctx.items.create("scrap", ctx.now);
    let n = (mass / scrap.mass_g.max(1)).max(1);
    place_all(map, p, ctx.items.create_n("scrap", n as i32, ctx.now));
    ExamineOutcome::did(format!("The recycler grinds everything into {n} pieces of scrap."))
}

fn toggle(map: &mut MapGrid, p: Tripoint, radius: i32, a: &str, b: &str, message: &str) -> ExamineOutcome {
    let a = map.registry().ter_id(a);
    let b = map.registry().ter_id(b);
    for q in square(p, radius) {
        let t = map.ter(q);
        if t == a {
            map.ter_set(q, b);
        } else if t == b {
            map.ter_set(q, a);
        }
    }
    ExamineOutcome::did(message)
}

impl MapGrid {
    /// Examine the tile at `p`: furniture first, then terrain.
    pub fn examine(&mut self, actor: &mut dyn Character, p: Tripoint, ctx: &mut TurnContext) -> ExamineOutcome {
        let furn = self.furn_def(p).examine;
        let action = if furn != ExamineAction::None {
            furn
        } else {
            self.ter_def(p).examine
        };
        action.on_examine(self, actor, p, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::item::ItemCatalog;
    use crate::npc::{Npc, NpcId};
    use crate::registry::Registry;
    use ashfall_logic::calendar::{TimePoint, TimeSpan};
    use ashfall_logic::skills::SkillProfile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    // ── Helpers ──

    fn setup() -> (MapGrid, ItemCatalog, Npc) {
        let reg = Arc::new(Registry::builtin());
        let dirt = reg.ter_id("t_dirt");
        let mut g = MapGrid::new(reg, &SimConfig::default());
        g.fill(Tripoint::new(0, 0, 0), dirt);
        (g, ItemCatalog::builtin().unwrap(), Npc::new(NpcId(1), "Ash", SkillProfile::default()))
    }

    // ── Tests ──

    #[test]
    fn planks_cover_and_uncover_pits() {
        let (mut g, cat, mut npc) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(3, 3, 0);
        g.ter_set_named(p, "t_pit");
        let out = g.examine(&mut npc, p, &mut ctx);
        assert!(!out.changed);

        npc.add_item(cat.create("2x4", TimePoint::START));
        assert!(g.examine(&mut npc, p, &mut ctx).changed);
        assert_eq!(g.ter(p), g.registry().ter_id("t_pit_covered"));
        assert_eq!(npc.count_item("2x4"), 0);

        g.examine(&mut npc, p, &mut ctx);
        assert_eq!(g.ter(p), g.registry().ter_id("t_pit"));
        assert_eq!(npc.count_item("2x4"), 1);
    }

    #[test]
    fn apples_only_in_season() {
        let (mut g, cat, mut npc) = setup();
        let mut rng = StdRng::seed_from_u64(2);
        let p = Tripoint::new(4, 4, 0);
        g.ter_set_named(p, "t_tree_apple");
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        assert!(!g.examine(&mut npc, p, &mut ctx).changed);

        ctx.now = TimePoint::START + TimeSpan::days(100);
        assert!(g.examine(&mut npc, p, &mut ctx).changed);
        assert!(npc.count_item("apple") >= 3);
        assert_eq!(g.ter(p), g.registry().ter_id("t_tree_apple_harvested"));
    }

    #[test]
    fn gate_controls_toggle_nearby_gates() {
        let (mut g, cat, mut npc) = setup();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let lever = Tripoint::new(10, 10, 0);
        g.ter_set_named(lever, "t_gates_control");
        g.ter_set_named(Tripoint::new(12, 10, 0), "t_gate_c");
        g.ter_set_named(Tripoint::new(30, 10, 0), "t_gate_c");
        g.examine(&mut npc, lever, &mut ctx);
        assert_eq!(g.ter(Tripoint::new(12, 10, 0)), g.registry().ter_id("t_gate_o"));
        assert_eq!(g.ter(Tripoint::new(30, 10, 0)), g.registry().ter_id("t_gate_c"));
    }

    #[test]
    fn furniture_examine_wins() {
        let (mut g, cat, mut npc) = setup();
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(6, 6, 0);
        g.ter_set_named(p, "t_fence_post");
        g.furn_set_named(p, "f_rubble");
        g.examine(&mut npc, p, &mut ctx);
        assert!(!g.has_furn(p));
        assert!(g.count_items(p, "rock") >= 1);
        assert_eq!(g.ter(p), g.registry().ter_id("t_fence_post"));
    }

    #[test]
    fn recycler_turns_items_to_scrap() {
        let (mut g, cat, mut npc) = setup();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(7, 7, 0);
        g.furn_set_named(p, "f_recycler");
        g.add_item_or_charges(p, cat.create("pipe", TimePoint::START)).unwrap();
        g.examine(&mut npc, p, &mut ctx);
        assert_eq!(g.count_items(p, "pipe"), 0);
        assert!(g.count_items(p, "scrap") >= 1);
    }
}
