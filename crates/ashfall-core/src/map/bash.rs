//! Bashing, destruction and roof collapse.
//!
//! A bash hits the furniture on a tile if it has bash data, the terrain
//! otherwise. Knocking out terrain that supports a roof sets off a collapse
//! chain: every orthogonal neighbour is checked once, tiles that give way
//! are turned to rubble and their own neighbours queued in turn. The
//! visited set bounds the chain to one check per tile per bash.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use ashfall_logic::coords::Tripoint;

use super::grid::MapGrid;
use super::{one_in, TurnContext};
use crate::item::ItemGroupRoller;
use crate::registry::TerFlag;

/// Strength used by [`MapGrid::destroy`].
const DESTROY_STRENGTH: i32 = 999;
/// Guard against content with a bash cycle.
const MAX_DESTROY_PASSES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BashParams {
    pub strength: i32,
    /// Skip the strength roll.
    pub destroy: bool,
}

impl BashParams {
    pub fn strength(strength: i32) -> Self {
        Self {
            strength,
            destroy: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BashOutcome {
    /// Something on the tile could be bashed.
    pub did_bash: bool,
    /// The bash broke it.
    pub success: bool,
    /// Nothing bashable is left on the tile.
    pub fully_destroyed: bool,
    pub sound: Option<&'static str>,
    /// Every tile the collapse chain examined, in order.
    pub collapse_checks: Vec<Tripoint>,
    /// Tiles that caved in.
    pub collapsed: Vec<Tripoint>,
}

impl BashOutcome {
    fn absorb(&mut self, other: BashOutcome) {
        self.did_bash |= other.did_bash;
        self.success |= other.success;
        self.sound = other.sound.or(self.sound);
        self.collapse_checks.extend(other.collapse_checks);
        self.collapsed.extend(other.collapsed);
    }
}

impl MapGrid {
    /// Hit the tile with `params.strength`.
    pub fn bash(&mut self, p: Tripoint, params: BashParams, ctx: &mut TurnContext) -> BashOutcome {
        let mut outcome = BashOutcome::default();
        if !self.inbounds(p) {
            return outcome;
        }
        let reg = self.registry_arc();
        let furn = reg.furn(self.furn(p));
        let ter = reg.ter(self.ter(p));
        let (on_furniture, info) = match (&furn.bash, &ter.bash) {
            (Some(info), _) => (true, info),
            (None, Some(info)) => (false, info),
            (None, None) => {
                outcome.fully_destroyed = true;
                return outcome;
            }
        };
        outcome.did_bash = true;

        outcome.success = params.destroy
            || (params.strength >= info.str_min
                && params.strength >= ctx.rng.gen_range(info.str_min..=info.str_max.max(info.str_min)));
        if !outcome.success {
            outcome.sound = Some("thump!");
            return outcome;
        }
        outcome.sound = Some(info.sound);

        let had_roof = !on_furniture && ter.has_flag(TerFlag::SupportsRoof);
        if on_furniture {
            self.furn_set(p, reg.furn_id(info.ter_set));
        } else {
            self.ter_set(p, reg.ter_id(info.ter_set));
            if let Some(f) = info.furn_set {
                self.furn_set(p, reg.furn_id(f));
            }
        }

        for drop in &info.items {
            let n = ctx.rng.gen_range(drop.min..=drop.max.max(drop.min));
            for item in ctx.items.create_n(drop.item, n, ctx.now) {
                if let Err(e) = self.add_item_or_charges(p, item) {
                    log::debug!("bash drop lost: {e}");
                }
            }
        }

        if had_roof {
            self.collapse_chain(p, ctx, &mut outcome);
        }
        outcome.fully_destroyed = !self.has_flag(p, TerFlag::Bashable);
        outcome
    }

    /// Bash at full strength until nothing bashable is left.
    pub fn destroy(&mut self, p: Tripoint, ctx: &mut TurnContext) -> BashOutcome {
        let mut total = BashOutcome::default();
        for _ in 0..MAX_DESTROY_PASSES {
            let step = self.bash(
                p,
                BashParams {
                    strength: DESTROY_STRENGTH,
                    destroy: true,
                },
                ctx,
            );
            let done = !step.did_bash;
            total.absorb(step);
            if done {
                break;
            }
        }
        total.fully_destroyed = !self.has_flag(p, TerFlag::Bashable);
        total
    }

    /// Leave rubble on the tile, clearing it to dirt if it couldn't be
    /// walked on.
    pub fn make_rubble(&mut self, p: Tripoint) {
        if !self.inbounds(p) {
            return;
        }
        if self.ter_def(p).move_cost == 0 {
            self.ter_set_named(p, "t_dirt");
        }
        self.furn_set_named(p, "f_rubble");
    }

    fn collapse_chain(&mut self, origin: Tripoint, ctx: &mut TurnContext, outcome: &mut BashOutcome) {
        let mut visited: HashSet<Tripoint> = HashSet::from([origin]);
        let mut queue: VecDeque<Tripoint> = origin.orthogonal_neighbors().into_iter().collect();
        while let Some(q) = queue.pop_front() {
            if !visited.insert(q) || !self.inbounds(q) {
                continue;
            }
            outcome.collapse_checks.push(q);
            if self.collapse_check(q, ctx) {
                self.collapse_at(q);
                outcome.collapsed.push(q);
                queue.extend(q.orthogonal_neighbors());
            }
        }
    }

    /// Whether the roof over `p` gives way. Only roofed tiles can: floors
    /// marked as collapsing, and indoor roof supports. The more support
    /// around, the less likely.
    pub fn collapse_check(&self, p: Tripoint, ctx: &mut TurnContext) -> bool {
        let collapses = self.has_flag(p, TerFlag::Collapses);
        let supports = self.has_flag(p, TerFlag::SupportsRoof);
        if !collapses && !(supports && self.has_flag(p, TerFlag::Indoors)) {
            return false;
        }
        let mut num_supports = 0;
        for n in p.neighbors() {
            if collapses {
                if self.has_flag(n, TerFlag::Collapses) {
                    num_supports += 1;
                } else if self.has_flag(n, TerFlag::SupportsRoof) {
                    num_supports += 2;
                }
            } else if self.has_flag(n, TerFlag::SupportsRoof) && !self.has_flag(n, TerFlag::Collapses) {
                num_supports += 3;
            }
        }
        one_in(ctx.rng, (1.7 * num_supports as f64) as i32)
    }

    /// Cave the tile in.
    pub fn collapse_at(&mut self, p: Tripoint) {
        self.ter_set_named(p, "t_dirt");
        self.furn_set_named(p, "f_rubble");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::item::ItemCatalog;
    use crate::registry::Registry;
    use ashfall_logic::calendar::TimePoint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn grid(fill: &str) -> MapGrid {
        let reg = Arc::new(Registry::builtin());
        let id = reg.ter_id(fill);
        let mut g = MapGrid::new(reg, &SimConfig::default());
        g.fill(Tripoint::new(0, 0, 0), id);
        g
    }

    #[test]
    fn weak_hits_fail_on_strong_walls() {
        let mut g = grid("t_dirt");
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(5, 5, 0);
        g.ter_set_named(p, "t_wall");
        let out = g.bash(p, BashParams::strength(10), &mut ctx);
        assert!(out.did_bash);
        assert!(!out.success);
        assert_eq!(g.ter(p), g.registry().ter_id("t_wall"));
    }

    #[test]
    fn furniture_takes_the_hit_first() {
        let mut g = grid("t_dirt");
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(6, 6, 0);
        g.furn_set_named(p, "f_table");
        let out = g.bash(p, BashParams::strength(200), &mut ctx);
        assert!(out.success);
        assert!(!g.has_furn(p));
        assert_eq!(g.ter(p), g.registry().ter_id("t_dirt"));
        assert!(g.count_items(p, "2x4") >= 1);
    }

    #[test]
    fn destroy_walks_the_whole_chain() {
        let mut g = grid("t_dirt");
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        let p = Tripoint::new(7, 7, 0);
        g.ter_set_named(p, "t_tree");
        let out = g.destroy(p, &mut ctx);
        assert!(out.fully_destroyed);
        assert_eq!(g.ter(p), g.registry().ter_id("t_dirt"));
        assert!(g.count_items(p, "log") >= 2);
    }

    #[test]
    fn rubble_clears_impassable_terrain() {
        let mut g = grid("t_dirt");
        let p = Tripoint::new(2, 2, 0);
        g.ter_set_named(p, "t_rock");
        g.make_rubble(p);
        assert_eq!(g.ter(p), g.registry().ter_id("t_dirt"));
        assert_eq!(g.furn(p), g.registry().furn_id("f_rubble"));
    }

    #[test]
    fn only_roofed_tiles_can_collapse() {
        let mut g = grid("t_dirt");
        let cat = ItemCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = TurnContext {
            now: TimePoint::START,
            rng: &mut rng,
            items: &cat,
        };
        assert!(!g.collapse_check(Tripoint::new(3, 3, 0), &mut ctx));
        g.ter_set_named(Tripoint::new(3, 3, 0), "t_floor");
        // A lone floor with no support always gives.
        assert!(g.collapse_check(Tripoint::new(3, 3, 0), &mut ctx));
    }
}
