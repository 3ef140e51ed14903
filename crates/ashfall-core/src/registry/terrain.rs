//! Terrain and furniture descriptors.
//!
//! Both share a flag set, bash data, and an examine behavior. The tables are
//! built once in [`builtin_terrain`] / [`builtin_furniture`]; index 0 of each
//! is the null sentinel.

use serde::{Deserialize, Serialize};

use super::trap::TrapId;
use super::Color;

/// Index into the terrain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TerId(pub u16);

impl TerId {
    pub const NULL: TerId = TerId(0);
}

/// Index into the furniture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FurnId(pub u16);

impl FurnId {
    pub const NULL: FurnId = FurnId(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

// ============================================================================
// FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerFlag {
    Transparent,
    Bashable,
    Container,
    PlaceItem,
    Door,
    /// Burns, leaving its burnt successor.
    Flammable,
    /// Catches easily and burns out fast.
    LFlammable,
    /// Burns to ash.
    Flammable2,
    Explodes,
    Diggable,
    Tentable,
    Liquid,
    Swimmable,
    Sharp,
    Painful,
    Rough,
    Sealed,
    NoItem,
    GoesDown,
    GoesUp,
    Console,
    Alarmed,
    SupportsRoof,
    ThinObstacle,
    /// Has a roof overhead that falls when its supports go.
    Collapses,
    Deconstruct,
    ReduceScent,
    FireContainer,
    Tree,
    YoungTree,
    Indoors,
    Plantable,
    Plowable,
}

/// Bitset over [`TerFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerFlags(u64);

impl TerFlags {
    pub const EMPTY: TerFlags = TerFlags(0);

    pub fn of(flags: &[TerFlag]) -> Self {
        flags.iter().fold(Self::EMPTY, |acc, &f| acc.with(f))
    }

    pub fn with(self, flag: TerFlag) -> Self {
        TerFlags(self.0 | 1 << flag as u8)
    }

    pub fn has(self, flag: TerFlag) -> bool {
        self.0 & (1 << flag as u8) != 0
    }

    /// Any of the three fuel flags.
    pub fn is_flammable(self) -> bool {
        self.has(TerFlag::Flammable) || self.has(TerFlag::LFlammable) || self.has(TerFlag::Flammable2)
    }
}

// ============================================================================
// EXAMINE
// ============================================================================

/// Behavior run when an actor examines a tile. The handlers live in
/// [`crate::map::examine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExamineAction {
    #[default]
    None,
    Pit,
    PitCovered,
    PitSpiked,
    Rubble,
    Wreckage,
    Tent,
    Shelter,
    Recycler,
    ChainFence,
    FencePost,
    GasPump,
    CardReader,
    SlotMachine,
    Elevator,
    ControlsGate,
    Pedestal,
    FSwitch,
    TreeApple,
    Shrub,
    FlowerPoppy,
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// One item drop from a successful bash: id and count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BashDrop {
    pub item: &'static str,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashInfo {
    /// Strength below this never succeeds.
    pub str_min: i32,
    /// Strength at or above this always succeeds.
    pub str_max: i32,
    /// Successor id. For furniture an empty string means no furniture.
    pub ter_set: &'static str,
    /// Furniture left behind by a terrain bash, e.g. rubble.
    pub furn_set: Option<&'static str>,
    pub items: Vec<BashDrop>,
    pub sound: &'static str,
}

#[derive(Debug, Clone)]
pub struct TerrainDef {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: char,
    pub color: Color,
    /// 0 is impassable.
    pub move_cost: i32,
    pub trap: TrapId,
    pub flags: TerFlags,
    pub examine: ExamineAction,
    pub bash: Option<BashInfo>,
    /// Successor once fire has consumed the tile.
    pub burnt: Option<&'static str>,
}

impl TerrainDef {
    pub fn has_flag(&self, flag: TerFlag) -> bool {
        self.flags.has(flag)
    }
}

#[derive(Debug, Clone)]
pub struct FurnitureDef {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: char,
    pub color: Color,
    /// Added to the terrain's cost. Negative makes the tile impassable.
    pub move_cost_mod: i32,
    pub flags: TerFlags,
    pub examine: ExamineAction,
    pub bash: Option<BashInfo>,
    pub burnt: Option<&'static str>,
}

impl FurnitureDef {
    pub fn has_flag(&self, flag: TerFlag) -> bool {
        self.flags.has(flag)
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

use TerFlag::*;

fn drops(list: &[(&'static str, i32, i32)]) -> Vec<BashDrop> {
    list.iter()
        .map(|&(item, min, max)| BashDrop { item, min, max })
        .collect()
}

fn bash(str_min: i32, str_max: i32, ter_set: &'static str, items: &[(&'static str, i32, i32)], sound: &'static str) -> BashInfo {
    BashInfo {
        str_min,
        str_max,
        ter_set,
        furn_set: None,
        items: drops(items),
        sound,
    }
}

fn ter(id: &'static str, name: &'static str, symbol: char, color: Color, move_cost: i32, flags: &[TerFlag]) -> TerrainDef {
    TerrainDef {
        id,
        name,
        symbol,
        color,
        move_cost,
        trap: TrapId::None,
        flags: TerFlags::of(flags),
        examine: ExamineAction::None,
        bash: None,
        burnt: None,
    }
}

fn furn(id: &'static str, name: &'static str, symbol: char, color: Color, move_cost_mod: i32, flags: &[TerFlag]) -> FurnitureDef {
    FurnitureDef {
        id,
        name,
        symbol,
        color,
        move_cost_mod,
        flags: TerFlags::of(flags),
        examine: ExamineAction::None,
        bash: None,
        burnt: None,
    }
}

impl TerrainDef {
    fn bashes(mut self, info: BashInfo) -> Self {
        self.flags = self.flags.with(Bashable);
        self.bash = Some(info);
        self
    }

    fn burns_to(mut self, id: &'static str) -> Self {
        self.burnt = Some(id);
        self
    }

    fn examined(mut self, action: ExamineAction) -> Self {
        self.examine = action;
        self
    }

    fn trapped(mut self, trap: TrapId) -> Self {
        self.trap = trap;
        self
    }
}

impl FurnitureDef {
    fn bashes(mut self, info: BashInfo) -> Self {
        self.flags = self.flags.with(Bashable);
        self.bash = Some(info);
        self
    }

    fn burns_to(mut self, id: &'static str) -> Self {
        self.burnt = Some(id);
        self
    }

    fn examined(mut self, action: ExamineAction) -> Self {
        self.examine = action;
        self
    }
}

// ============================================================================
// TABLES
// ============================================================================

pub const NULL_TERRAIN: &str = "t_null";
pub const NULL_FURNITURE: &str = "f_null";

pub fn null_terrain() -> TerrainDef {
    ter(NULL_TERRAIN, "nothing", ' ', Color::Black, 2, &[TerFlag::Transparent])
}

pub fn null_furniture() -> FurnitureDef {
    furn(NULL_FURNITURE, "nothing", ' ', Color::Black, 0, &[TerFlag::Transparent])
}

pub fn builtin_terrain() -> Vec<TerrainDef> {
    use Color::*;
    let rubble = |mut info: BashInfo| {
        info.furn_set = Some("f_rubble");
        info
    };
    vec![
        null_terrain(),
        ter("t_dirt", "dirt", '.', Brown, 2, &[Transparent, Diggable, Plowable]),
        ter("t_dirtmound", "mound of dirt", '#', Brown, 3, &[Transparent, Diggable, Plantable]),
        ter("t_grass", "grass", '.', Green, 2, &[Transparent, Diggable, Plowable, Tentable]).burns_to("t_dirt"),
        ter("t_pavement", "pavement", '.', DarkGray, 2, &[Transparent]),
        ter("t_floor", "floor", '.', Cyan, 2, &[Transparent, Indoors, Collapses, Flammable2]).burns_to("t_dirt"),
        ter("t_rock_floor", "rock floor", '.', LightGray, 2, &[Transparent, Indoors]),
        ter("t_wall", "wall", '|', LightGray, 0, &[Flammable2, NoItem, SupportsRoof, ReduceScent])
            .bashes(rubble(bash(30, 210, "t_dirt", &[("rock", 2, 5), ("2x4", 1, 4)], "crash!")))
            .burns_to("t_dirt"),
        ter("t_wall_wood", "wooden wall", '#', Brown, 0, &[Flammable, NoItem, SupportsRoof, ReduceScent])
            .bashes(bash(12, 120, "t_dirt", &[("2x4", 1, 4), ("nail", 4, 10)], "crunch!"))
            .burns_to("t_dirt"),
        ter("t_rock", "solid rock", '#', White, 0, &[NoItem, SupportsRoof])
            .bashes(bash(100, 400, "t_rock_floor", &[("rock", 2, 6)], "crash!")),
        ter("t_door_c", "closed wood door", '+', Brown, 0, &[Door, Flammable2, NoItem, Indoors])
            .bashes(bash(5, 50, "t_door_frame", &[("2x4", 1, 3), ("nail", 2, 6)], "smash!"))
            .burns_to("t_door_frame"),
        ter("t_door_o", "open wood door", '\'', Brown, 2, &[Transparent, Door, Flammable2, Indoors])
            .bashes(bash(5, 50, "t_door_frame", &[("2x4", 1, 3), ("nail", 2, 6)], "smash!"))
            .burns_to("t_door_frame"),
        ter("t_door_frame", "empty door frame", '.', Brown, 2, &[Transparent, Indoors, Flammable2]).burns_to("t_dirt"),
        ter("t_window", "window", '"', LightCyan, 0, &[Transparent, NoItem, ThinObstacle, Flammable])
            .bashes(bash(3, 6, "t_window_frame", &[("glass_shard", 3, 6)], "glass breaking!"))
            .burns_to("t_window_frame"),
        ter("t_window_frame", "window frame", '0', LightCyan, 8, &[Transparent, Sharp, ThinObstacle, Flammable]).burns_to("t_dirt"),
        ter("t_tree", "tree", '7', Green, 0, &[Flammable2, NoItem, SupportsRoof, Tree, ReduceScent])
            .bashes(bash(80, 180, "t_trunk", &[("stick", 3, 6)], "crunch!"))
            .burns_to("t_dirt"),
        ter("t_tree_young", "young tree", '1', Green, 4, &[Transparent, Flammable2, YoungTree])
            .bashes(bash(4, 50, "t_underbrush", &[("stick_long", 2, 3)], "crunch."))
            .burns_to("t_dirt"),
        ter("t_trunk", "tree trunk", '1', Brown, 4, &[Transparent, Flammable2])
            .bashes(bash(35, 200, "t_dirt", &[("log", 2, 3)], "whump!"))
            .burns_to("t_dirt"),
        ter("t_underbrush", "underbrush", '#', Green, 6, &[Transparent, LFlammable, Diggable])
            .bashes(bash(3, 30, "t_dirt", &[("stick", 1, 2)], "rustle."))
            .burns_to("t_dirt"),
        ter("t_shrub", "shrub", '#', Green, 8, &[Transparent, Flammable2, ThinObstacle])
            .bashes(bash(4, 60, "t_dirt", &[("stick", 1, 2)], "crunch."))
            .burns_to("t_dirt")
            .examined(ExamineAction::Shrub),
        ter("t_tree_apple", "apple tree", '7', LightGreen, 0, &[Flammable2, NoItem, SupportsRoof, Tree])
            .bashes(bash(80, 180, "t_trunk", &[("stick", 3, 6)], "crunch!"))
            .burns_to("t_dirt")
            .examined(ExamineAction::TreeApple),
        ter("t_tree_apple_harvested", "apple tree", '7', Green, 0, &[Flammable2, NoItem, SupportsRoof, Tree])
            .bashes(bash(80, 180, "t_trunk", &[("stick", 3, 6)], "crunch!"))
            .burns_to("t_dirt"),
        ter("t_water_sh", "shallow water", '~', LightBlue, 5, &[Transparent, Liquid, Swimmable, FireContainer]),
        ter("t_water_dp", "deep water", '~', Blue, 8, &[Transparent, Liquid, Swimmable, NoItem, FireContainer]),
        ter("t_pit", "pit", '0', Brown, 10, &[Transparent, Diggable])
            .trapped(TrapId::Pit)
            .examined(ExamineAction::Pit),
        ter("t_pit_covered", "covered pit", '#', LightRed, 2, &[Transparent]).examined(ExamineAction::PitCovered),
        ter("t_pit_spiked", "spiked pit", '0', LightRed, 10, &[Transparent, Sharp])
            .trapped(TrapId::SpikedPit)
            .examined(ExamineAction::PitSpiked),
        ter("t_pit_spiked_covered", "covered spiked pit", '#', LightRed, 2, &[Transparent]).examined(ExamineAction::PitCovered),
        ter("t_chainfence", "chain link fence", '|', Cyan, 0, &[Transparent, NoItem, ThinObstacle])
            .bashes(bash(10, 150, "t_chainfence_posts", &[("wire", 8, 20)], "metal screeching!"))
            .examined(ExamineAction::ChainFence),
        ter("t_chainfence_posts", "metal post", '#', Cyan, 2, &[Transparent, ThinObstacle]),
        ter("t_fence_post", "fence post", '#', Brown, 2, &[Transparent, ThinObstacle, Flammable2])
            .bashes(bash(6, 30, "t_dirt", &[("pointy_stick", 1, 1)], "crack."))
            .burns_to("t_dirt")
            .examined(ExamineAction::FencePost),
        ter("t_gas_pump", "gasoline pump", '&', Red, 0, &[NoItem, Sealed, Explodes])
            .bashes(bash(8, 150, "t_pavement", &[("scrap", 2, 6)], "metal screeching!"))
            .examined(ExamineAction::GasPump),
        ter("t_card_science", "card reader", '6', Pink, 0, &[NoItem])
            .bashes(bash(5, 50, "t_floor", &[("scrap", 1, 3)], "bzzt!"))
            .examined(ExamineAction::CardReader),
        ter("t_door_metal_locked", "locked metal door", '+', Cyan, 0, &[NoItem, Door, SupportsRoof])
            .bashes(bash(80, 250, "t_door_frame", &[("scrap", 4, 8)], "metal screeching!")),
        ter("t_door_metal_c", "closed metal door", '+', Cyan, 0, &[NoItem, Door, SupportsRoof]),
        ter("t_slot_machine", "slot machine", '6', Green, 0, &[NoItem])
            .bashes(bash(8, 80, "t_floor", &[("scrap", 2, 4)], "smash!"))
            .examined(ExamineAction::SlotMachine),
        ter("t_elevator_control", "elevator controls", '6', Yellow, 0, &[NoItem]).examined(ExamineAction::Elevator),
        ter("t_elevator", "elevator", '.', Magenta, 2, &[Transparent, Indoors]),
        ter("t_gates_control", "gate controls", '6', Cyan, 0, &[NoItem]).examined(ExamineAction::ControlsGate),
        ter("t_gate_c", "closed gate", '+', LightGray, 0, &[NoItem]),
        ter("t_gate_o", "open gate", '.', LightGray, 2, &[Transparent]),
        ter("t_pedestal", "pedestal", '&', Yellow, 0, &[NoItem]).examined(ExamineAction::Pedestal),
        ter("t_switch", "switch", '6', Yellow, 0, &[NoItem]).examined(ExamineAction::FSwitch),
        ter("t_switch_wall", "stone wall", '#', LightGray, 0, &[NoItem, SupportsRoof]),
        ter("t_switch_floor", "stone floor", '.', LightGray, 2, &[Transparent, Indoors]),
        ter("t_console", "computer console", '6', LightGreen, 0, &[Transparent, Console, NoItem])
            .bashes(bash(8, 50, "t_floor", &[("scrap", 1, 3), ("cable", 1, 4)], "crunch!")),
        ter("t_stairs_down", "stairs down", '>', Yellow, 2, &[Transparent, GoesDown, PlaceItem]),
        ter("t_stairs_up", "stairs up", '<', Yellow, 2, &[Transparent, GoesUp, PlaceItem]),
        ter("t_sandbox", "sandbox", '#', Yellow, 3, &[Transparent, Deconstruct, Container])
            .bashes(bash(12, 30, "t_floor", &[("2x4", 1, 2)], "crunch."))
            .burns_to("t_dirt"),
        ter("t_railing", "railing", '"', Yellow, 3, &[Transparent, NoItem, ThinObstacle, Alarmed])
            .bashes(bash(6, 80, "t_pavement", &[("pipe", 1, 2)], "crack.")),
    ]
}

pub fn builtin_furniture() -> Vec<FurnitureDef> {
    use Color::*;
    vec![
        null_furniture(),
        furn("f_rubble", "rubble", '^', LightGray, 6, &[Transparent, Rough, Diggable, PlaceItem]).examined(ExamineAction::Rubble),
        furn("f_wreckage", "metal wreckage", '#', LightGray, 6, &[Transparent, Sharp, Rough, PlaceItem])
            .examined(ExamineAction::Wreckage),
        furn("f_ash", "pile of ash", '#', LightGray, 0, &[Transparent, PlaceItem]),
        furn("f_tent", "tent wall", '|', Green, -1, &[Flammable2, NoItem])
            .bashes(bash(1, 8, "", &[("tent_kit", 1, 1)], "rrrrip!"))
            .burns_to("f_ash")
            .examined(ExamineAction::Tent),
        furn("f_shelter", "improvised shelter", '#', Green, 2, &[Flammable2, PlaceItem])
            .bashes(bash(1, 8, "", &[("stick_long", 2, 4)], "crunch."))
            .burns_to("f_ash")
            .examined(ExamineAction::Shelter),
        furn("f_recycler", "recycler", 'R', Green, -1, &[PlaceItem, Container]).examined(ExamineAction::Recycler),
        furn("f_table", "table", '#', Red, 2, &[Transparent, Flammable, PlaceItem])
            .bashes(bash(12, 50, "", &[("2x4", 1, 3), ("nail", 4, 8)], "smash!"))
            .burns_to("f_ash"),
        furn("f_chair", "chair", '#', Brown, 1, &[Transparent, Flammable])
            .bashes(bash(6, 20, "", &[("2x4", 1, 2), ("nail", 1, 4)], "smash!"))
            .burns_to("f_ash"),
        furn("f_bookcase", "bookcase", '{', Brown, -1, &[Flammable, PlaceItem, Container])
            .bashes(bash(6, 40, "", &[("2x4", 2, 4), ("nail", 4, 10)], "smash!"))
            .burns_to("f_ash"),
        furn("f_crate_c", "closed crate", 'X', Brown, -1, &[Transparent, Flammable, Container])
            .bashes(bash(8, 30, "", &[("2x4", 1, 3), ("nail", 2, 6)], "wham!"))
            .burns_to("f_ash"),
        furn("f_hay", "pile of hay", '#', Yellow, 3, &[Transparent, LFlammable, Container])
            .bashes(bash(1, 6, "", &[("straw_pile", 1, 6)], "whish."))
            .burns_to("f_ash"),
        furn("f_counter", "counter", '#', Blue, 2, &[Transparent, Flammable, PlaceItem])
            .bashes(bash(12, 40, "", &[("2x4", 1, 3)], "whump."))
            .burns_to("f_ash"),
        furn("f_makeshift_bed", "makeshift bed", '#', Magenta, 1, &[Transparent, Flammable2])
            .bashes(bash(4, 20, "", &[("rag", 2, 6)], "whump."))
            .burns_to("f_ash"),
        furn("f_plant_seed", "seed", '^', Green, 0, &[Transparent, LFlammable]),
        furn("f_plant_mature", "mature plant", '#', Green, 0, &[Transparent, LFlammable]),
        furn("f_plant_harvest", "harvestable plant", '#', LightGreen, 0, &[Transparent, LFlammable]),
        furn("f_flower_poppy", "poppy flower", 'f', Red, 0, &[Transparent, LFlammable]).examined(ExamineAction::FlowerPoppy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_are_independent() {
        let flags = TerFlags::of(&[Transparent, Plowable]);
        assert!(flags.has(Transparent));
        assert!(flags.has(Plowable));
        assert!(!flags.has(Plantable));
        assert!(!flags.is_flammable());
        assert!(flags.with(LFlammable).is_flammable());
    }

    #[test]
    fn bash_data_marks_bashable() {
        for def in builtin_terrain() {
            assert_eq!(def.bash.is_some(), def.has_flag(Bashable), "{}", def.id);
            if let Some(b) = &def.bash {
                assert!(b.str_min <= b.str_max, "{}", def.id);
            }
        }
    }

    #[test]
    fn null_entries_come_first() {
        assert_eq!(builtin_terrain()[0].id, "t_null");
        assert_eq!(builtin_furniture()[0].id, "f_null");
    }
}
