//! Field type table: per-density names and looks, decay, and priority.

use serde::{Deserialize, Serialize};

use ashfall_logic::calendar::TimeSpan;

use super::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldTypeId {
    Null = 0,
    Blood = 1,
    Bile = 2,
    Web = 3,
    Slime = 4,
    Acid = 5,
    Sap = 6,
    Fire = 7,
    Smoke = 8,
    ToxicGas = 9,
    TearGas = 10,
    NukeGas = 11,
    Electricity = 12,
    Fatigue = 13,
}

impl FieldTypeId {
    pub const ALL: [FieldTypeId; 14] = [
        FieldTypeId::Null,
        FieldTypeId::Blood,
        FieldTypeId::Bile,
        FieldTypeId::Web,
        FieldTypeId::Slime,
        FieldTypeId::Acid,
        FieldTypeId::Sap,
        FieldTypeId::Fire,
        FieldTypeId::Smoke,
        FieldTypeId::ToxicGas,
        FieldTypeId::TearGas,
        FieldTypeId::NukeGas,
        FieldTypeId::Electricity,
        FieldTypeId::Fatigue,
    ];

    pub fn from_u8(val: u8) -> Option<Self> {
        Self::ALL.get(val as usize).copied()
    }

    pub fn def(self) -> &'static FieldDef {
        &FIELD_DEFS[self as usize]
    }

    /// Gases drift into neighbouring open tiles and thin out as they go.
    pub fn is_gas(self) -> bool {
        self.def().is_gas
    }
}

/// Static description of a field type. Arrays are indexed by density - 1.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub id: &'static str,
    pub names: [&'static str; 3],
    pub symbol: char,
    /// Higher draws on top when several fields share a tile.
    pub priority: i8,
    pub colors: [Color; 3],
    pub transparent: [bool; 3],
    pub dangerous: [bool; 3],
    /// Decay time constant. Zero never decays.
    pub halflife: TimeSpan,
    /// Extra movement cost imposed on the tile.
    pub move_cost: [i32; 3],
    pub is_gas: bool,
}

impl FieldDef {
    fn level(density: u8) -> usize {
        (density.clamp(1, 3) - 1) as usize
    }

    pub fn name(&self, density: u8) -> &'static str {
        self.names[Self::level(density)]
    }

    pub fn color(&self, density: u8) -> Color {
        self.colors[Self::level(density)]
    }

    pub fn is_transparent(&self, density: u8) -> bool {
        self.transparent[Self::level(density)]
    }

    pub fn is_dangerous(&self, density: u8) -> bool {
        self.dangerous[Self::level(density)]
    }

    pub fn move_cost(&self, density: u8) -> i32 {
        self.move_cost[Self::level(density)]
    }
}

use Color::*;

static FIELD_DEFS: [FieldDef; 14] = [
    FieldDef {
        id: "fd_null",
        names: ["", "", ""],
        symbol: '%',
        priority: 0,
        colors: [White, White, White],
        transparent: [true, true, true],
        dangerous: [false, false, false],
        halflife: TimeSpan::ZERO,
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_blood",
        names: ["blood splatter", "blood stain", "puddle of blood"],
        symbol: '%',
        priority: 0,
        colors: [Red, Red, Red],
        transparent: [true, true, true],
        dangerous: [false, false, false],
        halflife: TimeSpan::seconds(2500),
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_bile",
        names: ["bile splatter", "bile stain", "puddle of bile"],
        symbol: '%',
        priority: 0,
        colors: [Pink, Pink, Pink],
        transparent: [true, true, true],
        dangerous: [false, false, false],
        halflife: TimeSpan::seconds(2500),
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_web",
        names: ["cobwebs", "webs", "thick webs"],
        symbol: '}',
        priority: 2,
        colors: [White, White, White],
        transparent: [true, true, false],
        dangerous: [true, true, true],
        halflife: TimeSpan::ZERO,
        move_cost: [2, 4, 8],
        is_gas: false,
    },
    FieldDef {
        id: "fd_slime",
        names: ["slime trail", "slime stain", "puddle of slime"],
        symbol: '%',
        priority: 0,
        colors: [LightGreen, LightGreen, LightGreen],
        transparent: [true, true, true],
        dangerous: [false, false, false],
        halflife: TimeSpan::seconds(2500),
        move_cost: [0, 1, 2],
        is_gas: false,
    },
    FieldDef {
        id: "fd_acid",
        names: ["acid splatter", "acid streak", "pool of acid"],
        symbol: '5',
        priority: 2,
        colors: [LightGreen, Green, Green],
        transparent: [true, true, true],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(10),
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_sap",
        names: ["sap splatter", "glob of sap", "pool of sap"],
        symbol: '5',
        priority: 2,
        colors: [Yellow, Brown, Brown],
        transparent: [true, true, true],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(20),
        move_cost: [1, 2, 3],
        is_gas: false,
    },
    FieldDef {
        id: "fd_fire",
        names: ["small fire", "fire", "raging fire"],
        symbol: '4',
        priority: 4,
        colors: [Yellow, LightRed, Red],
        transparent: [true, true, true],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(800),
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_smoke",
        names: ["thin smoke", "smoke", "thick smoke"],
        symbol: '8',
        priority: 8,
        colors: [White, LightGray, DarkGray],
        transparent: [true, false, false],
        dangerous: [false, true, true],
        halflife: TimeSpan::seconds(300),
        move_cost: [0, 0, 0],
        is_gas: true,
    },
    FieldDef {
        id: "fd_toxic_gas",
        names: ["hazy cloud", "toxic gas", "thick toxic gas"],
        symbol: '8',
        priority: 8,
        colors: [LightGreen, Green, Green],
        transparent: [true, false, false],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(900),
        move_cost: [0, 0, 0],
        is_gas: true,
    },
    FieldDef {
        id: "fd_tear_gas",
        names: ["hazy cloud", "tear gas", "thick tear gas"],
        symbol: '8',
        priority: 8,
        colors: [White, Yellow, Brown],
        transparent: [true, false, false],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(600),
        move_cost: [0, 0, 0],
        is_gas: true,
    },
    FieldDef {
        id: "fd_nuke_gas",
        names: ["hazy cloud", "radioactive gas", "thick radioactive gas"],
        symbol: '8',
        priority: 8,
        colors: [White, LightGreen, Green],
        transparent: [true, true, false],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(1000),
        move_cost: [0, 0, 0],
        is_gas: true,
    },
    FieldDef {
        id: "fd_electricity",
        names: ["sparks", "electric crackle", "electric cloud"],
        symbol: '9',
        priority: 4,
        colors: [White, Cyan, Blue],
        transparent: [true, true, true],
        dangerous: [true, true, true],
        halflife: TimeSpan::seconds(2),
        move_cost: [0, 0, 0],
        is_gas: false,
    },
    FieldDef {
        id: "fd_fatigue",
        names: ["odd ripple", "swirling air", "tear in reality"],
        symbol: '*',
        priority: 8,
        colors: [LightGray, DarkGray, Magenta],
        transparent: [true, false, false],
        dangerous: [false, true, true],
        halflife: TimeSpan::ZERO,
        move_cost: [0, 0, 0],
        is_gas: false,
    },
];
