//! Trap table.

use serde::{Deserialize, Serialize};

use super::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrapId {
    #[default]
    None = 0,
    Pit = 1,
    SpikedPit = 2,
    BearTrap = 3,
    Tripwire = 4,
    Sinkhole = 5,
}

#[derive(Debug, Clone, Copy)]
pub struct TrapDef {
    pub name: &'static str,
    pub symbol: char,
    pub color: Color,
    /// Perception needed to spot it. 0 is always visible.
    pub visibility: i32,
    /// Dodge needed to avoid triggering it.
    pub avoidance: i32,
    /// Skill needed to disarm. 99 can't be disarmed.
    pub difficulty: i32,
}

impl TrapId {
    pub const ALL: [TrapId; 6] = [
        TrapId::None,
        TrapId::Pit,
        TrapId::SpikedPit,
        TrapId::BearTrap,
        TrapId::Tripwire,
        TrapId::Sinkhole,
    ];

    pub fn def(self) -> TrapDef {
        match self {
            TrapId::None => TrapDef {
                name: "none",
                symbol: '?',
                color: Color::White,
                visibility: 20,
                avoidance: 0,
                difficulty: 0,
            },
            TrapId::Pit => TrapDef {
                name: "pit",
                symbol: '0',
                color: Color::Brown,
                visibility: 0,
                avoidance: 8,
                difficulty: 99,
            },
            TrapId::SpikedPit => TrapDef {
                name: "spiked pit",
                symbol: '0',
                color: Color::LightRed,
                visibility: 0,
                avoidance: 8,
                difficulty: 99,
            },
            TrapId::BearTrap => TrapDef {
                name: "bear trap",
                symbol: '^',
                color: Color::Blue,
                visibility: 2,
                avoidance: 7,
                difficulty: 3,
            },
            TrapId::Tripwire => TrapDef {
                name: "tripwire",
                symbol: '^',
                color: Color::LightRed,
                visibility: 6,
                avoidance: 4,
                difficulty: 3,
            },
            TrapId::Sinkhole => TrapDef {
                name: "sinkhole",
                symbol: '_',
                color: Color::Brown,
                visibility: 10,
                avoidance: 14,
                difficulty: 99,
            },
        }
    }

    pub fn is_null(self) -> bool {
        self == TrapId::None
    }

    /// Whether an observer with `perception` notices the trap.
    pub fn can_see(self, perception: i32) -> bool {
        !self.is_null() && self.def().visibility <= perception
    }
}
