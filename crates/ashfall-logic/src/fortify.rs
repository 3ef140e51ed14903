//! Map fortification runs: straight lines of overmap tiles dug into
//! trenches, later upgraded to spiked trenches.

use serde::{Deserialize, Serialize};

use crate::coords::{line_to, rl_dist, Point};

/// Closest a fortification endpoint may be to the camp.
pub const MIN_RANGE: i32 = 2;
/// Farthest a fortification endpoint may be from the camp.
pub const MAX_RANGE: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FortLevel {
    Trench = 0,
    SpikedTrench = 1,
}

impl FortLevel {
    /// Blueprint id used as the mission parameter.
    pub fn blueprint(self) -> &'static str {
        match self {
            Self::Trench => "faction_wall_level_N_0",
            Self::SpikedTrench => "faction_wall_level_N_1",
        }
    }

    pub fn from_blueprint(id: &str) -> Option<Self> {
        match id {
            "faction_wall_level_N_0" => Some(Self::Trench),
            "faction_wall_level_N_1" => Some(Self::SpikedTrench),
            _ => None,
        }
    }

    /// Update-mapgen id for one side of a fortified tile.
    pub fn stamp(self, side: Side) -> String {
        format!("faction_wall_level_{}_{}", side.letter(), self as u8)
    }
}

/// Side of an overmap tile a wall stamp is laid along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    N,
    E,
    S,
    W,
}

impl Side {
    fn letter(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::E => "E",
            Self::S => "S",
            Self::W => "W",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FortifyError {
    NotStraight,
    TooShort,
    OutOfRange(Point),
    InvalidTerrain(Point),
    /// Spikes go on top of existing trenches only.
    NoTrench(Point),
}

impl std::fmt::Display for FortifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStraight => write!(f, "construction line must be straight"),
            Self::TooShort => write!(f, "a fortification needs at least two tiles"),
            Self::OutOfRange(p) => write!(
                f,
                "({}, {}) must be between {} and {} tiles from camp",
                p.x, p.y, MIN_RANGE, MAX_RANGE
            ),
            Self::InvalidTerrain(p) => {
                write!(f, "invalid terrain in construction path at ({}, {})", p.x, p.y)
            }
            Self::NoTrench(p) => write!(
                f,
                "spiked pits must be built over existing trenches; ({}, {}) has none",
                p.x, p.y
            ),
        }
    }
}

/// Overmap terrain a trench may be dug through.
pub fn is_fortifiable(oter: &str) -> bool {
    matches!(
        oter,
        "forest" | "forest_thick" | "forest_water" | "forest_trail" | "field"
    )
}

/// A validated, sorted fortification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortificationPlan {
    pub level: FortLevel,
    /// West-to-east or north-to-south.
    pub points: Vec<Point>,
}

impl FortificationPlan {
    /// Validate a run between two picked endpoints.
    ///
    /// `oter` looks up overmap terrain, `trenches` is the camp's list of
    /// already dug tiles.
    pub fn new<F>(
        level: FortLevel,
        camp: Point,
        start: Point,
        stop: Point,
        oter: F,
        trenches: &[Point],
    ) -> Result<Self, FortifyError>
    where
        F: Fn(Point) -> String,
    {
        let change_x = start.x != stop.x;
        let change_y = start.y != stop.y;
        if change_x && change_y {
            return Err(FortifyError::NotStraight);
        }
        if !change_x && !change_y {
            return Err(FortifyError::TooShort);
        }
        for end in [start, stop] {
            let d = rl_dist(camp, end);
            if !(MIN_RANGE..=MAX_RANGE).contains(&d) {
                return Err(FortifyError::OutOfRange(end));
            }
        }

        let (from, to) = if (change_x && stop.x < start.x) || (change_y && stop.y < start.y) {
            (stop, start)
        } else {
            (start, stop)
        };
        let mut points = vec![from];
        points.extend(line_to(from, to, 0));

        for &p in &points {
            if !is_fortifiable(&oter(p)) {
                return Err(FortifyError::InvalidTerrain(p));
            }
            if level == FortLevel::SpikedTrench && !trenches.contains(&p) {
                return Err(FortifyError::NoTrench(p));
            }
        }
        Ok(Self { level, points })
    }

    pub fn north_south(&self) -> bool {
        self.points.len() > 1 && self.points[0].y != self.points[1].y
    }

    /// Recipe batches consumed by the run.
    pub fn batch_size(&self) -> usize {
        self.points.len() * 2 - 2
    }

    /// Stamps to apply per tile. End tiles get one side, middle tiles both.
    pub fn stamps(&self) -> Vec<(Point, Vec<String>)> {
        let (first, second) = if self.north_south() {
            (Side::S, Side::N)
        } else {
            (Side::E, Side::W)
        };
        let last = self.points.len() - 1;
        self.points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let sides = if i == 0 {
                    vec![self.level.stamp(first)]
                } else if i == last {
                    vec![self.level.stamp(second)]
                } else {
                    vec![self.level.stamp(first), self.level.stamp(second)]
                };
                (p, sides)
            })
            .collect()
    }
}
