//! Salt-water pipe routing.
//!
//! A pipe runs from the tile beside an expansion (the connection tile) to the
//! nearest reachable swamp. The route is found by cost relaxation over a
//! 21×21 table of overmap tiles centred on the connection tile: legal tiles
//! accumulate positive path costs (1.0 orthogonal, √2 diagonal), swamps hold
//! negated costs so the cheapest swamp reached can be picked as the
//! destination, and illegal tiles never change.
//!
//! The resulting route is stored swamp first. Segment 0 is the swamp intake,
//! the last segment is the connection tile.

use serde::{Deserialize, Serialize};

use crate::constants::salt_pipe::{
    DIAGONAL_COST, ILLEGAL, LEGAL, MAX_DISTANCE, MAX_LENGTH, ORTHOGONAL_COST, SWAMP,
};
use crate::coords::Point;
use crate::direction::{CompassDir, StampOrientation};

/// How a single overmap tile participates in routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeTerrain {
    /// Forest, field, trail or road.
    Legal,
    Illegal,
    /// A valid intake.
    Swamp,
}

impl PipeTerrain {
    /// Classify an overmap terrain type id.
    pub fn classify(oter: &str) -> Self {
        match oter {
            "forest" | "forest_thick" | "forest_trail" | "field" | "road" => Self::Legal,
            "forest_water" => Self::Swamp,
            _ => Self::Illegal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeRouteError {
    /// The connection tile itself can't carry a pipe.
    BlockedConnection,
    /// No swamp within range and length limits.
    NoRoute,
}

impl std::fmt::Display for PipeRouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockedConnection => write!(
                f,
                "the tile next to this expansion can't carry a pipe; supported terrain is forest, field, road and swamp"
            ),
            Self::NoRoute => write!(
                f,
                "no swamp reachable within {} tiles at a range of {} tiles",
                MAX_LENGTH, MAX_DISTANCE
            ),
        }
    }
}

const SIDE: usize = (2 * MAX_DISTANCE + 1) as usize;

struct PathTable {
    cells: [[f64; SIDE]; SIDE],
}

impl PathTable {
    fn get(&self, p: Point) -> f64 {
        self.cells[(MAX_DISTANCE + p.x) as usize][(MAX_DISTANCE + p.y) as usize]
    }

    fn set(&mut self, p: Point, v: f64) {
        self.cells[(MAX_DISTANCE + p.x) as usize][(MAX_DISTANCE + p.y) as usize] = v;
    }

    /// Neighbours whose relaxation is permitted. The outer ring is never
    /// entered.
    fn inner(p: Point) -> bool {
        p.x > -MAX_DISTANCE && p.x < MAX_DISTANCE && p.y > -MAX_DISTANCE && p.y < MAX_DISTANCE
    }

    /// Relax all neighbours of `pt`; returns the cheapest swamp tile touched,
    /// if any.
    fn relax_neighbors(&mut self, pt: Point) -> Option<Point> {
        let mut found = None;
        let mut lowest_found = -10_000.0;
        let here = self.get(pt);
        for i in -1..=1 {
            for k in -1..=1 {
                let n = pt + Point::new(i, k);
                if !Self::inner(n) {
                    continue;
                }
                let cost = if i != 0 && k != 0 {
                    DIAGONAL_COST
                } else {
                    ORTHOGONAL_COST
                };
                let there = self.get(n);
                if there == LEGAL || (there > 0.0 && there > here + cost) {
                    self.set(n, here + cost);
                } else if there <= SWAMP && (there == SWAMP || there < -(here + cost)) {
                    let v = -(here + cost);
                    self.set(n, v);
                    if v > lowest_found {
                        lowest_found = v;
                        found = Some(n);
                    }
                }
            }
        }
        found
    }
}

/// Route a pipe from `connection` (absolute overmap xy) to a swamp.
///
/// `camp` is the camp's own tile; the 3×3 block around it is never routed
/// through. `terrain` classifies absolute overmap tiles.
pub fn plan_route<F>(camp: Point, connection: Point, terrain: F) -> Result<Vec<Point>, PipeRouteError>
where
    F: Fn(Point) -> PipeTerrain,
{
    let mut table = PathTable {
        cells: [[ILLEGAL; SIDE]; SIDE],
    };
    let camp_local = camp - connection;
    for i in -MAX_DISTANCE..=MAX_DISTANCE {
        for k in -MAX_DISTANCE..=MAX_DISTANCE {
            let local = Point::new(i, k);
            let in_camp = (i - camp_local.x).abs() <= 1 && (k - camp_local.y).abs() <= 1;
            let v = if in_camp {
                ILLEGAL
            } else {
                match terrain(connection + local) {
                    PipeTerrain::Legal => LEGAL,
                    PipeTerrain::Swamp => SWAMP,
                    PipeTerrain::Illegal => ILLEGAL,
                }
            };
            table.set(local, v);
        }
    }

    let start = table.get(Point::ZERO);
    if start == ILLEGAL {
        return Err(PipeRouteError::BlockedConnection);
    }
    if start == SWAMP {
        return Ok(vec![connection]);
    }

    // The connection tile is always reached orthogonally from the expansion.
    table.set(Point::ZERO, ORTHOGONAL_COST);

    let mut destination = None;
    let mut destination_cost = -10_000.0;
    for distance in 1..=MAX_LENGTH as i32 {
        let dist = distance.min(MAX_DISTANCE);
        for i in -dist..=dist {
            for k in -dist..=dist {
                let p = Point::new(i, k);
                if table.get(p) <= 0.0 {
                    continue;
                }
                if let Some(swamp) = table.relax_neighbors(p) {
                    if table.get(swamp) > destination_cost {
                        destination_cost = table.get(swamp);
                        destination = Some(swamp);
                    }
                }
            }
        }
    }

    let mut at = destination.ok_or(PipeRouteError::NoRoute)?;
    // Flip the intake's sign so the walk back sees only positive costs.
    table.set(at, -table.get(at));

    let mut route = Vec::new();
    while at != Point::ZERO {
        route.push(connection + at);
        if route.len() > MAX_LENGTH {
            return Err(PipeRouteError::NoRoute);
        }
        let current = table.get(at);
        let mut best: Option<Point> = None;
        for i in -1..=1 {
            for k in -1..=1 {
                let n = at + Point::new(i, k);
                if !PathTable::inner(n) {
                    continue;
                }
                let v = table.get(n);
                if v > 0.0 && v < current && best.map_or(true, |b| table.get(b) > v) {
                    best = Some(n);
                }
            }
        }
        at = best.ok_or(PipeRouteError::NoRoute)?;
    }
    route.push(connection);
    Ok(route)
}

/// One overmap tile of a pipe under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeSegment {
    pub point: Point,
    pub started: bool,
    pub finished: bool,
}

/// A planned pipe owned by one expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaltWaterPipe {
    pub expansion: CompassDir,
    /// Offset from the expansion to the connection tile.
    pub connection_direction: Point,
    pub segments: Vec<PipeSegment>,
}

impl SaltWaterPipe {
    pub fn new(expansion: CompassDir, connection_direction: Point, route: &[Point]) -> Self {
        Self {
            expansion,
            connection_direction,
            segments: route
                .iter()
                .map(|&point| PipeSegment {
                    point,
                    started: false,
                    finished: false,
                })
                .collect(),
        }
    }

    /// Segment that may be dispatched next: the first unfinished segment
    /// whose predecessor is finished and that isn't already under way.
    pub fn next_segment(&self) -> Option<usize> {
        let idx = self.segments.iter().position(|s| !s.finished)?;
        if self.segments[idx].started {
            None
        } else {
            Some(idx)
        }
    }

    pub fn finished_count(&self) -> usize {
        self.segments.iter().filter(|s| s.finished).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.segments.is_empty() && self.finished_count() == self.segments.len()
    }

    /// Capability token gating construction of segment `n`.
    pub fn segment_token(n: usize) -> String {
        format!("salt_water_pipe_{}_scheduled", n)
    }

    /// Parse the segment number back out of a token.
    pub fn segment_of(token: &str) -> Option<usize> {
        let n: usize = token
            .strip_prefix("salt_water_pipe_")?
            .strip_suffix("_scheduled")?
            .parse()
            .ok()?;
        (n < MAX_LENGTH).then_some(n)
    }

    /// Orientations for the stamps of segment `n`: the incoming stub (absent
    /// for the intake) and the outgoing stub, which points back at the
    /// expansion for the last segment.
    pub fn segment_orientations(&self, n: usize) -> (Option<StampOrientation>, StampOrientation) {
        let here = self.segments[n].point;
        let previous = (n > 0).then(|| {
            CompassDir::from_offset(self.segments[n - 1].point - here).stamp_orientation()
        });
        let next = if n + 1 == self.segments.len() {
            -self.connection_direction
        } else {
            self.segments[n + 1].point - here
        };
        (previous, CompassDir::from_offset(next).stamp_orientation())
    }
}
