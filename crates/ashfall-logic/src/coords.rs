//! Integer grid coordinates, distances and Bresenham lines.
//!
//! Three coordinate scales are in use and all share [`Tripoint`]:
//! - tile: one map square
//! - submap: `SEEX × SEEY` tiles
//! - overmap tile (omt): `OMT_SUBMAPS × OMT_SUBMAPS` submaps
//!
//! Conversions between scales round toward negative infinity so negative
//! coordinates land in the correct cell.

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::{OMT_SUBMAPS, SEEX, SEEY};

/// A 2D grid offset or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn with_z(self, z: i32) -> Tripoint {
        Tripoint::new(self.x, self.y, z)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// A 3D grid position. The scale (tile, submap, omt) is implied by context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tripoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Tripoint {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The four orthogonal neighbours on the same z-level, N/E/S/W order.
    pub fn orthogonal_neighbors(self) -> [Tripoint; 4] {
        [
            self + Point::new(0, -1),
            self + Point::new(1, 0),
            self + Point::new(0, 1),
            self + Point::new(-1, 0),
        ]
    }

    /// The eight surrounding tiles on the same z-level.
    pub fn neighbors(self) -> impl Iterator<Item = Tripoint> {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| Point::new(dx, dy)))
            .filter(|d| *d != Point::ZERO)
            .map(move |d| self + d)
    }
}

impl Add<Point> for Tripoint {
    type Output = Tripoint;
    fn add(self, rhs: Point) -> Tripoint {
        Tripoint::new(self.x + rhs.x, self.y + rhs.y, self.z)
    }
}

impl Sub<Point> for Tripoint {
    type Output = Tripoint;
    fn sub(self, rhs: Point) -> Tripoint {
        Tripoint::new(self.x - rhs.x, self.y - rhs.y, self.z)
    }
}

impl Sub for Tripoint {
    type Output = Tripoint;
    fn sub(self, rhs: Tripoint) -> Tripoint {
        Tripoint::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ============================================================================
// SCALE CONVERSIONS
// ============================================================================

/// Absolute tile → absolute submap containing it.
pub fn tile_to_submap(p: Tripoint) -> Tripoint {
    Tripoint::new(p.x.div_euclid(SEEX), p.y.div_euclid(SEEY), p.z)
}

/// Absolute tile → offset inside its submap, each axis in `0..SEEX`.
pub fn tile_in_submap(p: Tripoint) -> Point {
    Point::new(p.x.rem_euclid(SEEX), p.y.rem_euclid(SEEY))
}

/// Absolute submap → its north-west tile.
pub fn submap_origin_tile(sm: Tripoint) -> Tripoint {
    Tripoint::new(sm.x * SEEX, sm.y * SEEY, sm.z)
}

/// Absolute submap → overmap tile containing it.
pub fn submap_to_omt(sm: Tripoint) -> Tripoint {
    Tripoint::new(sm.x.div_euclid(OMT_SUBMAPS), sm.y.div_euclid(OMT_SUBMAPS), sm.z)
}

/// Overmap tile → its north-west submap.
pub fn omt_origin_submap(omt: Tripoint) -> Tripoint {
    Tripoint::new(omt.x * OMT_SUBMAPS, omt.y * OMT_SUBMAPS, omt.z)
}

/// Absolute tile → overmap tile containing it.
pub fn tile_to_omt(p: Tripoint) -> Tripoint {
    submap_to_omt(tile_to_submap(p))
}

// ============================================================================
// DISTANCES
// ============================================================================

/// Roguelike (Chebyshev) distance: diagonal steps cost the same as orthogonal.
pub fn rl_dist(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Euclidean distance.
pub fn trig_dist(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Bresenham line from `from` to `to`, excluding `from` and including `to`.
///
/// `t` biases which of the equally short lines is walked; callers that
/// need path continuity (line of sight retries) feed back the value that
/// worked last time. Pass 0 for the canonical line.
pub fn line_to(from: Point, to: Point, t: i32) -> Vec<Point> {
    let mut ret = Vec::new();
    if from == to {
        return ret;
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let ax = dx.abs() << 1;
    let ay = dy.abs() << 1;
    let sx = dx.signum();
    let sy = dy.signum();

    let xmin = from.x.min(to.x) - dx.abs();
    let xmax = from.x.max(to.x) + dx.abs();
    let ymin = from.y.min(to.y) - dy.abs();
    let ymax = from.y.max(to.y) + dy.abs();
    let in_box = |p: Point| p.x >= xmin && p.x <= xmax && p.y >= ymin && p.y <= ymax;

    let mut cur = from;
    let mut t = t;
    loop {
        if ax == ay {
            cur.x += sx;
            cur.y += sy;
        } else if ax > ay {
            if t > 0 {
                cur.y += sy;
                t -= ax;
            }
            cur.x += sx;
            t += ay;
        } else {
            if t > 0 {
                cur.x += sx;
                t -= ay;
            }
            cur.y += sy;
            t += ax;
        }
        ret.push(cur);
        if cur == to || !in_box(cur) {
            break;
        }
    }
    ret
}

/// [`line_to`] lifted to 3D at a fixed z-level.
pub fn line_to_3d(from: Tripoint, to: Tripoint) -> Vec<Tripoint> {
    line_to(from.xy(), to.xy(), 0)
        .into_iter()
        .map(|p| p.with_z(from.z))
        .collect()
}

/// Every point of an inclusive rectangle, row by row.
pub fn points_in_rectangle(min: Point, max: Point) -> impl Iterator<Item = Point> {
    (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Point::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_tiles_map_to_negative_submaps() {
        let p = Tripoint::new(-1, -13, 0);
        assert_eq!(tile_to_submap(p), Tripoint::new(-1, -2, 0));
        assert_eq!(tile_in_submap(p), Point::new(11, 11));
    }

    #[test]
    fn submap_origin_round_trip() {
        let sm = Tripoint::new(-3, 7, 1);
        let origin = submap_origin_tile(sm);
        assert_eq!(tile_to_submap(origin), sm);
        assert_eq!(tile_in_submap(origin), Point::ZERO);
    }

    #[test]
    fn omt_conversions() {
        assert_eq!(submap_to_omt(Tripoint::new(5, -1, 0)), Tripoint::new(2, -1, 0));
        assert_eq!(omt_origin_submap(Tripoint::new(2, -1, 0)), Tripoint::new(4, -2, 0));
        assert_eq!(tile_to_omt(Tripoint::new(24, 23, 0)), Tripoint::new(1, 0, 0));
    }

    #[test]
    fn line_ends_at_target() {
        let line = line_to(Point::new(0, 0), Point::new(7, 3), 0);
        assert_eq!(line.len(), 7);
        assert_eq!(*line.last().unwrap(), Point::new(7, 3));
    }

    #[test]
    fn diagonal_line() {
        let line = line_to(Point::new(0, 0), Point::new(-3, 3), 0);
        assert_eq!(
            line,
            vec![Point::new(-1, 1), Point::new(-2, 2), Point::new(-3, 3)]
        );
    }

    #[test]
    fn line_to_self_is_empty() {
        assert!(line_to(Point::new(4, 4), Point::new(4, 4), 0).is_empty());
    }

    #[test]
    fn distances() {
        assert_eq!(rl_dist(Point::new(0, 0), Point::new(3, -5)), 5);
        assert!((trig_dist(Point::new(0, 0), Point::new(3, 4)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn eight_neighbors() {
        let n: Vec<_> = Tripoint::new(0, 0, 0).neighbors().collect();
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&Tripoint::new(0, 0, 0)));
    }
}
