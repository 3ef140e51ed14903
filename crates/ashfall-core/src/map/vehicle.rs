//! Vehicles embedded in submaps.
//!
//! A vehicle is owned by exactly one submap (as a `Box`) and is moved, not
//! copied, into its new submap when it drives across a boundary.

use serde::{Deserialize, Serialize};

use ashfall_logic::coords::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePart {
    pub name: String,
    /// Offset from the vehicle's origin tile.
    pub mount: Point,
    /// Walls, frames and the like stop movement outright.
    pub obstacle: bool,
    /// Cost to cross a non-obstacle part.
    pub move_cost: i32,
}

impl VehiclePart {
    pub fn frame(mount: Point) -> Self {
        Self {
            name: "frame".to_string(),
            mount,
            obstacle: true,
            move_cost: 0,
        }
    }

    pub fn seat(mount: Point) -> Self {
        Self {
            name: "seat".to_string(),
            mount,
            obstacle: false,
            move_cost: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    /// Origin tile, local to the owning submap.
    pub pos: Point,
    pub parts: Vec<VehiclePart>,
}

impl Vehicle {
    pub fn new(id: VehicleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pos: Point::ZERO,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: VehiclePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Index of the part at `mount`, preferring obstacles.
    pub fn part_at(&self, mount: Point) -> Option<usize> {
        let mut found = None;
        for (i, part) in self.parts.iter().enumerate() {
            if part.mount == mount {
                if part.obstacle {
                    return Some(i);
                }
                found.get_or_insert(i);
            }
        }
        found
    }

    /// Movement cost of the tile covered by part `index`.
    pub fn part_move_cost(&self, index: usize) -> i32 {
        match self.parts.get(index) {
            Some(p) if p.obstacle => 0,
            Some(p) => p.move_cost.max(1),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacles_shadow_other_parts() {
        let v = Vehicle::new(VehicleId(1), "cart")
            .with_part(VehiclePart::seat(Point::new(0, 0)))
            .with_part(VehiclePart::frame(Point::new(0, 0)))
            .with_part(VehiclePart::seat(Point::new(1, 0)));
        assert_eq!(v.part_at(Point::new(0, 0)), Some(1));
        assert_eq!(v.part_move_cost(1), 0);
        assert_eq!(v.part_at(Point::new(1, 0)), Some(2));
        assert_eq!(v.part_move_cost(2), 4);
        assert_eq!(v.part_at(Point::new(5, 5)), None);
    }
}
