//! Compass directions used to key camp expansions, plus stamp orientation.

use serde::{Deserialize, Serialize};

use crate::coords::Point;

/// Offset of an expansion from its camp's own overmap tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompassDir {
    /// The camp tile itself.
    Base = 0,
    N = 1,
    NE = 2,
    E = 3,
    SE = 4,
    S = 5,
    SW = 6,
    W = 7,
    NW = 8,
}

impl CompassDir {
    pub const ALL: [CompassDir; 9] = [
        CompassDir::Base,
        CompassDir::N,
        CompassDir::NE,
        CompassDir::E,
        CompassDir::SE,
        CompassDir::S,
        CompassDir::SW,
        CompassDir::W,
        CompassDir::NW,
    ];

    /// The eight directions an expansion can occupy.
    pub const EXPANSIONS: [CompassDir; 8] = [
        CompassDir::N,
        CompassDir::NE,
        CompassDir::E,
        CompassDir::SE,
        CompassDir::S,
        CompassDir::SW,
        CompassDir::W,
        CompassDir::NW,
    ];

    pub fn offset(self) -> Point {
        match self {
            Self::Base => Point::new(0, 0),
            Self::N => Point::new(0, -1),
            Self::NE => Point::new(1, -1),
            Self::E => Point::new(1, 0),
            Self::SE => Point::new(1, 1),
            Self::S => Point::new(0, 1),
            Self::SW => Point::new(-1, 1),
            Self::W => Point::new(-1, 0),
            Self::NW => Point::new(-1, -1),
        }
    }

    /// Direction for a unit offset. Longer offsets are reduced to their sign.
    pub fn from_offset(p: Point) -> CompassDir {
        match (p.x.signum(), p.y.signum()) {
            (0, -1) => Self::N,
            (1, -1) => Self::NE,
            (1, 0) => Self::E,
            (1, 1) => Self::SE,
            (0, 1) => Self::S,
            (-1, 1) => Self::SW,
            (-1, 0) => Self::W,
            (-1, -1) => Self::NW,
            _ => Self::Base,
        }
    }

    pub fn from_u8(val: u8) -> Option<Self> {
        Self::ALL.get(val as usize).copied()
    }

    /// Bracketed abbreviation used in mission labels, e.g. `[NE]`.
    pub fn bracket_abbr(self) -> &'static str {
        match self {
            Self::Base => "[B]",
            Self::N => "[N]",
            Self::NE => "[NE]",
            Self::E => "[E]",
            Self::SE => "[SE]",
            Self::S => "[S]",
            Self::SW => "[SW]",
            Self::W => "[W]",
            Self::NW => "[NW]",
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Self::NE | Self::SE | Self::SW | Self::NW)
    }

    /// How a stamp authored facing north (or north-east for diagonals) must
    /// be mirrored and rotated to face this direction.
    pub fn stamp_orientation(self) -> StampOrientation {
        let mut o = StampOrientation {
            orthogonal: true,
            ..StampOrientation::default()
        };
        match self {
            Self::Base | Self::N => {}
            Self::NE => o.orthogonal = false,
            Self::E => o.rotation = 1,
            Self::SE => {
                o.orthogonal = false;
                o.rotation = 1;
            }
            Self::S => o.mirror_vertical = true,
            Self::SW => {
                o.orthogonal = false;
                o.rotation = 2;
            }
            Self::W => {
                o.rotation = 1;
                o.mirror_vertical = true;
            }
            Self::NW => {
                o.orthogonal = false;
                o.rotation = 3;
            }
        }
        o
    }
}

/// Mirror/rotation flags handed to update-mapgen stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StampOrientation {
    /// False when the diagonal variant of a stamp must be used.
    pub orthogonal: bool,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    /// Quarter turns clockwise, 0..=3.
    pub rotation: u8,
}

impl StampOrientation {
    pub const IDENTITY: StampOrientation = StampOrientation {
        orthogonal: true,
        mirror_horizontal: false,
        mirror_vertical: false,
        rotation: 0,
    };

    /// Map a local coordinate inside a `size × size` square through the
    /// mirror flags and then the rotation.
    pub fn apply(&self, p: Point, size: i32) -> Point {
        let max = size - 1;
        let mut q = p;
        if self.mirror_horizontal {
            q.x = max - q.x;
        }
        if self.mirror_vertical {
            q.y = max - q.y;
        }
        for _ in 0..(self.rotation % 4) {
            q = Point::new(max - q.y, q.x);
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip() {
        for dir in CompassDir::ALL {
            assert_eq!(CompassDir::from_offset(dir.offset()), dir);
        }
    }

    #[test]
    fn from_u8_matches_discriminant() {
        for dir in CompassDir::ALL {
            assert_eq!(CompassDir::from_u8(dir as u8), Some(dir));
        }
        assert_eq!(CompassDir::from_u8(9), None);
    }

    #[test]
    fn diagonal_orientations_flagged() {
        for dir in CompassDir::EXPANSIONS {
            assert_eq!(dir.stamp_orientation().orthogonal, !dir.is_diagonal());
        }
    }

    #[test]
    fn rotation_turns_north_edge_east() {
        let o = CompassDir::E.stamp_orientation();
        // Top-left corner of a north-facing stamp ends on the right edge.
        assert_eq!(o.apply(Point::new(0, 0), 24), Point::new(23, 0));
        assert_eq!(o.apply(Point::new(5, 0), 24), Point::new(23, 5));
    }

    #[test]
    fn south_mirrors_vertically() {
        let o = CompassDir::S.stamp_orientation();
        assert_eq!(o.apply(Point::new(3, 0), 24), Point::new(3, 23));
    }
}
