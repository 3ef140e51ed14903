//! Overmap tile metadata: terrain ids, notes and what the player has seen.
//!
//! Camp code treats the overmap as a key-value store keyed by overmap tile.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use ashfall_logic::coords::{Point, Tripoint};

pub trait OvermapBuffer {
    /// Terrain id at an overmap tile.
    fn ter(&self, omt: Tripoint) -> String;
    fn ter_set(&mut self, omt: Tripoint, id: &str);
    fn note(&self, omt: Tripoint) -> Option<String>;
    fn add_note(&mut self, omt: Tripoint, text: &str);
    /// Mark every tile within `radius` of `center` as seen.
    fn reveal(&mut self, center: Tripoint, radius: i32);
    fn seen(&self, omt: Tripoint) -> bool;
}

/// In-memory overmap. Tiles never set read as `default_ter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryOvermap {
    terrain: BTreeMap<Tripoint, String>,
    notes: BTreeMap<Tripoint, String>,
    seen: BTreeSet<Tripoint>,
    default_ter: String,
}

impl MemoryOvermap {
    pub fn new(default_ter: impl Into<String>) -> Self {
        Self {
            terrain: BTreeMap::new(),
            notes: BTreeMap::new(),
            seen: BTreeSet::new(),
            default_ter: default_ter.into(),
        }
    }

    /// Paint an inclusive rectangle of tiles on one z-level.
    pub fn fill(&mut self, min: Tripoint, max: Tripoint, id: &str) {
        for p in ashfall_logic::coords::points_in_rectangle(min.xy(), max.xy()) {
            self.terrain.insert(p.with_z(min.z), id.to_string());
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl Default for MemoryOvermap {
    fn default() -> Self {
        Self::new("field")
    }
}

impl OvermapBuffer for MemoryOvermap {
    fn ter(&self, omt: Tripoint) -> String {
        self.terrain
            .get(&omt)
            .cloned()
            .unwrap_or_else(|| self.default_ter.clone())
    }

    fn ter_set(&mut self, omt: Tripoint, id: &str) {
        self.terrain.insert(omt, id.to_string());
    }

    fn note(&self, omt: Tripoint) -> Option<String> {
        self.notes.get(&omt).cloned()
    }

    fn add_note(&mut self, omt: Tripoint, text: &str) {
        self.notes.insert(omt, text.to_string());
    }

    fn reveal(&mut self, center: Tripoint, radius: i32) {
        let r = radius.max(0);
        for dy in -r..=r {
            for dx in -r..=r {
                self.seen.insert(center + Point::new(dx, dy));
            }
        }
    }

    fn seen(&self, omt: Tripoint) -> bool {
        self.seen.contains(&omt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_tiles_use_the_default() {
        let mut om = MemoryOvermap::default();
        let p = Tripoint::new(4, -2, 0);
        assert_eq!(om.ter(p), "field");
        om.ter_set(p, "forest");
        assert_eq!(om.ter(p), "forest");
    }

    #[test]
    fn reveal_covers_a_square() {
        let mut om = MemoryOvermap::default();
        om.reveal(Tripoint::new(0, 0, 0), 2);
        assert_eq!(om.seen_count(), 25);
        assert!(om.seen(Tripoint::new(-2, 2, 0)));
        assert!(!om.seen(Tripoint::new(3, 0, 0)));
    }

    #[test]
    fn notes_overwrite() {
        let mut om = MemoryOvermap::default();
        let p = Tripoint::new(1, 1, 0);
        om.add_note(p, "camp");
        om.add_note(p, "DEAD NPC");
        assert_eq!(om.note(p).as_deref(), Some("DEAD NPC"));
    }
}
