//! Submap backing stores.
//!
//! A store either returns exactly what was saved or says it has nothing;
//! bytes that fail to decode (or decode into an inconsistent submap) are
//! reported as [`MapBufferError::Corrupt`]. [`SubmapLoader`] turns "nothing"
//! and "corrupt" alike into a freshly generated submap.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ashfall_logic::coords::{submap_to_omt, Tripoint};

use super::mapgen::MapGenerator;
use super::submap::Submap;
use crate::error::MapBufferError;
use crate::overmap::OvermapBuffer;
use crate::registry::Registry;

pub trait MapBuffer {
    fn save(&mut self, pos: Tripoint, submap: &Submap) -> Result<(), MapBufferError>;
    /// `Ok(None)` when nothing was ever saved at `pos`.
    fn load(&mut self, pos: Tripoint) -> Result<Option<Submap>, MapBufferError>;
    fn contains(&self, pos: Tripoint) -> bool;
}

fn decode(pos: Tripoint, bytes: &[u8]) -> Result<Submap, MapBufferError> {
    let submap: Submap = bincode::deserialize(bytes).map_err(|e| MapBufferError::Corrupt {
        pos,
        reason: e.to_string(),
    })?;
    submap
        .validate()
        .map_err(|reason| MapBufferError::Corrupt { pos, reason })?;
    Ok(submap)
}

// ============================================================================
// MEMORY
// ============================================================================

/// Encoded submaps kept in memory.
#[derive(Debug, Default)]
pub struct MemoryMapBuffer {
    submaps: HashMap<Tripoint, Vec<u8>>,
}

impl MemoryMapBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes, bypassing the encoder.
    pub fn insert_raw(&mut self, pos: Tripoint, bytes: Vec<u8>) {
        self.submaps.insert(pos, bytes);
    }

    pub fn raw(&self, pos: Tripoint) -> Option<&[u8]> {
        self.submaps.get(&pos).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.submaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submaps.is_empty()
    }
}

impl MapBuffer for MemoryMapBuffer {
    fn save(&mut self, pos: Tripoint, submap: &Submap) -> Result<(), MapBufferError> {
        let bytes = bincode::serialize(submap).map_err(|source| MapBufferError::Encode { pos, source })?;
        self.submaps.insert(pos, bytes);
        Ok(())
    }

    fn load(&mut self, pos: Tripoint) -> Result<Option<Submap>, MapBufferError> {
        match self.submaps.get(&pos) {
            Some(bytes) => decode(pos, bytes).map(Some),
            None => Ok(None),
        }
    }

    fn contains(&self, pos: Tripoint) -> bool {
        self.submaps.contains_key(&pos)
    }
}

// ============================================================================
// DISK
// ============================================================================

/// One `x.y.z.map` file per submap under a directory.
#[derive(Debug, Clone)]
pub struct DiskMapBuffer {
    root: PathBuf,
}

impl DiskMapBuffer {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MapBufferError> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    fn path(&self, pos: Tripoint) -> PathBuf {
        self.root.join(format!("{}.{}.{}.map", pos.x, pos.y, pos.z))
    }
}

impl MapBuffer for DiskMapBuffer {
    fn save(&mut self, pos: Tripoint, submap: &Submap) -> Result<(), MapBufferError> {
        let writer = BufWriter::new(File::create(self.path(pos))?);
        bincode::serialize_into(writer, submap).map_err(|source| MapBufferError::Encode { pos, source })
    }

    fn load(&mut self, pos: Tripoint) -> Result<Option<Submap>, MapBufferError> {
        let path = self.path(pos);
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        let submap: Submap = bincode::deserialize_from(reader).map_err(|e| MapBufferError::Corrupt {
            pos,
            reason: e.to_string(),
        })?;
        submap
            .validate()
            .map_err(|reason| MapBufferError::Corrupt { pos, reason })?;
        Ok(Some(submap))
    }

    fn contains(&self, pos: Tripoint) -> bool {
        self.path(pos).exists()
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Load-or-generate access to submaps outside the live window.
pub struct SubmapLoader<'a> {
    buffer: &'a mut dyn MapBuffer,
    generator: &'a mut dyn MapGenerator,
    overmap: &'a dyn OvermapBuffer,
    registry: &'a Registry,
}

impl<'a> SubmapLoader<'a> {
    pub fn new(
        buffer: &'a mut dyn MapBuffer,
        generator: &'a mut dyn MapGenerator,
        overmap: &'a dyn OvermapBuffer,
        registry: &'a Registry,
    ) -> Self {
        Self {
            buffer,
            generator,
            overmap,
            registry,
        }
    }

    /// The submap at `pos`: from the store when it has a good copy,
    /// generated from the overmap terrain otherwise.
    pub fn fetch(&mut self, pos: Tripoint) -> Box<Submap> {
        match self.buffer.load(pos) {
            Ok(Some(submap)) => return Box::new(submap),
            Ok(None) => {}
            Err(e) => log::warn!("regenerating submap {pos:?}: {e}"),
        }
        let oter = self.overmap.ter(submap_to_omt(pos));
        Box::new(self.generator.generate(pos, &oter, self.registry))
    }

    /// Write a submap back. Failures are logged; the submap will be
    /// regenerated next time it's needed.
    pub fn store(&mut self, pos: Tripoint, submap: &Submap) {
        if let Err(e) = self.buffer.save(pos, submap) {
            log::warn!("failed to save submap {pos:?}: {e}");
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::map::mapgen::TerrainMapgen;
    use crate::overmap::MemoryOvermap;
    use crate::registry::FieldTypeId;
    use ashfall_logic::calendar::TimeSpan;
    use ashfall_logic::coords::Point;

    fn sample(reg: &Registry) -> Submap {
        let mut sm = Submap::new(reg.ter_id("t_dirt"));
        sm.set_ter(Point::new(3, 4), reg.ter_id("t_wall"));
        sm.add_item(Point::new(1, 1), Item::new("rock"));
        sm.add_field(Point::new(5, 5), FieldTypeId::Smoke, 2, TimeSpan::seconds(7));
        sm.set_graffiti(Point::new(0, 0), "Ashfall was here");
        sm
    }

    #[test]
    fn memory_round_trip_is_exact() {
        let reg = Registry::builtin();
        let mut buf = MemoryMapBuffer::new();
        let pos = Tripoint::new(-3, 7, 0);
        let sm = sample(&reg);
        buf.save(pos, &sm).unwrap();
        assert!(buf.contains(pos));
        assert_eq!(buf.load(pos).unwrap(), Some(sm));
        assert_eq!(buf.load(Tripoint::new(0, 0, 0)).unwrap(), None);
    }

    #[test]
    fn garbage_is_corrupt_not_wrong() {
        let mut buf = MemoryMapBuffer::new();
        let pos = Tripoint::new(1, 1, 0);
        buf.insert_raw(pos, vec![0xff; 9]);
        assert!(matches!(buf.load(pos), Err(MapBufferError::Corrupt { .. })));
    }

    #[test]
    fn loader_regenerates_corrupt_submaps() {
        let reg = Registry::builtin();
        let mut buf = MemoryMapBuffer::new();
        let mut gen = TerrainMapgen::new(1);
        let mut om = MemoryOvermap::default();
        om.ter_set(Tripoint::new(0, 0, 0), "road");
        let pos = Tripoint::new(1, 0, 0);
        buf.insert_raw(pos, vec![1, 2, 3]);

        let mut loader = SubmapLoader::new(&mut buf, &mut gen, &om, &reg);
        let sm = loader.fetch(pos);
        assert_eq!(sm.ter(Point::new(6, 6)), reg.ter_id("t_pavement"));
    }

    #[test]
    fn disk_round_trip() {
        let reg = Registry::builtin();
        let dir = std::env::temp_dir().join(format!("ashfall-mapbuffer-{}", std::process::id()));
        let mut buf = DiskMapBuffer::new(&dir).unwrap();
        let pos = Tripoint::new(2, -5, 0);
        let sm = sample(&reg);
        buf.save(pos, &sm).unwrap();
        assert!(buf.contains(pos));
        assert_eq!(buf.load(pos).unwrap(), Some(sm));
        assert_eq!(buf.load(Tripoint::new(9, 9, 0)).unwrap(), None);
        let _ = fs::remove_dir_all(dir);
    }
}
