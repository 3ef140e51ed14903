//! Game constants — grid dimensions, density caps, camp tuning numbers.
//!
//! Plain `const` values shared by the engine crate and the simtest harness.

/// Tiles per submap along x.
pub const SEEX: i32 = 12;
/// Tiles per submap along y.
pub const SEEY: i32 = 12;
/// Submaps per side of the active map window.
pub const MAPSIZE: i32 = 11;
/// Submaps per side of one overmap tile.
pub const OMT_SUBMAPS: i32 = 2;
/// Tiles per side of one overmap tile.
pub const OMT_TILES: i32 = SEEX * OMT_SUBMAPS;

/// Tiles per side of the whole map window.
pub const MAP_TILES_X: i32 = SEEX * MAPSIZE;
pub const MAP_TILES_Y: i32 = SEEY * MAPSIZE;

/// Field densities run 1..=3.
pub const MAX_FIELD_DENSITY: u8 = 3;

/// Items a single tile will hold before spilling over.
pub const MAX_ITEMS_PER_TILE: usize = 64;

pub mod camp {
    /// Daily ration in kcal, the unit of the faction food ledger.
    pub const KCAL_PER_DAY: i64 = 2500;
    /// Expansions a single camp may own.
    pub const MAX_EXPANSIONS: usize = 8;
    /// Hours a companion must be away before emergency recall unlocks.
    pub const EMERGENCY_RECALL_HOURS: i64 = 24;
    /// Trees left in a forest tile below which it reverts to field.
    pub const FOREST_CLEARED_BELOW: i32 = 5;
    /// Overmap tile id that hide sites are stamped as.
    pub const HIDE_SITE_OTER: &str = "faction_hide_site_0";
}

pub mod salt_pipe {
    /// Half-width of the local grid searched for a pipe route.
    pub const MAX_DISTANCE: i32 = 10;
    /// Longest pipe route, in overmap tiles.
    pub const MAX_LENGTH: usize = 2 * MAX_DISTANCE as usize;
    pub const ORTHOGONAL_COST: f64 = 1.0;
    pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;
    /// Route table markers. Positive values are accumulated path costs.
    pub const LEGAL: f64 = 0.0;
    pub const ILLEGAL: f64 = -0.1;
    pub const SWAMP: f64 = -0.2;
}
