use glam::{Quat, Vec3};
use std::fmt;

/// Integer coordinate of one tile in the city grid.
///
/// Ordering is column-major (`x` first, then `y`), which is also the order the
/// kernel stores and iterates tiles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stable identifier of a visual, derived from what it depicts and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u64);

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform placing a unit box over `coord`, stretched to `height` and
    /// centred at `elevation` on the vertical axis.
    ///
    /// Grid `x` maps to world X and grid `y` to world Z.
    pub fn for_tile(coord: TileCoord, height: f32, elevation: f32) -> Self {
        Self {
            position: Vec3::new(coord.x as f32, elevation, coord.y as f32),
            rotation: Quat::IDENTITY,
            scale: Vec3::new(1.0, height, 1.0),
        }
    }
}
