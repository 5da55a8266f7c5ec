use citygrid_common::{BuildingTier, TileCoord};
use crate::city::{CityError, CityId, Tile};

/// Read-only copy of a city's tiles at one tick.
///
/// Owns its tile data, so it stays valid and unchanged however the city is
/// stepped afterwards. Only [`City::snapshot`](crate::City::snapshot) builds
/// one, so `tiles` always holds `size × size` entries in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySnapshot {
    city: CityId,
    tick: u64,
    size: u32,
    tiles: Vec<Tile>,
}

impl CitySnapshot {
    pub(crate) fn new(city: CityId, tick: u64, size: u32, tiles: Vec<Tile>) -> Self {
        Self {
            city,
            tick,
            size,
            tiles,
        }
    }

    /// Id of the city this snapshot was taken from.
    pub fn city_id(&self) -> CityId {
        self.city
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// All tiles, column-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).and_then(|i| self.tiles.get(i))
    }

    /// Number of tiles with a building of any tier.
    pub fn building_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.building.is_some()).count()
    }

    /// Number of tiles at exactly `tier`.
    pub fn count_tier(&self, tier: BuildingTier) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.building == Some(tier))
            .count()
    }

    /// Copy of this snapshot with `coord`'s building replaced.
    ///
    /// Lets callers stage a state the simulation would not produce on its own,
    /// such as a building cleared by an outside collaborator.
    pub fn with_building(
        &self,
        coord: TileCoord,
        building: Option<BuildingTier>,
    ) -> Result<Self, CityError> {
        let mut next = self.clone();
        let tile = self
            .index_of(coord)
            .and_then(|i| next.tiles.get_mut(i))
            .ok_or(CityError::OutOfBounds {
                coord,
                size: self.size,
            })?;
        tile.building = building;
        Ok(next)
    }

    fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.size || coord.y >= self.size {
            return None;
        }
        Some(coord.x as usize * self.size as usize + coord.y as usize)
    }
}
