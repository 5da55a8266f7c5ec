use citygrid_common::{BuildingTier, TerrainKind, TileCoord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::config::CityConfig;
use crate::growth::advance;
use crate::snapshot::CitySnapshot;

/// Identity of one city instance. A recreated city gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityId(pub Uuid);

impl CityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from building or editing a city.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CityError {
    #[error("grid size must be positive, got {0}")]
    InvalidSize(u32),
    #[error("growth probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("tile {coord} is outside a {size}x{size} grid")]
    OutOfBounds { coord: TileCoord, size: u32 },
    #[error("event log does not start with a creation record")]
    MissingCreation,
    #[error("event log holds a second creation record at position {0}")]
    DuplicateCreation(usize),
}

/// One cell of the city grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub coord: TileCoord,
    pub terrain: TerrainKind,
    pub building: Option<BuildingTier>,
}

/// An event record produced by every mutation to the city.
#[derive(Debug, Clone, PartialEq)]
pub enum CityEvent {
    /// City was created with the given parameters.
    Created {
        id: CityId,
        size: u32,
        growth_probability: f64,
        seed: u64,
    },
    /// A tile's building grew one tier during a tick.
    TierAdvanced {
        coord: TileCoord,
        from: Option<BuildingTier>,
        to: BuildingTier,
    },
    /// A building was cleared from outside the simulation.
    Demolished { coord: TileCoord, tier: BuildingTier },
    /// Simulation advanced one tick; `advanced` tiles grew.
    Ticked { tick: u64, advanced: usize },
}

/// The authoritative city state.
///
/// Tiles are stored column-major (`x` outer, `y` inner) and mutate only
/// through `tick()` or an explicit `demolish()`. The random source is seeded
/// per city, so the same seed and sequence of operations produce identical
/// tile states.
#[derive(Debug, Clone)]
pub struct City {
    id: CityId,
    size: u32,
    growth_probability: f64,
    seed: u64,
    tick: u64,
    tiles: Vec<Tile>,
    rng: ChaCha8Rng,
    /// Append-only event log of all mutations.
    event_log: Vec<CityEvent>,
}

impl City {
    /// Build a `size × size` grass grid with default growth parameters.
    pub fn new(size: u32) -> Result<Self, CityError> {
        Self::from_config(&CityConfig {
            size,
            ..CityConfig::default()
        })
    }

    /// Build a city from a validated config.
    pub fn from_config(config: &CityConfig) -> Result<Self, CityError> {
        config.validate()?;
        let id = CityId::new();
        let size = config.size;
        let tiles = (0..size)
            .flat_map(|x| (0..size).map(move |y| TileCoord::new(x, y)))
            .map(|coord| Tile {
                coord,
                terrain: TerrainKind::Grass,
                building: None,
            })
            .collect();

        tracing::info!(city = ?id.0, size, seed = config.seed, "city created");

        Ok(Self {
            id,
            size,
            growth_probability: config.growth_probability,
            seed: config.seed,
            tick: 0,
            tiles,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            event_log: vec![CityEvent::Created {
                id,
                size,
                growth_probability: config.growth_probability,
                seed: config.seed,
            }],
        })
    }

    pub fn id(&self) -> CityId {
        self.id
    }

    /// Side length of the grid.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Current simulation tick.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Seed the city's random source started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn growth_probability(&self) -> f64 {
        self.growth_probability
    }

    /// Number of tiles in the grid.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Read-only access to all tiles, column-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).map(|i| &self.tiles[i])
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<CityEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[CityEvent] {
        &self.event_log
    }

    /// Advance the simulation one tick using the city's own random source.
    ///
    /// Returns how many tiles grew.
    pub fn tick(&mut self) -> usize {
        let Self {
            tiles,
            rng,
            event_log,
            growth_probability,
            ..
        } = &mut *self;
        let advanced = grow_tiles(tiles, *growth_probability, rng, event_log);
        self.finish_tick(advanced)
    }

    /// Advance one tick drawing samples from `rng` instead of the city's own.
    pub fn tick_with<R: Rng>(&mut self, rng: &mut R) -> usize {
        let advanced = grow_tiles(
            &mut self.tiles,
            self.growth_probability,
            rng,
            &mut self.event_log,
        );
        self.finish_tick(advanced)
    }

    fn finish_tick(&mut self, advanced: usize) -> usize {
        self.tick += 1;
        self.event_log.push(CityEvent::Ticked {
            tick: self.tick,
            advanced,
        });
        tracing::debug!(tick = self.tick, advanced, "city ticked");
        advanced
    }

    /// Clear the building on `coord`. Returns the tier that was removed.
    ///
    /// The tile restarts from absent on later ticks.
    pub fn demolish(&mut self, coord: TileCoord) -> Result<Option<BuildingTier>, CityError> {
        let removed = self.tile_mut(coord)?.building.take();
        if let Some(tier) = removed {
            self.event_log.push(CityEvent::Demolished { coord, tier });
            tracing::debug!(%coord, %tier, "building demolished");
        }
        Ok(removed)
    }

    /// Owned, immutable copy of the current grid state.
    pub fn snapshot(&self) -> CitySnapshot {
        CitySnapshot::new(self.id, self.tick, self.size, self.tiles.clone())
    }

    /// Rebuild a city from its event log.
    ///
    /// Tile states, tick and identity are restored. The random source is
    /// reseeded from the creation event, so it does not continue the original
    /// stream. The log must open with its only `Created` record, and every
    /// coordinate must lie inside the created grid.
    pub fn replay(events: &[CityEvent]) -> Result<Self, CityError> {
        let Some(&CityEvent::Created {
            id,
            size,
            growth_probability,
            seed,
        }) = events.first()
        else {
            return Err(CityError::MissingCreation);
        };
        let mut city = Self::from_config(&CityConfig {
            size,
            growth_probability,
            seed,
            ..CityConfig::default()
        })?;
        city.id = id;
        city.event_log = events.to_vec();

        for (pos, event) in events.iter().enumerate().skip(1) {
            match *event {
                CityEvent::Created { .. } => return Err(CityError::DuplicateCreation(pos)),
                CityEvent::TierAdvanced { coord, to, .. } => {
                    city.tile_mut(coord)?.building = Some(to);
                }
                CityEvent::Demolished { coord, .. } => {
                    city.tile_mut(coord)?.building = None;
                }
                CityEvent::Ticked { tick, .. } => {
                    city.tick = tick;
                }
            }
        }
        Ok(city)
    }

    /// Deterministic hash of tick, size and every tile's state.
    ///
    /// The city id is left out so that two cities built from the same seed
    /// compare equal.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.size.to_le_bytes());
        for tile in &self.tiles {
            mix(&mut h, &tile.coord.x.to_le_bytes());
            mix(&mut h, &tile.coord.y.to_le_bytes());
            mix(&mut h, &[tile.building.map_or(0, BuildingTier::level)]);
        }
        h
    }

    fn index_of(&self, coord: TileCoord) -> Option<usize> {
        (coord.x < self.size && coord.y < self.size)
            .then(|| coord.x as usize * self.size as usize + coord.y as usize)
    }

    fn tile_mut(&mut self, coord: TileCoord) -> Result<&mut Tile, CityError> {
        let size = self.size;
        self.index_of(coord)
            .and_then(|i| self.tiles.get_mut(i))
            .ok_or(CityError::OutOfBounds { coord, size })
    }
}

/// One growth draw per tile. Each tile's outcome depends only on its own
/// tier and its own sample.
fn grow_tiles<R: Rng>(
    tiles: &mut [Tile],
    probability: f64,
    rng: &mut R,
    events: &mut Vec<CityEvent>,
) -> usize {
    let mut advanced = 0;
    for tile in tiles.iter_mut() {
        let sample: f64 = rng.gen_range(0.0..1.0);
        let next = advance(tile.building, sample, probability);
        if next != tile.building {
            if let Some(to) = next {
                events.push(CityEvent::TierAdvanced {
                    coord: tile.coord,
                    from: tile.building,
                    to,
                });
            }
            tile.building = next;
            advanced += 1;
        }
    }
    advanced
}
