use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::city::CityError;
use crate::growth::DEFAULT_GROWTH_PROBABILITY;

/// Errors from loading a city configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] CityError),
}

/// Parameters for building and driving a city.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    /// Side length of the square grid.
    pub size: u32,
    /// Chance per tile per tick that its building grows one tier.
    pub growth_probability: f64,
    /// Seed for the city's random source.
    pub seed: u64,
    /// Real-time period between simulation steps when paced by a driver.
    pub tick_interval_ms: u64,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            size: 8,
            growth_probability: DEFAULT_GROWTH_PROBABILITY,
            seed: 42,
            tick_interval_ms: 1000,
        }
    }
}

impl CityConfig {
    /// Reject configurations a city cannot be built from.
    pub fn validate(&self) -> Result<(), CityError> {
        if self.size == 0 {
            return Err(CityError::InvalidSize(self.size));
        }
        if !(0.0..=1.0).contains(&self.growth_probability) {
            return Err(CityError::InvalidProbability(self.growth_probability));
        }
        Ok(())
    }

    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}
