//! Session and generator settings.
//! Every field has a default, so a TOML file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Inclusive count range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub map_width: usize,
    pub map_height: usize,
    pub max_rooms: usize,
    pub room_min_size: usize,
    pub room_max_size: usize,
    pub monsters_per_room: CountRange,
    pub items_per_room: CountRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 43,
            max_rooms: 30,
            room_min_size: 6,
            room_max_size: 10,
            monsters_per_room: CountRange { min: 0, max: 2 },
            items_per_room: CountRange { min: 0, max: 2 },
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_min_size == 0 || self.room_min_size > self.room_max_size {
            return Err(ConfigError::Invalid(format!(
                "room sizes must satisfy 0 < min <= max, got {}..={}",
                self.room_min_size, self.room_max_size
            )));
        }
        // Smallest room plus its wall ring must fit.
        if self.room_min_size + 2 > self.map_width || self.room_min_size + 2 > self.map_height {
            return Err(ConfigError::Invalid(format!(
                "a {0}x{0} room does not fit a {1}x{2} map",
                self.room_min_size, self.map_width, self.map_height
            )));
        }
        if self.max_rooms == 0 {
            return Err(ConfigError::Invalid("max_rooms must be at least 1".to_string()));
        }
        for (label, range) in [("monsters", self.monsters_per_room), ("items", self.items_per_room)]
        {
            if range.min > range.max {
                return Err(ConfigError::Invalid(format!(
                    "{label}_per_room min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub fov_radius: u32,
    pub generator: GeneratorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { fov_radius: 8, generator: GeneratorConfig::default() }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fov_radius == 0 {
            return Err(ConfigError::Invalid("fov_radius must be at least 1".to_string()));
        }
        self.generator.validate()
    }
}
