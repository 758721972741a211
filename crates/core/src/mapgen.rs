//! Procedural floor generation split into layout, spawn tables, and seeding.

mod generator;
mod layout;
pub(crate) mod seed;
mod spawns;

pub use generator::MapGenerator;

use crate::config::GeneratorConfig;
use crate::content::Prototypes;
use crate::world::World;

pub fn generate(
    config: &GeneratorConfig,
    floor_index: u32,
    prototypes: &Prototypes,
    session_seed: u64,
) -> World {
    MapGenerator::new(config, prototypes, session_seed).generate(floor_index)
}
