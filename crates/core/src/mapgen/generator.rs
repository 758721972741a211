//! Floor assembly: rooms, corridors, stairs, then population.

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::config::GeneratorConfig;
use crate::content::Prototypes;
use crate::map::GameMap;
use crate::types::Pos;
use crate::world::World;

use super::layout::{RoomRect, carve_room, connect_rooms, place_rooms};
use super::seed::derive_floor_seed;
use super::spawns::populate_rooms;

pub struct MapGenerator<'a> {
    config: &'a GeneratorConfig,
    prototypes: &'a Prototypes,
    session_seed: u64,
}

/// Terrain before population; kept separate so layout properties can be checked directly.
pub(crate) struct FloorPlan {
    pub(crate) map: GameMap,
    pub(crate) rooms: Vec<RoomRect>,
    pub(crate) corridors: BTreeSet<Pos>,
}

impl<'a> MapGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig, prototypes: &'a Prototypes, session_seed: u64) -> Self {
        Self { config, prototypes, session_seed }
    }

    /// A floor with zero rooms comes back all wall; callers check `World::room_count`.
    pub fn generate(&self, floor_index: u32) -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_floor_seed(self.session_seed, floor_index));
        let plan = plan_floor(&mut rng, self.config);

        let corridor_cells = plan.corridors.len();
        let mut world = World::new(plan.map, floor_index);
        world.room_count = plan.rooms.len();
        if let (Some(first), Some(last)) = (plan.rooms.first(), plan.rooms.last()) {
            world.entry = first.center();
            world.map.downstairs = last.center();
        }
        populate_rooms(&mut world, &mut rng, &plan.rooms, self.config, self.prototypes);

        tracing::info!(
            floor_index,
            rooms = world.room_count,
            corridor_cells,
            entities = world.entity_count(),
            "generated floor"
        );
        world
    }
}

pub(crate) fn plan_floor(rng: &mut ChaCha8Rng, config: &GeneratorConfig) -> FloorPlan {
    let mut map = GameMap::new(config.map_width, config.map_height);
    let rooms = place_rooms(rng, config);
    for room in &rooms {
        carve_room(&mut map, room);
    }
    let corridors = connect_rooms(&mut map, rng, &rooms).into_iter().collect();
    FloorPlan { map, rooms, corridors }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;
    use crate::config::CountRange;
    use crate::types::DIRECTIONS;

    fn reachable_from(map: &GameMap, start: Pos) -> BTreeSet<Pos> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            for (dx, dy) in DIRECTIONS {
                let next = pos.offset(dx, dy);
                if map.is_walkable(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            map_width: 40,
            map_height: 30,
            max_rooms: 12,
            room_min_size: 3,
            room_max_size: 7,
            monsters_per_room: CountRange { min: 0, max: 3 },
            items_per_room: CountRange { min: 0, max: 2 },
        }
    }

    proptest! {
        #[test]
        fn rooms_are_walled_except_where_corridors_cross(seed in any::<u64>()) {
            let config = small_config();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let plan = plan_floor(&mut rng, &config);

            prop_assert!(plan.rooms.len() <= config.max_rooms);
            for room in &plan.rooms {
                for cell in room.expanded(1).cells().filter(|&cell| !room.contains(cell)) {
                    if plan.map.is_walkable(cell) {
                        prop_assert!(plan.corridors.contains(&cell), "stray floor at {:?}", cell);
                    }
                }
            }
        }

        #[test]
        fn every_floor_cell_is_reachable_from_the_entry(seed in any::<u64>()) {
            let config = small_config();
            let prototypes = Prototypes::standard();
            let world = MapGenerator::new(&config, &prototypes, seed).generate(1);
            prop_assume!(world.room_count > 0);

            let reachable = reachable_from(&world.map, world.entry);
            prop_assert_eq!(reachable.len(), world.map.floor_count());
            prop_assert!(reachable.contains(&world.map.downstairs));
        }

        #[test]
        fn population_respects_occupancy_and_spares_the_entry_room(
            seed in any::<u64>(),
            floor in 1u32..9,
        ) {
            let config = small_config();
            let prototypes = Prototypes::standard();
            let world = MapGenerator::new(&config, &prototypes, seed).generate(floor);

            prop_assert!(world.validate().is_ok());
            let mut cells = BTreeSet::new();
            for entity in world.placed() {
                prop_assert!(world.is_walkable(entity.pos));
                prop_assert!(cells.insert(entity.pos), "two spawns share {:?}", entity.pos);
                prop_assert_ne!(entity.pos, world.entry);
            }
        }
    }

    #[test]
    fn same_seed_and_floor_reproduce_the_same_world() {
        let config = GeneratorConfig::default();
        let prototypes = Prototypes::standard();
        let generator = MapGenerator::new(&config, &prototypes, 77);

        assert_eq!(generator.generate(2).fingerprint(), generator.generate(2).fingerprint());
        assert_ne!(generator.generate(2).fingerprint(), generator.generate(3).fingerprint());
    }

    #[test]
    fn impossible_rooms_leave_an_all_wall_world() {
        let config = GeneratorConfig { map_width: 6, map_height: 6, ..small_config() };
        let config = GeneratorConfig { room_min_size: 5, room_max_size: 5, ..config };
        let prototypes = Prototypes::standard();
        let world = MapGenerator::new(&config, &prototypes, 1).generate(1);

        assert_eq!(world.room_count, 0);
        assert_eq!(world.map.floor_count(), 0);
        assert_eq!(world.entity_count(), 0);
    }
}
