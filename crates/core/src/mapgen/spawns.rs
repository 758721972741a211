//! Depth-scaled spawn tables and per-room population.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use crate::config::{CountRange, GeneratorConfig};
use crate::content::{Prototypes, keys};
use crate::types::Pos;
use crate::world::World;

use super::layout::RoomRect;
use super::seed::roll;

/// `(first floor, extra allowed on top of the configured max)`.
const EXTRA_MONSTERS_BY_FLOOR: [(u32, usize); 3] = [(1, 0), (4, 1), (6, 3)];
const EXTRA_ITEMS_BY_FLOOR: [(u32, usize); 2] = [(1, 0), (4, 1)];

/// `(first floor, prototype, weight)`; later rows override earlier ones for the same key.
const MONSTER_WEIGHTS: [(u32, &str, u32); 4] = [
    (0, keys::ORC, 80),
    (3, keys::TROLL, 15),
    (5, keys::TROLL, 30),
    (7, keys::TROLL, 60),
];
const ITEM_WEIGHTS: [(u32, &str, u32); 6] = [
    (0, keys::HEALTH_POTION, 35),
    (2, keys::CONFUSION_SCROLL, 10),
    (4, keys::LIGHTNING_SCROLL, 25),
    (4, keys::SWORD, 5),
    (6, keys::FIREBALL_SCROLL, 25),
    (6, keys::CHAIN_MAIL, 15),
];

fn max_for_floor(table: &[(u32, usize)], base: usize, floor_index: u32) -> usize {
    let extra = table
        .iter()
        .take_while(|(first_floor, _)| *first_floor <= floor_index)
        .last()
        .map_or(0, |(_, extra)| *extra);
    base + extra
}

/// Weight per prototype available at `floor_index`, in table order.
fn weights_for_floor(
    table: &[(u32, &'static str, u32)],
    floor_index: u32,
) -> Vec<(&'static str, u32)> {
    let mut weights: Vec<(&'static str, u32)> = Vec::new();
    for &(first_floor, key, weight) in table {
        if first_floor > floor_index {
            break;
        }
        match weights.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = weight,
            None => weights.push((key, weight)),
        }
    }
    weights
}

fn weighted_pick(rng: &mut ChaCha8Rng, weights: &[(&'static str, u32)]) -> Option<&'static str> {
    let total: u64 = weights.iter().map(|(_, weight)| u64::from(*weight)).sum();
    if total == 0 {
        return None;
    }
    let mut ticket = rng.next_u64() % total;
    for &(key, weight) in weights {
        let weight = u64::from(weight);
        if ticket < weight {
            return Some(key);
        }
        ticket -= weight;
    }
    None
}

fn count_for_floor(
    rng: &mut ChaCha8Rng,
    range: CountRange,
    table: &[(u32, usize)],
    floor: u32,
) -> usize {
    let max = max_for_floor(table, range.max, floor);
    roll(rng, range.min.min(max), max)
}

/// Fills every room but the first; cells already holding an entity are skipped.
pub(crate) fn populate_rooms(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    rooms: &[RoomRect],
    config: &GeneratorConfig,
    prototypes: &Prototypes,
) {
    let floor = world.floor_index;
    let monster_weights = weights_for_floor(&MONSTER_WEIGHTS, floor);
    let item_weights = weights_for_floor(&ITEM_WEIGHTS, floor);

    for room in rooms.iter().skip(1) {
        let monsters =
            count_for_floor(rng, config.monsters_per_room, &EXTRA_MONSTERS_BY_FLOOR, floor);
        let items = count_for_floor(rng, config.items_per_room, &EXTRA_ITEMS_BY_FLOOR, floor);

        let mut picks = Vec::with_capacity(monsters + items);
        picks.extend((0..monsters).filter_map(|_| weighted_pick(rng, &monster_weights)));
        picks.extend((0..items).filter_map(|_| weighted_pick(rng, &item_weights)));

        for key in picks {
            let x = roll(rng, room.x, room.right()) as i32;
            let y = roll(rng, room.y, room.bottom()) as i32;
            let pos = Pos { y, x };
            if world.placed().any(|entity| entity.pos == pos) {
                continue;
            }
            if prototypes.spawn(key, world, pos).is_none() {
                tracing::warn!(key, ?pos, "spawn refused");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    #[test]
    fn caps_rise_with_depth() {
        assert_eq!(max_for_floor(&EXTRA_MONSTERS_BY_FLOOR, 2, 1), 2);
        assert_eq!(max_for_floor(&EXTRA_MONSTERS_BY_FLOOR, 2, 4), 3);
        assert_eq!(max_for_floor(&EXTRA_MONSTERS_BY_FLOOR, 2, 9), 5);
        assert_eq!(max_for_floor(&EXTRA_ITEMS_BY_FLOOR, 2, 5), 3);
    }

    #[test]
    fn later_rows_override_earlier_weights() {
        assert_eq!(weights_for_floor(&MONSTER_WEIGHTS, 1), vec![(keys::ORC, 80)]);
        let floor_five = weights_for_floor(&MONSTER_WEIGHTS, 5);
        assert_eq!(floor_five, vec![(keys::ORC, 80), (keys::TROLL, 30)]);
        let deep_items = weights_for_floor(&ITEM_WEIGHTS, 6);
        assert_eq!(deep_items.len(), 6);
        assert!(deep_items.contains(&(keys::CHAIN_MAIL, 15)));
    }

    #[test]
    fn weighted_pick_only_returns_listed_keys() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let weights = weights_for_floor(&MONSTER_WEIGHTS, 7);
        for _ in 0..100 {
            let key = weighted_pick(&mut rng, &weights).expect("non-empty table");
            assert!(key == keys::ORC || key == keys::TROLL);
        }
        assert_eq!(weighted_pick(&mut rng, &[]), None);
    }
}
