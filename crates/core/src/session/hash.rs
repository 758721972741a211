use std::hash::Hasher;

use xxhash_rust::xxh3::Xxh3;

use super::*;

impl Session {
    /// Digest of everything a replay must reproduce: terrain, placement, vitals, held
    /// items and exploration.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.turn);
        hasher.write_u32(self.world.floor_index);
        hasher.write_u64(self.world.fingerprint());

        for entity in self.world.placed() {
            let Some(actor) = entity.actor() else {
                continue;
            };
            hasher.write_i32(actor.fighter.hp());
            hasher.write_i32(actor.fighter.max_hp);
            hasher.write_u32(actor.level.current_level);
            hasher.write_u32(actor.level.current_xp);
            hasher.write_u8(u8::from(actor.is_alive()));
        }
        if let Some(player) = self.world.actor(self.player) {
            for &item in &player.inventory.items {
                if let Some(entity) = self.world.get(item) {
                    hasher.write(entity.name.as_bytes());
                }
                hasher.write_u8(u8::from(player.equipment.is_equipped(item)));
            }
        }

        let explored = self.world.map.explored.iter().filter(|&&seen| seen).count();
        hasher.write_u64(explored as u64);
        hasher.finish()
    }
}
