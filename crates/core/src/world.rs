//! Active floor: tile grid plus the entity arena and its containers.
//! This module exists so every ownership transfer goes through one place.
//! It does not own action rules or AI; those call in through the container operations.

use std::hash::Hasher;

use slotmap::SlotMap;
use xxhash_rust::xxh3::Xxh3;

use crate::entity::{Actor, Body, Container, Entity};
use crate::error::SessionError;
use crate::map::GameMap;
use crate::types::{EntityId, Pos, RenderTier, Rgb};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderEntity {
    pub id: EntityId,
    pub pos: Pos,
    pub glyph: char,
    pub color: Rgb,
    pub tier: RenderTier,
}

#[derive(Clone, Debug)]
pub struct World {
    pub map: GameMap,
    pub floor_index: u32,
    /// Player spawn cell chosen by the generator.
    pub entry: Pos,
    pub room_count: usize,
    entities: SlotMap<EntityId, Entity>,
    /// Entities on the grid, in insertion order.
    placed: Vec<EntityId>,
}

impl World {
    pub fn new(map: GameMap, floor_index: u32) -> Self {
        Self {
            map,
            floor_index,
            entry: Pos { y: 0, x: 0 },
            room_count: 0,
            entities: SlotMap::with_key(),
            placed: Vec::new(),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.entities.get(id).and_then(Entity::actor)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.entities.get_mut(id).and_then(Entity::actor_mut)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Every entity in the arena, placed or held.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities on the grid in insertion order.
    pub fn placed(&self) -> impl Iterator<Item = &Entity> {
        self.placed.iter().filter_map(|&id| self.entities.get(id))
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        self.map.in_bounds(pos)
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.map.is_walkable(pos)
    }

    pub fn blocking_entity_at(&self, pos: Pos) -> Option<EntityId> {
        self.placed().find(|entity| entity.blocks_movement && entity.pos == pos).map(|e| e.id)
    }

    pub fn actor_at(&self, pos: Pos) -> Option<EntityId> {
        self.placed().find(|entity| entity.is_alive_actor() && entity.pos == pos).map(|e| e.id)
    }

    pub fn living_actors(&self) -> Vec<EntityId> {
        self.placed().filter(|entity| entity.is_alive_actor()).map(|entity| entity.id).collect()
    }

    pub fn items_at(&self, pos: Pos) -> Vec<EntityId> {
        self.placed()
            .filter(|entity| entity.item().is_some() && entity.pos == pos)
            .map(|entity| entity.id)
            .collect()
    }

    /// Puts a fresh entity on the grid. Refused when it would share a cell with another blocker.
    pub fn place_new(&mut self, mut entity: Entity, pos: Pos) -> Option<EntityId> {
        let occupied = entity.blocks_movement && self.blocking_entity_at(pos).is_some();
        if !self.in_bounds(pos) || occupied {
            return None;
        }
        entity.pos = pos;
        entity.container = Container::World;
        let id = self.entities.insert(entity);
        self.entities[id].id = id;
        self.placed.push(id);
        Some(id)
    }

    /// Inserts a decoded entity as-is. Handle fields are re-linked by the caller.
    pub(crate) fn restore(&mut self, entity: Entity) -> EntityId {
        let on_map = entity.is_on_map();
        let id = self.entities.insert(entity);
        self.entities[id].id = id;
        if on_map {
            self.placed.push(id);
        }
        id
    }

    /// Puts a fresh item straight into an actor's inventory.
    pub fn give_new(
        &mut self,
        mut entity: Entity,
        holder: EntityId,
    ) -> Result<EntityId, SessionError> {
        if self.actor(holder).is_none_or(|actor| actor.inventory.is_full()) {
            return Err(SessionError::invariant(format!("{holder:?} cannot hold more items")));
        }
        entity.container = Container::Inventory(holder);
        let id = self.entities.insert(entity);
        self.entities[id].id = id;
        if let Some(actor) = self.actor_mut(holder) {
            actor.inventory.items.push(id);
        }
        Ok(id)
    }

    pub(crate) fn translate(&mut self, id: EntityId, dx: i32, dy: i32) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.pos = entity.pos.offset(dx, dy);
        }
    }

    /// World -> inventory. Capacity is the caller's precondition.
    pub fn move_to_inventory(
        &mut self,
        item: EntityId,
        holder: EntityId,
    ) -> Result<(), SessionError> {
        let on_map = self.entities.get(item).is_some_and(Entity::is_on_map);
        if !on_map || self.actor(holder).is_none() {
            return Err(SessionError::invariant(format!(
                "cannot move {item:?} into the inventory of {holder:?}"
            )));
        }
        self.placed.retain(|&placed| placed != item);
        if let Some(actor) = self.actor_mut(holder) {
            actor.inventory.items.push(item);
        }
        self.entities[item].container = Container::Inventory(holder);
        Ok(())
    }

    /// Inventory -> world at `pos`. Unequips first.
    pub fn move_to_world(&mut self, item: EntityId, pos: Pos) -> Result<(), SessionError> {
        let Some(Container::Inventory(holder)) = self.entities.get(item).map(|e| e.container)
        else {
            return Err(SessionError::invariant(format!("{item:?} is not held")));
        };
        let Some(actor) = self.actor_mut(holder) else {
            return Err(SessionError::invariant(format!("holder {holder:?} is missing")));
        };
        actor.equipment.clear(item);
        actor.inventory.remove(item);
        self.placed.push(item);
        let entity = &mut self.entities[item];
        entity.pos = pos;
        entity.container = Container::World;
        Ok(())
    }

    /// Drops a spent item from its container and the arena.
    pub fn remove_consumed(&mut self, item: EntityId) -> Result<(), SessionError> {
        let Some(container) = self.entities.get(item).map(|e| e.container) else {
            return Err(SessionError::invariant(format!("{item:?} already removed")));
        };
        match container {
            Container::World => self.placed.retain(|&placed| placed != item),
            Container::Inventory(holder) => {
                if let Some(actor) = self.actor_mut(holder) {
                    actor.equipment.clear(item);
                    actor.inventory.remove(item);
                }
            }
        }
        self.entities.remove(item);
        Ok(())
    }

    /// Moves an actor and everything it holds out of `from` and onto this grid at `pos`.
    /// Handles are reissued, so the returned id replaces the old one.
    pub fn adopt_actor(
        &mut self,
        from: &mut World,
        actor_id: EntityId,
        pos: Pos,
    ) -> Result<EntityId, SessionError> {
        let Some(moving) = from.entities.get(actor_id) else {
            return Err(SessionError::invariant(format!("{actor_id:?} missing from old floor")));
        };
        if moving.blocks_movement && self.blocking_entity_at(pos).is_some() {
            return Err(SessionError::invariant(format!("spawn cell {pos:?} is occupied")));
        }
        let held = moving.actor().map(|actor| actor.inventory.items.clone()).unwrap_or_default();
        if let Some(missing) = held.iter().find(|&&item| !from.entities.contains_key(item)) {
            return Err(SessionError::invariant(format!("held item {missing:?} is missing")));
        }

        // The old floor is left untouched unless the move goes through.
        let Some(mut entity) = from.entities.remove(actor_id) else {
            return Err(SessionError::invariant(format!("{actor_id:?} missing from old floor")));
        };
        from.placed.retain(|&placed| placed != actor_id);

        entity.pos = pos;
        entity.container = Container::World;
        let new_id = self.entities.insert(entity);
        self.entities[new_id].id = new_id;
        self.placed.push(new_id);

        let mut inventory = Vec::with_capacity(held.len());
        let mut remap = Vec::with_capacity(held.len());
        for old_item in held {
            let Some(mut item) = from.entities.remove(old_item) else {
                return Err(SessionError::invariant(format!("held item {old_item:?} is missing")));
            };
            item.container = Container::Inventory(new_id);
            let new_item = self.entities.insert(item);
            self.entities[new_item].id = new_item;
            inventory.push(new_item);
            remap.push((old_item, new_item));
        }

        let lookup = |old: Option<EntityId>| {
            old.and_then(|old| remap.iter().find(|(from, _)| *from == old).map(|(_, to)| *to))
        };
        if let Some(actor) = self.actor_mut(new_id) {
            actor.inventory.items = inventory;
            actor.equipment.weapon = lookup(actor.equipment.weapon);
            actor.equipment.armor = lookup(actor.equipment.armor);
        }
        Ok(new_id)
    }

    /// Visible grid entities sorted back-to-front by render tier.
    pub fn render_entities(&self) -> Vec<RenderEntity> {
        let mut visible: Vec<RenderEntity> = self
            .placed()
            .filter(|entity| self.map.is_visible(entity.pos))
            .map(|entity| RenderEntity {
                id: entity.id,
                pos: entity.pos,
                glyph: entity.glyph,
                color: entity.color,
                tier: entity.tier,
            })
            .collect();
        visible.sort_by_key(|entity| entity.tier);
        visible
    }

    /// Checks the ownership, occupancy, and stat invariants.
    pub fn validate(&self) -> Result<(), SessionError> {
        let mut blockers: Vec<Pos> = Vec::new();
        for &id in &self.placed {
            let Some(entity) = self.entities.get(id) else {
                return Err(SessionError::invariant(format!("placed {id:?} is not in the arena")));
            };
            if entity.container != Container::World {
                return Err(SessionError::invariant(format!("{} is placed but held", entity.name)));
            }
            if !self.in_bounds(entity.pos) {
                return Err(SessionError::invariant(format!("{} is out of bounds", entity.name)));
            }
            if entity.blocks_movement {
                if blockers.contains(&entity.pos) {
                    return Err(SessionError::invariant(format!(
                        "two blockers share {:?}",
                        entity.pos
                    )));
                }
                blockers.push(entity.pos);
            }
        }

        for (id, entity) in &self.entities {
            if entity.id != id {
                return Err(SessionError::invariant(format!("{} has a stale id", entity.name)));
            }
            match entity.container {
                Container::World if !self.placed.contains(&id) => {
                    return Err(SessionError::invariant(format!(
                        "{} claims the grid but is not placed",
                        entity.name
                    )));
                }
                Container::Inventory(holder) => {
                    let held = self.actor(holder).is_some_and(|a| a.inventory.contains(id));
                    if !held || self.placed.contains(&id) {
                        return Err(SessionError::invariant(format!(
                            "{} has a broken inventory link",
                            entity.name
                        )));
                    }
                }
                Container::World => {}
            }

            let Body::Actor(actor) = &entity.body else {
                continue;
            };
            let hp = actor.fighter.hp();
            if hp < 0 || hp > actor.fighter.max_hp {
                return Err(SessionError::invariant(format!("{} has hp {hp}", entity.name)));
            }
            if actor.inventory.items.len() > actor.inventory.capacity {
                return Err(SessionError::invariant(format!("{} is over capacity", entity.name)));
            }
            for held in &actor.inventory.items {
                let back = self.entities.get(*held).map(|item| item.container);
                if back != Some(Container::Inventory(id)) {
                    return Err(SessionError::invariant(format!(
                        "{} holds {held:?} without a back-reference",
                        entity.name
                    )));
                }
            }
            for equipped in actor.equipment.equipped() {
                if !actor.inventory.contains(equipped) {
                    return Err(SessionError::invariant(format!(
                        "{} equips an item it does not hold",
                        entity.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stable digest of terrain and entity placement, for regression tests.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.map.width as u64);
        hasher.write_u64(self.map.height as u64);
        for tile in &self.map.tiles {
            hasher.write_u8(u8::from(tile.walkable()));
        }
        hasher.write_i32(self.map.downstairs.x);
        hasher.write_i32(self.map.downstairs.y);
        for entity in self.placed() {
            hasher.write(entity.name.as_bytes());
            hasher.write_i32(entity.pos.x);
            hasher.write_i32(entity.pos.y);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Prototypes, keys};
    use crate::map::TileKind;

    fn open_world() -> World {
        let mut map = GameMap::new(8, 8);
        for y in 1..7 {
            for x in 1..7 {
                map.set_tile(Pos::new(x, y), TileKind::Floor);
            }
        }
        World::new(map, 1)
    }

    #[test]
    fn placement_refuses_a_second_blocker_on_one_cell() {
        let prototypes = Prototypes::standard();
        let mut world = open_world();
        let first = prototypes.spawn(keys::ORC, &mut world, Pos::new(2, 2));
        let second = prototypes.spawn(keys::TROLL, &mut world, Pos::new(2, 2));
        let potion = prototypes.spawn(keys::HEALTH_POTION, &mut world, Pos::new(2, 2));

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(potion.is_some(), "items do not block and may share a cell");
        assert_eq!(world.blocking_entity_at(Pos::new(2, 2)), first);
    }

    #[test]
    fn living_actors_follow_insertion_order() {
        let prototypes = Prototypes::standard();
        let mut world = open_world();
        let a = prototypes.spawn(keys::TROLL, &mut world, Pos::new(5, 5)).expect("troll");
        prototypes.spawn(keys::HEALTH_POTION, &mut world, Pos::new(1, 1)).expect("potion");
        let b = prototypes.spawn(keys::ORC, &mut world, Pos::new(1, 2)).expect("orc");
        let c = prototypes.spawn(keys::ORC, &mut world, Pos::new(3, 3)).expect("orc");

        world.actor_mut(b).expect("orc").ai = None;

        assert_eq!(world.living_actors(), vec![a, c]);
        assert_eq!(world.actor_at(Pos::new(1, 2)), None);
    }

    #[test]
    fn inventory_round_trip_keeps_containers_exclusive() {
        let prototypes = Prototypes::standard();
        let mut world = open_world();
        let player = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(3, 3)).expect("player");
        let dagger = prototypes.spawn(keys::DAGGER, &mut world, Pos::new(3, 3)).expect("dagger");

        world.move_to_inventory(dagger, player).expect("pick up");
        assert!(world.items_at(Pos::new(3, 3)).is_empty());
        assert_eq!(world.get(dagger).map(|e| e.container), Some(Container::Inventory(player)));
        world.validate().expect("valid after pickup");

        world.translate(player, 1, 0);
        world.move_to_world(dagger, Pos::new(4, 3)).expect("drop");
        assert_eq!(world.items_at(Pos::new(4, 3)), vec![dagger]);
        assert!(world.actor(player).expect("player").inventory.items.is_empty());
        world.validate().expect("valid after drop");
    }

    #[test]
    fn adopting_an_actor_remaps_held_and_equipped_items() {
        let prototypes = Prototypes::standard();
        let mut old = open_world();
        let player = prototypes.spawn(keys::PLAYER, &mut old, Pos::new(3, 3)).expect("player");
        let dagger = prototypes.give(keys::DAGGER, &mut old, player).expect("dagger");
        let potion = prototypes.give(keys::HEALTH_POTION, &mut old, player).expect("potion");
        old.actor_mut(player).expect("player").equipment.weapon = Some(dagger);
        prototypes.spawn(keys::ORC, &mut old, Pos::new(5, 5)).expect("orc");

        let mut fresh = open_world();
        let adopted = fresh.adopt_actor(&mut old, player, Pos::new(2, 2)).expect("adopt");

        let actor = fresh.actor(adopted).expect("adopted actor");
        assert_eq!(actor.inventory.items.len(), 2);
        let weapon = actor.equipment.weapon.expect("weapon survives descent");
        assert_eq!(fresh.get(weapon).map(|e| e.name.as_str()), Some("Dagger"));
        assert!(old.get(dagger).is_none() && old.get(potion).is_none());
        assert_eq!(old.entity_count(), 1, "only the orc stays behind");
        fresh.validate().expect("adopted world is valid");
    }

    #[test]
    fn adopting_onto_an_occupied_cell_leaves_the_old_floor_intact() {
        let prototypes = Prototypes::standard();
        let mut old = open_world();
        let player = prototypes.spawn(keys::PLAYER, &mut old, Pos::new(3, 3)).expect("player");
        let potion = prototypes.give(keys::HEALTH_POTION, &mut old, player).expect("potion");

        let mut fresh = open_world();
        prototypes.spawn(keys::ORC, &mut fresh, Pos::new(2, 2)).expect("blocker");

        assert!(fresh.adopt_actor(&mut old, player, Pos::new(2, 2)).is_err());
        assert_eq!(old.get(player).map(|e| e.pos), Some(Pos::new(3, 3)));
        assert!(old.placed().any(|e| e.id == player));
        assert_eq!(old.actor(player).map(|a| a.inventory.items.clone()), Some(vec![potion]));
        assert_eq!(fresh.entity_count(), 1);
        old.validate().expect("old floor is still valid");
    }

    #[test]
    fn render_list_is_sorted_by_tier_and_filtered_by_visibility() {
        let prototypes = Prototypes::standard();
        let mut world = open_world();
        let orc = prototypes.spawn(keys::ORC, &mut world, Pos::new(2, 2)).expect("orc");
        let potion = prototypes.spawn(keys::HEALTH_POTION, &mut world, Pos::new(2, 2)).expect("p");
        prototypes.spawn(keys::TROLL, &mut world, Pos::new(6, 6)).expect("troll");
        let mut visible = vec![false; 64];
        visible[2 * 8 + 2] = true;
        world.map.apply_visibility(visible);

        let ids: Vec<EntityId> = world.render_entities().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![potion, orc]);
    }

    #[test]
    fn consumed_items_leave_the_arena() {
        let prototypes = Prototypes::standard();
        let mut world = open_world();
        let player = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(3, 3)).expect("player");
        let potion = prototypes.give(keys::HEALTH_POTION, &mut world, player).expect("potion");

        world.remove_consumed(potion).expect("consume");
        assert!(world.get(potion).is_none());
        assert!(world.actor(player).expect("player").inventory.items.is_empty());
        assert!(world.remove_consumed(potion).is_err());
    }
}
