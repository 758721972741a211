//! Action resolver: validates an intent, then applies it.
//! This module exists so player input and AI decisions go through the same rules.
//! Every branch checks all of its preconditions before the first mutation, so a rejected
//! action leaves the world untouched. It does not own turn order; see `session`.

mod items;

use crate::combat;
use crate::entity::Entity;
use crate::error::{ActionError, Impossible, SessionError};
use crate::message_log::MessageLog;
use crate::types::{EntityId, Pos, palette};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Move { dx: i32, dy: i32 },
    Bump { dx: i32, dy: i32 },
    Melee { dx: i32, dy: i32 },
    PickUp,
    UseItem { item: EntityId, target: Option<Pos> },
    DropItem { item: EntityId },
    Equip { item: EntityId },
    Wait,
    TakeStairs,
    Escape,
}

/// What the session must do after a successful resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved {
    Acted,
    Descend,
    Exit,
}

pub fn perform(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    action: Action,
) -> Result<Resolved, ActionError> {
    let Some(origin) = world.get(actor).filter(|e| e.actor().is_some()).map(|e| e.pos) else {
        let message = format!("acting entity {actor:?} is not an actor");
        return Err(SessionError::invariant(message).into());
    };
    tracing::debug!(?actor, ?action, "resolving action");

    match action {
        Action::Move { dx, dy } => {
            move_actor(world, actor, origin, dx, dy);
            Ok(Resolved::Acted)
        }
        Action::Bump { dx, dy } => {
            let destination = origin.offset(dx, dy);
            if world.actor_at(destination).is_some_and(|target| target != actor) {
                melee(world, log, actor, destination)
            } else {
                move_actor(world, actor, origin, dx, dy);
                Ok(Resolved::Acted)
            }
        }
        Action::Melee { dx, dy } => melee(world, log, actor, origin.offset(dx, dy)),
        Action::PickUp => pick_up(world, log, actor, origin),
        Action::UseItem { item, target } => items::use_item(world, log, actor, item, target),
        Action::DropItem { item } => drop_item(world, log, actor, origin, item),
        Action::Equip { item } => toggle_equip(world, log, actor, item),
        Action::Wait => Ok(Resolved::Acted),
        Action::TakeStairs => {
            if origin != world.map.downstairs {
                return Err(Impossible::NoStairs.into());
            }
            Ok(Resolved::Descend)
        }
        Action::Escape => Ok(Resolved::Exit),
    }
}

/// Blocked moves leave the actor where it is without raising.
fn move_actor(world: &mut World, actor: EntityId, origin: Pos, dx: i32, dy: i32) -> bool {
    let destination = origin.offset(dx, dy);
    if !world.in_bounds(destination)
        || !world.is_walkable(destination)
        || world.blocking_entity_at(destination).is_some()
    {
        return false;
    }
    world.translate(actor, dx, dy);
    true
}

fn melee(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    destination: Pos,
) -> Result<Resolved, ActionError> {
    let Some(target) = world.actor_at(destination).filter(|&target| target != actor) else {
        return Err(Impossible::NothingToAttack.into());
    };
    combat::attack(world, log, actor, target)?;
    Ok(Resolved::Acted)
}

fn pick_up(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    origin: Pos,
) -> Result<Resolved, ActionError> {
    let Some(&item) = world.items_at(origin).first() else {
        return Err(Impossible::NothingToPickUp.into());
    };
    if world.actor(actor).is_none_or(|held| held.inventory.is_full()) {
        return Err(Impossible::InventoryFull.into());
    }
    world.move_to_inventory(item, actor)?;
    log.add(format!("You picked up the {}!", item_name(world, item)), palette::WHITE);
    Ok(Resolved::Acted)
}

fn drop_item(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    origin: Pos,
    item: EntityId,
) -> Result<Resolved, ActionError> {
    ensure_carried(world, actor, item)?;
    if world.actor(actor).is_some_and(|held| held.equipment.is_equipped(item)) {
        log.add(format!("You remove the {}.", item_name(world, item)), palette::WHITE);
    }
    world.move_to_world(item, origin)?;
    log.add(format!("You dropped the {}.", item_name(world, item)), palette::WHITE);
    Ok(Resolved::Acted)
}

fn toggle_equip(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    item: EntityId,
) -> Result<Resolved, ActionError> {
    ensure_carried(world, actor, item)?;
    let equippable = world.get(item).and_then(Entity::item).and_then(|i| i.equippable);
    let Some(slot) = equippable.map(|e| e.slot) else {
        return Err(Impossible::NotEquippable.into());
    };
    let name = item_name(world, item);
    let Some(holder) = world.actor(actor) else {
        return Err(SessionError::invariant("equipping actor vanished").into());
    };
    let incumbent = holder.equipment.slot(slot);
    let incumbent_name = incumbent.map(|id| item_name(world, id));

    let Some(holder) = world.actor_mut(actor) else {
        return Err(SessionError::invariant("equipping actor vanished").into());
    };
    if incumbent == Some(item) {
        *holder.equipment.slot_mut(slot) = None;
        log.add(format!("You remove the {name}."), palette::WHITE);
        return Ok(Resolved::Acted);
    }
    *holder.equipment.slot_mut(slot) = Some(item);
    if let Some(previous) = incumbent_name {
        log.add(format!("You remove the {previous}."), palette::WHITE);
    }
    log.add(format!("You equip the {name}."), palette::WHITE);
    Ok(Resolved::Acted)
}

fn ensure_carried(world: &World, actor: EntityId, item: EntityId) -> Result<(), Impossible> {
    if world.actor(actor).is_some_and(|held| held.inventory.contains(item)) {
        Ok(())
    } else {
        Err(Impossible::NotCarried)
    }
}

fn item_name(world: &World, item: EntityId) -> String {
    world.get(item).map(|entity| entity.name.clone()).unwrap_or_default()
}
