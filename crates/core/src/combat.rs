//! Damage, death, and experience.
//! This module exists so every source of harm (melee, scrolls) shares one death path.
//! It does not validate targets; callers have already checked them.

use crate::ai::Behavior;
use crate::components::{Equippable, LEVEL_UP_DEFENSE, LEVEL_UP_HP, LEVEL_UP_POWER};
use crate::entity::{Actor, Entity};
use crate::error::SessionError;
use crate::message_log::MessageLog;
use crate::types::{EntityId, RenderTier, palette};
use crate::world::World;

pub const CORPSE_GLYPH: char = '%';

/// Base power plus every equipped bonus.
pub fn power(world: &World, actor: &Actor) -> i32 {
    actor.fighter.base_power + equipped_bonus(world, actor, |bonus| bonus.power_bonus)
}

/// Base defense plus every equipped bonus.
pub fn defense(world: &World, actor: &Actor) -> i32 {
    actor.fighter.base_defense + equipped_bonus(world, actor, |bonus| bonus.defense_bonus)
}

fn equipped_bonus(
    world: &World,
    actor: &Actor,
    pick: impl Fn(&Equippable) -> i32,
) -> i32 {
    actor
        .equipment
        .equipped()
        .filter_map(|id| world.get(id).and_then(Entity::item).and_then(|item| item.equippable))
        .map(|bonus| pick(&bonus))
        .sum()
}

pub fn melee_damage(power: i32, defense: i32) -> i32 {
    (power - defense).max(0)
}

pub(crate) fn is_player(entity: &Entity) -> bool {
    entity.actor().is_some_and(|actor| actor.ai == Some(Behavior::Player))
}

/// Resolves one melee blow; returns the damage dealt.
pub fn attack(
    world: &mut World,
    log: &mut MessageLog,
    attacker: EntityId,
    defender: EntityId,
) -> Result<i32, SessionError> {
    let (attacker_entity, defender_entity) = match (world.get(attacker), world.get(defender)) {
        (Some(a), Some(d)) => (a, d),
        _ => return Err(SessionError::invariant("melee between missing entities")),
    };
    let (Some(attacker_actor), Some(defender_actor)) =
        (attacker_entity.actor(), defender_entity.actor())
    else {
        return Err(SessionError::invariant("melee needs two actors"));
    };

    let damage = melee_damage(power(world, attacker_actor), defense(world, defender_actor));
    let description =
        format!("{} attacks {}", capitalize(&attacker_entity.name), defender_entity.name);
    let color =
        if is_player(attacker_entity) { palette::PLAYER_ATTACK } else { palette::ENEMY_ATTACK };

    if damage > 0 {
        log.add(format!("{description} for {damage} hit points."), color);
        apply_damage(world, log, defender, damage, Some(attacker))?;
    } else {
        log.add(format!("{description} but does no damage."), color);
    }
    Ok(damage)
}

/// Subtracts hp and runs the death path the first time hp reaches zero.
/// Returns whether this call killed the target.
pub fn apply_damage(
    world: &mut World,
    log: &mut MessageLog,
    target: EntityId,
    amount: i32,
    killer: Option<EntityId>,
) -> Result<bool, SessionError> {
    let Some(actor) = world.actor_mut(target) else {
        return Err(SessionError::invariant(format!("{target:?} cannot take damage")));
    };
    if !actor.is_alive() {
        return Ok(false);
    }
    let hp = actor.fighter.hp();
    actor.fighter.set_hp(hp - amount);
    if actor.fighter.hp() > 0 {
        return Ok(false);
    }
    die(world, log, target, killer)?;
    Ok(true)
}

fn die(
    world: &mut World,
    log: &mut MessageLog,
    victim: EntityId,
    killer: Option<EntityId>,
) -> Result<(), SessionError> {
    let Some(entity) = world.get_mut(victim) else {
        return Err(SessionError::invariant(format!("{victim:?} vanished before dying")));
    };
    let was_player = is_player(entity);
    if was_player {
        log.add("You died!", palette::PLAYER_DIE);
    } else {
        log.add(format!("{} is dead!", entity.name), palette::ENEMY_DIE);
    }
    tracing::debug!(victim = %entity.name, "actor died");

    entity.name = format!("remains of {}", entity.name);
    entity.glyph = CORPSE_GLYPH;
    entity.color = palette::CORPSE;
    entity.blocks_movement = false;
    entity.tier = RenderTier::Corpse;
    let mut xp = 0;
    if let Some(actor) = entity.actor_mut() {
        actor.ai = None;
        xp = actor.level.xp_given;
    }

    if let Some(killer) = killer
        && killer != victim
    {
        award_experience(world, log, killer, xp);
    }
    Ok(())
}

/// Adds experience to an actor that tracks levels and applies any level-ups.
pub fn award_experience(world: &mut World, log: &mut MessageLog, recipient: EntityId, xp: u32) {
    let Some(entity) = world.get_mut(recipient) else {
        return;
    };
    let announce = is_player(entity);
    let Some(actor) = entity.actor_mut() else {
        return;
    };
    if xp == 0 || !actor.level.tracks_experience() {
        return;
    }
    if announce {
        log.add(format!("You gain {xp} experience points."), palette::WHITE);
    }
    let gained = actor.level.add_xp(xp);
    for _ in 0..gained {
        actor.fighter.max_hp += LEVEL_UP_HP;
        let hp = actor.fighter.hp();
        actor.fighter.set_hp(hp + LEVEL_UP_HP);
        actor.fighter.base_power += LEVEL_UP_POWER;
        actor.fighter.base_defense += LEVEL_UP_DEFENSE;
    }
    if gained > 0 && announce {
        let level = actor.level.current_level;
        log.add(format!("You advance to level {level}!"), palette::WHITE);
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
