//! Consumable activation. Targets are validated before anything is spent.

use super::*;
use crate::ai::Behavior;
use crate::components::Consumable;

pub(super) fn use_item(
    world: &mut World,
    log: &mut MessageLog,
    user: EntityId,
    item: EntityId,
    target: Option<Pos>,
) -> Result<Resolved, ActionError> {
    ensure_carried(world, user, item)?;
    let consumable = world.get(item).and_then(Entity::item).and_then(|i| i.consumable);
    let Some(consumable) = consumable else {
        return Err(Impossible::NotUsable.into());
    };
    let name = item_name(world, item);

    match consumable {
        Consumable::Healing { amount } => heal(world, log, user, &name, amount)?,
        Consumable::Lightning { damage, max_range } => {
            lightning(world, log, user, damage, max_range)?
        }
        Consumable::Confusion { turns } => {
            confuse(world, log, user, require_visible_target(world, target)?, turns)?
        }
        Consumable::Fireball { damage, radius } => {
            fireball(world, log, user, require_visible_target(world, target)?, damage, radius)?
        }
    }
    world.remove_consumed(item)?;
    Ok(Resolved::Acted)
}

fn require_visible_target(world: &World, target: Option<Pos>) -> Result<Pos, Impossible> {
    let target = target.ok_or(Impossible::TargetRequired)?;
    if !world.map.is_visible(target) {
        return Err(Impossible::TargetNotVisible);
    }
    Ok(target)
}

fn heal(
    world: &mut World,
    log: &mut MessageLog,
    user: EntityId,
    name: &str,
    amount: i32,
) -> Result<(), ActionError> {
    let Some(actor) = world.actor_mut(user) else {
        return Err(SessionError::invariant("healing a missing actor").into());
    };
    if actor.fighter.is_at_full_health() {
        return Err(Impossible::HealthFull.into());
    }
    let recovered = actor.fighter.heal(amount);
    log.add(
        format!("You consume the {name}, and recover {recovered} HP!"),
        palette::HEALTH_RECOVERED,
    );
    Ok(())
}

/// Strikes the closest visible actor whose distance is under `max_range + 1`.
fn lightning(
    world: &mut World,
    log: &mut MessageLog,
    user: EntityId,
    damage: i32,
    max_range: f32,
) -> Result<(), ActionError> {
    let Some(origin) = world.get(user).map(|entity| entity.pos) else {
        return Err(SessionError::invariant("lightning from a missing actor").into());
    };
    let mut closest: Option<(f32, EntityId)> = None;
    for candidate in world.living_actors() {
        let Some(entity) = world.get(candidate) else {
            continue;
        };
        if candidate == user || !world.map.is_visible(entity.pos) {
            continue;
        }
        let distance = origin.euclidean(entity.pos);
        if distance < max_range + 1.0 && closest.is_none_or(|(best, _)| distance < best) {
            closest = Some((distance, candidate));
        }
    }
    let Some((_, target)) = closest else {
        return Err(Impossible::NoTargetInRange.into());
    };

    log.add(
        format!(
            "A lightning bolt strikes the {} with a loud thunder, for {damage} damage!",
            item_name(world, target)
        ),
        palette::WHITE,
    );
    combat::apply_damage(world, log, target, damage, Some(user))?;
    Ok(())
}

fn confuse(
    world: &mut World,
    log: &mut MessageLog,
    user: EntityId,
    target: Pos,
    turns: u32,
) -> Result<(), ActionError> {
    let Some(victim) = world.actor_at(target) else {
        return Err(Impossible::TargetNotEnemy.into());
    };
    if victim == user {
        return Err(Impossible::TargetSelf.into());
    }
    let name = item_name(world, victim);
    let Some(actor) = world.actor_mut(victim) else {
        return Err(SessionError::invariant("confusing a missing actor").into());
    };
    let previous = actor.ai.take().unwrap_or(Behavior::Hostile { last_known: None });
    actor.ai = Some(Behavior::Confused { turns_remaining: turns, previous: Box::new(previous) });
    log.add(
        format!("The eyes of the {name} look vacant, as it starts to stumble around!"),
        palette::STATUS_EFFECT,
    );
    Ok(())
}

fn fireball(
    world: &mut World,
    log: &mut MessageLog,
    user: EntityId,
    target: Pos,
    damage: i32,
    radius: f32,
) -> Result<(), ActionError> {
    let caught: Vec<EntityId> = world
        .living_actors()
        .into_iter()
        .filter(|&id| world.get(id).is_some_and(|entity| entity.pos.euclidean(target) <= radius))
        .collect();
    if caught.is_empty() {
        return Err(Impossible::NoTargetsInRadius.into());
    }
    for victim in caught {
        log.add(
            format!(
                "The {} is engulfed in a fiery explosion, taking {damage} damage!",
                item_name(world, victim)
            ),
            palette::WHITE,
        );
        combat::apply_damage(world, log, victim, damage, Some(user))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Prototypes, keys};
    use crate::map::{GameMap, TileKind};

    fn lit_room() -> (World, Prototypes, EntityId) {
        let mut map = GameMap::new(16, 16);
        for y in 1..15 {
            for x in 1..15 {
                map.set_tile(Pos::new(x, y), TileKind::Floor);
            }
        }
        let cells = map.tiles.len();
        map.apply_visibility(vec![true; cells]);
        let mut world = World::new(map, 1);
        let prototypes = Prototypes::standard();
        let player = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(4, 4)).expect("player");
        (world, prototypes, player)
    }

    fn use_it(
        world: &mut World,
        log: &mut MessageLog,
        player: EntityId,
        item: EntityId,
        target: Option<Pos>,
    ) -> Result<Resolved, ActionError> {
        perform(world, log, player, Action::UseItem { item, target })
    }

    #[test]
    fn healing_at_full_health_is_refused_and_keeps_the_potion() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        let potion = prototypes.give(keys::HEALTH_POTION, &mut world, player).expect("potion");

        let refused = use_it(&mut world, &mut log, player, potion, None);
        assert!(matches!(refused, Err(ActionError::Impossible(Impossible::HealthFull))));
        assert!(world.actor(player).expect("player").inventory.contains(potion));

        world.actor_mut(player).expect("player").fighter.set_hp(28);
        use_it(&mut world, &mut log, player, potion, None).expect("drink");
        assert_eq!(world.actor(player).expect("player").fighter.hp(), 30);
        assert!(world.get(potion).is_none());
        let last = log.last().map(|m| m.text.as_str());
        assert_eq!(last, Some("You consume the Health Potion, and recover 2 HP!"));
    }

    #[test]
    fn lightning_strikes_the_closest_visible_enemy() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        let near = prototypes.spawn(keys::TROLL, &mut world, Pos::new(6, 4)).expect("near");
        let far = prototypes.spawn(keys::TROLL, &mut world, Pos::new(8, 4)).expect("far");
        let scroll = prototypes.give(keys::LIGHTNING_SCROLL, &mut world, player).expect("scroll");

        use_it(&mut world, &mut log, player, scroll, None).expect("zap");

        assert!(!world.get(near).expect("near").is_alive_actor());
        assert_eq!(world.actor(far).expect("far").fighter.hp(), 16);
        assert_eq!(world.actor(player).expect("player").level.current_xp, 100);
    }

    #[test]
    fn lightning_without_anyone_in_range_is_refused() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        prototypes.spawn(keys::ORC, &mut world, Pos::new(13, 13)).expect("distant orc");
        let scroll = prototypes.give(keys::LIGHTNING_SCROLL, &mut world, player).expect("scroll");

        let refused = use_it(&mut world, &mut log, player, scroll, None);
        assert!(matches!(refused, Err(ActionError::Impossible(Impossible::NoTargetInRange))));
        assert!(world.get(scroll).is_some());
    }

    #[test]
    fn lightning_reaches_anything_short_of_one_cell_past_max_range() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        let diagonal = prototypes.spawn(keys::ORC, &mut world, Pos::new(9, 6)).expect("diagonal");
        let scroll = prototypes.give(keys::LIGHTNING_SCROLL, &mut world, player).expect("scroll");

        use_it(&mut world, &mut log, player, scroll, None).expect("zap at 5.39");
        assert!(!world.get(diagonal).expect("diagonal").is_alive_actor());

        prototypes.spawn(keys::ORC, &mut world, Pos::new(10, 4)).expect("orc at six");
        let second = prototypes.give(keys::LIGHTNING_SCROLL, &mut world, player).expect("scroll");
        let refused = use_it(&mut world, &mut log, player, second, None);
        assert!(matches!(refused, Err(ActionError::Impossible(Impossible::NoTargetInRange))));
    }

    #[test]
    fn confusion_wraps_the_previous_behavior() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        let orc = prototypes.spawn(keys::ORC, &mut world, Pos::new(7, 7)).expect("orc");
        let scroll = prototypes.give(keys::CONFUSION_SCROLL, &mut world, player).expect("scroll");

        let missing = use_it(&mut world, &mut log, player, scroll, None);
        assert!(matches!(missing, Err(ActionError::Impossible(Impossible::TargetRequired))));
        let on_self = use_it(&mut world, &mut log, player, scroll, Some(Pos::new(4, 4)));
        assert!(matches!(on_self, Err(ActionError::Impossible(Impossible::TargetSelf))));
        let on_floor = use_it(&mut world, &mut log, player, scroll, Some(Pos::new(9, 9)));
        assert!(matches!(on_floor, Err(ActionError::Impossible(Impossible::TargetNotEnemy))));

        use_it(&mut world, &mut log, player, scroll, Some(Pos::new(7, 7))).expect("confuse");
        let ai = world.actor(orc).and_then(|a| a.ai.clone());
        assert_eq!(
            ai,
            Some(Behavior::Confused {
                turns_remaining: 10,
                previous: Box::new(Behavior::Hostile { last_known: None }),
            })
        );
    }

    #[test]
    fn fireball_needs_a_visible_target_and_hits_everyone_in_radius() {
        let (mut world, prototypes, player) = lit_room();
        let mut log = MessageLog::default();
        let a = prototypes.spawn(keys::ORC, &mut world, Pos::new(10, 10)).expect("a");
        let b = prototypes.spawn(keys::TROLL, &mut world, Pos::new(11, 11)).expect("b");
        let c = prototypes.spawn(keys::TROLL, &mut world, Pos::new(14, 14)).expect("c");
        let scroll = prototypes.give(keys::FIREBALL_SCROLL, &mut world, player).expect("scroll");

        let hidden_cell = world.map.index(Pos::new(2, 12));
        world.map.visible[hidden_cell] = false;
        let hidden = use_it(&mut world, &mut log, player, scroll, Some(Pos::new(2, 12)));
        assert!(matches!(hidden, Err(ActionError::Impossible(Impossible::TargetNotVisible))));
        let empty = use_it(&mut world, &mut log, player, scroll, Some(Pos::new(1, 14)));
        assert!(matches!(empty, Err(ActionError::Impossible(Impossible::NoTargetsInRadius))));

        use_it(&mut world, &mut log, player, scroll, Some(Pos::new(10, 10))).expect("boom");
        assert!(!world.get(a).expect("a").is_alive_actor());
        assert_eq!(world.actor(b).expect("b").fighter.hp(), 4);
        assert_eq!(world.actor(c).expect("c").fighter.hp(), 16);
        assert!(world.get(scroll).is_none());
    }
}
