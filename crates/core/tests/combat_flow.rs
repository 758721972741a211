use tombs_core::action::{self, Action, Resolved};
use tombs_core::components::Fighter;
use tombs_core::{GameMap, MessageLog, Pos, Prototypes, RenderTier, TileKind, World, keys};

fn arena() -> World {
    let mut map = GameMap::new(10, 10);
    for y in 1..9 {
        for x in 1..9 {
            map.set_tile(Pos::new(x, y), TileKind::Floor);
        }
    }
    World::new(map, 1)
}

#[test]
fn test_melee_kills_in_two_blows_and_awards_experience() {
    let prototypes = Prototypes::standard();
    let mut world = arena();
    let mut log = MessageLog::default();

    let attacker = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(5, 4)).expect("attacker");
    let defender = prototypes.spawn(keys::ORC, &mut world, Pos::new(5, 5)).expect("defender");
    world.actor_mut(attacker).expect("attacker actor").fighter = Fighter::new(30, 8, 2);
    world.actor_mut(defender).expect("defender actor").fighter = Fighter::new(10, 3, 0);

    let melee = Action::Melee { dx: 0, dy: 1 };
    let first = action::perform(&mut world, &mut log, attacker, melee).expect("first blow");
    assert_eq!(first, Resolved::Acted);
    assert_eq!(world.actor(defender).map(|a| a.fighter.hp()), Some(2));
    assert_eq!(
        log.last().map(|m| m.text.as_str()),
        Some("Player attacks Orc for 8 hit points.")
    );

    action::perform(&mut world, &mut log, attacker, melee).expect("second blow");
    let corpse = world.get(defender).expect("corpse stays in the world");
    assert_eq!(corpse.actor().map(|a| a.fighter.hp()), Some(0));
    assert!(!corpse.is_alive_actor());
    assert!(!corpse.blocks_movement);
    assert_eq!(corpse.tier, RenderTier::Corpse);
    assert_eq!(corpse.name, "remains of Orc");

    let texts: Vec<&str> = log.messages().iter().map(|m| m.text.as_str()).collect();
    assert!(texts.contains(&"Orc is dead!"));
    assert!(texts.contains(&"You gain 35 experience points."));
    assert_eq!(world.actor(attacker).map(|a| a.level.current_xp), Some(35));
    world.validate().expect("world stays consistent");
}

#[test]
fn test_blows_weaker_than_armor_do_nothing() {
    let prototypes = Prototypes::standard();
    let mut world = arena();
    let mut log = MessageLog::default();

    let attacker = prototypes.spawn(keys::ORC, &mut world, Pos::new(3, 3)).expect("attacker");
    let defender = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(4, 3)).expect("defender");
    world.actor_mut(attacker).expect("attacker actor").fighter = Fighter::new(10, 2, 0);
    world.actor_mut(defender).expect("defender actor").fighter = Fighter::new(30, 5, 5);

    action::perform(&mut world, &mut log, attacker, Action::Melee { dx: 1, dy: 0 })
        .expect("blow resolves");
    assert_eq!(world.actor(defender).map(|a| a.fighter.hp()), Some(30));
    assert_eq!(
        log.last().map(|m| m.text.as_str()),
        Some("Orc attacks Player but does no damage.")
    );
}

#[test]
fn test_corpses_can_be_walked_over() {
    let prototypes = Prototypes::standard();
    let mut world = arena();
    let mut log = MessageLog::default();

    let player = prototypes.spawn(keys::PLAYER, &mut world, Pos::new(2, 2)).expect("player");
    let orc = prototypes.spawn(keys::ORC, &mut world, Pos::new(3, 2)).expect("orc");
    world.actor_mut(player).expect("player actor").fighter = Fighter::new(30, 20, 2);

    action::perform(&mut world, &mut log, player, Action::Bump { dx: 1, dy: 0 }).expect("kill");
    assert!(world.get(orc).is_some_and(|e| !e.is_alive_actor()));

    action::perform(&mut world, &mut log, player, Action::Bump { dx: 1, dy: 0 }).expect("step");
    assert_eq!(world.get(player).map(|e| e.pos), Some(Pos::new(3, 2)));
}
