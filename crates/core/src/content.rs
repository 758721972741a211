//! Prototype registry: named entity templates deep-copied on every spawn.
//! This module exists so the generator and hosts share one explicit table of stats.
//! It does not own spawn odds; see `mapgen::spawns`.

use std::collections::BTreeMap;

use crate::ai::Behavior;
use crate::components::{Consumable, Equipment, Equippable, Fighter, Inventory, Level};
use crate::entity::{Actor, Body, Container, Entity, Item};
use crate::error::SessionError;
use crate::types::{EntityId, EquipmentSlot, Pos, RenderTier, Rgb};
use crate::world::World;

pub mod keys {
    pub const PLAYER: &str = "player";
    pub const ORC: &str = "orc";
    pub const TROLL: &str = "troll";

    pub const HEALTH_POTION: &str = "health_potion";
    pub const LIGHTNING_SCROLL: &str = "lightning_scroll";
    pub const CONFUSION_SCROLL: &str = "confusion_scroll";
    pub const FIREBALL_SCROLL: &str = "fireball_scroll";

    pub const DAGGER: &str = "dagger";
    pub const SWORD: &str = "sword";
    pub const LEATHER_ARMOR: &str = "leather_armor";
    pub const CHAIN_MAIL: &str = "chain_mail";
}

pub const PLAYER_INVENTORY_CAPACITY: usize = 26;

#[derive(Clone, Debug)]
pub struct Prototypes {
    templates: BTreeMap<&'static str, Entity>,
}

impl Prototypes {
    pub fn empty() -> Self {
        Self { templates: BTreeMap::new() }
    }

    /// The stock bestiary and item set.
    pub fn standard() -> Self {
        let mut prototypes = Self::empty();

        let player = Fighter::new(30, 5, 2);
        prototypes.register(
            keys::PLAYER,
            actor_template("Player", '@', Rgb(255, 255, 255), player, Behavior::Player)
                .with_inventory(PLAYER_INVENTORY_CAPACITY)
                .with_level(Level::curve(200, 150)),
        );
        prototypes.register(
            keys::ORC,
            actor_template("Orc", 'o', Rgb(63, 127, 63), Fighter::new(10, 3, 0), hostile())
                .with_level(Level::reward(35)),
        );
        prototypes.register(
            keys::TROLL,
            actor_template("Troll", 'T', Rgb(0, 127, 0), Fighter::new(16, 4, 1), hostile())
                .with_level(Level::reward(100)),
        );

        prototypes.register(
            keys::HEALTH_POTION,
            consumable_template("Health Potion", '!', Rgb(127, 0, 255), Consumable::Healing {
                amount: 4,
            }),
        );
        prototypes.register(
            keys::LIGHTNING_SCROLL,
            consumable_template("Lightning Scroll", '~', Rgb(255, 255, 0), Consumable::Lightning {
                damage: 20,
                max_range: 5.0,
            }),
        );
        prototypes.register(
            keys::CONFUSION_SCROLL,
            consumable_template("Confusion Scroll", '~', Rgb(207, 63, 255), Consumable::Confusion {
                turns: 10,
            }),
        );
        prototypes.register(
            keys::FIREBALL_SCROLL,
            consumable_template("Fireball Scroll", '~', Rgb(255, 0, 0), Consumable::Fireball {
                damage: 12,
                radius: 3.0,
            }),
        );

        let weapon =
            |power_bonus| Equippable { slot: EquipmentSlot::Weapon, power_bonus, defense_bonus: 0 };
        let armor = |defense_bonus| Equippable {
            slot: EquipmentSlot::Armor,
            power_bonus: 0,
            defense_bonus,
        };
        prototypes
            .register(keys::DAGGER, gear_template("Dagger", '/', Rgb(0, 191, 255), weapon(2)));
        prototypes.register(keys::SWORD, gear_template("Sword", '/', Rgb(0, 191, 255), weapon(4)));
        prototypes.register(
            keys::LEATHER_ARMOR,
            gear_template("Leather Armor", '[', Rgb(139, 69, 19), armor(1)),
        );
        prototypes.register(
            keys::CHAIN_MAIL,
            gear_template("Chain Mail", '[', Rgb(139, 69, 19), armor(3)),
        );

        prototypes
    }

    pub fn register(&mut self, key: &'static str, template: Entity) {
        self.templates.insert(key, template);
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.templates.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.keys().copied()
    }

    /// Places a fresh copy on the grid. `None` for an unknown key or an occupied blocking cell.
    pub fn spawn(&self, key: &str, world: &mut World, pos: Pos) -> Option<EntityId> {
        let template = self.templates.get(key)?;
        world.place_new(template.clone(), pos)
    }

    /// Puts a fresh copy straight into `holder`'s inventory.
    pub fn give(
        &self,
        key: &str,
        world: &mut World,
        holder: EntityId,
    ) -> Result<EntityId, SessionError> {
        let Some(template) = self.templates.get(key) else {
            return Err(SessionError::invariant(format!("no prototype named {key:?}")));
        };
        world.give_new(template.clone(), holder)
    }
}

impl Default for Prototypes {
    fn default() -> Self {
        Self::standard()
    }
}

fn hostile() -> Behavior {
    Behavior::Hostile { last_known: None }
}

fn base_entity(name: &str, glyph: char, color: Rgb, tier: RenderTier, body: Body) -> Entity {
    Entity {
        id: EntityId::default(),
        name: name.to_string(),
        glyph,
        color,
        pos: Pos { y: 0, x: 0 },
        tier,
        blocks_movement: matches!(body, Body::Actor(_)),
        container: Container::World,
        body,
    }
}

fn actor_template(name: &str, glyph: char, color: Rgb, fighter: Fighter, ai: Behavior) -> Entity {
    let actor = Actor {
        fighter,
        ai: Some(ai),
        inventory: Inventory::with_capacity(0),
        equipment: Equipment::default(),
        level: Level::reward(0),
    };
    base_entity(name, glyph, color, RenderTier::Actor, Body::Actor(actor))
}

fn consumable_template(name: &str, glyph: char, color: Rgb, consumable: Consumable) -> Entity {
    let item = Item { consumable: Some(consumable), equippable: None };
    base_entity(name, glyph, color, RenderTier::Item, Body::Item(item))
}

fn gear_template(name: &str, glyph: char, color: Rgb, equippable: Equippable) -> Entity {
    let item = Item { consumable: None, equippable: Some(equippable) };
    base_entity(name, glyph, color, RenderTier::Item, Body::Item(item))
}

trait ActorTemplate {
    fn with_inventory(self, capacity: usize) -> Self;
    fn with_level(self, level: Level) -> Self;
}

impl ActorTemplate for Entity {
    fn with_inventory(mut self, capacity: usize) -> Self {
        if let Some(actor) = self.actor_mut() {
            actor.inventory = Inventory::with_capacity(capacity);
        }
        self
    }

    fn with_level(mut self, level: Level) -> Self {
        if let Some(actor) = self.actor_mut() {
            actor.level = level;
        }
        self
    }
}
