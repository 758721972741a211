//! The active play session: one world, one player, one message log.
//! This module exists to own the world exclusively and sequence each turn.
//! It does not own rule resolution or persistence formats; see `action` and `save`.

mod hash;
mod turn;

use crate::config::SessionConfig;
use crate::content::{Prototypes, keys};
use crate::error::{Impossible, SessionError};
use crate::map::TileGraphic;
use crate::mapgen;
use crate::message_log::MessageLog;
use crate::types::{EntityId, Pos, palette};
use crate::visibility::{Shadowcast, VisibilityService};
use crate::world::{RenderEntity, World};

pub const WELCOME_MESSAGE: &str = "Hello and welcome, adventurer, to yet another dungeon!";
pub const FIRST_FLOOR: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The action resolved and every other actor took its turn.
    Completed,
    /// Same as `Completed`, on a freshly generated floor.
    Descended { floor_index: u32 },
    /// Nothing changed and no turn passed.
    Rejected(Impossible),
    /// The host should save and stop.
    Exit,
    /// The player died during this turn.
    PlayerDied,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub width: usize,
    pub height: usize,
    /// Row-major, already resolved to light, dark, or shroud.
    pub tiles: Vec<TileGraphic>,
    pub visible: &'a [bool],
    pub explored: &'a [bool],
    pub downstairs: Pos,
    /// Back-to-front.
    pub entities: Vec<RenderEntity>,
}

pub struct Session {
    pub(crate) world: World,
    pub(crate) player: EntityId,
    pub(crate) log: MessageLog,
    pub(crate) turn: u64,
    pub(crate) seed: u64,
    pub(crate) config: SessionConfig,
    pub(crate) prototypes: Prototypes,
    visibility: Box<dyn VisibilityService>,
}

impl Session {
    /// Generates the first floor and places the player with starting gear.
    pub fn new(
        seed: u64,
        config: SessionConfig,
        prototypes: Prototypes,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mut world = mapgen::generate(&config.generator, FIRST_FLOOR, &prototypes, seed);
        if world.room_count == 0 {
            return Err(SessionError::Generation(format!(
                "floor {FIRST_FLOOR} has no rooms; the map is too small for the room sizes"
            )));
        }

        let entry = world.entry;
        let Some(player) = prototypes.spawn(keys::PLAYER, &mut world, entry) else {
            return Err(SessionError::invariant("player spawn cell is occupied"));
        };
        let dagger = prototypes.give(keys::DAGGER, &mut world, player)?;
        let armor = prototypes.give(keys::LEATHER_ARMOR, &mut world, player)?;
        if let Some(actor) = world.actor_mut(player) {
            actor.equipment.weapon = Some(dagger);
            actor.equipment.armor = Some(armor);
        }

        let mut log = MessageLog::default();
        log.add(WELCOME_MESSAGE, palette::WELCOME_TEXT);
        let mut session = Self::from_parts(world, player, log, 0, seed, config, prototypes);
        session.update_visibility()?;
        tracing::info!(seed, "session started");
        Ok(session)
    }

    pub(crate) fn from_parts(
        world: World,
        player: EntityId,
        log: MessageLog,
        turn: u64,
        seed: u64,
        config: SessionConfig,
        prototypes: Prototypes,
    ) -> Self {
        Self {
            world,
            player,
            log,
            turn,
            seed,
            config,
            prototypes,
            visibility: Box::new(Shadowcast),
        }
    }

    /// Swaps in a host-provided field-of-view service and recomputes the visible set.
    pub fn set_visibility_service(
        &mut self,
        service: Box<dyn VisibilityService>,
    ) -> Result<(), SessionError> {
        self.visibility = service;
        self.update_visibility()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for hosts and tests that stage scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn floor_index(&self) -> u32 {
        self.world.floor_index
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prototypes(&self) -> &Prototypes {
        &self.prototypes
    }

    pub fn is_player_alive(&self) -> bool {
        self.world.get(self.player).is_some_and(|entity| entity.is_alive_actor())
    }

    /// Item held in the player's `slot`-th inventory position.
    pub fn inventory_slot(&self, slot: usize) -> Option<EntityId> {
        self.world.actor(self.player).and_then(|actor| actor.inventory.items.get(slot).copied())
    }

    pub fn frame(&self) -> Frame<'_> {
        let map = &self.world.map;
        let tiles = (0..map.height)
            .flat_map(|y| (0..map.width).map(move |x| Pos { y: y as i32, x: x as i32 }))
            .map(|pos| map.graphic_at(pos))
            .collect();
        Frame {
            width: map.width,
            height: map.height,
            tiles,
            visible: &map.visible,
            explored: &map.explored,
            downstairs: map.downstairs,
            entities: self.world.render_entities(),
        }
    }
}
