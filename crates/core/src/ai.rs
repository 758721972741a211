//! Behaviors for non-player actors.
//! This module exists to turn an actor's behavior state into one resolver action per turn.
//! It does not own turn order or visibility; the session calls in once per living actor.

mod pathing;

use serde::{Deserialize, Serialize};

use crate::action::{self, Action};
use crate::error::{ActionError, SessionError};
use crate::mapgen::seed::mix_seed_stream;
use crate::message_log::MessageLog;
use crate::types::{DIRECTIONS, EntityId, Pos, palette};
use crate::world::World;

pub(crate) use pathing::path_to;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Driven by submitted actions; never run by the controller.
    Player,
    /// Idle while `last_known` is empty, tracking otherwise.
    Hostile { last_known: Option<Pos> },
    Confused { turns_remaining: u32, previous: Box<Behavior> },
}

/// Per-turn inputs the controller needs beyond the world itself.
#[derive(Clone, Copy, Debug)]
pub struct AiContext {
    pub player: EntityId,
    /// Seeds confused stumbling; varies per turn and per actor.
    pub entropy: u64,
}

/// Runs one turn for `actor`. Rejected actions are dropped; only faults propagate.
pub fn take_turn(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    context: AiContext,
) -> Result<(), SessionError> {
    let Some(behavior) = world.actor(actor).and_then(|a| a.ai.clone()) else {
        return Ok(());
    };
    let Some(action) = decide(world, log, actor, behavior, context) else {
        return Ok(());
    };
    match action::perform(world, log, actor, action) {
        Ok(_) => Ok(()),
        Err(ActionError::Impossible(reason)) => {
            tracing::warn!(?actor, %reason, "ai action rejected");
            Ok(())
        }
        Err(ActionError::Fatal(error)) => Err(error),
    }
}

/// Picks the next action and writes back any state change before it resolves.
fn decide(
    world: &mut World,
    log: &mut MessageLog,
    actor: EntityId,
    behavior: Behavior,
    context: AiContext,
) -> Option<Action> {
    let pos = world.get(actor)?.pos;
    match behavior {
        Behavior::Player => None,
        Behavior::Hostile { last_known } => {
            let (next, action) = hostile(world, actor, pos, last_known, context.player);
            set_behavior(world, actor, Behavior::Hostile { last_known: next });
            action
        }
        Behavior::Confused { turns_remaining: 0, previous } => {
            let name = world.get(actor).map(|e| e.name.clone()).unwrap_or_default();
            log.add(format!("The {name} is no longer confused."), palette::STATUS_EFFECT);
            set_behavior(world, actor, *previous);
            None
        }
        Behavior::Confused { turns_remaining, previous } => {
            let roll = mix_seed_stream(context.entropy, pos.y as u64 * 1_000 + pos.x as u64);
            let (dx, dy) = DIRECTIONS[(roll % DIRECTIONS.len() as u64) as usize];
            set_behavior(world, actor, Behavior::Confused {
                turns_remaining: turns_remaining - 1,
                previous,
            });
            Some(Action::Bump { dx, dy })
        }
    }
}

/// Returns the updated memory plus the chosen action.
fn hostile(
    world: &World,
    actor: EntityId,
    pos: Pos,
    last_known: Option<Pos>,
    player: EntityId,
) -> (Option<Pos>, Option<Action>) {
    let player_pos = world.get(player).filter(|e| e.is_alive_actor()).map(|e| e.pos);
    if let Some(target) = player_pos
        && world.map.is_visible(pos)
    {
        if pos.chebyshev(target) <= 1 {
            let action = Action::Melee { dx: target.x - pos.x, dy: target.y - pos.y };
            tracing::debug!(?actor, "adjacent to player, attacking");
            return (Some(target), Some(action));
        }
        let action = next_step(world, pos, target).map(|next| step_toward(pos, next));
        return (Some(target), action);
    }

    match last_known {
        Some(remembered) if remembered != pos => match next_step(world, pos, remembered) {
            Some(next) => {
                let memory = if next == remembered { None } else { Some(remembered) };
                (memory, Some(step_toward(pos, next)))
            }
            None => (None, None),
        },
        _ => (None, None),
    }
}

fn next_step(world: &World, from: Pos, to: Pos) -> Option<Pos> {
    path_to(world, from, to)?.into_iter().next()
}

/// A plain move: a path step into another monster is a no-op, never an attack.
fn step_toward(from: Pos, next: Pos) -> Action {
    Action::Move { dx: next.x - from.x, dy: next.y - from.y }
}

fn set_behavior(world: &mut World, actor: EntityId, behavior: Behavior) {
    if let Some(actor) = world.actor_mut(actor)
        && actor.ai.is_some()
    {
        actor.ai = Some(behavior);
    }
}
