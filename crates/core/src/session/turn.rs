//! Turn sequencing: player action, every other living actor, then field of view.

use super::*;
use crate::action::{self, Action, Resolved};
use crate::ai::{self, AiContext};
use crate::error::ActionError;
use crate::mapgen::seed::mix_seed_stream;

impl Session {
    /// Resolves one player action. Rejections consume no turn and skip AI and visibility.
    pub fn submit(&mut self, action: Action) -> Result<TurnOutcome, SessionError> {
        if !self.is_player_alive() && action != Action::Escape {
            return Ok(self.reject(Impossible::Dead));
        }

        let resolved = match action::perform(&mut self.world, &mut self.log, self.player, action) {
            Ok(resolved) => resolved,
            Err(ActionError::Impossible(reason)) => return Ok(self.reject(reason)),
            Err(ActionError::Fatal(error)) => {
                tracing::warn!(%error, turn = self.turn, "fatal error while resolving action");
                return Err(error);
            }
        };

        let descended = match resolved {
            Resolved::Exit => return Ok(TurnOutcome::Exit),
            Resolved::Descend => {
                self.descend()?;
                true
            }
            Resolved::Acted => false,
        };

        self.run_other_actors()?;
        self.update_visibility()?;
        self.turn += 1;

        Ok(if !self.is_player_alive() {
            TurnOutcome::PlayerDied
        } else if descended {
            TurnOutcome::Descended { floor_index: self.world.floor_index }
        } else {
            TurnOutcome::Completed
        })
    }

    fn reject(&mut self, reason: Impossible) -> TurnOutcome {
        tracing::debug!(%reason, "action rejected");
        self.log.add(reason.to_string(), palette::IMPOSSIBLE);
        TurnOutcome::Rejected(reason)
    }

    fn run_other_actors(&mut self) -> Result<(), SessionError> {
        let entropy = mix_seed_stream(self.seed, self.turn);
        let context = AiContext { player: self.player, entropy };
        for actor in self.world.living_actors() {
            if actor == self.player {
                continue;
            }
            ai::take_turn(&mut self.world, &mut self.log, actor, context)?;
        }
        Ok(())
    }

    pub(crate) fn update_visibility(&mut self) -> Result<(), SessionError> {
        let Some(origin) = self.world.get(self.player).map(|entity| entity.pos) else {
            return Err(SessionError::invariant("player is missing from the world"));
        };
        let visible = self.visibility.compute_visible(
            &self.world.map.transparency(),
            origin,
            self.config.fov_radius,
        );
        if visible.len() != self.world.map.tiles.len() {
            return Err(SessionError::invariant(format!(
                "visibility service returned {} cells for a {}-cell map",
                visible.len(),
                self.world.map.tiles.len()
            )));
        }
        self.world.map.apply_visibility(visible);
        Ok(())
    }

    /// Replaces the world with the next floor and carries the player and its belongings over.
    fn descend(&mut self) -> Result<(), SessionError> {
        let next_floor = self.world.floor_index + 1;
        let mut next =
            mapgen::generate(&self.config.generator, next_floor, &self.prototypes, self.seed);
        if next.room_count == 0 {
            return Err(SessionError::Generation(format!("floor {next_floor} has no rooms")));
        }
        let entry = next.entry;
        self.player = next.adopt_actor(&mut self.world, self.player, entry)?;
        self.world = next;
        self.log.add("You descend the staircase.", palette::DESCEND);
        tracing::info!(floor_index = next_floor, "descended");
        Ok(())
    }
}
