//! Actions requested from outside the core. Every command checks its own preconditions and is
//! rejected without side effects when they fail.

use thiserror::Error;
use tracing::debug;

use crate::events::SimEvent;
use crate::geometry::{distance, Coord, Direction};
use crate::world::{EntityBody, EntityId, Interactable, World};

const TURN_COST: u32 = 1;
const WAIT_COST: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move { direction: Direction },
    Turn { facing: Direction },
    Attack { aim: Coord },
    UsePower { slot: usize, target: Option<Coord> },
    Reload,
    /// Toggles an adjacent door or picks up an item.
    Interact { at: Coord },
    OpenDoor { at: Coord },
    CloseDoor { at: Coord },
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("actor is not an active creature")]
    NotACreature,
    #[error("actor cannot act yet")]
    NotReady,
    #[error("diagonal movement is disabled")]
    DiagonalMovementDisabled,
    #[error("destination is blocked")]
    Blocked,
    #[error("target is out of reach")]
    OutOfRange,
    #[error("weapon is empty")]
    NoAmmo,
    #[error("weapon has nothing to reload")]
    NothingToReload,
    #[error("power is missing or cooling down")]
    PowerUnavailable,
    #[error("power needs a target")]
    MissingTarget,
    #[error("power target is invalid")]
    InvalidTarget,
    #[error("nothing to interact with")]
    NothingToInteract,
    #[error("door is already in that state")]
    DoorUnchanged,
    #[error("door way is occupied")]
    DoorOccupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Executed,
    Rejected(CommandRejection),
}

impl CommandOutcome {
    pub fn is_executed(self) -> bool {
        self == Self::Executed
    }
}

impl From<Result<(), CommandRejection>> for CommandOutcome {
    fn from(result: Result<(), CommandRejection>) -> Self {
        match result {
            Ok(()) => Self::Executed,
            Err(reason) => Self::Rejected(reason),
        }
    }
}

impl World {
    pub fn execute(&mut self, actor: EntityId, command: Command) -> CommandOutcome {
        let outcome: CommandOutcome = self.try_execute(actor, command).into();
        if let CommandOutcome::Rejected(reason) = outcome {
            debug!(actor = actor.0, ?command, %reason, "command_rejected");
        }
        outcome
    }

    fn try_execute(&mut self, actor: EntityId, command: Command) -> Result<(), CommandRejection> {
        if !self.is_active(actor) {
            return Err(CommandRejection::NotACreature);
        }
        let creature = self.creature(actor).ok_or(CommandRejection::NotACreature)?;
        if !creature.can_act() {
            return Err(CommandRejection::NotReady);
        }
        let origin = self
            .entity(actor)
            .map(|entity| entity.position())
            .ok_or(CommandRejection::NotACreature)?;

        match command {
            Command::Move { direction } => {
                if direction.is_diagonal() && !self.config().diagonal_movement {
                    return Err(CommandRejection::DiagonalMovementDisabled);
                }
                let to = origin.step(direction);
                if !self.step_creature(actor, to) {
                    return Err(CommandRejection::Blocked);
                }
            }
            Command::Turn { facing } => self.turn_creature(actor, facing),
            Command::Attack { aim } => {
                let weapon = &creature.weapon;
                if aim == origin || distance(origin, aim) > weapon.range {
                    return Err(CommandRejection::OutOfRange);
                }
                if weapon.needs_reload() {
                    return Err(CommandRejection::NoAmmo);
                }
                self.resolve_attack(actor, aim);
            }
            Command::UsePower { slot, target } => {
                if !self.can_activate_power(actor, slot) {
                    return Err(CommandRejection::PowerUnavailable);
                }
                let targeted = self
                    .creature(actor)
                    .and_then(|creature| creature.powers.get(slot))
                    .is_some_and(|power| power.kind.is_targeted());
                if targeted && target.is_none() {
                    return Err(CommandRejection::MissingTarget);
                }
                if !self.activate_power(actor, slot, target) {
                    return Err(CommandRejection::InvalidTarget);
                }
            }
            Command::Reload => {
                if !self.reload_weapon(actor) {
                    return Err(CommandRejection::NothingToReload);
                }
            }
            Command::Interact { at } => self.interact(actor, origin, at)?,
            Command::OpenDoor { at } => self.use_door(actor, origin, at, true)?,
            Command::CloseDoor { at } => self.use_door(actor, origin, at, false)?,
            Command::Wait => {
                if let Some(creature) = self.creature_mut(actor) {
                    creature.spend_action(WAIT_COST);
                }
            }
        }
        Ok(())
    }

    /// Walks onto an adjacent tile: faces the step, pays the move cost, and fires tile entry.
    pub(crate) fn step_creature(&mut self, id: EntityId, to: Coord) -> bool {
        let Some(from) = self.entity(id).map(|entity| entity.position()) else {
            return false;
        };
        if !from.is_adjacent8(to) || !self.can_occupy(to) {
            return false;
        }
        if !self.update_position(id, to) {
            return false;
        }
        if let Some(creature) = self.creature_mut(id) {
            if let Some(direction) = Direction::from_delta(to - from) {
                creature.face(direction);
            }
            let cost = creature.stats.move_time;
            creature.spend_action(cost);
        }
        self.on_entered_tile(id, to);
        self.refresh_enemy_memory(id);
        true
    }

    pub(crate) fn turn_creature(&mut self, id: EntityId, facing: Direction) {
        if let Some(creature) = self.creature_mut(id) {
            creature.face(facing);
            creature.spend_action(TURN_COST);
        }
        self.refresh_enemy_memory(id);
    }

    fn interact(
        &mut self,
        actor: EntityId,
        origin: Coord,
        at: Coord,
    ) -> Result<(), CommandRejection> {
        if at != origin && !origin.is_adjacent8(at) {
            return Err(CommandRejection::OutOfRange);
        }
        if let Some(door) = self.door_at(at) {
            let open = self.door_is_open(door);
            return self.use_door(actor, origin, at, !open);
        }
        let item = self
            .entities_at(at)
            .into_iter()
            .find(|id| {
                self.entity(*id).is_some_and(|entity| {
                    !entity.should_remove_from_game()
                        && entity.interactable == Some(Interactable::Pickup)
                })
            })
            .ok_or(CommandRejection::NothingToInteract)?;
        let Some(EntityBody::Item(kind)) = self.entity(item).map(|entity| entity.body.clone())
        else {
            return Err(CommandRejection::NothingToInteract);
        };
        self.mark_for_removal(item);
        if let Some(creature) = self.creature_mut(actor) {
            creature.inventory.add(kind);
            let cost = creature.stats.move_time;
            creature.spend_action(cost);
        }
        debug!(actor = actor.0, item = item.0, ?kind, "item_picked_up");
        Ok(())
    }

    fn door_at(&self, at: Coord) -> Option<EntityId> {
        self.entities_at(at).into_iter().find(|id| {
            self.entity(*id)
                .is_some_and(|entity| entity.interactable == Some(Interactable::Door))
        })
    }

    fn door_is_open(&self, door: EntityId) -> bool {
        matches!(
            self.entity(door).map(|entity| &entity.body),
            Some(EntityBody::Door(state)) if state.open
        )
    }

    fn use_door(
        &mut self,
        actor: EntityId,
        origin: Coord,
        at: Coord,
        open: bool,
    ) -> Result<(), CommandRejection> {
        if !origin.is_adjacent8(at) {
            return Err(CommandRejection::OutOfRange);
        }
        let door = self.door_at(at).ok_or(CommandRejection::NothingToInteract)?;
        self.set_door_open(door, open)?;
        if let Some(creature) = self.creature_mut(actor) {
            let cost = creature.stats.move_time;
            creature.spend_action(cost);
        }
        Ok(())
    }

    /// Opens or closes a door, updating the tile's blocking aggregates in the same call.
    pub fn set_door_open(&mut self, door: EntityId, open: bool) -> Result<(), CommandRejection> {
        if self.door_is_open(door) == open {
            return Err(CommandRejection::DoorUnchanged);
        }
        let at = self
            .entity(door)
            .map(|entity| entity.position())
            .ok_or(CommandRejection::NothingToInteract)?;
        if !open {
            let occupied = self
                .tile(at)
                .is_some_and(|tile| !tile.creatures().is_empty() || !tile.items().is_empty());
            if occupied {
                return Err(CommandRejection::DoorOccupied);
            }
        }
        if let Some(entity) = self.entity_mut(door) {
            if let EntityBody::Door(state) = &mut entity.body {
                state.open = open;
            }
        }
        self.set_blocking(door, !open, !open);
        debug!(door = door.0, open, "door_toggled");
        self.emit(SimEvent::DoorToggled { door, open });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::world::{creature_spec, Alignment, Creature, EntitySpec, ItemKind};

    use super::*;

    fn actor(world: &mut World, at: Coord) -> EntityId {
        let creature = Creature::new("scout", Alignment::WithPlayer, Weapon::fists());
        world
            .spawn(creature_spec(creature, Damageable::new(10), false), at)
            .expect("actor")
    }

    fn ready(world: &mut World, id: EntityId) {
        if let Some(creature) = world.creature_mut(id) {
            creature.time_until_next_action = 0;
        }
    }

    #[test]
    fn move_pays_the_cost_and_faces_the_step() {
        let mut world = World::new(4, 4, SimConfig::default()).expect("world");
        let id = actor(&mut world, Coord::new(1, 1));
        let outcome = world.execute(id, Command::Move { direction: Direction::SE });
        assert!(outcome.is_executed());
        let creature = world.creature(id).expect("actor");
        assert_eq!(creature.facing, Direction::SE);
        assert_eq!(creature.time_until_next_action, creature.stats.move_time);
        assert_eq!(
            world.execute(id, Command::Move { direction: Direction::N }),
            CommandOutcome::Rejected(CommandRejection::NotReady)
        );
    }

    #[test]
    fn walls_and_bounds_reject_moves() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        let id = actor(&mut world, Coord::new(0, 0));
        world.spawn(EntitySpec::wall(), Coord::new(1, 0)).expect("wall");
        for direction in [Direction::E, Direction::W] {
            assert_eq!(
                world.execute(id, Command::Move { direction }),
                CommandOutcome::Rejected(CommandRejection::Blocked)
            );
        }
        assert_eq!(world.creature(id).expect("actor").time_until_next_action, 0);
    }

    #[test]
    fn door_opens_and_refuses_to_close_on_an_item() {
        let mut world = World::new(3, 1, SimConfig::default()).expect("world");
        let id = actor(&mut world, Coord::new(0, 0));
        let door = world.spawn(EntitySpec::door(false), Coord::new(1, 0)).expect("door");
        assert!(!world.can_occupy(Coord::new(1, 0)));

        assert!(world.execute(id, Command::Interact { at: Coord::new(1, 0) }).is_executed());
        assert!(world.can_occupy(Coord::new(1, 0)));
        assert!(!world.tile(Coord::new(1, 0)).expect("tile").blocks_view());
        assert!(world.events().pending().contains(&SimEvent::DoorToggled { door, open: true }));

        world
            .spawn(EntitySpec::item(ItemKind::Scrap), Coord::new(1, 0))
            .expect("item");
        ready(&mut world, id);
        assert_eq!(
            world.execute(id, Command::CloseDoor { at: Coord::new(1, 0) }),
            CommandOutcome::Rejected(CommandRejection::DoorOccupied)
        );
        assert_eq!(
            world.execute(id, Command::OpenDoor { at: Coord::new(1, 0) }),
            CommandOutcome::Rejected(CommandRejection::DoorUnchanged)
        );
    }

    #[test]
    fn pickup_moves_the_item_into_the_inventory() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        let id = actor(&mut world, Coord::new(0, 0));
        let medkit = world
            .spawn(EntitySpec::item(ItemKind::Medkit), Coord::new(1, 0))
            .expect("medkit");
        assert!(world.execute(id, Command::Interact { at: Coord::new(1, 0) }).is_executed());
        assert!(!world.is_active(medkit));
        assert_eq!(
            world.creature(id).expect("actor").inventory.count(ItemKind::Medkit),
            1
        );
    }

    #[test]
    fn attack_out_of_reach_is_rejected() {
        let mut world = World::new(5, 1, SimConfig::default()).expect("world");
        let id = actor(&mut world, Coord::new(0, 0));
        assert_eq!(
            world.execute(id, Command::Attack { aim: Coord::new(3, 0) }),
            CommandOutcome::Rejected(CommandRejection::OutOfRange)
        );
    }
}
