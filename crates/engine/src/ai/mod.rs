//! Enemy decision making: a three-state machine fed by perception, acting once per turn.

mod perception;

use tracing::debug;

use crate::geometry::Coord;
use crate::world::{AiState, Controller, EntityId, IdleBehavior, World};

impl World {
    /// Re-evaluates the state from what the creature sees and remembers. Runs every tick for
    /// AI-controlled creatures, whether or not they can act.
    pub(crate) fn update_ai_state(&mut self, id: EntityId) -> Option<AiState> {
        let controller = self.creature(id)?.controller;
        if controller != Controller::Ai {
            return None;
        }
        let visible = self.visible_enemies(id);
        let origin = self.entity(id)?.position();
        let nearest = self.nearest_of(origin, &visible);
        let memory_limit = self.config().search_memory_ticks;

        let creature = self.creature_mut(id)?;
        let previous = creature.ai.state;
        let memory = &mut creature.ai;
        if let Some((_, at)) = nearest {
            memory.state = AiState::Engaging;
            memory.last_known_enemy = Some(at);
            memory.searching_ticks = 0;
        } else if memory.last_known_enemy.is_some() {
            if memory.state == AiState::Searching {
                memory.searching_ticks = memory.searching_ticks.saturating_add(1);
            } else {
                memory.state = AiState::Searching;
                memory.searching_ticks = 0;
            }
            if memory.searching_ticks > memory_limit {
                memory.state = AiState::Idle;
                memory.last_known_enemy = None;
                memory.searching_ticks = 0;
            }
        } else {
            memory.state = AiState::Idle;
            memory.searching_ticks = 0;
        }

        let state = memory.state;
        if state != previous {
            debug!(entity = id.0, from = ?previous, to = ?state, "ai_state_changed");
        }
        Some(state)
    }

    /// Takes one action for the creature's current state. The caller checks `can_act`.
    pub(crate) fn take_ai_action(&mut self, id: EntityId) {
        let Some(state) = self.creature(id).map(|creature| creature.ai.state) else {
            return;
        };
        match state {
            AiState::Engaging => self.engage(id),
            AiState::Searching => self.search(id),
            AiState::Idle => self.idle(id),
        }
    }

    fn engage(&mut self, id: EntityId) {
        let needs_reload = self
            .creature(id)
            .is_some_and(|creature| creature.weapon.needs_reload());
        if needs_reload {
            self.reload_weapon(id);
            return;
        }
        let Some(origin) = self.entity(id).map(|entity| entity.position()) else {
            return;
        };
        let attackable = self.attackable_enemies(id);
        if let Some((_, at)) = self.nearest_of(origin, &attackable) {
            self.resolve_attack(id, at);
            return;
        }
        let visible = self.visible_enemies(id);
        if let Some((_, at)) = self.nearest_of(origin, &visible) {
            self.step_toward(id, at);
        }
    }

    fn search(&mut self, id: EntityId) {
        let Some(origin) = self.entity(id).map(|entity| entity.position()) else {
            return;
        };
        let Some((facing, Some(goal))) = self
            .creature(id)
            .map(|creature| (creature.facing, creature.ai.last_known_enemy))
        else {
            return;
        };
        if origin == goal {
            let steps = if self.rng_mut().coin_flip() { 1 } else { -1 };
            self.turn_creature(id, facing.rotated(steps));
            return;
        }
        if !self.step_toward(id, goal) {
            debug!(entity = id.0, x = goal.x, y = goal.y, "search_abandoned");
            if let Some(creature) = self.creature_mut(id) {
                creature.ai.last_known_enemy = None;
                creature.ai.state = AiState::Idle;
                creature.ai.searching_ticks = 0;
            }
        }
    }

    fn idle(&mut self, id: EntityId) {
        let Some(behavior) = self.creature(id).map(|creature| creature.idle_behavior) else {
            return;
        };
        if behavior == IdleBehavior::Stationary {
            return;
        }
        let Some(origin) = self.entity(id).map(|entity| entity.position()) else {
            return;
        };
        let options = self.walkable_neighbors(origin);
        if let Some(to) = self.rng_mut().choose(&options) {
            self.step_creature(id, to);
        }
    }

    /// One freshly planned step toward `goal`. False when no step is possible.
    fn step_toward(&mut self, id: EntityId, goal: Coord) -> bool {
        match self.next_step_toward(id, goal) {
            Some(step) => self.step_creature(id, step),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::{Weapon, WeaponKind};
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::geometry::Direction;
    use crate::world::{creature_spec, Alignment, Creature, EntitySpec};

    use super::*;

    fn guard(world: &mut World, at: Coord, weapon: Weapon) -> EntityId {
        let creature =
            Creature::new("guard", Alignment::AgainstPlayer, weapon).with_facing(Direction::E);
        world
            .spawn(creature_spec(creature, Damageable::new(20), false), at)
            .expect("guard")
    }

    fn intruder(world: &mut World, at: Coord) -> EntityId {
        let creature = Creature::new("intruder", Alignment::WithPlayer, Weapon::fists())
            .with_controller(Controller::External);
        world
            .spawn(creature_spec(creature, Damageable::new(20), false), at)
            .expect("intruder")
    }

    #[test]
    fn seeing_an_enemy_engages_and_memory_decays_to_idle() {
        let config = SimConfig {
            search_memory_ticks: 2,
            ..SimConfig::default()
        };
        let mut world = World::new(8, 3, config).expect("world");
        let id = guard(&mut world, Coord::new(0, 1), Weapon::fists());
        let target = intruder(&mut world, Coord::new(4, 1));
        assert_eq!(world.update_ai_state(id), Some(AiState::Engaging));

        world.mark_for_removal(target);
        world.sweep_removed();
        for expected in [
            AiState::Searching,
            AiState::Searching,
            AiState::Searching,
            AiState::Idle,
        ] {
            if let Some(creature) = world.creature_mut(id) {
                creature.perception.invalidate_all();
            }
            assert_eq!(world.update_ai_state(id), Some(expected));
        }
        assert_eq!(world.creature(id).expect("guard").ai.last_known_enemy, None);
    }

    #[test]
    fn empty_clip_reloads_before_shooting() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let mut rifle = Weapon::new("rifle", WeaponKind::Gun, 6).with_clip(3);
        rifle.ammo = 0;
        let id = guard(&mut world, Coord::new(0, 0), rifle);
        intruder(&mut world, Coord::new(3, 0));
        world.update_ai_state(id);
        world.take_ai_action(id);
        let creature = world.creature(id).expect("guard");
        assert_eq!(creature.weapon.ammo, 3);
        assert_eq!(creature.time_until_next_action, creature.stats.reload_time);
    }

    #[test]
    fn out_of_reach_enemy_is_approached() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let id = guard(&mut world, Coord::new(0, 0), Weapon::fists());
        intruder(&mut world, Coord::new(4, 0));
        world.update_ai_state(id);
        world.take_ai_action(id);
        assert_eq!(
            world.entity(id).map(|entity| entity.position()),
            Some(Coord::new(1, 0))
        );
    }

    #[test]
    fn unreachable_search_goal_is_forgotten() {
        let mut world = World::new(5, 1, SimConfig::default()).expect("world");
        let id = guard(&mut world, Coord::new(0, 0), Weapon::fists());
        world.spawn(EntitySpec::wall(), Coord::new(2, 0)).expect("wall");
        world.alert_to_attacker(id, Coord::new(4, 0));
        world.take_ai_action(id);
        let memory = &world.creature(id).expect("guard").ai;
        assert_eq!(memory.state, AiState::Idle);
        assert_eq!(memory.last_known_enemy, None);
    }

    #[test]
    fn standing_on_the_remembered_tile_looks_around_instead_of_moving() {
        let mut world = World::new(5, 5, SimConfig::default()).expect("world");
        let id = guard(&mut world, Coord::new(2, 2), Weapon::fists());
        world.alert_to_attacker(id, Coord::new(2, 2));
        assert_eq!(world.update_ai_state(id), Some(AiState::Searching));

        world.take_ai_action(id);
        let entity = world.entity(id).expect("guard");
        assert_eq!(entity.position(), Coord::new(2, 2));
        let creature = entity.creature().expect("guard");
        assert!(
            [Direction::NE, Direction::SE].contains(&creature.facing),
            "turned to {:?}",
            creature.facing
        );
        assert_eq!(creature.ai.state, AiState::Searching);
        assert!(creature.time_until_next_action > 0);
    }
}
