use tracing::trace;

use crate::world::{Controller, EntityBody, EntityId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimSystemId {
    CreatureUpkeep,
    CreatureActions,
    Fluids,
    Gases,
    Fire,
    Cleanup,
}

impl SimSystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::CreatureUpkeep => "CreatureUpkeep",
            Self::CreatureActions => "CreatureActions",
            Self::Fluids => "Fluids",
            Self::Gases => "Gases",
            Self::Fire => "Fire",
            Self::Cleanup => "Cleanup",
        }
    }
}

pub const SIM_SYSTEM_ORDER: [SimSystemId; 6] = [
    SimSystemId::CreatureUpkeep,
    SimSystemId::CreatureActions,
    SimSystemId::Fluids,
    SimSystemId::Gases,
    SimSystemId::Fire,
    SimSystemId::Cleanup,
];

#[derive(Debug, Default)]
pub struct SimSystemsHost {
    last_tick_order: Vec<SimSystemId>,
}

impl SimSystemsHost {
    pub fn last_tick_order(&self) -> &[SimSystemId] {
        &self.last_tick_order
    }
}

impl World {
    /// Advances the simulation by one tick, running every system once in the fixed order.
    pub fn tick(&mut self) {
        self.systems.last_tick_order.clear();
        for system_id in SIM_SYSTEM_ORDER {
            self.systems.last_tick_order.push(system_id);
            self.run_system(system_id);
        }
        self.events_mut().finish_tick_rollover();
        self.advance_tick_counter();
        trace!(
            tick = self.tick_count(),
            entities = self.entity_count(),
            "tick_finished"
        );
    }

    pub fn systems_host(&self) -> &SimSystemsHost {
        &self.systems
    }

    fn run_system(&mut self, system_id: SimSystemId) {
        match system_id {
            SimSystemId::CreatureUpkeep => {
                for id in self.active_matching(|body| matches!(body, EntityBody::Creature(_))) {
                    self.creature_upkeep(id);
                }
            }
            SimSystemId::CreatureActions => {
                for id in self.active_matching(|body| matches!(body, EntityBody::Creature(_))) {
                    if !self.is_active(id) {
                        continue;
                    }
                    self.update_ai_state(id);
                    let ready = self.creature(id).is_some_and(|creature| {
                        creature.controller == Controller::Ai && creature.can_act()
                    });
                    if ready {
                        self.take_ai_action(id);
                    }
                }
            }
            SimSystemId::Fluids => {
                for id in self.active_matching(|body| matches!(body, EntityBody::Fluid(_))) {
                    if self.is_active(id) {
                        self.act_fluid(id);
                    }
                }
            }
            SimSystemId::Gases => {
                for id in self.active_matching(|body| matches!(body, EntityBody::Gas(_))) {
                    if self.is_active(id) {
                        self.act_gas(id);
                    }
                }
            }
            SimSystemId::Fire => {
                let burning: Vec<EntityId> = self
                    .entity_ids()
                    .into_iter()
                    .filter(|id| {
                        self.entity(*id).is_some_and(|entity| {
                            !entity.should_remove_from_game()
                                && !entity.is_creature()
                                && entity.is_burning()
                        })
                    })
                    .collect();
                for id in burning {
                    if self.is_active(id) {
                        self.act_fire(id);
                    }
                }
            }
            SimSystemId::Cleanup => {
                let removed = self.sweep_removed();
                if removed > 0 {
                    trace!(removed, "entities_swept");
                }
            }
        }
    }

    /// Snapshot of active ids whose body matches, in id order. Entities spawned while a
    /// system runs wait for the next tick.
    fn active_matching(&self, predicate: impl Fn(&EntityBody) -> bool) -> Vec<EntityId> {
        self.entity_ids()
            .into_iter()
            .filter(|id| {
                self.entity(*id).is_some_and(|entity| {
                    !entity.should_remove_from_game() && predicate(&entity.body)
                })
            })
            .collect()
    }

    fn creature_upkeep(&mut self, id: EntityId) {
        if let Some(creature) = self.creature_mut(id) {
            creature.perception.invalidate_all();
            creature.time_until_next_action = creature.time_until_next_action.saturating_sub(1);
        }
        self.tick_statuses(id);
        if self.is_active(id) {
            self.tick_radiation(id);
        }
        self.tick_power_cooldowns(id);
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::fluid::FluidKind;
    use crate::geometry::Coord;
    use crate::world::{creature_spec, Alignment, Creature};

    use super::*;

    #[test]
    fn tick_runs_systems_in_the_fixed_order() {
        let mut world = World::new(3, 3, SimConfig::default()).expect("world");
        world.tick();
        assert_eq!(world.systems_host().last_tick_order(), SIM_SYSTEM_ORDER.as_slice());
        let names: Vec<&str> = SIM_SYSTEM_ORDER.iter().map(|id| id.name()).collect();
        assert_eq!(
            names,
            ["CreatureUpkeep", "CreatureActions", "Fluids", "Gases", "Fire", "Cleanup"]
        );
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn upkeep_counts_down_action_time() {
        let mut world = World::new(3, 1, SimConfig::default()).expect("world");
        let creature = Creature::new("idler", Alignment::WithPlayer, Weapon::fists())
            .with_controller(Controller::External);
        let id = world
            .spawn(creature_spec(creature, Damageable::new(5), false), Coord::new(0, 0))
            .expect("creature");
        if let Some(creature) = world.creature_mut(id) {
            creature.time_until_next_action = 2;
        }
        world.tick();
        assert!(!world.creature(id).expect("creature").can_act());
        world.tick();
        assert!(world.creature(id).expect("creature").can_act());
    }

    #[test]
    fn lava_kills_and_the_sweep_removes_the_body() {
        let mut world = World::new(3, 1, SimConfig::default()).expect("world");
        let creature = Creature::new("victim", Alignment::WithPlayer, Weapon::fists())
            .with_controller(Controller::External);
        let id = world
            .spawn(creature_spec(creature, Damageable::new(5), false), Coord::new(1, 0))
            .expect("creature");
        world
            .spawn_fluid(FluidKind::Lava, 0, Coord::new(1, 0))
            .expect("lava");
        world.tick();
        assert!(world.entity(id).is_none());
        assert_eq!(world.pending_removal_count(), 0);
    }
}
