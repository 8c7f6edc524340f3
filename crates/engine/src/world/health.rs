use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::status::StatusKind;

use super::{EntityId, World};

impl World {
    /// Applies damage through resistance and armor. Non-positive results change nothing and
    /// emit nothing. Returns the health actually removed.
    pub fn damage_entity(&mut self, target: EntityId, amount: i32, damage_type: DamageType) -> i32 {
        let Some(entity) = self.entity_mut(target) else {
            return 0;
        };
        if !entity.is_targetable() {
            return 0;
        }
        let shielded = entity
            .creature()
            .is_some_and(|creature| creature.statuses.has(StatusKind::Shielded));
        let Some(damageable) = entity.damageable.as_mut() else {
            return 0;
        };
        let mut mitigated = damageable.mitigated_amount(amount, damage_type);
        if shielded {
            mitigated /= 2;
        }
        if mitigated <= 0 {
            return 0;
        }
        let change = damageable.subtract_health(mitigated);
        let is_creature = entity.is_creature();
        self.emit(SimEvent::DamageFlash {
            entity: target,
            amount: change.applied,
            damage_type,
        });
        debug!(
            entity = target.0,
            amount = change.applied,
            damage_type = damage_type.as_token(),
            "entity_damaged"
        );
        if change.reached_zero && self.mark_for_removal(target) {
            if is_creature {
                debug!(entity = target.0, "creature_died");
                self.emit(SimEvent::Died { entity: target });
            } else {
                debug!(entity = target.0, "entity_destroyed");
                self.emit(SimEvent::Destroyed { entity: target });
                self.on_destroyed(target);
            }
        }
        change.applied
    }

    pub fn heal_entity(&mut self, target: EntityId, amount: i32) -> i32 {
        if !self.is_active(target) {
            return 0;
        }
        let healed = self
            .entity_mut(target)
            .and_then(|entity| entity.damageable.as_mut())
            .map(|damageable| damageable.heal(amount))
            .unwrap_or(0);
        if healed > 0 {
            self.emit(SimEvent::Healed {
                entity: target,
                amount: healed,
            });
        }
        healed
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::{Damageable, Resistance, Resistances};
    use crate::events::SimEventKind;
    use crate::geometry::Coord;
    use crate::world::{creature_spec, Alignment, Creature, World};

    use super::*;

    fn spawn_creature(world: &mut World, damageable: Damageable) -> EntityId {
        let creature = Creature::new("test", Alignment::AgainstPlayer, Weapon::fists());
        world
            .spawn(creature_spec(creature, damageable, false), Coord::new(1, 1))
            .expect("creature")
    }

    #[test]
    fn resistant_creature_takes_half_heat_damage() {
        let mut world = World::new(3, 3, SimConfig::default()).expect("world");
        let id = spawn_creature(
            &mut world,
            Damageable::new(100).with_resistances(
                Resistances::default().with(DamageType::Heat, Resistance::Resistant),
            ),
        );
        assert_eq!(world.damage_entity(id, 30, DamageType::Heat), 15);
        let health = world
            .entity(id)
            .and_then(|entity| entity.damageable.as_ref())
            .map(|damageable| damageable.health);
        assert_eq!(health, Some(85));
    }

    #[test]
    fn immune_damage_is_silent_no_op() {
        let mut world = World::new(3, 3, SimConfig::default()).expect("world");
        let id = spawn_creature(
            &mut world,
            Damageable::new(20).with_resistances(
                Resistances::default().with(DamageType::Poison, Resistance::Immune),
            ),
        );
        assert_eq!(world.damage_entity(id, 50, DamageType::Poison), 0);
        assert!(world.is_active(id));
        assert!(world.events().pending().is_empty());
    }

    #[test]
    fn lethal_damage_marks_removal_exactly_once() {
        let mut world = World::new(3, 3, SimConfig::default()).expect("world");
        let id = spawn_creature(&mut world, Damageable::new(10));
        world.damage_entity(id, 40, DamageType::Physical);
        world.damage_entity(id, 40, DamageType::Physical);
        let deaths = world
            .events()
            .pending()
            .iter()
            .filter(|event| event.kind() == SimEventKind::Died)
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(world.pending_removal_count(), 1);
        let health = world
            .entity(id)
            .and_then(|entity| entity.damageable.as_ref())
            .map(|damageable| damageable.health);
        assert_eq!(health, Some(0));
    }
}
