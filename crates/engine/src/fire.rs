use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::fluid::GasKind;
use crate::geometry::Coord;
use crate::status::{StatusEffect, StatusKind, StatusSource};
use crate::world::{EntityId, World};

impl World {
    /// Sets a flammable entity alight. A no-op for non-flammables and for anything already
    /// burning, so repeated calls never reset the burn timer.
    pub fn start_burning(&mut self, id: EntityId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        let burn_damage = self.config().burn_damage_per_tick;
        let Some(entity) = self.entity_mut(id) else {
            return false;
        };
        let is_creature = entity.is_creature();
        let Some(flammable) = entity.flammable.as_mut() else {
            return false;
        };
        if flammable.is_burning {
            return false;
        }
        flammable.is_burning = true;
        flammable.burning_duration = 0;
        let max_duration = flammable.max_burning_duration;

        debug!(entity = id.0, "entity_ignited");
        self.emit(SimEvent::Ignited { entity: id });
        if is_creature {
            self.add_status(
                id,
                StatusEffect::new(StatusKind::Burning, StatusSource::Environment, max_duration)
                    .with_magnitude(burn_damage),
            );
        }
        true
    }

    /// Puts out a fire. Creatures lose their `Burning` status, whose finalizer clears the flag.
    pub fn stop_burning(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        if !entity.is_burning() {
            return false;
        }
        if entity.is_creature() && self.remove_status(id, StatusKind::Burning) {
            return true;
        }
        self.clear_burning_flag(id)
    }

    pub(crate) fn clear_burning_flag(&mut self, id: EntityId) -> bool {
        let Some(flammable) = self
            .entity_mut(id)
            .and_then(|entity| entity.flammable.as_mut())
        else {
            return false;
        };
        if !flammable.is_burning {
            return false;
        }
        flammable.is_burning = false;
        flammable.burning_duration = 0;
        debug!(entity = id.0, "entity_extinguished");
        self.emit(SimEvent::Extinguished { entity: id });
        true
    }

    pub fn extinguish_tile(&mut self, at: Coord) {
        let flammables = self
            .tile(at)
            .map(|tile| tile.flammables().to_vec())
            .unwrap_or_default();
        for id in flammables {
            self.stop_burning(id);
        }
    }

    /// One fire tick for a burning non-creature: self-damage, spread, smoke, and burn-out.
    pub(crate) fn act_fire(&mut self, id: EntityId) {
        let Some(entity) = self.entity(id) else {
            return;
        };
        if entity.is_creature() || !entity.is_burning() || entity.should_remove_from_game() {
            return;
        }
        let at = entity.position();
        let Some(flammable) = entity.flammable.clone() else {
            return;
        };

        let burn_damage = self.config().burn_damage_per_tick;
        self.damage_entity(id, burn_damage, DamageType::Heat);

        let collocated: Vec<EntityId> = self
            .tile(at)
            .map(|tile| tile.flammables().to_vec())
            .unwrap_or_default();
        for other in collocated.into_iter().filter(|other| *other != id) {
            if self.rng_mut().chance(flammable.burn_collocated_chance) {
                self.start_burning(other);
            }
        }
        for neighbor in at.neighbors4() {
            let adjacent = self
                .tile(neighbor)
                .map(|tile| tile.flammables().to_vec())
                .unwrap_or_default();
            for other in adjacent {
                if self.rng_mut().chance(flammable.burn_adjacent_chance) {
                    self.start_burning(other);
                }
            }
        }

        let smoke_chance = self.config().burn_smoke_chance;
        if self.rng_mut().chance(smoke_chance) {
            let pressure = self.config().smoke_pressure;
            self.spawn_gas(GasKind::Smoke, pressure, at);
        }

        if !self.is_active(id) {
            return;
        }
        let Some(flammable) = self
            .entity_mut(id)
            .and_then(|entity| entity.flammable.as_mut())
        else {
            return;
        };
        flammable.burning_duration = flammable.burning_duration.saturating_add(1);
        if flammable.burning_duration < flammable.max_burning_duration {
            return;
        }
        if flammable.consumed_when_burnt {
            if self.mark_for_removal(id) {
                debug!(entity = id.0, "entity_burnt_out");
                self.emit(SimEvent::Destroyed { entity: id });
                self.on_destroyed(id);
            }
        } else {
            self.clear_burning_flag(id);
        }
    }
}
