use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::fluid::FluidKind;
use crate::geometry::{distance, Coord};
use crate::world::{BarrelContents, EntityBody, EntityId, PropKind, World};

/// Pressure of the fluid released by a destroyed barrel.
pub const BARREL_SPILL_PRESSURE: u32 = 6;
pub const BARREL_EXPLOSION_RADIUS: u32 = 2;
pub const BARREL_EXPLOSION_DAMAGE: i32 = 25;

impl World {
    /// Follow-up effects once a non-creature has been destroyed.
    pub(crate) fn on_destroyed(&mut self, id: EntityId) {
        let Some(entity) = self.entity(id) else {
            return;
        };
        let at = entity.position();
        let EntityBody::Prop(PropKind::Barrel(contents)) = entity.body else {
            return;
        };
        debug!(entity = id.0, ?contents, "barrel_breached");
        match contents {
            BarrelContents::Explosive => {
                self.explode(at, BARREL_EXPLOSION_RADIUS, BARREL_EXPLOSION_DAMAGE);
            }
            BarrelContents::Oil => {
                self.spawn_fluid(FluidKind::Oil, BARREL_SPILL_PRESSURE, at);
            }
            BarrelContents::Water => {
                self.spawn_fluid(FluidKind::Water, BARREL_SPILL_PRESSURE, at);
            }
            BarrelContents::ToxicWaste => {
                self.spawn_fluid(FluidKind::ToxicWaste, BARREL_SPILL_PRESSURE, at);
            }
        }
    }

    /// Heat damage and ignition for everything within `radius` that the blast can see.
    /// Chained barrels detonate at most once because removal-flagged entities are not targetable.
    pub fn explode(&mut self, center: Coord, radius: u32, damage: i32) {
        if !self.in_bounds(center) {
            return;
        }
        self.emit(SimEvent::Explosion { center, radius });
        debug!(x = center.x, y = center.y, radius, damage, "explosion");

        let reach = radius as i32;
        let mut affected = Vec::new();
        for y in (center.y - reach)..=(center.y + reach) {
            for x in (center.x - reach)..=(center.x + reach) {
                let coord = Coord::new(x, y);
                if distance(center, coord) > f64::from(radius) || !self.in_bounds(coord) {
                    continue;
                }
                if coord != center && !self.has_line_of_sight(center, coord) {
                    continue;
                }
                affected.push(coord);
            }
        }

        for coord in &affected {
            for target in self.damageables_at(*coord) {
                self.damage_entity(target, damage, DamageType::Heat);
            }
        }
        for coord in affected {
            let flammables = self
                .tile(coord)
                .map(|tile| tile.flammables().to_vec())
                .unwrap_or_default();
            for id in flammables {
                self.start_burning(id);
            }
        }
    }

    pub fn irradiate(&mut self, id: EntityId, dose: u32) {
        if let Some(creature) = self.creature_mut(id) {
            creature.rads = creature.rads.saturating_add(dose);
        }
    }

    /// Radiation sickness above the threshold, then decay.
    pub(crate) fn tick_radiation(&mut self, id: EntityId) {
        let threshold = self.config().radiation_sickness_threshold;
        let damage = self.config().radiation_damage_per_tick;
        let decay = self.config().rads_decay_per_tick;
        let Some(rads) = self.creature(id).map(|creature| creature.rads) else {
            return;
        };
        if rads > threshold {
            self.damage_entity(id, damage, DamageType::Radiation);
        }
        if let Some(creature) = self.creature_mut(id) {
            creature.rads = creature.rads.saturating_sub(decay);
        }
    }
}
