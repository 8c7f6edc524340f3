//! Targeted and self-directed abilities with cooldowns and upgrade levels.
//!
//! Feasibility (`can_activate_power`, `resolve_power_target`) is side-effect free so the AI and
//! any input layer can query it before committing.

mod levels;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::fluid::{FluidKind, GasKind};
use crate::geometry::{chebyshev_distance, distance, Coord};
use crate::status::{StatusEffect, StatusKind, StatusSource};
use crate::traps::WireOrientation;
use crate::world::{EntityId, World};

pub use levels::{level_table, PowerLevel};

const TRIP_WIRE_STUN_TICKS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    Fireball,
    Lightning,
    Blink,
    ForcePush,
    Flood,
    TripWire,
    Regenerate,
    SmokeScreen,
}

impl PowerKind {
    pub const ALL: [PowerKind; 8] = [
        PowerKind::Fireball,
        PowerKind::Lightning,
        PowerKind::Blink,
        PowerKind::ForcePush,
        PowerKind::Flood,
        PowerKind::TripWire,
        PowerKind::Regenerate,
        PowerKind::SmokeScreen,
    ];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Fireball => "fireball",
            Self::Lightning => "lightning",
            Self::Blink => "blink",
            Self::ForcePush => "force_push",
            Self::Flood => "flood",
            Self::TripWire => "trip_wire",
            Self::Regenerate => "regenerate",
            Self::SmokeScreen => "smoke_screen",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_token() == token)
    }

    pub fn is_targeted(self) -> bool {
        !matches!(self, Self::Regenerate | Self::SmokeScreen)
    }

    /// Whether the resolved target may be a tile that blocks movement.
    pub fn can_target_movement_blocker(self) -> bool {
        matches!(self, Self::Fireball | Self::Lightning | Self::ForcePush)
    }

    pub fn max_level(self) -> u8 {
        level_table(self).len() as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Power {
    pub kind: PowerKind,
    level: u8,
    pub cooldown_remaining: u32,
}

impl Power {
    pub fn new(kind: PowerKind) -> Self {
        Self {
            kind,
            level: 1,
            cooldown_remaining: 0,
        }
    }

    /// Sets the level, clamped to the power's table.
    #[must_use]
    pub fn at_level(mut self, level: u8) -> Self {
        self.level = level.clamp(1, self.kind.max_level().max(1));
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn stats(&self) -> PowerLevel {
        let table = level_table(self.kind);
        let index = usize::from(self.level.saturating_sub(1)).min(table.len().saturating_sub(1));
        table[index]
    }

    /// Moves to the next level. False at the top of the table.
    pub fn upgrade(&mut self) -> bool {
        if self.level >= self.kind.max_level() {
            return false;
        }
        self.level += 1;
        true
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining == 0
    }
}

impl World {
    fn power(&self, owner: EntityId, slot: usize) -> Option<&Power> {
        self.creature(owner)?.powers.get(slot)
    }

    /// True when the owner may act and the power in `slot` is off cooldown.
    pub fn can_activate_power(&self, owner: EntityId, slot: usize) -> bool {
        if !self.is_active(owner) {
            return false;
        }
        let Some(creature) = self.creature(owner) else {
            return false;
        };
        creature.can_act() && creature.powers.get(slot).is_some_and(Power::is_ready)
    }

    /// Clamps `selection` to the power's range along the line from the owner, then rejects a
    /// movement-blocking result when the power does not allow one.
    pub fn resolve_power_target(
        &self,
        owner: EntityId,
        slot: usize,
        selection: Coord,
    ) -> Option<Coord> {
        let power = self.power(owner, slot)?;
        if !power.kind.is_targeted() {
            return None;
        }
        let origin = self.entity(owner)?.position();
        let range = power.stats().range;
        let clamped = self
            .line_between(origin, selection)
            .into_iter()
            .take_while(|coord| distance(origin, *coord) <= range + 1e-9)
            .last()?;
        if clamped == origin {
            return None;
        }
        let blocked = self.tile(clamped)?.blocks_movement();
        if blocked && !power.kind.can_target_movement_blocker() {
            return None;
        }
        Some(clamped)
    }

    /// Performs the power. Targeted powers need a selection; callers check for one first.
    pub(crate) fn activate_power(
        &mut self,
        owner: EntityId,
        slot: usize,
        selection: Option<Coord>,
    ) -> bool {
        if !self.can_activate_power(owner, slot) {
            return false;
        }
        let Some(power) = self.power(owner, slot).cloned() else {
            return false;
        };
        let Some(origin) = self.entity(owner).map(|entity| entity.position()) else {
            return false;
        };
        let target = if power.kind.is_targeted() {
            debug_assert!(selection.is_some(), "targeted power activated without a selection");
            let Some(selection) = selection else {
                return false;
            };
            let Some(target) = self.resolve_power_target(owner, slot, selection) else {
                return false;
            };
            Some(target)
        } else {
            None
        };

        let stats = power.stats();
        match (power.kind, target) {
            (PowerKind::Fireball, Some(target)) => {
                self.explode(target, stats.area, stats.magnitude);
            }
            (PowerKind::Lightning, Some(target)) => self.strike_lightning(target, stats.magnitude),
            (PowerKind::Blink, Some(target)) => {
                if self.update_position(owner, target) {
                    self.on_entered_tile(owner, target);
                    self.refresh_enemy_memory(owner);
                }
            }
            (PowerKind::ForcePush, Some(target)) => {
                for creature in self.creatures_at(target) {
                    if creature != owner {
                        self.knockback(creature, origin, stats.area, stats.magnitude);
                    }
                }
            }
            (PowerKind::Flood, Some(target)) => {
                self.spawn_fluid(FluidKind::Water, stats.magnitude.max(0) as u32, target);
            }
            (PowerKind::TripWire, Some(target)) => {
                let (facing, alignment) = match self.creature(owner) {
                    Some(creature) => (creature.facing, creature.alignment),
                    None => return false,
                };
                self.deploy_trip_wire(
                    target,
                    WireOrientation::across(facing),
                    stats.area,
                    Some(alignment),
                    stats.magnitude,
                    TRIP_WIRE_STUN_TICKS,
                );
            }
            (PowerKind::Regenerate, _) => {
                self.add_status(
                    owner,
                    StatusEffect::new(
                        StatusKind::Regenerating,
                        StatusSource::Entity(owner),
                        stats.area,
                    )
                    .with_magnitude(stats.magnitude),
                );
            }
            (PowerKind::SmokeScreen, _) => self.raise_smoke(origin, stats.area, stats.magnitude),
            (_, None) => return false,
        }

        if let Some(creature) = self.creature_mut(owner) {
            if let Some(slot) = creature.powers.get_mut(slot) {
                slot.cooldown_remaining = stats.cooldown;
            }
            let cost = creature.stats.attack_time;
            creature.spend_action(cost);
        }
        debug!(
            owner = owner.0,
            power = power.kind.as_token(),
            level = power.level(),
            "power_activated"
        );
        self.emit(SimEvent::PowerActivated {
            owner,
            power: power.kind,
            target,
        });
        true
    }

    /// Direct hit on the target tile plus conduction. Conductors reached by the current are
    /// not struck twice.
    fn strike_lightning(&mut self, target: Coord, damage: i32) {
        let conducted = self.shock_victims(target);
        for victim in self.damageables_at(target) {
            if !conducted.contains(&victim) {
                self.damage_entity(victim, damage, DamageType::Electric);
            }
        }
        self.conduct(target, damage);
    }

    fn raise_smoke(&mut self, center: Coord, radius: u32, pressure: i32) {
        let reach = radius as i32;
        for y in (center.y - reach)..=(center.y + reach) {
            for x in (center.x - reach)..=(center.x + reach) {
                let coord = Coord::new(x, y);
                if chebyshev_distance(center, coord) > radius {
                    continue;
                }
                let open = self
                    .tile(coord)
                    .is_some_and(|tile| !tile.has_non_creature_blocker());
                if open {
                    self.spawn_gas(GasKind::Smoke, pressure.max(1) as u32, coord);
                }
            }
        }
    }

    pub(crate) fn tick_power_cooldowns(&mut self, owner: EntityId) {
        if let Some(creature) = self.creature_mut(owner) {
            for power in &mut creature.powers {
                power.cooldown_remaining = power.cooldown_remaining.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::geometry::Direction;
    use crate::world::{creature_spec, Alignment, Creature, EntitySpec};

    use super::*;

    fn caster(world: &mut World, at: Coord, power: Power) -> EntityId {
        let creature = Creature::new("adept", Alignment::WithPlayer, Weapon::fists())
            .with_facing(Direction::E)
            .with_power(power);
        world
            .spawn(creature_spec(creature, Damageable::new(20), false), at)
            .expect("caster")
    }

    #[test]
    fn selection_beyond_range_is_clamped_along_the_line() {
        let mut world = World::new(12, 1, SimConfig::default()).expect("world");
        let owner = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Blink));
        assert_eq!(
            world.resolve_power_target(owner, 0, Coord::new(10, 0)),
            Some(Coord::new(4, 0))
        );
    }

    #[test]
    fn blink_rejects_a_wall_but_fireball_accepts_it() {
        let mut world = World::new(6, 1, SimConfig::default()).expect("world");
        world.spawn(EntitySpec::wall(), Coord::new(3, 0)).expect("wall");
        let blinker = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Blink));
        assert_eq!(world.resolve_power_target(blinker, 0, Coord::new(3, 0)), None);

        let mut world = World::new(6, 1, SimConfig::default()).expect("world");
        world.spawn(EntitySpec::wall(), Coord::new(3, 0)).expect("wall");
        let pyro = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Fireball));
        assert_eq!(
            world.resolve_power_target(pyro, 0, Coord::new(3, 0)),
            Some(Coord::new(3, 0))
        );
    }

    #[test]
    fn activation_starts_the_cooldown_and_costs_the_turn() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let owner = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Blink));
        assert!(world.activate_power(owner, 0, Some(Coord::new(3, 0))));
        assert_eq!(
            world.entity(owner).map(|entity| entity.position()),
            Some(Coord::new(3, 0))
        );
        let creature = world.creature(owner).expect("caster");
        assert_eq!(creature.powers[0].cooldown_remaining, 10);
        assert!(creature.time_until_next_action > 0);
        assert!(!world.can_activate_power(owner, 0));
    }

    #[test]
    fn levels_remap_parameters_from_the_table() {
        let mut fireball = Power::new(PowerKind::Fireball);
        assert_eq!(fireball.stats().magnitude, 12);
        assert!(fireball.upgrade());
        assert!(fireball.upgrade());
        assert!(!fireball.upgrade());
        assert_eq!(fireball.stats(), level_table(PowerKind::Fireball)[2]);
        assert_eq!(Power::new(PowerKind::Flood).at_level(9).level(), 2);
    }

    #[test]
    fn regenerate_is_self_directed() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        let owner = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Regenerate));
        assert!(world.activate_power(owner, 0, None));
        let regenerating = world
            .creature(owner)
            .is_some_and(|creature| creature.statuses.has(StatusKind::Regenerating));
        assert!(regenerating);
    }

    #[test]
    fn blinking_into_view_remembers_the_enemy() {
        let mut world = World::new(12, 1, SimConfig::default()).expect("world");
        let owner = caster(&mut world, Coord::new(0, 0), Power::new(PowerKind::Blink));
        let foe = Creature::new("foe", Alignment::AgainstPlayer, Weapon::fists());
        world
            .spawn(creature_spec(foe, Damageable::new(20), false), Coord::new(9, 0))
            .expect("foe");

        assert!(world.activate_power(owner, 0, Some(Coord::new(3, 0))));
        assert_eq!(
            world.creature(owner).expect("caster").ai.last_known_enemy,
            Some(Coord::new(9, 0))
        );
    }
}
