//! Fluid and gas cells. Each cell acts once per tick with no global pressure pass, so spread is
//! stochastic and may be locally lopsided.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::geometry::Coord;
use crate::world::{
    ElectricallyConductive, EntityBody, EntityId, EntitySpec, Flammable, Layer, World,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidKind {
    Water,
    Lava,
    Oil,
    ToxicWaste,
}

impl FluidKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Lava => "lava",
            Self::Oil => "oil",
            Self::ToxicWaste => "toxic waste",
        }
    }

    /// Water-like fluids put out fires on their tile.
    pub fn extinguishes(self) -> bool {
        matches!(self, Self::Water | Self::ToxicWaste)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasKind {
    Steam,
    Smoke,
}

impl GasKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::Smoke => "smoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidCell {
    pub kind: FluidKind,
    pub pressure: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCell {
    pub kind: GasKind,
    pub pressure: u32,
}

pub fn fluid_spec(kind: FluidKind, pressure: u32) -> EntitySpec {
    let spec = EntitySpec::new(
        kind.name(),
        Layer::Fluid,
        EntityBody::Fluid(FluidCell { kind, pressure }),
    );
    match kind {
        FluidKind::Water | FluidKind::ToxicWaste => spec.with_conductive(ElectricallyConductive {
            shocks_occupants: true,
        }),
        FluidKind::Oil => spec.with_flammable(Flammable::new(6, 0.6, 0.9).consumed()),
        FluidKind::Lava => spec,
    }
}

pub fn gas_spec(kind: GasKind, pressure: u32) -> EntitySpec {
    let spec = EntitySpec::new(
        kind.name(),
        Layer::Gas,
        EntityBody::Gas(GasCell { kind, pressure }),
    );
    match kind {
        GasKind::Smoke => spec.blocking(false, true),
        GasKind::Steam => spec,
    }
}

/// One side of a pairwise reaction check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidSample {
    pub kind: FluidKind,
    pub pressure: u32,
    pub burning: bool,
}

/// What a reaction does to each participant. `None` steam means no gas is produced there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaction {
    pub remove_first: bool,
    pub remove_second: bool,
    pub steam_on_first: Option<u32>,
    pub steam_on_second: Option<u32>,
}

impl Reaction {
    fn mirrored(self) -> Self {
        Self {
            remove_first: self.remove_second,
            remove_second: self.remove_first,
            steam_on_first: self.steam_on_second,
            steam_on_second: self.steam_on_first,
        }
    }
}

/// Pairwise reaction table. Swapping the arguments mirrors the result.
pub fn react(first: FluidSample, second: FluidSample, steam_pressure: u32) -> Option<Reaction> {
    match (first.kind, second.kind) {
        (FluidKind::Water, FluidKind::Lava) | (FluidKind::Lava, FluidKind::Water) => {
            Some(Reaction {
                remove_first: true,
                remove_second: true,
                steam_on_first: Some(steam_pressure),
                steam_on_second: Some(steam_pressure),
            })
        }
        (FluidKind::Water, FluidKind::Oil) if second.burning => Some(Reaction {
            remove_first: false,
            remove_second: true,
            steam_on_first: None,
            steam_on_second: Some((second.pressure / 2).max(1)),
        }),
        (FluidKind::Oil, FluidKind::Water) if first.burning => {
            react(second, first, steam_pressure).map(Reaction::mirrored)
        }
        _ => None,
    }
}

impl World {
    fn fluid_cell(&self, id: EntityId) -> Option<FluidCell> {
        match self.entity(id)?.body {
            EntityBody::Fluid(cell) => Some(cell),
            _ => None,
        }
    }

    fn gas_cell(&self, id: EntityId) -> Option<GasCell> {
        match self.entity(id)?.body {
            EntityBody::Gas(cell) => Some(cell),
            _ => None,
        }
    }

    fn fluid_sample(&self, id: EntityId) -> Option<FluidSample> {
        let cell = self.fluid_cell(id)?;
        Some(FluidSample {
            kind: cell.kind,
            pressure: cell.pressure,
            burning: self.entity(id)?.is_burning(),
        })
    }

    fn set_cell_pressure(&mut self, id: EntityId, pressure: u32) {
        match self.entity_mut(id).map(|entity| &mut entity.body) {
            Some(EntityBody::Fluid(cell)) => cell.pressure = pressure,
            Some(EntityBody::Gas(cell)) => cell.pressure = pressure,
            _ => {}
        }
    }

    /// Places a fluid unless the tile already holds one (including one awaiting removal).
    pub fn spawn_fluid(&mut self, kind: FluidKind, pressure: u32, at: Coord) -> Option<EntityId> {
        if self.tile(at)?.fluid().is_some() {
            return None;
        }
        self.spawn(fluid_spec(kind, pressure), at).ok()
    }

    /// Places a gas. An existing gas of the same kind is topped up to `pressure` instead.
    pub fn spawn_gas(&mut self, kind: GasKind, pressure: u32, at: Coord) -> Option<EntityId> {
        if let Some(existing) = self.tile(at)?.gas() {
            let cell = self.gas_cell(existing)?;
            if cell.kind == kind && self.is_active(existing) {
                self.set_cell_pressure(existing, cell.pressure.max(pressure));
                return Some(existing);
            }
            return None;
        }
        self.spawn(gas_spec(kind, pressure), at).ok()
    }

    /// Tiles a cell could spread onto: in bounds, no terrain, no solid non-creature blocker.
    fn spread_candidates(&self, at: Coord, is_gas: bool) -> Vec<Coord> {
        at.neighbors4()
            .into_iter()
            .filter(|coord| {
                self.tile(*coord).is_some_and(|tile| {
                    let slot_free = if is_gas {
                        tile.gas().is_none()
                    } else {
                        tile.fluid().is_none()
                    };
                    slot_free && !tile.has_terrain() && !tile.has_non_creature_blocker()
                })
            })
            .collect()
    }

    /// Rolls `pressure / scale` and, on success, spawns a same-kind child with one less pressure.
    fn try_expand(&mut self, id: EntityId, at: Coord, pressure: u32, is_gas: bool) {
        if pressure == 0 {
            return;
        }
        let scale = self.config().expansion_pressure_scale.max(1);
        let chance = f64::from(pressure) / f64::from(scale);
        if !self.rng_mut().chance(chance) {
            return;
        }
        let candidates = self.spread_candidates(at, is_gas);
        let Some(target) = self.rng_mut().choose(&candidates) else {
            return;
        };
        let child_pressure = pressure - 1;
        let spawned = if is_gas {
            match self.gas_cell(id) {
                Some(cell) => self.spawn_gas(cell.kind, child_pressure, target),
                None => None,
            }
        } else {
            match self.fluid_cell(id) {
                Some(cell) => self.spawn_fluid(cell.kind, child_pressure, target),
                None => None,
            }
        };
        if spawned.is_some() {
            trace!(
                parent = id.0,
                x = target.x,
                y = target.y,
                pressure = child_pressure,
                "cell_expanded"
            );
            self.set_cell_pressure(id, child_pressure);
        }
    }

    pub(crate) fn act_fluid(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        let Some(entity) = self.entity(id) else {
            return;
        };
        let at = entity.position();

        for neighbor in at.neighbors4() {
            let Some(other) = self.fluid_at(neighbor) else {
                continue;
            };
            if self.react_pair(id, other) {
                return;
            }
        }

        let Some(cell) = self.fluid_cell(id) else {
            return;
        };
        self.apply_fluid_contact(cell.kind, at);
        if self.is_active(id) {
            self.try_expand(id, at, cell.pressure, false);
        }
    }

    /// Runs the reaction table for two fluid entities. True when anything happened.
    pub fn react_pair(&mut self, first: EntityId, second: EntityId) -> bool {
        let (Some(a), Some(b)) = (self.fluid_sample(first), self.fluid_sample(second)) else {
            return false;
        };
        let steam_pressure = self.config().steam_pressure;
        let Some(reaction) = react(a, b, steam_pressure) else {
            return false;
        };
        let (Some(first_at), Some(second_at)) = (
            self.entity(first).map(|entity| entity.position()),
            self.entity(second).map(|entity| entity.position()),
        ) else {
            return false;
        };
        if reaction.remove_first {
            self.mark_for_removal(first);
        }
        if reaction.remove_second {
            self.mark_for_removal(second);
        }
        for (at, steam) in [
            (first_at, reaction.steam_on_first),
            (second_at, reaction.steam_on_second),
        ] {
            if let Some(pressure) = steam {
                self.spawn_gas(GasKind::Steam, pressure, at);
                self.emit(SimEvent::FluidReaction {
                    at,
                    product: GasKind::Steam,
                });
            }
        }
        debug!(
            first = first.0,
            second = second.0,
            first_kind = a.kind.name(),
            second_kind = b.kind.name(),
            "fluid_reaction"
        );
        true
    }

    fn apply_fluid_contact(&mut self, kind: FluidKind, at: Coord) {
        match kind {
            FluidKind::Lava => {
                let damage = self.config().lava_heat_damage;
                for creature in self.creatures_at(at) {
                    self.damage_entity(creature, damage, DamageType::Heat);
                }
                let flammables = self
                    .tile(at)
                    .map(|tile| tile.flammables().to_vec())
                    .unwrap_or_default();
                for flammable in flammables {
                    self.start_burning(flammable);
                }
            }
            FluidKind::Water => self.extinguish_tile(at),
            FluidKind::ToxicWaste => {
                self.extinguish_tile(at);
                let chance = self.config().toxic_irradiate_chance;
                let dose = self.config().toxic_rads_per_exposure;
                let mut exposed = self.creatures_at(at);
                for neighbor in at.neighbors8() {
                    exposed.extend(self.creatures_at(neighbor));
                }
                for creature in exposed {
                    if self.rng_mut().chance(chance) {
                        self.irradiate(creature, dose);
                    }
                }
            }
            FluidKind::Oil => {}
        }
    }

    pub(crate) fn act_gas(&mut self, id: EntityId) {
        if !self.is_active(id) {
            return;
        }
        let (Some(cell), Some(at)) = (
            self.gas_cell(id),
            self.entity(id).map(|entity| entity.position()),
        ) else {
            return;
        };
        let pressure = cell
            .pressure
            .saturating_sub(self.config().gas_depletion_per_tick);
        if pressure == 0 {
            trace!(entity = id.0, gas = cell.kind.name(), "gas_dissipated");
            self.mark_for_removal(id);
            return;
        }
        self.set_cell_pressure(id, pressure);
        if cell.kind == GasKind::Steam {
            let damage = self.config().steam_scald_damage;
            for creature in self.creatures_at(at) {
                self.damage_entity(creature, damage, DamageType::Heat);
            }
        }
        self.try_expand(id, at, pressure, true);
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::world::{creature_spec, Alignment, Creature};

    use super::*;

    fn spawn_creature(world: &mut World, at: Coord) -> EntityId {
        let creature = Creature::new("wader", Alignment::AgainstPlayer, Weapon::fists());
        world
            .spawn(creature_spec(creature, Damageable::new(20), false), at)
            .expect("creature")
    }

    fn sample(kind: FluidKind, pressure: u32, burning: bool) -> FluidSample {
        FluidSample {
            kind,
            pressure,
            burning,
        }
    }

    #[test]
    fn water_and_lava_react_the_same_in_either_order() {
        let water = sample(FluidKind::Water, 3, false);
        let lava = sample(FluidKind::Lava, 7, false);
        let forward = react(water, lava, 5).expect("reaction");
        let backward = react(lava, water, 5).expect("reaction");
        assert!(forward.remove_first && forward.remove_second);
        assert_eq!(forward, backward.mirrored());
        assert_eq!(forward.steam_on_first, Some(5));
        assert_eq!(forward.steam_on_second, Some(5));
    }

    #[test]
    fn water_quenches_only_burning_oil_at_half_pressure() {
        let water = sample(FluidKind::Water, 3, false);
        assert_eq!(react(water, sample(FluidKind::Oil, 8, false), 5), None);

        let quench = react(water, sample(FluidKind::Oil, 8, true), 5).expect("reaction");
        assert!(!quench.remove_first);
        assert!(quench.remove_second);
        assert_eq!(quench.steam_on_second, Some(4));

        let mirrored = react(sample(FluidKind::Oil, 8, true), water, 5).expect("reaction");
        assert_eq!(mirrored, quench.mirrored());
    }

    #[test]
    fn adjacent_water_and_lava_leave_only_steam() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        let water = world
            .spawn_fluid(FluidKind::Water, 1, Coord::new(0, 0))
            .expect("water");
        let lava = world
            .spawn_fluid(FluidKind::Lava, 1, Coord::new(1, 0))
            .expect("lava");
        world.act_fluid(lava);
        assert!(!world.is_active(water));
        assert!(!world.is_active(lava));
        assert_eq!(world.gas_kind_at(Coord::new(0, 0)), Some(GasKind::Steam));
        assert_eq!(world.gas_kind_at(Coord::new(1, 0)), Some(GasKind::Steam));
    }

    #[test]
    fn expansion_passes_reduced_pressure_and_avoids_walls() {
        let config = SimConfig {
            expansion_pressure_scale: 1,
            ..SimConfig::default()
        };
        let mut world = World::new(3, 1, config).expect("world");
        world
            .spawn(EntitySpec::wall(), Coord::new(0, 0))
            .expect("wall");
        let oil = world
            .spawn_fluid(FluidKind::Oil, 4, Coord::new(1, 0))
            .expect("oil");
        world.act_fluid(oil);

        let child = world.fluid_at(Coord::new(2, 0)).expect("child");
        assert_eq!(world.fluid_cell(child).map(|cell| cell.pressure), Some(3));
        assert_eq!(world.fluid_cell(oil).map(|cell| cell.pressure), Some(3));
        assert!(world.fluid_at(Coord::new(0, 0)).is_none());
    }

    #[test]
    fn gas_depletes_and_removes_itself() {
        let mut world = World::new(1, 1, SimConfig::default()).expect("world");
        let smoke = world
            .spawn_gas(GasKind::Smoke, 2, Coord::new(0, 0))
            .expect("smoke");
        assert!(world.tile(Coord::new(0, 0)).expect("tile").blocks_view());
        world.act_gas(smoke);
        assert!(world.is_active(smoke));
        world.act_gas(smoke);
        assert!(!world.is_active(smoke));
        world.sweep_removed();
        assert!(!world.tile(Coord::new(0, 0)).expect("tile").blocks_view());
    }

    #[test]
    fn toxic_waste_irradiates_its_surroundings_and_douses_fire() {
        let config = SimConfig {
            toxic_irradiate_chance: 1.0,
            ..SimConfig::default()
        };
        let mut world = World::new(3, 2, config).expect("world");
        let crate_id = world
            .spawn(EntitySpec::crate_prop(), Coord::new(1, 0))
            .expect("crate");
        assert!(world.start_burning(crate_id));
        let toxic = world
            .spawn_fluid(FluidKind::ToxicWaste, 0, Coord::new(1, 0))
            .expect("toxic");
        let beside = spawn_creature(&mut world, Coord::new(0, 0));
        let diagonal = spawn_creature(&mut world, Coord::new(2, 1));

        world.act_fluid(toxic);
        let rads = |id: EntityId| world.creature(id).map(|creature| creature.rads);
        assert_eq!(rads(beside), Some(5));
        assert_eq!(rads(diagonal), Some(5));
        assert!(!world.entity(crate_id).expect("crate").is_burning());
    }

    #[test]
    fn water_quenches_burning_oil_next_door_into_steam() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        let water = world
            .spawn_fluid(FluidKind::Water, 3, Coord::new(0, 0))
            .expect("water");
        let oil = world
            .spawn_fluid(FluidKind::Oil, 8, Coord::new(1, 0))
            .expect("oil");
        assert!(world.start_burning(oil));

        world.act_fluid(water);
        assert!(world.is_active(water));
        assert!(!world.is_active(oil));
        let steam = world
            .tile(Coord::new(1, 0))
            .and_then(|tile| tile.gas())
            .and_then(|id| world.gas_cell(id))
            .expect("steam");
        assert_eq!(steam.kind, GasKind::Steam);
        assert_eq!(steam.pressure, 4);
        assert!(world.gas_kind_at(Coord::new(0, 0)).is_none());
    }

    #[test]
    fn steam_scalds_whoever_stands_in_it() {
        let mut world = World::new(1, 1, SimConfig::default()).expect("world");
        let victim = spawn_creature(&mut world, Coord::new(0, 0));
        let steam = world
            .spawn_gas(GasKind::Steam, 3, Coord::new(0, 0))
            .expect("steam");
        world.act_gas(steam);
        let health = world
            .entity(victim)
            .and_then(|entity| entity.damageable.as_ref())
            .map(|damageable| damageable.health);
        assert_eq!(health, Some(18));
        assert_eq!(world.gas_cell(steam).map(|cell| cell.pressure), Some(2));
    }
}
