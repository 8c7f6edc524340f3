use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::geometry::Coord;
use crate::world::{EntityId, World};

impl World {
    fn has_conductor(&self, at: Coord) -> bool {
        self.tile(at).is_some_and(|tile| {
            tile.conductive()
                .iter()
                .any(|id| self.is_active(*id))
        })
    }

    /// Victims on one electrified tile: damageable conductors plus every creature standing in a
    /// conductor that shocks its occupants. Each entity appears once.
    pub(crate) fn shock_victims(&self, at: Coord) -> Vec<EntityId> {
        let Some(tile) = self.tile(at) else {
            return Vec::new();
        };
        let mut victims = Vec::new();
        let mut shocks_occupants = false;
        for id in tile.conductive() {
            let Some(entity) = self.entity(*id) else {
                continue;
            };
            if entity.should_remove_from_game() {
                continue;
            }
            shocks_occupants |= entity
                .conductive
                .is_some_and(|conductive| conductive.shocks_occupants);
            if entity.is_targetable() {
                victims.push(*id);
            }
        }
        if shocks_occupants {
            for creature in tile.creatures() {
                if !victims.contains(creature) {
                    victims.push(*creature);
                }
            }
        }
        victims
    }

    /// Flood-fills electricity from `source` through 4-connected tiles holding conductors.
    /// Every tile is visited at most once. Returns the tiles reached, in visit order.
    pub fn conduct(&mut self, source: Coord, damage: i32) -> Vec<Coord> {
        let mut reached = Vec::new();
        if !self.has_conductor(source) {
            return reached;
        }
        let mut visited: HashSet<Coord> = HashSet::new();
        let mut frontier = VecDeque::from([source]);
        visited.insert(source);

        while let Some(at) = frontier.pop_front() {
            for victim in self.shock_victims(at) {
                self.damage_entity(victim, damage, DamageType::Electric);
            }
            self.emit(SimEvent::Shocked { at });
            reached.push(at);

            for neighbor in at.neighbors4() {
                if visited.contains(&neighbor) || !self.has_conductor(neighbor) {
                    continue;
                }
                visited.insert(neighbor);
                frontier.push_back(neighbor);
            }
        }
        debug!(x = source.x, y = source.y, tiles = reached.len(), "current_conducted");
        reached
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::fluid::FluidKind;
    use crate::world::{creature_spec, Alignment, BarrelContents, Creature, EntitySpec};

    use super::*;

    fn health(world: &World, id: EntityId) -> i32 {
        world
            .entity(id)
            .and_then(|entity| entity.damageable.as_ref())
            .map_or(0, |damageable| damageable.health)
    }

    #[test]
    fn current_runs_through_a_puddle_and_shocks_each_wader_once() {
        let mut world = World::new(5, 3, SimConfig::default()).expect("world");
        for x in 0..3 {
            world
                .spawn_fluid(FluidKind::Water, 0, Coord::new(x, 1))
                .expect("water");
        }
        // a loop would reach (1, 1) twice without the visited set
        world
            .spawn_fluid(FluidKind::Water, 0, Coord::new(0, 0))
            .expect("water");
        world
            .spawn_fluid(FluidKind::Water, 0, Coord::new(1, 0))
            .expect("water");
        let wader = world
            .spawn(
                creature_spec(
                    Creature::new("wader", Alignment::AgainstPlayer, Weapon::fists()),
                    Damageable::new(30),
                    false,
                ),
                Coord::new(1, 1),
            )
            .expect("wader");
        let dry = world
            .spawn(
                creature_spec(
                    Creature::new("dry", Alignment::AgainstPlayer, Weapon::fists()),
                    Damageable::new(30),
                    false,
                ),
                Coord::new(4, 1),
            )
            .expect("dry");

        let reached = world.conduct(Coord::new(0, 1), 7);
        assert_eq!(reached.len(), 5);
        assert_eq!(health(&world, wader), 23);
        assert_eq!(health(&world, dry), 30);
    }

    #[test]
    fn barrels_conduct_and_take_damage() {
        let mut world = World::new(3, 1, SimConfig::default()).expect("world");
        let near = world
            .spawn(EntitySpec::barrel(BarrelContents::Water), Coord::new(0, 0))
            .expect("near");
        let far = world
            .spawn(EntitySpec::barrel(BarrelContents::Water), Coord::new(1, 0))
            .expect("far");
        world.conduct(Coord::new(0, 0), 3);
        assert_eq!(health(&world, near), 12);
        assert_eq!(health(&world, far), 12);
    }

    #[test]
    fn dry_source_does_nothing() {
        let mut world = World::new(2, 1, SimConfig::default()).expect("world");
        assert!(world.conduct(Coord::new(0, 0), 10).is_empty());
        assert!(world.events().pending().is_empty());
    }
}
