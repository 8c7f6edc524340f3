use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::geometry::{chebyshev_distance, ray_through, Coord};
use crate::world::{EntityId, World};

impl World {
    /// Pushes `target` up to `tiles` steps along the ray from `origin` through its position.
    ///
    /// A solid non-creature stops the push and hurts the mover; a creature stops it and takes
    /// the impact instead. Traps on each tile entered trigger. Returns the final position.
    pub fn knockback(
        &mut self,
        target: EntityId,
        origin: Coord,
        tiles: u32,
        original_damage: i32,
    ) -> Option<Coord> {
        if !self.is_active(target) {
            return None;
        }
        let start = self.entity(target)?.position();
        if tiles == 0 || origin == start {
            return Some(start);
        }

        let reach = chebyshev_distance(origin, start) as usize + tiles as usize;
        let ray = ray_through(origin, start, reach);
        let path: Vec<Coord> = match ray.iter().position(|coord| *coord == start) {
            Some(index) => ray.into_iter().skip(index + 1).take(tiles as usize).collect(),
            None => Vec::new(),
        };

        let fraction = self.config().knockback_impact_fraction;
        let impact = (f64::from(original_damage) * fraction).floor() as i32;
        let mut current = start;
        for next in path {
            let blocked_by_solid = self
                .tile(next)
                .map_or(true, |tile| tile.has_non_creature_blocker());
            if blocked_by_solid {
                debug!(entity = target.0, x = next.x, y = next.y, "knockback_slammed");
                self.damage_entity(target, impact, DamageType::Physical);
                break;
            }
            if let Some(other) = self.creature_at(next) {
                debug!(entity = target.0, other = other.0, "knockback_collided");
                self.damage_entity(other, impact, DamageType::Physical);
                break;
            }
            if !self.update_position(target, next) {
                break;
            }
            current = next;
            self.on_entered_tile(target, next);
            if !self.is_active(target) {
                break;
            }
        }

        if current != start {
            self.emit(SimEvent::Knockback {
                entity: target,
                from: start,
                to: current,
            });
            self.refresh_enemy_memory(target);
        }
        Some(current)
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

    fn spawn_creature(world: &mut World, at: Coord) -> EntityId {
        let creature = Creature::new("dummy", Alignment::AgainstPlayer, Weapon::fists());
        world
            .spawn(creature_spec(creature, Damageable::new(40), false), at)
            .expect("creature")
    }

    fn health(world: &World, id: EntityId) -> i32 {
        world
            .entity(id)
            .and_then(|entity| entity.damageable.as_ref())
            .map_or(0, |damageable| damageable.health)
    }

    #[test]
    fn push_travels_full_distance_in_open_ground() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let target = spawn_creature(&mut world, Coord::new(1, 0));
        let end = world.knockback(target, Coord::new(0, 0), 3, 20);
        assert_eq!(end, Some(Coord::new(4, 0)));
        assert_eq!(health(&world, target), 40);
    }

    #[test]
    fn wall_stops_push_and_hurts_the_mover() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let target = spawn_creature(&mut world, Coord::new(1, 0));
        world.spawn(EntitySpec::wall(), Coord::new(3, 0)).expect("wall");
        let end = world.knockback(target, Coord::new(0, 0), 4, 20);
        assert_eq!(end, Some(Coord::new(2, 0)));
        assert_eq!(health(&world, target), 35);
    }

    #[test]
    fn creature_in_the_way_takes_the_impact() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let target = spawn_creature(&mut world, Coord::new(1, 0));
        let bystander = spawn_creature(&mut world, Coord::new(2, 0));
        let end = world.knockback(target, Coord::new(0, 0), 3, 20);
        assert_eq!(end, Some(Coord::new(1, 0)));
        assert_eq!(health(&world, target), 40);
        assert_eq!(health(&world, bystander), 35);
    }

    #[test]
    fn pushed_creature_remembers_the_enemy_it_now_sees() {
        let mut world = World::new(8, 1, SimConfig::default()).expect("world");
        let creature = Creature::new("dummy", Alignment::AgainstPlayer, Weapon::fists())
            .with_facing(Direction::E);
        let target = world
            .spawn(creature_spec(creature, Damageable::new(40), false), Coord::new(1, 0))
            .expect("target");
        let enemy = Creature::new("enemy", Alignment::WithPlayer, Weapon::fists());
        world
            .spawn(creature_spec(enemy, Damageable::new(40), false), Coord::new(7, 0))
            .expect("enemy");
        assert_eq!(world.creature(target).expect("target").ai.last_known_enemy, None);

        assert_eq!(world.knockback(target, Coord::new(0, 0), 3, 20), Some(Coord::new(4, 0)));
        assert_eq!(
            world.creature(target).expect("target").ai.last_known_enemy,
            Some(Coord::new(7, 0))
        );
    }
}
