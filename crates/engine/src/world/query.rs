use crate::fluid::{FluidKind, GasKind};
use crate::geometry::{distance, line_between, Coord};

use super::{Alignment, EntityBody, EntityId, World};

impl World {
    pub fn entities_at(&self, coord: Coord) -> Vec<EntityId> {
        self.tile(coord)
            .map(|tile| tile.entities().collect())
            .unwrap_or_default()
    }

    /// Damageables at `coord` that can take a hit right now.
    pub fn damageables_at(&self, coord: Coord) -> Vec<EntityId> {
        let Some(tile) = self.tile(coord) else {
            return Vec::new();
        };
        tile.damageables()
            .iter()
            .copied()
            .filter(|id| self.entity(*id).is_some_and(|entity| entity.is_targetable()))
            .collect()
    }

    pub fn creatures_at(&self, coord: Coord) -> Vec<EntityId> {
        let Some(tile) = self.tile(coord) else {
            return Vec::new();
        };
        tile.creatures()
            .iter()
            .copied()
            .filter(|id| self.is_active(*id))
            .collect()
    }

    pub fn creature_at(&self, coord: Coord) -> Option<EntityId> {
        self.creatures_at(coord).into_iter().next()
    }

    pub fn fluid_at(&self, coord: Coord) -> Option<EntityId> {
        self.tile(coord)
            .and_then(|tile| tile.fluid())
            .filter(|id| self.is_active(*id))
    }

    pub fn gas_at(&self, coord: Coord) -> Option<EntityId> {
        self.tile(coord)
            .and_then(|tile| tile.gas())
            .filter(|id| self.is_active(*id))
    }

    pub fn fluid_kind_at(&self, coord: Coord) -> Option<FluidKind> {
        let id = self.fluid_at(coord)?;
        match &self.entity(id)?.body {
            EntityBody::Fluid(cell) => Some(cell.kind),
            _ => None,
        }
    }

    pub fn gas_kind_at(&self, coord: Coord) -> Option<GasKind> {
        let id = self.gas_at(coord)?;
        match &self.entity(id)?.body {
            EntityBody::Gas(cell) => Some(cell.kind),
            _ => None,
        }
    }

    /// Targetable damageables whose tile lies within `radius` (Euclidean) of `center`.
    pub fn damageables_within(&self, center: Coord, radius: f64) -> Vec<EntityId> {
        let reach = radius.max(0.0).ceil() as i32;
        let mut found = Vec::new();
        for y in (center.y - reach)..=(center.y + reach) {
            for x in (center.x - reach)..=(center.x + reach) {
                let coord = Coord::new(x, y);
                if distance(center, coord) > radius {
                    continue;
                }
                found.extend(self.damageables_at(coord));
            }
        }
        found
    }

    pub fn creatures_with_alignment(&self, alignment: Alignment) -> Vec<EntityId> {
        self.entity_ids()
            .into_iter()
            .filter(|id| self.is_active(*id))
            .filter(|id| {
                self.creature(*id)
                    .is_some_and(|creature| creature.alignment == alignment)
            })
            .collect()
    }

    /// Rasterized line between two points, cut at the first out-of-bounds tile.
    pub fn line_between(&self, from: Coord, to: Coord) -> Vec<Coord> {
        line_between(from, to)
            .into_iter()
            .take_while(|coord| self.in_bounds(*coord))
            .collect()
    }

    /// True when no tile strictly between the endpoints blocks view.
    pub fn has_line_of_sight(&self, from: Coord, to: Coord) -> bool {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return false;
        }
        let line = line_between(from, to);
        let inner = line.len().saturating_sub(1);
        line.iter()
            .take(inner)
            .skip(1)
            .all(|coord| self.tile(*coord).is_some_and(|tile| !tile.blocks_view()))
    }

    /// True when a creature could step onto `coord` right now.
    pub fn can_occupy(&self, coord: Coord) -> bool {
        self.tile(coord).is_some_and(|tile| !tile.blocks_movement())
    }

    pub fn walkable_neighbors(&self, coord: Coord) -> Vec<Coord> {
        let candidates: Vec<Coord> = if self.config().diagonal_movement {
            coord.neighbors8().to_vec()
        } else {
            coord.neighbors4().to_vec()
        };
        candidates
            .into_iter()
            .filter(|neighbor| self.can_occupy(*neighbor))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConfig;
    use crate::world::{EntitySpec, ItemKind};

    use super::*;

    #[test]
    fn wall_blocks_line_of_sight_but_not_endpoints() {
        let mut world = World::new(5, 1, SimConfig::default()).expect("world");
        assert!(world.has_line_of_sight(Coord::new(0, 0), Coord::new(4, 0)));
        world
            .spawn(EntitySpec::wall(), Coord::new(2, 0))
            .expect("wall");
        assert!(!world.has_line_of_sight(Coord::new(0, 0), Coord::new(4, 0)));
        assert!(world.has_line_of_sight(Coord::new(0, 0), Coord::new(2, 0)));
    }

    #[test]
    fn items_do_not_block_occupancy() {
        let mut world = World::new(2, 2, SimConfig::default()).expect("world");
        world
            .spawn(EntitySpec::item(ItemKind::Medkit), Coord::new(1, 1))
            .expect("item");
        assert!(world.can_occupy(Coord::new(1, 1)));
        assert!(!world.can_occupy(Coord::new(2, 2)), "out of bounds");
    }

    #[test]
    fn damageables_within_uses_euclidean_radius() {
        let mut world = World::new(5, 5, SimConfig::default()).expect("world");
        let near = world
            .spawn(EntitySpec::crate_prop(), Coord::new(3, 2))
            .expect("near");
        let corner = world
            .spawn(EntitySpec::crate_prop(), Coord::new(4, 4))
            .expect("corner");
        let found = world.damageables_within(Coord::new(2, 2), 1.5);
        assert!(found.contains(&near));
        assert!(!found.contains(&corner));
    }
}
