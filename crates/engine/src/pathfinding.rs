use crate::fluid::{FluidKind, GasKind};
use crate::geometry::{chebyshev_distance, manhattan_distance, Coord};
use crate::world::{EntityId, World};

/// Extra weight on tiles held by another creature: passable for planning, but avoided.
const OCCUPIED_TILE_WEIGHT: u32 = 4;

/// Traversal weights for one planning call. A zero weight is impassable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostGrid {
    width: u32,
    height: u32,
    diagonal: bool,
    weights: Vec<u32>,
}

impl CostGrid {
    pub fn new(width: u32, height: u32, diagonal: bool) -> Self {
        Self {
            width,
            height,
            diagonal,
            weights: vec![1; width as usize * height as usize],
        }
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as u32, coord.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn set(&mut self, coord: Coord, weight: u32) {
        if let Some(index) = self.index_of(coord) {
            self.weights[index] = weight;
        }
    }

    pub fn weight(&self, coord: Coord) -> u32 {
        self.index_of(coord)
            .and_then(|index| self.weights.get(index))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_passable(&self, coord: Coord) -> bool {
        self.weight(coord) > 0
    }

    fn heuristic(&self, from: Coord, goal: Coord) -> u32 {
        if self.diagonal {
            chebyshev_distance(from, goal)
        } else {
            manhattan_distance(from, goal)
        }
    }

    fn neighbors(&self, coord: Coord) -> Vec<Coord> {
        let candidates: Vec<Coord> = if self.diagonal {
            coord.neighbors8().to_vec()
        } else {
            coord.neighbors4().to_vec()
        };
        candidates
            .into_iter()
            .filter(|neighbor| self.index_of(*neighbor).is_some())
            .collect()
    }

    /// Deterministic A*. The returned path starts at `start` and ends at `goal`; the start
    /// tile itself need not be passable.
    pub fn find_path(&self, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
        let start_index = self.index_of(start)?;
        let goal_index = self.index_of(goal)?;
        if !self.is_passable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let node_count = self.weights.len();
        let mut closed = vec![false; node_count];
        let mut best_g = vec![u32::MAX; node_count];
        let mut parent = vec![None::<usize>; node_count];
        let mut open = Vec::new();
        let mut next_insertion = 0u64;

        let start_h = self.heuristic(start, goal);
        open.push(OpenNode {
            coord: start,
            h_cost: start_h,
            f_cost: start_h,
            insertion_order: next_insertion,
        });
        next_insertion = next_insertion.saturating_add(1);
        best_g[start_index] = 0;

        while !open.is_empty() {
            let best_index = pick_best_open_node_index(&open);
            let current = open.swap_remove(best_index);
            let Some(current_index) = self.index_of(current.coord) else {
                continue;
            };
            if closed[current_index] {
                continue;
            }
            closed[current_index] = true;

            if current_index == goal_index {
                return self.reconstruct_path(&parent, start_index, goal_index);
            }

            let current_g = best_g[current_index];
            for neighbor in self.neighbors(current.coord) {
                let Some(neighbor_index) = self.index_of(neighbor) else {
                    continue;
                };
                let weight = self.weights[neighbor_index];
                if closed[neighbor_index] || weight == 0 {
                    continue;
                }

                let tentative_g = current_g.saturating_add(weight);
                if tentative_g >= best_g[neighbor_index] {
                    continue;
                }

                best_g[neighbor_index] = tentative_g;
                parent[neighbor_index] = Some(current_index);
                let h_cost = self.heuristic(neighbor, goal);
                open.push(OpenNode {
                    coord: neighbor,
                    h_cost,
                    f_cost: tentative_g.saturating_add(h_cost),
                    insertion_order: next_insertion,
                });
                next_insertion = next_insertion.saturating_add(1);
            }
        }

        None
    }

    fn reconstruct_path(
        &self,
        parent: &[Option<usize>],
        start_index: usize,
        goal_index: usize,
    ) -> Option<Vec<Coord>> {
        let mut cursor = goal_index;
        let mut indices = vec![cursor];
        while cursor != start_index {
            cursor = parent.get(cursor).and_then(|value| *value)?;
            indices.push(cursor);
        }
        indices.reverse();
        let width = self.width as usize;
        Some(
            indices
                .into_iter()
                .map(|index| Coord::new((index % width) as i32, (index / width) as i32))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    coord: Coord,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

fn pick_best_open_node_index(open: &[OpenNode]) -> usize {
    let mut best_index = 0usize;
    for index in 1..open.len() {
        if open_node_order_key(open[index]) < open_node_order_key(open[best_index]) {
            best_index = index;
        }
    }
    best_index
}

fn open_node_order_key(node: OpenNode) -> (u32, u32, i32, i32, u64) {
    (
        node.f_cost,
        node.h_cost,
        node.coord.y,
        node.coord.x,
        node.insertion_order,
    )
}

impl World {
    /// Tiles a cautious creature refuses to plan through even though they are walkable.
    pub fn is_dangerous(&self, coord: Coord) -> bool {
        if self.fluid_kind_at(coord) == Some(FluidKind::Lava) {
            return true;
        }
        if self.gas_kind_at(coord) == Some(GasKind::Steam) {
            return true;
        }
        self.tile(coord).is_some_and(|tile| {
            tile.flammables()
                .iter()
                .any(|id| self.entity(*id).is_some_and(|entity| entity.is_burning()))
        })
    }

    /// Cost grid as seen by `mover` heading for `goal`. Solid terrain and props are zero,
    /// other creatures are expensive, and hazards are zeroed for creatures that avoid them.
    /// The goal tile keeps its creature so enemies can be approached.
    pub fn cost_grid_for(&self, mover: EntityId, goal: Coord) -> CostGrid {
        let mut grid = CostGrid::new(self.width(), self.height(), self.config().diagonal_movement);
        let avoids_hazards = self
            .creature(mover)
            .is_some_and(|creature| creature.stats.avoids_hazards);
        for tile in self.tiles() {
            let coord = tile.coord();
            let weight = if tile.has_non_creature_blocker() {
                0
            } else if avoids_hazards && coord != goal && self.is_dangerous(coord) {
                0
            } else if tile.creatures().iter().any(|id| *id != mover) && coord != goal {
                OCCUPIED_TILE_WEIGHT
            } else {
                1
            };
            grid.set(coord, weight);
        }
        grid
    }

    /// First tile of a fresh plan toward `goal`. The world changes between decisions, so only
    /// one step is ever consumed.
    pub fn next_step_toward(&self, mover: EntityId, goal: Coord) -> Option<Coord> {
        let start = self.entity(mover)?.position();
        let path = self.cost_grid_for(mover, goal).find_path(start, goal)?;
        path.get(1).copied()
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::world::{creature_spec, Alignment, Creature, EntitySpec};

    use super::*;

    #[test]
    fn path_routes_around_a_wall_gap() {
        let mut grid = CostGrid::new(7, 5, false);
        for y in 0..4 {
            grid.set(Coord::new(3, y), 0);
        }
        let path = grid
            .find_path(Coord::new(1, 2), Coord::new(5, 2))
            .expect("reachable");
        assert!(path.iter().all(|coord| grid.is_passable(*coord) || *coord == Coord::new(1, 2)));
        assert!(path.contains(&Coord::new(3, 4)));
        for pair in path.windows(2) {
            assert_eq!(manhattan_distance(pair[0], pair[1]), 1);
        }
    }

    #[test]
    fn tie_break_is_deterministic_on_a_symmetric_map() {
        let mut grid = CostGrid::new(5, 5, true);
        grid.set(Coord::new(2, 2), 0);
        let first = grid.find_path(Coord::new(0, 2), Coord::new(4, 2));
        let second = grid.find_path(Coord::new(0, 2), Coord::new(4, 2));
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn enclosed_goal_has_no_path() {
        let mut grid = CostGrid::new(3, 3, true);
        for coord in Coord::new(2, 2).neighbors8() {
            grid.set(coord, 0);
        }
        assert_eq!(grid.find_path(Coord::new(0, 0), Coord::new(2, 2)), None);
    }

    #[test]
    fn cautious_creature_steps_around_lava() {
        let mut world = World::new(3, 3, SimConfig::default()).expect("world");
        let walker = world
            .spawn(
                creature_spec(
                    Creature::new("walker", Alignment::WithPlayer, Weapon::fists()),
                    Damageable::new(10),
                    false,
                ),
                Coord::new(0, 1),
            )
            .expect("walker");
        world
            .spawn_fluid(FluidKind::Lava, 0, Coord::new(1, 1))
            .expect("lava");
        world.spawn(EntitySpec::wall(), Coord::new(1, 0)).expect("wall");

        let step = world.next_step_toward(walker, Coord::new(2, 1));
        assert_eq!(step, Some(Coord::new(1, 2)));

        if let Some(creature) = world.creature_mut(walker) {
            creature.stats.avoids_hazards = false;
        }
        assert_eq!(world.next_step_toward(walker, Coord::new(2, 1)), Some(Coord::new(1, 1)));
    }
}
