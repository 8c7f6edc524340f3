mod creature;
mod entity;
mod health;
mod query;
mod tile;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use crate::config::SimConfig;
use crate::events::{SimEvent, SimEventBus};
use crate::geometry::Coord;
use crate::rng::SimRng;
use crate::systems::SimSystemsHost;

pub use creature::{
    creature_spec, AiMemory, AiState, Alignment, Controller, Creature, CreatureStats,
    IdleBehavior, Inventory,
};
pub use entity::{
    BarrelContents, Cover, DoorState, ElectricallyConductive, Entity, EntityBody, EntityId,
    EntityIdAllocator, EntitySpec, Flammable, Interactable, ItemKind, Layer, PropKind,
    TerrainKind,
};
pub use tile::Tile;

use tile::TileInsertError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("world dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("spawn position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("tile ({x}, {y}) already holds a fluid")]
    FluidSlotTaken { x: i32, y: i32 },
    #[error("tile ({x}, {y}) already holds a gas")]
    GasSlotTaken { x: i32, y: i32 },
}

/// Simulation context: owns the tile grid, the entity registry, randomness, and the event
/// side-channel. Components borrow it for the duration of one call.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    entities: BTreeMap<EntityId, Entity>,
    allocator: EntityIdAllocator,
    pending_removals: Vec<EntityId>,
    rng: SimRng,
    events: SimEventBus,
    tick: u64,
    pub(crate) systems: SimSystemsHost,
}

impl World {
    pub fn new(width: u32, height: u32, config: SimConfig) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(Coord::new(x as i32, y as i32)));
            }
        }
        let rng = SimRng::seeded(config.seed);
        Ok(Self {
            config,
            width,
            height,
            tiles,
            entities: BTreeMap::new(),
            allocator: EntityIdAllocator::default(),
            pending_removals: Vec::new(),
            rng,
            events: SimEventBus::default(),
            tick: 0,
            systems: SimSystemsHost::default(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick_counter(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        self.index_of(coord).is_some()
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

    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.index_of(coord).and_then(|index| self.tiles.get(index))
    }

    fn tile_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        self.index_of(coord).and_then(|index| self.tiles.get_mut(index))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.entity(id).and_then(Entity::creature)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.entity_mut(id).and_then(Entity::creature_mut)
    }

    /// Snapshot of every registered id in ascending order, the fixed enumeration order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Still in play: registered and not flagged for removal.
    pub fn is_active(&self, id: EntityId) -> bool {
        self.entity(id)
            .is_some_and(|entity| !entity.should_remove_from_game())
    }

    pub fn spawn(&mut self, spec: EntitySpec, at: Coord) -> Result<EntityId, SpawnError> {
        let (width, height) = (self.width, self.height);
        if !self.in_bounds(at) {
            return Err(SpawnError::OutOfBounds {
                x: at.x,
                y: at.y,
                width,
                height,
            });
        }
        let id = self.allocator.allocate();
        let entity = Entity::from_spec(id, at, spec);
        let Some(tile) = self.tile_mut(at) else {
            return Err(SpawnError::OutOfBounds {
                x: at.x,
                y: at.y,
                width,
                height,
            });
        };
        tile.add(&entity).map_err(|error| match error {
            TileInsertError::FluidSlotTaken => SpawnError::FluidSlotTaken { x: at.x, y: at.y },
            TileInsertError::GasSlotTaken => SpawnError::GasSlotTaken { x: at.x, y: at.y },
        })?;
        trace!(entity = id.0, name = %entity.name, x = at.x, y = at.y, "entity_spawned");
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Moves an entity between tiles. Detach and attach happen in this one call, so the entity
    /// is never observable on two tiles. Returns false and leaves everything in place when the
    /// destination cannot accept it.
    pub fn update_position(&mut self, id: EntityId, to: Coord) -> bool {
        let Some(entity) = self.entities.get(&id) else {
            return false;
        };
        debug_assert!(
            entity.body.is_movable(),
            "attempted to reposition a fixed entity"
        );
        if !entity.body.is_movable() {
            return false;
        }
        let from = entity.position();
        if from == to {
            return true;
        }
        let (Some(from_index), Some(to_index)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        let roles = entity.roles();
        let destination = &self.tiles[to_index];
        if (roles.fluid && destination.fluid().is_some())
            || (roles.gas && destination.gas().is_some())
        {
            return false;
        }

        self.tiles[from_index].remove(id);
        if self.tiles[to_index].add(entity).is_err() {
            let _ = self.tiles[from_index].add(entity);
            return false;
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_position(to);
            if let Some(creature) = entity.creature_mut() {
                creature.perception.invalidate_all();
            }
        }
        true
    }

    /// Changes an entity's blocking flags and refreshes its tile in the same call.
    pub fn set_blocking(&mut self, id: EntityId, movement: bool, view: bool) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        entity.set_blocking(movement, view);
        let position = entity.position();
        let Some(index) = self.index_of(position) else {
            return;
        };
        if let Some(entity) = self.entities.get(&id) {
            self.tiles[index].refresh_occupant(entity);
        }
    }

    /// Flags an entity for the end-of-tick sweep. Returns true only the first time.
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if !entity.flag_for_removal() {
            return false;
        }
        self.pending_removals.push(id);
        true
    }

    pub fn pending_removal_count(&self) -> usize {
        self.pending_removals.len()
    }

    /// Detaches and drops every flagged entity. Runs after all tick logic.
    pub fn sweep_removed(&mut self) -> usize {
        if self.pending_removals.is_empty() {
            return 0;
        }
        let mut pending = std::mem::take(&mut self.pending_removals);
        pending.sort();
        pending.dedup();
        let mut removed = 0usize;
        for id in pending {
            let Some(entity) = self.entities.remove(&id) else {
                continue;
            };
            if let Some(tile) = self.tile_mut(entity.position()) {
                tile.remove(id);
            }
            removed += 1;
        }
        removed
    }

    pub(crate) fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn events(&self) -> &SimEventBus {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut SimEventBus {
        &mut self.events
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.emit(event);
    }

    /// Hands the pending animation requests to the presentation layer.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::{fluid_spec, FluidKind};

    fn world(width: u32, height: u32) -> World {
        World::new(width, height, SimConfig::default()).expect("world")
    }

    #[test]
    fn zero_sized_world_is_rejected() {
        let err = World::new(0, 4, SimConfig::default()).expect_err("err");
        assert_eq!(
            err,
            WorldError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn add_and_remove_keep_blocking_flags_current() {
        let mut world = world(4, 4);
        let at = Coord::new(1, 1);
        let wall = world.spawn(EntitySpec::wall(), at).expect("wall");
        let tile = world.tile(at).expect("tile");
        assert!(tile.blocks_movement());
        assert!(tile.blocks_view());
        assert_eq!(tile.cover(), Cover::Full);

        world.mark_for_removal(wall);
        assert!(world.tile(at).expect("tile").blocks_movement(), "removal is deferred");
        assert_eq!(world.sweep_removed(), 1);
        let tile = world.tile(at).expect("tile");
        assert!(!tile.blocks_movement());
        assert!(!tile.blocks_view());
        assert!(tile.is_empty());
    }

    #[test]
    fn tile_holds_at_most_one_fluid() {
        let mut world = world(3, 3);
        let at = Coord::new(0, 0);
        world
            .spawn(fluid_spec(FluidKind::Water, 3), at)
            .expect("first fluid");
        let err = world
            .spawn(fluid_spec(FluidKind::Lava, 3), at)
            .expect_err("second fluid");
        assert_eq!(err, SpawnError::FluidSlotTaken { x: 0, y: 0 });
    }

    #[test]
    fn update_position_moves_between_tiles_atomically() {
        let mut world = world(4, 4);
        let crate_id = world
            .spawn(EntitySpec::crate_prop(), Coord::new(0, 0))
            .expect("crate");
        assert!(world.update_position(crate_id, Coord::new(2, 1)));
        assert!(!world.tile(Coord::new(0, 0)).expect("old").contains(crate_id));
        assert!(world.tile(Coord::new(2, 1)).expect("new").contains(crate_id));
        assert!(!world.tile(Coord::new(0, 0)).expect("old").blocks_movement());
        assert_eq!(
            world.entity(crate_id).expect("crate").position(),
            Coord::new(2, 1)
        );
    }

    #[test]
    fn fluid_cannot_move_onto_another_fluid() {
        let mut world = world(3, 1);
        let water = world
            .spawn(fluid_spec(FluidKind::Water, 1), Coord::new(0, 0))
            .expect("water");
        world
            .spawn(fluid_spec(FluidKind::Oil, 1), Coord::new(1, 0))
            .expect("oil");
        assert!(!world.update_position(water, Coord::new(1, 0)));
        assert!(world.tile(Coord::new(0, 0)).expect("tile").contains(water));
    }

    #[test]
    fn removal_mark_is_reported_once() {
        let mut world = world(2, 2);
        let id = world
            .spawn(EntitySpec::item(ItemKind::Scrap), Coord::new(1, 1))
            .expect("item");
        assert!(world.mark_for_removal(id));
        assert!(!world.mark_for_removal(id));
        assert!(!world.is_active(id));
        assert_eq!(world.pending_removal_count(), 1);
    }
}
