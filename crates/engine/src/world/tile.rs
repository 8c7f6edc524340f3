use crate::geometry::Coord;

use super::entity::{Cover, Entity, EntityId, Layer, Roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occupant {
    id: EntityId,
    layer: Layer,
    roles: Roles,
    blocks_movement: bool,
    blocks_view: bool,
    cover: Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TileInsertError {
    FluidSlotTaken,
    GasSlotTaken,
}

/// One grid cell: the single source of truth for what is where.
///
/// Role lists and aggregate flags are rebuilt inside every mutating call, so readers never see
/// a stale `blocks_movement`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    coord: Coord,
    occupants: Vec<Occupant>,
    creatures: Vec<EntityId>,
    items: Vec<EntityId>,
    traps: Vec<EntityId>,
    flammables: Vec<EntityId>,
    damageables: Vec<EntityId>,
    conductive: Vec<EntityId>,
    fluid: Option<EntityId>,
    gas: Option<EntityId>,
    blocks_movement: bool,
    blocks_view: bool,
    non_creature_blocker: bool,
    has_terrain: bool,
    cover: Cover,
}

impl Tile {
    pub(crate) fn new(coord: Coord) -> Self {
        Self {
            coord,
            occupants: Vec::new(),
            creatures: Vec::new(),
            items: Vec::new(),
            traps: Vec::new(),
            flammables: Vec::new(),
            damageables: Vec::new(),
            conductive: Vec::new(),
            fluid: None,
            gas: None,
            blocks_movement: false,
            blocks_view: false,
            non_creature_blocker: false,
            has_terrain: false,
            cover: Cover::None,
        }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Occupants in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.occupants.iter().map(|occupant| occupant.id)
    }

    pub fn entities_on_layer(&self, layer: Layer) -> impl Iterator<Item = EntityId> + '_ {
        self.occupants
            .iter()
            .filter(move |occupant| occupant.layer == layer)
            .map(|occupant| occupant.id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.occupants.iter().any(|occupant| occupant.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn creatures(&self) -> &[EntityId] {
        &self.creatures
    }

    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    pub fn traps(&self) -> &[EntityId] {
        &self.traps
    }

    pub fn flammables(&self) -> &[EntityId] {
        &self.flammables
    }

    pub fn damageables(&self) -> &[EntityId] {
        &self.damageables
    }

    pub fn conductive(&self) -> &[EntityId] {
        &self.conductive
    }

    pub fn fluid(&self) -> Option<EntityId> {
        self.fluid
    }

    pub fn gas(&self) -> Option<EntityId> {
        self.gas
    }

    pub fn blocks_movement(&self) -> bool {
        self.blocks_movement
    }

    pub fn blocks_view(&self) -> bool {
        self.blocks_view
    }

    /// A blocker that is not a creature: walls, closed doors, crates.
    pub fn has_non_creature_blocker(&self) -> bool {
        self.non_creature_blocker
    }

    pub fn has_terrain(&self) -> bool {
        self.has_terrain
    }

    /// Most protective cover offered by anything on this tile.
    pub fn cover(&self) -> Cover {
        self.cover
    }

    pub(crate) fn add(&mut self, entity: &Entity) -> Result<(), TileInsertError> {
        debug_assert!(!self.contains(entity.id), "entity already on tile");
        let roles = entity.roles();
        if roles.fluid && self.fluid.is_some() {
            return Err(TileInsertError::FluidSlotTaken);
        }
        if roles.gas && self.gas.is_some() {
            return Err(TileInsertError::GasSlotTaken);
        }
        self.occupants.push(Occupant {
            id: entity.id,
            layer: entity.layer,
            roles,
            blocks_movement: entity.blocks_movement(),
            blocks_view: entity.blocks_view(),
            cover: entity.cover,
        });
        self.rebuild();
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|occupant| occupant.id != id);
        let removed = self.occupants.len() != before;
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Re-reads blocking flags after an entity changed them in place (doors).
    pub(crate) fn refresh_occupant(&mut self, entity: &Entity) {
        let Some(occupant) = self
            .occupants
            .iter_mut()
            .find(|occupant| occupant.id == entity.id)
        else {
            return;
        };
        occupant.blocks_movement = entity.blocks_movement();
        occupant.blocks_view = entity.blocks_view();
        occupant.cover = entity.cover;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.creatures.clear();
        self.items.clear();
        self.traps.clear();
        self.flammables.clear();
        self.damageables.clear();
        self.conductive.clear();
        self.fluid = None;
        self.gas = None;
        self.blocks_movement = false;
        self.blocks_view = false;
        self.non_creature_blocker = false;
        self.has_terrain = false;
        self.cover = Cover::None;

        for occupant in &self.occupants {
            let roles = occupant.roles;
            if roles.creature {
                self.creatures.push(occupant.id);
            }
            if roles.item {
                self.items.push(occupant.id);
            }
            if roles.trap {
                self.traps.push(occupant.id);
            }
            if roles.flammable {
                self.flammables.push(occupant.id);
            }
            if roles.damageable {
                self.damageables.push(occupant.id);
            }
            if roles.conductive {
                self.conductive.push(occupant.id);
            }
            if roles.fluid {
                self.fluid = Some(occupant.id);
            }
            if roles.gas {
                self.gas = Some(occupant.id);
            }
            self.blocks_movement |= occupant.blocks_movement;
            self.blocks_view |= occupant.blocks_view;
            self.non_creature_blocker |= occupant.blocks_movement && !roles.creature;
            self.has_terrain |= occupant.layer == Layer::Terrain;
            self.cover = self.cover.max(occupant.cover);
        }
    }
}
