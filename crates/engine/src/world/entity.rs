use serde::{Deserialize, Serialize};

use crate::damage::Damageable;
use crate::fluid::{FluidCell, GasCell};
use crate::geometry::Coord;
use crate::traps::Trap;

use super::creature::Creature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Total order used for presentation and query filtering, not for physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Terrain,
    Object,
    Item,
    Creature,
    Fluid,
    Gas,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cover {
    #[default]
    None,
    Half,
    Full,
}

impl Cover {
    pub fn multiplier(self) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Half => 0.5,
            Self::Full => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flammable {
    pub is_burning: bool,
    /// Ticks spent burning in the current fire.
    pub burning_duration: u32,
    pub max_burning_duration: u32,
    pub burn_adjacent_chance: f64,
    pub burn_collocated_chance: f64,
    /// Removed from play once a fire runs its full duration.
    pub consumed_when_burnt: bool,
}

impl Flammable {
    pub fn new(
        max_burning_duration: u32,
        burn_adjacent_chance: f64,
        burn_collocated_chance: f64,
    ) -> Self {
        Self {
            is_burning: false,
            burning_duration: 0,
            max_burning_duration,
            burn_adjacent_chance,
            burn_collocated_chance,
            consumed_when_burnt: false,
        }
    }

    #[must_use]
    pub fn consumed(mut self) -> Self {
        self.consumed_when_burnt = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectricallyConductive {
    /// Creatures sharing the tile are shocked along with it (conductive fluids).
    pub shocks_occupants: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interactable {
    Door,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    Wall,
    Pillar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrelContents {
    Explosive,
    Oil,
    Water,
    ToxicWaste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropKind {
    Crate,
    Barrel(BarrelContents),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Medkit,
    AmmoPack,
    Scrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorState {
    pub open: bool,
}

/// What an entity is. Capabilities live beside it on [`Entity`].
#[derive(Debug, Clone, PartialEq)]
pub enum EntityBody {
    Creature(Box<Creature>),
    Terrain(TerrainKind),
    Prop(PropKind),
    Door(DoorState),
    Item(ItemKind),
    Fluid(FluidCell),
    Gas(GasCell),
    Trap(Trap),
}

impl EntityBody {
    /// Terrain and doors are fixed in place; everything else may be repositioned.
    pub fn is_movable(&self) -> bool {
        !matches!(self, Self::Terrain(_) | Self::Door(_))
    }
}

/// Everything needed to place a new entity; the world assigns id and position.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub layer: Layer,
    pub mass: u32,
    pub blocks_movement: bool,
    pub blocks_view: bool,
    pub cover: Cover,
    pub damageable: Option<Damageable>,
    pub flammable: Option<Flammable>,
    pub conductive: Option<ElectricallyConductive>,
    pub interactable: Option<Interactable>,
    pub body: EntityBody,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, layer: Layer, body: EntityBody) -> Self {
        Self {
            name: name.into(),
            layer,
            mass: 0,
            blocks_movement: false,
            blocks_view: false,
            cover: Cover::None,
            damageable: None,
            flammable: None,
            conductive: None,
            interactable: None,
            body,
        }
    }

    #[must_use]
    pub fn with_mass(mut self, mass: u32) -> Self {
        self.mass = mass;
        self
    }

    #[must_use]
    pub fn blocking(mut self, movement: bool, view: bool) -> Self {
        self.blocks_movement = movement;
        self.blocks_view = view;
        self
    }

    #[must_use]
    pub fn with_cover(mut self, cover: Cover) -> Self {
        self.cover = cover;
        self
    }

    #[must_use]
    pub fn with_damageable(mut self, damageable: Damageable) -> Self {
        self.damageable = Some(damageable);
        self
    }

    #[must_use]
    pub fn with_flammable(mut self, flammable: Flammable) -> Self {
        self.flammable = Some(flammable);
        self
    }

    #[must_use]
    pub fn with_conductive(mut self, conductive: ElectricallyConductive) -> Self {
        self.conductive = Some(conductive);
        self
    }

    #[must_use]
    pub fn with_interactable(mut self, interactable: Interactable) -> Self {
        self.interactable = Some(interactable);
        self
    }

    pub fn wall() -> Self {
        Self::new("wall", Layer::Terrain, EntityBody::Terrain(TerrainKind::Wall))
            .with_mass(1000)
            .blocking(true, true)
            .with_cover(Cover::Full)
            .with_damageable(Damageable::new(500).with_penetration_block(10))
    }

    pub fn pillar() -> Self {
        Self::new("pillar", Layer::Terrain, EntityBody::Terrain(TerrainKind::Pillar))
            .with_mass(800)
            .blocking(true, false)
            .with_cover(Cover::Full)
    }

    pub fn crate_prop() -> Self {
        Self::new("crate", Layer::Object, EntityBody::Prop(PropKind::Crate))
            .with_mass(60)
            .blocking(true, false)
            .with_cover(Cover::Half)
            .with_damageable(Damageable::new(30).with_penetration_block(2))
            .with_flammable(Flammable::new(8, 0.2, 0.5).consumed())
    }

    pub fn barrel(contents: BarrelContents) -> Self {
        let flammable = match contents {
            BarrelContents::Explosive | BarrelContents::Oil => Some(Flammable::new(3, 0.3, 0.8)),
            BarrelContents::Water | BarrelContents::ToxicWaste => None,
        };
        let body = EntityBody::Prop(PropKind::Barrel(contents));
        let mut spec = Self::new("barrel", Layer::Object, body)
            .with_mass(80)
            .blocking(true, false)
            .with_cover(Cover::Half)
            .with_damageable(Damageable::new(15).with_penetration_block(2))
            .with_conductive(ElectricallyConductive {
                shocks_occupants: false,
            });
        spec.flammable = flammable;
        spec
    }

    pub fn door(open: bool) -> Self {
        Self::new("door", Layer::Terrain, EntityBody::Door(DoorState { open }))
            .with_mass(200)
            .blocking(!open, !open)
            .with_damageable(Damageable::new(60).with_penetration_block(4))
            .with_flammable(Flammable::new(10, 0.1, 0.3).consumed())
            .with_interactable(Interactable::Door)
    }

    pub fn item(kind: ItemKind) -> Self {
        let name = match kind {
            ItemKind::Medkit => "medkit",
            ItemKind::AmmoPack => "ammo pack",
            ItemKind::Scrap => "scrap",
        };
        Self::new(name, Layer::Item, EntityBody::Item(kind))
            .with_mass(1)
            .with_interactable(Interactable::Pickup)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Roles {
    pub(crate) creature: bool,
    pub(crate) fluid: bool,
    pub(crate) gas: bool,
    pub(crate) item: bool,
    pub(crate) trap: bool,
    pub(crate) flammable: bool,
    pub(crate) damageable: bool,
    pub(crate) conductive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    position: Coord,
    pub layer: Layer,
    pub mass: u32,
    blocks_movement: bool,
    blocks_view: bool,
    pub cover: Cover,
    should_remove: bool,
    pub damageable: Option<Damageable>,
    pub flammable: Option<Flammable>,
    pub conductive: Option<ElectricallyConductive>,
    pub interactable: Option<Interactable>,
    pub body: EntityBody,
}

impl Entity {
    pub(crate) fn from_spec(id: EntityId, position: Coord, spec: EntitySpec) -> Self {
        Self {
            id,
            name: spec.name,
            position,
            layer: spec.layer,
            mass: spec.mass,
            blocks_movement: spec.blocks_movement,
            blocks_view: spec.blocks_view,
            cover: spec.cover,
            should_remove: false,
            damageable: spec.damageable,
            flammable: spec.flammable,
            conductive: spec.conductive,
            interactable: spec.interactable,
            body: spec.body,
        }
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Coord) {
        self.position = position;
    }

    pub fn blocks_movement(&self) -> bool {
        self.blocks_movement
    }

    pub fn blocks_view(&self) -> bool {
        self.blocks_view
    }

    pub(crate) fn set_blocking(&mut self, movement: bool, view: bool) {
        self.blocks_movement = movement;
        self.blocks_view = view;
    }

    pub fn should_remove_from_game(&self) -> bool {
        self.should_remove
    }

    /// One-way; returns false when the flag was already set.
    pub(crate) fn flag_for_removal(&mut self) -> bool {
        if self.should_remove {
            return false;
        }
        self.should_remove = true;
        true
    }

    pub fn creature(&self) -> Option<&Creature> {
        match &self.body {
            EntityBody::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn creature_mut(&mut self) -> Option<&mut Creature> {
        match &mut self.body {
            EntityBody::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn is_creature(&self) -> bool {
        matches!(self.body, EntityBody::Creature(_))
    }

    pub fn is_burning(&self) -> bool {
        self.flammable
            .as_ref()
            .is_some_and(|flammable| flammable.is_burning)
    }

    /// Damageable right now: has the capability, is not switched off, and is still in play.
    pub fn is_targetable(&self) -> bool {
        !self.should_remove
            && self.damageable.as_ref().is_some_and(|damageable| {
                damageable.is_currently_damageable && damageable.health > 0
            })
    }

    pub(crate) fn roles(&self) -> Roles {
        Roles {
            creature: self.is_creature(),
            fluid: matches!(self.body, EntityBody::Fluid(_)),
            gas: matches!(self.body, EntityBody::Gas(_)),
            item: matches!(self.body, EntityBody::Item(_)),
            trap: matches!(self.body, EntityBody::Trap(_)),
            flammable: self.flammable.is_some(),
            damageable: self.damageable.is_some(),
            conductive: self.conductive.is_some(),
        }
    }
}
