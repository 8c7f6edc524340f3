use serde::{Deserialize, Serialize};

use crate::combat::Weapon;
use crate::damage::Damageable;
use crate::geometry::{Coord, Direction};
use crate::powers::Power;
use crate::status::{StatusKind, StatusSet};

use super::entity::{
    ElectricallyConductive, EntityBody, EntityId, EntitySpec, Flammable, ItemKind, Layer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    WithPlayer,
    AgainstPlayer,
}

impl Alignment {
    pub fn opposes(self, other: Alignment) -> bool {
        self != other
    }
}

/// Who chooses this creature's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Ai,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Searching,
    Engaging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleBehavior {
    Wander,
    Stationary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatureStats {
    pub accuracy_multiplier: f64,
    pub move_time: u32,
    pub attack_time: u32,
    pub reload_time: u32,
    pub view_range: f64,
    /// Width of the facing cone; 360 sees all around.
    pub view_angle_degrees: f64,
    /// Plans paths around lava, fire, and scalding gas.
    pub avoids_hazards: bool,
}

impl Default for CreatureStats {
    fn default() -> Self {
        Self {
            accuracy_multiplier: 1.0,
            move_time: 2,
            attack_time: 2,
            reload_time: 3,
            view_range: 8.0,
            view_angle_degrees: 120.0,
            avoids_hazards: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiMemory {
    pub state: AiState,
    pub last_known_enemy: Option<Coord>,
    pub searching_ticks: u32,
}

impl Default for AiMemory {
    fn default() -> Self {
        Self {
            state: AiState::Idle,
            last_known_enemy: None,
            searching_ticks: 0,
        }
    }
}

/// Perception results memoized until the owner next ticks (visible) or acts (attackable).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PerceptionCache {
    pub(crate) visible_enemies: Option<Vec<EntityId>>,
    pub(crate) attackable_enemies: Option<Vec<EntityId>>,
}

impl PerceptionCache {
    pub(crate) fn invalidate_all(&mut self) {
        self.visible_enemies = None;
        self.attackable_enemies = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<ItemKind>,
}

impl Inventory {
    pub fn add(&mut self, item: ItemKind) {
        self.items.push(item);
    }

    pub fn count(&self, item: ItemKind) -> usize {
        self.items.iter().filter(|held| **held == item).count()
    }

    /// Removes one `item`; false when none is held.
    pub fn take(&mut self, item: ItemKind) -> bool {
        let Some(index) = self.items.iter().position(|held| *held == item) else {
            return false;
        };
        self.items.remove(index);
        true
    }

    pub fn items(&self) -> &[ItemKind] {
        &self.items
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    pub species: String,
    pub facing: Direction,
    pub alignment: Alignment,
    pub controller: Controller,
    pub stats: CreatureStats,
    pub idle_behavior: IdleBehavior,
    pub weapon: Weapon,
    pub inventory: Inventory,
    pub statuses: StatusSet,
    pub powers: Vec<Power>,
    pub rads: u32,
    pub ai: AiMemory,
    /// Action-point countdown; the creature may act only when this is exactly zero.
    pub time_until_next_action: u32,
    pub(crate) perception: PerceptionCache,
}

impl Creature {
    pub fn new(species: impl Into<String>, alignment: Alignment, weapon: Weapon) -> Self {
        Self {
            species: species.into(),
            facing: Direction::S,
            alignment,
            controller: Controller::Ai,
            stats: CreatureStats::default(),
            idle_behavior: IdleBehavior::Stationary,
            weapon,
            inventory: Inventory::default(),
            statuses: StatusSet::default(),
            powers: Vec::new(),
            rads: 0,
            ai: AiMemory::default(),
            time_until_next_action: 0,
            perception: PerceptionCache::default(),
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: CreatureStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    #[must_use]
    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    #[must_use]
    pub fn with_idle_behavior(mut self, idle_behavior: IdleBehavior) -> Self {
        self.idle_behavior = idle_behavior;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: Power) -> Self {
        self.powers.push(power);
        self
    }

    pub fn can_act(&self) -> bool {
        self.time_until_next_action == 0 && !self.statuses.has(StatusKind::Stunned)
    }

    /// Starts the countdown for an action that just completed.
    pub(crate) fn spend_action(&mut self, cost: u32) {
        let cost = if self.statuses.has(StatusKind::Slowed) {
            cost.saturating_mul(2)
        } else {
            cost
        };
        self.time_until_next_action = cost;
        self.perception.invalidate_all();
    }

    pub(crate) fn face(&mut self, facing: Direction) {
        if self.facing != facing {
            self.facing = facing;
            self.perception.invalidate_all();
        }
    }

    pub fn ai_state(&self) -> AiState {
        self.ai.state
    }
}

/// Wraps a creature into a spawnable entity with the standard creature footprint.
pub fn creature_spec(
    creature: Creature,
    damageable: Damageable,
    conductive: bool,
) -> EntitySpec {
    let name = creature.species.clone();
    let mut spec = EntitySpec::new(name, Layer::Creature, EntityBody::Creature(Box::new(creature)))
        .with_mass(70)
        .blocking(true, false)
        .with_damageable(damageable)
        .with_flammable(Flammable::new(5, 0.1, 0.2));
    if conductive {
        spec = spec.with_conductive(ElectricallyConductive {
            shocks_occupants: false,
        });
    }
    spec
}
